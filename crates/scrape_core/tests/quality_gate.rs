use pretty_assertions::assert_eq;
use scrape_core::{too_short_message, Assessment, Quality, QualityThresholds};

fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

#[test]
fn high_only_above_five_hundred_words() {
    let thresholds = QualityThresholds::default();
    assert_eq!(thresholds.classify(500), Quality::Medium);
    assert_eq!(thresholds.classify(501), Quality::High);
    assert_eq!(thresholds.classify(50), Quality::Medium);
}

#[test]
fn fewer_than_fifty_words_is_too_short() {
    let thresholds = QualityThresholds::default();
    assert_eq!(
        thresholds.assess(words(49)),
        Assessment::TooShort { word_count: 49 }
    );
    match thresholds.assess(words(50)) {
        Assessment::Accepted(result) => {
            assert_eq!(result.word_count, 50);
            assert_eq!(result.quality, Quality::Medium);
        }
        other => panic!("expected acceptance, got {other:?}"),
    }
}

#[test]
fn accepted_result_keeps_text_untouched() {
    let text = words(600);
    match QualityThresholds::default().assess(text.clone()) {
        Assessment::Accepted(result) => {
            assert_eq!(result.text, text);
            assert_eq!(result.quality, Quality::High);
        }
        other => panic!("expected acceptance, got {other:?}"),
    }
}

#[test]
fn thresholds_are_configurable() {
    let thresholds = QualityThresholds {
        min_words: 5,
        high_words: 10,
    };
    assert!(matches!(
        thresholds.assess(words(5)),
        Assessment::Accepted(_)
    ));
    assert_eq!(thresholds.classify(11), Quality::High);
}

#[test]
fn quality_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Quality::High).unwrap(), "\"high\"");
    assert_eq!(Quality::Medium.to_string(), "medium");
}

#[test]
fn too_short_message_names_the_count() {
    assert_eq!(too_short_message(30), "Extraction too short: 30 words");
}
