use std::fmt;
use std::str::FromStr;

/// One way of locating a cookie-consent control on a page.
///
/// Parsed from `text:<tag>:<label>` (first `<tag>` whose text contains
/// `<label>`) or `css:<selector>` (first element matching `<selector>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentMatcher {
    Text { tag: String, text: String },
    Css(String),
}

impl ConsentMatcher {
    pub fn text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        ConsentMatcher::Text {
            tag: tag.into(),
            text: text.into(),
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        ConsentMatcher::Css(selector.into())
    }

    /// Script that clicks the first match and evaluates to whether it did.
    pub fn click_script(&self) -> String {
        let find = match self {
            ConsentMatcher::Text { tag, text } => format!(
                "Array.from(document.querySelectorAll({tag})).find((el) => (el.textContent || '').includes({text}))",
                tag = js_string(tag),
                text = js_string(text),
            ),
            ConsentMatcher::Css(selector) => {
                format!("document.querySelector({})", js_string(selector))
            }
        };
        format!("(() => {{ const el = {find}; if (!el) {{ return false; }} el.click(); return true; }})()")
    }
}

/// The ordered list tried when nothing else is configured.
pub fn default_consent_matchers() -> Vec<ConsentMatcher> {
    vec![
        ConsentMatcher::text("button", "Aceptar"),
        ConsentMatcher::text("button", "Accept"),
        ConsentMatcher::text("button", "Acepto"),
        ConsentMatcher::css("[id*='cookie'] button"),
        ConsentMatcher::css("[class*='cookie'] button"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid consent matcher {input:?}: expected `text:<tag>:<label>` or `css:<selector>`")]
pub struct ParseConsentMatcherError {
    input: String,
}

impl FromStr for ConsentMatcher {
    type Err = ParseConsentMatcherError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let error = || ParseConsentMatcherError {
            input: input.to_string(),
        };
        let trimmed = input.trim();
        if let Some(selector) = trimmed.strip_prefix("css:") {
            let selector = selector.trim();
            if selector.is_empty() {
                return Err(error());
            }
            return Ok(ConsentMatcher::css(selector));
        }
        if let Some(rest) = trimmed.strip_prefix("text:") {
            let (tag, text) = rest.split_once(':').ok_or_else(error)?;
            let (tag, text) = (tag.trim(), text.trim());
            if tag.is_empty() || text.is_empty() {
                return Err(error());
            }
            return Ok(ConsentMatcher::text(tag, text));
        }
        Err(error())
    }
}

impl fmt::Display for ConsentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsentMatcher::Text { tag, text } => write!(f, "text:{tag}:{text}"),
            ConsentMatcher::Css(selector) => write!(f, "css:{selector}"),
        }
    }
}

fn js_string(value: &str) -> String {
    // A JSON string literal is a valid JavaScript string literal.
    serde_json::Value::String(value.to_string()).to_string()
}
