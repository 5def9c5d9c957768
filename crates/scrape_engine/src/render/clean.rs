use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};
use scrape_core::drop_short_lines;

/// Elements whose whole subtree is never visible text.
const NOISE_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "form", "iframe", "noscript",
    "template",
];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "figure", "figcaption", "table", "tr", "td",
    "th", "blockquote", "address", "ul", "ol", "li", "dl", "dt", "dd", "pre", "h1", "h2", "h3",
    "h4", "h5", "h6", "hr", "br", "body", "details", "summary", "caption",
];

/// Visible text of a rendered page, cleaned for ingestion: noise elements are
/// skipped and lines of twenty characters or fewer are dropped.
pub fn clean_page_text(html: &str) -> String {
    drop_short_lines(&visible_text(html))
}

/// Visible text with one line per block element. Inline content is joined
/// with single spaces; whitespace runs collapse.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut ctx = TextContext::default();
    for child in document.root_element().children() {
        visit_node(child, &mut ctx);
    }
    ctx.into_text()
}

fn visit_node(node: NodeRef<'_, Node>, ctx: &mut TextContext) {
    match node.value() {
        Node::Text(text) => ctx.append_text(text),
        Node::Element(_) => {
            if let Some(element) = ElementRef::wrap(node) {
                visit_element(element, ctx);
            }
        }
        _ => {
            for child in node.children() {
                visit_node(child, ctx);
            }
        }
    }
}

fn visit_element(element: ElementRef<'_>, ctx: &mut TextContext) {
    let tag = element.value().name().to_ascii_lowercase();
    if NOISE_TAGS.contains(&tag.as_str()) {
        return;
    }
    let block = BLOCK_TAGS.contains(&tag.as_str());
    if block {
        ctx.ensure_newline();
    }
    for child in element.children() {
        visit_node(child, ctx);
    }
    if block {
        ctx.ensure_newline();
    }
}

#[derive(Default)]
struct TextContext {
    builder: String,
    last_char: Option<char>,
}

impl TextContext {
    fn into_text(self) -> String {
        self.builder
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn append_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch.is_whitespace() {
                if self.last_char.is_none()
                    || self.last_char == Some(' ')
                    || self.last_char == Some('\n')
                {
                    continue;
                }
                self.push_char(' ');
            } else {
                self.push_char(ch);
            }
        }
    }

    fn ensure_newline(&mut self) {
        if self.last_char == Some('\n') || self.builder.is_empty() {
            return;
        }
        self.push_char('\n');
    }

    fn push_char(&mut self, ch: char) {
        self.builder.push(ch);
        self.last_char = Some(ch);
    }
}
