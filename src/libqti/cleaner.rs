use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static MARKDOWN_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([\\`*_{}\[\]()#+\-.!|<>])").unwrap());

/// Flattens an HTML fragment from a quiz export into one line of plain text.
///
/// Links survive as inline `[label](href)` markup. `None` and empty input both
/// come back as an empty string.
pub fn html_to_clean_text(html: Option<&str>) -> String {
    let html = match html {
        Some(h) if !h.trim().is_empty() => h,
        _ => return String::new(),
    };
    let converted = html2md::parse_html(html);
    let unescaped = MARKDOWN_ESCAPE.replace_all(&converted, "$1");
    collapse_whitespace(&unescaped)
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
