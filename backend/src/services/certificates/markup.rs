//! Plain-text extraction from SVG and HTML template markup.
//!
//! Extraction is format-agnostic: comments and the `<head>`, `<title>`,
//! `<style>` and `<script>` blocks are dropped, every other tag is stripped,
//! and common entities decoded.

use regex::Regex;
use std::sync::LazyLock;

static HIDDEN_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)<!--.*?-->",
        r"|<head\b[^>]*>.*?</head\s*>",
        r"|<title\b[^>]*>.*?</title\s*>",
        r"|<style\b[^>]*>.*?</style\s*>",
        r"|<script\b[^>]*>.*?</script\s*>",
    ))
    .expect("block pattern is valid")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Non-empty, trimmed text lines of `markup`, in document order.
pub fn text_lines(markup: &str) -> Vec<String> {
    let visible = HIDDEN_BLOCKS.replace_all(markup, "");
    let text = TAG.replace_all(&visible, "");
    text.lines()
        .map(|line| decode_entities(line.trim()).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
