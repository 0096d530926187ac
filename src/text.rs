use std::sync::LazyLock;

use regex::Regex;

static BR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static NL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\r\n]+").unwrap());

/// Collapse a table cell's inner HTML to plain text. `<br>` runs become line
/// breaks, all other markup is dropped, literal newlines inside a visual line
/// collapse to spaces, blank lines vanish.
pub fn flatten_cell(html: &str) -> String {
    let marked = BR.replace_all(html, "\u{1}");
    let stripped = TAG.replace_all(&marked, "");
    let flat = NL.replace_all(&stripped, " ");

    let mut out = String::with_capacity(flat.len());
    for line in flat.split('\u{1}') {
        let line = decode_entities(line);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

/// The portal only ever emits the entities below; anything rarer survives
/// verbatim.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
