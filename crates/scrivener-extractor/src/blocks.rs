//! Rich-text block conversion
//!
//! Turns a markdown-flavored string into the platform's block structure:
//! one `block` per paragraph, `span` children, and `link` annotations
//! collected in `markDefs`.

use regex::Regex;
use scrivener_domain::{DocNode, Fields, KeyGenerator, BLOCK_TYPE};
use std::sync::LazyLock;

static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("valid regex"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("valid regex"));

/// Convert text into a block sequence
///
/// Empty paragraphs are dropped; text without paragraph breaks yields
/// exactly one block.
pub fn text_to_blocks<K: KeyGenerator + ?Sized>(text: &str, keys: &K) -> Vec<DocNode> {
    PARAGRAPH_BREAK_RE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| paragraph_block(p, keys))
        .collect()
}

fn paragraph_block<K: KeyGenerator + ?Sized>(paragraph: &str, keys: &K) -> DocNode {
    let mut children = Vec::new();
    let mut mark_defs = Vec::new();
    let mut cursor = 0;

    for caps in LINK_RE.captures_iter(paragraph) {
        let (Some(whole), Some(label), Some(href)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        push_span(&mut children, &paragraph[cursor..whole.start()], Vec::new(), keys);

        let mark = keys.next_key();
        let mut link = Fields::new();
        link.insert("href".to_string(), DocNode::string(href.as_str()));
        mark_defs.push(keyed("link", mark.clone(), link));

        push_span(&mut children, label.as_str(), vec![mark], keys);
        cursor = whole.end();
    }
    push_span(&mut children, &paragraph[cursor..], Vec::new(), keys);

    let mut fields = Fields::new();
    fields.insert("style".to_string(), DocNode::string("normal"));
    fields.insert("children".to_string(), DocNode::Array(children));
    fields.insert("markDefs".to_string(), DocNode::Array(mark_defs));
    keyed(BLOCK_TYPE, keys.next_key(), fields)
}

fn push_span<K: KeyGenerator + ?Sized>(
    children: &mut Vec<DocNode>,
    text: &str,
    marks: Vec<String>,
    keys: &K,
) {
    if text.is_empty() {
        return;
    }
    let mut fields = Fields::new();
    fields.insert("text".to_string(), DocNode::string(text));
    fields.insert(
        "marks".to_string(),
        DocNode::Array(marks.into_iter().map(DocNode::String).collect()),
    );
    children.push(keyed("span", keys.next_key(), fields));
}

fn keyed(tag: &str, key: String, fields: Fields) -> DocNode {
    DocNode::Tagged {
        tag: tag.to_string(),
        key: Some(key),
        fields,
    }
}
