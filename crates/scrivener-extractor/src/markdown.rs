//! Markdown cleanup for generated text
//!
//! Providers decorate prose with citation markers, source annotations and
//! reference lists that have no place in published content. Cleanup strips
//! those, then re-renders what is left into one canonical markdown form.

use crate::error::ExtractorError;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use regex::{Captures, Regex};
use std::fmt::Write;
use std::sync::LazyLock;

const INVISIBLE: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}', '\u{00AD}'];

/// `[1]`, `[2, 3]`, `[4-6]`, `[^note]`; group 2 catches a following `(`
static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[ \t]*\[(\d+(?:\s*[,\-–]\s*\d+)*|\^[^\]\s]+)\](\()?").expect("valid regex")
});

static SOURCE_NOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[ \t]*\((?:source|sources|via):[^)]*\)").expect("valid regex")
});

static REFERENCES_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*)?(?:references|sources|citations|bibliography|footnotes)(?:\*\*)?:?(?:\*\*)?[ \t]*$",
    )
    .expect("valid regex")
});

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){3,}").expect("valid regex"));

/// Clean generated text
///
/// With `reformat` set the text is re-rendered to canonical markdown.
pub fn clean_text(text: &str, reformat: bool) -> Result<String, ExtractorError> {
    let text: String = text.chars().filter(|c| !INVISIBLE.contains(c)).collect();
    let text = strip_citations(&text);
    let text = SOURCE_NOTE_RE.replace_all(&text, "");
    let text = trim_reference_section(&text);
    let text = if reformat {
        canonicalize(text)?
    } else {
        text.to_string()
    };
    let text = BLANK_RUN_RE.replace_all(&text, "\n\n");
    Ok(text.trim().to_string())
}

fn strip_citations(text: &str) -> String {
    CITATION_RE
        .replace_all(text, |caps: &Captures| {
            // `[1](...)` is a markdown link, not a citation
            if caps.get(2).is_some() {
                caps[0].to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

fn trim_reference_section(text: &str) -> &str {
    match REFERENCES_HEADING_RE.find_iter(text).last() {
        Some(heading) if heading.start() > 0 => &text[..heading.start()],
        _ => text,
    }
}

/// Re-render markdown in canonical form
///
/// Emphasis becomes `*`, strong `**`, bullets `-`, headings ATX and code
/// blocks fenced; blocks are separated by exactly one blank line.
pub fn canonicalize(text: &str) -> Result<String, ExtractorError> {
    let mut writer = Writer::default();
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        writer
            .event(event)
            .map_err(|_| ExtractorError::Normalization("markdown rendering failed".to_string()))?;
    }
    let rendered = writer.out.trim_end().to_string();
    if rendered.is_empty() && !text.trim().is_empty() {
        return Err(ExtractorError::Normalization(
            "markdown rendering dropped all content".to_string(),
        ));
    }
    Ok(rendered)
}

/// What an `End` event closes
enum Frame {
    Paragraph,
    Heading,
    BlockQuote,
    CodeBlock,
    List,
    Item,
    Emphasis,
    Strong,
    Strikethrough,
    Link { url: String, title: String },
    Other,
}

#[derive(Default)]
struct Writer {
    out: String,
    frames: Vec<Frame>,
    prefixes: Vec<String>,
    /// Next number per open list; `None` for bullets
    lists: Vec<Option<u64>>,
    /// A block ended and the next one needs a blank line
    separate: bool,
    /// Just opened a container line (item marker or quote marker)
    fresh_line: bool,
}

impl Writer {
    fn event(&mut self, event: Event<'_>) -> std::fmt::Result {
        match event {
            Event::Start(tag) => self.start(tag)?,
            Event::End(_) => self.end()?,
            Event::Text(text) => {
                if matches!(self.frames.last(), Some(Frame::CodeBlock)) {
                    self.write_lines(&text);
                } else {
                    self.write(&text);
                }
            }
            Event::Code(code) => {
                let fence = if code.contains('`') { "``" } else { "`" };
                let pad = if code.contains('`') { " " } else { "" };
                write!(self.out, "{fence}{pad}{code}{pad}{fence}")?;
                self.fresh_line = false;
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                self.write_lines(html.trim_end_matches('\n'))
            }
            Event::SoftBreak => self.line_break(),
            Event::HardBreak => {
                self.write("\\");
                self.line_break();
            }
            Event::Rule => {
                self.block_start();
                self.write("---");
                self.separate = true;
            }
            Event::TaskListMarker(done) => self.write(if done { "[x] " } else { "[ ] " }),
            _ => {}
        }
        Ok(())
    }

    fn start(&mut self, tag: Tag<'_>) -> std::fmt::Result {
        let frame = match tag {
            Tag::Paragraph | Tag::HtmlBlock => {
                self.block_start();
                Frame::Paragraph
            }
            Tag::Heading { level, .. } => {
                self.block_start();
                let hashes = "#".repeat(level as usize);
                write!(self.out, "{hashes} ")?;
                Frame::Heading
            }
            Tag::BlockQuote(_) => {
                self.block_start();
                self.out.push_str("> ");
                self.prefixes.push("> ".to_string());
                self.fresh_line = true;
                Frame::BlockQuote
            }
            Tag::CodeBlock(kind) => {
                self.block_start();
                self.out.push_str("```");
                if let CodeBlockKind::Fenced(lang) = kind {
                    self.out.push_str(&lang);
                }
                self.line_break();
                Frame::CodeBlock
            }
            Tag::List(start) => {
                if !self.fresh_line {
                    if self.separate {
                        self.block_start();
                    } else if !self.out.is_empty() {
                        self.line_break();
                    }
                }
                self.lists.push(start);
                Frame::List
            }
            Tag::Item => {
                if !self.fresh_line && !self.at_line_start() {
                    self.line_break();
                }
                self.separate = false;
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                self.out.push_str(&marker);
                self.prefixes.push(" ".repeat(marker.len()));
                self.fresh_line = true;
                Frame::Item
            }
            Tag::Emphasis => {
                self.write("*");
                Frame::Emphasis
            }
            Tag::Strong => {
                self.write("**");
                Frame::Strong
            }
            Tag::Strikethrough => {
                self.write("~~");
                Frame::Strikethrough
            }
            Tag::Link {
                dest_url, title, ..
            } => {
                self.write("[");
                Frame::Link {
                    url: dest_url.to_string(),
                    title: title.to_string(),
                }
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.write("![");
                Frame::Link {
                    url: dest_url.to_string(),
                    title: title.to_string(),
                }
            }
            _ => Frame::Other,
        };
        self.frames.push(frame);
        Ok(())
    }

    fn end(&mut self) -> std::fmt::Result {
        match self.frames.pop() {
            Some(Frame::Paragraph) | Some(Frame::Heading) => self.separate = true,
            Some(Frame::BlockQuote) => {
                self.prefixes.pop();
                self.separate = true;
            }
            Some(Frame::CodeBlock) => {
                if !self.at_line_start() {
                    self.line_break();
                }
                self.out.push_str("```");
                self.separate = true;
            }
            Some(Frame::List) => {
                self.lists.pop();
                self.separate = true;
            }
            Some(Frame::Item) => {
                self.prefixes.pop();
                self.fresh_line = false;
                self.separate = false;
            }
            Some(Frame::Emphasis) => self.write("*"),
            Some(Frame::Strong) => self.write("**"),
            Some(Frame::Strikethrough) => self.write("~~"),
            Some(Frame::Link { url, title }) => {
                if title.is_empty() {
                    write!(self.out, "]({url})")?;
                } else {
                    write!(self.out, "]({url} \"{title}\")")?;
                }
            }
            Some(Frame::Other) | None => {}
        }
        Ok(())
    }

    fn prefix(&self) -> String {
        self.prefixes.concat()
    }

    fn write(&mut self, text: &str) {
        self.out.push_str(text);
        self.fresh_line = false;
    }

    fn write_lines(&mut self, text: &str) {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.line_break();
            }
            self.out.push_str(line);
        }
        self.fresh_line = false;
    }

    fn line_break(&mut self) {
        self.out.push('\n');
        let prefix = self.prefix();
        self.out.push_str(&prefix);
    }

    fn at_line_start(&self) -> bool {
        let prefix = self.prefix();
        self.out.is_empty() || self.out.ends_with(&format!("\n{prefix}"))
    }

    fn block_start(&mut self) {
        if self.fresh_line {
            self.fresh_line = false;
            self.separate = false;
            return;
        }
        if self.separate && !self.out.is_empty() {
            let prefix = self.prefix();
            self.out.push('\n');
            self.out.push_str(prefix.trim_end());
            self.line_break();
        }
        self.separate = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_citations_keeps_links() {
        let cleaned = clean_text("Rust is fast [1]. See [2](https://example.com) and [^a].", false).unwrap();
        assert_eq!(cleaned, "Rust is fast. See [2](https://example.com) and.");
    }

    #[test]
    fn test_strips_citation_ranges() {
        let cleaned = clean_text("Claims[1, 2] and more[3-5].", false).unwrap();
        assert_eq!(cleaned, "Claims and more.");
    }

    #[test]
    fn test_strips_source_notes_and_invisible_chars() {
        let cleaned = clean_text("Hel\u{200B}lo (Source: Wikipedia) world", false).unwrap();
        assert_eq!(cleaned, "Hello world");
    }

    #[test]
    fn test_trims_trailing_reference_section() {
        let text = "Body text.\n\n## References\n\n1. https://a.example\n2. https://b.example";
        assert_eq!(clean_text(text, false).unwrap(), "Body text.");

        let text = "Body text.\n\n**Sources:**\n- one";
        assert_eq!(clean_text(text, false).unwrap(), "Body text.");
    }

    #[test]
    fn test_collapses_blank_runs() {
        let cleaned = clean_text("a\n\n\n\n\nb", false).unwrap();
        assert_eq!(cleaned, "a\n\nb");
    }

    #[test]
    fn test_canonical_emphasis_and_lists() {
        let rendered = canonicalize("__bold__ and _em_\n\n* one\n* two").unwrap();
        assert_eq!(rendered, "**bold** and *em*\n\n- one\n- two");
    }

    #[test]
    fn test_canonical_headings_and_links() {
        let rendered = canonicalize("Title\n=====\n\nRead [the docs](https://docs.rs).").unwrap();
        assert_eq!(rendered, "# Title\n\nRead [the docs](https://docs.rs).");
    }

    #[test]
    fn test_canonical_ordered_and_nested_lists() {
        let rendered = canonicalize("3. a\n4. b\n   - c").unwrap();
        assert_eq!(rendered, "3. a\n4. b\n   - c");
    }

    #[test]
    fn test_canonical_code_and_quotes() {
        let rendered = canonicalize("> quoted\n\n~~~rust\nfn main() {}\n~~~").unwrap();
        assert_eq!(rendered, "> quoted\n\n```rust\nfn main() {}\n```");
    }

    #[test]
    fn test_plain_paragraphs_unchanged() {
        let text = "First paragraph.\n\nSecond paragraph.";
        assert_eq!(clean_text(text, true).unwrap(), text);
    }
}
