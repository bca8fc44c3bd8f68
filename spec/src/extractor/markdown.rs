//! Markdown event scanning.
//!
//! Reduces a Blueprint to the three things the extractor cares about:
//! headings, fenced code blocks, and paragraphs, each tagged with the
//! index of the heading it appears under.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};

/// A heading in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Heading level, 1 through 6.
    pub level: u8,
    /// Plain text of the heading.
    pub text: String,
}

/// A code block with its info string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// First word of the fence info string, lowercased (`python`, `toml`).
    /// Empty for indented blocks and bare fences.
    pub lang: String,
    /// Block contents.
    pub text: String,
    /// Index into [`Document::headings`] of the enclosing heading.
    pub heading: Option<usize>,
}

/// A paragraph's plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// Concatenated inline text.
    pub text: String,
    /// Index into [`Document::headings`] of the enclosing heading.
    pub heading: Option<usize>,
}

/// The scanned Blueprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Headings in document order.
    pub headings: Vec<Heading>,
    /// Code blocks in document order.
    pub blocks: Vec<CodeBlock>,
    /// Paragraphs in document order.
    pub paragraphs: Vec<Paragraph>,
}

enum Capture {
    None,
    Heading(u8, String),
    Block(String, String),
    Paragraph(String),
}

fn level_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Scans markdown text into a [`Document`].
#[must_use]
pub fn scan(text: &str) -> Document {
    let mut doc = Document::default();
    let mut capture = Capture::None;

    for event in Parser::new(text) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                capture = Capture::Heading(level_number(level), String::new());
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_ascii_lowercase(),
                    CodeBlockKind::Indented => String::new(),
                };
                capture = Capture::Block(lang, String::new());
            }
            Event::Start(Tag::Paragraph) => {
                if matches!(capture, Capture::None) {
                    capture = Capture::Paragraph(String::new());
                }
            }
            Event::Text(t) | Event::Code(t) => match &mut capture {
                Capture::Heading(_, buf) | Capture::Block(_, buf) | Capture::Paragraph(buf) => {
                    buf.push_str(&t)
                }
                Capture::None => {}
            },
            Event::SoftBreak | Event::HardBreak => {
                if let Capture::Paragraph(buf) | Capture::Heading(_, buf) = &mut capture {
                    buf.push(' ');
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Capture::Heading(level, text) = std::mem::replace(&mut capture, Capture::None)
                {
                    doc.headings.push(Heading {
                        level,
                        text: text.trim().to_string(),
                    });
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Capture::Block(lang, text) = std::mem::replace(&mut capture, Capture::None) {
                    let heading = doc.headings.len().checked_sub(1);
                    doc.blocks.push(CodeBlock { lang, text, heading });
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if let Capture::Paragraph(text) = std::mem::replace(&mut capture, Capture::None) {
                    let heading = doc.headings.len().checked_sub(1);
                    doc.paragraphs.push(Paragraph {
                        text: text.trim().to_string(),
                        heading,
                    });
                }
            }
            _ => {}
        }
    }

    doc
}

impl Document {
    /// Returns code blocks tagged with the given language.
    pub fn blocks_tagged<'a>(&'a self, lang: &'a str) -> impl Iterator<Item = &'a CodeBlock> {
        self.blocks.iter().filter(move |b| b.lang == lang)
    }

    /// Returns the first heading whose text contains any of `needles`
    /// (case-insensitive).
    #[must_use]
    pub fn find_heading(&self, needles: &[&str]) -> Option<usize> {
        self.headings.iter().position(|h| {
            let text = h.text.to_lowercase();
            needles.iter().any(|n| text.contains(n))
        })
    }

    /// Returns the first code block inside the section opened by heading
    /// `index`, including its sub-sections.
    #[must_use]
    pub fn first_block_in_section(&self, index: usize) -> Option<&CodeBlock> {
        let level = self.headings.get(index)?.level;
        let end = self
            .headings
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, h)| h.level <= level)
            .map_or(self.headings.len(), |(i, _)| i);
        self.blocks
            .iter()
            .find(|b| b.heading.is_some_and(|h| h >= index && h < end))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DOC: &str = "# Demo\n\nFirst paragraph.\n\n## 1. Models\n\n```python\nclass A(models.Model):\n    pass\n```\n\n## 2. Layout\n\n### Tree\n\n```\nroot/\n```\n";

    #[test]
    fn scans_headings_blocks_and_paragraphs() {
        let doc = scan(DOC);
        assert_eq!(doc.headings.len(), 4);
        assert_eq!(doc.headings[1].text, "1. Models");
        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.blocks[0].lang, "python");
        assert_eq!(doc.blocks[0].heading, Some(1));
        assert_eq!(doc.paragraphs[0].text, "First paragraph.");
    }

    #[test]
    fn section_includes_subsections() {
        let doc = scan(DOC);
        let idx = doc.find_heading(&["layout"]);
        assert_eq!(idx, Some(2));
        let block = idx.and_then(|i| doc.first_block_in_section(i));
        assert_eq!(block.map(|b| b.text.as_str()), Some("root/\n"));
    }

    #[test]
    fn section_without_block_is_none() {
        let doc = scan("# A\n\n## Empty\n\ntext\n\n## Next\n\n```\nx\n```\n");
        let idx = doc.find_heading(&["empty"]).unwrap();
        assert!(doc.first_block_in_section(idx).is_none());
    }
}
