//! Text direction detection and inline-edit markup cleanup.

use crate::model::TextAlign;

/// Paint direction of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

/// Hebrew, Arabic, Syriac, Thaana, N'Ko and the Arabic presentation forms.
fn is_rtl_char(c: char) -> bool {
    matches!(c, '\u{0590}'..='\u{08FF}' | '\u{FB1D}'..='\u{FDFF}' | '\u{FE70}'..='\u{FEFF}')
}

/// Direction of `content`, decided by its first non-whitespace character.
pub fn detect_direction(content: &str) -> TextDirection {
    match content.trim().chars().next() {
        Some(c) if is_rtl_char(c) => TextDirection::RightToLeft,
        _ => TextDirection::LeftToRight,
    }
}

/// Alignment used for painting: right-to-left text is always right aligned.
pub fn effective_align(content: &str, stored: TextAlign) -> TextAlign {
    match detect_direction(content) {
        TextDirection::RightToLeft => TextAlign::Right,
        TextDirection::LeftToRight => stored,
    }
}

const BLOCK_TAGS: [&str; 5] = ["div", "p", "li", "h1", "h2"];

/// Convert inline-editor markup back to plain text.
///
/// Line breaks and block closers become newlines, other tags are dropped and
/// common entities are decoded. Trailing newlines are trimmed.
pub fn markup_to_plain_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' => match rest.find('>') {
                Some(end) => {
                    let tag = rest[1..end].trim().to_ascii_lowercase();
                    let name = tag
                        .trim_start_matches('/')
                        .split(|c: char| c.is_whitespace() || c == '/')
                        .next()
                        .unwrap_or("");
                    if name == "br" || (tag.starts_with('/') && BLOCK_TAGS.contains(&name)) {
                        out.push('\n');
                    }
                    rest = &rest[end + 1..];
                }
                None => {
                    out.push_str(rest);
                    rest = "";
                }
            },
            '&' => {
                let (decoded, len) = decode_entity(rest);
                out.push_str(decoded);
                rest = &rest[len..];
            }
            _ => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    let trimmed = out.trim_end_matches('\n').len();
    out.truncate(trimmed);
    out
}

/// Decode the entity at the start of `input`, returning the text and bytes consumed.
fn decode_entity(input: &str) -> (&str, usize) {
    const ENTITIES: [(&str, &str); 7] = [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&apos;", "'"),
        ("&nbsp;", " "),
    ];
    ENTITIES
        .iter()
        .find(|(entity, _)| input.starts_with(entity))
        .map(|(entity, text)| (*text, entity.len()))
        .unwrap_or(("&", 1))
}
