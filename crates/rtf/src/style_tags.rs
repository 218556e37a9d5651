//! Scrivener style tags.
//!
//! Scrivener marks compile-time styles with literal placeholders such as
//! `<$Scr_Cs::2>` (character style) and `<$Scr_Ps::0>` (paragraph style),
//! with `<!$Scr_Cs::2>` closing a span. They are stripped from the visible
//! text and kept as annotations anchored at a paragraph offset.
//!
//! Anchors are plain text positions, so they stop meaning anything once the
//! text around them is edited. Callers must treat annotations as stale after
//! the first edit; [`embed_style_tags`] only makes sense on unedited text.

use serde::{Deserialize, Serialize};

use crate::model::Paragraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleTagKind {
    CharacterStyle,
    ParagraphStyle,
}

impl StyleTagKind {
    fn marker(self) -> &'static str {
        match self {
            Self::CharacterStyle => "Cs",
            Self::ParagraphStyle => "Ps",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleTagAnnotation {
    pub kind: StyleTagKind,
    /// `<!$Scr_..>` form.
    #[serde(default)]
    pub closing: bool,
    pub style_id: u32,
    pub paragraph: usize,
    /// Byte offset into the paragraph's visible text, i.e. after every tag
    /// in the paragraph has been stripped.
    pub offset: usize,
}

impl StyleTagAnnotation {
    pub fn tag_text(&self) -> String {
        format!(
            "<{}$Scr_{}::{}>",
            if self.closing { "!" } else { "" },
            self.kind.marker(),
            self.style_id
        )
    }
}

/// Strips every style tag from `paragraphs`, returning the annotations in
/// document order.
pub fn decode_scrivener_tags(paragraphs: &mut [Paragraph]) -> Vec<StyleTagAnnotation> {
    let mut annotations = Vec::new();
    for (paragraph_ix, paragraph) in paragraphs.iter_mut().enumerate() {
        let text = paragraph.text();
        let found = find_tags(&text);
        if found.is_empty() {
            continue;
        }

        let mut removed = 0usize;
        for tag in &found {
            annotations.push(StyleTagAnnotation {
                kind: tag.kind,
                closing: tag.closing,
                style_id: tag.style_id,
                paragraph: paragraph_ix,
                offset: tag.range.start - removed,
            });
            removed += tag.range.len();
        }
        for tag in found.iter().rev() {
            paragraph.remove_range(tag.range.clone());
        }
    }
    annotations
}

/// Re-inserts annotations into a copy of `paragraphs`.
///
/// Annotations that no longer fit their paragraph are skipped.
pub fn embed_style_tags(
    paragraphs: &[Paragraph],
    annotations: &[StyleTagAnnotation],
) -> Vec<Paragraph> {
    let mut out = paragraphs.to_vec();
    // Walking backwards keeps earlier offsets valid and preserves the order
    // of tags that share an offset.
    for annotation in annotations.iter().rev() {
        let Some(paragraph) = out.get_mut(annotation.paragraph) else {
            continue;
        };
        if annotation.offset > paragraph.len() {
            continue;
        }
        let offset = paragraph.clamp_offset(annotation.offset);
        let attrs = paragraph.attrs_at(offset);
        paragraph.insert_text(offset, &annotation.tag_text(), &attrs);
    }
    out
}

struct FoundTag {
    range: std::ops::Range<usize>,
    kind: StyleTagKind,
    closing: bool,
    style_id: u32,
}

fn find_tags(text: &str) -> Vec<FoundTag> {
    let mut found = Vec::new();
    let mut search_from = 0usize;
    while let Some(rel) = text[search_from..].find('<') {
        let start = search_from + rel;
        match match_tag(&text[start..]) {
            Some((len, kind, closing, style_id)) => {
                found.push(FoundTag {
                    range: start..start + len,
                    kind,
                    closing,
                    style_id,
                });
                search_from = start + len;
            }
            None => search_from = start + 1,
        }
    }
    found
}

fn match_tag(s: &str) -> Option<(usize, StyleTagKind, bool, u32)> {
    let rest = s.strip_prefix('<')?;
    let (closing, rest) = match rest.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };
    let rest = rest.strip_prefix("$Scr_")?;
    let (kind, rest) = if let Some(rest) = rest.strip_prefix("Cs::") {
        (StyleTagKind::CharacterStyle, rest)
    } else if let Some(rest) = rest.strip_prefix("Ps::") {
        (StyleTagKind::ParagraphStyle, rest)
    } else {
        return None;
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || rest.as_bytes().get(digits) != Some(&b'>') {
        return None;
    }
    let style_id = rest[..digits].parse().ok()?;
    let len = s.len() - rest.len() + digits + 1;
    Some((len, kind, closing, style_id))
}
