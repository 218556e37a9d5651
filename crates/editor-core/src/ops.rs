use serde::{Deserialize, Serialize};

use scriv_rtf::{Document, Paragraph, RunAttrs, Script, StyledRun};

use crate::error::EditError;

/// A byte offset inside one paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextPoint {
    pub paragraph: usize,
    pub offset: usize,
}

impl TextPoint {
    pub fn new(paragraph: usize, offset: usize) -> Self {
        Self { paragraph, offset }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: TextPoint,
    pub end: TextPoint,
}

impl TextRange {
    /// Builds a range from two points in either order.
    pub fn new(a: TextPoint, b: TextPoint) -> Self {
        if b < a {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn collapsed(point: TextPoint) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    /// A range inside a single paragraph.
    pub fn within(paragraph: usize, start: usize, end: usize) -> Self {
        Self::new(TextPoint::new(paragraph, start), TextPoint::new(paragraph, end))
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    fn ordered(self) -> Self {
        Self::new(self.start, self.end)
    }
}

/// Replacement for an optional table reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefPatch {
    Set(u32),
    /// Fall back to the document default.
    Clear,
}

impl RefPatch {
    fn apply(self, value: &mut Option<u32>) {
        *value = match self {
            Self::Set(ix) => Some(ix),
            Self::Clear => None,
        };
    }
}

impl From<Option<u32>> for RefPatch {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Self::Clear, Self::Set)
    }
}

/// Attribute changes for [`Op::FormatText`]; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Script>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<RefPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<RefPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<RefPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<RefPatch>,
}

impl AttrPatch {
    pub fn bold(on: bool) -> Self {
        Self {
            bold: Some(on),
            ..Default::default()
        }
    }

    pub fn italic(on: bool) -> Self {
        Self {
            italic: Some(on),
            ..Default::default()
        }
    }

    pub fn underline(on: bool) -> Self {
        Self {
            underline: Some(on),
            ..Default::default()
        }
    }

    pub fn strikethrough(on: bool) -> Self {
        Self {
            strikethrough: Some(on),
            ..Default::default()
        }
    }

    pub fn script(script: Script) -> Self {
        Self {
            script: Some(script),
            ..Default::default()
        }
    }

    pub fn font(font: Option<u32>) -> Self {
        Self {
            font: Some(font.into()),
            ..Default::default()
        }
    }

    /// Half-points, as in RTF.
    pub fn font_size(size: Option<u32>) -> Self {
        Self {
            font_size: Some(size.into()),
            ..Default::default()
        }
    }

    pub fn color(color: Option<u32>) -> Self {
        Self {
            color: Some(color.into()),
            ..Default::default()
        }
    }

    pub fn highlight(color: Option<u32>) -> Self {
        Self {
            highlight: Some(color.into()),
            ..Default::default()
        }
    }

    pub fn apply(&self, attrs: &mut RunAttrs) {
        if let Some(on) = self.bold {
            attrs.bold = on;
        }
        if let Some(on) = self.italic {
            attrs.italic = on;
        }
        if let Some(on) = self.underline {
            attrs.underline = on;
        }
        if let Some(on) = self.strikethrough {
            attrs.strikethrough = on;
        }
        if let Some(script) = self.script {
            attrs.script = script;
        }
        if let Some(patch) = self.font {
            patch.apply(&mut attrs.font);
        }
        if let Some(patch) = self.font_size {
            patch.apply(&mut attrs.font_size);
        }
        if let Some(patch) = self.color {
            patch.apply(&mut attrs.color);
        }
        if let Some(patch) = self.highlight {
            patch.apply(&mut attrs.highlight);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// Line breaks in `text` split the paragraph. Without `attrs` the text
    /// takes the formatting of the character before `at`.
    InsertText {
        at: TextPoint,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attrs: Option<RunAttrs>,
    },
    /// A range spanning paragraphs joins the first and last of them.
    RemoveText { range: TextRange },
    FormatText { range: TextRange, patch: AttrPatch },
    InsertParagraph { index: usize, paragraph: Paragraph },
    RemoveParagraph { index: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub ops: Vec<Op>,
    #[serde(default)]
    pub meta: TransactionMeta,
}

impl Transaction {
    pub fn new(ops: Vec<Op>) -> Self {
        Self {
            ops,
            meta: TransactionMeta::default(),
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }

    pub fn insert_text(at: TextPoint, text: impl Into<String>) -> Self {
        Self::new(vec![Op::InsertText {
            at,
            text: text.into(),
            attrs: None,
        }])
    }

    pub fn remove_text(range: TextRange) -> Self {
        Self::new(vec![Op::RemoveText { range }])
    }

    pub fn format_text(range: TextRange, patch: AttrPatch) -> Self {
        Self::new(vec![Op::FormatText { range, patch }])
    }
}

pub(crate) fn apply_op_to(doc: &mut Document, op: Op) -> Result<(), EditError> {
    match op {
        Op::InsertText { at, text, attrs } => {
            check_point(doc, at)?;
            if let Some(attrs) = &attrs {
                check_attrs(attrs)?;
            }
            let paragraph = &mut doc.paragraphs[at.paragraph];
            let attrs = attrs.unwrap_or_else(|| paragraph.attrs_at(at.offset));

            let text = text.replace("\r\n", "\n").replace('\r', "\n");
            let mut lines = text.split('\n');
            let first = lines.next().unwrap_or_default();
            let rest: Vec<&str> = lines.collect();
            if rest.is_empty() {
                paragraph.insert_text(at.offset, first, &attrs);
                return Ok(());
            }

            let tail = paragraph.split_off(at.offset);
            paragraph.push_text(first, &attrs);
            let mut inserted: Vec<Paragraph> = rest
                .iter()
                .map(|line| Paragraph::from_runs([StyledRun::new(*line, attrs.clone())]))
                .collect();
            if let Some(last) = inserted.last_mut() {
                last.append(tail);
            }
            let index = at.paragraph + 1;
            doc.paragraphs.splice(index..index, inserted);
            Ok(())
        }
        Op::RemoveText { range } => {
            let TextRange { start, end } = range.ordered();
            check_point(doc, start)?;
            check_point(doc, end)?;
            if start.paragraph == end.paragraph {
                doc.paragraphs[start.paragraph].remove_range(start.offset..end.offset);
                return Ok(());
            }

            let tail = doc.paragraphs[end.paragraph].split_off(end.offset);
            let first = &mut doc.paragraphs[start.paragraph];
            first.split_off(start.offset);
            first.append(tail);
            doc.paragraphs.drain(start.paragraph + 1..=end.paragraph);
            Ok(())
        }
        Op::FormatText { range, patch } => {
            let mut patched = RunAttrs::default();
            patch.apply(&mut patched);
            check_attrs(&patched)?;
            let TextRange { start, end } = range.ordered();
            check_point(doc, start)?;
            check_point(doc, end)?;
            for ix in start.paragraph..=end.paragraph {
                let paragraph = &mut doc.paragraphs[ix];
                let from = if ix == start.paragraph { start.offset } else { 0 };
                let to = if ix == end.paragraph {
                    end.offset
                } else {
                    paragraph.len()
                };
                paragraph.map_attrs(from..to, |attrs| patch.apply(attrs));
            }
            Ok(())
        }
        Op::InsertParagraph {
            index,
            mut paragraph,
        } => {
            let count = doc.paragraphs.len();
            if index > count {
                return Err(EditError::InvalidParagraph {
                    paragraph: index,
                    count,
                });
            }
            if paragraph.runs.iter().any(|run| run.text.contains(['\n', '\r'])) {
                return Err(EditError::LineBreakInParagraph { paragraph: index });
            }
            for run in &paragraph.runs {
                check_attrs(&run.attrs)?;
            }
            paragraph.normalize();
            doc.paragraphs.insert(index, paragraph);
            Ok(())
        }
        Op::RemoveParagraph { index } => {
            let count = doc.paragraphs.len();
            if index >= count {
                return Err(EditError::InvalidParagraph {
                    paragraph: index,
                    count,
                });
            }
            doc.paragraphs.remove(index);
            if doc.paragraphs.is_empty() {
                doc.paragraphs.push(Paragraph::new());
            }
            Ok(())
        }
    }
}

/// Values the RTF writer cannot express.
fn check_attrs(attrs: &RunAttrs) -> Result<(), EditError> {
    if attrs.font_size == Some(0) {
        return Err(EditError::InvalidAttrs {
            reason: "font size is zero",
        });
    }
    let out_of_range = [attrs.font, attrs.font_size, attrs.color, attrs.highlight]
        .into_iter()
        .flatten()
        .any(|value| i32::try_from(value).is_err());
    if out_of_range {
        return Err(EditError::InvalidAttrs {
            reason: "attribute value exceeds the RTF parameter range",
        });
    }
    Ok(())
}

fn check_point(doc: &Document, point: TextPoint) -> Result<(), EditError> {
    let Some(paragraph) = doc.paragraphs.get(point.paragraph) else {
        return Err(EditError::InvalidParagraph {
            paragraph: point.paragraph,
            count: doc.paragraphs.len(),
        });
    };
    let len = paragraph.len();
    if point.offset > len || paragraph.clamp_offset(point.offset) != point.offset {
        return Err(EditError::InvalidPoint {
            paragraph: point.paragraph,
            offset: point.offset,
            len,
        });
    }
    Ok(())
}
