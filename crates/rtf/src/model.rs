use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Font size RTF assumes when no `\fs` is in effect, in half-points.
pub const DEFAULT_FONT_SIZE: u32 = 24;

const FALLBACK_FONT_NAME: &str = "Helvetica";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

/// Character formatting carried by a run.
///
/// Font and color fields are references into [`DocumentMetadata`]; `None`
/// means the document default is in effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunAttrs {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub script: Script,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<u32>,
    /// Half-points, as written by `\fs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<u32>,
}

impl RunAttrs {
    pub fn is_plain(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StyledRun {
    pub text: String,
    #[serde(default)]
    pub attrs: RunAttrs,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, attrs: RunAttrs) -> Self {
        Self {
            text: text.into(),
            attrs,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, RunAttrs::default())
    }
}

/// One block of the document: an ordered list of runs.
///
/// Offsets taken by the editing helpers are byte offsets into the
/// paragraph's plain text; they are clamped to the nearest char boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub runs: Vec<StyledRun>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_runs(runs: impl IntoIterator<Item = StyledRun>) -> Self {
        let mut paragraph = Self::new();
        for run in runs {
            paragraph.push_text(&run.text, &run.attrs);
        }
        paragraph
    }

    pub fn plain(text: impl AsRef<str>) -> Self {
        let mut paragraph = Self::new();
        paragraph.push_text(text.as_ref(), &RunAttrs::default());
        paragraph
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.runs.iter().map(|run| run.text.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|run| run.text.is_empty())
    }

    /// Appends `text`, extending the last run when its attributes match.
    pub fn push_text(&mut self, text: &str, attrs: &RunAttrs) {
        if text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if &last.attrs == attrs => last.text.push_str(text),
            _ => self.runs.push(StyledRun::new(text, attrs.clone())),
        }
    }

    /// Drops empty runs and merges neighbours that share attributes.
    pub fn normalize(&mut self) {
        let runs = std::mem::take(&mut self.runs);
        for run in runs {
            self.push_text(&run.text, &run.attrs);
        }
    }

    pub fn append(&mut self, other: Paragraph) {
        for run in other.runs {
            self.push_text(&run.text, &run.attrs);
        }
    }

    pub fn clamp_offset(&self, offset: usize) -> usize {
        let mut cursor = 0usize;
        for run in &self.runs {
            let end = cursor + run.text.len();
            if offset <= end {
                return cursor + clamp_to_char_boundary(&run.text, offset - cursor);
            }
            cursor = end;
        }
        cursor
    }

    /// Attributes a character typed at `offset` would inherit: those of the
    /// character before it, or of the first run at the paragraph start.
    pub fn attrs_at(&self, offset: usize) -> RunAttrs {
        let mut cursor = 0usize;
        for run in &self.runs {
            let end = cursor + run.text.len();
            if offset > cursor && offset <= end {
                return run.attrs.clone();
            }
            cursor = end;
        }
        let run = if offset == 0 {
            self.runs.first()
        } else {
            self.runs.last()
        };
        run.map(|run| run.attrs.clone()).unwrap_or_default()
    }

    /// Splits the paragraph at `offset`, returning everything after it.
    pub fn split_off(&mut self, offset: usize) -> Paragraph {
        let offset = self.clamp_offset(offset);

        let mut cursor = 0usize;
        let mut split_ix = self.runs.len();
        for (ix, run) in self.runs.iter().enumerate() {
            let end = cursor + run.text.len();
            if offset < end {
                split_ix = ix;
                break;
            }
            cursor = end;
        }

        let mut tail: Vec<StyledRun> = self.runs.drain(split_ix..).collect();
        if let Some(first) = tail.first_mut() {
            let local = offset - cursor;
            if local > 0 {
                let rest = first.text.split_off(local);
                let head = std::mem::replace(&mut first.text, rest);
                self.runs.push(StyledRun::new(head, first.attrs.clone()));
            }
        }
        Paragraph { runs: tail }
    }

    pub fn insert_text(&mut self, offset: usize, text: &str, attrs: &RunAttrs) {
        let tail = self.split_off(offset);
        self.push_text(text, attrs);
        self.append(tail);
    }

    pub fn remove_range(&mut self, range: Range<usize>) {
        let start = range.start.min(range.end);
        let tail = self.split_off(range.end);
        self.split_off(start);
        self.append(tail);
    }

    /// Rewrites the attributes of every run inside `range`.
    pub fn map_attrs(&mut self, range: Range<usize>, mut f: impl FnMut(&mut RunAttrs)) {
        let start = range.start.min(range.end);
        let tail = self.split_off(range.end);
        let mut middle = self.split_off(start);
        for run in &mut middle.runs {
            f(&mut run.attrs);
        }
        self.append(middle);
        self.append(tail);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Font family class from the `\fnil` .. `\fbidi` control words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    #[default]
    Nil,
    Roman,
    Swiss,
    Modern,
    Script,
    Decor,
    Tech,
    Bidi,
}

impl FontFamily {
    pub fn from_control_word(word: &str) -> Option<Self> {
        Some(match word {
            "fnil" => Self::Nil,
            "froman" => Self::Roman,
            "fswiss" => Self::Swiss,
            "fmodern" => Self::Modern,
            "fscript" => Self::Script,
            "fdecor" => Self::Decor,
            "ftech" => Self::Tech,
            "fbidi" => Self::Bidi,
            _ => return None,
        })
    }

    pub fn control_word(self) -> &'static str {
        match self {
            Self::Nil => "fnil",
            Self::Roman => "froman",
            Self::Swiss => "fswiss",
            Self::Modern => "fmodern",
            Self::Script => "fscript",
            Self::Decor => "fdecor",
            Self::Tech => "ftech",
            Self::Bidi => "fbidi",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontEntry {
    pub name: String,
    #[serde(default)]
    pub family: FontFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<u32>,
}

impl FontEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: FontFamily::default(),
            charset: None,
        }
    }
}

/// Document-level tables and header data extracted from the RTF header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub fonts: BTreeMap<u32, FontEntry>,
    /// Positional color table; `None` is the "auto" entry.
    #[serde(default)]
    pub colors: Vec<Option<Rgb>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_font: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codepage: Option<u32>,
    /// Header groups the engine does not interpret (`\stylesheet`, `\info`,
    /// list tables), kept verbatim.
    #[serde(default)]
    pub preserved_groups: Vec<String>,
}

impl DocumentMetadata {
    pub fn font(&self, index: u32) -> Option<&FontEntry> {
        self.fonts.get(&index)
    }

    pub fn has_font(&self, index: u32) -> bool {
        self.fonts.contains_key(&index)
    }

    pub fn has_color(&self, index: u32) -> bool {
        usize::try_from(index).is_ok_and(|ix| ix < self.colors.len())
    }

    /// Resolves a run's font reference, falling back to the default font,
    /// then the first declared font.
    pub fn font_name(&self, font: Option<u32>) -> &str {
        font.and_then(|ix| self.fonts.get(&ix))
            .or_else(|| self.default_font.and_then(|ix| self.fonts.get(&ix)))
            .or_else(|| self.fonts.values().next())
            .map(|entry| entry.name.as_str())
            .unwrap_or(FALLBACK_FONT_NAME)
    }

    /// Resolves a color reference; auto entries and unknown indices are black.
    pub fn color(&self, color: Option<u32>) -> Rgb {
        color
            .and_then(|ix| self.colors.get(ix as usize).copied().flatten())
            .unwrap_or(Rgb::BLACK)
    }

    /// Returns the index of a font with this name, declaring it if needed.
    pub fn add_font(&mut self, entry: FontEntry) -> u32 {
        if let Some((&ix, _)) = self.fonts.iter().find(|(_, f)| f.name == entry.name) {
            return ix;
        }
        let ix = self.fonts.keys().next_back().map_or(0, |last| last + 1);
        self.fonts.insert(ix, entry);
        ix
    }

    /// Returns the index of `rgb` in the color table, declaring it if needed.
    /// An empty table gets the conventional leading auto entry first.
    pub fn add_color(&mut self, rgb: Rgb) -> u32 {
        if let Some(ix) = self.colors.iter().position(|c| *c == Some(rgb)) {
            return ix as u32;
        }
        if self.colors.is_empty() {
            self.colors.push(None);
        }
        self.colors.push(Some(rgb));
        (self.colors.len() - 1) as u32
    }

    pub fn resolve(&self, attrs: &RunAttrs) -> ResolvedAttrs {
        ResolvedAttrs {
            font_name: self.font_name(attrs.font).to_string(),
            font_size: attrs.font_size.unwrap_or(DEFAULT_FONT_SIZE) as f32 / 2.0,
            color: self.color(attrs.color),
            highlight: attrs
                .highlight
                .and_then(|ix| self.colors.get(ix as usize).copied().flatten()),
        }
    }
}

/// Run attributes with every table reference looked up, for hosts that render.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAttrs {
    pub font_name: String,
    /// Points.
    pub font_size: f32,
    pub color: Rgb,
    pub highlight: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            paragraphs: vec![Paragraph::new()],
            metadata: DocumentMetadata::default(),
        }
    }
}

impl Document {
    /// One empty paragraph and empty tables.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(paragraphs: Vec<Paragraph>, metadata: DocumentMetadata) -> Self {
        let mut document = Self {
            paragraphs,
            metadata,
        };
        document.normalize();
        document
    }

    pub fn from_plain_text(text: &str) -> Self {
        let paragraphs = text.split('\n').map(Paragraph::plain).collect();
        Self::new(paragraphs, DocumentMetadata::default())
    }

    /// Normalizes every paragraph and guarantees at least one paragraph.
    pub fn normalize(&mut self) {
        for paragraph in &mut self.paragraphs {
            paragraph.normalize();
        }
        if self.paragraphs.is_empty() {
            self.paragraphs.push(Paragraph::new());
        }
    }

    /// Paragraph texts joined with `\n`.
    pub fn plain_text(&self) -> String {
        let texts: Vec<String> = self.paragraphs.iter().map(Paragraph::text).collect();
        texts.join("\n")
    }

    pub fn word_count(&self) -> usize {
        self.paragraphs
            .iter()
            .map(|p| p.text().split_whitespace().count())
            .sum()
    }

    pub fn char_count(&self) -> usize {
        self.paragraphs
            .iter()
            .flat_map(|p| p.runs.iter())
            .map(|run| run.text.chars().count())
            .sum()
    }
}

pub(crate) fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}
