//! RTF reader: builds paragraphs of styled runs plus header metadata.
//!
//! The reader never fails. Damage in the stream is recorded as
//! [`ParseWarning`]s and the reader keeps whatever it decoded, so the host
//! always has a document to show. [`parse_strict`] turns structural damage
//! into an error for callers that must not accept a partial document.

use encoding_rs::Encoding;
use tracing::{debug, warn};

use crate::codepage::{encoding_for_charset_word, encoding_for_codepage};
use crate::error::{ParseWarning, Result, RtfError};
use crate::lexer::{Lexer, Token};
use crate::model::{Document, DocumentMetadata, FontEntry, FontFamily, Paragraph, Rgb, RunAttrs, Script};
use crate::style_tags::{StyleTagAnnotation, decode_scrivener_tags};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Header groups kept verbatim in [`DocumentMetadata::preserved_groups`].
const PRESERVED_DESTINATIONS: &[&str] = &["stylesheet", "info", "listtable", "listoverridetable"];

/// Destinations whose content is never visible text.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "annotation",
    "atnauthor",
    "atnid",
    "author",
    "bkmkend",
    "bkmkstart",
    "buptim",
    "colorschememapping",
    "comment",
    "creatim",
    "datastore",
    "doccomm",
    "fldinst",
    "footer",
    "footerf",
    "footerl",
    "footerr",
    "footnote",
    "ftncn",
    "ftnsep",
    "ftnsepc",
    "header",
    "headerf",
    "headerl",
    "headerr",
    "keywords",
    "latentstyles",
    "nonshppict",
    "object",
    "objdata",
    "operator",
    "pict",
    "printim",
    "revtim",
    "rsidtbl",
    "subject",
    "tc",
    "themedata",
    "title",
    "txe",
    "xe",
    "xmlnstbl",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub document: Document,
    /// Style tags stripped from the text, in document order.
    pub style_tags: Vec<StyleTagAnnotation>,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedDocument {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

pub fn parse(input: &str) -> ParsedDocument {
    parse_bytes(input.as_bytes())
}

pub fn parse_bytes(input: &[u8]) -> ParsedDocument {
    let parsed = Parser::new(input).run();
    debug!(
        paragraphs = parsed.document.paragraphs.len(),
        fonts = parsed.document.metadata.fonts.len(),
        colors = parsed.document.metadata.colors.len(),
        style_tags = parsed.style_tags.len(),
        warnings = parsed.warnings.len(),
        "parsed RTF document"
    );
    parsed
}

/// Like [`parse`], but rejects input whose structure is damaged.
pub fn parse_strict(input: &str) -> Result<ParsedDocument> {
    let parsed = parse(input);
    if let Some(warning) = parsed.warnings.iter().find(|w| w.is_structural()) {
        return Err(RtfError::MalformedInput(warning.clone()));
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Body,
    FontTable,
    ColorTable,
    /// Raw-captured header group; its tokens are ignored.
    Preserved,
    Skip,
}

#[derive(Debug, Clone)]
struct GroupState {
    attrs: RunAttrs,
    destination: Destination,
    /// `\ucN`: fallback characters following each `\u`.
    uc_skip: usize,
    /// Byte offset of the group's opening brace.
    start: usize,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            attrs: RunAttrs::default(),
            destination: Destination::Body,
            uc_skip: 1,
            start: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Raw,
    Hex,
}

#[derive(Debug, Default)]
struct FontBuilder {
    index: Option<u32>,
    family: FontFamily,
    charset: Option<u32>,
    name: String,
}

#[derive(Debug, Default)]
struct ColorBuilder {
    red: u8,
    green: u8,
    blue: u8,
    touched: bool,
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    state: GroupState,
    stack: Vec<GroupState>,
    encoding: &'static Encoding,
    metadata: DocumentMetadata,
    paragraphs: Vec<Paragraph>,
    current: Paragraph,
    pending: Vec<u8>,
    pending_kind: PendingKind,
    /// `\'hh` bytes of the font name being read.
    font_bytes: Vec<u8>,
    /// Fallback characters still to drop after a `\u`.
    skip_fallback: usize,
    high_surrogate: Option<u16>,
    font: FontBuilder,
    color: ColorBuilder,
    warnings: Vec<ParseWarning>,
    has_header: bool,
    /// No token has been read since the last `{`.
    at_group_start: bool,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(input),
            state: GroupState::default(),
            stack: Vec::new(),
            encoding: encoding_rs::WINDOWS_1252,
            metadata: DocumentMetadata::default(),
            paragraphs: Vec::new(),
            current: Paragraph::new(),
            pending: Vec::new(),
            pending_kind: PendingKind::Raw,
            font_bytes: Vec::new(),
            skip_fallback: 0,
            high_surrogate: None,
            font: FontBuilder::default(),
            color: ColorBuilder::default(),
            warnings: Vec::new(),
            has_header: false,
            at_group_start: false,
        }
    }

    fn run(mut self) -> ParsedDocument {
        let input = self.lexer.input();
        let bom = if input.starts_with(UTF8_BOM) { UTF8_BOM.len() } else { 0 };
        self.lexer.skip_bytes(bom);
        let body = &input[bom..];
        let leading_ws = body.iter().take_while(|b| b.is_ascii_whitespace()).count();
        self.has_header = body[leading_ws..].starts_with(br"{\rtf");
        if !self.has_header && leading_ws < body.len() {
            self.warnings.push(ParseWarning::MissingHeader);
        }

        while let Some(token) = self.lexer.next_token() {
            if self.handle_token(token) {
                self.check_trailing_content();
                break;
            }
        }
        self.flush_text();
        self.flush_surrogate();

        if !self.stack.is_empty() {
            self.warnings.push(ParseWarning::UnclosedGroups {
                count: self.stack.len(),
            });
        }

        let mut warnings = self.lexer.take_warnings();
        warnings.append(&mut self.warnings);

        let mut paragraphs = std::mem::take(&mut self.paragraphs);
        // A trailing separator closes the last paragraph; it does not open
        // an empty one.
        if !self.current.is_empty() || paragraphs.is_empty() {
            paragraphs.push(std::mem::take(&mut self.current));
        }

        let style_tags = decode_scrivener_tags(&mut paragraphs);
        let document = Document::new(paragraphs, self.metadata);
        check_references(&document, &mut warnings);

        for warning in warnings.iter().filter(|w| w.is_structural()) {
            warn!(%warning, "recovered from malformed RTF");
        }

        ParsedDocument {
            document,
            style_tags,
            warnings,
        }
    }

    /// Returns true once the outermost group has closed.
    fn handle_token(&mut self, token: Token<'a>) -> bool {
        if !matches!(token, Token::HexByte(_) | Token::Text(_)) {
            self.flush_text();
        }
        if !matches!(token, Token::HexByte(_)) {
            self.flush_font_bytes();
        }
        let at_group_start = std::mem::replace(&mut self.at_group_start, false);

        match token {
            Token::GroupStart => {
                let start = self.lexer.position() - 1;
                let mut child = self.state.clone();
                child.start = start;
                let parent = std::mem::replace(&mut self.state, child);
                self.stack.push(parent);
                self.skip_fallback = 0;
                self.at_group_start = true;
                false
            }
            Token::GroupEnd => self.end_group(),
            Token::ControlWord { name, param } => {
                self.handle_control_word(name, param, at_group_start);
                false
            }
            Token::ControlSymbol(symbol) => {
                self.handle_control_symbol(symbol);
                false
            }
            Token::HexByte(byte) => {
                match self.state.destination {
                    Destination::Body => {
                        if self.skip_fallback > 0 {
                            self.skip_fallback -= 1;
                        } else {
                            self.push_pending(PendingKind::Hex, &[byte]);
                        }
                    }
                    Destination::FontTable => {
                        if self.skip_fallback > 0 {
                            self.skip_fallback -= 1;
                        } else {
                            self.font_bytes.push(byte);
                        }
                    }
                    _ => {}
                }
                false
            }
            Token::Text(bytes) => {
                match self.state.destination {
                    Destination::Body => self.handle_body_text(bytes),
                    Destination::FontTable => self.handle_font_text(bytes),
                    Destination::ColorTable => {
                        for _ in bytes.iter().filter(|b| **b == b';') {
                            self.commit_color();
                        }
                    }
                    Destination::Preserved | Destination::Skip => {}
                }
                false
            }
        }
    }

    fn end_group(&mut self) -> bool {
        let position = self.lexer.position();
        let Some(parent) = self.stack.pop() else {
            self.warnings.push(ParseWarning::UnmatchedGroupEnd {
                position: position - 1,
            });
            return false;
        };
        let closed = std::mem::replace(&mut self.state, parent);
        self.skip_fallback = 0;

        match closed.destination {
            Destination::Preserved if self.state.destination != Destination::Preserved => {
                let raw = &self.lexer.input()[closed.start..position];
                self.metadata
                    .preserved_groups
                    .push(String::from_utf8_lossy(raw).into_owned());
            }
            Destination::FontTable => {
                if !self.font.name.trim_matches(' ').is_empty() {
                    self.commit_font();
                }
            }
            _ => {}
        }

        self.has_header && self.stack.is_empty()
    }

    fn check_trailing_content(&mut self) {
        let position = self.lexer.position();
        let rest = &self.lexer.input()[position..];
        if let Some(offset) = rest.iter().position(|b| !b.is_ascii_whitespace() && *b != 0) {
            self.warnings.push(ParseWarning::TrailingContent {
                position: position + offset,
            });
        }
    }

    fn handle_control_word(&mut self, name: &str, param: Option<i32>, at_group_start: bool) {
        if name == "bin" {
            let len = param.and_then(|n| usize::try_from(n).ok()).unwrap_or(0);
            self.lexer.skip_bytes(len);
            return;
        }

        if let Some(destination) = self.destination_for(name, at_group_start) {
            self.enter_destination(destination);
            return;
        }

        match self.state.destination {
            Destination::Body => self.handle_body_word(name, param),
            Destination::FontTable => self.handle_font_word(name, param),
            Destination::ColorTable => {
                let value = param.map(|n| n.clamp(0, 255) as u8).unwrap_or(0);
                match name {
                    "red" => self.color.red = value,
                    "green" => self.color.green = value,
                    "blue" => self.color.blue = value,
                    _ => return,
                }
                self.color.touched = true;
            }
            Destination::Preserved | Destination::Skip => {}
        }
    }

    fn destination_for(&self, name: &str, at_group_start: bool) -> Option<Destination> {
        if matches!(
            self.state.destination,
            Destination::Preserved | Destination::Skip
        ) {
            return None;
        }
        if name == "fonttbl" {
            return Some(Destination::FontTable);
        }
        if name == "colortbl" {
            return Some(Destination::ColorTable);
        }
        if PRESERVED_DESTINATIONS.contains(&name) {
            // Header groups are direct children of the root group that open
            // with the destination word; they are replayed byte for byte.
            return Some(if at_group_start && self.stack.len() == 2 {
                Destination::Preserved
            } else {
                Destination::Skip
            });
        }
        if SKIPPED_DESTINATIONS.contains(&name) {
            return Some(Destination::Skip);
        }
        None
    }

    fn enter_destination(&mut self, destination: Destination) {
        if destination == Destination::FontTable {
            self.font = FontBuilder::default();
        }
        if destination == Destination::ColorTable {
            self.color = ColorBuilder::default();
        }
        self.state.destination = destination;
    }

    fn handle_control_symbol(&mut self, symbol: u8) {
        match self.state.destination {
            Destination::Body => {}
            Destination::FontTable => {
                match symbol {
                    b'*' => self.state.destination = Destination::Skip,
                    b'\\' | b'{' | b'}' => self.font.name.push(char::from(symbol)),
                    _ => {}
                }
                return;
            }
            Destination::ColorTable => {
                if symbol == b'*' {
                    self.state.destination = Destination::Skip;
                }
                return;
            }
            Destination::Preserved | Destination::Skip => return,
        }

        match symbol {
            b'\\' => self.push_text("\\"),
            b'{' => self.push_text("{"),
            b'}' => self.push_text("}"),
            b'~' => self.push_text("\u{a0}"),
            b'_' => self.push_text("\u{2011}"),
            b'*' => self.state.destination = Destination::Skip,
            // `\-` optional hyphen, `\:` index subentry, `\|` formula.
            _ => {}
        }
    }

    fn handle_body_word(&mut self, name: &str, param: Option<i32>) {
        let on = param.is_none_or(|n| n != 0);
        match name {
            "par" | "sect" | "page" | "row" => self.break_paragraph(),
            "line" => self.push_text("\u{2028}"),
            "tab" | "cell" => self.push_text("\t"),
            "emdash" => self.push_text("\u{2014}"),
            "endash" => self.push_text("\u{2013}"),
            "lquote" => self.push_text("\u{2018}"),
            "rquote" => self.push_text("\u{2019}"),
            "ldblquote" => self.push_text("\u{201c}"),
            "rdblquote" => self.push_text("\u{201d}"),
            "bullet" => self.push_text("\u{2022}"),
            "enspace" => self.push_text("\u{2002}"),
            "emspace" => self.push_text("\u{2003}"),
            "qmspace" => self.push_text("\u{2005}"),
            "zwj" => self.push_text("\u{200d}"),
            "zwnj" => self.push_text("\u{200c}"),
            "u" => {
                if let Some(n) = param {
                    self.push_unicode(n);
                }
            }
            "uc" => self.state.uc_skip = param.and_then(|n| usize::try_from(n).ok()).unwrap_or(1),
            "plain" => self.state.attrs = RunAttrs::default(),
            "b" => self.state.attrs.bold = on,
            "i" => self.state.attrs.italic = on,
            "strike" | "striked" => self.state.attrs.strikethrough = on,
            "ul" | "uld" | "uldash" | "uldashd" | "uldashdd" | "uldb" | "ulhwave" | "ulldash"
            | "ulth" | "ulthd" | "ulthdash" | "ulw" | "ulwave" => self.state.attrs.underline = on,
            "ulnone" => self.state.attrs.underline = false,
            "super" => self.state.attrs.script = if on { Script::Superscript } else { Script::Baseline },
            "sub" => self.state.attrs.script = if on { Script::Subscript } else { Script::Baseline },
            "nosupersub" => self.state.attrs.script = Script::Baseline,
            "f" => self.state.attrs.font = param.and_then(|n| u32::try_from(n).ok()),
            "fs" => {
                if let Some(size) = param.and_then(|n| u32::try_from(n).ok()).filter(|n| *n > 0) {
                    self.state.attrs.font_size = Some(size);
                }
            }
            "cf" => self.state.attrs.color = param.and_then(|n| u32::try_from(n).ok()),
            "highlight" | "cb" | "chcbpat" => {
                self.state.attrs.highlight = param.and_then(|n| u32::try_from(n).ok());
            }
            "ansicpg" => {
                if let Some(codepage) = param.and_then(|n| u32::try_from(n).ok()) {
                    self.metadata.codepage = Some(codepage);
                    self.encoding = encoding_for_codepage(codepage);
                }
            }
            "deff" => self.metadata.default_font = param.and_then(|n| u32::try_from(n).ok()),
            _ => {
                if let Some(encoding) = encoding_for_charset_word(name) {
                    if self.metadata.codepage.is_none() {
                        self.encoding = encoding;
                    }
                }
            }
        }
    }

    fn handle_font_word(&mut self, name: &str, param: Option<i32>) {
        match name {
            "f" => {
                if self.font.index.is_some() && !self.font.name.trim_matches(' ').is_empty() {
                    self.commit_font();
                }
                self.font = FontBuilder {
                    index: param.and_then(|n| u32::try_from(n).ok()),
                    ..Default::default()
                };
            }
            "fcharset" => self.font.charset = param.and_then(|n| u32::try_from(n).ok()),
            "u" => {
                if let Some(n) = param {
                    self.push_unicode(n);
                }
            }
            _ => {
                if let Some(family) = FontFamily::from_control_word(name) {
                    self.font.family = family;
                }
            }
        }
    }

    fn handle_font_text(&mut self, bytes: &[u8]) {
        let bytes = self.skip_fallback_chars(bytes);
        for chunk in bytes.split_inclusive(|b| *b == b';') {
            let (text, terminated) = match chunk.split_last() {
                Some((b';', head)) => (head, true),
                _ => (chunk, false),
            };
            let decoded = decode_bytes(text, self.encoding);
            self.push_font_text(&decoded);
            if terminated {
                self.commit_font();
            }
        }
    }

    /// Decodes buffered `\'hh` bytes together so multi-byte code pages work.
    fn flush_font_bytes(&mut self) {
        if self.font_bytes.is_empty() {
            return;
        }
        let bytes = std::mem::take(&mut self.font_bytes);
        let (decoded, _) = self.encoding.decode_without_bom_handling(&bytes);
        self.push_font_text(&decoded);
    }

    fn push_font_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.high_surrogate.take().is_some() {
            self.font.name.push(char::REPLACEMENT_CHARACTER);
        }
        self.font.name.push_str(text);
    }

    fn commit_font(&mut self) {
        if self.high_surrogate.take().is_some() {
            self.font.name.push(char::REPLACEMENT_CHARACTER);
        }
        let font = std::mem::take(&mut self.font);
        let Some(index) = font.index else {
            return;
        };
        self.metadata.fonts.insert(
            index,
            FontEntry {
                name: font.name.trim_matches(' ').to_string(),
                family: font.family,
                charset: font.charset,
            },
        );
    }

    fn commit_color(&mut self) {
        let color = std::mem::take(&mut self.color);
        self.metadata.colors.push(
            color
                .touched
                .then(|| Rgb::new(color.red, color.green, color.blue)),
        );
    }

    fn handle_body_text(&mut self, bytes: &[u8]) {
        let bytes = self.skip_fallback_chars(bytes);
        if !bytes.is_empty() {
            self.push_pending(PendingKind::Raw, bytes);
        }
    }

    /// Drops the `\ucN` fallback characters that follow a `\u` escape.
    fn skip_fallback_chars<'b>(&mut self, mut bytes: &'b [u8]) -> &'b [u8] {
        while self.skip_fallback > 0 && !bytes.is_empty() {
            let len = utf8_char_len(bytes[0]).min(bytes.len());
            bytes = &bytes[len..];
            self.skip_fallback -= 1;
        }
        bytes
    }

    /// `\uN`: N is a signed UTF-16 unit. A high surrogate waits for the low
    /// half in the next `\u`; anything else in between orphans it.
    fn push_unicode(&mut self, param: i32) {
        let unit = param as u16;
        self.skip_fallback = self.state.uc_skip;

        if (0xd800..0xdc00).contains(&unit) {
            self.flush_surrogate();
            self.high_surrogate = Some(unit);
            return;
        }
        let ch = match self.high_surrogate.take() {
            Some(high) if (0xdc00..0xe000).contains(&unit) => {
                char::from_u32(0x10000 + ((u32::from(high) - 0xd800) << 10) + (u32::from(unit) - 0xdc00))
            }
            pending => {
                if pending.is_some() {
                    self.push_char(char::REPLACEMENT_CHARACTER);
                }
                char::from_u32(u32::from(unit))
            }
        };
        self.push_char(ch.unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    fn push_char(&mut self, ch: char) {
        match self.state.destination {
            Destination::Body => self.push_text(ch.encode_utf8(&mut [0u8; 4])),
            Destination::FontTable => self.font.name.push(ch),
            _ => {}
        }
    }

    /// Replaces a high surrogate that never got its low half.
    fn flush_surrogate(&mut self) {
        if self.high_surrogate.take().is_some() {
            self.push_char(char::REPLACEMENT_CHARACTER);
        }
    }

    fn push_pending(&mut self, kind: PendingKind, bytes: &[u8]) {
        if self.pending_kind != kind {
            self.flush_text();
            self.pending_kind = kind;
        }
        self.pending.extend_from_slice(bytes);
    }

    fn push_text(&mut self, text: &str) {
        self.flush_text();
        self.emit_text(text);
    }

    /// Decodes buffered bytes into the current paragraph.
    fn flush_text(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let bytes = std::mem::take(&mut self.pending);
        let text = match self.pending_kind {
            PendingKind::Raw => decode_bytes(&bytes, self.encoding).into_owned(),
            PendingKind::Hex => {
                let (decoded, _) = self.encoding.decode_without_bom_handling(&bytes);
                decoded.into_owned()
            }
        };
        self.emit_text(&text);
    }

    /// Appends decoded text with the active attributes. Decoded line breaks
    /// split paragraphs, since runs never carry them.
    fn emit_text(&mut self, text: &str) {
        if self.state.destination != Destination::Body || text.is_empty() {
            return;
        }
        if self.high_surrogate.take().is_some() {
            self.current.push_text("\u{fffd}", &self.state.attrs);
        }
        let mut lines = text.split(['\r', '\n']);
        if let Some(first) = lines.next() {
            self.current.push_text(first, &self.state.attrs);
        }
        for line in lines {
            self.break_paragraph();
            self.current.push_text(line, &self.state.attrs);
        }
    }

    fn break_paragraph(&mut self) {
        self.flush_surrogate();
        let paragraph = std::mem::take(&mut self.current);
        self.paragraphs.push(paragraph);
    }
}

/// Raw body bytes: UTF-8 when they form valid UTF-8 (the input came in as a
/// Rust string), otherwise the document code page.
fn decode_bytes<'b>(bytes: &'b [u8], encoding: &'static Encoding) -> std::borrow::Cow<'b, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => std::borrow::Cow::Borrowed(text),
        Err(_) => encoding.decode_without_bom_handling(bytes).0,
    }
}

fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    }
}

fn check_references(document: &Document, warnings: &mut Vec<ParseWarning>) {
    let metadata = &document.metadata;
    let mut push = |warning: ParseWarning| {
        if !warnings.contains(&warning) {
            warnings.push(warning);
        }
    };
    for run in document.paragraphs.iter().flat_map(|p| p.runs.iter()) {
        if let Some(index) = run.attrs.font.filter(|ix| !metadata.has_font(*ix)) {
            push(ParseWarning::UnresolvedFont { index });
        }
        for index in [run.attrs.color, run.attrs.highlight].into_iter().flatten() {
            if !metadata.has_color(index) {
                push(ParseWarning::UnresolvedColor { index });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StyledRun;

    fn texts(parsed: &ParsedDocument) -> Vec<String> {
        parsed.document.paragraphs.iter().map(Paragraph::text).collect()
    }

    #[test]
    fn bold_toggle_scenario() {
        let parsed = parse(r"{\rtf1 \b Hello\b0  World}");
        assert!(parsed.is_clean(), "{:?}", parsed.warnings);
        let bold = RunAttrs {
            bold: true,
            ..Default::default()
        };
        assert_eq!(
            parsed.document.paragraphs,
            vec![Paragraph {
                runs: vec![StyledRun::new("Hello", bold), StyledRun::plain(" World")],
            }]
        );
    }

    #[test]
    fn empty_input_is_one_empty_paragraph() {
        for input in ["", r"{\rtf1}", r"{\rtf1\ansi{\fonttbl\f0 Times;}}"] {
            let parsed = parse(input);
            assert_eq!(parsed.document.paragraphs, vec![Paragraph::new()], "{input:?}");
        }
    }

    #[test]
    fn trailing_par_does_not_add_paragraph() {
        let parsed = parse(r"{\rtf1 one\par two\par}");
        assert_eq!(texts(&parsed), vec!["one", "two"]);

        let parsed = parse(r"{\rtf1 one\par\par}");
        assert_eq!(texts(&parsed), vec!["one", ""]);

        let parsed = parse(r"{\rtf1 one\par two}");
        assert_eq!(texts(&parsed), vec!["one", "two"]);
    }

    #[test]
    fn groups_scope_formatting() {
        let parsed = parse(r"{\rtf1 a{\i b{\b c}d}e}");
        let attrs: Vec<_> = parsed.document.paragraphs[0]
            .runs
            .iter()
            .map(|r| (r.text.as_str(), r.attrs.bold, r.attrs.italic))
            .collect();
        assert_eq!(
            attrs,
            vec![
                ("a", false, false),
                ("b", false, true),
                ("c", true, true),
                ("d", false, true),
                ("e", false, false),
            ]
        );
    }

    #[test]
    fn reads_font_and_color_tables() {
        let input = concat!(
            r"{\rtf1\ansi\ansicpg1252\deff0",
            r"{\fonttbl{\f0\fswiss\fcharset0 Helvetica;}{\f1\froman Times New Roman;}}",
            r"{\colortbl;\red255\green0\blue0;\red0\green0\blue255;}",
            "\n",
            r"\f1\fs28\cf1 red\cf2\highlight1  blue\par}",
        );
        let parsed = parse(input);
        assert!(parsed.is_clean(), "{:?}", parsed.warnings);
        let metadata = &parsed.document.metadata;
        assert_eq!(metadata.codepage, Some(1252));
        assert_eq!(metadata.default_font, Some(0));
        assert_eq!(metadata.fonts[&0].name, "Helvetica");
        assert_eq!(metadata.fonts[&0].family, FontFamily::Swiss);
        assert_eq!(metadata.fonts[&0].charset, Some(0));
        assert_eq!(metadata.fonts[&1].name, "Times New Roman");
        assert_eq!(
            metadata.colors,
            vec![None, Some(Rgb::new(255, 0, 0)), Some(Rgb::new(0, 0, 255))]
        );

        let runs = &parsed.document.paragraphs[0].runs;
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].attrs.font, Some(1));
        assert_eq!(runs[0].attrs.font_size, Some(28));
        assert_eq!(runs[0].attrs.color, Some(1));
        assert_eq!(runs[1].text, " blue");
        assert_eq!(runs[1].attrs.color, Some(2));
        assert_eq!(runs[1].attrs.highlight, Some(1));
        assert_eq!(metadata.resolve(&runs[0].attrs).font_name, "Times New Roman");
        assert_eq!(metadata.resolve(&runs[0].attrs).font_size, 14.0);
    }

    #[test]
    fn reads_cocoa_style_font_table_without_inner_groups() {
        let parsed = parse(r"{\rtf1{\fonttbl\f0\fswiss\fcharset0 Helvetica;\f1\fnil Menlo-Regular;}\f1 x}");
        let fonts = &parsed.document.metadata.fonts;
        assert_eq!(fonts.len(), 2);
        assert_eq!(fonts[&1].name, "Menlo-Regular");
        assert_eq!(fonts[&1].family, FontFamily::Nil);
    }

    #[test]
    fn decodes_unicode_and_hex_escapes() {
        let parsed = parse(r"{\rtf1\ansi\ansicpg1252 caf\'e9 \u8212?\uc0\u8364 x\uc1\u-10179?\u-8704?}");
        assert!(parsed.is_clean(), "{:?}", parsed.warnings);
        assert_eq!(texts(&parsed), vec!["café \u{2014}€x😀"]);
    }

    #[test]
    fn hex_bytes_use_double_byte_codepage() {
        let parsed = parse(r"{\rtf1\ansi\ansicpg932 \'82\'a0}");
        assert_eq!(texts(&parsed), vec!["あ"]);
    }

    #[test]
    fn font_names_decode_double_byte_hex() {
        let parsed = parse(
            r"{\rtf1\ansi\ansicpg932{\fonttbl{\f0\fnil\fcharset128 \'82\'6c\'82\'72 \'96\'be\'92\'a9;}}\f0 x}",
        );
        assert!(parsed.is_clean(), "{:?}", parsed.warnings);
        assert_eq!(parsed.document.metadata.fonts[&0].name, "ＭＳ 明朝");
        assert_eq!(parsed.document.metadata.fonts[&0].charset, Some(128));
    }

    #[test]
    fn unpaired_surrogates_become_replacement_characters() {
        let parsed = parse(r"{\rtf1 \u-10179?abc\u-8704?}");
        assert_eq!(texts(&parsed), vec!["\u{fffd}abc\u{fffd}"]);

        let parsed = parse(r"{\rtf1 a\u-10179?\par b\u-10179?}");
        assert_eq!(texts(&parsed), vec!["a\u{fffd}", "b\u{fffd}"]);

        let parsed = parse(r"{\rtf1 \u-10179?\u-10179?\u-8704?}");
        assert_eq!(texts(&parsed), vec!["\u{fffd}😀"]);
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let input = "\u{feff}{\\rtf1 hi\\par}";
        let parsed = parse(input);
        assert!(parsed.is_clean(), "{:?}", parsed.warnings);
        assert_eq!(texts(&parsed), vec!["hi"]);
        assert!(parse_strict(input).is_ok());
    }

    #[test]
    fn special_character_words() {
        let parsed = parse(r"{\rtf1 a\tab b\line c\emdash\ldblquote q\rdblquote\~\{\}\\}");
        assert_eq!(texts(&parsed), vec!["a\tb\u{2028}c\u{2014}\u{201c}q\u{201d}\u{a0}{}\\"]);
    }

    #[test]
    fn skips_ignorable_and_non_text_destinations() {
        let input = concat!(
            r"{\rtf1{\*\expandedcolortbl;;}{\*\generator Writer;}",
            r"{\header page header}",
            r"{\field{\*\fldinst HYPERLINK x}{\fldrslt link}} ",
            r"{\pict\pngblip 89504e47}",
            r"{\*\unknownthing hidden}",
            r"body}",
        );
        let parsed = parse(input);
        assert_eq!(texts(&parsed), vec!["link body"]);
    }

    #[test]
    fn preserves_header_groups_verbatim() {
        let stylesheet = r"{\stylesheet{\s0 Normal;}{\*\cs10 Default;}}";
        let info = r"{\info{\title Draft}}";
        let input = format!(r"{{\rtf1{{\fonttbl\f0 Times;}}{stylesheet}{info}text}}");
        let parsed = parse(&input);
        assert_eq!(
            parsed.document.metadata.preserved_groups,
            vec![stylesheet.to_string(), info.to_string()]
        );
        assert_eq!(texts(&parsed), vec!["text"]);
    }

    #[test]
    fn unknown_words_are_skipped() {
        let parsed = parse(r"{\rtf1\cocoartf2639\cocoatextscaling0 \expnd0\expndtw0\kerning0 plain}");
        assert_eq!(texts(&parsed), vec!["plain"]);
        assert!(parsed.is_clean());
    }

    #[test]
    fn unbalanced_input_keeps_decoded_text() {
        let parsed = parse(r"{\rtf1 one\par {\b two");
        assert_eq!(texts(&parsed), vec!["one", "two"]);
        assert_eq!(
            parsed.warnings,
            vec![ParseWarning::UnclosedGroups { count: 2 }]
        );
        assert!(parse_strict(r"{\rtf1 one\par {\b two").is_err());
    }

    #[test]
    fn non_rtf_input_reads_as_text() {
        let parsed = parse("just words}");
        assert_eq!(texts(&parsed), vec!["just words"]);
        assert_eq!(
            parsed.warnings,
            vec![
                ParseWarning::MissingHeader,
                ParseWarning::UnmatchedGroupEnd { position: 10 },
            ]
        );
    }

    #[test]
    fn content_after_document_end_is_ignored() {
        let parsed = parse("{\\rtf1 a}} junk\n");
        assert_eq!(texts(&parsed), vec!["a"]);
        assert_eq!(
            parsed.warnings,
            vec![ParseWarning::TrailingContent { position: 9 }]
        );
        assert!(parse_strict("{\\rtf1 a}} junk\n").is_ok());
    }

    #[test]
    fn unresolved_references_warn_once() {
        let parsed = parse(r"{\rtf1{\colortbl;\red1\green2\blue3;}\f3 a\cf9 b\par\f3 c}");
        assert_eq!(
            parsed.warnings,
            vec![
                ParseWarning::UnresolvedFont { index: 3 },
                ParseWarning::UnresolvedColor { index: 9 },
            ]
        );
        assert_eq!(parsed.document.metadata.color(Some(9)), Rgb::BLACK);
    }

    #[test]
    fn plain_and_script_words() {
        let parsed = parse(r"{\rtf1\b\super 1\nosupersub\sub 2\plain 3}");
        let attrs: Vec<_> = parsed.document.paragraphs[0]
            .runs
            .iter()
            .map(|r| (r.text.as_str(), r.attrs.bold, r.attrs.script))
            .collect();
        assert_eq!(
            attrs,
            vec![
                ("1", true, Script::Superscript),
                ("2", true, Script::Subscript),
                ("3", false, Script::Baseline),
            ]
        );
    }

    #[test]
    fn strips_style_tags_while_parsing() {
        let parsed = parse(r"{\rtf1 Chapter <$Scr_Cs::2>One\par}");
        assert_eq!(texts(&parsed), vec!["Chapter One"]);
        assert_eq!(parsed.style_tags.len(), 1);
        assert_eq!(parsed.style_tags[0].offset, 8);
    }

    #[test]
    fn bin_payload_is_skipped() {
        let parsed = parse("{\\rtf1 a{\\*\\blob\\bin3 {}\\}b}");
        assert_eq!(texts(&parsed), vec!["ab"]);
    }
}
