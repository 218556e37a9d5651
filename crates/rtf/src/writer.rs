use std::fmt::Write as _;

use crate::error::{Result, RtfError};
use crate::model::{Document, DocumentMetadata, Paragraph, RunAttrs, Script};

pub fn write_rtf(document: &Document) -> Result<String> {
    write_paragraphs(&document.paragraphs, &document.metadata)
}

/// Serializes paragraphs under the given header tables.
///
/// Formatting carries across paragraphs, so each run only emits the control
/// words whose state differs from the run written before it.
pub fn write_paragraphs(paragraphs: &[Paragraph], metadata: &DocumentMetadata) -> Result<String> {
    validate(paragraphs)?;

    let mut out = String::with_capacity(
        64 + paragraphs.iter().map(|p| p.len() + 8).sum::<usize>(),
    );
    write_header(&mut out, metadata);

    let mut active = RunAttrs::default();
    for paragraph in paragraphs {
        for run in paragraph.runs.iter().filter(|run| !run.text.is_empty()) {
            write_transition(&mut out, &active, &run.attrs);
            active = run.attrs.clone();
            write_escaped(&mut out, &run.text);
        }
        out.push_str("\\par\n");
    }
    out.push('}');
    Ok(out)
}

fn validate(paragraphs: &[Paragraph]) -> Result<()> {
    for (paragraph_ix, paragraph) in paragraphs.iter().enumerate() {
        for (run_ix, run) in paragraph.runs.iter().enumerate() {
            let reason = if run.text.contains(['\n', '\r']) {
                Some("run text contains a line break")
            } else if run.attrs.font_size == Some(0) {
                Some("font size is zero")
            } else if [
                run.attrs.font,
                run.attrs.font_size,
                run.attrs.color,
                run.attrs.highlight,
            ]
            .into_iter()
            .flatten()
            .any(|value| i32::try_from(value).is_err())
            {
                Some("attribute value exceeds the RTF parameter range")
            } else {
                None
            };

            debug_assert!(
                reason.is_none(),
                "paragraph {paragraph_ix} run {run_ix}: {reason:?}"
            );
            if let Some(reason) = reason {
                return Err(RtfError::InvalidRun {
                    paragraph: paragraph_ix,
                    run: run_ix,
                    reason,
                });
            }
        }
    }
    Ok(())
}

fn write_header(out: &mut String, metadata: &DocumentMetadata) {
    out.push_str("{\\rtf1\\ansi");
    if let Some(codepage) = metadata.codepage {
        let _ = write!(out, "\\ansicpg{codepage}");
    }
    if let Some(default_font) = metadata.default_font {
        let _ = write!(out, "\\deff{default_font}");
    }

    if !metadata.fonts.is_empty() {
        out.push_str("{\\fonttbl");
        for (index, font) in &metadata.fonts {
            let _ = write!(out, "{{\\f{index}\\{}", font.family.control_word());
            if let Some(charset) = font.charset {
                let _ = write!(out, "\\fcharset{charset}");
            }
            out.push(' ');
            write_font_name(out, &font.name);
            out.push_str(";}");
        }
        out.push('}');
    }

    if !metadata.colors.is_empty() {
        out.push_str("{\\colortbl");
        for color in &metadata.colors {
            if let Some(rgb) = color {
                let _ = write!(out, "\\red{}\\green{}\\blue{}", rgb.red, rgb.green, rgb.blue);
            }
            out.push(';');
        }
        out.push('}');
    }

    for group in &metadata.preserved_groups {
        out.push_str(group);
    }
    out.push('\n');
}

fn write_transition(out: &mut String, from: &RunAttrs, to: &RunAttrs) {
    let cleared = (from.font.is_some() && to.font.is_none())
        || (from.font_size.is_some() && to.font_size.is_none())
        || (from.color.is_some() && to.color.is_none())
        || (from.highlight.is_some() && to.highlight.is_none());

    let start = out.len();
    let baseline = RunAttrs::default();
    let from = if cleared {
        // A reference cannot be switched back to "document default" by a
        // toggle; reset everything and restate what the run still uses.
        out.push_str("\\plain");
        &baseline
    } else {
        from
    };

    if from.bold != to.bold {
        out.push_str(if to.bold { "\\b" } else { "\\b0" });
    }
    if from.italic != to.italic {
        out.push_str(if to.italic { "\\i" } else { "\\i0" });
    }
    if from.underline != to.underline {
        out.push_str(if to.underline { "\\ul" } else { "\\ulnone" });
    }
    if from.strikethrough != to.strikethrough {
        out.push_str(if to.strikethrough { "\\strike" } else { "\\strike0" });
    }
    if from.script != to.script {
        out.push_str(match to.script {
            Script::Baseline => "\\nosupersub",
            Script::Superscript => "\\super",
            Script::Subscript => "\\sub",
        });
    }
    for (word, from, to) in [
        ("f", from.font, to.font),
        ("fs", from.font_size, to.font_size),
        ("cf", from.color, to.color),
        ("highlight", from.highlight, to.highlight),
    ] {
        if let Some(value) = to.filter(|value| Some(*value) != from) {
            let _ = write!(out, "\\{word}{value}");
        }
    }

    if out.len() > start {
        out.push(' ');
    }
}

/// Font names only get `\uN?` escapes: the font table has no text-level
/// control words, and a bare `;` would end the entry.
fn write_font_name(out: &mut String, name: &str) {
    for ch in name.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            ';' => write_unicode(out, ch),
            ' '..='~' => out.push(ch),
            _ => write_unicode(out, ch),
        }
    }
}

fn write_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\t' => out.push_str("\\tab "),
            '\u{2028}' => out.push_str("\\line "),
            '\u{a0}' => out.push_str("\\~"),
            ' '..='~' => out.push(ch),
            _ => write_unicode(out, ch),
        }
    }
}

fn write_unicode(out: &mut String, ch: char) {
    let mut units = [0u16; 2];
    for unit in ch.encode_utf16(&mut units) {
        let _ = write!(out, "\\u{}?", *unit as i16);
    }
}
