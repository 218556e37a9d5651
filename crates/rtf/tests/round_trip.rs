use proptest::prelude::*;
use scriv_rtf::{
    Document, DocumentMetadata, FontEntry, FontFamily, Paragraph, Rgb, RunAttrs, Script,
    StyledRun, parse, write_rtf,
};

fn bold() -> RunAttrs {
    RunAttrs {
        bold: true,
        ..Default::default()
    }
}

#[test]
fn bold_hello_world_round_trips() {
    let parsed = parse(r"{\rtf1 \b Hello\b0  World}");
    let expected = vec![Paragraph::from_runs([
        StyledRun::new("Hello", bold()),
        StyledRun::plain(" World"),
    ])];
    assert_eq!(parsed.document.paragraphs, expected);

    let rtf = write_rtf(&parsed.document).unwrap();
    assert_eq!(parse(&rtf).document.paragraphs, expected);
}

#[test]
fn bold_then_plain_emits_one_toggle_each_way() {
    let document = Document::new(
        vec![Paragraph::from_runs([
            StyledRun::new("A", bold()),
            StyledRun::plain("B"),
        ])],
        DocumentMetadata::default(),
    );
    let rtf = write_rtf(&document).unwrap();

    assert_eq!(rtf.matches("\\b ").count(), 1, "{rtf}");
    assert_eq!(rtf.matches("\\b0").count(), 1, "{rtf}");
    assert_eq!(parse(&rtf).document, document);
}

#[test]
fn empty_input_is_a_single_empty_paragraph() {
    let parsed = parse("");
    assert_eq!(parsed.document.paragraphs.len(), 1);
    assert!(parsed.document.paragraphs[0].runs.is_empty());
    assert!(parsed.style_tags.is_empty());
}

#[test]
fn repeated_round_trips_do_not_grow_the_document() -> anyhow::Result<()> {
    let mut rtf = r"{\rtf1 one\par two\par}".to_string();
    for _ in 0..5 {
        rtf = write_rtf(&parse(&rtf).document)?;
    }
    assert_eq!(parse(&rtf).document.plain_text(), "one\ntwo");
    assert_eq!(write_rtf(&Document::empty())?, "{\\rtf1\\ansi\n\\par\n}");
    Ok(())
}

#[test]
fn scrivener_document_reads_and_writes_back() {
    let input = concat!(
        "{\\rtf1\\ansi\\ansicpg1252\\cocoartf2761\n",
        "\\cocoatextscaling0\\cocoaplatform0{\\fonttbl\\f0\\fnil\\fcharset0 Palatino-Roman;",
        "\\f1\\fnil\\fcharset0 Palatino-Italic;}\n",
        "{\\colortbl;\\red255\\green255\\blue255;\\red0\\green0\\blue0;}\n",
        "{\\*\\expandedcolortbl;;\\cssrgb\\c0\\c0\\c0;}\n",
        "\\pard\\tx560\\tx1120\\pardirnatural\\partightenfactor0\n",
        "\n",
        "\\f0\\fs24 \\cf2 <$Scr_Ps::0>It was a dark night.\\\n",
        "\\\n",
        "\\f1\\i She said \\'93hello\\'94 and left.<!$Scr_Ps::0>}",
    );
    let parsed = parse(input);
    assert!(parsed.is_clean(), "{:?}", parsed.warnings);

    let document = &parsed.document;
    assert_eq!(
        document.plain_text(),
        "It was a dark night.\n\nShe said \u{201c}hello\u{201d} and left."
    );
    assert_eq!(document.metadata.fonts[&1].name, "Palatino-Italic");
    assert_eq!(document.metadata.colors.len(), 3);

    let last = &document.paragraphs[2];
    assert_eq!(last.runs.len(), 1);
    assert!(last.runs[0].attrs.italic);
    assert_eq!(last.runs[0].attrs.font, Some(1));
    assert_eq!(last.runs[0].attrs.color, Some(2));
    assert_eq!(document.metadata.resolve(&last.runs[0].attrs).font_size, 12.0);

    let anchors: Vec<_> = parsed
        .style_tags
        .iter()
        .map(|tag| (tag.paragraph, tag.offset, tag.closing))
        .collect();
    assert_eq!(anchors, vec![(0, 0, false), (2, last.len(), true)]);

    let rtf = write_rtf(document).unwrap();
    let reparsed = parse(&rtf);
    assert_eq!(&reparsed.document, document);
    assert!(reparsed.style_tags.is_empty());
}

fn text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,.?;\\\\{}\\t\u{a0}\u{2028}\u{e9}\u{fc}\u{2014}\u{1f600}]{0,10}"
}

fn script_strategy() -> impl Strategy<Value = Script> {
    prop_oneof![
        Just(Script::Baseline),
        Just(Script::Superscript),
        Just(Script::Subscript),
    ]
}

fn attrs_strategy() -> impl Strategy<Value = RunAttrs> {
    (
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        script_strategy(),
        proptest::option::of(0u32..4),
        proptest::option::of(1u32..80),
        proptest::option::of(0u32..4),
        proptest::option::of(0u32..4),
    )
        .prop_map(
            |(bold, italic, underline, strikethrough, script, font, font_size, color, highlight)| {
                RunAttrs {
                    bold,
                    italic,
                    underline,
                    strikethrough,
                    script,
                    font,
                    font_size,
                    color,
                    highlight,
                }
            },
        )
}

fn paragraph_strategy() -> impl Strategy<Value = Paragraph> {
    proptest::collection::vec((text_strategy(), attrs_strategy()), 0..5).prop_map(|runs| {
        Paragraph::from_runs(
            runs.into_iter()
                .map(|(text, attrs)| StyledRun::new(text, attrs)),
        )
    })
}

fn font_strategy() -> impl Strategy<Value = FontEntry> {
    (
        "[A-Z][a-zA-Z\u{e9}\u{a0}\u{2028}\u{1f600}{};\t-]{0,8}( [A-Z][a-z]{1,6})?",
        proptest::sample::select(vec![
            FontFamily::Nil,
            FontFamily::Roman,
            FontFamily::Swiss,
            FontFamily::Modern,
        ]),
        proptest::option::of(0u32..3),
    )
        .prop_map(|(name, family, charset)| FontEntry {
            name,
            family,
            charset,
        })
}

fn metadata_strategy() -> impl Strategy<Value = DocumentMetadata> {
    (
        proptest::collection::btree_map(0u32..6, font_strategy(), 0..4),
        proptest::collection::vec(
            proptest::option::of(any::<(u8, u8, u8)>().prop_map(|(r, g, b)| Rgb::new(r, g, b))),
            0..4,
        ),
        proptest::option::of(0u32..4),
        proptest::option::of(proptest::sample::select(vec![1250u32, 1252, 932])),
        proptest::sample::subsequence(
            vec![
                r"{\stylesheet{\s0 Normal;}{\*\cs10 Default Paragraph Font;}}".to_string(),
                r"{\info{\title Draft}{\author Someone}}".to_string(),
            ],
            0..=2,
        ),
    )
        .prop_map(
            |(fonts, colors, default_font, codepage, preserved_groups)| DocumentMetadata {
                fonts,
                colors,
                default_font,
                codepage,
                preserved_groups,
            },
        )
}

fn document_strategy() -> impl Strategy<Value = Document> {
    (
        proptest::collection::vec(paragraph_strategy(), 0..5),
        metadata_strategy(),
    )
        .prop_map(|(paragraphs, metadata)| Document::new(paragraphs, metadata))
}

proptest! {
    #[test]
    fn parse_inverts_write(document in document_strategy()) {
        let rtf = write_rtf(&document).unwrap();
        let parsed = parse(&rtf);
        prop_assert_eq!(&parsed.document, &document);
        prop_assert!(parsed.warnings.iter().all(|w| !w.is_structural()));
    }

    #[test]
    fn writing_stabilizes_after_one_round_trip(document in document_strategy()) {
        let first = write_rtf(&document).unwrap();
        let second = write_rtf(&parse(&first).document).unwrap();
        prop_assert_eq!(&parse(&second).document, &parse(&first).document);
        prop_assert_eq!(second, first);
    }
}
