use encoding_rs::Encoding;

/// Maps an `\ansicpg` code page to a decoder. Unknown pages fall back to
/// Windows-1252, the RTF default.
pub(crate) fn encoding_for_codepage(codepage: u32) -> &'static Encoding {
    match codepage {
        874 => encoding_rs::WINDOWS_874,
        932 => encoding_rs::SHIFT_JIS,
        936 => encoding_rs::GBK,
        949 => encoding_rs::EUC_KR,
        950 => encoding_rs::BIG5,
        1250 => encoding_rs::WINDOWS_1250,
        1251 => encoding_rs::WINDOWS_1251,
        1253 => encoding_rs::WINDOWS_1253,
        1254 => encoding_rs::WINDOWS_1254,
        1255 => encoding_rs::WINDOWS_1255,
        1256 => encoding_rs::WINDOWS_1256,
        1257 => encoding_rs::WINDOWS_1257,
        1258 => encoding_rs::WINDOWS_1258,
        10000 => encoding_rs::MACINTOSH,
        20866 => encoding_rs::KOI8_R,
        65001 => encoding_rs::UTF_8,
        _ => encoding_rs::WINDOWS_1252,
    }
}

/// Decoder for the `\ansicpg`-less charset words.
pub(crate) fn encoding_for_charset_word(word: &str) -> Option<&'static Encoding> {
    match word {
        "ansi" | "pc" | "pca" => Some(encoding_rs::WINDOWS_1252),
        "mac" => Some(encoding_rs::MACINTOSH),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_single_and_double_byte_pages() {
        let (text, _, _) = encoding_for_codepage(1252).decode(&[0x93, 0x41, 0x94]);
        assert_eq!(text, "\u{201c}A\u{201d}");

        let (text, _, _) = encoding_for_codepage(932).decode(&[0x82, 0xa0]);
        assert_eq!(text, "あ");

        assert_eq!(encoding_for_codepage(42), encoding_rs::WINDOWS_1252);
    }
}
