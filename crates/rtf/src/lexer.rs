//! Byte-level RTF tokenizer.

use crate::error::ParseWarning;

const MAX_CONTROL_WORD_LEN: usize = 32;
const MAX_PARAM_DIGITS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    GroupStart,
    GroupEnd,
    ControlWord { name: &'a str, param: Option<i32> },
    ControlSymbol(u8),
    /// A `\'hh` escape.
    HexByte(u8),
    Text(&'a [u8]),
}

pub(crate) struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    warnings: Vec<ParseWarning>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn input(&self) -> &'a [u8] {
        self.input
    }

    pub(crate) fn take_warnings(&mut self) -> Vec<ParseWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Skips the payload of a `\binN` word.
    pub(crate) fn skip_bytes(&mut self, len: usize) {
        self.pos = self.pos.saturating_add(len).min(self.input.len());
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    pub(crate) fn next_token(&mut self) -> Option<Token<'a>> {
        loop {
            // Line breaks in the source are not significant.
            while matches!(self.peek(), Some(b'\r' | b'\n')) {
                self.pos += 1;
            }

            let byte = self.peek()?;
            match byte {
                b'{' => {
                    self.pos += 1;
                    return Some(Token::GroupStart);
                }
                b'}' => {
                    self.pos += 1;
                    return Some(Token::GroupEnd);
                }
                b'\\' => {
                    let start = self.pos;
                    self.pos += 1;
                    if let Some(token) = self.read_control(start) {
                        return Some(token);
                    }
                }
                _ => return Some(self.read_text()),
            }
        }
    }

    fn read_control(&mut self, start: usize) -> Option<Token<'a>> {
        let Some(byte) = self.peek() else {
            self.warnings.push(ParseWarning::Truncated { position: start });
            return None;
        };

        if !byte.is_ascii_alphabetic() {
            self.pos += 1;
            return match byte {
                b'\'' => self.read_hex_byte(start),
                b'\r' | b'\n' => Some(Token::ControlWord {
                    name: "par",
                    param: None,
                }),
                _ => Some(Token::ControlSymbol(byte)),
            };
        }

        let name_start = self.pos;
        while self.pos - name_start < MAX_CONTROL_WORD_LEN
            && self.peek().is_some_and(|b| b.is_ascii_alphabetic())
        {
            self.pos += 1;
        }
        // Control words are ASCII letters only, so this cannot fail.
        let name = std::str::from_utf8(&self.input[name_start..self.pos]).unwrap_or_default();

        let negative = self.peek() == Some(b'-') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit());
        if negative {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while self.pos - digits_start < MAX_PARAM_DIGITS
            && self.peek().is_some_and(|b| b.is_ascii_digit())
        {
            self.pos += 1;
        }
        let param = if self.pos > digits_start {
            let value = self.input[digits_start..self.pos]
                .iter()
                .fold(0i64, |acc, b| acc * 10 + i64::from(b - b'0'));
            let value = if negative { -value } else { value };
            Some(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
        } else {
            None
        };

        if self.peek() == Some(b' ') {
            self.pos += 1;
        }

        Some(Token::ControlWord { name, param })
    }

    fn read_hex_byte(&mut self, start: usize) -> Option<Token<'a>> {
        let hi = self.peek().and_then(hex_value);
        let lo = self.peek_at(1).and_then(hex_value);
        match (hi, lo) {
            (Some(hi), Some(lo)) => {
                self.pos += 2;
                Some(Token::HexByte((hi << 4) | lo))
            }
            _ => {
                if self.pos + 1 >= self.input.len() {
                    self.warnings.push(ParseWarning::Truncated { position: start });
                    self.pos = self.input.len();
                } else {
                    self.warnings.push(ParseWarning::InvalidHex { position: start });
                }
                None
            }
        }
    }

    fn read_text(&mut self) -> Token<'a> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'{' | b'}' | b'\\' | b'\r' | b'\n') {
                break;
            }
            self.pos += 1;
        }
        Token::Text(&self.input[start..self.pos])
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
