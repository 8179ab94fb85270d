//! Tokenization for Pep/10 assembly.
//!
//! The lexer is an explicit character-level state machine over a seekable
//! character buffer. States that need one character of lookahead (the
//! terminators of identifiers and numbers) push the character back by
//! rewinding the read position before yielding the token.

/// A lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// End of line or end of stream.
    Empty,
    /// `,`
    Comma,
    /// `;...` — text up to, but excluding, the newline.
    Comment(String),
    /// `[A-Za-z][A-Za-z0-9_]*` — source spelling preserved; mnemonic and
    /// addressing-mode lookups uppercase at the lookup site.
    Identifier(String),
    /// An identifier immediately followed by `:`.
    Symbol(String),
    /// Optionally signed decimal literal.
    Decimal(i64),
    /// `0x`-prefixed hexadecimal literal.
    Hex(i64),
    /// `.` followed by an identifier.
    Dot(String),
    /// `@` followed by an identifier.
    Macro(String),
    /// `"..."` with C-style escapes decoded to bytes.
    String(Vec<u8>),
    /// A lex error.
    Invalid,
}

/// Lexer states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Comment,
    Identifier,
    MaybeHex,
    HexPrefix,
    Hex,
    MaybeSigned,
    Decimal,
    MaybeDot,
    Dot,
    MaybeMacro,
    MacroName,
    StringAwaitingClose,
    StringExpectEscape,
    StringExpectHex0,
    StringExpectHex1,
}

fn decimal_value(ch: char) -> i64 {
    ch.to_digit(10).map(i64::from).unwrap_or(0)
}

fn hex_value(ch: char) -> i64 {
    ch.to_digit(16).map(i64::from).unwrap_or(0)
}

/// A lexical analyzer over one translation unit.
#[derive(Debug)]
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    /// Creates a lexer over `text`. The buffer is owned so macro bodies can
    /// be lexed without tying their lifetime to the registry.
    pub fn new(text: &str) -> Self {
        Lexer {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn read(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn rewind(&mut self) {
        self.pos -= 1;
    }

    /// Reads through the next newline without emitting tokens. The parser
    /// invokes this to resynchronize after a lex error.
    pub fn skip_to_next_line(&mut self) {
        while let Some(ch) = self.read() {
            if ch == '\n' {
                break;
            }
        }
    }

    /// Produces the next token, or `None` at end of stream.
    pub fn next_token(&mut self) -> Option<Token> {
        if self.pos >= self.chars.len() {
            return None;
        }

        let mut state = State::Start;
        let mut text = String::new();
        let mut bytes: Vec<u8> = Vec::new();
        let mut value: i64 = 0;
        let mut sign: i64 = 1;
        let mut pending: u8 = 0;

        loop {
            let ch = self.read();
            match state {
                State::Start => match ch {
                    None | Some('\n') => return Some(Token::Empty),
                    Some(',') => return Some(Token::Comma),
                    Some(c) if c.is_whitespace() => {}
                    Some(';') => state = State::Comment,
                    Some(c) if c.is_alphabetic() => {
                        text.push(c);
                        state = State::Identifier;
                    }
                    Some('0') => state = State::MaybeHex,
                    Some(c) if c.is_ascii_digit() => {
                        value = decimal_value(c);
                        state = State::Decimal;
                    }
                    Some('.') => state = State::MaybeDot,
                    Some('@') => state = State::MaybeMacro,
                    Some('"') => state = State::StringAwaitingClose,
                    Some('+') => state = State::MaybeSigned,
                    Some('-') => {
                        sign = -1;
                        state = State::MaybeSigned;
                    }
                    Some(_) => return Some(Token::Invalid),
                },

                State::Comment => match ch {
                    None => return Some(Token::Comment(text)),
                    Some('\n') => {
                        self.rewind();
                        return Some(Token::Comment(text));
                    }
                    Some(c) => text.push(c),
                },

                State::Identifier => match ch {
                    Some(':') => return Some(Token::Symbol(text)),
                    Some(c) if c.is_alphanumeric() || c == '_' => text.push(c),
                    Some(_) => {
                        self.rewind();
                        return Some(Token::Identifier(text));
                    }
                    None => return Some(Token::Identifier(text)),
                },

                // A leading `0` is ambiguous between decimal zero and a hex
                // prefix; peek one character to resolve it.
                State::MaybeHex => match ch {
                    Some(c) if c.is_ascii_digit() => {
                        value = decimal_value(c);
                        state = State::Decimal;
                    }
                    Some('x') | Some('X') => state = State::HexPrefix,
                    Some(_) => {
                        self.rewind();
                        return Some(Token::Decimal(0));
                    }
                    None => return Some(Token::Decimal(0)),
                },

                State::HexPrefix => match ch {
                    Some(c) if c.is_ascii_hexdigit() => {
                        value = hex_value(c);
                        state = State::Hex;
                    }
                    _ => return Some(Token::Invalid),
                },

                State::Hex => match ch {
                    Some(c) if c.is_ascii_hexdigit() => {
                        value = value.saturating_mul(16).saturating_add(hex_value(c));
                    }
                    Some(_) => {
                        self.rewind();
                        return Some(Token::Hex(value));
                    }
                    None => return Some(Token::Hex(value)),
                },

                State::MaybeSigned => match ch {
                    Some(c) if c.is_ascii_digit() => {
                        value = decimal_value(c);
                        state = State::Decimal;
                    }
                    _ => return Some(Token::Invalid),
                },

                State::Decimal => match ch {
                    Some(c) if c.is_ascii_digit() => {
                        value = value.saturating_mul(10).saturating_add(decimal_value(c));
                    }
                    Some(_) => {
                        self.rewind();
                        return Some(Token::Decimal(sign * value));
                    }
                    None => return Some(Token::Decimal(sign * value)),
                },

                State::MaybeDot => match ch {
                    Some(c) if c.is_alphabetic() => {
                        text.push(c);
                        state = State::Dot;
                    }
                    _ => return Some(Token::Invalid),
                },

                State::Dot => match ch {
                    Some(c) if c.is_alphanumeric() || c == '_' => text.push(c),
                    Some(_) => {
                        self.rewind();
                        return Some(Token::Dot(text));
                    }
                    None => return Some(Token::Dot(text)),
                },

                State::MaybeMacro => match ch {
                    Some(c) if c.is_alphabetic() => {
                        text.push(c);
                        state = State::MacroName;
                    }
                    _ => return Some(Token::Invalid),
                },

                State::MacroName => match ch {
                    Some(c) if c.is_alphanumeric() || c == '_' => text.push(c),
                    Some(_) => {
                        self.rewind();
                        return Some(Token::Macro(text));
                    }
                    None => return Some(Token::Macro(text)),
                },

                // Unterminated strings are a lex error. A terminating newline
                // is pushed back so error recovery stays on this line.
                State::StringAwaitingClose => match ch {
                    Some('"') => return Some(Token::String(bytes)),
                    Some('\\') => state = State::StringExpectEscape,
                    Some('\n') => {
                        self.rewind();
                        return Some(Token::Invalid);
                    }
                    None => return Some(Token::Invalid),
                    Some(c) => {
                        let mut buf = [0u8; 4];
                        bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                    }
                },

                State::StringExpectEscape => match ch {
                    Some('r') => {
                        bytes.push(b'\r');
                        state = State::StringAwaitingClose;
                    }
                    Some('t') => {
                        bytes.push(b'\t');
                        state = State::StringAwaitingClose;
                    }
                    Some('b') => {
                        bytes.push(0x08);
                        state = State::StringAwaitingClose;
                    }
                    Some('n') => {
                        bytes.push(b'\n');
                        state = State::StringAwaitingClose;
                    }
                    Some('"') => {
                        bytes.push(b'"');
                        state = State::StringAwaitingClose;
                    }
                    Some('\\') => {
                        bytes.push(b'\\');
                        state = State::StringAwaitingClose;
                    }
                    Some('x') => state = State::StringExpectHex0,
                    Some('\n') => {
                        self.rewind();
                        return Some(Token::Invalid);
                    }
                    _ => return Some(Token::Invalid),
                },

                State::StringExpectHex0 => match ch {
                    Some(c) if c.is_ascii_hexdigit() => {
                        pending = hex_value(c) as u8;
                        state = State::StringExpectHex1;
                    }
                    Some('\n') => {
                        self.rewind();
                        return Some(Token::Invalid);
                    }
                    _ => return Some(Token::Invalid),
                },

                // A single hex digit is not accepted, not even against the
                // closing quote.
                State::StringExpectHex1 => match ch {
                    Some(c) if c.is_ascii_hexdigit() => {
                        bytes.push(pending * 16 + hex_value(c) as u8);
                        state = State::StringAwaitingClose;
                    }
                    Some('\n') => {
                        self.rewind();
                        return Some(Token::Invalid);
                    }
                    _ => return Some(Token::Invalid),
                },
            }
        }
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}
