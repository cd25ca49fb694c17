//! Lenient decoder for JavaScript object literals.
//!
//! Listing pages embed their data as a script-level object literal rather
//! than JSON: keys and strings may be single-quoted, keys may be bare
//! identifiers, trailing commas are common and comments may appear. This
//! module parses that dialect into a [`serde_json::Value`] tree.
//!
//! Bare identifiers in value position other than `true`, `false`, `null`,
//! `undefined`, `NaN` and `Infinity` are rejected: they reference bindings
//! the decoder cannot resolve.

use serde_json::{Map, Number, Value};

/// Maximum nesting of objects and arrays before decoding gives up.
const MAX_DEPTH: usize = 256;

/// Why a literal could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("nesting deeper than {MAX_DEPTH} levels")]
    TooDeep,
    #[error("trailing characters after value")]
    TrailingCharacters,
}

/// A decoding failure with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    /// Byte offset into the input.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

/// Decodes a relaxed object literal (or any single relaxed value).
///
/// # Errors
///
/// Returns [`DecodeError`] if the input is not a single well-formed value.
pub fn decode(input: &str) -> Result<Value, DecodeError> {
    let mut parser = Parser { src: input, pos: 0 };
    parser.skip_trivia()?;
    let value = parser.parse_value(0)?;
    parser.skip_trivia()?;
    if parser.peek().is_some() {
        return Err(parser.error_at(parser.pos, DecodeErrorKind::TrailingCharacters));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_byte_at(&self, ahead: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error_at(&self, offset: usize, kind: DecodeErrorKind) -> DecodeError {
        let before = &self.src[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        DecodeError {
            kind,
            offset,
            line,
            column,
        }
    }

    fn unexpected(&self) -> DecodeError {
        let kind = self
            .peek()
            .map_or(DecodeErrorKind::UnexpectedEnd, DecodeErrorKind::UnexpectedChar);
        self.error_at(self.pos, kind)
    }

    /// Skips whitespace and `//` / `/* */` comments.
    fn skip_trivia(&mut self) -> Result<(), DecodeError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_byte_at(1) == Some(b'/') => {
                    let rest = &self.src[self.pos..];
                    self.pos += rest.find('\n').unwrap_or(rest.len());
                }
                Some('/') if self.peek_byte_at(1) == Some(b'*') => {
                    let start = self.pos;
                    let Some(end) = self.src[start + 2..].find("*/") else {
                        return Err(self.error_at(start, DecodeErrorKind::UnterminatedComment));
                    };
                    self.pos = start + 2 + end + 2;
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), DecodeError> {
        if self.peek() == Some(expected) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(self.error_at(self.pos, DecodeErrorKind::TooDeep));
        }
        match self.peek() {
            Some('{') => self.parse_object(depth),
            Some('[') => self.parse_array(depth),
            Some(quote @ ('"' | '\'')) => self.parse_string(quote).map(Value::String),
            Some('-' | '+' | '.' | '0'..='9') => self.parse_number(),
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                match self.parse_identifier() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" | "undefined" | "NaN" | "Infinity" => Ok(Value::Null),
                    other => Err(self.error_at(
                        start,
                        DecodeErrorKind::UnknownIdentifier(other.to_owned()),
                    )),
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_object(&mut self, depth: usize) -> Result<Value, DecodeError> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }
            let key = self.parse_key()?;
            self.skip_trivia()?;
            self.expect(':')?;
            self.skip_trivia()?;
            let value = self.parse_value(depth + 1)?;
            map.insert(key, value);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    return Ok(Value::Object(map));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Value, DecodeError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(']') {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value(depth + 1)?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {
                    self.bump();
                    return Ok(Value::Array(items));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_key(&mut self) -> Result<String, DecodeError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.parse_string(quote),
            Some(c) if is_ident_start(c) => Ok(self.parse_identifier().to_owned()),
            Some('0'..='9') => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '.') {
                    self.bump();
                }
                Ok(self.src[start..self.pos].to_owned())
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_identifier(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        &src[start..self.pos]
    }

    fn parse_string(&mut self, quote: char) -> Result<String, DecodeError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at(start, DecodeErrorKind::UnterminatedString)),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.parse_escape(&mut out, start)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String, string_start: usize) -> Result<(), DecodeError> {
        let escape_start = self.pos - 1;
        let Some(c) = self.bump() else {
            return Err(self.error_at(string_start, DecodeErrorKind::UnterminatedString));
        };
        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // Line continuation.
            '\n' | '\u{2028}' | '\u{2029}' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            'x' => {
                let code = self.read_hex(2, escape_start)?;
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'u' => {
                let code = self.read_hex(4, escape_start)?;
                out.push(self.finish_unicode_escape(code, escape_start)?);
            }
            other => out.push(other),
        }
        Ok(())
    }

    /// Resolves a `\uXXXX` code unit, pairing a high surrogate with a
    /// following `\uXXXX` low surrogate when present.
    fn finish_unicode_escape(&mut self, code: u32, escape_start: usize) -> Result<char, DecodeError> {
        if (0xD800..0xDC00).contains(&code) && self.src[self.pos..].starts_with("\\u") {
            let checkpoint = self.pos;
            self.pos += 2;
            let low = self.read_hex(4, escape_start)?;
            if (0xDC00..0xE000).contains(&low) {
                let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                return Ok(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            self.pos = checkpoint;
        }
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn read_hex(&mut self, digits: usize, escape_start: usize) -> Result<u32, DecodeError> {
        let mut code = 0;
        for _ in 0..digits {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error_at(escape_start, DecodeErrorKind::InvalidEscape))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn parse_number(&mut self) -> Result<Value, DecodeError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };

        if self.peek().is_some_and(is_ident_start) {
            return match self.parse_identifier() {
                "Infinity" | "NaN" => Ok(Value::Null),
                other => Err(self.error_at(
                    start,
                    DecodeErrorKind::UnknownIdentifier(other.to_owned()),
                )),
            };
        }

        if self.src[self.pos..].starts_with("0x") || self.src[self.pos..].starts_with("0X") {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let magnitude = i64::from_str_radix(&self.src[digits_start..self.pos], 16)
                .map_err(|_| self.invalid_number(start))?;
            let n = if negative { -magnitude } else { magnitude };
            return Ok(Value::Number(Number::from(n)));
        }

        let mut mantissa_digits = self.eat_digits();
        let mut is_integer = true;
        if self.peek() == Some('.') {
            self.bump();
            is_integer = false;
            mantissa_digits += self.eat_digits();
        }
        if mantissa_digits > 0 && matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            is_integer = false;
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if self.eat_digits() == 0 {
                return Err(self.invalid_number(start));
            }
        }
        if mantissa_digits == 0 {
            return Err(self.invalid_number(start));
        }

        let text = self.src[start..self.pos].trim_start_matches('+');
        if is_integer && let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Number(Number::from(n)));
        }
        let n: f64 = text.parse().map_err(|_| self.invalid_number(start))?;
        Ok(Number::from_f64(n).map_or(Value::Null, Value::Number))
    }

    fn eat_digits(&mut self) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        self.pos - start
    }

    fn invalid_number(&self, start: usize) -> DecodeError {
        self.error_at(
            start,
            DecodeErrorKind::InvalidNumber(self.src[start..self.pos].to_owned()),
        )
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_single_quoted_keys_and_strings() {
        let value = decode("{'realEstateType': {'name': 'Casa'}, 'title': \"PH\"}").unwrap();
        assert_eq!(value, json!({"realEstateType": {"name": "Casa"}, "title": "PH"}));
    }

    #[test]
    fn accepts_trailing_commas_and_bare_keys() {
        let value = decode("{ items: [1, 2, 3,], nested: { ok: true, }, }").unwrap();
        assert_eq!(value, json!({"items": [1, 2, 3], "nested": {"ok": true}}));
    }

    #[test]
    fn keeps_integers_and_floats_apart() {
        let value = decode("{'a': 3, 'b': -2.5, 'c': .5, 'd': 1e3, 'e': 0x1F, 'f': +4}").unwrap();
        assert_eq!(value["a"].as_i64(), Some(3));
        assert!((value["b"].as_f64().unwrap() + 2.5).abs() < f64::EPSILON);
        assert!((value["c"].as_f64().unwrap() - 0.5).abs() < f64::EPSILON);
        assert!((value["d"].as_f64().unwrap() - 1000.0).abs() < f64::EPSILON);
        assert_eq!(value["e"].as_i64(), Some(31));
        assert_eq!(value["f"].as_i64(), Some(4));
    }

    #[test]
    fn maps_js_keywords() {
        let value = decode("[true, false, null, undefined, NaN, -Infinity]").unwrap();
        assert_eq!(value, json!([true, false, null, null, null, null]));
    }

    #[test]
    fn decodes_escapes() {
        let value = decode(r#"['it\'s', "say \"hi\"", 'é\x41', '🏠', 'a\/b']"#).unwrap();
        assert_eq!(value, json!(["it's", "say \"hi\"", "éA", "🏠", "a/b"]));
    }

    #[test]
    fn skips_comments() {
        let value = decode("{ // comment\n 'a': /* inline */ 1 }").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn rejects_unresolved_identifier() {
        let err = decode("{'urlMap': urlMapOf}").unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::UnknownIdentifier("urlMapOf".to_owned())
        );
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 12);
    }

    #[test]
    fn reports_position_of_errors_on_later_lines() {
        let err = decode("{\n  'a': 1,\n  'b': ?\n}").unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::UnexpectedChar('?'));
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 8);
    }

    #[test]
    fn rejects_truncated_input() {
        assert_eq!(
            decode("{'a': [1, 2").unwrap_err().kind,
            DecodeErrorKind::UnexpectedEnd
        );
        assert_eq!(
            decode("{'a': 'open").unwrap_err().kind,
            DecodeErrorKind::UnterminatedString
        );
    }

    #[test]
    fn rejects_trailing_characters() {
        assert_eq!(
            decode("{} {}").unwrap_err().kind,
            DecodeErrorKind::TrailingCharacters
        );
    }

    #[test]
    fn rejects_runaway_nesting() {
        let deep = "[".repeat(MAX_DEPTH + 2);
        assert_eq!(decode(&deep).unwrap_err().kind, DecodeErrorKind::TooDeep);
    }
}
