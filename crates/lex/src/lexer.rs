use std::sync::Arc;

use crate::diag::{DiagnosticKind, Diagnostics};
use crate::source::{SourceBuffer, SourceLocation};
use crate::stream::TokenStream;
use crate::syntax::SyntaxDescriptor;
use crate::token::{
    CharPrefix, FloatSuffix, IntSuffix, LiteralKind, Token, TokenKind as K, TokenValue,
};

/// Table-driven scanner. Every step consults the [`SyntaxDescriptor`]; nothing
/// about C is hard-coded here beyond escape sequences and numeric suffixes.
pub struct Lexer<'a> {
    syntax: &'a SyntaxDescriptor,
    diags: &'a mut Diagnostics,
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    // Logical position; linemarkers may move these away from the physical ones.
    line: u32,
    column: u32,
    file: Arc<str>,
    at_line_start: bool,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a SourceBuffer, syntax: &'a SyntaxDescriptor, diags: &'a mut Diagnostics) -> Self {
        Self {
            syntax,
            diags,
            src: src.text(),
            bytes: src.bytes(),
            pos: 0,
            line: 1,
            column: 1,
            file: src.name().clone(),
            at_line_start: true,
            done: false,
        }
    }

    pub fn tokenize(mut self) -> TokenStream {
        let mut toks = Vec::new();
        while let Some(t) = self.next_token() {
            toks.push(t);
        }
        TokenStream::new(toks)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.bytes
            .get(self.pos..)
            .is_some_and(|rest| rest.starts_with(s.as_bytes()))
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        match c {
            b'\n' => self.newline(),
            // A lone CR ends a line; in CRLF the LF does.
            b'\r' if self.peek() != Some(b'\n') => self.newline(),
            b'\r' => {}
            _ if (c & 0xC0) != 0x80 => self.column += 1,
            _ => {}
        }
        Some(c)
    }

    fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn newline(&mut self) {
        self.line = self.line.saturating_add(1);
        self.column = 1;
        self.at_line_start = true;
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.file.clone(), self.line, self.column, self.pos)
    }

    fn error(&mut self, loc: SourceLocation, msg: impl Into<String>) {
        self.diags.report(DiagnosticKind::Lex, loc, msg);
    }

    fn is_ident_start(&self, c: u8) -> bool {
        (self.syntax.chars.is_identifier_start)(c)
    }

    fn is_ident_continue(&self, c: u8) -> bool {
        (self.syntax.chars.is_identifier_continue)(c)
    }

    fn is_digit(&self, c: u8) -> bool {
        (self.syntax.chars.is_digit)(c)
    }

    fn is_line_end(c: u8) -> bool {
        c == b'\n' || c == b'\r'
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            while let Some(c) = self.peek() {
                if (self.syntax.chars.is_whitespace)(c) {
                    self.bump();
                } else {
                    break;
                }
            }
            // line splice
            if self.starts_with("\\\n") || self.starts_with("\\\r") {
                self.bump();
                if self.starts_with("\r\n") {
                    self.bump();
                }
                self.bump();
                continue;
            }
            if self.syntax.features.supports_preprocessor && self.at_line_start && self.peek() == Some(b'#') {
                self.directive_line();
                continue;
            }
            if let Some(line) = self.syntax.comments.line_start {
                if self.starts_with(line) {
                    while let Some(c) = self.peek() {
                        if Self::is_line_end(c) {
                            break;
                        }
                        self.bump();
                    }
                    continue;
                }
            }
            if let Some((open, close)) = self.syntax.comments.block {
                if self.starts_with(open) {
                    let start = self.location();
                    self.bump_n(open.len());
                    loop {
                        if self.pos >= self.bytes.len() {
                            self.error(start, "unterminated comment");
                            break;
                        }
                        if self.starts_with(close) {
                            self.bump_n(close.len());
                            break;
                        }
                        self.bump();
                    }
                    continue;
                }
            }
            break;
        }
    }

    /// `# 12 "file.c" 1 3` and `#line 12 "file.c"` retarget the logical location of
    /// the following line; other directives are skipped whole.
    fn directive_line(&mut self) {
        let start = self.pos;
        let mut end = start;
        while end < self.bytes.len() && !Self::is_line_end(self.bytes[end]) {
            end += 1;
        }
        let text = &self.src[start + 1..end];
        let marker = parse_linemarker(text);
        self.bump_n(end - start);
        // consume the terminator so the marker applies to the next line
        if self.peek() == Some(b'\r') {
            self.bump();
        }
        if self.peek() == Some(b'\n') {
            self.bump();
        }
        match marker {
            Some((line, file)) => {
                log::trace!("linemarker -> {:?}:{}", file, line);
                self.line = line;
                self.column = 1;
                if let Some(f) = file {
                    self.file = Arc::from(f.as_str());
                }
            }
            None => log::trace!("skipping directive '#{}'", text.trim()),
        }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        loop {
            if let Some(tok) = self.scan() {
                return Some(tok);
            }
        }
    }

    /// One token, or `None` when a stray character was skipped.
    fn scan(&mut self) -> Option<Token> {
        self.skip_ws_and_comments();
        let loc = self.location();
        let start = self.pos;
        let Some(c) = self.peek() else {
            self.done = true;
            return Some(Token {
                kind: K::Eof,
                lexeme: String::new(),
                location: loc,
                value: TokenValue::None,
            });
        };
        self.at_line_start = false;

        let (kind, value) = if self.is_digit(c) || (c == b'.' && self.peek_at(1).is_some_and(|d| self.is_digit(d))) {
            self.lex_number(&loc)
        } else if c == self.syntax.literals.string_quote {
            self.bump();
            self.lex_quoted(&loc, CharPrefix::None, false)
        } else if c == self.syntax.literals.char_quote {
            self.bump();
            self.lex_quoted(&loc, CharPrefix::None, true)
        } else if self.is_ident_start(c) {
            self.lex_identifier(&loc)
        } else if let Some(kind) = self.lex_symbol() {
            (kind, TokenValue::None)
        } else {
            self.bump();
            // a stray multi-byte character is reported once
            while self.peek().is_some_and(|b| (b & 0xC0) == 0x80) {
                self.bump();
            }
            let shown = &self.src[start..self.pos];
            let msg = if c.is_ascii_graphic() {
                format!("stray '{}' in program", shown)
            } else if c.is_ascii() {
                format!("stray '\\{:03o}' in program", c)
            } else {
                format!("stray '{}' in program", shown)
            };
            self.error(loc, msg);
            return None;
        };

        let lexeme = self.src[start..self.pos].to_string();
        log::trace!("{:?} {:?} @ {}", kind, lexeme, loc);
        Some(Token {
            kind,
            lexeme,
            location: loc,
            value,
        })
    }

    fn lex_identifier(&mut self, loc: &SourceLocation) -> (K, TokenValue) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if self.is_ident_continue(c) {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.src[start..self.pos];
        if let Some(prefix) = CharPrefix::from_spelling(text) {
            let q = self.peek();
            if q == Some(self.syntax.literals.string_quote) {
                self.bump();
                return self.lex_quoted(loc, prefix, false);
            }
            if q == Some(self.syntax.literals.char_quote) {
                self.bump();
                return self.lex_quoted(loc, prefix, true);
            }
        }
        match self.syntax.keyword(text) {
            Some(kw) => (K::Keyword(kw), TokenValue::None),
            None => (K::Identifier, TokenValue::None),
        }
    }

    /// Longest match across the operator and punctuation tables; operators win ties.
    fn lex_symbol(&mut self) -> Option<K> {
        let rest = &self.bytes[self.pos..];
        let op = self.syntax.match_operator(rest).map(|d| (d.symbol.len(), K::Operator(d.op)));
        let punct = self.syntax.match_punct(rest).map(|d| (d.symbol.len(), K::Punct(d.punct)));
        let (len, kind) = match (op, punct) {
            (Some(o), Some(p)) => {
                if p.0 > o.0 {
                    p
                } else {
                    o
                }
            }
            (Some(o), None) => o,
            (None, Some(p)) => p,
            (None, None) => return None,
        };
        self.bump_n(len);
        Some(kind)
    }

    fn lex_number(&mut self, loc: &SourceLocation) -> (K, TokenValue) {
        let numeric = self.syntax.numeric;
        let start = self.pos;
        let mut radix = 10u32;
        let lower1 = self.peek_at(1).map(|b| b.to_ascii_lowercase());
        if self.peek() == Some(b'0') && lower1 == Some(b'x') && numeric.hex {
            let after = self.peek_at(2);
            if after.is_some_and(|b| b.is_ascii_hexdigit()) || (after == Some(b'.') && numeric.float) {
                radix = 16;
                self.bump_n(2);
            }
        } else if self.peek() == Some(b'0')
            && lower1 == Some(b'b')
            && numeric.binary
            && self.peek_at(2).is_some_and(|b| b == b'0' || b == b'1')
        {
            radix = 2;
            self.bump_n(2);
        }

        let digits_start = self.pos;
        self.eat_digits(radix);
        let mut is_float = false;
        let mut has_exponent = false;

        if radix != 2 && numeric.float && self.peek() == Some(b'.') {
            self.bump();
            self.eat_digits(radix);
            is_float = true;
        }
        let exp_char = if radix == 16 { b'p' } else { b'e' };
        if radix != 2 && numeric.scientific && self.peek().map(|b| b.to_ascii_lowercase()) == Some(exp_char) {
            let sign = matches!(self.peek_at(1), Some(b'+' | b'-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|b| b.is_ascii_digit()) {
                self.bump_n(digit_at);
                self.eat_digits(10);
                is_float = true;
                has_exponent = true;
            }
        }
        let body_end = self.pos;

        let suffix_start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, b'u' | b'U' | b'l' | b'L' | b'f' | b'F') {
                self.bump();
            } else {
                break;
            }
        }
        let mut suffix = self.src[suffix_start..self.pos].to_string();
        if self.peek().is_some_and(|c| self.is_ident_continue(c)) {
            while let Some(c) = self.peek() {
                if self.is_ident_continue(c) {
                    self.bump();
                } else {
                    break;
                }
            }
            suffix = self.src[suffix_start..self.pos].to_string();
            let kind = if is_float { "floating" } else { "integer" };
            self.error(loc.clone(), format!("invalid suffix '{}' on {} constant", suffix, kind));
            return if is_float {
                (K::Literal(LiteralKind::Float), TokenValue::Float { value: 0.0, suffix: FloatSuffix::None })
            } else {
                (K::Literal(LiteralKind::Int), TokenValue::Int { value: 0, suffix: IntSuffix::default() })
            };
        }

        if is_float {
            if radix == 16 && !has_exponent {
                self.error(loc.clone(), "hexadecimal floating constant requires an exponent");
            }
            let fsuffix = match suffix.as_str() {
                "" => FloatSuffix::None,
                "f" | "F" => FloatSuffix::F,
                "l" | "L" => FloatSuffix::L,
                other => {
                    self.error(loc.clone(), format!("invalid suffix '{}' on floating constant", other));
                    FloatSuffix::None
                }
            };
            let body = &self.src[start..body_end];
            let value = if radix == 16 {
                parse_hex_float(&body[2..])
            } else {
                body.parse::<f64>().ok()
            };
            let value = value.unwrap_or_else(|| {
                self.error(loc.clone(), format!("malformed floating constant '{}'", body));
                0.0
            });
            return (K::Literal(LiteralKind::Float), TokenValue::Float { value, suffix: fsuffix });
        }

        let isuffix = match parse_int_suffix(&suffix) {
            Some(s) => s,
            None => {
                self.error(loc.clone(), format!("invalid suffix '{}' on integer constant", suffix));
                IntSuffix::default()
            }
        };
        let mut digits = &self.src[digits_start..body_end];
        if radix == 10 && digits.len() > 1 && digits.starts_with('0') && numeric.octal {
            radix = 8;
            digits = &digits[1..];
            if let Some(bad) = digits.bytes().find(|b| *b > b'7') {
                self.error(loc.clone(), format!("invalid digit '{}' in octal constant", bad as char));
                return (K::Literal(LiteralKind::Int), TokenValue::Int { value: 0, suffix: isuffix });
            }
        }
        let value = match u64::from_str_radix(digits, radix) {
            Ok(v) => v,
            Err(_) => {
                self.error(loc.clone(), "integer literal is too large to be represented in any integer type");
                0
            }
        };
        (K::Literal(LiteralKind::Int), TokenValue::Int { value, suffix: isuffix })
    }

    fn eat_digits(&mut self, radix: u32) {
        // Decimal runs also swallow 8/9 after a leading zero so `09` is diagnosed, not split.
        while let Some(c) = self.peek() {
            let ok = match radix {
                16 => c.is_ascii_hexdigit(),
                2 => c == b'0' || c == b'1',
                _ => c.is_ascii_digit(),
            };
            if ok {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Body of a string or character literal; the opening quote is already consumed.
    fn lex_quoted(&mut self, loc: &SourceLocation, prefix: CharPrefix, is_char: bool) -> (K, TokenValue) {
        let quote = if is_char {
            self.syntax.literals.char_quote
        } else {
            self.syntax.literals.string_quote
        };
        let escape = self.syntax.literals.escape;
        let mut units: Vec<u32> = Vec::new();
        let mut terminated = false;
        while let Some(c) = self.peek() {
            if c == quote {
                self.bump();
                terminated = true;
                break;
            }
            if Self::is_line_end(c) {
                break;
            }
            if c == escape {
                let esc_loc = self.location();
                self.bump();
                match self.lex_escape(&esc_loc, prefix) {
                    Some(Escape::Unit(v)) => units.push(v),
                    Some(Escape::CodePoint(ch)) => push_char(&mut units, ch, prefix),
                    None => {}
                }
                continue;
            }
            // one source character
            let ch_start = self.pos;
            self.bump();
            while self.peek().is_some_and(|b| (b & 0xC0) == 0x80) {
                self.bump();
            }
            let text = &self.src[ch_start..self.pos];
            if let Some(ch) = text.chars().next() {
                push_char(&mut units, ch, prefix);
            }
        }
        let what = if is_char { "character constant" } else { "string literal" };
        if !terminated {
            self.error(loc.clone(), format!("unterminated {}", what));
        }
        if is_char {
            if units.is_empty() && terminated {
                self.error(loc.clone(), "empty character constant");
            }
            let value = if prefix.is_narrow() {
                units.iter().fold(0u32, |acc, u| (acc << 8) | (u & 0xFF))
            } else {
                units.last().copied().unwrap_or(0)
            };
            (K::Literal(LiteralKind::Char), TokenValue::Char { value, prefix })
        } else {
            (K::Literal(LiteralKind::String), TokenValue::Str { units, prefix })
        }
    }

    /// Escape sequence after the escape character.
    fn lex_escape(&mut self, loc: &SourceLocation, prefix: CharPrefix) -> Option<Escape> {
        let Some(c) = self.peek() else {
            return None;
        };
        if Self::is_line_end(c) {
            return None;
        }
        self.bump();
        let simple = match c {
            b'n' => Some(0x0A),
            b't' => Some(0x09),
            b'r' => Some(0x0D),
            b'a' => Some(0x07),
            b'b' => Some(0x08),
            b'f' => Some(0x0C),
            b'v' => Some(0x0B),
            b'\\' | b'\'' | b'"' | b'?' => Some(c as u32),
            _ => None,
        };
        if let Some(v) = simple {
            return Some(Escape::Unit(v));
        }
        match c {
            b'x' => {
                let mut value: u64 = 0;
                let mut count = 0;
                while let Some(h) = self.peek() {
                    let Some(d) = (h as char).to_digit(16) else { break };
                    value = value.saturating_mul(16).saturating_add(d as u64);
                    count += 1;
                    self.bump();
                }
                if count == 0 {
                    self.error(loc.clone(), "\\x used with no following hex digits");
                    return None;
                }
                if value > prefix.max_unit() as u64 {
                    self.error(loc.clone(), "hex escape sequence out of range");
                    return Some(Escape::Unit(prefix.max_unit()));
                }
                Some(Escape::Unit(value as u32))
            }
            b'0'..=b'7' => {
                let mut value = (c - b'0') as u32;
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + (d - b'0') as u32;
                            self.bump();
                        }
                        _ => break,
                    }
                }
                if value > prefix.max_unit() {
                    self.error(loc.clone(), "octal escape sequence out of range");
                    return Some(Escape::Unit(prefix.max_unit()));
                }
                Some(Escape::Unit(value))
            }
            b'u' | b'U' => {
                let want = if c == b'u' { 4 } else { 8 };
                let mut value: u32 = 0;
                for _ in 0..want {
                    match self.peek().and_then(|h| (h as char).to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d;
                            self.bump();
                        }
                        None => {
                            self.error(loc.clone(), "incomplete universal character name");
                            return None;
                        }
                    }
                }
                match char::from_u32(value) {
                    Some(ch) => Some(Escape::CodePoint(ch)),
                    None => {
                        self.error(loc.clone(), "invalid universal character");
                        None
                    }
                }
            }
            other if other.is_ascii() => {
                self.error(loc.clone(), format!("unknown escape sequence '\\{}'", other as char));
                Some(Escape::Unit(other as u32))
            }
            _ => {
                // take the whole multi-byte character so the scan stays on a boundary
                let start = self.pos - 1;
                while self.peek().is_some_and(|b| (b & 0xC0) == 0x80) {
                    self.bump();
                }
                let ch = self.src[start..self.pos].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
                self.error(loc.clone(), format!("unknown escape sequence '\\{}'", ch));
                Some(Escape::CodePoint(ch))
            }
        }
    }
}

enum Escape {
    /// Numeric and simple escapes name a code unit directly.
    Unit(u32),
    /// `\u` / `\U` name a character, encoded per prefix.
    CodePoint(char),
}

fn push_char(units: &mut Vec<u32>, ch: char, prefix: CharPrefix) {
    match prefix {
        CharPrefix::None | CharPrefix::Utf8 => {
            let mut buf = [0u8; 4];
            units.extend(ch.encode_utf8(&mut buf).bytes().map(u32::from));
        }
        CharPrefix::Utf16 => {
            let mut buf = [0u16; 2];
            units.extend(ch.encode_utf16(&mut buf).iter().map(|u| *u as u32));
        }
        CharPrefix::Wide | CharPrefix::Utf32 => units.push(ch as u32),
    }
}

fn parse_int_suffix(s: &str) -> Option<IntSuffix> {
    let mut unsigned = false;
    let mut rest = s;
    if let Some(r) = rest.strip_prefix(['u', 'U']) {
        unsigned = true;
        rest = r;
    }
    let (long, rest) = if let Some(r) = rest.strip_prefix("ll").or_else(|| rest.strip_prefix("LL")) {
        (2, r)
    } else if let Some(r) = rest.strip_prefix(['l', 'L']) {
        (1, r)
    } else {
        (0, rest)
    };
    let rest = if !unsigned {
        match rest.strip_prefix(['u', 'U']) {
            Some(r) => {
                unsigned = true;
                r
            }
            None => rest,
        }
    } else {
        rest
    };
    rest.is_empty().then_some(IntSuffix { unsigned, long })
}

/// Hex float body after `0x`: hex digits, optional fraction, mandatory `p` exponent.
fn parse_hex_float(body: &str) -> Option<f64> {
    let (mantissa, exp) = match body.find(['p', 'P']) {
        Some(i) => (&body[..i], body[i + 1..].parse::<i32>().ok()?),
        None => (body, 0),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    let mut value = 0f64;
    for d in int_part.chars().chain(frac_part.chars()) {
        value = value * 16.0 + d.to_digit(16)? as f64;
    }
    let mut scale = i64::from(exp)
        .saturating_sub(4i64.saturating_mul(frac_part.len() as i64))
        .clamp(-2200, 2200) as i32;
    // in steps, so neither factor leaves the f64 range on its own
    while scale != 0 {
        let step = scale.clamp(-1000, 1000);
        value *= 2f64.powi(step);
        scale -= step;
    }
    Some(value)
}

/// `# <n> ["file"] flags...` or `#line <n> ["file"]` (text after the `#`).
fn parse_linemarker(text: &str) -> Option<(u32, Option<String>)> {
    let mut rest = text.trim_start();
    if let Some(r) = rest.strip_prefix("line") {
        if r.starts_with(|c: char| c.is_ascii_whitespace()) {
            rest = r.trim_start();
        }
    }
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let line = rest[..digits_end].parse::<u32>().ok()?;
    let rest = rest[digits_end..].trim_start();
    let file = rest.strip_prefix('"').and_then(|r| {
        let mut out = String::new();
        let mut chars = r.chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => return Some(out),
                '\\' => out.push(chars.next()?),
                c => out.push(c),
            }
        }
        None
    });
    Some((line, file))
}

/// Lex `src` with `syntax`, recording problems in `diags`. The stream always ends
/// with exactly one EOF token.
pub fn tokenize(src: &SourceBuffer, syntax: &SyntaxDescriptor, diags: &mut Diagnostics) -> TokenStream {
    Lexer::new(src, syntax, diags).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_suffixes() {
        assert_eq!(parse_int_suffix(""), Some(IntSuffix { unsigned: false, long: 0 }));
        assert_eq!(parse_int_suffix("uLL"), Some(IntSuffix { unsigned: true, long: 2 }));
        assert_eq!(parse_int_suffix("llu"), Some(IntSuffix { unsigned: true, long: 2 }));
        assert_eq!(parse_int_suffix("Lu"), Some(IntSuffix { unsigned: true, long: 1 }));
        assert_eq!(parse_int_suffix("lL"), None);
        assert_eq!(parse_int_suffix("uu"), None);
        assert_eq!(parse_int_suffix("f"), None);
    }

    #[test]
    fn hex_floats() {
        assert_eq!(parse_hex_float("1p3"), Some(8.0));
        assert_eq!(parse_hex_float("1.8p1"), Some(3.0));
        assert_eq!(parse_hex_float("0.1p-2"), Some(0.015625));
    }

    #[test]
    fn linemarkers() {
        assert_eq!(parse_linemarker(" 12 \"foo.c\" 1 3"), Some((12, Some("foo.c".to_string()))));
        assert_eq!(parse_linemarker("line 7"), Some((7, None)));
        assert_eq!(parse_linemarker("pragma once"), None);
        assert_eq!(parse_linemarker(" 3 \"a\\\\b.h\""), Some((3, Some("a\\b.h".to_string()))));
    }
}
