//! Random-access token storage and a cheap cursor over it.

use crate::token::{Token, TokenKind, TokenValue};

/// Tokens in source order. The last token is always the single EOF token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Wrap lexer output. A missing trailing EOF is appended at the last token's location.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|t| t.kind == TokenKind::Eof) {
            let location = tokens
                .last()
                .map(|t| t.location.clone())
                .unwrap_or_else(|| crate::source::SourceLocation::new("<input>".into(), 1, 1, 0));
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                location,
                value: TokenValue::None,
            });
        }
        Self { tokens }
    }

    /// Number of tokens, EOF included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }

    /// Token at `index`; indices past the end yield the EOF token.
    pub fn get(&self, index: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[index.min(last)]
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            stream: self,
            pos: 0,
        }
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Saved cursor position for backtracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mark(usize);

#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    stream: &'a TokenStream,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn peek(&self) -> &'a Token {
        self.stream.get(self.pos)
    }

    pub fn peek_nth(&self, n: usize) -> &'a Token {
        self.stream.get(self.pos.saturating_add(n))
    }

    /// Return the current token and move past it. Sticks at EOF.
    pub fn advance(&mut self) -> &'a Token {
        let tok = self.peek();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.0;
    }

    pub fn is_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// The token before the cursor, if any.
    pub fn previous(&self) -> Option<&'a Token> {
        self.pos.checked_sub(1).map(|i| self.stream.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize_str;

    #[test]
    fn cursor_sticks_at_eof() {
        let (ts, _) = tokenize_str("a b");
        let mut c = ts.cursor();
        assert_eq!(c.advance().lexeme, "a");
        assert_eq!(c.advance().lexeme, "b");
        assert!(c.is_eof());
        c.advance();
        c.advance();
        assert!(c.is_eof());
        assert_eq!(c.position(), 2);
        assert!(c.peek_nth(10).kind.is_eof());
    }

    #[test]
    fn mark_and_reset() {
        let (ts, _) = tokenize_str("x + y");
        let mut c = ts.cursor();
        let m = c.mark();
        c.advance();
        c.advance();
        assert_eq!(c.peek().lexeme, "y");
        assert_eq!(c.previous().map(|t| t.lexeme.as_str()), Some("+"));
        c.reset(m);
        assert_eq!(c.peek().lexeme, "x");
        assert!(c.previous().is_none());
    }

    #[test]
    fn missing_eof_is_appended() {
        let ts = TokenStream::new(Vec::new());
        assert_eq!(ts.len(), 1);
        assert!(ts.is_empty());
        assert!(ts.get(5).kind.is_eof());
    }
}
