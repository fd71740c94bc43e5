pub mod c_syntax;
pub mod diag;
pub mod keywords;
mod lexer;
pub mod source;
pub mod stream;
pub mod syntax;
pub mod token;

pub use c_syntax::{c_syntax, CDialect, CStandard};
pub use diag::{Diagnostic, DiagnosticKind, Diagnostics};
pub use lexer::{tokenize, Lexer};
pub use source::{SourceBuffer, SourceLocation};
pub use stream::{Cursor, Mark, TokenStream};
pub use syntax::{SyntaxDescriptor, TypeNameScope};
pub use token::{
    units_to_string, CharPrefix, FloatSuffix, IntSuffix, Keyword, LiteralKind, Operator, Punctuator, Token,
    TokenKind, TokenValue,
};

/// Lex `src` as GNU C17 under the name `<input>`.
pub fn tokenize_str(src: &str) -> (TokenStream, Diagnostics) {
    let buf = SourceBuffer::new("<input>", src);
    let syntax = c_syntax(CDialect::default());
    let mut diags = Diagnostics::new();
    let toks = tokenize(&buf, &syntax, &mut diags);
    (toks, diags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_ident_keyword_number() {
        let (toks, diags) = tokenize_str("int x = 42;");
        assert!(diags.is_empty());
        use TokenKind as K;
        let toks = toks.tokens();
        assert!(matches!(toks[0].kind, K::Keyword(Keyword::Int)));
        assert!(matches!(toks[1].kind, K::Identifier) && toks[1].lexeme == "x");
        assert!(matches!(toks[2].kind, K::Operator(Operator::Assign)));
        assert!(matches!(toks[3].value, TokenValue::Int { value: 42, .. }));
        assert!(matches!(toks[4].kind, K::Punct(Punctuator::Semicolon)));
        assert!(toks[5].kind.is_eof());
    }
}
