use anyhow::{Context, Result};
use lex::{
    c_syntax, tokenize, CDialect, CStandard, Cursor, DiagnosticKind, Diagnostics, Keyword as Kw, Operator as O,
    Punctuator as P, SourceBuffer, SourceLocation, SyntaxDescriptor, Token, TokenKind as K, TokenStream,
};

use crate::ast::*;
use crate::scope::ScopeStack;

mod decl;
mod expr;
mod stmt;

/// Marker for "a diagnostic has been recorded; unwind to the nearest recovery point".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Recover;

pub(crate) type PResult<T> = std::result::Result<T, Recover>;

type RuleFn = fn(&mut Parser<'_>) -> PResult<Node>;

/// Recursion budget shared by expressions, statements and declarators. A
/// parenthesized expression spends four levels, so this admits about 256 of them.
const MAX_NESTING: usize = 1024;

fn rule_translation_unit(p: &mut Parser<'_>) -> PResult<Node> {
    Ok(p.translation_unit())
}

fn rule_external_declaration(p: &mut Parser<'_>) -> PResult<Node> {
    let loc = p.loc();
    let mut out = Vec::new();
    p.external_declaration(&mut out)?;
    Ok(group(loc, out))
}

fn rule_declaration(p: &mut Parser<'_>) -> PResult<Node> {
    let loc = p.loc();
    let mut out = Vec::new();
    p.block_declaration(&mut out)?;
    Ok(group(loc, out))
}

fn rule_statement(p: &mut Parser<'_>) -> PResult<Node> {
    p.statement()
}

fn rule_compound_statement(p: &mut Parser<'_>) -> PResult<Node> {
    p.compound_statement(true)
}

fn rule_expression(p: &mut Parser<'_>) -> PResult<Node> {
    p.expression()
}

fn rule_assignment_expression(p: &mut Parser<'_>) -> PResult<Node> {
    p.assignment_expression()
}

fn rule_type_name(p: &mut Parser<'_>) -> PResult<Node> {
    p.type_name()
}

fn rule_initializer(p: &mut Parser<'_>) -> PResult<Node> {
    p.initializer()
}

const RULES: &[(&str, RuleFn)] = &[
    ("translation_unit", rule_translation_unit),
    ("external_declaration", rule_external_declaration),
    ("declaration", rule_declaration),
    ("statement", rule_statement),
    ("compound_statement", rule_compound_statement),
    ("expression", rule_expression),
    ("assignment_expression", rule_assignment_expression),
    ("type_name", rule_type_name),
    ("initializer", rule_initializer),
];

fn lookup_rule(name: &str) -> Option<RuleFn> {
    RULES.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

/// A single declaration stays as is; several (or none) are wrapped.
pub(crate) fn group(loc: SourceLocation, mut nodes: Vec<Node>) -> Node {
    if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        Node::with_children(NodeKind::DeclGroup, loc, nodes)
    }
}

pub struct Parser<'a> {
    cur: Cursor<'a>,
    syntax: &'a SyntaxDescriptor,
    scopes: ScopeStack,
    diags: &'a mut Diagnostics,
    panic_mode: bool,
    dialect: CDialect,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a TokenStream, syntax: &'a SyntaxDescriptor, diags: &'a mut Diagnostics) -> Self {
        let dialect = dialect_of(syntax);
        Self {
            cur: tokens.cursor(),
            syntax,
            scopes: ScopeStack::new(),
            diags,
            panic_mode: false,
            dialect,
            depth: 0,
        }
    }

    /// Parse from the descriptor's start rule.
    pub fn parse(&mut self) -> Node {
        let start = self.syntax.start_rule();
        match self.run_rule(start) {
            Some(node) => node,
            None => Node::new(NodeKind::TranslationUnit, self.loc()),
        }
    }

    /// Parse one named grammar rule; the rule must consume every token.
    pub fn parse_rule(&mut self, name: &str) -> Option<Node> {
        let node = self.run_rule(name)?;
        if !self.cur.is_eof() {
            let tok = self.peek().clone();
            self.error_at(tok.location.clone(), format!("unexpected {} after {}", tok, name.replace('_', " ")));
        }
        Some(node)
    }

    fn run_rule(&mut self, name: &str) -> Option<Node> {
        let rule = if self.syntax.has_rule(name) {
            lookup_rule(name)
        } else {
            None
        };
        let Some(rule) = rule else {
            let loc = self.loc();
            self.diags.report(
                DiagnosticKind::Internal,
                loc,
                format!("grammar rule '{}' is not bound for {}", name, self.syntax.name()),
            );
            return None;
        };
        log::debug!("parsing rule '{}'", name);
        rule(self).ok()
    }

    // ---- token helpers -------------------------------------------------

    fn peek(&self) -> &'a Token {
        self.cur.peek()
    }

    fn peek_nth(&self, n: usize) -> &'a Token {
        self.cur.peek_nth(n)
    }

    fn bump(&mut self) -> &'a Token {
        self.cur.advance()
    }

    fn loc(&self) -> SourceLocation {
        self.peek().location.clone()
    }

    fn at_punct(&self, p: P) -> bool {
        self.peek().is_punct(p)
    }

    fn at_op(&self, op: O) -> bool {
        self.peek().is_operator(op)
    }

    fn at_keyword(&self, kw: Kw) -> bool {
        self.peek().is_keyword(kw)
    }

    fn consume_punct(&mut self, p: P) -> bool {
        if self.at_punct(p) {
            self.bump();
            return true;
        }
        false
    }

    fn consume_op(&mut self, op: O) -> bool {
        if self.at_op(op) {
            self.bump();
            return true;
        }
        false
    }

    fn consume_keyword(&mut self, kw: Kw) -> bool {
        if self.at_keyword(kw) {
            self.bump();
            return true;
        }
        false
    }

    fn expect_punct(&mut self, p: P, what: &str) -> PResult<&'a Token> {
        if self.at_punct(p) {
            return Ok(self.bump());
        }
        Err(self.unexpected(what))
    }

    fn expect_op(&mut self, op: O, what: &str) -> PResult<&'a Token> {
        if self.at_op(op) {
            return Ok(self.bump());
        }
        Err(self.unexpected(what))
    }

    fn expect_ident(&mut self) -> PResult<&'a Token> {
        if self.peek().kind == K::Identifier {
            return Ok(self.bump());
        }
        Err(self.unexpected("identifier"))
    }

    /// `expected <what>, found '<tok>'` at the current token.
    fn unexpected(&mut self, what: &str) -> Recover {
        let tok = self.peek();
        self.error_at(tok.location.clone(), format!("expected {}, found {}", what, tok))
    }

    // ---- diagnostics ---------------------------------------------------

    /// Record a syntax error and enter panic mode. Errors raised while already
    /// panicking are dropped.
    fn error_at(&mut self, loc: SourceLocation, msg: impl Into<String>) -> Recover {
        if !self.panic_mode {
            self.diags.report(DiagnosticKind::Parse, loc, msg);
            self.panic_mode = true;
        }
        Recover
    }

    /// Record an error that does not disturb parsing (bad specifier mix, tag clash).
    fn report(&mut self, loc: SourceLocation, msg: impl Into<String>) {
        if !self.panic_mode {
            self.diags.report(DiagnosticKind::Parse, loc, msg);
        }
    }

    /// Run `f` one level deeper, or report and unwind once the budget is spent.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING {
            let loc = self.loc();
            return Err(self.error_at(loc, "code is nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Skip to a point where parsing can resume: just past a `;`, or before a
    /// statement/declaration keyword or a `}`. Braced blocks met on the way are
    /// skipped whole.
    fn synchronize(&mut self) {
        self.panic_mode = false;
        let from = self.cur.position();
        let mut braces = 0usize;
        loop {
            let tok = self.peek();
            match tok.kind {
                K::Eof => break,
                K::Punct(P::LBrace) => {
                    braces += 1;
                    self.bump();
                }
                K::Punct(P::RBrace) if braces > 0 => {
                    braces -= 1;
                    self.bump();
                }
                _ if braces > 0 => {
                    self.bump();
                }
                K::Punct(P::Semicolon) => {
                    self.bump();
                    break;
                }
                K::Punct(P::RBrace) => break,
                K::Keyword(kw) if is_recovery_keyword(kw) && self.cur.position() != from => break,
                _ => {
                    self.bump();
                }
            }
        }
        log::debug!("synchronized at {}", self.loc());
    }

    /// Recover after an item that started at `start` failed; always makes progress.
    fn recover(&mut self, start: usize) {
        self.synchronize();
        if self.cur.position() == start {
            self.bump();
        }
    }

    fn is_gnu(&self) -> bool {
        self.dialect.gnu
    }

    fn standard(&self) -> CStandard {
        self.dialect.standard
    }

    fn is_type_name(&self, name: &str) -> bool {
        self.syntax.is_type_name(&self.scopes, name)
    }

    // ---- translation unit ----------------------------------------------

    pub(crate) fn translation_unit(&mut self) -> Node {
        let loc = self.loc();
        let mut items = Vec::new();
        while !self.cur.is_eof() {
            let start = self.cur.position();
            if self.external_declaration(&mut items).is_err() {
                self.recover(start);
            }
        }
        Node::with_children(NodeKind::TranslationUnit, loc, items)
    }
}

fn is_recovery_keyword(kw: Kw) -> bool {
    matches!(
        kw,
        Kw::If
            | Kw::While
            | Kw::For
            | Kw::Return
            | Kw::Switch
            | Kw::Do
            | Kw::Struct
            | Kw::Union
            | Kw::Enum
            | Kw::Typedef
            | Kw::Void
            | Kw::Char
            | Kw::Short
            | Kw::Int
            | Kw::Long
            | Kw::Float
            | Kw::Double
            | Kw::Signed
            | Kw::Unsigned
            | Kw::Bool
    )
}

fn dialect_of(syntax: &SyntaxDescriptor) -> CDialect {
    match CStandard::parse(syntax.version()) {
        Some((standard, gnu)) => CDialect { standard, gnu },
        None => CDialect::default(),
    }
}

/// Parse a token stream from the descriptor's start rule. Errors land in `diags`;
/// the returned tree holds whatever was parsed before and between them.
pub fn parse(tokens: &TokenStream, syntax: &SyntaxDescriptor, diags: &mut Diagnostics) -> Node {
    Parser::new(tokens, syntax, diags).parse()
}

/// Parse a single named rule (`"expression"`, `"type_name"`, ...).
pub fn parse_rule(rule: &str, tokens: &TokenStream, syntax: &SyntaxDescriptor, diags: &mut Diagnostics) -> Option<Node> {
    Parser::new(tokens, syntax, diags).parse_rule(rule)
}

/// Lex and parse a buffer with `syntax`, returning the tree and every diagnostic.
pub fn parse_source(src: &SourceBuffer, syntax: &SyntaxDescriptor) -> (Node, Diagnostics) {
    let mut diags = Diagnostics::new();
    let tokens = tokenize(src, syntax, &mut diags);
    let tu = parse(&tokens, syntax, &mut diags);
    (tu, diags)
}

/// Parse preprocessed GNU C17 source, failing on any diagnostic.
pub fn parse_translation_unit(src: &str) -> Result<Node> {
    parse_translation_unit_with(src, CDialect::default())
}

pub fn parse_translation_unit_with(src: &str, dialect: CDialect) -> Result<Node> {
    let buf = SourceBuffer::new("<input>", src);
    let syntax = c_syntax(dialect);
    let (tu, diags) = parse_source(&buf, &syntax);
    diags.check().context("failed to parse translation unit")?;
    Ok(tu)
}
