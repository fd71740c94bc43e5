//! Declarative description of a C-family dialect.
//!
//! A [`SyntaxDescriptor`] is pure data plus a handful of predicates. The lexer
//! reads its tables and the parser consults its precedence table, rule names
//! and type-name hook. Descriptors are immutable once built, so one instance can
//! be shared by any number of sessions.

use std::collections::HashMap;

use crate::token::{Keyword, Operator, Punctuator};

/// Standard C precedence levels as recorded in operator tables.
pub mod prec {
    pub const ASSIGNMENT: u8 = 1;
    pub const CONDITIONAL: u8 = 2;
    pub const LOGICAL_OR: u8 = 3;
    pub const LOGICAL_AND: u8 = 4;
    pub const BIT_OR: u8 = 5;
    pub const BIT_XOR: u8 = 6;
    pub const BIT_AND: u8 = 7;
    pub const EQUALITY: u8 = 8;
    pub const RELATIONAL: u8 = 9;
    pub const SHIFT: u8 = 10;
    pub const ADDITIVE: u8 = 11;
    pub const MULTIPLICATIVE: u8 = 12;
    pub const UNARY: u8 = 13;
    pub const POSTFIX: u8 = 14;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorDef {
    pub symbol: &'static str,
    pub op: Operator,
    pub precedence: u8,
    pub assoc: Associativity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PunctDef {
    pub symbol: &'static str,
    pub punct: Punctuator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommentSyntax {
    pub line_start: Option<&'static str>,
    pub block: Option<(&'static str, &'static str)>,
}

#[derive(Debug, Clone, Copy)]
pub struct CharClasses {
    pub is_identifier_start: fn(u8) -> bool,
    pub is_identifier_continue: fn(u8) -> bool,
    pub is_digit: fn(u8) -> bool,
    pub is_whitespace: fn(u8) -> bool,
}

fn ascii_ident_start(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphabetic()
}

fn ascii_ident_continue(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphanumeric()
}

fn ascii_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn ascii_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

impl Default for CharClasses {
    fn default() -> Self {
        Self {
            is_identifier_start: ascii_ident_start,
            is_identifier_continue: ascii_ident_continue,
            is_digit: ascii_digit,
            is_whitespace: ascii_whitespace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralDelimiters {
    pub string_quote: u8,
    pub char_quote: u8,
    pub escape: u8,
}

impl Default for LiteralDelimiters {
    fn default() -> Self {
        Self {
            string_quote: b'"',
            char_quote: b'\'',
            escape: b'\\',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NumericFeatures {
    pub hex: bool,
    pub octal: bool,
    pub binary: bool,
    pub float: bool,
    pub scientific: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub case_sensitive: bool,
    /// Grammar-level fact about the language. The lexer ignores it and the C
    /// parser always demands `;`.
    pub requires_semicolons: bool,
    pub supports_preprocessor: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            requires_semicolons: true,
            supports_preprocessor: false,
        }
    }
}

/// Whatever scope structure the parser keeps; the type-name hook queries it.
pub trait TypeNameScope {
    fn is_typedef_name(&self, name: &str) -> bool;
}

pub type TypeNamePredicate = fn(&dyn TypeNameScope, &str) -> bool;

fn scope_only(scope: &dyn TypeNameScope, name: &str) -> bool {
    scope.is_typedef_name(name)
}

#[derive(Debug, Clone)]
pub struct SyntaxDescriptor {
    name: String,
    version: String,
    keywords: HashMap<String, Keyword>,
    operators: Vec<OperatorDef>,
    punctuation: Vec<PunctDef>,
    rules: Vec<&'static str>,
    start_rule: &'static str,
    type_name: TypeNamePredicate,
    pub comments: CommentSyntax,
    pub chars: CharClasses,
    pub literals: LiteralDelimiters,
    pub numeric: NumericFeatures,
    pub features: Features,
}

impl SyntaxDescriptor {
    pub fn builder(name: &str, version: &str) -> SyntaxBuilder {
        SyntaxBuilder {
            name: name.to_string(),
            version: version.to_string(),
            keywords: Vec::new(),
            operators: Vec::new(),
            punctuation: Vec::new(),
            rules: Vec::new(),
            start_rule: None,
            type_name: scope_only,
            comments: CommentSyntax::default(),
            chars: CharClasses::default(),
            literals: LiteralDelimiters::default(),
            numeric: NumericFeatures::default(),
            features: Features::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn keyword(&self, lexeme: &str) -> Option<Keyword> {
        if self.features.case_sensitive {
            self.keywords.get(lexeme).copied()
        } else {
            self.keywords.get(&lexeme.to_ascii_lowercase()).copied()
        }
    }

    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    /// Operator table, longest symbol first.
    pub fn operators(&self) -> &[OperatorDef] {
        &self.operators
    }

    /// Punctuation table, longest symbol first.
    pub fn punctuation(&self) -> &[PunctDef] {
        &self.punctuation
    }

    pub fn operator(&self, op: Operator) -> Option<&OperatorDef> {
        self.operators.iter().find(|d| d.op == op)
    }

    pub fn precedence(&self, op: Operator) -> Option<u8> {
        self.operator(op).map(|d| d.precedence)
    }

    /// First (and therefore longest) operator that prefixes `rest`.
    pub fn match_operator(&self, rest: &[u8]) -> Option<&OperatorDef> {
        self.operators
            .iter()
            .find(|d| rest.starts_with(d.symbol.as_bytes()))
    }

    pub fn match_punct(&self, rest: &[u8]) -> Option<&PunctDef> {
        self.punctuation
            .iter()
            .find(|d| rest.starts_with(d.symbol.as_bytes()))
    }

    pub fn rules(&self) -> &[&'static str] {
        &self.rules
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.iter().any(|r| *r == name)
    }

    pub fn start_rule(&self) -> &'static str {
        self.start_rule
    }

    pub fn is_type_name(&self, scope: &dyn TypeNameScope, name: &str) -> bool {
        (self.type_name)(scope, name)
    }
}

pub struct SyntaxBuilder {
    name: String,
    version: String,
    keywords: Vec<(String, Keyword)>,
    operators: Vec<OperatorDef>,
    punctuation: Vec<PunctDef>,
    rules: Vec<&'static str>,
    start_rule: Option<&'static str>,
    type_name: TypeNamePredicate,
    comments: CommentSyntax,
    chars: CharClasses,
    literals: LiteralDelimiters,
    numeric: NumericFeatures,
    features: Features,
}

impl SyntaxBuilder {
    pub fn keyword(mut self, spelling: &str, kw: Keyword) -> Self {
        self.keywords.push((spelling.to_string(), kw));
        self
    }

    pub fn operator(
        mut self,
        symbol: &'static str,
        op: Operator,
        precedence: u8,
        assoc: Associativity,
    ) -> Self {
        debug_assert!(
            (prec::ASSIGNMENT..=prec::POSTFIX).contains(&precedence),
            "precedence {} out of range for {:?}",
            precedence,
            symbol
        );
        self.operators.push(OperatorDef {
            symbol,
            op,
            precedence,
            assoc,
        });
        self
    }

    pub fn punct(mut self, symbol: &'static str, punct: Punctuator) -> Self {
        self.punctuation.push(PunctDef { symbol, punct });
        self
    }

    pub fn comments(mut self, comments: CommentSyntax) -> Self {
        self.comments = comments;
        self
    }

    pub fn chars(mut self, chars: CharClasses) -> Self {
        self.chars = chars;
        self
    }

    pub fn literals(mut self, literals: LiteralDelimiters) -> Self {
        self.literals = literals;
        self
    }

    pub fn numeric(mut self, numeric: NumericFeatures) -> Self {
        self.numeric = numeric;
        self
    }

    pub fn features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    pub fn rule(mut self, name: &'static str) -> Self {
        self.rules.push(name);
        self
    }

    /// The start rule is also registered as a rule.
    pub fn start_rule(mut self, name: &'static str) -> Self {
        if !self.rules.contains(&name) {
            self.rules.push(name);
        }
        self.start_rule = Some(name);
        self
    }

    pub fn type_name(mut self, pred: TypeNamePredicate) -> Self {
        self.type_name = pred;
        self
    }

    pub fn build(mut self) -> SyntaxDescriptor {
        // Stable sort keeps declaration order among symbols of equal length.
        self.operators
            .sort_by(|a, b| b.symbol.len().cmp(&a.symbol.len()));
        self.punctuation
            .sort_by(|a, b| b.symbol.len().cmp(&a.symbol.len()));
        let case_sensitive = self.features.case_sensitive;
        let keywords = self
            .keywords
            .into_iter()
            .map(|(k, v)| {
                if case_sensitive {
                    (k, v)
                } else {
                    (k.to_ascii_lowercase(), v)
                }
            })
            .collect();
        let start_rule = self
            .start_rule
            .or_else(|| self.rules.first().copied())
            .unwrap_or("");
        SyntaxDescriptor {
            name: self.name,
            version: self.version,
            keywords,
            operators: self.operators,
            punctuation: self.punctuation,
            rules: self.rules,
            start_rule,
            type_name: self.type_name,
            comments: self.comments,
            chars: self.chars,
            literals: self.literals,
            numeric: self.numeric,
            features: self.features,
        }
    }
}
