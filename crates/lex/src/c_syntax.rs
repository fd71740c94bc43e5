//! The C dialect tables.

use crate::keywords::C_KEYWORDS;
use crate::syntax::{
    prec, Associativity, CharClasses, CommentSyntax, Features, LiteralDelimiters, NumericFeatures,
    SyntaxDescriptor, TypeNameScope,
};
use crate::token::{Operator as O, Punctuator as P};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CStandard {
    C89,
    C99,
    C11,
    C17,
    C23,
}

impl CStandard {
    pub fn parse(s: &str) -> Option<(CStandard, bool)> {
        let lower = s.to_ascii_lowercase();
        let (gnu, rest) = match lower.strip_prefix("gnu") {
            Some(rest) => (true, rest.to_string()),
            None => (false, lower.strip_prefix('c')?.to_string()),
        };
        let std = match rest.as_str() {
            "89" | "90" => CStandard::C89,
            "99" => CStandard::C99,
            "11" => CStandard::C11,
            "17" | "18" => CStandard::C17,
            "23" | "2x" => CStandard::C23,
            _ => return None,
        };
        Some((std, gnu))
    }

    pub fn tag(self) -> &'static str {
        match self {
            CStandard::C89 => "c89",
            CStandard::C99 => "c99",
            CStandard::C11 => "c11",
            CStandard::C17 => "c17",
            CStandard::C23 => "c23",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CDialect {
    pub standard: CStandard,
    pub gnu: bool,
}

impl Default for CDialect {
    fn default() -> Self {
        Self {
            standard: CStandard::C17,
            gnu: true,
        }
    }
}

impl CDialect {
    pub fn version_tag(&self) -> String {
        if self.gnu {
            format!("gnu{}", &self.standard.tag()[1..])
        } else {
            self.standard.tag().to_string()
        }
    }
}

pub const C_GRAMMAR_RULES: &[&str] = &[
    "translation_unit",
    "external_declaration",
    "declaration",
    "statement",
    "compound_statement",
    "expression",
    "assignment_expression",
    "type_name",
    "initializer",
];

fn c_is_type_name(scope: &dyn TypeNameScope, name: &str) -> bool {
    name == "__builtin_va_list" || scope.is_typedef_name(name)
}

pub fn c_syntax(dialect: CDialect) -> SyntaxDescriptor {
    use Associativity::{Left, Right};

    let mut b = SyntaxDescriptor::builder("C", &dialect.version_tag());
    for (spelling, kw, avail) in C_KEYWORDS {
        if avail.allows(dialect.standard, dialect.gnu) {
            b = b.keyword(spelling, *kw);
        }
    }

    b = b
        .operator("<<=", O::ShlAssign, prec::ASSIGNMENT, Right)
        .operator(">>=", O::ShrAssign, prec::ASSIGNMENT, Right)
        .operator("+=", O::PlusAssign, prec::ASSIGNMENT, Right)
        .operator("-=", O::MinusAssign, prec::ASSIGNMENT, Right)
        .operator("*=", O::StarAssign, prec::ASSIGNMENT, Right)
        .operator("/=", O::SlashAssign, prec::ASSIGNMENT, Right)
        .operator("%=", O::PercentAssign, prec::ASSIGNMENT, Right)
        .operator("&=", O::AndAssign, prec::ASSIGNMENT, Right)
        .operator("^=", O::XorAssign, prec::ASSIGNMENT, Right)
        .operator("|=", O::OrAssign, prec::ASSIGNMENT, Right)
        .operator("->", O::Arrow, prec::POSTFIX, Left)
        .operator("++", O::Inc, prec::POSTFIX, Left)
        .operator("--", O::Dec, prec::POSTFIX, Left)
        .operator("<<", O::Shl, prec::SHIFT, Left)
        .operator(">>", O::Shr, prec::SHIFT, Left)
        .operator("<=", O::Le, prec::RELATIONAL, Left)
        .operator(">=", O::Ge, prec::RELATIONAL, Left)
        .operator("==", O::EqEq, prec::EQUALITY, Left)
        .operator("!=", O::Ne, prec::EQUALITY, Left)
        .operator("&&", O::AndAnd, prec::LOGICAL_AND, Left)
        .operator("||", O::OrOr, prec::LOGICAL_OR, Left)
        .operator("=", O::Assign, prec::ASSIGNMENT, Right)
        .operator("?", O::Question, prec::CONDITIONAL, Right)
        .operator("|", O::Pipe, prec::BIT_OR, Left)
        .operator("^", O::Caret, prec::BIT_XOR, Left)
        .operator("&", O::Amp, prec::BIT_AND, Left)
        .operator("<", O::Lt, prec::RELATIONAL, Left)
        .operator(">", O::Gt, prec::RELATIONAL, Left)
        .operator("+", O::Plus, prec::ADDITIVE, Left)
        .operator("-", O::Minus, prec::ADDITIVE, Left)
        .operator("*", O::Star, prec::MULTIPLICATIVE, Left)
        .operator("/", O::Slash, prec::MULTIPLICATIVE, Left)
        .operator("%", O::Percent, prec::MULTIPLICATIVE, Left)
        .operator("!", O::Bang, prec::UNARY, Right)
        .operator("~", O::Tilde, prec::UNARY, Right)
        .operator(".", O::Dot, prec::POSTFIX, Left);

    b = b
        .punct("...", P::Ellipsis)
        .punct("(", P::LParen)
        .punct(")", P::RParen)
        .punct("{", P::LBrace)
        .punct("}", P::RBrace)
        .punct("[", P::LBracket)
        .punct("]", P::RBracket)
        .punct(";", P::Semicolon)
        .punct(",", P::Comma)
        .punct(":", P::Colon);

    for rule in C_GRAMMAR_RULES {
        b = b.rule(rule);
    }

    b.start_rule("translation_unit")
        .comments(CommentSyntax {
            line_start: if dialect.standard >= CStandard::C99 || dialect.gnu {
                Some("//")
            } else {
                None
            },
            block: Some(("/*", "*/")),
        })
        .chars(CharClasses::default())
        .literals(LiteralDelimiters::default())
        .numeric(NumericFeatures {
            hex: true,
            octal: true,
            binary: dialect.gnu || dialect.standard >= CStandard::C23,
            float: true,
            scientific: true,
        })
        .features(Features {
            case_sensitive: true,
            requires_semicolons: true,
            supports_preprocessor: true,
        })
        .type_name(c_is_type_name)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Keyword;

    struct Empty;
    impl TypeNameScope for Empty {
        fn is_typedef_name(&self, _name: &str) -> bool {
            false
        }
    }

    #[test]
    fn keywords_follow_the_standard() {
        let c89 = c_syntax(CDialect {
            standard: CStandard::C89,
            gnu: false,
        });
        assert_eq!(c89.keyword("int"), Some(Keyword::Int));
        assert_eq!(c89.keyword("inline"), None);
        assert_eq!(c89.keyword("_Bool"), None);
        assert!(c89.comments.line_start.is_none());
        assert!(!c89.numeric.binary);

        let c23 = c_syntax(CDialect {
            standard: CStandard::C23,
            gnu: false,
        });
        assert_eq!(c23.keyword("bool"), Some(Keyword::Bool));
        assert_eq!(c23.keyword("typeof"), Some(Keyword::Typeof));
        assert_eq!(c23.keyword("__attribute__"), None);
        assert!(c23.numeric.binary);

        let gnu = c_syntax(CDialect::default());
        assert_eq!(gnu.version(), "gnu17");
        assert_eq!(gnu.keyword("__attribute__"), Some(Keyword::Attribute));
        assert_eq!(gnu.keyword("bool"), None);
    }

    #[test]
    fn operator_table_has_c_precedences() {
        let c = c_syntax(CDialect::default());
        assert_eq!(c.precedence(O::Assign), Some(1));
        assert_eq!(c.precedence(O::Question), Some(2));
        assert_eq!(c.precedence(O::OrOr), Some(3));
        assert_eq!(c.precedence(O::Star), Some(12));
        assert_eq!(c.operator(O::Question).map(|d| d.assoc), Some(Associativity::Right));
        assert_eq!(c.operator(O::Minus).map(|d| d.assoc), Some(Associativity::Left));
        let lens: Vec<_> = c.operators().iter().map(|d| d.symbol.len()).collect();
        assert!(lens.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(c.start_rule(), "translation_unit");
        assert!(c.features.requires_semicolons && c.features.supports_preprocessor);
    }

    #[test]
    fn builtin_va_list_is_always_a_type() {
        let c = c_syntax(CDialect::default());
        assert!(c.is_type_name(&Empty, "__builtin_va_list"));
        assert!(!c.is_type_name(&Empty, "size_t"));
    }

    #[test]
    fn parses_std_flags() {
        assert_eq!(CStandard::parse("gnu17"), Some((CStandard::C17, true)));
        assert_eq!(CStandard::parse("c99"), Some((CStandard::C99, false)));
        assert_eq!(CStandard::parse("C23"), Some((CStandard::C23, false)));
        assert_eq!(CStandard::parse("c++17"), None);
    }
}
