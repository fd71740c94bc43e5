use std::fmt;

use crate::source::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // C89
    Auto,
    Break,
    Case,
    Char,
    Const,
    Continue,
    Default,
    Do,
    Double,
    Else,
    Enum,
    Extern,
    Float,
    For,
    Goto,
    If,
    Int,
    Long,
    Register,
    Return,
    Short,
    Signed,
    Sizeof,
    Static,
    Struct,
    Switch,
    Typedef,
    Union,
    Unsigned,
    Void,
    Volatile,
    While,
    // C99
    Inline,
    Restrict,
    Bool,
    Complex,
    Imaginary,
    // C11
    Alignas,
    Alignof,
    Atomic,
    Generic,
    Noreturn,
    StaticAssert,
    ThreadLocal,
    // C23
    Constexpr,
    False,
    True,
    Nullptr,
    Typeof,
    TypeofUnqual,
    BitInt,
    Decimal32,
    Decimal64,
    Decimal128,
    Float16,
    Float32,
    Float64,
    Float128,
    Float32x,
    Float64x,
    // GNU
    Attribute,
    Asm,
    Extension,
    Label,
    Int128,
    AutoType,
    BuiltinVaArg,
    BuiltinOffsetof,
    BuiltinTypesCompatibleP,
}

impl Keyword {
    /// Canonical spelling; aliases such as `__inline__` map onto the same keyword.
    pub fn spelling(self) -> &'static str {
        use Keyword::*;
        match self {
            Auto => "auto",
            Break => "break",
            Case => "case",
            Char => "char",
            Const => "const",
            Continue => "continue",
            Default => "default",
            Do => "do",
            Double => "double",
            Else => "else",
            Enum => "enum",
            Extern => "extern",
            Float => "float",
            For => "for",
            Goto => "goto",
            If => "if",
            Int => "int",
            Long => "long",
            Register => "register",
            Return => "return",
            Short => "short",
            Signed => "signed",
            Sizeof => "sizeof",
            Static => "static",
            Struct => "struct",
            Switch => "switch",
            Typedef => "typedef",
            Union => "union",
            Unsigned => "unsigned",
            Void => "void",
            Volatile => "volatile",
            While => "while",
            Inline => "inline",
            Restrict => "restrict",
            Bool => "_Bool",
            Complex => "_Complex",
            Imaginary => "_Imaginary",
            Alignas => "_Alignas",
            Alignof => "_Alignof",
            Atomic => "_Atomic",
            Generic => "_Generic",
            Noreturn => "_Noreturn",
            StaticAssert => "_Static_assert",
            ThreadLocal => "_Thread_local",
            Constexpr => "constexpr",
            False => "false",
            True => "true",
            Nullptr => "nullptr",
            Typeof => "typeof",
            TypeofUnqual => "typeof_unqual",
            BitInt => "_BitInt",
            Decimal32 => "_Decimal32",
            Decimal64 => "_Decimal64",
            Decimal128 => "_Decimal128",
            Float16 => "_Float16",
            Float32 => "_Float32",
            Float64 => "_Float64",
            Float128 => "_Float128",
            Float32x => "_Float32x",
            Float64x => "_Float64x",
            Attribute => "__attribute__",
            Asm => "__asm__",
            Extension => "__extension__",
            Label => "__label__",
            Int128 => "__int128",
            AutoType => "__auto_type",
            BuiltinVaArg => "__builtin_va_arg",
            BuiltinOffsetof => "__builtin_offsetof",
            BuiltinTypesCompatibleP => "__builtin_types_compatible_p",
        }
    }
}

/// Operators carry a precedence in the syntax descriptor. The comma is punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,
    Amp,
    Caret,
    Pipe,
    AndAnd,
    OrOr,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    XorAssign,
    OrAssign,
    Question,
    Bang,
    Tilde,
    Inc,
    Dec,
    Dot,
    Arrow,
}

impl Operator {
    pub fn is_assignment(self) -> bool {
        use Operator::*;
        matches!(
            self,
            Assign
                | PlusAssign
                | MinusAssign
                | StarAssign
                | SlashAssign
                | PercentAssign
                | ShlAssign
                | ShrAssign
                | AndAssign
                | XorAssign
                | OrAssign
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punctuator {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Colon,
    Ellipsis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Int,
    Float,
    Char,
    String,
}

/// Token kinds fall into disjoint categories; the category predicates below are
/// what the parser dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword(Keyword),
    Operator(Operator),
    Punct(Punctuator),
    Literal(LiteralKind),
    Identifier,
    Eof,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        matches!(self, TokenKind::Keyword(_))
    }
    pub fn is_operator(self) -> bool {
        matches!(self, TokenKind::Operator(_))
    }
    pub fn is_punctuation(self) -> bool {
        matches!(self, TokenKind::Punct(_))
    }
    pub fn is_literal(self) -> bool {
        matches!(self, TokenKind::Literal(_))
    }
    pub fn is_identifier(self) -> bool {
        matches!(self, TokenKind::Identifier)
    }
    pub fn is_eof(self) -> bool {
        matches!(self, TokenKind::Eof)
    }
}

/// Encoding prefix of a character or string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CharPrefix {
    #[default]
    None,
    /// `L`
    Wide,
    /// `u8`
    Utf8,
    /// `u`
    Utf16,
    /// `U`
    Utf32,
}

impl CharPrefix {
    pub fn spelling(self) -> &'static str {
        match self {
            CharPrefix::None => "",
            CharPrefix::Wide => "L",
            CharPrefix::Utf8 => "u8",
            CharPrefix::Utf16 => "u",
            CharPrefix::Utf32 => "U",
        }
    }

    pub fn from_spelling(s: &str) -> Option<Self> {
        Some(match s {
            "L" => CharPrefix::Wide,
            "u8" => CharPrefix::Utf8,
            "u" => CharPrefix::Utf16,
            "U" => CharPrefix::Utf32,
            _ => return None,
        })
    }

    /// Largest value a single code unit of this encoding can hold.
    pub fn max_unit(self) -> u32 {
        match self {
            CharPrefix::None | CharPrefix::Utf8 => 0xFF,
            CharPrefix::Utf16 => 0xFFFF,
            CharPrefix::Wide | CharPrefix::Utf32 => u32::MAX,
        }
    }

    pub fn is_narrow(self) -> bool {
        matches!(self, CharPrefix::None | CharPrefix::Utf8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IntSuffix {
    pub unsigned: bool,
    /// 0, 1 (`l`) or 2 (`ll`).
    pub long: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FloatSuffix {
    #[default]
    None,
    F,
    L,
}

/// Decoded literal payload. Lexemes are always kept on the token as written.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TokenValue {
    #[default]
    None,
    Int { value: u64, suffix: IntSuffix },
    Float { value: f64, suffix: FloatSuffix },
    Char { value: u32, prefix: CharPrefix },
    /// Code units: bytes for narrow strings, code points otherwise.
    Str { units: Vec<u32>, prefix: CharPrefix },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: SourceLocation,
    pub value: TokenValue,
}

impl Token {
    pub fn len(&self) -> usize {
        self.lexeme.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexeme.is_empty()
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        self.kind == TokenKind::Operator(op)
    }

    pub fn is_punct(&self, p: Punctuator) -> bool {
        self.kind == TokenKind::Punct(p)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of file"),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}

/// Render decoded string units for display: narrow strings as (lossy) UTF-8,
/// wide strings code point by code point.
pub fn units_to_string(units: &[u32], prefix: CharPrefix) -> String {
    if prefix.is_narrow() {
        let bytes: Vec<u8> = units.iter().map(|u| *u as u8).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    } else {
        units
            .iter()
            .map(|u| char::from_u32(*u).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}
