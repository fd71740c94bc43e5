use crate::c_syntax::CStandard;
use crate::token::Keyword;

/// When a keyword spelling is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// From the given standard onwards.
    Std(CStandard),
    /// Only with GNU extensions enabled.
    Gnu,
    /// From the given standard, or earlier with GNU extensions enabled.
    StdOrGnu(CStandard),
}

impl Availability {
    pub fn allows(self, standard: CStandard, gnu: bool) -> bool {
        match self {
            Availability::Std(since) => standard >= since,
            Availability::Gnu => gnu,
            Availability::StdOrGnu(since) => gnu || standard >= since,
        }
    }
}

use Availability::{Gnu, Std, StdOrGnu};
use CStandard::{C11, C23, C89, C99};

pub(crate) const C_KEYWORDS: &[(&str, Keyword, Availability)] = &[
    ("auto", Keyword::Auto, Std(C89)),
    ("break", Keyword::Break, Std(C89)),
    ("case", Keyword::Case, Std(C89)),
    ("char", Keyword::Char, Std(C89)),
    ("const", Keyword::Const, Std(C89)),
    ("continue", Keyword::Continue, Std(C89)),
    ("default", Keyword::Default, Std(C89)),
    ("do", Keyword::Do, Std(C89)),
    ("double", Keyword::Double, Std(C89)),
    ("else", Keyword::Else, Std(C89)),
    ("enum", Keyword::Enum, Std(C89)),
    ("extern", Keyword::Extern, Std(C89)),
    ("float", Keyword::Float, Std(C89)),
    ("for", Keyword::For, Std(C89)),
    ("goto", Keyword::Goto, Std(C89)),
    ("if", Keyword::If, Std(C89)),
    ("int", Keyword::Int, Std(C89)),
    ("long", Keyword::Long, Std(C89)),
    ("register", Keyword::Register, Std(C89)),
    ("return", Keyword::Return, Std(C89)),
    ("short", Keyword::Short, Std(C89)),
    ("signed", Keyword::Signed, Std(C89)),
    ("sizeof", Keyword::Sizeof, Std(C89)),
    ("static", Keyword::Static, Std(C89)),
    ("struct", Keyword::Struct, Std(C89)),
    ("switch", Keyword::Switch, Std(C89)),
    ("typedef", Keyword::Typedef, Std(C89)),
    ("union", Keyword::Union, Std(C89)),
    ("unsigned", Keyword::Unsigned, Std(C89)),
    ("void", Keyword::Void, Std(C89)),
    ("volatile", Keyword::Volatile, Std(C89)),
    ("while", Keyword::While, Std(C89)),
    ("inline", Keyword::Inline, StdOrGnu(C99)),
    ("restrict", Keyword::Restrict, Std(C99)),
    ("_Bool", Keyword::Bool, Std(C99)),
    ("_Complex", Keyword::Complex, Std(C99)),
    ("_Imaginary", Keyword::Imaginary, Std(C99)),
    ("_Alignas", Keyword::Alignas, Std(C11)),
    ("_Alignof", Keyword::Alignof, Std(C11)),
    ("_Atomic", Keyword::Atomic, Std(C11)),
    ("_Generic", Keyword::Generic, Std(C11)),
    ("_Noreturn", Keyword::Noreturn, Std(C11)),
    ("_Static_assert", Keyword::StaticAssert, Std(C11)),
    ("_Thread_local", Keyword::ThreadLocal, Std(C11)),
    ("alignas", Keyword::Alignas, Std(C23)),
    ("alignof", Keyword::Alignof, Std(C23)),
    ("bool", Keyword::Bool, Std(C23)),
    ("constexpr", Keyword::Constexpr, Std(C23)),
    ("false", Keyword::False, Std(C23)),
    ("true", Keyword::True, Std(C23)),
    ("nullptr", Keyword::Nullptr, Std(C23)),
    ("static_assert", Keyword::StaticAssert, Std(C23)),
    ("thread_local", Keyword::ThreadLocal, Std(C23)),
    ("typeof", Keyword::Typeof, StdOrGnu(C23)),
    ("typeof_unqual", Keyword::TypeofUnqual, Std(C23)),
    ("_BitInt", Keyword::BitInt, Std(C23)),
    ("_Decimal32", Keyword::Decimal32, Std(C23)),
    ("_Decimal64", Keyword::Decimal64, Std(C23)),
    ("_Decimal128", Keyword::Decimal128, Std(C23)),
    ("_Float16", Keyword::Float16, StdOrGnu(C23)),
    ("_Float32", Keyword::Float32, StdOrGnu(C23)),
    ("_Float64", Keyword::Float64, StdOrGnu(C23)),
    ("_Float128", Keyword::Float128, StdOrGnu(C23)),
    ("_Float32x", Keyword::Float32x, StdOrGnu(C23)),
    ("_Float64x", Keyword::Float64x, StdOrGnu(C23)),
    ("__attribute__", Keyword::Attribute, Gnu),
    ("__attribute", Keyword::Attribute, Gnu),
    ("asm", Keyword::Asm, Gnu),
    ("__asm__", Keyword::Asm, Gnu),
    ("__asm", Keyword::Asm, Gnu),
    ("__extension__", Keyword::Extension, Gnu),
    ("__typeof__", Keyword::Typeof, Gnu),
    ("__typeof", Keyword::Typeof, Gnu),
    ("__typeof_unqual__", Keyword::TypeofUnqual, Gnu),
    ("__inline__", Keyword::Inline, Gnu),
    ("__inline", Keyword::Inline, Gnu),
    ("__restrict__", Keyword::Restrict, Gnu),
    ("__restrict", Keyword::Restrict, Gnu),
    ("__const__", Keyword::Const, Gnu),
    ("__const", Keyword::Const, Gnu),
    ("__volatile__", Keyword::Volatile, Gnu),
    ("__volatile", Keyword::Volatile, Gnu),
    ("__signed__", Keyword::Signed, Gnu),
    ("__signed", Keyword::Signed, Gnu),
    ("__alignof__", Keyword::Alignof, Gnu),
    ("__alignof", Keyword::Alignof, Gnu),
    ("__complex__", Keyword::Complex, Gnu),
    ("__thread", Keyword::ThreadLocal, Gnu),
    ("__label__", Keyword::Label, Gnu),
    ("__int128", Keyword::Int128, Gnu),
    ("__auto_type", Keyword::AutoType, Gnu),
    ("__builtin_va_arg", Keyword::BuiltinVaArg, Gnu),
    ("__builtin_offsetof", Keyword::BuiltinOffsetof, Gnu),
    ("__builtin_types_compatible_p", Keyword::BuiltinTypesCompatibleP, Gnu),
];

/// Keyword lookup over the full GNU C23 table, independent of any descriptor.
pub fn to_keyword(s: &str) -> Option<Keyword> {
    C_KEYWORDS
        .iter()
        .find(|(spelling, _, _)| *spelling == s)
        .map(|(_, kw, _)| *kw)
}
