//! Text renderings of the AST: an indented debug dump, and C source for
//! expressions and types.

use std::fmt::Write as _;

use lex::{units_to_string, CharPrefix, FloatSuffix, IntSuffix};

use crate::ast::{Node, NodeKind, Payload};
use crate::visit::{walk, Visitor};

/// One node per line, two spaces per level: `Kind 'label' extras`.
pub fn dump(node: &Node) -> String {
    let mut d = Dumper { out: String::new() };
    walk(node, &mut d);
    d.out
}

struct Dumper {
    out: String,
}

impl Visitor for Dumper {
    fn enter(&mut self, node: &Node, depth: usize) -> bool {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
        self.out.push_str(node.kind.name());
        if let Some(label) = label(node) {
            let _ = write!(self.out, " '{}'", label);
        }
        for extra in extras(node) {
            self.out.push(' ');
            self.out.push_str(&extra);
        }
        self.out.push('\n');
        true
    }
}

fn label(node: &Node) -> Option<String> {
    if let Some(op) = node.operator_lexeme() {
        return Some(op.to_string());
    }
    match &node.payload {
        Payload::Name(n) => Some(n.clone()),
        Payload::Int { value, .. } => Some(value.to_string()),
        Payload::Float { value, .. } => Some(value.to_string()),
        Payload::Char { value, prefix } => Some(match char::from_u32(*value) {
            Some(c) if !c.is_control() && (*value < 0x80 || !prefix.is_narrow()) => c.to_string(),
            _ => value.to_string(),
        }),
        Payload::Str { units, prefix } => Some(escape_units(units, *prefix)),
        Payload::Flag(b) if node.kind == NodeKind::BoolLiteral => Some(b.to_string()),
        Payload::Decl(d) => d.name.clone(),
        Payload::Function(f) => Some(f.name.clone()),
        Payload::Tag { name, .. } => name.clone(),
        Payload::Quals(q) => Some(q.to_string()),
        _ => None,
    }
}

fn extras(node: &Node) -> Vec<String> {
    let mut out = Vec::new();
    match &node.payload {
        Payload::Decl(d) => {
            if let Some(s) = d.storage {
                out.push(s.spelling().to_string());
            }
            if d.thread_local {
                out.push("thread_local".into());
            }
            if let Some(a) = &d.asm_label {
                out.push(format!("asm(\"{}\")", a));
            }
        }
        Payload::Function(f) => {
            if let Some(s) = f.storage {
                out.push(s.spelling().to_string());
            }
            if f.inline {
                out.push("inline".into());
            }
            if f.noreturn {
                out.push("noreturn".into());
            }
            if f.variadic {
                out.push("variadic".into());
            }
            if !f.prototyped {
                out.push("unprototyped".into());
            }
        }
        Payload::Tag { has_body: true, .. } => out.push("definition".into()),
        Payload::Array { quals, is_static, vla_star } => {
            if !quals.is_empty() {
                out.push(quals.to_string());
            }
            if *is_static {
                out.push("static".into());
            }
            if *vla_star {
                out.push("[*]".into());
            }
        }
        Payload::FunctionType { variadic, prototyped } => {
            if *variadic {
                out.push("variadic".into());
            }
            if !prototyped {
                out.push("unprototyped".into());
            }
        }
        Payload::Flag(true) if node.kind == NodeKind::TypeofType => out.push("unqual".into()),
        Payload::Flag(true) if node.kind == NodeKind::BitIntType => out.push("unsigned".into()),
        _ => {}
    }
    out
}

fn escape_units(units: &[u32], prefix: CharPrefix) -> String {
    let text = units_to_string(units, prefix);
    text.escape_default().to_string()
}

fn int_suffix(s: IntSuffix) -> &'static str {
    match (s.unsigned, s.long) {
        (false, 0) => "",
        (false, 1) => "l",
        (false, _) => "ll",
        (true, 0) => "u",
        (true, 1) => "ul",
        (true, _) => "ull",
    }
}

/// C source text for a string literal. Units go through octal escapes where
/// they fit; a hex escape followed by a hex digit closes the literal and
/// continues in an adjacent one.
fn string_source(units: &[u32], prefix: CharPrefix) -> String {
    let mut out = format!("{}\"", prefix.spelling());
    let mut after_hex = false;
    for &u in units {
        let c = char::from_u32(u).filter(|_| u < 0x80);
        if after_hex && c.is_some_and(|c| c.is_ascii_hexdigit()) {
            let _ = write!(out, "\" {}\"", prefix.spelling());
        }
        after_hex = false;
        match c {
            Some('"') => out.push_str("\\\""),
            Some('\\') => out.push_str("\\\\"),
            Some(c) if c.is_ascii_graphic() || c == ' ' => out.push(c),
            _ if u <= 0o777 => {
                let _ = write!(out, "\\{:03o}", u);
            }
            _ => {
                let _ = write!(out, "\\x{:x}", u);
                after_hex = true;
            }
        }
    }
    out.push('"');
    out
}

fn float_source(value: f64, suffix: FloatSuffix) -> String {
    let mut s = format!("{:?}", value);
    if !s.contains(['.', 'e', 'E']) {
        s.push_str(".0");
    }
    match suffix {
        FloatSuffix::None => {}
        FloatSuffix::F => s.push('f'),
        FloatSuffix::L => s.push('L'),
    }
    s
}

/// Fully parenthesized C source for an expression. Every operator node gets its
/// own parentheses, so reparsing the text rebuilds the same tree.
pub fn render_expr(node: &Node) -> String {
    let c = |i: usize| node.child(i).map(render_expr).unwrap_or_default();
    let name = || node.name().unwrap_or_default().to_string();
    match node.kind {
        NodeKind::Binary(op) => format!("({} {} {})", c(0), op.spelling(), c(1)),
        NodeKind::Assign(op) => format!("({} {} {})", c(0), op.spelling(), c(1)),
        NodeKind::Unary(op) if op.is_postfix() => format!("({}{})", c(0), op.spelling()),
        NodeKind::Unary(op) => format!("({}{})", op.spelling(), c(0)),
        NodeKind::Conditional => format!("({} ? {} : {})", c(0), c(1), c(2)),
        NodeKind::BinaryConditional => format!("({} ?: {})", c(0), c(1)),
        NodeKind::Comma => format!("({}, {})", c(0), c(1)),
        NodeKind::Call => {
            let args: Vec<String> = node.children.iter().skip(1).map(render_expr).collect();
            format!("{}({})", c(0), args.join(", "))
        }
        NodeKind::Member => format!("{}.{}", c(0), name()),
        NodeKind::Arrow => format!("{}->{}", c(0), name()),
        NodeKind::Subscript => format!("{}[{}]", c(0), c(1)),
        NodeKind::Cast => {
            let ty = node.child(0).map(render_type).unwrap_or_default();
            format!("(({}) {})", ty, c(1))
        }
        NodeKind::SizeofExpr => format!("(sizeof {})", c(0)),
        NodeKind::AlignofExpr => format!("(_Alignof {})", c(0)),
        NodeKind::SizeofType | NodeKind::AlignofType => {
            let kw = if node.kind == NodeKind::SizeofType { "sizeof" } else { "_Alignof" };
            format!("{}({})", kw, node.child(0).map(render_type).unwrap_or_default())
        }
        NodeKind::CompoundLiteral => {
            let ty = node.child(0).map(render_type).unwrap_or_default();
            format!("(({}){})", ty, c(1))
        }
        NodeKind::InitList => {
            let items: Vec<String> = node.children.iter().map(render_expr).collect();
            format!("{{{}}}", items.join(", "))
        }
        NodeKind::Designation => {
            let n = node.children.len();
            let parts: String = node.children.iter().take(n.saturating_sub(1)).map(render_expr).collect();
            format!("{} = {}", parts, node.children.last().map(render_expr).unwrap_or_default())
        }
        NodeKind::FieldDesignator => format!(".{}", name()),
        NodeKind::IndexDesignator => format!("[{}]", c(0)),
        NodeKind::RangeDesignator => format!("[{} ... {}]", c(0), c(1)),
        NodeKind::GenericSelection => {
            let mut parts = vec![c(0)];
            parts.extend(node.children.iter().skip(1).map(render_expr));
            format!("_Generic({})", parts.join(", "))
        }
        NodeKind::GenericAssoc => {
            format!("{}: {}", node.child(0).map(render_type).unwrap_or_default(), c(1))
        }
        NodeKind::GenericDefault => format!("default: {}", c(0)),
        NodeKind::Identifier => name(),
        NodeKind::IntLiteral => match node.payload {
            Payload::Int { value, suffix } => format!("{}{}", value, int_suffix(suffix)),
            _ => "0".into(),
        },
        NodeKind::FloatLiteral => match node.payload {
            Payload::Float { value, suffix } => float_source(value, suffix),
            _ => "0.0".into(),
        },
        NodeKind::CharLiteral => match node.payload {
            Payload::Char { value, prefix } => match char::from_u32(value) {
                Some(ch) if value < 0x80 && (ch.is_ascii_alphanumeric() || ch == ' ') => {
                    format!("{}'{}'", prefix.spelling(), ch)
                }
                _ => format!("{}'\\x{:x}'", prefix.spelling(), value),
            },
            _ => "'\\0'".into(),
        },
        NodeKind::StringLiteral => match &node.payload {
            Payload::Str { units, prefix } => string_source(units, *prefix),
            _ => "\"\"".into(),
        },
        NodeKind::BoolLiteral => matches!(node.payload, Payload::Flag(true)).to_string(),
        NodeKind::NullptrLiteral => "nullptr".into(),
        NodeKind::LabelAddress => format!("(&&{})", name()),
        NodeKind::StmtExpr => "({ ... })".into(),
        NodeKind::BuiltinVaArg => {
            format!("__builtin_va_arg({}, {})", c(0), node.child(1).map(render_type).unwrap_or_default())
        }
        NodeKind::BuiltinOffsetof => {
            let mut designator = String::new();
            for (i, d) in node.children.iter().skip(1).enumerate() {
                if i == 0 {
                    designator.push_str(d.name().unwrap_or_default());
                } else {
                    designator.push_str(&render_expr(d));
                }
            }
            format!("__builtin_offsetof({}, {})", node.child(0).map(render_type).unwrap_or_default(), designator)
        }
        NodeKind::BuiltinTypesCompatible => format!(
            "__builtin_types_compatible_p({}, {})",
            node.child(0).map(render_type).unwrap_or_default(),
            node.child(1).map(render_type).unwrap_or_default()
        ),
        kind if kind.is_type() => render_type(node),
        kind => format!("<{}>", kind.name()),
    }
}

/// C spelling of a type as an abstract declarator (`int (*)[3]`).
pub fn render_type(ty: &Node) -> String {
    render_declarator(ty, String::new())
}

/// Spell `ty` around the declarator text `inner` (a name or an abstract
/// declarator built so far).
pub fn render_declarator(ty: &Node, inner: String) -> String {
    let join = |head: String, inner: String| {
        if inner.is_empty() {
            head
        } else {
            format!("{} {}", head, inner)
        }
    };
    match ty.kind {
        NodeKind::BuiltinType | NodeKind::TypedefName => join(ty.name().unwrap_or_default().to_string(), inner),
        NodeKind::StructType | NodeKind::UnionType | NodeKind::EnumType => {
            let kw = match ty.kind {
                NodeKind::StructType => "struct",
                NodeKind::UnionType => "union",
                _ => "enum",
            };
            let head = match ty.name() {
                Some(n) => format!("{} {}", kw, n),
                None => format!("{} {{...}}", kw),
            };
            join(head, inner)
        }
        NodeKind::PointerType => match ty.child(0) {
            Some(pointee) => render_declarator(pointee, format!("*{}", inner)),
            None => inner,
        },
        NodeKind::QualifiedType => {
            let quals = match &ty.payload {
                Payload::Quals(q) => q.to_string(),
                _ => String::new(),
            };
            match ty.child(0) {
                Some(ptr) if ptr.kind == NodeKind::PointerType => match ptr.child(0) {
                    Some(pointee) => {
                        let sep = if inner.is_empty() { "" } else { " " };
                        render_declarator(pointee, format!("*{}{}{}", quals, sep, inner))
                    }
                    None => inner,
                },
                Some(base) => format!("{} {}", quals, render_declarator(base, inner)),
                None => inner,
            }
        }
        NodeKind::ArrayType => {
            let size = ty.child(1).map(render_expr).unwrap_or_default();
            let inner = if inner.starts_with('*') { format!("({})", inner) } else { inner };
            match ty.child(0) {
                Some(elem) => render_declarator(elem, format!("{}[{}]", inner, size)),
                None => inner,
            }
        }
        NodeKind::FunctionType => {
            let inner = if inner.starts_with('*') { format!("({})", inner) } else { inner };
            let mut params: Vec<String> = ty
                .params()
                .map(|p| {
                    let name = p.name().unwrap_or_default().to_string();
                    p.decl_type().map(|t| render_declarator(t, name)).unwrap_or_default()
                })
                .collect();
            let (variadic, prototyped) = match ty.payload {
                Payload::FunctionType { variadic, prototyped } => (variadic, prototyped),
                _ => (false, true),
            };
            if variadic {
                params.push("...".into());
            } else if params.is_empty() && prototyped {
                params.push("void".into());
            }
            match ty.child(0) {
                Some(ret) => render_declarator(ret, format!("{}({})", inner, params.join(", "))),
                None => inner,
            }
        }
        NodeKind::AtomicType => {
            let head = format!("_Atomic({})", ty.child(0).map(render_type).unwrap_or_default());
            join(head, inner)
        }
        NodeKind::TypeofType => {
            let kw = if matches!(ty.payload, Payload::Flag(true)) { "typeof_unqual" } else { "typeof" };
            let arg = match ty.child(0) {
                Some(t) if t.kind.is_type() => render_type(t),
                Some(e) => render_expr(e),
                None => String::new(),
            };
            join(format!("{}({})", kw, arg), inner)
        }
        NodeKind::BitIntType => {
            let sign = if matches!(ty.payload, Payload::Flag(true)) { "unsigned " } else { "" };
            let width = ty.child(0).map(render_expr).unwrap_or_default();
            join(format!("{}_BitInt({})", sign, width), inner)
        }
        _ => join(format!("<{}>", ty.kind.name()), inner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_source_splits_after_hex_escape() {
        assert_eq!(string_source(&[0x61, 0x22, 0x0a], CharPrefix::None), "\"a\\\"\\012\"");
        assert_eq!(string_source(&[0x4e2d, 0x61], CharPrefix::Wide), "L\"\\x4e2d\" L\"a\"");
        assert_eq!(string_source(&[0x4e2d, 0x7a], CharPrefix::Utf32), "U\"\\x4e2dz\"");
    }

    #[test]
    fn float_source_stays_a_float() {
        assert_eq!(float_source(1.0, FloatSuffix::None), "1.0");
        assert_eq!(float_source(2.5, FloatSuffix::F), "2.5f");
        assert_eq!(float_source(1e300, FloatSuffix::L), "1e300L");
    }
}
