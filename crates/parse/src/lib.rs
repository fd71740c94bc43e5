pub mod ast;
mod parser;
pub mod printer;
pub mod scope;
pub mod visit;

pub use ast::*;
pub use parser::{parse, parse_rule, parse_source, parse_translation_unit, parse_translation_unit_with, Parser};
pub use printer::{dump, render_expr, render_type};
pub use scope::{ScopeStack, TagKind};
pub use visit::{walk, Visitor};

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(tu: &Node) -> &[Node] {
        let f = tu.child(0).expect("function");
        &f.body().expect("body").children
    }

    #[test]
    fn parse_label_simple() {
        let tu = parse_translation_unit("int main(){ L: return 0; }").unwrap();
        let body = body_of(&tu);
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].kind, NodeKind::Labeled);
        assert_eq!(body[0].name(), Some("L"));
        assert_eq!(body[0].children[0].kind, NodeKind::Return);
    }

    #[test]
    fn parse_goto_to_label() {
        let tu = parse_translation_unit("int main(){ goto L; L: return 0; }").unwrap();
        let body = body_of(&tu);
        assert!(body[0].is(NodeKind::Goto) && body[0].name() == Some("L"));
        assert!(body[1].is(NodeKind::Labeled));
    }

    #[test]
    fn parse_stacked_labels() {
        let tu = parse_translation_unit("int main(){ A: B: return 1; }").unwrap();
        let body = body_of(&tu);
        let a = &body[0];
        assert_eq!(a.name(), Some("A"));
        let b = &a.children[0];
        assert_eq!(b.name(), Some("B"));
        assert_eq!(b.children[0].children[0].int_value(), Some(1));
    }

    #[test]
    fn parse_goto_requires_semicolon() {
        let err = parse_translation_unit("int main(){ goto L L: return 0; }").unwrap_err();
        assert!(format!("{:#}", err).contains("expected ';' after goto statement"));
    }
}
