use parse::{ast::*, parse_translation_unit};

fn typedef_name(n: &Node) -> Option<&str> {
    (n.kind == NodeKind::TypedefName).then(|| n.name()).flatten()
}

#[test]
fn typedef_name_starts_a_declaration() {
    let tu = parse_translation_unit("typedef int T; T x;").expect("parse ok");
    assert_eq!(tu.children.len(), 2);
    let td = &tu.children[0];
    assert_eq!(td.kind, NodeKind::TypedefDecl);
    assert_eq!(td.name(), Some("T"));
    let var = &tu.children[1];
    assert_eq!(var.kind, NodeKind::VarDecl);
    assert_eq!(var.name(), Some("x"));
    assert_eq!(typedef_name(var.decl_type().unwrap()), Some("T"));
}

#[test]
fn unknown_type_name_is_an_error() {
    let err = parse_translation_unit("T x;").unwrap_err();
    assert!(format!("{:#}", err).contains("unknown type name 'T'"), "{:#}", err);
}

#[test]
fn local_object_shadows_typedef() {
    let src = "typedef int T; void f(void) { int T; T * 2; } T y;";
    let tu = parse_translation_unit(src).expect("parse ok");
    let body = tu.children[1].body().unwrap();
    assert_eq!(body.children[0].kind, NodeKind::VarDecl);
    let stmt = &body.children[1];
    assert_eq!(stmt.kind, NodeKind::ExprStmt);
    assert_eq!(stmt.children[0].kind, NodeKind::Binary(BinaryOp::Mul));
    // the shadow ends with the block
    assert_eq!(typedef_name(tu.children[2].decl_type().unwrap()), Some("T"));
}

#[test]
fn parameter_shadows_typedef() {
    let src = "typedef int T; int f(int T) { return T * 2; }";
    let tu = parse_translation_unit(src).expect("parse ok");
    let ret = &tu.children[1].body().unwrap().children[0];
    assert_eq!(ret.children[0].kind, NodeKind::Binary(BinaryOp::Mul));
}

#[test]
fn block_scoped_typedef_does_not_leak() {
    let err = parse_translation_unit("void f(void) { typedef int U; U a; } U b;").unwrap_err();
    assert!(format!("{:#}", err).contains("unknown type name 'U'"));
}

#[test]
fn pointer_declaration_vs_multiplication() {
    let src = "typedef int T; int a, b; void f(void) { T * p; a * b; }";
    let tu = parse_translation_unit(src).expect("parse ok");
    let body = tu.children.last().unwrap().body().unwrap();
    let p = &body.children[0];
    assert_eq!(p.kind, NodeKind::VarDecl);
    let ptr = p.decl_type().unwrap();
    assert_eq!(ptr.kind, NodeKind::PointerType);
    assert_eq!(typedef_name(&ptr.children[0]), Some("T"));
    assert_eq!(body.children[1].kind, NodeKind::ExprStmt);
}

#[test]
fn typedef_list_registers_every_name() {
    let tu = parse_translation_unit("typedef int A, *PA; PA p; A a;").expect("parse ok");
    assert_eq!(tu.children.len(), 4);
    assert_eq!(tu.children[1].decl_type().unwrap().kind, NodeKind::PointerType);
}

#[test]
fn typedef_of_struct_and_cast() {
    let src = "typedef struct S { int v; } S; int get(void *p) { return ((S *)p)->v; }";
    let tu = parse_translation_unit(src).expect("parse ok");
    let ret = &tu.children[1].body().unwrap().children[0];
    let arrow = &ret.children[0];
    assert_eq!(arrow.kind, NodeKind::Arrow);
    assert_eq!(arrow.name(), Some("v"));
    assert_eq!(arrow.children[0].kind, NodeKind::Cast);
}

#[test]
fn va_list_is_always_a_type() {
    let tu = parse_translation_unit("__builtin_va_list ap;").expect("parse ok");
    assert_eq!(typedef_name(tu.children[0].decl_type().unwrap()), Some("__builtin_va_list"));
}

#[test]
fn typedef_redeclared_as_variable_inside_struct_member_is_fine() {
    // members live in their own namespace
    let tu = parse_translation_unit("typedef int T; struct S { T T; }; T z;").expect("parse ok");
    assert_eq!(tu.children.len(), 3);
}
