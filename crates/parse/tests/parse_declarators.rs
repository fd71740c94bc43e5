use parse::{ast::*, parse_translation_unit, render_type};

fn decl_type_of(src: &str) -> Node {
    let tu = parse_translation_unit(src).expect("parse ok");
    tu.children[0].decl_type().expect("typed declaration").clone()
}

fn builtin(n: &Node) -> &str {
    assert_eq!(n.kind, NodeKind::BuiltinType, "got {}", n.kind);
    n.name().unwrap()
}

#[test]
fn signal_spiral() {
    let tu = parse_translation_unit("int (*signal(int, void (*)(int)))(int);").expect("parse ok");
    let f = &tu.children[0];
    assert_eq!(f.kind, NodeKind::FunctionDecl);
    assert_eq!(f.name(), Some("signal"));
    assert!(f.body().is_none());

    // returns pointer to function (int) returning int
    let ret = f.decl_type().unwrap();
    assert_eq!(ret.kind, NodeKind::PointerType);
    let ret_fn = &ret.children[0];
    assert_eq!(ret_fn.kind, NodeKind::FunctionType);
    assert_eq!(builtin(&ret_fn.children[0]), "int");
    assert_eq!(ret_fn.params().count(), 1);

    // takes (int, void (*)(int))
    let params: Vec<&Node> = f.params().collect();
    assert_eq!(params.len(), 2);
    assert!(params.iter().all(|p| p.name().is_none()));
    assert_eq!(builtin(params[0].decl_type().unwrap()), "int");
    let handler = params[1].decl_type().unwrap();
    assert_eq!(handler.kind, NodeKind::PointerType);
    let handler_fn = &handler.children[0];
    assert_eq!(handler_fn.kind, NodeKind::FunctionType);
    assert_eq!(builtin(&handler_fn.children[0]), "void");
    assert_eq!(builtin(handler_fn.params().next().unwrap().decl_type().unwrap()), "int");

    assert_eq!(render_type(ret), "int (*)(int)");
    assert_eq!(render_type(handler), "void (*)(int)");
}

#[test]
fn pointer_to_array_vs_array_of_pointers() {
    let p = decl_type_of("int (*p)[3];");
    assert_eq!(p.kind, NodeKind::PointerType);
    assert_eq!(p.children[0].kind, NodeKind::ArrayType);
    assert_eq!(render_type(&p), "int (*)[3]");

    let a = decl_type_of("int *a[3];");
    assert_eq!(a.kind, NodeKind::ArrayType);
    assert_eq!(a.children[0].kind, NodeKind::PointerType);
    assert_eq!(a.children[1].int_value(), Some(3));
    assert_eq!(render_type(&a), "int *[3]");
}

#[test]
fn multidimensional_arrays_nest_outermost_first() {
    let m = decl_type_of("double m[2][5];");
    assert_eq!(m.kind, NodeKind::ArrayType);
    assert_eq!(m.children[1].int_value(), Some(2));
    let row = &m.children[0];
    assert_eq!(row.kind, NodeKind::ArrayType);
    assert_eq!(row.children[1].int_value(), Some(5));
    assert_eq!(builtin(&row.children[0]), "double");
}

#[test]
fn qualified_pointers() {
    let p = decl_type_of("const char *const name;");
    assert_eq!(p.kind, NodeKind::QualifiedType);
    assert!(matches!(p.payload, Payload::Quals(q) if q.is_const && !q.is_volatile));
    let ptr = &p.children[0];
    assert_eq!(ptr.kind, NodeKind::PointerType);
    let pointee = &ptr.children[0];
    assert_eq!(pointee.kind, NodeKind::QualifiedType);
    assert_eq!(builtin(&pointee.children[0]), "char");
    assert_eq!(render_type(&p), "const char *const");
}

#[test]
fn function_pointer_variable_with_initializer() {
    let tu = parse_translation_unit("int f(int); int (*fp)(int) = f;").expect("parse ok");
    let var = &tu.children[1];
    assert_eq!(var.kind, NodeKind::VarDecl);
    assert_eq!(var.name(), Some("fp"));
    assert_eq!(var.decl_type().unwrap().kind, NodeKind::PointerType);
    assert_eq!(var.initializer().unwrap().name(), Some("f"));
}

#[test]
fn array_parameter_qualifiers() {
    let tu = parse_translation_unit("void f(int a[static 4], int b[const], int c[*]);").expect("parse ok");
    let params: Vec<&Node> = tu.children[0].params().collect();
    assert!(matches!(params[0].decl_type().unwrap().payload, Payload::Array { is_static: true, .. }));
    assert!(matches!(params[1].decl_type().unwrap().payload, Payload::Array { quals, .. } if quals.is_const));
    assert!(matches!(params[2].decl_type().unwrap().payload, Payload::Array { vla_star: true, .. }));
}

#[test]
fn abstract_declarators_in_sizeof_and_casts() {
    let src = "unsigned long n = sizeof(int (*)[4]); void *q = (void *)0; int (*g)(void) = (int (*)(void))0;";
    let tu = parse_translation_unit(src).expect("parse ok");
    let size = tu.children[0].initializer().unwrap();
    assert_eq!(size.kind, NodeKind::SizeofType);
    assert_eq!(render_type(&size.children[0]), "int (*)[4]");
    let cast = tu.children[2].initializer().unwrap();
    assert_eq!(cast.kind, NodeKind::Cast);
    assert_eq!(render_type(&cast.children[0]), "int (*)(void)");
}

#[test]
fn function_returning_pointer() {
    let tu = parse_translation_unit("char *dup(const char *s);").expect("parse ok");
    let f = &tu.children[0];
    assert_eq!(f.kind, NodeKind::FunctionDecl);
    assert_eq!(f.decl_type().unwrap().kind, NodeKind::PointerType);
    assert_eq!(f.params().next().unwrap().name(), Some("s"));
}

#[test]
fn parenthesized_name() {
    let v = decl_type_of("int (x);");
    assert_eq!(builtin(&v), "int");
}

#[test]
fn typedef_of_function_type() {
    let tu = parse_translation_unit("typedef int handler(int); handler *h;").expect("parse ok");
    assert_eq!(tu.children[0].decl_type().unwrap().kind, NodeKind::FunctionType);
    let h = tu.children[1].decl_type().unwrap();
    assert_eq!(h.kind, NodeKind::PointerType);
    assert_eq!(h.children[0].kind, NodeKind::TypedefName);
}

#[test]
fn old_style_parameters_are_rejected() {
    let err = parse_translation_unit("int f(a, b) int a; int b; { return a; }").unwrap_err();
    assert!(format!("{:#}", err).contains("old-style parameter lists are not supported"));
}

#[test]
fn missing_declarator_name() {
    let err = parse_translation_unit("int *;").unwrap_err();
    assert!(format!("{:#}", err).contains("expected identifier or '('"));
}
