use lex::{CDialect, CStandard};
use parse::{ast::*, parse_translation_unit, parse_translation_unit_with};

fn type_of(src: &str) -> Node {
    let tu = parse_translation_unit(src).expect("parse ok");
    tu.children[0].decl_type().expect("typed declaration").clone()
}

fn builtin_name(src: &str) -> String {
    let ty = type_of(src);
    assert_eq!(ty.kind, NodeKind::BuiltinType, "{}", src);
    ty.name().unwrap().to_string()
}

fn error_of(src: &str) -> String {
    format!("{:#}", parse_translation_unit(src).unwrap_err())
}

#[test]
fn integer_spellings_are_canonical() {
    assert_eq!(builtin_name("unsigned long long int x;"), "unsigned long long");
    assert_eq!(builtin_name("long unsigned y;"), "unsigned long");
    assert_eq!(builtin_name("int long long z;"), "long long");
    assert_eq!(builtin_name("short int s;"), "short");
    assert_eq!(builtin_name("signed s;"), "int");
    assert_eq!(builtin_name("unsigned u;"), "unsigned int");
    assert_eq!(builtin_name("signed char c;"), "signed char");
    assert_eq!(builtin_name("char unsigned c;"), "unsigned char");
}

#[test]
fn floating_and_other_builtins() {
    assert_eq!(builtin_name("long double d;"), "long double");
    assert_eq!(builtin_name("float _Complex fc;"), "float _Complex");
    assert_eq!(builtin_name("_Complex double dc;"), "double _Complex");
    assert_eq!(builtin_name("_Bool b;"), "_Bool");
    assert_eq!(builtin_name("unsigned __int128 w;"), "unsigned __int128");
    assert_eq!(type_of("void *p;").children[0].name(), Some("void"));
}

#[test]
fn qualifiers_wrap_the_base_type() {
    let ty = type_of("const volatile int cv;");
    assert_eq!(ty.kind, NodeKind::QualifiedType);
    match ty.payload {
        Payload::Quals(q) => {
            assert!(q.is_const && q.is_volatile && !q.is_restrict);
            assert_eq!(q.to_string(), "const volatile");
        }
        ref other => panic!("expected quals, got {:?}", other),
    }
    assert_eq!(ty.children[0].name(), Some("int"));
}

#[test]
fn invalid_combinations_are_reported() {
    assert!(error_of("signed float f;").contains("invalid combination of type specifiers 'signed float'"));
    assert!(error_of("short long x;").contains("invalid combination of type specifiers"));
    assert!(error_of("long long long x;").contains("invalid combination"));
    assert!(error_of("int char x;").contains("invalid combination"));
    assert!(error_of("_Complex int ci;").contains("invalid combination"));
}

#[test]
fn duplicate_storage_classes() {
    assert!(error_of("static extern int x;").contains("multiple storage classes"));
}

#[test]
fn two_named_types() {
    assert!(error_of("struct S { int a; } int x;").contains("two or more data types"));
    assert!(error_of("struct A { int a; } struct B { int b; } v;").contains("two or more data types"));
}

#[test]
fn missing_type_specifier() {
    let err = error_of("static x;");
    assert!(err.contains("type specifier missing, defaults to 'int'"), "{}", err);
    let err = error_of("main(void) { return 0; }");
    assert!(err.contains("type specifier missing"), "{}", err);
}

#[test]
fn c89_accepts_implicit_int() {
    let c89 = CDialect {
        standard: CStandard::C89,
        gnu: false,
    };
    let tu = parse_translation_unit_with("static x; main() { return 0; }", c89).expect("parse ok");
    assert_eq!(tu.children.len(), 2);
    assert_eq!(tu.children[0].decl_type().unwrap().name(), Some("int"));
    let f = &tu.children[1];
    assert_eq!(f.kind, NodeKind::FunctionDecl);
    assert_eq!(f.decl_type().unwrap().name(), Some("int"));
}

#[test]
fn function_specifiers() {
    let tu = parse_translation_unit("static inline int sq(int v) { return v * v; } _Noreturn void die(void);")
        .expect("parse ok");
    let sq = tu.children[0].function().unwrap();
    assert!(sq.inline);
    assert_eq!(sq.storage, Some(StorageClass::Static));
    assert!(tu.children[1].function().unwrap().noreturn);
}

#[test]
fn thread_local_and_alignas() {
    let tu = parse_translation_unit("_Thread_local int counter; _Alignas(16) char buf[64];").expect("parse ok");
    assert!(tu.children[0].decl().unwrap().thread_local);
    let buf = &tu.children[1];
    assert!(buf.children.iter().any(|c| c.kind == NodeKind::AlignAs));
    assert!(buf.initializer().is_none());
}

#[test]
fn atomic_specifier_and_qualifier() {
    let ty = type_of("_Atomic(int) a;");
    assert_eq!(ty.kind, NodeKind::AtomicType);
    let ty = type_of("_Atomic int b;");
    assert!(matches!(ty.payload, Payload::Quals(q) if q.is_atomic));
}

#[test]
fn register_parameters() {
    let tu = parse_translation_unit("int f(register int n);").expect("parse ok");
    let p = tu.children[0].params().next().unwrap();
    assert_eq!(p.decl().unwrap().storage, Some(StorageClass::Register));
    assert!(error_of("int g(static int n);").contains("invalid storage class for parameter"));
}
