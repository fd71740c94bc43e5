use lex::{c_syntax, CDialect, Diagnostics, SourceBuffer};
use parse::{ast::*, parse_rule, parse_source, render_type};

fn parse_lossy(src: &str) -> (Node, Diagnostics) {
    let buf = SourceBuffer::new("r.c", src);
    parse_source(&buf, &c_syntax(CDialect::default()))
}

fn messages(diags: &Diagnostics) -> Vec<String> {
    diags.iter().map(|d| d.to_string()).collect()
}

fn decl_names(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().filter_map(|n| n.name()).collect()
}

#[test]
fn keeps_going_after_bad_declarations() {
    let (tu, diags) = parse_lossy("int a = ; int b; int c = 1 +; int d;");
    assert_eq!(diags.error_count(), 2, "{:?}", messages(&diags));
    let names = decl_names(&tu.children);
    assert!(names.contains(&"b") && names.contains(&"d"), "{:?}", names);
}

#[test]
fn keeps_going_inside_function_bodies() {
    let (tu, diags) = parse_lossy("void f(void) { x = ; int y; y = 1 } int g;");
    assert_eq!(diags.error_count(), 2, "{:?}", messages(&diags));
    let f = &tu.children[0];
    assert_eq!(f.kind, NodeKind::FunctionDecl);
    let body = f.body().expect("partial body");
    assert_eq!(decl_names(&body.children), ["y"]);
    assert_eq!(tu.children.last().unwrap().name(), Some("g"));
}

#[test]
fn one_error_per_bad_statement() {
    let (_, diags) = parse_lossy("void f(void) { a b c d; }");
    assert_eq!(
        messages(&diags),
        ["r.c:1:18: parse error: expected ';' after expression, found 'b'"]
    );
}

#[test]
fn error_locations_point_at_the_offending_token() {
    let (_, diags) = parse_lossy("int main(void) {\n  return 1\n}\n");
    assert_eq!(
        messages(&diags),
        ["r.c:3:1: parse error: expected ';' after return statement, found '}'"]
    );
}

#[test]
fn unterminated_body_reports_end_of_file() {
    let (_, diags) = parse_lossy("void f(void) { int x;");
    assert_eq!(diags.error_count(), 1);
    let msg = diags.first().unwrap().to_string();
    assert!(msg.ends_with("expected '}', found end of file"), "{}", msg);
}

#[test]
fn stray_tokens_at_top_level() {
    let (tu, diags) = parse_lossy("} int ok;");
    assert_eq!(diags.error_count(), 1);
    assert!(messages(&diags)[0].contains("expected declaration, found '}'"));
    assert_eq!(decl_names(&tu.children), ["ok"]);
}

#[test]
fn entry_at_other_rules() {
    let syntax = c_syntax(CDialect::default());
    let mut diags = Diagnostics::new();

    let buf = SourceBuffer::new("t.c", "const char *");
    let tokens = lex::tokenize(&buf, &syntax, &mut diags);
    let ty = parse_rule("type_name", &tokens, &syntax, &mut diags).unwrap();
    assert_eq!(render_type(&ty), "const char *");

    let buf = SourceBuffer::new("s.c", "if (a) b = 1; else { }");
    let tokens = lex::tokenize(&buf, &syntax, &mut diags);
    let stmt = parse_rule("statement", &tokens, &syntax, &mut diags).unwrap();
    assert_eq!(stmt.kind, NodeKind::If);

    let buf = SourceBuffer::new("d.c", "int a, b = 2;");
    let tokens = lex::tokenize(&buf, &syntax, &mut diags);
    let group = parse_rule("declaration", &tokens, &syntax, &mut diags).unwrap();
    assert_eq!(group.kind, NodeKind::DeclGroup);
    assert_eq!(group.children.len(), 2);

    assert!(diags.is_empty(), "{:?}", messages(&diags));
}

#[test]
fn recovery_skips_whole_blocks() {
    let (tu, diags) = parse_lossy("int g(void){ if (x +) { a; b; } return 1; }");
    assert_eq!(
        messages(&diags),
        ["r.c:1:21: parse error: expected expression, found ')'"]
    );
    let body = tu.children[0].body().expect("body");
    assert_eq!(body.children.len(), 1);
    assert_eq!(body.children[0].kind, NodeKind::Return);
}

#[test]
fn bad_function_header_skips_its_body() {
    let (tu, diags) = parse_lossy("int f(int a,) { return 0; } int ok;");
    assert_eq!(diags.error_count(), 1, "{:?}", messages(&diags));
    assert_eq!(tu.children.last().unwrap().name(), Some("ok"));
}

/// Deep inputs need more stack than the default test thread in debug builds.
fn on_big_stack<F: FnOnce() + Send + 'static>(f: F) {
    std::thread::Builder::new()
        .stack_size(256 << 20)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn moderate_nesting_parses() {
    on_big_stack(|| {
        let src = format!("int x = {}1{};", "(".repeat(200), ")".repeat(200));
        let (tu, diags) = parse_lossy(&src);
        assert!(diags.is_empty(), "{:?}", messages(&diags));
        assert_eq!(tu.children[0].name(), Some("x"));
    });
}

#[test]
fn deep_parentheses_are_one_diagnostic() {
    on_big_stack(|| {
        let src = format!("int x = {}1{}; int after;", "(".repeat(5000), ")".repeat(5000));
        let (tu, diags) = parse_lossy(&src);
        assert_eq!(diags.error_count(), 1, "{:?}", messages(&diags));
        assert!(messages(&diags)[0].ends_with("parse error: code is nested too deeply"));
        assert_eq!(tu.children.last().unwrap().name(), Some("after"));
    });
}

#[test]
fn deep_unary_chains_and_blocks_are_one_diagnostic() {
    on_big_stack(|| {
        let src = format!("int y = {}1;", "- ".repeat(5000));
        let (_, diags) = parse_lossy(&src);
        assert_eq!(diags.error_count(), 1, "{:?}", messages(&diags));

        let src = format!("void f(void) {}x;{} int after;", "{".repeat(3000), "}".repeat(3000));
        let (tu, diags) = parse_lossy(&src);
        assert_eq!(diags.error_count(), 1, "{:?}", messages(&diags));
        assert!(messages(&diags)[0].contains("nested too deeply"));
        assert_eq!(tu.children.last().unwrap().name(), Some("after"));
    });
}
