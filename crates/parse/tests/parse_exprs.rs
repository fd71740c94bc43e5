use lex::{CharPrefix, SourceBuffer};
use parse::{ast::*, parse_rule, parse_translation_unit, render_expr};

/// Parse a lone expression through the rule table.
fn expr(src: &str) -> Node {
    let buf = SourceBuffer::new("e.c", src);
    let syntax = lex::c_syntax(lex::CDialect::default());
    let mut diags = lex::Diagnostics::new();
    let tokens = lex::tokenize(&buf, &syntax, &mut diags);
    let node = parse_rule("expression", &tokens, &syntax, &mut diags).expect("rule bound");
    assert!(diags.is_empty(), "{:?}", diags.iter().map(|d| d.to_string()).collect::<Vec<_>>());
    node
}

fn shape(src: &str) -> String {
    render_expr(&expr(src))
}

#[test]
fn multiplicative_binds_tighter() {
    assert_eq!(shape("a + b * c"), "(a + (b * c))");
    assert_eq!(shape("a * b + c"), "((a * b) + c)");
    assert_eq!(shape("a - b - c"), "((a - b) - c)");
}

#[test]
fn full_precedence_ladder() {
    assert_eq!(
        shape("a || b && c | d ^ e & f == g < h << i + j * k"),
        "(a || (b && (c | (d ^ (e & (f == (g < (h << (i + (j * k))))))))))"
    );
}

#[test]
fn assignment_and_conditional_are_right_associative() {
    assert_eq!(shape("a = b = c"), "(a = (b = c))");
    assert_eq!(shape("a += b -= 1"), "(a += (b -= 1))");
    assert_eq!(shape("a ? b : c ? d : e"), "(a ? b : (c ? d : e))");
    assert_eq!(shape("x = a ? b : c"), "(x = (a ? b : c))");
}

#[test]
fn comma_is_lowest() {
    assert_eq!(shape("a = 1, b = 2"), "((a = 1), (b = 2))");
}

#[test]
fn unary_and_postfix() {
    assert_eq!(shape("-a * !b"), "((-a) * (!b))");
    assert_eq!(shape("*p++"), "(*(p++))");
    assert_eq!(shape("++*p"), "(++(*p))");
    assert_eq!(shape("&s.f[2]"), "(&s.f[2])");
    assert_eq!(shape("p->next->v"), "p->next->v");
    assert_eq!(shape("~x-- + ++y"), "((~(x--)) + (++y))");
}

#[test]
fn calls_and_subscripts() {
    let call = expr("f(a, b + 1, g())");
    assert_eq!(call.kind, NodeKind::Call);
    assert_eq!(call.children.len(), 4);
    assert_eq!(call.children[3].kind, NodeKind::Call);
    assert_eq!(shape("a[i][j]"), "a[i][j]");
    assert_eq!(shape("(*fp)(1)"), "(*fp)(1)");
}

#[test]
fn casts_and_sizeof() {
    assert_eq!(shape("(long)x + 1"), "(((long) x) + 1)");
    assert_eq!(shape("(unsigned char)(char)c"), "((unsigned char) ((char) c))");
    assert_eq!(shape("sizeof x + 1"), "((sizeof x) + 1)");
    assert_eq!(shape("sizeof(int) * 2"), "(sizeof(int) * 2)");
    assert_eq!(shape("sizeof (x)"), "(sizeof x)");
    assert_eq!(shape("_Alignof(double)"), "_Alignof(double)");
    assert_eq!(shape("(char *)p"), "((char *) p)");
}

#[test]
fn literals_keep_their_payloads() {
    let n = expr("0x7fffffffffffffff");
    assert_eq!(n.int_value(), Some(0x7fff_ffff_ffff_ffff));
    let f = expr("1.5e3f");
    assert!(matches!(f.payload, Payload::Float { value, .. } if value == 1500.0));
    let c = expr("'\\x41'");
    assert!(matches!(c.payload, Payload::Char { value: 0x41, .. }));
    assert_eq!(shape("10u + 3ull"), "(10u + 3ull)");
}

#[test]
fn adjacent_strings_concatenate() {
    let s = expr("\"ab\" \"cd\"");
    assert_eq!(s.kind, NodeKind::StringLiteral);
    match &s.payload {
        Payload::Str { units, prefix } => {
            assert_eq!(*prefix, CharPrefix::None);
            assert_eq!(units, &"abcd".bytes().map(u32::from).collect::<Vec<_>>());
        }
        other => panic!("expected string payload, got {:?}", other),
    }
}

#[test]
fn narrow_piece_adopts_wide_prefix() {
    let s = expr("\"a\" L\"b\"");
    assert!(matches!(&s.payload, Payload::Str { units, prefix: CharPrefix::Wide } if units == &[0x61, 0x62]));
}

#[test]
fn mixed_wide_prefixes_are_rejected() {
    let err = parse_translation_unit("int *p = (int *)(u\"a\" U\"b\");").unwrap_err();
    assert!(format!("{:#}", err).contains("different encodings"));
}

#[test]
fn typedef_name_is_not_an_expression() {
    let err = parse_translation_unit("typedef int T; int f(void) { return T; }").unwrap_err();
    assert!(format!("{:#}", err).contains("unexpected type name 'T': expected expression"));
}

#[test]
fn rule_must_consume_all_input() {
    let buf = SourceBuffer::new("e.c", "a + b c");
    let syntax = lex::c_syntax(lex::CDialect::default());
    let mut diags = lex::Diagnostics::new();
    let tokens = lex::tokenize(&buf, &syntax, &mut diags);
    parse_rule("expression", &tokens, &syntax, &mut diags);
    let msg = diags.first().unwrap().to_string();
    assert_eq!(msg, "e.c:1:7: parse error: unexpected 'c' after expression");
}

#[test]
fn unknown_rule_is_an_internal_error() {
    let syntax = lex::c_syntax(lex::CDialect::default());
    let tokens = lex::TokenStream::new(Vec::new());
    let mut diags = lex::Diagnostics::new();
    assert!(parse_rule("pattern", &tokens, &syntax, &mut diags).is_none());
    assert_eq!(diags.count(lex::DiagnosticKind::Internal), 1);
}
