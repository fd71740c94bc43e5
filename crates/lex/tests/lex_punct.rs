use lex::{tokenize_str, Operator as O, Punctuator as P, TokenKind as K};

fn kinds(src: &str) -> Vec<K> {
    let (ts, diags) = tokenize_str(src);
    assert!(diags.is_empty());
    ts.iter().map(|t| t.kind).collect()
}

#[test]
fn lex_ellipsis_token() {
    let ks = kinds("f(...)");
    assert_eq!(
        ks,
        [K::Identifier, K::Punct(P::LParen), K::Punct(P::Ellipsis), K::Punct(P::RParen), K::Eof]
    );
}

#[test]
fn two_dots_are_two_operators() {
    let ks = kinds("s..a");
    assert_eq!(ks[1], K::Operator(O::Dot));
    assert_eq!(ks[2], K::Operator(O::Dot));
}

#[test]
fn longest_match_wins() {
    assert_eq!(
        kinds("a+++b"),
        [K::Identifier, K::Operator(O::Inc), K::Operator(O::Plus), K::Identifier, K::Eof]
    );
    assert_eq!(kinds("x>>=y")[1], K::Operator(O::ShrAssign));
    assert_eq!(kinds("x<<y")[1], K::Operator(O::Shl));
    assert_eq!(kinds("p->q")[1], K::Operator(O::Arrow));
    assert_eq!(kinds("a&&b||c")[1], K::Operator(O::AndAnd));
    assert_eq!(kinds("a&&b||c")[3], K::Operator(O::OrOr));
    assert_eq!(kinds("a-->b")[1], K::Operator(O::Dec));
}

#[test]
fn every_compound_assignment() {
    let ks = kinds("+= -= *= /= %= &= |= ^= <<= >>= =");
    for k in &ks[..ks.len() - 1] {
        match k {
            K::Operator(op) => assert!(op.is_assignment(), "{:?}", op),
            other => panic!("expected assignment operator, got {:?}", other),
        }
    }
}

#[test]
fn punctuation_vs_operators() {
    let ks = kinds("{ [ ] } ; , : ? ~ !");
    assert_eq!(ks[0], K::Punct(P::LBrace));
    assert_eq!(ks[1], K::Punct(P::LBracket));
    assert_eq!(ks[4], K::Punct(P::Semicolon));
    assert_eq!(ks[5], K::Punct(P::Comma));
    assert_eq!(ks[6], K::Punct(P::Colon));
    assert_eq!(ks[7], K::Operator(O::Question));
    assert_eq!(ks[8], K::Operator(O::Tilde));
    assert_eq!(ks[9], K::Operator(O::Bang));
}
