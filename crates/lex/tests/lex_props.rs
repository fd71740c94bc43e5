use lex::tokenize_str;
use proptest::prelude::*;

proptest! {
    #[test]
    fn always_one_trailing_eof(src in "[ -~\n\t]{0,80}") {
        let (ts, _) = tokenize_str(&src);
        prop_assert!(ts.get(ts.len() - 1).kind.is_eof());
        prop_assert_eq!(ts.iter().filter(|t| t.kind.is_eof()).count(), 1);
    }

    #[test]
    fn offsets_never_go_backwards(src in "[a-z0-9_ .+*/%<>=!&|^~?:;,(){}\\[\\]\n-]{0,80}") {
        let (ts, _) = tokenize_str(&src);
        let offsets: Vec<usize> = ts.iter().map(|t| t.location.offset).collect();
        prop_assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        for t in ts.iter() {
            prop_assert_eq!(&src[t.location.offset..t.location.offset + t.len()], t.lexeme.as_str());
        }
    }

    #[test]
    fn total_on_arbitrary_text(src in "\\PC{0,80}") {
        check_total(&src)?;
    }

    #[test]
    fn total_on_escape_heavy_literals(parts in prop::collection::vec(literal_soup(), 1..8)) {
        check_total(&parts.concat())?;
    }

    #[test]
    fn layout_does_not_change_tokens(parts in prop::collection::vec((fragment(), separator()), 0..24)) {
        let src: String = parts.iter().map(|(f, s)| format!("{}{}", f, s)).collect();
        let (ts, diags) = tokenize_str(&src);
        prop_assert!(diags.is_empty(), "{:?}", diags.first());
        let lexemes: Vec<&str> = ts.iter().map(|t| t.lexeme.as_str()).collect();
        let expected: Vec<&str> = parts.iter().map(|(f, _)| f.as_str()).chain([""]).collect();
        prop_assert_eq!(lexemes, expected);
    }
}

fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z_][a-zA-Z0-9_]{0,6}",
        "[1-9][0-9]{0,8}",
        "[0-9]{1,3}\\.[0-9]{1,3}",
        "\"[a-z ]{0,6}\"",
        prop::sample::select(vec![
            "+", "-", "*", "/", "%", "<<=", ">>", "->", "++", "==", "!=", "&&", "||", "?", "{", "}", "(", ")", ";",
            ",", "...", "[", "]",
        ])
        .prop_map(str::to_string),
    ]
}

fn separator() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![" ", "\n", "\t", " /* c */ ", "  ", " \\\n"])
}

/// Every token starts and ends on a character boundary, and exactly one EOF closes the stream.
fn check_total(src: &str) -> Result<(), TestCaseError> {
    let (ts, _) = tokenize_str(src);
    prop_assert!(ts.get(ts.len() - 1).kind.is_eof());
    prop_assert_eq!(ts.iter().filter(|t| t.kind.is_eof()).count(), 1);
    for t in ts.iter() {
        let span = t.location.offset..t.location.offset + t.len();
        prop_assert!(src.get(span).is_some(), "token {:?} splits a character", t.lexeme);
    }
    Ok(())
}

fn literal_soup() -> impl Strategy<Value = String> {
    let body = prop::collection::vec(
        prop_oneof![
            "\\\\\\PC",
            "\\\\x[0-9a-fA-F]{0,3}",
            "\\\\[0-7]{1,4}",
            "\\\\[uU][0-9a-fA-F]{0,9}",
            "\\PC",
        ],
        0..6,
    );
    let literal = (
        prop::sample::select(vec!["", "L", "u", "U", "u8"]),
        prop::sample::select(vec!["\"", "'"]),
        body,
        any::<bool>(),
    )
        .prop_map(|(prefix, quote, body, closed)| {
            format!("{}{}{}{}", prefix, quote, body.concat(), if closed { quote } else { "" })
        });
    prop_oneof![
        literal,
        "0[xX][0-9a-fA-F]{0,4}(\\.[0-9a-fA-F]{0,4})?[pP][+-]?[0-9]{0,12}",
        "[0-9]{1,24}[uUlL]{0,3}",
        "[ ;]",
    ]
}
