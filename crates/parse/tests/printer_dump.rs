use parse::{dump, parse_translation_unit};

#[test]
fn dump_function() {
    let tu = parse_translation_unit("int add(int a, int b) { return a + b; }").expect("parse ok");
    let expected = "\
TranslationUnit
  FunctionDecl 'add'
    BuiltinType 'int'
    ParamDecl 'a'
      BuiltinType 'int'
    ParamDecl 'b'
      BuiltinType 'int'
    Compound
      Return
        Binary '+'
          Identifier 'a'
          Identifier 'b'
";
    assert_eq!(dump(&tu), expected);
}

#[test]
fn dump_declaration_flags() {
    let src = "static const char *msg = \"hi\\n\"; extern int f(); struct S { unsigned b : 2; };";
    let out = dump(&parse_translation_unit(src).expect("parse ok"));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[1], "  VarDecl 'msg' static");
    assert_eq!(lines[2], "    PointerType");
    assert_eq!(lines[3], "      QualifiedType 'const'");
    assert_eq!(lines[4], "        BuiltinType 'char'");
    assert_eq!(lines[5], "    StringLiteral 'hi\\n'");
    assert_eq!(lines[6], "  FunctionDecl 'f' extern unprototyped");
    assert!(out.contains("  StructDecl 'S' definition\n    FieldDecl 'b'\n"));
    assert!(out.contains("      IntLiteral '2'\n"));
}
