use lex::{CStandard, Keyword as Kw, Operator as O, Punctuator as P, SourceLocation, Token, TokenKind as K};

use super::{group, PResult, Parser};
use crate::ast::*;
use crate::scope::TagKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DeclMode {
    /// A name is required (object, function, typedef declarations).
    Named,
    /// No name allowed (type names in casts, `sizeof`, ...).
    Abstract,
    /// Parameters may go either way.
    Either,
}

/// One step of a declarator, read from the name outward.
#[derive(Debug)]
pub(super) enum Derived {
    Pointer {
        loc: SourceLocation,
        quals: Quals,
    },
    Array {
        loc: SourceLocation,
        size: Option<Node>,
        quals: Quals,
        is_static: bool,
        vla_star: bool,
    },
    Function {
        loc: SourceLocation,
        params: Vec<Node>,
        variadic: bool,
        prototyped: bool,
    },
}

#[derive(Debug)]
pub(super) struct Declarator {
    pub name: Option<String>,
    pub loc: SourceLocation,
    pub chain: Vec<Derived>,
    pub asm_label: Option<String>,
}

impl Declarator {
    fn is_function(&self) -> bool {
        matches!(self.chain.first(), Some(Derived::Function { .. }))
    }
}

/// Wrap `base` in the declarator's type constructors, innermost (rightmost in
/// `chain`) first.
pub(super) fn build_type(base: Node, chain: Vec<Derived>) -> Node {
    let mut ty = base;
    for step in chain.into_iter().rev() {
        ty = match step {
            Derived::Pointer { loc, quals } => {
                let ptr = Node::with_children(NodeKind::PointerType, loc.clone(), vec![ty]);
                if quals.is_empty() {
                    ptr
                } else {
                    Node::with_children(NodeKind::QualifiedType, loc, vec![ptr]).payload(Payload::Quals(quals))
                }
            }
            Derived::Array {
                loc,
                size,
                quals,
                is_static,
                vla_star,
            } => {
                let mut arr = Node::with_children(NodeKind::ArrayType, loc, vec![ty]).payload(Payload::Array {
                    quals,
                    is_static,
                    vla_star,
                });
                if let Some(size) = size {
                    arr.push(size);
                }
                arr
            }
            Derived::Function {
                loc,
                params,
                variadic,
                prototyped,
            } => {
                let mut children = vec![ty];
                children.extend(params);
                Node::with_children(NodeKind::FunctionType, loc, children)
                    .payload(Payload::FunctionType { variadic, prototyped })
            }
        };
    }
    ty
}

/// Builtin type words as written, validated as a multiset.
#[derive(Debug, Default)]
struct TypeWords {
    written: Vec<&'static str>,
    void: u8,
    bool_: u8,
    char: u8,
    short: u8,
    int: u8,
    long: u8,
    float: u8,
    double: u8,
    signed: u8,
    unsigned: u8,
    complex: u8,
    int128: u8,
    /// `_FloatN`, `_DecimalN`, `_Imaginary`, `__auto_type`
    other: Option<&'static str>,
    other_count: u8,
}

impl TypeWords {
    fn is_empty(&self) -> bool {
        self.written.is_empty()
    }

    fn add(&mut self, kw: Kw) {
        self.written.push(kw.spelling());
        match kw {
            Kw::Void => self.void += 1,
            Kw::Bool => self.bool_ += 1,
            Kw::Char => self.char += 1,
            Kw::Short => self.short += 1,
            Kw::Int => self.int += 1,
            Kw::Long => self.long += 1,
            Kw::Float => self.float += 1,
            Kw::Double => self.double += 1,
            Kw::Signed => self.signed += 1,
            Kw::Unsigned => self.unsigned += 1,
            Kw::Complex => self.complex += 1,
            Kw::Int128 => self.int128 += 1,
            other => {
                self.other = Some(other.spelling());
                self.other_count += 1;
            }
        }
    }

    fn only_sign(&self) -> bool {
        self.written.iter().all(|w| *w == "signed" || *w == "unsigned") && self.written.len() == 1
    }

    /// Canonical spelling, `Ok(None)` when no word was written, `Err` for an
    /// invalid combination.
    fn canonical(&self) -> Result<Option<String>, ()> {
        if self.is_empty() {
            return Ok(None);
        }
        let counts = [
            self.void,
            self.bool_,
            self.char,
            self.short,
            self.int,
            self.float,
            self.double,
            self.signed,
            self.unsigned,
            self.complex,
            self.int128,
            self.other_count,
        ];
        if counts.iter().any(|c| *c > 1) || self.long > 2 || (self.signed > 0 && self.unsigned > 0) {
            return Err(());
        }
        let exclusive = self.void + self.bool_ + self.char + self.float + self.double + self.int128 + self.other_count;
        if exclusive > 1 {
            return Err(());
        }
        let sign = self.signed + self.unsigned > 0;
        let sized = self.short > 0 || self.long > 0;
        let complex = if self.complex > 0 { " _Complex" } else { "" };
        let name = if self.void + self.bool_ > 0 {
            if sign || sized || self.int > 0 || self.complex > 0 {
                return Err(());
            }
            if self.void > 0 { "void" } else { "_Bool" }.to_string()
        } else if let Some(other) = self.other {
            if sign || sized || self.int > 0 {
                return Err(());
            }
            format!("{}{}", other, complex)
        } else if self.float > 0 {
            if sign || sized || self.int > 0 {
                return Err(());
            }
            format!("float{}", complex)
        } else if self.double > 0 {
            if sign || self.short > 0 || self.long > 1 || self.int > 0 {
                return Err(());
            }
            let long = if self.long == 1 { "long " } else { "" };
            format!("{}double{}", long, complex)
        } else if self.complex > 0 {
            // `_Complex` alone means `double _Complex`
            if sign || sized || self.int > 0 || self.char > 0 || self.int128 > 0 {
                return Err(());
            }
            "double _Complex".to_string()
        } else if self.char > 0 {
            if sized || self.int > 0 {
                return Err(());
            }
            match (self.signed, self.unsigned) {
                (1, _) => "signed char",
                (_, 1) => "unsigned char",
                _ => "char",
            }
            .to_string()
        } else if self.int128 > 0 {
            if sized || self.int > 0 {
                return Err(());
            }
            if self.unsigned > 0 { "unsigned __int128" } else { "__int128" }.to_string()
        } else if self.short > 0 {
            if self.long > 0 {
                return Err(());
            }
            if self.unsigned > 0 { "unsigned short" } else { "short" }.to_string()
        } else if self.long > 0 {
            let long = if self.long == 2 { "long long" } else { "long" };
            if self.unsigned > 0 {
                format!("unsigned {}", long)
            } else {
                long.to_string()
            }
        } else if self.unsigned > 0 {
            "unsigned int".to_string()
        } else {
            "int".to_string()
        };
        Ok(Some(name))
    }
}

/// Everything before the declarators.
#[derive(Debug)]
pub(super) struct DeclSpec {
    loc: SourceLocation,
    storage: Option<StorageClass>,
    is_typedef: bool,
    thread_local: bool,
    inline: bool,
    noreturn: bool,
    quals: Quals,
    align: Vec<Node>,
    words: TypeWords,
    /// struct/union/enum, typedef name, `typeof`, `_Atomic(T)`, `_BitInt(N)`
    named: Option<Node>,
    any: bool,
    /// No specifiers at all, accepted as `int` (C89 functions).
    implicit_int: bool,
}

fn is_type_keyword(kw: Kw) -> bool {
    matches!(
        kw,
        Kw::Void
            | Kw::Char
            | Kw::Short
            | Kw::Int
            | Kw::Long
            | Kw::Float
            | Kw::Double
            | Kw::Signed
            | Kw::Unsigned
            | Kw::Bool
            | Kw::Complex
            | Kw::Imaginary
            | Kw::Int128
            | Kw::Float16
            | Kw::Float32
            | Kw::Float64
            | Kw::Float128
            | Kw::Float32x
            | Kw::Float64x
            | Kw::Decimal32
            | Kw::Decimal64
            | Kw::Decimal128
            | Kw::AutoType
            | Kw::Struct
            | Kw::Union
            | Kw::Enum
            | Kw::Const
            | Kw::Volatile
            | Kw::Restrict
            | Kw::Atomic
            | Kw::Typeof
            | Kw::TypeofUnqual
            | Kw::BitInt
    )
}

fn is_decl_keyword(kw: Kw) -> bool {
    is_type_keyword(kw)
        || matches!(
            kw,
            Kw::Typedef
                | Kw::Extern
                | Kw::Static
                | Kw::Auto
                | Kw::Register
                | Kw::Constexpr
                | Kw::ThreadLocal
                | Kw::Inline
                | Kw::Noreturn
                | Kw::Alignas
                | Kw::StaticAssert
                | Kw::Label
        )
}

impl<'a> Parser<'a> {
    /// Can `tok` begin a type name?
    pub(super) fn is_type_start(&self, tok: &Token) -> bool {
        match tok.kind {
            K::Keyword(kw) => is_type_keyword(kw),
            K::Identifier => self.is_type_name(&tok.lexeme),
            _ => false,
        }
    }

    /// Tentatively look past `__extension__` and attributes to decide whether a
    /// block item is a declaration.
    pub(super) fn starts_declaration(&mut self) -> bool {
        let mark = self.cur.mark();
        while self.at_keyword(Kw::Extension) {
            self.bump();
        }
        self.skip_attribute_tokens();
        let tok = self.peek();
        let decl = match tok.kind {
            K::Keyword(kw) => is_decl_keyword(kw),
            K::Identifier => self.is_type_name(&tok.lexeme) && !self.peek_nth(1).is_punct(P::Colon),
            _ => false,
        };
        self.cur.reset(mark);
        decl
    }

    /// Attribute skipping without diagnostics, for lookahead.
    fn skip_attribute_tokens(&mut self) {
        loop {
            let open = if self.at_keyword(Kw::Attribute) && self.peek_nth(1).is_punct(P::LParen) {
                self.bump();
                P::LParen
            } else if self.at_punct(P::LBracket) && self.peek_nth(1).is_punct(P::LBracket) {
                P::LBracket
            } else {
                return;
            };
            let close = if open == P::LParen { P::RParen } else { P::RBracket };
            let mut depth = 0usize;
            loop {
                let tok = self.bump();
                match tok.kind {
                    K::Eof => return,
                    K::Punct(p) if p == open => depth += 1,
                    K::Punct(p) if p == close => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    /// `__attribute__((...))` and `[[...]]` sequences are accepted and dropped.
    pub(super) fn skip_attributes(&mut self) -> PResult<()> {
        loop {
            if self.at_keyword(Kw::Attribute) {
                self.bump();
                self.expect_punct(P::LParen, "'(' after '__attribute__'")?;
                self.skip_balanced(P::LParen, P::RParen, 1)?;
            } else if self.at_punct(P::LBracket) && self.peek_nth(1).is_punct(P::LBracket) {
                self.bump();
                self.bump();
                self.skip_balanced(P::LBracket, P::RBracket, 2)?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_balanced(&mut self, open: P, close: P, mut depth: usize) -> PResult<()> {
        loop {
            let tok = self.peek();
            match tok.kind {
                K::Eof => return Err(self.unexpected("closing bracket")),
                K::Punct(p) if p == open => depth += 1,
                K::Punct(p) if p == close => depth -= 1,
                _ => {}
            }
            self.bump();
            if depth == 0 {
                return Ok(());
            }
        }
    }

    // ---- specifiers ----------------------------------------------------

    pub(super) fn declaration_specifiers(&mut self, allow_storage: bool) -> PResult<DeclSpec> {
        self.nested(|p| p.declaration_specifiers_inner(allow_storage))
    }

    fn declaration_specifiers_inner(&mut self, allow_storage: bool) -> PResult<DeclSpec> {
        let mut spec = DeclSpec {
            loc: self.loc(),
            storage: None,
            is_typedef: false,
            thread_local: false,
            inline: false,
            noreturn: false,
            quals: Quals::default(),
            align: Vec::new(),
            words: TypeWords::default(),
            named: None,
            any: false,
            implicit_int: false,
        };
        loop {
            let tok = self.peek();
            match tok.kind {
                K::Keyword(kw) => match kw {
                    Kw::Typedef | Kw::Extern | Kw::Static | Kw::Auto | Kw::Register | Kw::Constexpr => {
                        self.bump();
                        self.storage_class(&mut spec, kw, tok, allow_storage);
                    }
                    Kw::ThreadLocal => {
                        self.bump();
                        if !allow_storage {
                            self.report(tok.location.clone(), format!("unexpected {}", tok));
                        }
                        spec.thread_local = true;
                    }
                    Kw::Inline => {
                        self.bump();
                        spec.inline = true;
                    }
                    Kw::Noreturn => {
                        self.bump();
                        spec.noreturn = true;
                    }
                    Kw::Const => {
                        self.bump();
                        spec.quals.is_const = true;
                    }
                    Kw::Volatile => {
                        self.bump();
                        spec.quals.is_volatile = true;
                    }
                    Kw::Restrict => {
                        self.bump();
                        spec.quals.is_restrict = true;
                    }
                    Kw::Atomic if self.peek_nth(1).is_punct(P::LParen) => {
                        let loc = self.bump().location.clone();
                        self.bump();
                        let inner = self.type_name()?;
                        self.expect_punct(P::RParen, "')'")?;
                        let node = Node::with_children(NodeKind::AtomicType, loc, vec![inner]);
                        self.set_named(&mut spec, node, tok);
                    }
                    Kw::Atomic => {
                        self.bump();
                        spec.quals.is_atomic = true;
                    }
                    Kw::Attribute => {
                        self.skip_attributes()?;
                        continue;
                    }
                    Kw::Extension => {
                        self.bump();
                        continue;
                    }
                    Kw::Alignas => {
                        let node = self.alignas_specifier()?;
                        spec.align.push(node);
                    }
                    Kw::Struct | Kw::Union => {
                        let node = self.struct_or_union_specifier()?;
                        self.set_named(&mut spec, node, tok);
                    }
                    Kw::Enum => {
                        let node = self.enum_specifier()?;
                        self.set_named(&mut spec, node, tok);
                    }
                    Kw::Typeof | Kw::TypeofUnqual => {
                        let node = self.typeof_specifier()?;
                        self.set_named(&mut spec, node, tok);
                    }
                    Kw::BitInt => {
                        let loc = self.bump().location.clone();
                        self.expect_punct(P::LParen, "'(' after '_BitInt'")?;
                        let width = self.conditional_expression()?;
                        self.expect_punct(P::RParen, "')'")?;
                        let node = Node::with_children(NodeKind::BitIntType, loc, vec![width]).payload(Payload::Flag(false));
                        self.set_named(&mut spec, node, tok);
                    }
                    kw if is_type_keyword(kw) => {
                        self.bump();
                        spec.words.add(kw);
                    }
                    _ => break,
                },
                K::Identifier if spec.named.is_none() && spec.words.is_empty() && self.is_type_name(&tok.lexeme) => {
                    self.bump();
                    spec.named = Some(Node::named(NodeKind::TypedefName, tok.location.clone(), tok.lexeme.clone()));
                }
                K::Punct(P::LBracket) if self.peek_nth(1).is_punct(P::LBracket) => {
                    self.skip_attributes()?;
                    continue;
                }
                _ => break,
            }
            spec.any = true;
        }
        Ok(spec)
    }

    fn storage_class(&mut self, spec: &mut DeclSpec, kw: Kw, tok: &Token, allow_storage: bool) {
        if !allow_storage {
            self.report(tok.location.clone(), format!("unexpected storage class {}", tok));
            return;
        }
        if spec.is_typedef || spec.storage.is_some() {
            self.report(tok.location.clone(), "multiple storage classes in declaration specifiers");
            return;
        }
        spec.storage = match kw {
            Kw::Typedef => {
                spec.is_typedef = true;
                None
            }
            Kw::Extern => Some(StorageClass::Extern),
            Kw::Static => Some(StorageClass::Static),
            Kw::Auto => Some(StorageClass::Auto),
            Kw::Register => Some(StorageClass::Register),
            _ => Some(StorageClass::Constexpr),
        };
    }

    fn set_named(&mut self, spec: &mut DeclSpec, node: Node, tok: &Token) {
        if spec.named.is_some() {
            self.report(tok.location.clone(), "two or more data types in declaration specifiers");
            return;
        }
        spec.named = Some(node);
    }

    /// The specifier's type, qualifiers applied. Invalid combinations are
    /// reported and fall back to `int`.
    pub(super) fn base_type(&mut self, spec: &mut DeclSpec) -> Node {
        let loc = spec.loc.clone();
        let ty = match spec.named.take() {
            Some(mut node) if node.kind == NodeKind::BitIntType && (spec.words.is_empty() || spec.words.only_sign()) => {
                node.payload = Payload::Flag(spec.words.unsigned > 0);
                node
            }
            Some(node) => {
                if !spec.words.is_empty() {
                    self.report(loc.clone(), "two or more data types in declaration specifiers");
                }
                node
            }
            None => match spec.words.canonical() {
                Ok(Some(name)) => Node::named(NodeKind::BuiltinType, loc.clone(), name),
                Ok(None) => {
                    if !spec.implicit_int && self.standard() > CStandard::C89 {
                        self.report(loc.clone(), "type specifier missing, defaults to 'int'");
                    }
                    Node::named(NodeKind::BuiltinType, loc.clone(), "int")
                }
                Err(()) => {
                    let written = spec.words.written.join(" ");
                    self.report(loc.clone(), format!("invalid combination of type specifiers '{}'", written));
                    Node::named(NodeKind::BuiltinType, loc.clone(), "int")
                }
            },
        };
        if spec.quals.is_empty() {
            ty
        } else {
            Node::with_children(NodeKind::QualifiedType, loc, vec![ty]).payload(Payload::Quals(spec.quals))
        }
    }

    fn alignas_specifier(&mut self) -> PResult<Node> {
        let loc = self.bump().location.clone();
        self.expect_punct(P::LParen, "'(' after '_Alignas'")?;
        let inner = if self.is_type_start(self.peek()) {
            self.type_name()?
        } else {
            self.conditional_expression()?
        };
        self.expect_punct(P::RParen, "')'")?;
        Ok(Node::with_children(NodeKind::AlignAs, loc, vec![inner]))
    }

    fn typeof_specifier(&mut self) -> PResult<Node> {
        let tok = self.bump();
        let unqual = tok.is_keyword(Kw::TypeofUnqual);
        self.expect_punct(P::LParen, "'(' after 'typeof'")?;
        let inner = if self.is_type_start(self.peek()) {
            self.type_name()?
        } else {
            self.expression()?
        };
        self.expect_punct(P::RParen, "')'")?;
        Ok(Node::with_children(NodeKind::TypeofType, tok.location.clone(), vec![inner]).payload(Payload::Flag(unqual)))
    }

    fn declare_tag(&mut self, kind: TagKind, name: &str, loc: &SourceLocation, defining: bool) {
        if !defining {
            match self.scopes.lookup_tag(name) {
                Some(prev) if prev != kind => {
                    self.report(
                        loc.clone(),
                        format!("use of '{}' with tag type that does not match previous declaration", name),
                    );
                    return;
                }
                Some(_) => return,
                None => {}
            }
        }
        if let Err(prev) = self.scopes.add_tag(kind, name) {
            self.report(
                loc.clone(),
                format!("'{}' defined as wrong kind of tag (previously declared as {})", name, prev.spelling()),
            );
        }
    }

    fn struct_or_union_specifier(&mut self) -> PResult<Node> {
        let tok = self.bump();
        let (tag, kind) = if tok.is_keyword(Kw::Struct) {
            (TagKind::Struct, NodeKind::StructType)
        } else {
            (TagKind::Union, NodeKind::UnionType)
        };
        self.skip_attributes()?;
        let name = if self.peek().kind == K::Identifier {
            Some(self.bump().lexeme.clone())
        } else {
            None
        };
        let has_body = self.at_punct(P::LBrace);
        match &name {
            Some(n) => self.declare_tag(tag, n, &tok.location, has_body),
            None if !has_body => return Err(self.unexpected("'{' or tag name")),
            None => {}
        }
        let mut node = Node::new(kind, tok.location.clone()).payload(Payload::Tag { name, has_body });
        if has_body {
            self.bump();
            while !self.at_punct(P::RBrace) && !self.cur.is_eof() {
                let start = self.cur.position();
                if self.member_declaration(&mut node.children).is_err() {
                    self.recover(start);
                }
            }
            self.expect_punct(P::RBrace, "'}'")?;
            self.skip_attributes()?;
        }
        Ok(node)
    }

    fn member_declaration(&mut self, out: &mut Vec<Node>) -> PResult<()> {
        if self.consume_punct(P::Semicolon) {
            return Ok(());
        }
        if self.at_keyword(Kw::StaticAssert) {
            out.push(self.static_assert()?);
            return Ok(());
        }
        let loc = self.loc();
        let mut spec = self.declaration_specifiers(false)?;
        if !spec.any {
            return Err(self.unexpected("member declaration"));
        }
        let base = self.base_type(&mut spec);
        if self.consume_punct(P::Semicolon) {
            // anonymous struct or union member
            let mut field = Node::with_children(NodeKind::FieldDecl, loc, vec![base]).payload(Payload::Decl(DeclInfo::default()));
            field.children.extend(spec.align.iter().cloned());
            out.push(field);
            return Ok(());
        }
        loop {
            let d = if self.at_punct(P::Colon) {
                Declarator {
                    name: None,
                    loc: self.loc(),
                    chain: Vec::new(),
                    asm_label: None,
                }
            } else {
                self.declarator(DeclMode::Named)?
            };
            let info = DeclInfo {
                name: d.name,
                ..DeclInfo::default()
            };
            let mut field = Node::with_children(NodeKind::FieldDecl, d.loc, vec![build_type(base.clone(), d.chain)])
                .payload(Payload::Decl(info));
            field.children.extend(spec.align.iter().cloned());
            if self.consume_punct(P::Colon) {
                field.push(self.conditional_expression()?);
            }
            self.skip_attributes()?;
            out.push(field);
            if !self.consume_punct(P::Comma) {
                break;
            }
        }
        self.expect_punct(P::Semicolon, "';' after member declaration")?;
        Ok(())
    }

    fn enum_specifier(&mut self) -> PResult<Node> {
        let tok = self.bump();
        self.skip_attributes()?;
        let name = if self.peek().kind == K::Identifier {
            Some(self.bump().lexeme.clone())
        } else {
            None
        };
        let mut children = Vec::new();
        // C23 fixed underlying type; `enum E : 3` in a struct is a bit-field instead
        if self.at_punct(P::Colon) && self.is_type_start(self.peek_nth(1)) {
            self.bump();
            children.push(self.type_name()?);
        }
        let has_body = self.at_punct(P::LBrace);
        match &name {
            Some(n) => self.declare_tag(TagKind::Enum, n, &tok.location, has_body),
            None if !has_body => return Err(self.unexpected("'{' or tag name")),
            None => {}
        }
        if has_body {
            self.bump();
            loop {
                let c = self.expect_ident()?;
                let mut constant = Node::named(NodeKind::EnumConstant, c.location.clone(), c.lexeme.clone());
                self.skip_attributes()?;
                if self.consume_op(O::Assign) {
                    constant.push(self.conditional_expression()?);
                }
                self.scopes.add_ordinary(&c.lexeme);
                children.push(constant);
                if !self.consume_punct(P::Comma) || self.at_punct(P::RBrace) {
                    break;
                }
            }
            self.expect_punct(P::RBrace, "'}'")?;
            self.skip_attributes()?;
        }
        Ok(Node::with_children(NodeKind::EnumType, tok.location.clone(), children).payload(Payload::Tag { name, has_body }))
    }

    // ---- declarators ---------------------------------------------------

    pub(super) fn declarator(&mut self, mode: DeclMode) -> PResult<Declarator> {
        self.nested(|p| p.declarator_inner(mode))
    }

    fn declarator_inner(&mut self, mode: DeclMode) -> PResult<Declarator> {
        let mut pointers = Vec::new();
        while self.at_op(O::Star) {
            let loc = self.bump().location.clone();
            let quals = self.pointer_qualifiers()?;
            pointers.push(Derived::Pointer { loc, quals });
        }
        let mut d = self.direct_declarator(mode)?;
        // the `*` nearest the name binds first
        d.chain.extend(pointers.into_iter().rev());
        Ok(d)
    }

    fn pointer_qualifiers(&mut self) -> PResult<Quals> {
        let mut quals = Quals::default();
        loop {
            match self.peek().kind {
                K::Keyword(Kw::Const) => quals.is_const = true,
                K::Keyword(Kw::Volatile) => quals.is_volatile = true,
                K::Keyword(Kw::Restrict) => quals.is_restrict = true,
                K::Keyword(Kw::Atomic) => quals.is_atomic = true,
                K::Keyword(Kw::Attribute) => {
                    self.skip_attributes()?;
                    continue;
                }
                _ => return Ok(quals),
            }
            self.bump();
        }
    }

    /// At `(`: does it open a nested declarator rather than a parameter list?
    fn is_nested_declarator(&self, mode: DeclMode) -> bool {
        if mode == DeclMode::Named {
            return true;
        }
        let next = self.peek_nth(1);
        match next.kind {
            K::Operator(O::Star) | K::Punct(P::LParen) | K::Punct(P::LBracket) => true,
            K::Keyword(Kw::Attribute) => true,
            K::Identifier => mode == DeclMode::Either && !self.is_type_name(&next.lexeme),
            _ => false,
        }
    }

    fn direct_declarator(&mut self, mode: DeclMode) -> PResult<Declarator> {
        let loc = self.loc();
        let mut d = if self.at_punct(P::LParen) && self.is_nested_declarator(mode) {
            self.bump();
            self.skip_attributes()?;
            let inner = self.declarator(mode)?;
            self.expect_punct(P::RParen, "')'")?;
            inner
        } else if self.peek().kind == K::Identifier && mode != DeclMode::Abstract {
            let tok = self.bump();
            Declarator {
                name: Some(tok.lexeme.clone()),
                loc: tok.location.clone(),
                chain: Vec::new(),
                asm_label: None,
            }
        } else if mode == DeclMode::Named {
            return Err(self.unexpected("identifier or '('"));
        } else {
            Declarator {
                name: None,
                loc,
                chain: Vec::new(),
                asm_label: None,
            }
        };
        loop {
            if self.at_punct(P::LBracket) && !self.peek_nth(1).is_punct(P::LBracket) {
                let step = self.array_suffix()?;
                d.chain.push(step);
            } else if self.at_punct(P::LParen) {
                let step = self.function_suffix()?;
                d.chain.push(step);
            } else {
                break;
            }
        }
        Ok(d)
    }

    fn array_suffix(&mut self) -> PResult<Derived> {
        let loc = self.bump().location.clone();
        let mut quals = Quals::default();
        let mut is_static = false;
        loop {
            match self.peek().kind {
                K::Keyword(Kw::Static) => is_static = true,
                K::Keyword(Kw::Const) => quals.is_const = true,
                K::Keyword(Kw::Volatile) => quals.is_volatile = true,
                K::Keyword(Kw::Restrict) => quals.is_restrict = true,
                K::Keyword(Kw::Atomic) => quals.is_atomic = true,
                _ => break,
            }
            self.bump();
        }
        let mut vla_star = false;
        let size = if self.at_punct(P::RBracket) {
            None
        } else if self.at_op(O::Star) && self.peek_nth(1).is_punct(P::RBracket) {
            self.bump();
            vla_star = true;
            None
        } else {
            Some(self.assignment_expression()?)
        };
        self.expect_punct(P::RBracket, "']'")?;
        Ok(Derived::Array {
            loc,
            size,
            quals,
            is_static,
            vla_star,
        })
    }

    fn function_suffix(&mut self) -> PResult<Derived> {
        let loc = self.bump().location.clone();
        self.scopes.enter_scope();
        let params = self.parameter_list();
        self.scopes.exit_scope();
        let (params, variadic, prototyped) = params?;
        Ok(Derived::Function {
            loc,
            params,
            variadic,
            prototyped,
        })
    }

    /// After the `(`; consumes the `)`.
    fn parameter_list(&mut self) -> PResult<(Vec<Node>, bool, bool)> {
        if self.consume_punct(P::RParen) {
            return Ok((Vec::new(), false, false));
        }
        if self.at_keyword(Kw::Void) && self.peek_nth(1).is_punct(P::RParen) {
            self.bump();
            self.bump();
            return Ok((Vec::new(), false, true));
        }
        let first = self.peek();
        if first.kind == K::Identifier
            && !self.is_type_name(&first.lexeme)
            && matches!(self.peek_nth(1).kind, K::Punct(P::Comma) | K::Punct(P::RParen))
        {
            return Err(self.error_at(first.location.clone(), "old-style parameter lists are not supported"));
        }
        let mut params = Vec::new();
        let mut variadic = false;
        loop {
            if self.consume_punct(P::Ellipsis) {
                variadic = true;
                break;
            }
            params.push(self.parameter_declaration()?);
            if !self.consume_punct(P::Comma) {
                break;
            }
        }
        self.expect_punct(P::RParen, "')' after parameters")?;
        Ok((params, variadic, true))
    }

    fn parameter_declaration(&mut self) -> PResult<Node> {
        let loc = self.loc();
        let mut spec = self.declaration_specifiers(true)?;
        if !spec.any {
            let tok = self.peek();
            if tok.kind == K::Identifier {
                return Err(self.error_at(tok.location.clone(), format!("unknown type name '{}'", tok.lexeme)));
            }
            return Err(self.unexpected("parameter declaration"));
        }
        if spec.is_typedef || spec.storage.is_some_and(|s| s != StorageClass::Register) {
            self.report(loc.clone(), "invalid storage class for parameter");
        }
        let base = self.base_type(&mut spec);
        let d = self.declarator(DeclMode::Either)?;
        self.skip_attributes()?;
        if let Some(name) = &d.name {
            self.scopes.add_ordinary(name);
        }
        let at = if d.name.is_some() { d.loc.clone() } else { loc };
        let info = DeclInfo {
            name: d.name,
            storage: spec.storage,
            ..DeclInfo::default()
        };
        Ok(Node::with_children(NodeKind::ParamDecl, at, vec![build_type(base, d.chain)]).payload(Payload::Decl(info)))
    }

    fn asm_label(&mut self) -> PResult<Option<String>> {
        if !self.at_keyword(Kw::Asm) {
            return Ok(None);
        }
        self.bump();
        self.expect_punct(P::LParen, "'(' after 'asm'")?;
        let text = self.string_text()?;
        self.expect_punct(P::RParen, "')'")?;
        Ok(Some(text))
    }

    /// `type-name` as in casts and `sizeof`.
    pub(crate) fn type_name(&mut self) -> PResult<Node> {
        let mut spec = self.declaration_specifiers(false)?;
        if !spec.any {
            return Err(self.unexpected("type name"));
        }
        let base = self.base_type(&mut spec);
        let d = self.declarator(DeclMode::Abstract)?;
        Ok(build_type(base, d.chain))
    }

    // ---- declarations --------------------------------------------------

    pub(crate) fn external_declaration(&mut self, out: &mut Vec<Node>) -> PResult<()> {
        while self.consume_keyword(Kw::Extension) {}
        match self.peek().kind {
            K::Punct(P::Semicolon) => {
                self.bump();
                Ok(())
            }
            K::Keyword(Kw::StaticAssert) => {
                let node = self.static_assert()?;
                out.push(node);
                Ok(())
            }
            K::Keyword(Kw::Asm) => {
                let node = self.asm_statement()?;
                out.push(node);
                Ok(())
            }
            _ => self.declaration(out, true),
        }
    }

    /// Declarations valid inside a block (also the `declaration` rule).
    pub(crate) fn block_declaration(&mut self, out: &mut Vec<Node>) -> PResult<()> {
        while self.consume_keyword(Kw::Extension) {}
        match self.peek().kind {
            K::Keyword(Kw::StaticAssert) => {
                let node = self.static_assert()?;
                out.push(node);
                Ok(())
            }
            K::Keyword(Kw::Label) => self.label_declaration(out),
            _ => self.declaration(out, false),
        }
    }

    fn declaration(&mut self, out: &mut Vec<Node>, top_level: bool) -> PResult<()> {
        let mut spec = self.declaration_specifiers(true)?;
        if !spec.any {
            let tok = self.peek();
            let next = self.peek_nth(1);
            if top_level && tok.kind == K::Identifier && next.is_punct(P::LParen) {
                if self.standard() > CStandard::C89 {
                    self.report(tok.location.clone(), "type specifier missing, defaults to 'int'");
                }
                spec.implicit_int = true;
                spec.loc = tok.location.clone();
            } else if tok.kind == K::Identifier && matches!(next.kind, K::Identifier | K::Operator(O::Star)) {
                return Err(self.error_at(tok.location.clone(), format!("unknown type name '{}'", tok.lexeme)));
            } else {
                return Err(self.unexpected(if top_level { "declaration" } else { "declaration or statement" }));
            }
        }
        let base = self.base_type(&mut spec);
        if self.at_punct(P::Semicolon) {
            if let Some(decl) = tag_declaration(&base) {
                out.push(decl);
            }
            self.bump();
            return Ok(());
        }
        let mut typedefs = Vec::new();
        let done = self.init_declarators(&spec, &base, top_level, out, &mut typedefs);
        // typedef names become visible at the closing `;`
        for name in &typedefs {
            self.scopes.add_typedef(name);
        }
        if done? {
            return Ok(());
        }
        self.expect_punct(P::Semicolon, "';' after declaration")?;
        Ok(())
    }

    /// Returns `true` when the list ended in a function body.
    fn init_declarators(
        &mut self,
        spec: &DeclSpec,
        base: &Node,
        top_level: bool,
        out: &mut Vec<Node>,
        typedefs: &mut Vec<String>,
    ) -> PResult<bool> {
        let mut first = true;
        loop {
            let mut d = self.declarator(DeclMode::Named)?;
            d.asm_label = self.asm_label()?;
            self.skip_attributes()?;
            let name = d.name.clone().unwrap_or_default();
            if spec.is_typedef {
                let info = DeclInfo {
                    name: d.name,
                    ..DeclInfo::default()
                };
                let ty = build_type(base.clone(), d.chain);
                out.push(Node::with_children(NodeKind::TypedefDecl, d.loc, vec![ty]).payload(Payload::Decl(info)));
                typedefs.push(name);
            } else if d.is_function() {
                if self.at_punct(P::LBrace) {
                    if !(top_level && first) {
                        return Err(self.error_at(self.loc(), "function definition is not allowed here"));
                    }
                    let f = self.function_definition(spec, base.clone(), d)?;
                    out.push(f);
                    return Ok(true);
                }
                self.scopes.add_ordinary(&name);
                out.push(function_node(spec, base.clone(), d));
            } else {
                let info = DeclInfo {
                    name: d.name,
                    storage: spec.storage,
                    thread_local: spec.thread_local,
                    asm_label: d.asm_label,
                };
                let mut var = Node::with_children(NodeKind::VarDecl, d.loc, vec![build_type(base.clone(), d.chain)])
                    .payload(Payload::Decl(info));
                var.children.extend(spec.align.iter().cloned());
                self.scopes.add_ordinary(&name);
                if self.consume_op(O::Assign) {
                    var.push(self.initializer()?);
                }
                out.push(var);
            }
            first = false;
            if !self.consume_punct(P::Comma) {
                return Ok(false);
            }
        }
    }

    fn function_definition(&mut self, spec: &DeclSpec, base: Node, d: Declarator) -> PResult<Node> {
        if let Some(name) = &d.name {
            self.scopes.add_ordinary(name);
        }
        let mut f = function_node(spec, base, d);
        log::trace!("function definition '{}'", f.name().unwrap_or_default());
        let params: Vec<String> = f.params().filter_map(|p| p.name().map(str::to_string)).collect();
        self.scopes.enter_scope();
        for p in &params {
            self.scopes.add_ordinary(p);
        }
        let body = self.compound_statement(false);
        self.scopes.exit_scope();
        f.push(body?);
        Ok(f)
    }

    pub(super) fn static_assert(&mut self) -> PResult<Node> {
        let loc = self.bump().location.clone();
        self.expect_punct(P::LParen, "'(' after 'static_assert'")?;
        let cond = self.conditional_expression()?;
        let mut node = Node::with_children(NodeKind::StaticAssert, loc, vec![cond]);
        if self.consume_punct(P::Comma) {
            node.push(self.string_literal()?);
        }
        self.expect_punct(P::RParen, "')'")?;
        self.expect_punct(P::Semicolon, "';' after static assertion")?;
        Ok(node)
    }

    fn label_declaration(&mut self, out: &mut Vec<Node>) -> PResult<()> {
        self.bump();
        loop {
            let tok = self.expect_ident()?;
            out.push(Node::named(NodeKind::LabelDecl, tok.location.clone(), tok.lexeme.clone()));
            if !self.consume_punct(P::Comma) {
                break;
            }
        }
        self.expect_punct(P::Semicolon, "';' after label declaration")?;
        Ok(())
    }

    /// A `for` initializer declaration as a single node.
    pub(super) fn for_declaration(&mut self) -> PResult<Node> {
        let loc = self.loc();
        let mut out = Vec::new();
        self.block_declaration(&mut out)?;
        Ok(group(loc, out))
    }
}

/// `FunctionDecl` from a declarator whose outermost step is a function.
fn function_node(spec: &DeclSpec, base: Node, mut d: Declarator) -> Node {
    let (params, variadic, prototyped) = match d.chain.first() {
        Some(Derived::Function { .. }) => match d.chain.remove(0) {
            Derived::Function {
                params,
                variadic,
                prototyped,
                ..
            } => (params, variadic, prototyped),
            _ => (Vec::new(), false, false),
        },
        _ => (Vec::new(), false, false),
    };
    let mut children = vec![build_type(base, d.chain)];
    children.extend(params);
    let info = FunctionInfo {
        name: d.name.unwrap_or_default(),
        storage: spec.storage,
        inline: spec.inline,
        noreturn: spec.noreturn,
        variadic,
        prototyped,
        asm_label: d.asm_label,
    };
    Node::with_children(NodeKind::FunctionDecl, d.loc, children).payload(Payload::Function(info))
}

/// `struct S {...};` and friends: the specifier alone declares the tag.
fn tag_declaration(base: &Node) -> Option<Node> {
    let ty = if base.kind == NodeKind::QualifiedType {
        base.child(0)?
    } else {
        base
    };
    let kind = match ty.kind {
        NodeKind::StructType => NodeKind::StructDecl,
        NodeKind::UnionType => NodeKind::UnionDecl,
        NodeKind::EnumType => NodeKind::EnumDecl,
        _ => return None,
    };
    Some(Node::with_children(kind, ty.loc.clone(), ty.children.clone()).payload(ty.payload.clone()))
}
