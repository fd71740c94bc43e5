use lex::syntax::{prec, Associativity};
use lex::{
    units_to_string, CharPrefix, Keyword as Kw, LiteralKind, Operator as O, Punctuator as P, SourceLocation,
    TokenKind as K, TokenValue,
};

use super::{PResult, Parser};
use crate::ast::*;

impl<'a> Parser<'a> {
    pub(crate) fn expression(&mut self) -> PResult<Node> {
        let mut lhs = self.assignment_expression()?;
        while self.at_punct(P::Comma) {
            let loc = self.bump().location.clone();
            let rhs = self.assignment_expression()?;
            lhs = Node::with_children(NodeKind::Comma, loc, vec![lhs, rhs]);
        }
        Ok(lhs)
    }

    pub(crate) fn assignment_expression(&mut self) -> PResult<Node> {
        self.nested(Self::assignment_expression_inner)
    }

    fn assignment_expression_inner(&mut self) -> PResult<Node> {
        let lhs = self.conditional_expression()?;
        if let K::Operator(op) = self.peek().kind {
            if self.syntax.precedence(op) == Some(prec::ASSIGNMENT) {
                if let Some(aop) = AssignOp::from_operator(op) {
                    let loc = self.bump().location.clone();
                    let rhs = self.assignment_expression()?;
                    return Ok(Node::with_children(NodeKind::Assign(aop), loc, vec![lhs, rhs]));
                }
            }
        }
        Ok(lhs)
    }

    pub(crate) fn conditional_expression(&mut self) -> PResult<Node> {
        self.nested(Self::conditional_expression_inner)
    }

    fn conditional_expression_inner(&mut self) -> PResult<Node> {
        let cond = self.binary_expression(prec::LOGICAL_OR)?;
        if !self.at_op(O::Question) {
            return Ok(cond);
        }
        let loc = self.bump().location.clone();
        if self.is_gnu() && self.consume_punct(P::Colon) {
            let rhs = self.conditional_expression()?;
            return Ok(Node::with_children(NodeKind::BinaryConditional, loc, vec![cond, rhs]));
        }
        let then = self.expression()?;
        self.expect_punct(P::Colon, "':'")?;
        let otherwise = self.conditional_expression()?;
        Ok(Node::with_children(NodeKind::Conditional, loc, vec![cond, then, otherwise]))
    }

    /// Precedence climbing over the descriptor's binary operator levels.
    fn binary_expression(&mut self, min: u8) -> PResult<Node> {
        let mut lhs = self.cast_expression()?;
        loop {
            let K::Operator(op) = self.peek().kind else { break };
            let Some(def) = self.syntax.operator(op) else { break };
            let (level, assoc) = (def.precedence, def.assoc);
            if !(prec::LOGICAL_OR..=prec::MULTIPLICATIVE).contains(&level) || level < min {
                break;
            }
            let Some(bop) = BinaryOp::from_operator(op) else { break };
            let loc = self.bump().location.clone();
            let next = if assoc == Associativity::Right { level } else { level + 1 };
            let rhs = self.binary_expression(next)?;
            lhs = Node::with_children(NodeKind::Binary(bop), loc, vec![lhs, rhs]);
        }
        Ok(lhs)
    }

    fn cast_expression(&mut self) -> PResult<Node> {
        self.nested(Self::cast_expression_inner)
    }

    fn cast_expression_inner(&mut self) -> PResult<Node> {
        if self.at_punct(P::LParen) && self.is_type_start(self.peek_nth(1)) {
            let loc = self.bump().location.clone();
            let ty = self.type_name()?;
            self.expect_punct(P::RParen, "')'")?;
            if self.at_punct(P::LBrace) {
                let lit = self.compound_literal(loc, ty)?;
                return self.postfix_tail(lit);
            }
            let operand = self.cast_expression()?;
            return Ok(Node::with_children(NodeKind::Cast, loc, vec![ty, operand]));
        }
        self.unary_expression()
    }

    fn unary_expression(&mut self) -> PResult<Node> {
        self.nested(Self::unary_expression_inner)
    }

    fn unary_expression_inner(&mut self) -> PResult<Node> {
        let tok = self.peek();
        let loc = tok.location.clone();
        let op = match tok.kind {
            K::Operator(O::Inc) => {
                self.bump();
                let operand = self.unary_expression()?;
                return Ok(Node::with_children(NodeKind::Unary(UnaryOp::PreInc), loc, vec![operand]));
            }
            K::Operator(O::Dec) => {
                self.bump();
                let operand = self.unary_expression()?;
                return Ok(Node::with_children(NodeKind::Unary(UnaryOp::PreDec), loc, vec![operand]));
            }
            K::Operator(O::AndAnd) if self.is_gnu() && self.peek_nth(1).kind == K::Identifier => {
                self.bump();
                let label = self.bump();
                return Ok(Node::named(NodeKind::LabelAddress, loc, label.lexeme.clone()));
            }
            K::Operator(O::Amp) => UnaryOp::AddrOf,
            K::Operator(O::Star) => UnaryOp::Deref,
            K::Operator(O::Plus) => UnaryOp::Plus,
            K::Operator(O::Minus) => UnaryOp::Minus,
            K::Operator(O::Tilde) => UnaryOp::BitNot,
            K::Operator(O::Bang) => UnaryOp::Not,
            K::Keyword(Kw::Sizeof) => return self.sizeof_like(NodeKind::SizeofExpr, NodeKind::SizeofType),
            K::Keyword(Kw::Alignof) => return self.sizeof_like(NodeKind::AlignofExpr, NodeKind::AlignofType),
            K::Keyword(Kw::Extension) => {
                self.bump();
                return self.cast_expression();
            }
            _ => return self.postfix_expression(),
        };
        self.bump();
        let operand = self.cast_expression()?;
        Ok(Node::with_children(NodeKind::Unary(op), loc, vec![operand]))
    }

    /// `sizeof` / `_Alignof`: a parenthesized type name or a unary expression.
    fn sizeof_like(&mut self, of_expr: NodeKind, of_type: NodeKind) -> PResult<Node> {
        let loc = self.bump().location.clone();
        if self.at_punct(P::LParen) && self.is_type_start(self.peek_nth(1)) {
            let open = self.bump().location.clone();
            let ty = self.type_name()?;
            self.expect_punct(P::RParen, "')'")?;
            if self.at_punct(P::LBrace) {
                let lit = self.compound_literal(open, ty)?;
                let operand = self.postfix_tail(lit)?;
                return Ok(Node::with_children(of_expr, loc, vec![operand]));
            }
            return Ok(Node::with_children(of_type, loc, vec![ty]));
        }
        let operand = self.unary_expression()?;
        Ok(Node::with_children(of_expr, loc, vec![operand]))
    }

    fn postfix_expression(&mut self) -> PResult<Node> {
        let base = self.primary_expression()?;
        self.postfix_tail(base)
    }

    fn postfix_tail(&mut self, mut base: Node) -> PResult<Node> {
        loop {
            let tok = self.peek();
            let loc = tok.location.clone();
            base = match tok.kind {
                K::Punct(P::LBracket) => {
                    self.bump();
                    let index = self.expression()?;
                    self.expect_punct(P::RBracket, "']'")?;
                    Node::with_children(NodeKind::Subscript, loc, vec![base, index])
                }
                K::Punct(P::LParen) => {
                    self.bump();
                    let mut call = Node::with_children(NodeKind::Call, loc, vec![base]);
                    if !self.at_punct(P::RParen) {
                        loop {
                            call.push(self.assignment_expression()?);
                            if !self.consume_punct(P::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect_punct(P::RParen, "')' after arguments")?;
                    call
                }
                K::Operator(op @ (O::Dot | O::Arrow)) => {
                    self.bump();
                    let member = self.expect_ident()?;
                    let kind = if op == O::Dot { NodeKind::Member } else { NodeKind::Arrow };
                    Node::with_children(kind, loc, vec![base]).payload(Payload::Name(member.lexeme.clone()))
                }
                K::Operator(O::Inc) => {
                    self.bump();
                    Node::with_children(NodeKind::Unary(UnaryOp::PostInc), loc, vec![base])
                }
                K::Operator(O::Dec) => {
                    self.bump();
                    Node::with_children(NodeKind::Unary(UnaryOp::PostDec), loc, vec![base])
                }
                _ => return Ok(base),
            };
        }
    }

    fn primary_expression(&mut self) -> PResult<Node> {
        let tok = self.peek();
        let loc = tok.location.clone();
        match tok.kind {
            K::Identifier => {
                if self.is_type_name(&tok.lexeme) {
                    return Err(self.error_at(loc, format!("unexpected type name '{}': expected expression", tok.lexeme)));
                }
                self.bump();
                Ok(Node::named(NodeKind::Identifier, loc, tok.lexeme.clone()))
            }
            K::Literal(LiteralKind::Int) => {
                self.bump();
                let payload = match tok.value {
                    TokenValue::Int { value, suffix } => Payload::Int { value, suffix },
                    _ => Payload::Int {
                        value: 0,
                        suffix: Default::default(),
                    },
                };
                Ok(Node::new(NodeKind::IntLiteral, loc).payload(payload))
            }
            K::Literal(LiteralKind::Float) => {
                self.bump();
                let payload = match tok.value {
                    TokenValue::Float { value, suffix } => Payload::Float { value, suffix },
                    _ => Payload::Float {
                        value: 0.0,
                        suffix: Default::default(),
                    },
                };
                Ok(Node::new(NodeKind::FloatLiteral, loc).payload(payload))
            }
            K::Literal(LiteralKind::Char) => {
                self.bump();
                let payload = match tok.value {
                    TokenValue::Char { value, prefix } => Payload::Char { value, prefix },
                    _ => Payload::Char {
                        value: 0,
                        prefix: CharPrefix::None,
                    },
                };
                Ok(Node::new(NodeKind::CharLiteral, loc).payload(payload))
            }
            K::Literal(LiteralKind::String) => self.string_literal(),
            K::Keyword(Kw::True) | K::Keyword(Kw::False) => {
                self.bump();
                Ok(Node::new(NodeKind::BoolLiteral, loc).payload(Payload::Flag(tok.is_keyword(Kw::True))))
            }
            K::Keyword(Kw::Nullptr) => {
                self.bump();
                Ok(Node::new(NodeKind::NullptrLiteral, loc))
            }
            K::Punct(P::LParen) if self.is_gnu() && self.peek_nth(1).is_punct(P::LBrace) => {
                self.bump();
                let body = self.compound_statement(true)?;
                self.expect_punct(P::RParen, "')' after statement expression")?;
                Ok(Node::with_children(NodeKind::StmtExpr, loc, vec![body]))
            }
            K::Punct(P::LParen) => {
                self.bump();
                let inner = self.expression()?;
                self.expect_punct(P::RParen, "')'")?;
                Ok(inner)
            }
            K::Keyword(Kw::Generic) => self.generic_selection(),
            K::Keyword(Kw::BuiltinVaArg) => {
                self.bump();
                self.expect_punct(P::LParen, "'(' after '__builtin_va_arg'")?;
                let list = self.assignment_expression()?;
                self.expect_punct(P::Comma, "','")?;
                let ty = self.type_name()?;
                self.expect_punct(P::RParen, "')'")?;
                Ok(Node::with_children(NodeKind::BuiltinVaArg, loc, vec![list, ty]))
            }
            K::Keyword(Kw::BuiltinOffsetof) => self.builtin_offsetof(),
            K::Keyword(Kw::BuiltinTypesCompatibleP) => {
                self.bump();
                self.expect_punct(P::LParen, "'(' after '__builtin_types_compatible_p'")?;
                let a = self.type_name()?;
                self.expect_punct(P::Comma, "','")?;
                let b = self.type_name()?;
                self.expect_punct(P::RParen, "')'")?;
                Ok(Node::with_children(NodeKind::BuiltinTypesCompatible, loc, vec![a, b]))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// One or more adjacent string literals, concatenated. A narrow piece adopts
    /// the encoding of a prefixed one; two different prefixes do not mix.
    pub(super) fn string_literal(&mut self) -> PResult<Node> {
        let loc = self.loc();
        if self.peek().kind != K::Literal(LiteralKind::String) {
            return Err(self.unexpected("string literal"));
        }
        let mut pieces: Vec<(&[u32], CharPrefix)> = Vec::new();
        let mut prefix = CharPrefix::None;
        while self.peek().kind == K::Literal(LiteralKind::String) {
            let tok = self.bump();
            let TokenValue::Str { units, prefix: p } = &tok.value else {
                continue;
            };
            if *p != CharPrefix::None {
                if prefix != CharPrefix::None && prefix != *p {
                    self.report(
                        tok.location.clone(),
                        "unsupported concatenation of string literals with different encodings",
                    );
                } else {
                    prefix = *p;
                }
            }
            pieces.push((units.as_slice(), *p));
        }
        let mut units = Vec::new();
        for (piece, from) in pieces {
            if from == CharPrefix::None && !prefix.is_narrow() {
                units.extend(widen(piece, prefix));
            } else {
                units.extend_from_slice(piece);
            }
        }
        Ok(Node::new(NodeKind::StringLiteral, loc).payload(Payload::Str { units, prefix }))
    }

    /// Text of a string literal sequence (asm templates and labels).
    pub(super) fn string_text(&mut self) -> PResult<String> {
        let node = self.string_literal()?;
        match node.payload {
            Payload::Str { units, prefix } => Ok(units_to_string(&units, prefix)),
            _ => Ok(String::new()),
        }
    }

    fn generic_selection(&mut self) -> PResult<Node> {
        let loc = self.bump().location.clone();
        self.expect_punct(P::LParen, "'(' after '_Generic'")?;
        let control = self.assignment_expression()?;
        let mut node = Node::with_children(NodeKind::GenericSelection, loc, vec![control]);
        self.expect_punct(P::Comma, "','")?;
        loop {
            let at = self.loc();
            let assoc = if self.consume_keyword(Kw::Default) {
                self.expect_punct(P::Colon, "':'")?;
                let value = self.assignment_expression()?;
                Node::with_children(NodeKind::GenericDefault, at, vec![value])
            } else {
                let ty = self.type_name()?;
                self.expect_punct(P::Colon, "':'")?;
                let value = self.assignment_expression()?;
                Node::with_children(NodeKind::GenericAssoc, at, vec![ty, value])
            };
            node.push(assoc);
            if !self.consume_punct(P::Comma) {
                break;
            }
        }
        self.expect_punct(P::RParen, "')'")?;
        Ok(node)
    }

    /// `__builtin_offsetof(type, member.designator[expr]...)`
    fn builtin_offsetof(&mut self) -> PResult<Node> {
        let loc = self.bump().location.clone();
        self.expect_punct(P::LParen, "'(' after '__builtin_offsetof'")?;
        let ty = self.type_name()?;
        self.expect_punct(P::Comma, "','")?;
        let mut node = Node::with_children(NodeKind::BuiltinOffsetof, loc, vec![ty]);
        let first = self.expect_ident()?;
        node.push(Node::named(NodeKind::FieldDesignator, first.location.clone(), first.lexeme.clone()));
        loop {
            if self.at_op(O::Dot) {
                self.bump();
                let field = self.expect_ident()?;
                node.push(Node::named(NodeKind::FieldDesignator, field.location.clone(), field.lexeme.clone()));
            } else if self.at_punct(P::LBracket) {
                let at = self.bump().location.clone();
                let index = self.expression()?;
                self.expect_punct(P::RBracket, "']'")?;
                node.push(Node::with_children(NodeKind::IndexDesignator, at, vec![index]));
            } else {
                break;
            }
        }
        self.expect_punct(P::RParen, "')'")?;
        Ok(node)
    }

    fn compound_literal(&mut self, loc: SourceLocation, ty: Node) -> PResult<Node> {
        let init = self.initializer_list()?;
        Ok(Node::with_children(NodeKind::CompoundLiteral, loc, vec![ty, init]))
    }

    pub(crate) fn initializer(&mut self) -> PResult<Node> {
        if self.at_punct(P::LBrace) {
            self.initializer_list()
        } else {
            self.assignment_expression()
        }
    }

    fn initializer_list(&mut self) -> PResult<Node> {
        self.nested(Self::initializer_list_inner)
    }

    fn initializer_list_inner(&mut self) -> PResult<Node> {
        let loc = self.expect_punct(P::LBrace, "'{'")?.location.clone();
        let mut list = Node::new(NodeKind::InitList, loc);
        while !self.at_punct(P::RBrace) {
            let item = self.initializer_item()?;
            list.push(item);
            if !self.consume_punct(P::Comma) {
                break;
            }
        }
        self.expect_punct(P::RBrace, "'}' after initializer list")?;
        Ok(list)
    }

    fn initializer_item(&mut self) -> PResult<Node> {
        let loc = self.loc();
        // GNU `field: value`
        if self.is_gnu() && self.peek().kind == K::Identifier && self.peek_nth(1).is_punct(P::Colon) {
            let field = self.bump();
            self.bump();
            let value = self.initializer()?;
            let designator = Node::named(NodeKind::FieldDesignator, field.location.clone(), field.lexeme.clone());
            return Ok(Node::with_children(NodeKind::Designation, loc, vec![designator, value]));
        }
        let mut parts = Vec::new();
        loop {
            if self.at_op(O::Dot) {
                self.bump();
                let field = self.expect_ident()?;
                parts.push(Node::named(NodeKind::FieldDesignator, field.location.clone(), field.lexeme.clone()));
            } else if self.at_punct(P::LBracket) {
                let at = self.bump().location.clone();
                let low = self.conditional_expression()?;
                let designator = if self.consume_punct(P::Ellipsis) {
                    let high = self.conditional_expression()?;
                    Node::with_children(NodeKind::RangeDesignator, at, vec![low, high])
                } else {
                    Node::with_children(NodeKind::IndexDesignator, at, vec![low])
                };
                self.expect_punct(P::RBracket, "']'")?;
                parts.push(designator);
            } else {
                break;
            }
        }
        if parts.is_empty() {
            return self.initializer();
        }
        self.expect_op(O::Assign, "'=' after designator")?;
        parts.push(self.initializer()?);
        Ok(Node::with_children(NodeKind::Designation, loc, parts))
    }
}

/// Re-encode narrow string bytes for a wide literal.
fn widen(bytes: &[u32], to: CharPrefix) -> Vec<u32> {
    let text = units_to_string(bytes, CharPrefix::None);
    match to {
        CharPrefix::Utf16 => text.encode_utf16().map(u32::from).collect(),
        _ => text.chars().map(u32::from).collect(),
    }
}
