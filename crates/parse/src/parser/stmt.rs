use lex::{Keyword as Kw, Operator as O, Punctuator as P, TokenKind as K};

use super::{group, PResult, Parser};
use crate::ast::*;

impl<'a> Parser<'a> {
    /// `{ block-item* }`. `new_scope` is false for function bodies, whose scope
    /// already holds the parameters.
    pub(crate) fn compound_statement(&mut self, new_scope: bool) -> PResult<Node> {
        let loc = self.expect_punct(P::LBrace, "'{'")?.location.clone();
        if new_scope {
            self.scopes.enter_scope();
        }
        let mut items = Vec::new();
        while !self.at_punct(P::RBrace) && !self.cur.is_eof() {
            let start = self.cur.position();
            if self.block_item(&mut items).is_err() {
                self.recover(start);
            }
        }
        if new_scope {
            self.scopes.exit_scope();
        }
        self.expect_punct(P::RBrace, "'}'")?;
        Ok(Node::with_children(NodeKind::Compound, loc, items))
    }

    fn block_item(&mut self, out: &mut Vec<Node>) -> PResult<()> {
        if self.starts_declaration() {
            return self.block_declaration(out);
        }
        let stmt = self.statement()?;
        out.push(stmt);
        Ok(())
    }

    pub(crate) fn statement(&mut self) -> PResult<Node> {
        self.nested(Self::statement_inner)
    }

    fn statement_inner(&mut self) -> PResult<Node> {
        self.skip_attributes()?;
        let tok = self.peek();
        let loc = tok.location.clone();
        match tok.kind {
            K::Punct(P::LBrace) => self.compound_statement(true),
            K::Punct(P::Semicolon) => {
                self.bump();
                Ok(Node::new(NodeKind::Empty, loc))
            }
            K::Keyword(Kw::If) => self.if_statement(),
            K::Keyword(Kw::While) => {
                self.bump();
                let cond = self.paren_condition("while")?;
                let body = self.statement()?;
                Ok(Node::with_children(NodeKind::While, loc, vec![cond, body]))
            }
            K::Keyword(Kw::Do) => {
                self.bump();
                let body = self.statement()?;
                if !self.consume_keyword(Kw::While) {
                    return Err(self.unexpected("'while' in do/while loop"));
                }
                let cond = self.paren_condition("while")?;
                self.expect_punct(P::Semicolon, "';' after do/while statement")?;
                Ok(Node::with_children(NodeKind::DoWhile, loc, vec![body, cond]))
            }
            K::Keyword(Kw::For) => {
                self.bump();
                self.scopes.enter_scope();
                let result = self.for_statement(loc);
                self.scopes.exit_scope();
                result
            }
            K::Keyword(Kw::Switch) => {
                self.bump();
                let cond = self.paren_condition("switch")?;
                let body = self.statement()?;
                Ok(Node::with_children(NodeKind::Switch, loc, vec![cond, body]))
            }
            K::Keyword(Kw::Case) => {
                self.bump();
                let mut node = Node::with_children(NodeKind::Case, loc, vec![self.conditional_expression()?]);
                if self.is_gnu() && self.consume_punct(P::Ellipsis) {
                    node.push(self.conditional_expression()?);
                }
                self.expect_punct(P::Colon, "':' after 'case'")?;
                node.push(self.label_body()?);
                Ok(node)
            }
            K::Keyword(Kw::Default) => {
                self.bump();
                self.expect_punct(P::Colon, "':' after 'default'")?;
                let body = self.label_body()?;
                Ok(Node::with_children(NodeKind::Default, loc, vec![body]))
            }
            K::Keyword(Kw::Return) => {
                self.bump();
                let mut node = Node::new(NodeKind::Return, loc);
                if !self.at_punct(P::Semicolon) {
                    node.push(self.expression()?);
                }
                self.expect_punct(P::Semicolon, "';' after return statement")?;
                Ok(node)
            }
            K::Keyword(Kw::Break) | K::Keyword(Kw::Continue) => {
                self.bump();
                let kind = if tok.is_keyword(Kw::Break) {
                    NodeKind::Break
                } else {
                    NodeKind::Continue
                };
                self.expect_punct(P::Semicolon, &format!("';' after {}", tok))?;
                Ok(Node::new(kind, loc))
            }
            K::Keyword(Kw::Goto) => {
                self.bump();
                let node = if self.is_gnu() && self.consume_op(O::Star) {
                    Node::with_children(NodeKind::IndirectGoto, loc, vec![self.expression()?])
                } else {
                    let label = self.expect_ident()?;
                    Node::named(NodeKind::Goto, loc, label.lexeme.clone())
                };
                self.expect_punct(P::Semicolon, "';' after goto statement")?;
                Ok(node)
            }
            K::Keyword(Kw::Asm) => self.asm_statement(),
            K::Identifier if self.peek_nth(1).is_punct(P::Colon) => {
                self.bump();
                self.bump();
                self.skip_attributes()?;
                let body = self.label_body()?;
                Ok(Node::with_children(NodeKind::Labeled, loc, vec![body]).payload(Payload::Name(tok.lexeme.clone())))
            }
            _ => {
                let expr = self.expression()?;
                self.expect_punct(P::Semicolon, "';' after expression")?;
                Ok(Node::with_children(NodeKind::ExprStmt, loc, vec![expr]))
            }
        }
    }

    fn paren_condition(&mut self, after: &str) -> PResult<Node> {
        self.expect_punct(P::LParen, &format!("'(' after '{}'", after))?;
        let cond = self.expression()?;
        self.expect_punct(P::RParen, "')'")?;
        Ok(cond)
    }

    fn if_statement(&mut self) -> PResult<Node> {
        let loc = self.bump().location.clone();
        let cond = self.paren_condition("if")?;
        let then = self.statement()?;
        let mut node = Node::with_children(NodeKind::If, loc, vec![cond, then]);
        // `else` binds to the nearest `if`
        if self.consume_keyword(Kw::Else) {
            node.push(self.statement()?);
        }
        Ok(node)
    }

    /// After `for`; runs inside the loop's own scope.
    fn for_statement(&mut self, loc: lex::SourceLocation) -> PResult<Node> {
        self.expect_punct(P::LParen, "'(' after 'for'")?;
        let init = if self.at_punct(P::Semicolon) {
            let at = self.bump().location.clone();
            Node::new(NodeKind::Empty, at)
        } else if self.starts_declaration() {
            self.for_declaration()?
        } else {
            let e = self.expression()?;
            self.expect_punct(P::Semicolon, "';' in 'for' statement")?;
            e
        };
        let cond = if self.at_punct(P::Semicolon) {
            Node::new(NodeKind::Empty, self.loc())
        } else {
            self.expression()?
        };
        self.expect_punct(P::Semicolon, "';' in 'for' statement")?;
        let step = if self.at_punct(P::RParen) {
            Node::new(NodeKind::Empty, self.loc())
        } else {
            self.expression()?
        };
        self.expect_punct(P::RParen, "')'")?;
        let body = self.statement()?;
        Ok(Node::with_children(NodeKind::For, loc, vec![init, cond, step, body]))
    }

    /// What follows a label. A label may end a block or precede a declaration.
    fn label_body(&mut self) -> PResult<Node> {
        let loc = self.loc();
        if self.at_punct(P::RBrace) {
            return Ok(Node::new(NodeKind::Empty, loc));
        }
        if self.starts_declaration() {
            let mut decls = Vec::new();
            self.block_declaration(&mut decls)?;
            return Ok(group(loc, decls));
        }
        self.statement()
    }

    /// GNU `asm [volatile|inline|goto] ("template" : outputs : inputs : clobbers : labels);`
    /// Operand expressions become children; the template is the payload.
    pub(crate) fn asm_statement(&mut self) -> PResult<Node> {
        let loc = self.bump().location.clone();
        while matches!(self.peek().kind, K::Keyword(Kw::Volatile | Kw::Inline | Kw::Goto)) {
            self.bump();
        }
        self.expect_punct(P::LParen, "'(' after 'asm'")?;
        let template = self.string_text()?;
        let mut node = Node::named(NodeKind::Asm, loc, template);
        let mut section = 0;
        while self.consume_punct(P::Colon) {
            section += 1;
            if self.at_punct(P::Colon) || self.at_punct(P::RParen) {
                continue;
            }
            loop {
                match section {
                    1 | 2 => {
                        if self.consume_punct(P::LBracket) {
                            self.expect_ident()?;
                            self.expect_punct(P::RBracket, "']'")?;
                        }
                        self.string_literal()?;
                        self.expect_punct(P::LParen, "'(' before asm operand")?;
                        node.push(self.expression()?);
                        self.expect_punct(P::RParen, "')'")?;
                    }
                    3 => {
                        self.string_literal()?;
                    }
                    _ => {
                        self.expect_ident()?;
                    }
                }
                if !self.consume_punct(P::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(P::RParen, "')' after asm")?;
        self.expect_punct(P::Semicolon, "';' after asm")?;
        Ok(node)
    }
}
