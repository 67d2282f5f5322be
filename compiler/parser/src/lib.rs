//! The parser: a recursive descent over tokens with panic-mode error recovery.

use ast::{
    Assignment, AssignmentOp, ArrayAllocation, BareDecl, BareExpr, BareParam, BareStmt, BareTy,
    Binary, BinaryOp, Block, Call, Decl, Expr, Extent, Function, Ident, Index, LocalBinding,
    Param, Params, Program, Scalar, Stmt, Ty, Unary, UnaryOp, While,
};
use base::{Expectation, Parser};
use diagnostics::{
    error::{Outcome, Result},
    Code, Diagnostic, Reporter,
};
use lexer::token::{BareToken, Token, TokenName};
use span::Spanned;

mod base;
#[cfg(test)]
mod test;

/// Parse a token stream into a [`Program`].
///
/// The resulting program is complete except for subtrees dropped during error
/// recovery; the outcome is tainted iff at least one diagnostic was reported.
pub fn parse(tokens: Vec<Token>, reporter: &Reporter) -> Outcome<Program> {
    let mut parser = Parser::new(tokens, reporter);
    let program = parser.parse_program();
    Outcome::new(program, parser.health)
}

impl Parser<'_> {
    fn parse_program(&mut self) -> Program {
        use TokenName::*;

        let mut decls = Vec::new();

        loop {
            match self.name() {
                EndOfInput => break,
                Fn => match self.parse_function_decl() {
                    Ok(decl) => decls.push(decl),
                    Err(error) => {
                        self.health.taint(error);
                        self.synchronize_top_level();
                    }
                },
                _ => {
                    let error = Diagnostic::error()
                        .code(Code::E103)
                        .message(format!(
                            "found {} but expected a function declaration",
                            self.token(),
                        ))
                        .primary_span(self.span())
                        .report(self.reporter);
                    self.health.taint(error);
                    self.synchronize_top_level();
                }
            }
        }

        Program { decls }
    }

    /// Finish parsing a function declaration: `'fn' type IDENT '(' params? ')' block`.
    fn parse_function_decl(&mut self) -> Result<Decl> {
        use TokenName::*;

        let mut span = self.expect(Fn)?;
        let ty = self.parse_ty()?;
        let binder = self.parse_word()?;
        self.expect(OpeningRoundBracket)?;

        let mut params = Params::new();
        if self.name() != ClosingRoundBracket {
            loop {
                params.push(self.parse_param()?);
                if !self.consume(Comma) {
                    break;
                }
            }
        }
        self.expect(ClosingRoundBracket)?;

        let body = self.parse_block()?;
        span.merging(&body);

        Ok(Decl::new(span, BareDecl::Function(Box::new(Function { binder, ty, params, body }))))
    }

    /// Parse a parameter: `IDENT ':' type`.
    fn parse_param(&mut self) -> Result<Param> {
        let binder = self.parse_word()?;
        let mut span = binder.span;
        self.expect(TokenName::Colon)?;
        let ty = self.parse_ty()?;
        span.merging(&ty);

        Ok(Param::new(span, BareParam { binder, ty }))
    }

    /// Parse a type: `scalar ('[' NUMBER? ']')?`.
    fn parse_ty(&mut self) -> Result<Ty> {
        use TokenName::*;

        let scalar = match self.name() {
            Int => Scalar::Int,
            Float => Scalar::Float,
            Bool => Scalar::Bool,
            Str => Scalar::Text,
            Void => Scalar::Void,
            _ => {
                self.expected(Expectation::Ty);
                return self.error();
            }
        };
        let mut span = self.span();
        self.advance();

        let mut extent = None;
        if self.name() == OpeningSquareBracket {
            self.advance();

            extent = Some(match self.token() {
                BareToken::NumberLiteral(number) => {
                    let length = self.parse_array_length(*number)?;
                    self.advance();
                    Extent::Fixed(length)
                }
                _ => Extent::Dynamic,
            });
            span.merging(self.expect(ClosingSquareBracket)?);
        }

        Ok(Ty::new(span, BareTy { scalar, extent }))
    }

    fn parse_array_length(&self, number: utility::Atom) -> Result<u32> {
        number.to_str().parse().map_err(|_| {
            Diagnostic::error()
                .code(Code::E100)
                .message(format!("‘{number}’ is not a valid array length"))
                .primary_span(self.span())
                .report(self.reporter)
        })
    }

    fn parse_word(&mut self) -> Result<Ident> {
        match self.token() {
            BareToken::Word(word) => {
                let ident = Ident::new(self.span(), *word);
                self.advance();
                Ok(ident)
            }
            _ => {
                self.expected(TokenName::Word);
                self.error()
            }
        }
    }

    /// Parse a block: `'{' statement* '}'`.
    ///
    /// Erroneous statements are dropped after reporting; the cursor
    /// resynchronizes inside the block.
    fn parse_block(&mut self) -> Result<Block> {
        use TokenName::*;

        let mut span = self.expect(OpeningCurlyBracket)?;
        let mut stmts = Vec::new();

        loop {
            match self.name() {
                ClosingCurlyBracket => {
                    span.merging(self.span());
                    self.advance();
                    break;
                }
                EndOfInput => {
                    self.expected(ClosingCurlyBracket);
                    return self.error();
                }
                _ => match self.parse_statement() {
                    Ok(stmt) => stmts.push(stmt),
                    Err(error) => {
                        self.health.taint(error);
                        self.synchronize();
                    }
                },
            }
        }

        Ok(Block::new(span, stmts))
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        use TokenName::*;

        match self.name() {
            Var => self.parse_local_binding(),
            If => self.parse_if_statement(),
            While => self.parse_while_statement(),
            Return => self.parse_return_statement(),
            OpeningCurlyBracket => {
                let block = self.parse_block()?;
                Ok(Stmt::new(block.span, BareStmt::Block(block.bare)))
            }
            _ => {
                let expr = self.parse_expression()?;
                let mut span = expr.span;
                span.merging(self.expect(Semicolon)?);
                Ok(Stmt::new(span, BareStmt::Expr(expr)))
            }
        }
    }

    /// Finish parsing a variable declaration:
    /// `'var' IDENT ':' type ('=' expression)? ';'`.
    fn parse_local_binding(&mut self) -> Result<Stmt> {
        use TokenName::*;

        let mut span = self.expect(Var)?;
        let binder = self.parse_word()?;
        self.expect(Colon)?;
        let ty = self.parse_ty()?;

        if ty.bare == BareTy::scalar(Scalar::Void) {
            let error = Diagnostic::error()
                .code(Code::E102)
                .message(format!("variable ‘{}’ cannot have type ‘void’", binder.bare))
                .primary_span(ty.span)
                .report(self.reporter);
            return Err(error);
        }

        let initializer = if self.consume(Equals) { Some(self.parse_expression()?) } else { None };
        span.merging(self.expect(Semicolon)?);

        Ok(Stmt::new(span, BareStmt::Var(Box::new(LocalBinding { binder, ty, initializer }))))
    }

    /// Finish parsing an if statement:
    /// `'if' expression block ('else' (ifStatement | block))?`.
    fn parse_if_statement(&mut self) -> Result<Stmt> {
        use TokenName::*;

        let mut span = self.expect(If)?;
        let condition = self.parse_expression()?;
        let consequent = self.parse_block()?;
        span.merging(&consequent);

        let alternate = if self.consume(Else) {
            let alternate = if self.name() == If {
                self.parse_if_statement()?
            } else {
                let block = self.parse_block()?;
                Stmt::new(block.span, BareStmt::Block(block.bare))
            };
            span.merging(&alternate);
            Some(alternate)
        } else {
            None
        };

        Ok(Stmt::new(
            span,
            BareStmt::If(Box::new(ast::If { condition, consequent, alternate })),
        ))
    }

    /// Finish parsing a while statement: `'while' expression block`.
    fn parse_while_statement(&mut self) -> Result<Stmt> {
        let mut span = self.expect(TokenName::While)?;
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        span.merging(&body);

        Ok(Stmt::new(span, BareStmt::While(Box::new(While { condition, body }))))
    }

    /// Finish parsing a return statement: `'return' expression? ';'`.
    fn parse_return_statement(&mut self) -> Result<Stmt> {
        use TokenName::*;

        let mut span = self.expect(Return)?;
        let value = if self.name() != Semicolon { Some(self.parse_expression()?) } else { None };
        span.merging(self.expect(Semicolon)?);

        Ok(Stmt::new(span, BareStmt::Return(value)))
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_assignment()
    }

    /// Parse an assignment. Right-associative; the target has to be a binding
    /// or an array access.
    fn parse_assignment(&mut self) -> Result<Expr> {
        use TokenName::*;

        let target = self.parse_logical_or()?;

        let op = match self.name() {
            Equals => AssignmentOp::Plain,
            PlusEquals => AssignmentOp::Add,
            MinusEquals => AssignmentOp::Subtract,
            AsteriskEquals => AssignmentOp::Multiply,
            SlashEquals => AssignmentOp::Divide,
            _ => return Ok(target),
        };
        let op = Spanned::new(self.span(), op);
        self.advance();

        if !matches!(target.bare, BareExpr::Binding(_) | BareExpr::Index(_)) {
            let error = Diagnostic::error()
                .code(Code::E101)
                .message("invalid assignment target")
                .primary_span(op.span)
                .labeled_secondary_span(target.span, "cannot be assigned to")
                .report(self.reporter);
            return Err(error);
        }

        let value = self.parse_assignment()?;
        let span = target.span.merge(&value);

        Ok(Expr::new(span, BareExpr::Assignment(Box::new(Assignment { target, op, value }))))
    }

    fn parse_logical_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_logical_and()?;

        while self.name() == TokenName::DoublePipe {
            let op = Spanned::new(self.span(), BinaryOp::Or);
            self.advance();
            let rhs = self.parse_logical_and()?;
            lhs = binary(lhs, op, rhs);
        }

        Ok(lhs)
    }

    fn parse_logical_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_equality()?;

        while self.name() == TokenName::DoubleAmpersand {
            let op = Spanned::new(self.span(), BinaryOp::And);
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = binary(lhs, op, rhs);
        }

        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        use TokenName::*;

        let mut lhs = self.parse_comparison()?;

        loop {
            let op = match self.name() {
                DoubleEquals => BinaryOp::Equal,
                BangEquals => BinaryOp::NotEqual,
                _ => break,
            };
            let op = Spanned::new(self.span(), op);
            self.advance();
            let rhs = self.parse_comparison()?;
            lhs = binary(lhs, op, rhs);
        }

        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        use TokenName::*;

        let mut lhs = self.parse_term()?;

        loop {
            let op = match self.name() {
                Less => BinaryOp::Less,
                LessEquals => BinaryOp::LessEqual,
                Greater => BinaryOp::Greater,
                GreaterEquals => BinaryOp::GreaterEqual,
                _ => break,
            };
            let op = Spanned::new(self.span(), op);
            self.advance();
            let rhs = self.parse_term()?;
            lhs = binary(lhs, op, rhs);
        }

        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        use TokenName::*;

        let mut lhs = self.parse_factor()?;

        loop {
            let op = match self.name() {
                Plus => BinaryOp::Add,
                Minus => BinaryOp::Subtract,
                _ => break,
            };
            let op = Spanned::new(self.span(), op);
            self.advance();
            let rhs = self.parse_factor()?;
            lhs = binary(lhs, op, rhs);
        }

        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        use TokenName::*;

        let mut lhs = self.parse_unary()?;

        loop {
            let op = match self.name() {
                Asterisk => BinaryOp::Multiply,
                Slash => BinaryOp::Divide,
                _ => break,
            };
            let op = Spanned::new(self.span(), op);
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(lhs, op, rhs);
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        use TokenName::*;

        let op = match self.name() {
            Minus => UnaryOp::Negate,
            Bang => UnaryOp::Not,
            _ => return self.parse_call(),
        };
        let op = Spanned::new(self.span(), op);
        self.advance();

        let operand = self.parse_unary()?;
        let span = op.span.merge(&operand);

        Ok(Expr::new(span, BareExpr::Unary(Box::new(Unary { op, operand }))))
    }

    /// Parse a call-level expression: a primary followed by any number of
    /// argument lists and index brackets.
    fn parse_call(&mut self) -> Result<Expr> {
        use TokenName::*;

        let mut expr = self.parse_primary()?;

        loop {
            match self.name() {
                OpeningRoundBracket => {
                    let BareExpr::Binding(callee) = expr.bare else {
                        let error = Diagnostic::error()
                            .code(Code::E104)
                            .message("only named functions can be called")
                            .primary_span(self.span())
                            .labeled_secondary_span(expr.span, "not a function name")
                            .report(self.reporter);
                        return Err(error);
                    };
                    let callee = Ident::new(expr.span, callee);
                    self.advance();

                    let mut args = Vec::new();
                    if self.name() != ClosingRoundBracket {
                        loop {
                            args.push(self.parse_expression()?);
                            if !self.consume(Comma) {
                                break;
                            }
                        }
                    }
                    let mut span = expr.span;
                    span.merging(self.expect(ClosingRoundBracket)?);

                    expr = Expr::new(span, BareExpr::Call(Box::new(Call { callee, args })));
                }
                OpeningSquareBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let mut span = expr.span;
                    span.merging(self.expect(ClosingSquareBracket)?);

                    expr = Expr::new(span, BareExpr::Index(Box::new(Index { base: expr, index })));
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        use TokenName::*;

        match self.token() {
            BareToken::NumberLiteral(number) => {
                let expr = Expr::new(self.span(), BareExpr::NumberLiteral(*number));
                self.advance();
                Ok(expr)
            }
            BareToken::FloatLiteral(number) => {
                let expr = Expr::new(self.span(), BareExpr::FloatLiteral(*number));
                self.advance();
                Ok(expr)
            }
            BareToken::TextLiteral(text) => {
                let expr = Expr::new(self.span(), BareExpr::TextLiteral(*text));
                self.advance();
                Ok(expr)
            }
            BareToken::True | BareToken::False => {
                let value = self.name() == True;
                let expr = Expr::new(self.span(), BareExpr::BoolLiteral(value));
                self.advance();
                Ok(expr)
            }
            BareToken::Word(word) => {
                let expr = Expr::new(self.span(), BareExpr::Binding(*word));
                self.advance();
                Ok(expr)
            }
            BareToken::OpeningRoundBracket => {
                let mut span = self.span();
                self.advance();
                let mut expr = self.parse_expression()?;
                span.merging(self.expect(ClosingRoundBracket)?);
                expr.span = span;
                Ok(expr)
            }
            BareToken::OpeningCurlyBracket => {
                let mut span = self.span();
                self.advance();

                let mut elements = Vec::new();
                if self.name() != ClosingCurlyBracket {
                    loop {
                        elements.push(self.parse_expression()?);
                        if !self.consume(Comma) {
                            break;
                        }
                    }
                }
                span.merging(self.expect(ClosingCurlyBracket)?);

                Ok(Expr::new(span, BareExpr::ArrayLiteral(elements)))
            }
            BareToken::Int | BareToken::Float | BareToken::Bool | BareToken::Str
            | BareToken::Void => self.parse_ty_expression(),
            _ => {
                self.expected(Expectation::Expr);
                self.error()
            }
        }
    }

    /// Parse a type in expression position: either a [type reference](BareExpr::TypeRef)
    /// (`int`, `str[]`) or an [array allocation](BareExpr::ArrayAllocation) (`int[n]`).
    fn parse_ty_expression(&mut self) -> Result<Expr> {
        use TokenName::*;

        let scalar = match self.name() {
            Int => Scalar::Int,
            Float => Scalar::Float,
            Bool => Scalar::Bool,
            Str => Scalar::Text,
            Void => Scalar::Void,
            _ => unreachable!(),
        };
        let mut span = self.span();
        let scalar_span = span;
        self.advance();

        if self.name() != OpeningSquareBracket {
            return Ok(Expr::new(span, BareExpr::TypeRef(Ty::new(span, BareTy::scalar(scalar)))));
        }
        self.advance();

        if self.name() == ClosingSquareBracket {
            span.merging(self.span());
            self.advance();
            let ty = Ty::new(span, BareTy::array(scalar, Extent::Dynamic));
            return Ok(Expr::new(span, BareExpr::TypeRef(ty)));
        }

        let length = self.parse_expression()?;
        span.merging(self.expect(ClosingSquareBracket)?);

        Ok(Expr::new(
            span,
            BareExpr::ArrayAllocation(Box::new(ArrayAllocation {
                element: Ty::new(scalar_span, BareTy::scalar(scalar)),
                length,
            })),
        ))
    }

    /// Panic-mode resynchronization: skip to right after the next `;` or to the
    /// next token that can begin a statement. Always makes progress.
    fn synchronize(&mut self) {
        use TokenName::*;

        if self.name() != EndOfInput {
            let was_semicolon = self.name() == Semicolon;
            self.advance();
            if was_semicolon {
                return;
            }
        }

        loop {
            match self.name() {
                EndOfInput => return,
                Semicolon => {
                    self.advance();
                    return;
                }
                Fn | Var | If | While | Return | OpeningCurlyBracket | ClosingCurlyBracket => {
                    return
                }
                _ => self.advance(),
            }
        }
    }

    /// Skip to the next function declaration. Always makes progress relative to
    /// the failed declaration.
    fn synchronize_top_level(&mut self) {
        use TokenName::*;

        loop {
            match self.name() {
                EndOfInput | Fn => return,
                _ => self.advance(),
            }
        }
    }
}

fn binary(lhs: Expr, op: Spanned<BinaryOp>, rhs: Expr) -> Expr {
    let span = lhs.span.merge(&rhs);
    Expr::new(span, BareExpr::Binary(Box::new(Binary { op, lhs, rhs })))
}
