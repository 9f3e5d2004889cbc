//! Parser: filtered token stream → AST.
//!
//! A hand-written recursive-descent parser with one level per precedence
//! tier. Precedence, low to high: sequence (`;`/newline) — assignment
//! (`=`, `:=`, right associative) — logical or — logical and — comparison —
//! additive — multiplicative — unary prefix — function call.
//!
//! The parser also carries the duties of the original grammar's extension
//! layer:
//!
//! - `op⟨name⟩(a, b, c)` operator-call syntax folds into a binary chain,
//!   left-associative except for the right-associative assignments;
//! - omitted pieces get their defaults: an omitted type annotation becomes
//!   the `infer` type symbol, an omitted storage duration is `local`,
//!   `var` is `val` plus the `mut` qualifier;
//! - [`wrap_in_main`] wraps a top-level program into the implicit `main`
//!   function returning `int`.
//!
//! Block-introducing forms accept an optional terminator: `$`, or `end`
//! followed by an optional tag naming what ends.
//!
//! Parse errors are reported as `eSyntax` and abort parsing; there is no
//! recovery.

use veld_base::{Interner, Span, Symbol};

use crate::ast::{DataDef, Expr, ExprKind, FunDef, Op, TypeExpr, TypeExprKind, TypeName};
use crate::diag::{BuildInterrupt, ErrorKind, ErrorLog, PassResult};
use crate::object::StorageDuration;
use crate::token::{Token, TokenKind};
use crate::types::{FundaType, Qualifiers};

/// Parses a filtered token stream into the raw AST, *without* the implicit
/// `main` wrapper (the driver adds it via [`wrap_in_main`]).
pub fn parse(tokens: &[Token], log: &mut ErrorLog) -> PassResult<Expr> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        log,
    };
    if parser.check(&TokenKind::Eof) {
        return Ok(Expr::nop(Span::point(0)));
    }
    let expr = parser.parse_seq()?;
    parser.expect(TokenKind::Eof, "end of file")?;
    Ok(expr)
}

/// Wraps a top-level program into `fun main: () int = (body)`.
///
/// The body gets its own block so top-level definitions live in a scope of
/// their own rather than in the global one.
pub fn wrap_in_main(body: Expr, interner: &mut Interner) -> Expr {
    let span = body.span;
    let block = Expr::new(
        ExprKind::Block {
            body: Box::new(body),
            scope: None,
        },
        span,
    );
    Expr::new(
        ExprKind::FunDef(FunDef {
            name: interner.intern("main"),
            params: Vec::new(),
            ret_ty: TypeExpr::funda(FundaType::Int, span),
            body: Box::new(block),
            span,
            implicit: true,
            scope: None,
            object: None,
        }),
        span,
    )
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    log: &'a mut ErrorLog,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> Token {
        let token = *self.peek();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PassResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            self.fail(format!(
                "expected {what}, found {}",
                self.peek_kind().describe()
            ))
        }
    }

    fn fail<T>(&mut self, message: String) -> PassResult<T> {
        let span = self.peek().span;
        self.log.report(ErrorKind::Syntax, Some(span), message)?;
        // reached only when eSyntax is masked; parsing cannot continue
        Err(BuildInterrupt::Errors)
    }

    // ---- precedence tiers -------------------------------------------------

    fn parse_seq(&mut self) -> PassResult<Expr> {
        let first = self.parse_expr()?;
        let mut operands = vec![first];
        while self.eat(&TokenKind::Semicolon) || self.eat(&TokenKind::Newline) {
            if matches!(
                self.peek_kind(),
                TokenKind::RParen | TokenKind::Eof | TokenKind::Dollar
            ) {
                break;
            }
            operands.push(self.parse_expr()?);
        }
        if operands.len() == 1 {
            Ok(operands.pop().expect("one operand"))
        } else {
            let span = operands
                .first()
                .expect("nonempty")
                .span
                .merge(operands.last().expect("nonempty").span);
            Ok(Expr::new(ExprKind::Seq { operands }, span))
        }
    }

    fn parse_expr(&mut self) -> PassResult<Expr> {
        let lhs = self.parse_or()?;
        let op = match self.peek_kind() {
            TokenKind::Assign => Op::Assign,
            TokenKind::RefAssign => Op::RefAssign,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_expr()?; // right associative
        Ok(binary(op, lhs, rhs))
    }

    fn parse_or(&mut self) -> PassResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.eat(&TokenKind::PipePipe) {
            let rhs = self.parse_and()?;
            lhs = binary(Op::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> PassResult<Expr> {
        let mut lhs = self.parse_comparison()?;
        while self.eat(&TokenKind::AmpAmp) {
            let rhs = self.parse_comparison()?;
            lhs = binary(Op::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> PassResult<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => Op::EqualTo,
                TokenKind::NotEq => Op::NotEqualTo,
                TokenKind::Lt => Op::Less,
                TokenKind::LtEq => Op::LessEq,
                TokenKind::Gt => Op::Greater,
                TokenKind::GtEq => Op::GreaterEq,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_additive(&mut self) -> PassResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => Op::Add,
                TokenKind::Minus => Op::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> PassResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => Op::Mul,
                TokenKind::Slash => Op::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> PassResult<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Bang => Op::Not,
            TokenKind::Minus => Op::Sub,
            TokenKind::Plus => Op::Add,
            TokenKind::Amp => Op::AddrOf,
            TokenKind::Star => Op::Deref,
            _ => return self.parse_postfix(),
        };
        let start = self.advance().span;
        let operand = self.parse_unary()?; // prefix operators are right associative
        let span = start.merge(operand.span);
        Ok(Expr::new(
            ExprKind::Operator {
                op,
                args: vec![operand],
            },
            span,
        ))
    }

    fn parse_postfix(&mut self) -> PassResult<Expr> {
        let mut expr = self.parse_primary()?;
        while self.check(&TokenKind::LParen) {
            self.advance();
            let args = self.parse_call_args()?;
            let close = self.expect(TokenKind::RParen, "`)` after call arguments")?;
            let span = expr.span.merge(close.span);
            expr = Expr::new(
                ExprKind::Call {
                    callee: Box::new(expr),
                    args,
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> PassResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            if self.check(&TokenKind::RParen) {
                break; // trailing comma
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> PassResult<Expr> {
        match *self.peek_kind() {
            TokenKind::Number { value, ty } => {
                let span = self.advance().span;
                Ok(Expr::number(value, ty, span))
            }
            TokenKind::Nop => {
                let span = self.advance().span;
                Ok(Expr::nop(span))
            }
            TokenKind::Ident(name) => {
                let span = self.advance().span;
                Ok(Expr::new(ExprKind::Symbol { name }, span))
            }
            TokenKind::Funda(ty) => self.parse_cast(ty),
            TokenKind::OpName(op) => self.parse_op_call(op),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_seq()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Val => self.parse_data_def(false),
            TokenKind::Var => self.parse_data_def(true),
            TokenKind::Fun => self.parse_fun_def(),
            TokenKind::Return => self.parse_return(),
            _ => self.fail(format!(
                "expected an expression, found {}",
                self.peek_kind().describe()
            )),
        }
    }

    /// `int(expr)` — cast in constructor-call notation.
    fn parse_cast(&mut self, ty: FundaType) -> PassResult<Expr> {
        let ty_span = self.advance().span;
        self.expect(TokenKind::LParen, "`(` after type name")?;
        let arg = self.parse_expr()?;
        let close = self.expect(TokenKind::RParen, "`)` after cast argument")?;
        let span = ty_span.merge(close.span);
        Ok(Expr::new(
            ExprKind::Cast {
                ty: TypeExpr::funda(ty, ty_span),
                arg: Box::new(arg),
            },
            span,
        ))
    }

    /// `op+(a, b, c)` — operator in call syntax, folded into a chain.
    fn parse_op_call(&mut self, op: Op) -> PassResult<Expr> {
        let name_span = self.advance().span;
        self.expect(TokenKind::LParen, "`(` after operator name")?;
        let args = self.parse_call_args()?;
        let close = self.expect(TokenKind::RParen, "`)` after operator arguments")?;
        let span = name_span.merge(close.span);
        self.build_op_tree(op, args, span)
    }

    fn build_op_tree(&mut self, op: Op, mut args: Vec<Expr>, span: Span) -> PassResult<Expr> {
        if args.is_empty() {
            return self.fail(format!("operator `{}` needs arguments", op.symbol()));
        }
        if op.is_unary_only() {
            if args.len() != 1 {
                return self.fail(format!(
                    "operator `{}` takes exactly one argument",
                    op.symbol()
                ));
            }
            return Ok(Expr::new(ExprKind::Operator { op, args }, span));
        }
        if args.len() == 1 {
            // unary use of `+`/`-`; other binary operators need two operands
            if matches!(op, Op::Add | Op::Sub) {
                return Ok(Expr::new(ExprKind::Operator { op, args }, span));
            }
            return self.fail(format!(
                "operator `{}` takes at least two arguments",
                op.symbol()
            ));
        }
        if op.is_right_associative() {
            let mut tree = args.pop().expect("two or more args");
            while let Some(lhs) = args.pop() {
                tree = binary(op, lhs, tree);
            }
            Ok(tree)
        } else {
            let mut iter = args.into_iter();
            let mut tree = iter.next().expect("two or more args");
            for rhs in iter {
                tree = binary(op, tree, rhs);
            }
            Ok(tree)
        }
    }

    fn parse_if(&mut self) -> PassResult<Expr> {
        let start = self.advance().span;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Colon, "`:` after if condition")?;
        let then = self.parse_expr()?;

        let mut elifs = Vec::new();
        while self.eat(&TokenKind::Elif) {
            let elif_cond = self.parse_expr()?;
            self.expect(TokenKind::Colon, "`:` after elif condition")?;
            let elif_then = self.parse_expr()?;
            elifs.push((elif_cond, elif_then));
        }
        let mut els = if self.eat(&TokenKind::Else) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.eat_terminator(None);

        // elif chains nest as `if` in the else position, innermost first
        for (elif_cond, elif_then) in elifs.into_iter().rev() {
            let span = elif_cond.span.merge(
                els.as_ref().map_or(elif_then.span, |e| e.span),
            );
            els = Some(Expr::new(
                ExprKind::If {
                    cond: Box::new(elif_cond),
                    then: Box::new(elif_then),
                    els: els.map(Box::new),
                },
                span,
            ));
        }

        let end = els.as_ref().map_or(then.span, |e| e.span);
        Ok(Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then: Box::new(then),
                els: els.map(Box::new),
            },
            start.merge(end),
        ))
    }

    fn parse_while(&mut self) -> PassResult<Expr> {
        let start = self.advance().span;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Colon, "`:` after while condition")?;
        let body = self.parse_expr()?;
        self.eat_terminator(None);
        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::Loop {
                cond: Box::new(cond),
                body: Box::new(body),
            },
            span,
        ))
    }

    fn parse_return(&mut self) -> PassResult<Expr> {
        let start = self.advance().span;
        let value = if self.starts_expression() {
            self.parse_expr()?
        } else {
            Expr::nop(Span::point(start.end))
        };
        let span = start.merge(value.span);
        Ok(Expr::new(
            ExprKind::Return {
                value: Box::new(value),
            },
            span,
        ))
    }

    fn starts_expression(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Number { .. }
                | TokenKind::Ident(_)
                | TokenKind::Funda(_)
                | TokenKind::OpName(_)
                | TokenKind::LParen
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Val
                | TokenKind::Var
                | TokenKind::Fun
                | TokenKind::Return
                | TokenKind::Nop
                | TokenKind::Bang
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Amp
                | TokenKind::Star
        )
    }

    /// `val x : static mut int = 42 $` and friends. `var` adds `mut`.
    fn parse_data_def(&mut self, is_var: bool) -> PassResult<Expr> {
        let start = self.advance().span;
        let name_token = self.expect_ident("name of the definition")?;
        let (name, name_span) = name_token;

        let mut storage = StorageDuration::Local;
        let mut declared: Option<TypeExpr> = None;
        let mut inits: Vec<(Vec<Expr>, Span)> = Vec::new();
        let mut do_not_init = false;

        // constructor-call style initializer directly after the name
        if let Some(init) = self.try_parse_paren_init()? {
            inits.push(init);
        }
        if self.eat(&TokenKind::Colon) {
            if self.eat(&TokenKind::Static) {
                storage = StorageDuration::Static;
            }
            if self.starts_type() {
                declared = Some(self.parse_type_expr()?);
            }
        }
        if let Some(init) = self.try_parse_paren_init()? {
            inits.push(init);
        } else if self.eat(&TokenKind::Assign) {
            if self.eat(&TokenKind::Noinit) {
                do_not_init = true;
            } else {
                let value = self.parse_expr()?;
                let span = value.span;
                inits.push((vec![value], span));
            }
        }

        if inits.len() > 1 || (do_not_init && !inits.is_empty()) {
            let span = inits.last().map(|(_, s)| *s).unwrap_or(name_span);
            self.log.report(
                ErrorKind::MultipleInitializers,
                Some(span),
                "more than one initializer for one definition",
            )?;
            inits.truncate(1);
        }
        self.eat_terminator(Some(name));

        let quals = if is_var {
            Qualifiers::MUT
        } else {
            Qualifiers::NONE
        };
        let base = declared.unwrap_or_else(|| TypeExpr::infer(name_span));
        let declared_ty = if quals.is_empty() {
            base
        } else {
            let span = base.span;
            TypeExpr::new(
                TypeExprKind::Quali {
                    quals,
                    target: Box::new(base),
                },
                span,
            )
        };

        let ctor_args = inits.pop().map(|(args, _)| args).unwrap_or_default();
        let span = start.merge(self.tokens[self.pos.saturating_sub(1)].span);
        Ok(Expr::new(
            ExprKind::DataDef(DataDef {
                name,
                declared_ty,
                storage,
                ctor_args,
                do_not_init,
                span,
                object: None,
            }),
            span,
        ))
    }

    /// `(= a, b)` — the constructor-call style initializer list.
    fn try_parse_paren_init(&mut self) -> PassResult<Option<(Vec<Expr>, Span)>> {
        if !(self.check(&TokenKind::LParen) && *self.peek_at(1) == TokenKind::Assign) {
            return Ok(None);
        }
        let open = self.advance().span; // (
        self.advance(); // =
        let args = self.parse_call_args()?;
        let close = self.expect(TokenKind::RParen, "`)` after initializer list")?;
        Ok(Some((args, open.merge(close.span))))
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Funda(_) | TokenKind::Ident(_) | TokenKind::Star | TokenKind::Mut
        )
    }

    /// `fun name: (a:int, b:int) rettype = body $`
    fn parse_fun_def(&mut self) -> PassResult<Expr> {
        let start = self.advance().span;
        let (name, _) = self.expect_ident("function name")?;
        self.expect(TokenKind::Colon, "`:` after function name")?;
        self.expect(TokenKind::LParen, "`(` starting the parameter list")?;

        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let (param_name, param_span) = self.expect_ident("parameter name")?;
            self.expect(TokenKind::Colon, "`:` after parameter name")?;
            let storage = if self.eat(&TokenKind::Static) {
                StorageDuration::Static
            } else {
                StorageDuration::Local
            };
            let declared_ty = self.parse_type_expr()?;
            params.push(DataDef {
                name: param_name,
                declared_ty,
                storage,
                ctor_args: Vec::new(),
                do_not_init: false,
                span: param_span,
                object: None,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)` closing the parameter list")?;

        let ret_ty = self.parse_type_expr()?;
        self.expect(TokenKind::Assign, "`=` before the function body")?;
        let body = self.parse_expr()?;
        self.eat_terminator(Some(name));

        let span = start.merge(body.span);
        Ok(Expr::new(
            ExprKind::FunDef(FunDef {
                name,
                params,
                ret_ty,
                body: Box::new(body),
                span,
                implicit: false,
                scope: None,
                object: None,
            }),
            span,
        ))
    }

    fn parse_type_expr(&mut self) -> PassResult<TypeExpr> {
        let start = self.peek().span;
        let mut quals = Qualifiers::NONE;
        while self.eat(&TokenKind::Mut) {
            quals = quals.union(Qualifiers::MUT);
        }
        let core = match *self.peek_kind() {
            TokenKind::Funda(ty) => {
                let span = self.advance().span;
                TypeExpr::funda(ty, span)
            }
            TokenKind::Ident(name) => {
                let span = self.advance().span;
                TypeExpr::new(TypeExprKind::Symbol(TypeName::Named(name)), span)
            }
            TokenKind::Star => {
                let star = self.advance().span;
                let pointee = self.parse_type_expr()?;
                let span = star.merge(pointee.span);
                TypeExpr::new(
                    TypeExprKind::Ptr {
                        pointee: Box::new(pointee),
                    },
                    span,
                )
            }
            _ => {
                return self.fail(format!(
                    "expected a type, found {}",
                    self.peek_kind().describe()
                ))
            }
        };
        if quals.is_empty() {
            Ok(core)
        } else {
            let span = start.merge(core.span);
            Ok(TypeExpr::new(
                TypeExprKind::Quali {
                    quals,
                    target: Box::new(core),
                },
                span,
            ))
        }
    }

    fn expect_ident(&mut self, what: &str) -> PassResult<(Symbol, Span)> {
        if let TokenKind::Ident(name) = *self.peek_kind() {
            let span = self.advance().span;
            Ok((name, span))
        } else {
            self.fail(format!(
                "expected {what}, found {}",
                self.peek_kind().describe()
            ))
        }
    }

    /// Optional `$` or `end [tag]` after a block-introducing form.
    fn eat_terminator(&mut self, name: Option<Symbol>) {
        if self.eat(&TokenKind::Dollar) {
            return;
        }
        if self.eat(&TokenKind::End) {
            match *self.peek_kind() {
                TokenKind::If
                | TokenKind::While
                | TokenKind::Fun
                | TokenKind::Val
                | TokenKind::Var => {
                    self.advance();
                }
                TokenKind::Ident(tag) => {
                    // `end foo` closes the definition of `foo`; any other
                    // identifier belongs to the next expression
                    if Some(tag) == name {
                        self.advance();
                    }
                }
                _ => {}
            }
        }
    }
}

fn binary(op: Op, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span.merge(rhs.span);
    Expr::new(
        ExprKind::Operator {
            op,
            args: vec![lhs, rhs],
        },
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filter_tokens;
    use crate::lexer::lex;
    use crate::printer::canonical;

    /// Lex, filter and parse `source`, returning the canonical print of the
    /// resulting AST.
    fn parse_to_string(source: &str) -> String {
        let mut interner = Interner::new();
        let mut log = ErrorLog::new();
        let tokens = lex(source, &mut interner, &mut log).expect("lexing succeeds");
        let tokens = filter_tokens(tokens);
        let ast = parse(&tokens, &mut log).expect("parsing succeeds");
        assert!(!log.has_errors(), "unexpected errors: {:?}", log.diags());
        canonical(&ast, &interner)
    }

    fn parse_err(source: &str) -> ErrorKind {
        let mut interner = Interner::new();
        let mut log = ErrorLog::new();
        let tokens = filter_tokens(lex(source, &mut interner, &mut log).expect("lexes"));
        let result = parse(&tokens, &mut log);
        assert!(result.is_err(), "expected a parse error for {source:?}");
        log.first_kind().expect("error recorded")
    }

    #[test]
    fn literals() {
        assert_eq!(parse_to_string("42"), "42");
        assert_eq!(parse_to_string("true"), "1bool");
        assert_eq!(parse_to_string("2.5"), "2.5");
        assert_eq!(parse_to_string("nop"), "nop");
    }

    #[test]
    fn additive_is_left_associative() {
        assert_eq!(parse_to_string("a+b+c"), "+(+(a b) c)");
        assert_eq!(parse_to_string("a-b-c"), "-(-(a b) c)");
        assert_eq!(parse_to_string("a+b-c"), "-(+(a b) c)");
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        assert_eq!(parse_to_string("a+b*c"), "+(a *(b c))");
        assert_eq!(parse_to_string("a*b+c"), "+(*(a b) c)");
        assert_eq!(parse_to_string("(1+2)*(3-4)/5"), "/(*(+(1 2) -(3 4)) 5)");
    }

    #[test]
    fn comparison_binds_looser_than_additive() {
        assert_eq!(parse_to_string("a==b+c"), "==(a +(b c))");
        assert_eq!(parse_to_string("a==b==c"), "==(==(a b) c)");
        assert_eq!(parse_to_string("x<3"), "<(x 3)");
    }

    #[test]
    fn logical_operators_and_their_word_synonyms() {
        assert_eq!(parse_to_string("a && b && c"), "&&(&&(a b) c)");
        assert_eq!(parse_to_string("a and b or c"), "||(&&(a b) c)");
        assert_eq!(parse_to_string("a || b && c"), "||(a &&(b c))");
        assert_eq!(parse_to_string("a && b + c"), "&&(a +(b c))");
    }

    #[test]
    fn assignment_is_right_associative_and_loosest_but_seq() {
        assert_eq!(parse_to_string("a = b = c"), "=(a =(b c))");
        assert_eq!(parse_to_string("a := b := c"), ":=(a :=(b c))");
        assert_eq!(parse_to_string("a = b or c"), "=(a ||(b c))");
        assert_eq!(parse_to_string("foo = 1+2*3"), "=(foo +(1 *(2 3)))");
    }

    #[test]
    fn sequence_by_semicolon_and_newline() {
        assert_eq!(parse_to_string("a ; b ; c"), ";(a b c)");
        assert_eq!(parse_to_string("a \n b \n c"), ";(a b c)");
        assert_eq!(parse_to_string("a ; b \n c"), ";(a b c)");
        assert_eq!(parse_to_string("a = b \n c"), ";(=(a b) c)");
    }

    #[test]
    fn parenthesized_sequence_is_an_operand() {
        assert_eq!(parse_to_string("(1 ; 2)*3"), "*(;(1 2) 3)");
    }

    #[test]
    fn unary_prefix_operators() {
        assert_eq!(parse_to_string("!a * b"), "*(!(a) b)");
        assert_eq!(parse_to_string("not not a"), "!(!(a))");
        assert_eq!(parse_to_string("- - a"), "-(-(a))");
        assert_eq!(parse_to_string("& ! a"), "&(!(a))");
        assert_eq!(parse_to_string("!foo()"), "!(foo())");
    }

    #[test]
    fn calls_bind_tightest_and_chain() {
        assert_eq!(parse_to_string("foo()"), "foo()");
        assert_eq!(parse_to_string("foo(42)"), "foo(42)");
        assert_eq!(parse_to_string("foo(42,77)"), "foo(42 77)");
        assert_eq!(parse_to_string("foo(a)(b)"), "foo(a)(b)");
        assert_eq!(parse_to_string("(foo+bar)(42,77)"), "+(foo bar)(42 77)");
    }

    #[test]
    fn operator_call_syntax_folds_left() {
        assert_eq!(parse_to_string("op+(1,2)"), "+(1 2)");
        assert_eq!(parse_to_string("op+(1,2,3)"), "+(+(1 2) 3)");
        assert_eq!(parse_to_string("op_and(x,y)"), "&&(x y)");
        assert_eq!(parse_to_string("op!(x)"), "!(x)");
    }

    #[test]
    fn operator_call_syntax_folds_assignment_right() {
        assert_eq!(parse_to_string("op=(a,b,c)"), "=(a =(b c))");
    }

    #[test]
    fn casts_use_constructor_call_notation() {
        assert_eq!(parse_to_string("bool(0)"), "bool(0)");
        assert_eq!(parse_to_string("int(false)"), "int(0bool)");
    }

    #[test]
    fn if_with_and_without_else() {
        assert_eq!(parse_to_string("if x: 1 $"), "if(x 1)");
        assert_eq!(parse_to_string("if x: 1 else 2 $"), "if(x 1 2)");
        assert_eq!(parse_to_string("if x: 1 else 2 end if"), "if(x 1 2)");
    }

    #[test]
    fn elif_chains_nest_in_the_else_position() {
        assert_eq!(parse_to_string("if x: 1 elif y: 2 $"), "if(x 1 if(y 2))");
        assert_eq!(
            parse_to_string("if x: 1 elif y: 2 else 3 $"),
            "if(x 1 if(y 2 3))"
        );
        assert_eq!(
            parse_to_string("if x: 1 elif y: 2 elif z: 3 else 4 $"),
            "if(x 1 if(y 2 if(z 3 4)))"
        );
    }

    #[test]
    fn while_loops() {
        assert_eq!(parse_to_string("while x<3: x = x+1 $"), "while(<(x 3) =(x +(x 1)))");
    }

    #[test]
    fn data_definitions() {
        assert_eq!(parse_to_string("val foo :int $"), "data(decldata(foo int) ())");
        assert_eq!(
            parse_to_string("val foo : int = 42 $"),
            "data(decldata(foo int) (42))"
        );
        assert_eq!(
            parse_to_string("val foo :mut int = 42 $"),
            "data(decldata(foo mut-int) (42))"
        );
        assert_eq!(
            parse_to_string("var foo = 42 $"),
            "data(decldata(foo mut-infer) (42))"
        );
        assert_eq!(
            parse_to_string("val foo = 42"),
            "data(decldata(foo infer) (42))"
        );
    }

    #[test]
    fn data_definition_with_ctor_call_style_initializer() {
        assert_eq!(
            parse_to_string("val foo (=42) : int $"),
            "data(decldata(foo int) (42))"
        );
        assert_eq!(
            parse_to_string("val foo : int (=42,77) $"),
            "data(decldata(foo int) (42 77))"
        );
        assert_eq!(
            parse_to_string("val foo(=) : int $"),
            "data(decldata(foo int) ())"
        );
    }

    #[test]
    fn noinit_definitions() {
        assert_eq!(
            parse_to_string("val x :mut int = noinit $"),
            "data(decldata(x mut-int) noinit)"
        );
    }

    #[test]
    fn static_storage_duration() {
        assert_eq!(
            parse_to_string("val g :static mut int = 0 $"),
            "data(decldata(g static/mut-int) (0))"
        );
    }

    #[test]
    fn two_initializers_are_rejected() {
        assert_eq!(
            parse_err("val foo (=42) : int = 43 $"),
            ErrorKind::MultipleInitializers
        );
    }

    #[test]
    fn pointer_types() {
        assert_eq!(
            parse_to_string("val p : *int $"),
            "data(decldata(p *int) ())"
        );
        assert_eq!(
            parse_to_string("val p : *mut int $"),
            "data(decldata(p *mut-int) ())"
        );
        assert_eq!(
            parse_to_string("val p : mut *int $"),
            "data(decldata(p mut-*int) ())"
        );
    }

    #[test]
    fn function_definitions() {
        assert_eq!(
            parse_to_string("fun foo: () int = 42 $"),
            "fun(declfun(foo () int) 42)"
        );
        assert_eq!(
            parse_to_string("fun foo: (arg1:int) int = 42 $"),
            "fun(declfun(foo ((arg1 int)) int) 42)"
        );
        assert_eq!(
            parse_to_string("fun foo: (arg1:int, arg2:int) int = 42 $"),
            "fun(declfun(foo ((arg1 int) (arg2 int)) int) 42)"
        );
        assert_eq!(
            parse_to_string("fun foo: (arg1:int,) int = 42 $"),
            "fun(declfun(foo ((arg1 int)) int) 42)"
        );
        assert_eq!(
            parse_to_string("fun foo: (x:int) int = x $"),
            "fun(declfun(foo ((x int)) int) x)"
        );
        assert_eq!(
            parse_to_string("fun foo: () int = 42 end fun"),
            "fun(declfun(foo () int) 42)"
        );
        assert_eq!(
            parse_to_string("fun foo: () int = (42; 1+2) $"),
            "fun(declfun(foo () int) ;(42 +(1 2)))"
        );
    }

    #[test]
    fn function_body_ends_before_a_sequence_separator() {
        assert_eq!(
            parse_to_string("fun id: (x:int) int = x; id(5)"),
            ";(fun(declfun(id ((x int)) int) x) id(5))"
        );
    }

    #[test]
    fn returns() {
        assert_eq!(parse_to_string("return 42"), "return(42)");
        assert_eq!(parse_to_string("return"), "return(nop)");
        assert_eq!(parse_to_string("return$"), "return(nop)");
    }

    #[test]
    fn end_tag_mismatch_is_left_for_the_next_expression() {
        // `end` closes the definition, `bar` is the next sequence element
        assert_eq!(
            parse_to_string("val foo = 1 end\nbar"),
            ";(data(decldata(foo infer) (1)) bar)"
        );
        assert_eq!(
            parse_to_string("val foo = 1 end foo"),
            "data(decldata(foo infer) (1))"
        );
    }

    #[test]
    fn empty_input_parses_to_nop() {
        assert_eq!(parse_to_string(""), "nop");
    }

    #[test]
    fn garbage_reports_a_syntax_error() {
        assert_eq!(parse_err("val 42"), ErrorKind::Syntax);
        assert_eq!(parse_err("if x 1"), ErrorKind::Syntax);
        assert_eq!(parse_err("(1"), ErrorKind::Syntax);
    }

    #[test]
    fn reparsing_the_printed_source_yields_the_same_tree() {
        use crate::printer::source;
        for program in [
            "42",
            "42 + 77",
            "a = b = c",
            "(1 ; 2)*3",
            "if x: 1 else 2 $",
            "while x<3: x = x+1 $",
            "val foo :mut int = 42 $",
            "fun fact: (x:int) int = if x==0: 1 else x*fact(x-1) $",
            "!a && b || c == d",
            "int(false); bool(0); 'a'",
            "val p : *mut int $",
            "&x; *p",
        ] {
            let mut interner = Interner::new();
            let mut log = ErrorLog::new();
            let tokens = filter_tokens(lex(program, &mut interner, &mut log).expect("lexes"));
            let ast = parse(&tokens, &mut log).expect("parses");
            let printed = source(&ast, &interner);

            let mut log2 = ErrorLog::new();
            let tokens2 =
                filter_tokens(lex(&printed, &mut interner, &mut log2).expect("printed lexes"));
            let ast2 = parse(&tokens2, &mut log2)
                .unwrap_or_else(|_| panic!("printed source must reparse: {printed}"));
            assert_eq!(
                canonical(&ast, &interner),
                canonical(&ast2, &interner),
                "round trip differs for {program:?} via {printed:?}"
            );
        }
    }
}
