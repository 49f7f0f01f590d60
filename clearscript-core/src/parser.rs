//! Recursive-descent parser for ClearScript.
//!
//! Statements are parsed by a per-keyword grammar; expressions use
//! precedence climbing. The parser fails fast on the first error.

use crate::ast::{
    BinaryOp, CaseLabel, ClassDecl, Expr, ExprKind, FunctionDecl, Ident, Program, ScalarType,
    Stmt, StmtKind, StructDecl, SwitchArm, UnaryOp,
};
use crate::error::CoreError;
use crate::lexer::{Token, TokenKind};

/// Parse a token stream (ending in `Eof`) into a program.
pub fn parse(tokens: Vec<Token>) -> Result<Program, CoreError> {
    let mut parser = Parser::new(tokens);
    let mut items = Vec::new();
    while !parser.check(TokenKind::Eof) {
        if parser.eat(TokenKind::Semi) {
            continue;
        }
        items.push(parser.parse_stmt()?);
    }
    Ok(Program { items })
}

/// Binary precedence levels, loosest first.
const BINARY_LEVELS: &[&[(TokenKind, BinaryOp)]] = &[
    &[(TokenKind::OrOr, BinaryOp::Or)],
    &[(TokenKind::AndAnd, BinaryOp::And)],
    &[
        (TokenKind::EqEq, BinaryOp::Eq),
        (TokenKind::NotEq, BinaryOp::NotEq),
    ],
    &[
        (TokenKind::Lt, BinaryOp::Lt),
        (TokenKind::Gt, BinaryOp::Gt),
        (TokenKind::Le, BinaryOp::Le),
        (TokenKind::Ge, BinaryOp::Ge),
    ],
    &[
        (TokenKind::Plus, BinaryOp::Add),
        (TokenKind::Minus, BinaryOp::Sub),
    ],
    &[
        (TokenKind::Star, BinaryOp::Mul),
        (TokenKind::Slash, BinaryOp::Div),
    ],
];

/// Deepest allowed nesting of blocks, parentheses and unary operators.
const MAX_NESTING: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|token| token.kind != TokenKind::Eof) {
            let span = tokens.last().map(|token| token.span).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span,
            });
        }
        Parser {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        if self.depth >= MAX_NESTING {
            return Err(CoreError::parse(
                self.peek().span,
                format!("nesting is deeper than {MAX_NESTING} levels"),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // ----- token cursor -----

    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.position.min(last)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, CoreError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<Ident, CoreError> {
        let token = self.expect(TokenKind::Ident, what)?;
        Ok(Ident::new(token.text, token.span))
    }

    fn unexpected(&self, expected: &str) -> CoreError {
        let token = self.peek();
        let found = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Raw => "raw block".to_string(),
            TokenKind::StringLiteral => format!("string \"{}\"", token.text),
            _ => format!("'{}'", token.text),
        };
        CoreError::parse(token.span, format!("expected {expected}, found {found}"))
    }

    // ----- statements -----

    fn parse_stmt(&mut self) -> Result<Stmt, CoreError> {
        let span = self.peek().span;
        let kind = match self.peek_kind() {
            TokenKind::Const => self.parse_const_decl()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::While => {
                self.advance();
                let cond = self.parse_paren_expr()?;
                let body = self.parse_block()?;
                StmtKind::While { cond, body }
            }
            TokenKind::For => self.parse_for()?,
            TokenKind::Switch => self.parse_switch()?,
            TokenKind::Function => StmtKind::Function(self.parse_callable(TokenKind::Function)?),
            TokenKind::Method => StmtKind::Method(self.parse_callable(TokenKind::Method)?),
            TokenKind::Class => self.parse_class()?,
            TokenKind::Struct => self.parse_struct()?,
            TokenKind::Label => {
                self.advance();
                self.expect(TokenKind::Colon, "':' after 'label'")?;
                let name = self.expect_ident("a label name")?;
                self.eat(TokenKind::Semi);
                StmtKind::Label(name)
            }
            TokenKind::Goto => {
                self.advance();
                let target = self.expect_ident("a label name after 'goto'")?;
                let condition = if self.eat(TokenKind::If) {
                    Some(self.parse_paren_expr()?)
                } else {
                    None
                };
                self.expect(TokenKind::Semi, "';' after goto")?;
                StmtKind::Goto { target, condition }
            }
            TokenKind::Break => {
                self.advance();
                self.expect(TokenKind::Semi, "';' after 'break'")?;
                StmtKind::Break
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(TokenKind::Semi, "';' after return")?;
                StmtKind::Return(value)
            }
            TokenKind::Raw => StmtKind::Raw(self.advance().text),
            _ => {
                let stmt = self.parse_simple()?;
                self.expect(TokenKind::Semi, "';' after statement")?;
                return Ok(stmt);
            }
        };
        Ok(Stmt::new(kind, span))
    }

    /// A statement that may appear in a `for` header: a declaration,
    /// assignment, call, command or increment/decrement. Does not consume
    /// the terminating `;`.
    fn parse_simple(&mut self) -> Result<Stmt, CoreError> {
        let span = self.peek().span;
        match self.peek_kind() {
            TokenKind::Int | TokenKind::Float => return self.parse_decl(),
            TokenKind::Command(command) => {
                self.advance();
                let args = self.parse_args()?;
                return Ok(Stmt::new(StmtKind::Command { command, args }, span));
            }
            _ => {}
        }

        let expr = self.parse_expr()?;
        if self.check(TokenKind::Assign) {
            if !expr.is_place() {
                return Err(CoreError::parse(
                    self.peek().span,
                    "left side of '=' must be a variable, array element or member",
                ));
            }
            self.advance();
            let value = self.parse_expr()?;
            return Ok(Stmt::new(StmtKind::Assign { target: expr, value }, span));
        }

        let stands_alone = match &expr.kind {
            ExprKind::Call { .. } => true,
            ExprKind::Unary { op, .. } => op.is_step(),
            _ => false,
        };
        if !stands_alone {
            return Err(CoreError::parse(
                span,
                "expression has no effect; expected an assignment, call or increment",
            ));
        }
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }

    fn parse_type(&mut self) -> Result<ScalarType, CoreError> {
        match self.peek_kind() {
            TokenKind::Int => {
                self.advance();
                Ok(ScalarType::Int)
            }
            TokenKind::Float => {
                self.advance();
                Ok(ScalarType::Float)
            }
            _ => Err(self.unexpected("a type ('int' or 'float')")),
        }
    }

    fn parse_decl(&mut self) -> Result<Stmt, CoreError> {
        let span = self.peek().span;
        let ty = self.parse_type()?;

        if self.eat(TokenKind::LBracket) {
            self.expect(TokenKind::RBracket, "']' in array type")?;
            let name = self.expect_ident("an array name")?;
            let mut elements = Vec::new();
            if self.eat(TokenKind::Assign) {
                self.expect(TokenKind::LBracket, "'[' to start an array literal")?;
                while !self.check(TokenKind::RBracket) {
                    elements.push(self.parse_expr()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RBracket, "']' to close the array literal")?;
            }
            return Ok(Stmt::new(StmtKind::ArrayDecl { ty, name, elements }, span));
        }

        let name = self.expect_ident("a variable name")?;
        let init = if self.eat(TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Stmt::new(StmtKind::VarDecl { ty, name, init }, span))
    }

    fn parse_const_decl(&mut self) -> Result<StmtKind, CoreError> {
        self.advance();
        let ty = self.parse_type()?;
        let name = self.expect_ident("a constant name")?;
        self.expect(TokenKind::Assign, "'=' (constants need an initializer)")?;
        let init = self.parse_expr()?;
        self.expect(TokenKind::Semi, "';' after declaration")?;
        Ok(StmtKind::ConstDecl { ty, name, init })
    }

    fn parse_if(&mut self) -> Result<StmtKind, CoreError> {
        self.advance();
        let cond = self.parse_paren_expr()?;
        let then_body = self.parse_block()?;
        let else_body = if self.eat(TokenKind::Else) {
            if self.check(TokenKind::If) {
                let span = self.peek().span;
                let nested = self.nested(Self::parse_if)?;
                Some(vec![Stmt::new(nested, span)])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(StmtKind::If {
            cond,
            then_body,
            else_body,
        })
    }

    fn parse_for(&mut self) -> Result<StmtKind, CoreError> {
        self.advance();
        self.expect(TokenKind::LParen, "'(' after 'for'")?;
        let init = if self.check(TokenKind::Semi) {
            None
        } else {
            Some(Box::new(self.parse_simple()?))
        };
        self.expect(TokenKind::Semi, "';' after for-loop initializer")?;
        let cond = if self.check(TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semi, "';' after for-loop condition")?;
        let step = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_simple()?))
        };
        self.expect(TokenKind::RParen, "')' to close the for-loop header")?;
        let body = self.parse_block()?;
        Ok(StmtKind::For {
            init,
            cond,
            step,
            body,
        })
    }

    fn parse_switch(&mut self) -> Result<StmtKind, CoreError> {
        self.advance();
        let scrutinee = self.parse_paren_expr()?;
        self.expect(TokenKind::LBrace, "'{' to open the switch body")?;

        let mut arms = Vec::new();
        let mut seen_default = false;
        while !self.check(TokenKind::RBrace) {
            let span = self.peek().span;
            let label = match self.peek_kind() {
                TokenKind::Case => {
                    self.advance();
                    CaseLabel::Case(self.parse_expr()?)
                }
                TokenKind::Default => {
                    if seen_default {
                        return Err(CoreError::parse(span, "switch has more than one 'default'"));
                    }
                    seen_default = true;
                    self.advance();
                    CaseLabel::Default
                }
                _ => return Err(self.unexpected("'case' or 'default'")),
            };
            self.expect(TokenKind::Colon, "':' after case label")?;

            let mut body = Vec::new();
            while !matches!(
                self.peek_kind(),
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                if self.eat(TokenKind::Semi) {
                    continue;
                }
                body.push(self.parse_stmt()?);
            }
            arms.push(SwitchArm { label, body, span });
        }
        self.expect(TokenKind::RBrace, "'}' to close the switch body")?;
        Ok(StmtKind::Switch { scrutinee, arms })
    }

    /// `function name(a, b) { ... }` or the same shape with `method`.
    fn parse_callable(&mut self, keyword: TokenKind) -> Result<FunctionDecl, CoreError> {
        self.expect(keyword, "'function' or 'method'")?;
        let name = self.expect_ident("a name")?;
        self.expect(TokenKind::LParen, "'(' to open the parameter list")?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) {
            // Parameter types are optional and carry no meaning.
            if matches!(self.peek_kind(), TokenKind::Int | TokenKind::Float) {
                self.advance();
            }
            params.push(self.expect_ident("a parameter name")?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')' to close the parameter list")?;
        let body = self.parse_block()?;
        Ok(FunctionDecl { name, params, body })
    }

    fn parse_class(&mut self) -> Result<StmtKind, CoreError> {
        self.advance();
        let name = self.expect_ident("a class name")?;
        self.expect(TokenKind::LBrace, "'{' to open the class body")?;
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::RBrace => break,
                TokenKind::Method => methods.push(self.parse_callable(TokenKind::Method)?),
                TokenKind::Int | TokenKind::Float => {
                    fields.push(self.parse_decl()?);
                    self.expect(TokenKind::Semi, "';' after field")?;
                }
                TokenKind::Const => {
                    let span = self.peek().span;
                    fields.push(Stmt::new(self.parse_const_decl()?, span));
                }
                _ => return Err(self.unexpected("a field or method declaration")),
            }
        }
        self.expect(TokenKind::RBrace, "'}' to close the class body")?;
        Ok(StmtKind::Class(ClassDecl {
            name,
            fields,
            methods,
        }))
    }

    /// `struct Name { int a; float b = 1; }`; fields only.
    fn parse_struct(&mut self) -> Result<StmtKind, CoreError> {
        self.advance();
        let name = self.expect_ident("a struct name")?;
        self.expect(TokenKind::LBrace, "'{' to open the struct body")?;
        let mut fields = Vec::new();
        while matches!(self.peek_kind(), TokenKind::Int | TokenKind::Float) {
            fields.push(self.parse_decl()?);
            self.expect(TokenKind::Semi, "';' after field")?;
        }
        if !self.check(TokenKind::RBrace) {
            return Err(self.unexpected("a field declaration or '}'"));
        }
        self.advance();
        Ok(StmtKind::Struct(StructDecl { name, fields }))
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, CoreError> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> Result<Vec<Stmt>, CoreError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.check(TokenKind::Eof) {
                return Err(self.unexpected("'}'"));
            }
            if self.eat(TokenKind::Semi) {
                continue;
            }
            stmts.push(self.parse_stmt()?);
        }
        self.advance();
        Ok(stmts)
    }

    // ----- expressions -----

    fn parse_paren_expr(&mut self) -> Result<Expr, CoreError> {
        self.expect(TokenKind::LParen, "'('")?;
        let expr = self.parse_expr()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, CoreError> {
        self.expect(TokenKind::LParen, "'(' to open the argument list")?;
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) {
            args.push(self.parse_expr()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')' to close the argument list")?;
        Ok(args)
    }

    fn parse_expr(&mut self) -> Result<Expr, CoreError> {
        self.nested(Self::parse_ternary)
    }

    fn parse_ternary(&mut self) -> Result<Expr, CoreError> {
        let cond = self.parse_binary(0)?;
        if !self.check(TokenKind::Question) {
            return Ok(cond);
        }
        self.advance();
        let then_expr = self.parse_expr()?;
        self.expect(TokenKind::Colon, "':' in conditional expression")?;
        let else_expr = self.parse_expr()?;
        let span = cond.span;
        Ok(Expr::new(
            ExprKind::Ternary {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        ))
    }

    fn parse_binary(&mut self, level: usize) -> Result<Expr, CoreError> {
        let Some(operators) = BINARY_LEVELS.get(level) else {
            return self.parse_unary();
        };
        let mut lhs = self.parse_binary(level + 1)?;
        while let Some(&(_, op)) = operators.iter().find(|(kind, _)| self.check(*kind)) {
            self.advance();
            let rhs = self.parse_binary(level + 1)?;
            let span = lhs.span;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, CoreError> {
        let span = self.peek().span;
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::PlusPlus => UnaryOp::PreInc,
            TokenKind::MinusMinus => UnaryOp::PreDec,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        if op.is_step() {
            check_step_target(&operand)?;
        }
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_postfix(&mut self) -> Result<Expr, CoreError> {
        let mut expr = self.parse_primary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::PlusPlus => UnaryOp::PostInc,
                TokenKind::MinusMinus => UnaryOp::PostDec,
                _ => return Ok(expr),
            };
            check_step_target(&expr)?;
            self.advance();
            let span = expr.span;
            expr = Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(expr),
                },
                span,
            );
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, CoreError> {
        let span = self.peek().span;
        let kind = match self.peek_kind() {
            TokenKind::IntLiteral => ExprKind::Int(self.advance().text),
            TokenKind::FloatLiteral => ExprKind::Float(self.advance().text),
            TokenKind::StringLiteral => ExprKind::Str(self.advance().text),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::Ident => {
                let token = self.advance();
                let ident = Ident::new(token.text, token.span);
                match self.peek_kind() {
                    TokenKind::LParen => ExprKind::Call {
                        callee: ident,
                        args: self.parse_args()?,
                    },
                    TokenKind::LBracket => {
                        self.advance();
                        let index = self.parse_expr()?;
                        self.expect(TokenKind::RBracket, "']' after array index")?;
                        ExprKind::Index {
                            array: ident,
                            index: Box::new(index),
                        }
                    }
                    TokenKind::Dot => {
                        let mut path = vec![ident];
                        while self.eat(TokenKind::Dot) {
                            path.push(self.expect_ident("a member name after '.'")?);
                        }
                        let flat: Vec<&str> = path.iter().map(|part| part.name.as_str()).collect();
                        let target = Ident::new(flat.join("_"), span);
                        ExprKind::Member { path, target }
                    }
                    _ => ExprKind::Var(ident),
                }
            }
            TokenKind::Command(command) => {
                return Err(CoreError::parse(
                    span,
                    format!(
                        "'{}' is a command and cannot be used as a value",
                        command.name()
                    ),
                ));
            }
            _ => return Err(self.unexpected("an expression")),
        };
        Ok(Expr::new(kind, span))
    }
}

fn check_step_target(expr: &Expr) -> Result<(), CoreError> {
    if expr.is_place() {
        Ok(())
    } else {
        Err(CoreError::parse(
            expr.span,
            "'++' and '--' need a variable, array element or member",
        ))
    }
}
