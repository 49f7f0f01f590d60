//! Abstract syntax tree produced by the parser.
//!
//! Every statement and expression carries the span of its first token.
//! Identifiers carry an optional `SymbolId` which is `None` straight out
//! of the parser and filled in by name resolution.

use crate::builtins::Command;
use crate::scope::SymbolId;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Stmt>,
}

/// A name occurrence in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
    pub symbol: Option<SymbolId>,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Ident {
            name: name.into(),
            span,
            symbol: None,
        }
    }
}

/// Declared element type of a variable. Recorded, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int,
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `int x;` / `float y = e;`
    VarDecl {
        ty: ScalarType,
        name: Ident,
        init: Option<Expr>,
    },
    /// `const int K = e;`
    ConstDecl {
        ty: ScalarType,
        name: Ident,
        init: Expr,
    },
    /// `int[] a = [e, ...];` / `int[] a;`
    ArrayDecl {
        ty: ScalarType,
        name: Ident,
        elements: Vec<Expr>,
    },
    /// `target = value;` where target is a variable or an index expression.
    Assign { target: Expr, value: Expr },
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
    },
    While { cond: Expr, body: Vec<Stmt> },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Box<Stmt>>,
        body: Vec<Stmt>,
    },
    Switch {
        scrutinee: Expr,
        arms: Vec<SwitchArm>,
    },
    Function(FunctionDecl),
    /// Parsed for syntax compatibility; produces no code.
    Class(ClassDecl),
    /// Parsed for syntax compatibility; produces no code.
    Method(FunctionDecl),
    /// Data-only template; produces no code.
    Struct(StructDecl),
    /// `label: name`
    Label(Ident),
    /// `goto name;` / `goto name if (c);`
    Goto {
        target: Ident,
        condition: Option<Expr>,
    },
    Break,
    Return(Option<Expr>),
    /// A built-in command call used as a statement.
    Command { command: Command, args: Vec<Expr> },
    /// A user call or increment/decrement used as a statement.
    Expr(Expr),
    /// Verbatim target text from `raw { ... }`.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchArm {
    pub label: CaseLabel,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseLabel {
    Case(Expr),
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Ident,
    /// Field declarations (`VarDecl`, `ConstDecl` or `ArrayDecl`).
    pub fields: Vec<Stmt>,
    pub methods: Vec<FunctionDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Ident,
    pub fields: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Integer literal, text kept verbatim.
    Int(String),
    /// Floating-point literal, text kept verbatim.
    Float(String),
    Str(String),
    Var(Ident),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Index { array: Ident, index: Box<Expr> },
    /// `bot.hp` or `bot.pos.x`. `target` stands for the flattened variable
    /// (`bot_hp`, `bot_pos_x`); for `arr.length` it binds to the array.
    Member { path: Vec<Ident>, target: Ident },
    Call { callee: Ident, args: Vec<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Operator spelling shared by both languages.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    /// True for the four increment/decrement forms, which write their operand.
    pub fn is_step(self) -> bool {
        matches!(
            self,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
        )
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    /// Something an assignment or `++`/`--` can write to.
    pub fn is_place(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Var(_) | ExprKind::Index { .. } | ExprKind::Member { .. }
        )
    }

    /// A literal whose text can be written straight into an `INIT` line.
    pub fn is_literal(&self) -> bool {
        match &self.kind {
            ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Str(_) => true,
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => matches!(operand.kind, ExprKind::Int(_) | ExprKind::Float(_)),
            _ => false,
        }
    }
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }

    /// Name introduced by a declaration statement, if any.
    pub fn declared_name(&self) -> Option<&Ident> {
        match &self.kind {
            StmtKind::VarDecl { name, .. }
            | StmtKind::ConstDecl { name, .. }
            | StmtKind::ArrayDecl { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(text: &str) -> Expr {
        Expr::new(ExprKind::Int(text.to_string()), Span::start())
    }

    #[test]
    fn negated_numbers_count_as_literals() {
        let negated = Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(int("5")),
            },
            Span::start(),
        );
        assert!(negated.is_literal());
        assert!(int("5").is_literal());

        let var = Expr::new(
            ExprKind::Var(Ident::new("x", Span::start())),
            Span::start(),
        );
        let negated_var = Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(var),
            },
            Span::start(),
        );
        assert!(!negated_var.is_literal());
    }

    #[test]
    fn only_step_operators_write_their_operand() {
        assert!(UnaryOp::PostInc.is_step());
        assert!(UnaryOp::PreDec.is_step());
        assert!(!UnaryOp::Neg.is_step());
        assert!(!UnaryOp::Not.is_step());
    }
}
