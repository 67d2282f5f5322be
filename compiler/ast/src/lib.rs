//! The abstract syntax tree (AST).
//!
//! The most important definitions are [`Decl`], [`Stmt`] and [`Expr`]. Nodes are
//! created by the parser and never mutated afterwards.

use span::Spanned;
use std::fmt;
use utility::{Atom, SmallVec};

pub use render::render;
pub use ty::{common, is_assignable, BareTy, Extent, Scalar, Ty};

mod render;
mod ty;

#[derive(PartialEq, Eq, Debug)]
pub struct Program {
    pub decls: Vec<Decl>,
}

pub type Decl = Spanned<BareDecl>;

#[derive(PartialEq, Eq, Debug)]
pub enum BareDecl {
    Function(Box<Function>),
}

#[derive(PartialEq, Eq, Debug)]
pub struct Function {
    pub binder: Ident,
    /// The return type.
    pub ty: Ty,
    pub params: Params,
    pub body: Block,
}

/// A list of parameters.
pub type Params = SmallVec<Param, 2>;
/// A parameter.
pub type Param = Spanned<BareParam>;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BareParam {
    pub binder: Ident,
    pub ty: Ty,
}

pub type Block = Spanned<Vec<Stmt>>;

pub type Stmt = Spanned<BareStmt>;

#[derive(PartialEq, Eq, Debug)]
pub enum BareStmt {
    Var(Box<LocalBinding>),
    Expr(Expr),
    Block(Vec<Stmt>),
    If(Box<If>),
    While(Box<While>),
    Return(Option<Expr>),
}

#[derive(PartialEq, Eq, Debug)]
pub struct LocalBinding {
    pub binder: Ident,
    pub ty: Ty,
    pub initializer: Option<Expr>,
}

#[derive(PartialEq, Eq, Debug)]
pub struct If {
    pub condition: Expr,
    pub consequent: Block,
    /// Either a [block](BareStmt::Block) or another [if](BareStmt::If) statement.
    pub alternate: Option<Stmt>,
}

#[derive(PartialEq, Eq, Debug)]
pub struct While {
    pub condition: Expr,
    pub body: Block,
}

pub type Expr = Spanned<BareExpr>;

#[derive(PartialEq, Eq, Debug)]
pub enum BareExpr {
    NumberLiteral(Atom),
    FloatLiteral(Atom),
    TextLiteral(Atom),
    BoolLiteral(bool),
    Binding(Atom),
    Index(Box<Index>),
    Unary(Box<Unary>),
    Binary(Box<Binary>),
    Assignment(Box<Assignment>),
    Call(Box<Call>),
    ArrayLiteral(Vec<Expr>),
    ArrayAllocation(Box<ArrayAllocation>),
    /// A bare type in expression position. Only meaningful as the argument of
    /// the `sizeof` built-in.
    TypeRef(Ty),
}

#[derive(PartialEq, Eq, Debug)]
pub struct Index {
    pub base: Expr,
    pub index: Expr,
}

#[derive(PartialEq, Eq, Debug)]
pub struct Unary {
    pub op: Spanned<UnaryOp>,
    pub operand: Expr,
}

#[derive(PartialEq, Eq, Debug)]
pub struct Binary {
    pub op: Spanned<BinaryOp>,
    pub lhs: Expr,
    pub rhs: Expr,
}

#[derive(PartialEq, Eq, Debug)]
pub struct Assignment {
    pub target: Expr,
    pub op: Spanned<AssignmentOp>,
    pub value: Expr,
}

#[derive(PartialEq, Eq, Debug)]
pub struct Call {
    pub callee: Ident,
    pub args: Vec<Expr>,
}

#[derive(PartialEq, Eq, Debug)]
pub struct ArrayAllocation {
    pub element: Ty,
    pub length: Expr,
}

pub type Ident = Spanned<Atom>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Negate => "-",
            Self::Not => "!",
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    pub const fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Subtract | Self::Multiply | Self::Divide)
    }

    pub const fn is_comparison(self) -> bool {
        matches!(self, Self::Less | Self::LessEqual | Self::Greater | Self::GreaterEqual)
    }

    pub const fn is_equality(self) -> bool {
        matches!(self, Self::Equal | Self::NotEqual)
    }

    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::And => "&&",
            Self::Or => "||",
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AssignmentOp {
    Plain,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl AssignmentOp {
    /// The binary operation a compound assignment applies before storing.
    pub const fn operation(self) -> Option<BinaryOp> {
        Some(match self {
            Self::Plain => return None,
            Self::Add => BinaryOp::Add,
            Self::Subtract => BinaryOp::Subtract,
            Self::Multiply => BinaryOp::Multiply,
            Self::Divide => BinaryOp::Divide,
        })
    }
}

impl fmt::Display for AssignmentOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plain => "=",
            Self::Add => "+=",
            Self::Subtract => "-=",
            Self::Multiply => "*=",
            Self::Divide => "/=",
        })
    }
}
