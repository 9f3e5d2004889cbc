//! The abstract syntax tree.
//!
//! The tree is a tagged enum with unique `Box` ownership of children; passes
//! mutate nodes in place but never reorder subtrees. Two node families
//! exist:
//!
//! - [`Expr`] — everything that denotes a runtime object. Carries the two
//!   per-node annotations filled in by semantic analysis: the access imposed
//!   by the parent and the denoted [`ObjectId`].
//! - [`TypeExpr`] — everything that denotes a type at compile time. Carries
//!   the resolved [`ObjTypeId`] once the signature augmentor ran.
//!
//! A node that is both a container and a value (sequence, block) exposes the
//! duality through its children on one hand and its `object` annotation on
//! the other; the object of a sequence *is* the object of its last operand,
//! expressed by sharing the same `ObjectId`.

use veld_base::{Span, Symbol};

use crate::env::ScopeId;
use crate::object::{Access, ObjectId, StorageDuration};
use crate::types::{FundaType, Qualifiers};

/// Operators of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `=` — void-assignment; the expression's value is `void`.
    Assign,
    /// `:=` — lvalue-assignment; the expression denotes the lhs object.
    RefAssign,
    Add,
    Sub,
    Mul,
    Div,
    /// `!` / `not`
    Not,
    /// Unary `&`
    AddrOf,
    /// Unary `*`
    Deref,
    /// `&&` / `and`, short-circuit
    And,
    /// `||` / `or`, short-circuit
    Or,
    EqualTo,
    NotEqualTo,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

/// Coarse operator classification used by the semantic analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    Assignment,
    Arithmetic,
    Logical,
    Comparison,
    Other,
}

impl Op {
    pub fn class(self) -> OpClass {
        match self {
            Op::Assign | Op::RefAssign => OpClass::Assignment,
            Op::Add | Op::Sub | Op::Mul | Op::Div => OpClass::Arithmetic,
            Op::Not | Op::And | Op::Or => OpClass::Logical,
            Op::EqualTo | Op::NotEqualTo | Op::Less | Op::LessEq | Op::Greater
            | Op::GreaterEq => OpClass::Comparison,
            Op::AddrOf | Op::Deref => OpClass::Other,
        }
    }

    pub fn is_binary_logical_short_circuit(self) -> bool {
        matches!(self, Op::And | Op::Or)
    }

    /// Operators that only exist in unary form.
    pub fn is_unary_only(self) -> bool {
        matches!(self, Op::Not | Op::AddrOf | Op::Deref)
    }

    /// Right-associative operators fold `a op (b op c)` in call syntax.
    pub fn is_right_associative(self) -> bool {
        matches!(self, Op::Assign | Op::RefAssign)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Op::Assign => "=",
            Op::RefAssign => ":=",
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Not => "!",
            Op::AddrOf => "&",
            Op::Deref => "*",
            Op::And => "&&",
            Op::Or => "||",
            Op::EqualTo => "==",
            Op::NotEqualTo => "!=",
            Op::Less => "<",
            Op::LessEq => "<=",
            Op::Greater => ">",
            Op::GreaterEq => ">=",
        }
    }
}

/// Name of a type in source: a fundamental type or a user-defined one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    Funda(FundaType),
    Named(Symbol),
}

/// A type-denoting node.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
    /// Canonical type, set by the signature augmentor.
    pub resolved: Option<crate::types::ObjTypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    Symbol(TypeName),
    Quali {
        quals: Qualifiers,
        target: Box<TypeExpr>,
    },
    Ptr {
        pointee: Box<TypeExpr>,
    },
    /// Definition of a class type. Members use [`DataDef`] with `Member`
    /// storage duration. There is no surface syntax yet; the node exists
    /// for the type system and semantic analysis.
    ClassDef {
        name: Symbol,
        members: Vec<DataDef>,
    },
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        TypeExpr {
            kind,
            span,
            resolved: None,
        }
    }

    pub fn funda(ty: FundaType, span: Span) -> Self {
        TypeExpr::new(TypeExprKind::Symbol(TypeName::Funda(ty)), span)
    }

    /// The parser's default for an omitted type annotation.
    pub fn infer(span: Span) -> Self {
        TypeExpr::funda(FundaType::Infer, span)
    }
}

/// A data definition: named object with declared type, storage duration and
/// constructor arguments. Also used for function parameters and class
/// members.
#[derive(Debug, Clone, PartialEq)]
pub struct DataDef {
    pub name: Symbol,
    pub declared_ty: TypeExpr,
    pub storage: StorageDuration,
    /// Zero args means default-initialization; the semantic analyzer
    /// fabricates the default value.
    pub ctor_args: Vec<Expr>,
    /// `= noinit` — deliberately leave the object uninitialized.
    pub do_not_init: bool,
    pub span: Span,
    /// The defined object, set by the environment inserter.
    pub object: Option<ObjectId>,
}

/// A function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FunDef {
    pub name: Symbol,
    pub params: Vec<DataDef>,
    pub ret_ty: TypeExpr,
    pub body: Box<Expr>,
    pub span: Span,
    /// Fabricated by the parser (the implicit `main` wrapper) rather than
    /// written in source. An implicit definition does not count as a
    /// function-body context: a top-level `return` stays an error.
    pub implicit: bool,
    /// Scope holding parameters and body-level definitions.
    pub scope: Option<ScopeId>,
    /// The defined function object, set by the environment inserter.
    pub object: Option<ObjectId>,
}

/// An object-denoting node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Access imposed by the AST parent; `Undefined` until analysis.
    pub access: Access,
    /// The denoted object; set by semantic analysis.
    pub object: Option<ObjectId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Does nothing, value of type `void`.
    Nop,
    Number {
        value: f64,
        ty: TypeExpr,
    },
    Symbol {
        name: Symbol,
    },
    Cast {
        ty: TypeExpr,
        arg: Box<Expr>,
    },
    Operator {
        op: Op,
        args: Vec<Expr>,
    },
    /// Ordered sequence; its value is the last operand's value.
    Seq {
        operands: Vec<Expr>,
    },
    /// Introduces a scope; its value is the body's value, made immutable.
    Block {
        body: Box<Expr>,
        scope: Option<ScopeId>,
    },
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        els: Option<Box<Expr>>,
    },
    Loop {
        cond: Box<Expr>,
        body: Box<Expr>,
    },
    Return {
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    DataDef(DataDef),
    FunDef(FunDef),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr {
            kind,
            span,
            access: Access::Undefined,
            object: None,
        }
    }

    pub fn nop(span: Span) -> Self {
        Expr::new(ExprKind::Nop, span)
    }

    pub fn number(value: f64, ty: FundaType, span: Span) -> Self {
        Expr::new(
            ExprKind::Number {
                value,
                ty: TypeExpr::funda(ty, span),
            },
            span,
        )
    }

    /// Whether this expression is a compile-time constant, as required for
    /// static-duration initializers.
    pub fn is_ct_const(&self) -> bool {
        match &self.kind {
            ExprKind::Number { .. } => true,
            ExprKind::Cast { arg, .. } => arg.is_ct_const(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_classes() {
        assert_eq!(Op::Assign.class(), OpClass::Assignment);
        assert_eq!(Op::RefAssign.class(), OpClass::Assignment);
        assert_eq!(Op::Add.class(), OpClass::Arithmetic);
        assert_eq!(Op::And.class(), OpClass::Logical);
        assert_eq!(Op::Less.class(), OpClass::Comparison);
        assert_eq!(Op::AddrOf.class(), OpClass::Other);
        assert_eq!(Op::Deref.class(), OpClass::Other);
    }

    #[test]
    fn only_and_and_or_short_circuit() {
        assert!(Op::And.is_binary_logical_short_circuit());
        assert!(Op::Or.is_binary_logical_short_circuit());
        assert!(!Op::Not.is_binary_logical_short_circuit());
        assert!(!Op::EqualTo.is_binary_logical_short_circuit());
    }

    #[test]
    fn assignments_fold_right_in_call_syntax() {
        assert!(Op::Assign.is_right_associative());
        assert!(Op::RefAssign.is_right_associative());
        assert!(!Op::Add.is_right_associative());
    }

    #[test]
    fn numbers_are_ct_const() {
        let n = Expr::number(42.0, FundaType::Int, Span::default());
        assert!(n.is_ct_const());
    }

    #[test]
    fn casts_of_ct_consts_are_ct_const() {
        let n = Expr::number(0.0, FundaType::Bool, Span::default());
        let cast = Expr::new(
            ExprKind::Cast {
                ty: TypeExpr::funda(FundaType::Int, Span::default()),
                arg: Box::new(n),
            },
            Span::default(),
        );
        assert!(cast.is_ct_const());
    }

    #[test]
    fn symbols_are_not_ct_const() {
        let sym = Expr::new(
            ExprKind::Symbol {
                name: Symbol::EMPTY,
            },
            Span::default(),
        );
        assert!(!sym.is_ct_const());
    }

    #[test]
    fn fresh_nodes_have_undefined_access_and_no_object() {
        let n = Expr::number(1.0, FundaType::Int, Span::default());
        assert_eq!(n.access, Access::Undefined);
        assert!(n.object.is_none());
    }
}
