//! Annotated syntax tree produced by the front end.
//!
//! The tree is a closed set of node kinds; every kind has a lowering rule in
//! `ir_generator`. It is deserialized from the JSON the analyzer emits.

use super::symbol_table::{method_signature, Symbol, Type};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub imports: Vec<String>,
    pub class: ClassDecl,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<Symbol>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub params: Vec<Symbol>,
    pub return_type: Type,
    #[serde(default)]
    pub body: Vec<Stmt>,
    /// Trailing `return <expr>;` of a non-void method.
    #[serde(default)]
    pub ret: Option<Expr>,
}

impl MethodDecl {
    pub fn signature(&self) -> String {
        let types: Vec<Type> = self.params.iter().map(|p| p.ty.clone()).collect();
        method_signature(&self.name, &types)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Box<Stmt>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    /// `name = value;`
    Assign {
        target: String,
        value: Expr,
    },
    /// `name[index] = value;`
    ArrayAssign {
        target: String,
        index: Expr,
        value: Expr,
    },
    /// Expression evaluated for its side effects.
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    And,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Int(i32),
    Bool(bool),
    Ident(String),
    This,
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    /// `receiver.method(args)`. `ty` is set by the analyzer when it could
    /// infer the return type of a call into an imported class.
    Call {
        receiver: Box<Expr>,
        method: String,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        ty: Option<Type>,
    },
    Length(Box<Expr>),
    NewObject(String),
    NewIntArray(Box<Expr>),
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
}

// ── Builders ────────────────────────────────────────────────────────────
// Used by tests and by callers assembling trees by hand.

impl Expr {
    pub fn int(v: i32) -> Self {
        Expr::Int(v)
    }

    pub fn ident(name: &str) -> Self {
        Expr::Ident(name.to_string())
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    pub fn call(receiver: Expr, method: &str, args: Vec<Expr>) -> Self {
        Expr::Call {
            receiver: Box::new(receiver),
            method: method.to_string(),
            args,
            ty: None,
        }
    }

    pub fn index(array: Expr, index: Expr) -> Self {
        Expr::Index {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    pub fn length(array: Expr) -> Self {
        Expr::Length(Box::new(array))
    }

    pub fn new_int_array(size: Expr) -> Self {
        Expr::NewIntArray(Box::new(size))
    }
}

impl Stmt {
    pub fn assign(target: &str, value: Expr) -> Self {
        Stmt::Assign {
            target: target.to_string(),
            value,
        }
    }

    pub fn array_assign(target: &str, index: Expr, value: Expr) -> Self {
        Stmt::ArrayAssign {
            target: target.to_string(),
            index,
            value,
        }
    }

    pub fn if_else(cond: Expr, then_branch: Stmt, else_branch: Stmt) -> Self {
        Stmt::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn while_loop(cond: Expr, body: Stmt) -> Self {
        Stmt::While {
            cond,
            body: Box::new(body),
        }
    }
}
