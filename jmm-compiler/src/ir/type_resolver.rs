//! Expression type resolution used by the IR builder.

use super::ast::{BinOp, Expr};
use super::symbol_table::{method_signature, MethodTable, SymbolTable, Type};

/// What the resolver knows about the position an expression appears in.
#[derive(Debug, Clone, Copy)]
pub struct ResolveCtx<'a> {
    pub method: &'a MethodTable,
    /// Type the surrounding context wants, e.g. the assignment target.
    pub expected: Option<&'a Type>,
}

impl<'a> ResolveCtx<'a> {
    pub fn new(method: &'a MethodTable) -> Self {
        Self {
            method,
            expected: None,
        }
    }

    pub fn expecting(self, expected: Option<&'a Type>) -> Self {
        Self { expected, ..self }
    }
}

/// Resolves the static type of an expression.
pub trait TypeResolver {
    fn resolve_expression_type(&self, expr: &Expr, ctx: &ResolveCtx<'_>) -> Option<Type>;
}

/// Default resolver backed by the analyzer's symbol table.
pub struct SymbolTableResolver<'a> {
    table: &'a SymbolTable,
}

impl<'a> SymbolTableResolver<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    fn resolve_call(
        &self,
        receiver: &Expr,
        method: &str,
        args: &[Expr],
        annotated: Option<&Type>,
        ctx: &ResolveCtx<'_>,
    ) -> Option<Type> {
        if let Some(ty) = annotated {
            return Some(ty.clone());
        }

        let on_own_class = match receiver {
            Expr::This => true,
            _ => matches!(
                self.resolve_expression_type(receiver, &ctx.expecting(None)),
                Some(Type::Class(ref name)) if *name == self.table.class_name
            ),
        };

        if on_own_class {
            // Overloads share a name, so match the full signature first.
            let arg_types: Option<Vec<Type>> = args
                .iter()
                .map(|a| self.resolve_expression_type(a, &ctx.expecting(None)))
                .collect();
            let exact = arg_types.and_then(|types| self.table.method(&method_signature(method, &types)));
            if let Some(m) = exact.or_else(|| self.table.method_by_name(method)) {
                return Some(m.return_type.clone());
            }
        }

        // Imported or inherited method: trust the context, otherwise void.
        Some(ctx.expected.cloned().unwrap_or(Type::Void))
    }
}

impl TypeResolver for SymbolTableResolver<'_> {
    fn resolve_expression_type(&self, expr: &Expr, ctx: &ResolveCtx<'_>) -> Option<Type> {
        match expr {
            Expr::Int(_) => Some(Type::Int),
            Expr::Bool(_) => Some(Type::Boolean),
            Expr::Binary { op, .. } => Some(match op {
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => Type::Int,
                BinOp::Lt | BinOp::And => Type::Boolean,
            }),
            Expr::Not(_) => Some(Type::Boolean),
            Expr::Ident(name) => match self.table.lookup(ctx.method, name) {
                Some(sym) => Some(sym.ty.clone()),
                None if self.table.is_imported(name) || *name == self.table.class_name => {
                    Some(Type::Class(name.clone()))
                }
                None => None,
            },
            Expr::This => Some(Type::Class(self.table.class_name.clone())),
            Expr::Call {
                receiver,
                method,
                args,
                ty,
            } => self.resolve_call(receiver, method, args, ty.as_ref(), ctx),
            Expr::Length(_) => Some(Type::Int),
            Expr::NewObject(class) => Some(Type::Class(class.clone())),
            Expr::NewIntArray(_) => Some(Type::int_array()),
            Expr::Index { array, .. } => self
                .resolve_expression_type(array, &ctx.expecting(None))
                .and_then(|t| t.element().cloned()),
        }
    }
}
