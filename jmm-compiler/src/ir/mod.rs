//! Intermediate Representation (IR) module.
//!
//! This module contains the annotated tree and symbol table handed over by
//! semantic analysis, the typed IR definitions, and the tree-to-IR builder.

pub mod ir;
pub use ir::*;
pub mod ast;
pub mod ir_generator;
pub mod symbol_table;
pub mod type_resolver;
pub use type_resolver::{ResolveCtx, SymbolTableResolver, TypeResolver};
