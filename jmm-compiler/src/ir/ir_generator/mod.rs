//! AST to IR lowering module.
//!
//! This module handles the translation of the annotated tree into
//! per-method lists of typed IR instructions.

pub mod context;
pub mod stmt;
pub mod expr;

use crate::ir::ast::{MethodDecl, Program};
use crate::ir::symbol_table::{SymbolTable, Type};
use crate::ir::type_resolver::TypeResolver;
use crate::ir::*;
use crate::report::Stage;
use crate::CompileError;

/// The main Gen struct that orchestrates the lowering of one method.
pub use context::Gen;

/// Entry point for lowering a program to a class unit.
pub fn lower(
    program: &Program,
    table: &SymbolTable,
    resolver: &dyn TypeResolver,
) -> Result<ClassUnit, CompileError> {
    let class = &program.class;

    let fields = class
        .fields
        .iter()
        .map(|f| Variable::new(f.name.clone(), IrType::from(&f.ty), VarRole::Field))
        .collect();

    let mut methods = vec![constructor(&class.name)];
    for decl in &class.methods {
        methods.push(lower_method(decl, table, resolver)?);
    }

    Ok(ClassUnit {
        name: class.name.clone(),
        superclass: class.extends.clone(),
        imports: program.imports.clone(),
        fields,
        methods,
    })
}

/// `.construct Name().V` calling the superclass initializer.
fn constructor(class: &str) -> Method {
    let init = Instr::Call {
        kind: CallKind::Special,
        target: Variable::this(class).into(),
        method: Some("<init>".to_string()),
        args: Vec::new(),
        ret: IrType::Void,
    };
    Method {
        name: class.to_string(),
        is_static: false,
        is_constructor: true,
        params: Vec::new(),
        return_type: IrType::Void,
        locals: Vec::new(),
        instrs: vec![
            LabeledInstr::new(init),
            LabeledInstr::new(Instr::Return {
                ty: IrType::Void,
                value: None,
            }),
        ],
    }
}

fn lower_method(
    decl: &MethodDecl,
    table: &SymbolTable,
    resolver: &dyn TypeResolver,
) -> Result<Method, CompileError> {
    let signature = decl.signature();
    let method_table = table.method(&signature).ok_or_else(|| {
        CompileError::internal(
            Stage::Llir,
            format!("method '{signature}' is missing from the symbol table"),
        )
    })?;

    let mut g = Gen::new(table, resolver, method_table, decl.is_static);
    for stmt in &decl.body {
        g.lower_stmt(stmt)?;
    }

    let return_type = IrType::from(&decl.return_type);
    match (&decl.return_type, &decl.ret) {
        (Type::Void, _) => g.emit(Instr::Return {
            ty: IrType::Void,
            value: None,
        }),
        (ty, Some(expr)) => {
            let value = g.eval_as_value(expr, Some(ty))?;
            g.emit(Instr::Return {
                ty: return_type.clone(),
                value: Some(value),
            });
        }
        (_, None) => {
            return Err(g.internal(format!(
                "non-void method '{signature}' has no return expression"
            )))
        }
    }

    let (instrs, temps) = g.finish()?;
    log::debug!(
        "lowered {signature}: {} instructions, {} temporaries",
        instrs.len(),
        temps.len()
    );

    let params = decl
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            Variable::new(
                p.name.clone(),
                IrType::from(&p.ty),
                VarRole::Parameter(i as u16 + 1),
            )
        })
        .collect();

    let mut locals: Vec<Variable> = method_table
        .locals
        .iter()
        .map(|l| Variable::local(l.name.clone(), IrType::from(&l.ty)))
        .collect();
    locals.extend(temps);

    Ok(Method {
        name: decl.name.clone(),
        is_static: decl.is_static,
        is_constructor: false,
        params,
        return_type,
        locals,
        instrs,
    })
}
