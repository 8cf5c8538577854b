use crate::ir::ast::Expr;
use crate::ir::symbol_table::{MethodTable, SymbolTable, Type};
use crate::ir::type_resolver::{ResolveCtx, TypeResolver};
use crate::ir::*;
use crate::report::Stage;
use crate::CompileError;

/// How a name used inside a method body resolves.
#[derive(Debug, Clone)]
pub enum Named {
    /// Local or parameter, addressed directly.
    Var(Variable),
    /// Field of `this`, read with `getfield` and written with `putfield`.
    Field(Variable),
    /// Imported class or the class itself, only valid as a call target.
    Class(Variable),
}

/// Lowering state for a single method. A fresh `Gen` is created per method,
/// so temporaries and label counters never leak across methods.
pub struct Gen<'a> {
    pub table: &'a SymbolTable,
    pub resolver: &'a dyn TypeResolver,
    pub method: &'a MethodTable,
    pub is_static: bool,
    pub instrs: Vec<LabeledInstr>,
    pub temps: Vec<Variable>,
    pub temp_count: usize,
    pub if_count: usize,
    pub while_count: usize,
    /// Labels waiting for the next emitted instruction.
    pub pending_labels: Vec<String>,
}

impl<'a> Gen<'a> {
    pub fn new(
        table: &'a SymbolTable,
        resolver: &'a dyn TypeResolver,
        method: &'a MethodTable,
        is_static: bool,
    ) -> Self {
        Self {
            table,
            resolver,
            method,
            is_static,
            instrs: Vec::new(),
            temps: Vec::new(),
            temp_count: 0,
            if_count: 0,
            while_count: 0,
            pending_labels: Vec::new(),
        }
    }

    /// Hand back the instruction list and the temporaries in creation order.
    pub fn finish(self) -> Result<(Vec<LabeledInstr>, Vec<Variable>), CompileError> {
        if !self.pending_labels.is_empty() {
            return Err(CompileError::internal(
                Stage::Llir,
                format!(
                    "labels {:?} in method '{}' do not precede any instruction",
                    self.pending_labels, self.method.name
                ),
            ));
        }
        Ok((self.instrs, self.temps))
    }

    /// Next `tN` not already taken by a local, parameter or field.
    pub fn new_temp(&mut self, ty: IrType) -> Variable {
        let name = loop {
            self.temp_count += 1;
            let candidate = format!("t{}", self.temp_count);
            if self.table.lookup(self.method, &candidate).is_none() {
                break candidate;
            }
        };
        let var = Variable::temp(name, ty);
        self.temps.push(var.clone());
        var
    }

    /// `(thenN, endifN)`
    pub fn new_if_labels(&mut self) -> (String, String) {
        self.if_count += 1;
        let n = self.if_count;
        (format!("then{n}"), format!("endif{n}"))
    }

    /// `(loopN, bodyN, endloopN)`
    pub fn new_while_labels(&mut self) -> (String, String, String) {
        self.while_count += 1;
        let n = self.while_count;
        (format!("loop{n}"), format!("body{n}"), format!("endloop{n}"))
    }

    pub fn place_label(&mut self, label: String) {
        self.pending_labels.push(label);
    }

    pub fn emit(&mut self, instr: Instr) {
        let labels = std::mem::take(&mut self.pending_labels);
        self.instrs.push(LabeledInstr { labels, instr });
    }

    pub fn this_var(&self) -> Variable {
        Variable::this(&self.table.class_name)
    }

    pub fn classify(&self, name: &str) -> Option<Named> {
        if let Some(sym) = self.method.local(name) {
            return Some(Named::Var(Variable::local(name, IrType::from(&sym.ty))));
        }
        if let Some((pos, sym)) = self.method.parameter(name) {
            return Some(Named::Var(Variable::new(
                name,
                IrType::from(&sym.ty),
                VarRole::Parameter(pos),
            )));
        }
        if let Some(sym) = self.table.field(name) {
            return Some(Named::Field(Variable::new(
                name,
                IrType::from(&sym.ty),
                VarRole::Field,
            )));
        }
        if self.table.is_imported(name) || name == self.table.class_name {
            return Some(Named::Class(Variable::class(name)));
        }
        None
    }

    pub fn lookup_variable(&self, name: &str) -> Result<Named, CompileError> {
        self.classify(name).ok_or_else(|| {
            self.internal(format!(
                "'{name}' is not a local, parameter, field or class in method '{}'",
                self.method.name
            ))
        })
    }

    /// Declared type of a local, parameter or field.
    pub fn declared_type(&self, name: &str) -> Result<Type, CompileError> {
        self.table
            .lookup(self.method, name)
            .map(|s| s.ty.clone())
            .ok_or_else(|| self.internal(format!("no declaration for '{name}'")))
    }

    pub fn type_of(&self, expr: &Expr, expected: Option<&Type>) -> Result<Type, CompileError> {
        let ctx = ResolveCtx::new(self.method).expecting(expected);
        self.resolver
            .resolve_expression_type(expr, &ctx)
            .ok_or_else(|| self.internal(format!("cannot resolve the type of {expr:?}")))
    }

    pub fn internal(&self, message: String) -> CompileError {
        CompileError::internal(Stage::Llir, message)
    }
}
