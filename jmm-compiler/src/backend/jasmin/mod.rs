//! Jasmin backend: lowers register-resolved IR to JVM assembly text.
//!
//! Module layout:
//! - `instruction`: typed JVM instructions and their stack effects
//! - `emitter`:     per-method emission context and IR walk
//! - `optimize`:    peephole rewrites (`iinc`)

pub mod emitter;
pub mod instruction;
pub mod optimize;

pub use emitter::{EmitContext, MethodBody, MethodEmitter};
pub use instruction::{InvokeKind, JasminItem, JvmInstr};

use crate::config::BackendConfig;
use crate::ir::{ClassUnit, IrType, Method, Operand};
use crate::report::Stage;
use crate::CompileError;

const OBJECT_ROOT: &str = "java/lang/Object";

/// Resolves class names and type descriptors against the unit's imports.
pub struct ClassNames<'a> {
    unit: &'a ClassUnit,
}

impl<'a> ClassNames<'a> {
    pub fn new(unit: &'a ClassUnit) -> Self {
        Self { unit }
    }

    pub fn own(&self) -> String {
        self.unit.name.clone()
    }

    /// `a.b.C` for an imported `C` becomes `a/b/C`; other names are kept.
    pub fn qualify(&self, class: &str) -> String {
        if class == self.unit.name {
            return class.to_string();
        }
        self.unit
            .imports
            .iter()
            .find(|imp| imp.rsplit('.').next() == Some(class))
            .map(|imp| imp.replace('.', "/"))
            .unwrap_or_else(|| class.to_string())
    }

    pub fn superclass(&self) -> String {
        match &self.unit.superclass {
            Some(sup) => self.qualify(sup),
            None => OBJECT_ROOT.to_string(),
        }
    }

    pub fn descriptor(&self, ty: &IrType) -> String {
        match ty {
            IrType::Int32 => "I".to_string(),
            IrType::Bool => "Z".to_string(),
            IrType::Void => "V".to_string(),
            IrType::String => "Ljava/lang/String;".to_string(),
            IrType::Array(elem) => format!("[{}", self.descriptor(elem)),
            IrType::Object(name) => format!("L{};", self.qualify(name)),
        }
    }

    pub fn method_descriptor(&self, args: &[&IrType], ret: &IrType) -> String {
        let args: String = args.iter().map(|t| self.descriptor(t)).collect();
        format!("({args}){}", self.descriptor(ret))
    }

    /// Operand of `anewarray`: internal name for classes, descriptor for arrays.
    pub fn reference_name(&self, ty: &IrType) -> String {
        match ty {
            IrType::Object(name) => self.qualify(name),
            IrType::String => "java/lang/String".to_string(),
            other => self.descriptor(other),
        }
    }

    /// Owner class for a virtual call or `invokespecial` on `target`.
    pub fn class_of(&self, target: &Operand) -> Result<String, CompileError> {
        match target.ty() {
            IrType::Object(name) => Ok(self.qualify(name)),
            IrType::String => Ok("java/lang/String".to_string()),
            other => Err(CompileError::internal(
                Stage::Generation,
                format!("cannot invoke a method on {target} of type {other}"),
            )),
        }
    }
}

/// Emit one method body.
pub fn emit_method(
    names: &ClassNames<'_>,
    method: &Method,
    optimize: bool,
) -> Result<MethodBody, CompileError> {
    MethodEmitter::new(names, method, optimize).run()
}

fn method_header(names: &ClassNames<'_>, method: &Method) -> String {
    if method.is_constructor {
        return ".method public <init>()V".to_string();
    }
    let params: Vec<&IrType> = method.params.iter().map(|p| &p.ty).collect();
    let statik = if method.is_static { "static " } else { "" };
    format!(
        ".method public {statik}{}{}",
        method.name,
        names.method_descriptor(&params, &method.return_type)
    )
}

/// Emit the whole class as Jasmin text.
pub fn emit_class(unit: &ClassUnit, config: &BackendConfig) -> Result<String, CompileError> {
    let names = ClassNames::new(unit);
    let mut out = vec![
        format!(".class public {}", unit.name),
        format!(".super {}", names.superclass()),
        String::new(),
    ];

    for field in &unit.fields {
        out.push(format!(
            ".field private {} {}",
            field.name,
            names.descriptor(&field.ty)
        ));
    }
    if !unit.fields.is_empty() {
        out.push(String::new());
    }

    for method in &unit.methods {
        let body = emit_method(&names, method, config.optimize)?;
        let locals = method.max_register().map_or(0, |r| r + 1);
        log::debug!(
            "emitted {}: {} items, stack {}, locals {}",
            method.name,
            body.items.len(),
            body.max_stack,
            locals
        );

        out.push(method_header(&names, method));
        out.push(format!("  .limit stack {}", body.max_stack));
        out.push(format!("  .limit locals {locals}"));
        out.extend(body.items.iter().map(ToString::to_string));
        out.push(".end method".to_string());
        out.push(String::new());
    }

    Ok(out.join("\n"))
}
