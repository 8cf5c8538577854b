//! Per-method Jasmin emission with operand-stack tracking.

use super::instruction::{InvokeKind, JasminItem, JvmInstr};
use super::{optimize, ClassNames};
use crate::ir::*;
use crate::report::Stage;
use crate::CompileError;
use std::collections::BTreeMap;

fn generation_error(message: String) -> CompileError {
    CompileError::internal(Stage::Generation, message)
}

// ============================================================================
// Emission context
// ============================================================================

/// Output and stack bookkeeping for one method. Created per method and
/// consumed by [`EmitContext::finish`].
#[derive(Debug, Default)]
pub struct EmitContext {
    items: Vec<JasminItem>,
    depth: u16,
    max_depth: u16,
    /// Stack depth on entry to each label, recorded at the first branch to it.
    label_depth: BTreeMap<String, u16>,
    /// The previous instruction never falls through.
    unreachable: bool,
    compare_count: usize,
}

/// A finished method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    pub items: Vec<JasminItem>,
    pub max_stack: u16,
}

impl EmitContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    pub fn max_depth(&self) -> u16 {
        self.max_depth
    }

    pub fn emit(&mut self, instr: JvmInstr) -> Result<(), CompileError> {
        let (pops, pushes) = instr.stack_effect();
        let base = self
            .depth
            .checked_sub(pops)
            .ok_or_else(|| generation_error(format!("operand stack underflow at '{instr}'")))?;
        self.depth = base + pushes;
        self.max_depth = self.max_depth.max(self.depth);

        if let Some(target) = instr.branch_target() {
            self.label_depth
                .entry(target.to_string())
                .or_insert(self.depth);
        }
        self.unreachable = instr.ends_block();
        self.items.push(JasminItem::Instr(instr));
        Ok(())
    }

    pub fn label(&mut self, label: &str) {
        if self.unreachable {
            self.depth = self.label_depth.get(label).copied().unwrap_or(0);
        }
        self.unreachable = false;
        self.items.push(JasminItem::Label(label.to_string()));
    }

    /// `(true, end)` labels for a value-producing comparison.
    fn compare_labels(&mut self) -> (String, String) {
        self.compare_count += 1;
        let n = self.compare_count;
        (format!("cmp_true_{n}"), format!("cmp_end_{n}"))
    }

    pub fn finish(self) -> MethodBody {
        MethodBody {
            items: self.items,
            max_stack: self.max_depth,
        }
    }
}

// ============================================================================
// Method emitter
// ============================================================================

pub struct MethodEmitter<'a> {
    names: &'a ClassNames<'a>,
    method: &'a Method,
    optimize: bool,
    ctx: EmitContext,
}

impl<'a> MethodEmitter<'a> {
    pub fn new(names: &'a ClassNames<'a>, method: &'a Method, optimize: bool) -> Self {
        Self {
            names,
            method,
            optimize,
            ctx: EmitContext::new(),
        }
    }

    pub fn run(mut self) -> Result<MethodBody, CompileError> {
        for li in &self.method.instrs {
            for label in &li.labels {
                self.ctx.label(label);
            }
            self.emit_instr(&li.instr)?;
            if self.ctx.depth() != 0 {
                return Err(generation_error(format!(
                    "{} values left on the stack after '{}' in method '{}'",
                    self.ctx.depth(),
                    li.instr,
                    self.method.name
                )));
            }
        }
        Ok(self.ctx.finish())
    }

    fn push(&mut self, instr: JvmInstr) -> Result<(), CompileError> {
        self.ctx.emit(instr)
    }

    // ── Statements ──────────────────────────────────────────────────────

    fn emit_instr(&mut self, instr: &Instr) -> Result<(), CompileError> {
        match instr {
            Instr::Assign { dest, value, .. } => self.emit_assign(dest, value),
            Instr::Call { ret, .. } => {
                self.emit_call(instr)?;
                if *ret != IrType::Void {
                    self.push(JvmInstr::Pop)?;
                }
                Ok(())
            }
            Instr::PutField {
                object,
                field,
                value,
            } => {
                self.load(object)?;
                self.load(value)?;
                self.push(JvmInstr::PutField {
                    class: self.names.own(),
                    name: field.name.clone(),
                    descriptor: self.names.descriptor(&field.ty),
                })
            }
            Instr::CondBranch { cond, target } => self.emit_branch(cond, target),
            Instr::Goto(label) => self.push(JvmInstr::Goto(label.clone())),
            Instr::Return { ty, value } => match value {
                Some(v) => {
                    self.load(v)?;
                    self.push(if ty.is_integer() {
                        JvmInstr::Ireturn
                    } else {
                        JvmInstr::Areturn
                    })
                }
                None => self.push(JvmInstr::Return),
            },
            Instr::NoOp(_) | Instr::BinaryOp { .. } | Instr::UnaryOp { .. } | Instr::GetField { .. } => {
                self.emit_value(instr)?;
                self.push(JvmInstr::Pop)
            }
        }
    }

    fn emit_assign(&mut self, dest: &Operand, value: &Instr) -> Result<(), CompileError> {
        if self.optimize {
            if let Some((reg, delta)) = optimize::increment(dest, value) {
                return self.push(JvmInstr::Iinc { reg, delta });
            }
        }

        match dest {
            Operand::Variable(var) => {
                self.emit_value(value)?;
                self.store(var)
            }
            Operand::ArrayElement { array, index, ty } => {
                self.load_var(array)?;
                self.load(index)?;
                self.emit_value(value)?;
                self.push(if ty.is_integer() {
                    JvmInstr::Iastore
                } else {
                    JvmInstr::Aastore
                })
            }
            Operand::Literal { .. } => Err(generation_error(format!(
                "assignment to literal {dest} in method '{}'",
                self.method.name
            ))),
        }
    }

    fn emit_branch(&mut self, cond: &Condition, target: &str) -> Result<(), CompileError> {
        let target = target.to_string();
        match cond {
            Condition::Binary {
                op: BinOp::Lt,
                left,
                right,
            } => {
                self.load(left)?;
                self.load(right)?;
                self.push(JvmInstr::IfIcmplt(target))
            }
            Condition::Binary { op, left, right } => {
                self.load(left)?;
                self.load(right)?;
                self.push(arith(*op)?)?;
                self.push(JvmInstr::Ifne(target))
            }
            Condition::Unary {
                op: UnOp::Not,
                operand,
            } => {
                self.load(operand)?;
                self.push(JvmInstr::Ifeq(target))
            }
            Condition::Single(operand) => {
                self.load(operand)?;
                self.push(JvmInstr::Ifne(target))
            }
        }
    }

    // ── Values ──────────────────────────────────────────────────────────

    /// Emit code leaving exactly the instruction's value on the stack.
    fn emit_value(&mut self, instr: &Instr) -> Result<(), CompileError> {
        match instr {
            Instr::NoOp(op) => self.load(op),
            Instr::BinaryOp {
                op: BinOp::Lt,
                left,
                right,
            } => {
                let (on_true, end) = self.ctx.compare_labels();
                self.load(left)?;
                self.load(right)?;
                self.push(JvmInstr::IfIcmplt(on_true.clone()))?;
                self.push(JvmInstr::Iconst(0))?;
                self.push(JvmInstr::Goto(end.clone()))?;
                self.ctx.label(&on_true);
                self.push(JvmInstr::Iconst(1))?;
                self.ctx.label(&end);
                Ok(())
            }
            Instr::BinaryOp { op, left, right } => {
                self.load(left)?;
                self.load(right)?;
                self.push(arith(*op)?)
            }
            Instr::UnaryOp {
                op: UnOp::Not,
                operand,
            } => {
                self.load(operand)?;
                self.push(JvmInstr::Iconst(1))?;
                self.push(JvmInstr::Ixor)
            }
            Instr::Call { ret, .. } => {
                if *ret == IrType::Void {
                    return Err(generation_error(format!("void call used as a value: {instr}")));
                }
                self.emit_call(instr)
            }
            Instr::GetField { object, field } => {
                self.load(object)?;
                self.push(JvmInstr::GetField {
                    class: self.names.own(),
                    name: field.name.clone(),
                    descriptor: self.names.descriptor(&field.ty),
                })
            }
            other => Err(generation_error(format!("'{other}' does not produce a value"))),
        }
    }

    fn emit_call(&mut self, instr: &Instr) -> Result<(), CompileError> {
        let Instr::Call {
            kind,
            target,
            method,
            args,
            ret,
        } = instr
        else {
            return Err(generation_error(format!("'{instr}' is not a call")));
        };

        match kind {
            CallKind::Virtual | CallKind::Static | CallKind::Special => {
                let name = match (kind, method) {
                    (CallKind::Special, _) => "<init>".to_string(),
                    (_, Some(m)) => m.clone(),
                    (_, None) => {
                        return Err(generation_error(format!("call without a method name: {instr}")))
                    }
                };

                let class = match (kind, target) {
                    (CallKind::Static, Operand::Variable(v)) => self.names.qualify(&v.name),
                    (CallKind::Special, Operand::Variable(v)) if v.role == VarRole::This => {
                        self.names.superclass()
                    }
                    _ => self.names.class_of(target)?,
                };

                let invoke = match kind {
                    CallKind::Static => InvokeKind::Static,
                    CallKind::Special => InvokeKind::Special,
                    _ => InvokeKind::Virtual,
                };
                if invoke != InvokeKind::Static {
                    self.load(target)?;
                }
                for a in args {
                    self.load(a)?;
                }

                let arg_types: Vec<&IrType> = args.iter().map(Operand::ty).collect();
                self.push(JvmInstr::Invoke {
                    kind: invoke,
                    class,
                    name,
                    descriptor: self.names.method_descriptor(&arg_types, ret),
                    args: args.len() as u16,
                    returns_value: *ret != IrType::Void,
                })
            }
            CallKind::NewObject => {
                let class = match target {
                    Operand::Variable(v) => self.names.qualify(&v.name),
                    other => return Err(generation_error(format!("cannot instantiate {other}"))),
                };
                self.push(JvmInstr::New(class))
            }
            CallKind::NewArray => {
                self.load(target)?;
                match ret.element() {
                    Some(elem) if elem.is_integer() => self.push(JvmInstr::NewIntArray),
                    Some(elem) => {
                        let class = self.names.reference_name(elem);
                        self.push(JvmInstr::ANewArray(class))
                    }
                    None => Err(generation_error(format!("array allocation of non-array type {ret}"))),
                }
            }
            CallKind::ArrayLength => {
                self.load(target)?;
                self.push(JvmInstr::ArrayLength)
            }
        }
    }

    // ── Operands ────────────────────────────────────────────────────────

    fn load(&mut self, op: &Operand) -> Result<(), CompileError> {
        match op {
            Operand::Literal { value, .. } => self.push(JvmInstr::Iconst(*value)),
            Operand::Variable(v) => self.load_var(v),
            Operand::ArrayElement { array, index, ty } => {
                self.load_var(array)?;
                self.load(index)?;
                self.push(if ty.is_integer() {
                    JvmInstr::Iaload
                } else {
                    JvmInstr::Aaload
                })
            }
        }
    }

    fn load_var(&mut self, v: &Variable) -> Result<(), CompileError> {
        let reg = self.register(v)?;
        self.push(if v.ty.is_integer() {
            JvmInstr::Iload(reg)
        } else {
            JvmInstr::Aload(reg)
        })
    }

    fn store(&mut self, v: &Variable) -> Result<(), CompileError> {
        if v.role == VarRole::This {
            return Err(generation_error("cannot assign to 'this'".to_string()));
        }
        let reg = self.register(v)?;
        self.push(if v.ty.is_integer() {
            JvmInstr::Istore(reg)
        } else {
            JvmInstr::Astore(reg)
        })
    }

    fn register(&self, v: &Variable) -> Result<u16, CompileError> {
        match v.role {
            VarRole::Field | VarRole::Class => Err(generation_error(format!(
                "'{}' has no local slot in method '{}'",
                v.name, self.method.name
            ))),
            _ => v.register.ok_or_else(|| {
                generation_error(format!(
                    "no register assigned to '{}' in method '{}'",
                    v.name, self.method.name
                ))
            }),
        }
    }
}

fn arith(op: BinOp) -> Result<JvmInstr, CompileError> {
    match op {
        BinOp::Add => Ok(JvmInstr::Iadd),
        BinOp::Sub => Ok(JvmInstr::Isub),
        BinOp::Mul => Ok(JvmInstr::Imul),
        BinOp::Div => Ok(JvmInstr::Idiv),
        BinOp::And => Ok(JvmInstr::Iand),
        BinOp::Lt => Err(generation_error(
            "'<' has no single arithmetic instruction".to_string(),
        )),
    }
}
