use super::context::{Gen, Named};
use super::stmt::new_object;
use crate::ir::ast::{BinOp as AstBinOp, Expr};
use crate::ir::symbol_table::Type;
use crate::ir::*;
use crate::CompileError;

impl Gen<'_> {
    /// Lower an expression into one instruction producing its value.
    ///
    /// Plain operands come back as `NoOp`. Sub-expressions are flattened
    /// into temporaries; the outermost node is returned unmaterialized so an
    /// assignment or expression statement can use it directly.
    pub fn lower_rhs(&mut self, e: &Expr, expected: Option<&Type>) -> Result<Instr, CompileError> {
        match e {
            Expr::Int(v) => Ok(Instr::NoOp(Operand::int(*v))),
            Expr::Bool(b) => Ok(Instr::NoOp(Operand::bool(*b))),
            Expr::This => Ok(Instr::NoOp(self.this_var().into())),
            Expr::Ident(name) => match self.lookup_variable(name)? {
                Named::Var(var) | Named::Class(var) => Ok(Instr::NoOp(var.into())),
                Named::Field(field) => Ok(Instr::GetField {
                    object: self.this_var().into(),
                    field,
                }),
            },
            Expr::Binary { op, left, right } => {
                let operand_ty = match op {
                    AstBinOp::And => Type::Boolean,
                    _ => Type::Int,
                };
                let left = self.eval_as_value(left, Some(&operand_ty))?;
                let right = self.eval_as_value(right, Some(&operand_ty))?;
                Ok(Instr::BinaryOp {
                    op: map_binop(*op),
                    left,
                    right,
                })
            }
            Expr::Not(inner) => {
                let operand = self.eval_as_value(inner, Some(&Type::Boolean))?;
                Ok(Instr::UnaryOp {
                    op: UnOp::Not,
                    operand,
                })
            }
            Expr::Call {
                receiver,
                method,
                args,
                ..
            } => self.lower_call(e, receiver, method, args, expected),
            Expr::Length(array) => {
                let array = self.eval_as_value(array, None)?;
                Ok(Instr::Call {
                    kind: CallKind::ArrayLength,
                    target: array,
                    method: None,
                    args: Vec::new(),
                    ret: IrType::Int32,
                })
            }
            Expr::NewObject(class) => {
                // Allocation and initialization always share a temporary,
                // unless the caller is an assignment that handles `new` itself.
                let t = self.new_temp(IrType::Object(class.clone()));
                self.emit(Instr::Assign {
                    dest: t.clone().into(),
                    ty: t.ty.clone(),
                    value: Box::new(new_object(class)),
                });
                self.emit_init(t.clone().into());
                Ok(Instr::NoOp(t.into()))
            }
            Expr::NewIntArray(size) => {
                let size = self.eval_as_value(size, Some(&Type::Int))?;
                Ok(Instr::Call {
                    kind: CallKind::NewArray,
                    target: size,
                    method: None,
                    args: Vec::new(),
                    ret: IrType::Array(Box::new(IrType::Int32)),
                })
            }
            Expr::Index { array, index } => {
                let array = match self.eval_as_value(array, None)? {
                    Operand::Variable(v) => v,
                    other => {
                        return Err(self.internal(format!("indexing a non-variable operand {other}")))
                    }
                };
                let ty = array
                    .ty
                    .element()
                    .cloned()
                    .ok_or_else(|| self.internal(format!("indexing non-array '{}'", array.name)))?;
                let index = self.eval_as_value(index, Some(&Type::Int))?;
                Ok(Instr::NoOp(Operand::ArrayElement {
                    array,
                    index: Box::new(index),
                    ty,
                }))
            }
        }
    }

    /// Lower an expression to a plain operand, materializing it into a new
    /// temporary unless it already is a literal or variable.
    pub fn eval_as_value(&mut self, e: &Expr, expected: Option<&Type>) -> Result<Operand, CompileError> {
        match self.lower_rhs(e, expected)? {
            Instr::NoOp(op) if op.is_simple() => Ok(op),
            instr => Ok(self.materialize(instr).into()),
        }
    }

    fn materialize(&mut self, instr: Instr) -> Variable {
        let ty = match instr.result_type() {
            // An external call whose type nothing could pin down still has
            // to produce a value here.
            IrType::Void => IrType::Int32,
            ty => ty,
        };
        let instr = match instr {
            Instr::Call {
                kind,
                target,
                method,
                args,
                ret: IrType::Void,
            } => Instr::Call {
                kind,
                target,
                method,
                args,
                ret: ty.clone(),
            },
            other => other,
        };
        let t = self.new_temp(ty.clone());
        self.emit(Instr::Assign {
            dest: t.clone().into(),
            ty,
            value: Box::new(instr),
        });
        t
    }

    fn lower_call(
        &mut self,
        whole: &Expr,
        receiver: &Expr,
        method: &str,
        args: &[Expr],
        expected: Option<&Type>,
    ) -> Result<Instr, CompileError> {
        let ret = IrType::from(&self.type_of(whole, expected)?);

        let (kind, target): (CallKind, Operand) = match receiver {
            Expr::This => (CallKind::Virtual, self.this_var().into()),
            Expr::Ident(name) => match self.classify(name) {
                Some(Named::Class(class)) => (CallKind::Static, class.into()),
                _ => (CallKind::Virtual, self.eval_as_value(receiver, None)?),
            },
            other => (CallKind::Virtual, self.eval_as_value(other, None)?),
        };

        let mut lowered = Vec::with_capacity(args.len());
        for arg in args {
            lowered.push(self.eval_as_value(arg, None)?);
        }

        Ok(Instr::Call {
            kind,
            target,
            method: Some(method.to_string()),
            args: lowered,
            ret,
        })
    }

    /// Lower a branch condition. `<`, `&&` and `!` become the branch
    /// operator itself; anything else is tested for truth.
    pub fn lower_condition(&mut self, cond: &Expr) -> Result<Condition, CompileError> {
        match cond {
            Expr::Binary {
                op: op @ (AstBinOp::Lt | AstBinOp::And),
                left,
                right,
            } => {
                let operand_ty = if *op == AstBinOp::And { Type::Boolean } else { Type::Int };
                let left = self.eval_as_value(left, Some(&operand_ty))?;
                let right = self.eval_as_value(right, Some(&operand_ty))?;
                Ok(Condition::Binary {
                    op: map_binop(*op),
                    left,
                    right,
                })
            }
            Expr::Not(inner) => {
                let operand = self.eval_as_value(inner, Some(&Type::Boolean))?;
                Ok(Condition::Unary {
                    op: UnOp::Not,
                    operand,
                })
            }
            other => Ok(Condition::Single(self.eval_as_value(other, Some(&Type::Boolean))?)),
        }
    }
}

pub fn map_binop(op: AstBinOp) -> BinOp {
    match op {
        AstBinOp::Add => BinOp::Add,
        AstBinOp::Sub => BinOp::Sub,
        AstBinOp::Mul => BinOp::Mul,
        AstBinOp::Div => BinOp::Div,
        AstBinOp::Lt => BinOp::Lt,
        AstBinOp::And => BinOp::And,
    }
}
