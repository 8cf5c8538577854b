use super::context::{Gen, Named};
use crate::ir::ast::{Expr, Stmt};
use crate::ir::symbol_table::Type;
use crate::ir::*;
use crate::CompileError;

impl Gen<'_> {
    pub fn lower_stmt(&mut self, s: &Stmt) -> Result<(), CompileError> {
        match s {
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.lower_stmt(s)?;
                }
                Ok(())
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => self.lower_if(cond, then_branch, else_branch),
            Stmt::While { cond, body } => self.lower_while(cond, body),
            Stmt::Assign { target, value } => self.lower_assign(target, value),
            Stmt::ArrayAssign {
                target,
                index,
                value,
            } => self.lower_array_assign(target, index, value),
            Stmt::Expr(expr) => {
                let instr = self.lower_rhs(expr, None)?;
                self.emit(instr);
                Ok(())
            }
        }
    }

    /// ```text
    ///     if (cond) goto thenN;
    ///     <else>
    ///     goto endifN;
    /// thenN:
    ///     <then>
    /// endifN:
    /// ```
    pub fn lower_if(&mut self, cond: &Expr, then_branch: &Stmt, else_branch: &Stmt) -> Result<(), CompileError> {
        let (then_label, end_label) = self.new_if_labels();

        let cond = self.lower_condition(cond)?;
        self.emit(Instr::CondBranch {
            cond,
            target: then_label.clone(),
        });

        self.lower_stmt(else_branch)?;
        self.emit(Instr::Goto(end_label.clone()));

        self.place_label(then_label);
        self.lower_stmt(then_branch)?;
        self.place_label(end_label);
        Ok(())
    }

    /// ```text
    /// loopN:
    ///     if (cond) goto bodyN;
    ///     goto endloopN;
    /// bodyN:
    ///     <body>
    ///     goto loopN;
    /// endloopN:
    /// ```
    pub fn lower_while(&mut self, cond: &Expr, body: &Stmt) -> Result<(), CompileError> {
        let (loop_label, body_label, end_label) = self.new_while_labels();

        // The condition is evaluated after the loop label so every
        // iteration recomputes it.
        self.place_label(loop_label.clone());
        let cond = self.lower_condition(cond)?;
        self.emit(Instr::CondBranch {
            cond,
            target: body_label.clone(),
        });
        self.emit(Instr::Goto(end_label.clone()));

        self.place_label(body_label);
        self.lower_stmt(body)?;
        self.emit(Instr::Goto(loop_label));
        self.place_label(end_label);
        Ok(())
    }

    fn lower_assign(&mut self, target: &str, value: &Expr) -> Result<(), CompileError> {
        let declared = self.declared_type(target)?;

        match self.lookup_variable(target)? {
            Named::Field(field) => {
                // putfield only takes plain operands; anything else,
                // getfield and new included, goes through a temporary.
                let value = self.eval_as_value(value, Some(&declared))?;
                self.emit(Instr::PutField {
                    object: self.this_var().into(),
                    field,
                    value,
                });
            }
            Named::Var(var) => {
                let ty = var.ty.clone();
                if let Expr::NewObject(class) = value {
                    self.emit(Instr::Assign {
                        dest: var.clone().into(),
                        ty,
                        value: Box::new(new_object(class)),
                    });
                    self.emit_init(var.into());
                } else {
                    let rhs = self.lower_rhs(value, Some(&declared))?;
                    self.emit(Instr::Assign {
                        dest: var.into(),
                        ty,
                        value: Box::new(rhs),
                    });
                }
            }
            Named::Class(_) => {
                return Err(self.internal(format!("cannot assign to class name '{target}'")))
            }
        }
        Ok(())
    }

    fn lower_array_assign(&mut self, target: &str, index: &Expr, value: &Expr) -> Result<(), CompileError> {
        let declared = self.declared_type(target)?;
        let elem = declared
            .element()
            .cloned()
            .ok_or_else(|| self.internal(format!("'{target}' is indexed but is not an array")))?;

        let array = match self.lookup_variable(target)? {
            Named::Var(var) => var,
            Named::Field(field) => self.load_field(field),
            Named::Class(_) => {
                return Err(self.internal(format!("cannot index class name '{target}'")))
            }
        };

        let index = self.eval_as_value(index, Some(&Type::Int))?;
        let rhs = self.lower_rhs(value, Some(&elem))?;
        let elem_ty = IrType::from(&elem);
        self.emit(Instr::Assign {
            dest: Operand::ArrayElement {
                array,
                index: Box::new(index),
                ty: elem_ty.clone(),
            },
            ty: elem_ty,
            value: Box::new(rhs),
        });
        Ok(())
    }

    /// Copy a field into a fresh temporary.
    pub fn load_field(&mut self, field: Variable) -> Variable {
        let t = self.new_temp(field.ty.clone());
        self.emit(Instr::Assign {
            dest: t.clone().into(),
            ty: field.ty.clone(),
            value: Box::new(Instr::GetField {
                object: self.this_var().into(),
                field,
            }),
        });
        t
    }

    /// `invokespecial(obj, "<init>").V`
    pub fn emit_init(&mut self, object: Operand) {
        self.emit(Instr::Call {
            kind: CallKind::Special,
            target: object,
            method: Some("<init>".to_string()),
            args: Vec::new(),
            ret: IrType::Void,
        });
    }
}

/// `new(Class).Class`
pub fn new_object(class: &str) -> Instr {
    Instr::Call {
        kind: CallKind::NewObject,
        target: Variable::class(class).into(),
        method: None,
        args: Vec::new(),
        ret: IrType::Object(class.to_string()),
    }
}
