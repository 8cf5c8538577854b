//! Peephole rewrites applied while emitting.

use crate::ir::{BinOp, Instr, IrType, Operand, VarRole, Variable};

/// Recognize `a = a + c`, `a = c + a` and `a = a - c` on an integer
/// register variable, returning `(register, delta)` for `iinc`.
pub fn increment(dest: &Operand, value: &Instr) -> Option<(u16, i32)> {
    let Operand::Variable(target) = dest else {
        return None;
    };
    if target.ty != IrType::Int32 || matches!(target.role, VarRole::Field | VarRole::This | VarRole::Class) {
        return None;
    }
    let reg = target.register?;

    let Instr::BinaryOp { op, left, right } = value else {
        return None;
    };

    let delta = match (op, left, right) {
        (BinOp::Add, Operand::Variable(v), Operand::Literal { value, .. })
        | (BinOp::Add, Operand::Literal { value, .. }, Operand::Variable(v))
            if same_slot(v, target) =>
        {
            *value
        }
        (BinOp::Sub, Operand::Variable(v), Operand::Literal { value, .. }) if same_slot(v, target) => {
            value.checked_neg()?
        }
        _ => return None,
    };

    (-128..=127).contains(&delta).then_some((reg, delta))
}

fn same_slot(a: &Variable, b: &Variable) -> bool {
    a.name == b.name && a.role == b.role && a.register == b.register
}
