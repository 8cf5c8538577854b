//! Control-flow indexing: successors, label positions and use/def sets.
//!
//! Only locals and temporaries take part; parameters, fields and the
//! receiver live in fixed slots and never compete for registers.

use crate::ir::{Condition, Instr, Method, Operand, Variable};
use crate::report::Stage;
use crate::CompileError;
use std::collections::{BTreeMap, BTreeSet};

pub type VarSet = BTreeSet<String>;

/// Per-instruction control-flow facts for one method.
#[derive(Debug, Clone, Default)]
pub struct ControlFlow {
    pub succ: Vec<Vec<usize>>,
    pub uses: Vec<VarSet>,
    pub defs: Vec<VarSet>,
    pub labels: BTreeMap<String, usize>,
}

impl ControlFlow {
    pub fn len(&self) -> usize {
        self.succ.len()
    }

    pub fn is_empty(&self) -> bool {
        self.succ.is_empty()
    }
}

pub fn build(method: &Method) -> Result<ControlFlow, CompileError> {
    let n = method.instrs.len();

    let mut labels = BTreeMap::new();
    for (i, li) in method.instrs.iter().enumerate() {
        for label in &li.labels {
            if labels.insert(label.clone(), i).is_some() {
                return Err(CompileError::internal(
                    Stage::Optimization,
                    format!("label '{label}' defined twice in method '{}'", method.name),
                ));
            }
        }
    }

    let resolve = |label: &str| {
        labels.get(label).copied().ok_or_else(|| {
            CompileError::internal(
                Stage::Optimization,
                format!("branch to unknown label '{label}' in method '{}'", method.name),
            )
        })
    };

    let mut succ = Vec::with_capacity(n);
    let mut uses = Vec::with_capacity(n);
    let mut defs = Vec::with_capacity(n);

    for (i, instr) in method.instructions().enumerate() {
        let mut s = Vec::new();
        match instr {
            Instr::Goto(label) => s.push(resolve(label)?),
            Instr::Return { .. } => {}
            Instr::CondBranch { target, .. } => {
                if i + 1 < n {
                    s.push(i + 1);
                }
                let t = resolve(target)?;
                if !s.contains(&t) {
                    s.push(t);
                }
            }
            _ => {
                if i + 1 < n {
                    s.push(i + 1);
                }
            }
        }
        succ.push(s);
        uses.push(get_uses(instr));
        defs.push(get_defs(instr));
    }

    Ok(ControlFlow {
        succ,
        uses,
        defs,
        labels,
    })
}

// ── Instruction-level use/def extraction ────────────────────────────────

fn add_operand(set: &mut VarSet, op: &Operand) {
    for v in op.variables() {
        add_var(set, v);
    }
}

fn add_var(set: &mut VarSet, v: &Variable) {
    if v.is_allocatable() {
        set.insert(v.name.clone());
    }
}

/// Variables read by an instruction.
pub fn get_uses(instr: &Instr) -> VarSet {
    let mut uses = VarSet::new();
    collect_uses(instr, &mut uses);
    uses
}

fn collect_uses(instr: &Instr, uses: &mut VarSet) {
    match instr {
        Instr::Assign { dest, value, .. } => {
            // An element store reads the array reference and the index.
            if let Operand::ArrayElement { .. } = dest {
                add_operand(uses, dest);
            }
            collect_uses(value, uses);
        }
        Instr::BinaryOp { left, right, .. } => {
            add_operand(uses, left);
            add_operand(uses, right);
        }
        Instr::UnaryOp { operand, .. } | Instr::NoOp(operand) => add_operand(uses, operand),
        Instr::Call { target, args, .. } => {
            add_operand(uses, target);
            for a in args {
                add_operand(uses, a);
            }
        }
        Instr::GetField { object, .. } => add_operand(uses, object),
        Instr::PutField { object, value, .. } => {
            add_operand(uses, object);
            add_operand(uses, value);
        }
        Instr::CondBranch { cond, .. } => match cond {
            Condition::Binary { left, right, .. } => {
                add_operand(uses, left);
                add_operand(uses, right);
            }
            Condition::Unary { operand, .. } | Condition::Single(operand) => {
                add_operand(uses, operand)
            }
        },
        Instr::Return { value, .. } => {
            if let Some(v) = value {
                add_operand(uses, v);
            }
        }
        Instr::Goto(_) => {}
    }
}

/// Variables written by an instruction.
pub fn get_defs(instr: &Instr) -> VarSet {
    let mut defs = VarSet::new();
    if let Instr::Assign { dest, .. } = instr {
        match dest {
            Operand::Variable(v) => add_var(&mut defs, v),
            Operand::ArrayElement { array, .. } => add_var(&mut defs, array),
            Operand::Literal { .. } => {}
        }
    }
    defs
}
