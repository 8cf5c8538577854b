//! Liveness analysis over a method's instruction list.
//!
//! Classic backward dataflow iterated to a fixpoint:
//! `out[i] = ∪ in[s]` over successors, `in[i] = use[i] ∪ (out[i] − def[i])`.

use super::cfg::{ControlFlow, VarSet};

/// Live variable sets before and after every instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivenessInfo {
    pub live_in: Vec<VarSet>,
    pub live_out: Vec<VarSet>,
    /// Full passes made, including the final one that changed nothing.
    pub iterations: usize,
}

impl LivenessInfo {
    pub fn is_live_after(&self, idx: usize, var: &str) -> bool {
        self.live_out.get(idx).is_some_and(|s| s.contains(var))
    }

    /// Whether both dataflow equations hold at every instruction.
    pub fn is_fixpoint(&self, cfg: &ControlFlow) -> bool {
        (0..cfg.len()).all(|i| {
            let (new_in, new_out) = transfer(cfg, &self.live_in, i);
            new_in == self.live_in[i] && new_out == self.live_out[i]
        })
    }
}

/// Recompute `(in[i], out[i])` from the current `in` sets of the successors.
fn transfer(cfg: &ControlFlow, live_in: &[VarSet], i: usize) -> (VarSet, VarSet) {
    let mut out = VarSet::new();
    for &s in &cfg.succ[i] {
        out.extend(live_in[s].iter().cloned());
    }

    let mut inn = cfg.uses[i].clone();
    inn.extend(out.difference(&cfg.defs[i]).cloned());
    (inn, out)
}

pub fn compute_liveness(cfg: &ControlFlow) -> LivenessInfo {
    let n = cfg.len();
    let mut live_in = vec![VarSet::new(); n];
    let mut live_out = vec![VarSet::new(); n];
    let mut iterations = 0;

    loop {
        iterations += 1;
        let mut changed = false;

        for i in (0..n).rev() {
            let (new_in, new_out) = transfer(cfg, &live_in, i);
            if new_in != live_in[i] || new_out != live_out[i] {
                changed = true;
                live_in[i] = new_in;
                live_out[i] = new_out;
            }
        }

        if !changed {
            break;
        }
    }

    LivenessInfo {
        live_in,
        live_out,
        iterations,
    }
}
