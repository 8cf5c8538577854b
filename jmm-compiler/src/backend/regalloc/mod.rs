//! Register allocation interfaces and shared infrastructure.
//!
//! This module defines:
//! - [`RegAllocator`]: the trait both allocators implement.
//! - [`AllocatorKind`]: which allocator a configuration selects.
//! - [`apply_registers`]: writes a finished assignment back into the IR.

mod chaitin;

pub use chaitin::{color, GraphColoringAllocator};

use crate::config::BackendConfig;
use crate::ir::{Method, VarRole};
use crate::report::Stage;
use crate::CompileError;
use std::collections::BTreeMap;
use thiserror::Error;

/// Variable name to register index, before the receiver/parameter offset.
pub type RegisterMap = BTreeMap<String, u16>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegAllocError {
    #[error("Couldn't find a variable with degree < {k} ({remaining} variables left)")]
    NoLowDegreeVertex { remaining: usize, k: u16 },

    #[error("No more colors: variable '{variable}' needs more than {k} registers")]
    NoFreeColor { variable: String, k: u16 },
}

// ============================================================================
// Allocator selection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocatorKind {
    /// Declaration order, one register per variable.
    Natural,
    /// Liveness-driven graph coloring with at most `k` registers.
    GraphColoring { k: u16 },
}

impl AllocatorKind {
    pub fn from_config(config: &BackendConfig) -> Self {
        match config.max_registers {
            Some(k) => AllocatorKind::GraphColoring { k },
            None => AllocatorKind::Natural,
        }
    }

    pub fn allocator(self) -> Box<dyn RegAllocator> {
        match self {
            AllocatorKind::Natural => Box::new(NaturalAllocator),
            AllocatorKind::GraphColoring { k } => Box::new(GraphColoringAllocator::new(k)),
        }
    }
}

// ============================================================================
// Allocator trait
// ============================================================================

/// Assigns each local and temporary of a method a register index counted
/// from the first slot after the receiver and parameters.
pub trait RegAllocator {
    fn allocate(&self, method: &Method) -> Result<RegisterMap, CompileError>;
}

/// Every local and temporary gets its own slot, in declaration order.
pub struct NaturalAllocator;

impl RegAllocator for NaturalAllocator {
    fn allocate(&self, method: &Method) -> Result<RegisterMap, CompileError> {
        Ok(method
            .locals
            .iter()
            .filter(|v| v.is_allocatable())
            .enumerate()
            .map(|(i, v)| (v.name.clone(), i as u16))
            .collect())
    }
}

// ============================================================================
// Applying an assignment
// ============================================================================

/// Write registers into every variable of `method`: `this` in slot 0 for
/// instance methods, parameters next, then the allocated locals offset past
/// them.
pub fn apply_registers(method: &mut Method, map: &RegisterMap) -> Result<(), CompileError> {
    let offset = method.reserved_registers();
    let receiver = (!method.is_static) as u16;
    let name = method.name.clone();
    let mut missing = None;

    method.for_each_variable_mut(&mut |v| {
        let reg = match v.role {
            VarRole::This => Some(0),
            VarRole::Parameter(pos) => Some(receiver + pos - 1),
            VarRole::Local | VarRole::Temporary => match map.get(&v.name) {
                Some(r) => Some(offset + r),
                None => {
                    missing.get_or_insert_with(|| v.name.clone());
                    None
                }
            },
            VarRole::Field | VarRole::Class => None,
        };
        v.register = reg;
    });

    match missing {
        Some(var) => Err(CompileError::internal(
            Stage::Optimization,
            format!("no register for '{var}' in method '{name}'"),
        )),
        None => Ok(()),
    }
}
