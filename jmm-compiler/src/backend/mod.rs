//! Backend: register allocation and Jasmin emission.
//!
//! Module layout:
//! - `cfg`:          successors, label positions, use/def sets
//! - `liveness`:     iterative backward dataflow
//! - `interference`: interference graph built from live-out sets
//! - `regalloc`:     allocator trait, natural and graph-coloring allocators
//! - `jasmin`:       JVM assembly emission

pub mod cfg;
pub mod interference;
pub mod jasmin;
pub mod liveness;
pub mod regalloc;

pub use regalloc::AllocatorKind;

use crate::config::BackendConfig;
use crate::ir::ClassUnit;
use crate::CompileError;

/// Assign registers to every variable of every method in `unit`.
///
/// With a register bound the graph-coloring allocator runs; without one
/// each local keeps its declaration-order slot.
pub fn allocate_registers(unit: &mut ClassUnit, config: &BackendConfig) -> Result<(), CompileError> {
    let kind = AllocatorKind::from_config(config);
    let allocator = kind.allocator();

    for method in &mut unit.methods {
        let map = allocator.allocate(method)?;
        regalloc::apply_registers(method, &map)?;
        log::debug!("{}: registers {:?}", method.name, map);
    }

    if let AllocatorKind::GraphColoring { k } = kind {
        log::info!("allocated {} methods with at most {k} local registers", unit.methods.len());
    }
    Ok(())
}
