//! Backend configuration.

use crate::CompileError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendConfig {
    /// Enables the `iinc` peephole.
    pub optimize: bool,
    /// Upper bound on local registers. `None` skips graph coloring and keeps
    /// declaration-order registers.
    pub max_registers: Option<u16>,
}

impl BackendConfig {
    pub fn new(optimize: bool, max_registers: Option<u16>) -> Self {
        Self {
            optimize,
            max_registers,
        }
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        if self.max_registers == Some(0) {
            return Err(CompileError::Config {
                message: "register bound must be a positive integer".to_string(),
            });
        }
        Ok(())
    }
}
