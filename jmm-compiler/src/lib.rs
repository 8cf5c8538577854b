pub mod backend;
pub mod config;
pub mod ir;
pub mod report;

pub use backend::regalloc::RegAllocError;
pub use config::BackendConfig;
pub use report::{Report, ReportType, Stage};

use ir::ast::Program;
use ir::symbol_table::SymbolTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message echoed when the backend refuses to run on a failed analysis.
pub const PREVIOUS_STAGE_MESSAGE: &str =
    "Started ollir generation but there are errors from previous stage";

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Started ollir generation but there are errors from previous stage")]
    PreviousStage,

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Register allocation failed in method '{method}': {source}")]
    Allocation {
        method: String,
        #[source]
        source: RegAllocError,
    },

    #[error("Internal error during {stage}: {message}")]
    Internal { stage: Stage, message: String },
}

impl CompileError {
    pub fn internal(stage: Stage, message: impl Into<String>) -> Self {
        CompileError::Internal {
            stage,
            message: message.into(),
        }
    }

    /// The stage a failure belongs to, used when it is turned into a report.
    pub fn stage(&self) -> Stage {
        match self {
            CompileError::PreviousStage => Stage::Llir,
            CompileError::Config { .. } => Stage::Optimization,
            CompileError::Allocation { .. } => Stage::Optimization,
            CompileError::Internal { stage, .. } => *stage,
        }
    }

    pub fn to_report(&self) -> Report {
        Report::error(self.stage(), None, self.to_string())
    }
}

/// Everything semantic analysis hands over to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticsResult {
    pub root: Program,
    pub symbol_table: SymbolTable,
    #[serde(default)]
    pub reports: Vec<Report>,
}

impl SemanticsResult {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Result of a successful compilation unit.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub ir: ir::ClassUnit,
    pub jasmin: String,
    /// Upstream reports followed by anything the backend produced.
    pub reports: Vec<Report>,
}

/// Lower the annotated tree into IR and, if requested, allocate registers.
///
/// Refuses to run when upstream reports contain an error.
pub fn compile_to_ir(
    semantics: &SemanticsResult,
    config: &BackendConfig,
) -> Result<ir::ClassUnit, CompileError> {
    if report::has_errors(&semantics.reports) {
        log::warn!("upstream reports contain errors, skipping backend");
        return Err(CompileError::PreviousStage);
    }
    config.validate()?;

    let resolver = ir::SymbolTableResolver::new(&semantics.symbol_table);
    let mut unit = ir::ir_generator::lower(&semantics.root, &semantics.symbol_table, &resolver)?;
    backend::allocate_registers(&mut unit, config)?;
    Ok(unit)
}

/// Run the whole pipeline and produce Jasmin assembly text.
pub fn compile(
    semantics: &SemanticsResult,
    config: &BackendConfig,
) -> Result<CompileOutput, CompileError> {
    let unit = compile_to_ir(semantics, config)?;
    let jasmin = backend::jasmin::emit_class(&unit, config)?;
    Ok(CompileOutput {
        ir: unit,
        jasmin,
        reports: semantics.reports.clone(),
    })
}

/// Like [`compile`], but folds failures into the report list the way the
/// command-line driver presents them.
pub fn compile_with_reports(
    semantics: &SemanticsResult,
    config: &BackendConfig,
) -> Result<CompileOutput, Vec<Report>> {
    compile(semantics, config).map_err(|e| {
        let mut reports = semantics.reports.clone();
        reports.push(e.to_report());
        reports
    })
}
