mod common;

use common::*;
use jmm_compiler::ir::ast::{Expr, Stmt};
use jmm_compiler::ir::symbol_table::Type;
use jmm_compiler::{
    compile, compile_with_reports, BackendConfig, CompileError, Report, Stage,
    PREVIOUS_STAGE_MESSAGE,
};

// ── Upstream reports ─────────────────────────────────────────────────────

#[test]
fn upstream_error_stops_the_backend() {
    let mut semantics = scenario_a();
    semantics
        .reports
        .push(Report::error(Stage::Semantic, Some(3), "undeclared variable 'b'"));

    let err = compile(&semantics, &BackendConfig::default()).expect_err("should refuse");
    assert!(matches!(err, CompileError::PreviousStage), "got {:?}", err);
    assert_eq!(err.to_string(), PREVIOUS_STAGE_MESSAGE);

    let reports = compile_with_reports(&semantics, &BackendConfig::default())
        .expect_err("should refuse");
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].line, Some(3));
    assert_eq!(reports[1].message, PREVIOUS_STAGE_MESSAGE);
    assert!(reports[1].is_error());
}

#[test]
fn upstream_warnings_pass_through() {
    let mut semantics = scenario_a();
    semantics.reports.push(Report::new(
        jmm_compiler::ReportType::Warning,
        Stage::Semantic,
        None,
        "unused import",
    ));
    let out = compile(&semantics, &BackendConfig::default()).expect("warnings are not fatal");
    assert_eq!(out.reports.len(), 1);
}

// ── Configuration ────────────────────────────────────────────────────────

#[test]
fn zero_register_bound_is_rejected() {
    let err = compile(&scenario_a(), &BackendConfig::new(false, Some(0))).expect_err("invalid");
    assert!(matches!(err, CompileError::Config { .. }), "got {:?}", err);
}

#[test]
fn config_reads_camel_case_json() {
    let config: BackendConfig =
        serde_json::from_str(r#"{ "optimize": true, "maxRegisters": 3 }"#).expect("parse");
    assert_eq!(config, BackendConfig::new(true, Some(3)));

    let empty: BackendConfig = serde_json::from_str("{}").expect("parse");
    assert_eq!(empty, BackendConfig::default());
}

#[test]
fn allocation_failure_becomes_a_report() {
    let reports = compile_with_reports(&triangle(), &BackendConfig::new(false, Some(2)))
        .expect_err("two registers are too few");
    let last = reports.last().expect("a report");
    assert_eq!(last.stage, Stage::Optimization);
    assert!(last.message.contains("tri"), "{}", last.message);
}

// ── Malformed input ──────────────────────────────────────────────────────

#[test]
fn undeclared_variable_is_internal() {
    let semantics = class(
        "Bad",
        &[],
        vec![],
        vec![common::method(
            "f",
            vec![],
            Type::Void,
            vec![],
            vec![Stmt::assign("ghost", Expr::int(1))],
            None,
        )],
    );
    let err = compile(&semantics, &BackendConfig::default()).expect_err("ghost is undeclared");
    assert!(
        matches!(err, CompileError::Internal { stage: Stage::Llir, .. }),
        "got {:?}",
        err
    );
}

#[test]
fn method_missing_from_symbol_table_is_internal() {
    let mut semantics = scenario_a();
    semantics.symbol_table.methods.clear();
    let err = compile(&semantics, &BackendConfig::default()).expect_err("no table entry");
    assert!(matches!(err, CompileError::Internal { .. }), "got {:?}", err);
}

#[test]
fn non_void_method_without_return_is_internal() {
    let semantics = class(
        "NoRet",
        &[],
        vec![],
        vec![common::method("f", vec![], Type::Int, vec![], vec![], None)],
    );
    let err = compile(&semantics, &BackendConfig::default()).expect_err("missing return");
    assert!(matches!(err, CompileError::Internal { .. }), "got {:?}", err);
}
