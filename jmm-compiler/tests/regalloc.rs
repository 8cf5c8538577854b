mod common;

use common::*;
use jmm_compiler::backend::regalloc::{color, RegAllocError};
use jmm_compiler::backend::{cfg, interference, liveness};
use jmm_compiler::ir::{ClassUnit, Method};
use jmm_compiler::{compile_to_ir, BackendConfig, CompileError};

fn allocate(semantics: &jmm_compiler::SemanticsResult, k: Option<u16>) -> ClassUnit {
    compile_to_ir(semantics, &BackendConfig::new(false, k)).expect("allocation failed")
}

fn graph_of(m: &Method) -> interference::InterferenceGraph {
    let flow = cfg::build(m).expect("cfg");
    let live = liveness::compute_liveness(&flow);
    interference::build(m, &flow, &live)
}

fn register(m: &Method, name: &str) -> u16 {
    m.locals
        .iter()
        .find(|v| v.name == name)
        .and_then(|v| v.register)
        .unwrap_or_else(|| panic!("{} has no register", name))
}

// ── Interference graph ───────────────────────────────────────────────────

#[test]
fn graph_is_symmetric_without_self_loops() {
    for semantics in all_valid() {
        let unit = allocate(&semantics, None);
        for m in &unit.methods {
            let g = graph_of(m);
            for (a, b) in g.edges() {
                assert_ne!(a, b, "{}: self-loop on {}", m.name, g.name(a));
                assert!(g.neighbors(b).any(|n| n == a), "{}: edge not symmetric", m.name);
            }
        }
    }
}

#[test]
fn triangle_is_fully_connected() {
    let unit = allocate(&triangle(), None);
    let g = graph_of(unit.method("tri").expect("tri"));
    assert!(g.interferes("a", "b"));
    assert!(g.interferes("b", "c"));
    assert!(g.interferes("a", "c"));
    assert!(!g.interferes("a", "r"), "a dies before r is written");
}

#[test]
fn every_local_is_a_vertex() {
    let unit = allocate(&sample(), None);
    let sum = unit.method("sum").expect("sum");
    let g = graph_of(sum);
    for name in ["i", "s", "t1", "t2"] {
        assert!(g.index_of(name).is_some(), "{} missing from graph", name);
    }
    assert!(g.index_of("xs").is_none(), "parameters are not vertices");
}

// ── Coloring ─────────────────────────────────────────────────────────────

#[test]
fn triangle_needs_three_registers() {
    let err = compile_to_ir(&triangle(), &BackendConfig::new(false, Some(2)))
        .expect_err("two registers cannot hold a triangle");
    match err {
        CompileError::Allocation { method, source } => {
            assert_eq!(method, "tri");
            assert_eq!(source, RegAllocError::NoLowDegreeVertex { remaining: 3, k: 2 });
        }
        other => panic!("expected allocation error, got {:?}", other),
    }

    let unit = allocate(&triangle(), Some(3));
    let tri = unit.method("tri").expect("tri");
    let mut regs: Vec<u16> = ["a", "b", "c"].iter().map(|n| register(tri, n)).collect();
    regs.sort_unstable();
    regs.dedup();
    assert_eq!(regs.len(), 3, "triangle members must not share a register");
}

#[test]
fn allocation_failure_is_deterministic() {
    let config = BackendConfig::new(false, Some(2));
    let first = compile_to_ir(&triangle(), &config).expect_err("fails").to_string();
    let second = compile_to_ir(&triangle(), &config).expect_err("fails").to_string();
    assert_eq!(first, second);
    assert!(first.contains("Couldn't find a variable with degree < 2"), "{}", first);
}

#[test]
fn interfering_variables_get_distinct_registers() {
    for semantics in all_valid() {
        let unit = allocate(&semantics, Some(8));
        for m in &unit.methods {
            let g = graph_of(m);
            for (a, b) in g.edges() {
                let (na, nb) = (g.name(a), g.name(b));
                assert_ne!(
                    register(m, na),
                    register(m, nb),
                    "{}: {} and {} interfere but share a register",
                    m.name,
                    na,
                    nb
                );
            }
        }
    }
}

#[test]
fn colors_stay_below_k() {
    let unit = allocate(&sample(), None);
    let g = graph_of(unit.method("sum").expect("sum"));
    let colors = color(&g, 3).expect("three colors suffice");
    assert_eq!(colors.len(), g.len());
    assert!(colors.iter().all(|&c| c < 3));
}

#[test]
fn disjoint_temporaries_share_a_register() {
    let unit = allocate(&sample(), Some(3));
    let sum = unit.method("sum").expect("sum");
    assert_eq!(register(sum, "t1"), register(sum, "t2"));
    assert_eq!(sum.max_register(), Some(4));
}

// ── Register layout ──────────────────────────────────────────────────────

#[test]
fn locals_start_after_receiver_and_parameters() {
    let unit = allocate(&sample(), Some(4));
    let sum = unit.method("sum").expect("sum");
    assert_eq!(sum.params[0].register, Some(1), "xs follows this");
    for v in &sum.locals {
        let r = v.register.expect("allocated");
        assert!((2..6).contains(&r), "{} got register {}", v.name, r);
    }

    let main = unit.method("main").expect("main");
    assert_eq!(main.params[0].register, Some(0), "static methods have no receiver");
    for v in &main.locals {
        assert!(v.register.expect("allocated") >= 1);
    }
}

#[test]
fn natural_allocation_follows_declaration_order() {
    let unit = allocate(&sample(), None);
    let sum = unit.method("sum").expect("sum");
    let regs: Vec<(&str, u16)> = sum
        .locals
        .iter()
        .map(|v| (v.name.as_str(), v.register.expect("allocated")))
        .collect();
    assert_eq!(regs, vec![("i", 2), ("s", 3), ("t1", 4), ("t2", 5)]);
}
