//! Module initialization ordering
//!
//! Emits several modules, then executes their initialization functions with
//! [`InitSimulator`] to check that imports run before local constants and
//! that every module initializes exactly once.

use llnf_emit::test_support::*;
use llnf_emit::{LlType, Name};

fn constant_module(module: &str, imports: &[&str], constant: &str) -> (Name, String) {
    let fixture = ModuleFixture::new(module, imports).constant(
        constant,
        LlType::Object,
        body(vec![let_(0, LlType::Object, num(1))], ret(0)),
    );
    (fixture.module.name.clone(), fixture.emit_ok())
}

/// A <- B, A <- C, {B, C} <- D
fn diamond() -> InitSimulator {
    let mut sim = InitSimulator::new();
    for (module, imports, constant) in [
        ("A", &[][..], "a"),
        ("B", &["A"][..], "b"),
        ("C", &["A"][..], "c"),
        ("D", &["B", "C"][..], "d"),
    ] {
        let (name, out) = constant_module(module, imports, constant);
        sim.load(&name, &out);
    }
    sim
}

fn assignments(events: &[String]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| e.strip_prefix("assign "))
        .collect()
}

#[test]
fn imports_initialize_before_local_constants() {
    let mut sim = diamond();
    let events = sim.run(&Name::from("D"));
    assert_eq!(
        assignments(&events),
        vec![
            "l_a = _init_l_a",
            "l_b = _init_l_b",
            "l_c = _init_l_c",
            "l_d = _init_l_d",
        ]
    );
}

#[test]
fn shared_import_initializes_once() {
    let mut sim = diamond();
    let events = sim.run(&Name::from("D"));
    let entered_a = events
        .iter()
        .filter(|e| *e == "enter _l_initialize_A")
        .count();
    assert_eq!(entered_a, 2);
    assert_eq!(
        assignments(&events)
            .iter()
            .filter(|a| a.starts_with("l_a "))
            .count(),
        1
    );
}

#[test]
fn second_run_is_a_no_op() {
    let mut sim = diamond();
    sim.run(&Name::from("D"));
    let again = sim.run(&Name::from("D"));
    assert_eq!(again, vec!["enter _l_initialize_D".to_string()]);
}

#[test]
fn initializing_a_dependency_first_skips_it_later() {
    let mut sim = diamond();
    let first = sim.run(&Name::from("B"));
    assert_eq!(assignments(&first), vec!["l_a = _init_l_a", "l_b = _init_l_b"]);
    let rest = sim.run(&Name::from("D"));
    assert_eq!(assignments(&rest), vec!["l_c = _init_l_c", "l_d = _init_l_d"]);
}

#[test]
fn constants_initialize_in_compilation_order() {
    let fixture = ModuleFixture::new("M", &[])
        .constant("z", LlType::Object, body(vec![let_(0, LlType::Object, num(0))], ret(0)))
        .function("f", obj_arrow(1), vec![obj_param(0)], body(vec![], ret(0)))
        .constant("a", LlType::Object, body(vec![let_(0, LlType::Object, num(1))], ret(0)));
    let mut sim = InitSimulator::new();
    sim.load(&fixture.module.name, &fixture.emit_ok());
    let events = sim.run(&fixture.module.name);
    assert_eq!(assignments(&events), vec!["l_z = _init_l_z", "l_a = _init_l_a"]);
}
