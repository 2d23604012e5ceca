//! Dependency collection for forward declarations
//!
//! Only direct references matter: every declaration of the module is itself a
//! root, so names reached through other declarations are collected when those
//! are visited.

use std::collections::BTreeSet;

use log::trace;

use crate::env::Environment;
use crate::llnf::{Binding, Body, Code, Terminal, Value};
use crate::name::Name;

/// Add every declaration `code` references directly to `deps`.
///
/// Call heads and constant references are recorded whether or not the
/// instruction produces a value. IR-internal operators, jumps, runtime
/// builtins and the neutral placeholder are skipped.
pub fn collect_dependencies(env: &Environment, code: &Code, deps: &mut BTreeSet<Name>) {
    collect_body(env, code.body(), deps);
}

fn collect_body(env: &Environment, body: &Body, deps: &mut BTreeSet<Name>) {
    for binding in &body.bindings {
        match binding {
            Binding::Let { value, .. } => collect_value(env, value, deps),
            Binding::Join { body, .. } => collect_body(env, body, deps),
        }
    }
    match &body.terminal {
        Terminal::Cases { branches, .. } => {
            for branch in branches {
                collect_body(env, branch, deps);
            }
        }
        Terminal::Jmp { .. } | Terminal::Ret(_) => {}
    }
}

fn collect_value(env: &Environment, value: &Value, deps: &mut BTreeSet<Name>) {
    match value {
        Value::Call { func, .. } | Value::Const(func) => collect_constant(env, func, deps),
        Value::Neutral | Value::Var(_) | Value::Lit(_) | Value::Op(_) => {}
    }
}

fn collect_constant(env: &Environment, name: &Name, deps: &mut BTreeSet<Name>) {
    if env.is_builtin(name) {
        return;
    }
    if deps.insert(name.clone()) {
        trace!("dependency {}", name);
    }
}
