//! Test support for the backend.
//!
//! This module provides:
//! - Short constructors for LLNF bindings and terminals
//! - A [`ModuleFixture`] that assembles an environment and emits a module
//! - Inspection helpers for emitted text (labels, jumps, case labels)
//! - An [`InitSimulator`] that executes generated initialization functions,
//!   so guard and ordering behaviour can be checked without a C++ compiler

use std::collections::{HashMap, HashSet};

use crate::codegen::{emit_cpp, emit_module_to_string, initializer_name, ModuleDescriptor};
use crate::config::EmitConfig;
use crate::env::{Declaration, Environment};
use crate::errors::EmitResult;
use crate::foreign::declare_foreign_name;
use crate::llnf::{Binding, Body, Code, CompDecl, Literal, Op, Param, Terminal, Value, VarId};
use crate::name::Name;
use crate::types::LlType;

// ============================================================================
// LLNF constructors
// ============================================================================

pub fn v(n: u32) -> VarId {
    VarId(n)
}

pub fn param(n: u32, ty: LlType) -> Param {
    Param::new(VarId(n), ty)
}

pub fn obj_param(n: u32) -> Param {
    param(n, LlType::Object)
}

pub fn let_(n: u32, ty: LlType, value: Value) -> Binding {
    Binding::Let {
        var: VarId(n),
        ty,
        value,
    }
}

pub fn void(n: u32, value: Value) -> Binding {
    let_(n, LlType::Void, value)
}

pub fn inc(n: u32, x: u32) -> Binding {
    void(n, Value::Op(Op::Inc(VarId(x))))
}

pub fn dec(n: u32, x: u32) -> Binding {
    void(n, Value::Op(Op::Dec(VarId(x))))
}

pub fn call(func: &str, args: &[u32]) -> Value {
    Value::Call {
        func: Name::from(func),
        args: args.iter().copied().map(VarId).collect(),
    }
}

pub fn num(n: u64) -> Value {
    Value::Lit(Literal::Num(n))
}

pub fn join(n: u32, params: Vec<Param>, body: Body) -> Binding {
    Binding::Join {
        var: VarId(n),
        params,
        body,
    }
}

pub fn ret(x: u32) -> Terminal {
    Terminal::Ret(VarId(x))
}

pub fn jmp(target: u32, args: &[u32]) -> Terminal {
    Terminal::Jmp {
        target: VarId(target),
        args: args.iter().copied().map(VarId).collect(),
    }
}

pub fn cases(x: u32, branches: Vec<Body>) -> Terminal {
    Terminal::Cases {
        scrutinee: VarId(x),
        branches,
    }
}

pub fn body(bindings: Vec<Binding>, terminal: Terminal) -> Body {
    Body::new(bindings, terminal)
}

/// Arrow type over objects
pub fn obj_arrow(arity: usize) -> LlType {
    LlType::arrow(vec![LlType::Object; arity], LlType::Object)
}

// ============================================================================
// Module fixture
// ============================================================================

/// Builds the environment for one module: declarations known to the
/// backend, `[cppname]` overrides, and the compiled declarations in order.
#[derive(Debug, Clone)]
pub struct ModuleFixture {
    pub module: ModuleDescriptor,
    pub env: Environment,
    pub config: EmitConfig,
}

impl ModuleFixture {
    pub fn new(module: &str, imports: &[&str]) -> Self {
        ModuleFixture {
            module: ModuleDescriptor::new(module, imports.iter().map(|i| Name::from(*i)).collect()),
            env: Environment::new(),
            config: EmitConfig::default(),
        }
    }

    /// Declare an external (already compiled) declaration
    pub fn extern_decl(mut self, name: &str, ty: LlType) -> Self {
        self.env = self.env.add_declaration(Declaration::definition(name, ty));
        self
    }

    pub fn builtin(mut self, name: &str, ty: LlType, cpp_name: &str) -> Self {
        self.env = self.env.add_declaration(Declaration::builtin(name, ty, cpp_name));
        self
    }

    /// Declare and record a function compiled in this module
    pub fn function(mut self, name: &str, ty: LlType, params: Vec<Param>, body: Body) -> Self {
        self.env = self.env.add_declaration(Declaration::definition(name, ty));
        self.env = emit_cpp(&self.env, &[CompDecl::new(name, Code::Fn { params, body })]);
        self
    }

    /// Declare and record a computed constant compiled in this module
    pub fn constant(mut self, name: &str, ty: LlType, body: Body) -> Self {
        self.env = self.env.add_declaration(Declaration::definition(name, ty));
        self.env = emit_cpp(&self.env, &[CompDecl::new(name, Code::Const(body))]);
        self
    }

    /// Attach a persistent `[cppname]`. Panics on a rejected attribute.
    pub fn cppname(mut self, decl: &str, value: &str) -> Self {
        self.env = declare_foreign_name(&self.env, &Name::from(decl), &Name::from(value), true)
            .unwrap_or_else(|e| panic!("cppname {} := {}: {}", decl, value, e));
        self
    }

    pub fn with_config(mut self, config: EmitConfig) -> Self {
        self.config = config;
        self
    }

    pub fn emit(&self) -> EmitResult<String> {
        emit_module_to_string(&self.env, &self.module, &self.config)
    }

    /// Emit, panicking with the error on failure
    pub fn emit_ok(&self) -> String {
        self.emit()
            .unwrap_or_else(|e| panic!("emitting {} failed: {}", self.module.name, e))
    }
}

// ============================================================================
// Output inspection
// ============================================================================

/// Label numbers defined in `out` (`lbl_<n>:`), in output order
pub fn defined_labels(out: &str) -> Vec<u32> {
    out.lines()
        .filter_map(|l| l.trim_start().strip_prefix("lbl_"))
        .filter_map(|rest| rest.split(':').next())
        .filter_map(|n| n.parse().ok())
        .collect()
}

/// Label numbers targeted by `goto`, in output order
pub fn goto_targets(out: &str) -> Vec<u32> {
    out.lines()
        .filter_map(|l| l.trim().strip_prefix("goto lbl_"))
        .filter_map(|rest| rest.strip_suffix(';'))
        .filter_map(|n| n.parse().ok())
        .collect()
}

/// Case label values (`case <n>:`), in output order
pub fn case_labels(out: &str) -> Vec<u32> {
    out.lines()
        .filter_map(|l| l.trim_start().strip_prefix("case "))
        .filter_map(|rest| rest.split(':').next())
        .filter_map(|n| n.parse().ok())
        .collect()
}

/// For every `goto`, the number of consecutive assignment statements
/// immediately preceding it, paired with the target label
pub fn assignments_before_gotos(out: &str) -> Vec<(u32, usize)> {
    let lines: Vec<&str> = out.lines().map(str::trim).collect();
    let mut result = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let Some(target) = line
            .strip_prefix("goto lbl_")
            .and_then(|r| r.strip_suffix(';'))
            .and_then(|n| n.parse().ok())
        else {
            continue;
        };
        let count = lines[..i]
            .iter()
            .rev()
            .take_while(|l| l.starts_with("x_") && l.contains(" = "))
            .count();
        result.push((target, count));
    }
    result
}

// ============================================================================
// Initialization simulation
// ============================================================================

/// Executes the initialization functions of emitted modules.
///
/// Each module's output contributes one guarded function. Statements are
/// interpreted as: the guard check, the guard set, calls to other
/// initializers, and constant assignments (`x = _init_x();`), which are
/// recorded as events.
#[derive(Debug, Default)]
pub struct InitSimulator {
    functions: HashMap<String, Vec<String>>,
    initialized: HashSet<String>,
    events: Vec<String>,
}

impl InitSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the initialization function found in `output`
    pub fn load(&mut self, module: &Name, output: &str) {
        let fn_name = initializer_name(module);
        let header = format!("void {}() {{", fn_name);
        let statements = output
            .lines()
            .skip_while(|l| *l != header)
            .skip(1)
            .take_while(|l| *l != "}")
            .map(|l| l.trim().to_string())
            .collect();
        self.functions.insert(fn_name, statements);
    }

    /// Run the initializer of `module`; returns the events it produced
    pub fn run(&mut self, module: &Name) -> Vec<String> {
        let start = self.events.len();
        self.call(&initializer_name(module));
        self.events[start..].to_vec()
    }

    fn call(&mut self, fn_name: &str) {
        self.events.push(format!("enter {}", fn_name));
        let statements = self.functions.get(fn_name).cloned().unwrap_or_default();
        for stmt in statements {
            if stmt == "if (_G_initialized) return;" {
                if self.initialized.contains(fn_name) {
                    return;
                }
            } else if stmt == "_G_initialized = true;" {
                self.initialized.insert(fn_name.to_string());
            } else if let Some(callee) = stmt.strip_suffix("();") {
                if callee.contains(" = ") {
                    self.events.push(format!("assign {}", callee));
                } else {
                    self.call(callee);
                }
            }
        }
    }
}
