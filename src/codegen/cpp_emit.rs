//! C++ module emission
//!
//! The compiler records each batch of compiled declarations with
//! [`emit_cpp`]; nothing is printed at that point because `[cppname]`
//! attributes are attached only after the compiler has run. Once the module
//! is complete, [`emit_module`] prints it:
//!
//! ```cpp
//! // Lean compiler output
//! // Module: Foo
//! // Imports: Init.Core
//! #include "runtime/object.h"
//! #include "runtime/apply.h"
//! typedef lean::object obj;
//! obj* l_g(obj*);                       // forward declarations
//! obj* l_c;
//! obj* l_g(obj* x_1) { ... }            // function bodies
//! obj* _init_l_c() { ... }
//! void _l_initialize_Init_sCore();      // module initialization
//! static bool _G_initialized = false;
//! void _l_initialize_Foo() {
//!     if (_G_initialized) return;
//!     _G_initialized = true;
//!     _l_initialize_Init_sCore();
//!     l_c = _init_l_c();
//! }
//! ```

use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::Arc;

use log::debug;

use super::deps::collect_dependencies;
use super::lower::emit_fn;
use crate::config::EmitConfig;
use crate::env::{Environment, Extension};
use crate::errors::{EmitError, EmitResult};
use crate::foreign::{base_cpp_name, cpp_name, init_cpp_name, NamespaceScope};
use crate::llnf::CompDecl;
use crate::mangle::mangle_with_prefix;
use crate::name::Name;
use crate::types::lower_type;

/// Prefix of every module initialization function
pub const INITIALIZE_PREFIX: &str = "_l_initialize_";

// ============================================================================
// Compiled declarations
// ============================================================================

/// Declarations compiled for the current module, in compilation order
#[derive(Debug, Clone, Default)]
pub struct CompiledDecls(im::Vector<CompDecl>);

impl CompiledDecls {
    pub fn iter(&self) -> impl Iterator<Item = &CompDecl> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

static COMPILED_DECLS: Extension<CompiledDecls> = Extension::new();

/// Record compiled declarations for later emission
pub fn emit_cpp(env: &Environment, decls: &[CompDecl]) -> Environment {
    let mut code = COMPILED_DECLS.get(env).0.clone();
    code.extend(decls.iter().cloned());
    COMPILED_DECLS.update(env, CompiledDecls(code))
}

/// Declarations recorded so far
pub fn compiled_decls(env: &Environment) -> Arc<CompiledDecls> {
    COMPILED_DECLS.get(env)
}

/// A module and its direct imports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub name: Name,
    pub imports: Vec<Name>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<Name>, imports: Vec<Name>) -> Self {
        ModuleDescriptor {
            name: name.into(),
            imports,
        }
    }
}

/// Name of the initialization function of `module`
pub fn initializer_name(module: &Name) -> String {
    mangle_with_prefix(module, INITIALIZE_PREFIX)
}

// ============================================================================
// Emission
// ============================================================================

fn emit_file_header<W: Write>(out: &mut W, module: &ModuleDescriptor, config: &EmitConfig) -> EmitResult<()> {
    writeln!(out, "// {}", config.header_comment)?;
    writeln!(out, "// Module: {}", module.name)?;
    out.write_str("// Imports:")?;
    for import in &module.imports {
        write!(out, " {}", import)?;
    }
    out.write_char('\n')?;
    for include in &config.runtime_includes {
        writeln!(out, "#include \"{}\"", include)?;
    }
    writeln!(out, "typedef {} obj;", config.object_type)?;
    Ok(())
}

fn emit_fn_decl<W: Write>(out: &mut W, env: &Environment, name: &Name) -> EmitResult<()> {
    let decl = env
        .find(name)
        .ok_or_else(|| EmitError::UnknownDeclaration(name.clone()))?;
    let ty = &decl.ll_type;
    let scope = NamespaceScope::open(out, env, name)?;
    write!(out, "{} {}", lower_type(ty.result_type())?, base_cpp_name(env, name))?;
    if ty.is_pi() {
        let params = ty
            .param_types()
            .into_iter()
            .map(|p| lower_type(p).map(|t| t.to_string()))
            .collect::<EmitResult<Vec<_>>>()?;
        write!(out, "({})", params.join(", "))?;
    }
    out.write_str(";\n")?;
    scope.close(out)
}

/// Names needing a forward declaration: the module's own declarations and
/// everything they reference directly
pub fn forward_decl_names(env: &Environment, decls: &CompiledDecls) -> BTreeSet<Name> {
    let mut todo = BTreeSet::new();
    for decl in decls.iter() {
        todo.insert(decl.name.clone());
        collect_dependencies(env, &decl.code, &mut todo);
    }
    todo
}

fn emit_fn_decls<W: Write>(out: &mut W, env: &Environment, decls: &CompiledDecls) -> EmitResult<()> {
    let todo = forward_decl_names(env, decls);
    debug!("{} forward declarations", todo.len());
    for name in &todo {
        emit_fn_decl(out, env, name)?;
    }
    Ok(())
}

fn emit_fns<W: Write>(
    out: &mut W,
    env: &Environment,
    decls: &CompiledDecls,
    config: &EmitConfig,
) -> EmitResult<()> {
    for decl in decls.iter() {
        let scope = NamespaceScope::open(out, env, &decl.name)?;
        emit_fn(out, env, config, decl)?;
        scope.close(out)?;
    }
    Ok(())
}

fn emit_initialize<W: Write>(
    out: &mut W,
    env: &Environment,
    module: &ModuleDescriptor,
    decls: &CompiledDecls,
    config: &EmitConfig,
) -> EmitResult<()> {
    let pad = config.pad(1);
    for import in &module.imports {
        writeln!(out, "void {}();", initializer_name(import))?;
    }
    writeln!(out, "static bool _G_initialized = false;")?;
    writeln!(out, "void {}() {{", initializer_name(&module.name))?;
    writeln!(out, "{}if (_G_initialized) return;", pad)?;
    writeln!(out, "{}_G_initialized = true;", pad)?;
    for import in &module.imports {
        writeln!(out, "{}{}();", pad, initializer_name(import))?;
    }
    for decl in decls.iter().filter(|d| !d.code.is_fn()) {
        writeln!(
            out,
            "{}{} = {}();",
            pad,
            cpp_name(env, &decl.name),
            init_cpp_name(env, &decl.name)
        )?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

/// Print the C++ code of every declaration recorded in `env` for `module`.
///
/// On error, whatever was already written to `out` is incomplete and must be
/// discarded by the caller.
pub fn emit_module<W: Write>(
    out: &mut W,
    env: &Environment,
    module: &ModuleDescriptor,
    config: &EmitConfig,
) -> EmitResult<()> {
    let decls = compiled_decls(env);
    debug!(
        "emitting module {} ({} declarations, {} imports)",
        module.name,
        decls.len(),
        module.imports.len()
    );
    emit_file_header(out, module, config)?;
    emit_fn_decls(out, env, &decls)?;
    emit_fns(out, env, &decls, config)?;
    emit_initialize(out, env, module, &decls, config)
}

/// [`emit_module`] into a fresh string
pub fn emit_module_to_string(
    env: &Environment,
    module: &ModuleDescriptor,
    config: &EmitConfig,
) -> EmitResult<String> {
    let mut out = String::new();
    emit_module(&mut out, env, module, config)?;
    Ok(out)
}
