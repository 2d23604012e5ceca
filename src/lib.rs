//! llnf-emit - C++ backend for the Low-Level Normal Form (LLNF) IR
//!
//! Lowers LLNF declarations (let-chains with join points, pattern dispatch and
//! explicit reference counting) to C++ functions, and emits the per-module
//! initialization function that runs imported modules' initializers and
//! computes the module's constants.

pub mod codegen;
pub mod config;
pub mod env;
pub mod errors;
pub mod foreign;
pub mod llnf;
pub mod mangle;
pub mod name;
pub mod test_support;
pub mod types;

pub use codegen::{emit_cpp, emit_module, emit_module_to_string, ModuleDescriptor};
pub use config::EmitConfig;
pub use env::{Declaration, Environment, Extension};
pub use errors::{AttributeError, EmitError, EmitResult};
pub use foreign::{declare_foreign_name, foreign_name_for};
pub use llnf::{Binding, Body, Code, CompDecl, Literal, Op, Param, Terminal, Value, VarId};
pub use mangle::mangle;
pub use name::Name;
pub use types::{lower_type, CppType, LlType};
