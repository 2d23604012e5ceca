//! LLNF → C++ backend
//!
//! 1. Record compiled declarations in the environment ([`emit_cpp`])
//! 2. Collect forward declarations (`deps`)
//! 3. Lower each declaration to a C++ function (`lower`)
//! 4. Emit the module initialization function (`cpp_emit`)

pub mod cpp_emit;
pub mod deps;
pub mod lower;

pub use cpp_emit::{
    compiled_decls, emit_cpp, emit_module, emit_module_to_string, forward_decl_names,
    initializer_name, CompiledDecls, ModuleDescriptor,
};
pub use deps::collect_dependencies;
pub use lower::{emit_fn, FnEmitter};
