//! Persistent environment
//!
//! An [`Environment`] is an immutable snapshot of the declarations known to
//! the compiler plus the state of every registered extension. All updates
//! return a new environment; unchanged parts are shared with the old one.
//!
//! Extensions are registered once per process. A component declares a
//! `static` [`Extension`] handle and reads/writes its typed state through it:
//!
//! ```
//! use llnf_emit::env::{Environment, Extension};
//!
//! #[derive(Clone, Default)]
//! struct Counter(u32);
//!
//! static COUNTER: Extension<Counter> = Extension::new();
//!
//! let env = Environment::new();
//! let env2 = COUNTER.update(&env, Counter(3));
//! assert_eq!(COUNTER.get(&env).0, 0);
//! assert_eq!(COUNTER.get(&env2).0, 3);
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use crate::name::Name;
use crate::types::LlType;

// ============================================================================
// Extension slots
// ============================================================================

/// Process-wide identifier of an extension slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtensionId(u32);

static NEXT_EXTENSION_ID: AtomicU32 = AtomicU32::new(0);

/// Allocate a fresh extension slot. Ids are never reused.
pub fn register_extension() -> ExtensionId {
    ExtensionId(NEXT_EXTENSION_ID.fetch_add(1, Ordering::Relaxed))
}

/// Opaque per-extension state stored in an environment
pub type ExtensionState = Arc<dyn Any + Send + Sync>;

/// Typed handle to an extension slot. The slot is registered the first time
/// the handle is used, so a `static` handle owns exactly one slot.
pub struct Extension<T> {
    id: OnceLock<ExtensionId>,
    _state: PhantomData<fn() -> T>,
}

impl<T> Extension<T> {
    pub const fn new() -> Self {
        Extension {
            id: OnceLock::new(),
            _state: PhantomData,
        }
    }

    pub fn id(&self) -> ExtensionId {
        *self.id.get_or_init(register_extension)
    }
}

impl<T> Default for Extension<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default + Send + Sync + 'static> Extension<T> {
    /// Current state, or the default state if the slot was never written
    pub fn get(&self, env: &Environment) -> Arc<T> {
        env.get_extension(self.id())
            .and_then(|state| state.downcast::<T>().ok())
            .unwrap_or_default()
    }

    pub fn update(&self, env: &Environment, state: T) -> Environment {
        env.with_extension(self.id(), Arc::new(state))
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    /// Ordinary compiled definition
    Definition,
    /// Implemented by the runtime; calls use `cpp_name` verbatim and the
    /// backend never forward-declares it
    Builtin { cpp_name: String },
}

/// Metadata the backend needs about a declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: Name,
    /// Low-level type: an arrow for functions, a scalar/object type for constants
    pub ll_type: LlType,
    pub kind: DeclKind,
}

impl Declaration {
    pub fn definition(name: impl Into<Name>, ll_type: LlType) -> Self {
        Declaration {
            name: name.into(),
            ll_type,
            kind: DeclKind::Definition,
        }
    }

    pub fn builtin(name: impl Into<Name>, ll_type: LlType, cpp_name: impl Into<String>) -> Self {
        Declaration {
            name: name.into(),
            ll_type,
            kind: DeclKind::Builtin {
                cpp_name: cpp_name.into(),
            },
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.kind, DeclKind::Builtin { .. })
    }
}

// ============================================================================
// Environment
// ============================================================================

#[derive(Clone, Default)]
pub struct Environment {
    declarations: im::OrdMap<Name, Declaration>,
    extensions: im::HashMap<ExtensionId, ExtensionState>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_declaration(&self, decl: Declaration) -> Environment {
        let mut env = self.clone();
        env.declarations.insert(decl.name.clone(), decl);
        env
    }

    pub fn find(&self, name: &Name) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    pub fn is_builtin(&self, name: &Name) -> bool {
        self.find(name).is_some_and(Declaration::is_builtin)
    }

    pub fn get_extension(&self, id: ExtensionId) -> Option<ExtensionState> {
        self.extensions.get(&id).cloned()
    }

    pub fn with_extension(&self, id: ExtensionId, state: ExtensionState) -> Environment {
        let mut env = self.clone();
        env.extensions.insert(id, state);
        env
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("declarations", &self.declarations.len())
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Notes(Vec<&'static str>);

    static NOTES: Extension<Notes> = Extension::new();
    static OTHER: Extension<Notes> = Extension::new();

    #[test]
    fn registration_is_stable_per_handle() {
        assert_eq!(NOTES.id(), NOTES.id());
        assert_ne!(NOTES.id(), OTHER.id());
    }

    #[test]
    fn fresh_ids_are_distinct() {
        let a = register_extension();
        let b = register_extension();
        assert_ne!(a, b);
    }

    #[test]
    fn unwritten_slot_reads_default() {
        let env = Environment::new();
        assert_eq!(*NOTES.get(&env), Notes::default());
        assert!(env.get_extension(NOTES.id()).is_none());
    }

    #[test]
    fn update_leaves_original_untouched() {
        let env = Environment::new();
        let env2 = NOTES.update(&env, Notes(vec!["a"]));
        let env3 = OTHER.update(&env2, Notes(vec!["b"]));

        assert_eq!(NOTES.get(&env).0, Vec::<&str>::new());
        assert_eq!(NOTES.get(&env2).0, vec!["a"]);
        assert_eq!(NOTES.get(&env3).0, vec!["a"]);
        assert_eq!(OTHER.get(&env2).0, Vec::<&str>::new());
        assert_eq!(OTHER.get(&env3).0, vec!["b"]);
    }

    #[test]
    fn declarations_are_persistent() {
        let env = Environment::new();
        let env2 = env.add_declaration(Declaration::definition("f", LlType::Object));
        let env3 = env2.add_declaration(Declaration::builtin(
            "Nat.add",
            LlType::arrow(vec![LlType::Object, LlType::Object], LlType::Object),
            "lean::nat_add",
        ));

        assert!(env.find(&Name::from("f")).is_none());
        assert!(env2.find(&Name::from("f")).is_some());
        assert!(!env2.is_builtin(&Name::from("Nat.add")));
        assert!(env3.is_builtin(&Name::from("Nat.add")));
        assert!(!env3.is_builtin(&Name::from("f")));
    }

    #[test]
    fn snapshots_are_shareable_across_threads() {
        let env = NOTES.update(&Environment::new(), Notes(vec!["shared"]));
        let handle = {
            let env = env.clone();
            std::thread::spawn(move || NOTES.get(&env).0.clone())
        };
        assert_eq!(handle.join().unwrap(), vec!["shared"]);
    }
}
