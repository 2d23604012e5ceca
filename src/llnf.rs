//! Low-Level Normal Form (LLNF)
//!
//! The IR handed to the backend: every intermediate value is named, bodies are
//! let-chains ending in a single terminal, control flow joins through explicit
//! join points, and reference counting is explicit (`inc`/`dec`).
//!
//! ```text
//! f x :=
//!   let y : _void := dec x
//!   jp j (r : _obj) := ret r
//!   cases x
//!   | 0 => jmp j x
//!   | 1 => ret x
//! ```

use std::fmt;

use crate::name::Name;
use crate::types::LlType;

/// Identifier of a local binder (parameter, let, or join point), assigned by
/// the front end. Unique within one declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub u32);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// A typed binder
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub var: VarId,
    pub ty: LlType,
}

impl Param {
    pub fn new(var: VarId, ty: LlType) -> Self {
        Param { var, ty }
    }
}

/// The compiled value of a top-level declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Code {
    /// Function literal with at least one parameter
    Fn { params: Vec<Param>, body: Body },
    /// Zero-argument computed constant, evaluated at module initialization
    Const(Body),
}

impl Code {
    pub fn is_fn(&self) -> bool {
        matches!(self, Code::Fn { .. })
    }

    pub fn body(&self) -> &Body {
        match self {
            Code::Fn { body, .. } | Code::Const(body) => body,
        }
    }
}

/// A `(name, code)` pair produced by the compiler for the current module
#[derive(Debug, Clone, PartialEq)]
pub struct CompDecl {
    pub name: Name,
    pub code: Code,
}

impl CompDecl {
    pub fn new(name: impl Into<Name>, code: Code) -> Self {
        CompDecl {
            name: name.into(),
            code,
        }
    }
}

// ============================================================================
// Bodies
// ============================================================================

/// A let-chain followed by a terminal
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub bindings: Vec<Binding>,
    pub terminal: Terminal,
}

impl Body {
    pub fn new(bindings: Vec<Binding>, terminal: Terminal) -> Self {
        Body { bindings, terminal }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// `let var : ty := value`. With `ty == Void` the value is run for its
    /// effect and nothing is stored.
    Let { var: VarId, ty: LlType, value: Value },

    /// Join point: a parameterized block entered only through `Jmp`
    Join {
        var: VarId,
        params: Vec<Param>,
        body: Body,
    },
}

/// Right-hand side of a let binding
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Call a declaration or runtime builtin
    Call { func: Name, args: Vec<VarId> },
    /// Reference a constant declaration without calling it
    Const(Name),
    /// The neutral placeholder (erased/irrelevant value)
    Neutral,
    /// Copy of another local
    Var(VarId),
    Lit(Literal),
    /// IR-internal operator
    Op(Op),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Num(u64),
    Str(String),
}

/// IR-internal operators. These lower to runtime primitives and are never
/// dependencies of a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Inc(VarId),
    Dec(VarId),
    /// Allocate constructor `tag` and store the object fields
    Cnstr {
        tag: u32,
        scalar_size: u32,
        fields: Vec<VarId>,
    },
    /// Read object field `index`
    Proj { index: u32, var: VarId },
    Box(VarId),
    Unbox(VarId),
    /// Apply a closure to arguments
    Apply { func: VarId, args: Vec<VarId> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    /// Dispatch on a scrutinee; branch `i` handles tag/value `i`
    Cases { scrutinee: VarId, branches: Vec<Body> },
    /// Tail jump to a join point
    Jmp { target: VarId, args: Vec<VarId> },
    Ret(VarId),
}
