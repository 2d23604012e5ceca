//! Error types for the backend.
//!
//! Two classes of failure exist:
//! - [`AttributeError`]: a malformed `[cppname]` attribute, reported when the
//!   attribute is declared. The environment is left untouched.
//! - [`EmitError`]: the LLNF input broke a backend precondition (unsupported
//!   type, dangling join point, malformed terminal). Emission of the module
//!   stops at the first one; text already written to the sink is not retracted.

use thiserror::Error;

use crate::llnf::VarId;
use crate::name::Name;

/// Rejections of the foreign-name (`[cppname]`) attribute
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("invalid [cppname] attribute, must be persistent")]
    NotPersistent,

    #[error("invalid [cppname] attribute, argument is missing")]
    MissingArgument,

    #[error("invalid [cppname] attribute, identifier cannot be numeric: {0}")]
    NumericComponent(Name),

    #[error("invalid [cppname] attribute, `{component}` in {name} is not a C++ identifier")]
    InvalidIdentifier { name: Name, component: String },
}

/// Backend invariant violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("unknown declaration: {0}")]
    UnknownDeclaration(Name),

    #[error("jump to unknown join point {0}")]
    UnknownJoinPoint(VarId),

    #[error("jump to join point {join_point} with {found} arguments, expected {expected}")]
    JumpArity {
        join_point: VarId,
        expected: usize,
        found: usize,
    },

    #[error("parameters of {decl} do not match its declared type {declared}")]
    SignatureMismatch { decl: Name, declared: String },

    #[error("unbound local {0}")]
    UnboundLocal(VarId),

    #[error("{0} is not a value")]
    NotAValue(VarId),

    #[error("invalid instruction: {0}")]
    InvalidInstruction(String),

    #[error("invalid terminal: {0}")]
    InvalidTerminal(String),

    #[error("failed to write output")]
    Format(#[from] std::fmt::Error),
}

pub type EmitResult<T> = Result<T, EmitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_messages_name_the_attribute() {
        assert_eq!(
            AttributeError::NotPersistent.to_string(),
            "invalid [cppname] attribute, must be persistent"
        );
        assert_eq!(
            AttributeError::NumericComponent(Name::from("a.1")).to_string(),
            "invalid [cppname] attribute, identifier cannot be numeric: a.1"
        );
    }

    #[test]
    fn emit_messages_identify_the_construct() {
        let err = EmitError::JumpArity {
            join_point: VarId(7),
            expected: 2,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "jump to join point v7 with 1 arguments, expected 2"
        );
        assert_eq!(EmitError::UnknownType("Bool".into()).to_string(), "unknown type: Bool");
    }

    #[test]
    fn format_errors_convert() {
        let err: EmitError = std::fmt::Error.into();
        assert_eq!(err, EmitError::Format(std::fmt::Error));
    }
}
