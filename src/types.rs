//! LLNF types and their lowering to C++ types
//!
//! The backend only understands a closed set of types: the fixed-width
//! unsigned scalars, the platform word, the boxed object marker, and function
//! types. Everything else is a front-end bug and is rejected.

use std::fmt;

use crate::errors::{EmitError, EmitResult};
use crate::name::Name;

/// Semantic type of an LLNF value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LlType {
    /// Boxed, reference-counted value
    Object,
    /// Type of the neutral placeholder; represented as an object
    Neutral,
    /// No-value marker for instructions executed only for their effect
    Void,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    USize,
    /// Function type `(params) -> ret`
    Pi {
        params: Vec<LlType>,
        ret: Box<LlType>,
    },
    /// Any other named type. Never lowerable.
    Named(Name),
}

impl LlType {
    pub fn arrow(params: Vec<LlType>, ret: LlType) -> Self {
        LlType::Pi {
            params,
            ret: Box::new(ret),
        }
    }

    pub fn is_pi(&self) -> bool {
        matches!(self, LlType::Pi { .. })
    }

    pub fn is_object(&self) -> bool {
        matches!(self, LlType::Object)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, LlType::Void)
    }

    /// Result type after peeling every arrow
    pub fn result_type(&self) -> &LlType {
        let mut ty = self;
        while let LlType::Pi { ret, .. } = ty {
            ty = ret.as_ref();
        }
        ty
    }

    /// Parameter types across every nested arrow, outermost first
    pub fn param_types(&self) -> Vec<&LlType> {
        let mut params = Vec::new();
        let mut ty = self;
        while let LlType::Pi { params: ps, ret } = ty {
            params.extend(ps.iter());
            ty = ret.as_ref();
        }
        params
    }
}

impl fmt::Display for LlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlType::Object => write!(f, "_obj"),
            LlType::Neutral => write!(f, "_neutral"),
            LlType::Void => write!(f, "_void"),
            LlType::UInt8 => write!(f, "UInt8"),
            LlType::UInt16 => write!(f, "UInt16"),
            LlType::UInt32 => write!(f, "UInt32"),
            LlType::UInt64 => write!(f, "UInt64"),
            LlType::USize => write!(f, "USize"),
            LlType::Pi { params, ret } => {
                for p in params {
                    write!(f, "{} -> ", p)?;
                }
                write!(f, "{}", ret)
            }
            LlType::Named(n) => write!(f, "{}", n),
        }
    }
}

/// A C++ type the backend can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CppType {
    UnsignedChar,
    UnsignedShort,
    Unsigned,
    UnsignedLongLong,
    SizeT,
    /// `obj*`, the generic reference-counted object pointer
    Object,
}

impl fmt::Display for CppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CppType::UnsignedChar => "unsigned char",
            CppType::UnsignedShort => "unsigned short",
            CppType::Unsigned => "unsigned",
            CppType::UnsignedLongLong => "unsigned long long",
            CppType::SizeT => "size_t",
            CppType::Object => "obj*",
        };
        f.write_str(s)
    }
}

/// Map an LLNF type to the C++ type used to store it
pub fn lower_type(ty: &LlType) -> EmitResult<CppType> {
    match ty {
        LlType::Object | LlType::Neutral | LlType::Pi { .. } => Ok(CppType::Object),
        LlType::UInt8 => Ok(CppType::UnsignedChar),
        LlType::UInt16 => Ok(CppType::UnsignedShort),
        LlType::UInt32 => Ok(CppType::Unsigned),
        LlType::UInt64 => Ok(CppType::UnsignedLongLong),
        LlType::USize => Ok(CppType::SizeT),
        LlType::Void | LlType::Named(_) => Err(EmitError::UnknownType(ty.to_string())),
    }
}
