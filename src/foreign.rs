//! Foreign names (`[cppname]`)
//!
//! A declaration may carry a persistent `[cppname]` attribute whose value is
//! the hierarchical C++ name to use instead of the mangled one. A
//! hierarchical override such as `lean.nat_add` places the declaration inside
//! `namespace lean { ... }` and refers to it as `lean::nat_add`.

use std::fmt::Write;

use log::debug;

use crate::env::{Environment, Extension};
use crate::errors::{AttributeError, EmitResult};
use crate::mangle::mangle;
use crate::name::{Name, NameComponent};

#[derive(Debug, Clone, Default)]
struct ForeignNames(im::OrdMap<Name, Name>);

static FOREIGN_NAMES: Extension<ForeignNames> = Extension::new();

/// Attach a `[cppname]` override to `decl`.
///
/// The attribute must be persistent and non-anonymous, and every component
/// must be a simple C++ identifier. On rejection no new environment is produced.
pub fn declare_foreign_name(
    env: &Environment,
    decl: &Name,
    value: &Name,
    persistent: bool,
) -> Result<Environment, AttributeError> {
    if !persistent {
        return Err(AttributeError::NotPersistent);
    }
    if value.is_anonymous() {
        return Err(AttributeError::MissingArgument);
    }
    if value.components().iter().any(NameComponent::is_num) {
        return Err(AttributeError::NumericComponent(value.clone()));
    }
    if let Some(bad) = value
        .components()
        .iter()
        .map(NameComponent::to_string)
        .find(|s| !is_identifier(s))
    {
        return Err(AttributeError::InvalidIdentifier {
            name: value.clone(),
            component: bad,
        });
    }
    debug!("[cppname] {} := {}", decl, value);
    let mut names = FOREIGN_NAMES.get(env).0.clone();
    names.insert(decl.clone(), value.clone());
    Ok(FOREIGN_NAMES.update(env, ForeignNames(names)))
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The `[cppname]` override of `name`, if any
pub fn foreign_name_for(env: &Environment, name: &Name) -> Option<Name> {
    FOREIGN_NAMES.get(env).0.get(name).cloned()
}

fn last_str(name: &Name) -> String {
    name.last().map(|c| c.to_string()).unwrap_or_default()
}

/// Unqualified identifier used at the definition site (inside its namespaces)
pub fn base_cpp_name(env: &Environment, name: &Name) -> String {
    match foreign_name_for(env, name) {
        Some(c) => last_str(&c),
        None => mangle(name),
    }
}

/// Fully qualified identifier used from outside any namespace
pub fn cpp_name(env: &Environment, name: &Name) -> String {
    match foreign_name_for(env, name) {
        Some(c) => c.to_string_with("::"),
        None => mangle(name),
    }
}

/// Unqualified identifier of a constant's initializer function
pub fn base_init_name(env: &Environment, name: &Name) -> String {
    format!("_init_{}", base_cpp_name(env, name))
}

/// Fully qualified identifier of a constant's initializer function
pub fn init_cpp_name(env: &Environment, name: &Name) -> String {
    match foreign_name_for(env, name) {
        Some(c) => Name::str(&c.prefix(), format!("_init_{}", last_str(&c))).to_string_with("::"),
        None => format!("_init_{}", mangle(name)),
    }
}

/// Namespace nesting implied by a hierarchical override.
///
/// `open` writes one `namespace <c> {` line per prefix component, outermost
/// first; `close` writes the matching closing braces followed by a newline.
/// Declarations without an override, or with an atomic one, get no nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceScope {
    namespaces: Vec<String>,
}

impl NamespaceScope {
    pub fn open<W: Write + ?Sized>(out: &mut W, env: &Environment, name: &Name) -> EmitResult<Self> {
        let namespaces = match foreign_name_for(env, name) {
            Some(c) if !c.is_atomic() => c
                .prefix()
                .components()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            _ => Vec::new(),
        };
        for ns in &namespaces {
            writeln!(out, "namespace {} {{", ns)?;
        }
        Ok(NamespaceScope { namespaces })
    }

    pub fn close<W: Write + ?Sized>(self, out: &mut W) -> EmitResult<()> {
        if self.namespaces.is_empty() {
            return Ok(());
        }
        for _ in &self.namespaces {
            out.write_char('}')?;
        }
        out.write_char('\n')?;
        Ok(())
    }
}
