//! Name mangling
//!
//! Maps hierarchical names to C++ identifiers when no `[cppname]` override
//! exists. The encoding is injective:
//!
//! - the result starts with a fixed prefix (`l_`);
//! - the first string component is written as-is, later ones after `_s`;
//! - numeric components are written as `_n<digits>`;
//! - empty string components are written as `_e`;
//! - inside a string component, ASCII alphanumerics are kept, `_` becomes
//!   `__` and anything else becomes `_u<4 hex>` or `_U<8 hex>`.
//!
//! Every `_` produced by an encoding is followed by a tag character (`_`,
//! `s`, `n`, `e`, `u`, `U`), so the original name can always be recovered.

use std::fmt::Write;

use crate::name::{Name, NameComponent};

/// Prefix for mangled declaration names
pub const MANGLE_PREFIX: &str = "l_";

/// Mangle `name` with the default prefix
pub fn mangle(name: &Name) -> String {
    mangle_with_prefix(name, MANGLE_PREFIX)
}

/// Mangle `name` after an arbitrary identifier prefix
pub fn mangle_with_prefix(name: &Name, prefix: &str) -> String {
    let mut out = String::from(prefix);
    for (i, component) in name.components().iter().enumerate() {
        match component {
            NameComponent::Num(n) => {
                out.push_str("_n");
                out.push_str(&n.to_string());
            }
            NameComponent::Str(s) if s.is_empty() => {
                if i > 0 {
                    out.push_str("_s");
                }
                out.push_str("_e");
            }
            NameComponent::Str(s) => {
                if i > 0 {
                    out.push_str("_s");
                }
                mangle_str(s, &mut out);
            }
        }
    }
    out
}

fn mangle_str(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' => out.push(c),
            '_' => out.push_str("__"),
            c if (c as u32) <= 0xffff => {
                let _ = write!(out, "_u{:04x}", c as u32);
            }
            c => {
                let _ = write!(out, "_U{:08x}", c as u32);
            }
        }
    }
}
