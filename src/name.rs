//! Hierarchical names
//!
//! Declarations, modules and foreign-name overrides are all identified by
//! hierarchical names: a sequence of string or numeric components such as
//! `Nat.add` or `_private.3.foo`. The empty sequence is the anonymous name.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// One component of a hierarchical name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameComponent {
    Str(String),
    Num(u64),
}

impl NameComponent {
    pub fn is_num(&self) -> bool {
        matches!(self, NameComponent::Num(_))
    }
}

impl PartialOrd for NameComponent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NameComponent {
    /// Numbers sort before strings
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NameComponent::Num(a), NameComponent::Num(b)) => a.cmp(b),
            (NameComponent::Num(_), NameComponent::Str(_)) => Ordering::Less,
            (NameComponent::Str(_), NameComponent::Num(_)) => Ordering::Greater,
            (NameComponent::Str(a), NameComponent::Str(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameComponent::Str(s) => write!(f, "{}", s),
            NameComponent::Num(n) => write!(f, "{}", n),
        }
    }
}

/// A hierarchical name. Cheap to clone; components are shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Arc<[NameComponent]>);

impl Name {
    pub fn anonymous() -> Self {
        Name(Arc::from(Vec::new()))
    }

    pub fn from_components(components: Vec<NameComponent>) -> Self {
        Name(Arc::from(components))
    }

    /// Build a name from a dotted string. Purely numeric segments become
    /// numeric components, so `"_private.3.foo"` has a numeric middle part.
    pub fn from_dotted(s: &str) -> Self {
        if s.is_empty() {
            return Name::anonymous();
        }
        let components = s
            .split('.')
            .map(|part| match part.parse::<u64>() {
                Ok(n) if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) => {
                    NameComponent::Num(n)
                }
                _ => NameComponent::Str(part.to_string()),
            })
            .collect();
        Name::from_components(components)
    }

    /// `prefix.s`
    pub fn str(prefix: &Name, s: impl Into<String>) -> Self {
        let mut components = prefix.0.to_vec();
        components.push(NameComponent::Str(s.into()));
        Name::from_components(components)
    }

    /// `prefix.n`
    pub fn num(prefix: &Name, n: u64) -> Self {
        let mut components = prefix.0.to_vec();
        components.push(NameComponent::Num(n));
        Name::from_components(components)
    }

    pub fn components(&self) -> &[NameComponent] {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }

    /// Exactly one component
    pub fn is_atomic(&self) -> bool {
        self.0.len() == 1
    }

    pub fn last(&self) -> Option<&NameComponent> {
        self.0.last()
    }

    /// Everything but the last component. The prefix of an atomic or
    /// anonymous name is anonymous.
    pub fn prefix(&self) -> Name {
        match self.0.split_last() {
            Some((_, rest)) => Name::from_components(rest.to_vec()),
            None => Name::anonymous(),
        }
    }

    /// Render the components joined by `sep`
    pub fn to_string_with(&self, sep: &str) -> String {
        self.0
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(sep)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            write!(f, "[anonymous]")
        } else {
            write!(f, "{}", self.to_string_with("."))
        }
    }
}

impl Default for Name {
    fn default() -> Self {
        Name::anonymous()
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::from_dotted(s)
    }
}
