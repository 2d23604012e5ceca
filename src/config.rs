//! Emission settings

/// Configuration for C++ emission. `Default` produces the canonical output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitConfig {
    /// Spaces per block nesting level
    pub indent_width: usize,
    /// First line of the file header
    pub header_comment: String,
    /// Runtime headers, each emitted as `#include "<path>"`
    pub runtime_includes: Vec<String>,
    /// Runtime type behind the `obj` alias used by every lowered object type
    pub object_type: String,
}

impl EmitConfig {
    pub fn new() -> Self {
        Self {
            indent_width: 4,
            header_comment: "Lean compiler output".to_string(),
            runtime_includes: vec!["runtime/object.h".to_string(), "runtime/apply.h".to_string()],
            object_type: "lean::object".to_string(),
        }
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    pub fn with_header_comment(mut self, comment: impl Into<String>) -> Self {
        self.header_comment = comment.into();
        self
    }

    pub fn with_runtime_includes<I, S>(mut self, includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runtime_includes = includes.into_iter().map(Into::into).collect();
        self
    }

    /// Padding for the given nesting depth
    pub fn pad(&self, depth: usize) -> String {
        " ".repeat(self.indent_width * depth)
    }
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_runtime_layout() {
        let config = EmitConfig::default();
        assert_eq!(config.indent_width, 4);
        assert_eq!(config.runtime_includes, vec!["runtime/object.h", "runtime/apply.h"]);
        assert_eq!(config.object_type, "lean::object");
    }

    #[test]
    fn builders_override_fields() {
        let config = EmitConfig::new()
            .with_indent_width(0)
            .with_header_comment("test output")
            .with_runtime_includes(["rt.h"]);
        assert_eq!(config.pad(3), "");
        assert_eq!(config.header_comment, "test output");
        assert_eq!(config.runtime_includes, vec!["rt.h"]);
    }

    #[test]
    fn padding_scales_with_depth() {
        assert_eq!(EmitConfig::new().with_indent_width(2).pad(2), "    ");
    }
}
