use serde::{Deserialize, Serialize};

/// When a property value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Inclusion {
    /// Always written, null included.
    #[default]
    Always,
    /// Skipped when null.
    NonNull,
    /// Skipped when null or empty.
    NonEmpty,
    /// Skipped when null or equal to the declared default value.
    ///
    /// Falls back to [`Inclusion::NonEmpty`] when no default is declared.
    NonDefault,
}

/// The structural form of a serialized bean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    /// A map of property names to values.
    #[default]
    Object,
    /// A sequence of values in property order.
    Array,
}

/// Settings of a [`Codec`](crate::Codec).
///
/// Deserializable from any serde format, with every field optional.
///
/// # Examples
///
/// ```
/// use vc_codec::{CodecConfig, Inclusion};
///
/// let config: CodecConfig = serde_json::from_str(r#"{
///     "default-inclusion": "non-default",
///     "fail-on-unknown-properties": false
/// }"#).unwrap();
///
/// assert!(config.use_bean_introspection);
/// assert_eq!(config.default_inclusion, Inclusion::NonDefault);
/// assert!(!config.fail_on_unknown_properties);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CodecConfig {
    /// Bind beans through their registered introspection.
    pub use_bean_introspection: bool,
    /// Inclusion of properties without an explicit one.
    pub default_inclusion: Inclusion,
    /// Shape of beans without an explicit one.
    pub shape: Shape,
    pub fail_on_unknown_properties: bool,
    /// Fail when a bean directly references itself; otherwise write null.
    pub fail_on_self_references: bool,
    /// Fail to build a serializer for a bean without properties.
    pub fail_on_empty_beans: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            use_bean_introspection: true,
            default_inclusion: Inclusion::Always,
            shape: Shape::Object,
            fail_on_unknown_properties: true,
            fail_on_self_references: true,
            fail_on_empty_beans: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config: CodecConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CodecConfig::default());
    }

    #[test]
    fn kebab_case_keys() {
        let config: CodecConfig = serde_json::from_str(
            r#"{ "use-bean-introspection": false, "shape": "array", "fail-on-empty-beans": false }"#,
        )
        .unwrap();
        assert!(!config.use_bean_introspection);
        assert_eq!(config.shape, Shape::Array);
        assert!(!config.fail_on_empty_beans);
        assert!(config.fail_on_self_references);

        let json = serde_json::to_string(&Inclusion::NonEmpty).unwrap();
        assert_eq!(json, r#""non-empty""#);
    }
}
