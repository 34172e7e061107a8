use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

// -----------------------------------------------------------------------------
// Well-known names

/// Annotation kinds understood by the codec layers.
pub mod kinds {
    /// Property naming and metadata: `value`, `required`, `index`, `defaultValue`.
    pub const JSON_PROPERTY: &str = "JsonProperty";
    /// Property description: `value`.
    pub const JSON_PROPERTY_DESCRIPTION: &str = "JsonPropertyDescription";
    /// Explicit non-null marker.
    pub const NON_NULL: &str = "Nonnull";
}

/// Attribute names used with [`kinds`].
pub mod attributes {
    pub const VALUE: &str = "value";
    pub const REQUIRED: &str = "required";
    pub const INDEX: &str = "index";
    pub const DEFAULT_VALUE: &str = "defaultValue";
}

// -----------------------------------------------------------------------------
// AnnotationValue

/// The value of an annotation attribute.
#[derive(Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Debug for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Bool(v) => fmt::Debug::fmt(v, f),
            AnnotationValue::Int(v) => fmt::Debug::fmt(v, f),
            AnnotationValue::Str(v) => fmt::Debug::fmt(v, f),
        }
    }
}

impl From<bool> for AnnotationValue {
    #[inline]
    fn from(value: bool) -> Self {
        AnnotationValue::Bool(value)
    }
}

impl From<i64> for AnnotationValue {
    #[inline]
    fn from(value: i64) -> Self {
        AnnotationValue::Int(value)
    }
}

impl From<i32> for AnnotationValue {
    #[inline]
    fn from(value: i32) -> Self {
        AnnotationValue::Int(value as i64)
    }
}

impl From<&str> for AnnotationValue {
    #[inline]
    fn from(value: &str) -> Self {
        AnnotationValue::Str(value.into())
    }
}

impl From<String> for AnnotationValue {
    #[inline]
    fn from(value: String) -> Self {
        AnnotationValue::Str(value)
    }
}

// -----------------------------------------------------------------------------
// AnnotationMetadata

#[derive(Debug, Clone)]
struct Annotation {
    kind: &'static str,
    values: Vec<(&'static str, AnnotationValue)>,
}

/// Static annotation data attached to a property or constructor argument.
///
/// Queried by annotation kind and attribute name. Cloning is cheap.
///
/// # Examples
///
/// ```
/// use vc_introspect::annotation::{AnnotationMetadata, attributes, kinds};
///
/// let metadata = AnnotationMetadata::builder()
///     .value(kinds::JSON_PROPERTY, attributes::VALUE, "nick")
///     .marker(kinds::NON_NULL)
///     .build();
///
/// assert!(metadata.has_annotation(kinds::NON_NULL));
/// assert_eq!(metadata.string_value(kinds::JSON_PROPERTY, attributes::VALUE), Some("nick"));
/// assert_eq!(metadata.bool_value(kinds::JSON_PROPERTY, attributes::REQUIRED), None);
/// ```
#[derive(Clone, Default)]
pub struct AnnotationMetadata {
    annotations: Option<Arc<[Annotation]>>,
}

impl AnnotationMetadata {
    /// Metadata without any annotation.
    pub const EMPTY: &'static AnnotationMetadata = &AnnotationMetadata { annotations: None };

    #[inline]
    pub fn builder() -> AnnotationMetadataBuilder {
        AnnotationMetadataBuilder { annotations: Vec::new() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.annotations.as_ref().is_none_or(|a| a.is_empty())
    }

    fn find(&self, kind: &str) -> Option<&Annotation> {
        self.annotations.as_deref()?.iter().find(|a| a.kind == kind)
    }

    /// Returns `true` if an annotation of `kind` is present.
    #[inline]
    pub fn has_annotation(&self, kind: &str) -> bool {
        self.find(kind).is_some()
    }

    /// Returns `true` if any of `kinds` is present.
    pub fn has_any(&self, kinds: &[&str]) -> bool {
        kinds.iter().any(|kind| self.has_annotation(kind))
    }

    /// Returns the raw value of `attribute` on the annotation of `kind`.
    pub fn value(&self, kind: &str, attribute: &str) -> Option<&AnnotationValue> {
        self.find(kind)?
            .values
            .iter()
            .find_map(|(name, value)| (*name == attribute).then_some(value))
    }

    pub fn string_value(&self, kind: &str, attribute: &str) -> Option<&str> {
        match self.value(kind, attribute)? {
            AnnotationValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn bool_value(&self, kind: &str, attribute: &str) -> Option<bool> {
        match self.value(kind, attribute)? {
            AnnotationValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn int_value(&self, kind: &str, attribute: &str) -> Option<i64> {
        match self.value(kind, attribute)? {
            AnnotationValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Iterates over annotation kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.annotations.as_deref().unwrap_or_default().iter().map(|a| a.kind)
    }
}

impl fmt::Debug for AnnotationMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for annotation in self.annotations.as_deref().unwrap_or_default() {
            map.entry(&annotation.kind, &annotation.values);
        }
        map.finish()
    }
}

// -----------------------------------------------------------------------------
// Builder

/// Builder of [`AnnotationMetadata`].
#[must_use]
pub struct AnnotationMetadataBuilder {
    annotations: Vec<Annotation>,
}

impl AnnotationMetadataBuilder {
    fn entry(&mut self, kind: &'static str) -> &mut Annotation {
        let index = match self.annotations.iter().position(|a| a.kind == kind) {
            Some(index) => index,
            None => {
                self.annotations.push(Annotation { kind, values: Vec::new() });
                self.annotations.len() - 1
            }
        };
        &mut self.annotations[index]
    }

    /// Adds an annotation without attributes.
    pub fn marker(mut self, kind: &'static str) -> Self {
        self.entry(kind);
        self
    }

    /// Sets `attribute` of the annotation `kind`, adding the annotation if needed.
    pub fn value(
        mut self,
        kind: &'static str,
        attribute: &'static str,
        value: impl Into<AnnotationValue>,
    ) -> Self {
        let value = value.into();
        let annotation = self.entry(kind);
        match annotation.values.iter_mut().find(|(name, _)| *name == attribute) {
            Some((_, old)) => *old = value,
            None => annotation.values.push((attribute, value)),
        }
        self
    }

    pub fn build(self) -> AnnotationMetadata {
        if self.annotations.is_empty() {
            AnnotationMetadata::default()
        } else {
            AnnotationMetadata { annotations: Some(self.annotations.into()) }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_lookups() {
        let metadata = AnnotationMetadata::builder()
            .value(kinds::JSON_PROPERTY, attributes::INDEX, 2_i64)
            .value(kinds::JSON_PROPERTY, attributes::REQUIRED, true)
            .value(kinds::JSON_PROPERTY, attributes::REQUIRED, false)
            .build();

        assert_eq!(metadata.int_value(kinds::JSON_PROPERTY, attributes::INDEX), Some(2));
        assert_eq!(metadata.bool_value(kinds::JSON_PROPERTY, attributes::REQUIRED), Some(false));
        assert_eq!(metadata.string_value(kinds::JSON_PROPERTY, attributes::INDEX), None);
        assert!(metadata.has_any(&[kinds::NON_NULL, kinds::JSON_PROPERTY]));
        assert_eq!(metadata.kinds().count(), 1);
    }

    #[test]
    fn empty_metadata() {
        assert!(AnnotationMetadata::EMPTY.is_empty());
        assert!(AnnotationMetadata::builder().build().is_empty());
        assert!(!AnnotationMetadata::EMPTY.has_annotation(kinds::NON_NULL));
    }
}
