use vc_codec::PropertyMetadata;
use vc_introspect::AnnotationMetadata;
use vc_introspect::annotation::{attributes, kinds};

/// Derives the codec metadata of a property or a constructor argument.
///
/// The value is required if it carries the non-null marker or an explicit
/// `JsonProperty(required = true)`.
///
/// # Examples
///
/// ```
/// use vc_beans::property_metadata;
/// use vc_beans::introspect::AnnotationMetadata;
/// use vc_beans::introspect::annotation::{attributes, kinds};
///
/// let annotations = AnnotationMetadata::builder()
///     .marker(kinds::NON_NULL)
///     .value(kinds::JSON_PROPERTY, attributes::INDEX, 2_i64)
///     .value(kinds::JSON_PROPERTY_DESCRIPTION, attributes::VALUE, "Display name")
///     .build();
///
/// let metadata = property_metadata(&annotations);
/// assert!(metadata.required);
/// assert_eq!(metadata.index, Some(2));
/// assert_eq!(metadata.description.as_deref(), Some("Display name"));
/// assert_eq!(metadata.default_value, None);
/// ```
pub fn property_metadata(annotations: &AnnotationMetadata) -> PropertyMetadata {
    let required = annotations.has_annotation(kinds::NON_NULL)
        || annotations
            .bool_value(kinds::JSON_PROPERTY, attributes::REQUIRED)
            .unwrap_or(false);

    PropertyMetadata {
        required,
        description: annotations
            .string_value(kinds::JSON_PROPERTY_DESCRIPTION, attributes::VALUE)
            .map(Into::into),
        index: annotations
            .int_value(kinds::JSON_PROPERTY, attributes::INDEX)
            .and_then(|index| i32::try_from(index).ok()),
        default_value: annotations
            .string_value(kinds::JSON_PROPERTY, attributes::DEFAULT_VALUE)
            .map(Into::into),
    }
}

/// The serialized name of a property: its declared `JsonProperty` value,
/// or `name` when none is declared.
#[inline]
pub fn external_name<'a>(name: &'a str, annotations: &'a AnnotationMetadata) -> &'a str {
    declared_name(annotations).unwrap_or(name)
}

/// The explicitly declared serialized name, if any.
pub(crate) fn declared_name(annotations: &AnnotationMetadata) -> Option<&str> {
    annotations
        .string_value(kinds::JSON_PROPERTY, attributes::VALUE)
        .filter(|name| !name.is_empty())
}

// -----------------------------------------------------------------------------
// Tests
