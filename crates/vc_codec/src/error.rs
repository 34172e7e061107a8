use alloc::string::String;

use thiserror::Error;
use vc_introspect::{InstantiationError, PropertyAccessError};

/// Errors of bean serialization and deserialization.
///
/// Surfaced to serde through `Error::custom`, so the message carries the
/// bean type and the property involved.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Reading or writing a property failed.
    #[error("cannot access property `{property}` of `{bean}`: {source}")]
    Access {
        bean: &'static str,
        property: String,
        #[source]
        source: PropertyAccessError,
    },
    /// Creating the bean failed.
    #[error("cannot instantiate `{bean}`: {source}")]
    Instantiation {
        bean: &'static str,
        #[source]
        source: InstantiationError,
    },
    /// The serializer or deserializer of a bean cannot be built.
    #[error("cannot build codec of `{bean}`: {message}")]
    Build { bean: &'static str, message: String },
    #[error("direct self-reference through property `{property}` of `{bean}`")]
    SelfReference { bean: &'static str, property: String },
    #[error("unknown property `{property}` for `{bean}`")]
    UnknownProperty { bean: &'static str, property: String },
    #[error("missing required property `{property}` for `{bean}`")]
    MissingProperty { bean: &'static str, property: String },
    /// A value serializer was handed a value of a type it cannot convert.
    #[error("serializer of property `{property}` cannot handle `{actual}`")]
    UnsupportedValue { property: String, actual: &'static str },
    /// The bean passed to a codec is not of the expected type.
    #[error("expected a bean of type `{expected}`")]
    BeanMismatch { expected: &'static str },
}

impl CodecError {
    #[inline]
    pub fn access(bean: &'static str, property: &str, source: PropertyAccessError) -> Self {
        CodecError::Access { bean, property: property.into(), source }
    }

    #[inline]
    pub fn build(bean: &'static str, message: impl Into<String>) -> Self {
        CodecError::Build { bean, message: message.into() }
    }
}

// -----------------------------------------------------------------------------
// serde bridges

#[inline]
pub(crate) fn ser_error<E: serde_core::ser::Error>(err: CodecError) -> E {
    E::custom(err)
}

#[inline]
pub(crate) fn de_error<E: serde_core::de::Error>(err: CodecError) -> E {
    E::custom(err)
}
