use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use serde_core::Deserialize;
use serde_core::de::DeserializeOwned;
use vc_introspect::{AnnotationMetadata, PropertyAccessError, PropertyDescriptor, Value, ValueType};

use crate::description::{BeanMember, MemberKind};
use crate::metadata::PropertyMetadata;

// -----------------------------------------------------------------------------
// ValueDeserializer

type DeserializeFn = Arc<
    dyn Fn(&mut dyn erased_serde::Deserializer<'_>) -> Result<Option<Box<dyn Value>>, erased_serde::Error>
        + Send
        + Sync,
>;

#[inline]
fn deserialize_fn<F>(f: F) -> DeserializeFn
where
    F: Fn(&mut dyn erased_serde::Deserializer<'_>) -> Result<Option<Box<dyn Value>>, erased_serde::Error>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// A custom decoder of property values.
///
/// # Examples
///
/// ```
/// use vc_codec::ValueDeserializer;
///
/// let upper = ValueDeserializer::map(|s: String| s.to_uppercase());
///
/// let mut json = serde_json::Deserializer::from_str(r#""ann""#);
/// let mut erased = <dyn erased_serde::Deserializer>::erase(&mut json);
/// let value = upper.deserialize(&mut erased).unwrap().unwrap();
/// assert_eq!(value.downcast_ref::<String>().unwrap(), "ANN");
/// ```
#[derive(Clone)]
pub struct ValueDeserializer {
    produces: &'static str,
    deserialize: DeserializeFn,
}

impl ValueDeserializer {
    /// Decodes a `V` and turns it into the property value with `f`.
    ///
    /// Null decodes to `None` without calling `f`.
    pub fn map<V, R>(f: impl Fn(V) -> R + Send + Sync + 'static) -> Self
    where
        V: DeserializeOwned + 'static,
        R: Value,
    {
        Self {
            produces: core::any::type_name::<R>(),
            deserialize: deserialize_fn(move |deserializer| {
                let value = <Option<V>>::deserialize(deserializer)?;
                Ok(value.map(|v| Box::new(f(v)) as Box<dyn Value>))
            }),
        }
    }

    /// The name of the value type this deserializer produces.
    #[inline]
    pub fn produces(&self) -> &'static str {
        self.produces
    }

    #[inline]
    pub fn deserialize(
        &self,
        deserializer: &mut dyn erased_serde::Deserializer<'_>,
    ) -> Result<Option<Box<dyn Value>>, erased_serde::Error> {
        (self.deserialize)(deserializer)
    }
}

impl fmt::Debug for ValueDeserializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueDeserializer")
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// SettableProperty

/// How a settable property reaches the bean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettableKind {
    /// Through a setter method.
    Method,
    /// Through direct field access.
    Field,
    /// As a constructor argument.
    Creator,
    /// Synthesized without a backing member.
    Virtual,
    Custom,
}

/// A property the deserializer can decode and write into a bean.
///
/// Decoding and writing are separate steps so that values can be buffered
/// until the bean exists.
pub trait SettableProperty: Send + Sync {
    /// The serialized name.
    fn name(&self) -> &str;

    fn value_type(&self) -> &ValueType;

    fn metadata(&self) -> &PropertyMetadata;

    fn kind(&self) -> SettableKind;

    fn annotations(&self) -> &AnnotationMetadata {
        AnnotationMetadata::EMPTY
    }

    /// Returns `true` if any of the annotation `kinds` is present.
    fn has_one_of(&self, kinds: &[&str]) -> bool {
        self.annotations().has_any(kinds)
    }

    /// The constructor argument slot, for creator properties.
    fn creator_index(&self) -> Option<usize> {
        None
    }

    /// Decodes a value of this property.
    fn deserialize(
        &self,
        deserializer: &mut dyn erased_serde::Deserializer<'_>,
    ) -> Result<Option<Box<dyn Value>>, erased_serde::Error> {
        self.value_type().deserialize_erased(deserializer)
    }

    /// Writes a decoded value into `bean`.
    fn set(&self, bean: &mut dyn Any, value: Option<Box<dyn Value>>) -> Result<(), PropertyAccessError>;
}

impl fmt::Debug for dyn SettableProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettableProperty")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("value_type", self.value_type())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// MemberProperty

/// A settable property backed by a member of a bean description.
pub struct MemberProperty {
    name: Cow<'static, str>,
    kind: SettableKind,
    descriptor: PropertyDescriptor,
    metadata: PropertyMetadata,
    deserializer: Option<ValueDeserializer>,
}

impl MemberProperty {
    /// Returns `None` for members that cannot be set.
    pub fn from_member(member: &BeanMember) -> Option<Self> {
        if !member.is_settable() {
            return None;
        }
        let kind = match member.kind() {
            MemberKind::Method => SettableKind::Method,
            MemberKind::Field => SettableKind::Field,
            MemberKind::Computed => return None,
        };
        Some(Self {
            name: Cow::Owned(member.name().into()),
            kind,
            descriptor: member.descriptor().clone(),
            metadata: member.metadata().clone(),
            deserializer: member.deserializer().cloned(),
        })
    }

    #[inline]
    pub fn descriptor(&self) -> &PropertyDescriptor {
        &self.descriptor
    }
}

impl SettableProperty for MemberProperty {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn value_type(&self) -> &ValueType {
        self.descriptor.value_type()
    }

    #[inline]
    fn metadata(&self) -> &PropertyMetadata {
        &self.metadata
    }

    #[inline]
    fn kind(&self) -> SettableKind {
        self.kind
    }

    #[inline]
    fn annotations(&self) -> &AnnotationMetadata {
        self.descriptor.annotations()
    }

    fn deserialize(
        &self,
        deserializer: &mut dyn erased_serde::Deserializer<'_>,
    ) -> Result<Option<Box<dyn Value>>, erased_serde::Error> {
        match &self.deserializer {
            Some(custom) => custom.deserialize(deserializer),
            None => self.descriptor.value_type().deserialize_erased(deserializer),
        }
    }

    #[inline]
    fn set(&self, bean: &mut dyn Any, value: Option<Box<dyn Value>>) -> Result<(), PropertyAccessError> {
        self.descriptor.write(bean, value)
    }
}
