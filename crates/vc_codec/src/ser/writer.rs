use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use serde_core::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use vc_introspect::{PropertyAccessError, PropertyDescriptor, Value, ValueRef, ValueType};

use crate::config::Inclusion;
use crate::error::{CodecError, ser_error};
use crate::metadata::PropertyMetadata;

// -----------------------------------------------------------------------------
// PropertyReader

/// Where a reader takes its values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStrategy {
    /// The accessors of the codec's own bean description.
    Member,
    /// Precomputed introspection accessors.
    Introspection,
    Custom,
}

/// Reads the value of one property from a bean.
///
/// This is the only part of a [`PropertyWriter`] that knows how the value
/// is fetched; everything else is write-time policy.
pub trait PropertyReader: Send + Sync {
    fn read<'a>(&self, bean: &'a dyn Any) -> Result<Option<ValueRef<'a>>, PropertyAccessError>;

    /// Writers over unreadable properties keep their position but never
    /// read: skipped in field form, a placeholder in element form.
    fn is_readable(&self) -> bool {
        true
    }

    fn strategy(&self) -> AccessStrategy {
        AccessStrategy::Custom
    }
}

/// Reads through the descriptor of a described member.
pub struct MemberReader {
    descriptor: PropertyDescriptor,
}

impl MemberReader {
    #[inline]
    pub fn new(descriptor: PropertyDescriptor) -> Self {
        Self { descriptor }
    }
}

impl PropertyReader for MemberReader {
    #[inline]
    fn read<'a>(&self, bean: &'a dyn Any) -> Result<Option<ValueRef<'a>>, PropertyAccessError> {
        self.descriptor.read(bean)
    }

    #[inline]
    fn is_readable(&self) -> bool {
        self.descriptor.is_readable()
    }

    #[inline]
    fn strategy(&self) -> AccessStrategy {
        AccessStrategy::Member
    }
}

// -----------------------------------------------------------------------------
// ValueSerializer

type ConvertFn = Arc<dyn Fn(&dyn Value) -> Option<Box<dyn Value>> + Send + Sync>;
type EmptyFn = Arc<dyn Fn(&dyn Value) -> bool + Send + Sync>;

/// A custom serializer of property values.
///
/// Converts the value into another value that is then written with its own
/// serde implementation. May also define what "empty" means for the value.
///
/// # Examples
///
/// ```
/// use vc_codec::ValueSerializer;
///
/// let celsius = ValueSerializer::new(|kelvin: &f64| format!("{:.1}C", kelvin - 273.15))
///     .with_empty_check(|kelvin: &f64| *kelvin == 0.0);
///
/// let out = celsius.convert(&300.0_f64).unwrap();
/// assert_eq!(out.downcast_ref::<String>().unwrap(), "26.9C");
/// assert!(celsius.is_empty(&0.0_f64));
/// assert!(celsius.convert(&1_u8).is_none());
/// ```
#[derive(Clone)]
pub struct ValueSerializer {
    handles: &'static str,
    convert: ConvertFn,
    is_empty: Option<EmptyFn>,
}

impl ValueSerializer {
    /// Serializes values of type `V` as the `R` returned by `f`.
    pub fn new<V, R>(f: impl Fn(&V) -> R + Send + Sync + 'static) -> Self
    where
        V: Value,
        R: Value,
    {
        Self {
            handles: core::any::type_name::<V>(),
            convert: Arc::new(move |value: &dyn Value| {
                value.downcast_ref::<V>().map(|v| Box::new(f(v)) as Box<dyn Value>)
            }),
            is_empty: None,
        }
    }

    /// Replaces the default emptiness check for values of type `V`.
    #[must_use]
    pub fn with_empty_check<V: Value>(mut self, f: impl Fn(&V) -> bool + Send + Sync + 'static) -> Self {
        self.is_empty = Some(Arc::new(move |value: &dyn Value| {
            value.downcast_ref::<V>().is_some_and(&f)
        }));
        self
    }

    /// The name of the value type this serializer handles.
    #[inline]
    pub fn handles(&self) -> &'static str {
        self.handles
    }

    /// Converts `value`, or returns `None` if its type is not handled.
    #[inline]
    pub fn convert(&self, value: &dyn Value) -> Option<Box<dyn Value>> {
        (self.convert)(value)
    }

    pub fn is_empty(&self, value: &dyn Value) -> bool {
        match &self.is_empty {
            Some(is_empty) => is_empty(value),
            None => vc_introspect::empty::is_empty(value),
        }
    }
}

impl fmt::Debug for ValueSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSerializer")
            .field("handles", &self.handles)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Write policies

/// Skips non-null values that carry no information.
#[derive(Debug, Clone)]
pub enum Suppression {
    /// Skip empty values.
    Empty,
    /// Skip values equal to this one.
    Default(Arc<dyn Value>),
}

/// What to do when a property value is the bean itself.
#[derive(Debug, Clone)]
pub enum SelfReferencePolicy {
    /// Fail with [`CodecError::SelfReference`].
    Fail,
    WriteNull,
    /// Write the value with its own serde implementation.
    PassThrough,
    /// Write the value with this serializer instead.
    Alternate(ValueSerializer),
}

// -----------------------------------------------------------------------------
// PropertyWriter

/// Writes one property of a bean.
///
/// Null handling, suppression and self-reference detection are applied
/// here, whatever the [`PropertyReader`] is, so rebinding a writer to a
/// different reader never changes what gets written.
#[derive(Clone)]
#[must_use]
pub struct PropertyWriter {
    name: Cow<'static, str>,
    value_type: ValueType,
    metadata: PropertyMetadata,
    reader: Arc<dyn PropertyReader>,
    serializer: Option<ValueSerializer>,
    null_serializer: Option<Arc<dyn Value>>,
    suppress_nulls: bool,
    suppression: Option<Suppression>,
    self_reference: SelfReferencePolicy,
}

/// What a writer decided to emit for one bean.
enum Emit<'a> {
    /// Suppressed.
    Nothing,
    Null,
    Value(ValueRef<'a>, Option<&'a ValueSerializer>),
    Fixed(&'a dyn Value),
}

impl PropertyWriter {
    /// Creates a writer that always writes, nulls included.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        value_type: ValueType,
        reader: Arc<dyn PropertyReader>,
    ) -> Self {
        Self {
            name: name.into(),
            value_type,
            metadata: PropertyMetadata::OPTIONAL,
            reader,
            serializer: None,
            null_serializer: None,
            suppress_nulls: false,
            suppression: None,
            self_reference: SelfReferencePolicy::Fail,
        }
    }

    /// Returns a copy reading values of `value_type` through `reader`, with
    /// every other setting kept.
    pub fn rebind(&self, value_type: ValueType, reader: Arc<dyn PropertyReader>) -> Self {
        Self { value_type, reader, ..self.clone() }
    }

    pub fn with_metadata(mut self, metadata: PropertyMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_serializer(mut self, serializer: Option<ValueSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn with_null_serializer(mut self, value: Option<Arc<dyn Value>>) -> Self {
        self.null_serializer = value;
        self
    }

    pub fn with_suppress_nulls(mut self, suppress_nulls: bool) -> Self {
        self.suppress_nulls = suppress_nulls;
        self
    }

    pub fn with_suppression(mut self, suppression: Option<Suppression>) -> Self {
        self.suppression = suppression;
        self
    }

    pub fn with_self_reference(mut self, policy: SelfReferencePolicy) -> Self {
        self.self_reference = policy;
        self
    }

    /// Applies an inclusion rule.
    ///
    /// `NonDefault` reads the default value from the metadata, so set the
    /// metadata first.
    pub fn with_inclusion(mut self, inclusion: Inclusion) -> Self {
        let (suppress_nulls, suppression) = match inclusion {
            Inclusion::Always => (false, None),
            Inclusion::NonNull => (true, None),
            Inclusion::NonEmpty => (true, Some(Suppression::Empty)),
            Inclusion::NonDefault => (true, Some(self.default_suppression())),
        };
        self.suppress_nulls = suppress_nulls;
        self.suppression = suppression;
        self
    }

    fn default_suppression(&self) -> Suppression {
        let Some(literal) = self.metadata.default_value.as_deref() else {
            return Suppression::Empty;
        };
        match self.value_type.from_literal(literal) {
            Some(value) => Suppression::Default(Arc::from(value)),
            None => {
                log::warn!(
                    "Default value `{literal}` of property `{}` is not a `{}`, suppressing empty values instead.",
                    self.name,
                    self.value_type.type_name(),
                );
                Suppression::Empty
            }
        }
    }

    /// The serialized name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    #[inline]
    pub fn metadata(&self) -> &PropertyMetadata {
        &self.metadata
    }

    #[inline]
    pub fn reader(&self) -> &dyn PropertyReader {
        &*self.reader
    }

    #[inline]
    pub fn serializer(&self) -> Option<&ValueSerializer> {
        self.serializer.as_ref()
    }

    #[inline]
    pub fn null_serializer(&self) -> Option<&Arc<dyn Value>> {
        self.null_serializer.as_ref()
    }

    #[inline]
    pub fn suppresses_nulls(&self) -> bool {
        self.suppress_nulls
    }

    #[inline]
    pub fn suppression(&self) -> Option<&Suppression> {
        self.suppression.as_ref()
    }

    #[inline]
    pub fn self_reference(&self) -> &SelfReferencePolicy {
        &self.self_reference
    }

    fn is_empty(&self, value: &dyn Value) -> bool {
        match &self.serializer {
            Some(serializer) => serializer.is_empty(value),
            None => vc_introspect::empty::is_empty(value),
        }
    }

    fn emit<'a>(&'a self, bean: &'a dyn Any, bean_name: &'static str) -> Result<Emit<'a>, CodecError> {
        if !self.reader.is_readable() {
            return Ok(Emit::Nothing);
        }

        let value = self
            .reader
            .read(bean)
            .map_err(|e| CodecError::access(bean_name, &self.name, e))?;

        let Some(value) = value else {
            return Ok(match &self.null_serializer {
                Some(fixed) => Emit::Fixed(&**fixed),
                None if self.suppress_nulls => Emit::Nothing,
                None => Emit::Null,
            });
        };

        let suppressed = match &self.suppression {
            None => false,
            Some(Suppression::Empty) => self.is_empty(&*value),
            Some(Suppression::Default(default)) => default.value_eq(&*value),
        };
        if suppressed {
            return Ok(Emit::Nothing);
        }

        if is_self_reference(bean, &*value) {
            return match &self.self_reference {
                SelfReferencePolicy::Fail => Err(CodecError::SelfReference {
                    bean: bean_name,
                    property: self.name.clone().into_owned(),
                }),
                SelfReferencePolicy::WriteNull => Ok(Emit::Null),
                SelfReferencePolicy::PassThrough => Ok(Emit::Value(value, None)),
                SelfReferencePolicy::Alternate(alternate) => Ok(Emit::Value(value, Some(alternate))),
            };
        }

        Ok(Emit::Value(value, self.serializer.as_ref()))
    }

    /// Writes the property as a map entry. Suppressed values and unreadable
    /// properties are skipped.
    pub fn serialize_as_field<M: SerializeMap>(
        &self,
        bean: &dyn Any,
        bean_name: &'static str,
        map: &mut M,
    ) -> Result<(), M::Error> {
        match self.emit(bean, bean_name).map_err(ser_error)? {
            Emit::Nothing => Ok(()),
            Emit::Null => map.serialize_entry(&*self.name, &Option::<()>::None),
            Emit::Fixed(value) => map.serialize_entry(&*self.name, &Encoded::plain(&self.name, value)),
            Emit::Value(value, serializer) => map.serialize_entry(
                &*self.name,
                &Encoded { property: &self.name, value: &*value, serializer },
            ),
        }
    }

    /// Writes the property as a sequence element.
    ///
    /// Suppressed values still take their slot, as the null serializer's
    /// value or as null.
    pub fn serialize_as_element<Q: SerializeSeq>(
        &self,
        bean: &dyn Any,
        bean_name: &'static str,
        seq: &mut Q,
    ) -> Result<(), Q::Error> {
        match self.emit(bean, bean_name).map_err(ser_error)? {
            Emit::Nothing => self.serialize_placeholder(seq),
            Emit::Null => seq.serialize_element(&Option::<()>::None),
            Emit::Fixed(value) => seq.serialize_element(&Encoded::plain(&self.name, value)),
            Emit::Value(value, serializer) => seq.serialize_element(&Encoded {
                property: &self.name,
                value: &*value,
                serializer,
            }),
        }
    }

    fn serialize_placeholder<Q: SerializeSeq>(&self, seq: &mut Q) -> Result<(), Q::Error> {
        match &self.null_serializer {
            Some(fixed) => seq.serialize_element(&Encoded::plain(&self.name, &**fixed)),
            None => seq.serialize_element(&Option::<()>::None),
        }
    }
}

impl fmt::Debug for PropertyWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyWriter")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("strategy", &self.reader.strategy())
            .field("serializer", &self.serializer)
            .field("null_serializer", &self.null_serializer)
            .field("suppress_nulls", &self.suppress_nulls)
            .field("suppression", &self.suppression)
            .field("self_reference", &self.self_reference)
            .finish()
    }
}

/// Same address and same type as the bean.
fn is_self_reference(bean: &dyn Any, value: &dyn Value) -> bool {
    let value = value.as_any();
    <dyn Any>::type_id(value) == <dyn Any>::type_id(bean)
        && core::ptr::addr_eq(value as *const dyn Any, bean as *const dyn Any)
}

// -----------------------------------------------------------------------------
// Encoded

struct Encoded<'a> {
    property: &'a str,
    value: &'a dyn Value,
    serializer: Option<&'a ValueSerializer>,
}

impl<'a> Encoded<'a> {
    #[inline]
    fn plain(property: &'a str, value: &'a dyn Value) -> Self {
        Self { property, value, serializer: None }
    }
}

impl Serialize for Encoded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.serializer {
            None => Serialize::serialize(self.value.as_serialize(), serializer),
            Some(custom) => match custom.convert(self.value) {
                Some(converted) => Serialize::serialize(converted.as_serialize(), serializer),
                None => Err(ser_error(CodecError::UnsupportedValue {
                    property: self.property.into(),
                    actual: self.value.value_type_name(),
                })),
            },
        }
    }
}
