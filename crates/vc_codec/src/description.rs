use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use core::marker::PhantomData;

use vc_introspect::annotation::{attributes, kinds};
use vc_introspect::{PropertyDescriptor, Value};

use crate::config::{Inclusion, Shape};
use crate::de::ValueDeserializer;
use crate::metadata::PropertyMetadata;
use crate::ser::ValueSerializer;

// -----------------------------------------------------------------------------
// BeanType

/// Identifies the bean type a codec is built for.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeanType {
    type_id: TypeId,
    name: &'static str,
}

impl BeanType {
    #[inline]
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// -----------------------------------------------------------------------------
// BeanMember

/// How the codec reaches a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Accessor methods.
    Method,
    /// Direct field access.
    Field,
    /// A read-only value computed from the bean.
    Computed,
}

/// A member of a [`BeanDescription`].
///
/// Wraps the member's accessors together with the per-member codec
/// settings: serialized name, metadata, inclusion and custom value
/// (de)serializers.
#[derive(Clone)]
#[must_use]
pub struct BeanMember {
    descriptor: PropertyDescriptor,
    kind: MemberKind,
    name: Cow<'static, str>,
    metadata: PropertyMetadata,
    inclusion: Option<Inclusion>,
    serializer: Option<ValueSerializer>,
    null_serializer: Option<Arc<dyn Value>>,
    deserializer: Option<ValueDeserializer>,
}

impl BeanMember {
    fn new(descriptor: PropertyDescriptor, kind: MemberKind) -> Self {
        let annotations = descriptor.annotations();
        let name = match annotations.string_value(kinds::JSON_PROPERTY, attributes::VALUE) {
            Some(name) if !name.is_empty() => Cow::Owned(name.into()),
            _ => Cow::Owned(descriptor.name().into()),
        };
        let metadata = PropertyMetadata {
            required: annotations
                .bool_value(kinds::JSON_PROPERTY, attributes::REQUIRED)
                .unwrap_or(false),
            index: annotations
                .int_value(kinds::JSON_PROPERTY, attributes::INDEX)
                .and_then(|index| i32::try_from(index).ok()),
            default_value: annotations
                .string_value(kinds::JSON_PROPERTY, attributes::DEFAULT_VALUE)
                .map(Into::into),
            ..PropertyMetadata::OPTIONAL
        };
        Self {
            descriptor,
            kind,
            name,
            metadata,
            inclusion: None,
            serializer: None,
            null_serializer: None,
            deserializer: None,
        }
    }

    /// A member reached through accessor methods.
    #[inline]
    pub fn method(descriptor: PropertyDescriptor) -> Self {
        Self::new(descriptor, MemberKind::Method)
    }

    /// A member reached through direct field access.
    #[inline]
    pub fn field(descriptor: PropertyDescriptor) -> Self {
        Self::new(descriptor, MemberKind::Field)
    }

    /// A read-only computed member.
    #[inline]
    pub fn computed(descriptor: PropertyDescriptor) -> Self {
        Self::new(descriptor, MemberKind::Computed)
    }

    /// Overrides the serialized name.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_metadata(mut self, metadata: PropertyMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_inclusion(mut self, inclusion: Inclusion) -> Self {
        self.inclusion = Some(inclusion);
        self
    }

    pub fn with_serializer(mut self, serializer: ValueSerializer) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Writes `value` in place of null.
    pub fn with_null_serializer(mut self, value: impl Value) -> Self {
        self.null_serializer = Some(Arc::new(value));
        self
    }

    pub fn with_deserializer(mut self, deserializer: ValueDeserializer) -> Self {
        self.deserializer = Some(deserializer);
        self
    }

    #[inline]
    pub fn descriptor(&self) -> &PropertyDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// The serialized name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn metadata(&self) -> &PropertyMetadata {
        &self.metadata
    }

    #[inline]
    pub fn inclusion(&self) -> Option<Inclusion> {
        self.inclusion
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
    pub fn deserializer(&self) -> Option<&ValueDeserializer> {
        self.deserializer.as_ref()
    }

    /// Returns `true` if the member can be set during deserialization.
    #[inline]
    pub fn is_settable(&self) -> bool {
        self.kind != MemberKind::Computed && self.descriptor.is_writable()
    }
}

impl fmt::Debug for BeanMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanMember")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("descriptor", &self.descriptor)
            .field("metadata", &self.metadata)
            .field("inclusion", &self.inclusion)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// BeanDescription

type DefaultFn = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;

/// What a codec knows about a bean type on its own, without introspection.
///
/// Members are kept in declaration order.
pub struct BeanDescription {
    bean: BeanType,
    members: Vec<BeanMember>,
    default_constructor: Option<DefaultFn>,
    shape: Option<Shape>,
}

impl BeanDescription {
    #[inline]
    pub fn builder<T: Any>() -> BeanDescriptionBuilder<T> {
        BeanDescriptionBuilder {
            members: Vec::new(),
            default_constructor: None,
            shape: None,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn bean_type(&self) -> BeanType {
        self.bean
    }

    #[inline]
    pub fn members(&self) -> &[BeanMember] {
        &self.members
    }

    #[inline]
    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    /// Creates an instance through the default constructor, if any.
    pub fn create_default(&self) -> Option<Box<dyn Any>> {
        self.default_constructor.as_ref().map(|f| f())
    }

    #[inline]
    pub fn has_default_constructor(&self) -> bool {
        self.default_constructor.is_some()
    }
}

impl fmt::Debug for BeanDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDescription")
            .field("bean", &self.bean)
            .field("members", &self.members)
            .field("default_constructor", &self.default_constructor.is_some())
            .field("shape", &self.shape)
            .finish()
    }
}

/// Builder of [`BeanDescription`].
#[must_use]
pub struct BeanDescriptionBuilder<T> {
    members: Vec<BeanMember>,
    default_constructor: Option<DefaultFn>,
    shape: Option<Shape>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> BeanDescriptionBuilder<T> {
    pub fn member(mut self, member: BeanMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn default_constructor(mut self, f: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.default_constructor = Some(Arc::new(move || Box::new(f()) as Box<dyn Any>));
        self
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn build(self) -> BeanDescription {
        BeanDescription {
            bean: BeanType::of::<T>(),
            members: self.members,
            default_constructor: self.default_constructor,
            shape: self.shape,
        }
    }
}
