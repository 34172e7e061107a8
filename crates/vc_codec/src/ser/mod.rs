//! Bean serialization.
//!
//! A [`BeanSerializer`] is an ordered list of [`PropertyWriter`]s. It is
//! built from a [`BeanSerializerBuilder`] draft, which the registered
//! modifiers may rewrite first.

mod builder;
mod writer;

pub use builder::{BeanSerializerBuilder, BuildErrorHook, self_reference_policy};
pub use writer::{
    AccessStrategy, MemberReader, PropertyReader, PropertyWriter, SelfReferencePolicy,
    Suppression, ValueSerializer,
};

use alloc::boxed::Box;
use core::any::Any;

use serde_core::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::config::Shape;
use crate::description::BeanType;
use crate::error::{CodecError, ser_error};

/// Serializes beans of one type.
pub struct BeanSerializer {
    bean: BeanType,
    shape: Shape,
    writers: Box<[PropertyWriter]>,
}

impl BeanSerializer {
    #[inline]
    pub(crate) fn new(bean: BeanType, shape: Shape, writers: Box<[PropertyWriter]>) -> Self {
        Self { bean, shape, writers }
    }

    #[inline]
    pub fn bean_type(&self) -> &BeanType {
        &self.bean
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn writers(&self) -> &[PropertyWriter] {
        &self.writers
    }

    /// Finds a writer by serialized name.
    pub fn writer(&self, name: &str) -> Option<&PropertyWriter> {
        self.writers.iter().find(|w| w.name() == name)
    }

    /// Writes `bean`, a map in [`Shape::Object`], a sequence in [`Shape::Array`].
    pub fn serialize<S: Serializer>(&self, bean: &dyn Any, serializer: S) -> Result<S::Ok, S::Error> {
        if <dyn Any>::type_id(bean) != self.bean.type_id() {
            return Err(ser_error(CodecError::BeanMismatch { expected: self.bean.name() }));
        }
        let name = self.bean.name();
        match self.shape {
            Shape::Object => {
                let mut map = serializer.serialize_map(None)?;
                for writer in &self.writers {
                    writer.serialize_as_field(bean, name, &mut map)?;
                }
                map.end()
            }
            Shape::Array => {
                let mut seq = serializer.serialize_seq(Some(self.writers.len()))?;
                for writer in &self.writers {
                    writer.serialize_as_element(bean, name, &mut seq)?;
                }
                seq.end()
            }
        }
    }

    /// Pairs this serializer with a bean as a [`Serialize`] value.
    #[inline]
    pub fn bind<'a>(&'a self, bean: &'a dyn Any) -> BoundBean<'a> {
        BoundBean { serializer: self, bean }
    }
}

impl core::fmt::Debug for BeanSerializer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BeanSerializer")
            .field("bean", &self.bean)
            .field("shape", &self.shape)
            .field("writers", &self.writers)
            .finish()
    }
}

/// A bean together with its serializer.
pub struct BoundBean<'a> {
    serializer: &'a BeanSerializer,
    bean: &'a dyn Any,
}

impl Serialize for BoundBean<'_> {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.serializer.serialize(self.bean, serializer)
    }
}
