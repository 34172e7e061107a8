//! A serde codec for beans.
//!
//! Beans are plain Rust values described by a [`BeanDescription`]: a list
//! of members with precomputed accessors. The [`Codec`] turns descriptions
//! into cached [`BeanSerializer`]s and [`BeanDeserializer`]s and drives
//! them through any serde format.
//!
//! Serializers and deserializers are built from drafts
//! ([`BeanSerializerBuilder`], [`BeanDeserializerBuilder`]) that
//! [`Module`]s may rewrite through [`SerializerModifier`]s and
//! [`DeserializerModifier`]s.

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod codec;
mod config;
mod description;
mod error;
mod metadata;
mod modifier;

pub mod de;
pub mod ser;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use codec::{Codec, CodecBuilder, SerializeBean, TypedSeed};
pub use config::{CodecConfig, Inclusion, Shape};
pub use description::{BeanDescription, BeanDescriptionBuilder, BeanMember, BeanType, MemberKind};
pub use error::CodecError;
pub use metadata::PropertyMetadata;
pub use modifier::{DeserializerModifier, Module, ModuleContext, SerializerModifier};

pub use de::{
    BeanDeserializer, BeanDeserializerBuilder, SettableKind, SettableProperty, ValueDeserializer,
    ValueInstantiator,
};
pub use ser::{
    AccessStrategy, BeanSerializer, BeanSerializerBuilder, PropertyReader, PropertyWriter,
    SelfReferencePolicy, Suppression, ValueSerializer,
};
