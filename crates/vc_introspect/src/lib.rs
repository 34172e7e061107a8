//! Precomputed bean metadata.
//!
//! A [`TypeIntrospection`] describes the properties and the constructor of
//! a type through closures bound at build time, so codecs can read, write
//! and create beans without any runtime reflection.
//!
//! - [`Value`] / [`ValueRef`]: type-erased property values.
//! - [`ValueType`]: declared types, with erased decoding.
//! - [`AnnotationMetadata`]: static annotations queried by kind and attribute.
//! - [`PropertyDescriptor`], [`ConstructorArgument`]: the members of a type.
//! - [`IntrospectionRegistry`]: the lookup table, keyed by `TypeId`.

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod constructor;
mod introspection;
mod property;
mod registry;
mod value;
mod value_type;

pub mod annotation;
pub mod empty;
pub mod hash;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use annotation::{AnnotationMetadata, AnnotationValue};
pub use constructor::{Arguments, ConstructorArgument, InstantiationError};
pub use introspection::{TypeIntrospection, TypeIntrospectionBuilder};
pub use property::{PropertyAccessError, PropertyDescriptor, PropertyDescriptorBuilder, ReadFn, WriteFn};
pub use registry::{IntrospectionLookup, IntrospectionRegistry, SharedIntrospector};
pub use value::{Value, ValueRef};
pub use value_type::ValueType;

#[cfg(feature = "auto_register")]
pub use registry::AutoIntrospection;

#[doc(hidden)]
pub mod __macro_exports {
    #[cfg(feature = "auto_register")]
    pub use inventory;
}
