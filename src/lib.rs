#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod bridge;
mod de;
mod instantiator;
mod metadata;
mod module;
mod ser;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use vc_codec as codec;
pub use vc_introspect as introspect;

pub use bridge::AccessorBridge;
pub use de::{DeserializationBinder, IntrospectedSetter, IntrospectionDeserializerModifier, VirtualSetter};
pub use instantiator::{ConstructorInstantiator, CreatorProperty};
pub use metadata::{external_name, property_metadata};
pub use module::BeanIntrospectionModule;
pub use ser::{IntrospectionSerializerModifier, SerializationBinder};
