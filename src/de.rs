use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;

use vc_codec::{
    BeanDeserializerBuilder, BeanType, CodecConfig, DeserializerModifier, PropertyMetadata, SettableKind,
    SettableProperty,
};
use vc_introspect::{
    AnnotationMetadata, IntrospectionLookup, PropertyAccessError, PropertyDescriptor, TypeIntrospection, Value,
    ValueType,
};

use crate::bridge::AccessorBridge;
use crate::instantiator::ConstructorInstantiator;
use crate::metadata::{external_name, property_metadata};

// -----------------------------------------------------------------------------
// DeserializationBinder

/// Rebinds the settable properties of a deserializer draft to introspected
/// accessors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeserializationBinder;

impl DeserializationBinder {
    /// Returns the adjusted property list.
    ///
    /// An empty draft is replaced by one [`VirtualSetter`] per introspected
    /// property. Otherwise setter-backed properties with a same-named
    /// introspected property are wrapped in an [`IntrospectedSetter`]; all
    /// other properties pass through.
    pub fn adjust(
        &self,
        introspection: &TypeIntrospection,
        properties: Vec<Arc<dyn SettableProperty>>,
    ) -> Vec<Arc<dyn SettableProperty>> {
        if properties.is_empty() && !introspection.properties().is_empty() {
            log::debug!(
                "Bean `{}` has no settable properties, while its introspection does. Recreating from introspection.",
                introspection.type_name(),
            );
            return introspection
                .properties()
                .iter()
                .map(|property| Arc::new(VirtualSetter::new(property)) as Arc<dyn SettableProperty>)
                .collect();
        }

        properties
            .into_iter()
            .map(|settable| {
                if settable.kind() != SettableKind::Method {
                    return settable;
                }
                match introspection.property(settable.name()) {
                    Some(property) => {
                        let bridge = AccessorBridge::new(property.clone());
                        Arc::new(IntrospectedSetter::new(settable, bridge)) as Arc<dyn SettableProperty>
                    }
                    None => settable,
                }
            })
            .collect()
    }

    /// The instantiator to install, whatever the draft looked like.
    #[inline]
    pub fn instantiator(&self, introspection: Arc<TypeIntrospection>) -> ConstructorInstantiator {
        ConstructorInstantiator::new(introspection)
    }
}

// -----------------------------------------------------------------------------
// IntrospectedSetter

/// A settable property writing through an [`AccessorBridge`].
///
/// Everything but the write is delegated, value decoding included.
pub struct IntrospectedSetter {
    delegate: Arc<dyn SettableProperty>,
    bridge: AccessorBridge,
}

impl IntrospectedSetter {
    #[inline]
    pub fn new(delegate: Arc<dyn SettableProperty>, bridge: AccessorBridge) -> Self {
        Self { delegate, bridge }
    }

    #[inline]
    pub fn delegate(&self) -> &Arc<dyn SettableProperty> {
        &self.delegate
    }

    #[inline]
    pub fn bridge(&self) -> &AccessorBridge {
        &self.bridge
    }
}

impl SettableProperty for IntrospectedSetter {
    #[inline]
    fn name(&self) -> &str {
        self.delegate.name()
    }

    #[inline]
    fn value_type(&self) -> &ValueType {
        self.delegate.value_type()
    }

    #[inline]
    fn metadata(&self) -> &PropertyMetadata {
        self.delegate.metadata()
    }

    #[inline]
    fn kind(&self) -> SettableKind {
        self.delegate.kind()
    }

    #[inline]
    fn annotations(&self) -> &AnnotationMetadata {
        self.delegate.annotations()
    }

    #[inline]
    fn creator_index(&self) -> Option<usize> {
        self.delegate.creator_index()
    }

    #[inline]
    fn deserialize(
        &self,
        deserializer: &mut dyn erased_serde::Deserializer<'_>,
    ) -> Result<Option<Box<dyn Value>>, erased_serde::Error> {
        self.delegate.deserialize(deserializer)
    }

    #[inline]
    fn set(&self, bean: &mut dyn Any, value: Option<Box<dyn Value>>) -> Result<(), PropertyAccessError> {
        self.bridge.write(bean, value)
    }
}

// -----------------------------------------------------------------------------
// VirtualSetter

/// A settable property synthesized from an introspected property, for
/// types the codec found no settable members on.
///
/// A null read for a write-only property is the placeholder its writer
/// left in element form, and is discarded.
pub struct VirtualSetter {
    name: String,
    metadata: PropertyMetadata,
    bridge: AccessorBridge,
}

impl VirtualSetter {
    pub fn new(property: &PropertyDescriptor) -> Self {
        let annotations = property.annotations();
        Self {
            name: external_name(property.name(), annotations).into(),
            metadata: property_metadata(annotations),
            bridge: AccessorBridge::new(property.clone()),
        }
    }
}

impl SettableProperty for VirtualSetter {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn value_type(&self) -> &ValueType {
        self.bridge.descriptor().value_type()
    }

    #[inline]
    fn metadata(&self) -> &PropertyMetadata {
        &self.metadata
    }

    #[inline]
    fn kind(&self) -> SettableKind {
        SettableKind::Virtual
    }

    #[inline]
    fn annotations(&self) -> &AnnotationMetadata {
        self.bridge.descriptor().annotations()
    }

    fn set(&self, bean: &mut dyn Any, value: Option<Box<dyn Value>>) -> Result<(), PropertyAccessError> {
        if value.is_none() && !self.bridge.descriptor().is_readable() {
            log::trace!("Skipping null placeholder of write-only property `{}`.", self.name);
            return Ok(());
        }
        self.bridge.write(bean, value)
    }
}

// -----------------------------------------------------------------------------
// IntrospectionDeserializerModifier

/// Applies the [`DeserializationBinder`] to the drafts of introspected
/// types and installs their [`ConstructorInstantiator`].
///
/// Drafts of other types are returned untouched.
pub struct IntrospectionDeserializerModifier {
    lookup: Arc<dyn IntrospectionLookup>,
}

impl IntrospectionDeserializerModifier {
    #[inline]
    pub fn new(lookup: Arc<dyn IntrospectionLookup>) -> Self {
        Self { lookup }
    }
}

impl DeserializerModifier for IntrospectionDeserializerModifier {
    fn update_builder(
        &self,
        _config: &CodecConfig,
        bean: &BeanType,
        mut builder: BeanDeserializerBuilder,
    ) -> BeanDeserializerBuilder {
        let Some(introspection) = self.lookup.find_introspection(bean.type_id()) else {
            return builder;
        };

        let binder = DeserializationBinder;
        let properties = builder.take_properties();
        builder.set_properties(binder.adjust(&introspection, properties));
        builder.set_value_instantiator(Box::new(binder.instantiator(introspection)));
        builder
    }
}

// -----------------------------------------------------------------------------
// Tests
