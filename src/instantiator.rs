use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;

use vc_codec::{PropertyMetadata, SettableKind, SettableProperty, ValueInstantiator};
use vc_introspect::{
    AnnotationMetadata, ConstructorArgument, InstantiationError, PropertyAccessError, TypeIntrospection,
    Value, ValueType,
};

use crate::bridge::AccessorBridge;
use crate::metadata::{external_name, property_metadata};

// -----------------------------------------------------------------------------
// ConstructorInstantiator

/// Creates beans through the constructor of their introspection.
///
/// Always claims it can create an empty bean; whether that works is up to
/// the introspection. Types declaring constructor arguments are created
/// from [`CreatorProperty`] values instead.
#[derive(Debug, Clone)]
pub struct ConstructorInstantiator {
    introspection: Arc<TypeIntrospection>,
}

impl ConstructorInstantiator {
    #[inline]
    pub fn new(introspection: Arc<TypeIntrospection>) -> Self {
        Self { introspection }
    }

    #[inline]
    pub fn introspection(&self) -> &Arc<TypeIntrospection> {
        &self.introspection
    }
}

impl ValueInstantiator for ConstructorInstantiator {
    #[inline]
    fn value_type_name(&self) -> &'static str {
        self.introspection.type_name()
    }

    #[inline]
    fn can_instantiate_with_no_arguments(&self) -> bool {
        true
    }

    #[inline]
    fn can_instantiate_with_arguments(&self) -> bool {
        !self.introspection.constructor_arguments().is_empty()
    }

    fn instantiate_with_no_arguments(&self) -> Result<Box<dyn Any>, InstantiationError> {
        self.introspection.instantiate()
    }

    fn instantiate_with_arguments(
        &self,
        values: Vec<Option<Box<dyn Value>>>,
    ) -> Result<Box<dyn Any>, InstantiationError> {
        self.introspection.instantiate_with(values)
    }

    fn creator_properties(&self) -> Vec<Arc<dyn SettableProperty>> {
        self.introspection
            .constructor_arguments()
            .iter()
            .map(|argument| {
                Arc::new(CreatorProperty::new(&self.introspection, argument)) as Arc<dyn SettableProperty>
            })
            .collect()
    }
}

// -----------------------------------------------------------------------------
// CreatorProperty

/// One constructor argument, decoded like a property.
///
/// Named by the argument's external name. Once the bean exists, `set`
/// writes the value again through the same-named writable property, if
/// the type has one, and does nothing otherwise.
pub struct CreatorProperty {
    name: String,
    index: usize,
    value_type: ValueType,
    metadata: PropertyMetadata,
    annotations: AnnotationMetadata,
    property: Option<AccessorBridge>,
}

impl CreatorProperty {
    pub fn new(introspection: &TypeIntrospection, argument: &ConstructorArgument) -> Self {
        let annotations = argument.annotation_metadata();
        let property = introspection
            .property(argument.name())
            .filter(|property| property.is_writable())
            .map(|property| AccessorBridge::new(property.clone()));

        Self {
            name: external_name(argument.name(), annotations).into(),
            index: argument.index(),
            value_type: *argument.value_type(),
            metadata: property_metadata(annotations),
            annotations: annotations.clone(),
            property,
        }
    }

    /// Whether `set` writes through a property.
    #[inline]
    pub fn is_mutable(&self) -> bool {
        self.property.is_some()
    }
}

impl SettableProperty for CreatorProperty {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    #[inline]
    fn metadata(&self) -> &PropertyMetadata {
        &self.metadata
    }

    #[inline]
    fn kind(&self) -> SettableKind {
        SettableKind::Creator
    }

    #[inline]
    fn annotations(&self) -> &AnnotationMetadata {
        &self.annotations
    }

    #[inline]
    fn creator_index(&self) -> Option<usize> {
        Some(self.index)
    }

    fn set(&self, bean: &mut dyn Any, value: Option<Box<dyn Value>>) -> Result<(), PropertyAccessError> {
        match &self.property {
            Some(property) => property.write(bean, value),
            None => Ok(()),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
