use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_introspect::hash::HashMap;

use crate::config::{CodecConfig, Shape};
use crate::de::{BeanDeserializer, MemberProperty, SettableProperty, StdInstantiator, ValueInstantiator};
use crate::description::{BeanDescription, BeanType};
use crate::error::CodecError;

/// A positional slot of the element form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Property(usize),
    Creator(usize),
}

/// The draft of a [`BeanDeserializer`].
///
/// Created by the codec from the bean description, then handed through
/// every registered [`DeserializerModifier`](crate::DeserializerModifier)
/// before being built.
#[must_use]
pub struct BeanDeserializerBuilder {
    bean: BeanType,
    shape: Shape,
    fail_on_unknown: bool,
    properties: Vec<Arc<dyn SettableProperty>>,
    instantiator: Box<dyn ValueInstantiator>,
}

impl BeanDeserializerBuilder {
    /// An empty draft, with an instantiator that cannot create anything.
    pub fn new(bean: BeanType, config: &CodecConfig) -> Self {
        Self {
            bean,
            shape: config.shape,
            fail_on_unknown: config.fail_on_unknown_properties,
            properties: Vec::new(),
            instantiator: Box::new(StdInstantiator::none(bean)),
        }
    }

    /// A draft with one property per settable member.
    pub fn from_description(description: &Arc<BeanDescription>, config: &CodecConfig) -> Self {
        let mut builder = Self::new(description.bean_type(), config);
        if let Some(shape) = description.shape() {
            builder.shape = shape;
        }
        builder.properties = description
            .members()
            .iter()
            .filter_map(MemberProperty::from_member)
            .map(|p| Arc::new(p) as Arc<dyn SettableProperty>)
            .collect();
        builder.instantiator = Box::new(StdInstantiator::from_description(description.clone()));
        builder
    }

    #[inline]
    pub fn bean_type(&self) -> &BeanType {
        &self.bean
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    pub fn set_fail_on_unknown(&mut self, fail: bool) {
        self.fail_on_unknown = fail;
    }

    #[inline]
    pub fn properties(&self) -> &[Arc<dyn SettableProperty>] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Arc<dyn SettableProperty>> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Moves the properties out, leaving the draft empty.
    pub fn take_properties(&mut self) -> Vec<Arc<dyn SettableProperty>> {
        core::mem::take(&mut self.properties)
    }

    pub fn set_properties(&mut self, properties: Vec<Arc<dyn SettableProperty>>) {
        self.properties = properties;
    }

    /// Replaces the property with the same name in place, or appends it.
    pub fn add_or_replace_property(&mut self, property: Arc<dyn SettableProperty>) {
        match self.properties.iter_mut().find(|p| p.name() == property.name()) {
            Some(old) => *old = property,
            None => self.properties.push(property),
        }
    }

    pub fn remove_property(&mut self, name: &str) -> Option<Arc<dyn SettableProperty>> {
        let index = self.properties.iter().position(|p| p.name() == name)?;
        Some(self.properties.remove(index))
    }

    #[inline]
    pub fn value_instantiator(&self) -> &dyn ValueInstantiator {
        &*self.instantiator
    }

    pub fn set_value_instantiator(&mut self, instantiator: Box<dyn ValueInstantiator>) {
        self.instantiator = instantiator;
    }

    /// Validates the draft and builds the deserializer.
    pub fn build(self) -> Result<BeanDeserializer, CodecError> {
        let bean = self.bean.name();
        if !self.instantiator.can_instantiate() {
            return Err(CodecError::build(bean, "no creator available to instantiate the bean"));
        }

        let mut property_index = HashMap::<String, usize>::default();
        for (index, property) in self.properties.iter().enumerate() {
            if property_index.insert(property.name().into(), index).is_some() {
                return Err(CodecError::build(
                    bean,
                    format!("multiple properties deserialized from `{}`", property.name()),
                ));
            }
        }

        let creators = if self.instantiator.can_instantiate_with_arguments() {
            self.instantiator.creator_properties()
        } else {
            Vec::new()
        };
        let mut creator_index = HashMap::<String, usize>::default();
        let mut creator_slots = Vec::with_capacity(creators.len());
        for (position, creator) in creators.iter().enumerate() {
            let slot = creator.creator_index().unwrap_or(position);
            if slot >= creators.len() {
                return Err(CodecError::build(
                    bean,
                    format!("creator property `{}` has no argument slot {slot}", creator.name()),
                ));
            }
            if creator_index.insert(creator.name().into(), position).is_some() {
                return Err(CodecError::build(
                    bean,
                    format!("multiple creator properties named `{}`", creator.name()),
                ));
            }
            creator_slots.push(slot);
        }

        let mut element_order: Vec<Slot> = self
            .properties
            .iter()
            .enumerate()
            .map(|(index, property)| match creator_index.get(property.name()) {
                Some(&position) => Slot::Creator(position),
                None => Slot::Property(index),
            })
            .collect();
        for position in 0..creators.len() {
            if !element_order.contains(&Slot::Creator(position)) {
                element_order.push(Slot::Creator(position));
            }
        }

        Ok(BeanDeserializer {
            bean: self.bean,
            shape: self.shape,
            fail_on_unknown: self.fail_on_unknown,
            properties: self.properties.into_boxed_slice(),
            property_index,
            creators: creators.into_boxed_slice(),
            creator_slots: creator_slots.into_boxed_slice(),
            creator_index,
            element_order: element_order.into_boxed_slice(),
            instantiator: self.instantiator,
        })
    }
}

impl core::fmt::Debug for BeanDeserializerBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BeanDeserializerBuilder")
            .field("bean", &self.bean)
            .field("shape", &self.shape)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
