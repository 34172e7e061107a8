//! Bean deserialization.
//!
//! A [`BeanDeserializer`] decodes a bean from a map (or a sequence in
//! [`Shape::Array`]) through its [`SettableProperty`]s, creating the bean
//! with a [`ValueInstantiator`].

mod builder;
mod instantiator;
mod settable;

pub use builder::BeanDeserializerBuilder;
pub use instantiator::{StdInstantiator, ValueInstantiator};
pub use settable::{MemberProperty, SettableKind, SettableProperty, ValueDeserializer};

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use serde_core::de::{
    DeserializeSeed, Deserializer, Error as _, IgnoredAny, MapAccess, SeqAccess, Visitor,
};
use vc_introspect::Value;
use vc_introspect::hash::HashMap;

use crate::config::Shape;
use crate::description::BeanType;
use crate::error::{CodecError, de_error};
use builder::Slot;

// -----------------------------------------------------------------------------
// BeanDeserializer

/// Deserializes beans of one type.
pub struct BeanDeserializer {
    bean: BeanType,
    shape: Shape,
    fail_on_unknown: bool,
    properties: Box<[Arc<dyn SettableProperty>]>,
    property_index: HashMap<String, usize>,
    creators: Box<[Arc<dyn SettableProperty>]>,
    creator_slots: Box<[usize]>,
    creator_index: HashMap<String, usize>,
    element_order: Box<[Slot]>,
    instantiator: Box<dyn ValueInstantiator>,
}

impl BeanDeserializer {
    #[inline]
    pub fn bean_type(&self) -> &BeanType {
        &self.bean
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn properties(&self) -> &[Arc<dyn SettableProperty>] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&dyn SettableProperty> {
        let index = *self.property_index.get(name)?;
        Some(&*self.properties[index])
    }

    /// Properties decoded as constructor arguments.
    #[inline]
    pub fn creator_properties(&self) -> &[Arc<dyn SettableProperty>] {
        &self.creators
    }

    #[inline]
    pub fn value_instantiator(&self) -> &dyn ValueInstantiator {
        &*self.instantiator
    }

    /// Decodes a new bean.
    pub fn deserialize<'de, D: Deserializer<'de>>(&self, deserializer: D) -> Result<Box<dyn Any>, D::Error> {
        let visitor = CreateVisitor { de: self };
        match self.shape {
            Shape::Object => deserializer.deserialize_map(visitor),
            Shape::Array => deserializer.deserialize_seq(visitor),
        }
    }

    /// Decodes into an existing bean.
    ///
    /// Values are written as they are decoded. On error, values written
    /// before the failing one stay written.
    pub fn deserialize_into<'de, D: Deserializer<'de>>(
        &self,
        bean: &mut dyn Any,
        deserializer: D,
    ) -> Result<(), D::Error> {
        if <dyn Any>::type_id(bean) != self.bean.type_id() {
            return Err(de_error(CodecError::BeanMismatch { expected: self.bean.name() }));
        }
        let visitor = UpdateVisitor { de: self, bean };
        match self.shape {
            Shape::Object => deserializer.deserialize_map(visitor),
            Shape::Array => deserializer.deserialize_seq(visitor),
        }
    }

    #[inline]
    fn uses_creator(&self) -> bool {
        !self.creators.is_empty()
    }

    fn instantiate(&self) -> Result<Box<dyn Any>, CodecError> {
        self.instantiator
            .instantiate_with_no_arguments()
            .map_err(|source| CodecError::Instantiation { bean: self.bean.name(), source })
    }

    fn set(
        &self,
        property: &dyn SettableProperty,
        bean: &mut dyn Any,
        value: Option<Box<dyn Value>>,
    ) -> Result<(), CodecError> {
        property
            .set(bean, value)
            .map_err(|source| CodecError::access(self.bean.name(), property.name(), source))
    }

    fn unknown(&self, name: &str) -> Result<(), CodecError> {
        if self.fail_on_unknown {
            Err(CodecError::UnknownProperty { bean: self.bean.name(), property: name.into() })
        } else {
            Ok(())
        }
    }

    /// Settable properties take precedence over creator properties.
    fn update_property(&self, name: &str) -> Option<&dyn SettableProperty> {
        if let Some(&index) = self.property_index.get(name) {
            return Some(&*self.properties[index]);
        }
        let position = *self.creator_index.get(name)?;
        Some(&*self.creators[position])
    }

    /// The property or creator an element-form slot stands for.
    fn slot_property(&self, slot: Slot) -> &dyn SettableProperty {
        match slot {
            Slot::Property(index) => &*self.properties[index],
            Slot::Creator(position) => &*self.creators[position],
        }
    }
}

impl fmt::Debug for BeanDeserializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDeserializer")
            .field("bean", &self.bean)
            .field("shape", &self.shape)
            .field("properties", &self.properties)
            .field("creators", &self.creators)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Seeds

/// Map keys, decoded as identifiers.
struct FieldName(String);

impl<'de> serde_core::Deserialize<'de> for FieldName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldNameVisitor;

        impl<'de> Visitor<'de> for FieldNameVisitor {
            type Value = FieldName;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a property name")
            }

            fn visit_str<E: serde_core::de::Error>(self, v: &str) -> Result<FieldName, E> {
                Ok(FieldName(v.into()))
            }

            fn visit_string<E: serde_core::de::Error>(self, v: String) -> Result<FieldName, E> {
                Ok(FieldName(v))
            }
        }

        deserializer.deserialize_identifier(FieldNameVisitor)
    }
}

/// Decodes one value through a settable property.
struct PropertySeed<'a>(&'a dyn SettableProperty);

impl<'de> DeserializeSeed<'de> for PropertySeed<'_> {
    type Value = Option<Box<dyn Value>>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        let mut erased = <dyn erased_serde::Deserializer>::erase(deserializer);
        self.0.deserialize(&mut erased).map_err(D::Error::custom)
    }
}

/// Decodes a new bean. Used by [`Codec::seed`](crate::Codec::seed) too.
pub struct BeanSeed<'a> {
    deserializer: &'a BeanDeserializer,
}

impl<'a> BeanSeed<'a> {
    #[inline]
    pub fn new(deserializer: &'a BeanDeserializer) -> Self {
        Self { deserializer }
    }
}

impl<'de> DeserializeSeed<'de> for BeanSeed<'_> {
    type Value = Box<dyn Any>;

    #[inline]
    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        self.deserializer.deserialize(deserializer)
    }
}

// -----------------------------------------------------------------------------
// Creation

/// Values collected before a creator-built bean exists.
struct Pending<'a> {
    de: &'a BeanDeserializer,
    arguments: Vec<Option<Box<dyn Value>>>,
    present: Vec<bool>,
    buffered: Vec<(&'a dyn SettableProperty, Option<Box<dyn Value>>)>,
}

impl<'a> Pending<'a> {
    fn new(de: &'a BeanDeserializer) -> Self {
        let len = de.creators.len();
        Self {
            de,
            arguments: (0..len).map(|_| None).collect(),
            present: alloc::vec![false; len],
            buffered: Vec::new(),
        }
    }

    fn argument(&mut self, position: usize, value: Option<Box<dyn Value>>) {
        let slot = self.de.creator_slots[position];
        self.arguments[slot] = value;
        self.present[slot] = true;
    }

    fn buffer(&mut self, property: &'a dyn SettableProperty, value: Option<Box<dyn Value>>) {
        self.buffered.push((property, value));
    }

    fn finish(self) -> Result<Box<dyn Any>, CodecError> {
        let de = self.de;
        for (position, creator) in de.creators.iter().enumerate() {
            if creator.metadata().required && !self.present[de.creator_slots[position]] {
                return Err(CodecError::MissingProperty {
                    bean: de.bean.name(),
                    property: creator.name().into(),
                });
            }
        }
        let mut bean = de
            .instantiator
            .instantiate_with_arguments(self.arguments)
            .map_err(|source| CodecError::Instantiation { bean: de.bean.name(), source })?;
        for (property, value) in self.buffered {
            de.set(property, &mut *bean, value)?;
        }
        Ok(bean)
    }
}

struct CreateVisitor<'a> {
    de: &'a BeanDeserializer,
}

impl<'de> Visitor<'de> for CreateVisitor<'_> {
    type Value = Box<dyn Any>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "bean `{}`", self.de.bean.name())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let de = self.de;

        if !de.uses_creator() {
            let mut bean = de.instantiate().map_err(de_error)?;
            while let Some(FieldName(key)) = map.next_key()? {
                match de.property_index.get(key.as_str()) {
                    Some(&index) => {
                        let property = &*de.properties[index];
                        let value = map.next_value_seed(PropertySeed(property))?;
                        de.set(property, &mut *bean, value).map_err(de_error)?;
                    }
                    None => {
                        de.unknown(&key).map_err(de_error)?;
                        map.next_value::<IgnoredAny>()?;
                    }
                }
            }
            return Ok(bean);
        }

        let mut pending = Pending::new(de);
        while let Some(FieldName(key)) = map.next_key()? {
            if let Some(&position) = de.creator_index.get(key.as_str()) {
                let value = map.next_value_seed(PropertySeed(&*de.creators[position]))?;
                pending.argument(position, value);
            } else if let Some(&index) = de.property_index.get(key.as_str()) {
                let property = &*de.properties[index];
                let value = map.next_value_seed(PropertySeed(property))?;
                pending.buffer(property, value);
            } else {
                de.unknown(&key).map_err(de_error)?;
                map.next_value::<IgnoredAny>()?;
            }
        }
        pending.finish().map_err(de_error)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let de = self.de;
        let expected = de.element_order.len();

        if !de.uses_creator() {
            let mut bean = de.instantiate().map_err(de_error)?;
            for &slot in de.element_order.iter() {
                let property = de.slot_property(slot);
                let Some(value) = seq.next_element_seed(PropertySeed(property))? else {
                    return Ok(bean);
                };
                de.set(property, &mut *bean, value).map_err(de_error)?;
            }
            if seq.next_element::<IgnoredAny>()?.is_some() {
                return Err(A::Error::invalid_length(expected + 1, &"fewer elements"));
            }
            return Ok(bean);
        }

        let mut pending = Pending::new(de);
        for &slot in de.element_order.iter() {
            let property = de.slot_property(slot);
            let Some(value) = seq.next_element_seed(PropertySeed(property))? else {
                break;
            };
            match slot {
                Slot::Creator(position) => pending.argument(position, value),
                Slot::Property(_) => pending.buffer(property, value),
            }
        }
        if seq.next_element::<IgnoredAny>()?.is_some() {
            return Err(A::Error::invalid_length(expected + 1, &"fewer elements"));
        }
        pending.finish().map_err(de_error)
    }
}

// -----------------------------------------------------------------------------
// Update

struct UpdateVisitor<'a> {
    de: &'a BeanDeserializer,
    bean: &'a mut dyn Any,
}

impl<'de> Visitor<'de> for UpdateVisitor<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "bean `{}`", self.de.bean.name())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let UpdateVisitor { de, bean } = self;
        while let Some(FieldName(key)) = map.next_key()? {
            match de.update_property(&key) {
                Some(property) => {
                    let value = map.next_value_seed(PropertySeed(property))?;
                    de.set(property, &mut *bean, value).map_err(de_error)?;
                }
                None => {
                    de.unknown(&key).map_err(de_error)?;
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        let UpdateVisitor { de, bean } = self;
        for &slot in de.element_order.iter() {
            let property = de.slot_property(slot);
            let Some(value) = seq.next_element_seed(PropertySeed(property))? else {
                return Ok(());
            };
            de.set(property, &mut *bean, value).map_err(de_error)?;
        }
        if seq.next_element::<IgnoredAny>()?.is_some() {
            return Err(A::Error::invalid_length(de.element_order.len() + 1, &"fewer elements"));
        }
        Ok(())
    }
}
