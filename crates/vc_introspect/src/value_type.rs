use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

use serde_core::de::value::{BoolDeserializer, F64Deserializer, I64Deserializer, StrDeserializer};
use serde_core::de::{DeserializeOwned, Deserializer, Error};
use serde_core::{Deserialize, Serialize};

use crate::value::Value;

/// The declared type of a property or constructor argument.
///
/// Besides identifying the type, it carries the erased decoding function
/// used by codecs to turn input into a [`Value`] of exactly this type.
/// Decoding goes through `Option<V>`, so an explicit null decodes to
/// `None` for every declared type.
#[derive(Clone, Copy)]
pub struct ValueType {
    type_id: TypeId,
    type_name: &'static str,
    deserialize: fn(
        &mut dyn erased_serde::Deserializer,
    ) -> Result<Option<Box<dyn Value>>, erased_serde::Error>,
    parse: fn(&mut dyn erased_serde::Deserializer) -> Result<Box<dyn Value>, erased_serde::Error>,
}

impl ValueType {
    /// Creates the descriptor of `V`.
    pub fn of<V>() -> Self
    where
        V: Value + Clone + Serialize + DeserializeOwned,
    {
        Self {
            type_id: TypeId::of::<V>(),
            type_name: core::any::type_name::<V>(),
            deserialize: |deserializer| {
                let value = <Option<V>>::deserialize(deserializer)?;
                Ok(value.map(|v| Box::new(v) as Box<dyn Value>))
            },
            parse: |deserializer| Ok(Box::new(V::deserialize(deserializer)?) as Box<dyn Value>),
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if `value` is an instance of this type.
    #[inline]
    pub fn accepts(&self, value: &dyn Value) -> bool {
        <dyn Any>::type_id(value.as_any()) == self.type_id
    }

    /// Decodes a value of this type from an erased deserializer.
    #[inline]
    pub fn deserialize_erased(
        &self,
        deserializer: &mut dyn erased_serde::Deserializer,
    ) -> Result<Option<Box<dyn Value>>, erased_serde::Error> {
        (self.deserialize)(deserializer)
    }

    /// Decodes a value of this type from any serde deserializer.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        &self,
        deserializer: D,
    ) -> Result<Option<Box<dyn Value>>, D::Error> {
        let mut erased = <dyn erased_serde::Deserializer>::erase(deserializer);
        (self.deserialize)(&mut erased).map_err(D::Error::custom)
    }

    /// Parses a textual literal, such as a declared default value, into a
    /// value of this type.
    ///
    /// The literal is tried as a string first, then as a boolean, a signed
    /// integer and a float. Returns `None` if no reading fits the type.
    pub fn from_literal(&self, literal: &str) -> Option<Box<dyn Value>> {
        type Failed = serde_core::de::value::Error;

        if let Some(value) = self.parse_literal(StrDeserializer::<Failed>::new(literal)) {
            return Some(value);
        }
        if let Ok(flag) = literal.parse::<bool>()
            && let Some(value) = self.parse_literal(BoolDeserializer::<Failed>::new(flag))
        {
            return Some(value);
        }
        if let Ok(int) = literal.parse::<i64>()
            && let Some(value) = self.parse_literal(I64Deserializer::<Failed>::new(int))
        {
            return Some(value);
        }
        if let Ok(float) = literal.parse::<f64>()
            && let Some(value) = self.parse_literal(F64Deserializer::<Failed>::new(float))
        {
            return Some(value);
        }
        None
    }

    fn parse_literal<'de, D: Deserializer<'de>>(&self, deserializer: D) -> Option<Box<dyn Value>> {
        let mut erased = <dyn erased_serde::Deserializer>::erase(deserializer);
        (self.parse)(&mut erased).ok()
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

impl PartialEq for ValueType {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ValueType {}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    #[test]
    fn literals() {
        let text = ValueType::of::<String>().from_literal("").unwrap();
        assert_eq!(text.downcast_ref::<String>().map(String::as_str), Some(""));

        let int = ValueType::of::<i32>().from_literal("42").unwrap();
        assert_eq!(int.downcast_ref::<i32>(), Some(&42));

        let flag = ValueType::of::<bool>().from_literal("true").unwrap();
        assert_eq!(flag.downcast_ref::<bool>(), Some(&true));

        let float = ValueType::of::<f64>().from_literal("1.5").unwrap();
        assert_eq!(float.downcast_ref::<f64>(), Some(&1.5));

        assert!(ValueType::of::<u8>().from_literal("nope").is_none());
    }

    #[test]
    fn decode_null_and_value() {
        let ty = ValueType::of::<u32>();

        let mut de = serde_json::Deserializer::from_str("null");
        assert!(ty.deserialize(&mut de).unwrap().is_none());

        let mut de = serde_json::Deserializer::from_str("7");
        let value = ty.deserialize(&mut de).unwrap().unwrap();
        assert!(ty.accepts(&*value));
        assert_eq!(value.take::<u32>().unwrap(), 7);
    }
}
