//! Emptiness of erased values.
//!
//! A value is empty if it serializes as null, unit, an empty string,
//! empty bytes, or a sequence / map without entries. Numbers, booleans,
//! structs and enum variants are never empty. `Some(x)` and newtypes are
//! empty if `x` is.

use serde_core::ser::{self, Serialize, Serializer};

use crate::value::Value;

type ProbeError = serde_core::de::value::Error;

/// Returns `true` if `value` is empty.
///
/// # Examples
///
/// ```
/// use vc_introspect::empty::is_empty;
///
/// assert!(is_empty(&String::new()));
/// assert!(is_empty(&Vec::<u8>::new()));
/// assert!(is_empty(&Option::<i32>::None));
/// assert!(!is_empty(&0_i32));
/// assert!(!is_empty(&"x".to_string()));
/// ```
pub fn is_empty(value: &dyn Value) -> bool {
    serde_core::Serialize::serialize(value.as_serialize(), EmptyProbe).unwrap_or(false)
}

/// A serializer that only answers "would this be written as an empty value".
#[derive(Clone, Copy)]
struct EmptyProbe;

/// Counts entries of a compound value without serializing them.
struct Counter {
    entries: usize,
    structural: bool,
}

impl Counter {
    #[inline]
    fn sequence() -> Self {
        Self { entries: 0, structural: false }
    }

    #[inline]
    fn structure() -> Self {
        Self { entries: 0, structural: true }
    }

    #[inline]
    fn push(&mut self) -> Result<(), ProbeError> {
        self.entries += 1;
        Ok(())
    }

    #[inline]
    fn finish(self) -> Result<bool, ProbeError> {
        Ok(!self.structural && self.entries == 0)
    }
}

macro_rules! never_empty {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            #[inline]
            fn $method(self, _: $ty) -> Result<bool, ProbeError> {
                Ok(false)
            }
        )*
    };
}

impl Serializer for EmptyProbe {
    type Ok = bool;
    type Error = ProbeError;

    type SerializeSeq = Counter;
    type SerializeTuple = Counter;
    type SerializeTupleStruct = Counter;
    type SerializeTupleVariant = Counter;
    type SerializeMap = Counter;
    type SerializeStruct = Counter;
    type SerializeStructVariant = Counter;

    never_empty! {
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_i128: i128,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_u128: u128,
        serialize_f32: f32,
        serialize_f64: f64,
        serialize_char: char,
        serialize_unit_struct: &'static str,
    }

    #[inline]
    fn serialize_str(self, v: &str) -> Result<bool, ProbeError> {
        Ok(v.is_empty())
    }

    #[inline]
    fn serialize_bytes(self, v: &[u8]) -> Result<bool, ProbeError> {
        Ok(v.is_empty())
    }

    #[inline]
    fn serialize_none(self) -> Result<bool, ProbeError> {
        Ok(true)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<bool, ProbeError> {
        value.serialize(self)
    }

    #[inline]
    fn serialize_unit(self) -> Result<bool, ProbeError> {
        Ok(true)
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<bool, ProbeError> {
        Ok(false)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<bool, ProbeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<bool, ProbeError> {
        Ok(false)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Counter, ProbeError> {
        Ok(Counter::sequence())
    }

    fn serialize_tuple(self, _: usize) -> Result<Counter, ProbeError> {
        Ok(Counter::sequence())
    }

    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Counter, ProbeError> {
        Ok(Counter::structure())
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Counter, ProbeError> {
        Ok(Counter::structure())
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Counter, ProbeError> {
        Ok(Counter::sequence())
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Counter, ProbeError> {
        Ok(Counter::structure())
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Counter, ProbeError> {
        Ok(Counter::structure())
    }
}

impl ser::SerializeSeq for Counter {
    type Ok = bool;
    type Error = ProbeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), ProbeError> {
        self.push()
    }

    fn end(self) -> Result<bool, ProbeError> {
        self.finish()
    }
}

impl ser::SerializeTuple for Counter {
    type Ok = bool;
    type Error = ProbeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), ProbeError> {
        self.push()
    }

    fn end(self) -> Result<bool, ProbeError> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for Counter {
    type Ok = bool;
    type Error = ProbeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), ProbeError> {
        self.push()
    }

    fn end(self) -> Result<bool, ProbeError> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for Counter {
    type Ok = bool;
    type Error = ProbeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), ProbeError> {
        self.push()
    }

    fn end(self) -> Result<bool, ProbeError> {
        self.finish()
    }
}

impl ser::SerializeMap for Counter {
    type Ok = bool;
    type Error = ProbeError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), ProbeError> {
        self.push()
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, _: &T) -> Result<(), ProbeError> {
        Ok(())
    }

    fn end(self) -> Result<bool, ProbeError> {
        self.finish()
    }
}

impl ser::SerializeStruct for Counter {
    type Ok = bool;
    type Error = ProbeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _: &'static str,
        _: &T,
    ) -> Result<(), ProbeError> {
        self.push()
    }

    fn end(self) -> Result<bool, ProbeError> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for Counter {
    type Ok = bool;
    type Error = ProbeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _: &'static str,
        _: &T,
    ) -> Result<(), ProbeError> {
        self.push()
    }

    fn end(self) -> Result<bool, ProbeError> {
        self.finish()
    }
}

// -----------------------------------------------------------------------------
// Tests
