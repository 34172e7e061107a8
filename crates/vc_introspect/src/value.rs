use alloc::boxed::Box;
use core::any::Any;
use core::fmt::Debug;
use core::ops::Deref;

use serde_core::Serialize;

// -----------------------------------------------------------------------------
// Value

/// A type-erased property value.
///
/// Every `Clone + PartialEq + Debug + Send + Sync + Serialize` type is a
/// `Value`. Absence of a value (null) is modelled by `Option::None` at the
/// call sites, never by a special `Value`.
///
/// `Box<dyn Value>` is deliberately not itself a `Value`, so a boxed value
/// can never be wrapped a second time by accident.
pub trait Value: Any + Debug + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Returns a serializable view of this value.
    fn as_serialize(&self) -> &dyn erased_serde::Serialize;

    fn clone_value(&self) -> Box<dyn Value>;

    /// Returns `true` if `other` has the same concrete type and compares equal.
    fn value_eq(&self, other: &dyn Value) -> bool;

    fn value_type_name(&self) -> &'static str;
}

impl<T> Value for T
where
    T: Any + Clone + PartialEq + Debug + Send + Sync + Serialize,
{
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    #[inline]
    fn as_serialize(&self) -> &dyn erased_serde::Serialize {
        self
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn value_eq(&self, other: &dyn Value) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    #[inline]
    fn value_type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }
}

impl dyn Value {
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Moves the concrete value out of the box.
    ///
    /// The box is handed back unchanged if the type does not match.
    pub fn take<T: Any>(self: Box<Self>) -> Result<T, Box<dyn Value>> {
        if self.is::<T>() {
            match self.into_any().downcast::<T>() {
                Ok(value) => Ok(*value),
                // `is` was checked above.
                Err(_) => unreachable!(),
            }
        } else {
            Err(self)
        }
    }
}

// -----------------------------------------------------------------------------
// ValueRef

/// A value read from a bean: either borrowed from the bean itself or
/// computed by the getter.
#[derive(Debug)]
pub enum ValueRef<'a> {
    Borrowed(&'a dyn Value),
    Owned(Box<dyn Value>),
}

impl ValueRef<'_> {
    /// Returns an owned copy, cloning only if borrowed.
    pub fn into_owned(self) -> Box<dyn Value> {
        match self {
            ValueRef::Borrowed(value) => value.clone_value(),
            ValueRef::Owned(value) => value,
        }
    }

    /// Returns `true` if this handle borrows from the bean.
    #[inline]
    pub fn is_borrowed(&self) -> bool {
        matches!(self, ValueRef::Borrowed(_))
    }
}

impl Deref for ValueRef<'_> {
    type Target = dyn Value;

    #[inline]
    fn deref(&self) -> &Self::Target {
        match self {
            ValueRef::Borrowed(value) => *value,
            ValueRef::Owned(value) => &**value,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    #[test]
    fn take_and_compare() {
        let value: Box<dyn Value> = Box::new(String::from("ann"));
        assert!(value.is::<String>());
        assert!(value.value_eq(&String::from("ann")));
        assert!(!value.value_eq(&3_i32));

        let value = value.take::<i32>().unwrap_err();
        assert_eq!(value.take::<String>().unwrap(), "ann");
    }

    #[test]
    fn value_ref_owned_copy() {
        let name = String::from("ann");
        let borrowed = ValueRef::Borrowed(&name);
        assert!(borrowed.is_borrowed());
        assert_eq!(borrowed.downcast_ref::<String>(), Some(&name));

        let owned = borrowed.into_owned();
        assert_eq!(owned.value_type_name(), core::any::type_name::<String>());
    }
}
