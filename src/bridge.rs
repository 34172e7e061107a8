use alloc::boxed::Box;
use core::any::Any;

use vc_codec::{AccessStrategy, PropertyReader};
use vc_introspect::{PropertyAccessError, PropertyDescriptor, Value, ValueRef};

/// Reads and writes one introspected property of a bean.
///
/// Null is a valid value in both directions: reads return `None` for a
/// null property, writes hand `None` to the descriptor, which rejects it
/// if the property is not nullable. Every failure is surfaced.
///
/// # Examples
///
/// ```
/// use vc_beans::AccessorBridge;
/// use vc_beans::introspect::{PropertyDescriptor, Value};
///
/// #[derive(Default)]
/// struct Tag { label: String }
///
/// let bridge = AccessorBridge::new(
///     PropertyDescriptor::builder::<Tag, String>("label")
///         .getter(|t| &t.label)
///         .setter(|t, v| t.label = v)
///         .build(),
/// );
///
/// let mut tag = Tag::default();
/// let value: Box<dyn Value> = Box::new(String::from("red"));
/// bridge.write(&mut tag, Some(value)).unwrap();
///
/// let read = bridge.read(&tag).unwrap().unwrap();
/// assert_eq!(read.downcast_ref::<String>().unwrap(), "red");
/// assert!(bridge.write(&mut tag, None).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct AccessorBridge {
    descriptor: PropertyDescriptor,
}

impl AccessorBridge {
    #[inline]
    pub fn new(descriptor: PropertyDescriptor) -> Self {
        Self { descriptor }
    }

    #[inline]
    pub fn descriptor(&self) -> &PropertyDescriptor {
        &self.descriptor
    }

    /// The introspected property name.
    #[inline]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    #[inline]
    pub fn read<'a>(&self, bean: &'a dyn Any) -> Result<Option<ValueRef<'a>>, PropertyAccessError> {
        self.descriptor.read(bean)
    }

    #[inline]
    pub fn write(&self, bean: &mut dyn Any, value: Option<Box<dyn Value>>) -> Result<(), PropertyAccessError> {
        self.descriptor.write(bean, value)
    }
}

impl PropertyReader for AccessorBridge {
    #[inline]
    fn read<'a>(&self, bean: &'a dyn Any) -> Result<Option<ValueRef<'a>>, PropertyAccessError> {
        AccessorBridge::read(self, bean)
    }

    #[inline]
    fn is_readable(&self) -> bool {
        self.descriptor.is_readable()
    }

    #[inline]
    fn strategy(&self) -> AccessStrategy {
        AccessStrategy::Introspection
    }
}

// -----------------------------------------------------------------------------
// Tests
