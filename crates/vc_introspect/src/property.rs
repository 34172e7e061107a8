use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;
use core::marker::PhantomData;

use serde_core::Serialize;
use serde_core::de::DeserializeOwned;
use thiserror::Error;

use crate::annotation::AnnotationMetadata;
use crate::value::{Value, ValueRef};
use crate::value_type::ValueType;

// -----------------------------------------------------------------------------
// PropertyAccessError

/// An error produced when reading or writing a property through its
/// precomputed accessor.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PropertyAccessError {
    /// The bean passed to the accessor is not an instance of the declaring type.
    #[error("expected a bean of type `{expected}`")]
    BeanMismatch { expected: &'static str },
    /// The value passed to the setter is not an instance of the declared type.
    #[error("expected a value of type `{expected}`, found `{actual}`")]
    ValueMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("property is write-only")]
    NotReadable,
    #[error("property is read-only")]
    NotWritable,
    /// A null was written into a property that does not accept one.
    #[error("property does not accept null")]
    NullNotAccepted,
    /// The accessor itself rejected the operation.
    #[error("{0}")]
    Rejected(Cow<'static, str>),
}

// -----------------------------------------------------------------------------
// Accessor functions

/// Type-erased getter: reads the property of a bean.
pub type ReadFn = Arc<
    dyn for<'a> Fn(&'a dyn Any) -> Result<Option<ValueRef<'a>>, PropertyAccessError>
        + Send
        + Sync,
>;

/// Type-erased setter: writes a (possibly null) value into a bean.
pub type WriteFn =
    Arc<dyn Fn(&mut dyn Any, Option<Box<dyn Value>>) -> Result<(), PropertyAccessError> + Send + Sync>;

#[inline]
fn read_fn<F>(f: F) -> ReadFn
where
    F: for<'a> Fn(&'a dyn Any) -> Result<Option<ValueRef<'a>>, PropertyAccessError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

#[inline]
fn write_fn<F>(f: F) -> WriteFn
where
    F: Fn(&mut dyn Any, Option<Box<dyn Value>>) -> Result<(), PropertyAccessError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

// -----------------------------------------------------------------------------
// PropertyDescriptor

/// A single property of an introspected type.
///
/// Holds the property's declared type, nullability, annotations and the
/// precomputed accessors. Missing accessors make the property write-only
/// or read-only.
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: Cow<'static, str>,
    declaring_type: &'static str,
    value_type: ValueType,
    nullable: bool,
    read: Option<ReadFn>,
    write: Option<WriteFn>,
    annotations: AnnotationMetadata,
}

impl PropertyDescriptor {
    /// Starts a descriptor of property `name` of type `V` on bean `T`.
    pub fn builder<T, V>(name: impl Into<Cow<'static, str>>) -> PropertyDescriptorBuilder<T, V>
    where
        T: Any,
        V: Value + Clone + Serialize + DeserializeOwned,
    {
        PropertyDescriptorBuilder {
            name: name.into(),
            nullable: false,
            read: None,
            write: None,
            annotations: AnnotationMetadata::default(),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type name of the bean declaring this property.
    #[inline]
    pub fn declaring_type(&self) -> &'static str {
        self.declaring_type
    }

    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Returns `true` if the property may hold null.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn is_readable(&self) -> bool {
        self.read.is_some()
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.write.is_some()
    }

    #[inline]
    pub fn annotations(&self) -> &AnnotationMetadata {
        &self.annotations
    }

    /// Reads the property from `bean`.
    pub fn read<'a>(&self, bean: &'a dyn Any) -> Result<Option<ValueRef<'a>>, PropertyAccessError> {
        match &self.read {
            Some(read) => read(bean),
            None => Err(PropertyAccessError::NotReadable),
        }
    }

    /// Writes `value` into `bean`.
    pub fn write(
        &self,
        bean: &mut dyn Any,
        value: Option<Box<dyn Value>>,
    ) -> Result<(), PropertyAccessError> {
        match &self.write {
            Some(write) => write(bean, value),
            None => Err(PropertyAccessError::NotWritable),
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("value_type", &self.value_type)
            .field("nullable", &self.nullable)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .field("annotations", &self.annotations)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Builder

/// Builder of [`PropertyDescriptor`].
///
/// # Examples
///
/// ```
/// use vc_introspect::PropertyDescriptor;
///
/// struct Person {
///     name: String,
///     nickname: Option<String>,
/// }
///
/// let name = PropertyDescriptor::builder::<Person, String>("name")
///     .getter(|p| &p.name)
///     .setter(|p, v| p.name = v)
///     .build();
///
/// let nickname = PropertyDescriptor::builder::<Person, String>("nickname")
///     .getter_opt(|p| p.nickname.as_ref())
///     .setter_opt(|p, v| p.nickname = v)
///     .build();
///
/// let mut person = Person { name: "Ann".into(), nickname: None };
/// assert!(nickname.read(&person).unwrap().is_none());
///
/// name.write(&mut person, Some(Box::new(String::from("Bob")))).unwrap();
/// assert_eq!(person.name, "Bob");
/// assert!(name.write(&mut person, None).is_err());
/// ```
#[must_use]
pub struct PropertyDescriptorBuilder<T, V> {
    name: Cow<'static, str>,
    nullable: bool,
    read: Option<ReadFn>,
    write: Option<WriteFn>,
    annotations: AnnotationMetadata,
    _marker: PhantomData<fn(T) -> V>,
}

fn bean_ref<T: Any>(bean: &dyn Any) -> Result<&T, PropertyAccessError> {
    bean.downcast_ref::<T>()
        .ok_or(PropertyAccessError::BeanMismatch { expected: core::any::type_name::<T>() })
}

fn bean_mut<T: Any>(bean: &mut dyn Any) -> Result<&mut T, PropertyAccessError> {
    bean.downcast_mut::<T>()
        .ok_or(PropertyAccessError::BeanMismatch { expected: core::any::type_name::<T>() })
}

fn typed_value<V: Value>(value: Box<dyn Value>) -> Result<V, PropertyAccessError> {
    value.take::<V>().map_err(|value| PropertyAccessError::ValueMismatch {
        expected: core::any::type_name::<V>(),
        actual: value.value_type_name(),
    })
}

impl<T, V> PropertyDescriptorBuilder<T, V>
where
    T: Any,
    V: Value + Clone + Serialize + DeserializeOwned,
{
    /// Reads a non-null value borrowed from the bean.
    pub fn getter(mut self, get: impl Fn(&T) -> &V + Send + Sync + 'static) -> Self {
        self.read = Some(read_fn(move |bean| {
            let value: &dyn Value = get(bean_ref::<T>(bean)?);
            Ok(Some(ValueRef::Borrowed(value)))
        }));
        self
    }

    /// Reads a nullable value borrowed from the bean. Marks the property nullable.
    pub fn getter_opt(mut self, get: impl Fn(&T) -> Option<&V> + Send + Sync + 'static) -> Self {
        self.nullable = true;
        self.read = Some(read_fn(move |bean| {
            let value = get(bean_ref::<T>(bean)?);
            Ok(value.map(|v| ValueRef::Borrowed(v as &dyn Value)))
        }));
        self
    }

    /// Reads a value computed from the bean.
    pub fn getter_owned(mut self, get: impl Fn(&T) -> V + Send + Sync + 'static) -> Self {
        self.read = Some(read_fn(move |bean| {
            let value = get(bean_ref::<T>(bean)?);
            Ok(Some(ValueRef::Owned(Box::new(value))))
        }));
        self
    }

    /// Writes a non-null value. Writing null fails with
    /// [`PropertyAccessError::NullNotAccepted`].
    pub fn setter(mut self, set: impl Fn(&mut T, V) + Send + Sync + 'static) -> Self {
        self.write = Some(write_fn(move |bean, value| {
            let bean = bean_mut::<T>(bean)?;
            let value = value.ok_or(PropertyAccessError::NullNotAccepted)?;
            set(bean, typed_value::<V>(value)?);
            Ok(())
        }));
        self
    }

    /// Writes a nullable value. Marks the property nullable.
    pub fn setter_opt(mut self, set: impl Fn(&mut T, Option<V>) + Send + Sync + 'static) -> Self {
        self.nullable = true;
        self.write = Some(write_fn(move |bean, value| {
            let bean = bean_mut::<T>(bean)?;
            let value = value.map(typed_value::<V>).transpose()?;
            set(bean, value);
            Ok(())
        }));
        self
    }

    /// Writes a value through a fallible setter.
    pub fn try_setter(
        mut self,
        set: impl Fn(&mut T, V) -> Result<(), PropertyAccessError> + Send + Sync + 'static,
    ) -> Self {
        self.write = Some(write_fn(move |bean, value| {
            let bean = bean_mut::<T>(bean)?;
            let value = value.ok_or(PropertyAccessError::NullNotAccepted)?;
            set(bean, typed_value::<V>(value)?)
        }));
        self
    }

    /// Overrides the nullability inferred from the accessors.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn annotations(mut self, annotations: AnnotationMetadata) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn build(self) -> PropertyDescriptor {
        PropertyDescriptor {
            name: self.name,
            declaring_type: core::any::type_name::<T>(),
            value_type: ValueType::of::<V>(),
            nullable: self.nullable,
            read: self.read,
            write: self.write,
            annotations: self.annotations,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
