use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use core::marker::PhantomData;

use crate::annotation::AnnotationMetadata;
use crate::constructor::{Arguments, ConstructorArgument, InstantiationError};
use crate::property::PropertyDescriptor;
use crate::value::Value;

type DefaultFn = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;
type ConstructorFn =
    Arc<dyn Fn(&mut Arguments<'_>) -> Result<Box<dyn Any>, InstantiationError> + Send + Sync>;

// -----------------------------------------------------------------------------
// TypeIntrospection

/// Precomputed metadata of a bean type.
///
/// Lists the type's properties and constructor arguments in declaration
/// order, and provides factories to create instances without reflection.
/// Immutable once built; shared as `Arc<TypeIntrospection>`.
///
/// # Examples
///
/// ```
/// use vc_introspect::{ConstructorArgument, PropertyDescriptor, TypeIntrospection, Value};
///
/// struct Point { x: i32, y: i32 }
///
/// let introspection = TypeIntrospection::builder::<Point>()
///     .property(PropertyDescriptor::builder::<Point, i32>("x").getter(|p| &p.x).build())
///     .property(PropertyDescriptor::builder::<Point, i32>("y").getter(|p| &p.y).build())
///     .argument(ConstructorArgument::new::<i32>("x"))
///     .argument(ConstructorArgument::new::<i32>("y"))
///     .constructor(|args| Ok(Point { x: args.take(0)?, y: args.take(1)? }))
///     .build();
///
/// assert_eq!(introspection.property_names().collect::<Vec<_>>(), ["x", "y"]);
/// assert!(introspection.instantiate().is_err());
///
/// let x: Box<dyn Value> = Box::new(1_i32);
/// let y: Box<dyn Value> = Box::new(2_i32);
/// let point = introspection.instantiate_with(vec![Some(x), Some(y)]).unwrap();
/// let point = point.downcast::<Point>().unwrap();
/// assert_eq!((point.x, point.y), (1, 2));
/// ```
pub struct TypeIntrospection {
    type_id: TypeId,
    type_name: &'static str,
    properties: Box<[PropertyDescriptor]>,
    arguments: Box<[ConstructorArgument]>,
    default_constructor: Option<DefaultFn>,
    constructor: Option<ConstructorFn>,
    annotations: AnnotationMetadata,
}

impl TypeIntrospection {
    /// Starts the introspection of `T`.
    #[inline]
    pub fn builder<T: Any>() -> TypeIntrospectionBuilder<T> {
        TypeIntrospectionBuilder {
            properties: Vec::new(),
            arguments: Vec::new(),
            default_constructor: None,
            constructor: None,
            annotations: AnnotationMetadata::default(),
            _marker: PhantomData,
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

    /// Annotations declared on the type itself.
    #[inline]
    pub fn annotations(&self) -> &AnnotationMetadata {
        &self.annotations
    }

    /// Property names in declaration order.
    pub fn property_names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.properties.iter().map(PropertyDescriptor::name)
    }

    /// Properties in declaration order.
    #[inline]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Looks up a property by its exact name.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Constructor arguments in ordinal order.
    #[inline]
    pub fn constructor_arguments(&self) -> &[ConstructorArgument] {
        &self.arguments
    }

    /// Creates an instance without arguments.
    ///
    /// Uses the default constructor if one was declared, otherwise the
    /// constructor if it takes no arguments.
    pub fn instantiate(&self) -> Result<Box<dyn Any>, InstantiationError> {
        if let Some(default) = &self.default_constructor {
            return Ok(default());
        }
        match &self.constructor {
            Some(constructor) if self.arguments.is_empty() => {
                let mut args = Arguments::new(self.type_name, &self.arguments, Vec::new());
                constructor(&mut args)
            }
            Some(_) => Err(InstantiationError::ArgumentsRequired { type_name: self.type_name }),
            None => Err(InstantiationError::NoConstructor { type_name: self.type_name }),
        }
    }

    /// Creates an instance from argument values in ordinal order.
    pub fn instantiate_with(
        &self,
        values: Vec<Option<Box<dyn Value>>>,
    ) -> Result<Box<dyn Any>, InstantiationError> {
        let Some(constructor) = &self.constructor else {
            return Err(InstantiationError::NoConstructor { type_name: self.type_name });
        };
        if values.len() != self.arguments.len() {
            return Err(InstantiationError::ArgumentCount {
                type_name: self.type_name,
                expected: self.arguments.len(),
                found: values.len(),
            });
        }
        let mut args = Arguments::new(self.type_name, &self.arguments, values);
        constructor(&mut args)
    }
}

impl fmt::Debug for TypeIntrospection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeIntrospection")
            .field("type_name", &self.type_name)
            .field("properties", &self.properties)
            .field("arguments", &self.arguments)
            .field("default_constructor", &self.default_constructor.is_some())
            .field("constructor", &self.constructor.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Builder

/// Builder of [`TypeIntrospection`].
#[must_use]
pub struct TypeIntrospectionBuilder<T> {
    properties: Vec<PropertyDescriptor>,
    arguments: Vec<ConstructorArgument>,
    default_constructor: Option<DefaultFn>,
    constructor: Option<ConstructorFn>,
    annotations: AnnotationMetadata,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> TypeIntrospectionBuilder<T> {
    /// Appends a property.
    ///
    /// A property with the same name replaces the earlier one in place.
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        match self.properties.iter_mut().find(|p| p.name() == property.name()) {
            Some(old) => {
                log::warn!(
                    "Duplicate property `{}` on `{}`, the later declaration replaces the earlier one.",
                    property.name(),
                    core::any::type_name::<T>(),
                );
                *old = property;
            }
            None => self.properties.push(property),
        }
        self
    }

    /// Appends a constructor argument at the next ordinal position.
    pub fn argument(mut self, argument: ConstructorArgument) -> Self {
        let index = self.arguments.len();
        self.arguments.push(argument.with_index(index));
        self
    }

    /// Sets the no-argument factory.
    pub fn default_constructor(mut self, f: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.default_constructor = Some(Arc::new(move || Box::new(f()) as Box<dyn Any>));
        self
    }

    /// Sets the factory taking the declared arguments.
    pub fn constructor(
        mut self,
        f: impl Fn(&mut Arguments<'_>) -> Result<T, InstantiationError> + Send + Sync + 'static,
    ) -> Self {
        self.constructor = Some(Arc::new(move |args: &mut Arguments<'_>| {
            f(args).map(|bean| Box::new(bean) as Box<dyn Any>)
        }));
        self
    }

    pub fn annotations(mut self, annotations: AnnotationMetadata) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn build(self) -> TypeIntrospection {
        TypeIntrospection {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            properties: self.properties.into_boxed_slice(),
            arguments: self.arguments.into_boxed_slice(),
            default_constructor: self.default_constructor,
            constructor: self.constructor,
            annotations: self.annotations,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
