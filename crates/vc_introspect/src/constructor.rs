use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde_core::Serialize;
use serde_core::de::DeserializeOwned;
use thiserror::Error;

use crate::annotation::AnnotationMetadata;
use crate::value::Value;
use crate::value_type::ValueType;

// -----------------------------------------------------------------------------
// InstantiationError

/// An error produced when creating a bean through its introspection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstantiationError {
    #[error("`{type_name}` has no constructor")]
    NoConstructor { type_name: &'static str },
    /// The type can only be created from constructor arguments.
    #[error("`{type_name}` cannot be instantiated without arguments")]
    ArgumentsRequired { type_name: &'static str },
    #[error("`{type_name}` expects {expected} constructor arguments, got {found}")]
    ArgumentCount {
        type_name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("missing constructor argument `{name}` for `{type_name}`")]
    MissingArgument { type_name: &'static str, name: String },
    #[error("constructor argument `{name}` of `{type_name}` expects `{expected}`, found `{actual}`")]
    ArgumentType {
        type_name: &'static str,
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    /// The constructor itself rejected the arguments.
    #[error("{0}")]
    Rejected(Cow<'static, str>),
}

// -----------------------------------------------------------------------------
// ConstructorArgument

/// A parameter of the constructor of an introspected type.
#[derive(Clone)]
pub struct ConstructorArgument {
    name: Cow<'static, str>,
    index: usize,
    value_type: ValueType,
    nullable: bool,
    annotations: AnnotationMetadata,
}

impl ConstructorArgument {
    /// Creates an argument of type `V`.
    ///
    /// The ordinal position is assigned when the argument is added to a
    /// [`TypeIntrospection`](crate::TypeIntrospection).
    pub fn new<V>(name: impl Into<Cow<'static, str>>) -> Self
    where
        V: Value + Clone + Serialize + DeserializeOwned,
    {
        Self {
            name: name.into(),
            index: 0,
            value_type: ValueType::of::<V>(),
            nullable: false,
            annotations: AnnotationMetadata::default(),
        }
    }

    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[must_use]
    pub fn annotations(mut self, annotations: AnnotationMetadata) -> Self {
        self.annotations = annotations;
        self
    }

    #[inline]
    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordinal position in the constructor.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn annotation_metadata(&self) -> &AnnotationMetadata {
        &self.annotations
    }
}

impl fmt::Debug for ConstructorArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorArgument")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("value_type", &self.value_type)
            .field("nullable", &self.nullable)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Arguments

/// Argument values handed to a constructor, in declaration order.
///
/// `None` slots are nulls or values absent from the input.
pub struct Arguments<'a> {
    type_name: &'static str,
    arguments: &'a [ConstructorArgument],
    values: Vec<Option<Box<dyn Value>>>,
}

impl<'a> Arguments<'a> {
    #[inline]
    pub(crate) fn new(
        type_name: &'static str,
        arguments: &'a [ConstructorArgument],
        values: Vec<Option<Box<dyn Value>>>,
    ) -> Self {
        Self { type_name, arguments, values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn argument_name(&self, index: usize) -> String {
        match self.arguments.get(index) {
            Some(argument) => argument.name().into(),
            None => alloc::format!("#{index}"),
        }
    }

    /// Takes the nullable argument at `index`.
    pub fn take_opt<V: Value>(&mut self, index: usize) -> Result<Option<V>, InstantiationError> {
        let Some(slot) = self.values.get_mut(index) else {
            return Err(InstantiationError::MissingArgument {
                type_name: self.type_name,
                name: self.argument_name(index),
            });
        };
        match slot.take() {
            None => Ok(None),
            Some(value) => match value.take::<V>() {
                Ok(value) => Ok(Some(value)),
                Err(value) => Err(InstantiationError::ArgumentType {
                    type_name: self.type_name,
                    name: self.argument_name(index),
                    expected: core::any::type_name::<V>(),
                    actual: value.value_type_name(),
                }),
            },
        }
    }

    /// Takes the non-null argument at `index`.
    pub fn take<V: Value>(&mut self, index: usize) -> Result<V, InstantiationError> {
        self.take_opt::<V>(index)?.ok_or_else(|| InstantiationError::MissingArgument {
            type_name: self.type_name,
            name: self.argument_name(index),
        })
    }

    /// Takes the argument at `index`, falling back to `V::default()` on null.
    pub fn take_or_default<V: Value + Default>(&mut self, index: usize) -> Result<V, InstantiationError> {
        Ok(self.take_opt::<V>(index)?.unwrap_or_default())
    }
}
