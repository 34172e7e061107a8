use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;

use vc_introspect::{InstantiationError, Value};

use crate::de::SettableProperty;
use crate::description::{BeanDescription, BeanType};

/// Creates bean instances for a deserializer.
///
/// An instantiator either creates an empty bean that is then filled
/// property by property, or builds it from constructor arguments decoded
/// through its [creator properties](ValueInstantiator::creator_properties).
pub trait ValueInstantiator: Send + Sync {
    fn value_type_name(&self) -> &'static str;

    fn can_instantiate_with_no_arguments(&self) -> bool;

    fn can_instantiate_with_arguments(&self) -> bool;

    fn can_instantiate(&self) -> bool {
        self.can_instantiate_with_no_arguments() || self.can_instantiate_with_arguments()
    }

    fn instantiate_with_no_arguments(&self) -> Result<Box<dyn Any>, InstantiationError>;

    /// Creates the bean from argument values ordered by creator index.
    fn instantiate_with_arguments(
        &self,
        values: Vec<Option<Box<dyn Value>>>,
    ) -> Result<Box<dyn Any>, InstantiationError>;

    /// One property per constructor argument, in argument order.
    fn creator_properties(&self) -> Vec<Arc<dyn SettableProperty>> {
        Vec::new()
    }
}

/// Instantiates through the default constructor of a bean description.
pub struct StdInstantiator {
    bean: BeanType,
    description: Option<Arc<BeanDescription>>,
}

impl StdInstantiator {
    /// An instantiator that cannot create anything.
    #[inline]
    pub fn none(bean: BeanType) -> Self {
        Self { bean, description: None }
    }

    #[inline]
    pub fn from_description(description: Arc<BeanDescription>) -> Self {
        Self {
            bean: description.bean_type(),
            description: Some(description),
        }
    }
}

impl ValueInstantiator for StdInstantiator {
    #[inline]
    fn value_type_name(&self) -> &'static str {
        self.bean.name()
    }

    fn can_instantiate_with_no_arguments(&self) -> bool {
        self.description.as_ref().is_some_and(|d| d.has_default_constructor())
    }

    #[inline]
    fn can_instantiate_with_arguments(&self) -> bool {
        false
    }

    fn instantiate_with_no_arguments(&self) -> Result<Box<dyn Any>, InstantiationError> {
        self.description
            .as_ref()
            .and_then(|d| d.create_default())
            .ok_or(InstantiationError::NoConstructor { type_name: self.bean.name() })
    }

    fn instantiate_with_arguments(
        &self,
        _: Vec<Option<Box<dyn Value>>>,
    ) -> Result<Box<dyn Any>, InstantiationError> {
        Err(InstantiationError::NoConstructor { type_name: self.bean.name() })
    }
}
