use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_introspect::hash::HashSet;

use crate::config::{CodecConfig, Shape};
use crate::description::{BeanDescription, BeanType};
use crate::error::CodecError;
use crate::ser::writer::{MemberReader, PropertyWriter, SelfReferencePolicy};
use crate::ser::BeanSerializer;

/// Called with the bean type and the error when [`BeanSerializerBuilder::build`] fails.
pub type BuildErrorHook = fn(&BeanType, &CodecError);

/// The draft of a [`BeanSerializer`].
///
/// Created by the codec from the bean description, then handed through
/// every registered [`SerializerModifier`](crate::SerializerModifier)
/// before being built.
#[must_use]
pub struct BeanSerializerBuilder {
    bean: BeanType,
    shape: Shape,
    fail_on_empty: bool,
    properties: Vec<PropertyWriter>,
    on_build_error: Option<BuildErrorHook>,
}

/// The self-reference policy implied by the configuration.
pub fn self_reference_policy(config: &CodecConfig) -> SelfReferencePolicy {
    if config.fail_on_self_references {
        SelfReferencePolicy::Fail
    } else {
        SelfReferencePolicy::WriteNull
    }
}

impl BeanSerializerBuilder {
    /// An empty draft.
    pub fn new(bean: BeanType, config: &CodecConfig) -> Self {
        Self {
            bean,
            shape: config.shape,
            fail_on_empty: config.fail_on_empty_beans,
            properties: Vec::new(),
            on_build_error: None,
        }
    }

    /// A draft with one writer per readable member, ordered by declared
    /// index, members without index last.
    pub fn from_description(description: &BeanDescription, config: &CodecConfig) -> Self {
        let mut builder = Self::new(description.bean_type(), config);
        if let Some(shape) = description.shape() {
            builder.shape = shape;
        }

        let mut properties: Vec<PropertyWriter> = description
            .members()
            .iter()
            .filter(|member| member.descriptor().is_readable())
            .map(|member| {
                let descriptor = member.descriptor();
                PropertyWriter::new(
                    member.name().to_owned(),
                    *descriptor.value_type(),
                    Arc::new(MemberReader::new(descriptor.clone())),
                )
                .with_metadata(member.metadata().clone())
                .with_inclusion(member.inclusion().unwrap_or(config.default_inclusion))
                .with_serializer(member.serializer().cloned())
                .with_null_serializer(member.null_serializer().cloned())
                .with_self_reference(self_reference_policy(config))
            })
            .collect();
        properties.sort_by_key(|writer| writer.metadata().index.map_or(i64::MAX, i64::from));

        builder.properties = properties;
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

    #[inline]
    pub fn properties(&self) -> &[PropertyWriter] {
        &self.properties
    }

    /// Moves the writers out, leaving the draft empty.
    pub fn take_properties(&mut self) -> Vec<PropertyWriter> {
        core::mem::take(&mut self.properties)
    }

    pub fn set_properties(&mut self, properties: Vec<PropertyWriter>) {
        self.properties = properties;
    }

    /// Installs a hook observing build failures.
    pub fn set_build_error_hook(&mut self, hook: BuildErrorHook) {
        self.on_build_error = Some(hook);
    }

    /// Validates the draft and builds the serializer.
    ///
    /// On failure the hook, if any, sees the error before it is returned.
    pub fn build(self) -> Result<BeanSerializer, CodecError> {
        match self.validate() {
            Ok(()) => Ok(BeanSerializer::new(self.bean, self.shape, self.properties.into_boxed_slice())),
            Err(err) => {
                if let Some(hook) = self.on_build_error {
                    hook(&self.bean, &err);
                }
                Err(err)
            }
        }
    }

    fn validate(&self) -> Result<(), CodecError> {
        if self.properties.is_empty() && self.fail_on_empty {
            return Err(CodecError::build(
                self.bean.name(),
                "no properties discovered to create a serializer",
            ));
        }
        let mut names = HashSet::default();
        for writer in &self.properties {
            if !names.insert(writer.name()) {
                return Err(CodecError::build(
                    self.bean.name(),
                    format!("multiple properties serialized as `{}`", writer.name()),
                ));
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for BeanSerializerBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BeanSerializerBuilder")
            .field("bean", &self.bean)
            .field("shape", &self.shape)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
