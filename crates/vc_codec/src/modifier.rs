use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::config::CodecConfig;
use crate::de::BeanDeserializerBuilder;
use crate::description::BeanType;
use crate::ser::BeanSerializerBuilder;

/// Rewrites serializer drafts before they are built.
pub trait SerializerModifier: Send + Sync {
    fn update_builder(
        &self,
        config: &CodecConfig,
        bean: &BeanType,
        builder: BeanSerializerBuilder,
    ) -> BeanSerializerBuilder;
}

/// Rewrites deserializer drafts before they are built.
pub trait DeserializerModifier: Send + Sync {
    fn update_builder(
        &self,
        config: &CodecConfig,
        bean: &BeanType,
        builder: BeanDeserializerBuilder,
    ) -> BeanDeserializerBuilder;
}

/// A bundle of codec extensions, installed once when the codec is built.
pub trait Module {
    fn name(&self) -> &str;

    fn setup(&self, context: &mut ModuleContext<'_>);
}

/// What a [`Module`] may see and extend during setup.
pub struct ModuleContext<'a> {
    config: &'a CodecConfig,
    serializer_modifiers: &'a mut Vec<Arc<dyn SerializerModifier>>,
    deserializer_modifiers: &'a mut Vec<Arc<dyn DeserializerModifier>>,
}

impl<'a> ModuleContext<'a> {
    #[inline]
    pub(crate) fn new(
        config: &'a CodecConfig,
        serializer_modifiers: &'a mut Vec<Arc<dyn SerializerModifier>>,
        deserializer_modifiers: &'a mut Vec<Arc<dyn DeserializerModifier>>,
    ) -> Self {
        Self { config, serializer_modifiers, deserializer_modifiers }
    }

    #[inline]
    pub fn config(&self) -> &CodecConfig {
        self.config
    }

    /// Modifiers run in registration order.
    pub fn add_serializer_modifier(&mut self, modifier: Arc<dyn SerializerModifier>) {
        self.serializer_modifiers.push(modifier);
    }

    pub fn add_deserializer_modifier(&mut self, modifier: Arc<dyn DeserializerModifier>) {
        self.deserializer_modifiers.push(modifier);
    }
}
