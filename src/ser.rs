use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_codec::ser::self_reference_policy;
use vc_codec::{
    BeanSerializerBuilder, BeanType, CodecConfig, CodecError, Inclusion, PropertyWriter,
    SelfReferencePolicy, SerializerModifier,
};
use vc_introspect::hash::HashMap;
use vc_introspect::{IntrospectionLookup, PropertyDescriptor, TypeIntrospection};

use crate::bridge::AccessorBridge;
use crate::metadata::{declared_name, external_name, property_metadata};

// -----------------------------------------------------------------------------
// SerializationBinder

/// Rebinds the property writers of a serializer draft to introspected
/// accessors.
///
/// Only the way values are read changes. Names, serializers, null handling,
/// suppression and self-reference policies of existing writers are kept.
#[derive(Debug, Clone)]
pub struct SerializationBinder {
    inclusion: Inclusion,
    self_reference: SelfReferencePolicy,
}

impl SerializationBinder {
    /// A binder synthesizing writers with the defaults of `config`.
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            inclusion: config.default_inclusion,
            self_reference: self_reference_policy(config),
        }
    }

    /// Returns the adjusted writer list.
    ///
    /// An empty draft is replaced by one writer per property, in
    /// introspection order. Writers of write-only properties never read. Otherwise each writer is matched, first through
    /// the explicitly declared names, then by exact property name; matched
    /// writers are rebound and the others are kept as they are.
    pub fn adjust(&self, introspection: &TypeIntrospection, writers: Vec<PropertyWriter>) -> Vec<PropertyWriter> {
        if writers.is_empty() && !introspection.properties().is_empty() {
            log::debug!(
                "Bean `{}` has no properties, while its introspection does. Recreating from introspection.",
                introspection.type_name(),
            );
            return introspection
                .properties()
                .iter()
                .map(|property| self.synthesize(property))
                .collect();
        }

        log::debug!(
            "Updating {} properties with introspection data for type `{}`.",
            writers.len(),
            introspection.type_name(),
        );

        let mut named: HashMap<&str, &PropertyDescriptor> = HashMap::default();
        for property in introspection.properties() {
            if let Some(name) = declared_name(property.annotations()) {
                named.entry(name).or_insert(property);
            }
        }

        writers
            .into_iter()
            .map(|writer| {
                let property = named
                    .get(writer.name())
                    .copied()
                    .or_else(|| introspection.property(writer.name()))
                    .filter(|property| property.is_readable());
                match property {
                    Some(property) => {
                        writer.rebind(*property.value_type(), Arc::new(AccessorBridge::new(property.clone())))
                    }
                    None => writer,
                }
            })
            .collect()
    }

    fn synthesize(&self, property: &PropertyDescriptor) -> PropertyWriter {
        let annotations = property.annotations();
        PropertyWriter::new(
            external_name(property.name(), annotations).to_owned(),
            *property.value_type(),
            Arc::new(AccessorBridge::new(property.clone())),
        )
        .with_metadata(property_metadata(annotations))
        .with_inclusion(self.inclusion)
        .with_self_reference(self.self_reference.clone())
    }
}

// -----------------------------------------------------------------------------
// IntrospectionSerializerModifier

/// Applies the [`SerializationBinder`] to the drafts of introspected types.
///
/// Drafts of other types are returned untouched.
pub struct IntrospectionSerializerModifier {
    lookup: Arc<dyn IntrospectionLookup>,
}

impl IntrospectionSerializerModifier {
    #[inline]
    pub fn new(lookup: Arc<dyn IntrospectionLookup>) -> Self {
        Self { lookup }
    }
}

impl SerializerModifier for IntrospectionSerializerModifier {
    fn update_builder(
        &self,
        config: &CodecConfig,
        bean: &BeanType,
        mut builder: BeanSerializerBuilder,
    ) -> BeanSerializerBuilder {
        let Some(introspection) = self.lookup.find_introspection(bean.type_id()) else {
            return builder;
        };

        let writers = builder.take_properties();
        builder.set_properties(SerializationBinder::new(config).adjust(&introspection, writers));
        builder.set_build_error_hook(log_build_error);
        builder
    }
}

fn log_build_error(bean: &BeanType, err: &CodecError) {
    log::error!("Error building bean serializer for type `{bean}`: {err}");
}

// -----------------------------------------------------------------------------
// Tests
