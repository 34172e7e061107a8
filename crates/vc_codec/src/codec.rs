use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use core::marker::PhantomData;
use std::sync::{PoisonError, RwLock};

use serde_core::de::{DeserializeSeed, Deserializer};
use serde_core::ser::{Serialize, Serializer};
use vc_introspect::hash::HashMap;

use crate::config::CodecConfig;
use crate::de::{BeanDeserializer, BeanDeserializerBuilder};
use crate::description::{BeanDescription, BeanType};
use crate::error::{CodecError, de_error, ser_error};
use crate::modifier::{DeserializerModifier, Module, ModuleContext, SerializerModifier};
use crate::ser::{BeanSerializer, BeanSerializerBuilder};

// -----------------------------------------------------------------------------
// Codec

/// Serializes and deserializes beans through serde.
///
/// Per bean type, the codec drafts a serializer and a deserializer from
/// the registered [`BeanDescription`] (an empty draft if there is none),
/// lets every modifier rewrite the draft, builds it and caches the result.
///
/// # Examples
///
/// ```
/// use vc_codec::{BeanDescription, BeanMember, Codec};
/// use vc_introspect::PropertyDescriptor;
///
/// #[derive(Default)]
/// struct Tag { label: String }
///
/// let codec = Codec::builder()
///     .describe(
///         BeanDescription::builder::<Tag>()
///             .member(BeanMember::method(
///                 PropertyDescriptor::builder::<Tag, String>("label")
///                     .getter(|t| &t.label)
///                     .setter(|t, v| t.label = v)
///                     .build(),
///             ))
///             .default_constructor(Tag::default)
///             .build(),
///     )
///     .build();
///
/// let json = serde_json::to_string(&codec.value(&Tag { label: "red".into() })).unwrap();
/// assert_eq!(json, r#"{"label":"red"}"#);
///
/// let tag: Tag = codec.deserialize(&mut serde_json::Deserializer::from_str(&json)).unwrap();
/// assert_eq!(tag.label, "red");
/// ```
pub struct Codec {
    config: CodecConfig,
    descriptions: HashMap<TypeId, Arc<BeanDescription>>,
    serializer_modifiers: Vec<Arc<dyn SerializerModifier>>,
    deserializer_modifiers: Vec<Arc<dyn DeserializerModifier>>,
    serializers: RwLock<HashMap<TypeId, Arc<BeanSerializer>>>,
    deserializers: RwLock<HashMap<TypeId, Arc<BeanDeserializer>>>,
}

impl Codec {
    #[inline]
    pub fn builder() -> CodecBuilder {
        CodecBuilder {
            config: CodecConfig::default(),
            descriptions: Vec::new(),
            modules: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn description(&self, type_id: TypeId) -> Option<&Arc<BeanDescription>> {
        self.descriptions.get(&type_id)
    }

    /// Returns the cached serializer of `bean`, building it on first use.
    pub fn serializer_for(&self, bean: BeanType) -> Result<Arc<BeanSerializer>, CodecError> {
        let cached = self.serializers.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(serializer) = cached.get(&bean.type_id()) {
            return Ok(serializer.clone());
        }
        drop(cached);

        let mut builder = match self.descriptions.get(&bean.type_id()) {
            Some(description) => BeanSerializerBuilder::from_description(description, &self.config),
            None => BeanSerializerBuilder::new(bean, &self.config),
        };
        for modifier in &self.serializer_modifiers {
            builder = modifier.update_builder(&self.config, &bean, builder);
        }
        let serializer = Arc::new(builder.build()?);

        let mut cache = self.serializers.write().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.entry(bean.type_id()).or_insert(serializer).clone())
    }

    /// Returns the cached deserializer of `bean`, building it on first use.
    pub fn deserializer_for(&self, bean: BeanType) -> Result<Arc<BeanDeserializer>, CodecError> {
        let cached = self.deserializers.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(deserializer) = cached.get(&bean.type_id()) {
            return Ok(deserializer.clone());
        }
        drop(cached);

        let mut builder = match self.descriptions.get(&bean.type_id()) {
            Some(description) => BeanDeserializerBuilder::from_description(description, &self.config),
            None => BeanDeserializerBuilder::new(bean, &self.config),
        };
        for modifier in &self.deserializer_modifiers {
            builder = modifier.update_builder(&self.config, &bean, builder);
        }
        let deserializer = Arc::new(builder.build()?);

        let mut cache = self.deserializers.write().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.entry(bean.type_id()).or_insert(deserializer).clone())
    }

    /// Returns a serializable view of `bean`.
    #[inline]
    pub fn value<'a, T: Any>(&'a self, bean: &'a T) -> SerializeBean<'a> {
        SerializeBean {
            codec: self,
            bean_type: BeanType::of::<T>(),
            bean,
        }
    }

    /// Decodes a new `T`.
    pub fn deserialize<'de, T: Any, D: Deserializer<'de>>(&self, deserializer: D) -> Result<T, D::Error> {
        self.seed::<T>().deserialize(deserializer)
    }

    /// Decodes into an existing `T`.
    pub fn update<'de, T: Any, D: Deserializer<'de>>(&self, bean: &mut T, deserializer: D) -> Result<(), D::Error> {
        let bean_deserializer = self.deserializer_for(BeanType::of::<T>()).map_err(de_error)?;
        bean_deserializer.deserialize_into(bean, deserializer)
    }

    /// A [`DeserializeSeed`] producing a `T`, for use inside other decoders.
    #[inline]
    pub fn seed<T: Any>(&self) -> TypedSeed<'_, T> {
        TypedSeed { codec: self, _marker: PhantomData }
    }
}

impl Default for Codec {
    #[inline]
    fn default() -> Self {
        Codec::builder().build()
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("config", &self.config)
            .field("descriptions", &self.descriptions.len())
            .field("serializer_modifiers", &self.serializer_modifiers.len())
            .field("deserializer_modifiers", &self.deserializer_modifiers.len())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// CodecBuilder

/// Builder of [`Codec`].
#[must_use]
pub struct CodecBuilder {
    config: CodecConfig,
    descriptions: Vec<BeanDescription>,
    modules: Vec<Box<dyn Module>>,
}

impl CodecBuilder {
    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers the description of a bean type.
    ///
    /// A later description of the same type replaces the earlier one.
    pub fn describe(mut self, description: BeanDescription) -> Self {
        self.descriptions.push(description);
        self
    }

    /// Registers a module. Modules are set up in registration order.
    pub fn module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn build(self) -> Codec {
        let mut descriptions = HashMap::default();
        for description in self.descriptions {
            let bean = description.bean_type();
            if descriptions.insert(bean.type_id(), Arc::new(description)).is_some() {
                log::debug!("Description of `{bean}` registered twice, keeping the later one.");
            }
        }

        let mut serializer_modifiers = Vec::new();
        let mut deserializer_modifiers = Vec::new();
        for module in &self.modules {
            log::debug!("Setting up codec module `{}`.", module.name());
            let mut context =
                ModuleContext::new(&self.config, &mut serializer_modifiers, &mut deserializer_modifiers);
            module.setup(&mut context);
        }

        Codec {
            config: self.config,
            descriptions,
            serializer_modifiers,
            deserializer_modifiers,
            serializers: RwLock::new(HashMap::default()),
            deserializers: RwLock::new(HashMap::default()),
        }
    }
}

// -----------------------------------------------------------------------------
// Serialize / Deserialize adapters

/// A bean paired with its codec, see [`Codec::value`].
pub struct SerializeBean<'a> {
    codec: &'a Codec,
    bean_type: BeanType,
    bean: &'a dyn Any,
}

impl Serialize for SerializeBean<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bean_serializer = self.codec.serializer_for(self.bean_type).map_err(ser_error)?;
        bean_serializer.serialize(self.bean, serializer)
    }
}

/// Decodes a `T` through a codec, see [`Codec::seed`].
pub struct TypedSeed<'a, T> {
    codec: &'a Codec,
    _marker: PhantomData<fn() -> T>,
}

impl<'de, T: Any> DeserializeSeed<'de> for TypedSeed<'_, T> {
    type Value = T;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<T, D::Error> {
        let bean_type = BeanType::of::<T>();
        let bean_deserializer = self.codec.deserializer_for(bean_type).map_err(de_error)?;
        let bean = bean_deserializer.deserialize(deserializer)?;
        match bean.downcast::<T>() {
            Ok(bean) => Ok(*bean),
            Err(_) => Err(de_error(CodecError::BeanMismatch { expected: bean_type.name() })),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use vc_introspect::annotation::{AnnotationMetadata, attributes, kinds};
    use vc_introspect::{PropertyAccessError, PropertyDescriptor};

    use crate::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Person {
        name: String,
        nickname: Option<String>,
        age: u32,
    }

    fn name() -> BeanMember {
        BeanMember::method(
            PropertyDescriptor::builder::<Person, String>("name")
                .getter(|p| &p.name)
                .setter(|p, v| p.name = v)
                .build(),
        )
    }

    fn nickname() -> BeanMember {
        BeanMember::method(
            PropertyDescriptor::builder::<Person, String>("nickname")
                .getter_opt(|p| p.nickname.as_ref())
                .setter_opt(|p, v| p.nickname = v)
                .build(),
        )
    }

    fn age() -> PropertyDescriptor {
        PropertyDescriptor::builder::<Person, u32>("age")
            .getter(|p| &p.age)
            .try_setter(|p, v| {
                if v > 150 {
                    return Err(PropertyAccessError::Rejected("implausible age".into()));
                }
                p.age = v;
                Ok(())
            })
            .build()
    }

    fn describe(members: Vec<BeanMember>) -> BeanDescription {
        members
            .into_iter()
            .fold(BeanDescription::builder::<Person>(), |b, m| b.member(m))
            .default_constructor(Person::default)
            .build()
    }

    fn person_codec(config: CodecConfig, members: Vec<BeanMember>) -> Codec {
        Codec::builder().config(config).describe(describe(members)).build()
    }

    fn ann() -> Person {
        Person { name: "Ann".into(), nickname: None, age: 30 }
    }

    fn from_json<T: core::any::Any>(codec: &Codec, json: &str) -> Result<T, serde_json::Error> {
        codec.deserialize(&mut serde_json::Deserializer::from_str(json))
    }

    #[test]
    fn described_round_trip() {
        let codec = person_codec(CodecConfig::default(), vec![name(), nickname(), BeanMember::field(age())]);

        let json = serde_json::to_string(&codec.value(&ann())).unwrap();
        assert_eq!(json, r#"{"name":"Ann","nickname":null,"age":30}"#);

        let person: Person = from_json(&codec, &json).unwrap();
        assert_eq!(person, ann());

        let serializer = codec.serializer_for(BeanType::of::<Person>()).unwrap();
        assert!(Arc::ptr_eq(&serializer, &codec.serializer_for(BeanType::of::<Person>()).unwrap()));
        assert_eq!(serializer.writer("age").unwrap().reader().strategy(), AccessStrategy::Member);
    }

    #[test]
    fn inclusion_rules() {
        let config = CodecConfig { default_inclusion: Inclusion::NonNull, ..CodecConfig::default() };
        let codec = person_codec(config, vec![name(), nickname(), BeanMember::field(age())]);
        let json = serde_json::to_string(&codec.value(&ann())).unwrap();
        assert_eq!(json, r#"{"name":"Ann","age":30}"#);

        let adult = PropertyMetadata { default_value: Some("30".into()), ..PropertyMetadata::OPTIONAL };
        let codec = person_codec(
            CodecConfig::default(),
            vec![
                name().with_inclusion(Inclusion::NonEmpty),
                nickname(),
                BeanMember::field(age()).with_metadata(adult).with_inclusion(Inclusion::NonDefault),
            ],
        );
        let json = serde_json::to_string(&codec.value(&ann())).unwrap();
        assert_eq!(json, r#"{"name":"Ann","nickname":null}"#);

        let nobody = Person { name: String::new(), nickname: None, age: 31 };
        let json = serde_json::to_string(&codec.value(&nobody)).unwrap();
        assert_eq!(json, r#"{"nickname":null,"age":31}"#);
    }

    #[test]
    fn null_serializer_and_custom_serializer() {
        let shout = ValueSerializer::new(|name: &String| name.to_uppercase());
        let codec = person_codec(
            CodecConfig { default_inclusion: Inclusion::NonNull, ..CodecConfig::default() },
            vec![
                name().with_serializer(shout),
                nickname().with_null_serializer(String::from("n/a")),
            ],
        );
        let json = serde_json::to_string(&codec.value(&ann())).unwrap();
        assert_eq!(json, r#"{"name":"ANN","nickname":"n/a"}"#);
    }

    #[test]
    fn declared_index_orders_writers() {
        let first = AnnotationMetadata::builder()
            .value(kinds::JSON_PROPERTY, attributes::INDEX, 0_i64)
            .value(kinds::JSON_PROPERTY, attributes::VALUE, "years")
            .build();
        let age = PropertyDescriptor::builder::<Person, u32>("age")
            .getter(|p| &p.age)
            .setter(|p, v| p.age = v)
            .annotations(first)
            .build();
        let codec = person_codec(CodecConfig::default(), vec![name(), BeanMember::field(age)]);

        let json = serde_json::to_string(&codec.value(&ann())).unwrap();
        assert_eq!(json, r#"{"years":30,"name":"Ann"}"#);

        let person: Person = from_json(&codec, r#"{"years":5,"name":"Kid"}"#).unwrap();
        assert_eq!(person.age, 5);
    }

    #[test]
    fn array_shape() {
        let config = CodecConfig { shape: Shape::Array, ..CodecConfig::default() };
        let codec = person_codec(config, vec![name(), nickname(), BeanMember::field(age())]);

        let json = serde_json::to_string(&codec.value(&ann())).unwrap();
        assert_eq!(json, r#"["Ann",null,30]"#);

        let person: Person = from_json(&codec, r#"["Bob","b",7]"#).unwrap();
        assert_eq!(person, Person { name: "Bob".into(), nickname: Some("b".into()), age: 7 });

        let person: Person = from_json(&codec, r#"["Bob"]"#).unwrap();
        assert_eq!(person.name, "Bob");
        assert_eq!(person.age, 0);

        assert!(from_json::<Person>(&codec, r#"["Bob",null,1,2]"#).is_err());
    }

    #[test]
    fn suppressed_element_keeps_its_slot() {
        let config = CodecConfig {
            shape: Shape::Array,
            default_inclusion: Inclusion::NonEmpty,
            ..CodecConfig::default()
        };
        let codec = person_codec(config, vec![name(), BeanMember::field(age())]);
        let nobody = Person { name: String::new(), nickname: None, age: 2 };

        let json = serde_json::to_string(&codec.value(&nobody)).unwrap();
        assert_eq!(json, r#"[null,2]"#);
    }

    #[test]
    fn unknown_properties() {
        let members = || vec![name(), nickname(), BeanMember::field(age())];

        let strict = person_codec(CodecConfig::default(), members());
        let err = from_json::<Person>(&strict, r#"{"name":"Ann","x":1}"#).unwrap_err();
        assert!(err.to_string().contains("unknown property `x`"));

        let lenient = person_codec(
            CodecConfig { fail_on_unknown_properties: false, ..CodecConfig::default() },
            members(),
        );
        let person: Person = from_json(&lenient, r#"{"name":"Ann","x":{"deep":[1]},"age":3}"#).unwrap();
        assert_eq!(person.age, 3);
    }

    #[test]
    fn update_keeps_earlier_writes() {
        let codec = person_codec(CodecConfig::default(), vec![name(), nickname(), BeanMember::field(age())]);
        let mut person = ann();

        let mut de = serde_json::Deserializer::from_str(r#"{"name":"Zed","age":200,"nickname":"z"}"#);
        let err = codec.update(&mut person, &mut de).unwrap_err();
        assert!(err.to_string().contains("implausible age"));
        assert_eq!(person.name, "Zed");
        assert_eq!(person.age, 30);
        assert_eq!(person.nickname, None);

        let mut de = serde_json::Deserializer::from_str(r#"{"nickname":"z"}"#);
        codec.update(&mut person, &mut de).unwrap();
        assert_eq!(person.nickname.as_deref(), Some("z"));
    }

    #[test]
    fn null_into_non_nullable_property() {
        let codec = person_codec(CodecConfig::default(), vec![name()]);
        let err = from_json::<Person>(&codec, r#"{"name":null}"#).unwrap_err();
        assert!(err.to_string().contains("does not accept null"));
    }

    #[test]
    fn custom_value_deserializer() {
        let codec = person_codec(
            CodecConfig::default(),
            vec![name(), nickname().with_deserializer(ValueDeserializer::map(|s: String| s.to_uppercase()))],
        );
        let person: Person = from_json(&codec, r#"{"name":"a","nickname":"bo"}"#).unwrap();
        assert_eq!(person.nickname.as_deref(), Some("BO"));

        let person: Person = from_json(&codec, r#"{"nickname":null}"#).unwrap();
        assert_eq!(person.nickname, None);
    }

    #[test]
    fn build_failures() {
        let codec = person_codec(CodecConfig::default(), vec![name(), nickname().with_name("name")]);
        let err = codec.serializer_for(BeanType::of::<Person>()).unwrap_err();
        assert!(matches!(err, CodecError::Build { .. }));
        assert!(err.to_string().contains("multiple properties"));

        struct Opaque;

        let codec = Codec::default();
        let err = codec.serializer_for(BeanType::of::<Opaque>()).unwrap_err();
        assert!(err.to_string().contains("no properties"));
        let err = codec.deserializer_for(BeanType::of::<Opaque>()).unwrap_err();
        assert!(err.to_string().contains("no creator"));

        let lenient = Codec::builder()
            .config(CodecConfig { fail_on_empty_beans: false, ..CodecConfig::default() })
            .build();
        assert_eq!(serde_json::to_string(&lenient.value(&Opaque)).unwrap(), "{}");
    }

    // -------------------------------------------------------------------------
    // Self references

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Node {
        id: u32,
    }

    fn node_description() -> BeanDescription {
        BeanDescription::builder::<Node>()
            .member(BeanMember::field(
                PropertyDescriptor::builder::<Node, u32>("id").getter(|n| &n.id).build(),
            ))
            .member(BeanMember::computed(
                PropertyDescriptor::builder::<Node, Node>("me").getter(|n| n).build(),
            ))
            .build()
    }

    fn node_json(policy: SelfReferencePolicy) -> Result<String, serde_json::Error> {
        let config = CodecConfig::default();
        let mut builder = BeanSerializerBuilder::from_description(&node_description(), &config);
        let writers = builder
            .take_properties()
            .into_iter()
            .map(|w| w.with_self_reference(policy.clone()))
            .collect();
        builder.set_properties(writers);
        let serializer = builder.build().unwrap();
        serde_json::to_string(&serializer.bind(&Node { id: 1 }))
    }

    #[test]
    fn self_reference_policies() {
        let err = node_json(SelfReferencePolicy::Fail).unwrap_err();
        assert!(err.to_string().contains("self-reference through property `me`"));

        assert_eq!(node_json(SelfReferencePolicy::WriteNull).unwrap(), r#"{"id":1,"me":null}"#);
        assert_eq!(node_json(SelfReferencePolicy::PassThrough).unwrap(), r#"{"id":1,"me":{"id":1}}"#);

        let alternate = ValueSerializer::new(|n: &Node| alloc::format!("#{}", n.id));
        assert_eq!(
            node_json(SelfReferencePolicy::Alternate(alternate)).unwrap(),
            r##"{"id":1,"me":"#1"}"##,
        );
    }

    #[test]
    fn self_reference_follows_config() {
        let codec = Codec::builder()
            .config(CodecConfig { fail_on_self_references: false, ..CodecConfig::default() })
            .describe(node_description())
            .build();
        let json = serde_json::to_string(&codec.value(&Node { id: 4 })).unwrap();
        assert_eq!(json, r#"{"id":4,"me":null}"#);
    }

    // -------------------------------------------------------------------------
    // Modules

    struct Reverse;

    impl SerializerModifier for Reverse {
        fn update_builder(
            &self,
            _: &CodecConfig,
            _: &BeanType,
            mut builder: BeanSerializerBuilder,
        ) -> BeanSerializerBuilder {
            let mut writers = builder.take_properties();
            writers.reverse();
            builder.set_properties(writers);
            builder
        }
    }

    struct ReverseModule;

    impl Module for ReverseModule {
        fn name(&self) -> &str {
            "reverse"
        }

        fn setup(&self, context: &mut ModuleContext<'_>) {
            context.add_serializer_modifier(Arc::new(Reverse));
        }
    }

    #[test]
    fn modules_rewrite_drafts() {
        let codec = Codec::builder()
            .describe(describe(vec![name(), BeanMember::field(age())]))
            .module(ReverseModule)
            .build();
        let json = serde_json::to_string(&codec.value(&ann())).unwrap();
        assert_eq!(json, r#"{"age":30,"name":"Ann"}"#);
    }
}
