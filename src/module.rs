use alloc::sync::Arc;

use vc_codec::{Module, ModuleContext};
use vc_introspect::{IntrospectionLookup, SharedIntrospector};

use crate::de::IntrospectionDeserializerModifier;
use crate::ser::IntrospectionSerializerModifier;

/// Binds the codec to introspections instead of the bean descriptions'
/// own accessors.
///
/// Installs an [`IntrospectionSerializerModifier`] and an
/// [`IntrospectionDeserializerModifier`], unless the codec configuration
/// disables `use_bean_introspection`. Introspections are looked up in the
/// shared registry by default.
///
/// # Examples
///
/// ```
/// use vc_beans::BeanIntrospectionModule;
/// use vc_beans::codec::Codec;
/// use vc_beans::introspect::{
///     ConstructorArgument, IntrospectionRegistry, PropertyDescriptor, TypeIntrospection,
/// };
///
/// struct Point { x: i32, y: i32 }
///
/// let registry = IntrospectionRegistry::new();
/// registry.register(
///     TypeIntrospection::builder::<Point>()
///         .property(PropertyDescriptor::builder::<Point, i32>("x").getter(|p| &p.x).build())
///         .property(PropertyDescriptor::builder::<Point, i32>("y").getter(|p| &p.y).build())
///         .argument(ConstructorArgument::new::<i32>("x"))
///         .argument(ConstructorArgument::new::<i32>("y"))
///         .constructor(|args| Ok(Point { x: args.take(0)?, y: args.take(1)? }))
///         .build(),
/// );
///
/// let codec = Codec::builder()
///     .module(BeanIntrospectionModule::with_lookup(registry))
///     .build();
///
/// let point: Point = codec
///     .deserialize(&mut serde_json::Deserializer::from_str(r#"{"x":1,"y":2}"#))
///     .unwrap();
/// assert_eq!((point.x, point.y), (1, 2));
/// assert_eq!(serde_json::to_string(&codec.value(&point)).unwrap(), r#"{"x":1,"y":2}"#);
/// ```
#[derive(Clone)]
pub struct BeanIntrospectionModule {
    lookup: Arc<dyn IntrospectionLookup>,
}

impl BeanIntrospectionModule {
    /// A module reading the shared registry.
    #[inline]
    pub fn new() -> Self {
        Self::with_lookup(SharedIntrospector)
    }

    /// A module reading `lookup`.
    pub fn with_lookup(lookup: impl IntrospectionLookup + 'static) -> Self {
        Self { lookup: Arc::new(lookup) }
    }
}

impl Default for BeanIntrospectionModule {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for BeanIntrospectionModule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BeanIntrospectionModule").finish_non_exhaustive()
    }
}

impl Module for BeanIntrospectionModule {
    fn name(&self) -> &str {
        "BeanIntrospectionModule"
    }

    fn setup(&self, context: &mut ModuleContext<'_>) {
        if !context.config().use_bean_introspection {
            log::debug!("Bean introspection is disabled, codec accessors are left in place.");
            return;
        }
        context.add_serializer_modifier(Arc::new(IntrospectionSerializerModifier::new(self.lookup.clone())));
        context.add_deserializer_modifier(Arc::new(IntrospectionDeserializerModifier::new(self.lookup.clone())));
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::sync::atomic::{AtomicUsize, Ordering};

    use vc_codec::{
        AccessStrategy, BeanDescription, BeanMember, BeanSerializerBuilder, BeanType, Codec, CodecConfig,
        CodecError, Inclusion, SelfReferencePolicy,
    };
    use vc_introspect::annotation::{attributes, kinds};
    use vc_introspect::{
        AnnotationMetadata, ConstructorArgument, IntrospectionLookup, IntrospectionRegistry, PropertyDescriptor,
        TypeIntrospection,
    };

    use super::BeanIntrospectionModule;
    use crate::SerializationBinder;

    fn introspected(config: CodecConfig, registry: IntrospectionRegistry) -> Codec {
        Codec::builder()
            .config(config)
            .module(BeanIntrospectionModule::with_lookup(registry))
            .build()
    }

    fn from_json<T: core::any::Any>(codec: &Codec, json: &str) -> Result<T, serde_json::Error> {
        codec.deserialize(&mut serde_json::Deserializer::from_str(json))
    }

    fn renamed(name: &'static str) -> AnnotationMetadata {
        AnnotationMetadata::builder()
            .value(kinds::JSON_PROPERTY, attributes::VALUE, name)
            .build()
    }

    // -------------------------------------------------------------------------
    // Constructor only

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    static POINT_CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

    fn point() -> TypeIntrospection {
        TypeIntrospection::builder::<Point>()
            .property(PropertyDescriptor::builder::<Point, i32>("x").getter(|p| &p.x).build())
            .property(PropertyDescriptor::builder::<Point, i32>("y").getter(|p| &p.y).build())
            .argument(ConstructorArgument::new::<i32>("x"))
            .argument(ConstructorArgument::new::<i32>("y"))
            .constructor(|args| {
                POINT_CONSTRUCTIONS.fetch_add(1, Ordering::Relaxed);
                Ok(Point { x: args.take(0)?, y: args.take(1)? })
            })
            .build()
    }

    fn with(introspection: TypeIntrospection) -> IntrospectionRegistry {
        let registry = IntrospectionRegistry::new();
        registry.register(introspection);
        registry
    }

    #[test]
    fn point_through_constructor() {
        let codec = introspected(CodecConfig::default(), with(point()));

        let before = POINT_CONSTRUCTIONS.load(Ordering::Relaxed);
        let point: Point = from_json(&codec, r#"{"y":2,"x":1}"#).unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
        assert!(POINT_CONSTRUCTIONS.load(Ordering::Relaxed) > before);

        let deserializer = codec.deserializer_for(BeanType::of::<Point>()).unwrap();
        assert_eq!(deserializer.creator_properties().len(), 2);

        assert_eq!(serde_json::to_string(&codec.value(&point)).unwrap(), r#"{"x":1,"y":2}"#);
    }

    #[test]
    fn point_failures() {
        let codec = introspected(CodecConfig::default(), with(point()));

        let err = from_json::<Point>(&codec, r#"{"x":1}"#).unwrap_err();
        assert!(err.to_string().contains("cannot instantiate"));

        let err = from_json::<Point>(&codec, r#"{"x":"one","y":2}"#).unwrap_err();
        assert!(err.is_data());

        let mut point = Point { x: 1, y: 2 };
        let mut de = serde_json::Deserializer::from_str(r#"{"x":5}"#);
        let err = codec.update(&mut point, &mut de).unwrap_err();
        assert!(err.to_string().contains("cannot access property `x`"));
        assert_eq!(point, Point { x: 1, y: 2 });
    }

    #[test]
    fn point_as_array() {
        let config = CodecConfig { shape: vc_codec::Shape::Array, ..CodecConfig::default() };
        let codec = introspected(config, with(point()));

        let point: Point = from_json(&codec, "[3,4]").unwrap();
        assert_eq!(point, Point { x: 3, y: 4 });
        assert_eq!(serde_json::to_string(&codec.value(&point)).unwrap(), "[3,4]");
    }

    // -------------------------------------------------------------------------
    // Suppress if default

    #[derive(Debug, Default, PartialEq)]
    struct Person {
        name: String,
        nickname: String,
    }

    fn person() -> TypeIntrospection {
        let nickname = AnnotationMetadata::builder()
            .value(kinds::JSON_PROPERTY, attributes::VALUE, "nick")
            .value(kinds::JSON_PROPERTY, attributes::DEFAULT_VALUE, "")
            .build();
        TypeIntrospection::builder::<Person>()
            .property(
                PropertyDescriptor::builder::<Person, String>("name")
                    .getter(|p| &p.name)
                    .setter(|p, v| p.name = v)
                    .build(),
            )
            .property(
                PropertyDescriptor::builder::<Person, String>("nickname")
                    .getter(|p| &p.nickname)
                    .setter(|p, v| p.nickname = v)
                    .annotations(nickname)
                    .build(),
            )
            .default_constructor(Person::default)
            .build()
    }

    #[test]
    fn person_suppressed_if_default() {
        let config = CodecConfig { default_inclusion: Inclusion::NonDefault, ..CodecConfig::default() };
        let codec = introspected(config, with(person()));

        let ann = Person { name: "Ann".into(), nickname: String::new() };
        assert_eq!(serde_json::to_string(&codec.value(&ann)).unwrap(), r#"{"name":"Ann"}"#);

        let bo = Person { name: "Bo".into(), nickname: "b".into() };
        assert_eq!(serde_json::to_string(&codec.value(&bo)).unwrap(), r#"{"name":"Bo","nick":"b"}"#);
    }

    #[test]
    fn person_through_virtual_setters() {
        let codec = introspected(CodecConfig::default(), with(person()));

        let person: Person = from_json(&codec, r#"{"name":"Ann","nick":"a"}"#).unwrap();
        assert_eq!(person, Person { name: "Ann".into(), nickname: "a".into() });

        let mut person = person;
        let mut de = serde_json::Deserializer::from_str(r#"{"nick":"z"}"#);
        codec.update(&mut person, &mut de).unwrap();
        assert_eq!(person.nickname, "z");

        let err = from_json::<Person>(&codec, r#"{"nickname":"a"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown property `nickname`"));
    }

    // -------------------------------------------------------------------------
    // Round trip

    #[derive(Debug, PartialEq)]
    struct Article {
        title: String,
        body: String,
        views: u64,
    }

    fn article() -> TypeIntrospection {
        TypeIntrospection::builder::<Article>()
            .property(
                PropertyDescriptor::builder::<Article, String>("title")
                    .getter(|a| &a.title)
                    .setter(|a, v| a.title = v)
                    .build(),
            )
            .property(
                PropertyDescriptor::builder::<Article, String>("body")
                    .getter(|a| &a.body)
                    .setter(|a, v| a.body = v)
                    .build(),
            )
            .property(
                PropertyDescriptor::builder::<Article, u64>("views")
                    .getter(|a| &a.views)
                    .setter(|a, v| a.views = v)
                    .build(),
            )
            .argument(ConstructorArgument::new::<String>("title"))
            .constructor(|args| Ok(Article { title: args.take(0)?, body: String::new(), views: 0 }))
            .build()
    }

    #[test]
    fn round_trip() {
        let codec = introspected(CodecConfig::default(), with(article()));
        let json = r#"{"title":"Hello","body":"World","views":3}"#;

        let article: Article = from_json(&codec, json).unwrap();
        assert_eq!(article, Article { title: "Hello".into(), body: "World".into(), views: 3 });
        assert_eq!(serde_json::to_string(&codec.value(&article)).unwrap(), json);

        let reordered: Article = from_json(&codec, r#"{"views":3,"body":"World","title":"Hello"}"#).unwrap();
        assert_eq!(reordered, article);
    }

    // -------------------------------------------------------------------------
    // Described beans

    #[derive(Debug, Default, PartialEq)]
    struct Contact {
        email: String,
        phone: Option<String>,
    }

    fn contact_description() -> BeanDescription {
        BeanDescription::builder::<Contact>()
            .member(BeanMember::method(
                PropertyDescriptor::builder::<Contact, String>("email")
                    .getter(|c| &c.email)
                    .setter(|c, v| c.email = v)
                    .build(),
            ))
            .member(
                BeanMember::method(
                    PropertyDescriptor::builder::<Contact, String>("phone")
                        .getter_opt(|c| c.phone.as_ref())
                        .setter_opt(|c, v| c.phone = v)
                        .build(),
                )
                .with_null_serializer(String::from("unlisted")),
            )
            .default_constructor(Contact::default)
            .build()
    }

    static CONTACT_WRITES: AtomicUsize = AtomicUsize::new(0);

    fn contact() -> TypeIntrospection {
        TypeIntrospection::builder::<Contact>()
            .property(
                PropertyDescriptor::builder::<Contact, String>("email")
                    .getter(|c| &c.email)
                    .setter(|c, v| {
                        CONTACT_WRITES.fetch_add(1, Ordering::Relaxed);
                        c.email = v;
                    })
                    .build(),
            )
            .property(
                PropertyDescriptor::builder::<Contact, String>("phone")
                    .getter_opt(|c| c.phone.as_ref())
                    .setter_opt(|c, v| c.phone = v)
                    .build(),
            )
            .default_constructor(Contact::default)
            .build()
    }

    fn described(registry: IntrospectionRegistry, config: CodecConfig) -> Codec {
        Codec::builder()
            .config(config)
            .describe(contact_description())
            .module(BeanIntrospectionModule::with_lookup(registry))
            .build()
    }

    #[test]
    fn identity_without_introspection() {
        let codec = described(IntrospectionRegistry::new(), CodecConfig::default());
        let serializer = codec.serializer_for(BeanType::of::<Contact>()).unwrap();
        for writer in serializer.writers() {
            assert_eq!(writer.reader().strategy(), AccessStrategy::Member);
        }
        let deserializer = codec.deserializer_for(BeanType::of::<Contact>()).unwrap();
        assert!(deserializer.creator_properties().is_empty());
        assert_eq!(deserializer.value_instantiator().value_type_name(), core::any::type_name::<Contact>());
    }

    #[test]
    fn rebinding_keeps_output() {
        let contacts = [
            Contact { email: "a@b.c".into(), phone: None },
            Contact { email: String::new(), phone: Some("123".into()) },
        ];
        for config in [
            CodecConfig::default(),
            CodecConfig { default_inclusion: Inclusion::NonNull, ..CodecConfig::default() },
            CodecConfig { default_inclusion: Inclusion::NonEmpty, ..CodecConfig::default() },
        ] {
            let plain = described(IntrospectionRegistry::new(), config.clone());
            let bound = described(with(contact()), config);

            let serializer = bound.serializer_for(BeanType::of::<Contact>()).unwrap();
            for writer in serializer.writers() {
                assert_eq!(writer.reader().strategy(), AccessStrategy::Introspection);
            }
            for contact in &contacts {
                assert_eq!(
                    serde_json::to_string(&bound.value(contact)).unwrap(),
                    serde_json::to_string(&plain.value(contact)).unwrap(),
                );
            }
        }

        let codec = described(IntrospectionRegistry::new(), CodecConfig::default());
        let json = serde_json::to_string(&codec.value(&contacts[0])).unwrap();
        assert_eq!(json, r#"{"email":"a@b.c","phone":"unlisted"}"#);
    }

    #[test]
    fn setters_write_through_introspection() {
        let codec = described(with(contact()), CodecConfig::default());

        let before = CONTACT_WRITES.load(Ordering::Relaxed);
        let contact: Contact = from_json(&codec, r#"{"email":"a@b.c","phone":null}"#).unwrap();
        assert_eq!(contact, Contact { email: "a@b.c".into(), phone: None });
        assert!(CONTACT_WRITES.load(Ordering::Relaxed) > before);

        let err = from_json::<Contact>(&codec, r#"{"email":null}"#).unwrap_err();
        assert!(err.to_string().contains("cannot access property `email`"));
    }

    #[test]
    fn nulls_suppressed_without_null_serializer() {
        let plain_members = BeanDescription::builder::<Contact>()
            .member(BeanMember::method(
                PropertyDescriptor::builder::<Contact, String>("email").getter(|c| &c.email).build(),
            ))
            .member(BeanMember::method(
                PropertyDescriptor::builder::<Contact, String>("phone").getter_opt(|c| c.phone.as_ref()).build(),
            ))
            .build();
        let non_null = CodecConfig { default_inclusion: Inclusion::NonNull, ..CodecConfig::default() };
        let unlisted = Contact { email: "a@b.c".into(), phone: None };

        let synthesized = introspected(non_null.clone(), with(contact()));
        assert_eq!(serde_json::to_string(&synthesized.value(&unlisted)).unwrap(), r#"{"email":"a@b.c"}"#);

        let rebound = Codec::builder()
            .config(non_null)
            .describe(plain_members)
            .module(BeanIntrospectionModule::with_lookup(with(contact())))
            .build();
        let serializer = rebound.serializer_for(BeanType::of::<Contact>()).unwrap();
        let phone = serializer.writer("phone").unwrap();
        assert_eq!(phone.reader().strategy(), AccessStrategy::Introspection);
        assert!(phone.null_serializer().is_none());
        assert_eq!(serde_json::to_string(&rebound.value(&unlisted)).unwrap(), r#"{"email":"a@b.c"}"#);

        let always = introspected(CodecConfig::default(), with(contact()));
        assert_eq!(
            serde_json::to_string(&always.value(&unlisted)).unwrap(),
            r#"{"email":"a@b.c","phone":null}"#,
        );
    }

    // -------------------------------------------------------------------------
    // Write-only properties

    #[derive(Debug, Default, PartialEq)]
    struct Form {
        a: u32,
        token: u32,
        b: u32,
    }

    fn form() -> TypeIntrospection {
        TypeIntrospection::builder::<Form>()
            .property(
                PropertyDescriptor::builder::<Form, u32>("a")
                    .getter(|f| &f.a)
                    .setter(|f, v| f.a = v)
                    .build(),
            )
            .property(PropertyDescriptor::builder::<Form, u32>("token").setter(|f, v| f.token = v).build())
            .property(
                PropertyDescriptor::builder::<Form, u32>("b")
                    .getter(|f| &f.b)
                    .setter(|f, v| f.b = v)
                    .build(),
            )
            .default_constructor(Form::default)
            .build()
    }

    #[test]
    fn write_only_property_keeps_its_element() {
        let config = CodecConfig { shape: vc_codec::Shape::Array, ..CodecConfig::default() };
        let codec = introspected(config, with(form()));

        let json = serde_json::to_string(&codec.value(&Form { a: 1, token: 7, b: 2 })).unwrap();
        assert_eq!(json, "[1,null,2]");

        let back: Form = from_json(&codec, &json).unwrap();
        assert_eq!(back, Form { a: 1, token: 0, b: 2 });

        let sent: Form = from_json(&codec, "[1,9,2]").unwrap();
        assert_eq!(sent, Form { a: 1, token: 9, b: 2 });
    }

    #[test]
    fn write_only_property_is_skipped_as_field() {
        let codec = introspected(CodecConfig::default(), with(form()));

        let json = serde_json::to_string(&codec.value(&Form { a: 1, token: 7, b: 2 })).unwrap();
        assert_eq!(json, r#"{"a":1,"b":2}"#);

        let form: Form = from_json(&codec, r#"{"a":1,"token":5,"b":2}"#).unwrap();
        assert_eq!(form, Form { a: 1, token: 5, b: 2 });
    }

    // -------------------------------------------------------------------------
    // Self references

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Node {
        id: u32,
    }

    fn node() -> TypeIntrospection {
        TypeIntrospection::builder::<Node>()
            .property(PropertyDescriptor::builder::<Node, u32>("id").getter(|n| &n.id).build())
            .property(PropertyDescriptor::builder::<Node, Node>("me").getter(|n| n).build())
            .build()
    }

    #[test]
    fn self_reference_follows_config() {
        let strict = introspected(CodecConfig::default(), with(node()));
        let err = serde_json::to_string(&strict.value(&Node { id: 1 })).unwrap_err();
        assert!(err.to_string().contains("self-reference through property `me`"));

        let lenient = introspected(
            CodecConfig { fail_on_self_references: false, ..CodecConfig::default() },
            with(node()),
        );
        let json = serde_json::to_string(&lenient.value(&Node { id: 1 })).unwrap();
        assert_eq!(json, r#"{"id":1,"me":null}"#);
    }

    #[test]
    fn self_reference_passes_through_once() {
        let config = CodecConfig::default();
        let mut builder = BeanSerializerBuilder::new(BeanType::of::<Node>(), &config);
        let writers = SerializationBinder::new(&config)
            .adjust(&node(), Vec::new())
            .into_iter()
            .map(|writer| writer.with_self_reference(SelfReferencePolicy::PassThrough))
            .collect();
        builder.set_properties(writers);

        let serializer = builder.build().unwrap();
        let json = serde_json::to_string(&serializer.bind(&Node { id: 1 })).unwrap();
        assert_eq!(json, r#"{"id":1,"me":{"id":1}}"#);
    }

    // -------------------------------------------------------------------------
    // Build failures and configuration

    struct Clash {
        a: u8,
        b: u8,
    }

    #[test]
    fn build_failure_is_reraised() {
        let clash = TypeIntrospection::builder::<Clash>()
            .property(
                PropertyDescriptor::builder::<Clash, u8>("a")
                    .getter(|c| &c.a)
                    .annotations(renamed("same"))
                    .build(),
            )
            .property(
                PropertyDescriptor::builder::<Clash, u8>("b")
                    .getter(|c| &c.b)
                    .annotations(renamed("same"))
                    .build(),
            )
            .build();
        let codec = introspected(CodecConfig::default(), with(clash));

        let err = codec.serializer_for(BeanType::of::<Clash>()).unwrap_err();
        assert!(matches!(err, CodecError::Build { .. }));
        assert!(err.to_string().contains("multiple properties serialized as `same`"));

        let err = serde_json::to_string(&codec.value(&Clash { a: 1, b: 2 })).unwrap_err();
        assert!(err.to_string().contains("cannot build codec"));
    }

    #[test]
    fn disabled_by_configuration() {
        let config = CodecConfig { use_bean_introspection: false, ..CodecConfig::default() };
        let codec = introspected(config, with(point()));

        let err = codec.serializer_for(BeanType::of::<Point>()).unwrap_err();
        assert!(err.to_string().contains("no properties"));
        assert!(codec.deserializer_for(BeanType::of::<Point>()).is_err());
    }

    #[test]
    fn lookups_go_through_the_trait() {
        struct Counting(IntrospectionRegistry, AtomicUsize);

        impl IntrospectionLookup for Counting {
            fn find_introspection(&self, type_id: core::any::TypeId) -> Option<Arc<TypeIntrospection>> {
                self.1.fetch_add(1, Ordering::Relaxed);
                self.0.find_introspection(type_id)
            }
        }

        let lookup = Arc::new(Counting(with(point()), AtomicUsize::new(0)));
        let module = BeanIntrospectionModule { lookup: lookup.clone() };
        let codec = Codec::builder().module(module).build();

        let point = Point { x: 0, y: 0 };
        serde_json::to_string(&codec.value(&point)).unwrap();
        serde_json::to_string(&codec.value(&point)).unwrap();
        assert_eq!(lookup.1.load(Ordering::Relaxed), 1);
    }

    #[cfg(feature = "auto_register")]
    mod shared {
        use vc_codec::Codec;
        use vc_introspect::{PropertyDescriptor, TypeIntrospection};

        use crate::BeanIntrospectionModule;

        #[derive(Debug, Default, PartialEq)]
        struct Badge {
            level: u8,
        }

        fn badge() -> TypeIntrospection {
            TypeIntrospection::builder::<Badge>()
                .property(
                    PropertyDescriptor::builder::<Badge, u8>("level")
                        .getter(|b| &b.level)
                        .setter(|b, v| b.level = v)
                        .build(),
                )
                .default_constructor(Badge::default)
                .build()
        }

        vc_introspect::submit_introspection!(badge);

        #[test]
        fn submitted_introspections_are_found() {
            let codec = Codec::builder().module(BeanIntrospectionModule::new()).build();

            let badge: Badge = codec
                .deserialize(&mut serde_json::Deserializer::from_str(r#"{"level":3}"#))
                .unwrap();
            assert_eq!(badge, Badge { level: 3 });
            assert_eq!(serde_json::to_string(&codec.value(&badge)).unwrap(), r#"{"level":3}"#);
        }
    }
}
