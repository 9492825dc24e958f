//! Class descriptors and the instantiation engine
//!
//! Rust has no runtime reflection, so every class a service definition may
//! reference is described explicitly: a constructor taking positional
//! arguments, plus a table of named methods initialization steps can invoke.
//!
//! ## Type erasure
//!
//! Descriptors are generic only while being built. The constructor and the
//! methods are stored as type-erased closures over `dyn Any`, so the class
//! table holds descriptors of unrelated types side by side.

use crate::initializer;
use crate::storage::ServiceStorage;
use crate::{Args, ArgumentError, Class, DiError, Injectable, Result, ServiceEntry, Value};
use ahash::RandomState;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Type-erased constructor
type ConstructorFn = Arc<
    dyn Fn(&Args<'_>) -> std::result::Result<Box<dyn Any + Send + Sync>, ArgumentError>
        + Send
        + Sync,
>;

/// Type-erased method
type MethodFn = Arc<
    dyn Fn(&mut (dyn Any + Send + Sync), &Args<'_>) -> std::result::Result<(), ArgumentError>
        + Send
        + Sync,
>;

/// A named method with a fixed number of positional arguments
#[derive(Clone)]
pub(crate) struct Method {
    arity: usize,
    invoke: MethodFn,
}

impl Method {
    #[inline]
    pub(crate) fn arity(&self) -> usize {
        self.arity
    }

    /// Check the arity, then run the method against `instance`
    pub(crate) fn invoke(
        &self,
        class: &ClassDescriptor,
        name: &str,
        instance: &mut (dyn Any + Send + Sync),
        arguments: &[Value],
    ) -> Result<()> {
        let args = Args::new(arguments);
        args.expect_len(self.arity)
            .and_then(|()| (self.invoke)(instance, &args))
            .map_err(|source| DiError::MethodInvocation {
                class: class.name.clone(),
                method: name.to_owned(),
                source,
            })
    }
}

/// Describes how to construct one application type and which of its methods
/// initialization steps may call.
///
/// # Examples
///
/// ```rust
/// use service_container::{ClassDescriptor, Container, ServiceDefinition};
/// use std::sync::Arc;
///
/// struct Greeter {
///     greeting: String,
///     loud: bool,
/// }
///
/// let class = ClassDescriptor::builder("Greeter", |args| {
///     Ok(Greeter { greeting: args.str(0)?.to_owned(), loud: false })
/// })
/// .method0("shout", |g: &mut Greeter| g.loud = true)
/// .build();
///
/// assert!(class.has_method("shout"));
///
/// let container = Container::new();
/// container.define_class(class);
/// container
///     .register_service("greeter", ServiceDefinition::new("Greeter").arg("hello").method("shout"))
///     .unwrap();
///
/// let greeter: Arc<Greeter> = container.get("greeter").unwrap();
/// assert_eq!(greeter.greeting, "hello");
/// assert!(greeter.loud);
/// ```
pub struct ClassDescriptor {
    name: String,
    type_name: &'static str,
    constructor: ConstructorFn,
    methods: HashMap<String, Method, RandomState>,
}

impl ClassDescriptor {
    /// Start describing class `name`, built by `constructor`
    pub fn builder<T, F>(name: impl Into<String>, constructor: F) -> ClassBuilder<T>
    where
        T: Injectable,
        F: Fn(&Args<'_>) -> std::result::Result<T, ArgumentError> + Send + Sync + 'static,
    {
        let constructor: ConstructorFn = Arc::new(move |args: &Args<'_>| {
            constructor(args).map(|instance| Box::new(instance) as Box<dyn Any + Send + Sync>)
        });

        ClassBuilder {
            descriptor: ClassDescriptor {
                name: name.into(),
                type_name: std::any::type_name::<T>(),
                constructor,
                methods: HashMap::default(),
            },
            _marker: PhantomData,
        }
    }

    /// Descriptor for a type implementing [`Class`]
    pub fn of<T: Class>() -> Self {
        T::methods(Self::builder(T::NAME, |args: &Args<'_>| T::construct(args))).build()
    }

    /// Class name service definitions use to reference this class
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rust type produced by the constructor
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Number of arguments method `name` takes
    #[inline]
    pub fn arity(&self, name: &str) -> Option<usize> {
        self.methods.get(name).map(Method::arity)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    #[inline]
    pub(crate) fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Run the constructor with positional arguments
    pub(crate) fn construct(&self, arguments: &[Value]) -> Result<Box<dyn Any + Send + Sync>> {
        (self.constructor)(&Args::new(arguments)).map_err(|source| DiError::Construction {
            class: self.name.clone(),
            source,
        })
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.method_names().collect();
        methods.sort_unstable();

        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("methods", &methods)
            .finish()
    }
}

/// Builder returned by [`ClassDescriptor::builder`].
pub struct ClassBuilder<T> {
    descriptor: ClassDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> ClassBuilder<T> {
    /// Declare a zero-argument method
    pub fn method0<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.method(name, 0, move |instance, _args| {
            f(instance);
            Ok(())
        })
    }

    /// Declare a method taking exactly `arity` positional arguments
    pub fn method<F>(mut self, name: impl Into<String>, arity: usize, f: F) -> Self
    where
        F: Fn(&mut T, &Args<'_>) -> std::result::Result<(), ArgumentError> + Send + Sync + 'static,
    {
        let invoke: MethodFn = Arc::new(
            move |instance: &mut (dyn Any + Send + Sync),
                  args: &Args<'_>|
                  -> std::result::Result<(), ArgumentError> {
                let typed = instance
                    .downcast_mut::<T>()
                    .ok_or(ArgumentError::Receiver {
                        expected: std::any::type_name::<T>(),
                    })?;
                f(typed, args)
            },
        );

        self.descriptor
            .methods
            .insert(name.into(), Method { arity, invoke });
        self
    }

    pub fn build(self) -> ClassDescriptor {
        self.descriptor
    }
}

/// Build a fresh instance for service `name` from its registered entry.
///
/// Normalizes the entry, looks up the class, runs the constructor and, when
/// the definition lists initialization steps, the initializer. Nothing is
/// cached here; the caller stores the result.
pub(crate) fn instantiate(
    name: &str,
    entry: &ServiceEntry,
    storage: &ServiceStorage,
) -> Result<Arc<dyn Any + Send + Sync>> {
    let definition = entry.normalize(name)?;

    let class = storage
        .class(definition.class())
        .ok_or_else(|| DiError::ClassNotFound {
            class: definition.class().to_owned(),
        })?;

    #[cfg(feature = "logging")]
    debug!(
        target: "service_container",
        service = name,
        class = class.name(),
        arguments = definition.arguments().len(),
        steps = definition.initialize().len(),
        "Constructing service instance"
    );

    let mut instance = class.construct(definition.arguments())?;

    if !definition.initialize().is_empty() {
        initializer::initialize(name, &class, instance.as_mut(), definition.initialize())?;
    }

    #[cfg(feature = "logging")]
    trace!(
        target: "service_container",
        service = name,
        type_name = class.type_name(),
        "Service instance built"
    );

    Ok(Arc::from(instance))
}
