//! Name-keyed service container
//!
//! The `Container` maps service names to recipes, builds each service on
//! first lookup and hands out the same shared instance from then on.

use crate::factory;
use crate::storage::{Parameters, ServiceStorage};
use crate::{Class, ClassDescriptor, DiError, Injectable, Result, ServiceEntry, Value};
use std::any::Any;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Inversion-of-control container keyed by service name.
///
/// Cloning a `Container` is cheap; clones share the same registry, cache and
/// class table. Pass it explicitly to the code that needs to resolve services.
///
/// # Examples
///
/// ```rust
/// use service_container::{ClassDescriptor, Container, ServiceDefinition};
/// use std::sync::Arc;
///
/// struct Database {
///     url: String,
/// }
///
/// let container = Container::new();
/// container.define_class(
///     ClassDescriptor::builder("Database", |args| {
///         Ok(Database { url: args.str(0)?.to_owned() })
///     })
///     .build(),
/// );
/// container
///     .register_service("db", ServiceDefinition::new("Database").arg("postgres://localhost"))
///     .unwrap();
///
/// let db = container.get::<Database>("db").unwrap();
/// assert_eq!(db.url, "postgres://localhost");
///
/// // Resolution is memoized
/// assert!(Arc::ptr_eq(&db, &container.get::<Database>("db").unwrap()));
/// ```
#[derive(Clone)]
pub struct Container {
    storage: Arc<ServiceStorage>,
}

impl Container {
    /// Create an empty container.
    #[inline]
    pub fn new() -> Self {
        Self::from_storage(ServiceStorage::new())
    }

    /// Create an empty container carrying `parameters`.
    ///
    /// Parameters are kept for callers to read back; resolution never
    /// consults them.
    pub fn with_parameters<P, K, V>(parameters: P) -> Self
    where
        P: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let parameters: Parameters = parameters
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_storage(ServiceStorage::with_parameters(parameters))
    }

    /// Create a container with initial services and parameters.
    ///
    /// Fails with [`DiError::DuplicateService`] if `services` names the same
    /// service twice.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_container::{Container, Value};
    ///
    /// let container = Container::with_services(
    ///     [("logger", "Logger"), ("mailer", "Mailer")],
    ///     [("env", Value::from("test"))],
    /// )
    /// .unwrap();
    ///
    /// assert!(container.has("logger"));
    /// assert_eq!(container.parameter("env"), Some(&Value::from("test")));
    /// ```
    pub fn with_services<S, N, E, P, K, V>(services: S, parameters: P) -> Result<Self>
    where
        S: IntoIterator<Item = (N, E)>,
        N: Into<String>,
        E: Into<ServiceEntry>,
        P: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let container = Self::with_parameters(parameters);
        for (name, entry) in services {
            container.register_service(name, entry)?;
        }
        Ok(container)
    }

    /// Start building a container.
    #[inline]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    fn from_storage(storage: ServiceStorage) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            parameters = storage.parameters().len(),
            "Creating new service container"
        );

        Self {
            storage: Arc::new(storage),
        }
    }

    // =========================================================================
    // Classes
    // =========================================================================

    /// Make a class available to service definitions.
    ///
    /// A class defined under an existing name replaces the earlier one for
    /// services resolved afterwards.
    pub fn define_class(&self, class: ClassDescriptor) {
        #[cfg(feature = "logging")]
        let (class_name, methods) = (class.name().to_owned(), class.method_names().count());

        let _replaced = self.storage.define_class(class);

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            class = %class_name,
            methods,
            replaced = _replaced.is_some(),
            "Defining class"
        );
    }

    /// Define the class described by `T`'s [`Class`] implementation.
    #[inline]
    pub fn define<T: Class>(&self) {
        self.define_class(ClassDescriptor::of::<T>());
    }

    #[inline]
    pub fn has_class(&self, name: &str) -> bool {
        self.storage.has_class(name)
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a service under `name`.
    ///
    /// `entry` may be a bare class name, a [`ServiceDefinition`](crate::ServiceDefinition)
    /// or an untyped [`Value`] record. Names are write-once.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_container::{Container, DiError};
    ///
    /// let container = Container::new();
    /// container.register_service("logger", "Logger").unwrap();
    ///
    /// let err = container.register_service("logger", "OtherLogger").unwrap_err();
    /// assert!(matches!(err, DiError::DuplicateService { .. }));
    /// ```
    pub fn register_service(
        &self,
        name: impl Into<String>,
        entry: impl Into<ServiceEntry>,
    ) -> Result<()> {
        let name = name.into();

        #[cfg(feature = "logging")]
        debug!(
            target: "service_container",
            service = %name,
            service_count = self.storage.len() + 1,
            "Registering service"
        );

        if self.storage.insert_entry(name.clone(), entry.into()) {
            Ok(())
        } else {
            #[cfg(feature = "logging")]
            debug!(
                target: "service_container",
                service = %name,
                "Service name already registered"
            );
            Err(DiError::duplicate(name))
        }
    }

    /// Check if a service is registered.
    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.storage.contains(name)
    }

    /// Check if a service has been resolved and cached.
    #[inline]
    pub fn is_resolved(&self, name: &str) -> bool {
        self.storage.is_cached(name)
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve a service as a type-erased shared instance.
    ///
    /// The first successful call builds and initializes the instance; every
    /// later call returns the same `Arc`. A failed resolution caches nothing.
    ///
    /// Concurrent calls for the same name build it once: later callers wait
    /// for the first. Other names can be resolved from initialization steps.
    pub fn get_any(&self, name: &str) -> Result<Arc<dyn Any + Send + Sync>> {
        let Some(slot) = self.storage.slot(name) else {
            #[cfg(feature = "logging")]
            debug!(
                target: "service_container",
                service = name,
                "Service not found in container"
            );
            return Err(DiError::not_found(name));
        };

        if let Some(instance) = slot.instance() {
            #[cfg(feature = "logging")]
            trace!(
                target: "service_container",
                service = name,
                location = "cache",
                "Service resolved from cache"
            );
            return Ok(Arc::clone(instance));
        }

        // Blocks while another thread resolves the same name
        let instance = slot.resolve(|| -> Result<Arc<dyn Any + Send + Sync>> {
            #[cfg(feature = "logging")]
            trace!(
                target: "service_container",
                service = name,
                "Resolving service (cache miss)"
            );

            let instance = factory::instantiate(name, slot.entry(), &self.storage)?;

            #[cfg(feature = "logging")]
            debug!(
                target: "service_container",
                service = name,
                "Service resolved and cached"
            );

            Ok(instance)
        })?;

        Ok(Arc::clone(instance))
    }

    /// Resolve a service by name as `Arc<T>`.
    ///
    /// Fails with [`DiError::TypeMismatch`] when the service resolves to
    /// another type; the instance stays cached either way.
    #[inline]
    pub fn get<T: Injectable>(&self, name: &str) -> Result<Arc<T>> {
        self.get_any(name)?
            .downcast::<T>()
            .map_err(|_| DiError::type_mismatch::<T>(name))
    }

    /// Try to resolve, returning None on any error.
    #[inline]
    pub fn try_get<T: Injectable>(&self, name: &str) -> Option<Arc<T>> {
        self.get::<T>(name).ok()
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Read a construction-time parameter.
    #[inline]
    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.storage.parameters().get(key)
    }

    #[inline]
    pub fn parameters(&self) -> &Parameters {
        self.storage.parameters()
    }

    /// Get the number of registered services.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Get all registered service names.
    pub fn service_names(&self) -> Vec<String> {
        self.storage.names()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("storage", &self.storage)
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Fluent, in-memory configuration for a [`Container`].
///
/// # Example
///
/// ```rust
/// use service_container::{ClassDescriptor, Container, ServiceDefinition};
///
/// struct Cache {
///     size: i64,
/// }
///
/// let container = Container::builder()
///     .class(ClassDescriptor::builder("Cache", |args| Ok(Cache { size: args.int(0)? })).build())
///     .service("cache", ServiceDefinition::new("Cache").arg(1024))
///     .parameter("region", "eu-west-1")
///     .build()
///     .unwrap();
///
/// assert_eq!(container.get::<Cache>("cache").unwrap().size, 1024);
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    classes: Vec<ClassDescriptor>,
    services: Vec<(String, ServiceEntry)>,
    parameters: Parameters,
}

impl ContainerBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class descriptor
    pub fn class(mut self, class: ClassDescriptor) -> Self {
        self.classes.push(class);
        self
    }

    /// Add the class described by `T`
    pub fn define<T: Class>(self) -> Self {
        self.class(ClassDescriptor::of::<T>())
    }

    /// Add a service; duplicates are reported by [`build`](Self::build)
    pub fn service(mut self, name: impl Into<String>, entry: impl Into<ServiceEntry>) -> Self {
        self.services.push((name.into(), entry.into()));
        self
    }

    /// Set a parameter, replacing an earlier value for the same key
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Build the container, registering services in the order they were added.
    pub fn build(self) -> Result<Container> {
        let container = Container::from_storage(ServiceStorage::with_parameters(self.parameters));

        for class in self.classes {
            container.define_class(class);
        }
        for (name, entry) in self.services {
            container.register_service(name, entry)?;
        }

        Ok(container)
    }
}

impl std::fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("classes", &self.classes.len())
            .field("services", &self.services.len())
            .field("parameters", &self.parameters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArgumentError, InitStep, ServiceDefinition, json};
    use std::sync::{Barrier, Mutex};
    use std::time::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every call made on it.
    struct Logger {
        path: String,
        calls: Mutex<Vec<String>>,
    }

    impl Logger {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&mut self, call: String) {
            self.calls.get_mut().unwrap().push(call);
        }
    }

    impl Class for Logger {
        const NAME: &'static str = "Logger";

        fn construct(args: &crate::Args<'_>) -> std::result::Result<Self, ArgumentError> {
            let path = if args.is_empty() { "default.log" } else { args.str(0)? };
            Ok(Logger {
                path: path.to_owned(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn methods(class: crate::ClassBuilder<Self>) -> crate::ClassBuilder<Self> {
            class
                .method0("open", |l: &mut Logger| l.record("open".into()))
                .method0("enable", |l: &mut Logger| l.record("enable".into()))
                .method("set_level", 1, |l: &mut Logger, args| {
                    let level = args.int(0)?;
                    l.record(format!("set_level({level})"));
                    Ok(())
                })
        }
    }

    fn container() -> Container {
        let container = Container::new();
        container.define::<Logger>();
        container
    }

    #[test]
    fn test_unregistered_name() {
        let container = container();

        assert!(!container.has("logger"));
        assert!(matches!(
            container.get_any("logger"),
            Err(DiError::ServiceNotFound { .. })
        ));
    }

    #[test]
    fn test_register_then_duplicate() {
        let container = container();

        container.register_service("logger", "Logger").unwrap();
        assert!(container.has("logger"));

        let err = container
            .register_service("logger", ServiceDefinition::new("Logger"))
            .unwrap_err();
        assert!(matches!(err, DiError::DuplicateService { name } if name == "logger"));
    }

    #[test]
    fn test_resolution_is_memoized() {
        let container = container();
        container.register_service("logger", "Logger").unwrap();

        let a = container.get::<Logger>("logger").unwrap();
        let b = container.get::<Logger>("logger").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let any = container.get_any("logger").unwrap();
        assert!(Arc::ptr_eq(&any.downcast::<Logger>().unwrap(), &a));
    }

    #[test]
    fn test_shorthand_matches_empty_definition() {
        let container = container();
        container.register_service("short", "Logger").unwrap();
        container
            .register_service("long", ServiceDefinition::new("Logger"))
            .unwrap();

        let short = container.get::<Logger>("short").unwrap();
        let long = container.get::<Logger>("long").unwrap();

        assert_eq!(short.path, long.path);
        assert_eq!(short.calls(), long.calls());
        assert!(!Arc::ptr_eq(&short, &long));
    }

    #[test]
    fn test_steps_applied_in_order() {
        let container = container();
        container
            .register_service(
                "logger",
                ServiceDefinition::new("Logger")
                    .step(InitStep::method("enable"))
                    .step(InitStep::call("set_level", [5])),
            )
            .unwrap();

        let logger = container.get::<Logger>("logger").unwrap();
        assert_eq!(logger.calls(), ["enable", "set_level(5)"]);
    }

    #[test]
    fn test_logger_opened_once() {
        let container = container();
        container
            .register_service(
                "logger",
                ServiceDefinition::new("Logger").arg("app.log").method("open"),
            )
            .unwrap();

        let first = container.get::<Logger>("logger").unwrap();
        assert_eq!(first.path, "app.log");
        assert_eq!(first.calls(), ["open"]);

        let second = container.get::<Logger>("logger").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.calls(), ["open"]);
    }

    #[test]
    fn test_scalar_initialize_is_not_cached() {
        let container = container();
        container
            .register_service(
                "logger",
                json!({"class": "Logger", "initialize": 3}),
            )
            .unwrap();

        let err = container.get_any("logger").unwrap_err();
        assert!(matches!(err, DiError::InvalidInitialize { .. }));
        assert!(!container.is_resolved("logger"));
    }

    #[test]
    fn test_malformed_records_are_not_cached() {
        let container = container();
        let records = [
            ("bad_arguments", json!({"class": "Logger", "arguments": "app.log"})),
            ("numeric_class", json!({"class": 7})),
            ("bool_record", json!(true)),
            ("empty_method", json!({"class": "Logger", "initialize": [{"method": ""}]})),
            (
                "bad_step_arguments",
                json!({"class": "Logger", "initialize": [{"method": "set_level", "arguments": 5}]}),
            ),
        ];
        for (name, record) in records {
            container.register_service(name, record).unwrap();
        }

        for name in ["bad_arguments", "numeric_class", "bool_record"] {
            assert!(matches!(
                container.get_any(name),
                Err(DiError::ServiceEntryInvalid { .. })
            ));
        }
        for name in ["empty_method", "bad_step_arguments"] {
            assert!(matches!(
                container.get_any(name),
                Err(DiError::InvalidInitialize { .. })
            ));
        }

        assert!(container.service_names().iter().all(|n| !container.is_resolved(n)));
        assert_eq!(container.storage.cached_len(), 0);
    }

    #[test]
    fn test_failed_resolution_can_be_retried() {
        let container = Container::new();
        container.register_service("logger", "Logger").unwrap();

        assert!(matches!(
            container.get_any("logger"),
            Err(DiError::ClassNotFound { .. })
        ));
        assert!(!container.is_resolved("logger"));

        container.define::<Logger>();
        assert!(container.get::<Logger>("logger").is_ok());
        assert!(container.is_resolved("logger"));
    }

    #[test]
    fn test_construction_error() {
        let container = container();
        container
            .register_service("logger", ServiceDefinition::new("Logger").arg(42))
            .unwrap();

        assert!(matches!(
            container.get_any("logger"),
            Err(DiError::Construction { .. })
        ));
    }

    #[test]
    fn test_missing_method() {
        let container = container();
        container
            .register_service("logger", ServiceDefinition::new("Logger").method("rotate"))
            .unwrap();

        assert!(matches!(
            container.get_any("logger"),
            Err(DiError::MethodNotFound { method, .. }) if method == "rotate"
        ));
        assert!(!container.is_resolved("logger"));
    }

    #[test]
    fn test_type_mismatch_keeps_cache() {
        let container = container();
        container.register_service("logger", "Logger").unwrap();

        assert!(matches!(
            container.get::<String>("logger"),
            Err(DiError::TypeMismatch { .. })
        ));
        assert!(container.is_resolved("logger"));
        assert!(container.try_get::<Logger>("logger").is_some());
    }

    #[test]
    fn test_callable_step_runs_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let container = container();
        container
            .register_service(
                "logger",
                ServiceDefinition::new("Logger").callable(|l: &mut Logger| {
                    CALLS.fetch_add(1, Ordering::SeqCst);
                    l.record("callable".into());
                }),
            )
            .unwrap();

        let logger = container.get::<Logger>("logger").unwrap();
        let _ = container.get::<Logger>("logger").unwrap();

        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(logger.calls(), ["callable"]);
    }

    #[test]
    fn test_step_can_resolve_other_services() {
        struct Mailer {
            logger_path: String,
        }

        let container = container();
        container
            .register_service("logger", ServiceDefinition::new("Logger").arg("mail.log"))
            .unwrap();

        let resolver = container.clone();
        container.define_class(
            ClassDescriptor::builder("Mailer", |_args| {
                Ok(Mailer {
                    logger_path: String::new(),
                })
            })
            .build(),
        );
        container
            .register_service(
                "mailer",
                ServiceDefinition::new("Mailer").callable(move |m: &mut Mailer| {
                    if let Some(logger) = resolver.try_get::<Logger>("logger") {
                        m.logger_path = logger.path.clone();
                    }
                }),
            )
            .unwrap();

        let mailer = container.get::<Mailer>("mailer").unwrap();
        assert_eq!(mailer.logger_path, "mail.log");
        assert!(container.is_resolved("logger"));
    }

    #[test]
    fn test_with_services_and_parameters() {
        let container = Container::with_services(
            [("logger", "Logger")],
            [("debug", Value::from(true)), ("retries", Value::from(3))],
        )
        .unwrap();

        assert!(container.has("logger"));
        assert_eq!(container.parameter("debug"), Some(&Value::Bool(true)));
        assert_eq!(container.parameters().len(), 2);
        assert!(container.parameter("missing").is_none());

        let duplicate = Container::with_services(
            [("a", "Logger"), ("a", "Logger")],
            Vec::<(String, Value)>::new(),
        );
        assert!(matches!(duplicate, Err(DiError::DuplicateService { .. })));
    }

    #[test]
    fn test_builder() {
        let container = Container::builder()
            .define::<Logger>()
            .service("logger", ServiceDefinition::new("Logger").arg("built.log"))
            .service("fallback", "Logger")
            .parameter("env", "test")
            .build()
            .unwrap();

        assert!(container.has_class("Logger"));
        assert_eq!(container.len(), 2);
        assert_eq!(container.get::<Logger>("logger").unwrap().path, "built.log");
        assert_eq!(container.parameter("env").and_then(Value::as_str), Some("test"));

        let mut names = container.service_names();
        names.sort();
        assert_eq!(names, ["fallback", "logger"]);
    }

    #[test]
    fn test_clones_share_storage() {
        let container = container();
        let clone = container.clone();

        clone.register_service("logger", "Logger").unwrap();
        assert!(container.has("logger"));

        let a = container.get::<Logger>("logger").unwrap();
        let b = clone.get::<Logger>("logger").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_concurrent_resolution_shares_one_instance() {
        let container = container();
        container.register_service("logger", "Logger").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let container = container.clone();
                std::thread::spawn(move || container.get::<Logger>("logger").unwrap())
            })
            .collect();

        let instances: Vec<Arc<Logger>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let first = container.get::<Logger>("logger").unwrap();
        assert!(instances.iter().all(|i| Arc::ptr_eq(i, &first)));
    }

    #[test]
    fn test_concurrent_resolution_builds_once() {
        static BUILDS: AtomicUsize = AtomicUsize::new(0);
        static OPENS: AtomicUsize = AtomicUsize::new(0);

        struct Conn;

        let container = Container::new();
        container.define_class(
            ClassDescriptor::builder("Conn", |_args| {
                BUILDS.fetch_add(1, Ordering::SeqCst);
                // Keep the first build in progress while the other thread arrives
                std::thread::sleep(Duration::from_millis(50));
                Ok(Conn)
            })
            .method0("open", |_: &mut Conn| {
                OPENS.fetch_add(1, Ordering::SeqCst);
            })
            .build(),
        );
        container
            .register_service("conn", ServiceDefinition::new("Conn").method("open"))
            .unwrap();

        let start = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let container = container.clone();
                let start = Arc::clone(&start);
                std::thread::spawn(move || {
                    start.wait();
                    container.get::<Conn>("conn").unwrap()
                })
            })
            .collect();

        let instances: Vec<Arc<Conn>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(Arc::ptr_eq(&instances[0], &instances[1]));
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
        assert_eq!(OPENS.load(Ordering::SeqCst), 1);
    }
}
