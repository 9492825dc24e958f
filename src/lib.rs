//! # service-container - Name-keyed Inversion of Control
//!
//! A small IoC container: register a recipe under a service name, resolve the
//! name on first use, and get the same shared instance back from then on.
//!
//! ## Features
//!
//! - 🏷️ **Name-keyed** - Application code depends on a service name, not a type
//! - 🏭 **Lazy, memoized** - Services are built on first access and cached for
//!   the container's lifetime
//! - 🧩 **Explicit classes** - Each type registers a constructor and a method
//!   table instead of relying on runtime reflection
//! - 🔧 **Initialization steps** - Call methods or closures on a fresh instance
//!   before anyone else sees it
//! - 🧵 **Thread-safe** - Concurrent registry and cache, cheap `Clone`
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use service_container::{ClassDescriptor, Container, ServiceDefinition};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! struct Logger {
//!     path: String,
//!     open: AtomicBool,
//! }
//!
//! let container = Container::new();
//!
//! // Describe how to build a Logger and what can be called on it
//! container.define_class(
//!     ClassDescriptor::builder("Logger", |args| {
//!         Ok(Logger { path: args.str(0)?.to_owned(), open: AtomicBool::new(false) })
//!     })
//!     .method0("open", |logger: &mut Logger| logger.open.store(true, Ordering::SeqCst))
//!     .build(),
//! );
//!
//! // Register a recipe under a name
//! container
//!     .register_service("logger", ServiceDefinition::new("Logger").arg("app.log").method("open"))
//!     .unwrap();
//!
//! // Resolve - built and initialized on first access
//! let logger = container.get::<Logger>("logger").unwrap();
//! assert_eq!(logger.path, "app.log");
//! assert!(logger.open.load(Ordering::SeqCst));
//!
//! // Every later lookup returns the same instance
//! assert!(Arc::ptr_eq(&logger, &container.get::<Logger>("logger").unwrap()));
//! ```
//!
//! ## Service Entries
//!
//! ```rust
//! use service_container::{Container, ServiceDefinition, json};
//!
//! let container = Container::new();
//!
//! // Shorthand - just a class name
//! container.register_service("cache", "Cache").unwrap();
//!
//! // Structured definition
//! container
//!     .register_service("db", ServiceDefinition::new("Database").arg("postgres://localhost"))
//!     .unwrap();
//!
//! // Untyped record, normalized on first resolution
//! container
//!     .register_service(
//!         "mailer",
//!         json!({
//!             "class": "Mailer",
//!             "arguments": ["smtp.local"],
//!             "initialize": ["connect", {"method": "set_timeout", "arguments": [30]}],
//!         }),
//!     )
//!     .unwrap();
//!
//! assert_eq!(container.len(), 3);
//! ```
//!
//! ## Limitations
//!
//! Resolving a service from one of its own initialization steps is not
//! supported (the call blocks forever), and dependency cycles are not
//! detected.

mod container;
mod definition;
mod error;
mod factory;
mod initializer;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod storage;
mod value;

pub use container::*;
pub use definition::*;
pub use error::*;
pub use factory::{ClassBuilder, ClassDescriptor};
pub use provider::*;
pub use storage::Parameters;
pub use value::*;

// Arguments, records and parameters are JSON values
pub use serde_json::{Value, json};

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Args, ArgumentError, Class, ClassBuilder, ClassDescriptor, Container, ContainerBuilder,
        DiError, InitStep, Injectable, Result, ServiceDefinition, ServiceEntry, Value, json,
    };
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Database {
        url: String,
    }

    impl Class for Database {
        const NAME: &'static str = "Database";

        fn construct(args: &Args<'_>) -> std::result::Result<Self, ArgumentError> {
            Ok(Database {
                url: args.str(0)?.to_owned(),
            })
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let container = Container::new();
        container.define::<Database>();
        container
            .register_service("db", ServiceDefinition::new("Database").arg("test"))
            .unwrap();

        let db = container.get::<Database>("db").unwrap();
        assert_eq!(db.url, "test");
    }

    #[test]
    fn test_lazy_construction() {
        static CREATED: AtomicU32 = AtomicU32::new(0);

        struct LazyService;

        let container = Container::new();
        container.define_class(
            ClassDescriptor::builder("LazyService", |_args| {
                CREATED.fetch_add(1, Ordering::SeqCst);
                Ok(LazyService)
            })
            .build(),
        );
        container.register_service("lazy", "LazyService").unwrap();

        assert_eq!(CREATED.load(Ordering::SeqCst), 0);

        let _ = container.get::<LazyService>("lazy").unwrap();
        assert_eq!(CREATED.load(Ordering::SeqCst), 1);

        // Second resolve doesn't create new instance
        let _ = container.get::<LazyService>("lazy").unwrap();
        assert_eq!(CREATED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_record_entry() {
        let container = Container::new();
        container.define::<Database>();
        container
            .register_service("db", json!({"class": "Database", "arguments": ["record"]}))
            .unwrap();

        assert_eq!(container.get::<Database>("db").unwrap().url, "record");
    }

    #[test]
    fn test_not_found_error() {
        let container = Container::new();
        let result = container.get::<Database>("db");
        assert!(matches!(result, Err(DiError::ServiceNotFound { .. })));
    }
}
