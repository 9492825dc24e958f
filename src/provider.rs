//! Provider traits for the service container
//!
//! These traits define what types can be managed and how a type describes its
//! own constructor and methods to the container.

use crate::{Args, ArgumentError, ClassBuilder};

/// Marker trait for types that can be managed by the container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {
    /// Returns the type name for debugging
    #[inline]
    fn type_name_of() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// A type that describes how to build itself from positional arguments and
/// which methods initialization steps may call on it.
///
/// Implementing `Class` is the typed alternative to assembling a
/// [`ClassDescriptor`](crate::ClassDescriptor) by hand; register it with
/// [`Container::define`](crate::Container::define).
///
/// # Examples
///
/// ```rust
/// use service_container::{Args, ArgumentError, Class, ClassBuilder, Container, ServiceDefinition};
///
/// struct Counter {
///     start: i64,
///     step: i64,
/// }
///
/// impl Class for Counter {
///     const NAME: &'static str = "Counter";
///
///     fn construct(args: &Args<'_>) -> Result<Self, ArgumentError> {
///         args.expect_len(1)?;
///         Ok(Counter { start: args.int(0)?, step: 1 })
///     }
///
///     fn methods(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
///         class.method("set_step", 1, |c, args| {
///             c.step = args.int(0)?;
///             Ok(())
///         })
///     }
/// }
///
/// let container = Container::new();
/// container.define::<Counter>();
/// container
///     .register_service(
///         "counter",
///         ServiceDefinition::new("Counter").arg(10).call("set_step", [2]),
///     )
///     .unwrap();
///
/// let counter = container.get::<Counter>("counter").unwrap();
/// assert_eq!((counter.start, counter.step), (10, 2));
/// ```
pub trait Class: Injectable + Sized {
    /// Class name used by service definitions to reference this type
    const NAME: &'static str;

    /// Build an instance from positional constructor arguments
    fn construct(args: &Args<'_>) -> Result<Self, ArgumentError>;

    /// Declare the methods initialization steps may invoke
    fn methods(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        class
    }
}
