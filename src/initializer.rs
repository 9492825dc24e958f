//! Post-construction initialization
//!
//! Applies a definition's steps, in order, to an instance that has just been
//! constructed and is not yet visible to anyone else.

use crate::{ClassDescriptor, DiError, InitStep, Result};
use std::any::Any;

#[cfg(feature = "logging")]
use tracing::trace;

/// Run every step against `instance`.
///
/// Stops at the first failing step; the instance is then discarded by the
/// caller and nothing is cached.
pub(crate) fn initialize(
    service: &str,
    class: &ClassDescriptor,
    instance: &mut (dyn Any + Send + Sync),
    steps: &[InitStep],
) -> Result<()> {
    for (index, step) in steps.iter().enumerate() {
        #[cfg(feature = "logging")]
        trace!(
            target: "service_container",
            service,
            step = index,
            kind = step_kind(step),
            "Applying initialization step"
        );

        match step {
            InitStep::Callable(callback) => {
                if !callback.apply(instance) {
                    return Err(DiError::invalid_initialize(
                        service,
                        format!(
                            "step {index} expects a {}, but {} builds a {}",
                            callback.type_name(),
                            class.name(),
                            class.type_name()
                        ),
                    ));
                }
            }
            InitStep::MethodName(name) => {
                let method = class
                    .method(name)
                    .ok_or_else(|| method_not_found(class, name, "no such method".into()))?;
                if method.arity() != 0 {
                    return Err(method_not_found(
                        class,
                        name,
                        format!(
                            "takes {} argument(s); a method-name step needs a zero-argument method",
                            method.arity()
                        ),
                    ));
                }
                method.invoke(class, name, instance, &[])?;
            }
            InitStep::MethodCall { method: name, arguments } => {
                let method = class
                    .method(name)
                    .ok_or_else(|| method_not_found(class, name, "no such method".into()))?;
                method.invoke(class, name, instance, arguments)?;
            }
        }
    }

    Ok(())
}

fn method_not_found(class: &ClassDescriptor, method: &str, reason: String) -> DiError {
    DiError::MethodNotFound {
        class: class.name().to_owned(),
        method: method.to_owned(),
        reason,
    }
}

#[cfg(feature = "logging")]
fn step_kind(step: &InitStep) -> &'static str {
    match step {
        InitStep::Callable(_) => "callable",
        InitStep::MethodName(_) => "method",
        InitStep::MethodCall { .. } => "call",
    }
}
