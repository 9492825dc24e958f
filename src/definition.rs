//! Service definitions
//!
//! A service is registered as a [`ServiceEntry`]: a bare class name, a typed
//! [`ServiceDefinition`], or an untyped [`Value`] record. Every shape is
//! normalized to a `ServiceDefinition` when the service is first resolved.

use crate::value::kind;
use crate::{DiError, Injectable, Result, Value};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Type-erased initialization callback.
///
/// Returns `false` when the instance is not of the type the callback was
/// written for.
type CallbackFn = Arc<dyn Fn(&mut (dyn Any + Send + Sync)) -> bool + Send + Sync>;

/// A closure applied to a freshly built instance.
#[derive(Clone)]
pub struct Callback {
    f: CallbackFn,
    type_name: &'static str,
}

impl Callback {
    /// Wrap a closure over `&mut T`
    pub fn new<T: Injectable, F>(f: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        let f: CallbackFn = Arc::new(move |instance: &mut (dyn Any + Send + Sync)| {
            match instance.downcast_mut::<T>() {
                Some(typed) => {
                    f(typed);
                    true
                }
                None => false,
            }
        });

        Self {
            f,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Type the callback expects as its receiver
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub(crate) fn apply(&self, instance: &mut (dyn Any + Send + Sync)) -> bool {
        (self.f)(instance)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// One post-construction initialization step.
#[derive(Debug, Clone)]
pub enum InitStep {
    /// Call a closure with the instance
    Callable(Callback),
    /// Invoke a zero-argument method
    MethodName(String),
    /// Invoke a method with positional arguments
    MethodCall {
        method: String,
        arguments: Vec<Value>,
    },
}

impl InitStep {
    /// Step that calls `f` with the instance
    pub fn callable<T: Injectable, F>(f: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        InitStep::Callable(Callback::new(f))
    }

    /// Step that invokes a zero-argument method
    pub fn method(name: impl Into<String>) -> Self {
        InitStep::MethodName(name.into())
    }

    /// Step that invokes a method with positional arguments
    pub fn call<I, V>(method: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        InitStep::MethodCall {
            method: method.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse one element of a record's `initialize` list.
    fn from_value(service: &str, index: usize, value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => Ok(InitStep::MethodName(name.clone())),
            Value::Object(_) => {
                let method = value
                    .get("method")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .ok_or_else(|| {
                        DiError::invalid_initialize(
                            service,
                            format!("step {index} has no method name"),
                        )
                    })?;

                let arguments = match value.get("arguments") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items.clone(),
                    Some(other) => {
                        return Err(DiError::invalid_initialize(
                            service,
                            format!(
                                "arguments of step {index} must be an array, found {}",
                                kind(other)
                            ),
                        ));
                    }
                };

                Ok(InitStep::MethodCall {
                    method: method.to_owned(),
                    arguments,
                })
            }
            other => Err(DiError::invalid_initialize(
                service,
                format!("step {index} is not a recognized step ({})", kind(other)),
            )),
        }
    }
}

/// Recipe for building one service.
///
/// # Examples
///
/// ```rust
/// use service_container::{InitStep, ServiceDefinition};
///
/// let definition = ServiceDefinition::new("Logger")
///     .arg("app.log")
///     .method("open")
///     .call("set_level", [5]);
///
/// assert_eq!(definition.class(), "Logger");
/// assert_eq!(definition.arguments().len(), 1);
/// assert!(matches!(definition.initialize()[0], InitStep::MethodName(_)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServiceDefinition {
    class: String,
    arguments: Vec<Value>,
    initialize: Vec<InitStep>,
}

impl ServiceDefinition {
    /// Definition for `class` with no arguments and no initialization steps
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            arguments: Vec::new(),
            initialize: Vec::new(),
        }
    }

    /// Append one constructor argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.arguments.push(value.into());
        self
    }

    /// Append several constructor arguments
    pub fn args<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.arguments.extend(values.into_iter().map(Into::into));
        self
    }

    /// Append an initialization step
    pub fn step(mut self, step: InitStep) -> Self {
        self.initialize.push(step);
        self
    }

    /// Append a zero-argument method call
    pub fn method(self, name: impl Into<String>) -> Self {
        self.step(InitStep::method(name))
    }

    /// Append a method call with arguments
    pub fn call<I, V>(self, method: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.step(InitStep::call(method, arguments))
    }

    /// Append a closure step
    pub fn callable<T: Injectable, F>(self, f: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.step(InitStep::callable(f))
    }

    #[inline]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[inline]
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    #[inline]
    pub fn initialize(&self) -> &[InitStep] {
        &self.initialize
    }

    /// Parse an untyped record.
    fn from_record(service: &str, record: &Value) -> Result<Self> {
        let map = match record {
            Value::Null => {
                return Err(DiError::invalid_entry(service, "entry is empty"));
            }
            Value::String(class) => return Ok(Self::new(class.clone())),
            Value::Object(map) => map,
            other => {
                return Err(DiError::invalid_entry(
                    service,
                    format!(
                        "entry must be a class name or a record, found {}",
                        kind(other)
                    ),
                ));
            }
        };

        let class = map
            .get("class")
            .and_then(Value::as_str)
            .ok_or_else(|| DiError::invalid_entry(service, "entry has no class reference"))?;

        let arguments = match map.get("arguments") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(DiError::invalid_entry(
                    service,
                    format!("arguments must be an array, found {}", kind(other)),
                ));
            }
        };

        let initialize = match map.get("initialize") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| InitStep::from_value(service, index, item))
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(DiError::invalid_initialize(
                    service,
                    format!("initialize must be an array, found {}", kind(other)),
                ));
            }
        };

        Ok(Self {
            class: class.to_owned(),
            arguments,
            initialize,
        })
    }
}

/// Any of the accepted shapes of a registered service.
#[derive(Debug, Clone)]
pub enum ServiceEntry {
    /// Bare class name, shorthand for a definition with no arguments or steps
    Class(String),
    /// Structured definition
    Definition(ServiceDefinition),
    /// Untyped record: `{"class", "arguments", "initialize"}` or a class name string,
    /// usually written with `json!`
    Record(Value),
}

impl ServiceEntry {
    /// Normalize to the structured form.
    ///
    /// Shorthand and record entries are expanded; a typed definition is
    /// borrowed as-is.
    pub fn normalize(&self, service: &str) -> Result<Cow<'_, ServiceDefinition>> {
        let definition = match self {
            ServiceEntry::Class(class) => Cow::Owned(ServiceDefinition::new(class.clone())),
            ServiceEntry::Definition(definition) => Cow::Borrowed(definition),
            ServiceEntry::Record(record) => {
                Cow::Owned(ServiceDefinition::from_record(service, record)?)
            }
        };

        if definition.class.is_empty() {
            return Err(DiError::invalid_entry(service, "class reference is empty"));
        }

        Ok(definition)
    }
}

impl From<&str> for ServiceEntry {
    fn from(class: &str) -> Self {
        ServiceEntry::Class(class.to_owned())
    }
}

impl From<String> for ServiceEntry {
    fn from(class: String) -> Self {
        ServiceEntry::Class(class)
    }
}

impl From<ServiceDefinition> for ServiceEntry {
    fn from(definition: ServiceDefinition) -> Self {
        ServiceEntry::Definition(definition)
    }
}

impl From<Value> for ServiceEntry {
    fn from(record: Value) -> Self {
        ServiceEntry::Record(record)
    }
}
