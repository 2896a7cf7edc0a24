//! Route handlers and their binding context
//!
//! A [`Handler`] wraps whatever is invoked when a route matches. It can be a
//! free function or closure, a method bound to one long-lived receiver, or a
//! method on a receiver built fresh for every dispatch.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::call::Call;

/// How a handler obtains its receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderKind {
    /// Free function or closure, no receiver
    Function,
    /// One receiver reused across dispatches
    Instance,
    /// New receiver constructed for each dispatch
    Factory,
}

impl fmt::Display for BinderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinderKind::Function => write!(f, "function"),
            BinderKind::Instance => write!(f, "instance"),
            BinderKind::Factory => write!(f, "factory"),
        }
    }
}

type Invoke<T> = Box<dyn Fn(&Call) -> T + Send + Sync>;

/// Callable bound to a route
pub struct Handler<T> {
    kind: BinderKind,
    invoke: Invoke<T>,
}

impl<T> Handler<T> {
    /// Handler backed by a free function or closure.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Call) -> T + Send + Sync + 'static,
    {
        Self {
            kind: BinderKind::Function,
            invoke: Box::new(f),
        }
    }

    /// Handler calling `method` on one owned receiver, reused for every dispatch.
    pub fn instance<C, M>(receiver: C, method: M) -> Self
    where
        C: Send + 'static,
        M: Fn(&mut C, &Call) -> T + Send + Sync + 'static,
    {
        let receiver = Mutex::new(receiver);
        Self {
            kind: BinderKind::Instance,
            invoke: Box::new(move |call: &Call| method(&mut *receiver.lock(), call)),
        }
    }

    /// Handler calling `method` on a receiver the caller keeps a handle to.
    pub fn shared<C, M>(receiver: Arc<C>, method: M) -> Self
    where
        C: Send + Sync + 'static,
        M: Fn(&C, &Call) -> T + Send + Sync + 'static,
    {
        Self {
            kind: BinderKind::Instance,
            invoke: Box::new(move |call: &Call| method(receiver.as_ref(), call)),
        }
    }

    /// Handler constructing a receiver with `factory` on every dispatch.
    pub fn factory<C, F, M>(factory: F, method: M) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        M: Fn(&mut C, &Call) -> T + Send + Sync + 'static,
    {
        Self {
            kind: BinderKind::Factory,
            invoke: Box::new(move |call: &Call| {
                let mut receiver = factory();
                method(&mut receiver, call)
            }),
        }
    }

    /// Factory variant for receivers with a `Default` constructor.
    pub fn per_call<C, M>(method: M) -> Self
    where
        C: Default + 'static,
        M: Fn(&mut C, &Call) -> T + Send + Sync + 'static,
    {
        Self::factory(C::default, method)
    }

    pub fn kind(&self) -> BinderKind {
        self.kind
    }

    pub fn call(&self, call: &Call) -> T {
        (self.invoke)(call)
    }
}

impl<T> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("kind", &self.kind).finish()
    }
}

/// Handlers addressable by name, used when routes come from a route table
pub struct HandlerRegistry<T> {
    handlers: HashMap<String, Arc<Handler<T>>>,
}

impl<T> HandlerRegistry<T> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler<T>) -> &mut Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<Handler<T>>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<T> Default for HandlerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HandlerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
