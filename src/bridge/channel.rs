use super::message::{MethodCall, MethodResponse};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Handler for a single bridge method
pub trait MethodHandler: Send + Sync {
    fn handle(&self, call: &MethodCall) -> MethodResponse;
}

impl<F> MethodHandler for F
where
    F: Fn(&MethodCall) -> MethodResponse + Send + Sync,
{
    fn handle(&self, call: &MethodCall) -> MethodResponse {
        self(call)
    }
}

/// A method name with no registered handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedCommand {
    pub method: String,
}

impl fmt::Display for UnsupportedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method '{}' is not implemented", self.method)
    }
}

/// How a call would be routed
pub enum Dispatch<'a> {
    Handler(&'a dyn MethodHandler),
    Unsupported(UnsupportedCommand),
}

/// Named dispatch table of bridge methods
pub struct MethodChannel {
    name: String,
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl MethodChannel {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a handler, returning the one it replaced
    pub fn register<S, H>(&mut self, method: S, handler: H) -> Option<Arc<dyn MethodHandler>>
    where
        S: Into<String>,
        H: MethodHandler + 'static,
    {
        let method = method.into();
        debug!("Registering method '{}' on channel '{}'", method, self.name);
        self.handlers.insert(method, Arc::new(handler))
    }

    pub fn is_registered(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    pub fn classify(&self, call: &MethodCall) -> Dispatch<'_> {
        match self.handlers.get(&call.method) {
            Some(handler) => Dispatch::Handler(handler.as_ref()),
            None => Dispatch::Unsupported(UnsupportedCommand {
                method: call.method.clone(),
            }),
        }
    }

    pub fn dispatch(&self, call: &MethodCall) -> MethodResponse {
        match self.classify(call) {
            Dispatch::Handler(handler) => {
                debug!("Dispatching '{}' on channel '{}'", call.method, self.name);
                handler.handle(call)
            }
            Dispatch::Unsupported(unsupported) => {
                warn!("{} on channel '{}'", unsupported, self.name);
                MethodResponse::not_implemented()
            }
        }
    }
}
