use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Incoming method invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new<S: Into<String>>(method: S) -> Self {
        Self {
            method: method.into(),
            arguments: Value::Null,
        }
    }

    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = arguments;
        self
    }

    /// Parse a call from either a JSON object or a bare method name
    pub fn parse(input: &str) -> Result<Self, serde_json::Error> {
        let input = input.trim();
        if input.starts_with('{') {
            serde_json::from_str(input)
        } else {
            Ok(Self::new(input))
        }
    }
}

/// Reply sent back across the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    Success {
        result: Value,
    },
    Error {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
    NotImplemented,
}

impl MethodResponse {
    pub fn success<V: Into<Value>>(result: V) -> Self {
        Self::Success {
            result: result.into(),
        }
    }

    pub fn error<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn not_implemented() -> Self {
        Self::NotImplemented
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented)
    }
}
