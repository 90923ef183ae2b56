//! Arguments passed to a step and forwarded to the client call.

use std::fmt;

use serde_json::{Map, Value};

/// Positional step arguments plus free-form request params.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub symbol: Option<String>,
    pub code: Option<String>,
    pub balance: Option<Value>,
    pub params: Map<String, Value>,
}

impl CallArgs {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self::none().with_symbol(symbol)
    }

    /// Arguments for a step keyed by currency code. The code may be unknown.
    #[must_use]
    pub fn code(code: Option<&str>) -> Self {
        Self {
            code: code.map(str::to_string),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn with_balance(mut self, balance: Option<Value>) -> Self {
        self.balance = balance;
        self
    }

    #[must_use]
    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Flatten into query pairs, the form gateways receive.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(symbol) = &self.symbol {
            query.push(("symbol".to_string(), symbol.clone()));
        }
        if let Some(code) = &self.code {
            query.push(("code".to_string(), code.clone()));
        }
        for (key, value) in &self.params {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            query.push((key.clone(), value));
        }
        query
    }
}

impl fmt::Display for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(symbol) = &self.symbol {
            parts.push(symbol.clone());
        }
        if let Some(code) = &self.code {
            parts.push(code.clone());
        }
        if self.balance.is_some() {
            parts.push("<balance>".to_string());
        }
        if !self.params.is_empty() {
            parts.push(Value::Object(self.params.clone()).to_string());
        }
        write!(f, "({})", parts.join(", "))
    }
}
