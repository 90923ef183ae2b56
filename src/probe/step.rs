//! Conformance step identities.

use std::fmt;

use crate::exchange::Method;

/// Error-injection scenarios run in extended mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scenario {
    InvalidNonce,
    OrderNotFound,
    InvalidOrder,
    InsufficientFunds,
}

impl Scenario {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidNonce => "InvalidNonce",
            Self::OrderNotFound => "OrderNotFound",
            Self::InvalidOrder => "InvalidOrder",
            Self::InsufficientFunds => "InsufficientFunds",
        }
    }

    /// The client method a scenario exercises; its capability gates the
    /// scenario.
    #[must_use]
    pub const fn method(self) -> Method {
        match self {
            Self::InvalidNonce => Method::FetchBalance,
            Self::OrderNotFound => Method::CancelOrder,
            Self::InvalidOrder | Self::InsufficientFunds => Method::CreateOrder,
        }
    }
}

/// One dispatchable conformance step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Call(Method),
    Scenario(Scenario),
}

impl Step {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Call(method) => method.as_str(),
            Self::Scenario(scenario) => scenario.as_str(),
        }
    }

    /// Capability the client must declare for this step to run.
    #[must_use]
    pub const fn capability(self) -> Method {
        match self {
            Self::Call(method) => method,
            Self::Scenario(scenario) => scenario.method(),
        }
    }
}

impl From<Method> for Step {
    fn from(method: Method) -> Self {
        Self::Call(method)
    }
}

impl From<Scenario> for Step {
    fn from(scenario: Scenario) -> Self {
        Self::Scenario(scenario)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenarios_are_gated_by_the_method_they_exercise() {
        assert_eq!(
            Step::from(Scenario::InsufficientFunds).capability(),
            Method::CreateOrder
        );
        assert_eq!(Step::from(Scenario::InvalidNonce).capability(), Method::FetchBalance);
        assert_eq!(Step::from(Method::FetchTicker).capability(), Method::FetchTicker);
    }
}
