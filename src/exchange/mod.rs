//! Exchange abstraction layer.
//!
//! Defines the client port the harness drives, its typed capability
//! descriptor, the market data it loads, and the factory that builds
//! configured clients.

mod args;
mod capability;
mod credentials;
mod factory;
mod market;
mod traits;

pub use args::CallArgs;
pub use capability::{Capabilities, Method, UnknownMethod};
pub use credentials::{Credential, Credentials, RequiredCredentials};
pub use factory::{ExchangeConfig, ExchangeFactory};
pub use market::{Currency, Market, MarketSet};
pub use traits::Exchange;
