//! Core types and service wiring for the binday collection day finder.

/// Per-fetch state and request sequencing.
pub mod lookup;
/// Domain models and identifiers shared by all providers.
pub mod model;
/// Bundle of ports making up a council provider.
pub mod plugin;
/// Traits describing the provider interfaces.
pub mod ports;
/// High-level service facade used by clients.
pub mod service;

pub use lookup::*;
pub use model::*;
pub use plugin::*;
pub use ports::*;
pub use service::*;
