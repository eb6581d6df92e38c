//! Traits describing provider capabilities and the shared error type.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{Address, CollectionSchedule, Postcode, Uprn};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to provider backends.
pub enum PortError {
    /// Network layer failed or the provider answered with an error status.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The lookup succeeded but matched no address.
    #[error("Address not found")]
    AddressNotFound,
    /// Provider answered with a payload we cannot use.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl PortError {
    /// True for an empty lookup result, false for transport and decoding failures.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::AddressNotFound)
    }
}

#[async_trait]
/// Trait for provider-specific postcode lookup backends.
pub trait AddressPort: Send + Sync {
    /// List candidate addresses for a postcode.
    ///
    /// An empty list is a valid answer; callers decide whether it is an error.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the provider request fails.
    async fn lookup(&self, postcode: &Postcode) -> Result<Vec<Address>, PortError>;
}

#[async_trait]
/// Trait for provider-specific collection schedule backends.
pub trait SchedulePort: Send + Sync {
    /// Fetch the upcoming collections for a property.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the provider request fails or rejects the UPRN.
    async fn schedule(&self, uprn: Uprn) -> Result<CollectionSchedule, PortError>;
}
