//! Bundle of ports that together implement one council deployment.

use std::sync::Arc;

use crate::model::CouncilMeta;
use crate::ports::{AddressPort, SchedulePort};

/// Collection of ports implementing a provider for a single council.
pub struct CouncilPlugin {
    /// Static metadata describing the council.
    pub meta: CouncilMeta,
    /// Implementation for postcode lookups.
    pub address_port: Arc<dyn AddressPort>,
    /// Implementation for fetching schedules.
    pub schedule_port: Arc<dyn SchedulePort>,
}
