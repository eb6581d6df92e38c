//! High-level service facade over a council's ports.

use tracing::{debug, instrument};

use crate::model::{Address, CollectionSchedule, CouncilMeta, Postcode, Uprn};
use crate::plugin::CouncilPlugin;
use crate::ports::PortError;

/// Public entry point for postcode lookups and schedules.
pub struct BinDayService {
    plugin: CouncilPlugin,
}

impl BinDayService {
    /// Create a new service bound to the provided council plugin.
    #[must_use]
    pub fn new(plugin: CouncilPlugin) -> Self {
        Self { plugin }
    }

    /// Council served by this instance.
    #[must_use]
    pub fn council(&self) -> &CouncilMeta {
        &self.plugin.meta
    }

    /// Resolve a raw postcode into candidate addresses.
    ///
    /// Blank input is the idle state: no request is made and the result is empty.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::AddressNotFound`] when the provider knows no address
    /// for the postcode, or the provider's error when the request fails.
    #[instrument(skip(self), level = "debug")]
    pub async fn lookup_addresses(&self, raw_postcode: &str) -> Result<Vec<Address>, PortError> {
        let Some(postcode) = Postcode::parse(raw_postcode) else {
            return Ok(Vec::new());
        };

        let addresses = self.plugin.address_port.lookup(&postcode).await?;
        debug!(count = addresses.len(), "address lookup finished");

        if addresses.is_empty() {
            return Err(PortError::AddressNotFound);
        }
        Ok(addresses)
    }

    /// Load the upcoming collections for a property.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the provider request fails.
    #[instrument(skip(self), level = "debug")]
    pub async fn schedule_for(&self, uprn: Uprn) -> Result<CollectionSchedule, PortError> {
        let schedule = self.plugin.schedule_port.schedule(uprn).await?;
        debug!(bins = schedule.bins.len(), "schedule lookup finished");
        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::model::{BinCollection, BinColor, CouncilId};
    use crate::ports::{AddressPort, SchedulePort};

    fn meta() -> CouncilMeta {
        CouncilMeta {
            id: CouncilId("test".to_owned()),
            name: "Test Borough".to_owned(),
        }
    }

    #[derive(Default)]
    struct FakeAddresses {
        answer: Vec<Address>,
        fail: bool,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AddressPort for FakeAddresses {
        async fn lookup(&self, postcode: &Postcode) -> Result<Vec<Address>, PortError> {
            self.seen
                .lock()
                .expect("lock poisoned")
                .push(postcode.as_str().to_owned());
            if self.fail {
                Err(PortError::InvalidResponse("missing ADDRESS".to_owned()))
            } else {
                Ok(self.answer.clone())
            }
        }
    }

    #[derive(Default)]
    struct FakeSchedules {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SchedulePort for FakeSchedules {
        async fn schedule(&self, uprn: Uprn) -> Result<CollectionSchedule, PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if uprn == Uprn(0) {
                return Err(PortError::InvalidResponse("unknown property".to_owned()));
            }
            Ok(CollectionSchedule {
                bins: vec![BinCollection {
                    category: "General".to_owned(),
                    color: BinColor("#333".to_owned()),
                    next: "Monday".to_owned(),
                    following: "next Monday".to_owned(),
                    note: None,
                }],
            })
        }
    }

    fn service(addresses: Arc<FakeAddresses>, schedules: Arc<FakeSchedules>) -> BinDayService {
        BinDayService::new(CouncilPlugin {
            meta: meta(),
            address_port: addresses,
            schedule_port: schedules,
        })
    }

    fn two_addresses() -> Vec<Address> {
        vec![
            Address {
                uprn: Uprn(100),
                label: "1 High Street".to_owned(),
            },
            Address {
                uprn: Uprn(101),
                label: "2 High Street".to_owned(),
            },
        ]
    }

    #[tokio::test]
    async fn blank_postcode_is_idle_and_skips_the_provider() {
        let addresses = Arc::new(FakeAddresses::default());
        let service = service(Arc::clone(&addresses), Arc::default());

        for blank in ["", "   ", "\t\n"] {
            let found = service
                .lookup_addresses(blank)
                .await
                .expect("blank postcode is not an error");
            assert!(found.is_empty());
        }
        assert!(addresses.seen.lock().expect("lock poisoned").is_empty());
    }

    #[tokio::test]
    async fn postcode_is_trimmed_before_lookup() {
        let addresses = Arc::new(FakeAddresses {
            answer: two_addresses(),
            ..FakeAddresses::default()
        });
        let service = service(Arc::clone(&addresses), Arc::default());

        let found = service
            .lookup_addresses("  AB1 2CD ")
            .await
            .expect("lookup succeeds");

        assert_eq!(found, two_addresses());
        assert_eq!(
            *addresses.seen.lock().expect("lock poisoned"),
            vec!["AB1 2CD".to_owned()]
        );
    }

    #[tokio::test]
    async fn empty_result_is_not_found() {
        let service = service(Arc::default(), Arc::default());

        let err = service
            .lookup_addresses("ZZ9 9ZZ")
            .await
            .expect_err("no addresses");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn provider_failure_is_kept_apart_from_not_found() {
        let addresses = Arc::new(FakeAddresses {
            fail: true,
            ..FakeAddresses::default()
        });
        let service = service(addresses, Arc::default());

        let err = service
            .lookup_addresses("AB1 2CD")
            .await
            .expect_err("provider failed");
        assert!(!err.is_not_found());
        assert!(matches!(err, PortError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn schedule_is_passed_through() {
        let schedules = Arc::new(FakeSchedules::default());
        let service = service(Arc::default(), Arc::clone(&schedules));

        let schedule = service.schedule_for(Uprn(101)).await.expect("schedule");
        assert_eq!(schedule.bins.len(), 1);
        assert!(service.schedule_for(Uprn(0)).await.is_err());
        assert_eq!(schedules.calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.council().name, "Test Borough");
    }
}
