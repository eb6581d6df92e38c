use binday_core::{
    lookup::{Fetch, RequestSequence, Ticket},
    model::{Address, CollectionSchedule, Uprn},
    ports::PortError,
    service::BinDayService,
};
use tracing::{debug, error, warn};

/// Shown for both empty lookups and failed lookups.
pub(crate) const ADDRESS_NOT_FOUND: &str = "Address not available for the entered postcode.";

/// Work the event loop must start on behalf of the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    /// Run `service.lookup_addresses`(...)
    LookupAddresses { ticket: Ticket, postcode: String },
    /// Run `service.schedule_for`(...) for the selected address
    FetchSchedule { ticket: Ticket, uprn: Uprn },
}

/// A finished [`Effect`], tagged with the ticket it was issued with.
#[derive(Debug)]
pub(crate) enum Outcome {
    Addresses {
        ticket: Ticket,
        result: Result<Vec<Address>, PortError>,
    },
    Schedule {
        ticket: Ticket,
        result: Result<CollectionSchedule, PortError>,
    },
}

pub(crate) async fn run_effect(service: &BinDayService, effect: Effect) -> Outcome {
    match effect {
        Effect::LookupAddresses { ticket, postcode } => Outcome::Addresses {
            ticket,
            result: service.lookup_addresses(&postcode).await,
        },
        Effect::FetchSchedule { ticket, uprn } => Outcome::Schedule {
            ticket,
            result: service.schedule_for(uprn).await,
        },
    }
}

pub(crate) struct App {
    pub council_name: String,

    pub postcode: String,
    pub addresses: Fetch<Vec<Address>, PortError>,
    pub address_list_index: usize,
    pub selected_address: Option<Address>,

    pub schedule: Fetch<CollectionSchedule, PortError>,

    show_schedule_errors: bool,
    address_requests: RequestSequence,
    schedule_requests: RequestSequence,
}

impl App {
    pub(crate) fn new(council_name: String, show_schedule_errors: bool) -> Self {
        Self {
            council_name,
            postcode: String::new(),
            addresses: Fetch::Idle,
            address_list_index: 0,
            selected_address: None,
            schedule: Fetch::Idle,
            show_schedule_errors,
            address_requests: RequestSequence::new(),
            schedule_requests: RequestSequence::new(),
        }
    }

    /// Addresses from the latest successful lookup; empty otherwise.
    pub(crate) fn addresses(&self) -> &[Address] {
        self.addresses
            .ready()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn error_message(&self) -> Option<&'static str> {
        self.addresses.failed().map(|_| ADDRESS_NOT_FOUND)
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.address_requests.is_pending() || self.schedule_requests.is_pending()
    }

    /// Replace the postcode verbatim. Returns the lookup to run, if any.
    pub(crate) fn set_postcode(&mut self, value: String) -> Option<Effect> {
        self.postcode = value;

        if self.postcode.trim().is_empty() {
            self.address_requests.invalidate();
            self.addresses = Fetch::Idle;
            self.address_list_index = 0;
            return None;
        }

        let ticket = self.address_requests.issue();
        Some(Effect::LookupAddresses {
            ticket,
            postcode: self.postcode.clone(),
        })
    }

    pub(crate) fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Addresses { ticket, result } => self.apply_addresses(ticket, result),
            Outcome::Schedule { ticket, result } => self.apply_schedule(ticket, result),
        }
    }

    pub(crate) fn apply_addresses(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Address>, PortError>,
    ) {
        if !self.address_requests.settle(ticket) {
            debug!(?ticket, "discarding stale address lookup");
            return;
        }

        self.address_list_index = 0;
        self.addresses = match result {
            Ok(addresses) if addresses.is_empty() => Fetch::Failed(PortError::AddressNotFound),
            Ok(addresses) => Fetch::Ready(addresses),
            Err(err) => {
                if err.is_not_found() {
                    debug!(postcode = %self.postcode.trim(), "no addresses for postcode");
                } else {
                    warn!(error = %err, "address lookup failed");
                }
                Fetch::Failed(err)
            }
        };
    }

    /// Select by UPRN from the current address set; an unknown UPRN clears the selection.
    pub(crate) fn select_address(&mut self, uprn: Uprn) -> Option<Effect> {
        let selected = self
            .addresses()
            .iter()
            .find(|address| address.uprn == uprn)
            .cloned();

        if selected == self.selected_address {
            return None;
        }

        self.selected_address = selected;
        // a schedule is only shown next to the address it belongs to
        self.schedule = Fetch::Idle;

        match &self.selected_address {
            Some(address) => {
                let ticket = self.schedule_requests.issue();
                Some(Effect::FetchSchedule {
                    ticket,
                    uprn: address.uprn,
                })
            }
            None => {
                self.schedule_requests.invalidate();
                None
            }
        }
    }

    pub(crate) fn select_highlighted(&mut self) -> Option<Effect> {
        let uprn = self.addresses().get(self.address_list_index)?.uprn;
        self.select_address(uprn)
    }

    pub(crate) fn apply_schedule(
        &mut self,
        ticket: Ticket,
        result: Result<CollectionSchedule, PortError>,
    ) {
        if !self.schedule_requests.settle(ticket) {
            debug!(?ticket, "discarding stale schedule lookup");
            return;
        }

        match result {
            Ok(schedule) => self.schedule = Fetch::Ready(schedule),
            Err(err) => {
                let uprn = self.selected_address.as_ref().map(|address| address.uprn);
                error!(error = %err, ?uprn, "collection schedule lookup failed");
                if self.show_schedule_errors {
                    self.schedule = Fetch::Failed(err);
                }
            }
        }
    }

    /// Reset postcode, addresses, error and selection, and drop anything in flight.
    pub(crate) fn clear(&mut self) {
        self.postcode.clear();
        self.addresses = Fetch::Idle;
        self.address_list_index = 0;
        self.selected_address = None;
        self.schedule = Fetch::Idle;
        self.address_requests.invalidate();
        self.schedule_requests.invalidate();
    }

    pub(crate) fn highlight_previous(&mut self) {
        if self.address_list_index > 0 {
            self.address_list_index -= 1;
        }
    }

    pub(crate) fn highlight_next(&mut self) {
        if self.address_list_index + 1 < self.addresses().len() {
            self.address_list_index += 1;
        }
    }
}
