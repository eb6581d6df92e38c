//! Provider implementation for councils hosted on the iTouchVision portal.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use binday_core::{
    model::{
        Address, BinCollection, BinColor, CollectionSchedule, CouncilId, CouncilMeta, Postcode,
        Uprn,
    },
    plugin::CouncilPlugin,
    ports::{AddressPort, PortError, SchedulePort},
};

/// Deployment settings for one council on the portal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItouchVisionConfig {
    /// Portal base, e.g. `https://iweb.itouchvision.com/portal/itouchvision/kmbd_demo`.
    #[serde(alias = "serviceBaseUrl")]
    pub service_base_url: String,
    /// Account GUID sent as `P_GUID` with every request.
    #[serde(alias = "accountGuid")]
    pub account_guid: String,
    /// Client id sent with schedule requests.
    #[serde(alias = "clientId")]
    pub client_id: u32,
    /// Council id sent with schedule requests.
    #[serde(alias = "councilId")]
    pub council_id: u32,
}

impl ItouchVisionConfig {
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.service_base_url.trim_end_matches('/'))
    }
}

/// Body of POST /address
#[derive(Debug, Serialize)]
struct AddressRequest<'a> {
    #[serde(rename = "P_GUID")]
    guid: &'a str,
    #[serde(rename = "P_POSTCODE")]
    postcode: &'a str,
}

/// Body of POST /collectionDay
#[derive(Debug, Serialize)]
struct CollectionRequest<'a> {
    #[serde(rename = "P_GUID")]
    guid: &'a str,
    #[serde(rename = "P_UPRN")]
    uprn: u64,
    #[serde(rename = "P_CLIENT_ID")]
    client_id: u32,
    #[serde(rename = "P_COUNCIL_ID")]
    council_id: u32,
}

/// Response from /address
#[derive(Debug, Deserialize)]
struct AddressResponse {
    #[serde(rename = "ADDRESS")]
    addresses: Vec<AddressEntry>,
}

/// Single candidate from /address; the portal sends many more columns.
#[derive(Debug, Deserialize)]
struct AddressEntry {
    #[serde(rename = "UPRN", deserialize_with = "uprn_from_number_or_string")]
    uprn: u64,
    #[serde(rename = "FULL_ADDRESS")]
    full_address: String,
}

/// Response from /collectionDay
#[derive(Debug, Deserialize)]
struct CollectionResponse {
    #[serde(rename = "collectionDay", default)]
    collection_day: Option<Vec<BinEntry>>,
}

/// Single bin from /collectionDay
///
/// Colour and following date may be absent or `null`; either leaves that field blank.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinEntry {
    bin_type: String,
    #[serde(default)]
    bin_color: Option<String>,
    collection_day: String,
    #[serde(default)]
    following_day: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

// Some portal deployments quote the UPRN.
fn uprn_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUprn {
        Number(u64),
        Text(String),
    }

    match RawUprn::deserialize(deserializer)? {
        RawUprn::Number(uprn) => Ok(uprn),
        RawUprn::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Postcode lookup implementation for the portal.
pub struct ItouchVisionAddressPort {
    client: Client,
    config: ItouchVisionConfig,
}

impl ItouchVisionAddressPort {
    /// Create a new address port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, config: ItouchVisionConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl AddressPort for ItouchVisionAddressPort {
    async fn lookup(&self, postcode: &Postcode) -> Result<Vec<Address>, PortError> {
        let body = AddressRequest {
            guid: &self.config.account_guid,
            postcode: postcode.as_str(),
        };
        debug!(%postcode, "requesting addresses");

        let req = self.client.post(self.config.endpoint("address")).json(&body);
        let resp = fetch_json::<AddressResponse>(req).await?;

        Ok(map_addresses(resp))
    }
}

/// Collection schedule implementation for the portal.
pub struct ItouchVisionSchedulePort {
    client: Client,
    config: ItouchVisionConfig,
}

impl ItouchVisionSchedulePort {
    /// Create a new schedule port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, config: ItouchVisionConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl SchedulePort for ItouchVisionSchedulePort {
    async fn schedule(&self, uprn: Uprn) -> Result<CollectionSchedule, PortError> {
        let body = CollectionRequest {
            guid: &self.config.account_guid,
            uprn: uprn.0,
            client_id: self.config.client_id,
            council_id: self.config.council_id,
        };
        debug!(%uprn, "requesting collection schedule");

        let req = self
            .client
            .post(self.config.endpoint("collectionDay"))
            .json(&body);
        let resp = fetch_json::<CollectionResponse>(req).await?;

        Ok(map_schedule(resp))
    }
}

/// Build the plugin bundle for a portal deployment.
///
/// `name` is the council name shown to users; the portal does not report one.
#[must_use]
pub fn plugin(client: Client, config: ItouchVisionConfig, name: &str) -> CouncilPlugin {
    let meta = council_meta(&config, name);
    let address_port = Arc::new(ItouchVisionAddressPort::new(client.clone(), config.clone()));
    let schedule_port = Arc::new(ItouchVisionSchedulePort::new(client, config));

    CouncilPlugin {
        meta,
        address_port,
        schedule_port,
    }
}

fn council_meta(config: &ItouchVisionConfig, name: &str) -> CouncilMeta {
    CouncilMeta {
        id: CouncilId(format!("itouchvision:{}:{}", config.client_id, config.council_id)),
        name: name.to_owned(),
    }
}

fn map_addresses(resp: AddressResponse) -> Vec<Address> {
    resp.addresses
        .into_iter()
        .map(|entry| Address {
            uprn: Uprn(entry.uprn),
            label: entry.full_address.trim().to_owned(),
        })
        .collect()
}

fn map_schedule(resp: CollectionResponse) -> CollectionSchedule {
    let bins = resp
        .collection_day
        .unwrap_or_default()
        .into_iter()
        .map(|entry| BinCollection {
            category: entry.bin_type,
            color: BinColor(entry.bin_color.unwrap_or_default()),
            next: entry.collection_day,
            following: entry.following_day.unwrap_or_default(),
            note: entry
                .description
                .map(|note| note.trim().to_owned())
                .filter(|note| !note.is_empty()),
        })
        .collect();

    CollectionSchedule { bins }
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    let body = req
        .send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .bytes()
        .await
        .map_err(PortError::from)?;

    decode(&body)
}

// Transport problems stay `Network`; a body of the wrong shape is `InvalidResponse`.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, PortError> {
    serde_json::from_slice(body).map_err(|err| PortError::InvalidResponse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config() -> ItouchVisionConfig {
        ItouchVisionConfig {
            service_base_url: "https://portal.example/council/".to_owned(),
            account_guid: "GUID-1".to_owned(),
            client_id: 130,
            council_id: 260,
        }
    }

    #[test]
    fn endpoints_join_without_double_slash() {
        assert_eq!(
            config().endpoint("address"),
            "https://portal.example/council/address"
        );
        assert_eq!(
            config().endpoint("collectionDay"),
            "https://portal.example/council/collectionDay"
        );
    }

    #[test]
    fn request_bodies_use_portal_field_names() {
        let address = serde_json::to_value(AddressRequest {
            guid: "GUID-1",
            postcode: "AB1 2CD",
        })
        .expect("serializable");
        assert_eq!(address, json!({"P_GUID": "GUID-1", "P_POSTCODE": "AB1 2CD"}));

        let schedule = serde_json::to_value(CollectionRequest {
            guid: "GUID-1",
            uprn: 101,
            client_id: 130,
            council_id: 260,
        })
        .expect("serializable");
        assert_eq!(
            schedule,
            json!({"P_GUID": "GUID-1", "P_UPRN": 101, "P_CLIENT_ID": 130, "P_COUNCIL_ID": 260})
        );
    }

    #[test]
    fn addresses_decode_with_numeric_or_quoted_uprn() {
        let resp: AddressResponse = serde_json::from_value(json!({
            "ADDRESS": [
                {"UPRN": 100, "FULL_ADDRESS": "1 High Street, Town", "POSTCODE": "AB1 2CD"},
                {"UPRN": "101", "FULL_ADDRESS": " 2 High Street, Town "}
            ]
        }))
        .expect("valid payload");

        let addresses = map_addresses(resp);
        assert_eq!(
            addresses,
            vec![
                Address {
                    uprn: Uprn(100),
                    label: "1 High Street, Town".to_owned(),
                },
                Address {
                    uprn: Uprn(101),
                    label: "2 High Street, Town".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn address_payload_without_list_is_an_invalid_response() {
        let err = decode::<AddressResponse>(br#"{"STATUS": "ERROR"}"#).expect_err("no ADDRESS");
        assert!(matches!(err, PortError::InvalidResponse(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn non_json_body_is_an_invalid_response() {
        let err = decode::<CollectionResponse>(b"<html>maintenance</html>").expect_err("not json");
        assert!(matches!(err, PortError::InvalidResponse(_)));
    }

    #[test]
    fn schedule_decodes_entries_in_order() {
        let resp: CollectionResponse = serde_json::from_value(json!({
            "collectionDay": [
                {
                    "binType": "General",
                    "binColor": "#333",
                    "collectionDay": "Monday",
                    "followingDay": "next Monday"
                },
                {
                    "binType": "Garden",
                    "binColor": "#1f7a1f",
                    "collectionDay": "Tuesday",
                    "followingDay": "Tuesday fortnight",
                    "description": "Subscription required"
                }
            ]
        }))
        .expect("valid payload");

        let schedule = map_schedule(resp);
        assert_eq!(schedule.bins.len(), 2);

        let general = schedule.bins.first().expect("first bin");
        assert_eq!(general.category, "General");
        assert_eq!(general.color, BinColor("#333".to_owned()));
        assert_eq!(general.next, "Monday");
        assert_eq!(general.following, "next Monday");
        assert_eq!(general.note, None);

        let garden = schedule.bins.get(1).expect("second bin");
        assert_eq!(garden.note.as_deref(), Some("Subscription required"));
    }

    #[test]
    fn null_colour_or_following_date_blanks_only_that_field() {
        let resp: CollectionResponse = serde_json::from_value(json!({
            "collectionDay": [
                {"binType": "General", "binColor": "#333", "collectionDay": "Monday",
                 "followingDay": "next Monday"},
                {"binType": "Food", "binColor": null, "collectionDay": "Wednesday",
                 "followingDay": null}
            ]
        }))
        .expect("null fields are tolerated");

        let schedule = map_schedule(resp);
        assert_eq!(schedule.bins.len(), 2);

        let general = schedule.bins.first().expect("first bin");
        assert_eq!(general.color, BinColor("#333".to_owned()));
        assert_eq!(general.following, "next Monday");

        let food = schedule.bins.get(1).expect("second bin");
        assert_eq!(food.category, "Food");
        assert_eq!(food.next, "Wednesday");
        assert_eq!(food.color, BinColor(String::new()));
        assert_eq!(food.following, "");
    }

    #[test]
    fn blank_description_is_no_note() {
        let resp: CollectionResponse = serde_json::from_value(json!({
            "collectionDay": [
                {"binType": "Recycling", "binColor": "blue", "collectionDay": "Friday",
                 "followingDay": "Friday week", "description": "  "}
            ]
        }))
        .expect("valid payload");

        let schedule = map_schedule(resp);
        assert_eq!(schedule.bins.first().and_then(|bin| bin.note.clone()), None);
    }

    #[test]
    fn missing_or_empty_collection_day_is_an_empty_schedule() {
        for payload in [json!({}), json!({"collectionDay": []}), json!({"collectionDay": null})] {
            let resp: CollectionResponse = serde_json::from_value(payload).expect("valid payload");
            assert!(map_schedule(resp).is_empty());
        }
    }

    #[test]
    fn config_accepts_camel_case_keys() {
        let parsed: ItouchVisionConfig = serde_json::from_value(json!({
            "serviceBaseUrl": "https://portal.example/council",
            "accountGuid": "GUID-1",
            "clientId": 130,
            "councilId": 260
        }))
        .expect("valid config");
        assert_eq!(parsed.client_id, 130);
        assert_eq!(parsed.council_id, 260);
    }

    #[test]
    fn plugin_carries_deployment_identity() {
        let plugin = plugin(Client::new(), config(), "Demo Borough");
        assert_eq!(plugin.meta.name, "Demo Borough");
        assert_eq!(plugin.meta.id, CouncilId("itouchvision:130:260".to_owned()));
    }
}
