//! Domain DTOs for the Outline management API.
//!
//! # Design
//! These types mirror the server's JSON schema but are defined independently
//! of the mock-server crate; integration tests catch drift between the two.
//! Response types hold the JSON object the server sent and expose typed
//! accessors over it, so a decoded value re-serializes to exactly that
//! document: unknown fields, explicit `null`s and missing fields included.
//! Request payloads are sparse: absent fields are omitted rather than sent
//! as `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A byte-count cap enforced by the server on key traffic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataLimit {
    pub bytes: u64,
}

/// A server-managed VPN credential. Only `id` is required to be present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct AccessKey {
    id: String,
    fields: Map<String, Value>,
}

impl AccessKey {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        str_field(&self.fields, "name")
    }

    pub fn password(&self) -> Option<&str> {
        str_field(&self.fields, "password")
    }

    pub fn port(&self) -> Option<u16> {
        port_field(&self.fields, "port")
    }

    pub fn method(&self) -> Option<&str> {
        str_field(&self.fields, "method")
    }

    pub fn access_url(&self) -> Option<&str> {
        str_field(&self.fields, "accessUrl")
    }

    /// `None` when the key has no limit, including an explicit `null`.
    pub fn data_limit(&self) -> Option<DataLimit> {
        limit_field(&self.fields, "dataLimit")
    }

    /// Raw access to any field, modelled or not.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn as_json(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Map<String, Value>> for AccessKey {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = str_field(&fields, "id")
            .ok_or_else(|| "access key has no string `id`".to_string())?
            .to_string();
        Ok(Self { id, fields })
    }
}

impl From<AccessKey> for Map<String, Value> {
    fn from(key: AccessKey) -> Self {
        key.fields
    }
}

/// Request payload for creating a new access key. Every field is optional;
/// the server picks defaults for the ones left out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAccessKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<DataLimit>,
}

/// Request payload for creating or replacing the key with a given id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAccessKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<DataLimit>,
}

/// Server configuration as reported by `GET /server`. Every field is
/// optional; absent or mistyped fields read as `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ServerInfo {
    fields: Map<String, Value>,
}

impl ServerInfo {
    pub fn name(&self) -> Option<&str> {
        str_field(&self.fields, "name")
    }

    pub fn server_id(&self) -> Option<&str> {
        str_field(&self.fields, "serverId")
    }

    pub fn metrics_enabled(&self) -> Option<bool> {
        self.fields.get("metricsEnabled").and_then(Value::as_bool)
    }

    pub fn created_timestamp_ms(&self) -> Option<u64> {
        self.fields.get("createdTimestampMs").and_then(Value::as_u64)
    }

    pub fn version(&self) -> Option<&str> {
        str_field(&self.fields, "version")
    }

    pub fn port_for_new_access_keys(&self) -> Option<u16> {
        port_field(&self.fields, "portForNewAccessKeys")
    }

    pub fn hostname_for_access_keys(&self) -> Option<&str> {
        str_field(&self.fields, "hostnameForAccessKeys")
    }

    pub fn access_key_data_limit(&self) -> Option<DataLimit> {
        limit_field(&self.fields, "accessKeyDataLimit")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn as_json(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Bytes transferred per access key id, as reported by `GET /metrics/transfer`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TransferMetrics {
    fields: Map<String, Value>,
}

impl TransferMetrics {
    /// Counter for one key; `None` if the key is not listed.
    pub fn bytes_transferred(&self, id: &str) -> Option<u64> {
        self.by_user()?.get(id).and_then(Value::as_u64)
    }

    /// Every numeric counter, keyed by access key id.
    pub fn bytes_transferred_by_user_id(&self) -> BTreeMap<&str, u64> {
        self.by_user()
            .into_iter()
            .flatten()
            .filter_map(|(id, bytes)| Some((id.as_str(), bytes.as_u64()?)))
            .collect()
    }

    pub fn as_json(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn by_user(&self) -> Option<&Map<String, Value>> {
        self.fields.get("bytesTransferredByUserId").and_then(Value::as_object)
    }
}

/// Response envelope of `GET /access-keys`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessKeyList {
    pub access_keys: Vec<AccessKey>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NameBody<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct HostnameBody<'a> {
    pub hostname: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PortBody {
    pub port: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MetricsEnabledBody {
    pub metrics_enabled: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct LimitBody {
    pub limit: DataLimit,
}

fn str_field<'a>(fields: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    fields.get(field).and_then(Value::as_str)
}

fn port_field(fields: &Map<String, Value>, field: &str) -> Option<u16> {
    fields
        .get(field)
        .and_then(Value::as_u64)
        .and_then(|port| u16::try_from(port).ok())
}

fn limit_field(fields: &Map<String, Value>, field: &str) -> Option<DataLimit> {
    let bytes = fields.get(field)?.get("bytes")?.as_u64()?;
    Some(DataLimit { bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserialized<T: Serialize + serde::de::DeserializeOwned>(raw: &str) -> (T, Value) {
        let decoded: T = serde_json::from_str(raw).unwrap();
        let json = serde_json::to_value(&decoded).unwrap();
        (decoded, json)
    }

    #[test]
    fn create_access_key_omits_absent_fields() {
        let input = CreateAccessKey {
            name: Some("laptop".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "laptop" }));
    }

    #[test]
    fn create_access_key_nests_limit() {
        let input = CreateAccessKey {
            limit: Some(DataLimit { bytes: 1_073_741_824 }),
            ..Default::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["limit"]["bytes"], 1_073_741_824u64);
    }

    #[test]
    fn access_key_keeps_unknown_fields() {
        let raw = r#"{"id":"3","name":"phone","password":"pw","port":12345,
            "method":"chacha20-ietf-poly1305","accessUrl":"ss://x","dataLimit":{"bytes":10},
            "lastTrafficSeen":1700000000}"#;
        let (key, json): (AccessKey, Value) = reserialized(raw);
        assert_eq!(key.port(), Some(12345));
        assert_eq!(key.access_url(), Some("ss://x"));
        assert_eq!(key.data_limit(), Some(DataLimit { bytes: 10 }));
        assert_eq!(key.get("lastTrafficSeen"), Some(&Value::from(1_700_000_000u64)));
        assert_eq!(json, serde_json::from_str::<Value>(raw).unwrap());
    }

    #[test]
    fn access_key_does_not_invent_missing_fields() {
        let (key, json): (AccessKey, Value) = reserialized(r#"{"id":"0"}"#);
        assert_eq!(key.id(), "0");
        assert!(key.name().is_none());
        assert!(key.data_limit().is_none());
        assert_eq!(json, serde_json::json!({ "id": "0" }));
    }

    #[test]
    fn access_key_keeps_explicit_nulls() {
        let raw = r#"{"id":"0","name":"a","dataLimit":null}"#;
        let (key, json): (AccessKey, Value) = reserialized(raw);
        assert!(key.data_limit().is_none());
        assert_eq!(json, serde_json::json!({ "id": "0", "name": "a", "dataLimit": null }));
    }

    #[test]
    fn access_key_requires_string_id() {
        for raw in [r#"{"name":"a"}"#, r#"{"id":7}"#, "[]"] {
            assert!(serde_json::from_str::<AccessKey>(raw).is_err(), "raw {raw}");
        }
    }

    #[test]
    fn server_info_uses_camel_case() {
        let raw = r#"{"name":"Server Outline","serverId":"gb236f3c","metricsEnabled":true,
            "createdTimestampMs":1729449481512,"version":"1.11.0",
            "portForNewAccessKeys":4433,"hostnameForAccessKeys":"203.0.113.7"}"#;
        let (info, json): (ServerInfo, Value) = reserialized(raw);
        assert_eq!(info.server_id(), Some("gb236f3c"));
        assert_eq!(info.metrics_enabled(), Some(true));
        assert_eq!(info.created_timestamp_ms(), Some(1_729_449_481_512));
        assert_eq!(info.port_for_new_access_keys(), Some(4433));
        assert_eq!(info.hostname_for_access_keys(), Some("203.0.113.7"));
        assert!(info.access_key_data_limit().is_none());
        assert_eq!(json, serde_json::from_str::<Value>(raw).unwrap());
    }

    #[test]
    fn server_info_tolerates_sparse_bodies() {
        let (info, json): (ServerInfo, Value) = reserialized(r#"{"name":"x","portForNewAccessKeys":null}"#);
        assert_eq!(info.name(), Some("x"));
        assert!(info.version().is_none());
        assert!(info.server_id().is_none());
        assert!(info.port_for_new_access_keys().is_none());
        assert_eq!(json, serde_json::json!({ "name": "x", "portForNewAccessKeys": null }));
    }

    #[test]
    fn transfer_metrics_reads_counters() {
        let raw = r#"{"bytesTransferredByUserId":{"0":1024,"1":0,"2":"bogus"}}"#;
        let (metrics, json): (TransferMetrics, Value) = reserialized(raw);
        assert_eq!(metrics.bytes_transferred("0"), Some(1024));
        assert_eq!(metrics.bytes_transferred("9"), None);
        assert_eq!(metrics.bytes_transferred_by_user_id().len(), 2);
        assert_eq!(json, serde_json::from_str::<Value>(raw).unwrap());
    }

    #[test]
    fn metrics_enabled_body_is_camel_case() {
        let json = serde_json::to_string(&MetricsEnabledBody { metrics_enabled: true }).unwrap();
        assert_eq!(json, r#"{"metricsEnabled":true}"#);
    }
}
