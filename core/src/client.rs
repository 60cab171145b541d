//! Stateless request builder and response parser for the management API.
//!
//! # Design
//! `OutlineApi` holds only the base URL and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Every `parse_*` compares the status with the single code that operation
//! expects before looking at the body, so an unexpected status is always a
//! `Server` error carrying the observed status.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::endpoint::{append_path, substitute, Endpoint, KEY_ID};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{
    AccessKey, AccessKeyList, CreateAccessKey, DataLimit, HostnameBody, LimitBody,
    MetricsEnabledBody, NameBody, PortBody, ServerInfo, TransferMetrics, UpdateAccessKey,
};

/// Marker field every transfer-metrics body must carry.
const TRANSFER_MARKER: &str = "bytesTransferredByUserId";

/// Stateless, I/O free client for the Outline management API.
#[derive(Debug, Clone)]
pub struct OutlineApi {
    base_url: Url,
}

impl OutlineApi {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // -- access keys ---------------------------------------------------------

    pub fn build_list_access_keys(&self) -> Result<HttpRequest, ApiError> {
        self.request(Endpoint::ListAccessKeys, &[])
    }

    pub fn build_get_access_key(&self, id: &str) -> Result<HttpRequest, ApiError> {
        self.request(Endpoint::GetAccessKey, &[(KEY_ID, id)])
    }

    pub fn build_create_access_key(&self, input: &CreateAccessKey) -> Result<HttpRequest, ApiError> {
        self.json_request(Endpoint::CreateAccessKey, &[], input)
    }

    pub fn build_update_access_key(
        &self,
        id: &str,
        input: &UpdateAccessKey,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(Endpoint::UpdateAccessKey, &[(KEY_ID, id)], input)
    }

    pub fn build_delete_access_key(&self, id: &str) -> Result<HttpRequest, ApiError> {
        self.request(Endpoint::DeleteAccessKey, &[(KEY_ID, id)])
    }

    pub fn build_rename_access_key(&self, id: &str, name: &str) -> Result<HttpRequest, ApiError> {
        self.json_request(Endpoint::RenameAccessKey, &[(KEY_ID, id)], &NameBody { name })
    }

    pub fn build_add_data_limit(&self, id: &str, bytes: u64) -> Result<HttpRequest, ApiError> {
        let body = LimitBody {
            limit: DataLimit { bytes },
        };
        self.json_request(Endpoint::AddDataLimit, &[(KEY_ID, id)], &body)
    }

    pub fn build_delete_data_limit(&self, id: &str) -> Result<HttpRequest, ApiError> {
        self.request(Endpoint::DeleteDataLimit, &[(KEY_ID, id)])
    }

    pub fn parse_list_access_keys(&self, response: HttpResponse) -> Result<Vec<AccessKey>, ApiError> {
        check_status(&response, 200, "get access keys")?;
        let list: AccessKeyList = decode(&response, "access keys")?;
        Ok(list.access_keys)
    }

    pub fn parse_get_access_key(&self, response: HttpResponse) -> Result<AccessKey, ApiError> {
        check_status(&response, 200, "get access key")?;
        decode(&response, "access key")
    }

    pub fn parse_create_access_key(&self, response: HttpResponse) -> Result<AccessKey, ApiError> {
        check_status(&response, 201, "create access key")?;
        decode(&response, "access key creation")
    }

    pub fn parse_update_access_key(&self, response: HttpResponse) -> Result<AccessKey, ApiError> {
        check_status(&response, 201, "update access key")?;
        decode(&response, "access key update")
    }

    pub fn parse_delete_access_key(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204, "delete access key")?;
        check_empty_or_json(&response, "access key deletion")
    }

    pub fn parse_rename_access_key(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204, "rename access key")?;
        check_empty_or_json(&response, "access key rename")
    }

    pub fn parse_add_data_limit(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204, "add data limit")?;
        check_empty_or_json(&response, "data limit")
    }

    pub fn parse_delete_data_limit(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204, "delete data limit")?;
        check_empty_or_json(&response, "data limit deletion")
    }

    // -- metrics -------------------------------------------------------------

    pub fn build_get_transfer_metrics(&self) -> Result<HttpRequest, ApiError> {
        self.request(Endpoint::TransferMetrics, &[])
    }

    pub fn build_get_metrics_enabled(&self) -> Result<HttpRequest, ApiError> {
        self.request(Endpoint::GetMetricsEnabled, &[])
    }

    pub fn build_set_metrics_enabled(&self, enabled: bool) -> Result<HttpRequest, ApiError> {
        let body = MetricsEnabledBody {
            metrics_enabled: enabled,
        };
        self.json_request(Endpoint::SetMetricsEnabled, &[], &body)
    }

    /// A 200 without the transfer marker counts as a server failure: the
    /// status alone does not prove the body is the metrics document.
    pub fn parse_get_transfer_metrics(&self, response: HttpResponse) -> Result<TransferMetrics, ApiError> {
        check_status(&response, 200, "get metrics")?;
        if !response.body.contains(TRANSFER_MARKER) {
            return Err(ApiError::Server {
                status: response.status,
                message: format!("unable to get metrics: body lacks {TRANSFER_MARKER}"),
            });
        }
        decode(&response, "metrics")
    }

    pub fn parse_get_metrics_enabled(&self, response: HttpResponse) -> Result<bool, ApiError> {
        check_status(&response, 200, "get metrics status")?;
        let value: Value = decode(&response, "metrics status")?;
        value
            .get("metricsEnabled")
            .and_then(Value::as_bool)
            .ok_or_else(|| ApiError::Parse("invalid JSON structure for metrics status".to_string()))
    }

    pub fn parse_set_metrics_enabled(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204, "set metrics status")?;
        check_empty_or_json(&response, "metrics status update")
    }

    // -- server --------------------------------------------------------------

    pub fn build_get_server_info(&self) -> Result<HttpRequest, ApiError> {
        self.request(Endpoint::ServerInfo, &[])
    }

    pub fn build_set_server_name(&self, name: &str) -> Result<HttpRequest, ApiError> {
        self.json_request(Endpoint::SetServerName, &[], &NameBody { name })
    }

    pub fn build_set_hostname(&self, hostname: &str) -> Result<HttpRequest, ApiError> {
        self.json_request(Endpoint::SetHostname, &[], &HostnameBody { hostname })
    }

    /// The port is sent as given; range checks belong to the server.
    pub fn build_set_default_port(&self, port: u32) -> Result<HttpRequest, ApiError> {
        self.json_request(Endpoint::SetDefaultPort, &[], &PortBody { port })
    }

    pub fn build_set_global_data_limit(&self, bytes: u64) -> Result<HttpRequest, ApiError> {
        let body = LimitBody {
            limit: DataLimit { bytes },
        };
        self.json_request(Endpoint::SetGlobalDataLimit, &[], &body)
    }

    pub fn build_delete_global_data_limit(&self) -> Result<HttpRequest, ApiError> {
        self.request(Endpoint::DeleteGlobalDataLimit, &[])
    }

    pub fn parse_get_server_info(&self, response: HttpResponse) -> Result<ServerInfo, ApiError> {
        check_status(&response, 200, "get server information")?;
        decode(&response, "server")
    }

    pub fn parse_set_server_name(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204, "set server name")?;
        check_empty_or_json(&response, "server name")
    }

    pub fn parse_set_hostname(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204, "set host name")?;
        check_empty_or_json(&response, "host name")
    }

    pub fn parse_set_default_port(&self, response: HttpResponse) -> Result<(), ApiError> {
        match response.status {
            400 => Err(ApiError::Server {
                status: 400,
                message: "the requested port isn't valid or missing".to_string(),
            }),
            409 => Err(ApiError::Server {
                status: 409,
                message: "the requested port is already in use".to_string(),
            }),
            _ => {
                check_status(&response, 204, "set default port")?;
                check_empty_or_json(&response, "default port")
            }
        }
    }

    pub fn parse_set_global_data_limit(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204, "set data limit for all access keys")?;
        check_empty_or_json(&response, "global data limit")
    }

    pub fn parse_delete_global_data_limit(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204, "delete data limit for all access keys")?;
        check_empty_or_json(&response, "global data limit deletion")
    }

    fn url(&self, endpoint: Endpoint, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let path = substitute(endpoint.template(), params)?;
        append_path(&self.base_url, &path)
    }

    fn request(&self, endpoint: Endpoint, params: &[(&str, &str)]) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: endpoint.method(),
            url: self.url(endpoint, params)?,
            headers: Vec::new(),
            body: None,
        })
    }

    fn json_request<B: Serialize>(
        &self,
        endpoint: Endpoint,
        params: &[(&str, &str)],
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: endpoint.method(),
            url: self.url(endpoint, params)?,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }
}

/// Map any status other than `expected` to a `Server` error.
fn check_status(response: &HttpResponse, expected: u16, action: &str) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    Err(ApiError::Server {
        status: response.status,
        message: format!("unable to {action}"),
    })
}

fn decode<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T, ApiError> {
    serde_json::from_str(&response.body)
        .map_err(|e| ApiError::Parse(format!("JSON parse error for {what}: {e}")))
}

/// Mutation endpoints answer with an empty body, but anything they do send
/// must still be well-formed JSON.
fn check_empty_or_json(response: &HttpResponse, what: &str) -> Result<(), ApiError> {
    if response.body.trim().is_empty() {
        return Ok(());
    }
    decode::<Value>(response, what).map(|_| ())
}
