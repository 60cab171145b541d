//! The Outline management client.
//!
//! Every operation comes in two forms with identical semantics: `*_async`
//! schedules the call on the client's executor and returns a `Deferred`,
//! and the blocking form is `*_async(..).wait()`. Neither form may block on
//! the executor's worker thread; `Deferred::wait` reports that as an error.

use crate::client::OutlineApi;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::executor::{Deferred, Executor};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{AccessKey, CreateAccessKey, ServerInfo, TransferMetrics, UpdateAccessKey};

type Parser<T> = fn(&OutlineApi, HttpResponse) -> Result<T, ApiError>;

#[derive(Debug)]
pub struct OutlineClient {
    api: OutlineApi,
    transport: Transport,
    // Dropped last: joins the worker once nothing else can schedule on it.
    executor: Executor,
}

impl OutlineClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = Transport::new(&config)?;
        let executor = Executor::new()?;
        Ok(Self {
            api: OutlineApi::new(config.api_url().clone()),
            transport,
            executor,
        })
    }

    /// Connect with default settings to the management API at `api_url`.
    pub fn connect(api_url: &str) -> Result<Self, ApiError> {
        Self::new(ClientConfig::new(api_url)?)
    }

    pub fn api(&self) -> &OutlineApi {
        &self.api
    }

    fn submit<T>(&self, request: Result<HttpRequest, ApiError>, parse: Parser<T>) -> Deferred<T>
    where
        T: Send + 'static,
    {
        let api = self.api.clone();
        let transport = self.transport.clone();
        self.executor.spawn(async move {
            let response = transport.execute(request?).await?;
            parse(&api, response)
        })
    }

    // -- access keys ---------------------------------------------------------

    pub fn list_access_keys_async(&self) -> Deferred<Vec<AccessKey>> {
        self.submit(self.api.build_list_access_keys(), OutlineApi::parse_list_access_keys)
    }

    pub fn get_access_key_async(&self, id: &str) -> Deferred<AccessKey> {
        self.submit(self.api.build_get_access_key(id), OutlineApi::parse_get_access_key)
    }

    pub fn create_access_key_async(&self, input: &CreateAccessKey) -> Deferred<AccessKey> {
        self.submit(self.api.build_create_access_key(input), OutlineApi::parse_create_access_key)
    }

    pub fn update_access_key_async(&self, id: &str, input: &UpdateAccessKey) -> Deferred<AccessKey> {
        self.submit(self.api.build_update_access_key(id, input), OutlineApi::parse_update_access_key)
    }

    pub fn delete_access_key_async(&self, id: &str) -> Deferred<()> {
        self.submit(self.api.build_delete_access_key(id), OutlineApi::parse_delete_access_key)
    }

    pub fn rename_access_key_async(&self, id: &str, name: &str) -> Deferred<()> {
        self.submit(self.api.build_rename_access_key(id, name), OutlineApi::parse_rename_access_key)
    }

    pub fn add_data_limit_async(&self, id: &str, bytes: u64) -> Deferred<()> {
        self.submit(self.api.build_add_data_limit(id, bytes), OutlineApi::parse_add_data_limit)
    }

    pub fn delete_data_limit_async(&self, id: &str) -> Deferred<()> {
        self.submit(self.api.build_delete_data_limit(id), OutlineApi::parse_delete_data_limit)
    }

    pub fn list_access_keys(&self) -> Result<Vec<AccessKey>, ApiError> {
        self.list_access_keys_async().wait()
    }

    pub fn get_access_key(&self, id: &str) -> Result<AccessKey, ApiError> {
        self.get_access_key_async(id).wait()
    }

    pub fn create_access_key(&self, input: &CreateAccessKey) -> Result<AccessKey, ApiError> {
        self.create_access_key_async(input).wait()
    }

    pub fn update_access_key(&self, id: &str, input: &UpdateAccessKey) -> Result<AccessKey, ApiError> {
        self.update_access_key_async(id, input).wait()
    }

    pub fn delete_access_key(&self, id: &str) -> Result<(), ApiError> {
        self.delete_access_key_async(id).wait()
    }

    pub fn rename_access_key(&self, id: &str, name: &str) -> Result<(), ApiError> {
        self.rename_access_key_async(id, name).wait()
    }

    pub fn add_data_limit(&self, id: &str, bytes: u64) -> Result<(), ApiError> {
        self.add_data_limit_async(id, bytes).wait()
    }

    pub fn delete_data_limit(&self, id: &str) -> Result<(), ApiError> {
        self.delete_data_limit_async(id).wait()
    }

    // -- metrics -------------------------------------------------------------

    pub fn get_transfer_metrics_async(&self) -> Deferred<TransferMetrics> {
        self.submit(self.api.build_get_transfer_metrics(), OutlineApi::parse_get_transfer_metrics)
    }

    pub fn get_metrics_enabled_async(&self) -> Deferred<bool> {
        self.submit(self.api.build_get_metrics_enabled(), OutlineApi::parse_get_metrics_enabled)
    }

    pub fn set_metrics_enabled_async(&self, enabled: bool) -> Deferred<()> {
        self.submit(self.api.build_set_metrics_enabled(enabled), OutlineApi::parse_set_metrics_enabled)
    }

    pub fn get_transfer_metrics(&self) -> Result<TransferMetrics, ApiError> {
        self.get_transfer_metrics_async().wait()
    }

    pub fn get_metrics_enabled(&self) -> Result<bool, ApiError> {
        self.get_metrics_enabled_async().wait()
    }

    pub fn set_metrics_enabled(&self, enabled: bool) -> Result<(), ApiError> {
        self.set_metrics_enabled_async(enabled).wait()
    }

    // -- server --------------------------------------------------------------

    pub fn get_server_info_async(&self) -> Deferred<ServerInfo> {
        self.submit(self.api.build_get_server_info(), OutlineApi::parse_get_server_info)
    }

    pub fn set_server_name_async(&self, name: &str) -> Deferred<()> {
        self.submit(self.api.build_set_server_name(name), OutlineApi::parse_set_server_name)
    }

    pub fn set_hostname_async(&self, hostname: &str) -> Deferred<()> {
        self.submit(self.api.build_set_hostname(hostname), OutlineApi::parse_set_hostname)
    }

    pub fn set_default_port_async(&self, port: u32) -> Deferred<()> {
        self.submit(self.api.build_set_default_port(port), OutlineApi::parse_set_default_port)
    }

    pub fn set_global_data_limit_async(&self, bytes: u64) -> Deferred<()> {
        self.submit(
            self.api.build_set_global_data_limit(bytes),
            OutlineApi::parse_set_global_data_limit,
        )
    }

    pub fn delete_global_data_limit_async(&self) -> Deferred<()> {
        self.submit(
            self.api.build_delete_global_data_limit(),
            OutlineApi::parse_delete_global_data_limit,
        )
    }

    pub fn get_server_info(&self) -> Result<ServerInfo, ApiError> {
        self.get_server_info_async().wait()
    }

    pub fn set_server_name(&self, name: &str) -> Result<(), ApiError> {
        self.set_server_name_async(name).wait()
    }

    pub fn set_hostname(&self, hostname: &str) -> Result<(), ApiError> {
        self.set_hostname_async(hostname).wait()
    }

    pub fn set_default_port(&self, port: u32) -> Result<(), ApiError> {
        self.set_default_port_async(port).wait()
    }

    pub fn set_global_data_limit(&self, bytes: u64) -> Result<(), ApiError> {
        self.set_global_data_limit_async(bytes).wait()
    }

    pub fn delete_global_data_limit(&self) -> Result<(), ApiError> {
        self.delete_global_data_limit_async().wait()
    }
}
