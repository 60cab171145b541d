//! Route table and URL composition for the management API.
//!
//! # Design
//! Routes are path templates with `{name}` placeholders. `substitute` fills
//! them in and `append_path` joins the result onto the base URL. Both are
//! pure: the base URL handed to `append_path` is cloned, never extended in
//! place, so repeated calls cannot accumulate path segments.

use url::Url;

use crate::error::ApiError;
use crate::http::HttpMethod;

/// Placeholder name used by every per-key route.
pub const KEY_ID: &str = "key_id";

/// Every route exposed by the Outline management API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ListAccessKeys,
    CreateAccessKey,
    GetAccessKey,
    UpdateAccessKey,
    DeleteAccessKey,
    RenameAccessKey,
    AddDataLimit,
    DeleteDataLimit,
    TransferMetrics,
    GetMetricsEnabled,
    SetMetricsEnabled,
    ServerInfo,
    SetServerName,
    SetHostname,
    SetDefaultPort,
    SetGlobalDataLimit,
    DeleteGlobalDataLimit,
}

impl Endpoint {
    pub const fn template(self) -> &'static str {
        match self {
            Endpoint::ListAccessKeys | Endpoint::CreateAccessKey => "/access-keys",
            Endpoint::GetAccessKey | Endpoint::UpdateAccessKey | Endpoint::DeleteAccessKey => {
                "/access-keys/{key_id}"
            }
            Endpoint::RenameAccessKey => "/access-keys/{key_id}/name",
            Endpoint::AddDataLimit | Endpoint::DeleteDataLimit => "/access-keys/{key_id}/data-limit",
            Endpoint::TransferMetrics => "/metrics/transfer",
            Endpoint::GetMetricsEnabled | Endpoint::SetMetricsEnabled => "/metrics/enabled",
            Endpoint::ServerInfo => "/server",
            Endpoint::SetServerName => "/name",
            Endpoint::SetHostname => "/server/hostname-for-access-keys",
            Endpoint::SetDefaultPort => "/server/port-for-new-access-keys",
            Endpoint::SetGlobalDataLimit | Endpoint::DeleteGlobalDataLimit => {
                "/server/access-key-data-limit"
            }
        }
    }

    pub const fn method(self) -> HttpMethod {
        match self {
            Endpoint::ListAccessKeys
            | Endpoint::GetAccessKey
            | Endpoint::TransferMetrics
            | Endpoint::GetMetricsEnabled
            | Endpoint::ServerInfo => HttpMethod::Get,
            Endpoint::CreateAccessKey => HttpMethod::Post,
            Endpoint::UpdateAccessKey
            | Endpoint::RenameAccessKey
            | Endpoint::AddDataLimit
            | Endpoint::SetMetricsEnabled
            | Endpoint::SetServerName
            | Endpoint::SetHostname
            | Endpoint::SetDefaultPort
            | Endpoint::SetGlobalDataLimit => HttpMethod::Put,
            Endpoint::DeleteAccessKey | Endpoint::DeleteDataLimit | Endpoint::DeleteGlobalDataLimit => {
                HttpMethod::Delete
            }
        }
    }
}

/// Replace every `{name}` placeholder in `template` with its value.
///
/// Values are inserted verbatim and never rescanned. A placeholder without a
/// value, an unbalanced brace, or a value that is empty or contains `/`
/// fails with `ApiError::Template`.
pub fn substitute(template: &str, params: &[(&str, &str)]) -> Result<String, ApiError> {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let (literal, tail) = rest.split_at(open);
        if literal.contains('}') {
            return Err(ApiError::Template(format!("unbalanced '}}' in {template}")));
        }
        resolved.push_str(literal);

        let close = tail
            .find('}')
            .ok_or_else(|| ApiError::Template(format!("unclosed placeholder in {template}")))?;
        let name = &tail[1..close];
        let value = params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| ApiError::Template(format!("unresolved placeholder {{{name}}} in {template}")))?;
        if value.is_empty() || value.contains('/') || is_dot_segment(value) {
            return Err(ApiError::Template(format!(
                "invalid value {value:?} for placeholder {{{name}}}"
            )));
        }
        resolved.push_str(value);
        rest = &tail[close + 1..];
    }

    if rest.contains('}') {
        return Err(ApiError::Template(format!("unbalanced '}}' in {template}")));
    }
    resolved.push_str(rest);
    Ok(resolved)
}

/// Return a new URL with the segments of `path` appended to `base`.
///
/// One leading `/` is stripped so it does not produce an empty segment, and a
/// trailing slash on `base` is dropped before appending.
pub fn append_path(base: &Url, path: &str) -> Result<Url, ApiError> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.contains(['?', '#']) {
        return Err(ApiError::Template(format!("invalid endpoint path: {path}")));
    }

    let segments: Vec<&str> = if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    };
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ApiError::Template(format!("empty segment in endpoint path: {path}")));
    }
    // The URL serializer would resolve these away and retarget the route.
    if segments.iter().any(|segment| is_dot_segment(segment)) {
        return Err(ApiError::Template(format!("dot segment in endpoint path: {path}")));
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ApiError::Template(format!("base URL cannot carry a path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}
