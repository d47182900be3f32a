//! Authenticated session against the vendor mobile API
//!
//! A [`Session`] owns the credentials, the region resolved from the account
//! code prefix and a [`Transport`]. It knows how to address the versioned
//! endpoint tree and turns transport outcomes into decoded JSON or one of the
//! crate's error variants.

use crate::error::{Error, Result};
use crate::transport::{FormPart, ReqwestTransport, Transport, TransportError, TransportRequest};
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error};

/// Request signature hash shipped with the Android application
pub const DEFAULT_HASH: &str = "958fdc9525875bb8ef89e5c0bda3ebc60b95040e";

/// Application version used in the endpoint path
pub const DEFAULT_APP_VERSION: &str = "1.60";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const REST_ROOT: &str = "https://rest.tns-e.ru";

/// Account code prefix to regional subdomain
pub const REGIONS: [(&str, &str); 11] = [
    ("58", "penza"),
    ("76", "yar"),
    ("36", "voronezh"),
    ("53", "novgorod"),
    ("10", "karelia"),
    ("23", "kuban"),
    ("93", "kuban"),
    ("12", "mari-el"),
    ("52", "nn"),
    ("71", "tula"),
    ("61", "rostov"),
];

const REDACTED_KEYS: [&str; 2] = ["password", "PWD"];
const MAX_LOGGED_BODY: usize = 512;

/// Resolve the region for an account code.
///
/// `extra` entries take precedence over the built-in table.
pub fn region_for(username: &str, extra: &HashMap<String, String>) -> Result<String> {
    let prefix = username.get(..2).ok_or_else(|| {
        Error::configuration(format!("account code '{username}' is too short to select a region"))
    })?;

    if let Some(region) = extra.get(prefix) {
        return Ok(region.clone());
    }

    REGIONS
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, region)| region.to_string())
        .ok_or_else(|| {
            Error::configuration(format!(
                "account code '{username}' does not match known regions (prefix {prefix})"
            ))
        })
}

/// Time budget for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout(Duration);

impl Timeout {
    /// Fractional seconds; must be finite and positive
    pub fn from_secs_f64(secs: f64) -> Result<Self> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(Error::configuration(format!(
                "timeout must be a positive number of seconds, got {secs}"
            )));
        }
        Duration::try_from_secs_f64(secs)
            .map(Self)
            .map_err(|e| Error::configuration(format!("timeout of {secs} seconds is out of range: {e}")))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self(DEFAULT_TIMEOUT)
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl From<u64> for Timeout {
    fn from(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }
}

/// Where a request goes: a full URL or segments under the endpoint base
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Url(String),
    Path(Vec<String>),
}

impl Target {
    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Path(segments.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Target {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for Target {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

/// Builder for [`Session`]
pub struct SessionBuilder {
    username: String,
    password: String,
    hash: Option<String>,
    app_version: Option<String>,
    timeout: Timeout,
    base_url: Option<String>,
    extra_regions: HashMap<String, String>,
    transport: Option<Box<dyn Transport>>,
}

impl SessionBuilder {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            hash: None,
            app_version: None,
            timeout: Timeout::default(),
            base_url: None,
            extra_regions: HashMap::new(),
            transport: None,
        }
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = Some(version.into());
        self
    }

    pub fn timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Replace the endpoint base (`https://rest.tns-e.ru/version/{v}/Android/mobile`)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Map an additional account code prefix to a region
    pub fn extra_region(mut self, prefix: impl Into<String>, region: impl Into<String>) -> Self {
        self.extra_regions.insert(prefix.into(), region.into());
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn build(self) -> Result<Session> {
        let region = region_for(&self.username, &self.extra_regions)?;

        if self.timeout.as_duration().is_zero() {
            return Err(Error::configuration("timeout cannot be zero"));
        }

        let base_url = match self.base_url {
            Some(raw) => {
                url::Url::parse(&raw).map_err(|e| {
                    Error::configuration(format!("invalid base URL '{raw}': {e}"))
                })?;
                Some(raw.trim_end_matches('/').to_string())
            }
            None => None,
        };

        let transport: Box<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Box::new(ReqwestTransport::new()?),
        };

        debug!("session for {} resolved to region {}", self.username, region);

        Ok(Session {
            username: self.username,
            password: self.password,
            region,
            hash: self.hash.unwrap_or_else(|| DEFAULT_HASH.to_string()),
            app_version: self
                .app_version
                .unwrap_or_else(|| DEFAULT_APP_VERSION.to_string()),
            timeout: self.timeout.as_duration(),
            base_url,
            transport,
        })
    }
}

/// Credentials, region and transport for one account holder
pub struct Session {
    username: String,
    password: String,
    region: String,
    hash: String,
    app_version: String,
    timeout: Duration,
    base_url: Option<String>,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("region", &self.region)
            .field("app_version", &self.app_version)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Session with default hash, app version, timeout and transport
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        SessionBuilder::new(username, password).build()
    }

    pub fn builder(username: impl Into<String>, password: impl Into<String>) -> SessionBuilder {
        SessionBuilder::new(username, password)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn endpoint_base(&self) -> String {
        match &self.base_url {
            Some(base) => base.clone(),
            None => format!("{REST_ROOT}/version/{}/Android/mobile", self.app_version),
        }
    }

    /// Personal cabinet site of the session's region
    pub fn lk_region_url(&self) -> String {
        format!("https://lk.{}.tns-e.ru", self.region)
    }

    /// `region/{region}/action/{action}/ls/{code}/json`
    pub fn action_target(&self, action: &str, code: &str) -> Target {
        Target::path(["region", self.region.as_str(), "action", action, "ls", code, "json"])
    }

    pub fn url_for(&self, target: &Target) -> String {
        match target {
            Target::Url(url) => url.clone(),
            Target::Path(segments) => format!("{}/{}/", self.endpoint_base(), segments.join("/")),
        }
    }

    pub async fn get(&self, target: impl Into<Target>) -> Result<Value> {
        let url = self.url_for(&target.into());
        debug!("[GET] -> {}", url);

        let request = TransportRequest {
            method: Method::GET,
            url,
            query: self.query(),
            form: None,
        };
        self.execute(request).await
    }

    /// POST `payload` as one multipart part named `field_name`
    pub async fn post(
        &self,
        target: impl Into<Target>,
        payload: &Value,
        field_name: &str,
    ) -> Result<Value> {
        let url = self.url_for(&target.into());
        debug!("[POST] -> {} {}", url, redact(payload));

        let content = serde_json::to_string(payload)
            .map_err(|e| Error::format(format!("could not encode request payload: {e}")))?
            .replace(' ', "");

        let request = TransportRequest {
            method: Method::POST,
            url,
            query: self.query(),
            form: Some(FormPart {
                name: field_name.to_string(),
                content,
            }),
        };
        self.execute(request).await
    }

    /// Release the transport
    pub fn close(self) {
        debug!("closing session for {}", self.username);
    }

    fn query(&self) -> Vec<(String, String)> {
        vec![("hash".to_string(), self.hash.clone())]
    }

    async fn execute(&self, request: TransportRequest) -> Result<Value> {
        let response = self
            .transport
            .send(&request, self.timeout)
            .await
            .map_err(|e| match e {
                TransportError::Timeout => Error::RequestTimeout {
                    method: request.method.clone(),
                    url: request.url.clone(),
                    timeout: self.timeout,
                },
                TransportError::Failed { message, source } => Error::Request {
                    method: request.method.clone(),
                    url: request.url.clone(),
                    message,
                    source,
                },
            })?;

        let text = String::from_utf8_lossy(&response.body);

        if !response.is_success() {
            error!(
                "[{}] <- [{}] {} {}",
                request.method,
                response.status,
                request.url,
                truncated(&text)
            );
            return Err(Error::InvalidResponse {
                status: Some(response.status),
                message: format!("unexpected status for {}: {}", request.url, truncated(&text)),
            });
        }

        if text.trim().is_empty() {
            debug!("[{}] <- [{}] {} (empty)", request.method, response.status, request.url);
            return Ok(Value::Null);
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(json) => {
                debug!("[{}] <- [{}] {}", request.method, response.status, request.url);
                Ok(json)
            }
            Err(e) => {
                error!(
                    "[{}] <- [{}] {} !NONJSON {}",
                    request.method,
                    response.status,
                    request.url,
                    truncated(&text)
                );
                Err(Error::InvalidResponse {
                    status: Some(response.status),
                    message: format!("could not decode response data: {e}"),
                })
            }
        }
    }
}

/// Copy of `payload` with credential values masked
pub fn redact(payload: &Value) -> Value {
    match payload {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    if REDACTED_KEYS.contains(&k.as_str()) {
                        (k.clone(), Value::String("***".to_string()))
                    } else {
                        (k.clone(), redact(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

fn truncated(text: &str) -> String {
    match text.char_indices().nth(MAX_LOGGED_BODY) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
