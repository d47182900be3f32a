//! HTTP transport seam
//!
//! The session only needs to send a GET or a single-part multipart POST with
//! a query string and a time budget. [`Transport`] captures exactly that so
//! tests can script responses without a network.

use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;
use thiserror::Error;

/// User agent of the vendor's Android application
pub const USER_AGENT: &str = "okhttp/3.7.0";

/// One text part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub content: String,
}

/// Outgoing request as seen by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub form: Option<FormPart>,
}

/// Status and undecoded body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure below the HTTP status level
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("timed out")]
    Timeout,

    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TransportError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        Self::Failed {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: &TransportRequest,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

/// Default transport over a cookie-keeping `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> crate::Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| crate::Error::configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: &TransportRequest,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .query(&request.query)
            .timeout(timeout);

        if let Some(part) = &request.form {
            let form = reqwest::multipart::Form::new().text(part.name.clone(), part.content.clone());
            builder = builder.multipart(form);
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(RawResponse::new(status, body.to_vec()))
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result.map_err(TransportError::from),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}
