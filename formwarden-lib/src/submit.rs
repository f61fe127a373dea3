//! Optional helper for sending form data to an endpoint.
//!
//! The validator never submits on its own. Callers typically invoke
//! [`FormValidator::submit`](crate::FormValidator::submit) from their
//! valid-submit callback.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use url::Url;

use crate::error::SubmitError;
use crate::host::FormValues;

/// Caller-overridable request options.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use formwarden_lib::submit::SubmitOptions;
///
/// let options = SubmitOptions::default()
///     .method(reqwest::Method::PUT)
///     .header("X-Requested-With", "formwarden")
///     .timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// HTTP method. Default: POST
    pub method: Method,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Request timeout, if any.
    pub timeout: Option<Duration>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            method: Method::POST,
            headers: Vec::new(),
            timeout: None,
        }
    }
}

impl SubmitOptions {
    /// Sets the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A fully described submission.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Target endpoint.
    pub url: Url,
    /// Request options.
    pub options: SubmitOptions,
    /// Field values and attachments to send.
    pub values: FormValues,
}

/// What the endpoint answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl SubmitResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a [`SubmitRequest`] somewhere.
///
/// The default implementation is [`ReqwestTransport`]; tests and embedders
/// with their own networking can substitute anything else.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the request.
    async fn send(&self, request: SubmitRequest) -> Result<SubmitResponse, SubmitError>;
}

/// HTTP transport encoding the form as `multipart/form-data`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport reusing an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: SubmitRequest) -> Result<SubmitResponse, SubmitError> {
        let form = multipart_body(&request.values)?;
        let mut builder = self
            .client
            .request(request.options.method.clone(), request.url.clone())
            .multipart(form);

        for (name, value) in &request.options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.options.timeout {
            builder = builder.timeout(timeout);
        }

        log::debug!("{} {}", request.options.method, request.url);
        let response = builder.send().await.map_err(|e| match request.options.timeout {
            Some(timeout) if e.is_timeout() => SubmitError::Timeout(timeout),
            _ => SubmitError::Network(e),
        })?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(SubmitResponse { status, body })
    }
}

/// Parses a submit endpoint.
pub(crate) fn parse_url(url: &str) -> Result<Url, SubmitError> {
    Url::parse(url).map_err(|e| SubmitError::InvalidUrl(format!("{url}: {e}")))
}

/// Builds the multipart body: text parts for plain fields, file parts for
/// fields carrying attachments.
fn multipart_body(values: &FormValues) -> Result<Form, SubmitError> {
    let mut form = Form::new();
    for (name, value) in values.iter() {
        let mut files = values.files_of(name).peekable();
        if files.peek().is_none() {
            form = form.text(name.to_string(), value.to_string());
            continue;
        }
        for file in files {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            if let Some(content_type) = &file.content_type {
                part = part.mime_str(content_type)?;
            }
            form = form.part(name.to_string(), part);
        }
    }
    Ok(form)
}
