//! HTTP exchange seam under [`BankClient`](crate::client::BankClient).
//!
//! The client builds [`ApiRequest`]s, the transport turns them into bytes on the wire
//! and returns whatever status the server answered with. Only failures to get a
//! response at all are errors here; status handling belongs to the client.

use async_trait::async_trait;
use reqwest::{multipart, Client, Method as HttpMethod, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(verb)
    }
}

/// One part of a multipart form
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<FormField>),
}

/// A request as the client sees it, before the transport puts it on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/auth/balance/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Access token for the `Authorization: Bearer` header
    pub bearer: Option<String>,
    /// Set once the request has been re-issued after a token refresh
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Value of the `Authorization` header this request will carry
    pub fn authorization(&self) -> Option<String> {
        self.bearer.as_ref().map(|token| format!("Bearer {}", token))
    }
}

/// Status and raw body of a response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body; an empty body (204) decodes as JSON `null`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if self.body.is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turn a non-success status into the matching error
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::from_response(self.status, &self.body))
        }
    }
}

/// Performs one HTTP exchange
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, Error>;
}

/// Production transport backed by `reqwest`
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Join a request path onto the base URL, keeping the base path (`/api`)
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
        let method = match request.method {
            Method::Get => HttpMethod::GET,
            Method::Post => HttpMethod::POST,
            Method::Put => HttpMethod::PUT,
            Method::Delete => HttpMethod::DELETE,
        };
        let url = self.url_for(&request.path);
        debug!("{} {} (retried: {})", request.method, url, request.retried);

        let mut builder = self.client.request(method, &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(header) = request.authorization() {
            builder = builder.header(reqwest::header::AUTHORIZATION, header);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.multipart(build_form(fields)?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("{} {} -> {}", request.method, url, status);

        Ok(ApiResponse { status, body })
    }
}

fn build_form(fields: &[FormField]) -> Result<multipart::Form, Error> {
    let mut form = multipart::Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name.clone(), value.clone()),
            FormField::File {
                name,
                file_name,
                bytes,
            } => {
                let part = multipart::Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime_for(file_name))
                    .map_err(|e| Error::Other(format!("Invalid upload '{}': {}", file_name, e)))?;
                form.part(name.clone(), part)
            }
        };
    }
    Ok(form)
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
