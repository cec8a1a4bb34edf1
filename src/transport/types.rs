//! Request descriptions consumed by the transport.

use reqwest::Method;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Network origin a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Main API hosting records, documents, configurations and jobs.
    Api,
    /// Embeddings distributor, only used for document status.
    Embeddings,
}

/// File part of a multipart request, plus the text fields sent alongside it.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Form field carrying the file.
    pub field: String,
    /// Local path read when the request is dispatched.
    pub path: PathBuf,
    /// File name announced to the server.
    pub file_name: String,
    /// MIME type of the file part.
    pub mime: String,
    /// Plain text form fields.
    pub fields: Vec<(String, String)>,
}

/// One outbound call, described independently of the HTTP client.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Origin the path is resolved against.
    pub origin: Origin,
    /// Path relative to the origin.
    pub path: String,
    /// Query string pairs, in order.
    pub query: Vec<(String, String)>,
    /// Optional JSON body.
    pub body: Option<Value>,
    /// Optional multipart attachment; takes precedence over `body`.
    pub attachment: Option<Attachment>,
    /// Per-call timeout override.
    pub timeout: Option<Duration>,
    /// Label used by the diagnostic side-channel.
    pub operation: Option<String>,
}

impl ApiRequest {
    /// Start a request with the given method and API path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            origin: Origin::Api,
            path: path.into(),
            query: Vec::new(),
            body: None,
            attachment: None,
            timeout: None,
            operation: None,
        }
    }

    /// `GET` request against the API origin.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request against the API origin.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Address the request to another origin.
    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Append a query pair.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query pair when a value is present.
    pub fn query_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) if !value.is_empty() => self.query(key, value),
            _ => self,
        }
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a multipart file part.
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Override the default timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Label the call for the diagnostic side-channel.
    pub fn operation(mut self, label: impl Into<String>) -> Self {
        self.operation = Some(label.into());
        self
    }

    /// Operation label, defaulting to `"<METHOD> <path>"`.
    pub fn operation_label(&self) -> String {
        self.operation
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method, self.path))
    }
}
