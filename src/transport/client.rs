//! HTTP client wrapper for the Nebuia API and its embeddings distributor.

use crate::config::{Config, Credentials};
use crate::error::{ApiBody, NebuiaError, Result};
use crate::transport::curl::{CommandLog, render_curl_command};
use crate::transport::types::{ApiRequest, Attachment, Origin};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// Lightweight HTTP transport shared by every resource endpoint.
pub struct Transport {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) embeddings_url: String,
    pub(crate) credentials: Credentials,
    pub(crate) timeout: Duration,
    pub(crate) command_log: Arc<CommandLog>,
}

impl Transport {
    /// Construct a transport from configuration and an injected curl sink.
    pub fn new(config: &Config, command_log: Arc<CommandLog>) -> Result<Self> {
        validate_credentials(&config.credentials)?;
        let client = Client::builder().user_agent("nebuia-flow/0.1").build()?;

        let base_url = normalize_base_url(&config.base_url).map_err(NebuiaError::InvalidUrl)?;
        let embeddings_url =
            normalize_base_url(&config.embeddings_url).map_err(NebuiaError::InvalidUrl)?;
        tracing::info!(
            client_id = %config.credentials.client_id,
            url = %base_url,
            embeddings_url = %embeddings_url,
            "Initialized Nebuia client"
        );

        Ok(Self {
            client,
            base_url,
            embeddings_url,
            credentials: config.credentials.clone(),
            timeout: config.timeout,
            command_log,
        })
    }

    /// Client identifier used in API paths.
    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    /// Timeout applied when a request carries no override.
    pub fn default_timeout(&self) -> Duration {
        self.timeout
    }

    /// Dispatch a request and return its parsed JSON body.
    pub async fn execute(&self, request: ApiRequest) -> Result<Value> {
        let url = format_endpoint(self.origin_url(request.origin), &request.path);
        let operation = request.operation_label();
        let timeout = request.timeout.unwrap_or(self.timeout);

        let mut headers = vec![
            ("X-API-Key", self.credentials.api_key.as_str()),
            ("X-API-Secret", self.credentials.api_secret.as_str()),
        ];
        if request.attachment.is_none() {
            headers.push(("Content-Type", "application/json"));
        }

        if self.command_log.is_enabled() {
            let command = render_curl_command(
                &request.method,
                &url,
                &headers,
                &request.query,
                request.body.as_ref(),
                request.attachment.as_ref(),
                self.timeout,
            );
            self.command_log.record(&operation, &command);
        }

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .timeout(timeout);
        for (key, value) in &headers {
            builder = builder.header(*key, *value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match (request.attachment, request.body) {
            (Some(attachment), _) => builder.multipart(build_form(attachment).await?),
            (None, Some(body)) => builder.json(&body),
            (None, None) => builder,
        };

        let response = builder.send().await.map_err(|err| {
            tracing::error!(operation = %operation, error = %err, "Network error");
            NebuiaError::Network(err)
        })?;

        let status = response.status();
        tracing::debug!(method = %request.method, url = %url, status = %status, "Request completed");
        let text = response.text().await?;

        if !status.is_success() {
            let error = NebuiaError::Api {
                status,
                message: format!(
                    "Request failed: {}",
                    status.canonical_reason().unwrap_or("Unknown")
                ),
                body: ApiBody::from_text(text),
            };
            tracing::debug!(operation = %operation, error = %error, "Nebuia request failed");
            return Err(error);
        }

        serde_json::from_str(&text).map_err(|err| NebuiaError::Decode(err.to_string()))
    }

    fn origin_url(&self, origin: Origin) -> &str {
        match origin {
            Origin::Api => &self.base_url,
            Origin::Embeddings => &self.embeddings_url,
        }
    }
}

fn validate_credentials(credentials: &Credentials) -> Result<()> {
    let blank = [
        &credentials.client_id,
        &credentials.api_key,
        &credentials.api_secret,
    ]
    .iter()
    .any(|value| value.trim().is_empty());
    if blank {
        return Err(NebuiaError::Validation(
            "All credential fields (client_id, api_key, api_secret) are required".into(),
        ));
    }
    Ok(())
}

/// The file is read inside this function so its handle is released before the upload starts.
async fn build_form(attachment: Attachment) -> Result<Form> {
    let bytes = {
        let mut file = tokio::fs::File::open(&attachment.path).await?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer).await?;
        buffer
    };

    let part = Part::bytes(bytes)
        .file_name(attachment.file_name)
        .mime_str(&attachment.mime)?;
    let form = attachment
        .fields
        .into_iter()
        .fold(Form::new(), |form, (key, value)| form.text(key, value));
    Ok(form.part(attachment.field, part))
}

fn normalize_base_url(url: &str) -> std::result::Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::CurlLogSettings;
    use httpmock::{Method::GET, Method::POST, MockServer};
    use serde_json::json;

    pub(crate) fn test_config(base_url: &str, embeddings_url: &str) -> Config {
        let mut config = Config::new(Credentials {
            client_id: "client-1".into(),
            api_key: "key-1".into(),
            api_secret: "secret-1".into(),
        });
        config.base_url = base_url.to_string();
        config.embeddings_url = embeddings_url.to_string();
        config.timeout = Duration::from_secs(5);
        config.upload_timeout = Duration::from_secs(5);
        config.curl_log = CurlLogSettings::disabled();
        config
    }

    fn transport(server: &MockServer) -> Transport {
        let config = test_config(&server.base_url(), &server.base_url());
        Transport::new(&config, Arc::new(CommandLog::disabled())).expect("transport")
    }

    #[tokio::test]
    async fn sends_credentials_and_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/clients/client-1/records")
                    .header("X-API-Key", "key-1")
                    .header("X-API-Secret", "secret-1")
                    .query_param("page", "2")
                    .query_param("page_size", "10");
                then.status(200).json_body(json!({ "records": [] }));
            })
            .await;

        let value = transport(&server)
            .execute(
                ApiRequest::get("/clients/client-1/records")
                    .query("page", 2)
                    .query("page_size", 10),
            )
            .await
            .expect("request");

        mock.assert_async().await;
        assert_eq!(value, json!({ "records": [] }));
    }

    #[tokio::test]
    async fn non_success_captures_json_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/clients/client-1/records/create");
                then.status(422).json_body(json!({ "detail": "bad ref" }));
            })
            .await;

        let error = transport(&server)
            .execute(
                ApiRequest::post("/clients/client-1/records/create")
                    .json(json!({ "configuration_ref": "x" })),
            )
            .await
            .expect_err("should fail");

        match error {
            NebuiaError::Api {
                status,
                message,
                body,
            } => {
                assert_eq!(status.as_u16(), 422);
                assert_eq!(message, "Request failed: Unprocessable Entity");
                assert_eq!(body, ApiBody::Json(json!({ "detail": "bad ref" })));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_success_keeps_raw_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/broken");
                then.status(502).body("upstream down");
            })
            .await;

        let error = transport(&server)
            .execute(ApiRequest::get("/broken"))
            .await
            .expect_err("should fail");

        assert!(matches!(
            error,
            NebuiaError::Api { body: ApiBody::Text(ref text), .. } if text == "upstream down"
        ));
    }

    #[tokio::test]
    async fn embeddings_origin_is_addressed_separately() {
        let api = MockServer::start_async().await;
        let embeddings = MockServer::start_async().await;
        let status_mock = embeddings
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/document/doc-1/status")
                    .header("X-API-Key", "key-1");
                then.status(200).json_body(json!({ "status": "pending" }));
            })
            .await;

        let config = test_config(&api.base_url(), &embeddings.base_url());
        let transport = Transport::new(&config, Arc::new(CommandLog::disabled())).expect("transport");
        let value = transport
            .execute(ApiRequest::get("/document/doc-1/status").origin(Origin::Embeddings))
            .await
            .expect("status");

        status_mock.assert_async().await;
        assert_eq!(value["status"], "pending");
    }

    #[tokio::test]
    async fn curl_command_is_logged_even_when_request_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404).body("");
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let log_path = dir.path().join("curl.log");
        let log = CommandLog::new(&CurlLogSettings {
            enabled: true,
            file: Some(log_path.clone()),
            console: false,
        });
        let config = test_config(&server.base_url(), &server.base_url());
        let transport = Transport::new(&config, Arc::new(log)).expect("transport");

        let result = transport
            .execute(ApiRequest::get("/missing").operation("Lookup"))
            .await;
        assert!(result.is_err());

        let contents = std::fs::read_to_string(&log_path).expect("curl log");
        assert!(contents.contains("OPERATION: Lookup"));
        assert!(contents.contains("'X-API-Key: key-1'"));
        assert!(contents.contains("--connect-timeout 5"));
    }

    #[tokio::test]
    async fn undecodable_success_body_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/plain");
                then.status(200).body("ok");
            })
            .await;

        let error = transport(&server)
            .execute(ApiRequest::get("/plain"))
            .await
            .expect_err("should fail");
        assert!(matches!(error, NebuiaError::Decode(_)));
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let mut config = test_config("http://127.0.0.1:1", "http://127.0.0.1:2");
        config.credentials.api_secret = "  ".into();
        let result = Transport::new(&config, Arc::new(CommandLog::disabled()));
        assert!(matches!(result, Err(NebuiaError::Validation(_))));
    }

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(format_endpoint("http://h/", "/a/b"), "http://h/a/b");
        assert_eq!(
            normalize_base_url("http://h/api/").expect("url"),
            "http://h/api"
        );
    }
}
