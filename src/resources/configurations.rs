use crate::error::{NebuiaError, Result};
use crate::resources::client::NebuiaClient;
use crate::resources::types::{CONFIGURATION_REQUIRED_FIELDS, Page};
use crate::transport::ApiRequest;
use serde_json::{Map, Value};

impl NebuiaClient {
    /// Create a configuration; every field in [`CONFIGURATION_REQUIRED_FIELDS`] must be present.
    pub async fn create_configuration(
        &self,
        config_name: &str,
        config_data: &Map<String, Value>,
    ) -> Result<Value> {
        let missing: Vec<&str> = CONFIGURATION_REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !config_data.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            return Err(NebuiaError::Validation(format!(
                "Configuration data missing required fields: {}",
                missing.join(", ")
            )));
        }

        tracing::info!(config_name, "Creating configuration");
        self.transport
            .execute(
                ApiRequest::post(self.client_path(&format!("configurations/{config_name}")))
                    .json(Value::Object(config_data.clone()))
                    .operation(format!("Create Configuration: {config_name}")),
            )
            .await
    }

    /// Fetch one configuration by name.
    pub async fn get_configuration(&self, config_name: &str) -> Result<Value> {
        tracing::info!(config_name, "Getting configuration");
        self.transport
            .execute(
                ApiRequest::get(self.client_path(&format!("configurations/{config_name}")))
                    .operation(format!("Get Configuration: {config_name}")),
            )
            .await
    }

    /// List configurations for the client.
    pub async fn list_configurations(&self, page: Page) -> Result<Value> {
        tracing::info!(page = page.page, page_size = page.page_size, "Listing configurations");
        self.transport
            .execute(
                ApiRequest::get(self.client_path("configurations"))
                    .query("page", page.page)
                    .query("page_size", page.page_size)
                    .operation("List Configurations"),
            )
            .await
    }
}
