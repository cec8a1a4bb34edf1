use crate::error::Result;
use crate::resources::client::NebuiaClient;
use crate::resources::types::{Page, Record, RecordFilter, RecordSummary, decode};
use crate::transport::ApiRequest;
use serde_json::{Value, json};

impl NebuiaClient {
    /// Create a new record associated with a configuration.
    pub async fn create_record(&self, configuration_ref: &str) -> Result<Record> {
        tracing::info!(configuration_ref, "Creating record");
        let value = self
            .transport
            .execute(
                ApiRequest::post(self.client_path("records/create"))
                    .json(json!({ "configuration_ref": configuration_ref }))
                    .operation(format!("Create Record for: {configuration_ref}")),
            )
            .await?;
        decode(value)
    }

    /// Fetch the current snapshot of a record.
    pub async fn get_record_details(&self, record_id: &str) -> Result<Record> {
        tracing::debug!(record_id, "Getting record details");
        let value = self
            .transport
            .execute(
                ApiRequest::get(self.client_path(&format!("records/{record_id}")))
                    .operation(format!("Get Record Details: {record_id}")),
            )
            .await?;
        decode(value)
    }

    /// List records, optionally filtered by status, configuration and creation date.
    pub async fn list_records(&self, page: Page, filter: &RecordFilter) -> Result<Value> {
        tracing::info!(
            page = page.page,
            page_size = page.page_size,
            status = ?filter.status,
            configuration_ref = ?filter.configuration_ref,
            "Listing records"
        );
        self.transport
            .execute(
                ApiRequest::get(self.client_path("records"))
                    .query("page", page.page)
                    .query("page_size", page.page_size)
                    .query_opt("status", filter.status.as_deref())
                    .query_opt("configuration_ref", filter.configuration_ref.as_deref())
                    .query_opt("date_from", filter.date_from.as_deref())
                    .query_opt("date_to", filter.date_to.as_deref())
                    .operation("List Records"),
            )
            .await
    }

    /// Combine record details with its document list.
    ///
    /// A failing document list degrades to an empty list; a failing record lookup propagates.
    pub async fn get_record_summary(&self, record_id: &str) -> Result<RecordSummary> {
        let record = self.get_record_details(record_id).await?;

        let documents = match self.list_documents(record_id).await {
            Ok(value) => value
                .get("documents")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            Err(error) => {
                tracing::warn!(record_id, error = %error, "Failed to list documents for summary");
                Vec::new()
            }
        };

        Ok(RecordSummary {
            total_documents: documents.len(),
            status: record.status.clone(),
            configuration_ref: record.configuration_ref.clone(),
            created_at: record.extra_str("created_at").map(str::to_string),
            completed_at: record.extra_str("completed_at").map(str::to_string),
            documents,
            record,
        })
    }
}
