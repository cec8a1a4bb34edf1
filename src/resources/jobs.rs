use crate::error::Result;
use crate::resources::client::NebuiaClient;
use crate::resources::types::{JobQuery, Page, ProcessingJob, decode};
use crate::transport::ApiRequest;
use serde_json::{Value, json};

impl NebuiaClient {
    /// Trigger processing of every document attached to a record.
    pub async fn create_processing_job(&self, record_id: &str) -> Result<ProcessingJob> {
        tracing::info!(record_id, "Creating processing job");
        let value = self
            .transport
            .execute(
                ApiRequest::post(self.client_path(&format!("records/{record_id}/process")))
                    .json(json!({}))
                    .operation(format!("Create Processing Job for Record: {record_id}")),
            )
            .await?;
        decode(value)
    }

    /// Job metrics with optional status and date filters.
    pub async fn get_jobs_status(&self, page: Page, query: &JobQuery) -> Result<Value> {
        tracing::info!(
            detailed = query.detailed,
            page = page.page,
            page_size = page.page_size,
            status = ?query.status,
            "Getting jobs status"
        );
        self.transport
            .execute(
                ApiRequest::get(self.client_path("records/jobs/status/metrics"))
                    .query("detailed", query.detailed)
                    .query("page", page.page)
                    .query("page_size", page.page_size)
                    .query_opt("status", query.status.as_deref())
                    .query_opt("date_from", query.date_from.as_deref())
                    .query_opt("date_to", query.date_to.as_deref())
                    .operation("Get Jobs Status"),
            )
            .await
    }
}
