use crate::error::{NebuiaError, Result};
use crate::resources::client::NebuiaClient;
use crate::resources::types::{DocumentStatus, VerificationResult, decode};
use crate::transport::{ApiRequest, Attachment, Origin};
use serde_json::Value;
use std::path::Path;

/// Whether a path carries a `.pdf` extension, ignoring case.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

impl NebuiaClient {
    /// Upload a PDF to a record under the given document type.
    ///
    /// Fails with [`NebuiaError::Validation`] before any network call when the file is missing
    /// or is not a PDF.
    pub async fn upload_document(
        &self,
        record_id: &str,
        file_path: &Path,
        document_type: &str,
    ) -> Result<Value> {
        if !file_path.exists() {
            return Err(NebuiaError::Validation(format!(
                "File not found: {}",
                file_path.display()
            )));
        }
        if !is_pdf(file_path) {
            return Err(NebuiaError::Validation(format!(
                "File must be a PDF: {}",
                file_path.display()
            )));
        }

        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        let attachment = Attachment {
            field: "file".into(),
            path: file_path.to_path_buf(),
            file_name,
            mime: "application/pdf".into(),
            fields: vec![("document_type".into(), document_type.to_string())],
        };

        tracing::info!(
            record_id,
            document_type,
            path = %file_path.display(),
            "Uploading document"
        );
        let response = self
            .transport
            .execute(
                ApiRequest::post(self.client_path(&format!("records/{record_id}/documents")))
                    .attachment(attachment)
                    .timeout(self.upload_timeout)
                    .operation(format!(
                        "Upload Document: {document_type} to Record {record_id}"
                    )),
            )
            .await?;
        tracing::info!(record_id, document_type, "Document upload successful");
        Ok(response)
    }

    /// Embedding status of a document, served by the embeddings distributor.
    pub async fn get_document_status(&self, document_id: &str) -> Result<DocumentStatus> {
        tracing::debug!(document_id, "Checking document status");
        let value = self
            .transport
            .execute(
                ApiRequest::get(format!("/document/{document_id}/status"))
                    .origin(Origin::Embeddings)
                    .operation(format!("Get Document Status: {document_id}")),
            )
            .await?;
        decode(value)
    }

    /// Verify that a document matches its declared type.
    pub async fn verify_document_type(
        &self,
        record_id: &str,
        document_type_id: &str,
    ) -> Result<VerificationResult> {
        tracing::info!(record_id, document_type_id, "Verifying document type");
        let value = self
            .transport
            .execute(
                ApiRequest::get(
                    self.client_path(&format!("records/{record_id}/type/{document_type_id}")),
                )
                .timeout(self.upload_timeout)
                .operation(format!(
                    "Verify Document Type: {document_type_id} for Record {record_id}"
                )),
            )
            .await?;
        decode(value)
    }

    /// List documents attached to a record.
    pub async fn list_documents(&self, record_id: &str) -> Result<Value> {
        tracing::info!(record_id, "Listing documents");
        self.transport
            .execute(
                ApiRequest::get(self.client_path(&format!("records/{record_id}/documents")))
                    .operation(format!("List Documents for Record: {record_id}")),
            )
            .await
    }
}
