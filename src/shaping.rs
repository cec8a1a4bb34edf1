//! Reshape a completed record into extracted entities grouped by document type.

use crate::resources::Record;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Display-only key dropped from every entity structure.
pub const DISPLAY_FIELD: &str = "name_to_show";

const UNKNOWN_DOCUMENT_TYPE: &str = "unknown";

/// Entity structures grouped by document type.
pub type EntitiesByType = BTreeMap<String, Vec<Map<String, Value>>>;

/// Collect `{document_type -> [structure, ...]}` from a record, stripping [`DISPLAY_FIELD`].
///
/// A document without entities yields an empty list; a record without `documents` yields an
/// empty map.
pub fn extract_document_entities(record: &Record) -> EntitiesByType {
    let Some(documents) = record.documents.as_deref() else {
        tracing::warn!(record_id = %record.id, "No documents found in record");
        return EntitiesByType::new();
    };

    let mut extracted = EntitiesByType::new();
    for document in documents {
        let document_type = document
            .document_type
            .clone()
            .unwrap_or_else(|| UNKNOWN_DOCUMENT_TYPE.to_string());
        let structures = document
            .entities
            .iter()
            .filter_map(|entity| entity.structure.as_ref())
            .map(|structure| {
                let mut structure = structure.clone();
                structure.remove(DISPLAY_FIELD);
                structure
            })
            .collect::<Vec<_>>();
        tracing::debug!(document_type, entities = structures.len(), "Extracted entities");
        extracted.entry(document_type).or_default().extend(structures);
    }
    extracted
}
