use crate::resources::is_pdf;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Keep only entries whose path is an existing file with a `.pdf` extension.
pub fn validate_documents(documents: &BTreeMap<String, PathBuf>) -> BTreeMap<String, PathBuf> {
    documents
        .iter()
        .filter(|(document_type, path)| {
            if !path.is_file() {
                tracing::warn!(document_type = %document_type, path = %path.display(), "Document not found");
                return false;
            }
            if !is_pdf(path) {
                tracing::warn!(document_type = %document_type, path = %path.display(), "Document is not a PDF");
                return false;
            }
            tracing::info!(document_type = %document_type, path = %path.display(), "Validated document");
            true
        })
        .map(|(document_type, path)| (document_type.clone(), path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn keeps_existing_pdfs_only() {
        let dir = tempdir().expect("tempdir");
        let deed = dir.path().join("deed.pdf");
        let card = dir.path().join("card.PDF");
        let notes = dir.path().join("notes.txt");
        for path in [&deed, &card, &notes] {
            fs::write(path, b"%PDF-1.4").expect("write");
        }
        let documents = BTreeMap::from([
            ("deed".to_string(), deed.clone()),
            ("id_card".to_string(), card.clone()),
            ("notes".to_string(), notes),
            ("payslip".to_string(), dir.path().join("missing.pdf")),
        ]);

        let valid = validate_documents(&documents);

        assert_eq!(
            valid,
            BTreeMap::from([("deed".to_string(), deed), ("id_card".to_string(), card)])
        );
    }

    #[test]
    fn directories_named_like_pdfs_are_rejected() {
        let dir = tempdir().expect("tempdir");
        let folder = dir.path().join("folder.pdf");
        fs::create_dir(&folder).expect("mkdir");

        let valid = validate_documents(&BTreeMap::from([("deed".to_string(), folder)]));
        assert!(valid.is_empty());
    }
}
