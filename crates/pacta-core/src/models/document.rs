use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::storage_types::StorageBackend;

/// A persisted uploaded document. The file itself is immutable after upload;
/// only the descriptive metadata can be edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub document_type: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub is_confidential: bool,
    pub original_filename: String,
    pub stored_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub storage_backend: StorageBackend,
    pub storage_key: String,
    pub storage_url: String,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn storage_url(&self) -> &str {
        &self.storage_url
    }
}

/// Metadata accompanying an upload. Tags arrive from clients as a
/// comma-delimited string and are parsed into the list here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DocumentMetadata {
    pub title: String,
    #[serde(default)]
    pub document_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_confidential: bool,
}

impl DocumentMetadata {
    /// Split a comma-delimited tag string into trimmed, non-empty tags.
    pub fn parse_tags(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// PATCH payload for document metadata. The stored file is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateDocumentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_confidential: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub title: String,
    pub document_type: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub is_confidential: bool,
    pub filename: String,
    pub url: String,
    pub content_type: String,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        DocumentResponse {
            id: doc.id,
            title: doc.title,
            document_type: doc.document_type,
            description: doc.description,
            tags: doc.tags,
            is_confidential: doc.is_confidential,
            filename: doc.original_filename,
            url: doc.storage_url,
            content_type: doc.content_type,
            file_size: doc.file_size,
            uploaded_at: doc.uploaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_document() -> Document {
        Document {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            title: "Vendor MSA".to_string(),
            document_type: "contract".to_string(),
            description: Some("Master services agreement".to_string()),
            tags: vec!["vendor".to_string(), "msa".to_string()],
            is_confidential: true,
            original_filename: "MSA.pdf".to_string(),
            stored_filename: "a1b2c3.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            file_size: 5 * 1024 * 1024,
            storage_backend: StorageBackend::Local,
            storage_key: "documents/a1b2c3.pdf".to_string(),
            storage_url: "http://localhost:4000/files/documents/a1b2c3.pdf".to_string(),
            uploaded_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_document_response_from_document() {
        let doc = test_document();
        let doc_id = doc.id;
        let uploaded_at = doc.uploaded_at;

        let response = DocumentResponse::from(doc);

        assert_eq!(response.id, doc_id);
        assert_eq!(response.filename, "MSA.pdf");
        assert_eq!(
            response.url,
            "http://localhost:4000/files/documents/a1b2c3.pdf"
        );
        assert_eq!(response.content_type, "application/pdf");
        assert_eq!(response.file_size, 5 * 1024 * 1024);
        assert!(response.is_confidential);
        assert_eq!(response.tags, vec!["vendor", "msa"]);
        assert_eq!(response.uploaded_at, uploaded_at);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            DocumentMetadata::parse_tags("vendor, msa , , legal"),
            vec!["vendor", "msa", "legal"]
        );
        assert!(DocumentMetadata::parse_tags("").is_empty());
        assert!(DocumentMetadata::parse_tags(" , ,").is_empty());
    }
}
