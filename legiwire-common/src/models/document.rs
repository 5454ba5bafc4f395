//! Documents registered with the document service

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Classification of a registered artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Version,
    Amendment,
    Summary,
    FiscalNote,
    CommitteeDocument,
    Other,
}

/// Document-service registration state for one artifact
///
/// `complete` documents have both a download id (registered binary) and a
/// document id (extracted text); `partial` documents have only a download
/// id. The sum type makes a partial document carrying a document id
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocServiceLink {
    Complete { download_id: i64, document_id: i64 },
    Partial { download_id: i64 },
}

impl DocServiceLink {
    /// Opaque handle for the registered binary
    pub fn download_id(&self) -> i64 {
        match self {
            DocServiceLink::Complete { download_id, .. } => *download_id,
            DocServiceLink::Partial { download_id } => *download_id,
        }
    }

    /// Opaque handle for the extracted text, when complete
    pub fn document_id(&self) -> Option<i64> {
        match self {
            DocServiceLink::Complete { document_id, .. } => Some(*document_id),
            DocServiceLink::Partial { .. } => None,
        }
    }
}

/// One artifact registered with the document service
///
/// `children` holds indices into the owning Bill's `documents[]`;
/// `alternate_representations` holds download ids of equivalent renderings
/// of the same logical artifact (e.g. HTML + PDF).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentServiceDocument {
    pub name: String,
    pub doc_type: DocumentType,
    pub document_service: DocServiceLink,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_representations: Vec<i64>,
}

impl DocumentServiceDocument {
    /// A complete document: binary registered and text extracted
    pub fn complete(
        name: impl Into<String>,
        doc_type: DocumentType,
        download_id: i64,
        document_id: i64,
    ) -> Self {
        Self {
            name: name.into(),
            doc_type,
            document_service: DocServiceLink::Complete {
                download_id,
                document_id,
            },
            children: Vec::new(),
            alternate_representations: Vec::new(),
        }
    }

    /// A partial document: binary registered, no extracted text
    pub fn partial(name: impl Into<String>, doc_type: DocumentType, download_id: i64) -> Self {
        Self {
            name: name.into(),
            doc_type,
            document_service: DocServiceLink::Partial { download_id },
            children: Vec::new(),
            alternate_representations: Vec::new(),
        }
    }

    pub fn download_id(&self) -> i64 {
        self.document_service.download_id()
    }

    pub fn document_id(&self) -> Option<i64> {
        self.document_service.document_id()
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.document_service, DocServiceLink::Complete { .. })
    }

    /// Record an equivalent rendering under the same logical name
    pub fn add_alternate_representation(&mut self, download_id: i64) {
        if !self.alternate_representations.contains(&download_id) {
            self.alternate_representations.push(download_id);
        }
    }

    /// Dedup key equality: same registered artifact
    ///
    /// Two complete documents are the same artifact when both
    /// `(download_id, document_id)` match; two partial documents when the
    /// `download_id` matches. Complete and partial never collide.
    pub fn same_artifact(&self, other: &DocumentServiceDocument) -> bool {
        match (&self.document_service, &other.document_service) {
            (
                DocServiceLink::Complete {
                    download_id: a,
                    document_id: b,
                },
                DocServiceLink::Complete {
                    download_id: c,
                    document_id: d,
                },
            ) => a == c && b == d,
            (
                DocServiceLink::Partial { download_id: a },
                DocServiceLink::Partial { download_id: b },
            ) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_has_no_document_id() {
        let doc = DocumentServiceDocument::partial("Audio", DocumentType::Other, 9);
        assert_eq!(doc.download_id(), 9);
        assert_eq!(doc.document_id(), None);
        assert!(!doc.is_complete());
    }

    #[test]
    fn test_same_artifact_rules() {
        let a = DocumentServiceDocument::complete("Intro", DocumentType::Version, 42, 7);
        let b = DocumentServiceDocument::complete("Intro copy", DocumentType::Version, 42, 7);
        let c = DocumentServiceDocument::complete("Other", DocumentType::Version, 42, 8);
        let p = DocumentServiceDocument::partial("Partial", DocumentType::Version, 42);

        assert!(a.same_artifact(&b));
        assert!(!a.same_artifact(&c));
        assert!(!a.same_artifact(&p));
        assert!(p.same_artifact(&p.clone()));
    }

    #[test]
    fn test_alternate_representations_dedup() {
        let mut doc = DocumentServiceDocument::complete("Intro", DocumentType::Version, 42, 7);
        doc.add_alternate_representation(50);
        doc.add_alternate_representation(50);
        doc.add_alternate_representation(51);
        assert_eq!(doc.alternate_representations, vec![50, 51]);
    }

    #[test]
    fn test_link_serde_tagging() {
        let doc = DocumentServiceDocument::complete("Intro", DocumentType::Version, 42, 7);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["document_service"]["type"], "complete");
        assert_eq!(json["document_service"]["download_id"], 42);
        assert_eq!(json["document_service"]["document_id"], 7);
        assert_eq!(json["doc_type"], "version");
    }
}
