//! Collaborator clients
//!
//! Each collaborator is a trait (so jurisdiction adapters and tests can
//! substitute mocks) plus an HTTP implementation wired from
//! `ScraperConfig`.

pub mod doc_service;
pub mod fetch;
pub mod metadata;
pub mod publisher;

pub use doc_service::{
    DocServiceClient, DocServiceError, DownloadInfo, ExtractRequest, HttpDocServiceClient,
    RegisterS3Request, ScrapedDocument,
};
pub use fetch::{FetchClient, FetchError, FetchedContent, Fetcher};
pub use metadata::{HttpMetadataClient, MetadataClient, MetadataError, SessionRecord};
pub use publisher::{HttpPublisher, PublishError, Publisher};
