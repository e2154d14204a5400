//! Product catalogue retrieval.
//!
//! - `RagStore` / `SqliteRagStore`: embedded product records with cosine search
//! - `Retriever` / `VectorRetriever`: query text to ordered evidence
//! - `format_documents`: evidence to the prompt context block
//! - `CatalogueIngestor`: CSV catalogue loading

mod formatter;
mod ingest;
mod retriever;
mod sqlite;
mod store;

pub use formatter::{format_documents, NO_DOCUMENTS_SENTINEL};
pub use ingest::{read_catalogue, read_catalogue_from, CatalogueIngestor, IngestReport};
pub use retriever::{Retriever, VectorRetriever};
pub use sqlite::SqliteRagStore;
pub use store::{EvidenceItem, ProductMetadata, RagStore, ScoredEvidence};
