//! Renders retrieved evidence into the context block handed to prompts.

use super::store::EvidenceItem;

/// Context block used when retrieval found nothing.
pub const NO_DOCUMENTS_SENTINEL: &str = "No relevant documents found.";

const ENTRY_SEPARATOR: &str = "\n\n---\n\n";
const MISSING_FIELD: &str = "N/A";

/// One block per item, in input order.
pub fn format_documents(items: &[EvidenceItem]) -> String {
    if items.is_empty() {
        return NO_DOCUMENTS_SENTINEL.to_string();
    }

    items
        .iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

fn format_entry(item: &EvidenceItem) -> String {
    let meta = &item.metadata;
    format!(
        "Title: {}\nPrice: {}\nRating: {}\nReviews:\n{}",
        or_missing(&meta.title),
        or_missing(&meta.price),
        or_missing(&meta.rating),
        item.content.trim()
    )
}

fn or_missing(field: &Option<String>) -> &str {
    field
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(MISSING_FIELD)
}
