//! Merge orchestration
//!
//! Drives the spreadsheet reader and the template engine across all rows.
//! Each row parses its own copy of the template from the original bytes, so
//! rows are independent and rendered in parallel; results keep row order.

use rayon::prelude::*;

use super::error::{MergeError, Result};
use super::store::SessionStore;
use super::tabular::read_rows;
use super::template::Template;
use super::types::{GeneratedDocument, Row, SessionId};

/// Render one document per row, in row order
///
/// The first failing row aborts the whole batch.
pub fn render_documents(template: &[u8], rows: &[Row]) -> Result<Vec<GeneratedDocument>> {
    // Reject a broken template even when there are no rows to render
    Template::parse(template).map_err(MergeError::InvalidTemplate)?;

    rows.par_iter()
        .enumerate()
        .map(|(index, row)| {
            Template::parse(template)
                .and_then(|t| t.render(row))
                .map_err(|source| MergeError::RowFailed {
                    row: index + 1,
                    source,
                })
        })
        .collect()
}

/// Merge `template` with every row of `table` and store the result
///
/// Nothing is stored unless every row rendered.
pub fn merge(store: &SessionStore, template: &[u8], table: &[u8]) -> Result<SessionId> {
    let rows = read_rows(table)?;
    tracing::info!(rows = rows.len(), "Read data rows from spreadsheet");

    let documents = render_documents(template, &rows)?;
    tracing::info!(documents = documents.len(), "Generated merged documents");

    let session_id = SessionId::new();
    store.put(session_id, documents);

    Ok(session_id)
}
