//! Mail Merge Module
//!
//! Generates one Word document per spreadsheet row by substituting
//! `${column}` placeholders in a template, and keeps the results in an
//! in-memory session for preview and download.
//!
//! Flow:
//! 1. `tabular` reads the header and data rows of the first sheet
//! 2. `template` substitutes placeholders for each row (`orchestrator`)
//! 3. `store` keeps the documents under a fresh session id
//! 4. `preview` renders HTML fragments and registers embedded images
//! 5. `export` packs every document into one archive and ends the session

pub mod error;
pub mod export;
pub mod orchestrator;
pub mod preview;
pub mod service;
pub mod store;
pub mod tabular;
pub mod template;
pub mod types;

pub use error::{MergeError, Result};
pub use export::{build_archive, export_session};
pub use orchestrator::{merge, render_documents};
pub use preview::{render_previews, Preview};
pub use service::MergeService;
pub use store::SessionStore;
pub use tabular::read_rows;
pub use template::{substitute_placeholders, Template};
pub use types::*;
