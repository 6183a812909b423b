//! Mail Merge Server Library
//!
//! The server binary is in main.rs; this crate exposes the merge engine and
//! the HTTP router for tests and benchmarks.
//!
//! # Modules
//!
//! - `docx`: Word package access and the read-only document model
//! - `merge`: spreadsheet reading, substitution, sessions, preview, export
//! - `routes`: axum handlers for the `/mail-merge` endpoints

pub mod config;
pub mod docx;
pub mod error;
pub mod merge;
pub mod routes;
pub mod state;

#[cfg(test)]
mod testing;
