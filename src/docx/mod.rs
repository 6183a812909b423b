//! Word (`.docx`) document access
//!
//! - `package`: the ZIP container and its relationship parts
//! - `model`: read-only paragraph/run/picture view used for previews

pub mod error;
pub mod model;
pub mod package;

pub use error::{DocxError, Result};
pub use model::{Alignment, Paragraph, Picture, Run, WordDocument};
pub use package::{DocxPackage, Relationship};
