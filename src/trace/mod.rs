//! Field model, type classification and value encoding.
//!
//! # Module Organization
//!
//! - [`classify`]: Raw column type to representation type, encoder and comparability
//! - [`encode`]: Row values and their textual trace encodings
//! - [`models`]: Column metadata, fields and tables
//! - [`constants`]: Literals shared by the declarations and trace formats

pub mod classify;
pub mod constants;
pub mod encode;
pub mod models;

// Re-export commonly used types
pub use classify::{classify, try_classify, Classification, RepType};
pub use encode::{Encoder, Value};
pub use models::*;
