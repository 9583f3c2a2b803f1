//! govrag - question answering over scraped government service records
//!
//! Short text records are embedded, indexed for nearest-neighbor search and
//! retrieved as context for an optional language-model answer. Embedding and
//! generation failures degrade to zero vectors and a fixed failure message;
//! only configuration problems are reported as errors.

pub mod answer;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod index;
pub mod pipeline;

pub use error::{GovragError, Result};
pub use pipeline::RetrievalPipeline;
