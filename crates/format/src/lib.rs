//! # Context Format
//!
//! Renders context slices of the code graph as bounded-size text.
//!
//! ## Features
//!
//! - **Adapter registry**: `json`, `json-compact`, `markdown`, `markdown-compact`, `text`,
//!   `aiccl`, `aiccl-expand`
//! - **Budget-aware selection**: small token budgets switch to compact variants
//! - **Token budgeting**: least relevant components are dropped until the output fits
//! - **AICCL codec**: compressed, line-oriented context with a lossless expansion
//!
//! ## Example
//!
//! ```
//! use context_format::{AdapterRegistry, ContextData, ContextRequest};
//!
//! let registry = AdapterRegistry::default();
//! let request = ContextRequest::new("main").format("markdown").token_budget(500);
//!
//! // Small budgets get the compact variant unless `create` is used directly
//! assert_eq!(registry.select(&request.format, request.token_budget).unwrap().name(), "markdown-compact");
//! assert_eq!(registry.create("markdown").unwrap().name(), "markdown");
//!
//! let response = registry.render(&request, &ContextData::default()).unwrap();
//! assert_eq!(response.format, "markdown-compact");
//! ```

pub mod adapters;
pub mod aiccl;
mod budget;
mod config;
mod error;
mod registry;
mod request;

pub use adapters::{expand, FormatAdapter};
pub use budget::{estimate_tokens, truncate_code};
pub use config::FormatConfig;
pub use error::{FormatError, Result};
pub use registry::{AdapterFactory, AdapterRegistry};
pub use request::{
    ContextData, ContextOptions, ContextRequest, ContextResponse, Flow, Note, ResponseStats, Rule,
    ScoredComponent, Task,
};
