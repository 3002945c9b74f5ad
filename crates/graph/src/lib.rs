//! # Context Graph
//!
//! Merges per-file extractions into one component graph, resolves cross-file
//! placeholders, and assembles depth-bounded context slices around an entity.
//!
//! ## Features
//!
//! - **Deterministic merge** - components and relationships deduplicated by id
//! - **Phase-two resolution** - `Pending` import, call, heritage and reference targets
//!   rewritten to concrete components; external specifiers stay pending
//! - **Context assembly** - related components ranked by distance and edge kind
//!
//! ## Architecture
//!
//! ```text
//! FileExtraction[]
//!     │
//!     ├──> Graph Builder
//!     │      ├─ Dedupe components / relationships by id
//!     │      └─ Resolver: module specifiers, `spec#name`, heritage names, index tags
//!     │
//!     ├──> Code Graph (petgraph)
//!     │      ├─ Nodes: Components
//!     │      ├─ Edges: resolved Relationships
//!     │      └─ Unresolved: pending Relationships
//!     │
//!     └──> Context Assembler
//!            ├─ Breadth-first traversal in both directions up to `depth`
//!            ├─ Rank by relevance (distance, edge kind)
//!            └─ Return the slice with its internal edges
//! ```
//!
//! ## Example
//!
//! ```
//! use context_code_parser::ParserRegistry;
//! use context_graph::{merge_extractions, ContextAssembler};
//!
//! let registry = ParserRegistry::default();
//! let api = registry.parse_file("export function fetchAll() {}\n", "src/api.ts").unwrap();
//! let app = registry
//!     .parse_file("import { fetchAll } from './api';\nexport function main() { fetchAll(); }\n", "src/app.ts")
//!     .unwrap();
//!
//! let assembler = ContextAssembler::new(merge_extractions([api, app]).unwrap());
//! let context = assembler.assemble("main", 1).unwrap();
//! assert!(context.related.iter().any(|r| r.component.name == "fetchAll"));
//! ```

mod assembler;
mod builder;
mod error;
mod graph;
mod resolver;
mod types;

pub use assembler::{
    calculate_relevance, AssembledContext, ContextAssembler, RelatedComponent, MAX_DEPTH,
};
pub use builder::{merge_extractions, GraphBuilder};
pub use error::{GraphError, Result};
pub use types::{CodeGraph, GraphEdge, GraphNode, ResolutionStats};
