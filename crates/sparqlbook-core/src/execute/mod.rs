//! Cell execution pipeline.
//!
//! # Architecture
//!
//! ```text
//! NotebookController
//!     │  (one tokio task per cell, started in document order)
//!     └── CellExecutor::execute_cell
//!             │
//!             ├── resolve_endpoint   (# [endpoint=...] directive, else ambient connection)
//!             ├── EndpointFactory    (fresh Endpoint per execution)
//!             ├── Endpoint::query / Endpoint::validate
//!             ├── ResponseKind::classify   (by content type)
//!             └── CellOutput → ExecutionHandle::replace_output + end
//! ```
//!
//! # Module Structure
//!
//! - `context` - Execution handle, execution record and cancellation
//! - `controller` - Batch execution and execution ordering
//! - `endpoint` - Endpoint capability and the HTTP implementation
//! - `executor` - The per-cell pipeline
//! - `namespaces` - PREFIX harvesting and URI rewriting
//! - `resolve` - Endpoint resolution
//! - `response` - Response classification

mod context;
mod controller;
mod endpoint;
mod executor;
mod namespaces;
mod resolve;
mod response;

pub use context::{AbortHandle, CellExecution, ExecutionHandle, ExecutionSummary};
pub use controller::{NotebookController, PendingExecution};
pub use endpoint::{Endpoint, EndpointFactory, EndpointResponse, HttpEndpoint, HttpEndpointFactory};
pub use executor::CellExecutor;
pub use namespaces::{Namespaces, rewrite_bindings};
pub use resolve::{EndpointSource, ResolvedEndpoint, endpoint_directive, resolve_endpoint};
pub use response::ResponseKind;
