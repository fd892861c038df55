//! Transport layer between tenant-scoped requests and the knowledge-base backend.
//!
//! This crate serializes a [`tenrag_retrieval::RetrievalRequest`] to the
//! backend's JSON wire format, performs the call, and hands the raw response
//! to the normalizer. Timeouts and retries live here and nowhere else.
//!
//! # Providers
//! - **http**: JSON over HTTPS to the knowledge-base runtime API
//! - **mock**: in-memory corpus, optionally loaded from `mockCorpus`, used by
//!   tests and offline runs
//!
//! # Example
//! ```no_run
//! use tenrag_core::TransportConfig;
//! use tenrag_retrieval::RequestBuilder;
//! use tenrag_transport::{create_transport, run_query, QueryParams, RetrievalMode};
//!
//! # async fn example() -> tenrag_core::AppResult<()> {
//! let config = TransportConfig {
//!     endpoint: "http://localhost:8080".to_string(),
//!     knowledge_base_id: "KB1".to_string(),
//!     ..Default::default()
//! };
//! let transport = create_transport(&config)?;
//! let builder = RequestBuilder::default();
//! let params = QueryParams::new("acme", "refund policy");
//! let response = run_query(transport.as_ref(), &builder, params, &RetrievalMode::Retrieve).await?;
//! println!("{} chunks", response.chunks.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod pipeline;
pub mod providers;
pub mod wire;


// Re-export main types
pub use client::{RetrievalMode, RetrievalTransport};
pub use factory::create_transport;
pub use pipeline::{run_query, QueryParams};
pub use providers::{HttpTransport, MockTransport};
