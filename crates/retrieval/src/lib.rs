//! Tenant-scoped retrieval requests and response normalization.
//!
//! Two pure operations sit on either side of a call to a shared retrieval
//! backend:
//! - [`RequestBuilder::build`] turns a tenant id and a query into a
//!   [`RetrievalRequest`] whose filter always pins the tenant.
//! - [`normalize`] turns the backend's raw JSON into a [`NormalizedResponse`].
//!
//! # Example
//! ```
//! use tenrag_core::RetrievalConfig;
//! use tenrag_retrieval::{normalize, RequestBuilder};
//!
//! let builder = RequestBuilder::new(RetrievalConfig::default()).unwrap();
//! let request = builder.build("acme", "refund policy", None, None).unwrap();
//! assert_eq!(request.result_count(), 5);
//!
//! let raw = serde_json::json!({
//!     "retrievalResults": [{ "content": { "text": "30 days" } }]
//! });
//! let response = normalize(&raw).unwrap();
//! assert_eq!(response.chunks.len(), 1);
//! assert!(response.generated_text.is_none());
//! ```

pub mod builder;
pub mod filter;
pub mod normalize;
pub mod types;

pub use builder::RequestBuilder;
pub use filter::{ListPredicate, MetadataValue, Predicate, RetrievalFilter};
pub use normalize::{normalize, normalize_str};
pub use types::{NormalizedResponse, RetrievalRequest, RetrievedChunk, TenantId};
