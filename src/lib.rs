//! # visionlink
//!
//! Async client library for remote image-classification services exposed over
//! a bidirectional streaming RPC protocol.
//!
//! ## Overview
//!
//! A [`VisionClient`] owns one long-lived duplex session to the service. The
//! caller submits images (optionally resized and hashed) for classification
//! and receives asynchronous per-image results as events; results may arrive
//! in any order and are correlated by id, never by arrival order. A separate
//! unary call lists the server-side processing contexts ("deployments").
//!
//! ## Key Features
//!
//! - **Streaming-first**: one duplex stream per session, multiplexing batched
//!   request envelopes and out-of-order responses
//! - **Liveness heartbeat**: keep-warm envelopes written at a fixed interval
//!   while the session is open
//! - **Backpressure-aware writes**: submissions suspend until the transport
//!   signals drained capacity, never queue unboundedly
//! - **Pluggable collaborators**: credential acquisition, payload preparation,
//!   and the transport binding are trait seams with production defaults
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use visionlink::{
//!     AuthConfig, ClassificationInput, ClientConfig, ClientEvent, VisionClientBuilder,
//! };
//!
//! #[tokio::main]
//! async fn main() -> visionlink::Result<()> {
//!     let config = ClientConfig::new(
//!         "classify.example.net:9040",
//!         "default-deployment",
//!         "acme",
//!         AuthConfig::Static { token: "secret".into() },
//!     );
//!     let client = VisionClientBuilder::new().config(config).build()?;
//!
//!     let _events = client.subscribe(|event| {
//!         if let ClientEvent::Data(envelope) = event {
//!             for result in &envelope.results {
//!                 println!("{}: {} labels", result.correlation_id, result.classifications.len());
//!             }
//!         }
//!     });
//!
//!     client.open().await?;
//!     let image = std::fs::read("cat.png")?;
//!     client.submit_one(ClassificationInput::resized(image)).await?;
//!     // ... await data events, then:
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Public facade, builder, and deployment listing |
//! | [`coordinator`] | Request preparation, batching, and envelope writes |
//! | [`transport`] | Duplex connector seam, TCP binding, session lifecycle |
//! | [`prepare`] | Image decoding, resizing, hashing, and compression |
//! | [`auth`] | Credential providers (static token, OAuth client credentials) |
//! | [`events`] | Typed event set and synchronous multicast dispatch |
//! | [`types`] | Envelope and input/result data model |

pub mod auth;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod events;
pub mod prepare;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{VisionClient, VisionClientBuilder};
pub use config::{AuthConfig, ClientConfig};
pub use coordinator::RequestCoordinator;
pub use events::{ClientEvent, EventBus, Subscription};
pub use transport::{ClientIdentity, SessionMetadata, TransportSession};
pub use types::{
    Classification, ClassificationInput, Deployment, HashKind, ImageFormat, InputEncoding,
    InputResult, PreparedInput, RequestEnvelope, ResponseEnvelope, SizingMode,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
