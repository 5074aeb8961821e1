//! Core data model for classification requests and responses.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ClassificationInput`] | Caller-supplied image plus submission options |
//! | [`SizingMode`] | Resize-to-service-dimensions vs. explicit format passthrough |
//! | [`PreparedInput`] | Fully resolved input ready to go on the wire |
//! | [`RequestEnvelope`] | One outbound write: deployment id + batched inputs |
//! | [`ResponseEnvelope`] | One inbound message: per-input results and/or a request-level error |
//! | [`Deployment`] | Read-only snapshot from the deployment listing call |
//!
//! ## Submodules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`input`] | Input model, formats, encodings, hash kinds |
//! | [`envelope`] | Wire envelopes and per-input results |

pub mod envelope;
pub mod input;

pub use envelope::{
    Classification, Deployment, InputResult, PreparedInput, RequestEnvelope, ResponseEnvelope,
};
pub use input::{ClassificationInput, HashKind, HashResult, ImageFormat, InputEncoding, SizingMode};
