//! Public client surface.
//!
//! Keep the public surface small and predictable: a facade composing the
//! session, the coordinator, and the event bus, plus a builder for wiring
//! collaborators. Implementation details live under `src/client/`.

pub mod builder;
pub mod facade;

pub use builder::VisionClientBuilder;
pub use facade::VisionClient;
