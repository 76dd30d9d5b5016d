//! Galaxy server collaborators for the upload engine.
//!
//! [`GalaxyClient`] talks to the REST API with an API key. [`TusTransport`]
//! and [`HistoryResolver`] adapt it to the engine's `Transport` and
//! `DestinationResolver` seams.

pub mod client;
pub mod resolver;
pub mod tus;

pub use client::{Error, GalaxyClient};
pub use resolver::HistoryResolver;
pub use tus::TusTransport;
