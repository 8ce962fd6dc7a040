//! # Arkhe Runtime
//!
//! Drives an `arkhe-core` population through discrete ticks: mean-field
//! coupling, parallel node updates, metamorphosis bookkeeping and
//! population-level mode control.

pub mod federation;
pub mod observer;
pub mod signal;
pub mod telemetry;

pub use federation::{Federation, FederationError, TickReport, FEDERATION_SUBJECT};
pub use observer::{TickObserver, TracingObserver};
pub use signal::{ConstantEntropy, EntropySource, UniformEntropy};
pub use telemetry::init_tracing;
