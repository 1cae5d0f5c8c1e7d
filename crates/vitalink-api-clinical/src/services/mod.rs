//! Clinical emitter services.

mod converter;

pub use converter::{GdtEmitter, ProcessedObservation};
