//! Clinical emitter HTTP surface.
//!
//! Renders normalized health observations into byte-exact GDT 2.1
//! exchange files and tracks per-subject delivery status.

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use error::ClinicalError;
pub use router::{clinical_router, ClinicalState};
