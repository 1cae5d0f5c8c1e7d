//! Shared types for the vitalink services.
//!
//! Holds the strongly typed patient identifier that travels between the
//! identity authority, the gateway and the clinical emitter.

mod ids;

pub use ids::PatientId;
