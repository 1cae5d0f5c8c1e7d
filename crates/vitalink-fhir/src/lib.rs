//! FHIR R4 structural model for the observation pipeline.
//!
//! The model is deliberately structural, not validating: unknown fields
//! are preserved through `#[serde(flatten)]` maps so a decoded-then-encoded
//! observation keeps everything the client sent. Normalization rewrites
//! vendor codings in place and leaves the rest untouched.

mod bundle;
mod normalize;
mod observation;

pub use bundle::{Bundle, BundleEntry};
pub use normalize::{
    classification_label, lookup_vendor_coding, normalize_observation, StandardCoding,
    VENDOR_SYSTEM,
};
pub use observation::{
    CodeableConcept, Coding, Component, Observation, Period, Quantity, Range, Ratio, Reference,
    ReferenceRange,
};
