//! Vendor-coding normalization.
//!
//! Submissions arrive with HealthKit-flavoured codings. Before anything is
//! forwarded to the clinical stage, codings whose system is the vendor
//! identifier are replaced with their standard-terminology equivalents
//! (LOINC, IEEE 11073 MDC, SNOMED CT). Codings outside the map, and all
//! non-vendor codings, pass through untouched. Classification enum raw
//! strings are rewritten to human-readable labels.

use crate::observation::{CodeableConcept, Observation};

/// The vendor-specific coding system replaced during normalization.
pub const VENDOR_SYSTEM: &str = "http://developer.apple.com/documentation/healthkit";

/// A standard-terminology coding targeted by the normalization map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardCoding {
    /// Terminology system URI.
    pub system: &'static str,
    /// Code within the system.
    pub code: &'static str,
    /// Display text.
    pub display: &'static str,
}

/// Vendor code → standard coding. Covers the ECG study itself, its
/// impression, and the ECG metadata components.
const VENDOR_CODE_MAP: &[(&str, StandardCoding)] = &[
    (
        "HKElectrocardiogram",
        StandardCoding {
            system: "http://loinc.org",
            code: "11524-6",
            display: "EKG study",
        },
    ),
    (
        "HKElectrocardiogramClassification",
        StandardCoding {
            system: "http://loinc.org",
            code: "8601-7",
            display: "EKG impression",
        },
    ),
    (
        "HKElectrocardiogramVoltageMeasurementCount",
        StandardCoding {
            system: "urn:iso:std:iso:11073:10101",
            code: "131072",
            display: "MDC_ECG_ELEC_POTL",
        },
    ),
    (
        "HKElectrocardiogramSamplingFrequency",
        StandardCoding {
            system: "urn:iso:std:iso:11073:10101",
            code: "67862",
            display: "MDC_ATTR_SAMP_RATE",
        },
    ),
    (
        "HKElectrocardiogramSymptomsStatus",
        StandardCoding {
            system: "http://snomed.info/sct",
            code: "418799008",
            display: "Finding reported by subject or history provider",
        },
    ),
];

/// Classification enum raw string → human-readable label.
const CLASSIFICATION_LABELS: &[(&str, &str)] = &[
    ("HKElectrocardiogramClassificationSinusRhythm", "Sinus Rhythm"),
    (
        "HKElectrocardiogramClassificationAtrialFibrillation",
        "Atrial Fibrillation",
    ),
    (
        "HKElectrocardiogramClassificationInconclusiveLowHeartRate",
        "Inconclusive - Low Heart Rate",
    ),
    (
        "HKElectrocardiogramClassificationInconclusiveHighHeartRate",
        "Inconclusive - High Heart Rate",
    ),
    (
        "HKElectrocardiogramClassificationInconclusivePoorReading",
        "Inconclusive - Poor Reading",
    ),
    (
        "HKElectrocardiogramClassificationInconclusiveOther",
        "Inconclusive",
    ),
    (
        "HKElectrocardiogramClassificationUnrecognized",
        "Unrecognized",
    ),
];

/// Look up the standard replacement for a vendor code.
#[must_use]
pub fn lookup_vendor_coding(code: &str) -> Option<StandardCoding> {
    VENDOR_CODE_MAP
        .iter()
        .find(|(vendor, _)| *vendor == code)
        .map(|(_, standard)| *standard)
}

/// Map a classification enum raw string to its label, if known.
#[must_use]
pub fn classification_label(raw: &str) -> Option<&'static str> {
    CLASSIFICATION_LABELS
        .iter()
        .find(|(vendor, _)| *vendor == raw)
        .map(|(_, label)| *label)
}

/// Normalize one observation in place.
///
/// - vendor codings in `code`, `category` and component codes are replaced
///   from the compile-time map; unmapped vendor codings are preserved
///   verbatim
/// - classification enum raw strings in string-shaped values are replaced
///   with labels
/// - empty coding arrays become absent
pub fn normalize_observation(observation: &mut Observation) {
    if let Some(code) = observation.code.as_mut() {
        normalize_concept(code);
    }
    if let Some(categories) = observation.category.as_mut() {
        for category in categories.iter_mut() {
            normalize_concept(category);
        }
    }
    if let Some(components) = observation.component.as_mut() {
        for component in components.iter_mut() {
            if let Some(code) = component.code.as_mut() {
                normalize_concept(code);
            }
            if let Some(value) = component.value_string.as_mut() {
                if let Some(label) = classification_label(value) {
                    *value = label.to_string();
                }
            }
            if let Some(concept) = component.value_codeable_concept.as_mut() {
                normalize_classification_text(concept);
            }
        }
    }
    if let Some(value) = observation.value_string.as_mut() {
        if let Some(label) = classification_label(value) {
            *value = label.to_string();
        }
    }
    if let Some(concept) = observation.value_codeable_concept.as_mut() {
        normalize_classification_text(concept);
    }
}

fn normalize_concept(concept: &mut CodeableConcept) {
    match concept.coding.as_mut() {
        Some(codings) if codings.is_empty() => {
            concept.coding = None;
        }
        Some(codings) => {
            for coding in codings.iter_mut() {
                let is_vendor = coding.system.as_deref() == Some(VENDOR_SYSTEM);
                if !is_vendor {
                    continue;
                }
                let Some(standard) = coding.code.as_deref().and_then(lookup_vendor_coding) else {
                    continue;
                };
                coding.system = Some(standard.system.to_string());
                coding.code = Some(standard.code.to_string());
                coding.display = Some(standard.display.to_string());
            }
        }
        None => {}
    }
}

fn normalize_classification_text(concept: &mut CodeableConcept) {
    if let Some(text) = concept.text.as_mut() {
        if let Some(label) = classification_label(text) {
            *text = label.to_string();
        }
    }
    if let Some(codings) = concept.coding.as_mut() {
        for coding in codings.iter_mut() {
            if let Some(display) = coding.display.as_mut() {
                if let Some(label) = classification_label(display) {
                    *display = label.to_string();
                }
            }
        }
    }
}
