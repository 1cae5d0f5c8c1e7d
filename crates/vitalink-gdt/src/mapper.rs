//! FHIR Observation → GDT field mapping.

use crate::document::GdtDocument;
use crate::fields;
use vitalink_fhir::{CodeableConcept, Component, Observation};

/// LOINC codes identifying a heart-rate component.
const HEART_RATE_CODES: &[&str] = &["8867-4", "76282-3"];

/// Codes identifying an ECG impression / classification.
const IMPRESSION_CODES: &[&str] = &["8601-7", "HKElectrocardiogramClassification"];

/// Interpretation code → German label.
const GERMAN_INTERPRETATION: &[(&str, &str)] = &[
    ("N", "Normal"),
    ("A", "Abnormal"),
    ("AA", "Stark abnormal"),
    ("H", "Erhöht"),
    ("HH", "Stark erhöht"),
    ("L", "Erniedrigt"),
    ("LL", "Stark erniedrigt"),
    ("POS", "Positiv"),
    ("NEG", "Negativ"),
];

/// Outcome of mapping a single observation into a document.
#[derive(Debug, Default)]
pub struct MappedObservation {
    /// Non-fatal notes collected during mapping (missing subject, missing
    /// effective time, unparseable values).
    pub warnings: Vec<String>,
}

/// Map one observation's fields into `doc` following the GDT 2.1 layout.
///
/// Fields are appended in a fixed order: subject, examination date/time,
/// test identification, status, value, reference range, interpretation,
/// then components.
pub fn map_observation(observation: &Observation, doc: &mut GdtDocument) -> MappedObservation {
    let mut mapped = MappedObservation::default();

    map_subject(observation, doc, &mut mapped);
    map_effective(observation, doc, &mut mapped);
    map_code(observation, doc);

    if let Some(status) = observation.status.as_deref() {
        doc.add_field(fields::STATUS, status);
    }

    map_value(observation, doc);
    map_reference_range(observation, doc);
    map_interpretation(observation, doc);
    map_components(observation, doc, &mut mapped);

    mapped
}

fn map_subject(observation: &Observation, doc: &mut GdtDocument, mapped: &mut MappedObservation) {
    let Some(subject) = observation.subject.as_ref() else {
        mapped.warnings.push("observation has no subject".to_string());
        return;
    };

    if let Some(reference) = subject.reference.as_deref() {
        let id = reference.rsplit('/').next().unwrap_or(reference);
        doc.add_field(fields::PATIENT_ID, id);
    }

    // Display is rendered "family, given".
    if let Some(display) = subject.display.as_deref() {
        match display.split_once(',') {
            Some((family, given)) => {
                doc.add_field(fields::FAMILY_NAME, family.trim());
                doc.add_field(fields::GIVEN_NAME, given.trim());
            }
            None => doc.add_field(fields::FAMILY_NAME, display.trim()),
        }
    }
}

fn map_effective(observation: &Observation, doc: &mut GdtDocument, mapped: &mut MappedObservation) {
    let Some(timestamp) = observation.effective_timestamp() else {
        mapped
            .warnings
            .push("observation has no effective time".to_string());
        return;
    };

    // The wall-clock time as sent by the client is what lands in the
    // practice file, offsets are not re-based.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(timestamp) {
        doc.add_field(fields::EXAM_DATE, dt.format("%d%m%Y").to_string());
        doc.add_field(fields::EXAM_TIME, dt.format("%H%M%S").to_string());
    } else if let Ok(date) = chrono::NaiveDate::parse_from_str(timestamp, "%Y-%m-%d") {
        doc.add_field(fields::EXAM_DATE, date.format("%d%m%Y").to_string());
    } else {
        mapped
            .warnings
            .push(format!("unparseable effective time '{timestamp}'"));
    }
}

fn map_code(observation: &Observation, doc: &mut GdtDocument) {
    let Some(code) = observation.code.as_ref() else {
        return;
    };

    if let Some(coding) = code.first_coding() {
        if let Some(value) = coding.code.as_deref() {
            doc.add_field(fields::TEST_CODE, value);
        }
        if let Some(display) = coding.display.as_deref() {
            let short: String = display.chars().take(20).collect();
            doc.add_field(fields::TEST_IDENT, short);
            doc.add_field(fields::TEST_NAME, display);
        } else if let Some(text) = code.text.as_deref() {
            doc.add_field(fields::TEST_NAME, text);
        }
    } else if let Some(text) = code.text.as_deref() {
        doc.add_field(fields::TEST_NAME, text);
    }
}

fn map_value(observation: &Observation, doc: &mut GdtDocument) {
    if let Some(quantity) = observation.value_quantity.as_ref() {
        if let Some(value) = quantity.value {
            doc.add_field(fields::RESULT_VALUE, format_decimal(value));
        }
        if let Some(unit) = quantity.unit.as_deref().or(quantity.code.as_deref()) {
            doc.add_field(fields::RESULT_UNIT, unit);
        }
        return;
    }

    let text = non_numeric_value_text(observation);
    if let Some(text) = text {
        if is_impression(observation.code.as_ref()) {
            doc.add_field(fields::IMPRESSION, text);
        } else {
            doc.add_field(fields::RESULT_TEXT, text);
        }
    }
}

/// Render the non-quantity value kinds into their 8460 text form.
fn non_numeric_value_text(observation: &Observation) -> Option<String> {
    if let Some(s) = observation.value_string.as_deref() {
        return Some(s.to_string());
    }
    if let Some(concept) = observation.value_codeable_concept.as_ref() {
        if let Some(text) = concept.text.as_deref() {
            return Some(text.to_string());
        }
        if let Some(display) = concept.first_coding().and_then(|c| c.display.as_deref()) {
            return Some(display.to_string());
        }
    }
    if let Some(b) = observation.value_boolean {
        return Some(if b { "Positiv" } else { "Negativ" }.to_string());
    }
    if let Some(i) = observation.value_integer {
        return Some(i.to_string());
    }
    if let Some(range) = observation.value_range.as_ref() {
        let low = range.low.as_ref().and_then(|q| q.value);
        let high = range.high.as_ref().and_then(|q| q.value);
        return match (low, high) {
            (Some(l), Some(h)) => Some(format!("{} - {}", format_decimal(l), format_decimal(h))),
            (Some(l), None) => Some(format_decimal(l)),
            (None, Some(h)) => Some(format_decimal(h)),
            (None, None) => None,
        };
    }
    if let Some(ratio) = observation.value_ratio.as_ref() {
        let numerator = ratio.numerator.as_ref().and_then(|q| q.value);
        let denominator = ratio.denominator.as_ref().and_then(|q| q.value);
        if let (Some(n), Some(d)) = (numerator, denominator) {
            return Some(format!("{} : {}", format_decimal(n), format_decimal(d)));
        }
        return None;
    }
    if let Some(period) = observation.value_period.as_ref() {
        return match (period.start.as_deref(), period.end.as_deref()) {
            (Some(s), Some(e)) => Some(format!("{s} - {e}")),
            (Some(s), None) => Some(s.to_string()),
            (None, Some(e)) => Some(e.to_string()),
            (None, None) => None,
        };
    }
    None
}

fn map_reference_range(observation: &Observation, doc: &mut GdtDocument) {
    let Some(range) = observation
        .reference_range
        .as_ref()
        .and_then(|r| r.first())
    else {
        return;
    };

    let low = range.low.as_ref().and_then(|q| q.value);
    let high = range.high.as_ref().and_then(|q| q.value);

    match (low, high) {
        (Some(l), Some(h)) => doc.add_field(
            fields::NORMAL_RANGE_TEXT,
            format!("{} - {}", format_decimal(l), format_decimal(h)),
        ),
        (Some(l), None) => doc.add_field(fields::NORMAL_RANGE_TEXT, format_decimal(l)),
        (None, Some(h)) => doc.add_field(fields::NORMAL_RANGE_TEXT, format_decimal(h)),
        (None, None) => {}
    }
    if let Some(l) = low {
        doc.add_field(fields::NORMAL_RANGE_LOW, format_decimal(l));
    }
    if let Some(h) = high {
        doc.add_field(fields::NORMAL_RANGE_HIGH, format_decimal(h));
    }
}

fn map_interpretation(observation: &Observation, doc: &mut GdtDocument) {
    let Some(interpretation) = observation
        .interpretation
        .as_ref()
        .and_then(|i| i.first())
    else {
        return;
    };

    let raw = interpretation
        .text
        .as_deref()
        .or_else(|| {
            interpretation
                .first_coding()
                .and_then(|c| c.code.as_deref())
        })
        .unwrap_or_default();
    if raw.is_empty() {
        return;
    }

    let label = GERMAN_INTERPRETATION
        .iter()
        .find(|(code, _)| *code == raw)
        .map_or(raw, |(_, label)| *label);
    doc.add_field(fields::INTERPRETATION, label);
}

fn map_components(
    observation: &Observation,
    doc: &mut GdtDocument,
    mapped: &mut MappedObservation,
) {
    let Some(components) = observation.component.as_ref() else {
        return;
    };

    for component in components {
        if concept_has_code(component.code.as_ref(), HEART_RATE_CODES) {
            if let Some(value) = component.value_quantity.as_ref().and_then(|q| q.value) {
                doc.add_field(fields::HEART_RATE, format_decimal(value));
            } else {
                mapped
                    .warnings
                    .push("heart rate component has no numeric value".to_string());
            }
        } else if concept_has_code(component.code.as_ref(), IMPRESSION_CODES) {
            if let Some(text) = component_value_text(component) {
                doc.add_field(fields::IMPRESSION, text);
            }
        } else if let Some(text) = component_value_text(component) {
            let label = component_label(component.code.as_ref());
            doc.add_field(fields::FINDING, format!("{label}: {text}"));
        }
    }
}

fn component_value_text(component: &Component) -> Option<String> {
    if let Some(quantity) = component.value_quantity.as_ref() {
        let value = quantity.value.map(format_decimal)?;
        return Some(match quantity.unit.as_deref().or(quantity.code.as_deref()) {
            Some(unit) => format!("{value} {unit}"),
            None => value,
        });
    }
    if let Some(s) = component.value_string.as_deref() {
        return Some(s.to_string());
    }
    component
        .value_codeable_concept
        .as_ref()
        .and_then(|c| c.text.clone())
}

fn component_label(code: Option<&CodeableConcept>) -> String {
    code.and_then(|c| {
        c.first_coding()
            .and_then(|coding| coding.display.clone().or_else(|| coding.code.clone()))
            .or_else(|| c.text.clone())
    })
    .unwrap_or_else(|| "Messwert".to_string())
}

fn concept_has_code(concept: Option<&CodeableConcept>, codes: &[&str]) -> bool {
    concept
        .and_then(|c| c.coding.as_ref())
        .is_some_and(|codings| {
            codings
                .iter()
                .any(|c| c.code.as_deref().is_some_and(|code| codes.contains(&code)))
        })
}

fn is_impression(code: Option<&CodeableConcept>) -> bool {
    concept_has_code(code, IMPRESSION_CODES)
}

/// Fixed-point rendering: integers print without a fraction, everything
/// else prints as the shortest representation.
fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
