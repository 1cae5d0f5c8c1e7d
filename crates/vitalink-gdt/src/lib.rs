//! GDT 2.1 ("Gerätedatentransfer" 02.10) exchange-file emission.
//!
//! A GDT document is a sequence of `LLLFFFFContent\r\n` lines in
//! ISO-8859-1, opened by a record-type line and a self-referential
//! record-length line. [`GdtDocument`] owns the byte-exact framing;
//! [`mapper`] fills a document from a FHIR observation.

mod document;
mod mapper;

pub use document::{GdtDocument, RECORD_TYPE_NEW_EXAM};
pub use mapper::{map_observation, MappedObservation};

/// Fields of the GDT record header and body used by this emitter.
pub mod fields {
    /// Record type.
    pub const RECORD_TYPE: &str = "8000";
    /// Record length (total document bytes).
    pub const RECORD_LENGTH: &str = "8100";
    /// Interface version.
    pub const VERSION: &str = "9218";
    /// Sender identifier.
    pub const SENDER_ID: &str = "9106";
    /// Receiver identifier.
    pub const RECEIVER_ID: &str = "9103";
    /// Character set.
    pub const CHARSET: &str = "9206";
    /// Patient number.
    pub const PATIENT_ID: &str = "3000";
    /// Patient family name.
    pub const FAMILY_NAME: &str = "3101";
    /// Patient given name.
    pub const GIVEN_NAME: &str = "3102";
    /// Examination date (DDMMYYYY).
    pub const EXAM_DATE: &str = "6200";
    /// Examination time (HHMMSS).
    pub const EXAM_TIME: &str = "6201";
    /// Free-form finding text.
    pub const FINDING: &str = "6228";
    /// Test identifier code.
    pub const TEST_CODE: &str = "8402";
    /// Test identifier (short, max 20 chars).
    pub const TEST_IDENT: &str = "8410";
    /// Test designation.
    pub const TEST_NAME: &str = "8411";
    /// Finding status.
    pub const STATUS: &str = "8418";
    /// Result value.
    pub const RESULT_VALUE: &str = "8420";
    /// Result unit.
    pub const RESULT_UNIT: &str = "8421";
    /// Normal range as text.
    pub const NORMAL_RANGE_TEXT: &str = "8430";
    /// Normal range lower bound.
    pub const NORMAL_RANGE_LOW: &str = "8431";
    /// Normal range upper bound.
    pub const NORMAL_RANGE_HIGH: &str = "8432";
    /// Result text (non-numeric values).
    pub const RESULT_TEXT: &str = "8460";
    /// Interpretation remark.
    pub const INTERPRETATION: &str = "8480";
    /// Heart rate.
    pub const HEART_RATE: &str = "8501";
    /// Finding remark (ECG impression).
    pub const IMPRESSION: &str = "8520";
}
