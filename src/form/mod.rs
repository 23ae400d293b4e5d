//! Clinical input form: field access and request building.
//!
//! The form is reached only through the [`FieldSource`] capability, so the
//! request builder runs the same way against the embedded web page, the CLI
//! flags, a snapshot file, or an in-memory fake in tests.
//!
//! Coercion follows the browser form the service was built for:
//!
//! | Kind      | Fields                                             | Coercion          |
//! |-----------|----------------------------------------------------|-------------------|
//! | integer   | `age`                                              | [`parse::parse_int`]   |
//! | float     | `bmi`, `liver_function_score`, `alpha_fetoprotein_level` | [`parse::parse_float`] |
//! | select    | `gender`, `alcohol_consumption`, `smoking_status`, `physical_activity_level` | raw string |
//! | checkbox  | `hepatitis_b`, `hepatitis_c`, `cirrhosis_history`, `family_history_cancer`, `diabetes` | 0/1 |
//!
//! No validation happens here. Unparsable numbers are forwarded as
//! not-a-number; only a field that does not exist at all stops the
//! submission.

pub mod parse;
pub mod snapshot;

use thiserror::Error;

use crate::predict::protocol::PredictionRequest;

pub use snapshot::FormSnapshot;

// ---------------------------------------------------------------------------
// Field identifiers
// ---------------------------------------------------------------------------

pub const AGE: &str = "age";
pub const GENDER: &str = "gender";
pub const BMI: &str = "bmi";
pub const ALCOHOL_CONSUMPTION: &str = "alcohol_consumption";
pub const SMOKING_STATUS: &str = "smoking_status";
pub const HEPATITIS_B: &str = "hepatitis_b";
pub const HEPATITIS_C: &str = "hepatitis_c";
pub const LIVER_FUNCTION_SCORE: &str = "liver_function_score";
pub const ALPHA_FETOPROTEIN_LEVEL: &str = "alpha_fetoprotein_level";
pub const CIRRHOSIS_HISTORY: &str = "cirrhosis_history";
pub const FAMILY_HISTORY_CANCER: &str = "family_history_cancer";
pub const PHYSICAL_ACTIVITY_LEVEL: &str = "physical_activity_level";
pub const DIABETES: &str = "diabetes";

/// Checkbox-style fields, coerced to 0/1.
pub const CHECKBOX_FIELDS: [&str; 5] = [
    HEPATITIS_B,
    HEPATITIS_C,
    CIRRHOSIS_HISTORY,
    FAMILY_HISTORY_CANCER,
    DIABETES,
];

/// Fields carrying a typed-in value (numeric text and selects).
pub const VALUE_FIELDS: [&str; 8] = [
    AGE,
    GENDER,
    BMI,
    ALCOHOL_CONSUMPTION,
    SMOKING_STATUS,
    LIVER_FUNCTION_SCORE,
    ALPHA_FETOPROTEIN_LEVEL,
    PHYSICAL_ACTIVITY_LEVEL,
];

/// Options offered for each select field. The service defines the real
/// vocabulary; these are the values its training data uses and are never
/// enforced on the client.
pub const SELECT_OPTIONS: [(&str, &[&str]); 4] = [
    (GENDER, &["Male", "Female"]),
    (ALCOHOL_CONSUMPTION, &["None", "Light", "Moderate", "Heavy"]),
    (SMOKING_STATUS, &["Never", "Former", "Current"]),
    (PHYSICAL_ACTIVITY_LEVEL, &["Low", "Moderate", "High"]),
];

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

/// Read access to the current state of a form.
pub trait FieldSource {
    /// Current value of the field, or `None` if the form has no such field.
    fn value(&self, id: &str) -> Option<String>;

    /// Checked state of a checkbox field, or `None` if the form has no such
    /// field or it is not checkable.
    fn checked(&self, id: &str) -> Option<bool>;
}

/// Errors raised while reading the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("form field not found: #{0}")]
    MissingElement(String),
}

/// Read a checkbox field as `1` (checked) or `0` (unchecked).
pub fn read_bool(source: &impl FieldSource, id: &str) -> Result<u8, FormError> {
    source
        .checked(id)
        .map(u8::from)
        .ok_or_else(|| FormError::MissingElement(id.to_string()))
}

fn read_value(source: &impl FieldSource, id: &str) -> Result<String, FormError> {
    source
        .value(id)
        .ok_or_else(|| FormError::MissingElement(id.to_string()))
}

/// Collect all thirteen fields into a [`PredictionRequest`].
///
/// Fails only when a field is absent from the source; the first missing
/// field in request order is reported.
pub fn build_request(source: &impl FieldSource) -> Result<PredictionRequest, FormError> {
    Ok(PredictionRequest {
        age: parse::parse_int(&read_value(source, AGE)?),
        gender: read_value(source, GENDER)?,
        bmi: parse::parse_float(&read_value(source, BMI)?),
        alcohol_consumption: read_value(source, ALCOHOL_CONSUMPTION)?,
        smoking_status: read_value(source, SMOKING_STATUS)?,
        hepatitis_b: read_bool(source, HEPATITIS_B)?,
        hepatitis_c: read_bool(source, HEPATITIS_C)?,
        liver_function_score: parse::parse_float(&read_value(source, LIVER_FUNCTION_SCORE)?),
        alpha_fetoprotein_level: parse::parse_float(&read_value(
            source,
            ALPHA_FETOPROTEIN_LEVEL,
        )?),
        cirrhosis_history: read_bool(source, CIRRHOSIS_HISTORY)?,
        family_history_cancer: read_bool(source, FAMILY_HISTORY_CANCER)?,
        physical_activity_level: read_value(source, PHYSICAL_ACTIVITY_LEVEL)?,
        diabetes: read_bool(source, DIABETES)?,
    })
}
