use serde::{Deserialize, Serialize};

/// Request body for `POST /predict`.
///
/// Built fresh from the form on every submission. Numeric fields carry
/// whatever the coercion produced: an unparsable `age` is `None` and an
/// unparsable float is `NaN`. Both serialize as JSON `null`, so bad input
/// reaches the service uncorrected.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest {
    pub age: Option<i64>,
    pub gender: String,
    pub bmi: f64,
    pub alcohol_consumption: String,
    pub smoking_status: String,
    pub hepatitis_b: u8,
    pub hepatitis_c: u8,
    pub liver_function_score: f64,
    pub alpha_fetoprotein_level: f64,
    pub cirrhosis_history: u8,
    pub family_history_cancer: u8,
    pub physical_activity_level: String,
    pub diabetes: u8,
}

/// Response body from a successful `POST /predict`.
///
/// Deserialization is the shape check: a body missing either field, or
/// carrying the wrong JSON type, is rejected instead of rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub risk_percentage: f64,
    pub clinical_message: String,
}

impl PredictionResponse {
    /// Parse and shape-check a response body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> PredictionRequest {
        PredictionRequest {
            age: Some(54),
            gender: "Male".to_string(),
            bmi: 27.5,
            alcohol_consumption: "Heavy".to_string(),
            smoking_status: "Former".to_string(),
            hepatitis_b: 1,
            hepatitis_c: 0,
            liver_function_score: 61.2,
            alpha_fetoprotein_level: 8.4,
            cirrhosis_history: 0,
            family_history_cancer: 1,
            physical_activity_level: "Low".to_string(),
            diabetes: 0,
        }
    }

    #[test]
    fn request_serializes_snake_case_fields_in_order() {
        let json = serde_json::to_string(&sample_request()).unwrap();
        assert!(json.starts_with(r#"{"age":54,"gender":"Male","bmi":27.5,"#));
        assert!(json.ends_with(r#""physical_activity_level":"Low","diabetes":0}"#));
        assert!(json.contains(r#""alpha_fetoprotein_level":8.4"#));
    }

    #[test]
    fn unparsable_numbers_serialize_as_null() {
        let mut request = sample_request();
        request.age = None;
        request.bmi = f64::NAN;
        let value = serde_json::to_value(&request).unwrap();
        assert!(value["age"].is_null());
        assert!(value["bmi"].is_null());
        assert_eq!(value["gender"], "Male");
    }

    #[test]
    fn response_accepts_integer_percentage() {
        let resp =
            PredictionResponse::from_json(r#"{"risk_percentage": 12, "clinical_message": "ok"}"#)
                .unwrap();
        assert_eq!(resp.risk_percentage, 12.0);
        assert_eq!(resp.clinical_message, "ok");
    }

    #[test]
    fn response_rejects_wrong_shape() {
        assert!(PredictionResponse::from_json(r#"{"risk_percentage": "high"}"#).is_err());
        assert!(PredictionResponse::from_json(r#"{"clinical_message": "x"}"#).is_err());
        assert!(PredictionResponse::from_json("<html>").is_err());
    }
}
