// Event input validation
//
// Every rule runs independently and all violations are reported together,
// one entry per field. Validation never fails with an error type of its own:
// the caller gets either validated `EventDetails` or the collected errors.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::EventDetails;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Object name reported in every field error
pub const EVENT_OBJECT_NAME: &str = "eventDto";

/// Error codes
pub mod codes {
    pub const NOT_EMPTY: &str = "NotEmpty";
    pub const NOT_NULL: &str = "NotNull";
    pub const MIN: &str = "Min";
    pub const WRONG_VALUE: &str = "wrongValue";
    pub const TYPE_MISMATCH: &str = "typeMismatch";
    pub const UNREADABLE: &str = "unreadable";
}

/// Raw event submission as received from clients.
/// All fields are optional so missing values surface as field errors
/// instead of deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    #[cfg_attr(feature = "openapi", schema(example = "Spring"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "REST API Development with Spring"))]
    pub description: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, example = "2026-11-23T14:21:00"))]
    #[serde(default, deserialize_with = "local_date_time::deserialize")]
    pub begin_enrollment_date_time: Option<NaiveDateTime>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, example = "2026-11-24T14:21:00"))]
    #[serde(default, deserialize_with = "local_date_time::deserialize")]
    pub close_enrollment_date_time: Option<NaiveDateTime>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, example = "2026-11-25T14:21:00"))]
    #[serde(default, deserialize_with = "local_date_time::deserialize")]
    pub begin_event_date_time: Option<NaiveDateTime>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, example = "2026-11-26T14:21:00"))]
    #[serde(default, deserialize_with = "local_date_time::deserialize")]
    pub end_event_date_time: Option<NaiveDateTime>,
    #[cfg_attr(feature = "openapi", schema(example = "Gangnam D2 Startup Factory"))]
    pub location: Option<String>,
    pub base_price: Option<i32>,
    pub max_price: Option<i32>,
    pub limit_of_enrollment: Option<i32>,
}

impl EventRequest {
    /// Bind a JSON document to a submission. A value of the wrong type is
    /// reported as a `typeMismatch` error on its field.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ValidationErrors> {
        serde_path_to_error::deserialize(value).map_err(|err| {
            let field = err.path().to_string();
            let message = err.inner().to_string();
            match value.get(&field) {
                Some(rejected) => {
                    let mut errors = ValidationErrors::new();
                    errors.reject(
                        EVENT_OBJECT_NAME,
                        &field,
                        codes::TYPE_MISMATCH,
                        format!("Failed to convert {field}: {message}"),
                        Some(match rejected {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        }),
                    );
                    errors
                }
                None => ValidationErrors::unreadable(message),
            }
        })
    }
}

/// `yyyy-MM-ddTHH:mm[:ss[.SSS]]` local date-times; seconds are optional
mod local_date_time {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer};

    const FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|raw| {
            parse(&raw).ok_or_else(|| {
                de::Error::custom(format!(
                    "'{raw}' is not a date-time of the form yyyy-MM-ddTHH:mm[:ss]"
                ))
            })
        })
        .transpose()
    }
}

/// A single rejected field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub object_name: String,
    pub field: String,
    pub code: String,
    pub default_message: String,
    pub rejected_value: Option<String>,
}

/// Collected field errors for one submission
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Error)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[error("{} invalid field(s)", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    /// A body that could not be read as an event at all (malformed JSON, not an object)
    pub fn unreadable(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.reject(
            EVENT_OBJECT_NAME,
            EVENT_OBJECT_NAME,
            codes::UNREADABLE,
            message,
            None,
        );
        errors
    }

    /// Record a rejection. A field that already has an error keeps the first one.
    pub fn reject(
        &mut self,
        object_name: &str,
        field: &str,
        code: &str,
        message: impl Into<String>,
        rejected_value: Option<String>,
    ) {
        if self.has_field(field) {
            return;
        }
        self.errors.push(FieldError {
            object_name: object_name.to_string(),
            field: field.to_string(),
            code: code.to_string(),
            default_message: message.into(),
            rejected_value,
        });
    }
}

/// Validator for event submissions
#[derive(Debug, Clone, Copy, Default)]
pub struct EventValidator;

impl EventValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, req: &EventRequest) -> Result<EventDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        check_not_empty(&mut errors, "name", req.name.as_deref());
        check_not_empty(&mut errors, "description", req.description.as_deref());
        check_not_null(&mut errors, "beginEnrollmentDateTime", req.begin_enrollment_date_time);
        check_not_null(&mut errors, "closeEnrollmentDateTime", req.close_enrollment_date_time);
        check_not_null(&mut errors, "beginEventDateTime", req.begin_event_date_time);
        check_not_null(&mut errors, "endEventDateTime", req.end_event_date_time);
        check_min_zero(&mut errors, "basePrice", req.base_price);
        check_min_zero(&mut errors, "maxPrice", req.max_price);
        check_min_zero(&mut errors, "limitOfEnrollment", req.limit_of_enrollment);

        check_prices(&mut errors, req);
        check_schedule(&mut errors, req);

        if !errors.is_empty() {
            tracing::debug!(count = errors.len(), "Event submission rejected");
            return Err(errors);
        }

        match into_details(req) {
            Some(details) => Ok(details),
            // every required field was checked above
            None => Err(errors),
        }
    }
}

fn check_not_empty(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if value.map_or(true, |v| v.trim().is_empty()) {
        errors.reject(
            EVENT_OBJECT_NAME,
            field,
            codes::NOT_EMPTY,
            "must not be empty",
            value.map(str::to_string),
        );
    }
}

fn check_not_null<T>(errors: &mut ValidationErrors, field: &str, value: Option<T>) {
    if value.is_none() {
        errors.reject(EVENT_OBJECT_NAME, field, codes::NOT_NULL, "must not be null", None);
    }
}

fn check_min_zero(errors: &mut ValidationErrors, field: &str, value: Option<i32>) {
    match value {
        None => errors.reject(EVENT_OBJECT_NAME, field, codes::NOT_NULL, "must not be null", None),
        Some(v) if v < 0 => errors.reject(
            EVENT_OBJECT_NAME,
            field,
            codes::MIN,
            "must be greater than or equal to 0",
            Some(v.to_string()),
        ),
        Some(_) => {}
    }
}

fn check_prices(errors: &mut ValidationErrors, req: &EventRequest) {
    if let (Some(base), Some(max)) = (req.base_price, req.max_price) {
        if base > max {
            errors.reject(
                EVENT_OBJECT_NAME,
                "basePrice",
                codes::WRONG_VALUE,
                "basePrice must not exceed maxPrice",
                Some(base.to_string()),
            );
            errors.reject(
                EVENT_OBJECT_NAME,
                "maxPrice",
                codes::WRONG_VALUE,
                "maxPrice must not be lower than basePrice",
                Some(max.to_string()),
            );
        }
    }
}

fn check_schedule(errors: &mut ValidationErrors, req: &EventRequest) {
    if let (Some(begin), Some(close)) = (
        req.begin_enrollment_date_time,
        req.close_enrollment_date_time,
    ) {
        if close <= begin {
            errors.reject(
                EVENT_OBJECT_NAME,
                "closeEnrollmentDateTime",
                codes::WRONG_VALUE,
                "closeEnrollmentDateTime must be after beginEnrollmentDateTime",
                Some(close.to_string()),
            );
        }
    }

    if let (Some(close), Some(begin_event)) =
        (req.close_enrollment_date_time, req.begin_event_date_time)
    {
        if close > begin_event {
            errors.reject(
                EVENT_OBJECT_NAME,
                "closeEnrollmentDateTime",
                codes::WRONG_VALUE,
                "enrollment must close before the event begins",
                Some(close.to_string()),
            );
        }
    }

    if let (Some(begin), Some(end)) = (req.begin_event_date_time, req.end_event_date_time) {
        if end <= begin {
            errors.reject(
                EVENT_OBJECT_NAME,
                "endEventDateTime",
                codes::WRONG_VALUE,
                "endEventDateTime must be after beginEventDateTime",
                Some(end.to_string()),
            );
        }
    }
}

fn into_details(req: &EventRequest) -> Option<EventDetails> {
    Some(EventDetails {
        name: req.name.clone()?,
        description: req.description.clone()?,
        begin_enrollment_date_time: req.begin_enrollment_date_time?,
        close_enrollment_date_time: req.close_enrollment_date_time?,
        begin_event_date_time: req.begin_event_date_time?,
        end_event_date_time: req.end_event_date_time?,
        location: req.location.clone(),
        base_price: req.base_price?,
        max_price: req.max_price?,
        limit_of_enrollment: req.limit_of_enrollment?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::at;

    fn valid_request() -> EventRequest {
        EventRequest {
            name: Some("Spring".to_string()),
            description: Some("REST API Development with Spring".to_string()),
            begin_enrollment_date_time: Some(at(20, 9)),
            close_enrollment_date_time: Some(at(21, 9)),
            begin_event_date_time: Some(at(22, 9)),
            end_event_date_time: Some(at(23, 9)),
            location: Some("Gangnam D2 Startup Factory".to_string()),
            base_price: Some(100),
            max_price: Some(200),
            limit_of_enrollment: Some(100),
        }
    }

    #[test]
    fn test_from_json_accepts_minutes_precision() {
        let req = EventRequest::from_json(&serde_json::json!({
            "name": "Spring",
            "beginEnrollmentDateTime": "2026-11-20T09:00",
            "closeEnrollmentDateTime": "2026-11-21T09:00:00.000",
            "basePrice": 100,
            "unknownField": true
        }))
        .unwrap();

        assert_eq!(req.begin_enrollment_date_time, Some(at(20, 9)));
        assert_eq!(req.close_enrollment_date_time, Some(at(21, 9)));
        assert_eq!(req.begin_event_date_time, None);
        assert_eq!(req.base_price, Some(100));
    }

    #[test]
    fn test_from_json_reports_type_mismatch_on_field() {
        let errors = EventRequest::from_json(&serde_json::json!({
            "name": "Spring",
            "basePrice": "abc"
        }))
        .unwrap_err();

        let error = errors.field("basePrice").unwrap();
        assert_eq!(error.code, codes::TYPE_MISMATCH);
        assert_eq!(error.object_name, EVENT_OBJECT_NAME);
        assert_eq!(error.rejected_value.as_deref(), Some("abc"));

        let errors = EventRequest::from_json(&serde_json::json!({
            "endEventDateTime": "next tuesday"
        }))
        .unwrap_err();
        assert_eq!(
            errors.field("endEventDateTime").unwrap().rejected_value.as_deref(),
            Some("next tuesday")
        );
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let errors = EventRequest::from_json(&serde_json::json!([1, 2])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors[0].code, codes::UNREADABLE);
    }

    #[test]
    fn test_valid_request_passes() {
        let details = EventValidator::new().validate(&valid_request()).unwrap();
        assert_eq!(details.name, "Spring");
        assert_eq!(details.base_price, 100);
        assert_eq!(details.location.as_deref(), Some("Gangnam D2 Startup Factory"));
    }

    #[test]
    fn test_empty_request_reports_every_required_field() {
        let errors = EventValidator::new()
            .validate(&EventRequest::default())
            .unwrap_err();

        for field in [
            "name",
            "description",
            "beginEnrollmentDateTime",
            "closeEnrollmentDateTime",
            "beginEventDateTime",
            "endEventDateTime",
            "basePrice",
            "maxPrice",
            "limitOfEnrollment",
        ] {
            assert!(errors.has_field(field), "missing error for {}", field);
        }
        assert!(!errors.has_field("location"));
        assert_eq!(errors.len(), 9);
    }

    #[test]
    fn test_close_enrollment_before_begin_enrollment() {
        let mut req = valid_request();
        req.close_enrollment_date_time = Some(at(19, 9));

        let errors = EventValidator::new().validate(&req).unwrap_err();
        let error = errors.field("closeEnrollmentDateTime").unwrap();
        assert_eq!(error.code, codes::WRONG_VALUE);
        assert_eq!(error.object_name, EVENT_OBJECT_NAME);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_enrollment_must_close_before_event_begins() {
        let mut req = valid_request();
        req.close_enrollment_date_time = Some(at(22, 12));

        let errors = EventValidator::new().validate(&req).unwrap_err();
        assert!(errors.has_field("closeEnrollmentDateTime"));
    }

    #[test]
    fn test_end_event_before_begin_event() {
        let mut req = valid_request();
        req.end_event_date_time = Some(at(22, 8));

        let errors = EventValidator::new().validate(&req).unwrap_err();
        assert!(errors.has_field("endEventDateTime"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_base_price_above_max_price() {
        let mut req = valid_request();
        req.base_price = Some(10_000);
        req.max_price = Some(200);

        let errors = EventValidator::new().validate(&req).unwrap_err();
        assert!(errors.has_field("basePrice"));
        assert!(errors.has_field("maxPrice"));
        assert_eq!(
            errors.field("basePrice").unwrap().rejected_value.as_deref(),
            Some("10000")
        );
    }

    #[test]
    fn test_negative_values_rejected_with_min_code() {
        let mut req = valid_request();
        req.limit_of_enrollment = Some(-1);

        let errors = EventValidator::new().validate(&req).unwrap_err();
        assert_eq!(errors.field("limitOfEnrollment").unwrap().code, codes::MIN);
    }

    #[test]
    fn test_independent_rules_all_surface() {
        let mut req = valid_request();
        req.name = Some("   ".to_string());
        req.close_enrollment_date_time = Some(at(19, 9));
        req.end_event_date_time = Some(at(21, 9));

        let errors = EventValidator::new().validate(&req).unwrap_err();
        assert!(errors.has_field("name"));
        assert!(errors.has_field("closeEnrollmentDateTime"));
        assert!(errors.has_field("endEventDateTime"));
    }

    #[test]
    fn test_one_error_per_field() {
        let mut req = valid_request();
        // closes before enrollment begins and after the event begins
        req.close_enrollment_date_time = Some(at(19, 9));
        req.begin_event_date_time = Some(at(18, 9));
        req.end_event_date_time = Some(at(23, 9));

        let errors = EventValidator::new().validate(&req).unwrap_err();
        let count = errors
            .errors
            .iter()
            .filter(|e| e.field == "closeEnrollmentDateTime")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_errors_serialize_camel_case() {
        let errors = EventValidator::new()
            .validate(&EventRequest::default())
            .unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();
        assert!(json["errors"][0].get("defaultMessage").is_some());
        assert!(json["errors"][0].get("objectName").is_some());
    }
}
