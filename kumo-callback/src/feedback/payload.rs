//! Decoding of KumoMTA feedback payloads.
//!
//! A feedback record looks like (simplified):
//!
//! ```json
//! {
//!   "type": "Bounce",
//!   "recipient": "user@example.com",
//!   "response": {
//!     "code": 551,
//!     "enhanced_code": { "class": 5, "subject": 4, "detail": 4 },
//!     "content": "MX didn't resolve to any hosts"
//!   }
//! }
//! ```
//!
//! Only the fields above are read; anything else KumoMTA sends is ignored.

use std::fmt;

use serde_json::{Map, Value};
use tracing::warn;

use super::value::{coerce_int, is_integer, present};
use super::FeedbackError;

/// A decoded webhook body: a JSON object, otherwise unvalidated.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackPayload(Value);

impl FeedbackPayload {
    /// The payload as a JSON value (always an object).
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// The top-level fields of the payload.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }
}

impl fmt::Display for FeedbackPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Value> for FeedbackPayload {
    type Error = FeedbackError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(_) => Ok(FeedbackPayload(value)),
            other => Err(FeedbackError::MalformedInput(format!(
                "expected a JSON object, found {}",
                json_type(&other)
            ))),
        }
    }
}

/// Parse a raw webhook body.
///
/// Fails with [`FeedbackError::MalformedInput`] if the body is not JSON or
/// does not decode to an object.
pub fn parse(raw: &[u8]) -> Result<FeedbackPayload, FeedbackError> {
    let value: Value =
        serde_json::from_slice(raw).map_err(|e| FeedbackError::MalformedInput(e.to_string()))?;

    FeedbackPayload::try_from(value)
}

/// Enhanced status code triple, as coerced from the payload.
///
/// Missing components stay `None` here and only default to 0 when
/// displayed, so an absent class never compares equal to anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnhancedCode {
    pub class: Option<i64>,
    pub subject: Option<i64>,
    pub detail: Option<i64>,
}

impl EnhancedCode {
    /// Read the triple from an `enhanced_code` value.
    ///
    /// A non-object value yields an all-`None` triple.
    pub fn from_value(value: &Value) -> Self {
        let component = |key: &str| present(value, key).and_then(coerce_int);

        EnhancedCode {
            class: component("class"),
            subject: component("subject"),
            detail: component("detail"),
        }
    }

    /// Permanent failures are the 5.x.x class.
    pub fn is_permanent(&self) -> bool {
        self.class == Some(5)
    }
}

impl fmt::Display for EnhancedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.class.unwrap_or(0),
            self.subject.unwrap_or(0),
            self.detail.unwrap_or(0)
        )
    }
}

/// Typed view over the fields of a payload that classification reads.
///
/// Built by [`FeedbackFields::decode`], which fails fast if a required
/// field is missing.
#[derive(Debug, Clone)]
pub struct FeedbackFields<'a> {
    /// `type`: the feedback event kind, not interpreted.
    pub kind: &'a Value,
    /// `recipient`: checked for emptiness and syntax only when actionable.
    pub recipient: &'a Value,
    /// `response.code`
    pub code: Option<&'a Value>,
    /// `response.content`
    pub content: Option<&'a Value>,
    /// `response.enhanced_code`
    pub enhanced_code: EnhancedCode,
}

impl<'a> FeedbackFields<'a> {
    /// Validate the required structure and extract the fields.
    pub fn decode(payload: &'a FeedbackPayload) -> Result<Self, FeedbackError> {
        let root = payload.as_value();

        let kind = present(root, "type").ok_or(FeedbackError::MissingField("type"))?;
        let recipient =
            present(root, "recipient").ok_or(FeedbackError::MissingField("recipient"))?;
        let response = present(root, "response")
            .ok_or(FeedbackError::MissingField("response.enhanced_code"))?;
        let enhanced = present(response, "enhanced_code")
            .ok_or(FeedbackError::MissingField("response.enhanced_code"))?;

        if let Some(raw_class) = present(enhanced, "class") {
            if !is_integer(raw_class) {
                warn!(
                    raw_class = %raw_class,
                    "enhanced_code_class_coerced"
                );
            }
        }

        Ok(FeedbackFields {
            kind,
            recipient,
            code: present(response, "code"),
            content: present(response, "content"),
            enhanced_code: EnhancedCode::from_value(enhanced),
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> FeedbackPayload {
        FeedbackPayload::try_from(value).unwrap()
    }

    #[test]
    fn test_parse_object() {
        let parsed = parse(br#"{"type":"Bounce","recipient":"a@b.c"}"#).unwrap();
        assert_eq!(parsed.fields().map(Map::len), Some(2));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse(b"not json").unwrap_err();
        assert!(matches!(err, FeedbackError::MalformedInput(_)));
    }

    #[test]
    fn test_parse_empty_body() {
        let err = parse(b"").unwrap_err();
        assert!(matches!(err, FeedbackError::MalformedInput(_)));
    }

    #[test]
    fn test_parse_non_object() {
        for body in ["[1,2,3]", "\"text\"", "42", "null", "true"] {
            let err = parse(body.as_bytes()).unwrap_err();
            assert!(
                matches!(err, FeedbackError::MalformedInput(_)),
                "body {} should be rejected",
                body
            );
        }
    }

    #[test]
    fn test_parse_non_object_message() {
        let err = parse(b"[]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed KumoMTA payload: expected a JSON object, found an array"
        );
    }

    #[test]
    fn test_enhanced_code_display_defaults() {
        let code = EnhancedCode {
            class: Some(5),
            subject: None,
            detail: None,
        };
        assert_eq!(code.to_string(), "5.0.0");
    }

    #[test]
    fn test_enhanced_code_from_non_object() {
        assert_eq!(EnhancedCode::from_value(&json!("5.1.1")), EnhancedCode::default());
        assert!(!EnhancedCode::default().is_permanent());
    }

    #[test]
    fn test_enhanced_code_coerces_strings() {
        let code = EnhancedCode::from_value(&json!({"class": "5", "subject": "1", "detail": 1}));
        assert_eq!(code.class, Some(5));
        assert_eq!(code.subject, Some(1));
        assert!(code.is_permanent());
    }

    #[test]
    fn test_decode_complete() {
        let p = payload(json!({
            "type": "Bounce",
            "recipient": "user@example.com",
            "response": {
                "code": 551,
                "content": "MX didn't resolve to any hosts",
                "enhanced_code": {"class": 5, "subject": 4, "detail": 4}
            }
        }));

        let fields = FeedbackFields::decode(&p).unwrap();

        assert_eq!(fields.kind, &json!("Bounce"));
        assert_eq!(fields.recipient, &json!("user@example.com"));
        assert_eq!(fields.code, Some(&json!(551)));
        assert_eq!(fields.content, Some(&json!("MX didn't resolve to any hosts")));
        assert_eq!(fields.enhanced_code.to_string(), "5.4.4");
    }

    #[test]
    fn test_decode_missing_type() {
        let p = payload(json!({
            "recipient": "user@example.com",
            "response": {"enhanced_code": {"class": 5}}
        }));
        let err = FeedbackFields::decode(&p).unwrap_err();
        assert!(matches!(err, FeedbackError::MissingField("type")));
    }

    #[test]
    fn test_decode_null_counts_as_missing() {
        let p = payload(json!({
            "type": null,
            "recipient": "user@example.com",
            "response": {"enhanced_code": {"class": 5}}
        }));
        let err = FeedbackFields::decode(&p).unwrap_err();
        assert!(matches!(err, FeedbackError::MissingField("type")));
    }

    #[test]
    fn test_decode_missing_response_levels() {
        let cases = [
            json!({"type": "Bounce", "recipient": "a@b.c"}),
            json!({"type": "Bounce", "recipient": "a@b.c", "response": {}}),
            json!({"type": "Bounce", "recipient": "a@b.c", "response": "550 nope"}),
            json!({"type": "Bounce", "recipient": "a@b.c", "response": {"enhanced_code": null}}),
        ];

        for case in cases {
            let p = payload(case.clone());
            let err = FeedbackFields::decode(&p).unwrap_err();
            assert!(
                matches!(err, FeedbackError::MissingField("response.enhanced_code")),
                "payload {} should be missing enhanced_code",
                case
            );
        }
    }
}
