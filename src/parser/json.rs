use super::ParseError;
use crate::document::{Scalar, Value};

/// Parses JSON text, keeping object fields in document order.
#[derive(Debug, Default)]
pub struct JsonParser;

impl JsonParser {
    pub fn new() -> Self {
        JsonParser
    }

    pub fn parse(&self, input: &str) -> Result<Value, ParseError> {
        let value: serde_json::Value = serde_json::from_str(input)?;
        Ok(convert(value))
    }
}

fn convert(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Scalar(Scalar::Null),
        serde_json::Value::Bool(b) => Value::Scalar(Scalar::Bool(b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Scalar(Scalar::Integer(i)),
            None => Value::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
        },
        serde_json::Value::String(s) => Value::Scalar(Scalar::String(s)),
        serde_json::Value::Array(items) => Value::List(items.into_iter().map(convert).collect()),
        serde_json::Value::Object(fields) => {
            Value::Object(fields.into_iter().map(|(k, v)| (k, convert(v))).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_field_order() {
        let value = JsonParser::new()
            .parse(r#"{"zeta": 1, "alpha": 2.5, "mid": [true, null, "s"]}"#)
            .unwrap();
        let fields = value.as_object().unwrap();
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(fields["zeta"], Value::from(1i64));
        assert_eq!(fields["alpha"], Value::from(2.5));
        assert_eq!(
            fields["mid"],
            Value::List(vec![Value::from(true), Value::null(), Value::from("s")])
        );
    }

    #[test]
    fn test_parse_large_unsigned_as_float() {
        let value = JsonParser::new().parse(r#"{"n": 18446744073709551615}"#).unwrap();
        assert!(matches!(
            value.as_object().unwrap()["n"],
            Value::Scalar(Scalar::Float(_))
        ));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            JsonParser::new().parse("{\"a\": "),
            Err(ParseError::Json(_))
        ));
    }
}
