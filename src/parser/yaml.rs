use super::ParseError;
use crate::document::{Scalar, Value};
use indexmap::IndexMap;

/// Parses YAML text. Mapping order is preserved; non-string keys are
/// rendered to text and tags are dropped.
#[derive(Debug, Default)]
pub struct YamlParser;

impl YamlParser {
    pub fn new() -> Self {
        YamlParser
    }

    pub fn parse(&self, input: &str) -> Result<Value, ParseError> {
        let value: serde_yaml::Value = serde_yaml::from_str(input)?;
        convert(value)
    }
}

fn convert(value: serde_yaml::Value) -> Result<Value, ParseError> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Scalar(Scalar::Null),
        serde_yaml::Value::Bool(b) => Value::Scalar(Scalar::Bool(b)),
        serde_yaml::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Scalar(Scalar::Integer(i)),
            None => Value::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
        },
        serde_yaml::Value::String(s) => Value::Scalar(Scalar::String(s)),
        serde_yaml::Value::Sequence(items) => {
            Value::List(items.into_iter().map(convert).collect::<Result<_, _>>()?)
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut fields = IndexMap::new();
            for (key, value) in mapping {
                fields.insert(key_to_string(key)?, convert(value)?);
            }
            Value::Object(fields)
        }
        serde_yaml::Value::Tagged(tagged) => convert(tagged.value)?,
    })
}

fn key_to_string(key: serde_yaml::Value) -> Result<String, ParseError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Null => Ok("null".to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Tagged(tagged) => key_to_string(tagged.value),
        other => Err(ParseError::Unsupported(format!(
            "mapping key must be a scalar, found {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping_and_sequences() {
        let input = "\
name: A
count: 3
ratio: 0.5
children:
  - x
  - y
items:
  - id: 1
    tags: [p, q]
";
        let value = YamlParser::new().parse(input).unwrap();
        let fields = value.as_object().unwrap();
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "count", "ratio", "children", "items"]);
        assert_eq!(fields["count"], Value::from(3i64));
        assert_eq!(fields["ratio"], Value::from(0.5));
        assert_eq!(
            fields["children"],
            Value::List(vec![Value::from("x"), Value::from("y")])
        );
    }

    #[test]
    fn test_non_string_keys_and_tags() {
        let value = YamlParser::new().parse("1: one\ntrue: yes\nt: !custom 5\n").unwrap();
        let fields = value.as_object().unwrap();
        assert_eq!(fields["1"], Value::from("one"));
        assert_eq!(fields["true"], Value::from("yes"));
        assert_eq!(fields["t"], Value::from(5i64));
    }

    #[test]
    fn test_rejects_complex_keys() {
        assert!(matches!(
            YamlParser::new().parse("? [a, b]\n: value\n"),
            Err(ParseError::Unsupported(_))
        ));
    }
}
