use clap::Args;
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::ParseError;
use crate::document::{Scalar, Value};

/// Options for mapping XML elements onto document objects.
#[derive(Debug, Clone, Args)]
pub struct XmlParserOptions {
    /// Prefix put in front of attribute names.
    #[arg(long = "xml-attr-prefix", default_value = "@")]
    pub attr_prefix: String,
    /// Field holding the text of elements that also have attributes or children.
    #[arg(long = "xml-text-key", default_value = "#text")]
    pub text_key: String,
}

impl Default for XmlParserOptions {
    fn default() -> Self {
        XmlParserOptions {
            attr_prefix: "@".to_string(),
            text_key: "#text".to_string(),
        }
    }
}

/// An element that has been opened but not closed yet.
struct Frame {
    name: String,
    fields: IndexMap<String, Value>,
    text: String,
}

/// Converts XML into a document of the form `{root_tag: element}`.
///
/// - an element without attributes and children becomes its text, or null
///   when it has none
/// - attributes become prefixed fields
/// - repeated child tags become a list in document order
/// - all values are strings
pub struct XmlParser {
    options: XmlParserOptions,
}

impl XmlParser {
    pub fn new(options: XmlParserOptions) -> Self {
        XmlParser { options }
    }

    pub fn parse(&self, input: &str) -> Result<Value, ParseError> {
        let mut reader = Reader::from_str(input);
        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<(String, Value)> = None;

        loop {
            let event = reader.read_event().map_err(|e| ParseError::Xml {
                position: reader.error_position() as u64,
                message: e.to_string(),
            })?;
            let position = reader.buffer_position() as u64;

            match event {
                Event::Eof => break,
                Event::Start(ref e) => {
                    let frame = self.open_frame(e, position)?;
                    stack.push(frame);
                }
                Event::Empty(ref e) => {
                    let frame = self.open_frame(e, position)?;
                    self.close_frame(frame, &mut stack, &mut root, position)?;
                }
                Event::End(_) => {
                    let frame = stack.pop().ok_or_else(|| ParseError::Xml {
                        position,
                        message: "unexpected closing tag".to_string(),
                    })?;
                    self.close_frame(frame, &mut stack, &mut root, position)?;
                }
                Event::Text(ref e) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::CData(ref e) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::GeneralRef(ref e) => {
                    if let Some(frame) = stack.last_mut() {
                        let resolved = e.resolve_char_ref().map_err(|err| ParseError::Xml {
                            position,
                            message: err.to_string(),
                        })?;
                        match resolved {
                            Some(c) => frame.text.push(c),
                            None => frame.text.push_str(&resolve_entity(&String::from_utf8_lossy(e))),
                        }
                    }
                }
                _ => (),
            }
        }

        if !stack.is_empty() {
            return Err(ParseError::Xml {
                position: reader.buffer_position() as u64,
                message: format!("unclosed element <{}>", stack[stack.len() - 1].name),
            });
        }
        match root {
            Some((name, value)) => {
                let mut document = IndexMap::new();
                document.insert(name, value);
                Ok(Value::Object(document))
            }
            None => Err(ParseError::Xml {
                position: 0,
                message: "document has no root element".to_string(),
            }),
        }
    }

    fn open_frame(&self, e: &BytesStart, position: u64) -> Result<Frame, ParseError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut fields = IndexMap::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| ParseError::Xml {
                position,
                message: err.to_string(),
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| ParseError::Xml {
                    position,
                    message: err.to_string(),
                })?
                .into_owned();
            fields.insert(
                format!("{}{}", self.options.attr_prefix, key),
                Value::Scalar(Scalar::String(value)),
            );
        }
        Ok(Frame {
            name,
            fields,
            text: String::new(),
        })
    }

    fn close_frame(
        &self,
        frame: Frame,
        stack: &mut [Frame],
        root: &mut Option<(String, Value)>,
        position: u64,
    ) -> Result<(), ParseError> {
        let name = frame.name.clone();
        let value = self.finish(frame);
        match stack.last_mut() {
            Some(parent) => {
                add_child(&mut parent.fields, name, value);
                Ok(())
            }
            None if root.is_none() => {
                *root = Some((name, value));
                Ok(())
            }
            None => Err(ParseError::Xml {
                position,
                message: format!("second root element <{}>", name),
            }),
        }
    }

    fn finish(&self, frame: Frame) -> Value {
        let text = frame.text.trim();
        if frame.fields.is_empty() {
            if text.is_empty() {
                return Value::null();
            }
            return Value::from(text);
        }
        let mut fields = frame.fields;
        if !text.is_empty() {
            fields.insert(self.options.text_key.clone(), Value::from(text));
        }
        Value::Object(fields)
    }
}

/// Adds a finished child element. A finished element is never a list, so an
/// existing list under the same name means the tag was already repeated.
fn add_child(fields: &mut IndexMap<String, Value>, name: String, value: Value) {
    match fields.get_mut(&name) {
        Some(Value::List(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::replace(existing, Value::List(Vec::new()));
            *existing = Value::List(vec![first, value]);
        }
        None => {
            fields.insert(name, value);
        }
    }
}

fn resolve_entity(name: &str) -> String {
    match quick_xml::escape::resolve_predefined_entity(name) {
        Some(resolved) => resolved.to_string(),
        None => format!("&{};", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Value {
        XmlParser::new(XmlParserOptions::default())
            .parse(input)
            .unwrap()
    }

    fn object(value: &Value) -> &IndexMap<String, Value> {
        value.as_object().unwrap()
    }

    #[test]
    fn test_simple_elements() {
        let value = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<TradbegrotingIbis>
    <bgr>
        <nme>Begroting 1</nme>
        <oms/>
    </bgr>
</TradbegrotingIbis>
"#,
        );
        let root = object(&value);
        let ibis = object(&root["TradbegrotingIbis"]);
        let bgr = object(&ibis["bgr"]);
        assert_eq!(bgr["nme"], Value::from("Begroting 1"));
        assert_eq!(bgr["oms"], Value::null());
    }

    #[test]
    fn test_repeated_elements_become_list() {
        let value = parse("<r><mst><id>1</id></mst><x>a</x><mst><id>2</id></mst></r>");
        let r = object(&object(&value)["r"]);
        let keys: Vec<&str> = r.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["mst", "x"]);
        match &r["mst"] {
            Value::List(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(object(&items[1])["id"], Value::from("2"));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_attributes_and_text() {
        let value = parse(r#"<r><v unit="m" n="2">4.5</v><w a="1"/></r>"#);
        let r = object(&object(&value)["r"]);
        let v = object(&r["v"]);
        let keys: Vec<&str> = v.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["@unit", "@n", "#text"]);
        assert_eq!(v["#text"], Value::from("4.5"));
        assert_eq!(object(&r["w"])["@a"], Value::from("1"));
    }

    #[test]
    fn test_custom_prefixes() {
        let parser = XmlParser::new(XmlParserOptions {
            attr_prefix: "".to_string(),
            text_key: "value".to_string(),
        });
        let value = parser.parse(r#"<r k="x">t</r>"#).unwrap();
        let r = object(&object(&value)["r"]);
        assert_eq!(r["k"], Value::from("x"));
        assert_eq!(r["value"], Value::from("t"));
    }

    #[test]
    fn test_entities_and_cdata() {
        let value = parse("<r><a>fish &amp; chips &#65;&#x42;</a><b><![CDATA[<raw>]]></b></r>");
        let r = object(&object(&value)["r"]);
        assert_eq!(r["a"], Value::from("fish & chips AB"));
        assert_eq!(r["b"], Value::from("<raw>"));
    }

    #[test]
    fn test_character_references() {
        let value = parse("<r><a>&#233;t&#xE9; &copy;</a></r>");
        let r = object(&object(&value)["r"]);
        assert_eq!(r["a"], Value::from("été &copy;"));

        let parser = XmlParser::new(XmlParserOptions::default());
        assert!(matches!(
            parser.parse("<r>&#xD800;</r>"),
            Err(ParseError::Xml { .. })
        ));
    }

    #[test]
    fn test_malformed_xml() {
        let parser = XmlParser::new(XmlParserOptions::default());
        assert!(matches!(parser.parse("<a><b></a>"), Err(ParseError::Xml { .. })));
        assert!(matches!(parser.parse("<a>"), Err(ParseError::Xml { .. })));
        assert!(matches!(parser.parse("   "), Err(ParseError::Xml { .. })));
    }
}
