//! Serializes a whole response tree as XML.
//!
//! Objects become elements named after their keys (sorted), arrays become
//! repeated `item` elements, and null or empty values become empty elements.

use crate::utils::error::{NuldcError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;

pub const ROOT_ELEMENT: &str = "results";
pub const LIST_ITEM_ELEMENT: &str = "item";

pub fn to_xml_bytes(response: &Value) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    write_element(&mut writer, ROOT_ELEMENT, response)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<()> {
    if is_empty(value) {
        writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(xml_error)?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)?;

    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                write_element(writer, &element_name(key), &map[key.as_str()])?;
            }
        }
        Value::Array(items) => {
            for item in items {
                write_element(writer, LIST_ITEM_ELEMENT, item)?;
            }
        }
        Value::String(s) => {
            writer
                .write_event(Event::Text(BytesText::new(s)))
                .map_err(xml_error)?;
        }
        scalar => {
            let text = scalar.to_string();
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(xml_error)?;
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)?;
    Ok(())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Turns an arbitrary key into a legal element name: characters outside
/// `[A-Za-z0-9_.-]` become `_`, and a name not starting with a letter or `_`
/// gets a `_` prefix.
pub fn element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok {
        name.insert(0, '_');
    }
    name
}

fn xml_error(e: impl std::fmt::Display) -> NuldcError {
    NuldcError::XmlError {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn xml(value: &Value) -> String {
        String::from_utf8(to_xml_bytes(value).unwrap()).unwrap()
    }

    #[test]
    fn test_lists_become_items_and_keys_are_sorted() {
        let response = json!({
            "pagination": {"next_url": "", "total_hits": 2},
            "hits": {"hits": [
                {"_source": {"title": "XML Title 1", "id": "xml1"}},
                {"_source": {"id": "xml2", "description": "DescD"}}
            ]}
        });

        let text = xml(&response);

        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        let hits = text.find("<hits>").unwrap();
        let pagination = text.find("<pagination>").unwrap();
        assert!(hits < pagination);
        assert_eq!(text.matches("<item>").count(), 2);
        let id = text.find("<id>xml1</id>").unwrap();
        let title = text.find("<title>XML Title 1</title>").unwrap();
        assert!(id < title);
        assert!(text.contains("<next_url/>"));
        assert!(text.contains("<total_hits>2</total_hits>"));
        assert!(text.trim_end().ends_with("</results>"));
    }

    #[test]
    fn test_empty_response_values() {
        let text = xml(&json!({"hits": {"hits": []}, "note": null}));
        assert!(text.contains("<hits/>"));
        assert!(text.contains("<note/>"));

        let text = xml(&json!({}));
        assert!(text.contains("<results/>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let text = xml(&json!({"title": "Fish & <Chips>"}));
        assert!(text.contains("<title>Fish &amp; &lt;Chips&gt;</title>"));
    }

    #[test]
    fn test_element_name_sanitizes_keys() {
        assert_eq!(element_name("title"), "title");
        assert_eq!(element_name("_source"), "_source");
        assert_eq!(element_name("@context"), "_context");
        assert_eq!(element_name("2nd"), "_2nd");
        assert_eq!(element_name("date created"), "date_created");
        assert_eq!(element_name(""), "_");
    }
}
