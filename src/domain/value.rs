use serde_json::{Map, Number, Value};

/// A value reached by walking a field path through a record.
///
/// `Absent` means the path did not resolve. `Null` is a present value with
/// nothing in it: either an explicit JSON `null` or a hole left in a fanned-out
/// sequence where that element had no such field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Absent,
    Null,
    Text(&'a str),
    Number(&'a Number),
    Bool(bool),
    Record(&'a Map<String, Value>),
    Sequence(Vec<FieldValue<'a>>),
}

impl<'a> FieldValue<'a> {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }
}

impl<'a> From<&'a Value> for FieldValue<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => FieldValue::Sequence(items.iter().map(FieldValue::from).collect()),
            Value::Object(map) => FieldValue::Record(map),
        }
    }
}

impl<'a> From<Option<&'a Value>> for FieldValue<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        value.map(FieldValue::from).unwrap_or(FieldValue::Absent)
    }
}
