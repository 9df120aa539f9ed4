//! Dotted field-path resolution over records of unknown shape.
//!
//! A path such as `subject.label` is walked one segment at a time. Mappings are
//! descended by key; sequences fan the descent out over every element, so
//! `subject.label` on a record whose `subject` is a list of objects yields the
//! list of labels. Anything else stops the walk and the path is unresolved.

use crate::domain::value::FieldValue;
use serde_json::Value;

/// Resolves `path` against `record`.
///
/// Missing keys are never errors: they resolve to [`FieldValue::Absent`]. When a
/// segment fans out over a sequence, the result stays a sequence as long as at
/// least one element resolved; elements that did not resolve are kept in place
/// as [`FieldValue::Null`].
pub fn resolve<'a>(path: &str, record: &'a Value) -> FieldValue<'a> {
    let mut current = FieldValue::from(record);
    for segment in path.split('.') {
        current = descend(current, segment);
        if current.is_absent() {
            break;
        }
    }
    current
}

fn descend<'a>(value: FieldValue<'a>, segment: &str) -> FieldValue<'a> {
    match value {
        FieldValue::Record(map) => FieldValue::from(map.get(segment)),
        FieldValue::Sequence(items) => {
            let resolved: Vec<FieldValue<'a>> =
                items.into_iter().map(|item| descend(item, segment)).collect();
            if resolved.iter().all(FieldValue::is_absent) {
                FieldValue::Absent
            } else {
                FieldValue::Sequence(
                    resolved
                        .into_iter()
                        .map(|item| if item.is_absent() { FieldValue::Null } else { item })
                        .collect(),
                )
            }
        }
        _ => FieldValue::Absent,
    }
}
