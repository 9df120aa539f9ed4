//! Turns heterogeneous records into a rectangular table of strings.

use crate::core::normalizer::{normalize, normalize_value};
use crate::core::resolver::resolve;
use crate::domain::model::FlatTable;
use crate::domain::value::FieldValue;
use serde_json::Value;
use std::collections::BTreeSet;

/// Header and cell used when there is nothing to flatten.
pub const NO_RESULTS: &str = "no results";

/// Column that holds records which are not mappings.
pub const UNCLASSIFIED: &str = "unclassified value";

/// Locates the records of a response: `data[]` for flat pages, the `_source`
/// of every hit for hits-wrapped pages. `None` when neither slot holds a list.
pub fn records_of(response: &Value) -> Option<Vec<&Value>> {
    if let Some(Value::Array(data)) = response.get("data") {
        return Some(data.iter().collect());
    }

    match response.get("hits").and_then(|h| h.get("hits")) {
        Some(Value::Array(hits)) => Some(
            hits.iter()
                .map(|hit| hit.get("_source").unwrap_or(hit))
                .collect(),
        ),
        _ => None,
    }
}

/// Flattens the records carried by a whole response.
pub fn flatten_response(response: &Value, fields: Option<&[String]>) -> FlatTable {
    match records_of(response) {
        Some(records) => flatten(&records, fields),
        None => no_results(),
    }
}

/// Builds one row per record.
///
/// With explicit `fields`, the headers are exactly those fields and every cell
/// is the normalized value at that dotted path. Without them, the headers are
/// the sorted union of every record's top-level keys.
pub fn flatten(records: &[&Value], fields: Option<&[String]>) -> FlatTable {
    if records.is_empty() {
        return no_results();
    }

    match fields {
        Some(fields) => flatten_selected(records, fields),
        None => flatten_all(records),
    }
}

fn flatten_selected(records: &[&Value], fields: &[String]) -> FlatTable {
    let rows = records
        .iter()
        .map(|record| {
            fields
                .iter()
                .map(|field| {
                    if record.is_object() {
                        normalize(&resolve(field, record))
                    } else {
                        String::new()
                    }
                })
                .collect()
        })
        .collect();

    FlatTable {
        headers: fields.to_vec(),
        rows,
    }
}

fn flatten_all(records: &[&Value]) -> FlatTable {
    let mut header_set = BTreeSet::new();
    for record in records {
        match record.as_object() {
            Some(map) => header_set.extend(map.keys().cloned()),
            None => {
                header_set.insert(UNCLASSIFIED.to_string());
            }
        }
    }
    let headers: Vec<String> = header_set.into_iter().collect();

    let rows = records
        .iter()
        .map(|record| {
            headers
                .iter()
                .map(|header| match record.as_object() {
                    Some(map) => normalize_value(map.get(header)),
                    None if header == UNCLASSIFIED => normalize(&FieldValue::from(*record)),
                    None => String::new(),
                })
                .collect()
        })
        .collect();

    FlatTable { headers, rows }
}

fn no_results() -> FlatTable {
    FlatTable {
        headers: vec![NO_RESULTS.to_string()],
        rows: vec![vec![NO_RESULTS.to_string()]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_rectangular(table: &FlatTable) {
        for row in &table.rows {
            assert_eq!(row.len(), table.headers.len());
        }
    }

    #[test]
    fn test_flatten_uses_sorted_union_of_keys() {
        let a = json!({"id": "1", "title": "T1"});
        let b = json!({"id": "2", "subject": "S2"});
        let table = flatten(&[&a, &b], None);

        assert_eq!(table.headers, vec!["id", "subject", "title"]);
        assert_eq!(table.rows[0], vec!["1", "", "T1"]);
        assert_eq!(table.rows[1], vec!["2", "S2", ""]);
        assert_rectangular(&table);
    }

    #[test]
    fn test_flatten_empty_input_is_no_results() {
        let table = flatten(&[], None);
        assert_eq!(table.headers, vec![NO_RESULTS]);
        assert_eq!(table.rows, vec![vec![NO_RESULTS.to_string()]]);

        let fields = vec!["id".to_string()];
        let table = flatten(&[], Some(&fields));
        assert_eq!(table.headers, vec![NO_RESULTS]);
        assert_rectangular(&table);
    }

    #[test]
    fn test_flatten_selected_fields_resolve_paths() {
        let record = json!({
            "id": "1",
            "title": "1 title",
            "parent": {"child": "child value1", "label": "parent1 label"},
            "subject": [{"label": "A"}, {"label": "B"}]
        });
        let fields: Vec<String> = ["id", "parent.child", "subject.label", "missing"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let table = flatten(&[&record], Some(&fields));

        assert_eq!(table.headers, fields);
        assert_eq!(table.rows[0], vec!["1", "child value1", "A|B", ""]);
    }

    #[test]
    fn test_flatten_selected_fields_on_non_mapping_record_is_blank_row() {
        let odd = json!(["not", "a", "record"]);
        let fields = vec!["id".to_string(), "title".to_string()];
        let table = flatten(&[&odd], Some(&fields));
        assert_eq!(table.rows[0], vec!["", ""]);
    }

    #[test]
    fn test_flatten_all_collects_non_mappings_in_unclassified_column() {
        let record = json!({"id": "1", "list": ["1", "2", "3"]});
        let stray = json!("stray");
        let table = flatten(&[&record, &stray], None);

        assert_eq!(table.headers, vec!["id", "list", UNCLASSIFIED]);
        assert_eq!(table.rows[0], vec!["1", "1|2|3", ""]);
        assert_eq!(table.rows[1], vec!["", "", "stray"]);
        assert_rectangular(&table);
    }

    #[test]
    fn test_flatten_response_reads_hits_sources() {
        let response = json!({
            "hits": {"hits": [
                {"_source": {"id": "1", "title": "CSV Title 1", "author": "AuthA"}},
                {"_source": {"id": "2", "title": "CSV Title 2", "subject": "SubjB"}}
            ]}
        });
        let table = flatten_response(&response, None);
        assert_eq!(table.headers, vec!["author", "id", "subject", "title"]);
        assert_eq!(table.rows[1], vec!["", "2", "SubjB", "CSV Title 2"]);
    }

    #[test]
    fn test_flatten_response_without_record_list() {
        let table = flatten_response(&json!({"data": {"id": "work"}}), None);
        assert_eq!(table.headers, vec![NO_RESULTS]);

        let table = flatten_response(&json!({"hits": {"hits": []}}), None);
        assert_eq!(table.rows, vec![vec![NO_RESULTS.to_string()]]);
    }
}
