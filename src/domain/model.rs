use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Response shape requested with the `as` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Flat, cursor-paginated JSON.
    #[default]
    Opensearch,
    /// IIIF collection manifests, paginated by a trailing `Collection` item.
    Iiif,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Opensearch => "opensearch",
            ResponseFormat::Iiif => "iiif",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opensearch" => Ok(ResponseFormat::Opensearch),
            "iiif" => Ok(ResponseFormat::Iiif),
            other => Err(format!(
                "unsupported format '{}', expected opensearch or iiif",
                other
            )),
        }
    }
}

/// File format written by an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Xml,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Xml => "xml",
            OutputFormat::Json => "json",
        }
    }
}

/// Raw answer from the transport: status plus decoded JSON body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub url: String,
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_hits: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Pagination {
    /// Pointer to the following page; an empty string terminates the chain.
    pub fn next(&self) -> Option<&str> {
        self.next_url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn query_url(&self) -> Option<&str> {
        self.extra.get("query_url").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub hits: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which slot of a [`ResultSet`] carries the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSlot {
    /// `data[]`
    Data,
    /// `hits.hits[]`, each record under `_source`
    Hits,
}

/// One page (or an aggregate of pages) of a flat search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits: Option<Hits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResultSet {
    pub fn slot(&self) -> Option<RecordSlot> {
        if self.data.is_some() {
            Some(RecordSlot::Data)
        } else if self.hits.is_some() {
            Some(RecordSlot::Hits)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        match self.slot() {
            Some(RecordSlot::Data) => self.data.as_ref().map_or(0, Vec::len),
            Some(RecordSlot::Hits) => self.hits.as_ref().map_or(0, |h| h.hits.len()),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn next_url(&self) -> Option<&str> {
        self.pagination.as_ref().and_then(Pagination::next)
    }

    pub fn total_hits(&self) -> Option<u64> {
        self.pagination.as_ref().and_then(|p| p.total_hits)
    }

    pub fn total_pages(&self) -> Option<u64> {
        self.pagination.as_ref().and_then(|p| p.total_pages)
    }

    pub fn set_next_url(&mut self, next_url: impl Into<String>) {
        self.pagination.get_or_insert_with(Pagination::default).next_url = Some(next_url.into());
    }

    /// Moves the records of `page` into the slot this result set uses.
    ///
    /// Returns the number of records appended, or `None` when `page` does not
    /// carry records in the same slot.
    pub fn append_page(&mut self, page: ResultSet) -> Option<usize> {
        match self.slot()? {
            RecordSlot::Data => {
                let incoming = page.data?;
                let count = incoming.len();
                self.data.get_or_insert_with(Vec::new).extend(incoming);
                Some(count)
            }
            RecordSlot::Hits => {
                let incoming = page.hits?.hits;
                let count = incoming.len();
                self.hits.get_or_insert_with(Hits::default).hits.extend(incoming);
                Some(count)
            }
        }
    }
}

/// Node inside a IIIF `items` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestItem {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManifestItem {
    /// A `Collection` node points at the next page of results.
    pub fn is_continuation(&self) -> bool {
        self.kind.as_deref() == Some("Collection")
    }
}

/// IIIF collection page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub items: Vec<ManifestItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Page totals obtained from a count request, for formats that do not report them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTotals {
    pub total_pages: Option<u64>,
    pub total_hits: Option<u64>,
}

impl From<&ResultSet> for PageTotals {
    fn from(page: &ResultSet) -> Self {
        Self {
            total_pages: page.total_pages(),
            total_hits: page.total_hits(),
        }
    }
}

/// Header row plus one string row per record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlatTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Everything a load step needs: the full response tree and its flattened rows.
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub response: Value,
    pub table: FlatTable,
}
