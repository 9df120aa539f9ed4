use crate::core::client::DcClient;
use crate::core::flatten::flatten_response;
use crate::domain::model::{ExportBundle, OutputFormat, ResponseFormat};
use crate::domain::ports::{Pipeline, Storage, Transport};
use crate::export::{to_csv_bytes, to_xml_bytes};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// What to search for and where to write it.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub query: String,
    pub model: String,
    pub all: bool,
    pub fields: Vec<String>,
    pub exclude_fields: Vec<String>,
    pub format: OutputFormat,
    pub outfile: String,
}

/// Search → flatten → file. Always requests opensearch JSON, the only shape
/// the flattener understands.
pub struct SearchExport<T: Transport, S: Storage> {
    client: DcClient<T>,
    storage: S,
    request: ExportRequest,
}

impl<T: Transport, S: Storage> SearchExport<T, S> {
    pub fn new(client: DcClient<T>, storage: S, request: ExportRequest) -> Self {
        Self {
            client,
            storage,
            request,
        }
    }
}

#[async_trait]
impl<T: Transport, S: Storage> Pipeline for SearchExport<T, S> {
    async fn extract(&self) -> Result<Value> {
        let params = self
            .client
            .params(ResponseFormat::Opensearch)
            .with_query(self.request.query.clone())
            .with_source_filter(&self.request.fields, &self.request.exclude_fields);

        let walked = self
            .client
            .search(&self.request.model, params, self.request.all)
            .await?;
        if !walked.is_complete() {
            tracing::warn!("⚠️ Exporting a partial result set for {:?}", self.request.query);
        }
        Ok(walked.value)
    }

    async fn transform(&self, response: Value) -> Result<ExportBundle> {
        let fields = (!self.request.fields.is_empty()).then_some(self.request.fields.as_slice());
        let table = flatten_response(&response, fields);
        Ok(ExportBundle {
            response,
            table,
        })
    }

    async fn load(&self, bundle: ExportBundle) -> Result<Vec<String>> {
        let bytes = match self.request.format {
            OutputFormat::Csv => to_csv_bytes(&bundle.table)?,
            OutputFormat::Xml => to_xml_bytes(&bundle.response)?,
            OutputFormat::Json => serde_json::to_vec_pretty(&bundle.response)?,
        };

        self.storage.write_file(&self.request.outfile, &bytes).await?;
        Ok(vec![self.request.outfile.clone()])
    }
}
