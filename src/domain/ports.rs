use crate::domain::model::{ApiResponse, ExportBundle};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// HTTP capability the walkers and endpoint helpers depend on.
///
/// Implementations own connection reuse and retry; callers see one answer per call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<ApiResponse>;
    async fn post_json(&self, url: &str, body: &Value) -> Result<ApiResponse>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Value>;
    async fn transform(&self, response: Value) -> Result<ExportBundle>;
    async fn load(&self, bundle: ExportBundle) -> Result<Vec<String>>;
}
