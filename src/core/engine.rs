use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

pub struct ExportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ExportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<Vec<String>> {
        tracing::info!("🚀 Starting export");

        // Extract
        let response = self.pipeline.extract().await?;
        tracing::debug!("📥 Extracted response");

        // Transform
        let bundle = self.pipeline.transform(response).await?;
        tracing::info!(
            "🔄 Flattened {} rows with {} columns",
            bundle.table.rows.len(),
            bundle.table.headers.len()
        );

        // Load
        let written = self.pipeline.load(bundle).await?;
        for path in &written {
            tracing::info!("💾 Output saved to: {}", path);
        }

        Ok(written)
    }
}
