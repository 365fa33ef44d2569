use crate::domain::model::{ExportFormat, RunResult, SolverSettings};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn solver_settings(&self) -> SolverSettings;
    fn output_path(&self) -> &str;
    fn export_formats(&self) -> &[ExportFormat];
    fn calibration_path(&self) -> Option<&str>;
}

/// Destination for finished simulation results (files, buckets, ...).
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Publishes every configured encoding and returns the written locations.
    async fn publish(&self, result: &RunResult) -> Result<Vec<String>>;
}
