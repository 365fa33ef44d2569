use super::ReportingAdapter;
use crate::domain::model::{ExportFormat, RunResult};
use crate::domain::ports::{ReportSink, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Writes every requested encoding of a run through a [`Storage`] backend.
pub struct FileExporter<S: Storage> {
    storage: S,
    adapter: ReportingAdapter,
    formats: Vec<ExportFormat>,
    output_path: String,
}

impl<S: Storage> FileExporter<S> {
    pub fn new(
        storage: S,
        adapter: ReportingAdapter,
        formats: Vec<ExportFormat>,
        output_path: String,
    ) -> Self {
        Self {
            storage,
            adapter,
            formats,
            output_path,
        }
    }

    /// File stem for a run: the run name made filesystem-safe, or a
    /// timestamped default for unnamed runs.
    pub fn file_stem(name: &str) -> String {
        let sanitized: String = name
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if sanitized.trim_matches('_').is_empty() {
            format!("simulation_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
        } else {
            sanitized
        }
    }

    fn target_path(&self, stem: &str, format: ExportFormat) -> String {
        let file_name = format!("{}.{}", stem, format.extension());
        if self.output_path.is_empty() {
            file_name
        } else {
            format!("{}/{}", self.output_path.trim_end_matches('/'), file_name)
        }
    }
}

#[async_trait]
impl<S: Storage> ReportSink for FileExporter<S> {
    async fn publish(&self, result: &RunResult) -> Result<Vec<String>> {
        let stem = Self::file_stem(&result.name);
        let mut written = Vec::with_capacity(self.formats.len());

        for format in &self.formats {
            let data = self.adapter.encode(result, *format)?;
            let path = self.target_path(&stem, *format);
            self.storage.write_file(&path, &data).await?;
            tracing::info!("💾 Wrote {} ({} bytes)", path, data.len());
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use crate::core::SimulationEngine;
    use crate::domain::model::{InstrumentVector, SolverSettings};
    use crate::model::scalars::Ml2Scalars;
    use tempfile::TempDir;

    #[test]
    fn test_file_stem() {
        type Exporter = FileExporter<LocalStorage>;
        assert_eq!(Exporter::file_stem("vat cut 2%"), "vat_cut_2_");
        assert_eq!(Exporter::file_stem("public-invest"), "public-invest");
        assert!(Exporter::file_stem("").starts_with("simulation_"));
        assert!(Exporter::file_stem("  / ").starts_with("simulation_"));
    }

    #[tokio::test]
    async fn test_publish_writes_each_format() {
        let engine =
            SimulationEngine::ml2(&Ml2Scalars::default(), None, SolverSettings::default()).unwrap();
        let result = engine
            .simulate("invest", &InstrumentVector::from([("VIG_X".to_string(), 250.0)]))
            .await
            .unwrap();

        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_string_lossy().to_string());
        let exporter = FileExporter::new(
            storage,
            ReportingAdapter::new(engine.registry().clone()),
            vec![ExportFormat::Json, ExportFormat::Csv, ExportFormat::Xlsx],
            "runs".to_string(),
        );

        let written = exporter.publish(&result).await.unwrap();
        assert_eq!(
            written,
            vec!["runs/invest.json", "runs/invest.csv", "runs/invest.xlsx"]
        );
        for path in &written {
            assert!(temp_dir.path().join(path).exists());
        }
    }
}
