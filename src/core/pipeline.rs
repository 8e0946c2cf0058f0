use crate::core::dataset::{align, group_by_location, is_data_file, parse_frame, write_table};
use crate::core::generator::{generate_with_summary, MeasurementFilter, ModelParameters};
use crate::core::{ConfigProvider, GenerationResult, Pipeline, Storage, WeatherTables};
use crate::domain::model::FilterSummary;
use crate::utils::error::{PvGenError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Run report written next to the power table.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub locations: Vec<String>,
    pub rows: usize,
    pub cells: usize,
    #[serde(flatten)]
    pub filter: FilterSummary,
    pub parameters: ModelParameters,
    pub thresholds: MeasurementFilter,
    pub generated_at: DateTime<Utc>,
}

/// Extract per-location files from storage, generate the PV series, write it back.
pub struct PvPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> PvPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn summary_filename(&self) -> String {
        let stem = Path::new(self.config.output_filename())
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("pv_series");
        format!("{}.summary.json", stem)
    }

    fn join(dir: &str, file: &str) -> String {
        Path::new(dir).join(file).to_string_lossy().into_owned()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PvPipeline<S, C> {
    async fn extract(&self) -> Result<WeatherTables> {
        let input_dir = self.config.input_dir();
        let options = self.config.read_options();

        tracing::debug!("Listing measurement files in: {}", input_dir);
        let mut names = self.storage.list_files(input_dir).await?;
        names.sort();

        let mut frames = Vec::new();
        for name in names {
            if !is_data_file(&name, &options) {
                tracing::debug!("Skipping {}", name);
                continue;
            }

            let data = self.storage.read_file(&Self::join(input_dir, &name)).await?;
            let frame = parse_frame(&data, &options, &name)?;
            tracing::debug!("Read {} rows from {}", frame.index.len(), name);
            frames.push((name, frame));
        }

        if frames.is_empty() {
            return Err(PvGenError::ProcessingError {
                message: format!("no measurement files found in '{}'", input_dir),
            });
        }

        let source_files = frames.len();
        let series = group_by_location(
            frames.iter().map(|(name, frame)| (name.as_str(), frame.clone())),
            &options,
        )?;
        let (temperature, irradiance) = align(&series)?;

        tracing::info!(
            "Loaded {} locations x {} timestamps from {} files",
            temperature.shape().1,
            temperature.shape().0,
            source_files
        );

        Ok(WeatherTables {
            temperature,
            irradiance,
            source_files,
        })
    }

    async fn transform(&self, data: WeatherTables) -> Result<GenerationResult> {
        let parameters = self.config.model_parameters();
        let filter = self.config.measurement_filter();

        let result = generate_with_summary(&data.temperature, &data.irradiance, &parameters, &filter)?;

        if result.summary.masked_temperature > 0 || result.summary.masked_irradiance > 0 {
            tracing::warn!(
                "Filtered faulty measurements: {} temperature cells >= {}, {} irradiance cells >= {}",
                result.summary.masked_temperature,
                filter.maximum_temperature,
                result.summary.masked_irradiance,
                filter.maximum_irradiance
            );
        }

        Ok(result)
    }

    async fn load(&self, result: GenerationResult) -> Result<String> {
        let output_dir = self.config.output_path();
        let output_path = Self::join(output_dir, self.config.output_filename());

        let data = write_table(&result.power, &self.config.write_options())?;
        tracing::debug!("Writing power table ({} bytes) to storage", data.len());
        self.storage.write_file(&output_path, &data).await?;

        if self.config.write_summary() {
            let (rows, columns) = result.power.shape();
            let summary = GenerationSummary {
                locations: result.power.columns().to_vec(),
                rows,
                cells: rows * columns,
                filter: result.summary,
                parameters: self.config.model_parameters(),
                thresholds: self.config.measurement_filter(),
                generated_at: Utc::now(),
            };
            let json = serde_json::to_vec_pretty(&summary)?;
            let summary_path = Self::join(output_dir, &self.summary_filename());
            self.storage.write_file(&summary_path, &json).await?;
            tracing::debug!("Run summary saved to {}", summary_path);
        }

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::{ReadOptions, WriteOptions};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put(&self, path: &str, data: &str) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                PvGenError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn list_files(&self, dir: &str) -> Result<Vec<String>> {
            let prefix = format!("{}/", dir);
            let files = self.files.lock().await;
            Ok(files
                .keys()
                .filter_map(|k| k.strip_prefix(&prefix))
                .filter(|name| !name.contains('/'))
                .map(str::to_string)
                .collect())
        }
    }

    struct MockConfig {
        filter: MeasurementFilter,
        write_summary: bool,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                filter: MeasurementFilter::default(),
                write_summary: true,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_dir(&self) -> &str {
            "datasets"
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn output_filename(&self) -> &str {
            "generated_loads.csv"
        }

        fn read_options(&self) -> ReadOptions {
            ReadOptions::default()
        }

        fn write_options(&self) -> WriteOptions {
            WriteOptions::default()
        }

        fn model_parameters(&self) -> ModelParameters {
            ModelParameters::default()
        }

        fn measurement_filter(&self) -> MeasurementFilter {
            self.filter
        }

        fn write_summary(&self) -> bool {
            self.write_summary
        }
    }

    async fn seeded_storage() -> MockStorage {
        let storage = MockStorage::new();
        storage
            .put(
                "datasets/Berlin 2019.csv",
                "time;temperature;irradiance\n2019-06-01 12:00;20;500\n2019-06-01 13:00;41;500\n",
            )
            .await;
        storage
            .put(
                "datasets/Berlin 2020.csv",
                "time;temperature;irradiance\n2020-06-01 12:00;NULL;400\n",
            )
            .await;
        storage
            .put(
                "datasets/Aachen 2019.csv",
                "time;temperature;irradiance\n2019-06-01 12:00;18;1000\n",
            )
            .await;
        storage.put("datasets/README.md", "not data").await;
        storage
    }

    #[tokio::test]
    async fn test_extract_groups_and_aligns_locations() {
        let storage = seeded_storage().await;
        let pipeline = PvPipeline::new(storage, MockConfig::new());

        let tables = pipeline.extract().await.unwrap();

        assert_eq!(tables.source_files, 3);
        assert_eq!(
            tables.temperature.columns(),
            &["Aachen".to_string(), "Berlin".to_string()]
        );
        assert_eq!(
            tables.temperature.index(),
            &[
                "2019-06-01 12:00".to_string(),
                "2019-06-01 13:00".to_string(),
                "2020-06-01 12:00".to_string()
            ]
        );
        assert_eq!(tables.temperature.get(0, 1), Some(20.0));
        assert!(tables.temperature.get(2, 1).unwrap().is_nan());
        assert!(tables.irradiance.get(1, 0).unwrap().is_nan());
    }

    #[tokio::test]
    async fn test_extract_without_data_files_fails() {
        let storage = MockStorage::new();
        storage.put("datasets/notes.md", "nothing here").await;
        let pipeline = PvPipeline::new(storage, MockConfig::new());

        let result = pipeline.extract().await;
        assert!(matches!(result, Err(PvGenError::ProcessingError { .. })));
    }

    #[tokio::test]
    async fn test_transform_applies_filter() {
        let storage = seeded_storage().await;
        let pipeline = PvPipeline::new(storage, MockConfig::new());

        let tables = pipeline.extract().await.unwrap();
        let result = pipeline.transform(tables).await.unwrap();

        assert_eq!(result.power.shape(), (3, 2));
        // Aachen at 1000 W/m² hits the inclusive irradiance bound
        assert!(result.power.get(0, 0).unwrap().is_nan());
        assert!(result.power.get(0, 1).unwrap() > 0.0);
        assert!(result.power.get(1, 1).unwrap().is_nan());
        assert_eq!(result.summary.masked_temperature, 1);
        assert_eq!(result.summary.masked_irradiance, 1);
    }

    #[tokio::test]
    async fn test_load_writes_table_and_summary() {
        let storage = seeded_storage().await;
        let pipeline = PvPipeline::new(storage.clone(), MockConfig::new());

        let tables = pipeline.extract().await.unwrap();
        let result = pipeline.transform(tables).await.unwrap();
        let output_path = pipeline.load(result).await.unwrap();

        assert_eq!(output_path, "test_output/generated_loads.csv");

        let csv = storage.get_file("test_output/generated_loads.csv").await.unwrap();
        let text = String::from_utf8(csv).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("timestamp,Aachen,Berlin"));
        assert!(lines.next().unwrap().starts_with("2019-06-01 12:00,,"));
        assert_eq!(lines.next(), Some("2019-06-01 13:00,,"));

        let json = storage
            .get_file("test_output/generated_loads.summary.json")
            .await
            .unwrap();
        let summary: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(summary["rows"], 3);
        assert_eq!(summary["cells"], 6);
        assert_eq!(summary["masked_temperature"], 1);
        assert_eq!(summary["parameters"]["Pmpp"], 255.2);
        assert_eq!(summary["thresholds"]["maximum_irradiance"], 1000.0);
    }

    #[tokio::test]
    async fn test_load_without_summary() {
        let storage = MockStorage::new();
        let mut config = MockConfig::new();
        config.write_summary = false;
        let pipeline = PvPipeline::new(storage.clone(), config);

        let power = crate::domain::model::Table::from_rows(["t0"], ["Berlin"], vec![vec![1.0]])
            .unwrap();
        pipeline
            .load(GenerationResult {
                power,
                summary: FilterSummary::default(),
            })
            .await
            .unwrap();

        assert!(storage.get_file("test_output/generated_loads.csv").await.is_some());
        assert!(storage
            .get_file("test_output/generated_loads.summary.json")
            .await
            .is_none());
    }
}
