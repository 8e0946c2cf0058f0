use crate::core::dataset::{ReadOptions, WriteOptions};
use crate::core::generator::{MeasurementFilter, ModelParameters};
use crate::domain::model::{GenerationResult, WeatherTables};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Names (not paths) of the regular files directly inside `dir`.
    fn list_files(
        &self,
        dir: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_dir(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_filename(&self) -> &str;
    fn read_options(&self) -> ReadOptions;
    fn write_options(&self) -> WriteOptions;
    fn model_parameters(&self) -> ModelParameters;
    fn measurement_filter(&self) -> MeasurementFilter;
    fn write_summary(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<WeatherTables>;
    async fn transform(&self, data: WeatherTables) -> Result<GenerationResult>;
    async fn load(&self, result: GenerationResult) -> Result<String>;
}
