use crate::core::dataset::{ReadOptions, WriteOptions};
use crate::core::generator::{MeasurementFilter, ModelParameters};
use crate::core::ConfigProvider;
use crate::utils::error::{PvGenError, Result};
use crate::utils::validation::{
    delimiter_byte, validate_delimiter, validate_extension_list, validate_non_empty_string,
    validate_path, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub model: ModelParameters,
    #[serde(default)]
    pub filter: MeasurementFilter,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub input_dir: String,
    pub delimiter: Option<char>,
    pub na_value: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub temperature_column: Option<usize>,
    pub irradiance_column: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub filename: Option<String>,
    pub delimiter: Option<char>,
    pub na_rep: Option<String>,
    pub index_label: Option<String>,
    pub write_summary: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

const DEFAULT_OUTPUT_FILENAME: &str = "generated_loads.csv";

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PvGenError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PvGenError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_ROOT})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PvGenError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validate_path("source.input_dir", &self.source.input_dir)?;
        validate_path("load.output_path", &self.load.output_path)?;

        if let Some(delimiter) = self.source.delimiter {
            validate_delimiter("source.delimiter", delimiter)?;
        }
        if let Some(delimiter) = self.load.delimiter {
            validate_delimiter("load.delimiter", delimiter)?;
        }
        if let Some(extensions) = &self.source.extensions {
            validate_extension_list("source.extensions", extensions)?;
        }
        if let Some(filename) = &self.load.filename {
            validate_non_empty_string("load.filename", filename)?;
        }

        let read = self.read_options();
        if read.temperature_column == read.irradiance_column {
            return Err(PvGenError::InvalidConfigValueError {
                field: "source.irradiance_column".to_string(),
                value: read.irradiance_column.to_string(),
                reason: "Temperature and irradiance must come from different columns".to_string(),
            });
        }

        self.model.validate()?;
        self.filter.validate()?;
        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for TomlConfig {
    fn input_dir(&self) -> &str {
        &self.source.input_dir
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_filename(&self) -> &str {
        self.load.filename.as_deref().unwrap_or(DEFAULT_OUTPUT_FILENAME)
    }

    fn read_options(&self) -> ReadOptions {
        let defaults = ReadOptions::default();
        ReadOptions {
            delimiter: self
                .source
                .delimiter
                .and_then(delimiter_byte)
                .unwrap_or(defaults.delimiter),
            na_value: self.source.na_value.clone().unwrap_or(defaults.na_value),
            extensions: self.source.extensions.clone().unwrap_or(defaults.extensions),
            temperature_column: self
                .source
                .temperature_column
                .unwrap_or(defaults.temperature_column),
            irradiance_column: self
                .source
                .irradiance_column
                .unwrap_or(defaults.irradiance_column),
        }
    }

    fn write_options(&self) -> WriteOptions {
        let defaults = WriteOptions::default();
        WriteOptions {
            delimiter: self
                .load
                .delimiter
                .and_then(delimiter_byte)
                .unwrap_or(defaults.delimiter),
            na_rep: self.load.na_rep.clone().unwrap_or(defaults.na_rep),
            index_label: self.load.index_label.clone().unwrap_or(defaults.index_label),
        }
    }

    fn model_parameters(&self) -> ModelParameters {
        self.model
    }

    fn measurement_filter(&self) -> MeasurementFilter {
        self.filter
    }

    fn write_summary(&self) -> bool {
        self.load.write_summary.unwrap_or(true)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
