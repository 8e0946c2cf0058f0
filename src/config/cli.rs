use crate::core::dataset::{ReadOptions, WriteOptions};
use crate::core::generator::{MeasurementFilter, ModelParameters};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    delimiter_byte, validate_delimiter, validate_non_empty_string, validate_path, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "pvgen")]
#[command(about = "Generate synthetic PV power series from temperature and irradiance files")]
pub struct CliConfig {
    /// Directory holding one or more "<location> <anything>.csv" files per location
    #[arg(long, default_value = "./datasets")]
    pub input_dir: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "generated_loads.csv")]
    pub output_file: String,

    /// Field separator of the input files
    #[arg(long, default_value = ";")]
    pub delimiter: char,

    /// Token marking a missing measurement in the input files
    #[arg(long, default_value = "NULL")]
    pub na_value: String,

    /// Temperatures at or above this value (°C) are treated as faulty
    #[arg(long, default_value = "40")]
    pub max_temperature: f64,

    /// Irradiance at or above this value (W/m²) is treated as faulty
    #[arg(long, default_value = "1000")]
    pub max_irradiance: f64,

    #[arg(long, default_value = "1")]
    pub module_number: u32,

    #[arg(long, help = "Do not write the JSON run summary")]
    pub no_summary: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

impl ConfigProvider for CliConfig {
    fn input_dir(&self) -> &str {
        &self.input_dir
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_filename(&self) -> &str {
        &self.output_file
    }

    fn read_options(&self) -> ReadOptions {
        let defaults = ReadOptions::default();
        ReadOptions {
            // validate() rejects separators delimiter_byte cannot convert
            delimiter: delimiter_byte(self.delimiter).unwrap_or(defaults.delimiter),
            na_value: self.na_value.clone(),
            ..defaults
        }
    }

    fn write_options(&self) -> WriteOptions {
        WriteOptions::default()
    }

    fn model_parameters(&self) -> ModelParameters {
        ModelParameters {
            module_number: self.module_number,
            ..ModelParameters::default()
        }
    }

    fn measurement_filter(&self) -> MeasurementFilter {
        MeasurementFilter {
            maximum_temperature: self.max_temperature,
            maximum_irradiance: self.max_irradiance,
        }
    }

    fn write_summary(&self) -> bool {
        !self.no_summary
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input_dir", &self.input_dir)?;
        validate_path("output_path", &self.output_path)?;
        validate_non_empty_string("output_file", &self.output_file)?;
        validate_delimiter("delimiter", self.delimiter)?;
        self.model_parameters().validate()?;
        self.measurement_filter().validate()?;
        Ok(())
    }
}
