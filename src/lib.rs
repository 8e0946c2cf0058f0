pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{LocalStorage, TomlConfig};

pub use crate::core::generator::{
    generate, generate_with_summary, MeasurementFilter, ModelParameters,
};
pub use crate::core::{etl::EtlEngine, pipeline::PvPipeline};
pub use crate::domain::model::{FilterSummary, Table};
pub use crate::utils::error::{PvGenError, Result};
