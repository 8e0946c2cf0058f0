pub mod dataset;
pub mod etl;
pub mod generator;
pub mod pipeline;

pub use crate::domain::model::{GenerationResult, Table, WeatherTables};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
