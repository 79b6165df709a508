pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::FileConfig, RunConfig};
pub use core::{etl::EtlEngine, pipeline::FaaPipeline};
pub use domain::model::{OutputRow, RegistrantType, RunSummary, SourceMode, UnresolvedPolicy};
pub use utils::error::{EtlError, Result};
