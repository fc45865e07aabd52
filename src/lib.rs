pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{output_path_for, storage::LocalStorage};

pub use core::{
    clock::{FixedClock, SystemClock},
    etl::{EtlEngine, RunSummary},
    pipeline::IocPipeline,
};
pub use domain::model::{
    Action, DestinationRecord, IndicatorType, OutputTable, SourceRecord, OUTPUT_HEADER,
};
pub use utils::error::{EtlError, Result};
