pub mod clock;
pub mod etl;
pub mod pipeline;
pub mod transformer;

pub use crate::domain::model::{DestinationRecord, OutputTable, SourceRecord};
pub use crate::domain::ports::{Clock, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
