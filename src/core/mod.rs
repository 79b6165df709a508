pub mod acquire;
mod columns;
pub mod etl;
pub mod pipeline;
pub mod reference;
pub mod registration;
pub mod writer;

pub use crate::domain::model::{OutputRow, SourceFiles, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
