pub mod auditor;
pub mod discovery;
pub mod engine;
pub mod leak;
pub mod pipeline;
pub mod scoring;
pub mod search_matrix;

pub use crate::domain::model::{BusinessAudit, LeadReport};
pub use crate::domain::ports::{ConfigProvider, LeadPipeline, PageFetcher, Storage};
pub use crate::utils::error::Result;
