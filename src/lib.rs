pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use crate::adapters::{HttpFetcher, LocalStorage, SupabaseClient};
pub use crate::config::TomlConfig;
pub use crate::core::{auditor::Auditor, engine::LeadEngine, pipeline::AuditPipeline};
pub use crate::utils::error::{LeadError, Result};
