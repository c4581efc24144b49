use crate::domain::model::{Business, BusinessAudit, LeadReport};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 抓取頁面的抽象，方便在測試中替換
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String>;

    async fn fetch_json(&self, url: &str, headers: &[(&str, &str)]) -> Result<serde_json::Value> {
        let body = self.fetch_text(url, headers).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn compress_output(&self) -> bool;
    fn concurrent_requests(&self) -> usize;
    fn businesses(&self) -> &[Business];
}

#[async_trait]
pub trait LeadPipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<BusinessAudit>>;
    async fn transform(&self, audits: Vec<BusinessAudit>) -> Result<LeadReport>;
    async fn load(&self, report: LeadReport) -> Result<String>;
}
