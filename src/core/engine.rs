use crate::core::LeadPipeline;
use crate::domain::model::Tier;
use crate::utils::error::Result;

pub struct LeadEngine<P: LeadPipeline> {
    pipeline: P,
}

impl<P: LeadPipeline> LeadEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting lead audit...");

        // Extract
        let audits = self.pipeline.extract().await?;
        let degraded = audits.iter().filter(|a| !a.failed_sources.is_empty()).count();
        tracing::info!(
            "Audited {} businesses ({} with missing sources)",
            audits.len(),
            degraded
        );

        // Transform
        let report = self.pipeline.transform(audits).await?;
        let hot = report
            .leads
            .iter()
            .filter(|l| l.score.tier == Tier::Hot)
            .count();
        let annual_leak: u64 = report.leads.iter().map(|l| l.leak.total_annual_cop).sum();
        tracing::info!(
            "Scored {} leads: {} hot, estimated annual leak {} COP",
            report.leads.len(),
            hot,
            annual_leak
        );

        // Load
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
