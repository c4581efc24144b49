use crate::adapters::supabase::SupabaseClient;
use crate::core::auditor::Auditor;
use crate::core::leak::{self, LeakAssumptions};
use crate::core::scoring;
use crate::core::{ConfigProvider, LeadPipeline, Storage};
use crate::domain::model::{BusinessAudit, Lead, LeadReport, LeadRow};
use crate::utils::error::{LeadError, Result};
use chrono::Utc;
use std::io::Write;
use std::sync::Arc;
use zip::write::{FileOptions, ZipWriter};

pub const JSON_FILENAME: &str = "leads.json";
pub const CSV_FILENAME: &str = "leads.csv";
pub const ZIP_FILENAME: &str = "leads.zip";

pub struct AuditPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    auditor: Arc<Auditor>,
    assumptions: LeakAssumptions,
    supabase: Option<SupabaseClient>,
}

impl<S: Storage, C: ConfigProvider> AuditPipeline<S, C> {
    pub fn new(storage: S, config: C, auditor: Auditor, assumptions: LeakAssumptions) -> Self {
        Self {
            storage,
            config,
            auditor: Arc::new(auditor),
            assumptions,
            supabase: None,
        }
    }

    pub fn with_supabase(mut self, client: SupabaseClient) -> Self {
        self.supabase = Some(client);
        self
    }

    fn render(&self, format: &str, report: &LeadReport) -> Result<(&'static str, Vec<u8>)> {
        match format {
            "json" => Ok((JSON_FILENAME, serde_json::to_vec_pretty(report)?)),
            "csv" => Ok((CSV_FILENAME, render_csv(&report.rows())?)),
            other => Err(LeadError::InvalidConfigValueError {
                field: "output.formats".to_string(),
                value: other.to_string(),
                reason: "Unsupported format".to_string(),
            }),
        }
    }
}

pub fn render_csv(rows: &[LeadRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.into_inner().map_err(|e| LeadError::ProcessingError {
        message: format!("CSV flush failed: {}", e),
    })
}

/// 分數高者優先；同分時流失金額大者優先，再依名稱排序
pub fn rank_leads(leads: &mut [Lead]) {
    leads.sort_by(|a, b| {
        b.score
            .total
            .cmp(&a.score.total)
            .then_with(|| b.leak.total_monthly_cop.cmp(&a.leak.total_monthly_cop))
            .then_with(|| a.audit.business.name.cmp(&b.audit.business.name))
    });
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> LeadPipeline for AuditPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<BusinessAudit>> {
        let businesses = self.config.businesses();
        if businesses.is_empty() {
            return Err(LeadError::ConfigError {
                message: "no businesses configured; add [[businesses]] entries".to_string(),
            });
        }

        tracing::info!(
            "🚀 Auditing {} businesses ({} concurrent)",
            businesses.len(),
            self.config.concurrent_requests()
        );

        Ok(self
            .auditor
            .audit_all(businesses, self.config.concurrent_requests())
            .await)
    }

    async fn transform(&self, audits: Vec<BusinessAudit>) -> Result<LeadReport> {
        let mut leads: Vec<Lead> = audits
            .into_iter()
            .map(|audit| {
                let score = scoring::score(&audit);
                let leak = leak::estimate(&audit, &self.assumptions);
                Lead { audit, score, leak }
            })
            .collect();
        rank_leads(&mut leads);

        Ok(LeadReport {
            generated_at: Utc::now(),
            leads,
        })
    }

    async fn load(&self, report: LeadReport) -> Result<String> {
        let mut files = Vec::new();
        for format in self.config.output_formats() {
            files.push(self.render(format, &report)?);
        }

        let output_path = if self.config.compress_output() {
            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for (name, data) in &files {
                    zip.start_file::<_, ()>(*name, FileOptions::default())?;
                    zip.write_all(data)?;
                }
                zip.finish()?.into_inner()
            };
            tracing::debug!("Writing {} ({} bytes)", ZIP_FILENAME, zip_data.len());
            self.storage.write_file(ZIP_FILENAME, &zip_data).await?;
            format!("{}/{}", self.config.output_path(), ZIP_FILENAME)
        } else {
            for (name, data) in &files {
                tracing::debug!("Writing {} ({} bytes)", name, data.len());
                self.storage.write_file(name, data).await?;
            }
            self.config.output_path().to_string()
        };

        if let Some(supabase) = &self.supabase {
            match supabase.upsert_leads(&report.rows()).await {
                Ok(count) => tracing::info!("☁️  Upserted {} leads to Supabase", count),
                // 匯出檔已寫入，遠端失敗不影響本次結果
                Err(e) => tracing::warn!("Supabase upsert failed: {} ({})", e, e.recovery_suggestion()),
            }
        }

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Business, Category, LeakEstimate, OpportunityScore, Tier};

    fn lead(name: &str, total: u8, leak: u64) -> Lead {
        Lead {
            audit: BusinessAudit::new(Business::new(name, "Cartagena", Category::Hotel)),
            score: OpportunityScore {
                total,
                tier: scoring::tier_for(total),
                signals: vec![],
            },
            leak: LeakEstimate {
                total_monthly_cop: leak,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_rank_leads() {
        let mut leads = vec![
            lead("Beta", 60, 1_000),
            lead("Alfa", 60, 1_000),
            lead("Gamma", 60, 5_000),
            lead("Delta", 90, 0),
        ];
        rank_leads(&mut leads);
        let names: Vec<_> = leads.iter().map(|l| l.audit.business.name.as_str()).collect();
        assert_eq!(names, vec!["Delta", "Gamma", "Alfa", "Beta"]);
        assert_eq!(leads[0].score.tier, Tier::Hot);
    }

    #[test]
    fn test_render_csv_header() {
        let report = LeadReport {
            generated_at: Utc::now(),
            leads: vec![lead("Casa Lola", 50, 2_000)],
        };
        let csv = String::from_utf8(render_csv(&report.rows()).unwrap()).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("name,city,category,website,instagram_handle"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Casa Lola,Cartagena,hotel,,"));
        assert!(lines.next().is_none());
    }
}
