use anyhow::Context;
use clap::Parser;
use lead_scout::config::Command;
use lead_scout::core::search_matrix::SearchMatrix;
use lead_scout::utils::error::ErrorSeverity;
use lead_scout::utils::{logger, validation::Validate};
use lead_scout::{
    AuditPipeline, Auditor, CliConfig, HttpFetcher, LeadEngine, LocalStorage, SupabaseClient,
    TomlConfig,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    match cli.command {
        Command::Audit {
            config,
            output_path,
            concurrent_requests,
        } => run_audit(&config, output_path, concurrent_requests).await,
        Command::Queries {
            category,
            city,
            limit,
        } => {
            let matrix = SearchMatrix::build(&category, &city).limit(limit);
            tracing::debug!("Generated {} queries", matrix.len());
            for query in &matrix.queries {
                println!("{:.2}\t{}\t{}", query.priority, query.text, query.hashtag());
            }
            Ok(())
        }
    }
}

async fn run_audit(
    config_path: &str,
    output_path: Option<String>,
    concurrent_requests: Option<usize>,
) -> anyhow::Result<()> {
    let mut config = TomlConfig::from_file(config_path)
        .with_context(|| format!("failed to load config from {}", config_path))?;

    if let Some(path) = output_path {
        config.output.path = path;
    }
    if let Some(concurrency) = concurrent_requests {
        config.http.concurrent_requests = concurrency;
    }

    tracing::info!("Starting lead-scout: {}", config.engine.name);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let fetcher = Arc::new(HttpFetcher::new(
        config.http.timeout_seconds,
        &config.http.user_agent,
    )?);
    let auditor = Auditor::from_config(fetcher, &config);
    let supabase = config
        .supabase()
        .map(|s| SupabaseClient::new(s, config.http.timeout_seconds))
        .transpose()?;

    let storage = LocalStorage::new(config.output.path.clone());
    let assumptions = config.assumptions.clone();
    let mut pipeline = AuditPipeline::new(storage, config, auditor, assumptions);
    if let Some(client) = supabase {
        tracing::info!("☁️  Supabase sync enabled ({})", client.table_url());
        pipeline = pipeline.with_supabase(client);
    }

    let engine = LeadEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Lead audit completed successfully!");
            println!("✅ Lead audit completed successfully!");
            println!("📁 Output saved to: {}", output_path);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Lead audit failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}
