use anyhow::Result;
use httpmock::prelude::*;
use lead_scout::config::Endpoints;
use lead_scout::domain::model::{Category, LeadReport, Tier};
use lead_scout::{AuditPipeline, Auditor, HttpFetcher, LeadEngine, LocalStorage, SupabaseClient, TomlConfig};
use serde_json::json;
use std::io::Read;
use std::sync::Arc;
use tempfile::TempDir;

const WEBSITE_HTML: &str = r#"<html><body>
    <h1>Casa Lola · Hotel boutique en Getsemaní</h1>
    <a href="https://www.instagram.com/casalola/">Instagram</a>
    <a href="https://wa.me/573001234567?text=Hola">Reserva por WhatsApp</a>
</body></html>"#;

const BOOKING_SEARCH_HTML: &str = r#"<html><body>
    <a href="/hotel/co/hostal-el-viajero.es.html">Hostal El Viajero</a>
    <a href="/hotel/co/casa-lola-cartagena.es.html">Casa Lola</a>
    <span>COP 420.000</span><span>COP 380.000</span>
</body></html>"#;

fn build_config(server: &MockServer, output_path: &str, compress: bool, supabase: bool) -> Result<TomlConfig> {
    let supabase_section = if supabase {
        format!(
            r#"
[supabase]
url = "{}"
key = "service-role-key"
"#,
            server.base_url()
        )
    } else {
        String::new()
    };

    let content = format!(
        r#"
[engine]
name = "cartagena-test"

[http]
timeout_seconds = 5
concurrent_requests = 2

[output]
path = "{}"
formats = ["json", "csv"]
compress = {}

[discovery]
search_enabled = false
{}
[[businesses]]
name = "Casa Lola"
city = "Cartagena"
category = "boutique_hotel"
website = "{}"
units = 10

[[businesses]]
name = "Sin Web"
city = "Cartagena"
category = "restaurant"
"#,
        output_path.replace('\\', "/"),
        compress,
        supabase_section,
        server.url("/casalola")
    );

    let mut config = TomlConfig::from_toml_str(&content)?;
    config.endpoints = Endpoints::all(&server.base_url());
    config.validate_config()?;
    Ok(config)
}

fn mock_sources(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/casalola");
        then.status(200)
            .header("content-type", "text/html")
            .body(WEBSITE_HTML);
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/users/web_profile_info/")
            .query_param("username", "casalola")
            .header("x-ig-app-id", "936619743392459");
        then.status(200).json_body(json!({
            "data": {"user": {
                "username": "casalola",
                "full_name": "Casa Lola Hotel",
                "biography": "Hotel boutique en Cartagena",
                "edge_followed_by": {"count": 850},
                "edge_follow": {"count": 120},
                "edge_owner_to_timeline_media": {"count": 18},
                "is_business_account": true
            }}
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("q", "Casa Lola Cartagena");
        then.status(200)
            .body("<div><span>Casa Lola 4,3 (212) · Hotel boutique</span></div>");
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/searchresults.es.html")
            .query_param("ss", "Casa Lola Cartagena");
        then.status(200).body(BOOKING_SEARCH_HTML);
    });
}

fn build_pipeline(config: TomlConfig) -> Result<AuditPipeline<LocalStorage, TomlConfig>> {
    let fetcher = Arc::new(HttpFetcher::new(config.http.timeout_seconds, "lead-scout-test")?);
    let auditor = Auditor::from_config(fetcher, &config);
    let supabase = config
        .supabase()
        .map(|s| SupabaseClient::new(s, config.http.timeout_seconds))
        .transpose()?;
    let storage = LocalStorage::new(config.output.path.clone());
    let assumptions = config.assumptions.clone();

    let mut pipeline = AuditPipeline::new(storage, config, auditor, assumptions);
    if let Some(client) = supabase {
        pipeline = pipeline.with_supabase(client);
    }
    Ok(pipeline)
}

#[tokio::test]
async fn test_audit_pipeline_end_to_end() -> Result<()> {
    let server = MockServer::start();
    mock_sources(&server);

    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_string_lossy().to_string();
    let config = build_config(&server, &output_path, false, false)?;

    let engine = LeadEngine::new(build_pipeline(config)?);
    let result = engine.run().await?;
    assert_eq!(result, output_path);

    let json = tokio::fs::read(temp_dir.path().join("leads.json")).await?;
    let report: LeadReport = serde_json::from_slice(&json)?;
    assert_eq!(report.leads.len(), 2);
    assert_eq!(report.leads[0].audit.business.name, "Casa Lola");

    let casa = report
        .leads
        .iter()
        .find(|l| l.audit.business.name == "Casa Lola")
        .expect("Casa Lola lead");
    let audit = &casa.audit;
    assert_eq!(audit.business.category, Category::BoutiqueHotel);
    assert_eq!(audit.instagram_match.as_ref().map(|m| m.handle.as_str()), Some("casalola"));
    assert_eq!(audit.instagram.as_ref().map(|p| p.followers), Some(850));
    assert_eq!(audit.google.as_ref().and_then(|g| g.rating), Some(4.3));
    assert_eq!(audit.google.as_ref().map(|g| g.review_count), Some(212));
    assert!(audit.ota_listed());
    assert_eq!(audit.ota.as_ref().and_then(|o| o.price_from_cop), Some(380_000));
    assert!(audit.whatsapp.click_to_chat);
    assert_eq!(audit.whatsapp.numbers, vec!["+573001234567".to_string()]);
    // 需求 15 + 評分 12 + OTA 20 + 追蹤者 12 + 貼文 5
    assert_eq!(casa.score.total, 64);
    assert_eq!(casa.score.tier, Tier::Warm);
    assert!(casa.leak.total_monthly_cop > 0);
    assert!(casa.leak.ota_commission_cop > 0);

    let sin_web = report
        .leads
        .iter()
        .find(|l| l.audit.business.name == "Sin Web")
        .expect("Sin Web lead");
    assert!(sin_web.audit.instagram_match.is_none());
    assert!(sin_web.audit.ota.is_none());
    assert!(sin_web.audit.failed_sources.contains(&"google".to_string()));
    // 無評分 10 + 無 WhatsApp 15 + 無 Instagram 15
    assert_eq!(sin_web.score.total, 40);
    assert_eq!(sin_web.score.tier, Tier::Cold);

    let csv = tokio::fs::read_to_string(temp_dir.path().join("leads.csv")).await?;
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("Casa Lola,Cartagena,boutique_hotel"));

    Ok(())
}

#[tokio::test]
async fn test_compressed_output_survives_supabase_failure() -> Result<()> {
    let server = MockServer::start();
    mock_sources(&server);
    let upsert = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/leads")
            .header("apikey", "service-role-key");
        then.status(500).body("boom");
    });

    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_string_lossy().to_string();
    let config = build_config(&server, &output_path, true, true)?;

    let engine = LeadEngine::new(build_pipeline(config)?);
    let result = tokio_test::assert_ok!(engine.run().await);
    assert!(result.ends_with("leads.zip"));
    upsert.assert();

    assert!(!temp_dir.path().join("leads.json").exists());
    let file = std::fs::File::open(temp_dir.path().join("leads.zip"))?;
    let mut archive = zip::ZipArchive::new(file)?;
    assert_eq!(archive.len(), 2);

    let mut json = String::new();
    archive.by_name("leads.json")?.read_to_string(&mut json)?;
    let report: LeadReport = serde_json::from_str(&json)?;
    assert_eq!(report.leads.len(), 2);
    assert!(archive.by_name("leads.csv").is_ok());

    Ok(())
}

#[tokio::test]
async fn test_extract_without_businesses_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = TomlConfig::from_toml_str(&format!(
        r#"
[engine]
name = "empty"

[output]
path = "{}"
"#,
        temp_dir.path().to_string_lossy().replace('\\', "/")
    ))?;

    let engine = LeadEngine::new(build_pipeline(config)?);
    let err = engine.run().await.unwrap_err();
    assert!(err.to_string().contains("no businesses configured"));
    Ok(())
}
