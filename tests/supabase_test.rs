use anyhow::Result;
use httpmock::prelude::*;
use lead_scout::config::toml_config::SupabaseConfig;
use lead_scout::core::{leak, scoring};
use lead_scout::domain::model::{Business, BusinessAudit, Category, Lead, LeadRow};
use lead_scout::{LeadError, SupabaseClient};
use serde_json::json;

fn rows() -> Vec<LeadRow> {
    let mut business = Business::new("Casa Lola", "Cartagena", Category::BoutiqueHotel);
    business.units = Some(10);
    let audit = BusinessAudit::new(business);
    let lead = Lead {
        score: scoring::score(&audit),
        leak: leak::estimate(&audit, &Default::default()),
        audit,
    };
    vec![LeadRow::from(&lead)]
}

fn client(server: &MockServer, table: &str) -> Result<SupabaseClient> {
    let config = SupabaseConfig {
        url: format!("{}/", server.base_url()),
        key: "service-role-key".to_string(),
        table: table.to_string(),
    };
    Ok(SupabaseClient::new(&config, 5)?)
}

#[tokio::test]
async fn test_upsert_sends_postgrest_headers() -> Result<()> {
    let server = MockServer::start();
    let upsert = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/hotel_leads")
            .header("apikey", "service-role-key")
            .header("authorization", "Bearer service-role-key")
            .header("prefer", "resolution=merge-duplicates,return=minimal")
            .json_body_partial(r#"[{"name": "Casa Lola", "city": "Cartagena", "category": "boutique_hotel"}]"#);
        then.status(201);
    });

    let client = client(&server, "hotel_leads")?;
    assert_eq!(client.table_url(), format!("{}/rest/v1/hotel_leads", server.base_url()));

    let count = client.upsert_leads(&rows()).await?;
    assert_eq!(count, 1);
    upsert.assert();
    Ok(())
}

#[tokio::test]
async fn test_upsert_rejected() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/rest/v1/leads");
        then.status(401).json_body(json!({"message": "Invalid API key"}));
    });

    let client = client(&server, "leads")?;
    match client.upsert_leads(&rows()).await {
        Err(LeadError::HttpStatusError { status, url }) => {
            assert_eq!(status, 401);
            assert!(url.ends_with("/rest/v1/leads"));
        }
        other => panic!("expected HttpStatusError, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_upsert_empty_skips_request() -> Result<()> {
    let server = MockServer::start();
    let upsert = server.mock(|when, then| {
        when.method(POST).path("/rest/v1/leads");
        then.status(201);
    });

    let client = client(&server, "leads")?;
    assert_eq!(client.upsert_leads(&[]).await?, 0);
    upsert.assert_hits(0);
    Ok(())
}
