//! HTML 結構化資料擷取：JSON-LD 評分與 meta 標籤。

use crate::utils::text::{parse_count, parse_rating};
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).expect("selector"));
static META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").expect("selector"));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateRating {
    pub rating: Option<f32>,
    pub best_rating: Option<f32>,
    pub count: Option<u64>,
}

/// 找出頁面中第一個 JSON-LD aggregateRating
pub fn json_ld_aggregate_rating(html: &str) -> Option<AggregateRating> {
    let document = Html::parse_document(html);
    document
        .select(&JSON_LD)
        .filter_map(|script| serde_json::from_str::<Value>(&script.text().collect::<String>()).ok())
        .find_map(|value| find_aggregate_rating(&value))
}

fn find_aggregate_rating(value: &Value) -> Option<AggregateRating> {
    match value {
        Value::Object(map) => {
            if let Some(aggregate) = map.get("aggregateRating") {
                let rating = aggregate.get("ratingValue").and_then(number_like_f32);
                let count = aggregate
                    .get("reviewCount")
                    .or_else(|| aggregate.get("ratingCount"))
                    .and_then(number_like_u64);
                if rating.is_some() || count.is_some() {
                    return Some(AggregateRating {
                        rating,
                        best_rating: aggregate.get("bestRating").and_then(number_like_f32),
                        count,
                    });
                }
            }
            map.values().find_map(find_aggregate_rating)
        }
        Value::Array(items) => items.iter().find_map(find_aggregate_rating),
        _ => None,
    }
}

fn number_like_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => parse_rating(s),
        _ => None,
    }
}

fn number_like_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|v| v as u64)),
        Value::String(s) => parse_count(s),
        _ => None,
    }
}

/// `<meta property="..." content="...">` 或 `<meta name="..." content="...">`
pub fn meta_content(html: &str, key: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&META)
        .find(|meta| {
            let attrs = meta.value();
            attrs.attr("property") == Some(key) || attrs.attr("name") == Some(key)
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_rating_in_graph() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"BreadcrumbList"}</script>
            <script type="application/ld+json">
            {"@graph":[{"@type":"Hotel","name":"Casa Lola",
              "aggregateRating":{"ratingValue":"4,5","bestRating":"5","reviewCount":"1.234"}}]}
            </script></head><body></body></html>"#;

        let rating = json_ld_aggregate_rating(html).unwrap();
        assert_eq!(rating.rating, Some(4.5));
        assert_eq!(rating.best_rating, Some(5.0));
        assert_eq!(rating.count, Some(1234));
    }

    #[test]
    fn test_broken_json_ld_is_ignored() {
        let html = r#"<script type="application/ld+json">{not json</script>"#;
        assert!(json_ld_aggregate_rating(html).is_none());
    }

    #[test]
    fn test_meta_content() {
        let html = r#"<html><head>
            <meta property="og:description" content=" 1,234 Followers, 10 Following, 55 Posts ">
            <meta name="description" content="Hotel boutique en Cartagena">
            </head><body></body></html>"#;

        assert_eq!(
            meta_content(html, "og:description").as_deref(),
            Some("1,234 Followers, 10 Following, 55 Posts")
        );
        assert_eq!(
            meta_content(html, "description").as_deref(),
            Some("Hotel boutique en Cartagena")
        );
        assert!(meta_content(html, "og:title").is_none());
    }
}
