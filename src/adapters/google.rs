use crate::adapters::http::fetch_first;
use crate::config::Endpoints;
use crate::domain::model::{Business, Platform, ReviewSummary};
use crate::domain::ports::PageFetcher;
use crate::utils::text::{parse_count, parse_rating};
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use url::Url;

static RATING_WITH_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d[.,]\d)\s*(?:★+\s*)?\((\d[\d.,]*)\)").expect("rating pair regex")
});
static LABELLED_RATING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:calificaci[oó]n:?\s*|rated\s+|rating:?\s*)(\d[.,]\d)").expect("rating regex")
});
static OUT_OF_FIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[.,]\d)\s*(?:de 5|out of 5|/\s*5)").expect("out of five regex")
});
static REVIEW_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d.,]*)\s+(?:reseñas|opiniones|comentarios|google reviews|reviews)")
        .expect("review count regex")
});

pub struct GoogleReviewsScraper {
    fetcher: Arc<dyn PageFetcher>,
    places_base: String,
    search_base: String,
    api_key: Option<String>,
}

impl GoogleReviewsScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, endpoints: &Endpoints, api_key: Option<String>) -> Self {
        Self {
            fetcher,
            places_base: endpoints.google_places.trim_end_matches('/').to_string(),
            search_base: endpoints.google_search.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// 有 API key 時先走 Places Text Search，否則（或失敗時）解析搜尋結果頁
    pub async fn summary(&self, business: &Business) -> Option<ReviewSummary> {
        let query = format!("{} {}", business.name, business.city);
        let mut attempts = Vec::new();

        if let Some(key) = &self.api_key {
            if let Ok(url) = Url::parse_with_params(
                &format!("{}/maps/api/place/textsearch/json", self.places_base),
                &[("query", query.as_str()), ("key", key.as_str()), ("language", "es")],
            ) {
                attempts.push((url.to_string(), Vec::new()));
            }
        }
        let places_attempts = attempts.len();

        if let Ok(url) = Url::parse_with_params(
            &format!("{}/search", self.search_base),
            &[("q", query.as_str()), ("hl", "es")],
        ) {
            attempts.push((url.to_string(), Vec::new()));
        }

        fetch_first(self.fetcher.as_ref(), &attempts, |index, body| {
            if index < places_attempts {
                serde_json::from_str::<Value>(body)
                    .ok()
                    .and_then(|json| parse_places_response(&json))
            } else {
                parse_search_page(body)
            }
        })
        .await
    }
}

pub fn parse_places_response(json: &Value) -> Option<ReviewSummary> {
    let status = json.get("status").and_then(Value::as_str);
    if status != Some("OK") {
        tracing::debug!("Places API status: {}", status.unwrap_or("missing"));
        return None;
    }
    let place = json.get("results")?.as_array()?.first()?;

    Some(ReviewSummary {
        platform: Platform::Google,
        rating: place.get("rating").and_then(Value::as_f64).map(|r| r as f32),
        rating_scale: 5.0,
        review_count: place
            .get("user_ratings_total")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        url: place
            .get("place_id")
            .and_then(Value::as_str)
            .map(|id| format!("https://www.google.com/maps/place/?q=place_id:{}", id)),
    })
}

pub fn parse_search_page(html: &str) -> Option<ReviewSummary> {
    let valid = |r: f32| (1.0..=5.0).contains(&r);

    let (rating, count) = match RATING_WITH_COUNT_RE
        .captures_iter(html)
        .find_map(|caps| {
            let rating = parse_rating(&caps[1]).filter(|r| valid(*r))?;
            Some((rating, parse_count(&caps[2])?))
        }) {
        Some((rating, count)) => (Some(rating), Some(count)),
        None => {
            let rating = [&*LABELLED_RATING_RE, &*OUT_OF_FIVE_RE]
                .into_iter()
                .flat_map(|re| re.captures_iter(html))
                .find_map(|caps| parse_rating(&caps[1]).filter(|r| valid(*r)));
            let count = REVIEW_COUNT_RE
                .captures(html)
                .and_then(|caps| parse_count(&caps[1]));
            (rating, count)
        }
    };

    if rating.is_none() && count.unwrap_or(0) == 0 {
        return None;
    }

    Some(ReviewSummary {
        platform: Platform::Google,
        rating,
        rating_scale: 5.0,
        review_count: count.unwrap_or(0),
        url: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_places_response() {
        let payload = json!({
            "status": "OK",
            "results": [{"name": "Casa Lola", "rating": 4.6, "user_ratings_total": 812, "place_id": "ChIJ123"}]
        });
        let summary = parse_places_response(&payload).unwrap();
        assert_eq!(summary.rating, Some(4.6));
        assert_eq!(summary.review_count, 812);
        assert!(summary.url.unwrap().ends_with("place_id:ChIJ123"));
    }

    #[test]
    fn test_places_zero_results() {
        let payload = json!({"status": "ZERO_RESULTS", "results": []});
        assert!(parse_places_response(&payload).is_none());
        assert!(parse_places_response(&json!({"results": []})).is_none());
    }

    #[test]
    fn test_parse_search_page_pair() {
        let html = r#"<div><span>Casa Lola</span><span>4,6</span><span>(1.234)</span> · Hotel</div>"#;
        let html = html.replace("</span><span>", " ");
        let summary = parse_search_page(&html).unwrap();
        assert_eq!(summary.rating, Some(4.6));
        assert_eq!(summary.review_count, 1234);
    }

    #[test]
    fn test_parse_search_page_labels() {
        let html = r#"<span aria-label="Calificación: 4,2 de 5">4,2</span> <a>356 reseñas de Google</a>"#;
        let summary = parse_search_page(html).unwrap();
        assert_eq!(summary.rating, Some(4.2));
        assert_eq!(summary.review_count, 356);
    }

    #[test]
    fn test_parse_search_page_nothing() {
        assert!(parse_search_page("<html><body>Sin resultados</body></html>").is_none());
    }
}
