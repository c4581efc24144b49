use crate::adapters::structured_data::json_ld_aggregate_rating;
use crate::config::Endpoints;
use crate::domain::model::{Business, OtaListing, Platform};
use crate::domain::ports::PageFetcher;
use crate::utils::text::{dashed_slug, parse_count, parse_rating, similarity};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use url::Url;

/// 搜尋結果中的 slug 與商家名稱相似度門檻
const SLUG_MATCH_THRESHOLD: f32 = 0.6;
/// 低於此金額多半是稅費或其他雜項
const MIN_NIGHTLY_PRICE_COP: u64 = 20_000;

static HOTEL_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/hotel/co/([a-z0-9-]+)(?:\.[a-z-]+)?\.html").expect("hotel slug regex")
});
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:COP|\$)\s?(\d{1,3}(?:[.,]\d{3})+|\d{5,})").expect("price regex")
});
static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:"ratingValue"\s*:\s*"?|puntuaci[oó]n:?\s*|scored\s+)(\d{1,2}(?:[.,]\d)?)"#)
        .expect("score regex")
});
static REVIEWS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d.,]*)\s+(?:comentarios|reviews|opiniones)").expect("reviews regex")
});

pub struct BookingScraper {
    fetcher: Arc<dyn PageFetcher>,
    base: String,
}

impl BookingScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, endpoints: &Endpoints) -> Self {
        Self {
            fetcher,
            base: endpoints.booking.trim_end_matches('/').to_string(),
        }
    }

    /// 有 Booking 網址時直接解析；否則搜尋並比對 slug 判斷是否上架
    pub async fn listing(&self, business: &Business) -> Option<OtaListing> {
        if !business.category.is_lodging() {
            return None;
        }

        if let Some(url) = &business.booking_url {
            return match self.fetcher.fetch_text(url, &[]).await {
                Ok(html) => Some(parse_listing_page(&html, url)),
                Err(e) => {
                    tracing::debug!("Booking listing fetch failed for {}: {}", business.name, e);
                    None
                }
            };
        }

        let query = format!("{} {}", business.name, business.city);
        let search_url = Url::parse_with_params(
            &format!("{}/searchresults.es.html", self.base),
            &[("ss", query.as_str())],
        )
        .ok()?;

        match self.fetcher.fetch_text(search_url.as_str(), &[]).await {
            Ok(html) => Some(self.parse_search_results(&html, business)),
            Err(e) => {
                tracing::debug!("Booking search failed for {}: {}", business.name, e);
                None
            }
        }
    }

    fn parse_search_results(&self, html: &str, business: &Business) -> OtaListing {
        let name_slug = dashed_slug(&business.name);
        let name_city_slug = dashed_slug(&format!("{} {}", business.name, business.city));
        let best = HOTEL_SLUG_RE
            .captures_iter(html)
            .map(|caps| caps[1].to_string())
            .map(|slug| {
                let score = similarity(&slug, &name_slug).max(similarity(&slug, &name_city_slug));
                (slug, score)
            })
            .filter(|(_, score)| *score >= SLUG_MATCH_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match best {
            Some((slug, _)) => OtaListing {
                platform: Platform::Booking,
                listed: true,
                url: Some(format!("{}/hotel/co/{}.html", self.base, slug)),
                rating: None,
                review_count: 0,
                price_from_cop: cheapest_price(html),
            },
            None => OtaListing {
                platform: Platform::Booking,
                listed: false,
                url: None,
                rating: None,
                review_count: 0,
                price_from_cop: None,
            },
        }
    }
}

pub fn parse_listing_page(html: &str, url: &str) -> OtaListing {
    let (rating, count) = match json_ld_aggregate_rating(html) {
        Some(aggregate) => {
            // Booking 使用十分制，少數頁面標示 bestRating=5
            let scale = aggregate.best_rating.unwrap_or(10.0);
            let rating = aggregate.rating.map(|r| {
                if (scale - 10.0).abs() < f32::EPSILON {
                    r
                } else {
                    r * 10.0 / scale
                }
            });
            (rating, aggregate.count)
        }
        None => (
            SCORE_RE
                .captures(html)
                .and_then(|caps| parse_rating(&caps[1])),
            REVIEWS_RE
                .captures(html)
                .and_then(|caps| parse_count(&caps[1])),
        ),
    };

    OtaListing {
        platform: Platform::Booking,
        listed: true,
        url: Some(url.to_string()),
        rating: rating.filter(|r| *r > 0.0 && *r <= 10.0),
        review_count: count.unwrap_or(0),
        price_from_cop: cheapest_price(html),
    }
}

fn cheapest_price(html: &str) -> Option<u64> {
    PRICE_RE
        .captures_iter(html)
        .filter_map(|caps| parse_count(&caps[1]))
        .filter(|price| *price >= MIN_NIGHTLY_PRICE_COP)
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_page_json_ld() {
        let html = r#"<script type="application/ld+json">
            {"@type":"Hotel","aggregateRating":{"ratingValue":8.7,"bestRating":10,"reviewCount":"1,532"}}
            </script><span>COP 420.000</span><span>COP 385.500</span><span>COP 5.000</span>"#;
        let listing = parse_listing_page(html, "https://www.booking.com/hotel/co/casa-lola.es.html");
        assert!(listing.listed);
        assert_eq!(listing.rating, Some(8.7));
        assert_eq!(listing.review_count, 1532);
        assert_eq!(listing.price_from_cop, Some(385_500));
    }

    #[test]
    fn test_parse_listing_page_regex_fallback() {
        let html = r#"<div>Puntuación: 9,1</div><div>248 comentarios</div>"#;
        let listing = parse_listing_page(html, "https://www.booking.com/hotel/co/x.html");
        assert_eq!(listing.rating, Some(9.1));
        assert_eq!(listing.review_count, 248);
        assert_eq!(listing.price_from_cop, None);
    }

    #[test]
    fn test_search_results_slug_match() {
        let scraper = BookingScraper::new(
            Arc::new(crate::adapters::http::HttpFetcher::new(5, "test").unwrap()),
            &Endpoints::all("https://booking.test"),
        );
        let business = Business::new("Casa Lola", "Cartagena", crate::domain::model::Category::BoutiqueHotel);

        let html = r#"<a href="/hotel/co/hostal-el-viajero.es.html">x</a>
                      <a href="/hotel/co/casa-lola-cartagena.es.html">y</a>"#;
        let listing = scraper.parse_search_results(html, &business);
        assert!(listing.listed);
        assert_eq!(
            listing.url.as_deref(),
            Some("https://booking.test/hotel/co/casa-lola-cartagena.html")
        );

        let listing = scraper.parse_search_results("<a href=\"/hotel/co/otro.html\">z</a>", &business);
        assert!(!listing.listed);
    }
}
