use crate::adapters::instagram::{extract_handles, normalize_handle, InstagramScraper};
use crate::config::toml_config::DiscoveryConfig;
use crate::config::Endpoints;
use crate::domain::model::{Business, DiscoverySource, InstagramMatch, InstagramProfile};
use crate::domain::ports::PageFetcher;
use crate::utils::text::{compact_slug, similarity, tokens};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use url::Url;

/// 猜測帳號時略過的類別字與冠詞
const GENERIC_WORDS: &[&str] = &[
    "hotel", "hostal", "hostel", "boutique", "glamping", "restaurante", "restaurant", "cafe",
    "bar", "tours", "tour", "el", "la", "los", "las", "de", "del", "y", "the", "and",
];
const PROFILE_LOOKUPS: usize = 3;
const CITY_BONUS: f32 = 0.10;
const WEBSITE_BONUS: f32 = 0.15;

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub best: Option<InstagramMatch>,
    pub profile: Option<InstagramProfile>,
    pub candidates: Vec<InstagramMatch>,
}

pub struct InstagramDiscovery {
    fetcher: Arc<dyn PageFetcher>,
    scraper: InstagramScraper,
    search_base: String,
    settings: DiscoveryConfig,
}

impl InstagramDiscovery {
    pub fn new(fetcher: Arc<dyn PageFetcher>, endpoints: &Endpoints, settings: DiscoveryConfig) -> Self {
        Self {
            scraper: InstagramScraper::new(fetcher.clone(), endpoints),
            fetcher,
            search_base: endpoints.duckduckgo.trim_end_matches('/').to_string(),
            settings,
        }
    }

    pub async fn discover(&self, business: &Business, website_html: Option<&str>) -> Discovery {
        let mut sources: BTreeMap<String, BTreeSet<DiscoverySource>> = BTreeMap::new();
        let mut profiles: HashMap<String, InstagramProfile> = HashMap::new();

        if let Some(handle) = business.instagram.as_deref().and_then(normalize_handle) {
            sources.entry(handle).or_default().insert(DiscoverySource::Provided);
        }

        if let Some(html) = website_html {
            for handle in extract_handles(html) {
                sources.entry(handle).or_default().insert(DiscoverySource::Website);
            }
        }

        if self.settings.search_enabled {
            for handle in self.search(business).await {
                sources.entry(handle).or_default().insert(DiscoverySource::Search);
            }
        }

        // 猜測的帳號必須確認存在才算來源，即使其他來源已提出
        for guess in handle_guesses(business, self.settings.max_handle_guesses) {
            if let Some(profile) = self.scraper.profile(&guess).await {
                sources.entry(guess.clone()).or_default().insert(DiscoverySource::HandleGuess);
                profiles.insert(guess, profile);
            }
        }

        let mut candidates = rank(
            sources
                .iter()
                .map(|(handle, found_by)| score_candidate(handle, found_by, business, profiles.get(handle)))
                .collect(),
        );

        // 只查詢前幾名的個人頁面，再以個人資料重新計分
        let mut looked_up = 0;
        for candidate in &candidates {
            if looked_up >= PROFILE_LOOKUPS {
                break;
            }
            if profiles.contains_key(&candidate.handle) {
                continue;
            }
            looked_up += 1;
            if let Some(profile) = self.scraper.profile(&candidate.handle).await {
                profiles.insert(candidate.handle.clone(), profile);
            }
        }
        if looked_up > 0 {
            candidates = rank(
                sources
                    .iter()
                    .map(|(handle, found_by)| {
                        score_candidate(handle, found_by, business, profiles.get(handle))
                    })
                    .collect(),
            );
        }

        let best = candidates
            .first()
            .filter(|m| m.confidence >= self.settings.min_confidence)
            .cloned();
        let profile = best.as_ref().and_then(|m| profiles.remove(&m.handle));

        match &best {
            Some(m) => tracing::debug!(
                "🔎 {} -> @{} (confidence {:.2}, sources {:?})",
                business.name,
                m.handle,
                m.confidence,
                m.sources
            ),
            None => tracing::debug!(
                "🔎 {}: no Instagram candidate above {:.2} ({} considered)",
                business.name,
                self.settings.min_confidence,
                candidates.len()
            ),
        }

        Discovery {
            best,
            profile,
            candidates,
        }
    }

    async fn search(&self, business: &Business) -> Vec<String> {
        let query = format!("site:instagram.com \"{}\" {}", business.name, business.city);
        let Ok(url) = Url::parse_with_params(
            &format!("{}/html/", self.search_base),
            &[("q", query.as_str())],
        ) else {
            return Vec::new();
        };

        match self.fetcher.fetch_text(url.as_str(), &[]).await {
            Ok(html) => extract_handles(&html),
            Err(e) => {
                tracing::debug!("Instagram search failed for {}: {}", business.name, e);
                Vec::new()
            }
        }
    }
}

/// 由商家名稱產生可能的帳號，例如 "Hotel Casa Lola" -> casalola、hotelcasalola、casa_lola…
pub fn handle_guesses(business: &Business, max: usize) -> Vec<String> {
    let all = tokens(&business.name);
    let significant: Vec<String> = all
        .iter()
        .filter(|t| !GENERIC_WORDS.contains(&t.as_str()))
        .cloned()
        .collect();
    let core = if significant.is_empty() { all.clone() } else { significant };
    if core.is_empty() {
        return Vec::new();
    }

    let city = compact_slug(&business.city);
    let category_word = match business.category.as_str() {
        "restaurant" => "restaurante",
        "tour_operator" => "tours",
        "glamping" => "glamping",
        "hostel" => "hostel",
        _ => "hotel",
    };

    let candidates = [
        core.concat(),
        all.concat(),
        format!("{}{}", core.concat(), city),
        core.join("_"),
        format!("{}{}", core.concat(), category_word),
        core.join("."),
        format!("{}_{}", core.concat(), city),
    ];

    let mut guesses: Vec<String> = Vec::new();
    for candidate in candidates {
        if let Some(handle) = normalize_handle(&candidate) {
            if !guesses.contains(&handle) {
                guesses.push(handle);
            }
        }
    }
    guesses.truncate(max);
    guesses
}

/// 多來源可信度：1 − Π(1 − base)，再依名稱相似度與個人資料加權
pub fn score_candidate(
    handle: &str,
    found_by: &BTreeSet<DiscoverySource>,
    business: &Business,
    profile: Option<&InstagramProfile>,
) -> InstagramMatch {
    let miss = found_by
        .iter()
        .fold(1.0f32, |acc, source| acc * (1.0 - source.base_confidence()));
    let mut confidence = (1.0 - miss) * (0.5 + 0.5 * similarity(handle, &business.name));

    if let Some(profile) = profile {
        let city = compact_slug(&business.city);
        let about = format!(
            "{} {}",
            profile.full_name.as_deref().unwrap_or_default(),
            profile.biography.as_deref().unwrap_or_default()
        );
        if !city.is_empty() && compact_slug(&about).contains(&city) {
            confidence += CITY_BONUS;
        }

        let site_host = business.website.as_deref().and_then(host_of);
        let link_host = profile.external_url.as_deref().and_then(host_of);
        if site_host.is_some() && site_host == link_host {
            confidence += WEBSITE_BONUS;
        }
    }

    InstagramMatch {
        handle: handle.to_string(),
        confidence: confidence.clamp(0.0, 1.0),
        sources: found_by.iter().copied().collect(),
    }
}

fn rank(mut candidates: Vec<InstagramMatch>) -> Vec<InstagramMatch> {
    candidates.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.sources.len().cmp(&a.sources.len()))
            .then_with(|| a.handle.cmp(&b.handle))
    });
    candidates
}

fn host_of(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.to_lowercase();
    Some(host.trim_start_matches("www.").to_string())
}
