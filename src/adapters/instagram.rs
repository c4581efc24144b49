use crate::adapters::http::fetch_first;
use crate::adapters::structured_data::meta_content;
use crate::config::Endpoints;
use crate::domain::model::{InstagramProfile, ProfileSource};
use crate::domain::ports::PageFetcher;
use crate::utils::text::parse_count;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

/// Instagram web client 的公開 app id
const IG_APP_ID: &str = "936619743392459";

/// 不是帳號的路徑
const RESERVED_PATHS: &[&str] = &[
    "p", "reel", "reels", "explore", "accounts", "stories", "tv", "about", "developer",
    "legal", "direct", "web", "share", "sharer", "embed", "tags", "locations",
];

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._]{1,30}$").expect("handle regex"));
static PROFILE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)instagram\.com/([A-Za-z0-9._]{1,30})(?:[/?#]|\b)").expect("link regex")
});
static FOLLOWERS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d.,]*\s*(?:k|m|mil)?)\s+(?:followers|seguidores)").expect("followers regex")
});
static FOLLOWING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d.,]*\s*(?:k|m|mil)?)\s+(?:following|seguidos)").expect("following regex")
});
static POSTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d.,]*\s*(?:k|m|mil)?)\s+(?:posts|publicaciones)").expect("posts regex")
});
static FULL_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:from|de)\s+(?:instagram\s+de\s+)?(.+?)\s+\(@[A-Za-z0-9._]+\)").expect("full name regex")
});
static BIOGRAPHY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""biography":"((?:[^"\\]|\\.)*)""#).expect("biography regex")
});
static EXTERNAL_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""external_url":"((?:[^"\\]|\\.)*)""#).expect("external url regex")
});

/// "@Casa.Lola"、"https://www.instagram.com/casa.lola/?hl=es" -> "casa.lola"
pub fn normalize_handle(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let rest = match lowered.find("instagram.com/") {
        Some(pos) => &lowered[pos + "instagram.com/".len()..],
        None => lowered.as_str(),
    };
    let handle = rest
        .trim_start_matches('@')
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('.');

    if HANDLE_RE.is_match(handle) && !RESERVED_PATHS.contains(&handle) {
        Some(handle.to_string())
    } else {
        None
    }
}

/// 從任意 HTML 或文字中找出 instagram.com/<handle> 連結
pub fn extract_handles(text: &str) -> Vec<String> {
    let unique: BTreeSet<String> = PROFILE_LINK_RE
        .captures_iter(text)
        .filter_map(|caps| normalize_handle(&caps[1]))
        .collect();
    unique.into_iter().collect()
}

pub struct InstagramScraper {
    fetcher: Arc<dyn PageFetcher>,
    web_base: String,
    api_base: String,
}

impl InstagramScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, endpoints: &Endpoints) -> Self {
        Self {
            fetcher,
            web_base: endpoints.instagram_web.trim_end_matches('/').to_string(),
            api_base: endpoints.instagram_api.trim_end_matches('/').to_string(),
        }
    }

    /// 依序嘗試 web_profile_info API 與個人頁面，取第一個可解析的結果
    pub async fn profile(&self, raw_handle: &str) -> Option<InstagramProfile> {
        let Some(handle) = normalize_handle(raw_handle) else {
            tracing::debug!("Rejecting invalid Instagram handle '{}'", raw_handle);
            return None;
        };

        let attempts = vec![
            (
                format!(
                    "{}/api/v1/users/web_profile_info/?username={}",
                    self.api_base, handle
                ),
                vec![("x-ig-app-id", IG_APP_ID)],
            ),
            (format!("{}/{}/", self.web_base, handle), vec![]),
        ];

        let profile = fetch_first(self.fetcher.as_ref(), &attempts, |index, body| match index {
            0 => serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|json| parse_web_profile_info(&handle, &json)),
            _ => parse_profile_page(&handle, body),
        })
        .await;

        match &profile {
            Some(p) => tracing::debug!(
                "📸 @{}: {} followers via {:?}",
                p.username,
                p.followers,
                p.source
            ),
            None => tracing::debug!("No Instagram profile data for @{}", handle),
        }
        profile
    }
}

pub fn parse_web_profile_info(handle: &str, json: &Value) -> Option<InstagramProfile> {
    let user = json.pointer("/data/user")?;
    if !user.is_object() {
        return None;
    }
    let count = |path: &str| user.pointer(path).and_then(Value::as_u64).unwrap_or(0);
    let text = |key: &str| {
        user.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(InstagramProfile {
        username: text("username").unwrap_or_else(|| handle.to_string()),
        full_name: text("full_name"),
        biography: text("biography"),
        followers: count("/edge_followed_by/count"),
        following: count("/edge_follow/count"),
        posts: count("/edge_owner_to_timeline_media/count"),
        external_url: text("external_url"),
        is_business: user
            .get("is_business_account")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        is_verified: user.get("is_verified").and_then(Value::as_bool).unwrap_or(false),
        category: text("category_name"),
        source: ProfileSource::WebProfileApi,
    })
}

/// 從 og:description 解析，例如
/// "1,234 Followers, 56 Following, 78 Posts - See Instagram photos and videos from Casa Lola (@casalola)"
pub fn parse_profile_page(handle: &str, html: &str) -> Option<InstagramProfile> {
    let description = meta_content(html, "og:description")
        .or_else(|| meta_content(html, "description"))?;

    let capture_count =
        |re: &Regex| re.captures(&description).and_then(|caps| parse_count(&caps[1]));
    let followers = capture_count(&FOLLOWERS_RE)?;

    Some(InstagramProfile {
        username: handle.to_string(),
        full_name: FULL_NAME_RE
            .captures(&description)
            .map(|caps| caps[1].trim().to_string()),
        biography: embedded_string(&BIOGRAPHY_RE, html),
        followers,
        following: capture_count(&FOLLOWING_RE).unwrap_or(0),
        posts: capture_count(&POSTS_RE).unwrap_or(0),
        external_url: embedded_string(&EXTERNAL_URL_RE, html),
        is_business: html.contains(r#""is_business_account":true"#),
        is_verified: html.contains(r#""is_verified":true"#),
        category: None,
        source: ProfileSource::ProfilePage,
    })
}

/// 頁面內嵌 JSON 的字串欄位，需處理跳脫字元
fn embedded_string(re: &Regex, html: &str) -> Option<String> {
    let raw = re.captures(html)?.get(1)?.as_str();
    serde_json::from_str::<String>(&format!("\"{}\"", raw))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
