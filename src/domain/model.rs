use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::text::strip_accents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Hotel,
    BoutiqueHotel,
    Hostel,
    Glamping,
    VacationRental,
    Restaurant,
    TourOperator,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Hotel,
        Category::BoutiqueHotel,
        Category::Hostel,
        Category::Glamping,
        Category::VacationRental,
        Category::Restaurant,
        Category::TourOperator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hotel => "hotel",
            Category::BoutiqueHotel => "boutique_hotel",
            Category::Hostel => "hostel",
            Category::Glamping => "glamping",
            Category::VacationRental => "vacation_rental",
            Category::Restaurant => "restaurant",
            Category::TourOperator => "tour_operator",
        }
    }

    /// 住宿類才會出現在 OTA 上
    pub fn is_lodging(&self) -> bool {
        !matches!(self, Category::Restaurant | Category::TourOperator)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = strip_accents(s.trim()).to_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "hotel" => Ok(Category::Hotel),
            "boutique_hotel" | "hotel_boutique" | "boutique" => Ok(Category::BoutiqueHotel),
            "hostel" | "hostal" | "hostel_backpackers" => Ok(Category::Hostel),
            "glamping" | "ecolodge" | "eco_lodge" => Ok(Category::Glamping),
            "vacation_rental" | "finca" | "apartamento" | "casa_vacacional" | "airbnb" => {
                Ok(Category::VacationRental)
            }
            "restaurant" | "restaurante" | "cafe" | "bar" => Ok(Category::Restaurant),
            "tour_operator" | "tours" | "agencia" | "agencia_de_viajes" | "operador_turistico" => {
                Ok(Category::TourOperator)
            }
            other => Err(format!("unknown business category: {}", other)),
        }
    }
}

/// 要稽核的目標商家
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub name: String,
    pub city: String,
    pub category: Category,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tripadvisor_url: Option<String>,
    #[serde(default)]
    pub booking_url: Option<String>,
    /// 房間、床位或座位數；缺省時使用類別預設值
    #[serde(default)]
    pub units: Option<u32>,
}

impl Business {
    pub fn new(name: impl Into<String>, city: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            city: city.into(),
            category,
            website: None,
            instagram: None,
            phone: None,
            tripadvisor_url: None,
            booking_url: None,
            units: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    WebProfileApi,
    ProfilePage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstagramProfile {
    pub username: String,
    pub full_name: Option<String>,
    pub biography: Option<String>,
    pub followers: u64,
    pub following: u64,
    pub posts: u64,
    pub external_url: Option<String>,
    pub is_business: bool,
    pub is_verified: bool,
    pub category: Option<String>,
    pub source: ProfileSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Provided,
    Website,
    Search,
    HandleGuess,
}

impl DiscoverySource {
    /// 單一來源的基礎可信度
    pub fn base_confidence(&self) -> f32 {
        match self {
            DiscoverySource::Provided => 0.95,
            DiscoverySource::Website => 0.85,
            DiscoverySource::Search => 0.45,
            DiscoverySource::HandleGuess => 0.40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstagramMatch {
    pub handle: String,
    pub confidence: f32,
    pub sources: Vec<DiscoverySource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Google,
    TripAdvisor,
    Booking,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Google => "google",
            Platform::TripAdvisor => "tripadvisor",
            Platform::Booking => "booking",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub platform: Platform,
    pub rating: Option<f32>,
    pub rating_scale: f32,
    pub review_count: u64,
    pub url: Option<String>,
}

impl ReviewSummary {
    /// 換算為五分制
    pub fn normalized_rating(&self) -> Option<f32> {
        let rating = self.rating?;
        if self.rating_scale <= 0.0 {
            return None;
        }
        Some(rating * 5.0 / self.rating_scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtaListing {
    pub platform: Platform,
    pub listed: bool,
    pub url: Option<String>,
    /// 十分制
    pub rating: Option<f32>,
    pub review_count: u64,
    pub price_from_cop: Option<u64>,
}

impl OtaListing {
    pub fn as_review_summary(&self) -> Option<ReviewSummary> {
        if !self.listed || (self.rating.is_none() && self.review_count == 0) {
            return None;
        }
        Some(ReviewSummary {
            platform: self.platform,
            rating: self.rating,
            rating_scale: 10.0,
            review_count: self.review_count,
            url: self.url.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhatsAppPresence {
    pub click_to_chat: bool,
    pub mentions_whatsapp: bool,
    pub numbers: Vec<String>,
    pub mobile_listed: bool,
}

impl WhatsAppPresence {
    pub fn has_channel(&self) -> bool {
        self.click_to_chat || self.mentions_whatsapp
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessAudit {
    pub business: Business,
    pub scraped_at: DateTime<Utc>,
    pub instagram_match: Option<InstagramMatch>,
    pub instagram: Option<InstagramProfile>,
    pub google: Option<ReviewSummary>,
    pub tripadvisor: Option<ReviewSummary>,
    pub ota: Option<OtaListing>,
    pub whatsapp: WhatsAppPresence,
    /// 抓取失敗的來源名稱，僅供紀錄
    pub failed_sources: Vec<String>,
}

impl BusinessAudit {
    pub fn new(business: Business) -> Self {
        Self {
            business,
            scraped_at: Utc::now(),
            instagram_match: None,
            instagram: None,
            google: None,
            tripadvisor: None,
            ota: None,
            whatsapp: WhatsAppPresence::default(),
            failed_sources: Vec::new(),
        }
    }

    pub fn review_summaries(&self) -> Vec<ReviewSummary> {
        let mut summaries: Vec<ReviewSummary> =
            [self.google.clone(), self.tripadvisor.clone()].into_iter().flatten().collect();
        if let Some(ota) = self.ota.as_ref().and_then(OtaListing::as_review_summary) {
            summaries.push(ota);
        }
        summaries
    }

    pub fn total_reviews(&self) -> u64 {
        self.review_summaries().iter().map(|r| r.review_count).sum()
    }

    /// 各平台中最好的五分制評分
    pub fn best_rating(&self) -> Option<f32> {
        self.review_summaries()
            .iter()
            .filter_map(ReviewSummary::normalized_rating)
            .fold(None, |best, r| Some(best.map_or(r, |b: f32| b.max(r))))
    }

    pub fn ota_listed(&self) -> bool {
        self.ota.as_ref().is_some_and(|o| o.listed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Cold,
    Warm,
    Hot,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Cold => "cold",
            Tier::Warm => "warm",
            Tier::Hot => "hot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSignal {
    pub name: String,
    pub points: u8,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityScore {
    pub total: u8,
    pub tier: Tier,
    pub signals: Vec<ScoreSignal>,
}

/// 每月流失金額（COP）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeakEstimate {
    pub monthly_revenue_cop: u64,
    pub ota_commission_cop: u64,
    pub missed_inquiries_cop: u64,
    pub reputation_gap_cop: u64,
    pub social_presence_cop: u64,
    pub total_monthly_cop: u64,
    pub total_annual_cop: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub audit: BusinessAudit,
    pub score: OpportunityScore,
    pub leak: LeakEstimate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadReport {
    pub generated_at: DateTime<Utc>,
    pub leads: Vec<Lead>,
}

impl LeadReport {
    pub fn rows(&self) -> Vec<LeadRow> {
        self.leads.iter().map(LeadRow::from).collect()
    }
}

/// 匯出 CSV 與寫入 Supabase 用的扁平列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRow {
    pub name: String,
    pub city: String,
    pub category: String,
    pub website: Option<String>,
    pub instagram_handle: Option<String>,
    pub instagram_confidence: Option<f32>,
    pub instagram_followers: Option<u64>,
    pub google_rating: Option<f32>,
    pub google_reviews: Option<u64>,
    pub tripadvisor_rating: Option<f32>,
    pub tripadvisor_reviews: Option<u64>,
    pub ota_listed: bool,
    pub ota_rating: Option<f32>,
    pub whatsapp_click_to_chat: bool,
    pub whatsapp_number: Option<String>,
    pub score: u8,
    pub tier: String,
    pub monthly_leak_cop: u64,
    pub annual_leak_cop: u64,
    pub scraped_at: DateTime<Utc>,
}

impl From<&Lead> for LeadRow {
    fn from(lead: &Lead) -> Self {
        let audit = &lead.audit;
        Self {
            name: audit.business.name.clone(),
            city: audit.business.city.clone(),
            category: audit.business.category.to_string(),
            website: audit.business.website.clone(),
            instagram_handle: audit.instagram_match.as_ref().map(|m| m.handle.clone()),
            instagram_confidence: audit.instagram_match.as_ref().map(|m| m.confidence),
            instagram_followers: audit.instagram.as_ref().map(|p| p.followers),
            google_rating: audit.google.as_ref().and_then(|g| g.rating),
            google_reviews: audit.google.as_ref().map(|g| g.review_count),
            tripadvisor_rating: audit.tripadvisor.as_ref().and_then(|t| t.rating),
            tripadvisor_reviews: audit.tripadvisor.as_ref().map(|t| t.review_count),
            ota_listed: audit.ota_listed(),
            ota_rating: audit.ota.as_ref().and_then(|o| o.rating),
            whatsapp_click_to_chat: audit.whatsapp.click_to_chat,
            whatsapp_number: audit.whatsapp.numbers.first().cloned(),
            score: lead.score.total,
            tier: lead.score.tier.as_str().to_string(),
            monthly_leak_cop: lead.leak.total_monthly_cop,
            annual_leak_cop: lead.leak.total_annual_cop,
            scraped_at: audit.scraped_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_aliases() {
        assert_eq!("Hotel Boutique".parse::<Category>(), Ok(Category::BoutiqueHotel));
        assert_eq!("restaurante".parse::<Category>(), Ok(Category::Restaurant));
        assert_eq!("finca".parse::<Category>(), Ok(Category::VacationRental));
        assert_eq!("tour-operator".parse::<Category>(), Ok(Category::TourOperator));
        assert!("spaceport".parse::<Category>().is_err());
    }

    #[test]
    fn test_best_rating_normalizes_ota_scale() {
        let mut audit = BusinessAudit::new(Business::new("Casa Lola", "Cartagena", Category::Hotel));
        audit.google = Some(ReviewSummary {
            platform: Platform::Google,
            rating: Some(4.2),
            rating_scale: 5.0,
            review_count: 120,
            url: None,
        });
        audit.ota = Some(OtaListing {
            platform: Platform::Booking,
            listed: true,
            url: None,
            rating: Some(9.0),
            review_count: 80,
            price_from_cop: None,
        });

        assert_eq!(audit.total_reviews(), 200);
        let best = audit.best_rating().unwrap();
        assert!((best - 4.5).abs() < 1e-6);
        assert!(audit.ota_listed());
    }

    #[test]
    fn test_unlisted_ota_is_not_a_review_source() {
        let listing = OtaListing {
            platform: Platform::Booking,
            listed: false,
            url: None,
            rating: Some(8.0),
            review_count: 10,
            price_from_cop: None,
        };
        assert!(listing.as_review_summary().is_none());
    }
}
