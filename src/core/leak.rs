//! 財務流失估算（COP / 月）。全部是固定公式，數字僅供銷售對話參考。

use crate::domain::model::{BusinessAudit, Category, LeakEstimate};
use crate::utils::error::{LeadError, Result};
use crate::utils::validation::validate_range;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DAYS_PER_MONTH: f64 = 30.0;
const TARGET_RATING: f64 = 4.5;
const MISSING_RATING_GAP: f64 = 0.5;
const SOCIAL_FOLLOWER_FLOOR: u64 = 1_000;

/// 類別預設值：單位數、平均每日房價 (ADR, COP)、住房率
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    pub units: u32,
    pub adr_cop: u64,
    pub occupancy: f64,
}

pub fn default_profile(category: Category) -> CategoryProfile {
    let (units, adr_cop, occupancy) = match category {
        Category::Hotel => (25, 280_000, 0.60),
        Category::BoutiqueHotel => (12, 450_000, 0.55),
        Category::Hostel => (30, 60_000, 0.65),
        Category::Glamping => (6, 380_000, 0.50),
        Category::VacationRental => (3, 550_000, 0.45),
        // 餐廳：座位數 × 平均客單價 × 翻桌率
        Category::Restaurant => (40, 65_000, 0.45),
        // 旅行社：每日團位 × 平均團費
        Category::TourOperator => (15, 180_000, 0.40),
    };
    CategoryProfile {
        units,
        adr_cop,
        occupancy,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeakAssumptions {
    pub ota_share: f64,
    pub ota_commission: f64,
    pub missed_inquiry_rate: f64,
    pub unlinked_inquiry_rate: f64,
    pub revenue_per_star: f64,
    pub social_rate: f64,
    /// 依類別覆寫預設值，鍵為類別名（可用別名，例如 "finca"）
    pub categories: HashMap<String, CategoryProfile>,
}

impl Default for LeakAssumptions {
    fn default() -> Self {
        Self {
            ota_share: 0.60,
            ota_commission: 0.18,
            missed_inquiry_rate: 0.08,
            unlinked_inquiry_rate: 0.03,
            revenue_per_star: 0.09,
            social_rate: 0.03,
            categories: HashMap::new(),
        }
    }
}

impl LeakAssumptions {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("assumptions.ota_share", self.ota_share),
            ("assumptions.ota_commission", self.ota_commission),
            ("assumptions.missed_inquiry_rate", self.missed_inquiry_rate),
            ("assumptions.unlinked_inquiry_rate", self.unlinked_inquiry_rate),
            ("assumptions.revenue_per_star", self.revenue_per_star),
            ("assumptions.social_rate", self.social_rate),
        ] {
            validate_range(field, value, 0.0, 1.0)?;
        }
        // 別名指向同一類別時無法決定用哪一組數字
        let mut seen: HashMap<Category, &str> = HashMap::new();
        for (category, profile) in &self.categories {
            let Ok(parsed) = category.parse::<Category>() else {
                return Err(LeadError::InvalidConfigValueError {
                    field: "assumptions.categories".to_string(),
                    value: category.clone(),
                    reason: "Unknown business category".to_string(),
                });
            };
            if let Some(other) = seen.insert(parsed, category) {
                return Err(LeadError::InvalidConfigValueError {
                    field: "assumptions.categories".to_string(),
                    value: category.clone(),
                    reason: format!("Same category as \"{}\"", other),
                });
            }
            validate_range(
                &format!("assumptions.categories.{}.occupancy", category),
                profile.occupancy,
                0.0,
                1.0,
            )?;
        }
        Ok(())
    }

    pub fn profile_for(&self, category: Category) -> CategoryProfile {
        self.categories
            .iter()
            .find(|(key, _)| key.parse::<Category>() == Ok(category))
            .map(|(_, profile)| *profile)
            .unwrap_or_else(|| default_profile(category))
    }
}

pub fn estimate(audit: &BusinessAudit, assumptions: &LeakAssumptions) -> LeakEstimate {
    let mut profile = assumptions.profile_for(audit.business.category);
    if let Some(units) = audit.business.units {
        profile.units = units;
    }

    let revenue = profile.units as f64 * DAYS_PER_MONTH * profile.occupancy * profile.adr_cop as f64;

    let ota = if audit.ota_listed() {
        revenue * assumptions.ota_share * assumptions.ota_commission
    } else {
        0.0
    };

    let whatsapp = &audit.whatsapp;
    let missed = if !whatsapp.has_channel() {
        revenue * assumptions.missed_inquiry_rate
    } else if !whatsapp.click_to_chat {
        revenue * assumptions.unlinked_inquiry_rate
    } else {
        0.0
    };

    let gap = match audit.best_rating() {
        Some(r) => (TARGET_RATING - r as f64).max(0.0),
        None => MISSING_RATING_GAP,
    };
    let reputation = revenue * gap * assumptions.revenue_per_star;

    let weak_social = audit
        .instagram
        .as_ref()
        .map_or(true, |p| p.followers < SOCIAL_FOLLOWER_FLOOR);
    let social = if weak_social {
        revenue * assumptions.social_rate
    } else {
        0.0
    };

    let ota_commission_cop = round_cop(ota);
    let missed_inquiries_cop = round_cop(missed);
    let reputation_gap_cop = round_cop(reputation);
    let social_presence_cop = round_cop(social);
    let total_monthly_cop =
        ota_commission_cop + missed_inquiries_cop + reputation_gap_cop + social_presence_cop;

    LeakEstimate {
        monthly_revenue_cop: round_cop(revenue),
        ota_commission_cop,
        missed_inquiries_cop,
        reputation_gap_cop,
        social_presence_cop,
        total_monthly_cop,
        total_annual_cop: total_monthly_cop * 12,
    }
}

/// 四捨五入到千元
fn round_cop(value: f64) -> u64 {
    ((value / 1_000.0).round() * 1_000.0).max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        Business, InstagramProfile, OtaListing, Platform, ProfileSource, ReviewSummary,
        WhatsAppPresence,
    };

    fn boutique(units: u32) -> BusinessAudit {
        let mut business = Business::new("Casa Lola", "Cartagena", Category::BoutiqueHotel);
        business.units = Some(units);
        BusinessAudit::new(business)
    }

    #[test]
    fn test_round_cop() {
        assert_eq!(round_cop(1_499.0), 1_000);
        assert_eq!(round_cop(1_500.0), 2_000);
        assert_eq!(round_cop(0.0), 0);
    }

    #[test]
    fn test_bare_audit() {
        // 10 房 × 30 天 × 0.55 × 450.000 = 74.250.000
        let leak = estimate(&boutique(10), &LeakAssumptions::default());
        assert_eq!(leak.monthly_revenue_cop, 74_250_000);
        assert_eq!(leak.ota_commission_cop, 0);
        assert_eq!(leak.missed_inquiries_cop, 5_940_000);
        // 無評分視為差半顆星
        assert_eq!(leak.reputation_gap_cop, 3_341_000);
        assert_eq!(leak.social_presence_cop, 2_228_000);
        assert_eq!(leak.total_monthly_cop, 5_940_000 + 3_341_000 + 2_228_000);
        assert_eq!(leak.total_annual_cop, leak.total_monthly_cop * 12);
    }

    #[test]
    fn test_ota_listed_with_good_presence() {
        let mut audit = boutique(10);
        audit.ota = Some(OtaListing {
            platform: Platform::Booking,
            listed: true,
            url: None,
            rating: None,
            review_count: 0,
            price_from_cop: None,
        });
        audit.google = Some(ReviewSummary {
            platform: Platform::Google,
            rating: Some(4.5),
            rating_scale: 5.0,
            review_count: 300,
            url: None,
        });
        audit.whatsapp = WhatsAppPresence {
            click_to_chat: true,
            ..Default::default()
        };
        audit.instagram = Some(InstagramProfile {
            username: "casalola".to_string(),
            full_name: None,
            biography: None,
            followers: 12_000,
            following: 0,
            posts: 400,
            external_url: None,
            is_business: true,
            is_verified: false,
            category: None,
            source: ProfileSource::WebProfileApi,
        });

        let leak = estimate(&audit, &LeakAssumptions::default());
        // 74.250.000 × 0.6 × 0.18
        assert_eq!(leak.ota_commission_cop, 8_019_000);
        assert_eq!(leak.missed_inquiries_cop, 0);
        assert_eq!(leak.reputation_gap_cop, 0);
        assert_eq!(leak.social_presence_cop, 0);
        assert_eq!(leak.total_monthly_cop, 8_019_000);
    }

    #[test]
    fn test_category_override() {
        let mut assumptions = LeakAssumptions::default();
        assumptions.categories.insert(
            "restaurante".to_string(),
            CategoryProfile {
                units: 10,
                adr_cop: 100_000,
                occupancy: 1.0,
            },
        );
        let audit = BusinessAudit::new(Business::new("La Cevichería", "Cartagena", Category::Restaurant));
        let leak = estimate(&audit, &assumptions);
        assert_eq!(leak.monthly_revenue_cop, 30_000_000);
    }

    #[test]
    fn test_invalid_assumptions() {
        let assumptions = LeakAssumptions {
            ota_commission: 1.5,
            ..Default::default()
        };
        assert!(assumptions.validate().is_err());

        let mut assumptions = LeakAssumptions::default();
        assumptions.categories.insert("spaceport".to_string(), default_profile(Category::Hotel));
        assert!(assumptions.validate().is_err());
    }

    #[test]
    fn test_alias_keys_for_same_category_rejected() {
        let mut assumptions = LeakAssumptions::default();
        assumptions.categories.insert("finca".to_string(), default_profile(Category::VacationRental));
        assert!(assumptions.validate().is_ok());

        let mut other = default_profile(Category::VacationRental);
        other.units = 8;
        assumptions.categories.insert("vacation_rental".to_string(), other);
        assert!(matches!(
            assumptions.validate(),
            Err(LeadError::InvalidConfigValueError { ref field, .. }) if field == "assumptions.categories"
        ));
    }
}
