//! 商機分數：各項訊號加總，上限 100。

use crate::domain::model::{BusinessAudit, OpportunityScore, ScoreSignal, Tier};

pub const HOT_THRESHOLD: u8 = 70;
pub const WARM_THRESHOLD: u8 = 45;

pub fn tier_for(total: u8) -> Tier {
    if total >= HOT_THRESHOLD {
        Tier::Hot
    } else if total >= WARM_THRESHOLD {
        Tier::Warm
    } else {
        Tier::Cold
    }
}

pub fn score(audit: &BusinessAudit) -> OpportunityScore {
    let mut signals = Vec::new();
    let mut add = |name: &str, points: u8, detail: String| {
        if points > 0 {
            signals.push(ScoreSignal {
                name: name.to_string(),
                points,
                detail,
            });
        }
    };

    // 需求證明：評論越多代表已有客流
    let reviews = audit.total_reviews();
    let demand = match reviews {
        n if n >= 500 => 20,
        n if n >= 100 => 15,
        n if n >= 20 => 8,
        _ => 0,
    };
    add("demand_proof", demand, format!("{} reviews across platforms", reviews));

    match audit.best_rating() {
        None => add("reputation_gap", 10, "no public rating found".to_string()),
        Some(r) if r < 4.0 => add("reputation_gap", 20, format!("best rating {:.1}/5", r)),
        Some(r) if r < 4.5 => add("reputation_gap", 12, format!("best rating {:.1}/5", r)),
        Some(r) => add("reputation_gap", 3, format!("best rating {:.1}/5", r)),
    }

    if audit.ota_listed() {
        add("ota_dependency", 20, "listed on Booking.com".to_string());
        if audit.business.website.is_none() {
            add("no_direct_channel", 10, "OTA listing without own website".to_string());
        }
    }

    let whatsapp = &audit.whatsapp;
    if !whatsapp.has_channel() {
        add("whatsapp_missing", 15, "no WhatsApp contact on website or bio".to_string());
    } else if !whatsapp.click_to_chat {
        add("whatsapp_no_link", 6, "WhatsApp mentioned without click-to-chat link".to_string());
    }

    match &audit.instagram {
        None => add("instagram_missing", 15, "no Instagram profile found".to_string()),
        Some(profile) => {
            let followers = match profile.followers {
                n if n < 1_000 => 12,
                n if n < 5_000 => 6,
                _ => 0,
            };
            add(
                "instagram_small",
                followers,
                format!("@{} has {} followers", profile.username, profile.followers),
            );
            if profile.posts < 30 {
                add(
                    "instagram_inactive",
                    5,
                    format!("@{} has {} posts", profile.username, profile.posts),
                );
            }
        }
    }

    let total = signals
        .iter()
        .map(|s| s.points as u32)
        .sum::<u32>()
        .min(100) as u8;

    OpportunityScore {
        total,
        tier: tier_for(total),
        signals,
    }
}
