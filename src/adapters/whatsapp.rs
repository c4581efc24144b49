use crate::domain::model::WhatsAppPresence;
use crate::utils::text::normalize_co_mobile;
use regex::Regex;
use std::sync::LazyLock;

static WA_ME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)wa\.me/(\+?\d{8,15})").expect("wa.me regex"));
static WA_API_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:api|web)\.whatsapp\.com/send/?\?(?:[^"'\s<>]*?&(?:amp;)?)?phone=(\+?\d{8,15})"#)
        .expect("whatsapp api regex")
});
static WA_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)wa\.link/[a-z0-9]+").expect("wa.link regex"));
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bwhats\s?app\b").expect("mention regex"));
static CO_MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+|\b)(?:57[\s.-]?)?3\d{2}[\s.-]?\d{3}[\s.-]?\d{4}\b").expect("mobile regex")
});

/// 掃描網站、Instagram 簡介等文字，判斷 WhatsApp 聯絡管道
pub fn detect(texts: &[&str], listed_phone: Option<&str>) -> WhatsAppPresence {
    let mut presence = WhatsAppPresence::default();

    for text in texts {
        for caps in WA_ME_RE.captures_iter(text).chain(WA_API_RE.captures_iter(text)) {
            presence.click_to_chat = true;
            push_unique(&mut presence.numbers, normalize_any(&caps[1]));
        }
        if WA_LINK_RE.is_match(text) {
            presence.click_to_chat = true;
        }
        if MENTION_RE.is_match(text) {
            presence.mentions_whatsapp = true;
        }
        for found in CO_MOBILE_RE.find_iter(text) {
            if let Some(number) = normalize_co_mobile(found.as_str()) {
                push_unique(&mut presence.numbers, number);
            }
        }
    }

    if let Some(number) = listed_phone.and_then(normalize_co_mobile) {
        presence.mobile_listed = true;
        push_unique(&mut presence.numbers, number);
    }

    presence
}

fn normalize_any(raw: &str) -> String {
    normalize_co_mobile(raw).unwrap_or_else(|| {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        format!("+{}", digits)
    })
}

fn push_unique(numbers: &mut Vec<String>, number: String) {
    if !numbers.contains(&number) {
        numbers.push(number);
    }
}
