//! 文字處理小工具：去除重音、slug、數字解析、電話正規化與相似度。

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d[\d.,]*)\s*(?:(millones|mill|mil|k|m|b)\b)?").expect("count regex")
});

/// 將西班牙文常見重音字元轉為 ASCII
pub fn strip_accents(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'ñ' => 'n',
            'Ñ' => 'N',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// 小寫、去重音後以非英數字元切詞
pub fn tokens(input: &str) -> Vec<String> {
    strip_accents(input)
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// "Hotel Casa San Agustín" -> "hotelcasasanagustin"
pub fn compact_slug(input: &str) -> String {
    tokens(input).concat()
}

/// "Hotel Casa San Agustín" -> "hotel-casa-san-agustin"
pub fn dashed_slug(input: &str) -> String {
    tokens(input).join("-")
}

/// Dice coefficient over character bigrams of the compact slugs.
pub fn similarity(a: &str, b: &str) -> f32 {
    let a = compact_slug(a);
    let b = compact_slug(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut left: HashMap<&str, usize> = HashMap::new();
    for i in 0..a.len() - 1 {
        *left.entry(&a[i..i + 2]).or_default() += 1;
    }

    let mut shared = 0usize;
    for i in 0..b.len() - 1 {
        if let Some(count) = left.get_mut(&b[i..i + 2]) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    (2 * shared) as f32 / ((a.len() - 1) + (b.len() - 1)) as f32
}

/// 解析社群與評論數字，例如 "1,234"、"1.234"、"12.5K"、"12,5 mil"、"1.2M"
pub fn parse_count(raw: &str) -> Option<u64> {
    let caps = COUNT_RE.captures(raw)?;
    let number = caps.get(1)?.as_str().trim_end_matches(['.', ',']);
    let multiplier = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
        Some(suffix) if suffix == "k" || suffix == "mil" => 1_000.0,
        Some(suffix) if suffix == "m" || suffix.starts_with("mill") => 1_000_000.0,
        Some(suffix) if suffix == "b" => 1_000_000_000.0,
        _ => 1.0,
    };

    if multiplier > 1.0 {
        // 有單位時唯一的分隔符號視為小數點
        let value: f64 = number.replace(',', ".").parse().ok()?;
        return Some((value * multiplier).round() as u64);
    }

    number.replace(['.', ','], "").parse().ok()
}

/// "4,6" 或 "4.6" -> 4.6
pub fn parse_rating(raw: &str) -> Option<f32> {
    let value: f32 = raw.trim().replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}

/// 哥倫比亞手機號碼正規化為 +573XXXXXXXXX
pub fn normalize_co_mobile(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let national = match digits.len() {
        10 => digits.as_str(),
        12 if digits.starts_with("57") => &digits[2..],
        _ => return None,
    };
    if national.starts_with('3') {
        Some(format!("+57{}", national))
    } else {
        None
    }
}
