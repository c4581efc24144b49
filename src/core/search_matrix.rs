//! 開發名單用的搜尋詞矩陣：類別詞 × 修飾詞 × 城市。

use crate::domain::model::Category;
use crate::utils::text::{compact_slug, strip_accents};
use serde::Serialize;
use std::collections::HashSet;

const MODIFIER_WEIGHT: f32 = 0.8;
const UNKNOWN_CITY_WEIGHT: f32 = 0.5;

/// 目的地城市與權重
pub const CITIES: &[(&str, f32)] = &[
    ("Cartagena", 1.0),
    ("Medellín", 0.95),
    ("Santa Marta", 0.9),
    ("San Andrés", 0.85),
    ("Bogotá", 0.8),
    ("Guatapé", 0.8),
    ("Villa de Leyva", 0.75),
    ("Salento", 0.75),
    ("Palomino", 0.7),
    ("Minca", 0.7),
    ("Barichara", 0.7),
    ("Cali", 0.7),
];

fn category_weight(category: Category) -> f32 {
    match category {
        Category::BoutiqueHotel => 1.0,
        Category::Glamping => 0.95,
        Category::Hotel => 0.9,
        Category::VacationRental => 0.8,
        Category::Hostel => 0.7,
        Category::TourOperator => 0.65,
        Category::Restaurant => 0.6,
    }
}

fn seed_terms(category: Category) -> &'static [&'static str] {
    match category {
        Category::Hotel => &["hotel"],
        Category::BoutiqueHotel => &["hotel boutique", "casa hotel"],
        Category::Hostel => &["hostal", "hostel"],
        Category::Glamping => &["glamping", "ecolodge"],
        Category::VacationRental => &["finca", "casa vacacional", "apartamento turístico"],
        Category::Restaurant => &["restaurante"],
        Category::TourOperator => &["tours", "agencia de turismo"],
    }
}

fn modifiers(category: Category) -> &'static [&'static str] {
    match category {
        Category::Hotel => &["con piscina", "frente al mar"],
        Category::BoutiqueHotel => &["de lujo", "romántico"],
        Category::Hostel => &["para mochileros"],
        Category::Glamping => &["con jacuzzi", "romántico"],
        Category::VacationRental => &["con piscina", "para grupos"],
        Category::Restaurant => &["de mariscos", "con vista"],
        Category::TourOperator => &["privados", "en lancha"],
    }
}

pub fn city_weight(city: &str) -> f32 {
    let wanted = compact_slug(city);
    CITIES
        .iter()
        .find(|(name, _)| compact_slug(name) == wanted)
        .map(|(_, weight)| *weight)
        .unwrap_or(UNKNOWN_CITY_WEIGHT)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    pub text: String,
    pub category: Category,
    pub city: String,
    pub term: String,
    pub modifier: Option<String>,
    pub priority: f32,
}

impl SearchQuery {
    pub fn maps_url(&self) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(self.text.as_bytes()).collect();
        format!("https://www.google.com/maps/search/{}", encoded)
    }

    /// "#hotelboutiquecartagena"
    pub fn hashtag(&self) -> String {
        format!("#{}{}", compact_slug(&self.term), compact_slug(&self.city))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchMatrix {
    pub queries: Vec<SearchQuery>,
}

impl SearchMatrix {
    /// 類別或城市為空時使用全部
    pub fn build(categories: &[Category], cities: &[String]) -> Self {
        let categories: Vec<Category> = if categories.is_empty() {
            Category::ALL.to_vec()
        } else {
            categories.to_vec()
        };
        let cities: Vec<String> = if cities.is_empty() {
            CITIES.iter().map(|(name, _)| name.to_string()).collect()
        } else {
            cities.iter().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).collect()
        };

        let mut seen = HashSet::new();
        let mut queries = Vec::new();

        for category in &categories {
            for city in &cities {
                let base = category_weight(*category) * city_weight(city);
                for term in seed_terms(*category) {
                    let variants = std::iter::once(None).chain(modifiers(*category).iter().map(Some));
                    for modifier in variants {
                        let text = match modifier {
                            Some(m) => format!("{} {} en {}", term, m, city),
                            None => format!("{} en {}", term, city),
                        };
                        // 大小寫與重音不同視為重複
                        if !seen.insert(strip_accents(&text).to_lowercase()) {
                            continue;
                        }
                        queries.push(SearchQuery {
                            text,
                            category: *category,
                            city: city.clone(),
                            term: term.to_string(),
                            modifier: modifier.map(|m| m.to_string()),
                            priority: if modifier.is_some() {
                                base * MODIFIER_WEIGHT
                            } else {
                                base
                            },
                        });
                    }
                }
            }
        }

        queries.sort_by(|a, b| {
            b.priority
                .total_cmp(&a.priority)
                .then_with(|| a.text.cmp(&b.text))
        });

        Self { queries }
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.queries.truncate(limit);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
