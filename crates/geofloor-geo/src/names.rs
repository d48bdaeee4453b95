//! Reconciles boundary-dataset country names with the canonical ISO code list.

use crate::geometry::Feature;
use log::warn;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

const ISO_PROPERTIES: [&str; 4] = ["ISO_A2", "iso_a2", "ISO_A2_EH", "iso_a2_eh"];
const NAME_PROPERTIES: [&str; 6] = ["NAME", "name", "ADMIN", "admin", "NAME_LONG", "name_long"];

/// Names that boundary datasets commonly use but ISO 3166 spells differently.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("United States of America", "US"),
    ("Russia", "RU"),
    ("South Korea", "KR"),
    ("North Korea", "KP"),
    ("Vietnam", "VN"),
    ("Laos", "LA"),
    ("Macedonia", "MK"),
    ("Myanmar", "MM"),
    ("Burma", "MM"),
    ("Iran", "IR"),
    ("Syria", "SY"),
    ("Bolivia", "BO"),
    ("Venezuela", "VE"),
    ("Tanzania", "TZ"),
    ("Moldova", "MD"),
    ("Czechia", "CZ"),
    ("Czech Rep.", "CZ"),
    ("Taiwan", "TW"),
    ("Brunei", "BN"),
    ("eSwatini", "SZ"),
    ("Swaziland", "SZ"),
    ("Timor-Leste", "TL"),
    ("East Timor", "TL"),
    ("Palestine", "PS"),
    ("Ivory Coast", "CI"),
    ("Côte d'Ivoire", "CI"),
    ("Dem. Rep. Congo", "CD"),
    ("Democratic Republic of the Congo", "CD"),
    ("Congo", "CG"),
    ("Republic of the Congo", "CG"),
    ("Central African Rep.", "CF"),
    ("Dominican Rep.", "DO"),
    ("Eq. Guinea", "GQ"),
    ("S. Sudan", "SS"),
    ("Solomon Is.", "SB"),
    ("Falkland Is.", "FK"),
    ("Fr. S. Antarctic Lands", "TF"),
    ("Bosnia and Herz.", "BA"),
    ("W. Sahara", "EH"),
    ("Turkey", "TR"),
    ("Cape Verde", "CV"),
    ("United Kingdom", "GB"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct CountryRecord {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub official_name: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched(String),
    Unmatched { name: String, reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct CountryDictionary {
    codes: HashSet<String>,
    by_name: HashMap<String, String>,
}

impl CountryDictionary {
    pub fn from_records(records: &[CountryRecord]) -> Self {
        let mut dictionary = Self::default();

        for record in records {
            let code = record.code.trim().to_ascii_uppercase();
            if !is_alpha2(&code) {
                warn!("skipping dictionary entry {:?} with bad code", record.name);
                continue;
            }
            dictionary.codes.insert(code.clone());
            let names = std::iter::once(&record.name)
                .chain(record.official_name.iter())
                .chain(record.aliases.iter());
            for name in names {
                dictionary.insert_name(name, &code);
            }
        }

        for (alias, code) in BUILTIN_ALIASES {
            if dictionary.codes.contains(*code) {
                let key = normalize_name(alias);
                dictionary
                    .by_name
                    .entry(key)
                    .or_insert_with(|| code.to_string());
            }
        }

        dictionary
    }

    fn insert_name(&mut self, name: &str, code: &str) {
        let key = normalize_name(name);
        if key.is_empty() {
            return;
        }
        if let Some(existing) = self.by_name.get(&key) {
            if existing != code {
                warn!(
                    "country name {name:?} maps to both {existing} and {code}; keeping {existing}"
                );
            }
            return;
        }
        self.by_name.insert(key, code.to_string());
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(&normalize_name(name)).map(String::as_str)
    }

    /// ISO property first, then any of the name properties.
    pub fn resolve(&self, feature: &Feature) -> Resolution {
        for key in ISO_PROPERTIES {
            if let Some(code) = feature.property(key) {
                let code = code.to_ascii_uppercase();
                if is_alpha2(&code) && self.codes.contains(&code) {
                    return Resolution::Matched(code);
                }
            }
        }

        let names: Vec<&str> = NAME_PROPERTIES
            .iter()
            .filter_map(|key| feature.property(key))
            .collect();
        for name in &names {
            if let Some(code) = self.code_for_name(name) {
                return Resolution::Matched(code.to_string());
            }
        }

        match names.first() {
            Some(name) => Resolution::Unmatched {
                name: name.to_string(),
                reason: "name not found in country dictionary".to_string(),
            },
            None => Resolution::Unmatched {
                name: "<unnamed feature>".to_string(),
                reason: "feature has no ISO code or name property".to_string(),
            },
        }
    }
}

fn is_alpha2(code: &str) -> bool {
    code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Case-folded, punctuation-free, single-spaced; `&` reads as `and` and a
/// leading article is dropped.
pub fn normalize_name(name: &str) -> String {
    let folded: String = name
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'Á' | 'Å' => 'a',
            'é' | 'è' | 'ê' | 'ë' | 'É' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'Ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other.to_ascii_lowercase(),
        })
        .collect::<String>()
        .replace('&', " and ");

    let cleaned: String = folded
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let words = match words.split_first() {
        Some((&"the", rest)) if !rest.is_empty() => rest,
        _ => &words[..],
    };
    words.join(" ")
}
