// src/categorize.rs
//! Keyword taxonomy and the article categorizer.
//!
//! Classification is a pure substring scan: the three text fields are folded
//! into one lowercase blob and each category is included when any of its
//! keywords occurs in the blob. An empty result set is valid; presentation
//! layers substitute their own "General" label.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_TAXONOMY_PATH: &str = "config/taxonomy.toml";
pub const ENV_TAXONOMY_PATH: &str = "GPRESS_TAXONOMY_PATH";

/// One category and the keywords that select it. Keywords are held lowercase.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Taxonomy {
    #[serde(rename = "category")]
    categories: Vec<CategoryRule>,
}

/// Production taxonomy: category name → keyword substrings.
const BUILTIN: &[(&str, &[&str])] = &[
    (
        "Technology",
        &[
            "tech", "software", "innovation", "digital", "gadget", "cyber", "internet", "ai",
            "artificial intelligence", "startup", "robotics", "metaverse", "blockchain", "app",
            "website", "computing",
        ],
    ),
    (
        "Business",
        &[
            "business", "economy", "market", "finance", "company", "investment", "shares",
            "stock", "corporate", "trade", "gdp", "inflation", "revenue", "profit", "merger",
            "acquisition", "industry",
        ],
    ),
    (
        "Politics",
        &[
            "politics", "government", "election", "parliament", "congress", "policy", "bill",
            "vote", "democracy", "leader", "diplomacy", "minister", "party", "protest",
            "legislation", "constitution",
        ],
    ),
    (
        "Sports",
        &[
            "sport", "cricket", "football", "tennis", "olympics", "game", "match", "athlete",
            "championship", "league", "cup", "tournament", "team", "score", "player",
        ],
    ),
    (
        "Entertainment",
        &[
            "entertainment", "movie", "film", "bollywood", "hollywood", "music", "celebrity",
            "art", "culture", "show", "series", "actor", "actress", "director", "song", "album",
            "concert",
        ],
    ),
    (
        "Health",
        &[
            "health", "medical", "disease", "hospital", "doctor", "wellness", "fitness",
            "medicine", "virus", "pandemic", "vaccine", "cure", "treatment", "therapy",
            "nutrition", "mental health",
        ],
    ),
    (
        "Science",
        &[
            "science", "research", "discovery", "astronomy", "biology", "physics", "chemistry",
            "space", "environment", "climate", "quantum", "experiment", "study", "data",
        ],
    ),
    (
        "World",
        &[
            "world", "international", "global", "conflict", "crisis", "un", "nation", "country",
            "foreign", "geopolitics", "summit", "treaty",
        ],
    ),
    (
        "National",
        &[
            "national", "india", "domestic", "indian", "government", "delhi", "mumbai",
            "kolkata", "chennai", "bangalore",
        ],
    ),
    (
        "Education",
        &[
            "education", "school", "university", "college", "student", "study", "learning",
            "academic", "syllabus", "exam", "admission", "literacy",
        ],
    ),
    (
        "Environment",
        &[
            "environment", "climate", "pollution", "sustainability", "ecology", "nature",
            "conservation", "wildlife", "disaster", "warming", "renewable",
        ],
    ),
    (
        "Crime",
        &[
            "crime", "police", "court", "arrest", "investigation", "illegal", "justice",
            "murder", "theft", "fraud", "case", "convict",
        ],
    ),
    (
        "Lifestyle",
        &[
            "lifestyle", "fashion", "food", "travel", "home", "living", "wellness", "hobby",
            "culture", "trend", "cuisine", "vacation", "design",
        ],
    ),
];

impl Taxonomy {
    /// The compiled-in production taxonomy.
    pub fn builtin() -> Self {
        let categories = BUILTIN
            .iter()
            .map(|(name, keywords)| CategoryRule {
                name: (*name).to_string(),
                keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            })
            .collect();
        Self { categories }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut tx: Taxonomy = toml::from_str(s).context("parsing taxonomy toml")?;
        for rule in &mut tx.categories {
            for kw in &mut rule.keywords {
                *kw = kw.trim().to_lowercase();
            }
            rule.keywords.retain(|k| !k.is_empty());
        }
        Ok(tx)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading taxonomy from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks:
    /// 1) $GPRESS_TAXONOMY_PATH
    /// 2) config/taxonomy.toml
    /// 3) compiled-in default
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_TAXONOMY_PATH) {
            return Self::from_path(&PathBuf::from(p));
        }
        let conventional = PathBuf::from(DEFAULT_TAXONOMY_PATH);
        if conventional.exists() {
            return Self::from_path(&conventional);
        }
        Ok(Self::builtin())
    }

    /// Classify an article's text into a set of category labels.
    ///
    /// Pure and deterministic. The first matching keyword settles its
    /// category; keyword order never changes the result set.
    pub fn classify(&self, title: &str, summary: &str, content: &str) -> BTreeSet<String> {
        let blob = format!("{} {} {}", title, summary, content).to_lowercase();
        let mut out = BTreeSet::new();
        for rule in &self.categories {
            if rule.keywords.iter().any(|kw| blob.contains(kw.as_str())) {
                out.insert(rule.name.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cricket_is_sports() {
        let tx = Taxonomy::builtin();
        let cats = tx.classify("Final day", "cricket match score", "");
        assert!(cats.contains("Sports"));
    }

    #[test]
    fn classification_is_deterministic() {
        let tx = Taxonomy::builtin();
        let a = tx.classify("Parliament passes tech bill", "", "startup funding");
        let b = tx.classify("Parliament passes tech bill", "", "startup funding");
        assert_eq!(a, b);
        assert!(a.contains("Politics"));
        assert!(a.contains("Technology"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let tx = Taxonomy::builtin();
        let cats = tx.classify("CRICKET World CUP", "", "");
        assert!(cats.contains("Sports"));
    }

    #[test]
    fn no_keywords_yields_empty_set() {
        let tx = Taxonomy::builtin();
        assert!(tx.classify("zzz", "qqq", "").is_empty());
    }

    #[test]
    fn toml_taxonomy_lowercases_and_drops_blank_keywords() {
        let toml = r#"
            [[category]]
            name = "Sports"
            keywords = [" Cricket ", ""]

            [[category]]
            name = "Weather"
            keywords = ["monsoon"]
        "#;
        let tx = Taxonomy::from_toml_str(toml).unwrap();
        let cats = tx.classify("cricket in the monsoon", "", "");
        assert_eq!(
            cats.into_iter().collect::<Vec<_>>(),
            vec!["Sports".to_string(), "Weather".to_string()]
        );
    }
}
