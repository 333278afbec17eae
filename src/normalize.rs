use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::model::DiseaseInfo;
use crate::standards::{
    LOCATION_NAMES_EN, MODEL_ALIASES, PHYSICIAN_NAMES_EN, PHYSICIAN_PREFIX, disease_entry, lookup,
    region_key_for_location, reverse_lookup,
};

pub fn normalize_model(name: &str) -> String {
    let name = name.trim();
    lookup(MODEL_ALIASES, name).unwrap_or(name).to_string()
}

pub fn normalize_participant(name: &str) -> String {
    let name = name.trim();
    let name = name.strip_prefix(PHYSICIAN_PREFIX).unwrap_or(name);
    lookup(PHYSICIAN_NAMES_EN, name).unwrap_or(name).to_string()
}

/// Name of anyone appearing in a human-vs-model file, model or physician.
pub fn canonical_participant(name: &str) -> String {
    normalize_participant(&normalize_model(name))
}

/// `(chinese, english)`; unknown locations come back unchanged on both sides.
pub fn normalize_location(name: &str) -> Option<(String, String)> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    if let Some(english) = lookup(LOCATION_NAMES_EN, name) {
        return Some((name.to_string(), english.to_string()));
    }
    if let Some(chinese) = reverse_lookup(LOCATION_NAMES_EN, name) {
        return Some((chinese.to_string(), name.to_string()));
    }
    Some((name.to_string(), name.to_string()))
}

pub struct Normalizer {
    ordinal_prefix: Regex,
}

impl Normalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            ordinal_prefix: Regex::new(r"^[0-9]+[.、．]?\s*")
                .context("failed to compile disease ordinal prefix regex")?,
        })
    }

    /// Strips an ordinal like `03.` and resolves the rest against the
    /// disease table. Unknown diseases keep only their cleaned Chinese name.
    pub fn disease_label(&self, raw: &str) -> DiseaseInfo {
        let clean = self.ordinal_prefix.replace(raw, "");
        let clean = clean.trim();
        if clean.is_empty() {
            return DiseaseInfo::default();
        }

        disease_entry(clean).unwrap_or_else(|| DiseaseInfo {
            name_cn: Some(clean.to_string()),
            ..DiseaseInfo::default()
        })
    }

    pub fn disease_cn(&self, raw: &str) -> Option<String> {
        self.disease_label(raw).name_cn
    }
}

impl DiseaseInfo {
    pub fn region_key(&self) -> String {
        region_key_for_location(self.location_en.as_deref())
    }
}

/// Raw model names that resolved to a different canonical name.
#[derive(Debug, Clone, Default)]
pub struct AliasSources {
    by_canonical: BTreeMap<String, BTreeSet<String>>,
}

impl AliasSources {
    /// Normalizes a raw model name and remembers it when it was an alias.
    pub fn resolve_model(&mut self, raw: &str) -> String {
        let canonical = normalize_model(raw);
        if canonical != raw {
            debug!(raw = %raw, canonical = %canonical, "resolved model alias");
            self.by_canonical
                .entry(canonical.clone())
                .or_default()
                .insert(raw.to_string());
        }
        canonical
    }

    pub fn get(&self, canonical: &str) -> Option<Vec<String>> {
        self.by_canonical
            .get(canonical)
            .map(|raw| raw.iter().cloned().collect())
    }

    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        self.by_canonical
            .iter()
            .map(|(canonical, raw)| (canonical.clone(), raw.iter().cloned().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_model_resolves_aliases_and_is_idempotent() {
        for (alias, canonical) in MODEL_ALIASES {
            assert_eq!(normalize_model(alias), *canonical);
            assert_eq!(normalize_model(canonical), *canonical);
        }
        assert_eq!(normalize_model("  gpt-5 "), "gpt-5");
        assert_eq!(normalize_model("unknown-model"), "unknown-model");
    }

    #[test]
    fn normalize_participant_strips_prefix_and_maps_names() {
        assert_eq!(normalize_participant("physician_马丽云"), "Junior-01");
        assert_eq!(normalize_participant(" 姚璐 "), "Trainee-03");
        assert_eq!(normalize_participant("Trainee-03"), "Trainee-03");
        assert_eq!(normalize_participant("gpt-4o"), "gpt-4o");
        assert_eq!(canonical_participant("gemini-3-pro-preview"), "gemini-3-pro");
    }

    #[test]
    fn normalize_location_looks_up_both_directions() {
        assert_eq!(
            normalize_location("胃"),
            Some(("胃".to_string(), "Stomach".to_string()))
        );
        assert_eq!(
            normalize_location("Colorectum"),
            Some(("肠".to_string(), "Colorectum".to_string()))
        );
        assert_eq!(
            normalize_location("十二指肠"),
            Some(("十二指肠".to_string(), "十二指肠".to_string()))
        );
        assert_eq!(normalize_location("  "), None);
    }

    #[test]
    fn disease_label_strips_ordinal_prefix() {
        let normalizer = Normalizer::new().expect("regex should compile");
        let info = normalizer.disease_label("03.早期胃癌");
        assert_eq!(info.name_cn.as_deref(), Some("早期胃癌"));
        assert_eq!(info.name_en.as_deref(), Some("Early gastric cancer"));
        assert_eq!(info.location_cn.as_deref(), Some("胃"));
        assert_eq!(info.location_en.as_deref(), Some("Stomach"));
        assert_eq!(info.region_key(), "stomach");

        for raw in ["12、 结肠憩室", "7．结肠憩室", "5 结肠憩室", "结肠憩室"] {
            assert_eq!(
                normalizer.disease_label(raw).name_cn.as_deref(),
                Some("结肠憩室"),
                "raw label {raw}"
            );
        }
    }

    #[test]
    fn disease_label_is_idempotent() {
        let normalizer = Normalizer::new().expect("regex should compile");
        for raw in ["03.早期胃癌", "01.未知病变", "Barrett食管", "", "04."] {
            let first = normalizer.disease_label(raw);
            let second = normalizer.disease_label(first.name_cn.as_deref().unwrap_or_default());
            assert_eq!(first, second, "raw label {raw}");
        }
    }

    #[test]
    fn disease_label_keeps_unknown_names_without_translation() {
        let normalizer = Normalizer::new().expect("regex should compile");
        let info = normalizer.disease_label("02. 未知病变");
        assert_eq!(info.name_cn.as_deref(), Some("未知病变"));
        assert!(info.name_en.is_none());
        assert!(info.location_cn.is_none());
        assert!(info.location_en.is_none());
        assert_eq!(normalizer.disease_label(""), DiseaseInfo::default());
    }

    #[test]
    fn alias_sources_deduplicate_and_skip_canonical_names() {
        let mut aliases = AliasSources::default();
        assert_eq!(aliases.resolve_model("gemini-3-pro-preview"), "gemini-3-pro");
        assert_eq!(aliases.resolve_model("gemini-3-pro-preview"), "gemini-3-pro");
        assert_eq!(aliases.resolve_model("gpt-5"), "gpt-5");
        assert_eq!(
            aliases.get("gemini-3-pro"),
            Some(vec!["gemini-3-pro-preview".to_string()])
        );
        assert_eq!(aliases.get("gpt-5"), None);
        assert_eq!(aliases.to_map().len(), 1);
    }
}
