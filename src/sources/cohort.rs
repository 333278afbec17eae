use std::collections::BTreeMap;

use crate::standards::{
    COHORT_AVG_SUFFIX_CN, COHORT_AVG_SUFFIX_EN, SENIORITY_ALIASES, SENIORITY_CODE_PREFIXES,
    SENIORITY_NAMES_EN, lookup, reverse_lookup,
};
use crate::stats::mean;

/// Chinese cohort name for a participant. The recorded type wins when it
/// names a known cohort (legacy and English labels included); otherwise the
/// participant code prefix decides.
pub fn resolve_cohort(type_raw: Option<&str>, participant: &str) -> Option<&'static str> {
    if let Some(type_raw) = type_raw {
        let label = type_raw.trim();
        let label = lookup(SENIORITY_ALIASES, label).unwrap_or(label);
        let label = reverse_lookup(SENIORITY_NAMES_EN, label).unwrap_or(label);
        if let Some((cohort_cn, _)) = SENIORITY_NAMES_EN
            .iter()
            .find(|(cohort_cn, _)| *cohort_cn == label)
        {
            return Some(*cohort_cn);
        }
    }

    SENIORITY_CODE_PREFIXES
        .iter()
        .find(|(prefix, _)| participant.starts_with(prefix))
        .map(|(_, cohort_cn)| *cohort_cn)
}

pub fn average_name(cohort_cn: &str) -> String {
    let cohort_en = lookup(SENIORITY_NAMES_EN, cohort_cn).unwrap_or(cohort_cn);
    format!("{cohort_en}{COHORT_AVG_SUFFIX_EN}")
}

pub fn average_name_cn(cohort_cn: &str) -> String {
    format!("{cohort_cn}{COHORT_AVG_SUFFIX_CN}")
}

pub fn is_average(name: &str) -> bool {
    name.ends_with(COHORT_AVG_SUFFIX_EN)
}

/// Members per cohort, in first-seen order without duplicates. Empty names,
/// existing averages and participants without a cohort are left out.
pub fn group_by_cohort<'a>(
    participants: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
) -> BTreeMap<&'static str, Vec<&'a str>> {
    let mut groups: BTreeMap<&'static str, Vec<&'a str>> = BTreeMap::new();
    for (name, type_raw) in participants {
        if name.is_empty() || is_average(name) {
            continue;
        }
        let Some(cohort_cn) = resolve_cohort(type_raw, name) else {
            continue;
        };
        let members = groups.entry(cohort_cn).or_default();
        if !members.contains(&name) {
            members.push(name);
        }
    }
    groups
}

/// Values collected per key, averaged with equal weight per member.
#[derive(Debug, Default)]
pub struct KeyedSamples {
    values: BTreeMap<String, Vec<f64>>,
}

impl KeyedSamples {
    pub fn push(&mut self, key: &str, value: f64) {
        self.values.entry(key.to_string()).or_default().push(value);
    }

    pub fn mean_of(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(|values| mean(values))
    }

    pub fn means(&self) -> BTreeMap<String, f64> {
        self.values
            .iter()
            .filter_map(|(key, values)| mean(values).map(|average| (key.clone(), average)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_cohort_prefers_recorded_type() {
        assert_eq!(resolve_cohort(Some("高年资"), "Trainee-01"), Some("初级内窥镜医师"));
        assert_eq!(
            resolve_cohort(Some(" Residency Trainees "), "Junior-01"),
            Some("住院实习医师")
        );
        assert_eq!(resolve_cohort(Some("住院实习医师"), "x"), Some("住院实习医师"));
    }

    #[test]
    fn resolve_cohort_falls_back_to_code_prefix() {
        assert_eq!(resolve_cohort(None, "Trainee-02"), Some("住院实习医师"));
        assert_eq!(resolve_cohort(Some("unknown"), "Junior-03"), Some("初级内窥镜医师"));
        assert_eq!(resolve_cohort(None, "gpt-5"), None);
    }

    #[test]
    fn group_by_cohort_skips_averages_and_duplicates() {
        let groups = group_by_cohort([
            ("Junior-01", None),
            ("Junior-02", None),
            ("Junior-01", None),
            ("Junior Endoscopists(Avg)", None),
            ("Trainee-01", Some("低年资")),
            ("gpt-4o", None),
            ("", None),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["初级内窥镜医师"], vec!["Junior-01", "Junior-02"]);
        assert_eq!(groups["住院实习医师"], vec!["Trainee-01"]);
    }

    #[test]
    fn average_names_use_english_cohort_with_suffix() {
        assert_eq!(average_name("初级内窥镜医师"), "Junior Endoscopists(Avg)");
        assert_eq!(average_name_cn("住院实习医师"), "住院实习医师(平均)");
        assert!(is_average("Residency Trainees(Avg)"));
    }
}
