use std::collections::BTreeMap;

use crate::model::{DiseaseInfo, LikertDimensionMeta, StandardsDocument};

pub const TASK_ANATOMICAL: &str = "解剖定位";
pub const TASK_LESION: &str = "病变定位";
pub const TASK_DIAGNOSIS: &str = "诊断";
pub const TASK_FINDINGS: &str = "看图说话";
pub const TASK_RECOMMENDATIONS: &str = "后续建议";

pub const COHORT_AVG_SUFFIX_EN: &str = "(Avg)";
pub const COHORT_AVG_SUFFIX_CN: &str = "(平均)";

pub const PHYSICIAN_PREFIX: &str = "physician_";

pub const LOCATION_NAMES_EN: &[(&str, &str)] = &[
    ("食管", "Esophagus"),
    ("胃", "Stomach"),
    ("肠", "Colorectum"),
    ("全部", "All"),
];

#[derive(Debug, Clone, Copy)]
pub struct DiseaseCategory {
    pub location_en: &'static str,
    pub region_key: &'static str,
    pub diseases: &'static [(&'static str, &'static str)],
}

/// Disease order inside each category is positional: the diagnosis block
/// reports per-disease accuracy/F1 as lists in exactly this order.
pub const DISEASE_CATEGORIES: &[DiseaseCategory] = &[
    DiseaseCategory {
        location_en: "Esophagus",
        region_key: "esophagus",
        diseases: &[
            ("食管静脉曲张", "Esophageal varices"),
            ("反流性食管炎", "Reflux esophagitis"),
            ("Barrett食管", "Barrett esophagus"),
            ("食管黏膜下肿瘤", "Esophageal submucosal lesion"),
            ("食管异物", "Esophageal foreign body"),
            ("食管早期肿瘤", "Early esophageal cancer"),
            ("食管进展期肿瘤", "Advanced esophageal cancer"),
        ],
    },
    DiseaseCategory {
        location_en: "Stomach",
        region_key: "stomach",
        diseases: &[
            ("胃底静脉曲张", "Fundic varices"),
            ("胃良性息肉", "Benign gastric polyp"),
            ("早期胃癌", "Early gastric cancer"),
            ("进展期胃癌", "Advanced gastric cancer"),
            ("胃黏膜下肿瘤", "Gastric submucosal tumor"),
            ("消化性溃疡", "Peptic ulcer"),
        ],
    },
    DiseaseCategory {
        location_en: "Colorectum",
        region_key: "colo",
        diseases: &[
            ("增生性息肉", "Hyperplastic polyp"),
            ("腺瘤性息肉", "Adenomatous polyp"),
            ("锯齿状病变", "Serrated lesion"),
            ("结直肠黏膜下肿瘤", "Colorectal submucosal tumor"),
            ("进展期结直肠癌", "Advanced colorectal cancer"),
            ("结肠憩室", "Colonic diverticulum"),
            ("炎症性肠病", "Inflammatory bowel disease"),
        ],
    },
];

pub const MODEL_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "medical_opensource",
        &["medgemma-27b-it", "HuatuoGPT-Vision-34B", "Lingshu-32B"],
    ),
    (
        "opensource",
        &[
            "ERNIE-4.5-Turbo-VL-32K",
            "GLM-4.5V",
            "Qwen2.5-VL-72B-Instruct",
            "qwen3-vl-plus",
        ],
    ),
    (
        "closed",
        &[
            "claude-sonnet-4-5",
            "gemini-2.5-pro",
            "gemini-3-pro",
            "gpt-4o",
            "gpt-5",
        ],
    ),
];

pub const MODEL_ALIASES: &[(&str, &str)] = &[
    ("gemini-3-pro-preview", "gemini-3-pro"),
    ("gemini-2.5-pro-thinking", "gemini-2.5-pro"),
];

pub const PHYSICIAN_NAMES_EN: &[(&str, &str)] = &[
    ("马丽云", "Junior-01"),
    ("许佳琪", "Junior-02"),
    ("耿子寒", "Junior-03"),
    ("屈一帆", "Trainee-01"),
    ("苏伟", "Trainee-02"),
    ("姚璐", "Trainee-03"),
];

pub const SENIORITY_NAMES_EN: &[(&str, &str)] = &[
    ("初级内窥镜医师", "Junior Endoscopists"),
    ("住院实习医师", "Residency Trainees"),
];

/// Legacy seniority labels still found in older result files.
pub const SENIORITY_ALIASES: &[(&str, &str)] =
    &[("低年资", "住院实习医师"), ("高年资", "初级内窥镜医师")];

/// Code prefixes that identify a physician's cohort when no type is recorded.
pub const SENIORITY_CODE_PREFIXES: &[(&str, &str)] =
    &[("Trainee-", "住院实习医师"), ("Junior-", "初级内窥镜医师")];

pub const TASK_TYPE_NAMES_EN: &[(&str, &str)] = &[
    (TASK_ANATOMICAL, "Anatomical Localization"),
    (TASK_LESION, "Lesion Localization"),
    (TASK_DIAGNOSIS, "Diagnosis"),
    (TASK_FINDINGS, "Findings"),
    (TASK_RECOMMENDATIONS, "Recommendations"),
];

#[derive(Debug, Clone, Copy)]
pub struct LikertDimension {
    pub key: &'static str,
    pub name_cn: &'static str,
    pub name_en: &'static str,
    pub order: u32,
}

impl LikertDimension {
    pub fn mean_column(&self) -> String {
        format!("维度{}_{}_mean", self.order, self.name_cn)
    }

    pub fn std_column(&self) -> String {
        format!("维度{}_{}_std", self.order, self.name_cn)
    }
}

pub const LIKERT_DIMENSIONS: &[LikertDimension] = &[
    LikertDimension {
        key: "dimension1",
        name_cn: "语言表达与可读性",
        name_en: "Language Expression",
        order: 1,
    },
    LikertDimension {
        key: "dimension2",
        name_cn: "图像证据利用与可视要点覆盖",
        name_en: "Image Evidence",
        order: 2,
    },
    LikertDimension {
        key: "dimension3",
        name_cn: "事实准确性与临床正确性",
        name_en: "Factual Accuracy",
        order: 3,
    },
    LikertDimension {
        key: "dimension4",
        name_cn: "可操作性与规范性",
        name_en: "Actionability",
        order: 4,
    },
    LikertDimension {
        key: "dimension5",
        name_cn: "安全性与风险控制",
        name_en: "Safety",
        order: 5,
    },
];

pub fn lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(from, _)| *from == key).map(|(_, to)| *to)
}

pub fn reverse_lookup(table: &[(&'static str, &'static str)], value: &str) -> Option<&'static str> {
    table.iter().find(|(_, to)| *to == value).map(|(from, _)| *from)
}

pub fn model_category(model: &str) -> Option<&'static str> {
    MODEL_CATEGORIES
        .iter()
        .find(|(_, models)| models.contains(&model))
        .map(|(category, _)| *category)
}

pub fn is_known_physician_code(code: &str) -> bool {
    reverse_lookup(PHYSICIAN_NAMES_EN, code).is_some()
}

pub fn task_type_name_en(task_cn: &str) -> String {
    lookup(TASK_TYPE_NAMES_EN, task_cn)
        .unwrap_or(task_cn)
        .to_string()
}

pub fn region_key_for_location(location_en: Option<&str>) -> String {
    let location_en = location_en.unwrap_or_default();
    DISEASE_CATEGORIES
        .iter()
        .find(|category| category.location_en == location_en)
        .map(|category| category.region_key.to_string())
        .unwrap_or_else(|| location_en.to_lowercase())
}

/// Chinese disease name at 1-based `index` of a region's positional list.
pub fn region_disease_at(region_key: &str, index: usize) -> Option<&'static str> {
    let category = DISEASE_CATEGORIES
        .iter()
        .find(|category| category.region_key == region_key)?;
    index
        .checked_sub(1)
        .and_then(|position| category.diseases.get(position))
        .map(|(name_cn, _)| *name_cn)
}

pub fn disease_entry(name_cn: &str) -> Option<DiseaseInfo> {
    DISEASE_CATEGORIES.iter().find_map(|category| {
        category
            .diseases
            .iter()
            .find(|(disease_cn, _)| *disease_cn == name_cn)
            .map(|(disease_cn, disease_en)| DiseaseInfo {
                name_cn: Some((*disease_cn).to_string()),
                name_en: Some((*disease_en).to_string()),
                location_cn: reverse_lookup(LOCATION_NAMES_EN, category.location_en)
                    .map(ToOwned::to_owned),
                location_en: Some(category.location_en.to_string()),
            })
    })
}

pub fn cohort_average_names() -> Vec<(String, String)> {
    SENIORITY_NAMES_EN
        .iter()
        .map(|(cohort_cn, cohort_en)| {
            (
                format!("{cohort_cn}{COHORT_AVG_SUFFIX_CN}"),
                format!("{cohort_en}{COHORT_AVG_SUFFIX_EN}"),
            )
        })
        .collect()
}

fn owned_map(table: &[(&str, &str)]) -> BTreeMap<String, String> {
    table
        .iter()
        .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
        .collect()
}

pub fn standards_document(model_alias_sources: BTreeMap<String, Vec<String>>) -> StandardsDocument {
    let disease_categories = DISEASE_CATEGORIES
        .iter()
        .map(|category| (category.location_en.to_string(), owned_map(category.diseases)))
        .collect();

    let disease_name_map = DISEASE_CATEGORIES
        .iter()
        .flat_map(|category| category.diseases.iter())
        .filter_map(|(name_cn, _)| {
            disease_entry(name_cn).map(|info| ((*name_cn).to_string(), info))
        })
        .collect();

    let model_categories = MODEL_CATEGORIES
        .iter()
        .map(|(category, models)| {
            (
                (*category).to_string(),
                models.iter().map(|model| (*model).to_string()).collect(),
            )
        })
        .collect();

    let mut physician_names_en = owned_map(PHYSICIAN_NAMES_EN);
    let mut physician_en_to_cn: BTreeMap<String, String> = PHYSICIAN_NAMES_EN
        .iter()
        .map(|(name_cn, code)| ((*code).to_string(), (*name_cn).to_string()))
        .collect();
    for (avg_cn, avg_en) in cohort_average_names() {
        physician_names_en.insert(avg_cn.clone(), avg_en.clone());
        physician_en_to_cn.insert(avg_en, avg_cn);
    }

    let likert_dimensions = LIKERT_DIMENSIONS
        .iter()
        .map(|dimension| {
            (
                dimension.key.to_string(),
                LikertDimensionMeta {
                    name_cn: dimension.name_cn.to_string(),
                    name_en: dimension.name_en.to_string(),
                    order: dimension.order,
                },
            )
        })
        .collect();

    StandardsDocument {
        location_names_en: owned_map(LOCATION_NAMES_EN),
        disease_categories,
        disease_name_map,
        model_categories,
        model_aliases: owned_map(MODEL_ALIASES),
        model_alias_sources,
        physician_names_en,
        physician_en_to_cn,
        seniority_names_en: owned_map(SENIORITY_NAMES_EN),
        task_type_names_en: owned_map(TASK_TYPE_NAMES_EN),
        likert_dimensions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_disease_at_is_one_based_and_bounded() {
        assert_eq!(region_disease_at("stomach", 3), Some("早期胃癌"));
        assert_eq!(region_disease_at("stomach", 0), None);
        assert_eq!(region_disease_at("stomach", 7), None);
        assert_eq!(region_disease_at("duodenum", 1), None);
    }

    #[test]
    fn region_key_for_location_maps_colorectum_to_colo() {
        assert_eq!(region_key_for_location(Some("Colorectum")), "colo");
        assert_eq!(region_key_for_location(Some("Esophagus")), "esophagus");
        assert_eq!(region_key_for_location(Some("Duodenum")), "duodenum");
        assert_eq!(region_key_for_location(None), "");
    }

    #[test]
    fn standards_document_includes_cohort_average_names_both_ways() {
        let standards = standards_document(BTreeMap::new());
        assert_eq!(
            standards.physician_names_en.get("初级内窥镜医师(平均)").map(String::as_str),
            Some("Junior Endoscopists(Avg)")
        );
        assert_eq!(
            standards.physician_en_to_cn.get("Trainee-02").map(String::as_str),
            Some("苏伟")
        );
        assert_eq!(
            standards.physician_en_to_cn.get("Residency Trainees(Avg)").map(String::as_str),
            Some("住院实习医师(平均)")
        );
        assert_eq!(standards.disease_name_map.len(), 20);
        assert_eq!(standards.likert_dimensions["dimension3"].order, 3);
    }

    #[test]
    fn model_category_covers_every_listed_model() {
        assert_eq!(model_category("gpt-5"), Some("closed"));
        assert_eq!(model_category("Lingshu-32B"), Some("medical_opensource"));
        assert_eq!(model_category("gemini-3-pro-preview"), None);
    }

    #[test]
    fn likert_columns_follow_order_and_chinese_name() {
        assert_eq!(LIKERT_DIMENSIONS[4].mean_column(), "维度5_安全性与风险控制_mean");
        assert_eq!(LIKERT_DIMENSIONS[0].std_column(), "维度1_语言表达与可读性_std");
    }
}
