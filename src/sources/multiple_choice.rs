use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::lenient;
use super::{decode_each, merge_by_model};
use crate::model::{
    AnatomicalDisease, AnatomicalOverall, AnatomicalTask, DiagnosisDisease, DiagnosisRegion,
    DiagnosisTask, DiseaseColumns,
};
use crate::normalize::{AliasSources, Normalizer, normalize_location, normalize_model};
use crate::standards::region_disease_at;
use crate::stats::standard_error;

#[derive(Debug, Default, Deserialize)]
pub struct MultipleChoiceFile {
    #[serde(default, deserialize_with = "lenient::object")]
    pub anatomical_robustness: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub diagnosis_regional_robustness: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient::entries")]
    pub model_disease_results: BTreeMap<String, DiseaseRun>,
}

#[derive(Debug, Default, Deserialize)]
struct StatBlock {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    mean: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    std_error: Option<f64>,
    #[serde(default, deserialize_with = "lenient::numbers")]
    per_disease: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct AnatomicalRaw {
    #[serde(default, deserialize_with = "lenient::shaped")]
    accuracy: Option<StatBlock>,
    #[serde(default, deserialize_with = "lenient::shaped")]
    f1_score: Option<StatBlock>,
    #[serde(default, deserialize_with = "lenient::items")]
    disease_details: Vec<DiseaseDetail>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    num_diseases: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    num_valid_samples: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    total_samples: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct DiseaseDetail {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    disease: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    accuracy: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    f1_score: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RegionRaw {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    location_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::shaped")]
    accuracy: Option<StatBlock>,
    #[serde(default, deserialize_with = "lenient::shaped")]
    f1_score: Option<StatBlock>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    num_diseases: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    num_valid_samples: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    total_samples: Option<i64>,
}

/// One model/disease evaluation run with its item-level outcomes.
#[derive(Debug, Default, Deserialize)]
pub struct DiseaseRun {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    model_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    disease_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::entries")]
    detailed_results: BTreeMap<String, ItemOutcome>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemOutcome {
    #[serde(rename = "解剖定位", default, deserialize_with = "lenient::shaped")]
    anatomical: Option<Graded>,
    #[serde(rename = "诊断", default, deserialize_with = "lenient::shaped")]
    diagnosis: Option<Graded>,
}

#[derive(Debug, Default, Deserialize)]
struct Graded {
    #[serde(default, deserialize_with = "lenient::graded_flag")]
    is_correct: Option<bool>,
}

/// Per-disease standard errors recomputed from item-level correctness,
/// since the file only stores a pooled standard error per model.
#[derive(Debug, Default)]
struct ItemErrors {
    anatomical: BTreeMap<String, BTreeMap<String, f64>>,
    diagnosis: BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>,
}

impl ItemErrors {
    fn from_runs(runs: &BTreeMap<String, DiseaseRun>, normalizer: &Normalizer) -> Self {
        let mut errors = Self::default();
        for run in runs.values() {
            let model = normalize_model(run.model_name.as_deref().unwrap_or_default());
            let disease = normalizer.disease_label(run.disease_type.as_deref().unwrap_or_default());
            let Some(disease_cn) = disease.name_cn.clone() else {
                continue;
            };

            let mut anatomical = Vec::new();
            let mut diagnosis = Vec::new();
            for item in run.detailed_results.values() {
                if let Some(correct) = item.anatomical.as_ref().and_then(|grade| grade.is_correct) {
                    anatomical.push(if correct { 1.0 } else { 0.0 });
                }
                if let Some(correct) = item.diagnosis.as_ref().and_then(|grade| grade.is_correct) {
                    diagnosis.push(if correct { 1.0 } else { 0.0 });
                }
            }

            if !anatomical.is_empty() {
                errors
                    .anatomical
                    .entry(model.clone())
                    .or_default()
                    .insert(disease_cn.clone(), standard_error(&anatomical));
            }
            if !diagnosis.is_empty() {
                errors
                    .diagnosis
                    .entry(model)
                    .or_default()
                    .entry(disease.region_key())
                    .or_default()
                    .insert(disease_cn, standard_error(&diagnosis));
            }
        }
        errors
    }

    fn anatomical(&self, model: &str, disease_cn: Option<&str>) -> Option<f64> {
        self.anatomical.get(model)?.get(disease_cn?).copied()
    }

    fn diagnosis(&self, model: &str, region_key: &str, disease_cn: Option<&str>) -> Option<f64> {
        self.diagnosis
            .get(model)?
            .get(region_key)?
            .get(disease_cn?)
            .copied()
    }
}

#[derive(Debug, Default)]
pub struct MultipleChoiceView {
    pub anatomical: BTreeMap<String, AnatomicalTask>,
    pub diagnosis: BTreeMap<String, DiagnosisTask>,
}

pub fn transform(
    file: MultipleChoiceFile,
    normalizer: &Normalizer,
    aliases: &mut AliasSources,
) -> MultipleChoiceView {
    let errors = ItemErrors::from_runs(&file.model_disease_results, normalizer);

    let anatomical_raw = merge_by_model(file.anatomical_robustness, aliases);
    let anatomical = decode_each::<AnatomicalRaw>(anatomical_raw)
        .into_iter()
        .map(|(model, raw)| {
            let task = anatomical_task(&model, raw, &errors, normalizer);
            (model, task)
        })
        .collect();

    let diagnosis = merge_by_model(file.diagnosis_regional_robustness, aliases)
        .into_iter()
        .map(|(model, regions)| {
            let task = diagnosis_task(&model, regions, &errors);
            (model, task)
        })
        .collect();

    MultipleChoiceView {
        anatomical,
        diagnosis,
    }
}

fn anatomical_task(
    model: &str,
    raw: AnatomicalRaw,
    errors: &ItemErrors,
    normalizer: &Normalizer,
) -> AnatomicalTask {
    let accuracy = raw.accuracy.unwrap_or_default();
    let f1 = raw.f1_score.unwrap_or_default();

    let per_disease = raw
        .disease_details
        .into_iter()
        .map(|detail| {
            let info = normalizer.disease_label(detail.disease.as_deref().unwrap_or_default());
            AnatomicalDisease {
                disease: info.name_cn.clone(),
                columns: DiseaseColumns::from(&info),
                accuracy: detail.accuracy,
                f1_score: detail.f1_score,
                f1_std_error: errors.anatomical(model, info.name_cn.as_deref()),
            }
        })
        .collect();

    AnatomicalTask {
        overall: AnatomicalOverall {
            accuracy_mean: accuracy.mean,
            accuracy_std_error: accuracy.std_error,
            f1_mean: f1.mean,
            f1_std_error: f1.std_error,
            num_diseases: raw.num_diseases,
            num_valid_samples: raw.num_valid_samples,
            total_samples: raw.total_samples,
        },
        per_disease,
    }
}

fn diagnosis_task(model: &str, regions: Map<String, Value>, errors: &ItemErrors) -> DiagnosisTask {
    let mut regions: Vec<DiagnosisRegion> = regions
        .into_iter()
        .filter_map(|(region_key, value)| {
            lenient::decode::<RegionRaw>(value)
                .map(|raw| diagnosis_region(model, region_key, raw, errors))
        })
        .collect();
    regions.sort_by(|left, right| left.region_key.cmp(&right.region_key));
    DiagnosisTask { regions }
}

fn diagnosis_region(
    model: &str,
    region_key: String,
    raw: RegionRaw,
    errors: &ItemErrors,
) -> DiagnosisRegion {
    let accuracy = raw.accuracy.unwrap_or_default();
    let f1 = raw.f1_score.unwrap_or_default();

    let per_disease = accuracy
        .per_disease
        .iter()
        .zip(f1.per_disease.iter())
        .enumerate()
        .map(|(position, (accuracy_value, f1_value))| {
            let index = position + 1;
            DiagnosisDisease {
                index,
                accuracy: *accuracy_value,
                f1_score: *f1_value,
                f1_std_error: errors.diagnosis(
                    model,
                    &region_key,
                    region_disease_at(&region_key, index),
                ),
            }
        })
        .collect();

    let (region_cn, region_en) = raw
        .location_name
        .as_deref()
        .and_then(normalize_location)
        .unzip();

    DiagnosisRegion {
        region_key,
        region_name: region_cn.clone(),
        region_name_cn: region_cn,
        region_name_en: region_en,
        accuracy_mean: accuracy.mean,
        accuracy_std_error: accuracy.std_error,
        f1_mean: f1.mean,
        f1_std_error: f1.std_error,
        num_diseases: raw.num_diseases,
        num_valid_samples: raw.num_valid_samples,
        total_samples: raw.total_samples.unwrap_or(0),
        per_disease,
    }
}
