use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::{Map, Value};

use super::cohort::{KeyedSamples, average_name, group_by_cohort};
use super::lenient;
use crate::model::{SpatialParticipant, SpatialParticipantOverall};
use crate::normalize::{Normalizer, canonical_participant, normalize_model, normalize_participant};
use crate::stats::{mean, standard_error};

const MEAN_IOU_FIELDS: &[&str] = &["mean_iou", "miou"];
const STD_ERROR_FIELDS: &[&str] = &[
    "mean_iou_std_error",
    "std_error",
    "miou_std_error",
    "overall_avg_iou_std_error",
];

#[derive(Debug, Default, Deserialize)]
pub struct SpatialComparisonFile {
    #[serde(default, deserialize_with = "lenient::entries")]
    per_question_iou: BTreeMap<String, IouLog>,
    #[serde(default, deserialize_with = "lenient::entries")]
    participants: BTreeMap<String, ParticipantEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct IouLog {
    #[serde(default, deserialize_with = "lenient::items")]
    details: Vec<IouItem>,
}

#[derive(Debug, Default, Deserialize)]
struct IouItem {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    disease_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    iou: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_flag")]
    is_valid_prediction: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ParticipantEntry {
    #[serde(rename = "type", default, deserialize_with = "lenient::opt_text")]
    cohort: Option<String>,
    #[serde(default, deserialize_with = "lenient::shaped")]
    metrics: Option<MetricsRaw>,
}

#[derive(Debug, Default, Deserialize)]
struct MetricsRaw {
    #[serde(default, deserialize_with = "lenient::object")]
    overall: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient::object")]
    by_disease: Map<String, Value>,
}

fn first_number(metrics: &Map<String, Value>, fields: &[&str]) -> Option<f64> {
    fields
        .iter()
        .find_map(|field| metrics.get(*field).and_then(lenient::number))
}

/// Per-participant, per-disease IoU standard error over valid predictions.
fn iou_std_errors(
    logs: &BTreeMap<String, IouLog>,
    normalizer: &Normalizer,
) -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut std_errors = BTreeMap::new();
    for (raw_name, log) in logs {
        let mut by_disease: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for item in &log.details {
            if item.is_valid_prediction == Some(false) {
                continue;
            }
            let Some(iou) = item.iou else {
                continue;
            };
            let raw_disease = item.disease_type.as_deref().unwrap_or_default();
            let Some(disease_cn) = normalizer.disease_cn(raw_disease) else {
                continue;
            };
            by_disease.entry(disease_cn).or_default().push(iou);
        }
        if by_disease.is_empty() {
            continue;
        }
        let errors = by_disease
            .into_iter()
            .map(|(disease_cn, values)| (disease_cn, standard_error(&values)))
            .collect();
        std_errors.insert(canonical_participant(raw_name), errors);
    }
    std_errors
}

/// Physician spatial records plus one average per cohort. Anyone in
/// `model_names` is a model and stays out.
pub fn transform(
    file: SpatialComparisonFile,
    model_names: &BTreeSet<String>,
    normalizer: &Normalizer,
) -> BTreeMap<String, SpatialParticipant> {
    let std_errors = iou_std_errors(&file.per_question_iou, normalizer);

    let mut physicians = BTreeMap::new();
    for (raw_name, entry) in file.participants {
        let canonical = normalize_model(&raw_name);
        if model_names.contains(&canonical) {
            continue;
        }
        let name = normalize_participant(&canonical);
        let metrics = entry.metrics.unwrap_or_default();

        let mut overall = metrics.overall;
        overall.remove("sample_size");
        let sample_size = overall.get("total_questions").and_then(lenient::count);

        let mut by_disease: BTreeMap<String, Map<String, Value>> = metrics
            .by_disease
            .into_iter()
            .filter_map(|(disease, values)| match values {
                Value::Object(values) => Some((disease, values)),
                _ => None,
            })
            .collect();
        if let Some(errors) = std_errors.get(&name) {
            attach_std_errors(&mut by_disease, errors, normalizer);
        }

        physicians.insert(
            name.clone(),
            SpatialParticipant {
                name,
                cohort: entry.cohort,
                overall: SpatialParticipantOverall {
                    metrics: overall,
                    sample_size,
                },
                by_disease,
            },
        );
    }

    let averages = cohort_averages(&physicians);
    physicians.extend(averages);
    physicians
}

/// Disease keys in the metrics block may still carry ordinals, so a key is
/// matched by its normalized name when there is no exact hit.
fn attach_std_errors(
    by_disease: &mut BTreeMap<String, Map<String, Value>>,
    errors: &BTreeMap<String, f64>,
    normalizer: &Normalizer,
) {
    for (disease_cn, std_error) in errors {
        let key = if by_disease.contains_key(disease_cn) {
            Some(disease_cn.clone())
        } else {
            by_disease
                .keys()
                .find(|key| normalizer.disease_cn(key).as_deref() == Some(disease_cn.as_str()))
                .cloned()
        };
        if let Some(metrics) = key.and_then(|key| by_disease.get_mut(&key)) {
            metrics.insert("mean_iou_std_error".to_string(), Value::from(*std_error));
        }
    }
}

fn cohort_averages(
    physicians: &BTreeMap<String, SpatialParticipant>,
) -> BTreeMap<String, SpatialParticipant> {
    let groups = group_by_cohort(
        physicians
            .values()
            .map(|physician| (physician.name.as_str(), physician.cohort.as_deref())),
    );

    let mut averages = BTreeMap::new();
    for (cohort_cn, members) in groups {
        let mut overall_iou = Vec::new();
        let mut sample_size: i64 = 0;
        let mut disease_iou = KeyedSamples::default();
        let mut disease_std_error = KeyedSamples::default();

        for member in members {
            let Some(entry) = physicians.get(member) else {
                continue;
            };
            if let Some(iou) = first_number(&entry.overall.metrics, MEAN_IOU_FIELDS) {
                overall_iou.push(iou);
            }
            sample_size = sample_size.saturating_add(entry.overall.sample_size.unwrap_or(0));
            for (disease, metrics) in &entry.by_disease {
                if let Some(iou) = first_number(metrics, MEAN_IOU_FIELDS) {
                    disease_iou.push(disease, iou);
                }
                if let Some(std_error) = first_number(metrics, STD_ERROR_FIELDS) {
                    disease_std_error.push(disease, std_error);
                }
            }
        }

        let mut overall = Map::new();
        overall.insert("mean_iou".to_string(), mean(&overall_iou).map_or(Value::Null, Value::from));

        let by_disease = disease_iou
            .means()
            .into_iter()
            .map(|(disease, iou)| {
                let mut metrics = Map::new();
                metrics.insert("mean_iou".to_string(), Value::from(iou));
                if let Some(std_error) = disease_std_error.mean_of(&disease) {
                    metrics.insert("mean_iou_std_error".to_string(), Value::from(std_error));
                }
                (disease, metrics)
            })
            .collect();

        let name = average_name(cohort_cn);
        let average = SpatialParticipant {
            name: name.clone(),
            cohort: Some(cohort_cn.to_string()),
            overall: SpatialParticipantOverall {
                metrics: overall,
                sample_size: (sample_size != 0).then_some(sample_size),
            },
            by_disease,
        };
        averages.insert(name, average);
    }
    averages
}
