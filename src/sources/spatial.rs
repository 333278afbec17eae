use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::lenient;
use super::{decode_each, merge_by_model};
use crate::model::{DiseaseColumns, SpatialDisease, SpatialOverall};
use crate::normalize::{AliasSources, Normalizer};
use crate::stats::standard_error;

#[derive(Debug, Default, Deserialize)]
struct OverallRaw {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    miou: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    recall_05: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    recall_075: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    total_questions: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct LesionRun {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    model_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    disease_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::entries")]
    detailed_results: BTreeMap<String, LesionItem>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    overall_avg_iou: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    total_questions: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    valid_questions: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    invalid_questions: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct LesionItem {
    #[serde(rename = "病灶定位", default, deserialize_with = "lenient::shaped")]
    focus: Option<LesionGrade>,
    #[serde(rename = "病变定位", default, deserialize_with = "lenient::shaped")]
    lesion: Option<LesionGrade>,
}

#[derive(Debug, Default, Deserialize)]
struct LesionGrade {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    iou: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_flag")]
    is_valid_prediction: Option<bool>,
}

impl LesionGrade {
    fn is_blank(&self) -> bool {
        self.iou.is_none() && self.is_valid_prediction.is_none()
    }
}

impl LesionItem {
    /// IoU of a valid prediction; invalid predictions do not enter the sample.
    fn valid_iou(&self) -> Option<f64> {
        let grade = self
            .focus
            .as_ref()
            .filter(|grade| !grade.is_blank())
            .or(self.lesion.as_ref())?;
        if grade.is_valid_prediction == Some(false) {
            return None;
        }
        grade.iou
    }
}

#[derive(Debug, Default)]
pub struct SpatialView {
    pub overall: BTreeMap<String, SpatialOverall>,
    pub per_disease: BTreeMap<String, Vec<SpatialDisease>>,
}

/// `overall_raw` is the overall-metrics file, `detail_raw` the per-disease
/// localization file; both are keyed at the top level.
pub fn transform(
    overall_raw: Map<String, Value>,
    detail_raw: Map<String, Value>,
    normalizer: &Normalizer,
    aliases: &mut AliasSources,
) -> SpatialView {
    let overall = decode_each::<OverallRaw>(merge_by_model(overall_raw, aliases))
        .into_iter()
        .map(|(model, raw)| {
            let metrics = SpatialOverall {
                miou: raw.miou,
                recall_05: raw.recall_05,
                recall_075: raw.recall_075,
                total_questions: raw.total_questions,
            };
            (model, metrics)
        })
        .collect();

    let mut per_disease: BTreeMap<String, Vec<SpatialDisease>> = BTreeMap::new();
    for (_, value) in detail_raw {
        let Some(run) = lenient::decode::<LesionRun>(value) else {
            continue;
        };
        let Some(raw_name) = run.model_name.as_deref().filter(|name| !name.is_empty()) else {
            continue;
        };
        let info = normalizer.disease_label(run.disease_type.as_deref().unwrap_or_default());
        if info.name_cn.is_none() {
            continue;
        }
        let model = aliases.resolve_model(raw_name);

        let iou_values: Vec<f64> = run
            .detailed_results
            .values()
            .filter_map(LesionItem::valid_iou)
            .collect();

        per_disease.entry(model).or_default().push(SpatialDisease {
            disease_type: info.name_cn.clone(),
            columns: DiseaseColumns::from(&info),
            overall_avg_iou: run.overall_avg_iou,
            overall_avg_iou_std_error: standard_error(&iou_values),
            total_questions: run.total_questions,
            valid_questions: run.valid_questions,
            invalid_questions: run.invalid_questions,
        });
    }

    for rows in per_disease.values_mut() {
        rows.sort_by(|left, right| {
            left.disease_type
                .as_deref()
                .unwrap_or_default()
                .cmp(right.disease_type.as_deref().unwrap_or_default())
        });
    }

    SpatialView {
        overall,
        per_disease,
    }
}
