use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Canonical bilingual view of one disease label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiseaseInfo {
    pub name_cn: Option<String>,
    pub name_en: Option<String>,
    pub location_cn: Option<String>,
    pub location_en: Option<String>,
}

/// Disease columns repeated on every per-disease output row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiseaseColumns {
    pub disease_cn: Option<String>,
    pub disease_en: Option<String>,
    pub location_cn: Option<String>,
    pub location_en: Option<String>,
}

impl From<&DiseaseInfo> for DiseaseColumns {
    fn from(info: &DiseaseInfo) -> Self {
        Self {
            disease_cn: info.name_cn.clone(),
            disease_en: info.name_en.clone(),
            location_cn: info.location_cn.clone(),
            location_en: info.location_en.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LikertDimensionMeta {
    pub name_cn: String,
    pub name_en: String,
    pub order: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StandardsDocument {
    pub location_names_en: BTreeMap<String, String>,
    pub disease_categories: BTreeMap<String, BTreeMap<String, String>>,
    pub disease_name_map: BTreeMap<String, DiseaseInfo>,
    pub model_categories: BTreeMap<String, Vec<String>>,
    pub model_aliases: BTreeMap<String, String>,
    pub model_alias_sources: BTreeMap<String, Vec<String>>,
    pub physician_names_en: BTreeMap<String, String>,
    pub physician_en_to_cn: BTreeMap<String, String>,
    pub seniority_names_en: BTreeMap<String, String>,
    pub task_type_names_en: BTreeMap<String, String>,
    pub likert_dimensions: BTreeMap<String, LikertDimensionMeta>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceRecord {
    pub role: String,
    pub path: String,
    pub required: bool,
    pub present: bool,
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub bench_name: String,
    pub generated_at: String,
    pub description: String,
    pub sources: Vec<SourceRecord>,
    pub models: BTreeMap<String, ModelRecord>,
    #[serde(skip_serializing_if = "HumanVsModel::is_empty")]
    pub human_vs_model: HumanVsModel,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelRecord {
    pub model_name: String,
    pub model_category: Option<String>,
    pub model_alias_sources: Option<Vec<String>>,
    pub summary: ModelSummary,
    pub tasks: ModelTasks,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q1_anatomical_accuracy_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q1_anatomical_f1_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q2_spatial_miou: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q2_spatial_recall_05: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q2_spatial_recall_075: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q3_diagnosis_f1_mean: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelTasks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q1_anatomical_robustness: Option<AnatomicalTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q2_spatial_localization: Option<SpatialTask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q3_diagnosis_regional_robustness: Option<DiagnosisTask>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnatomicalTask {
    pub overall: AnatomicalOverall,
    pub per_disease: Vec<AnatomicalDisease>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnatomicalOverall {
    pub accuracy_mean: Option<f64>,
    pub accuracy_std_error: Option<f64>,
    pub f1_mean: Option<f64>,
    pub f1_std_error: Option<f64>,
    pub num_diseases: Option<i64>,
    pub num_valid_samples: Option<i64>,
    pub total_samples: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnatomicalDisease {
    pub disease: Option<String>,
    #[serde(flatten)]
    pub columns: DiseaseColumns,
    pub accuracy: Option<f64>,
    pub f1_score: Option<f64>,
    pub f1_std_error: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SpatialTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall: Option<SpatialOverall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_disease: Option<Vec<SpatialDisease>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SpatialOverall {
    pub miou: Option<f64>,
    pub recall_05: Option<f64>,
    pub recall_075: Option<f64>,
    pub total_questions: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpatialDisease {
    pub disease_type: Option<String>,
    #[serde(flatten)]
    pub columns: DiseaseColumns,
    pub overall_avg_iou: Option<f64>,
    pub overall_avg_iou_std_error: f64,
    pub total_questions: Option<i64>,
    pub valid_questions: Option<i64>,
    pub invalid_questions: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosisTask {
    pub regions: Vec<DiagnosisRegion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisRegion {
    pub region_key: String,
    pub region_name: Option<String>,
    pub region_name_cn: Option<String>,
    pub region_name_en: Option<String>,
    pub accuracy_mean: Option<f64>,
    pub accuracy_std_error: Option<f64>,
    pub f1_mean: Option<f64>,
    pub f1_std_error: Option<f64>,
    pub num_diseases: Option<i64>,
    pub num_valid_samples: Option<i64>,
    pub total_samples: i64,
    pub per_disease: Vec<DiagnosisDisease>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisDisease {
    pub index: usize,
    pub accuracy: Option<f64>,
    pub f1_score: Option<f64>,
    pub f1_std_error: Option<f64>,
}

/// A metrics block re-emitted with an integer `sample_size` next to it.
#[derive(Debug, Clone, Serialize)]
pub struct WithSampleSize<T> {
    #[serde(flatten)]
    pub metrics: T,
    pub sample_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnatomicalModelView {
    pub overall: WithSampleSize<AnatomicalOverall>,
    pub per_disease: Vec<AnatomicalDisease>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpatialModelView {
    pub overall: WithSampleSize<SpatialOverall>,
    pub per_disease: Vec<SpatialDisease>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisModelOverall {
    pub f1_mean: Option<f64>,
    pub sample_size: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisModelView {
    pub overall: DiagnosisModelOverall,
    pub regions: Vec<DiagnosisRegion>,
}

/// Physician-side macro F1: either one pooled value or a value per key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MacroF1 {
    Overall(f64),
    ByKey(BTreeMap<String, f64>),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChoiceParticipant {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub cohort: Option<String>,
    pub per_disease_f1: BTreeMap<String, f64>,
    pub per_disease_std_error: BTreeMap<String, f64>,
    pub sample_size: Option<i64>,
    pub macro_avg_f1: Option<MacroF1>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SpatialParticipantOverall {
    #[serde(flatten)]
    pub metrics: Map<String, Value>,
    pub sample_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SpatialParticipant {
    pub name: String,
    #[serde(rename = "type")]
    pub cohort: Option<String>,
    pub overall: SpatialParticipantOverall,
    pub by_disease: BTreeMap<String, Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantBlock<M, P> {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, M>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub physicians: BTreeMap<String, P>,
}

impl<M, P> ParticipantBlock<M, P> {
    /// `None` when neither side has anything to show.
    pub fn non_empty(models: BTreeMap<String, M>, physicians: BTreeMap<String, P>) -> Option<Self> {
        if models.is_empty() && physicians.is_empty() {
            None
        } else {
            Some(Self { models, physicians })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikertScore {
    pub name_cn: String,
    pub name_en: String,
    pub order: u32,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikertParticipant {
    pub name: String,
    pub name_cn: Option<String>,
    pub participant_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<i64>,
    pub dimensions: BTreeMap<String, LikertScore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikertDisease {
    pub disease: Option<String>,
    #[serde(flatten)]
    pub columns: DiseaseColumns,
    pub participants: Vec<LikertParticipant>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikertBlock {
    pub question_type_cn: String,
    pub question_type_en: String,
    pub diseases: Vec<LikertDisease>,
    pub participant_sample_sizes: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HumanVsModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q1_anatomical_robustness: Option<ParticipantBlock<AnatomicalModelView, ChoiceParticipant>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q2_spatial_localization: Option<ParticipantBlock<SpatialModelView, SpatialParticipant>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q3_diagnosis_regional_robustness:
        Option<ParticipantBlock<DiagnosisModelView, ChoiceParticipant>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q4_findings_likert: Option<LikertBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q5_recommendations_likert: Option<LikertBlock>,
}

impl HumanVsModel {
    pub fn is_empty(&self) -> bool {
        self.q1_anatomical_robustness.is_none()
            && self.q2_spatial_localization.is_none()
            && self.q3_diagnosis_regional_robustness.is_none()
            && self.q4_findings_likert.is_none()
            && self.q5_recommendations_likert.is_none()
    }
}
