use std::collections::{BTreeMap, BTreeSet};

use crate::model::{
    AnatomicalModelView, DiagnosisModelOverall, DiagnosisModelView, DiagnosisTask, ModelRecord,
    ModelSummary, ModelTasks, SpatialModelView, SpatialTask, WithSampleSize,
};
use crate::normalize::AliasSources;
use crate::sources::multiple_choice::MultipleChoiceView;
use crate::sources::spatial::SpatialView;
use crate::standards::model_category;
use crate::stats::weighted_mean;

/// One record per canonical model seen in any model-facing block.
pub fn model_records(
    mut choice: MultipleChoiceView,
    mut spatial: SpatialView,
    aliases: &AliasSources,
) -> BTreeMap<String, ModelRecord> {
    let names: BTreeSet<String> = choice
        .anatomical
        .keys()
        .chain(choice.diagnosis.keys())
        .chain(spatial.overall.keys())
        .chain(spatial.per_disease.keys())
        .cloned()
        .collect();

    names
        .into_iter()
        .map(|name| {
            let overall = spatial.overall.remove(&name);
            let per_disease = spatial.per_disease.remove(&name);
            let spatial_task = (overall.is_some() || per_disease.is_some())
                .then_some(SpatialTask { overall, per_disease });

            let tasks = ModelTasks {
                q1_anatomical_robustness: choice.anatomical.remove(&name),
                q2_spatial_localization: spatial_task,
                q3_diagnosis_regional_robustness: choice.diagnosis.remove(&name),
            };

            let record = ModelRecord {
                model_name: name.clone(),
                model_category: model_category(&name).map(str::to_string),
                model_alias_sources: aliases.get(&name),
                summary: summarize(&tasks),
                tasks,
            };
            (name, record)
        })
        .collect()
}

pub fn summarize(tasks: &ModelTasks) -> ModelSummary {
    let anatomical = tasks.q1_anatomical_robustness.as_ref().map(|task| &task.overall);
    let spatial = tasks
        .q2_spatial_localization
        .as_ref()
        .and_then(|task| task.overall.as_ref());

    ModelSummary {
        q1_anatomical_accuracy_mean: anatomical.and_then(|overall| overall.accuracy_mean),
        q1_anatomical_f1_mean: anatomical.and_then(|overall| overall.f1_mean),
        q2_spatial_miou: spatial.and_then(|overall| overall.miou),
        q2_spatial_recall_05: spatial.and_then(|overall| overall.recall_05),
        q2_spatial_recall_075: spatial.and_then(|overall| overall.recall_075),
        q3_diagnosis_f1_mean: tasks
            .q3_diagnosis_regional_robustness
            .as_ref()
            .and_then(diagnosis_f1),
    }
}

/// Region F1 weighted by each region's sample count.
fn diagnosis_f1(task: &DiagnosisTask) -> Option<f64> {
    weighted_mean(
        task.regions
            .iter()
            .filter_map(|region| region.f1_mean.map(|f1| (f1, region.total_samples))),
    )
}

/// Model side of the human-vs-model blocks, re-derived from the records.
#[derive(Debug, Default)]
pub struct ModelViews {
    pub anatomical: BTreeMap<String, AnatomicalModelView>,
    pub spatial: BTreeMap<String, SpatialModelView>,
    pub diagnosis: BTreeMap<String, DiagnosisModelView>,
}

pub fn model_views(records: &BTreeMap<String, ModelRecord>) -> ModelViews {
    let mut views = ModelViews::default();

    for (name, record) in records {
        let tasks = &record.tasks;

        if let Some(task) = &tasks.q1_anatomical_robustness {
            views.anatomical.insert(
                name.clone(),
                AnatomicalModelView {
                    overall: WithSampleSize {
                        sample_size: task.overall.total_samples,
                        metrics: task.overall.clone(),
                    },
                    per_disease: task.per_disease.clone(),
                },
            );
        }

        if let Some(task) = &tasks.q2_spatial_localization {
            let overall = task.overall.clone().unwrap_or_default();
            views.spatial.insert(
                name.clone(),
                SpatialModelView {
                    overall: WithSampleSize {
                        sample_size: overall.total_questions,
                        metrics: overall,
                    },
                    per_disease: task.per_disease.clone().unwrap_or_default(),
                },
            );
        }

        if let Some(task) = &tasks.q3_diagnosis_regional_robustness {
            views.diagnosis.insert(
                name.clone(),
                DiagnosisModelView {
                    overall: DiagnosisModelOverall {
                        f1_mean: record.summary.q3_diagnosis_f1_mean,
                        sample_size: task
                            .regions
                            .iter()
                            .map(|region| region.total_samples)
                            .fold(0, i64::saturating_add),
                    },
                    regions: task.regions.clone(),
                },
            );
        }
    }

    views
}
