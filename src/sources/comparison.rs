use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::{Map, Value};

use super::cohort::{KeyedSamples, average_name, group_by_cohort};
use super::lenient;
use crate::model::{ChoiceParticipant, MacroF1};
use crate::normalize::{Normalizer, canonical_participant, normalize_model};
use crate::standards::{TASK_ANATOMICAL, TASK_DIAGNOSIS};
use crate::stats::standard_error;

#[derive(Debug, Default, Deserialize)]
pub struct ComparisonFile {
    #[serde(default, deserialize_with = "lenient::shaped")]
    f1_scores: Option<F1Scores>,
    #[serde(default, deserialize_with = "lenient::entries")]
    physician_results: BTreeMap<String, ParticipantRun>,
    #[serde(default, deserialize_with = "lenient::entries")]
    model_results: BTreeMap<String, ParticipantRun>,
}

#[derive(Debug, Default, Deserialize)]
struct F1Scores {
    #[serde(default, deserialize_with = "lenient::object")]
    anatomical_location_disease_f1: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient::object")]
    diagnosis_disease_f1: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient::object")]
    macro_avg_f1: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ParticipantRun {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    physician_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::items")]
    detailed_results: Vec<GradedItem>,
    #[serde(default, deserialize_with = "lenient::object")]
    by_question_type: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient::opt_count")]
    total_questions: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct GradedItem {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    disease_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    question_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_flag")]
    is_correct: Option<bool>,
}

impl ParticipantRun {
    /// Physicians are keyed by their recorded name when present, so that
    /// Chinese names and codes land on the same participant.
    fn physician_key(&self, key: &str) -> String {
        let raw = self
            .physician_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(key);
        canonical_participant(raw)
    }

    /// Questions answered for a task; `total_questions` only stands in when
    /// the task has no breakdown at all.
    fn task_total(&self, task: &str) -> i64 {
        let block = self.by_question_type.get(task).and_then(Value::as_object);
        let total = block
            .and_then(|block| block.get("total"))
            .and_then(lenient::count)
            .unwrap_or(0);
        if total == 0 && block.is_none_or(Map::is_empty) {
            return self.total_questions.unwrap_or(0);
        }
        total
    }

    fn correctness_by_disease(
        &self,
        task: &str,
        normalizer: &Normalizer,
    ) -> BTreeMap<String, Vec<f64>> {
        let mut by_disease: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for item in &self.detailed_results {
            if item.question_type.as_deref() != Some(task) {
                continue;
            }
            let raw_disease = item.disease_type.as_deref().unwrap_or_default();
            let Some(disease_cn) = normalizer.disease_cn(raw_disease) else {
                continue;
            };
            let score = if item.is_correct.unwrap_or(false) { 1.0 } else { 0.0 };
            by_disease.entry(disease_cn).or_default().push(score);
        }
        by_disease
    }
}

/// Everything known about one multiple-choice task, keyed by canonical
/// participant name.
#[derive(Debug, Default)]
struct TaskScores {
    f1: BTreeMap<String, BTreeMap<String, f64>>,
    std_errors: BTreeMap<String, BTreeMap<String, f64>>,
    sample_sizes: BTreeMap<String, i64>,
}

impl TaskScores {
    fn collect(
        task: &str,
        f1_raw: Map<String, Value>,
        runs: &[(String, &ParticipantRun)],
        normalizer: &Normalizer,
    ) -> Self {
        let mut scores = Self::default();

        for (disease_key, participants) in f1_raw {
            let Some(disease_cn) = normalizer.disease_cn(&disease_key) else {
                continue;
            };
            let Value::Object(participants) = participants else {
                continue;
            };
            let by_participant = scores.f1.entry(disease_cn).or_default();
            for (participant, value) in participants {
                if let Some(f1) = lenient::number(&value) {
                    by_participant.insert(canonical_participant(&participant), f1);
                }
            }
        }

        for (participant, run) in runs {
            for (disease_cn, outcomes) in run.correctness_by_disease(task, normalizer) {
                scores
                    .std_errors
                    .entry(disease_cn)
                    .or_default()
                    .insert(participant.clone(), standard_error(&outcomes));
            }
            let total = run.task_total(task);
            if total != 0 {
                scores.sample_sizes.insert(participant.clone(), total);
            }
        }

        scores
    }

    fn std_error(&self, disease_cn: &str, participant: &str) -> Option<f64> {
        self.std_errors.get(disease_cn)?.get(participant).copied()
    }

    fn blank(&self, participant: &str) -> ChoiceParticipant {
        ChoiceParticipant {
            name: participant.to_string(),
            sample_size: self.sample_sizes.get(participant).copied(),
            ..ChoiceParticipant::default()
        }
    }

    /// Physician records for this task plus one average per cohort.
    /// Anyone in `model_names` is a model and stays out.
    fn physicians(
        &self,
        macro_avg: &BTreeMap<String, Option<MacroF1>>,
        model_names: &BTreeSet<String>,
    ) -> BTreeMap<String, ChoiceParticipant> {
        let mut physicians: BTreeMap<String, ChoiceParticipant> = BTreeMap::new();

        for (disease_cn, participants) in &self.f1 {
            for (participant, f1) in participants {
                if model_names.contains(participant) {
                    continue;
                }
                let entry = physicians
                    .entry(participant.clone())
                    .or_insert_with(|| self.blank(participant));
                entry.per_disease_f1.insert(disease_cn.clone(), *f1);
                if let Some(std_error) = self.std_error(disease_cn, participant) {
                    entry.per_disease_std_error.insert(disease_cn.clone(), std_error);
                }
            }
        }

        for (participant, macro_f1) in macro_avg {
            if model_names.contains(participant) {
                continue;
            }
            physicians
                .entry(participant.clone())
                .or_insert_with(|| self.blank(participant))
                .macro_avg_f1 = macro_f1.clone();
        }

        let averages = cohort_averages(&physicians);
        physicians.extend(averages);
        physicians
    }
}

#[derive(Debug, Default)]
pub struct ComparisonView {
    pub anatomical: BTreeMap<String, ChoiceParticipant>,
    pub diagnosis: BTreeMap<String, ChoiceParticipant>,
}

pub fn transform(
    file: ComparisonFile,
    model_names: &BTreeSet<String>,
    normalizer: &Normalizer,
) -> ComparisonView {
    let runs: Vec<(String, &ParticipantRun)> = file
        .physician_results
        .iter()
        .map(|(key, run)| (run.physician_key(key), run))
        .chain(
            file.model_results
                .iter()
                .map(|(key, run)| (normalize_model(key), run)),
        )
        .collect();

    let f1_scores = file.f1_scores.unwrap_or_default();
    let macro_avg: BTreeMap<String, Option<MacroF1>> = f1_scores
        .macro_avg_f1
        .iter()
        .map(|(participant, value)| (canonical_participant(participant), macro_f1(value)))
        .collect();

    let anatomical = TaskScores::collect(
        TASK_ANATOMICAL,
        f1_scores.anatomical_location_disease_f1,
        &runs,
        normalizer,
    );
    let diagnosis = TaskScores::collect(
        TASK_DIAGNOSIS,
        f1_scores.diagnosis_disease_f1,
        &runs,
        normalizer,
    );

    ComparisonView {
        anatomical: anatomical.physicians(&macro_avg, model_names),
        diagnosis: diagnosis.physicians(&macro_avg, model_names),
    }
}

fn macro_f1(value: &Value) -> Option<MacroF1> {
    match value {
        Value::Object(by_key) => Some(MacroF1::ByKey(
            by_key
                .iter()
                .filter_map(|(key, item)| lenient::number(item).map(|f1| (key.clone(), f1)))
                .collect(),
        )),
        other => lenient::number(other).map(MacroF1::Overall),
    }
}

/// Equal-weight average per cohort; sample sizes are summed.
fn cohort_averages(
    physicians: &BTreeMap<String, ChoiceParticipant>,
) -> BTreeMap<String, ChoiceParticipant> {
    let groups = group_by_cohort(
        physicians
            .values()
            .map(|physician| (physician.name.as_str(), physician.cohort.as_deref())),
    );

    let mut averages = BTreeMap::new();
    for (cohort_cn, members) in groups {
        let mut macro_f1 = KeyedSamples::default();
        let mut f1 = KeyedSamples::default();
        let mut std_error = KeyedSamples::default();
        let mut sample_size: i64 = 0;

        for member in members {
            let Some(entry) = physicians.get(member) else {
                continue;
            };
            sample_size = sample_size.saturating_add(entry.sample_size.unwrap_or(0));
            match &entry.macro_avg_f1 {
                Some(MacroF1::Overall(value)) => macro_f1.push("overall", *value),
                Some(MacroF1::ByKey(by_key)) => {
                    for (key, value) in by_key {
                        macro_f1.push(key, *value);
                    }
                }
                None => {}
            }
            for (disease, value) in &entry.per_disease_f1 {
                f1.push(disease, *value);
            }
            for (disease, value) in &entry.per_disease_std_error {
                std_error.push(disease, *value);
            }
        }

        let name = average_name(cohort_cn);
        let macro_means = macro_f1.means();
        let average = ChoiceParticipant {
            name: name.clone(),
            cohort: Some(cohort_cn.to_string()),
            per_disease_f1: f1.means(),
            per_disease_std_error: std_error.means(),
            sample_size: (sample_size != 0).then_some(sample_size),
            macro_avg_f1: (!macro_means.is_empty()).then_some(MacroF1::ByKey(macro_means)),
        };
        averages.insert(name, average);
    }
    averages
}
