use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::cohort::{
    KeyedSamples, average_name, average_name_cn, group_by_cohort, is_average, resolve_cohort,
};
use super::lenient;
use crate::model::{DiseaseColumns, LikertBlock, LikertDisease, LikertParticipant, LikertScore};
use crate::normalize::{Normalizer, canonical_participant};
use crate::standards::{
    LIKERT_DIMENSIONS, LikertDimension, PHYSICIAN_NAMES_EN, is_known_physician_code, reverse_lookup,
    task_type_name_en,
};

#[derive(Debug, Default, Deserialize)]
pub struct LikertFile {
    #[serde(default, deserialize_with = "lenient::items")]
    by_question_and_disease_type: Vec<Map<String, Value>>,
}

/// One analysis row: a participant's dimension scores for one question type
/// and disease.
struct LikertRow<'a> {
    question_type: String,
    disease_raw: String,
    participant_raw: String,
    participant_type: Option<String>,
    n_samples: i64,
    columns: &'a Map<String, Value>,
}

impl<'a> LikertRow<'a> {
    fn parse(row: &'a Map<String, Value>) -> Option<Self> {
        let field = |key: &str| {
            row.get(key)
                .and_then(lenient::text)
                .filter(|text| !text.is_empty())
        };
        Some(Self {
            question_type: field("question_type")?,
            disease_raw: field("disease_type")?,
            participant_raw: field("model_name")?,
            participant_type: row.get("participant_type").and_then(lenient::text),
            n_samples: row.get("n_samples").and_then(lenient::count).unwrap_or(0),
            columns: row,
        })
    }

    fn score(&self, dimension: &LikertDimension) -> LikertScore {
        let column = |name: String| self.columns.get(&name).and_then(lenient::number);
        LikertScore {
            name_cn: dimension.name_cn.to_string(),
            name_en: dimension.name_en.to_string(),
            order: dimension.order,
            mean: column(dimension.mean_column()),
            std: column(dimension.std_column()),
        }
    }
}

type ParticipantsByDisease = BTreeMap<String, BTreeMap<String, LikertParticipant>>;

/// One block per question type, keyed by the Chinese question type.
pub fn transform(file: LikertFile, normalizer: &Normalizer) -> BTreeMap<String, LikertBlock> {
    let mut grouped: BTreeMap<String, ParticipantsByDisease> = BTreeMap::new();
    let mut totals: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();

    for raw in &file.by_question_and_disease_type {
        let Some(row) = LikertRow::parse(raw) else {
            continue;
        };
        let Some(disease_cn) = normalizer.disease_cn(&row.disease_raw) else {
            continue;
        };
        let name = canonical_participant(&row.participant_raw);

        let participant = grouped
            .entry(row.question_type.clone())
            .or_default()
            .entry(disease_cn)
            .or_default()
            .entry(name.clone())
            .or_insert_with(|| LikertParticipant {
                name: name.clone(),
                name_cn: reverse_lookup(PHYSICIAN_NAMES_EN, &name).map(str::to_string),
                participant_type: row.participant_type.clone(),
                sample_size: None,
                dimensions: BTreeMap::new(),
            });

        if row.n_samples != 0 {
            participant.sample_size =
                Some(participant.sample_size.unwrap_or(0).saturating_add(row.n_samples));
            let total = totals
                .entry(row.question_type.clone())
                .or_default()
                .entry(name)
                .or_default();
            *total = total.saturating_add(row.n_samples);
        }
        for dimension in LIKERT_DIMENSIONS {
            participant
                .dimensions
                .insert(dimension.key.to_string(), row.score(dimension));
        }
    }

    grouped
        .into_iter()
        .map(|(question_type, mut diseases)| {
            let mut question_totals = totals.remove(&question_type).unwrap_or_default();
            add_cohort_averages(&mut diseases, &mut question_totals);
            let block = LikertBlock {
                question_type_en: task_type_name_en(&question_type),
                question_type_cn: question_type.clone(),
                diseases: diseases
                    .into_iter()
                    .map(|(disease_cn, participants)| {
                        likert_disease(&disease_cn, participants, normalizer)
                    })
                    .collect(),
                participant_sample_sizes: question_totals,
            };
            (question_type, block)
        })
        .collect()
}

fn likert_disease(
    disease_cn: &str,
    participants: BTreeMap<String, LikertParticipant>,
    normalizer: &Normalizer,
) -> LikertDisease {
    let info = normalizer.disease_label(disease_cn);
    let mut participants: Vec<LikertParticipant> = participants.into_values().collect();
    participants.sort_by(|left, right| sort_name(left).cmp(sort_name(right)));
    LikertDisease {
        disease: info.name_cn.clone(),
        columns: DiseaseColumns::from(&info),
        participants,
    }
}

fn sort_name(participant: &LikertParticipant) -> &str {
    participant.name_cn.as_deref().unwrap_or(&participant.name)
}

/// Only listed physicians are averaged. Each cohort gets its summed sample
/// size in `totals` and, per disease, an entry with mean dimension scores.
fn add_cohort_averages(diseases: &mut ParticipantsByDisease, totals: &mut BTreeMap<String, i64>) {
    let members: BTreeMap<&'static str, Vec<String>> = group_by_cohort(
        diseases
            .values()
            .flat_map(BTreeMap::values)
            .filter(|participant| is_known_physician_code(&participant.name))
            .map(|participant| {
                (
                    participant.name.as_str(),
                    participant.participant_type.as_deref(),
                )
            }),
    )
    .into_iter()
    .map(|(cohort_cn, names)| (cohort_cn, names.into_iter().map(str::to_string).collect()))
    .collect();

    for (cohort_cn, names) in &members {
        let total: i64 = names
            .iter()
            .map(|name| totals.get(name).copied().unwrap_or(0))
            .fold(0, i64::saturating_add);
        totals.insert(average_name(cohort_cn), total);
    }

    for participants in diseases.values_mut() {
        let averages = disease_cohort_averages(participants);
        participants.extend(averages);
    }
}

#[derive(Default)]
struct CohortBucket {
    sample_size: i64,
    means: KeyedSamples,
    stds: KeyedSamples,
}

fn disease_cohort_averages(
    participants: &BTreeMap<String, LikertParticipant>,
) -> BTreeMap<String, LikertParticipant> {
    let mut buckets: BTreeMap<&'static str, CohortBucket> = BTreeMap::new();
    for participant in participants.values() {
        if is_average(&participant.name) || !is_known_physician_code(&participant.name) {
            continue;
        }
        let cohort_type = participant.participant_type.as_deref();
        let Some(cohort_cn) = resolve_cohort(cohort_type, &participant.name) else {
            continue;
        };
        let bucket = buckets.entry(cohort_cn).or_default();
        bucket.sample_size = bucket
            .sample_size
            .saturating_add(participant.sample_size.unwrap_or(0));
        for (key, score) in &participant.dimensions {
            if let Some(mean) = score.mean {
                bucket.means.push(key, mean);
            }
            if let Some(std) = score.std {
                bucket.stds.push(key, std);
            }
        }
    }

    let mut averages = BTreeMap::new();
    for (cohort_cn, bucket) in buckets {
        let dimensions: BTreeMap<String, LikertScore> = LIKERT_DIMENSIONS
            .iter()
            .filter_map(|dimension| {
                let mean = bucket.means.mean_of(dimension.key);
                let std = bucket.stds.mean_of(dimension.key);
                if mean.is_none() && std.is_none() {
                    return None;
                }
                let score = LikertScore {
                    name_cn: dimension.name_cn.to_string(),
                    name_en: dimension.name_en.to_string(),
                    order: dimension.order,
                    mean,
                    std,
                };
                Some((dimension.key.to_string(), score))
            })
            .collect();
        if dimensions.is_empty() {
            continue;
        }

        let name = average_name(cohort_cn);
        averages.insert(
            name.clone(),
            LikertParticipant {
                name,
                name_cn: Some(average_name_cn(cohort_cn)),
                participant_type: Some(cohort_cn.to_string()),
                sample_size: (bucket.sample_size != 0).then_some(bucket.sample_size),
                dimensions,
            },
        );
    }
    averages
}
