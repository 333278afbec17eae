use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::info;

use crate::model::{HumanVsModel, Leaderboard, ParticipantBlock, SourceRecord, StandardsDocument};
use crate::normalize::{AliasSources, Normalizer};
use crate::sources::comparison::{self, ComparisonFile};
use crate::sources::likert::{self, LikertFile};
use crate::sources::multiple_choice::{self, MultipleChoiceFile};
use crate::sources::spatial;
use crate::sources::spatial_hvm::{self, SpatialComparisonFile};
use crate::standards::{TASK_FINDINGS, TASK_RECOMMENDATIONS, standards_document};

mod paths;
mod records;
mod run;

pub use paths::{OutputPaths, ResultPaths};
pub use run::run;

pub const BENCH_NAME: &str = "GIBench";
pub const DESCRIPTION: &str = "GIBench 多任务统一模型榜指标（Q1 解剖定位、Q2 病变定位、Q3 诊断）";

/// Parsed input files. The three human-vs-model sources are optional.
#[derive(Debug, Default)]
pub struct Inputs {
    pub multiple_choice: MultipleChoiceFile,
    pub spatial_detail: Map<String, Value>,
    pub spatial_overall: Map<String, Value>,
    pub comparison: Option<ComparisonFile>,
    pub spatial_comparison: Option<SpatialComparisonFile>,
    pub likert: Option<LikertFile>,
}

#[derive(Debug)]
pub struct Documents {
    pub leaderboard: Leaderboard,
    pub standards: StandardsDocument,
}

pub fn assemble(
    inputs: Inputs,
    sources: Vec<SourceRecord>,
    generated_at: String,
    normalizer: &Normalizer,
) -> Documents {
    let mut aliases = AliasSources::default();

    let choice = multiple_choice::transform(inputs.multiple_choice, normalizer, &mut aliases);
    let spatial = spatial::transform(
        inputs.spatial_overall,
        inputs.spatial_detail,
        normalizer,
        &mut aliases,
    );

    let models = records::model_records(choice, spatial, &aliases);
    info!(
        models = models.len(),
        aliased = aliases.to_map().len(),
        "assembled model records"
    );

    let model_names: BTreeSet<String> = models.keys().cloned().collect();
    let mut views = records::model_views(&models);
    let mut human_vs_model = HumanVsModel::default();

    if let Some(file) = inputs.comparison {
        let physicians = comparison::transform(file, &model_names, normalizer);
        info!(
            anatomical = physicians.anatomical.len(),
            diagnosis = physicians.diagnosis.len(),
            "assembled physician comparison"
        );
        human_vs_model.q1_anatomical_robustness = ParticipantBlock::non_empty(
            std::mem::take(&mut views.anatomical),
            physicians.anatomical,
        );
        human_vs_model.q3_diagnosis_regional_robustness = ParticipantBlock::non_empty(
            std::mem::take(&mut views.diagnosis),
            physicians.diagnosis,
        );
    }

    if let Some(file) = inputs.spatial_comparison {
        let physicians = spatial_hvm::transform(file, &model_names, normalizer);
        info!(physicians = physicians.len(), "assembled spatial comparison");
        human_vs_model.q2_spatial_localization =
            ParticipantBlock::non_empty(std::mem::take(&mut views.spatial), physicians);
    }

    if let Some(file) = inputs.likert {
        let mut blocks = likert::transform(file, normalizer);
        info!(question_types = blocks.len(), "assembled likert ratings");
        human_vs_model.q4_findings_likert = blocks.remove(TASK_FINDINGS);
        human_vs_model.q5_recommendations_likert = blocks.remove(TASK_RECOMMENDATIONS);
    }

    Documents {
        leaderboard: Leaderboard {
            bench_name: BENCH_NAME.to_string(),
            generated_at,
            description: DESCRIPTION.to_string(),
            sources,
            models,
            human_vs_model,
        },
        standards: standards_document(aliases.to_map()),
    }
}
