use std::path::{Path, PathBuf};

pub const LEADERBOARD_FILE: &str = "gibench_leaderboard.json";
pub const STANDARDS_FILE: &str = "gibench_standards.json";

/// Fixed layout of the evaluation results tree.
#[derive(Debug, Clone)]
pub struct ResultPaths {
    pub multiple_choice: PathBuf,
    pub spatial_detail: PathBuf,
    pub spatial_overall: PathBuf,
    pub comparison: PathBuf,
    pub spatial_comparison: PathBuf,
    pub likert: PathBuf,
}

/// One input file: role name, path and whether the run needs it.
#[derive(Debug, Clone, Copy)]
pub struct SourceSlot<'a> {
    pub role: &'static str,
    pub path: &'a Path,
    pub required: bool,
}

impl ResultPaths {
    pub fn new(results_root: &Path) -> Self {
        let evaluation = results_root.join("evaluation_results");
        let spatial = evaluation.join("spatial_localization");
        Self {
            multiple_choice: evaluation.join("multiple_choice").join("multiple_choice.json"),
            spatial_detail: spatial.join("spatial_localization.json"),
            spatial_overall: spatial.join("spatial_localization_overall_metrics.json"),
            comparison: results_root
                .join("physician_vs_model")
                .join("comparison_results.json"),
            spatial_comparison: results_root
                .join("physician_vs_model_spatial")
                .join("spatial_metrics.json"),
            likert: results_root
                .join("full_dataset_likert_analysis")
                .join("analysis_results.json"),
        }
    }

    pub fn slots(&self) -> [SourceSlot<'_>; 6] {
        [
            slot("multiple_choice", self.multiple_choice.as_path(), true),
            slot("spatial_localization", self.spatial_detail.as_path(), true),
            slot("spatial_localization_overall", self.spatial_overall.as_path(), true),
            slot("physician_vs_model", self.comparison.as_path(), false),
            slot("physician_vs_model_spatial", self.spatial_comparison.as_path(), false),
            slot("likert_analysis", self.likert.as_path(), false),
        ]
    }
}

fn slot<'a>(role: &'static str, path: &'a Path, required: bool) -> SourceSlot<'a> {
    SourceSlot {
        role,
        path,
        required,
    }
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub leaderboard: PathBuf,
    pub standards: PathBuf,
}

impl OutputPaths {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            leaderboard: output_dir.join(LEADERBOARD_FILE),
            standards: output_dir.join("assets").join("data").join(STANDARDS_FILE),
        }
    }
}
