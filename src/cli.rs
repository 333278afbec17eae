use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gibench-leaderboard",
    version,
    about = "Build the GIBench leaderboard and standards JSON from evaluation results"
)]
pub struct Cli {
    /// Root of the evaluation results tree.
    #[arg(long, default_value = "../evaluation/results")]
    pub results_root: PathBuf,

    /// Directory receiving gibench_leaderboard.json and assets/data/.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}
