use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "tensorkit",
    version,
    about = "Inspect ONNX graphs and post-process their outputs"
)]
pub struct Cli {
    /// Log filter (RUST_LOG syntax); falls back to RUST_LOG, then `info`
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a graph once on zero-filled inputs and summarize its outputs
    Run {
        /// Path to the ONNX graph
        #[arg(long)]
        graph: PathBuf,

        /// Newline-delimited labels for the first output
        #[arg(long)]
        labels: Option<PathBuf>,

        /// Device for inference (cpu or cuda:N)
        #[arg(long, default_value = "cpu")]
        device: String,

        /// Axis indices for width, height and channels
        #[arg(long, default_value = "120")]
        role_spec: String,

        /// Number of top entries to report
        #[arg(long, default_value_t = 5)]
        k: usize,

        /// Size substituted for dynamic input axes
        #[arg(long, default_value_t = 1)]
        dynamic_dim: usize,

        /// Intra-op threads (runtime default when unset)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Select the top-k of a list of scores
    Topk {
        #[arg(long)]
        k: usize,

        #[arg(required = true, allow_negative_numbers = true)]
        scores: Vec<f32>,
    },

    /// Map a tensor shape to image width, height and channels
    Dims {
        #[arg(long, default_value = "120")]
        role_spec: String,

        /// Also report the [N, H, W, C] reading of the shape
        #[arg(long)]
        batch: bool,

        dims: Vec<usize>,
    },
}
