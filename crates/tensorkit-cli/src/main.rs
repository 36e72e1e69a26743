mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tensorkit_backend_ort::OrtBackend;
use tensorkit_core::{
    image_dims_for_shape, load_labels, map_tensor_to_image_dims, top_k, Backend, BackendSession,
    GraphSource, RoleSpec, SessionOptions, Shape, Tensor,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = log_filter(cli.log.as_deref(), std::env::var("RUST_LOG").ok())?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Run {
            graph,
            labels,
            device,
            role_spec,
            k,
            dynamic_dim,
            threads,
        } => {
            let roles = RoleSpec::parse(&role_spec)?;
            let options = SessionOptions {
                intra_threads: threads,
                ..SessionOptions::default()
            };
            run(graph, labels, &device, roles, k, dynamic_dim, &options)
        }
        Command::Topk { k, scores } => {
            let result = top_k(&scores, k)?;
            for entry in result.entries() {
                println!("{}\t{}", entry.index, entry.score);
            }
            Ok(())
        }
        Command::Dims {
            role_spec,
            batch,
            dims,
        } => {
            let shape = Shape::from_slice(&dims);
            let roles = RoleSpec::parse(&role_spec)?;
            println!("{}", map_tensor_to_image_dims(&shape, roles));
            if batch {
                println!("{}", image_dims_for_shape(&shape, true));
            }
            Ok(())
        }
    }
}

/// `--log` wins over `RUST_LOG`; with neither set the filter is `info`.
fn log_filter(flag: Option<&str>, env: Option<String>) -> Result<EnvFilter> {
    let directives = flag.map(str::to_owned).or(env).unwrap_or_else(|| "info".to_owned());
    EnvFilter::try_new(&directives).with_context(|| format!("invalid log filter {directives:?}"))
}

fn run(
    graph_path: PathBuf,
    labels_path: Option<PathBuf>,
    device: &str,
    roles: RoleSpec,
    k: usize,
    dynamic_dim: usize,
    options: &SessionOptions,
) -> Result<()> {
    let labels = labels_path
        .map(|path| load_labels(&path).with_context(|| format!("loading {}", path.display())))
        .transpose()?
        .unwrap_or_default();

    let backend = OrtBackend::new();
    let graph = backend
        .load_graph(&GraphSource::Path(graph_path))
        .context("failed to load graph")?;
    let mut session = backend
        .create_session(&graph, device, options)
        .context("failed to create session")?;

    let inputs: Vec<Tensor> = session
        .spec()
        .inputs
        .iter()
        .map(|spec| Tensor::zeros(spec.dtype, spec.concrete_shape(dynamic_dim)))
        .collect();
    tracing::info!(
        graph = graph.origin(),
        inputs = inputs.len(),
        device = %session.device(),
        "running graph"
    );

    let outputs = session.run(inputs).context("graph run failed")?;
    let names = session.spec().outputs.iter().map(|s| s.name.0.as_str());
    for (name, tensor) in names.zip(&outputs) {
        let dims = map_tensor_to_image_dims(tensor.shape(), roles);
        println!("{name}: shape {} image {dims}", tensor.shape());
    }

    let Some(first) = outputs.first() else {
        tracing::warn!("graph produced no outputs");
        return Ok(());
    };
    let scores = first.to_f32_vec()?;
    let best = top_k(&scores, k.min(scores.len()))?;
    for (entry, label) in best.labelled(&labels) {
        match label {
            Some(label) if !label.is_empty() => {
                println!("{}\t{}\t{label}", entry.index, entry.score)
            }
            _ => println!("{}\t{}", entry.index, entry.score),
        }
    }
    Ok(())
}
