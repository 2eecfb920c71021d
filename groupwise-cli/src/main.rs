// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Groupwise CLI
//!
//! Groups users from a JSON file and manages attention parameter artifacts.

mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use groupwise_core::GroupingConfig;
use groupwise_engine::{GroupingPipeline, GroupingRequest, GroupingResponse, RunOptions};
use groupwise_gnn::{Architecture, AttentionParameters, ParameterStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use telemetry::LogFormat;
use tracing::info;

#[derive(Parser)]
#[command(name = "groupwise")]
#[command(about = "Groupwise - cohesive user grouping over semantic embeddings", long_about = None)]
struct Cli {
    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormat,

    /// Verbose mode (debug-level logs unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Group the users of a JSON request file
    Group {
        /// Request file: {"users": [{"id": ..., "embedding": [...]}]}
        #[arg(long)]
        input: PathBuf,

        /// Attention parameter artifact (.json or bincode)
        #[arg(long)]
        params: PathBuf,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for the genetic search (overrides the configuration)
        #[arg(long)]
        seed: Option<u64>,

        /// Include refined embeddings in the output
        #[arg(long)]
        emit_refined: bool,

        /// Write the response here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Attention parameter artifacts
    Params {
        #[command(subcommand)]
        command: ParamsCommands,
    },
}

#[derive(Subcommand)]
enum ParamsCommands {
    /// Print version, fingerprint and layer shapes of an artifact
    Inspect {
        #[arg(long)]
        params: PathBuf,
    },

    /// Write a synthetic (untrained) artifact for smoke runs
    Synth {
        #[arg(long, default_value = "768")]
        input_dim: usize,

        /// Channels per head in hidden layers
        #[arg(long, default_value = "512")]
        hidden: usize,

        /// Heads per hidden layer
        #[arg(long, default_value = "4")]
        heads: usize,

        /// Total layers including the output layer
        #[arg(long, default_value = "4")]
        layers: usize,

        #[arg(long, default_value = "768")]
        output_dim: usize,

        #[arg(long, default_value = "0")]
        seed: u64,

        /// Destination; `.json` writes JSON, anything else bincode
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    telemetry::init_logging(cli.log_format, level)?;

    match cli.command {
        Commands::Group {
            input,
            params,
            config,
            seed,
            emit_refined,
            output,
        } => run_group(&input, &params, config.as_deref(), seed, emit_refined, output.as_deref()),
        Commands::Params { command } => match command {
            ParamsCommands::Inspect { params } => inspect_params(&params),
            ParamsCommands::Synth {
                input_dim,
                hidden,
                heads,
                layers,
                output_dim,
                seed,
                out,
            } => {
                let arch = Architecture {
                    input_dim,
                    hidden_channels: hidden,
                    heads,
                    layers,
                    output_dim,
                };
                synth_params(&arch, seed, &out)
            }
        },
    }
}

fn run_group(
    input: &Path,
    params: &Path,
    config: Option<&Path>,
    seed: Option<u64>,
    emit_refined: bool,
    output: Option<&Path>,
) -> Result<()> {
    let config = match config {
        Some(path) => GroupingConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GroupingConfig::default(),
    };

    let store = ParameterStore::open(params)
        .with_context(|| format!("Failed to load attention parameters {}", params.display()))?;
    let pipeline = GroupingPipeline::new(config, Arc::new(store))?;

    let body = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let request: GroupingRequest =
        serde_json::from_slice(&body).with_context(|| format!("Invalid request in {}", input.display()))?;

    let options = RunOptions {
        seed,
        include_refined: emit_refined,
        ..RunOptions::default()
    };
    let outcome = pipeline.group(&request.users, options)?;
    let response = GroupingResponse::from(outcome);
    let rendered = serde_json::to_string_pretty(&response)?;

    match output {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Wrote grouping response");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn inspect_params(path: &Path) -> Result<()> {
    let params = AttentionParameters::load(path)
        .with_context(|| format!("Failed to load attention parameters {}", path.display()))?;

    let layers: Vec<serde_json::Value> = params
        .layers
        .iter()
        .map(|layer| {
            serde_json::json!({
                "input_dim": layer.input_dim(),
                "heads": layer.heads,
                "out_channels": layer.out_channels,
                "concat": layer.concat,
                "output_dim": layer.output_dim(),
            })
        })
        .collect();

    let summary = serde_json::json!({
        "version": params.version,
        "fingerprint": params.fingerprint()?,
        "input_dim": params.input_dim,
        "output_dim": params.output_dim(),
        "negative_slope": params.negative_slope,
        "layers": layers,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn synth_params(arch: &Architecture, seed: u64, out: &Path) -> Result<()> {
    let params = AttentionParameters::glorot(arch, seed);
    params.validate().context("Requested architecture is not runnable")?;
    let fingerprint = params.fingerprint()?;
    params
        .save(out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!(
        path = %out.display(),
        version = %params.version,
        %fingerprint,
        "Wrote synthetic attention parameters"
    );
    Ok(())
}
