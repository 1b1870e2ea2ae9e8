//! Text renderings used by the CLI.

use std::fmt::Write;

use clap::ValueEnum;
use tonegraph_dsp::FrequencyResponse;
use tonegraph_graph::{Edge, ValidationError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

pub fn edges(edges: &[Edge], format: OutputFormat) -> anyhow::Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => out = serde_json::to_string_pretty(edges)?,
        OutputFormat::Csv => {
            out.push_str("id,signal,source,source_port,target,target_port\n");
            for edge in edges {
                writeln!(
                    out,
                    "{},{},{},{},{},{}",
                    edge.id,
                    edge.signal,
                    edge.source.name,
                    edge.source_port,
                    edge.target.name,
                    edge.target_port
                )?;
            }
        }
        OutputFormat::Table => {
            if edges.is_empty() {
                out.push_str("no edges\n");
            }
            for edge in edges {
                writeln!(
                    out,
                    "{:>4}  {}[{}] -> {}[{}]",
                    edge.signal, edge.source, edge.source_port, edge.target, edge.target_port
                )?;
            }
        }
    }
    Ok(out)
}

pub fn response(response: &FrequencyResponse, format: OutputFormat) -> anyhow::Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => out = serde_json::to_string_pretty(response)?,
        OutputFormat::Csv => {
            out.push_str("frequency_hz,magnitude_db,phase_rad\n");
            for (freq, magnitude, phase) in response.points() {
                writeln!(out, "{freq:.3},{magnitude:.4},{phase:.5}")?;
            }
        }
        OutputFormat::Table => {
            writeln!(out, "{:>12}  {:>10}  {:>9}", "freq (Hz)", "mag (dB)", "phase")?;
            for (freq, magnitude, phase) in response.points() {
                writeln!(out, "{freq:>12.2}  {magnitude:>10.3}  {phase:>9.4}")?;
            }
        }
    }
    Ok(out)
}

pub fn validation(errors: &[ValidationError]) -> String {
    let mut out = String::new();
    for error in errors {
        out.push_str("  - ");
        out.push_str(&error.to_string());
        out.push('\n');
    }
    out
}
