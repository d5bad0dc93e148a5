use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use latlen_core::report::{format_json_line, format_text_line};
use latlen_core::settings::{validate, Settings};
use latlen_core::{analyze_lattice, Rspecifier};
use tracing::{info, info_span};

use super::config_ops::load_settings_file;
use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Everything the `distribution` command takes from the command line.
#[derive(Debug, Clone, Default)]
pub struct DistributionOptions {
    pub rspecifiers: Vec<String>,
    pub config: Option<PathBuf>,
    pub acoustic_scale: Option<f32>,
    pub graph_scale: Option<f32>,
    pub insertion_penalty: Option<f32>,
    pub nbest: Option<i64>,
    pub json: bool,
    pub output: Option<PathBuf>,
}

impl DistributionOptions {
    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    /// Settings file (or defaults) with command line overrides applied.
    pub fn resolve_settings(&self) -> Result<Settings, CliError> {
        let mut settings = match &self.config {
            Some(path) => load_settings_file(path)?,
            None => Settings::default(),
        };
        if let Some(v) = self.acoustic_scale {
            settings.scale.acoustic = v;
        }
        if let Some(v) = self.graph_scale {
            settings.scale.graph = v;
        }
        if let Some(v) = self.insertion_penalty {
            settings.penalty.insertion = v;
        }
        if self.nbest.is_some() {
            settings.distribution.nbest = self.nbest;
        }
        validate(&settings).map_err(|source| CliError::Settings {
            path: "command line".to_string(),
            source,
        })?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub lattices: usize,
    pub empty: usize,
}

/// Analyze every lattice of every archive, in order, writing one line each
/// to `out`. Stops at the first error.
pub fn run_distribution<W: Write>(
    specs: &[Rspecifier],
    settings: &Settings,
    format: OutputFormat,
    out: &mut W,
    out_name: &str,
) -> Result<RunSummary, CliError> {
    let mut summary = RunSummary::default();
    for spec in specs {
        for entry in spec.open()? {
            let (key, lat) = entry?;
            let _span = info_span!("lattice", key = %key).entered();
            let dist = analyze_lattice(lat, settings).map_err(|source| CliError::Analyze {
                key: key.clone(),
                source,
            })?;
            let line = match format {
                OutputFormat::Text => format_text_line(&key, &dist),
                OutputFormat::Json => format_json_line(&key, &dist)?,
            };
            writeln!(out, "{line}").map_err(|source| CliError::Write {
                path: out_name.to_string(),
                source,
            })?;
            summary.lattices += 1;
            if dist.is_empty() {
                summary.empty += 1;
            }
        }
    }
    out.flush().map_err(|source| CliError::Write {
        path: out_name.to_string(),
        source,
    })?;
    Ok(summary)
}

pub fn distribution_cmd(opts: &DistributionOptions) -> Result<RunSummary, CliError> {
    let settings = opts.resolve_settings()?;
    let specs = opts
        .rspecifiers
        .iter()
        .map(|s| Rspecifier::parse(s))
        .collect::<Result<Vec<_>, _>>()?;

    let summary = match &opts.output {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::Write {
                path: path.display().to_string(),
                source,
            })?;
            let mut out = BufWriter::new(file);
            run_distribution(&specs, &settings, opts.format(), &mut out, &display(path))?
        }
        None => {
            let mut out = BufWriter::new(io::stdout().lock());
            run_distribution(&specs, &settings, opts.format(), &mut out, "stdout")?
        }
    };
    info!(
        lattices = summary.lattices,
        empty = summary.empty,
        "done computing length distributions"
    );
    Ok(summary)
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
