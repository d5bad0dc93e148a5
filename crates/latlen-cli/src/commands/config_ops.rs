use std::fs;
use std::path::Path;

use latlen_core::settings::{default_toml, parse_settings_toml, Settings};

use crate::CliError;

pub fn settings_export() {
    print!("{}", default_toml());
}

/// Read and validate a settings file.
pub fn load_settings_file(path: &Path) -> Result<Settings, CliError> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_settings_toml(&content).map_err(|source| CliError::Settings {
        path: path.display().to_string(),
        source,
    })
}

pub fn settings_validate(file: &Path) -> Result<(), CliError> {
    let s = load_settings_file(file)?;
    let nbest = match s.distribution.nbest {
        Some(n) => n.to_string(),
        None => "unlimited".to_string(),
    };
    println!(
        "OK: scale.acoustic={}, scale.graph={}, penalty.insertion={}, distribution.nbest={}",
        s.scale.acoustic, s.scale.graph, s.penalty.insertion, nbest
    );
    Ok(())
}
