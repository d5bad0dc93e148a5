use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use latlen_cli::commands::config_ops;
use latlen_cli::commands::distribution_ops::{self, DistributionOptions};
use latlen_cli::init_tracing;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

#[derive(Parser)]
#[command(name = "latlen", about = "Word-length distributions of recognition lattices")]
struct Cli {
    /// Emit log records as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the length distribution of every lattice in the archives
    Distribution {
        /// Lattice archives (ark:file, ark,t:file, file, or - for stdin)
        #[arg(required = true)]
        rspecifiers: Vec<String>,
        /// Settings file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Multiplier for acoustic costs
        #[arg(long)]
        acoustic_scale: Option<f32>,
        /// Multiplier for graph costs
        #[arg(long)]
        graph_scale: Option<f32>,
        /// Cost added to every word arc
        #[arg(long, allow_negative_numbers = true)]
        insertion_penalty: Option<f32>,
        /// Number of lengths to report (unlimited when omitted)
        #[arg(long, allow_negative_numbers = true)]
        nbest: Option<i64>,
        /// Output JSON lines instead of text
        #[arg(long)]
        json: bool,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the default settings TOML
    SettingsExport,
    /// Check a settings file
    SettingsValidate {
        /// Settings file (TOML)
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Distribution {
            rspecifiers,
            config,
            acoustic_scale,
            graph_scale,
            insertion_penalty,
            nbest,
            json,
            output,
        } => {
            let opts = DistributionOptions {
                rspecifiers,
                config,
                acoustic_scale,
                graph_scale,
                insertion_penalty,
                nbest,
                json,
                output,
            };
            die!(distribution_ops::distribution_cmd(&opts), "Error: {}");
        }
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => {
            die!(config_ops::settings_validate(&file), "Error: {}")
        }
    }
}
