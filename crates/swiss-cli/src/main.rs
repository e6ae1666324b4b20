//! Swiss - interactive director console for Swiss-system chess tournaments.
//!
//! Logs go to stderr so they never interleave with prompts on stdout.

mod command;
mod prompt;
mod session;

use anyhow::Context;
use clap::Parser;
use prompt::Prompter;
use session::Session;
use std::path::{Path, PathBuf};
use swiss_engine::{report, Advance, Director, SwissConfig};
use tracing_subscriber::EnvFilter;

/// Swiss - runs a Swiss-system chess tournament.
#[derive(Parser, Debug)]
#[command(name = "swiss")]
#[command(about = "Runs a Swiss-system chess tournament")]
struct Args {
    /// Path to the configuration file [default: swiss.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory, overrides `data_dir` from the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log pairing internals
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SwissConfig> {
    match path {
        Some(path) => {
            SwissConfig::load_from(path).with_context(|| format!("loading {}", path.display()))
        }
        None => SwissConfig::load()
            .with_context(|| format!("loading {}", SwissConfig::config_path().display())),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    tracing::info!("Data directory: {}", config.data_dir.display());

    let (director, resumed) = Director::open(config).context("opening tournament data")?;
    if let Some(Advance::Finalized { standings, archive }) = &resumed {
        println!("{}", report::standings("Final standings", standings));
        println!("Tournament archived to {}", archive.display());
    } else if let Some(Advance::Paired { round }) = resumed {
        println!("Round {round} paired on resume.");
    } else if let Some(Advance::Blocked { round, error }) = resumed {
        println!("Round {round} cannot be paired: {error}");
    }

    let stdin = std::io::stdin();
    let prompter = Prompter::new(stdin.lock(), std::io::stdout().lock());
    Session::new(director, prompter).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["swiss"]).unwrap();
        assert_eq!(args.config, None);
        assert_eq!(args.data_dir, None);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_overrides() {
        let args =
            Args::try_parse_from(["swiss", "--config", "club.toml", "--data-dir", "/tmp/club", "-v"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("club.toml")));
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/club")));
        assert!(args.verbose);
    }

    #[test]
    fn test_default_config_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config, SwissConfig::default());
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("club.toml");
        std::fs::write(&path, "data_dir = \"club-data\"\n[rating]\ndefault_k_factor = 40\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("club-data"));
        assert_eq!(config.rating.default_k_factor, 40);
    }

    #[test]
    fn test_broken_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("club.toml");
        std::fs::write(&path, "data_dir = [").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_args_reject_unknown_flag() {
        assert!(Args::try_parse_from(["swiss", "--rounds", "5"]).is_err());
    }
}
