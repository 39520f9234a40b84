use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "versioned-map")]
#[command(about = "Run scripts and concurrency checks against a versioned key/value map")]
#[command(version)]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Execute a command script against a fresh map
    Run {
        /// Script file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        script: String,

        /// Skip unparsable lines instead of aborting
        #[arg(long)]
        keep_going: bool,
    },

    /// Hammer a map with concurrent writers and verify version consistency
    Stress {
        /// Number of concurrent writers (overrides config)
        #[arg(long)]
        writers: Option<usize>,

        /// Puts issued by each writer (overrides config)
        #[arg(long)]
        puts: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_defaults_to_stdin() {
        let config = CliConfig::try_parse_from(["versioned-map", "run"]).unwrap();
        match config.command {
            CliCommand::Run { script, keep_going } => {
                assert_eq!(script, "-");
                assert!(!keep_going);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let config = CliConfig::try_parse_from([
            "versioned-map",
            "stress",
            "--writers",
            "4",
            "--json",
            "-c",
            "vm.toml",
        ])
        .unwrap();

        assert!(config.json);
        assert_eq!(config.config, Some(PathBuf::from("vm.toml")));
        match config.command {
            CliCommand::Stress { writers, puts } => {
                assert_eq!(writers, Some(4));
                assert_eq!(puts, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
