use anyhow::Context;
use clap::Parser;
use std::io::Read;
use std::sync::Arc;
use versioned_map::core::stress::{MAX_PUTS_PER_WRITER, MAX_WRITERS};
use versioned_map::utils::{logger, validation, validation::Validate};
use versioned_map::{
    run_stress, CliCommand, CliConfig, ConcurrentVersionedMap, ScriptRunner, TomlConfig,
    VersionedMap,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match &cli.config {
        Some(path) => TomlConfig::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path.display()))?,
        None => TomlConfig::default(),
    };

    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    logger::init_cli_logger(cli.verbose, config.log_level(), config.log_format());
    tracing::debug!("CLI config: {:?}", cli);
    tracing::debug!("File config: {:?}", config);

    if let Err(e) = execute(&cli, &config).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.severity().exit_code());
    }

    Ok(())
}

async fn execute(cli: &CliConfig, config: &TomlConfig) -> versioned_map::Result<()> {
    let map = Arc::new(ConcurrentVersionedMap::with_capacity(
        config.map.initial_capacity,
    ));

    match &cli.command {
        CliCommand::Run { script, keep_going } => {
            let stop_on_error = config.script.stop_on_error && !keep_going;
            let runner = ScriptRunner::new(map, stop_on_error);

            let entries = if script == "-" {
                let mut source = String::new();
                std::io::stdin().read_to_string(&mut source)?;
                runner.run(&source)?
            } else {
                validation::validate_path("script", script)?;
                runner.run_file(script)?
            };

            for entry in &entries {
                if cli.json {
                    println!("{}", serde_json::to_string(&entry.output)?);
                } else {
                    println!("{}", entry.output);
                }
            }
            tracing::info!(
                "✅ {} commands executed, map at version {}",
                entries.len(),
                runner.map().current_version()
            );
        }
        CliCommand::Stress { writers, puts } => {
            let writers = writers.unwrap_or(config.stress.writers);
            let puts = puts.unwrap_or(config.stress.puts_per_writer);
            validation::validate_range("writers", writers, 1, MAX_WRITERS)?;
            validation::validate_range("puts", puts, 1, MAX_PUTS_PER_WRITER)?;

            let report = run_stress(map, writers, puts).await?;

            if cli.json {
                println!("{}", serde_json::to_string(&report)?);
            } else {
                println!("✅ {} puts from {} writers", report.total_puts, report.writers);
                println!("   final version: {}", report.final_version);
                println!("   elapsed: {:?}", report.elapsed);
                println!("   throughput: {:.0} puts/s", report.puts_per_second());
            }
        }
    }

    Ok(())
}
