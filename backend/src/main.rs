use clap::Parser;
use signscan::cli::{self, Cli, Commands, OutputOptions};
use signscan::inference::{Classifier, load_model};
use std::process::ExitCode;

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    let config = match cli::resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Commands::Info => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = cli::write_info(&config, &mut stdout) {
                log::error!("Failed to write output: {}", e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Commands::Classify {
            files,
            mode,
            json,
            all,
        } => {
            log::info!("Loading model from {}", config.model.path.display());
            let model = match load_model(&config.model) {
                Ok(model) => model,
                Err(e) => {
                    log::error!("Model unavailable: {}", e);
                    return ExitCode::from(2);
                }
            };
            let classifier = match Classifier::from_config(&config, model) {
                Ok(classifier) => classifier,
                Err(e) => {
                    log::error!("Invalid classifier configuration: {}", e);
                    return ExitCode::from(2);
                }
            };

            let options = OutputOptions {
                mode: mode.unwrap_or(classifier.mode()),
                json,
                all_scores: all,
            };
            let mut stdout = std::io::stdout().lock();
            match cli::classify_files(&classifier, &files, options, &mut stdout) {
                Ok(0) => ExitCode::SUCCESS,
                Ok(failures) => {
                    log::warn!("{} of {} images could not be classified", failures, files.len());
                    ExitCode::FAILURE
                }
                Err(e) => {
                    log::error!("Failed to write output: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
