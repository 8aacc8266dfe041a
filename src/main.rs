//! Supervisor matcher: rank research supervisors for a student project

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};
use supervisor_matcher::cli::{self, Cli, Commands, ConfigAction, ModelAction};
use supervisor_matcher::config::Config;
use supervisor_matcher::input::{InputManager, ProjectOverrides};
use supervisor_matcher::output::{
    save_report_to_file, suggest_filename, MatchReport, ReportGenerator, ReportOptions,
};
use supervisor_matcher::persistence::{
    JsonSupervisorDirectory, JsonlHistorySink, MatchHistorySink, SupervisorDirectory,
};
use supervisor_matcher::processing::embedding_manager::{load_backend, BackendKind, EmbeddingModelManager};
use supervisor_matcher::processing::embeddings::EmbeddingBackend;
use supervisor_matcher::processing::scoring::display_label;
use supervisor_matcher::{MatchRecord, MatcherError, Result, SupervisorMatcher};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, &config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Match {
            project,
            supervisors,
            student,
            student_id,
            title,
            tech,
            methodology,
            backend,
            embedding,
            top,
            output,
            save,
            history,
            detailed,
        } => {
            cli::validate_file_extension(&project, &["pdf", "txt", "md", "markdown", "json"])
                .map_err(|e| MatcherError::InvalidInput(format!("Project file: {}", e)))?;
            cli::validate_file_extension(&supervisors, &["json"])
                .map_err(|e| MatcherError::InvalidInput(format!("Supervisor file: {}", e)))?;

            let format = match output {
                Some(format) => format.parse()?,
                None => config.output.format,
            };

            let overrides = ProjectOverrides {
                student_id,
                student_name: student,
                project_title: title,
                technical_requirements: tech,
                methodology,
            };
            let project = InputManager::new().load_project(&project, overrides).await?;
            let supervisors = JsonSupervisorDirectory::new(supervisors).supervisors()?;

            let (model_id, backend) = prepare_backend(&config, backend, embedding).await?;
            let matcher = SupervisorMatcher::builder()
                .backend(backend)
                .weights(config.scoring.weights)
                .enable_caching(config.processing.enable_caching)
                .build()?;

            let start_time = Instant::now();
            let ranked = matcher.match_supervisors(&project, &supervisors);
            let elapsed_ms = start_time.elapsed().as_millis() as u64;

            let options = ReportOptions {
                top_n: top.unwrap_or(config.output.top_n),
                min_score: config.scoring.min_score,
            };
            let report = MatchReport::new(project, ranked, options, model_id, config.scoring.weights, elapsed_ms);

            let detailed = detailed || config.output.detailed;
            match &save {
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(suggest_filename(format, &report))
                    } else {
                        path.clone()
                    };
                    let content = ReportGenerator::with_options(false, detailed).generate_report(&report, format)?;
                    save_report_to_file(&content, &path)?;
                    println!("Report saved to {}", path.display());
                }
                None => {
                    let content = ReportGenerator::with_options(config.output.color_output, detailed)
                        .generate_report(&report, format)?;
                    println!("{}", content);
                }
            }

            if let Some(history_path) = history {
                record_best_match(&report, &history_path)?;
            }
        }

        Commands::History { file, student } => {
            let records = JsonlHistorySink::new(file).history_for(&student)?;
            if records.is_empty() {
                println!("No saved matches for {}", student);
            }
            for record in records {
                println!(
                    "{}  {} ({})  score {:.3}  skills: {}",
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.supervisor_name,
                    record.supervisor_id,
                    record.final_score,
                    if record.matching_skills.is_empty() {
                        "none".to_string()
                    } else {
                        record.matching_skills.join(", ")
                    }
                );
            }
        }

        Commands::Models { action } => {
            let mut manager = EmbeddingModelManager::new(config.models_dir().to_path_buf()).await?;
            manager.register_models(&config.models.available_models);

            match action {
                ModelAction::List { downloaded } => {
                    println!("Embedding Models\n");
                    for (id, info) in manager.list_available_models() {
                        let is_downloaded = manager.is_model_downloaded(id);
                        if downloaded && !is_downloaded {
                            continue;
                        }
                        let status = if is_downloaded { "downloaded" } else { "available" };
                        let marker = if id == config.models.default_embedding_model { " (default)" } else { "" };
                        println!(
                            "  {}{} [{}] {} - {} MB, {} dims, backend {}",
                            id, marker, status, info.repo_id, info.size_mb, info.dimensions, info.backend
                        );
                        println!("    {}", info.description);
                    }

                    if manager.list_downloaded_models().is_empty() {
                        println!("\nNo models downloaded yet. Get started with:");
                        println!("   supervisor-matcher models download {}", config.models.default_embedding_model);
                    }
                }

                ModelAction::Download { model, force } => {
                    let model_id = manager
                        .resolve_model_id(&model)
                        .ok_or_else(|| MatcherError::ModelNotFound(model.clone()))?;

                    if !force && manager.is_model_downloaded(&model_id) {
                        println!("Model '{}' is already downloaded, use --force to re-download", model_id);
                        return Ok(());
                    }

                    let spinner = spinner(&format!("Downloading {}...", model_id));
                    let result = manager.download_model(&model_id, force).await;
                    spinner.finish_and_clear();

                    let model_path = result?;
                    println!("Model '{}' downloaded to {}", model_id, model_path.display());
                }

                ModelAction::Remove { model } => {
                    let model_id = manager.resolve_model_id(&model).unwrap_or(model);
                    manager.remove_model(&model_id).await?;
                    println!("Model '{}' removed", model_id);
                }

                ModelAction::Info { model } => {
                    let model_id = manager
                        .resolve_model_id(&model)
                        .ok_or_else(|| MatcherError::ModelNotFound(model.clone()))?;
                    let info = manager
                        .get_model_info(&model_id)
                        .ok_or_else(|| MatcherError::ModelNotFound(model_id.clone()))?;

                    println!("Model Information for '{}'\n", model_id);
                    println!("Name: {}", info.name);
                    println!("Repository: {}", info.repo_id);
                    println!("Backend: {}", info.backend);
                    println!("Dimensions: {}", info.dimensions);
                    println!("Size: {} MB", info.size_mb);
                    println!("Description: {}", info.description);

                    match manager.get_model_path(&model_id) {
                        Some(path) => println!("Status: downloaded ({})", path.display()),
                        None => {
                            println!("Status: available for download");
                            println!("\nTo download this model, run:");
                            println!("   supervisor-matcher models download {}", model_id);
                        }
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("Current Configuration ({})\n", config_path.display());
                println!("Models Directory: {}", config.models_dir().display());
                println!("Default Embedding Model: {}", config.models.default_embedding_model);
                println!("Backend: {}", config.models.backend);
                println!("Embedding Cache: {}", config.processing.enable_caching);
                println!("\nScoring Weights:");
                for (key, weight) in config.scoring.weights.iter() {
                    println!("  {}: {:.1}%", display_label(key), weight * 100.0);
                }
                println!("Minimum Score: {:.2}", config.scoring.min_score);
                println!("\nOutput: {} (top {}, detailed: {}, colour: {})",
                    config.output.format,
                    config.output.top_n,
                    config.output.detailed,
                    config.output.color_output
                );
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }

            Some(ConfigAction::Reset) => {
                Config::default().save_to(config_path)?;
                println!("Configuration reset to defaults");
            }

            Some(ConfigAction::Set { key, value }) => {
                let mut config = config;
                config.set(&key, &value)?;
                config.save_to(config_path)?;
                println!("Set {} = {}", key, value);
            }
        },
    }

    Ok(())
}

/// Resolve the embedding model, download it if needed and load its backend
async fn prepare_backend(
    config: &Config,
    backend: Option<String>,
    embedding: Option<String>,
) -> Result<(String, Arc<dyn EmbeddingBackend>)> {
    let requested = embedding.unwrap_or_else(|| config.models.default_embedding_model.clone());
    let explicit_backend = backend.map(|b| b.parse::<BackendKind>()).transpose()?;

    let local_dir = PathBuf::from(&requested);
    let (model_id, model_dir, kind) = if local_dir.is_dir() {
        let kind = explicit_backend.unwrap_or(config.models.backend);
        (requested.clone(), local_dir, kind)
    } else {
        let mut manager = EmbeddingModelManager::new(config.models_dir().to_path_buf()).await?;
        manager.register_models(&config.models.available_models);

        let model_id = manager
            .resolve_model_id(&requested)
            .ok_or_else(|| MatcherError::ModelNotFound(requested.clone()))?;
        let kind = explicit_backend.unwrap_or_else(|| manager.backend_for(&model_id, config.models.backend));

        if !manager.is_model_downloaded(&model_id) {
            warn!("Model {} is not downloaded yet, fetching it now", model_id);
        }
        let model_dir = manager.ensure_model_available(&model_id).await?;
        (model_id, model_dir, kind)
    };

    info!("Using {} backend with model {}", kind, model_id);
    let spinner = spinner(&format!("Loading {} ({})...", model_id, kind));
    let loaded = tokio::task::spawn_blocking(move || load_backend(kind, &model_dir))
        .await
        .map_err(|e| MatcherError::ResourceInitialization(format!("Model loading task failed: {}", e)))?;
    spinner.finish_and_clear();

    Ok((model_id, loaded?))
}

fn record_best_match(report: &MatchReport, history_path: &Path) -> Result<()> {
    let Some(best) = report.best_match() else {
        warn!("No match to record in history");
        return Ok(());
    };

    let record = MatchRecord::from_result(report.student.student_key(), best);
    JsonlHistorySink::new(history_path).record(&record)?;
    println!(
        "Recorded {} as the chosen match in {}",
        best.supervisor_name,
        history_path.display()
    );
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
