use anyhow::Context;
use clap::Parser;
use lecturer_assign::adapters::export;
use lecturer_assign::core::coordinator::{AssignAttempt, AssignRequest, BatchReport, MoveOutcome};
use lecturer_assign::domain::ports::{CatalogProvider, LecturerRegistry};
use lecturer_assign::utils::error::{AssignError, ErrorSeverity};
use lecturer_assign::utils::{logger, validation::Validate};
use lecturer_assign::{AssignmentEngine, Cli, Command, EngineSettings, FileCatalog, HttpBackend, TomlConfig};
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match TomlConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_logger(cli.verbose || config.verbose(), config.log_format());
    tracing::info!("🚀 Starting lecturer-assign");
    tracing::info!("📁 Configuration loaded from: {}", cli.config);

    if let Some(block) = cli.block {
        config.engine.block = Some(block);
        tracing::info!("🔧 Block overridden to: {}", block);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let engine = build_engine(&config)?;
    let block = engine.settings().block;

    let outcome = match engine.load(block).await {
        Ok(()) => run_command(&engine, &cli.command).await,
        Err(e) => Err(e),
    };
    engine.settle().await;

    match outcome {
        Ok(()) => {
            print_warnings(&engine).await;
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Operation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = exit_code(&e);
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

fn build_engine(config: &TomlConfig) -> anyhow::Result<AssignmentEngine> {
    let backend = Arc::new(HttpBackend::from_config(&config.backend));

    let (catalog, registry): (Arc<dyn CatalogProvider>, Arc<dyn LecturerRegistry>) = match &config.fixtures {
        Some(fixtures) => {
            let file = Arc::new(
                FileCatalog::from_file(&fixtures.catalog_file)
                    .with_context(|| format!("loading fixture {}", fixtures.catalog_file))?,
            );
            (file.clone() as Arc<dyn CatalogProvider>, file as Arc<dyn LecturerRegistry>)
        }
        None => (
            backend.clone() as Arc<dyn CatalogProvider>,
            backend.clone() as Arc<dyn LecturerRegistry>,
        ),
    };

    let engine = AssignmentEngine::builder()
        .catalog(catalog)
        .registry(registry)
        .api(backend.clone())
        .status(backend)
        .settings(EngineSettings::from_provider(config))
        .build()
        .context("building assignment engine")?;
    Ok(engine)
}

async fn run_command(engine: &AssignmentEngine, command: &Command) -> lecturer_assign::Result<()> {
    match command {
        Command::Status => {
            for shortage in engine.shortages().await {
                println!(
                    "📊 semester {}: {} modules x {} groups, {} of {} instructors assigned",
                    shortage.semester,
                    shortage.total_modules,
                    shortage.total_groups,
                    shortage.assigned_instructors,
                    shortage.required_instructors
                );
            }
        }
        Command::Snapshot { csv } => {
            let snapshot = engine.snapshot().await;
            match csv {
                Some(path) => {
                    let catalog = engine.catalog().await;
                    let lecturers: HashMap<_, _> = engine
                        .lecturers()
                        .await
                        .into_iter()
                        .map(|l| (l.id.clone(), l))
                        .collect();
                    let rows = export::write_snapshot_csv(path, &snapshot, &catalog, &lecturers)?;
                    println!("💾 {} bindings written to {}", rows, path);
                }
                None => {
                    for (module_id, assignments) in &snapshot {
                        for a in assignments {
                            let flag = if a.skill_mismatch { " (skill mismatch)" } else { "" };
                            println!("{} -> {} [{}]{}", module_id, a.lecturer_id, a.role, flag);
                        }
                    }
                }
            }
        }
        Command::Assign {
            lecturer,
            module,
            confirm,
        } => {
            let mut request = AssignRequest::new(lecturer.clone(), module.clone());
            if *confirm {
                request = request.confirmed();
            }
            match engine.assign(&request).await? {
                AssignAttempt::NeedsConfirmation(mismatch) => {
                    println!("⚠️ {}; rerun with --confirm to assign anyway", mismatch);
                }
                AssignAttempt::Completed(report) => print_report("assign", &report),
            }
        }
        Command::Unassign { lecturer, module } => {
            let report = engine.unassign(lecturer, module).await?;
            print_report("unassign", &report);
        }
        Command::Move {
            lecturer,
            from,
            to,
            confirm,
        } => match engine.move_lecturer(lecturer, from, to, *confirm).await? {
            MoveOutcome::Dropped => println!("⏳ Another move is still in flight; request ignored"),
            MoveOutcome::NeedsConfirmation(mismatch) => {
                println!("⚠️ {}; rerun with --confirm to move anyway", mismatch);
            }
            MoveOutcome::Completed { unassigned, assigned } => {
                print_report("unassign", &unassigned);
                print_report("assign", &assigned);
            }
        },
    }
    Ok(())
}

fn print_report(action: &str, report: &BatchReport) {
    println!("{:?} {}: {}", report.status, action, report.summary());
    for failure in &report.failed {
        println!("  ❌ {}: {}", failure.module_id, failure.reason);
    }
    if let Some(warning) = &report.warning {
        println!("  ⚠️ {}", warning);
    }
}

async fn print_warnings(engine: &AssignmentEngine) {
    for warning in engine.warnings().await {
        println!("⚠️ {}", warning);
    }
}

fn exit_code(e: &AssignError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
