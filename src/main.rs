use clap::Parser;
use sfle::domain::model::PlannedStep;
use sfle::utils::{logger, validation::Validate};
use sfle::{PipelineConfig, PipelineRunner, ProcessExecutor, RunnerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = RunnerConfig::parse();
    let execution_id = format!("run_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"));

    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose, tracing::Level::INFO);
    }

    tracing::info!("📁 Loading pipeline from: {} ({})", args.config, execution_id);

    let config = match PipelineConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load pipeline file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Pipeline validation failed: {}", e);
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    let known = match config.selectable_names() {
        Ok(names) => names,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(e.exit_code());
        }
    };
    for name in &args.only {
        if !known.contains(name) {
            eprintln!("❌ Unknown step, processor or child '{}' in --only", name);
            std::process::exit(2);
        }
    }

    let runner = PipelineRunner::new(ProcessExecutor::new(), config)
        .with_force(args.force)
        .with_only(args.only.clone());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No commands will be executed");
        let plan = match runner.plan() {
            Ok(plan) => plan,
            Err(e) => {
                eprintln!("❌ {}", e);
                std::process::exit(e.exit_code());
            }
        };
        display_plan(runner.config(), &plan);
        return Ok(());
    }

    match runner.run().await {
        Ok(results) => {
            let summary = PipelineRunner::<ProcessExecutor>::get_execution_summary(&results);
            tracing::info!(
                "✅ Pipeline finished: {} ran, {} skipped",
                summary["ran"],
                summary["skipped"]
            );
            if let Some(path) = &args.summary {
                let json = serde_json::to_string_pretty(&serde_json::json!({
                    "pipeline": runner.config().pipeline.name,
                    "execution_id": execution_id,
                    "finished_at": chrono::Utc::now().to_rfc3339(),
                    "summary": summary,
                    "steps": results,
                }))?;
                std::fs::write(path, json)?;
                tracing::info!("📁 Summary saved to: {}", path);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Pipeline failed: {} (Category: {:?})",
                e,
                e.category()
            );
            eprintln!("❌ {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn display_plan(config: &PipelineConfig, plan: &[PlannedStep]) {
    println!("📋 Pipeline: {}", config.pipeline.name);
    if let Some(description) = &config.pipeline.description {
        println!("  {}", description);
    }
    println!(
        "  Attempts: {}, backoff: {}ms",
        config.settings.attempts, config.settings.backoff_ms
    );
    println!();

    for (i, step) in plan.iter().enumerate() {
        let state = if step.up_to_date { "up to date" } else { "will run" };
        println!("{:>3}. {} [{}]", i + 1, step.name, state);
        println!("     {}", step.command.display());
    }

    println!();
    println!("✅ Dry run complete. {} step(s) planned.", plan.len());
}
