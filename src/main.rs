mod cli;

use reelforge::batch::{BatchEvent, BatchReport, BatchSequencer, ItemStatus, JobFile, PlannedItem, QueueItem};
use reelforge::{config, probe};
use reelforge_av::{ArgumentBuilder, OperationKind, ProcessRunner, ToolRegistry};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, OperationArgs};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelforge=trace,reelforge_av=debug".to_string()
        } else {
            "reelforge=info,reelforge_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Operations { json } => list_operations(json),
        Commands::Plan {
            op,
            duration,
            json,
            input,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(plan(&op, &input, duration, json, cli.config.as_deref()))
        }
        Commands::Run { op, inputs } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let kind = parse_kind(&op.operation)?;
            let params = op.parameters()?;
            let planned = inputs
                .into_iter()
                .map(|path| PlannedItem {
                    path,
                    kind,
                    params: params.clone(),
                })
                .collect();
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(execute(&config, planned))
        }
        Commands::Batch { job } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let base_dir = job
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let planned = JobFile::load(&job)?.plan(&base_dir)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(execute(&config, planned))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("reelforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn parse_kind(id: &str) -> Result<OperationKind> {
    id.parse()
        .context("Run `reelforge operations` for the list of ids")
}

fn list_operations(json: bool) -> Result<()> {
    if json {
        let specs: Vec<_> = OperationKind::ALL.iter().map(|k| k.spec()).collect();
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    let mut category = None;
    for kind in OperationKind::ALL {
        let spec = kind.spec();
        if category != Some(spec.category) {
            category = Some(spec.category);
            println!("\n{}:", spec.category);
        }
        let mut notes = Vec::new();
        if spec.requires_secondary_input {
            notes.push("secondary input");
        }
        if spec.requires_parameters {
            notes.push("parameters");
        }
        if spec.asset.is_some() {
            notes.push("model");
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" [{}]", notes.join(", "))
        };
        println!("  {:<22} {}{}", spec.id, spec.title, notes);
    }

    Ok(())
}

async fn plan(
    op: &OperationArgs,
    input: &Path,
    duration: Option<f64>,
    json: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let kind = parse_kind(&op.operation)?;
    let params = op.parameters()?;
    let tools = ToolRegistry::discover(&config.tools_config());

    let mut descriptor = probe::probe_descriptor(&tools, input)
        .await
        .with_context(|| format!("Cannot plan {}", input.display()))?;
    if let Some(seconds) = duration {
        descriptor = descriptor.with_duration(seconds);
    }

    let builder = ArgumentBuilder::new(config.builder_settings());
    let invocation = builder
        .build(kind, &descriptor, &params)
        .map_err(|e| anyhow::anyhow!("{} error: {}", e.category(), e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&invocation)?);
        return Ok(());
    }

    let program = tools
        .get("ffmpeg")
        .map(|t| t.path.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ffmpeg".to_string());

    for staged in invocation.staged_files() {
        println!("# {}:", staged.path.display());
        for line in staged.contents.lines() {
            println!("#   {}", line);
        }
    }
    println!("{}", invocation.display_line(&program));
    println!("# output: {}", invocation.output().display());

    Ok(())
}

async fn execute(config: &config::Config, planned: Vec<PlannedItem>) -> Result<()> {
    let tools = ToolRegistry::discover(&config.tools_config());
    let runner =
        ProcessRunner::from_registry(&tools).context("ffmpeg is required to run operations")?;

    tracing::info!(items = planned.len(), "Probing inputs");
    let probes = futures::future::join_all(
        planned
            .iter()
            .map(|item| probe::probe_descriptor(&tools, &item.path)),
    )
    .await;

    let mut items = Vec::with_capacity(planned.len());
    for (item, descriptor) in planned.into_iter().zip(probes) {
        let descriptor =
            descriptor.with_context(|| format!("Cannot queue {}", item.path.display()))?;
        items.push(QueueItem::new(descriptor, item.kind, item.params));
    }

    let sequencer = BatchSequencer::new(
        Arc::new(ArgumentBuilder::new(config.builder_settings())),
        Arc::new(runner),
    );

    let total = items.len();
    let mut events = sequencer.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(BatchEvent::ItemStarted { index, kind, .. }) => {
                    eprintln!("[{}/{}] {}", index + 1, total, kind);
                }
                Ok(BatchEvent::ItemProgress {
                    fraction, overall, ..
                }) => {
                    eprint!(
                        "\r  {:5.1}%  (batch {:5.1}%)",
                        fraction * 100.0,
                        overall * 100.0
                    );
                }
                Ok(BatchEvent::ItemCompleted { .. }) | Ok(BatchEvent::ItemFailed { .. }) => {
                    eprintln!();
                }
                Ok(BatchEvent::BatchFinished { .. }) | Err(RecvError::Closed) => break,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
            }
        }
    });

    let handle = sequencer.start(items)?;

    let cancel = handle.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling...");
            cancel.cancel();
        }
    });

    let report = handle.wait().await?;
    // Closes the event bus so the printer exits even if nothing was published.
    drop(sequencer);
    let _ = printer.await;

    print_report(&report);

    if report.all_succeeded() {
        Ok(())
    } else {
        anyhow::bail!(
            "batch {}: {} succeeded, {} failed",
            report.state,
            report.succeeded,
            report.failed
        )
    }
}

fn print_report(report: &BatchReport) {
    println!();
    for item in &report.items {
        let path = item.descriptor.path();
        match item.status {
            ItemStatus::Done => {
                let output = item
                    .output
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                println!("✓ {} {} -> {}", item.kind, path.display(), output);
            }
            ItemStatus::Failed => {
                let (category, message) = item
                    .error
                    .as_ref()
                    .map(|e| (e.category.to_string(), e.message.clone()))
                    .unwrap_or_default();
                println!("✗ {} {}: {} ({})", item.kind, path.display(), message, category);
                if let Some(diagnostics) = item.error.as_ref().and_then(|e| e.diagnostics.as_ref()) {
                    let lines: Vec<&str> = diagnostics
                        .split(['\r', '\n'])
                        .map(str::trim_end)
                        .filter(|l| !l.is_empty())
                        .collect();
                    for line in &lines[lines.len().saturating_sub(5)..] {
                        println!("    {}", line);
                    }
                }
            }
            ItemStatus::Pending | ItemStatus::Active => {
                println!("- {} {} (not started)", item.kind, path.display());
            }
        }
    }

    println!(
        "\nSucceeded: {}, Failed: {} ({})",
        report.succeeded, report.failed, report.state
    );
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools_config()).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
        Ok(())
    } else {
        anyhow::bail!("Some tools are missing; operations cannot run until they are installed")
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    let warnings = config::validate_config(&config)?;
    println!("✓ Configuration is valid");
    println!(
        "  Encoding: crf {}, preset {}, audio {}",
        config.encoding.crf, config.encoding.preset, config.encoding.audio_bitrate
    );
    println!(
        "  Hardware acceleration: {}",
        config.encoding.hw_accel.as_deref().unwrap_or("none")
    );
    println!("  Models: {}", config.builder_settings().models_dir.display());
    match &config.output.dir {
        Some(dir) => println!("  Output: {}", dir.display()),
        None => println!("  Output: next to each input"),
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  - {}", warning);
        }
    }

    Ok(())
}
