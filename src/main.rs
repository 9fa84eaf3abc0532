mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::PathBuf;
use tilefuse::{config, Pipeline, TracingSink, Variant};
use tilefuse_geo::SystemInvoker;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tilefuse=trace,tilefuse_geo=trace".to_string()
        } else {
            "tilefuse=info,tilefuse_geo=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Run {
            variant,
            source_dir,
            output_dir,
            dry_run,
            json,
        } => run_batch(
            cli.config.as_deref(),
            variant,
            source_dir,
            output_dir,
            dry_run,
            json,
        ),
        Commands::Plan => print_plan(cli.config.as_deref()),
        Commands::CheckTools => check_tools(),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("tilefuse {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_batch(
    config_path: Option<&std::path::Path>,
    variant: Variant,
    source_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // CLI overrides take precedence over the config file.
    if let Some(dir) = source_dir {
        config.paths.source_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.paths.output_dir = dir;
    }

    let invoker = SystemInvoker;
    let sink = TracingSink;
    let pipeline = Pipeline::new(&config, variant, &invoker, &sink);

    if dry_run {
        println!("# dry run: nothing will be executed");
        for line in pipeline.describe() {
            println!("{}", line);
        }
        return Ok(());
    }

    let summary = pipeline.run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render());
    }

    // Best-effort continuation, but automation still needs to see failure.
    if summary.any_failed() {
        std::process::exit(1);
    }

    Ok(())
}

fn print_plan(config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    for group in config.groups() {
        println!("{}: {}", group.name, group.years_label());
    }

    Ok(())
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = tilefuse_geo::check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "ok "
        } else {
            all_ok = false;
            "MISSING"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available.");
    } else {
        println!("Some tools are missing. Install them before running a batch.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("Configuration is valid");
            println!(
                "  Years: {}-{} in groups of {}",
                config.dataset.first_year, config.dataset.last_year, config.dataset.group_width
            );
            println!("  Groups: {}", config.groups().len());
            println!("  Source dir: {:?}", config.paths.source_dir);
            println!("  Output dir: {:?}", config.paths.output_dir);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!(
                "  Years: {}-{} in groups of {}",
                config.dataset.first_year, config.dataset.last_year, config.dataset.group_width
            );
            println!("  Groups: {}", config.groups().len());
        }
    }

    Ok(())
}
