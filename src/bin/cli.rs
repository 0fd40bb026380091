//! execbox CLI
//!
//! Command-line interface for running snippets in the sandbox and
//! managing configuration.

use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use execbox::config::{
    apply_env_overrides, config_path, load_config, load_config_from_path, save_config,
    validate_config, Config,
};
use execbox::sandbox::{self, ExecutionRequest, Language};
use execbox::{Error, Result, VERSION};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "execbox",
    version = VERSION,
    about = "Sandboxed code execution in ephemeral containers",
    long_about = None
)]
struct Cli {
    /// Path to a config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute code in the sandbox
    Run {
        /// Code to execute (omit when using --file)
        code: Option<String>,

        /// Read the code from a file instead
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Programming language
        #[arg(long, short, default_value = "python")]
        language: String,
    },

    /// List packages installed in the execution image
    Packages,

    /// Check runtime and configuration status
    Status,

    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file without asking
        #[arg(long, short)]
        force: bool,
    },

    /// Validate the configuration and report issues
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let Cli {
        config: config_arg,
        command,
    } = Cli::parse();

    match command {
        Commands::Run {
            code,
            file,
            language,
        } => {
            let config = load_cli_config(config_arg.as_deref())?;
            run_code(&config, code, file, &language).await
        }
        Commands::Packages => {
            let config = load_cli_config(config_arg.as_deref())?;
            list_packages(&config).await
        }
        Commands::Status => {
            let config = load_cli_config(config_arg.as_deref())?;
            check_status(&config).await
        }
        Commands::InitConfig { force } => init_config(force, config_arg),
        Commands::Validate => {
            let config = load_cli_config(config_arg.as_deref())?;
            validate(&config)
        }
    }
}

/// Load configuration, honoring an explicit --config path
fn load_cli_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = load_config_from_path(path)?;
            apply_env_overrides(&mut config);
            Ok(config)
        }
        None => load_config(),
    }
}

/// Run code in the sandbox
async fn run_code(
    config: &Config,
    code: Option<String>,
    file: Option<PathBuf>,
    language: &str,
) -> Result<()> {
    let language: Language = language.parse()?;

    let code = match (code, file) {
        (Some(code), None) => code,
        (None, Some(path)) => std::fs::read_to_string(&path)?,
        (Some(_), Some(_)) => {
            return Err(Error::InvalidInput(
                "Pass either CODE or --file, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(Error::InvalidInput(
                "Nothing to run: pass CODE or --file".to_string(),
            ))
        }
    };

    let service = sandbox::connect(&config.executor).await?;
    let request = ExecutionRequest::new(code).with_language(language);

    println!("Executing {} code...\n", language);

    let result = service.execute(&request).await;

    if result.success {
        println!("Output:\n{}", result.output);
        Ok(())
    } else {
        if !result.output.is_empty() {
            println!("Output:\n{}", result.output);
        }
        println!("❌ {}", result.error);
        std::process::exit(1);
    }
}

/// Print the execution image's package manifest
async fn list_packages(config: &Config) -> Result<()> {
    let service = sandbox::connect(&config.executor).await?;
    let result = service.list_packages().await;

    if !result.success {
        println!("❌ {}", result.error);
        std::process::exit(1);
    }

    println!("{} packages installed:\n", result.packages.len());
    for package in &result.packages {
        println!("  {:<30} {}", package.name, package.version);
    }

    Ok(())
}

/// Check runtime and configuration status
async fn check_status(config: &Config) -> Result<()> {
    println!("🔍 execbox Status\n");

    println!("Configuration: ✅ Loaded");
    println!("  Image: {}", config.executor.image);
    println!("  Timeout: {} ms", config.executor.timeout_ms);
    println!("  Memory: {}", config.executor.memory_limit);
    println!("  Network: {}", config.executor.network);

    match sandbox::connect(&config.executor).await {
        Ok(_) => println!("Runtime: ✅ Ready (image available)"),
        Err(e) => {
            println!("Runtime: ❌ {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Write a default configuration file
fn init_config(force: bool, path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(config_path);

    if path.exists() && !force {
        let overwrite = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} already exists. Overwrite?", path.display()))
            .default(false)
            .interact()
            .map_err(|e| Error::Config(format!("Confirm error: {}", e)))?;

        if !overwrite {
            println!("Cancelled.");
            return Ok(());
        }
    }

    save_config(&Config::default(), &path)?;
    println!("✅ Wrote default configuration to {}", path.display());
    println!("   Edit it, or override settings with EXECBOX_* environment variables.");

    Ok(())
}

/// Validate configuration and print issues
fn validate(config: &Config) -> Result<()> {
    let report = validate_config(config);

    for issue in &report.errors {
        println!(
            "{} [{}] {}",
            style("error").red().bold(),
            issue.path,
            issue.message
        );
        if let Some(suggestion) = &issue.suggestion {
            println!("        {}", style(suggestion).dim());
        }
    }

    for issue in &report.warnings {
        println!(
            "{} [{}] {}",
            style("warning").yellow().bold(),
            issue.path,
            issue.message
        );
        if let Some(suggestion) = &issue.suggestion {
            println!("        {}", style(suggestion).dim());
        }
    }

    if report.valid {
        println!("{} Configuration is valid", style("✓").green());
        Ok(())
    } else {
        std::process::exit(1);
    }
}
