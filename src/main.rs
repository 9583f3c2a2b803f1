use std::path::{Path, PathBuf};
use govrag::cli::{Cli, Commands, ConfigAction};
use govrag::config::{Config, ConfigValidator};
use govrag::corpus;
use govrag::error::{GovragError, Result};
use govrag::RetrievalPipeline;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Query {
            question,
            top_k,
            data,
            json,
        } => {
            cmd_query(cli.config, cli.profile, &question, top_k, data, json)?;
        }
        Commands::Ask {
            question,
            offline,
            data,
        } => {
            cmd_ask(cli.config, cli.profile, &question, offline, data)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "govrag=debug" } else { "govrag=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_query(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    question: &str,
    top_k: usize,
    data: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path, profile)?;
    // Retrieval never needs the generation backend
    let pipeline = build_pipeline(&config, true, data)?;

    let results = pipeline.query(question, top_k);

    if json {
        let out = serde_json::to_string_pretty(&results).map_err(|e| GovragError::Json {
            source: e,
            context: "Failed to serialize results".to_string(),
        })?;
        println!("{}", out);
    } else if results.is_empty() {
        println!("No matching records.");
    } else {
        for (rank, text) in results.iter().enumerate() {
            println!("{}. {}", rank + 1, text);
        }
    }

    Ok(())
}

fn cmd_ask(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    question: &str,
    offline: bool,
    data: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path, profile)?;
    let pipeline = build_pipeline(&config, offline, data)?;

    println!("{}", pipeline.answer(question));
    Ok(())
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path, profile)?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            ConfigValidator::validate(&config)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };
            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }
            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'govrag config init' to create one."
        );
        let mut config = Config::default();
        if let Some(profile) = profile {
            config.apply_profile(&profile)?;
        }
        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;
        return Ok(config);
    }

    if let Some(profile) = profile {
        Config::load_with_profile(&path, &profile)
    } else {
        Config::load(&path)
    }
}

fn build_pipeline(config: &Config, offline: bool, data: Option<PathBuf>) -> Result<RetrievalPipeline> {
    let data_file = data.unwrap_or_else(|| config.corpus.data_file.clone());
    let texts = load_texts(&data_file)?;

    let mut pipeline = RetrievalPipeline::from_config(config, offline)?;
    let added = pipeline.add_texts(&texts);
    tracing::info!("Indexed {} records from {}", added, data_file.display());

    Ok(pipeline)
}

fn load_texts(path: &Path) -> Result<Vec<String>> {
    let records = corpus::load(path)?;
    Ok(corpus::to_text_records(&records))
}
