use clap::Parser;
use pvgen::config::toml_config::TomlConfig;
use pvgen::core::dataset::{is_data_file, location_of};
use pvgen::core::{ConfigProvider, Storage};
use pvgen::utils::{logger, validation::Validate};
use pvgen::{EtlEngine, LocalStorage, PvPipeline};
use std::collections::BTreeMap;

#[derive(Parser)]
#[command(name = "toml-pvgen")]
#[command(about = "PV series generation driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "pvgen.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Show which files would be read without generating anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    let verbose = args.verbose || config.log_level() == Some("debug");
    logger::init_logger(verbose, args.json_logs);

    tracing::info!("🚀 Starting TOML-based PV series generation");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = PvPipeline::new(LocalStorage::default(), config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ PV series generated");
            println!("✅ PV series generated");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Generation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    let model = config.model_parameters();
    let filter = config.measurement_filter();

    println!("📋 Configuration Summary:");
    println!("  Pipeline: {}", config.pipeline.name);
    if let Some(description) = &config.pipeline.description {
        println!("  Description: {}", description);
    }
    println!("  Input: {}", config.input_dir());
    println!(
        "  Output: {}/{}",
        config.output_path(),
        config.output_filename()
    );
    println!(
        "  Module: FF={} Voc={}V Isc={}A NOCT={}°C x{}",
        model.fill_factor, model.voc, model.isc, model.noct, model.module_number
    );
    println!(
        "  Filter: T >= {}°C, E >= {}W/m² treated as faulty",
        filter.maximum_temperature, filter.maximum_irradiance
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let storage = LocalStorage::default();
    let options = config.read_options();

    let mut names = storage.list_files(config.input_dir()).await?;
    names.sort();

    let mut by_location: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut skipped = Vec::new();
    for name in &names {
        if is_data_file(name, &options) {
            by_location.entry(location_of(name)).or_default().push(name);
        } else {
            skipped.push(name.as_str());
        }
    }

    println!("🔍 Dry Run Analysis:");
    println!();
    println!("📡 Locations ({}):", by_location.len());
    for (location, files) in &by_location {
        println!("  {} <- {}", location, files.join(", "));
    }

    if !skipped.is_empty() {
        println!();
        println!("⏭️ Skipped files: {}", skipped.join(", "));
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
