use blast_etl::core::ConfigProvider;
use blast_etl::utils::{logger, validation::Validate};
use blast_etl::{BlastPipeline, EtlEngine, LocalStorage, ProcessRunner, SearchProgram, TomlConfig};
use clap::Parser;

#[derive(Parser)]
#[command(name = "blast-etl-toml")]
#[command(about = "Run BLAST/PSI-BLAST from a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "blast-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the search program and use PSI-BLAST
    #[arg(long)]
    psiblast: bool,

    /// Dry run - print the commands without executing them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    let verbose = args.verbose || config.log_level() == Some("debug");
    logger::init_cli_logger(verbose);

    tracing::info!("🚀 Starting TOML-based blast-etl");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 命令列覆蓋設定
    if args.psiblast {
        config.search.program = SearchProgram::Psiblast;
        tracing::info!("🔧 Search program overridden to: psiblast");
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let pipeline = BlastPipeline::new(LocalStorage::default(), config, ProcessRunner::new());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No alignment tool will be started");
        let commands = pipeline.plan().await?;
        println!("🔍 Planned commands ({}):", commands.len());
        for command in &commands {
            let marker = if std::path::Path::new(&pipeline.query_path(&command.query_id)).exists()
            {
                " "
            } else {
                "!"
            };
            println!(" {} {}", marker, command.command_line());
        }
        println!();
        println!("'!' marks queries whose FASTA file is missing and would be skipped.");
        return Ok(());
    }

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Run completed successfully!");
            println!("✅ Run completed successfully!");
            println!("📁 Matrix saved to: {}", summary.matrix_path);
            if let Some(plot) = &summary.plot_path {
                println!("📈 Histogram saved to: {}", plot);
            }
            println!(
                "🔢 {} of {} scored pairs have e-value < {}",
                summary.below_threshold, summary.pairs_scored, summary.evalue_threshold
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Run: {}", config.run_name());
    if let Some(description) = &config.run.description {
        println!("  Description: {}", description);
    }
    println!("  Program: {}", config.program());
    println!("  Database: {}", config.database());
    println!("  E-value: {}", config.evalue());
    if config.program() == SearchProgram::Psiblast {
        println!("  Iterations: {}", config.num_iterations());
    }
    println!("  IDs: {}", config.ids_file());
    println!("  Queries: {}", config.query_folder());
    println!("  Matrix: {}", config.output_file());
    println!("  Histogram: {}", config.output_png());
    if let Some(summary) = config.summary_path() {
        println!("  Summary: {}", summary);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
