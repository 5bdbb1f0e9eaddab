use clap::Parser;
use geotag_deck::utils::error::ErrorSeverity;
use geotag_deck::utils::logger::{self, LogFormat};
use geotag_deck::utils::validation::Validate;
use geotag_deck::{
    ApkgExporter, CliConfig, DeckEngine, DeckPipeline, GeoDeckError, LocalStorage, MapRenderer,
};

fn exit_code(e: &GeoDeckError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    }
}

fn report_failure(stage: &str, e: &GeoDeckError) -> ! {
    tracing::error!(
        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
        stage,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e));
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(LogFormat::from_json_flag(cli.json_logs), cli.verbose);

    tracing::info!("Starting geotag-deck");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => report_failure("Configuration", &e),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        report_failure("Configuration validation", &e);
    }

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let renderer = MapRenderer::new(config.style);
    let pipeline =
        match DeckPipeline::new(LocalStorage::new("."), config, renderer, ApkgExporter::new()) {
            Ok(pipeline) => pipeline,
            Err(e) => report_failure("Configuration", &e),
        };
    let engine = DeckEngine::new_with_monitoring(pipeline, cli.monitor);

    match engine.run().await {
        Ok(report) => {
            for omitted in &report.omitted {
                eprintln!("WARNING: skipped tag '{}': {}", omitted.tag, omitted.reason);
            }
            println!("{}", report);
        }
        Err(e) => report_failure("Deck conversion", &e),
    }
}
