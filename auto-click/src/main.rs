use auto_click::args::{self, Args, Command};
use auto_click::automation::{create_shutdown_channel, spawn_shutdown_listener};
use auto_click::config::DEFAULT_CONFIG_FILE;
use auto_click::feature_matching::FeatureExtractor;
use auto_click::platform::{EnigoPointer, XcapScreen};
use auto_click::{AppConfig, AppResult, ControlLoop, TemplateStore};
use rand::{SeedableRng, rngs::StdRng};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match Args::parse() {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            args::print_help();
            return ExitCode::SUCCESS;
        }
        Ok(Command::Version) => {
            println!(
                "Auto Click v{} (built {})",
                env!("AUTO_CLICK_VERSION"),
                env!("AUTO_CLICK_BUILD_YEAR")
            );
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("❌ {e}");
            args::print_help();
            return ExitCode::FAILURE;
        }
    };

    let level = if args.debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(args) {
        Ok(iterations) => {
            log::info!("👋 Stopped after {iterations} iterations");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> AppResult<u64> {
    let mut config = match &args.config_path {
        Some(path) => AppConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            AppConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => AppConfig::default(),
    };
    if let Some(dir) = args.template_dir {
        config.template_directory = dir;
    }

    let extractor = FeatureExtractor::new(config.features.clone());
    let store = TemplateStore::load_from_directory(
        &config.template_directory,
        &config.templates.priority,
        &extractor,
    )?;
    log::info!("📁 Loaded {} templates: {:?}", store.len(), store.names());

    let screen = XcapScreen::primary()?;
    let pointer = EnigoPointer::new()?;
    let mut control = ControlLoop::new(&config, &store, screen, pointer, StdRng::from_os_rng());

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let iterations = runtime.block_on(async {
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let _listener = spawn_shutdown_listener(tokio::signal::ctrl_c(), shutdown_tx).await;
        control.run(shutdown_rx, args.iterations).await
    });

    Ok(iterations)
}
