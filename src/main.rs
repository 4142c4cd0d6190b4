use clap::Parser;
use classroom_monitor::app::{self, Hardware};
use classroom_monitor::bot::{StatusBot, StatusQueryResponder};
use classroom_monitor::config::{self, Config};
use classroom_monitor::error::{MonitorError, Result};
use classroom_monitor::instance_lock::InstanceLock;
use classroom_monitor::notifier::{LogNotifier, Notifier, TelegramNotifier};
use classroom_monitor::sensors::SharedSnapshot;
use classroom_monitor::sensors::simulation::run_environment_simulation;
use classroom_monitor::telegram::TelegramClient;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "classroom-monitor")]
#[command(about = "Watches classroom sound, light and temperature and reports over Telegram")]
struct Cli {
    /// Use simulated sensors and LEDs instead of GPIO hardware
    #[arg(long)]
    simulate: bool,

    /// Log alerts instead of sending them; the Telegram bot is not started
    #[arg(long)]
    log_only: bool,

    /// Seconds between sampling cycles
    #[arg(long, env = "SAMPLE_INTERVAL_SECS")]
    interval: Option<u64>,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    // Load .env before the runtime spawns any threads
    config::load_dotenv();
    let cli = Cli::parse();
    init_logger();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting classroom monitor");

    let mut config = Config::from_env();
    if let Some(interval) = cli.interval {
        config.sampling.interval_secs = interval;
    }
    config.validate()?;

    info!("Configuration loaded:");
    info!("  Sample interval: {:?}", config.sample_interval());
    info!("  Moving average: {} samples", config.sampling.moving_average_size);
    info!(
        "  Ideal temperature: {:.1}..={:.1}°C",
        config.sampling.ideal_min_c, config.sampling.ideal_max_c
    );
    info!(
        "  Pins: sound={} light={} leds={}/{}/{}",
        config.pins.sound,
        config.pins.light,
        config.pins.led_green,
        config.pins.led_yellow,
        config.pins.led_red
    );

    let telegram = if cli.log_only {
        info!("  Alerts: log only");
        None
    } else {
        let (client, chat_id) = telegram_from_config(&config)?;
        info!("  Alerts: Telegram chat {}", chat_id);
        Some((client, chat_id))
    };

    // Simulated hardware never touches GPIO, so it needs no lock
    let _lock = if cli.simulate {
        None
    } else {
        Some(InstanceLock::acquire()?)
    };

    let shutdown = CancellationToken::new();
    let latest = SharedSnapshot::new();

    let (hardware, simulation) = if cli.simulate {
        info!("Using simulated hardware");
        let (hardware, handles) = Hardware::simulated(&config);
        let task = run_environment_simulation(
            handles.inputs,
            handles.thermometer,
            app::input_pins(&config),
            Duration::from_secs(7),
            shutdown.clone(),
        );
        (hardware, Some(task))
    } else {
        (Hardware::open(&config)?, None)
    };

    let notifier: Arc<dyn Notifier> = match &telegram {
        Some((client, chat_id)) => Arc::new(TelegramNotifier::new(
            client.clone(),
            chat_id.clone(),
            config.notify_timeout(),
        )),
        None => Arc::new(LogNotifier),
    };

    let sensor_loop = app::build_sensor_loop(&config, hardware, notifier, latest.clone());

    // Hardware reads block, so the loop gets a thread of its own and drives
    // its async parts (alert delivery, sleeping) through the runtime handle
    let runtime = tokio::runtime::Handle::current();
    let loop_shutdown = shutdown.clone();
    let sensor_thread = std::thread::Builder::new()
        .name("sensor-loop".into())
        .spawn(move || runtime.block_on(sensor_loop.run(loop_shutdown)))?;

    let bot_task = telegram.map(|(client, _)| {
        let bot = StatusBot::new(
            client,
            StatusQueryResponder::new(latest.clone()),
            config.poll_timeout(),
            config.notify_timeout(),
        );
        tokio::spawn(bot.run(shutdown.clone()))
    });

    info!("Classroom monitor is running");
    info!("  - Press Ctrl+C to exit");

    wait_for_shutdown_signal().await;
    shutdown.cancel();

    join_task("Telegram bot", bot_task).await;
    join_task("Simulation", simulation).await;

    match tokio::task::spawn_blocking(move || sensor_thread.join()).await {
        Ok(Ok(state)) => info!("Sensor loop {}", state),
        Ok(Err(_)) => error!("Sensor loop thread panicked"),
        Err(e) => error!("Failed to join sensor loop: {}", e),
    }

    info!("Classroom monitor stopped");
    Ok(())
}

/// Wait for an optional background task, logging a panic or cancellation.
/// Returns `false` if the task did not finish cleanly.
async fn join_task(name: &str, task: Option<JoinHandle<()>>) -> bool {
    let Some(task) = task else {
        return true;
    };
    match task.await {
        Ok(()) => true,
        Err(e) => {
            error!("{} task failed: {}", name, e);
            false
        }
    }
}

fn telegram_from_config(config: &Config) -> Result<(TelegramClient, String)> {
    let token = config.telegram.bot_token.clone().ok_or_else(|| {
        MonitorError::Config("TELEGRAM_BOT_TOKEN is required (or run with --log-only)".to_string())
    })?;
    let chat_id = config.telegram.chat_id.clone().ok_or_else(|| {
        MonitorError::Config("TELEGRAM_CHAT_ID is required (or run with --log-only)".to_string())
    })?;
    Ok((TelegramClient::new(token), chat_id))
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                wait_for_ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = wait_for_ctrl_c() => {}
            _ = terminate.recv() => info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
