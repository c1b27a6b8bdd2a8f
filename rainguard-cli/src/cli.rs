use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rainguard_core::{
    Config, Monitor, Notifier, OpenWeatherProvider, SerialLink, WeatherProvider, analyze,
};
use tokio::sync::watch;
use tracing::warn;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "rainguard", version, about = "Weather-driven irrigation monitor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeatherMap credential, coordinates and serial port.
    Configure,

    /// Fetch conditions once and print a rain summary.
    Status,

    /// Monitor the weather and signal the irrigation controller.
    Run {
        /// Seconds between checks; overrides the configured interval.
        #[arg(long)]
        interval: Option<u64>,

        /// Serial device of the controller, e.g. "/dev/ttyUSB0".
        #[arg(long)]
        serial: Option<String>,

        /// Look-ahead window in hours for the rain decision.
        #[arg(long)]
        hours_ahead: Option<u32>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Status => status().await,
            Command::Run { interval, serial, hours_ahead } => {
                monitor(interval, serial, hours_ahead).await
            }
        }
    }
}

fn configure() -> Result<()> {
    let mut cfg = Config::load()?;

    cfg.api_key = inquire::Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    cfg.latitude = inquire::CustomType::<f64>::new("Farm latitude (decimal degrees):")
        .with_default(cfg.latitude)
        .prompt()
        .context("Failed to read latitude")?;

    cfg.longitude = inquire::CustomType::<f64>::new("Farm longitude (decimal degrees):")
        .with_default(cfg.longitude)
        .prompt()
        .context("Failed to read longitude")?;

    let serial = inquire::Text::new("Controller serial port (leave empty for simulation):")
        .with_initial_value(cfg.serial_port.as_deref().unwrap_or(""))
        .prompt()
        .context("Failed to read serial port")?;

    cfg.serial_port =
        if serial.trim().is_empty() { None } else { Some(serial.trim().to_string()) };

    cfg.validate()?;
    cfg.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn status() -> Result<()> {
    let cfg = Config::load()?;
    cfg.validate()?;

    let provider = OpenWeatherProvider::new(cfg.api_key.clone(), cfg.language.clone())
        .context("Failed to build HTTP client")?;
    let at = cfg.coordinate();

    let conditions = provider.current_conditions(&at).await?;
    let forecast = provider.forecast(&at).await?;
    let decision = analyze(&forecast, Utc::now(), cfg.hours_ahead);

    println!("Location:    {}", conditions.location());
    println!("Temperature: {:.1} C", conditions.temperature_c);
    println!("Humidity:    {}%", conditions.humidity_pct);
    println!("Conditions:  {}", conditions.description);
    println!("Wind:        {:.1} m/s", conditions.wind_speed_mps);
    println!("Pressure:    {:.0} hPa", conditions.pressure_hpa);
    println!();
    println!(
        "Rain expected within {} h: {}",
        cfg.hours_ahead,
        if decision.will_rain { "YES" } else { "NO" }
    );
    if decision.will_rain {
        println!("Expected volume: {:.1} mm", decision.amount_mm);
        println!("Recommendation:  {}", decision.recommendation());
    }

    Ok(())
}

async fn monitor(
    interval: Option<u64>,
    serial: Option<String>,
    hours_ahead: Option<u32>,
) -> Result<()> {
    let mut cfg = Config::load()?;

    if let Some(secs) = interval {
        cfg.poll_interval_secs = secs;
    }
    if let Some(device) = serial {
        cfg.serial_port = Some(device);
    }
    if let Some(hours) = hours_ahead {
        cfg.hours_ahead = hours;
    }

    cfg.validate()?;

    println!("rainguard - weather-driven irrigation monitor");
    println!("=============================================");

    let provider = OpenWeatherProvider::new(cfg.api_key.clone(), cfg.language.clone())
        .context("Failed to build HTTP client")?;

    // A missing controller is tolerated: fall back to simulation mode.
    let notifier = match cfg.serial_port.as_deref() {
        Some(device) => match SerialLink::open(device) {
            Ok(link) => Notifier::with_link(Box::new(link)),
            Err(e) => {
                warn!(error = %e, "could not open serial port, commands will only be logged");
                Notifier::disconnected()
            }
        },
        None => Notifier::disconnected(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let mut monitor = Monitor::new(
        Box::new(provider),
        notifier,
        cfg.coordinate(),
        cfg.poll_interval(),
        cfg.hours_ahead,
    );
    monitor.run(shutdown_rx).await;

    Ok(())
}
