use std::env;
use std::time::Duration;

use uponor_smatrix::{Config, DisplayUnit, MessageLogMode, UponorClient, UponorProxy};

#[tokio::main]
async fn main() -> uponor_smatrix::Result<()> {
    tracing_subscriber::fmt::init();

    // usage: monitor [<host>] [--fahrenheit] [--log <path>]
    let args: Vec<String> = env::args().collect();
    let mut config = match args.get(1).filter(|a| !a.starts_with("--")) {
        Some(host) => Config::new(host.as_str()),
        None => Config::from_env()?,
    };
    if args.iter().any(|a| a == "--fahrenheit") {
        config.display_unit = DisplayUnit::Fahrenheit;
    }
    let log_path = args
        .iter()
        .position(|a| a == "--log")
        .and_then(|i| args.get(i + 1));

    let mut builder = UponorClient::builder(&config.host).timeout(config.request_timeout);
    if let Some(path) = log_path {
        builder = builder.message_log(MessageLogMode::Diffed, path.as_str());
    }
    let proxy = UponorProxy::new(builder.build()?, config.display_unit)
        .with_expiration(config.cache_expiration);

    println!("Polling {}...", config.host);
    loop {
        let cooling = proxy.cooling_mode().await;
        let away = proxy.away_mode().await;
        println!(
            "{} | {} | away: {}",
            cooling.model,
            if cooling.is_cooling_enabled { "cooling" } else { "heating" },
            if away.is_away_enabled { "on" } else { "off" },
        );

        for device in proxy.devices().await {
            println!(
                "[{}] {}: {:.1}{unit} -> {:.1}{unit} ({:.1}..{:.1}) | {:?}{}{}",
                device.code,
                device.name,
                device.current_temperature,
                device.target_temperature,
                device.min_limit_temperature,
                device.max_limit_temperature,
                device.current_hvac_mode,
                if device.current_humidity.is_zero() {
                    String::new()
                } else {
                    format!(" | {}% RH", device.current_humidity)
                },
                if device.is_eco_enabled { " | ECO" } else { "" },
                unit = config.display_unit,
            );
        }

        tokio::time::sleep(Duration::from_secs(30)).await;
    }
}
