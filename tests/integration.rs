use uponor_smatrix::{Config, Transport, UponorClient, UponorProxy};

/// Run with: UPONOR_HOST=192.168.1.100 cargo test --test integration -- --ignored
/// Requires a reachable Smatrix controller.
#[tokio::test]
#[ignore]
async fn read_live_controller() {
    let config = Config::from_env().expect("UPONOR_HOST must be set");
    let client = UponorClient::builder(&config.host)
        .timeout(config.request_timeout)
        .build()
        .expect("client should build");

    let vars = client
        .fetch_variables()
        .await
        .unwrap_or_else(|e| panic!("read from {} failed: {e}", config.host));
    assert!(!vars.is_empty(), "controller returned no variables");
    assert!(
        !vars.device_codes().is_empty(),
        "should have at least one thermostat"
    );
    assert!(!client.get_data().await.is_empty());
}

#[tokio::test]
#[ignore]
async fn proxy_lists_live_devices() {
    let config = Config::from_env().expect("UPONOR_HOST must be set");
    let proxy = UponorProxy::from_config(&config).expect("proxy should build");

    let devices = proxy.devices().await;
    assert!(!devices.is_empty(), "should have at least one thermostat");
    for device in &devices {
        println!(
            "{} {:?} {} -> {} {}",
            device.code,
            device.name,
            device.current_temperature,
            device.target_temperature,
            config.display_unit
        );
        assert!(device.min_limit_temperature <= device.max_limit_temperature);
    }

    let cooling = proxy.cooling_mode().await;
    let away = proxy.away_mode().await;
    println!("model {} cooling {} away {}", cooling.model, cooling.is_cooling_enabled, away.is_away_enabled);
}
