use openclaw_realtime::{GatewayStatus, LogEntry, RealtimeClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present (OPENCLAW_WS_URL, OPENCLAW_WS_TOKEN, ...)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let client = RealtimeClient::from_env()?;
    println!("Tailing logs from {}", client.endpoint());

    let _status = client.on_status_change(|connected| {
        if connected {
            println!("-- connected");
        } else {
            println!("-- disconnected");
        }
    });

    let _logs = client.on_log(|entry: &LogEntry| {
        println!(
            "{} [{:?}] {:?}: {}",
            entry.timestamp, entry.level, entry.component, entry.message
        );
    });

    let _gateway = client.on_gateway_status(|status: &GatewayStatus| {
        println!("-- gateway {} (pid {:?})", status.status, status.pid);
    });

    client.connect();
    client.subscribe("logs", None);

    tokio::signal::ctrl_c().await?;

    println!("Disconnecting...");
    client.disconnect();

    Ok(())
}
