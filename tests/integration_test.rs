use std::{
    io::Read,
    net::TcpListener,
    path::PathBuf,
    process::{Child, Command, Stdio},
    time::Duration,
};

use anyhow::{bail, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RiskResponse {
    location: String,
    rainfall: f64,
    river_level: f64,
    dam_release: f64,
    flood_risk: String,
    time_left_hours: serde_json::Value,
    color_code: String,
    message: String,
}

/// Service binary running on an ephemeral port, killed on drop.
struct Service {
    child: Child,
    base: String,
}

impl Drop for Service {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

async fn start_service() -> Result<Service> {
    start_service_with(|cmd| {
        cmd.env("AXUM_LOG_LEVEL", "warn").stdout(Stdio::null());
    })
    .await
}

async fn start_service_with(configure: impl FnOnce(&mut Command)) -> Result<Service> {
    // ---
    let port = TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
    let data_file =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/training_data.json");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_flood-risk-service"));
    cmd.env("BIND_ADDR", format!("127.0.0.1:{port}"))
        .env("DATA_FILE", &data_file)
        .env("DISTRICT_API_URL", "")
        .env_remove("RUST_LOG")
        .env("FORCE_COLOR", "0")
        .stderr(Stdio::null());
    configure(&mut cmd);
    let child = cmd.spawn()?;
    let service = Service {
        child,
        base: format!("http://127.0.0.1:{port}"),
    };

    let client = Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(format!("{}/health", service.base)).send().await {
            if resp.status().is_success() {
                return Ok(service);
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    bail!("service did not become healthy at {}", service.base)
}

async fn classify(
    client: &Client,
    base: &str,
    location: &str,
    readings: (f64, f64, f64),
) -> Result<(StatusCode, serde_json::Value)> {
    // ---
    let resp = client
        .get(format!("{base}/process_api"))
        .query(&[("location", location)])
        .query(&[
            ("rainfall", readings.0),
            ("river_level", readings.1),
            ("dam_release", readings.2),
        ])
        .send()
        .await?;
    let status = resp.status();
    Ok((status, resp.json().await?))
}

#[tokio::test]
async fn process_api_classifies_against_history() -> Result<()> {
    // ---
    let service = start_service().await?;
    let client = Client::new();

    let (status, json) =
        classify(&client, &service.base, "riverton", (115.0, 6.0, 450.0)).await?;
    assert_eq!(status, StatusCode::OK);
    let likely: RiskResponse = serde_json::from_value(json)?;
    assert_eq!(likely.location, "Riverton");
    assert_eq!(likely.rainfall, 115.0);
    assert_eq!(likely.river_level, 6.0);
    assert_eq!(likely.dam_release, 450.0);
    assert_eq!(likely.flood_risk, "Likely");
    assert_eq!(likely.time_left_hours, 30);
    assert_eq!(likely.color_code, "orange");
    assert_eq!(
        likely.message,
        "Flood risk: Likely. Estimated time left: 30 hours."
    );

    let (_, json) = classify(&client, &service.base, "Riverton", (90.0, 3.0, 200.0)).await?;
    let no: RiskResponse = serde_json::from_value(json)?;
    assert_eq!(no.flood_risk, "No");
    assert_eq!(no.time_left_hours, "N/A");
    assert_eq!(no.color_code, "green");
    assert_eq!(no.message, "No flood expected.");

    let (_, json) = classify(&client, &service.base, "Dryville", (999.0, 99.0, 9999.0)).await?;
    let dry: RiskResponse = serde_json::from_value(json)?;
    assert_eq!(dry.flood_risk, "No");

    let (_, json) = classify(&client, &service.base, "Nowhere", (115.0, 6.0, 450.0)).await?;
    let unknown: RiskResponse = serde_json::from_value(json)?;
    assert_eq!(unknown.flood_risk, "Unknown");
    assert_eq!(unknown.color_code, "gray");

    Ok(())
}

#[tokio::test]
async fn invalid_readings_rejected() -> Result<()> {
    // ---
    let service = start_service().await?;
    let client = Client::new();

    let (status, json) =
        classify(&client, &service.base, "Riverton", (1.0, -6.0, 450.0)).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap_or_default().contains("river_level"));

    let resp = client
        .get(format!(
            "{}/process_api?location=Riverton&rainfall=abc&river_level=1&dam_release=1",
            service.base
        ))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn health_and_reload() -> Result<()> {
    // ---
    let service = start_service().await?;
    let client = Client::new();

    let health: serde_json::Value = client
        .get(format!("{}/health", service.base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["locations"], 2);
    assert_eq!(health["observations"], 4);

    let resp = client.post(format!("{}/reload", service.base)).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let summary: serde_json::Value = resp.json().await?;
    assert_eq!(summary["observations"], 4);

    let resp = client
        .get(format!("{}/district_risk?district=Riverton", service.base))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    Ok(())
}

#[tokio::test]
async fn log_level_from_dotenv_applies() -> Result<()> {
    // ---
    let dir = std::env::temp_dir().join(format!("flood-risk-dotenv-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join(".env"), "AXUM_LOG_LEVEL=info\n")?;

    let mut service = start_service_with(|cmd| {
        cmd.current_dir(&dir)
            .env_remove("AXUM_LOG_LEVEL")
            .stdout(Stdio::piped());
    })
    .await?;

    // Classification logs its score at debug level only.
    let client = Client::new();
    classify(&client, &service.base, "Riverton", (115.0, 6.0, 450.0)).await?;

    let _ = service.child.kill();
    let _ = service.child.wait();
    let mut output = String::new();
    if let Some(mut stdout) = service.child.stdout.take() {
        stdout.read_to_string(&mut output)?;
    }
    std::fs::remove_dir_all(&dir)?;

    assert!(output.contains("Listening on"), "missing info logs: {output}");
    assert!(
        !output.contains("Scored readings"),
        "debug logs emitted despite AXUM_LOG_LEVEL=info in .env: {output}"
    );
    Ok(())
}
