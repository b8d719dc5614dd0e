use skatemap_backend::{database::Database, store::QualityStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Print every stored rating row, history included, as pretty JSON on stdout.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let db = Database::new().await?;
    let records = db.all_records().await?;
    tracing::info!("dumping {} rows", records.len());

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
