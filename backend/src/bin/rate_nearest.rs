use std::{fs::File, io::BufReader, path::PathBuf};

use clap::{Parser, ValueEnum};
use skatemap_backend::{
    client::WayQualitiesClient,
    models::{Coordinate, Quality, Way, WayQuality},
    overpass::{BoundingBox, OverpassClient, DEFAULT_OVERPASS_URL},
};
use skatemap_shared::closest_path_with_distance;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QualityArg {
    Good,
    Medium,
    Bad,
    Unrated,
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Good => Quality::Good,
            QualityArg::Medium => Quality::Medium,
            QualityArg::Bad => Quality::Bad,
            QualityArg::Unrated => Quality::Unrated,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Rate the way closest to a map center and submit it to the ratings API"
)]
struct Args {
    /// Latitude of the map center
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude of the map center
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    #[arg(long, value_enum)]
    quality: QualityArg,

    /// Half-side of the search box around the center, in meters
    #[arg(long, default_value_t = 50.0)]
    radius_m: f64,

    /// Base URL of the ratings API
    #[arg(long, default_value = "http://localhost:3000")]
    api_url: String,

    #[arg(long, default_value = DEFAULT_OVERPASS_URL)]
    overpass_url: String,

    /// Read candidate ways from a JSON file instead of querying Overpass
    #[arg(long)]
    ways: Option<PathBuf>,

    /// Select the way but do not submit the rating
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let center = Coordinate::new(args.lat, args.lon);
    if !center.is_valid() {
        return Err(format!("invalid map center {center:?}").into());
    }

    let ways: Vec<Way> = match &args.ways {
        Some(path) => {
            tracing::info!("reading ways from {:?}", path);
            serde_json::from_reader(BufReader::new(File::open(path)?))?
        }
        None => {
            let bbox = BoundingBox::around(center, args.radius_m);
            OverpassClient::new(args.overpass_url.as_str())
                .fetch_ways(bbox)
                .await?
        }
    };

    let Some((way, distance)) = closest_path_with_distance(center, &ways) else {
        tracing::warn!(
            "no way with at least two points among {} candidates near {:?}",
            ways.len(),
            center
        );
        return Ok(());
    };
    tracing::info!("closest way {} at {:.1} m", way.id, distance);

    let quality: Quality = args.quality.into();
    if args.dry_run {
        println!("{}", way.id);
        return Ok(());
    }

    let client = WayQualitiesClient::new(&args.api_url);
    client
        .store_way_qualities(&[WayQuality::new(way.id, quality).at(center)])
        .await?;
    tracing::info!("way {} rated {:?}", way.id, quality);
    println!("{}", way.id);

    Ok(())
}
