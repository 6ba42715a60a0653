use clap::Parser;
use tracing_subscriber::EnvFilter;

use geojson_show::browser::BrowserRegistry;
use geojson_show::features::{load_features, FeatureInput};
use geojson_show::map::{MapProvider, LEAFLET_OSM_TILE_URL};
use geojson_show::show::{run, RunOptions};
use geojson_show::style::resolve_style;
use geojson_show::ShowError;

#[derive(Debug, Parser)]
#[command(
    name = "geojson-show",
    about = "Command-line tool for serving GeoJSON features from an on-demand web server.",
    after_help = "If the only path given is \"-\" then data will be read from STDIN."
)]
struct Cli {
    /// Valid options are: leaflet, protomaps.
    #[arg(long, default_value = "leaflet")]
    map_provider: String,

    /// A valid Leaflet tile layer URI, or a file:// or api:// URI when the
    /// map provider is protomaps.
    #[arg(long, default_value = LEAFLET_OSM_TILE_URL)]
    map_tile_uri: String,

    /// A valid Protomaps theme label.
    #[arg(long, default_value = "white")]
    protomaps_theme: String,

    /// A custom Leaflet style definition for geometries. This may either be
    /// a JSON-encoded string or a path on disk.
    #[arg(long, default_value = "")]
    style: String,

    /// A custom Leaflet style definition for point geometries. This may
    /// either be a JSON-encoded string or a path on disk.
    #[arg(long, default_value = "")]
    point_style: String,

    /// Zero or more properties to use to construct a label for a feature's
    /// popup menu when it is clicked on.
    #[arg(long = "label")]
    labels: Vec<String>,

    /// A browser URI naming the scheme to open the map with.
    #[arg(long, default_value = "web://")]
    browser_uri: String,

    /// The port number to listen for requests on (on localhost). If 0 then
    /// a random port number will be chosen.
    #[arg(long, default_value_t = 0)]
    port: u16,

    /// Zero or more paths to GeoJSON files, or "-" to read from STDIN.
    paths: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run_cli(cli).await {
        eprintln!("geojson-show: {e}");
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> Result<(), ShowError> {
    let registry = BrowserRegistry::with_defaults();
    let browser = registry.resolve(&cli.browser_uri)?;

    let map_provider: MapProvider = cli.map_provider.parse()?;
    let style = resolve_style(&cli.style)?;
    let point_style = resolve_style(&cli.point_style)?;

    let input = FeatureInput::from_args(&cli.paths);
    let features = load_features(&input)?;

    run(RunOptions {
        map_provider,
        map_tile_uri: cli.map_tile_uri,
        protomaps_theme: cli.protomaps_theme,
        port: cli.port,
        features,
        style,
        point_style,
        label_properties: cli.labels,
        browser,
        ..Default::default()
    })
    .await
}
