//! quakemon - earthquakes near a place, and the strongest of the past year.
//!
//! # Usage
//!
//! ```bash
//! # Earthquakes around an address, plus the top-ten panel
//! quakemon "Anchorage, AK"
//!
//! # Skip geocoding and search a box directly (north,south,east,west)
//! quakemon --bbox=-12,-21,-178,177
//!
//! # Offline, from a saved earthquakesJSON document
//! quakemon --replay fixtures/earthquakes.json --bbox 46,30,146,128
//!
//! # Check credentials and endpoints
//! quakemon --verify
//! ```

use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use quakemon_service::analysis::top_ten::TopEarthquakeFinder;
use quakemon_service::config::{AppConfig, DEFAULT_CONFIG_PATH};
use quakemon_service::ingest::geocoder::GoogleGeocoder;
use quakemon_service::ingest::geonames::{GeoNamesClient, QuakeFeed};
use quakemon_service::ingest::replay::ReplayFeed;
use quakemon_service::logging::{self, DataSource};
use quakemon_service::map_view::{ConsoleMap, MapView, format_detail, format_top_ten};
use quakemon_service::model::{BoundingBox, QuakeDetail};
use quakemon_service::page::{QuakePage, SearchOutcome};
use quakemon_service::query::BoundedQuakeQuery;
use quakemon_service::verify;

/// Earthquake lookup by place name, with a top-ten panel for the past year.
#[derive(Parser)]
#[command(name = "quakemon", version, about)]
struct Cli {
    /// Place to search around, e.g. "Tokyo" or "Anchorage, AK"
    address: Option<String>,

    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Starting magnitude floor for the top-ten search (default from config)
    #[arg(long)]
    min_magnitude: Option<f64>,

    /// Search this box instead of geocoding: north,south,east,west
    #[arg(long, allow_hyphen_values = true)]
    bbox: Option<BoundingBox>,

    /// Answer feed queries from a saved earthquakesJSON document
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Show the detail panel for this earthquake id after plotting
    #[arg(long)]
    show: Option<String>,

    /// Skip the top-ten search
    #[arg(long)]
    no_top_ten: bool,

    /// Check the configured services and exit
    #[arg(long)]
    verify: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_cli(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when a search ran but failed.
async fn run_cli(cli: &Cli) -> Result<bool, Box<dyn Error>> {
    let (config, missing_file) = load_config(&cli.config)?;

    let min_level = config.logging.min_level()?;
    logging::init_logger(min_level, config.logging.file.as_deref(), config.logging.timestamps);

    if missing_file {
        logging::warn(
            DataSource::System,
            None,
            &format!("{} not found, using defaults", cli.config.display()),
        );
    }

    if cli.verify {
        let report = verify::run_full_verification(&config).await?;
        verify::print_summary(&report);
        return Ok(report.working_count() == 2);
    }

    match &cli.replay {
        Some(path) => {
            let feed = ReplayFeed::from_path(path)?;
            run(cli, &config, &feed).await
        }
        None => {
            let feed = GeoNamesClient::from_config(&config.geonames)?;
            run(cli, &config, &feed).await
        }
    }
}

/// Reads the config file, falling back to defaults only when the default
/// path is absent. Environment credentials are applied either way.
fn load_config(path: &Path) -> Result<(AppConfig, bool), Box<dyn Error>> {
    let missing = !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH);

    let mut config = if missing {
        AppConfig::default()
    } else {
        AppConfig::load(path)?
    };
    config.apply_env_overrides();

    Ok((config, missing))
}

async fn run<F: QuakeFeed>(cli: &Cli, config: &AppConfig, feed: &F) -> Result<bool, Box<dyn Error>> {
    let finder = TopEarthquakeFinder::new(feed, config.search.clone());
    let geocoder = GoogleGeocoder::from_config(&config.geocoder)?;
    let mut page = QuakePage::new(
        &geocoder,
        BoundedQuakeQuery::new(feed, config.geonames.box_max_rows),
        ConsoleMap::new(),
    );
    page.map_mut()
        .on_activate(Box::new(|detail: &QuakeDetail| println!("\n{}", format_detail(detail))));

    let start_floor = cli.min_magnitude.unwrap_or(config.search.initial_floor);

    // The two flows are independent and share nothing but the feed.
    let top_ten_flow = async {
        if cli.no_top_ten {
            None
        } else {
            Some(finder.find_top_ten(start_floor).await)
        }
    };
    let search_flow = async {
        match (&cli.bbox, &cli.address) {
            (Some(bbox), _) => Some(page.show_box(*bbox).await),
            (None, Some(address)) => Some(page.submit_address(address).await),
            (None, None) => None,
        }
    };
    let (top_ten, search) = tokio::join!(top_ten_flow, search_flow);

    let mut all_ok = true;

    match search {
        Some(Ok(SearchOutcome::Plotted { .. })) => {
            print!("{}", page.map().render());
            if let Some(eqid) = &cli.show {
                if page.map_mut().activate(eqid).is_none() {
                    eprintln!("No earthquake '{}' on the map", eqid);
                    all_ok = false;
                }
            }
        }
        Some(Ok(SearchOutcome::Skipped)) => println!("Empty address, nothing to search."),
        Some(Err(e)) => {
            eprintln!("✗ {}", e);
            all_ok = false;
        }
        None => {}
    }

    match top_ten {
        Some(Ok(result)) => {
            println!(
                "\nStrongest earthquakes of the past {} days (floor M{:.1}):",
                config.search.window_days, result.floor
            );
            println!("{}", format_top_ten(&result));
        }
        Some(Err(e)) => {
            eprintln!("✗ Top-ten search: {}", e);
            all_ok = false;
        }
        None => {}
    }

    Ok(all_ok)
}
