use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tempwatch_climate::{compute_baselines, describe, flag_anomalies, Dataset};
use tempwatch_core::Config;
use tempwatch_weather::{fetch_all, LiveFetcher};

mod report;

#[derive(Parser, Debug)]
#[command(author, version, about = "Seasonal temperature anomaly monitor", long_about = None)]
struct Args {
    /// CSV file with city, timestamp and temperature columns
    dataset: PathBuf,

    /// City to analyse (repeatable). Defaults to the configured cities, else the first city in the dataset
    #[arg(short, long = "city")]
    cities: Vec<String>,

    /// Analyse every city in the dataset
    #[arg(long, default_value_t = false, conflicts_with = "cities")]
    all_cities: bool,

    /// OpenWeatherMap API key (overrides OPENWEATHER_API_KEY and the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tempwatch_core::init()?;
    let args = Args::parse();

    let (config, _) = Config::load_validated(args.config.as_deref()).map_err(|e| {
        eprintln!("{}", e.user_message());
        anyhow::Error::new(e)
    })?;

    let dataset = Dataset::from_path(&args.dataset).map_err(|e| {
        eprintln!("{}", e.user_message());
        anyhow::Error::new(e)
    })?;

    let selected = select_cities(&args, &config, &dataset);
    for city in selected.iter().filter(|c| !dataset.contains_city(c)) {
        tracing::warn!("City {} has no historical observations", city);
    }

    let snapshot = dataset.select(&selected);
    let baselines = compute_baselines(snapshot.observations());
    let flagged = flag_anomalies(snapshot.observations(), &baselines);

    println!("Tempwatch - seasonal temperature anomalies");
    println!(
        "{} observations loaded, {} rows skipped\n",
        dataset.len(),
        dataset.skipped_rows()
    );

    print!("{}", report::summary_table(&describe(snapshot.observations())));

    match config.api_key(args.api_key.as_deref()) {
        Some(api_key) => match LiveFetcher::from_config(&api_key, &config.live, baselines.clone()) {
            Ok(fetcher) => {
                let results = fetch_all(&fetcher, &selected).await;
                print!("{}", report::live_results(&results));
            }
            Err(e) => eprintln!("Live comparison unavailable: {}", e.user_message()),
        },
        None => {
            tracing::info!("No API key configured; skipping live comparison");
        }
    }

    for city in &selected {
        print!("{}", report::seasonal_profile(city, &baselines));
        print!("{}", report::anomalies(city, &flagged));
    }

    Ok(())
}

fn select_cities(args: &Args, config: &Config, dataset: &Dataset) -> Vec<String> {
    if args.all_cities {
        return dataset.cities();
    }
    if !args.cities.is_empty() {
        return args.cities.clone();
    }
    if !config.analysis.default_cities.is_empty() {
        return config.analysis.default_cities.clone();
    }
    dataset.cities().into_iter().take(1).collect()
}
