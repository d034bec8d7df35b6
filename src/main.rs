use anyhow::{Context, Result};
use bicimad::{
    aggregate::ChartOptions, fetch::ReqwestClient, BiciMad, Config, UrlEmt,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::{collections::BTreeMap, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "bicimad", about = "Query the monthly BiciMAD trip datasets published by EMT Madrid")]
struct Cli {
    /// YAML config file; falls back to $BICIMAD_CONFIG, then built-in defaults
    #[arg(long, global = true, env = bicimad::config::CONFIG_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
struct Period {
    /// Month number, 1-12
    #[arg(long)]
    month: u32,
    /// Two-digit year, 21-23
    #[arg(long)]
    year: u32,
}

#[derive(Subcommand)]
enum Command {
    /// List every resolved archive link
    Links,
    /// Month-level totals
    Summary(Period),
    /// Trips unlocked at a station but never locked at one
    UnlockedNotLocked(Period),
    /// Trips of one fleet
    Fleet {
        #[command(flatten)]
        period: Period,
        #[arg(long, default_value = "1.0")]
        fleet: String,
    },
    /// Minutes of use per day, with the bar chart series
    DailyMinutes(Period),
    /// Whole hours of use per weekday
    WeekdayHours(Period),
    /// Trips per day
    DailyCounts(Period),
    /// Trips per day and unlock station
    StationCounts(Period),
    /// Unlock addresses tied for most uses
    PopularAddresses(Period),
    /// Print a preview of the dataset
    Show(Period),
}

#[derive(Serialize)]
struct StationCount {
    date: String,
    station: String,
    trips: usize,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn dataset(emt: &UrlEmt<ReqwestClient>, p: Period) -> Result<BiciMad> {
    BiciMad::new(emt, p.month, p.year)
        .await
        .with_context(|| format!("loading dataset {:02}/{}", p.month, p.year))
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let client = ReqwestClient::new(&config.http)?;
    let emt = UrlEmt::new(client, config)
        .await
        .context("resolving archive links")?;
    info!(archives = emt.links().len(), "startup complete");

    match cli.command {
        Command::Links => {
            let links: BTreeMap<String, &String> = emt
                .links()
                .iter()
                .map(|((year, month), link)| (format!("{year:02}-{month:02}"), link))
                .collect();
            print_json(&links)?;
        }
        Command::Summary(p) => print_json(&dataset(&emt, p).await?.summary())?,
        Command::UnlockedNotLocked(p) => {
            let ds = dataset(&emt, p).await?;
            print_json(&json!({ "unlocked_not_locked": ds.unlocked_not_locked() }))?;
        }
        Command::Fleet { period, fleet } => {
            let ds = dataset(&emt, period).await?;
            let subset = ds.filter_by_fleet(&fleet)?;
            println!("{}", BiciMad::from_table(ds.month(), ds.year(), subset));
        }
        Command::DailyMinutes(p) => {
            let ds = dataset(&emt, p).await?;
            let minutes: BTreeMap<String, f64> = ds
                .daily_minutes()
                .into_iter()
                .map(|(d, m)| (d.to_string(), m))
                .collect();
            print_json(&json!({
                "minutes": minutes,
                "chart": {
                    "options": ChartOptions::default(),
                    "series": ds.daily_hours_series(),
                },
            }))?;
        }
        Command::WeekdayHours(p) => {
            let ds = dataset(&emt, p).await?;
            let hours: Vec<_> = ds
                .weekday_hours_named()
                .into_iter()
                .map(|(day, h)| json!({ "weekday": day, "hours": h }))
                .collect();
            print_json(&hours)?;
        }
        Command::DailyCounts(p) => {
            let counts: BTreeMap<String, usize> = dataset(&emt, p)
                .await?
                .daily_counts()
                .into_iter()
                .map(|(d, n)| (d.to_string(), n))
                .collect();
            print_json(&counts)?;
        }
        Command::StationCounts(p) => {
            let rows: Vec<StationCount> = dataset(&emt, p)
                .await?
                .daily_station_counts()
                .into_iter()
                .map(|((date, station), trips)| StationCount {
                    date: date.to_string(),
                    station,
                    trips,
                })
                .collect();
            print_json(&rows)?;
        }
        Command::PopularAddresses(p) => {
            let ds = dataset(&emt, p).await?;
            print_json(&json!({
                "addresses": ds.most_popular_unlock_addresses(),
                "uses": ds.usage_from_most_popular_addresses(),
            }))?;
        }
        Command::Show(p) => println!("{}", dataset(&emt, p).await?),
    }
    Ok(())
}
