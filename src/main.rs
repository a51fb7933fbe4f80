use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use mbb_goals::{
    api::Fetcher,
    config::{self, Config},
    data_collector::scrape_range,
    goals::process,
    report::{report, watch, ReportOptions},
    schema::Season,
};

#[derive(Parser)]
#[command(about = "Box score scraper and four-goals win heuristic")]
struct Opts {
    /// TOML file overriding the default settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    sub: Sub,
}

#[derive(Subcommand)]
enum Sub {
    /// Scrape box scores into the raw game table.
    Scrape(ScrapeOpts),
    /// Append the win flag and the goal flags to a raw game table.
    Process(ProcessOpts),
    /// Evaluate the 3-of-4 rule on a processed table.
    Report(ReportOpts),
}

#[derive(Args)]
struct ScrapeOpts {
    /// First season, by the year it starts in.
    #[arg(long)]
    start: i32,
    /// Last season, by the year it starts in.
    #[arg(long)]
    end: i32,
    #[arg(long, default_value = "data/games_raw.csv")]
    out: PathBuf,
    /// Seconds to wait before each box page; overrides the config.
    #[arg(long)]
    sleep: Option<f64>,
}

#[derive(Args)]
struct ProcessOpts {
    #[arg(long = "in")]
    input: PathBuf,
    #[arg(long, default_value = "data/games_with_goals.csv")]
    out: PathBuf,
}

#[derive(Args)]
struct ReportOpts {
    #[arg(long = "in")]
    input: PathBuf,
    /// Only these seasons, e.g. `2012-2013`.  May be repeated.
    #[arg(long)]
    season: Vec<Season>,
    /// Also draw an SVG chart here.
    #[arg(long)]
    chart: Option<PathBuf>,
    /// Keep running and report again whenever the input changes, checking
    /// every this many seconds.
    #[arg(long)]
    watch: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Opts::parse();

    match opts.sub {
        Sub::Scrape(sub) => {
            let config = Config::load(opts.config.as_deref())?;
            let delay = match sub.sleep {
                Some(secs) => config::seconds(secs)?,
                None => config.delay()?,
            };
            let fetcher = Fetcher::from_config(&config)?;
            scrape_range(&fetcher, &config, sub.start, sub.end, &sub.out, delay).await?;
        }
        Sub::Process(sub) => {
            process(&sub.input, &sub.out)?;
        }
        Sub::Report(sub) => {
            let options = ReportOptions {
                seasons: sub.season,
                chart: sub.chart,
            };
            match sub.watch {
                Some(secs) => watch(&sub.input, &options, interval(secs)?).await?,
                None => {
                    report(&sub.input, &options)?;
                }
            }
        }
    }

    Ok(())
}

fn interval(secs: f64) -> anyhow::Result<Duration> {
    let interval = config::seconds(secs)?;
    anyhow::ensure!(!interval.is_zero(), "--watch needs a positive interval");
    Ok(interval)
}
