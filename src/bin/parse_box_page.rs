use std::path::PathBuf;

use clap::Parser;
use mbb_goals::{api::Fetcher, config::Config, parser::box_score::parse_box_page};
use scraper::Html;
use url::Url;

#[derive(Parser)]
struct Opts {
    /// Saved box page, or its URL.
    input: String,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();
    let config = Config::load(opts.config.as_deref())?;

    let html = match Url::parse(&opts.input) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Fetcher::from_config(&config)?.fetch(&url).await?
        }
        _ => fs_err::read_to_string(&opts.input)?,
    };

    let result = parse_box_page(&Html::parse_document(&html));
    dbg!(&result);

    match config.tracked_team_names.side_of(&result) {
        Some(side) => println!("Tracked team is {side}: {:?}", result.side(side).name()),
        None => println!("Tracked team not found"),
    }

    Ok(())
}
