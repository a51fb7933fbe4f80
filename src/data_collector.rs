use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use log::{debug, info, trace, warn};
use scraper::Html;
use tokio::time::sleep;

use crate::{
    api::PageSource,
    chrono_util::normalize_date,
    config::Config,
    parser::{box_score::parse_box_page, season_index::parse_game_links},
    schema::{BoxPageResult, GameRecord, Season, SeasonGameLink, Side},
    table::write_records_to_path,
    team::TeamMatcher,
};

/// Scrapes every season starting in `start_year..=end_year` and writes one
/// row per game of the tracked team to `output`.
///
/// Seasons or games that cannot be fetched are logged and skipped; the table
/// is written in any case.
pub async fn scrape_range<S: PageSource>(
    source: &S,
    config: &Config,
    start_year: i32,
    end_year: i32,
    output: &Path,
    delay: Duration,
) -> anyhow::Result<PathBuf> {
    let records = collect_records(source, config, start_year, end_year, delay).await?;
    write_records_to_path(output, &records)?;
    info!("Wrote {} games to {output:?}", records.len());
    Ok(output.to_owned())
}

pub async fn collect_records<S: PageSource>(
    source: &S,
    config: &Config,
    start_year: i32,
    end_year: i32,
    delay: Duration,
) -> anyhow::Result<Vec<GameRecord>> {
    let mut records = vec![];
    for season in Season::range(start_year, end_year) {
        let season_url = config.season_index_url(season)?;
        let html = match source.fetch_page(&season_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Could not open season {season}: {e:#}");
                continue;
            }
        };
        let links = parse_game_links(&Html::parse_document(&html), &season_url);
        info!("{season}: found {} box links", links.len());

        for link in links {
            sleep(delay).await;
            let box_html = match source.fetch_page(&link.box_url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(
                        "{season} {} failed: {} -> {e:#}",
                        link.date_text, link.box_url
                    );
                    continue;
                }
            };
            let page = parse_box_page(&Html::parse_document(&box_html));
            match build_record(season, &link, &page, &config.tracked_team_names) {
                Some(record) => records.push(record),
                None => trace!(
                    "Neither {:?} nor {:?} is the tracked team; skipping {}",
                    page.away().name(),
                    page.home().name(),
                    link.box_url
                ),
            }
        }
    }
    Ok(records)
}

/// Puts a parsed box page into the tracked team's perspective.  `None` if
/// neither side is the tracked team.
pub fn build_record(
    season: Season,
    link: &SeasonGameLink,
    page: &BoxPageResult,
    matcher: &TeamMatcher,
) -> Option<GameRecord> {
    let side = matcher.side_of(page)?;
    let team = page.side(side);
    let opponent = page.side(side.opposite());
    if team.totals().is_none() || opponent.totals().is_none() {
        debug!("Totals missing for {}", link.box_url);
    }

    Some(
        GameRecord::builder()
            .season(season)
            .date(normalize_date(&link.date_text))
            .home(side == Side::Home)
            .opponent(opponent.name().clone())
            .location_text(link.location_text.clone())
            .result_text(link.result_text.clone())
            .points_for(team.points())
            .points_against(opponent.points())
            .totals_for(team.totals())
            .totals_against(opponent.totals())
            .first_half_for(team.first_half())
            .first_half_against(opponent.first_half())
            .overtime(is_overtime(link))
            .box_url(link.box_url.clone())
            .build(),
    )
}

fn is_overtime(link: &SeasonGameLink) -> bool {
    [&link.result_text, &link.location_text]
        .iter()
        .any(|text| text.to_uppercase().contains("OT"))
}
