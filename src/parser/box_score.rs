//! Box score pages are preformatted text wrapped in a little HTML, and their
//! layout drifts from season to season.  Every field is read independently;
//! a field that cannot be found is left unset instead of failing the page.

use itertools::Itertools;
use mbb_goals_utils::regex;
use scraper::{Html, Node};

use crate::schema::{BoxPageResult, TeamLine, TeamTotals};

const VISITORS_LABEL: &str = "VISITORS:";
const HOME_LABEL: &str = "HOME TEAM:";

pub fn parse_box_page(html: &Html) -> BoxPageResult {
    parse_box_text(&page_text(html))
}

/// Visible text of the page, one stripped text node per line.
pub fn page_text(html: &Html) -> String {
    html.tree
        .root()
        .descendants()
        .filter(|node| {
            !node
                .parent()
                .and_then(|parent| parent.value().as_element())
                .is_some_and(|e| matches!(e.name(), "script" | "style"))
        })
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some(text.trim()),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .join("\n")
}

pub fn parse_box_text(text: &str) -> BoxPageResult {
    let (away_name, home_name) = parse_team_names(text);
    let [away_scores, home_scores] = parse_period_scores(text);

    let away_block = match (text.find(VISITORS_LABEL), text.find(HOME_LABEL)) {
        (Some(v), Some(h)) if v <= h => &text[v..h],
        _ => "",
    };
    let home_block = text.find(HOME_LABEL).map_or("", |h| &text[h..]);

    let line = |name: String, scores: Option<(u32, u32)>, block: &str| {
        TeamLine::builder()
            .name(name)
            .first_half(scores.map(|s| s.0))
            .points(scores.map(|s| s.1))
            .totals(find_totals(block))
            .build()
    };
    BoxPageResult::builder()
        .away(line(away_name, away_scores, away_block))
        .home(line(home_name, home_scores, home_block))
        .build()
}

/// Returns `(away, home)`; a side without a label gets an empty name.
fn parse_team_names(text: &str) -> (String, String) {
    let mut away = String::new();
    let mut home = String::new();
    for captures in regex!(r"(?m)^(VISITORS|HOME TEAM):\s*(.*)$").captures_iter(text) {
        let name = clean_team_name(&captures[2]);
        match &captures[1] {
            "VISITORS" => away = name,
            _ => home = name,
        }
    }
    (away, home)
}

/// `Christopher Newport 22-5` -> `Christopher Newport`
fn clean_team_name(rest: &str) -> String {
    let mut tokens = rest.split_whitespace().collect_vec();
    while tokens
        .last()
        .is_some_and(|token| regex!(r"^\d+-\d+$").is_match(token))
    {
        tokens.pop();
    }
    tokens
        .join(" ")
        .trim_matches(|c| matches!(c, ' ' | '#' | '.'))
        .to_owned()
}

/// `(first half, final)` for the away row and the home row.
fn parse_period_scores(text: &str) -> [Option<(u32, u32)>; 2] {
    let Some(captures) = regex!(
        r"(?i)Score by Periods\s+1st\s+2nd(?:\s+OT\d*)*\s+Total\s+([^\n]+)\n([^\n]+)"
    )
    .captures(text) else {
        return [None, None];
    };
    [1, 2].map(|i| {
        let numbers = regex!(r"[0-9]+")
            .find_iter(&captures[i])
            .filter_map(|m| m.as_str().parse::<u32>().ok())
            .collect_vec();
        Some((*numbers.first()?, *numbers.last()?))
    })
}

fn find_totals(block: &str) -> Option<TeamTotals> {
    let captures = block
        .lines()
        .find_map(|line| regex!(r"(?i)^\s*Totals\.\.+\s+(.*)$").captures(line))?;
    parse_totals_line(&captures[1])
}

/// Parses what follows `Totals......` on a team's box score:
///
/// ```text
/// FG-FGA 3PT-3PTA FT-FTA OFF DEF TOT PF TP A TO BLK S MIN
/// 26-58  7-18     25-35  10  32  42  17 84 14 9  4   6 200
/// ```
///
/// Lines with fewer than 13 columns are rejected.  Only shooting, rebounds
/// and turnovers are kept.
pub fn parse_totals_line(line: &str) -> Option<TeamTotals> {
    let tokens = line.split_whitespace().collect_vec();
    if tokens.len() < 13 {
        return None;
    }
    let (fgm, fga) = parse_made_attempted(tokens[0]);
    let (three_made, three_attempted) = parse_made_attempted(tokens[1]);
    let (ftm, fta) = parse_made_attempted(tokens[2]);
    let [offensive_rebounds, defensive_rebounds, total_rebounds, _fouls, _points, _assists, turnovers, _blocks, _steals, _minutes] =
        std::array::from_fn::<Option<u32>, 10, _>(|i| tokens[3 + i].parse().ok());
    Some(TeamTotals {
        fgm,
        fga,
        three_made,
        three_attempted,
        ftm,
        fta,
        offensive_rebounds,
        defensive_rebounds,
        total_rebounds,
        turnovers,
    })
}

/// `26-58` -> made and attempted; `26` -> made only.
fn parse_made_attempted(token: &str) -> (Option<u32>, Option<u32>) {
    match token.split_once('-') {
        Some((made, attempted)) => match (made.parse(), attempted.parse()) {
            (Ok(made), Ok(attempted)) => (Some(made), Some(attempted)),
            _ => (None, None),
        },
        None => (token.parse().ok(), None),
    }
}
