//! How well "hit at least three of the four goals" predicts a win.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    io::{self, BufWriter},
    ops::Range,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::Context;
use fs_err::File;
use getset::{CopyGetters, Getters};
use itertools::Itertools;
use log::{info, warn};
use serde::Deserialize;
use svg::{
    node::element::{Line, Rectangle, Text},
    Document,
};
use thiserror::Error;
use tokio::time::sleep;

use crate::{goals::GOALS_FOR_PREDICTED_WIN, schema::Season};

const REQUIRED_COLUMNS: [&str; 2] = ["win", "goals_hit"];

#[derive(PartialEq, Eq, Debug, Error)]
pub enum ReportError {
    #[error(
        "Input must contain {}; run the `process` step first",
        quoted_list(.missing)
    )]
    MissingColumns { missing: Vec<&'static str> },
}

fn quoted_list(columns: &[&str]) -> String {
    columns.iter().map(|c| format!("`{c}`")).join(" and ")
}

/// The part of a processed game table the report looks at.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
pub struct GoalRow {
    #[serde(default)]
    pub season: String,
    pub win: u8,
    pub goals_hit: u8,
}
impl GoalRow {
    pub fn won(&self) -> bool {
        self.win != 0
    }

    pub fn predicted_win(&self) -> bool {
        self.goals_hit >= GOALS_FOR_PREDICTED_WIN
    }
}

pub fn read_goal_rows<R: io::Read>(reader: R) -> anyhow::Result<Vec<GoalRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?;
    let missing = REQUIRED_COLUMNS
        .into_iter()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(ReportError::MissingColumns { missing }.into());
    }
    Ok(reader.deserialize().collect::<Result<_, _>>()?)
}

pub fn read_goal_rows_from_path(path: &Path) -> anyhow::Result<Vec<GoalRow>> {
    read_goal_rows(File::open(path)?).with_context(|| format!("While reading {path:?}"))
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Tally {
    pub games: usize,
    pub wins: usize,
}
impl Tally {
    pub fn win_rate(&self) -> Option<f64> {
        (self.games > 0).then(|| self.wins as f64 / self.games as f64)
    }
}

/// Outcomes of the rule used as a win classifier.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Confusion {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}
impl Confusion {
    fn record(&mut self, predicted: bool, won: bool) {
        let count = match (predicted, won) {
            (true, true) => &mut self.true_positive,
            (true, false) => &mut self.false_positive,
            (false, false) => &mut self.true_negative,
            (false, true) => &mut self.false_negative,
        };
        *count += 1;
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// Share of predicted wins that were wins; `None` without any predicted win.
    pub fn calibration(&self) -> Option<f64> {
        let predicted = self.true_positive + self.false_positive;
        (predicted > 0).then(|| self.true_positive as f64 / predicted as f64)
    }
}

/// Empty denominators count as 1.
fn ratio(numerator: usize, denominator: usize) -> f64 {
    numerator as f64 / denominator.max(1) as f64
}

#[derive(Clone, PartialEq, Debug, Getters, CopyGetters)]
pub struct SeasonSummary {
    #[getset(get = "pub")]
    season: String,
    #[getset(get_copy = "pub")]
    games: usize,
    #[getset(get_copy = "pub")]
    wins: usize,
    #[getset(get_copy = "pub")]
    rule_correct: usize,
    goals_total: usize,
    /// Games by number of goals hit.
    #[getset(get_copy = "pub")]
    mix: [usize; 5],
}
impl SeasonSummary {
    fn new(season: String) -> Self {
        Self {
            season,
            games: 0,
            wins: 0,
            rule_correct: 0,
            goals_total: 0,
            mix: [0; 5],
        }
    }

    fn add(&mut self, row: &GoalRow) {
        self.games += 1;
        self.wins += usize::from(row.won());
        self.rule_correct += usize::from(row.predicted_win() == row.won());
        self.goals_total += usize::from(row.goals_hit);
        if let Some(count) = self.mix.get_mut(usize::from(row.goals_hit)) {
            *count += 1;
        }
    }

    pub fn win_pct(&self) -> f64 {
        ratio(self.wins, self.games)
    }

    pub fn rule_accuracy(&self) -> f64 {
        ratio(self.rule_correct, self.games)
    }

    pub fn avg_goals(&self) -> f64 {
        ratio(self.goals_total, self.games)
    }

    pub fn share(&self, goals_hit: usize) -> f64 {
        ratio(self.mix[goals_hit], self.games)
    }
}

#[derive(Clone, PartialEq, Debug, Getters, CopyGetters)]
pub struct Report {
    /// Indexed by number of goals hit.
    #[getset(get = "pub")]
    by_goals: [Tally; 5],
    #[getset(get_copy = "pub")]
    confusion: Confusion,
    /// Sorted by season.
    #[getset(get = "pub")]
    seasons: Vec<SeasonSummary>,
}
impl Report {
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a GoalRow>) -> Self {
        let mut by_goals = [Tally::default(); 5];
        let mut confusion = Confusion::default();
        let mut seasons = BTreeMap::new();
        for row in rows {
            if let Some(tally) = by_goals.get_mut(usize::from(row.goals_hit)) {
                tally.games += 1;
                tally.wins += usize::from(row.won());
            }
            confusion.record(row.predicted_win(), row.won());
            seasons
                .entry(row.season.clone())
                .or_insert_with(|| SeasonSummary::new(row.season.clone()))
                .add(row);
        }
        Self {
            by_goals,
            confusion,
            seasons: seasons.into_values().collect(),
        }
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Win rate by # of goals hit ===")?;
        for (k, tally) in self.by_goals.iter().enumerate() {
            match tally.win_rate() {
                None => writeln!(f, "{k} goals: N=0")?,
                Some(rate) => writeln!(f, "{k} goals: N={:3} | Win%={rate:0.3}", tally.games)?,
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "=== 3-of-4 rule as classifier (predict WIN if goals_hit >= {GOALS_FOR_PREDICTED_WIN}) ==="
        )?;
        let c = &self.confusion;
        writeln!(
            f,
            "Confusion: TP={}, FP={}, TN={}, FN={}",
            c.true_positive, c.false_positive, c.true_negative, c.false_negative
        )?;
        writeln!(
            f,
            "Metrics:   ACC={:0.3}, PREC={:0.3}, REC={:0.3}",
            c.accuracy(),
            c.precision(),
            c.recall()
        )?;
        if let Some(calibration) = c.calibration() {
            writeln!(f, "Calibration among predicted 'win': {calibration:0.3}")?;
        }

        if !self.seasons.is_empty() {
            writeln!(f)?;
            writeln!(f, "=== By season ===")?;
        }
        for s in &self.seasons {
            write!(
                f,
                "{}: N={:3} | Win%={:0.3} | RuleAcc={:0.3} | AvgGoals={:0.2} | Mix",
                s.season,
                s.games,
                s.win_pct(),
                s.rule_accuracy(),
                s.avg_goals()
            )?;
            for k in 0..5 {
                write!(f, " {k}:{:0.2}", s.share(k))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Keeps the rows of the given seasons; an empty filter keeps everything.
pub fn filter_seasons(rows: &[GoalRow], seasons: &[Season]) -> Vec<GoalRow> {
    let labels = seasons.iter().map(Season::to_string).collect::<Vec<_>>();
    rows.iter()
        .filter(|row| labels.is_empty() || labels.contains(&row.season))
        .cloned()
        .collect()
}

#[derive(Clone, Default, Debug)]
pub struct ReportOptions {
    pub seasons: Vec<Season>,
    pub chart: Option<PathBuf>,
}

/// Prints the report of `rows` and draws the chart if asked to.
pub fn run_report(rows: &[GoalRow], options: &ReportOptions) -> anyhow::Result<Report> {
    let rows = filter_seasons(rows, &options.seasons);
    if rows.is_empty() {
        warn!("No games in the selected seasons.");
    }
    let report = Report::from_rows(&rows);
    print!("{report}");
    if let Some(chart) = &options.chart {
        render_chart(&report, chart)?;
        info!("Wrote chart to {chart:?}");
    }
    Ok(report)
}

pub fn report(input: &Path, options: &ReportOptions) -> anyhow::Result<Report> {
    run_report(&read_goal_rows_from_path(input)?, options)
}

/// Re-runs the report whenever `input` changes, checking every `interval`.
pub async fn watch(input: &Path, options: &ReportOptions, interval: Duration) -> anyhow::Result<()> {
    let mut cache = TableCache::default();
    loop {
        match cache.refresh(input) {
            Ok(true) => {
                info!("Loaded {input:?}");
                run_report(cache.rows(input).unwrap_or_default(), options)?;
            }
            Ok(false) => {}
            Err(e) => match e.downcast_ref::<ReportError>() {
                Some(_) => return Err(e),
                None => warn!("Could not read {input:?}: {e:#}"),
            },
        }
        sleep(interval).await;
    }
}

struct CachedTable {
    modified: SystemTime,
    rows: Vec<GoalRow>,
}

/// Loaded goal tables, keyed by path.  An entry is re-read when the file's
/// modification time differs from the one it was read at.
#[derive(Default)]
pub struct TableCache {
    entries: HashMap<PathBuf, CachedTable>,
}
impl TableCache {
    /// Makes sure the entry of `path` is current.  Returns whether the file
    /// was (re)read.
    pub fn refresh(&mut self, path: &Path) -> anyhow::Result<bool> {
        let modified = fs_err::metadata(path)?.modified()?;
        if self
            .entries
            .get(path)
            .is_some_and(|entry| entry.modified == modified)
        {
            return Ok(false);
        }
        let rows = read_goal_rows_from_path(path)?;
        self.entries
            .insert(path.to_owned(), CachedTable { modified, rows });
        Ok(true)
    }

    pub fn rows(&self, path: &Path) -> Option<&[GoalRow]> {
        self.entries.get(path).map(|entry| &entry.rows[..])
    }

    pub fn load(&mut self, path: &Path) -> anyhow::Result<&[GoalRow]> {
        self.refresh(path)?;
        self.rows(path)
            .with_context(|| format!("{path:?} was not loaded"))
    }

    pub fn invalidate(&mut self, path: &Path) {
        self.entries.remove(path);
    }
}

const BLUE: &str = "#0033A0";
const SILVER: &str = "#8A8D8F";
const GOAL_COLORS: [&str; 5] = ["#A7A8AA", "#8A8D8F", "#d1d5db", "#0033A0", "#001e5e"];

/// Two panels: win rate by goals hit, then win % against rule accuracy per
/// season.
pub fn render_chart(report: &Report, path: &Path) -> anyhow::Result<()> {
    let (w, h) = (640.0, 720.0);
    let margin = 40.0;
    let mut document = Document::new()
        .set("viewBox", (0, 0, w, h))
        .add(
            Rectangle::new()
                .set("width", w)
                .set("height", h)
                .set("fill", "white"),
        );

    let top = 60.0..320.0;
    document = document.add(label(w / 2.0, 30.0, "Win rate by number of goals hit", 16));
    document = add_frame(document, margin..w - margin, top.clone());
    let slot = (w - 2.0 * margin) / 5.0;
    for (k, tally) in report.by_goals().iter().enumerate() {
        let x = margin + slot * k as f64;
        let rate = tally.win_rate().unwrap_or(0.0);
        let y = map_float(rate, 0.0..1.0, top.end..top.start);
        document = document
            .add(
                Rectangle::new()
                    .set("x", x + slot * 0.15)
                    .set("y", y)
                    .set("width", slot * 0.7)
                    .set("height", top.end - y)
                    .set("fill", GOAL_COLORS[k]),
            )
            .add(label(x + slot / 2.0, y - 6.0, &format!("N={}", tally.games), 11))
            .add(label(x + slot / 2.0, top.end + 16.0, &k.to_string(), 12));
    }

    let bottom = 420.0..680.0;
    document = document.add(label(w / 2.0, 390.0, "Win % vs. rule accuracy by season", 16));
    document = add_frame(document, margin..w - margin, bottom.clone());
    let seasons = report.seasons();
    let slot = (w - 2.0 * margin) / seasons.len().max(1) as f64;
    for (i, season) in seasons.iter().enumerate() {
        let x = margin + slot * i as f64;
        for (j, (value, color)) in [(season.win_pct(), BLUE), (season.rule_accuracy(), SILVER)]
            .into_iter()
            .enumerate()
        {
            let y = map_float(value, 0.0..1.0, bottom.end..bottom.start);
            document = document.add(
                Rectangle::new()
                    .set("x", x + slot * (0.1 + 0.4 * j as f64))
                    .set("y", y)
                    .set("width", slot * 0.4)
                    .set("height", bottom.end - y)
                    .set("fill", color),
            );
        }
        document = document.add(
            label(x + slot / 2.0, bottom.end + 8.0, season.season(), 9)
                .set("dominant-baseline", "hanging"),
        );
    }

    svg::write(BufWriter::new(File::create(path)?), &document)?;
    Ok(())
}

fn label(x: f64, y: f64, text: &str, size: i32) -> Text {
    Text::new(text)
        .set("x", x)
        .set("y", y)
        .set("font-size", size)
        .set("text-anchor", "middle")
        .set("fill", "#111827")
}

/// Baseline plus gridlines at 25% steps.
fn add_frame(mut document: Document, x: Range<f64>, y: Range<f64>) -> Document {
    for step in 0..=4 {
        let level = map_float(step as f64 / 4.0, 0.0..1.0, y.end..y.start);
        document = document
            .add(
                Line::new()
                    .set("x1", x.start)
                    .set("x2", x.end)
                    .set("y1", level)
                    .set("y2", level)
                    .set("stroke", if step == 0 { "#111827" } else { "#A7A8AA" })
                    .set("stroke-width", 0.5),
            )
            .add(label(x.start - 18.0, level + 4.0, &format!("{}%", step * 25), 9));
    }
    document
}

fn map_float(a: f64, src: Range<f64>, dst: Range<f64>) -> f64 {
    dst.start + (dst.end - dst.start) * (a - src.start) / (src.end - src.start)
}
