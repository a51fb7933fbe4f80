//! The four coaching goals and the `process` step that appends them to the
//! raw game table.

use std::{
    io::{self, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::Context;
use fs_err::File;
use itertools::Itertools;
use log::info;
use mbb_goals_utils::fs_util::create_parent_dir;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::{schema::GameRecord, table::GameRow};

/// Offensive rebounds needed per own missed field goal.
pub const OFFENSIVE_REBOUND_SHARE: f64 = 0.40;
/// The opponent must score fewer than this in the first half.
pub const FIRST_HALF_LIMIT: u32 = 30;
/// The rule predicts a win when at least this many goals are hit.
pub const GOALS_FOR_PREDICTED_WIN: u8 = 3;

/// Columns `process` appends to the raw table, in order.
pub const DERIVED_COLUMNS: [&str; 6] = [
    "win",
    "goal_reb",
    "goal_to",
    "goal_orb",
    "goal_def30",
    "goals_hit",
];

#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter, IntoStaticStr)]
pub enum Goal {
    /// More total rebounds than the opponent.
    #[strum(serialize = "goal_reb")]
    Outrebound,
    /// Fewer turnovers than the opponent.
    #[strum(serialize = "goal_to")]
    FewerTurnovers,
    /// Offensive rebounds on at least 40% of own missed field goals.
    #[strum(serialize = "goal_orb")]
    OffensiveRebounds,
    /// Opponent held under 30 in the first half.
    #[strum(serialize = "goal_def30")]
    FirstHalfDefense,
}
impl Goal {
    /// Whether the game met this goal.  A missing statistic counts as not met.
    pub fn is_met(self, game: &GameRecord) -> bool {
        let team = game.totals_for().unwrap_or_default();
        let opp = game.totals_against().unwrap_or_default();
        let compare = |a: Option<u32>, b: Option<u32>, f: fn(&u32, &u32) -> bool| {
            a.zip(b).is_some_and(|(a, b)| f(&a, &b))
        };
        match self {
            Goal::Outrebound => compare(team.total_rebounds, opp.total_rebounds, u32::gt),
            Goal::FewerTurnovers => compare(team.turnovers, opp.turnovers, u32::lt),
            Goal::OffensiveRebounds => {
                let misses = team.fga.zip(team.fgm).and_then(|(a, m)| a.checked_sub(m));
                match (misses, team.offensive_rebounds) {
                    (Some(0), _) => true,
                    (Some(misses), Some(orb)) => {
                        orb as f64 / misses as f64 >= OFFENSIVE_REBOUND_SHARE
                    }
                    _ => false,
                }
            }
            Goal::FirstHalfDefense => game
                .first_half_against()
                .is_some_and(|points| points < FIRST_HALF_LIMIT),
        }
    }
}

/// Result and goal flags of one game.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Outcome {
    pub win: bool,
    /// Indexed in [`Goal::iter`] order.
    pub goals_met: [bool; 4],
}
impl Outcome {
    pub fn goals_hit(&self) -> u8 {
        self.goals_met.iter().filter(|&&met| met).count() as u8
    }

    pub fn predicts_win(&self) -> bool {
        self.goals_hit() >= GOALS_FOR_PREDICTED_WIN
    }

    /// Cells in [`DERIVED_COLUMNS`] order.
    fn cells(&self) -> Vec<String> {
        let flag = |b: bool| u8::from(b).to_string();
        std::iter::once(flag(self.win))
            .chain(self.goals_met.map(flag))
            .chain([self.goals_hit().to_string()])
            .collect()
    }
}

pub fn evaluate(game: &GameRecord) -> Outcome {
    let mut goals_met = [false; 4];
    for (met, goal) in goals_met.iter_mut().zip(Goal::iter()) {
        *met = goal.is_met(game);
    }
    Outcome {
        win: game
            .points_for()
            .zip(game.points_against())
            .is_some_and(|(ours, theirs)| ours > theirs),
        goals_met,
    }
}

/// Copies the raw table from `reader` to `writer`, appending
/// [`DERIVED_COLUMNS`] to every row.  Derived columns already present in the
/// input are dropped first, so a processed table can be processed again.
///
/// Returns the number of rows written.
pub fn process_table<R: io::Read, W: io::Write>(reader: R, writer: W) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    let kept = (0..headers.len())
        .filter(|&i| !DERIVED_COLUMNS.contains(&&headers[i]))
        .collect_vec();

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(kept.iter().map(|&i| &headers[i]).chain(DERIVED_COLUMNS))?;

    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let row: GameRow = record
            .deserialize(Some(&headers))
            .with_context(|| format!("Malformed game on line {line}"))?;
        let game = GameRecord::try_from(row).with_context(|| format!("On line {line}"))?;
        let cells = evaluate(&game).cells();
        writer.write_record(
            kept.iter()
                .map(|&i| &record[i])
                .chain(cells.iter().map(String::as_str)),
        )?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

pub fn process(input: &Path, output: &Path) -> anyhow::Result<PathBuf> {
    let reader = File::open(input)?;
    create_parent_dir(output)?;
    let writer = BufWriter::new(File::create(output)?);
    let rows = process_table(reader, writer)
        .with_context(|| format!("While deriving goals from {input:?}"))?;
    info!("Wrote {rows} rows with goals to {output:?}");
    Ok(output.to_owned())
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use strum::IntoEnumIterator;
    use url::Url;

    use super::{evaluate, process_table, Goal, Outcome, DERIVED_COLUMNS};
    use crate::{
        schema::{GameRecord, Season, TeamTotals},
        table::{write_records, COLUMNS},
    };

    fn totals(fgm: u32, fga: u32, orb: u32, trb: u32, to: u32) -> TeamTotals {
        TeamTotals {
            fgm: Some(fgm),
            fga: Some(fga),
            offensive_rebounds: Some(orb),
            total_rebounds: Some(trb),
            turnovers: Some(to),
            ..Default::default()
        }
    }

    fn game(
        points: (u32, u32),
        team: Option<TeamTotals>,
        opp: Option<TeamTotals>,
        opp_first_half: Option<u32>,
    ) -> GameRecord {
        GameRecord::builder()
            .season(Season::new(2015))
            .date("2016-01-09".to_owned())
            .home(true)
            .opponent("Salisbury".to_owned())
            .location_text("Home".to_owned())
            .result_text("W 70-65".to_owned())
            .points_for(Some(points.0))
            .points_against(Some(points.1))
            .totals_for(team)
            .totals_against(opp)
            .first_half_for(Some(33))
            .first_half_against(opp_first_half)
            .overtime(false)
            .box_url(Url::parse("http://stats.test/2015-2016/g1.htm").unwrap())
            .build()
    }

    /// 70-65, 40 vs 35 rebounds, 8 vs 12 turnovers, 13 offensive rebounds on
    /// 30 misses, 28 allowed in the first half.
    fn all_goals_game() -> GameRecord {
        game(
            (70, 65),
            Some(totals(25, 55, 13, 40, 8)),
            Some(totals(24, 60, 9, 35, 12)),
            Some(28),
        )
    }

    #[test]
    fn test_goal_names() {
        let names = Goal::iter().map(<&str>::from).collect::<Vec<_>>();
        assert_eq!(names, DERIVED_COLUMNS[1..5]);
    }

    #[test]
    fn test_all_goals() {
        let outcome = evaluate(&all_goals_game());
        assert_eq!(
            outcome,
            Outcome {
                win: true,
                goals_met: [true; 4]
            }
        );
        assert_eq!(outcome.goals_hit(), 4);
        assert!(outcome.predicts_win());
    }

    #[test]
    fn test_boundaries() {
        // Equal rebounds and turnovers, exactly 12/30 = 0.40, exactly 30 allowed.
        let outcome = evaluate(&game(
            (60, 60),
            Some(totals(25, 55, 12, 35, 10)),
            Some(totals(25, 55, 12, 35, 10)),
            Some(30),
        ));
        assert!(!outcome.win);
        assert_eq!(outcome.goals_met, [false, false, true, false]);
        assert!(!outcome.predicts_win());

        // 11/30 falls short.
        let outcome = evaluate(&game((60, 61), Some(totals(25, 55, 11, 35, 10)), None, None));
        assert_eq!(outcome.goals_met, [false; 4]);
    }

    #[test]
    fn test_no_misses() {
        let outcome = evaluate(&game((50, 40), Some(totals(20, 20, 0, 30, 5)), None, None));
        assert_eq!(outcome.goals_met, [false, false, true, false]);
        assert_eq!(outcome.goals_hit(), 1);
    }

    #[test]
    fn test_missing_statistics() {
        let mut team = totals(25, 55, 13, 40, 8);
        team.turnovers = None;
        let outcome = evaluate(&game((70, 65), Some(team), None, None));
        assert_eq!(outcome.goals_met, [false, false, true, false]);

        let outcome = evaluate(&game((70, 65), None, Some(totals(1, 2, 3, 4, 5)), Some(20)));
        assert_eq!(outcome.goals_met, [false, false, false, true]);

        let record = GameRecord::builder()
            .season(Season::new(2015))
            .date("TBA".to_owned())
            .home(false)
            .opponent(String::new())
            .location_text(String::new())
            .result_text(String::new())
            .points_for(None)
            .points_against(Some(3))
            .totals_for(None)
            .totals_against(None)
            .first_half_for(None)
            .first_half_against(None)
            .overtime(false)
            .box_url(Url::parse("http://stats.test/x.htm").unwrap())
            .build();
        assert_eq!(
            evaluate(&record),
            Outcome {
                win: false,
                goals_met: [false; 4]
            }
        );
    }

    #[test]
    fn test_process_table() {
        let mut raw = vec![];
        write_records(
            &mut raw,
            &[
                all_goals_game(),
                game((55, 70), Some(totals(20, 60, 5, 30, 15)), None, Some(40)),
            ],
        )
        .unwrap();

        let mut processed = vec![];
        assert_eq!(process_table(&raw[..], &mut processed).unwrap(), 2);
        let processed = String::from_utf8(processed).unwrap();
        let lines = processed.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);

        let header = COLUMNS.iter().chain(&DERIVED_COLUMNS).join(",");
        assert_eq!(lines[0], header);
        let raw = String::from_utf8(raw).unwrap();
        let raw_lines = raw.lines().collect::<Vec<_>>();
        assert_eq!(lines[1], format!("{},1,1,1,1,1,4", raw_lines[1]));
        assert_eq!(lines[2], format!("{},0,0,0,0,0,0", raw_lines[2]));

        // Processing the output again replaces the derived columns.
        let mut again = vec![];
        assert_eq!(process_table(processed.as_bytes(), &mut again).unwrap(), 2);
        assert_eq!(String::from_utf8(again).unwrap(), processed);
    }

    #[test]
    fn test_process_empty_table() {
        let mut raw = vec![];
        write_records(&mut raw, &[]).unwrap();
        let mut processed = vec![];
        assert_eq!(process_table(&raw[..], &mut processed).unwrap(), 0);
        assert_eq!(
            String::from_utf8(processed).unwrap(),
            COLUMNS.iter().chain(&DERIVED_COLUMNS).join(",") + "\n"
        );
    }

    #[test]
    fn test_process_rejects_garbage() {
        let input = format!("{}\nnot,a,game\n", COLUMNS.join(","));
        assert!(process_table(input.as_bytes(), vec![]).is_err());
    }
}
