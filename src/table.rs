//! CSV persistence of [`GameRecord`]s.

use std::{
    io::{self, BufWriter},
    path::Path,
};

use anyhow::Context;
use fs_err::File;
use mbb_goals_utils::fs_util::create_parent_dir;
use serde::{Deserialize, Serialize};

use crate::schema::{GameRecord, TeamTotals};

/// Column order of the raw game table.  Must match the field order of [`GameRow`].
pub const COLUMNS: [&str; 32] = [
    "season",
    "date",
    "home",
    "opponent",
    "location_text",
    "result_text",
    "team_pts",
    "opp_pts",
    "team_fgm",
    "team_fga",
    "team_tpm",
    "team_tpa",
    "team_ftm",
    "team_fta",
    "team_orb",
    "team_drb",
    "team_trb",
    "team_to",
    "opp_fgm",
    "opp_fga",
    "opp_tpm",
    "opp_tpa",
    "opp_ftm",
    "opp_fta",
    "opp_orb",
    "opp_drb",
    "opp_trb",
    "opp_to",
    "team_first_half",
    "opp_first_half",
    "ot",
    "box_url",
];

/// A [`GameRecord`] as it appears in the table: flags as 0/1, unset numbers
/// as empty cells.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GameRow {
    pub season: String,
    pub date: String,
    pub home: u8,
    pub opponent: String,
    pub location_text: String,
    pub result_text: String,
    pub team_pts: Option<u32>,
    pub opp_pts: Option<u32>,
    pub team_fgm: Option<u32>,
    pub team_fga: Option<u32>,
    pub team_tpm: Option<u32>,
    pub team_tpa: Option<u32>,
    pub team_ftm: Option<u32>,
    pub team_fta: Option<u32>,
    pub team_orb: Option<u32>,
    pub team_drb: Option<u32>,
    pub team_trb: Option<u32>,
    pub team_to: Option<u32>,
    pub opp_fgm: Option<u32>,
    pub opp_fga: Option<u32>,
    pub opp_tpm: Option<u32>,
    pub opp_tpa: Option<u32>,
    pub opp_ftm: Option<u32>,
    pub opp_fta: Option<u32>,
    pub opp_orb: Option<u32>,
    pub opp_drb: Option<u32>,
    pub opp_trb: Option<u32>,
    pub opp_to: Option<u32>,
    pub team_first_half: Option<u32>,
    pub opp_first_half: Option<u32>,
    pub ot: u8,
    pub box_url: String,
}

impl From<&GameRecord> for GameRow {
    fn from(record: &GameRecord) -> Self {
        let team = record.totals_for().unwrap_or_default();
        let opp = record.totals_against().unwrap_or_default();
        Self {
            season: record.season().to_string(),
            date: record.date().clone(),
            home: record.home().into(),
            opponent: record.opponent().clone(),
            location_text: record.location_text().clone(),
            result_text: record.result_text().clone(),
            team_pts: record.points_for(),
            opp_pts: record.points_against(),
            team_fgm: team.fgm,
            team_fga: team.fga,
            team_tpm: team.three_made,
            team_tpa: team.three_attempted,
            team_ftm: team.ftm,
            team_fta: team.fta,
            team_orb: team.offensive_rebounds,
            team_drb: team.defensive_rebounds,
            team_trb: team.total_rebounds,
            team_to: team.turnovers,
            opp_fgm: opp.fgm,
            opp_fga: opp.fga,
            opp_tpm: opp.three_made,
            opp_tpa: opp.three_attempted,
            opp_ftm: opp.ftm,
            opp_fta: opp.fta,
            opp_orb: opp.offensive_rebounds,
            opp_drb: opp.defensive_rebounds,
            opp_trb: opp.total_rebounds,
            opp_to: opp.turnovers,
            team_first_half: record.first_half_for(),
            opp_first_half: record.first_half_against(),
            ot: record.overtime().into(),
            box_url: record.box_url().to_string(),
        }
    }
}

impl TryFrom<GameRow> for GameRecord {
    type Error = anyhow::Error;
    fn try_from(row: GameRow) -> anyhow::Result<Self> {
        let totals = |totals: TeamTotals| (!totals.is_empty()).then_some(totals);
        let totals_for = totals(TeamTotals {
            fgm: row.team_fgm,
            fga: row.team_fga,
            three_made: row.team_tpm,
            three_attempted: row.team_tpa,
            ftm: row.team_ftm,
            fta: row.team_fta,
            offensive_rebounds: row.team_orb,
            defensive_rebounds: row.team_drb,
            total_rebounds: row.team_trb,
            turnovers: row.team_to,
        });
        let totals_against = totals(TeamTotals {
            fgm: row.opp_fgm,
            fga: row.opp_fga,
            three_made: row.opp_tpm,
            three_attempted: row.opp_tpa,
            ftm: row.opp_ftm,
            fta: row.opp_fta,
            offensive_rebounds: row.opp_orb,
            defensive_rebounds: row.opp_drb,
            total_rebounds: row.opp_trb,
            turnovers: row.opp_to,
        });
        Ok(GameRecord::builder()
            .season(row.season.parse()?)
            .date(row.date)
            .home(row.home != 0)
            .opponent(row.opponent)
            .location_text(row.location_text)
            .result_text(row.result_text)
            .points_for(row.team_pts)
            .points_against(row.opp_pts)
            .totals_for(totals_for)
            .totals_against(totals_against)
            .first_half_for(row.team_first_half)
            .first_half_against(row.opp_first_half)
            .overtime(row.ot != 0)
            .box_url(
                row.box_url
                    .parse()
                    .with_context(|| format!("Invalid box_url: {:?}", row.box_url))?,
            )
            .build())
    }
}

/// Writes the header and one row per record.  The header is written even
/// when there are no records.
pub fn write_records<W: io::Write>(writer: W, records: &[GameRecord]) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.serialize(GameRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_records_to_path(path: &Path, records: &[GameRecord]) -> anyhow::Result<()> {
    create_parent_dir(path)?;
    write_records(BufWriter::new(File::create(path)?), records)
        .with_context(|| format!("While writing games to {path:?}"))
}

pub fn read_rows<R: io::Read>(reader: R) -> anyhow::Result<Vec<GameRow>> {
    Ok(csv::Reader::from_reader(reader)
        .into_deserialize()
        .collect::<Result<_, _>>()?)
}

pub fn read_records<R: io::Read>(reader: R) -> anyhow::Result<Vec<GameRecord>> {
    read_rows(reader)?
        .into_iter()
        .map(GameRecord::try_from)
        .collect()
}

pub fn read_records_from_path(path: &Path) -> anyhow::Result<Vec<GameRecord>> {
    read_records(File::open(path)?).with_context(|| format!("While reading games from {path:?}"))
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::{read_records, write_records, GameRow, COLUMNS};
    use crate::schema::{GameRecord, Season, TeamTotals};

    fn record(opponent: &str, totals_against: Option<TeamTotals>) -> GameRecord {
        GameRecord::builder()
            .season(Season::new(2012))
            .date("2012-11-16".to_owned())
            .home(true)
            .opponent(opponent.to_owned())
            .location_text("Freeman Center, \"Newport News\"".to_owned())
            .result_text("W 84-65 OT".to_owned())
            .points_for(Some(84))
            .points_against(None)
            .totals_for(Some(TeamTotals {
                fgm: Some(26),
                fga: Some(58),
                turnovers: Some(9),
                ..Default::default()
            }))
            .totals_against(totals_against)
            .first_half_for(Some(30))
            .first_half_against(None)
            .overtime(true)
            .box_url(Url::parse("https://example.com/2012-2013/cnumgm01.htm").unwrap())
            .build()
    }

    #[test]
    fn test_round_trip() {
        let records = vec![
            record("Salisbury", None),
            record(
                "Mary Washington, VA",
                Some(TeamTotals {
                    total_rebounds: Some(35),
                    ..Default::default()
                }),
            ),
        ];
        let mut buffer = vec![];
        write_records(&mut buffer, &records).unwrap();
        assert_eq!(read_records(&buffer[..]).unwrap(), records);
    }

    #[test]
    fn test_header_only() {
        let mut buffer = vec![];
        write_records(&mut buffer, &[]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), COLUMNS.join(",") + "\n");
    }

    #[test]
    fn test_columns_match_row_fields() {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .serialize(GameRow::from(&record("Salisbury", None)))
            .unwrap();
        let written = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(written.lines().next().unwrap(), COLUMNS.join(","));
    }

    #[test]
    fn test_row_format() {
        let mut buffer = vec![];
        write_records(&mut buffer, &[record("Salisbury", None)]).unwrap();
        let written = String::from_utf8(buffer).unwrap();
        assert_eq!(
            written.lines().nth(1).unwrap(),
            "2012-2013,2012-11-16,1,Salisbury,\"Freeman Center, \"\"Newport News\"\"\",W 84-65 OT,84,,26,58,,,,,,,,9,,,,,,,,,,,30,,1,https://example.com/2012-2013/cnumgm01.htm"
        );
    }

    #[test]
    fn test_idempotent_output() {
        let records = vec![record("Salisbury", None), record("Salisbury", None)];
        let [mut first, mut second]: [Vec<u8>; 2] = Default::default();
        write_records(&mut first, &records).unwrap();
        write_records(&mut second, &records).unwrap();
        assert_eq!(first, second);
    }
}
