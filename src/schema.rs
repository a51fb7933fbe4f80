use std::{fmt::Display, num::ParseIntError, str::FromStr};

use getset::{CopyGetters, Getters};
use thiserror::Error;
use typed_builder::TypedBuilder;
use url::Url;

/// One "Box score" link found on a season index page, together with the
/// text of the first three cells of its table row.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SeasonGameLink {
    pub date_text: String,
    pub location_text: String,
    pub result_text: String,
    pub box_url: Url,
}

/// Aggregate line of one team's box score.
///
/// Every field is independently optional: a partially readable totals line
/// still yields whatever could be read.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct TeamTotals {
    pub fgm: Option<u32>,
    pub fga: Option<u32>,
    pub three_made: Option<u32>,
    pub three_attempted: Option<u32>,
    pub ftm: Option<u32>,
    pub fta: Option<u32>,
    pub offensive_rebounds: Option<u32>,
    pub defensive_rebounds: Option<u32>,
    pub total_rebounds: Option<u32>,
    pub turnovers: Option<u32>,
}
impl TeamTotals {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, derive_more::Display)]
pub enum Side {
    Away,
    Home,
}
impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Away => Side::Home,
            Side::Home => Side::Away,
        }
    }
}

/// What a box page tells about one of the two teams.
#[derive(Clone, Default, PartialEq, Eq, Debug, TypedBuilder, Getters, CopyGetters)]
pub struct TeamLine {
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    first_half: Option<u32>,
    #[getset(get_copy = "pub")]
    points: Option<u32>,
    #[getset(get_copy = "pub")]
    totals: Option<TeamTotals>,
}

#[derive(Clone, Default, PartialEq, Eq, Debug, TypedBuilder, Getters)]
pub struct BoxPageResult {
    #[getset(get = "pub")]
    away: TeamLine,
    #[getset(get = "pub")]
    home: TeamLine,
}
impl BoxPageResult {
    pub fn side(&self, side: Side) -> &TeamLine {
        match side {
            Side::Away => &self.away,
            Side::Home => &self.home,
        }
    }
}

/// A season, named after the year it starts in (`2012-2013`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, CopyGetters)]
pub struct Season {
    #[getset(get_copy = "pub")]
    start_year: i32,
}
impl Season {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    /// Seasons starting in `start_year..=end_year`, oldest first.
    pub fn range(start_year: i32, end_year: i32) -> impl Iterator<Item = Season> {
        (start_year..=end_year).map(Season::new)
    }
}
impl Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start_year, self.start_year + 1)
    }
}

#[derive(PartialEq, Eq, Debug, Error)]
pub enum SeasonParseError {
    #[error("Season label must look like `2012-2013`: {0:?}")]
    BadFormat(String),
    #[error("Invalid year in season label: {0}")]
    BadYear(#[from] ParseIntError),
    #[error("Season years are not consecutive: {0}-{1}")]
    NotConsecutive(i32, i32),
}
impl FromStr for Season {
    type Err = SeasonParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| SeasonParseError::BadFormat(s.to_owned()))?;
        let (start, end) = (start.trim().parse::<i32>()?, end.trim().parse::<i32>()?);
        if end != start + 1 {
            return Err(SeasonParseError::NotConsecutive(start, end));
        }
        Ok(Season::new(start))
    }
}

/// One game seen from the tracked team's side.
#[derive(Clone, PartialEq, Eq, Debug, TypedBuilder, Getters, CopyGetters)]
pub struct GameRecord {
    #[getset(get_copy = "pub")]
    season: Season,
    /// ISO date when the index page date could be read, the raw text otherwise.
    #[getset(get = "pub")]
    date: String,
    #[getset(get_copy = "pub")]
    home: bool,
    #[getset(get = "pub")]
    opponent: String,
    #[getset(get = "pub")]
    location_text: String,
    #[getset(get = "pub")]
    result_text: String,
    #[getset(get_copy = "pub")]
    points_for: Option<u32>,
    #[getset(get_copy = "pub")]
    points_against: Option<u32>,
    #[getset(get_copy = "pub")]
    totals_for: Option<TeamTotals>,
    #[getset(get_copy = "pub")]
    totals_against: Option<TeamTotals>,
    #[getset(get_copy = "pub")]
    first_half_for: Option<u32>,
    #[getset(get_copy = "pub")]
    first_half_against: Option<u32>,
    #[getset(get_copy = "pub")]
    overtime: bool,
    #[getset(get = "pub")]
    box_url: Url,
}
