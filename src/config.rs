use std::{path::Path, time::Duration};

use anyhow::Context;
use log::info;
use mbb_goals_utils::fs_util::read_toml;
use serde::Deserialize;
use url::Url;

use crate::{schema::Season, team::TeamMatcher};

const DEFAULT_BASE_URL: &str = "https://static.cnusports.com/custompages/mbball/Stats/";

/// Settings of a scrape run.  Every field may be omitted from the TOML file.
///
/// ```toml
/// base_url = "https://static.cnusports.com/custompages/mbball/Stats/"
/// delay_secs = 1.0
/// tracked_team_names = ["Christopher Newport", "CNU"]
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stats root; must end with `/`.  The season index is
    /// `{base_url}{season}/teamstat.htm`.
    pub base_url: Url,
    pub user_agent: String,
    pub timeout_secs: f64,
    /// Pause before each box page request.
    pub delay_secs: f64,
    pub tracked_team_names: TeamMatcher,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap(),
            user_agent: "Mozilla/5.0 (compatible; CNU-DS-Project/1.0)".to_owned(),
            timeout_secs: 30.0,
            delay_secs: 0.6,
            tracked_team_names: TeamMatcher::default(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let config = read_toml(path)?;
                info!("Loaded config from {path:?}.");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn season_index_url(&self, season: Season) -> anyhow::Result<Url> {
        self.base_url
            .join(&format!("{season}/teamstat.htm"))
            .with_context(|| format!("Cannot build the index URL of {season}"))
    }

    pub fn timeout(&self) -> anyhow::Result<Duration> {
        seconds(self.timeout_secs).context("Invalid timeout_secs")
    }

    pub fn delay(&self) -> anyhow::Result<Duration> {
        seconds(self.delay_secs).context("Invalid delay_secs")
    }
}

pub fn seconds(secs: f64) -> anyhow::Result<Duration> {
    Ok(Duration::try_from_secs_f64(secs)?)
}
