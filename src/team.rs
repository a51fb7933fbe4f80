use serde::{Deserialize, Serialize};

use crate::schema::{BoxPageResult, Side};

/// Accepted spellings of the tracked team's name.  A team name containing any
/// of them (case-sensitively) is the tracked team.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamMatcher {
    variants: Vec<String>,
}
impl Default for TeamMatcher {
    fn default() -> Self {
        Self::new(["Christopher Newport", "Chris. Newport", "CNU", "Chris Newport"])
    }
}
impl TeamMatcher {
    pub fn new<I>(variants: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    pub fn is_tracked(&self, name: &str) -> bool {
        self.variants
            .iter()
            .any(|variant| !variant.is_empty() && name.contains(variant.as_str()))
    }

    /// The home side wins when both names match.
    pub fn side_of(&self, page: &BoxPageResult) -> Option<Side> {
        [Side::Home, Side::Away]
            .into_iter()
            .find(|&side| self.is_tracked(page.side(side).name()))
    }
}
