pub mod box_score;
pub mod season_index;
