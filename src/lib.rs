pub mod api;
pub mod chrono_util;
pub mod config;
pub mod data_collector;
pub mod goals;
pub mod parser;
pub mod report;
pub mod schema;
pub mod table;
pub mod team;
