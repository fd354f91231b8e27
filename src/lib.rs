//! Console work tracker: measures how long and how actively you work, keeps an append-only log
//! of it per day, and summarizes that log over any range of days.

pub mod cli;
pub mod probe;
pub mod report;
pub mod session;
pub mod storage;
pub mod utils;
