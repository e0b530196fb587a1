//! Reading the input files (preferences, student rosters, lecturer metadata) and writing the results (human readable
//! report, JSON result file).

pub mod lecturers;
pub mod preferences;
pub mod report;
pub mod result;
