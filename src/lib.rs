//! Egg report - weekly egg-grading report normalizer
//!
//! Parses the grading system's periodic HTML reports, keeps only the
//! whitelisted production sites, folds the fine weight grades into
//! commercial size bands, and splits every two-week comparison row into two
//! independent week rows, ready for spreadsheet export.
//!
//! # Pipeline
//!
//! | Step | Module |
//! |------|--------|
//! | decode bytes (Big5/UTF-8/GB) | [`encoding`] |
//! | locate table, filter sites | [`extract`] |
//! | sum bands, split weeks | [`aggregate`] |
//! | order and merge rows | [`dataset`] |
//! | drive files and archives | [`batch`] |
//! | CSV / Excel / display table | [`export`] |
//!
//! # Quick Start
//!
//! ```no_run
//! use egg_report::batch;
//! use std::path::Path;
//!
//! let dataset = batch::process_upload(Path::new("weekly_report.html")).unwrap();
//! for row in &dataset.rows {
//!     println!("{} {} {}", row.unit, row.date_label, row.band_small);
//! }
//! ```

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod export;
pub mod extract;
pub mod model;
pub mod serve;

pub use config::Config;
pub use dataset::Dataset;
pub use error::PipelineError;
pub use model::{OutputRow, SiteRecord, Unit, Week, WeekPair, WeekWindow, OUTPUT_COLUMNS, SOURCE_COLUMN};
