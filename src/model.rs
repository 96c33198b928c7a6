//! Data model for the grading report pipeline
//!
//! The source reports are positional: the grading table carries no usable
//! header text for the metric columns, so every metric is addressed by a
//! fixed cell index (see [`cell`]). Records hold raw cell strings; numeric
//! interpretation happens later in the aggregation step.

use chrono::{Duration, NaiveDate};

/// Site-name markers that qualify a row for extraction. Matching is
/// substring-based so trailing annotation text in the source is tolerated.
pub const SITE_MARKERS: [&str; 4] = [
    "富源畜牧場一場(本A",
    "富源畜牧場一場(本B",
    "富源畜牧場三場(3A)",
    "富源畜牧場三場(3D)",
];

/// Fixed cell positions in the grading table.
///
/// Each metric spans two adjacent cells: the listed index is the week-1
/// value and the week-2 value always sits at `index + 1`. Any column drift
/// in the source format is undetectable by design; the whole schema is a
/// hard dependency on these offsets.
pub mod cell {
    /// Minimum cell count for a structurally valid data row.
    pub const MIN_CELLS: usize = 30;

    pub const FACILITY: usize = 0;
    pub const SITE: usize = 1;

    // Weight grades, finest to coarsest.
    pub const GRADE_3S: usize = 7;
    pub const GRADE_2S: usize = 9;
    pub const GRADE_S: usize = 11;
    pub const GRADE_M: usize = 13;
    pub const GRADE_L: usize = 15;
    pub const GRADE_2L: usize = 17;
    pub const GRADE_3L: usize = 19;
    pub const GRADE_4L: usize = 21;

    // Defect categories.
    pub const DEFECT_E1: usize = 23;
    pub const DEFECT_E2: usize = 25;
    pub const DEFECT_E3: usize = 27;
    pub const DEFECT_E4: usize = 29;

    /// Pre-aggregated total-defect percentage (cells 31-32 are skipped by
    /// the source layout).
    pub const TOTAL_DEFECT: usize = 33;
}

/// Display columns of the final dataset, in output order.
pub const OUTPUT_COLUMNS: [&str; 11] = [
    "棟別",
    "日期",
    "洗選場",
    "S+2S<54g",
    "M+L(54-66g)",
    "2-4L>66g",
    "裂紋蛋E1",
    "髒蛋E2",
    "異常蛋E3",
    "破蛋E4",
    "總次級蛋%",
];

/// Source-file column, appended only when the caller asks for it.
pub const SOURCE_COLUMN: &str = "來源文件";

/// One of the two comparison weeks in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Week {
    One,
    Two,
}

/// The two week-columns of a single metric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekPair {
    pub week1: String,
    pub week2: String,
}

impl WeekPair {
    pub fn new(week1: impl Into<String>, week2: impl Into<String>) -> Self {
        Self {
            week1: week1.into(),
            week2: week2.into(),
        }
    }

    pub fn get(&self, week: Week) -> &str {
        match week {
            Week::One => &self.week1,
            Week::Two => &self.week2,
        }
    }
}

/// Canonical short code for a production site sub-division.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    HonA,
    HonB,
    ThreeA,
    ThreeD,
    /// Whitelisted site whose name matches none of the known sub-labels.
    /// Should be unreachable given the marker list, kept as a safety net.
    Other(String),
}

impl Unit {
    /// Derive the unit tag from a free-text site name.
    pub fn from_site_name(site_name: &str) -> Self {
        if site_name.contains("本A") {
            Unit::HonA
        } else if site_name.contains("本B") {
            Unit::HonB
        } else if site_name.contains("(3A)") {
            Unit::ThreeA
        } else if site_name.contains("(3D)") {
            Unit::ThreeD
        } else {
            Unit::Other(site_name.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Unit::HonA => "本A",
            Unit::HonB => "本B",
            Unit::ThreeA => "3A",
            Unit::ThreeD => "3D",
            Unit::Other(name) => name,
        }
    }

    /// Sort priority of the unit within the assembled dataset.
    ///
    /// 3D has no explicit slot and sorts with the unknowns; this matches the
    /// shipped behavior of the upstream report tool.
    pub fn priority(&self) -> u32 {
        match self {
            Unit::HonA => 0,
            Unit::HonB => 1,
            Unit::ThreeA => 2,
            Unit::ThreeD | Unit::Other(_) => 999,
        }
    }
}

/// One filtered, still-raw table row: 11 metrics, two weeks each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    pub facility_name: String,
    pub site_name: String,
    pub unit: Unit,

    pub grade_3s: WeekPair,
    pub grade_2s: WeekPair,
    pub grade_s: WeekPair,
    pub grade_m: WeekPair,
    pub grade_l: WeekPair,
    pub grade_2l: WeekPair,
    pub grade_3l: WeekPair,
    pub grade_4l: WeekPair,

    pub cracked_e1: WeekPair,
    pub dirty_e2: WeekPair,
    pub abnormal_e3: WeekPair,
    pub broken_e4: WeekPair,
    pub total_defect: WeekPair,
}

/// The pair of 7-day date labels implied by the report's 14-day comparison
/// period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekWindow {
    pub week1: String,
    pub week2: String,
    /// True when no date token was found and the placeholder labels are in
    /// use. Placeholder labels mislabel the output dates; callers should
    /// surface this.
    pub fallback: bool,
}

impl WeekWindow {
    /// Placeholder window used when the header carries no date token.
    pub fn placeholder() -> Self {
        Self {
            week1: "0407-0413".to_string(),
            week2: "0414-0420".to_string(),
            fallback: true,
        }
    }

    /// Derive the window from the two 8-digit dates of a header token
    /// `YYYYMMDD~YYYYMMDD`. Week 1 runs from the first date through +6
    /// days; week 2 from the following day through the second date.
    ///
    /// Returns `None` when either date fails to parse.
    pub fn from_date_tokens(start: &str, end: &str) -> Option<Self> {
        let start = NaiveDate::parse_from_str(start, "%Y%m%d").ok()?;
        let end = NaiveDate::parse_from_str(end, "%Y%m%d").ok()?;
        let week1_end = start + Duration::days(6);
        let week2_start = week1_end + Duration::days(1);
        Some(Self {
            week1: format!("{}-{}", start.format("%m%d"), week1_end.format("%m%d")),
            week2: format!("{}-{}", week2_start.format("%m%d"), end.format("%m%d")),
            fallback: false,
        })
    }

    pub fn label(&self, week: Week) -> &str {
        match week {
            Week::One => &self.week1,
            Week::Two => &self.week2,
        }
    }
}

/// Final unit of the dataset. Two of these are produced per
/// [`SiteRecord`], one per comparison week. Immutable once created; every
/// display column is always present, empty when the source had nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub unit: String,
    pub date_label: String,
    pub facility_name: String,
    pub band_small: String,
    pub band_medium: String,
    pub band_large: String,
    pub cracked_e1: String,
    pub dirty_e2: String,
    pub abnormal_e3: String,
    pub broken_e4: String,
    pub total_defect: String,
    pub source_file: String,
    pub unit_priority: u32,
}

impl OutputRow {
    /// Column values in [`OUTPUT_COLUMNS`] order, optionally with the
    /// source-file column appended.
    pub fn values(&self, include_source: bool) -> Vec<&str> {
        let mut values = vec![
            self.unit.as_str(),
            self.date_label.as_str(),
            self.facility_name.as_str(),
            self.band_small.as_str(),
            self.band_medium.as_str(),
            self.band_large.as_str(),
            self.cracked_e1.as_str(),
            self.dirty_e2.as_str(),
            self.abnormal_e3.as_str(),
            self.broken_e4.as_str(),
            self.total_defect.as_str(),
        ];
        if include_source {
            values.push(self.source_file.as_str());
        }
        values
    }
}
