//! Band aggregation and week splitting
//!
//! Each filtered row carries eleven metrics twice, once per comparison
//! week. This step re-buckets the eight fine weight grades into three
//! commercial bands, formats the crack/dirty rates, passes the remaining
//! defect figures through verbatim, and emits one output row per week.

use crate::model::{OutputRow, SiteRecord, Week, WeekWindow};

/// Parse a percentage-like cell: every `%` removed, surrounding whitespace
/// trimmed, then read as a float. `None` marks the cell as defective.
pub fn parse_percent(raw: &str) -> Option<f64> {
    raw.replace('%', "").trim().parse::<f64>().ok()
}

/// Sum a group of percentage cells, failing if any constituent fails.
fn sum_percents(cells: &[&str]) -> Option<f64> {
    cells.iter().try_fold(0.0, |acc, c| Some(acc + parse_percent(c)?))
}

/// Re-append the `%` suffix to a verbatim-copied cell. Unlike the summed
/// bands these keep whatever precision the source used.
fn passthrough(raw: &str) -> String {
    format!("{}%", raw.replace('%', ""))
}

/// Aggregate one record and split it into its two week rows.
///
/// Numeric defects are all-or-nothing per record: if any summed or
/// formatted cell fails to parse for either week, the whole record is
/// dropped and logged, and `None` is returned. Defects never abort the
/// surrounding table.
pub fn split_record(
    record: &SiteRecord,
    window: &WeekWindow,
    source_file: &str,
) -> Option<[OutputRow; 2]> {
    let week1 = week_row(record, window, Week::One, source_file);
    let week2 = week_row(record, window, Week::Two, source_file);
    match (week1, week2) {
        (Some(week1), Some(week2)) => Some([week1, week2]),
        _ => {
            tracing::warn!(
                site = %record.site_name,
                facility = %record.facility_name,
                record = ?record,
                "non-numeric percentage cell, dropping record"
            );
            None
        }
    }
}

fn week_row(
    record: &SiteRecord,
    window: &WeekWindow,
    week: Week,
    source_file: &str,
) -> Option<OutputRow> {
    // S+2S<54g = 3S + 2S + S
    let band_small = sum_percents(&[
        record.grade_3s.get(week),
        record.grade_2s.get(week),
        record.grade_s.get(week),
    ])?;
    // M+L(54-66g) = M + L
    let band_medium = sum_percents(&[record.grade_m.get(week), record.grade_l.get(week)])?;
    // 2-4L>66g = 2L + 3L + 4L
    let band_large = sum_percents(&[
        record.grade_2l.get(week),
        record.grade_3l.get(week),
        record.grade_4l.get(week),
    ])?;

    // E1 and E2 are re-formatted like the bands but stay two separate
    // columns; there is no combined crack+dirty figure in the output.
    let cracked = parse_percent(record.cracked_e1.get(week))?;
    let dirty = parse_percent(record.dirty_e2.get(week))?;

    Some(OutputRow {
        unit: record.unit.label().to_string(),
        unit_priority: record.unit.priority(),
        date_label: window.label(week).to_string(),
        facility_name: record.facility_name.clone(),
        band_small: format!("{band_small:.1}%"),
        band_medium: format!("{band_medium:.1}%"),
        band_large: format!("{band_large:.1}%"),
        cracked_e1: format!("{cracked:.1}%"),
        dirty_e2: format!("{dirty:.1}%"),
        abnormal_e3: passthrough(record.abnormal_e3.get(week)),
        broken_e4: passthrough(record.broken_e4.get(week)),
        total_defect: passthrough(record.total_defect.get(week)),
        source_file: source_file.to_string(),
    })
}
