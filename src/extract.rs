//! Table location and row filtering
//!
//! Finds the single `table.list` in a decoded report, reads the comparison
//! window out of the header, and keeps only the rows that belong to the
//! whitelisted production sites. Cells are addressed purely by position; see
//! [`crate::model::cell`].

use crate::model::{cell, SiteRecord, Unit, WeekPair, WeekWindow, SITE_MARKERS};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

lazy_static! {
    /// Two consecutive 8-digit dates, e.g. `20250407~20250420 雙周比較`.
    static ref DATE_RANGE_RE: Regex = Regex::new(r"(\d{8})~(\d{8})").unwrap();
}

/// Result of locating and filtering one report table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub window: WeekWindow,
    pub records: Vec<SiteRecord>,
}

/// A structurally valid row that still ran out of cells mid-extraction.
/// The positional schema reaches past the 30-cell validity floor, so this
/// can happen on truncated exports; it aborts the whole table.
#[derive(Debug, Error)]
#[error("cell {index} out of range in a {len}-cell row")]
struct CellOutOfRange {
    index: usize,
    len: usize,
}

/// Locate the grading table and extract its whitelisted rows.
///
/// Returns `None` when the document has no `table.list`, and also when an
/// unexpected failure occurs mid-extraction; the failure is logged with
/// context and never propagates as a panic or error. A present table with
/// zero qualifying rows yields an [`Extraction`] with empty `records`.
pub fn extract_table(html: &str) -> Option<Extraction> {
    match try_extract(html) {
        Ok(extraction) => extraction,
        Err(err) => {
            tracing::error!(error = %err, "table extraction failed, treating report as empty");
            None
        }
    }
}

fn try_extract(html: &str) -> Result<Option<Extraction>, CellOutOfRange> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table.list").unwrap();
    let row_selector = Selector::parse("tr").unwrap();

    let Some(table) = document.select(&table_selector).next() else {
        return Ok(None);
    };

    let rows: Vec<ElementRef> = table.select(&row_selector).collect();
    let window = rows
        .first()
        .map(|header| header_window(*header))
        .unwrap_or_else(WeekWindow::placeholder);
    if window.fallback {
        tracing::warn!(
            week1 = %window.week1,
            week2 = %window.week2,
            "no date token in header, using placeholder week labels"
        );
    }

    // Row 0 is the header, row 1 a sub-header; data starts at index 2.
    let mut records = Vec::new();
    for row in rows.iter().skip(2) {
        let cells = row_cells(*row);
        if cells.len() < cell::MIN_CELLS {
            continue;
        }

        let site_name = &cells[cell::SITE];
        if !SITE_MARKERS.iter().any(|marker| site_name.contains(marker)) {
            continue;
        }

        records.push(build_record(&cells)?);
    }

    Ok(Some(Extraction { window, records }))
}

/// Read the comparison window out of the header row's first cell, falling
/// back to the placeholder labels when no date token matches.
fn header_window(header: ElementRef) -> WeekWindow {
    let td_selector = Selector::parse("td").unwrap();
    let date_info = header
        .select(&td_selector)
        .next()
        .map(|td| td.text().collect::<String>())
        .unwrap_or_default();

    DATE_RANGE_RE
        .captures(&date_info)
        .and_then(|caps| WeekWindow::from_date_tokens(&caps[1], &caps[2]))
        .unwrap_or_else(WeekWindow::placeholder)
}

/// Collect the text of every `td` in a row, with all whitespace removed.
/// Interior spaces are stripped entirely, not just trimmed; the source pads
/// numeric cells unpredictably.
fn row_cells(row: ElementRef) -> Vec<String> {
    let td_selector = Selector::parse("td").unwrap();
    row.select(&td_selector)
        .map(|td| {
            td.text()
                .flat_map(|fragment| fragment.chars())
                .filter(|c| !c.is_whitespace())
                .collect()
        })
        .collect()
}

fn build_record(cells: &[String]) -> Result<SiteRecord, CellOutOfRange> {
    let site_name = cells[cell::SITE].clone();
    Ok(SiteRecord {
        facility_name: cells[cell::FACILITY].clone(),
        unit: Unit::from_site_name(&site_name),
        site_name,
        grade_3s: week_pair(cells, cell::GRADE_3S)?,
        grade_2s: week_pair(cells, cell::GRADE_2S)?,
        grade_s: week_pair(cells, cell::GRADE_S)?,
        grade_m: week_pair(cells, cell::GRADE_M)?,
        grade_l: week_pair(cells, cell::GRADE_L)?,
        grade_2l: week_pair(cells, cell::GRADE_2L)?,
        grade_3l: week_pair(cells, cell::GRADE_3L)?,
        grade_4l: week_pair(cells, cell::GRADE_4L)?,
        cracked_e1: week_pair(cells, cell::DEFECT_E1)?,
        dirty_e2: week_pair(cells, cell::DEFECT_E2)?,
        abnormal_e3: week_pair(cells, cell::DEFECT_E3)?,
        broken_e4: week_pair(cells, cell::DEFECT_E4)?,
        total_defect: week_pair(cells, cell::TOTAL_DEFECT)?,
    })
}

/// Fetch the week-1/week-2 value pair starting at `index`.
fn week_pair(cells: &[String], index: usize) -> Result<WeekPair, CellOutOfRange> {
    let fetch = |i: usize| {
        cells.get(i).cloned().ok_or(CellOutOfRange {
            index: i,
            len: cells.len(),
        })
    };
    Ok(WeekPair {
        week1: fetch(index)?,
        week2: fetch(index + 1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a 35-cell data row: facility, site, then numbered percent
    /// cells so positional extraction is easy to assert on.
    fn data_row(facility: &str, site: &str) -> String {
        let mut cells = vec![facility.to_string(), site.to_string()];
        for i in 2..35 {
            cells.push(format!("{i}.0%"));
        }
        to_tr(&cells)
    }

    fn to_tr(cells: &[String]) -> String {
        let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
        format!("<tr>{tds}</tr>")
    }

    fn report(header: &str, body_rows: &[String]) -> String {
        format!(
            "<html><body><table class=\"list\">\
             <tr><td>{header}</td></tr>\
             <tr><td>sub-header</td></tr>\
             {}\
             </table></body></html>",
            body_rows.join("")
        )
    }

    #[test]
    fn test_missing_table_yields_none() {
        assert!(extract_table("<html><body><p>no table</p></body></html>").is_none());
        assert!(extract_table("<table class=\"other\"><tr><td>x</td></tr></table>").is_none());
    }

    #[test]
    fn test_header_window_extraction() {
        let html = report(
            "20250407~20250420 雙周比較",
            &[data_row("富源洗選廠", "富源畜牧場一場(本A棟)")],
        );
        let extraction = extract_table(&html).unwrap();
        assert_eq!(extraction.window.week1, "0407-0413");
        assert_eq!(extraction.window.week2, "0414-0420");
        assert!(!extraction.window.fallback);
    }

    #[test]
    fn test_missing_date_token_falls_back() {
        let html = report("雙周比較", &[data_row("廠", "富源畜牧場三場(3A)")]);
        let extraction = extract_table(&html).unwrap();
        assert!(extraction.window.fallback);
        assert_eq!(extraction.window.week1, "0407-0413");
    }

    #[test]
    fn test_site_filtering_is_substring_based() {
        let html = report(
            "20250407~20250420",
            &[
                data_row("廠", "富源畜牧場一場(本A棟) 備註"),
                data_row("廠", "無關牧場"),
                data_row("廠", "富源畜牧場三場(3D)"),
            ],
        );
        let extraction = extract_table(&html).unwrap();
        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[0].unit, Unit::HonA);
        assert_eq!(extraction.records[1].unit, Unit::ThreeD);
    }

    #[test]
    fn test_positional_extraction() {
        let html = report(
            "20250407~20250420",
            &[data_row("富源洗選廠", "富源畜牧場一場(本B棟)")],
        );
        let record = &extract_table(&html).unwrap().records[0];

        assert_eq!(record.facility_name, "富源洗選廠");
        assert_eq!(record.grade_3s, WeekPair::new("7.0%", "8.0%"));
        assert_eq!(record.grade_4l, WeekPair::new("21.0%", "22.0%"));
        assert_eq!(record.cracked_e1, WeekPair::new("23.0%", "24.0%"));
        assert_eq!(record.broken_e4, WeekPair::new("29.0%", "30.0%"));
        assert_eq!(record.total_defect, WeekPair::new("33.0%", "34.0%"));
    }

    #[test]
    fn test_cell_whitespace_fully_removed() {
        let mut cells: Vec<String> = vec![" 富源 洗選廠 ".into(), "富源畜牧場一場(本A".into()];
        for _ in 2..35 {
            cells.push(" 1.5 % ".into());
        }
        let html = report("20250407~20250420", &[to_tr(&cells)]);
        let record = &extract_table(&html).unwrap().records[0];
        assert_eq!(record.facility_name, "富源洗選廠");
        assert_eq!(record.grade_3s.week1, "1.5%");
    }

    #[test]
    fn test_short_rows_silently_skipped() {
        // 29 cells: below the validity floor, excluded without error.
        let mut cells = vec!["廠".to_string(), "富源畜牧場一場(本A".to_string()];
        for i in 2..29 {
            cells.push(format!("{i}%"));
        }
        assert_eq!(cells.len(), 29);

        let html = report(
            "20250407~20250420",
            &[to_tr(&cells), data_row("廠", "富源畜牧場一場(本A")],
        );
        let extraction = extract_table(&html).unwrap();
        assert_eq!(extraction.records.len(), 1);
    }

    #[test]
    fn test_truncated_row_aborts_table() {
        // 30 cells clears the floor but the schema reads up to cell 34;
        // the whole table degrades to empty, matching upstream behavior.
        let mut cells = vec!["廠".to_string(), "富源畜牧場一場(本A".to_string()];
        for i in 2..30 {
            cells.push(format!("{i}%"));
        }
        assert_eq!(cells.len(), 30);

        let html = report("20250407~20250420", &[to_tr(&cells)]);
        assert!(extract_table(&html).is_none());
    }

    #[test]
    fn test_table_with_no_qualifying_rows_is_empty_not_none() {
        let html = report("20250407~20250420", &[data_row("廠", "無關牧場")]);
        let extraction = extract_table(&html).unwrap();
        assert!(extraction.records.is_empty());
    }
}
