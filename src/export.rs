//! Export of the assembled dataset
//!
//! Three consumers: the display table on the upload page (HTML), the Excel
//! artifact and the CSV artifact. The display table never shows the
//! source-file column; the spreadsheet writers include it on request.

use crate::dataset::Dataset;
use crate::error::PipelineError;
use crate::model::{OUTPUT_COLUMNS, SOURCE_COLUMN};
use rust_xlsxwriter::{Format, Workbook};
use std::fmt::Write as _;
use std::path::Path;

/// Column headers, optionally with the source-file column appended.
fn header_row(include_source: bool) -> Vec<&'static str> {
    let mut headers = OUTPUT_COLUMNS.to_vec();
    if include_source {
        headers.push(SOURCE_COLUMN);
    }
    headers
}

/// Serialize the dataset to a CSV file, overwriting any previous artifact.
pub fn write_csv(
    dataset: &Dataset,
    path: &Path,
    include_source: bool,
) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header_row(include_source))?;
    for row in &dataset.rows {
        writer.write_record(row.values(include_source))?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize the dataset to a single-sheet Excel workbook, overwriting any
/// previous artifact. Header row bold, columns widened for the CJK labels.
pub fn write_xlsx(
    dataset: &Dataset,
    path: &Path,
    include_source: bool,
) -> Result<(), PipelineError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, header) in header_row(include_source).iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
        worksheet.set_column_width(col as u16, 14)?;
    }
    for (row_idx, row) in dataset.rows.iter().enumerate() {
        for (col, value) in row.values(include_source).iter().enumerate() {
            worksheet.write_string(row_idx as u32 + 1, col as u16, *value)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Render the dataset as an HTML display table. The source-file column is
/// deliberately omitted; it only matters in the downloadable artifacts.
pub fn render_html_table(dataset: &Dataset) -> String {
    let mut html = String::new();
    writeln!(html, "<table class=\"table table-striped table-bordered\">").unwrap();

    writeln!(html, "  <thead><tr>").unwrap();
    for header in OUTPUT_COLUMNS {
        writeln!(html, "    <th>{}</th>", escape_html(header)).unwrap();
    }
    writeln!(html, "  </tr></thead>").unwrap();

    writeln!(html, "  <tbody>").unwrap();
    for row in &dataset.rows {
        writeln!(html, "  <tr>").unwrap();
        for value in row.values(false) {
            writeln!(html, "    <td>{}</td>", escape_html(value)).unwrap();
        }
        writeln!(html, "  </tr>").unwrap();
    }
    writeln!(html, "  </tbody>").unwrap();
    writeln!(html, "</table>").unwrap();

    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
