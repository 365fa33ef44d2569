//! Minimal Office Open XML workbook, one sheet per table.

use super::{impact_unit, ReportingAdapter};
use crate::domain::model::{ConvergenceRecord, KeyIndicators, RunResult};
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

struct Sheet {
    name: &'static str,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: &'static str) -> Self {
        Self { name, rows: Vec::new() }
    }

    fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<worksheet xmlns="{}"><sheetData>"#, SHEET_NS));
        for (r, row) in self.rows.iter().enumerate() {
            let row_number = r + 1;
            xml.push_str(&format!(r#"<row r="{}">"#, row_number));
            for (c, cell) in row.iter().enumerate() {
                let reference = format!("{}{}", column_name(c), row_number);
                match cell {
                    Cell::Text(text) => xml.push_str(&format!(
                        r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        reference,
                        escape(text)
                    )),
                    Cell::Number(value) if value.is_finite() => {
                        xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value))
                    }
                    // non-finite values have no spreadsheet representation
                    Cell::Number(_) | Cell::Empty => {}
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

/// Zero-based column index to spreadsheet letters (0 -> A, 26 -> AA).
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn year_header(first: &[&str], result: &RunResult) -> Vec<Cell> {
    let mut row: Vec<Cell> = first.iter().map(|label| Cell::from(*label)).collect();
    row.extend(result.years.iter().map(|year| Cell::Text(year.to_string())));
    row
}

fn series_row(first: Vec<Cell>, values: &[f64]) -> Vec<Cell> {
    let mut row = first;
    row.extend(values.iter().map(|value| Cell::Number(*value)));
    row
}

fn instruments_sheet(adapter: &ReportingAdapter, result: &RunResult) -> Sheet {
    let mut sheet = Sheet::new("Instruments");
    sheet.push(
        ["key", "label", "unit", "value", "default", "min", "max", "description"]
            .iter()
            .map(|h| Cell::from(*h))
            .collect(),
    );
    for spec in adapter.registry().list_instruments() {
        let value = result
            .instruments
            .get(&spec.key)
            .map_or(Cell::Empty, |v| Cell::Number(*v));
        sheet.push(vec![
            Cell::from(spec.key.as_str()),
            Cell::from(spec.label.as_str()),
            Cell::from(spec.unit.as_str()),
            value,
            Cell::from(spec.default),
            Cell::from(spec.min),
            Cell::from(spec.max),
            Cell::from(spec.description.as_str()),
        ]);
    }
    sheet
}

fn indicators_sheet(result: &RunResult) -> Sheet {
    let mut sheet = Sheet::new("Indicators");
    sheet.push(year_header(&["run", "indicator"], result));
    let runs: [(&str, &KeyIndicators); 2] =
        [("baseline", &result.baseline), ("scenario", &result.scenario)];
    for (run, indicators) in runs {
        for (name, values) in [
            ("gdp_growth", &indicators.gdp_growth),
            ("inflation", &indicators.inflation),
            ("deficit_ratio", &indicators.deficit_ratio),
            ("unemployment", &indicators.unemployment),
        ] {
            sheet.push(series_row(vec![Cell::from(run), Cell::from(name)], values));
        }
    }
    sheet
}

fn impacts_sheet(adapter: &ReportingAdapter, result: &RunResult) -> Result<Sheet> {
    let mut sheet = Sheet::new("Impacts");
    sheet.push(year_header(&["variable", "unit"], result));
    for (variable, series) in adapter.mapped_series(&result.impacts, &result.years)? {
        let label = vec![
            Cell::from(variable.key.as_str()),
            Cell::Text(impact_unit(variable)),
        ];
        sheet.push(series_row(label, series));
    }
    Ok(sheet)
}

fn levels_sheet(adapter: &ReportingAdapter, result: &RunResult) -> Result<Sheet> {
    let mut sheet = Sheet::new("Levels");
    sheet.push(year_header(&["run", "variable", "unit"], result));
    for (run, table) in [("scenario", &result.levels), ("baseline", &result.baseline_levels)] {
        for (variable, series) in adapter.mapped_series(table, &result.years)? {
            let label = vec![
                Cell::from(run),
                Cell::from(variable.key.as_str()),
                Cell::from(variable.unit.as_str()),
            ];
            sheet.push(series_row(label, series));
        }
    }
    Ok(sheet)
}

fn convergence_sheet(result: &RunResult) -> Sheet {
    let mut sheet = Sheet::new("Convergence");
    sheet.push(
        ["run", "year", "iterations", "max_residual", "status", "inherited_from"]
            .iter()
            .map(|h| Cell::from(*h))
            .collect(),
    );
    let runs: [(&str, &[ConvergenceRecord]); 2] = [
        ("baseline", result.convergence.baseline.as_slice()),
        ("scenario", result.convergence.scenario.as_slice()),
    ];
    for (run, records) in runs {
        for record in records {
            sheet.push(vec![
                Cell::from(run),
                Cell::from(f64::from(record.year)),
                Cell::from(record.iterations as f64),
                Cell::from(record.max_residual),
                Cell::Text(record.status.to_string()),
                record
                    .inherited_from
                    .map_or(Cell::Empty, |year| Cell::from(f64::from(year))),
            ]);
        }
    }
    sheet
}

pub fn to_xlsx(adapter: &ReportingAdapter, result: &RunResult) -> Result<Vec<u8>> {
    let sheets = vec![
        instruments_sheet(adapter, result),
        indicators_sheet(result),
        impacts_sheet(adapter, result)?,
        levels_sheet(adapter, result)?,
        convergence_sheet(result),
    ];

    let mut content_types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    let mut workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{}" xmlns:r="{}"><sheets>"#,
        SHEET_NS, REL_NS
    );
    let mut workbook_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}">"#,
        PKG_REL_NS
    );
    for (i, sheet) in sheets.iter().enumerate() {
        let n = i + 1;
        content_types.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            n
        ));
        workbook.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            sheet.name, n, n
        ));
        workbook_rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            n, REL_NS, n
        ));
    }
    content_types.push_str("</Types>");
    workbook.push_str("</sheets></workbook>");
    workbook_rels.push_str("</Relationships>");
    let root_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}"><Relationship Id="rId1" Type="{}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        PKG_REL_NS, REL_NS
    );

    tracing::debug!("Creating workbook with {} sheets", sheets.len());

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file::<_, ()>("[Content_Types].xml", FileOptions::default())?;
    zip.write_all(content_types.as_bytes())?;
    zip.start_file::<_, ()>("_rels/.rels", FileOptions::default())?;
    zip.write_all(root_rels.as_bytes())?;
    zip.start_file::<_, ()>("xl/workbook.xml", FileOptions::default())?;
    zip.write_all(workbook.as_bytes())?;
    zip.start_file::<_, ()>("xl/_rels/workbook.xml.rels", FileOptions::default())?;
    zip.write_all(workbook_rels.as_bytes())?;
    for (i, sheet) in sheets.iter().enumerate() {
        zip.start_file::<_, ()>(format!("xl/worksheets/sheet{}.xml", i + 1), FileOptions::default())?;
        zip.write_all(sheet.to_xml().as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
