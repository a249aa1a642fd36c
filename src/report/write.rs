// src/report/write.rs

use rust_xlsxwriter::{
    Color, ColNum, Format, FormatAlign, FormatBorder, RowNum, Workbook, Worksheet, XlsxError,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, instrument};

use super::present::{Shade, SheetLayout};
use super::sheet::ReportSheet;
use crate::process::records::CellValue;

const HEADER_FILL: u32 = 0xD9D9D9;
const ODD_FILL: u32 = 0xDDEBF7;
const EVEN_FILL: u32 = 0xFFF2CC;
const MIN_WIDTH: usize = 8;
const MAX_WIDTH: usize = 50;

struct Formats {
    header: Format,
    odd: Format,
    even: Format,
}

impl Formats {
    fn new() -> Self {
        let cell = Format::new()
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::VerticalCenter);
        Self {
            header: Format::new()
                .set_bold()
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center)
                .set_background_color(Color::RGB(HEADER_FILL)),
            odd: cell.clone().set_background_color(Color::RGB(ODD_FILL)),
            even: cell.set_background_color(Color::RGB(EVEN_FILL)),
        }
    }

    fn shade(&self, shade: Shade) -> &Format {
        match shade {
            Shade::Odd => &self.odd,
            Shade::Even => &self.even,
        }
    }

    /// The data-row format for each row, in order.
    fn for_rows(&self, shades: &[Shade]) -> Vec<&Format> {
        shades.iter().map(|&s| self.shade(s)).collect()
    }
}

fn write_cell(
    ws: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: &CellValue,
    format: &Format,
) -> Result<(), XlsxError> {
    match value {
        CellValue::Text(s) if s.is_empty() => ws.write_blank(row, col, format)?,
        CellValue::Text(s) => ws.write_string_with_format(row, col, s, format)?,
        CellValue::Integer(n) => ws.write_number_with_format(row, col, *n as f64, format)?,
    };
    Ok(())
}

/// Per data row, the fill its run was given. Rows outside any run keep the
/// first fill.
fn row_shades(layout: Option<&SheetLayout>, rows: usize) -> Vec<Shade> {
    let mut shades = vec![Shade::Odd; rows];
    if let Some(layout) = layout {
        for run in &layout.runs {
            for slot in shades.iter_mut().take(run.last + 1).skip(run.first) {
                *slot = run.shade;
            }
        }
    }
    shades
}

fn column_widths(sheet: &ReportSheet) -> Vec<f64> {
    (0..sheet.width())
        .map(|c| {
            let longest = sheet
                .rows
                .iter()
                .map(|r| r[c].to_string().chars().count())
                .chain(std::iter::once(sheet.header[c].chars().count()))
                .max()
                .unwrap_or(0);
            (longest + 2).clamp(MIN_WIDTH, MAX_WIDTH) as f64
        })
        .collect()
}

fn write_sheet(ws: &mut Worksheet, sheet: &ReportSheet, formats: &Formats) -> Result<(), XlsxError> {
    ws.set_name(&sheet.name)?;

    for (c, title) in sheet.header.iter().enumerate() {
        ws.write_string_with_format(0, c as ColNum, title, &formats.header)?;
    }
    for (c, width) in column_widths(sheet).into_iter().enumerate() {
        ws.set_column_width(c as ColNum, width)?;
    }
    ws.set_freeze_panes(1, 0)?;

    let layout = sheet.layout.as_ref();
    let row_formats = formats.for_rows(&row_shades(layout, sheet.rows.len()));

    // cells below the top of a merge are owned by merge_range
    let mut covered = HashSet::new();
    let mut merge_tops = HashMap::new();
    for m in layout.map(|l| l.merges.as_slice()).unwrap_or_default() {
        merge_tops.insert((m.first, m.col), m.last);
        for r in m.first + 1..=m.last {
            covered.insert((r, m.col));
        }
    }

    for (r, row) in sheet.rows.iter().enumerate() {
        let format = row_formats[r];
        let xr = (r + 1) as RowNum;
        for (c, value) in row.iter().enumerate() {
            if covered.contains(&(r, c)) {
                continue;
            }
            let xc = c as ColNum;
            if let Some(&last) = merge_tops.get(&(r, c)) {
                ws.merge_range(xr, xc, (last + 1) as RowNum, xc, "", format)?;
            }
            write_cell(ws, xr, xc, value, format)?;
        }
    }
    Ok(())
}

/// Writes every sheet into one workbook and saves it in a single step.
#[instrument(level = "info", skip(sheets, path), fields(path = %path.as_ref().display()))]
pub fn write_workbook<P: AsRef<Path>>(sheets: &[ReportSheet], path: P) -> Result<(), XlsxError> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    for sheet in sheets {
        let ws = workbook.add_worksheet();
        write_sheet(ws, sheet, &formats)?;
    }
    workbook.save(path.as_ref())?;
    info!(sheets = sheets.len(), "saved workbook");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::present::{present, Run};
    use anyhow::Result;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use tempfile::tempdir;

    fn sample() -> ReportSheet {
        let row = |i: u64, g: &str, name: &str| {
            vec![
                CellValue::Integer(i),
                CellValue::Text(g.into()),
                CellValue::Text(name.into()),
            ]
        };
        let mut sheet = ReportSheet {
            name: "C1".into(),
            header: vec!["Counting".into(), "HomeID".into(), "Full Name".into()],
            rows: vec![
                row(1, "C1-0101", "An"),
                row(1, "C1-0101", "Bình"),
                row(2, "C1-0102", "Chi"),
            ],
            layout: None,
        };
        present(&mut sheet, &[0, 1], 1, 0);
        sheet
    }

    #[test]
    fn shades_cover_runs() {
        let layout = SheetLayout {
            runs: vec![
                Run { first: 0, last: 1, shade: Shade::Odd },
                Run { first: 2, last: 2, shade: Shade::Even },
            ],
            merges: vec![],
        };
        assert_eq!(
            row_shades(Some(&layout), 3),
            vec![Shade::Odd, Shade::Odd, Shade::Even]
        );
        assert_eq!(row_shades(None, 2), vec![Shade::Odd, Shade::Odd]);
    }

    #[test]
    fn rows_take_their_run_fill() {
        let sheet = sample();
        let formats = Formats::new();
        let shades = row_shades(sheet.layout.as_ref(), sheet.rows.len());
        let chosen = formats.for_rows(&shades);

        // display indices 1, 1, 2
        assert!(std::ptr::eq(chosen[0], &formats.odd));
        assert!(std::ptr::eq(chosen[1], &formats.odd));
        assert!(std::ptr::eq(chosen[2], &formats.even));
        assert_ne!(formats.odd, formats.even);
        assert_ne!(formats.odd, Format::new().set_background_color(Color::RGB(ODD_FILL)));
    }

    #[test]
    fn writes_values_and_merges() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.xlsx");
        write_workbook(&[sample()], &path)?;

        let mut wb: Xlsx<_> = open_workbook(&path)?;
        let range = wb.worksheet_range("C1")?;
        assert_eq!(range.get_value((0, 1)), Some(&Data::String("HomeID".into())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::Float(1.0)));
        assert_eq!(range.get_value((2, 2)), Some(&Data::String("Bình".into())));
        assert_eq!(range.get_value((3, 1)), Some(&Data::String("C1-0102".into())));

        wb.load_merged_regions()?;
        let mut merged: Vec<_> = wb
            .merged_regions_by_sheet("C1")
            .iter()
            .map(|(_, _, dims)| (dims.start, dims.end))
            .collect();
        merged.sort();
        assert_eq!(merged, vec![((1, 0), (2, 0)), ((1, 1), (2, 1))]);
        Ok(())
    }
}
