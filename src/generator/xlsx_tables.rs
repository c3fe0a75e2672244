use crate::convert::SheetView;
use crate::document::Scalar;
use crate::table::Cell;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rust_xlsxwriter::{ColNum, Format, FormatBorder, RowNum, Workbook, Worksheet};

/// Column holding the row numbers. Columns A and B carry the object name
/// and spacing.
const ROW_NUMBER_COL: ColNum = 2;
const FIRST_DATA_COL: ColNum = 3;
const ROW_NUMBER_HEADER: &str = "nr";
const WIDTH_PADDING: usize = 5;
const PROGRESS_TEMPLATE: &str = "progress: |{bar:40}| {pos}/{len} {msg}";

#[derive(Debug, Clone, Args)]
pub struct XlsxTablesGeneratorOptions {
    /// Show the worksheet gridlines (default: hidden)
    #[arg(long = "show-gridlines", default_value_t = false)]
    pub show_gridlines: bool,
    /// Do not freeze the header row and the row number column
    #[arg(long = "no-freeze-panes", default_value_t = true, action = clap::ArgAction::SetFalse)]
    pub freeze_panes: bool,
    /// Do not size the columns to their content
    #[arg(long = "no-autofit", default_value_t = true, action = clap::ArgAction::SetFalse)]
    pub autofit: bool,
    /// Do not show a progress bar while the sheets are written
    #[arg(short = 'q', long = "quiet", default_value_t = true, action = clap::ArgAction::SetFalse)]
    pub progress: bool,
}

impl Default for XlsxTablesGeneratorOptions {
    fn default() -> Self {
        XlsxTablesGeneratorOptions {
            show_gridlines: false,
            freeze_panes: true,
            autofit: true,
            progress: true,
        }
    }
}

/// Writes every sheet view to its own worksheet.
pub struct XlsxTablesGenerator {
    options: XlsxTablesGeneratorOptions,
}

impl XlsxTablesGenerator {
    pub fn new(options: XlsxTablesGeneratorOptions) -> Self {
        XlsxTablesGenerator { options }
    }

    pub fn output_to_workbook(&self, workbook: &mut Workbook, sheets: &[SheetView]) -> Result<()> {
        let progress = self.progress_bar(sheets.len() as u64);
        self.write_sheets(workbook, sheets, &progress)?;
        progress.finish();
        Ok(())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.options.progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(len);
        match ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
            Ok(style) => progress.set_style(style.progress_chars("-- ")),
            Err(e) => log::debug!("default progress style kept: {}", e),
        }
        progress
    }

    fn write_sheets(&self, workbook: &mut Workbook, sheets: &[SheetView], progress: &ProgressBar) -> Result<()> {
        for (i, sheet) in sheets.iter().enumerate() {
            progress.set_message(sheet.display_name.clone());
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(&sheet.display_name)
                .with_context(|| format!("invalid sheet name \"{}\" for table {}", sheet.display_name, sheet.object_name))?;
            self.output_to_worksheet(worksheet, sheet)?;
            log::debug!(
                "sheet {}/{} \"{}\": {} columns, {} rows",
                i + 1,
                sheets.len(),
                sheet.display_name,
                sheet.table.column_count(),
                sheet.table.row_count()
            );
            progress.inc(1);
        }
        Ok(())
    }

    pub fn output_to_worksheet(&self, worksheet: &mut Worksheet, sheet: &SheetView) -> Result<()> {
        let header_format = Format::new().set_bold().set_border(FormatBorder::Thin);

        worksheet.write_string(0, 0, &sheet.object_name)?;
        worksheet.write_string_with_format(0, ROW_NUMBER_COL, ROW_NUMBER_HEADER, &header_format)?;
        for (j, label) in sheet.column_labels.iter().enumerate() {
            worksheet.write_string_with_format(0, FIRST_DATA_COL + j as ColNum, label, &header_format)?;
        }

        let table = &sheet.table;
        for (i, number) in table.row_numbers().enumerate() {
            let row = (i + 1) as RowNum;
            worksheet.write_number(row, ROW_NUMBER_COL, number as f64)?;
        }
        for (j, column) in table.columns().iter().enumerate() {
            let col = FIRST_DATA_COL + j as ColNum;
            for (i, cell) in column.cells.iter().enumerate() {
                let row = (i + 1) as RowNum;
                match cell {
                    Cell::Scalar(scalar) => write_scalar(worksheet, row, col, scalar)?,
                    Cell::List(_) => {
                        return Err(anyhow!(
                            "table {} still holds a list in column {}",
                            table.name(),
                            column.name
                        ))
                    }
                }
            }
        }

        worksheet.set_screen_gridlines(self.options.show_gridlines);
        if self.options.freeze_panes {
            worksheet.set_freeze_panes(1, FIRST_DATA_COL)?;
        }
        if self.options.autofit {
            for (col, width) in column_widths(sheet).into_iter().enumerate() {
                worksheet.set_column_width(col as ColNum, width as f64)?;
            }
        }
        Ok(())
    }
}

fn write_scalar(worksheet: &mut Worksheet, row: RowNum, col: ColNum, scalar: &Scalar) -> Result<()> {
    match scalar {
        Scalar::Null => {}
        Scalar::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Scalar::Integer(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        Scalar::Float(x) if x.is_finite() => {
            worksheet.write_number(row, col, *x)?;
        }
        Scalar::Float(x) => {
            worksheet.write_string(row, col, x.to_string())?;
        }
        Scalar::String(s) => {
            worksheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

/// Width of every used column: the longest text in it plus padding.
fn column_widths(sheet: &SheetView) -> Vec<usize> {
    let table = &sheet.table;
    let mut widths = vec![0; FIRST_DATA_COL as usize + table.column_count()];

    widths[0] = sheet.object_name.chars().count();
    widths[ROW_NUMBER_COL as usize] = table
        .row_numbers()
        .map(|n| n.to_string().len())
        .chain(std::iter::once(ROW_NUMBER_HEADER.len()))
        .max()
        .unwrap_or(0);
    for (j, column) in table.columns().iter().enumerate() {
        let label_len = sheet.column_labels.get(j).map_or(0, |l| l.chars().count());
        widths[FIRST_DATA_COL as usize + j] = column
            .cells
            .iter()
            .filter_map(Cell::as_scalar)
            .map(|s| s.to_string().chars().count())
            .chain(std::iter::once(label_len))
            .max()
            .unwrap_or(0);
    }
    widths.into_iter().map(|w| w + WIDTH_PADDING).collect()
}
