use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use rust_xlsxwriter::{Image, Workbook as XlsxWorkbook, Worksheet};
use uuid::Uuid;

use crate::report::assembler::{Cell, Row};
use crate::report::render::ChartImage;
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

/// Default cell size in pixels, used to turn a placement range into an image size.
const CELL_WIDTH_PX: u32 = 64;
const CELL_HEIGHT_PX: u32 = 20;

const TIME_COLUMN_WIDTH: f64 = 16.0;

/// Where an image goes inside the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePlacement {
    pub sheet: String,
    /// Cell range in A1 notation, e.g. `A1:J20`.
    pub range: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    pub name: String,
    pub image: ChartImage,
    pub placement: ImagePlacement,
}

/// Everything a spreadsheet writer needs for one report.
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub data_sheet: String,
    pub rows: Vec<Row>,
    pub images: Vec<PlacedImage>,
}

/// Persists a workbook and returns the location it was written to.
///
/// Implementations must not leave partial output behind on failure.
pub trait SpreadsheetWriter {
    fn write(&self, workbook: &Workbook) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// Writes the workbook as a single `.xlsx` file.
///
/// The data sheet comes first. Each chart image is embedded on its placement
/// sheet, anchored at the range's top-left cell and scaled to fill the range.
/// The file is staged next to the target and renamed into place; a previous
/// report at the same path is kept until the new one has landed.
#[derive(Debug, Clone)]
pub struct XlsxWriter {
    output_path: PathBuf,
}

impl XlsxWriter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Hidden sibling of the output file, unique per call.
    fn sibling_path(&self, suffix: &str) -> Result<PathBuf> {
        let name = self
            .output_path
            .file_name()
            .ok_or_else(|| anyhow!("output path {} has no file name", self.output_path.display()))?
            .to_string_lossy();
        Ok(self
            .output_path
            .with_file_name(format!(".{name}.{}.{suffix}", Uuid::new_v4())))
    }
}

impl SpreadsheetWriter for XlsxWriter {
    async fn write(&self, workbook: &Workbook) -> Result<PathBuf> {
        let owned = workbook.clone();
        let bytes = tokio::task::spawn_blocking(move || build_xlsx(&owned))
            .await
            .context("spreadsheet builder task failed")??;

        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create output directory {}", parent.display()))?;
        }

        let staging = self.sibling_path("tmp")?;
        let backup = self.sibling_path("old")?;

        let result = match tokio::fs::write(&staging, &bytes).await {
            Ok(()) => replace_file(&staging, &self.output_path, &backup).await,
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("failed to write {}", staging.display()))),
        };

        if let Err(err) = result {
            if tokio::fs::try_exists(&staging).await.unwrap_or(false) {
                if let Err(cleanup_err) = tokio::fs::remove_file(&staging).await {
                    log_warn!(
                        "Failed to remove staged report {}: {cleanup_err}",
                        staging.display()
                    );
                }
            }
            return Err(err);
        }

        log_info!(
            "Wrote {} rows and {} charts to {}",
            workbook.rows.len(),
            workbook.images.len(),
            self.output_path.display()
        );
        Ok(self.output_path.clone())
    }
}

/// Move `staged` onto `target`. An existing `target` is parked at `backup`
/// first and put back if the move fails.
async fn replace_file(staged: &Path, target: &Path, backup: &Path) -> Result<()> {
    let parked = if tokio::fs::try_exists(target).await? {
        tokio::fs::rename(target, backup)
            .await
            .with_context(|| format!("failed to set aside previous report {}", target.display()))?;
        true
    } else {
        false
    };

    if let Err(err) = tokio::fs::rename(staged, target).await {
        if parked {
            if let Err(restore_err) = tokio::fs::rename(backup, target).await {
                log_warn!(
                    "Failed to restore previous report from {}: {restore_err}",
                    backup.display()
                );
            }
        }
        return Err(anyhow::Error::new(err)
            .context(format!("failed to move report into {}", target.display())));
    }

    if parked {
        log_info!("Replaced previous report at {}", target.display());
        if let Err(err) = tokio::fs::remove_file(backup).await {
            log_warn!("Failed to remove previous report {}: {err}", backup.display());
        }
    }
    Ok(())
}

fn build_xlsx(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut data = Worksheet::new();
    data.set_name(&workbook.data_sheet)?;
    data.set_column_width(0, TIME_COLUMN_WIDTH)?;

    for (row_index, row) in workbook.rows.iter().enumerate() {
        let row_num = u32::try_from(row_index).context("too many rows for a worksheet")?;
        for (col_index, cell) in row.iter().enumerate() {
            let col_num = u16::try_from(col_index).context("too many columns for a worksheet")?;
            match cell {
                Cell::Text(text) => data.write_string(row_num, col_num, text)?,
                Cell::Integer(value) => data.write_number(row_num, col_num, *value as f64)?,
                Cell::Number(value) => data.write_number(row_num, col_num, *value)?,
            };
        }
    }

    let mut sheets = vec![(workbook.data_sheet.clone(), data)];
    for placed in &workbook.images {
        let range = CellRange::parse(&placed.placement.range)?;
        let index = match sheets
            .iter()
            .position(|(name, _)| *name == placed.placement.sheet)
        {
            Some(index) => index,
            None => {
                let mut sheet = Worksheet::new();
                sheet.set_name(&placed.placement.sheet)?;
                sheets.push((placed.placement.sheet.clone(), sheet));
                sheets.len() - 1
            }
        };

        let image = Image::new_from_buffer(&placed.image.bytes)
            .with_context(|| format!("failed to load {} chart image", placed.name))?
            .set_scale_to_size(range.width_px(), range.height_px(), true)
            .set_alt_text(&placed.name);
        sheets[index]
            .1
            .insert_image(range.first_row, range.first_col, &image)
            .with_context(|| format!("failed to place {} chart at {}", placed.name, placed.placement.range))?;
    }

    let mut book = XlsxWorkbook::new();
    for (_, sheet) in sheets {
        book.push_worksheet(sheet);
    }
    book.save_to_buffer().context("failed to encode workbook")
}

/// Zero-based, inclusive cell rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    first_row: u32,
    first_col: u16,
    last_row: u32,
    last_col: u16,
}

impl CellRange {
    /// Parse `A1:J20` style ranges. A single cell (`B2`) is a 1x1 range.
    fn parse(range: &str) -> Result<Self> {
        let (first, last) = range.split_once(':').unwrap_or((range, range));
        let (first_row, first_col) = parse_cell(first)?;
        let (last_row, last_col) = parse_cell(last)?;
        if last_row < first_row || last_col < first_col {
            bail!("cell range {range} is inverted");
        }
        Ok(Self {
            first_row,
            first_col,
            last_row,
            last_col,
        })
    }

    fn width_px(&self) -> u32 {
        (u32::from(self.last_col - self.first_col) + 1) * CELL_WIDTH_PX
    }

    fn height_px(&self) -> u32 {
        (self.last_row - self.first_row + 1) * CELL_HEIGHT_PX
    }
}

fn parse_cell(cell: &str) -> Result<(u32, u16)> {
    let cell = cell.trim();
    let split = cell
        .find(|c: char| c.is_ascii_digit())
        .filter(|&at| at > 0)
        .ok_or_else(|| anyhow!("invalid cell reference {cell:?}"))?;
    let (letters, digits) = cell.split_at(split);

    let mut col: u32 = 0;
    for letter in letters.chars() {
        if !letter.is_ascii_alphabetic() {
            bail!("invalid column in cell reference {cell:?}");
        }
        let digit = u32::from(letter.to_ascii_uppercase()) - u32::from('A') + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(digit))
            .ok_or_else(|| anyhow!("column out of range in {cell:?}"))?;
    }

    let row: u32 = digits
        .parse()
        .with_context(|| format!("invalid row in cell reference {cell:?}"))?;
    if row == 0 {
        bail!("rows start at 1 in cell reference {cell:?}");
    }

    let col = u16::try_from(col - 1).context("column out of range")?;
    Ok((row - 1, col))
}
