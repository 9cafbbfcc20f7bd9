pub mod assembler;
pub mod chart;
pub mod generator;
pub mod render;
pub mod writer;

pub use assembler::{AssembledReport, Cell, ReportAssembler, Row};
pub use chart::{ChartSpec, ChartType, Dataset};
pub use generator::{generate_report, ReportConfig, ReportError, SampleSource};
pub use render::{ChartImage, ChartRenderer, PngChartRenderer};
pub use writer::{ImagePlacement, PlacedImage, SpreadsheetWriter, Workbook, XlsxWriter};
