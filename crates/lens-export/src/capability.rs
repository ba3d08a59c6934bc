//! Which report formats this build can produce.

use crate::format::ExportFormat;
use serde::Serialize;

/// Renderers compiled into this build.
///
/// Plain-text formats are always present. `xlsx` depends on the `xlsx`
/// cargo feature. `pdf`, `pptx` and `docx` have no backend yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub csv: bool,
    pub json: bool,
    pub xlsx: bool,
    pub pdf: bool,
    pub pptx: bool,
    pub docx: bool,
}

impl Capabilities {
    pub fn detect() -> Self {
        Self {
            csv: true,
            json: true,
            xlsx: cfg!(feature = "xlsx"),
            pdf: false,
            pptx: false,
            docx: false,
        }
    }

    pub fn supports(&self, format: ExportFormat) -> bool {
        match format {
            ExportFormat::Csv => self.csv,
            ExportFormat::Json => self.json,
            ExportFormat::Xlsx => self.xlsx,
            ExportFormat::Pdf => self.pdf,
            ExportFormat::Pptx => self.pptx,
            ExportFormat::Docx => self.docx,
        }
    }

    /// Formats this build can render, in declaration order.
    pub fn available(&self) -> Vec<ExportFormat> {
        ExportFormat::ALL
            .into_iter()
            .filter(|format| self.supports(*format))
            .collect()
    }

    /// What a caller can do about a missing format.
    pub fn hint(format: ExportFormat) -> &'static str {
        match format {
            ExportFormat::Xlsx => "rebuild lens-export with the `xlsx` feature enabled",
            ExportFormat::Pdf => "no PDF backend is compiled into this build; export xlsx or csv instead",
            ExportFormat::Pptx => {
                "no PowerPoint backend is compiled into this build; export xlsx or csv instead"
            }
            ExportFormat::Docx => {
                "no Word backend is compiled into this build; export xlsx or csv instead"
            }
            ExportFormat::Csv | ExportFormat::Json => "always available",
        }
    }
}
