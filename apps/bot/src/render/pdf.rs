//! PDF output for a laid-out CV, via printpdf.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, Rgb};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::models::CvRecord;
use crate::render::font_metrics::FontWeight;
use crate::render::layout::{layout_cv, LineRole, PageStyle};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("failed to load font {path}: {source}")]
    Font {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the two font weights come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    /// PDF base-14 Helvetica. Limited to WinAnsi text.
    Builtin,
    /// TrueType files, for full Unicode output.
    External { regular: PathBuf, bold: PathBuf },
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    builtin: bool,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference, source: &FontSource) -> Result<Self, RenderError> {
        match source {
            FontSource::Builtin => Ok(Fonts {
                regular: doc
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(pdf_error)?,
                bold: doc
                    .add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(pdf_error)?,
                builtin: true,
            }),
            FontSource::External { regular, bold } => Ok(Fonts {
                regular: load_external(doc, regular)?,
                bold: load_external(doc, bold)?,
                builtin: false,
            }),
        }
    }

    fn for_weight(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

fn load_external(doc: &PdfDocumentReference, path: &Path) -> Result<IndirectFontRef, RenderError> {
    let file = File::open(path).map_err(|source| RenderError::Font {
        path: path.to_path_buf(),
        source,
    })?;
    doc.add_external_font(file).map_err(pdf_error)
}

fn pdf_error<E: std::fmt::Debug>(e: E) -> RenderError {
    RenderError::Pdf(format!("{e:?}"))
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

/// Maps text onto what the base-14 fonts can show: common typographic
/// punctuation becomes its ASCII look-alike, anything else non-ASCII becomes `?`.
pub fn to_builtin_charset(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' '..='~' => out.push(c),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2022}' | '\u{00B7}' => out.push('*'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2009}' | '\u{202F}' | '\t' => out.push(' '),
            _ => out.push('?'),
        }
    }
    out
}

/// Renders the CV into PDF bytes.
pub fn render_cv_pdf(
    record: &CvRecord,
    style: &PageStyle,
    font_source: &FontSource,
) -> Result<Vec<u8>, RenderError> {
    let pages = layout_cv(record, style);
    let width = pt_to_mm(style.page_width_pt);
    let height = pt_to_mm(style.page_height_pt);

    let title = format!("CV - {}", record.name);
    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "Layer 1".to_string());
    let fonts = Fonts::load(&doc, font_source)?;

    for (index, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, "Layer 1".to_string())
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for line in &page.lines {
            let text_style = match line.role {
                LineRole::Title => &style.title,
                LineRole::Heading => &style.heading,
                LineRole::Body => &style.body,
            };
            let (r, g, b) = text_style.color;
            layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));

            let text = if fonts.builtin {
                to_builtin_charset(&line.text)
            } else {
                line.text.clone()
            };
            layer.use_text(
                text,
                text_style.font_size_pt,
                pt_to_mm(line.x_pt),
                pt_to_mm(line.baseline_pt),
                fonts.for_weight(text_style.weight),
            );
        }
    }

    debug!("Rendered CV PDF with {} page(s)", pages.len());
    doc.save_to_bytes().map_err(pdf_error)
}

/// Renders the CV into a transient file inside `dir`.
///
/// The file is deleted when the returned handle is dropped, on every path.
pub fn write_cv_pdf(
    record: &CvRecord,
    style: &PageStyle,
    font_source: &FontSource,
    dir: &Path,
    user_id: i64,
) -> Result<NamedTempFile, RenderError> {
    let bytes = render_cv_pdf(record, style, font_source)?;
    let mut file = tempfile::Builder::new()
        .prefix(&format!("cv_{user_id}_"))
        .suffix(".pdf")
        .tempfile_in(dir)?;
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::default_page_style;

    fn record() -> CvRecord {
        CvRecord {
            name: "Ann Lee".to_string(),
            intro: "Backend engineer \u{2014} \u{201C}reliable\u{201D}.".to_string(),
            experience: "5 years at Acme.".to_string(),
            education: "BSc Computer Science.".to_string(),
            tech_stack: vec!["Go".to_string(), "SQL".to_string()],
            summary: "Strong communicator.".to_string(),
            wishes: "A kind team.".to_string(),
        }
    }

    #[test]
    fn test_builtin_charset_keeps_ascii_and_maps_punctuation() {
        assert_eq!(to_builtin_charset("Go, SQL & C++"), "Go, SQL & C++");
        assert_eq!(
            to_builtin_charset("\u{201C}hi\u{201D} \u{2014} it\u{2019}s\u{2026}"),
            "\"hi\" - it's..."
        );
        assert_eq!(to_builtin_charset("Анна"), "????");
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let bytes = render_cv_pdf(&record(), &default_page_style(), &FontSource::Builtin).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn test_missing_external_font_is_reported() {
        let fonts = FontSource::External {
            regular: PathBuf::from("/nonexistent/regular.ttf"),
            bold: PathBuf::from("/nonexistent/bold.ttf"),
        };
        let err = render_cv_pdf(&record(), &default_page_style(), &fonts).unwrap_err();
        assert!(matches!(err, RenderError::Font { .. }));
    }

    #[test]
    fn test_transient_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_cv_pdf(
            &record(),
            &default_page_style(),
            &FontSource::Builtin,
            dir.path(),
            42,
        )
        .unwrap();

        let path = file.path().to_path_buf();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("cv_42_") && name.ends_with(".pdf"));
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));

        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_render_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = FontSource::External {
            regular: PathBuf::from("/nonexistent/regular.ttf"),
            bold: PathBuf::from("/nonexistent/bold.ttf"),
        };
        assert!(write_cv_pdf(&record(), &default_page_style(), &fonts, dir.path(), 7).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
