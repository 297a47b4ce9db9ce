//! PDF rendering.
//!
//! [`ReportRenderer`] maps a [`PdfDocument`] to PDF bytes and nothing else:
//! no I/O, no shared state. [`SimplePdfRenderer`] is the built-in
//! implementation, a plain paginated text layout using the standard
//! Helvetica font so no font files need to be embedded.

use std::io::Write;

use crate::error::AppError;
use crate::models::{Report, WorkshopView};

pub const REPORT_TITLE: &str = "Reporte de Actividades";

/// One line of the report data source: a workshop together with its report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfRow {
    pub report_id: Option<i32>,
    pub report_year: i32,
    pub trimester: String,
    /// Link to the description document, as stored on the report
    pub report_description: Option<String>,
    pub schedule: Option<String>,
    pub status: Option<String>,
    pub workshop_id: i32,
    pub workshop_name: Option<String>,
    pub workshop_description: Option<String>,
    pub image_urls: Vec<String>,
}

impl PdfRow {
    pub fn new(report: &Report, workshop: &WorkshopView) -> Self {
        Self {
            report_id: report.id,
            report_year: report.year,
            trimester: report.trimester.clone(),
            report_description: report.description_url.clone(),
            schedule: report.schedule_url.clone(),
            status: report.status.clone(),
            workshop_id: workshop.id,
            workshop_name: workshop.workshop_name.clone(),
            workshop_description: workshop.description.clone(),
            image_urls: workshop.image_urls.clone(),
        }
    }
}

/// Everything the renderer gets to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocument {
    pub title: String,
    pub report: Report,
    /// Fetched description HTML; empty when unavailable
    pub description_html: String,
    pub rows: Vec<PdfRow>,
}

impl PdfDocument {
    pub fn new(report: Report, workshops: &[WorkshopView], description_html: String) -> Self {
        let rows = workshops.iter().map(|w| PdfRow::new(&report, w)).collect();
        Self {
            title: REPORT_TITLE.to_string(),
            report,
            description_html,
            rows,
        }
    }
}

/// Failure at one stage of rendering. Partial output is never returned.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(String),
    #[error("fill error: {0}")]
    Fill(String),
    #[error("export error: {0}")]
    Export(String),
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Render(err.to_string())
    }
}

/// Pure mapping from document to PDF bytes.
pub trait ReportRenderer: Send + Sync + 'static {
    fn render(&self, document: &PdfDocument) -> Result<Vec<u8>, RenderError>;
}

/// A4 text renderer.
#[derive(Debug, Clone)]
pub struct SimplePdfRenderer {
    font_size: u32,
    leading: u32,
    margin: u32,
    wrap_at: usize,
}

impl Default for SimplePdfRenderer {
    fn default() -> Self {
        Self {
            font_size: 10,
            leading: 14,
            margin: 50,
            wrap_at: 95,
        }
    }
}

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;

impl SimplePdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lines_per_page(&self) -> usize {
        ((PAGE_HEIGHT - 2 * self.margin) / self.leading) as usize
    }

    /// Lay the document out as plain text lines.
    fn fill(&self, document: &PdfDocument) -> Result<Vec<String>, RenderError> {
        let report = &document.report;
        let mut lines = vec![document.title.clone(), String::new()];

        lines.push(format!(
            "Reporte {}  |  Año {}  |  Trimestre {}  |  Estado {}",
            report.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
            report.year,
            report.trimester,
            report.status.as_deref().unwrap_or("-"),
        ));
        if let Some(schedule) = &report.schedule_url {
            lines.push(format!("Cronograma: {}", schedule));
        }
        lines.push(String::new());

        let description = html_to_text(&document.description_html);
        if !description.is_empty() {
            lines.push("Descripción".to_string());
            for paragraph in description.lines() {
                lines.extend(wrap(paragraph, self.wrap_at));
            }
            lines.push(String::new());
        }

        lines.push(format!("Talleres ({})", document.rows.len()));
        for row in &document.rows {
            if row.report_id != report.id {
                return Err(RenderError::Fill(format!(
                    "row for workshop {} belongs to another report",
                    row.workshop_id
                )));
            }
            lines.push(String::new());
            lines.push(format!(
                "- {}",
                row.workshop_name.as_deref().unwrap_or("(sin nombre)")
            ));
            if let Some(text) = &row.workshop_description {
                for paragraph in text.lines() {
                    lines.extend(wrap(paragraph, self.wrap_at).into_iter().map(|l| format!("  {}", l)));
                }
            }
            for url in &row.image_urls {
                lines.push(format!("  Imagen: {}", url));
            }
        }

        Ok(lines)
    }

    fn page_stream(&self, lines: &[String]) -> Vec<u8> {
        let top = PAGE_HEIGHT - self.margin;
        let mut stream = format!(
            "BT\n/F1 {} Tf\n{} TL\n{} {} Td\n",
            self.font_size, self.leading, self.margin, top
        )
        .into_bytes();
        for line in lines {
            stream.push(b'(');
            stream.extend(encode_text(line));
            stream.extend_from_slice(b") Tj T*\n");
        }
        stream.extend_from_slice(b"ET\n");
        stream
    }

    fn export(&self, pages: Vec<Vec<u8>>) -> Result<Vec<u8>, RenderError> {
        let export_err = |e: std::io::Error| RenderError::Export(e.to_string());

        // 1 catalog, 2 page tree, 3 font, then a page and a content stream per page
        let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
        let mut objects: Vec<Vec<u8>> = Vec::with_capacity(3 + 2 * pages.len());
        objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        objects.push(format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()).into_bytes());
        objects.push(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        );
        for (page_id, content) in page_ids.iter().zip(pages) {
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                    PAGE_WIDTH,
                    PAGE_HEIGHT,
                    page_id + 1
                )
                .into_bytes(),
            );
            let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
            stream.extend(content);
            stream.extend_from_slice(b"\nendstream");
            objects.push(stream);
        }

        let mut out: Vec<u8> = Vec::new();
        out.write_all(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n").map_err(export_err)?;
        let mut offsets = Vec::with_capacity(objects.len());
        for (index, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            write!(out, "{} 0 obj\n", index + 1).map_err(export_err)?;
            out.write_all(body).map_err(export_err)?;
            out.write_all(b"\nendobj\n").map_err(export_err)?;
        }

        let xref_at = out.len();
        write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).map_err(export_err)?;
        for offset in offsets {
            write!(out, "{:010} 00000 n \n", offset).map_err(export_err)?;
        }
        write!(
            out,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .map_err(export_err)?;

        Ok(out)
    }
}

impl ReportRenderer for SimplePdfRenderer {
    fn render(&self, document: &PdfDocument) -> Result<Vec<u8>, RenderError> {
        if document.title.trim().is_empty() {
            return Err(RenderError::Template("report title is empty".to_string()));
        }

        let lines = self.fill(document)?;
        let pages = lines
            .chunks(self.lines_per_page())
            .map(|chunk| self.page_stream(chunk))
            .collect();
        self.export(pages)
    }
}

/// Escape a line for a PDF string literal, mapping to WinAnsi (Latin-1 range).
fn encode_text(line: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\t' => out.push(b' '),
            c if (c as u32) >= 0x20 && (c as u32) <= 0x7E => out.push(c as u8),
            c if (c as u32) >= 0xA0 && (c as u32) <= 0xFF => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        if current.is_empty() {
            current = word;
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Reduce an HTML fragment to text, one paragraph per line.
fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('>') else {
            rest = "";
            break;
        };
        let tag = rest[open + 1..open + close]
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        if matches!(tag.as_str(), "p" | "br" | "div" | "li" | "h1" | "h2" | "h3" | "tr") {
            text.push('\n');
        }
        rest = &rest[open + close + 1..];
    }
    text.push_str(rest);

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
