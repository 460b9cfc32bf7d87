//! Document export
//!
//! Writes the final report as Markdown, as a standalone HTML page, or as a
//! PDF produced by an external HTML-to-PDF renderer (WeasyPrint by default).

use pulldown_cmark::{html, Options, Parser};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::core::config::{ExportConfig, ExportFormat, ReportConfig, TextDirection};
use crate::core::{Config, FinalReport, Result, RihlaError};

/// Renders and writes report documents
#[derive(Debug, Clone)]
pub struct Exporter {
    report: ReportConfig,
    export: ExportConfig,
}

const STYLESHEET: &str = r#"
        body {
            text-align: start;
            font-family: 'Amiri', 'Cairo', 'Tahoma', sans-serif;
            font-size: 14px;
            line-height: 1.6;
            margin: 2rem;
        }
        h1, h2, h3, h4 {
            color: #1e3a8a;
        }
        img {
            max-width: 100%;
            height: auto;
            display: block;
            margin: 1rem auto;
        }
        table {
            border-collapse: collapse;
        }
        td, th {
            border: 1px solid #e5e7eb;
            padding: 0.25rem 0.5rem;
        }"#;

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render Markdown to an HTML fragment
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

impl Exporter {
    pub fn new(report: ReportConfig, export: ExportConfig) -> Self {
        Self { report, export }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.report.clone(), config.export.clone())
    }

    /// File name without extension: prefix plus the destination, lowercased,
    /// spaces turned into underscores and path separators removed
    pub fn file_stem(&self, destination: &str) -> String {
        let place: String = destination
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '/' | '\\' | ':' | '\0'))
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();

        match (self.export.file_prefix.is_empty(), place.is_empty()) {
            (true, _) => place,
            (false, true) => self.export.file_prefix.clone(),
            (false, false) => format!("{}_{}", self.export.file_prefix, place),
        }
    }

    /// A complete, styled HTML document for the report
    pub fn render_html(&self, report: &FinalReport) -> String {
        let dir = match self.report.direction {
            TextDirection::Rtl => "rtl",
            TextDirection::Ltr => "ltr",
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="{lang}" dir="{dir}">
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>{style}
    </style>
</head>
<body>
{body}</body>
</html>
"#,
            lang = escape_html(&self.report.lang_tag),
            dir = dir,
            title = escape_html(&report.destination),
            style = STYLESHEET,
            body = markdown_to_html(&report.body),
        )
    }

    /// Render the report to PDF bytes through the external renderer
    pub async fn render_pdf(&self, report: &FinalReport) -> Result<Vec<u8>> {
        let input = tempfile::Builder::new()
            .prefix("rihla-")
            .suffix(".html")
            .tempfile()?;
        tokio::fs::write(input.path(), self.render_html(report)).await?;

        let output = tempfile::Builder::new()
            .prefix("rihla-")
            .suffix(".pdf")
            .tempfile()?;

        let command = &self.export.pdf_command;
        tracing::debug!(command = %command, "Rendering PDF");

        let result = Command::new(command)
            .arg(input.path())
            .arg(output.path())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RihlaError::render(format!(
                        "PDF renderer '{}' not found. Install it or set export.pdf_command",
                        command
                    ))
                } else {
                    RihlaError::render(format!("Failed to run '{}': {}", command, e))
                }
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(RihlaError::render(format!(
                "'{}' failed ({}): {}",
                command,
                result.status,
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(output.path()).await?;
        if bytes.is_empty() {
            return Err(RihlaError::render(format!("'{}' produced an empty PDF", command)));
        }
        Ok(bytes)
    }

    /// Render the report in one format
    pub async fn render(&self, report: &FinalReport, format: ExportFormat) -> Result<Vec<u8>> {
        match format {
            ExportFormat::Markdown => Ok(report.body.clone().into_bytes()),
            ExportFormat::Html => Ok(self.render_html(report).into_bytes()),
            ExportFormat::Pdf => self.render_pdf(report).await,
        }
    }

    /// Render and write the report into `dir`, returning the file path
    pub async fn export_to(&self, report: &FinalReport, format: ExportFormat, dir: &Path) -> Result<PathBuf> {
        let bytes = self.render(report, format).await?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!(
            "{}.{}",
            self.file_stem(&report.destination),
            format.extension()
        ));
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(path = %path.display(), ?format, "Exported travel plan");
        Ok(path)
    }

    /// Write every configured format; one failing format does not stop the others
    pub async fn export_all(&self, report: &FinalReport) -> Vec<(ExportFormat, Result<PathBuf>)> {
        let mut results = Vec::with_capacity(self.export.formats.len());
        for format in &self.export.formats {
            let outcome = self.export_to(report, *format, &self.export.output_dir).await;
            if let Err(ref e) = outcome {
                tracing::error!(?format, error = %e, "Export failed");
            }
            results.push((*format, outcome));
        }
        results
    }
}
