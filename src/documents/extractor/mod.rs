
use anyhow::{Context, Result, anyhow};
use std::fmt::Write as _;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, info};

/// Extensions read verbatim as UTF-8 text
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "py", "js", "html", "css", "json", "csv", "xml", "yaml", "yml",
];

/// How a file in the documents folder is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Pdf,
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Hidden,
    UnsupportedType,
}

impl IgnoreReason {
    #[inline]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Hidden => "hidden file",
            Self::UnsupportedType => "unsupported file type",
        }
    }
}

/// Classify a file by its name
#[inline]
pub fn classify(path: &Path) -> FileKind {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return FileKind::Ignored(IgnoreReason::UnsupportedType);
    };

    if name.starts_with('.') || name == "DS_Store" {
        return FileKind::Ignored(IgnoreReason::Hidden);
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("pdf") => FileKind::Pdf,
        Some(ext) if TEXT_EXTENSIONS.contains(&ext) => FileKind::Text,
        _ => FileKind::Ignored(IgnoreReason::UnsupportedType),
    }
}

/// Read a plain-text document
#[inline]
pub fn read_text_file(path: &Path) -> Result<String> {
    debug!("Reading text file: {}", path.display());
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Extract the text of a PDF, one `Page N:` section per non-empty page
#[inline]
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    info!("Processing PDF file: {}", path.display());

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    // pdf-extract panics on some malformed documents
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
    }))
    .map_err(|_| anyhow!("PDF extractor panicked on {}", path.display()))?
    .with_context(|| format!("Failed to extract text from {}", path.display()))?;

    debug!("Extracted {} pages from {}", pages.len(), path.display());
    Ok(format_pages(&pages))
}

/// Label every non-empty page with its 1-based page number
fn format_pages(pages: &[String]) -> String {
    let mut text = String::new();
    for (i, page) in pages.iter().enumerate() {
        if page.trim().is_empty() {
            continue;
        }
        let _ = write!(text, "\nPage {}:\n{}", i + 1, page);
    }
    text
}
