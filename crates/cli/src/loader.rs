use anyhow::{bail, Context as AnyhowContext, Result};
use std::path::Path;

/// Plain-text formats read directly; anything else needs an external extractor.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    /// File name used as the chunk `source`
    pub source: String,
    pub text: String,
}

pub fn load_document(path: &Path) -> Result<LoadedDocument> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        bail!(
            "Unsupported file type '.{extension}' for {}. Supported: {}",
            path.display(),
            SUPPORTED_EXTENSIONS
                .iter()
                .map(|ext| format!(".{ext}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let source = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());

    Ok(LoadedDocument { source, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_markdown_with_file_name_source() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Guide.MD");
        std::fs::write(&path, "# Title\n\nBody text.").unwrap();

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.source, "Guide.MD");
        assert_eq!(doc.text, "# Title\n\nBody text.");
    }

    #[test]
    fn rejects_binary_formats() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported file type '.pdf'"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_document(&tmp.path().join("absent.txt")).is_err());
    }
}
