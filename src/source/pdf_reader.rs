use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct PdfReader {
    path: PathBuf,
}

impl PdfReader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> Result<usize> {
        let output = Command::new("pdfinfo")
            .arg(&self.path)
            .output()
            .with_context(|| format!("failed to invoke pdfinfo on {}", self.path.display()))?;

        if !output.status.success() {
            anyhow::bail!("pdfinfo failed with status: {}", output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_page_count(&stdout)
            .with_context(|| format!("unexpected pdfinfo output for {}", self.path.display()))
    }
}

/// Extract the `Pages:` value from `pdfinfo` output.
pub fn parse_page_count(pdfinfo: &str) -> Result<usize> {
    let line = pdfinfo
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .ok_or_else(|| anyhow::anyhow!("no 'Pages:' line"))?;
    let value = line.trim();
    value
        .parse()
        .with_context(|| format!("failed to parse page count '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_pages_line() {
        let out = "Producer:       LibreOffice\nPages:          3\nEncrypted:      no\n";
        assert_eq!(parse_page_count(out).unwrap(), 3);
    }

    #[test]
    fn missing_or_bad_pages_line_is_an_error() {
        assert!(parse_page_count("Title: x\n").is_err());
        assert!(parse_page_count("Pages: many\n").is_err());
    }
}
