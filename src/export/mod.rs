use anyhow::{Context, Result};
use fs_err as fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::merge::{combine_for_preview, links_external_files};
use crate::wire::GeneratedSite;

pub const PREVIEW_FILE: &str = "wave-prototype.html";

#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: PathBuf,
    pub bytes_before: Option<u64>,
    pub bytes_after: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub bytes_written: u64,
    pub details: Vec<FileResult>,
}

impl ExportSummary {
    pub fn preview_path(&self) -> Option<&Path> {
        self.details
            .iter()
            .map(|d| d.path.as_path())
            .find(|p| p.file_name().map(|n| n == PREVIEW_FILE).unwrap_or(false))
    }
}

/// Writes the three files plus the self-contained preview. Empty css/js
/// files are skipped. Each write goes through a temp file in the same
/// directory and is renamed into place.
pub fn export_site(out_dir: &Path, site: &GeneratedSite) -> Result<ExportSummary> {
    fs::create_dir_all(out_dir)?;
    let has_assets = !site.css.trim().is_empty() || !site.js.trim().is_empty();
    if has_assets && !links_external_files(&site.html) {
        warn!("index.html does not link styles.css or script.js; open {PREVIEW_FILE} to see the full site");
    }
    let preview = combine_for_preview(site);
    let files: [(&str, &str); 4] = [
        ("index.html", &site.html),
        ("styles.css", &site.css),
        ("script.js", &site.js),
        (PREVIEW_FILE, &preview),
    ];

    let mut sum = ExportSummary::default();
    for (name, data) in files {
        if data.trim().is_empty() {
            sum.skipped += 1;
            continue;
        }
        let abs = out_dir.join(name);
        let before = if abs.exists() { Some(abs.metadata()?.len()) } else { None };
        write_atomic(out_dir, &abs, data).with_context(|| format!("writing {}", abs.display()))?;

        let after = data.len() as u64;
        if before.is_some() { sum.updated += 1 } else { sum.created += 1 }
        sum.bytes_written += after;
        sum.details.push(FileResult { path: abs, bytes_before: before, bytes_after: after });
    }
    Ok(sum)
}

fn write_atomic(dir: &Path, dest: &Path, data: &str) -> Result<()> {
    let tmp = NamedTempFile::new_in(dir)?;
    fs::write(tmp.path(), data)?;
    tmp.persist(dest)?;
    Ok(())
}
