// ============================================================
// Layer 4 — Paired Directory Loader
// ============================================================
// Reads two directories (images and masks), sorts each listing
// by file name and pairs them by position.
//
// Nothing on disk ties an image to its mask except order, so
// the loader checks what it can:
//   - both listings have the same length
//   - the pair at each position shares a file stem
// Violations are logged as warnings. With `strict` set they
// are errors instead.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::sample_pair::{file_stem, SamplePair};
use crate::domain::traits::SampleSource;

/// Pairs `images_dir/*` with `masks_dir/*` by sorted position.
pub struct PairedDirLoader {
    images_dir: PathBuf,
    masks_dir:  PathBuf,
    strict:     bool,
}

impl PairedDirLoader {
    pub fn new(images_dir: impl Into<PathBuf>, masks_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
            masks_dir:  masks_dir.into(),
            strict:     false,
        }
    }

    /// Turn pairing warnings into errors.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn report(&self, message: String) -> Result<()> {
        if self.strict {
            bail!(message);
        }
        tracing::warn!("{message}");
        Ok(())
    }
}

impl SampleSource for PairedDirLoader {
    fn load_pairs(&self) -> Result<Vec<SamplePair>> {
        let images = sorted_files(&self.images_dir)?;
        let masks  = sorted_files(&self.masks_dir)?;

        if images.is_empty() {
            bail!("No samples found in '{}'", self.images_dir.display());
        }

        if images.len() != masks.len() {
            self.report(format!(
                "Found {} images but {} masks; pairing the first {} by sorted order",
                images.len(),
                masks.len(),
                images.len().min(masks.len()),
            ))?;
        }

        let pairs: Vec<SamplePair> = images
            .into_iter()
            .zip(masks)
            .map(|(image, mask)| SamplePair::new(image, mask))
            .collect();

        let mismatched: Vec<&SamplePair> = pairs.iter().filter(|p| !p.stems_match()).collect();
        if let Some(first) = mismatched.first() {
            self.report(format!(
                "{} of {} pairs have different file stems (first: '{}' vs '{}')",
                mismatched.len(),
                pairs.len(),
                file_stem(&first.image),
                file_stem(&first.mask),
            ))?;
        }

        tracing::info!(
            "Paired {} samples from '{}' and '{}'",
            pairs.len(),
            self.images_dir.display(),
            self.masks_dir.display()
        );
        Ok(pairs)
    }
}

/// Regular files directly inside `dir`, sorted by file name.
fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
