use crate::error::{Error, Result};
use crate::path_safety::validate_part_name;
use crate::split_size::SplitSize;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "index.json";
/// Every 7-Zip volume is named `<archive>.7z.NNN`.
pub const PART_MARKER: &str = ".7z.";

/// Contents of `index.json`.
///
/// Restoring only needs `parts`; the other fields are informational and may
/// be missing from hand-written manifests.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub original_name: String,
    #[serde(default, serialize_with = "iso_millis")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub split_size: String,
    /// Reassembly order. 7-Zip zero-pads volume numbers (`.001`, `.002`, ...),
    /// so sorting names lexicographically is the same as sorting by number.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub parts: Vec<String>,
}

fn iso_millis<S>(t: &Option<DateTime<Utc>>, s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match t {
        Some(t) => s.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => s.serialize_none(),
    }
}

// `"parts": null` reads as no parts
fn null_as_empty<'de, D>(d: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(d)?.unwrap_or_default())
}

impl Manifest {
    pub fn new(
        original_name: impl Into<String>,
        split_size: &SplitSize,
        parts: Vec<String>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            // stored with millisecond precision, keep the in-memory copy equal
            created_at: Some(Utc::now().trunc_subsecs(3)),
            split_size: split_size.as_str().to_string(),
            parts,
        }
    }
}

/// Volume files in `dir`, sorted by name.
pub fn list_parts(dir: &Path) -> Result<Vec<String>> {
    let mut parts = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.contains(PART_MARKER) {
            parts.push(name.to_string());
        }
    }
    parts.sort();
    debug!("found {} part(s) in {}", parts.len(), dir.display());
    Ok(parts)
}

/// Record the volumes 7-Zip left in `output_dir` as `index.json`.
pub fn write_manifest(
    output_dir: &Path,
    original_name: &str,
    split_size: &SplitSize,
) -> Result<Manifest> {
    let parts = list_parts(output_dir)?;
    if parts.is_empty() {
        return Err(Error::NoPartsProduced(output_dir.to_path_buf()));
    }
    let mani = Manifest::new(original_name, split_size, parts);
    let path = output_dir.join(MANIFEST_FILE);
    let mut out = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut out, &mani).map_err(std::io::Error::from)?;
    out.flush()?;
    info!("wrote {} with {} part(s)", path.display(), mani.parts.len());
    Ok(mani)
}

/// A manifest loaded from disk together with where it lives.
#[derive(Clone, Debug)]
pub struct ArchiveSet {
    folder: PathBuf,
    manifest: Manifest,
}

impl ArchiveSet {
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.folder.join(MANIFEST_FILE)
    }

    pub fn first_part(&self) -> PathBuf {
        self.folder.join(&self.manifest.parts[0])
    }

    pub fn part_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.manifest.parts.iter().map(|p| self.folder.join(p))
    }
}

/// Load and check `index.json` from `folder`.
///
/// Parts are re-sorted rather than trusted, every part must be a bare file
/// name, and the first volume must exist.
pub fn read_manifest(folder: &Path) -> Result<ArchiveSet> {
    let path = folder.join(MANIFEST_FILE);
    if !path.is_file() {
        return Err(Error::ManifestNotFound(path));
    }
    let bytes = fs::read(&path)?;
    let mut manifest: Manifest = serde_json::from_slice(&bytes)
        .map_err(|source| Error::ManifestCorrupt { path: path.clone(), source })?;
    if manifest.parts.is_empty() {
        return Err(Error::ManifestEmpty(path));
    }
    manifest.parts.sort();
    for p in &manifest.parts {
        validate_part_name(folder, p)?;
    }
    let set = ArchiveSet { folder: folder.to_path_buf(), manifest };
    let first = set.first_part();
    if !first.is_file() {
        return Err(Error::FirstPartMissing(first));
    }
    debug!("loaded {} ({} part(s))", path.display(), set.manifest.parts.len());
    Ok(set)
}
