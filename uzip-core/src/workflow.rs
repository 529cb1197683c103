//! Compress and restore runs, from validated arguments to cleanup.

use crate::engine::{compress_args, extract_args, run_engine, Engine, SevenZip, DEFAULT_ENGINE};
use crate::error::{Error, Result};
use crate::manifest::{read_manifest, write_manifest, ArchiveSet, Manifest};
use crate::path_safety::normalize;
use crate::progress::ProgressBar;
use crate::prompt::Confirm;
use crate::split_size::SplitSize;
use log::{info, warn};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const CLEANUP_QUESTION: &str = "Delete split parts? (y/n): ";

/// Everything a run needs from its surroundings.
#[derive(Clone, Debug)]
pub struct Config {
    /// 7-Zip executable.
    pub engine: PathBuf,
    /// Relative paths (and the engine's working directory) resolve here.
    pub base_dir: PathBuf,
    pub show_progress: bool,
}

impl Config {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self { engine: base_dir.join(DEFAULT_ENGINE), base_dir, show_progress: true }
    }

    pub fn with_engine(mut self, engine: impl AsRef<Path>) -> Self {
        self.engine = self.base_dir.join(engine);
        self
    }

    pub fn seven_zip(&self) -> SevenZip {
        SevenZip::new(&self.engine).working_dir(&self.base_dir)
    }

    fn bar<W: Write>(&self, out: W) -> ProgressBar<W> {
        if self.show_progress {
            ProgressBar::new(out)
        } else {
            ProgressBar::hidden(out)
        }
    }
}

fn missing_arguments() -> Error {
    Error::Argument("Missing arguments.".to_string())
}

#[derive(Clone, Debug)]
pub struct CompressRequest {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub split: SplitSize,
}

impl CompressRequest {
    /// All three arguments are required; the split size is checked before
    /// the input is looked up on disk.
    pub fn parse(
        cfg: &Config,
        input: Option<&str>,
        output: Option<&str>,
        split: Option<&str>,
    ) -> Result<Self> {
        let input = input.and_then(|s| normalize(&cfg.base_dir, s));
        let output_dir = output.and_then(|s| normalize(&cfg.base_dir, s));
        let split = split.filter(|s| !s.trim().is_empty());
        let (Some(input), Some(output_dir), Some(split)) = (input, output_dir, split) else {
            return Err(missing_arguments());
        };
        let split = SplitSize::parse(split)?;
        Ok(Self { input, output_dir, split })
    }

    /// Folder name reused as the archive base name.
    pub fn archive_name(&self) -> Result<&std::ffi::OsStr> {
        self.input.file_name().ok_or_else(|| {
            Error::Argument(format!("Cannot name an archive after {}", self.input.display()))
        })
    }
}

#[derive(Clone, Debug)]
pub struct RestoreRequest {
    pub folder: PathBuf,
}

impl RestoreRequest {
    pub fn parse(cfg: &Config, folder: Option<&str>) -> Result<Self> {
        let folder = folder
            .and_then(|s| normalize(&cfg.base_dir, s))
            .ok_or_else(|| Error::Argument("Missing folder argument.".to_string()))?;
        Ok(Self { folder })
    }
}

/// Compress `req.input` into volumes under `req.output_dir` and record them.
///
/// No manifest is written unless 7-Zip exits cleanly and left at least one
/// volume behind.
pub fn compress<E, W>(
    cfg: &Config,
    engine: &E,
    req: &CompressRequest,
    console: &mut W,
) -> Result<Manifest>
where
    E: Engine + ?Sized,
    W: Write,
{
    if !req.input.exists() {
        return Err(Error::PathNotFound { what: "Input folder", path: req.input.clone() });
    }
    let name = req.archive_name()?;
    fs::create_dir_all(&req.output_dir)?;

    writeln!(console, "🗜 Compressing...")?;
    let args = compress_args(&req.input, &req.output_dir, name, &req.split);
    run_engine(engine, &args, &mut cfg.bar(&mut *console))?;

    let manifest = write_manifest(&req.output_dir, &name.to_string_lossy(), &req.split)?;
    writeln!(console, "✅ Compression complete")?;
    Ok(manifest)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cleanup {
    /// Parts and manifest removed; `parts` counts the files actually deleted.
    Deleted { parts: usize },
    Kept,
}

/// Extract the archive described by `req.folder/index.json`, then offer to
/// delete the volumes.
pub fn restore<E, C, W>(
    cfg: &Config,
    engine: &E,
    prompt: &mut C,
    req: &RestoreRequest,
    console: &mut W,
) -> Result<Cleanup>
where
    E: Engine + ?Sized,
    C: Confirm + ?Sized,
    W: Write,
{
    let set = read_manifest(&req.folder)?;

    writeln!(console, "♻ Restoring...")?;
    let args = extract_args(&set.first_part());
    run_engine(engine, &args, &mut cfg.bar(&mut *console))?;
    writeln!(console, "✅ Restore complete")?;

    if !prompt.confirm(CLEANUP_QUESTION)? {
        writeln!(console, "📦 Parts kept")?;
        return Ok(Cleanup::Kept);
    }
    let parts = delete_parts(&set)?;
    writeln!(console, "🧹 Parts deleted")?;
    Ok(Cleanup::Deleted { parts })
}

/// Remove every listed volume, then the manifest itself.
///
/// Volumes already gone are skipped. Any other failure stops the cleanup.
pub fn delete_parts(set: &ArchiveSet) -> Result<usize> {
    let mut removed = 0;
    for path in set.part_paths() {
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("{} already gone, skipping", path.display());
            }
            Err(source) => return Err(Error::Cleanup { path, source }),
        }
    }
    let manifest = set.manifest_path();
    fs::remove_file(&manifest).map_err(|source| Error::Cleanup { path: manifest.clone(), source })?;
    info!("removed {} part(s) and {}", removed, manifest.display());
    Ok(removed)
}
