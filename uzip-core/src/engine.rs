use crate::error::{Error, Result};
use crate::progress::ProgressBar;
use crate::split_size::SplitSize;
use log::debug;
use std::ffi::{OsStr, OsString};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// 7-Zip executable expected next to the working directory.
#[cfg(windows)]
pub const DEFAULT_ENGINE: &str = "./7-Zip/7z.exe";
#[cfg(not(windows))]
pub const DEFAULT_ENGINE: &str = "./7-Zip/7z";

/// Flags shared by every invocation: progress to stdout, verbose log.
const PROGRESS_FLAGS: [&str; 2] = ["-bsp1", "-bb3"];

/// An external archiver that can be driven with an argument vector.
pub trait Engine {
    /// Run one operation, passing each chunk of stdout to `on_chunk`.
    /// Returns the exit code, `None` if the process died from a signal.
    fn invoke(&self, args: &[OsString], on_chunk: &mut dyn FnMut(&str)) -> Result<Option<i32>>;
}

/// The 7-Zip command-line executable run as a child process.
#[derive(Clone, Debug)]
pub struct SevenZip {
    program: PathBuf,
    working_dir: Option<PathBuf>,
}

impl SevenZip {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), working_dir: None }
    }

    /// Directory the child runs in; extraction lands here.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Engine for SevenZip {
    fn invoke(&self, args: &[OsString], on_chunk: &mut dyn FnMut(&str)) -> Result<Option<i32>> {
        if !self.program.is_file() {
            return Err(Error::EngineNotFound(self.program.clone()));
        }
        debug!("spawning {} {:?}", self.program.display(), args);
        let mut cmd = Command::new(&self.program);
        cmd.args(args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::null());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        let mut child = cmd.spawn().map_err(Error::EngineLaunchFailed)?;

        if let Some(mut stdout) = child.stdout.take() {
            // 7-Zip redraws its percentage with backspaces, not newlines,
            // so read raw chunks rather than lines.
            let mut buf = [0u8; 4096];
            loop {
                let n = match stdout.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(e.into());
                    }
                };
                on_chunk(&String::from_utf8_lossy(&buf[..n]));
            }
        }
        let status = child.wait()?;
        debug!("7-Zip exited with {status}");
        Ok(status.code())
    }
}

/// Run one engine operation while drawing its progress.
///
/// The bar line is terminated when the child exits, whatever the outcome.
/// Only exit code 0 counts as success.
pub fn run_engine<E, W>(engine: &E, args: &[OsString], bar: &mut ProgressBar<W>) -> Result<()>
where
    E: Engine + ?Sized,
    W: Write,
{
    let mut draw_err = None;
    let code = engine.invoke(args, &mut |chunk| {
        if draw_err.is_none() {
            if let Err(e) = bar.feed(chunk) {
                draw_err = Some(e);
            }
        }
    })?;
    bar.finish()?;
    if let Some(e) = draw_err {
        return Err(e.into());
    }
    match code {
        Some(0) => Ok(()),
        code => Err(Error::EngineExecutionFailed { code }),
    }
}

/// `a` (add) with the fixed LZMA2 ultra profile, split into volumes.
///
/// The archive is named after the source folder: `<output_dir>/<name>.7z`,
/// and 7-Zip appends `.001`, `.002`, ... to each volume.
pub fn compress_args(
    input: &Path,
    output_dir: &Path,
    archive_name: &OsStr,
    split: &SplitSize,
) -> Vec<OsString> {
    let mut archive = archive_name.to_os_string();
    archive.push(".7z");
    let mut args: Vec<OsString> = ["a", "-t7z", "-mx=9", "-m0=lzma2", "-md=512m", "-ms=on"]
        .iter()
        .map(OsString::from)
        .collect();
    args.extend(PROGRESS_FLAGS.iter().map(OsString::from));
    args.push(format!("-v{}", split.as_str()).into());
    args.push(output_dir.join(archive).into_os_string());
    args.push(input.as_os_str().to_os_string());
    args
}

/// `x` (extract with full paths) starting from the first volume.
pub fn extract_args(first_part: &Path) -> Vec<OsString> {
    let mut args = vec![OsString::from("x"), first_part.as_os_str().to_os_string()];
    args.extend(PROGRESS_FLAGS.iter().map(OsString::from));
    args
}
