use std::io::{self, Write};

pub const BAR_WIDTH: usize = 20;
const FILLED: char = '█';
const EMPTY: char = '░';

/// Find the first `NN%` in a chunk of 7-Zip output.
///
/// Only the first match counts; chunks without one are ignored.
pub fn parse_percent(chunk: &str) -> Option<u8> {
    let bytes = chunk.as_bytes();
    let mut start = None;
    for (i, &b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            start.get_or_insert(i);
            continue;
        }
        if let Some(s) = start.take() {
            if b == b'%' {
                let v: u64 = chunk[s..i].parse().unwrap_or(u64::MAX);
                return Some(v.min(100) as u8);
            }
        }
    }
    None
}

/// Bar cells for a percentage, rounded to the nearest cell.
pub fn render_bar(percent: u8) -> String {
    let percent = percent.min(100) as usize;
    let filled = (percent * BAR_WIDTH + 50) / 100;
    let mut s = String::with_capacity(BAR_WIDTH * 3);
    s.extend(std::iter::repeat(FILLED).take(filled));
    s.extend(std::iter::repeat(EMPTY).take(BAR_WIDTH - filled));
    s
}

/// Single-line progress bar rewritten in place with `\r`.
pub struct ProgressBar<W: Write> {
    out: W,
    enabled: bool,
    last: Option<u8>,
}

impl<W: Write> ProgressBar<W> {
    pub fn new(out: W) -> Self {
        Self { out, enabled: true, last: None }
    }

    /// A bar that parses but never draws.
    pub fn hidden(out: W) -> Self {
        Self { out, enabled: false, last: None }
    }

    pub fn last_percent(&self) -> Option<u8> {
        self.last
    }

    /// Feed one chunk of engine output; redraws if it carries a percentage.
    pub fn feed(&mut self, chunk: &str) -> io::Result<()> {
        match parse_percent(chunk) {
            Some(p) => self.set(p),
            None => Ok(()),
        }
    }

    pub fn set(&mut self, percent: u8) -> io::Result<()> {
        let percent = percent.min(100);
        self.last = Some(percent);
        if !self.enabled {
            return Ok(());
        }
        write!(self.out, "\r[{}] {}%", render_bar(percent), percent)?;
        self.out.flush()
    }

    /// Terminate the bar line once the engine has exited.
    pub fn finish(&mut self) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
