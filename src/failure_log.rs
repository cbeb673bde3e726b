//! The failure log.
//!
//! The first pass appends one line per video it could not measure:
//!
//! ```text
//! Error processing v_Archery_x1.mp4:No valid frame found in ... (50 frames tried)
//! ```
//!
//! The file is opened in append mode and never truncated, so entries repeat
//! across runs. The repair pass reads it back with [`read_failed_videos`],
//! recovering each video name from the `v_` marker up to the `.mp4` suffix.

use std::{
    fmt::Display,
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::error::AspectError;

const NAME_MARKER: &str = "v_";
const NAME_SUFFIX: &str = ".mp4";

/// A video named in the failure log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedVideo {
    /// File name, e.g. `v_Archery_x1.mp4`.
    pub video: String,
    /// Class derived from the name: its second `_`-separated component.
    pub class: String,
}

/// Append handle on the failure log.
pub struct FailureLogWriter {
    writer: BufWriter<File>,
}

impl FailureLogWriter {
    /// Open `path` for appending, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AspectError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Append an entry for `video` and flush it to disk.
    pub fn record(&mut self, video: &str, error: &dyn Display) -> Result<(), AspectError> {
        writeln!(self.writer, "{}", format_failure_line(video, error))?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Format one failure log line. Newlines inside the error are flattened so
/// every entry stays on one line.
pub fn format_failure_line(video: &str, error: &dyn Display) -> String {
    let message = error.to_string().replace(['\r', '\n'], " ");
    format!("Error processing {video}:{message}")
}

/// Recover the video named in a failure log line.
///
/// Returns `None` when the line has no `v_` marker, no `.mp4` suffix after
/// it, or a name without a class component.
///
/// # Example
///
/// ```
/// use aspectscan::failure_log::parse_failure_line;
///
/// let entry = parse_failure_line("Error processing v_Archery_x1.mp4:I/O error").unwrap();
/// assert_eq!(entry.video, "v_Archery_x1.mp4");
/// assert_eq!(entry.class, "Archery");
/// ```
pub fn parse_failure_line(line: &str) -> Option<FailedVideo> {
    let start = line.find(NAME_MARKER)?;
    let length = line[start..].find(NAME_SUFFIX)?;
    let video = format!("{}{NAME_SUFFIX}", &line[start..start + length]);
    let class = video.split('_').nth(1)?.to_string();
    if class.is_empty() {
        return None;
    }
    Some(FailedVideo { video, class })
}

/// Read every entry of the failure log, in file order, without duplicates.
///
/// A missing log means nothing failed and yields an empty list. Blank lines
/// are ignored.
///
/// # Errors
///
/// Returns [`AspectError::MalformedFailureEntry`] for a line that names no
/// video.
pub fn read_failed_videos<P: AsRef<Path>>(path: P) -> Result<Vec<FailedVideo>, AspectError> {
    let path = path.as_ref();
    if !path.exists() {
        log::warn!("Failure log {} does not exist", path.display());
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut entries: Vec<FailedVideo> = Vec::new();
    let mut line_count = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        line_count += 1;
        let entry = parse_failure_line(&line).ok_or_else(|| AspectError::MalformedFailureEntry {
            line_number: index + 1,
            line: line.clone(),
        })?;
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }

    log::debug!(
        "Read {} distinct failed videos from {} entries in {}",
        entries.len(),
        line_count,
        path.display()
    );
    Ok(entries)
}
