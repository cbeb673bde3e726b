//! Duration and dataset tables.
//!
//! The duration table lists every video with its class, duration, subset and
//! label. [`Dataset::load_qualified`] keeps the qualifying rows and turns
//! them into [`VideoRecord`]s with unset ratios; [`Dataset::write`] and
//! [`Dataset::read`] persist the dataset table between passes.
//!
//! Columns other than the required ones are carried through untouched,
//! except `subset`, which is dropped once the rows are qualified.

use std::{collections::HashMap, path::Path};

use csv::{ReaderBuilder, StringRecord, Writer};

use crate::{
    configuration::QualificationCriteria,
    error::AspectError,
    ratio::{AspectRatio, RatioPair},
};

const VIDEO: &str = "video";
const CLASS: &str = "class";
const DURATION: &str = "duration";
const SUBSET: &str = "subset";
const LABEL: &str = "label";
const FRAME_RATIO: &str = "frame_ratio";
const CROP_RATIO: &str = "crop_ratio";

/// Leading columns of a dataset table, in output order.
pub const DATASET_COLUMNS: [&str; 6] = [VIDEO, CLASS, DURATION, LABEL, FRAME_RATIO, CROP_RATIO];

/// One video of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    /// File name, e.g. `v_Archery_x1.mp4`.
    pub video: String,
    /// Class label, also the sub-directory of the dataset root.
    pub class: String,
    /// Clip duration in seconds.
    pub duration: f64,
    /// Integer label.
    pub label: i64,
    /// Measured ratios, [`RatioPair::UNSET`] until computed.
    pub ratios: RatioPair,
    /// Values of the retained extra columns, aligned with
    /// [`Dataset::extra_columns`].
    pub extra: Vec<String>,
}

/// An ordered table of [`VideoRecord`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    extra_columns: Vec<String>,
    records: Vec<VideoRecord>,
}

/// Header lookup for one table.
struct ColumnIndex<'a> {
    positions: HashMap<&'a str, usize>,
    path: &'a Path,
}

impl<'a> ColumnIndex<'a> {
    fn new(headers: &'a StringRecord, path: &'a Path) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(position, name)| (name.trim(), position))
            .collect();
        Self { positions, path }
    }

    fn require(&self, column: &str) -> Result<usize, AspectError> {
        self.positions
            .get(column)
            .copied()
            .ok_or_else(|| AspectError::MissingColumn {
                column: column.to_string(),
                path: self.path.to_path_buf(),
            })
    }
}

fn cell(record: &StringRecord, position: usize) -> &str {
    record.get(position).unwrap_or("").trim()
}

fn parse_cell<T: std::str::FromStr>(
    record: &StringRecord,
    position: usize,
    row: usize,
    column: &str,
) -> Result<T, AspectError> {
    let value = cell(record, position);
    value.parse().map_err(|_| AspectError::InvalidField {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Labels are stored as floats by some exporters (`1.0`); truncate them.
fn parse_label(record: &StringRecord, position: usize, row: usize) -> Result<i64, AspectError> {
    let value: f64 = parse_cell(record, position, row, LABEL)?;
    if !value.is_finite() {
        return Err(AspectError::InvalidField {
            row,
            column: LABEL.to_string(),
            value: cell(record, position).to_string(),
        });
    }
    Ok(value.trunc() as i64)
}

fn extra_positions(headers: &StringRecord, excluded: &[&str]) -> (Vec<String>, Vec<usize>) {
    headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !excluded.contains(&name.trim()))
        .map(|(position, name)| (name.trim().to_string(), position))
        .unzip()
}

impl Dataset {
    /// Build a dataset from parts. Every record's `extra` must line up with
    /// `extra_columns`.
    pub fn from_records(extra_columns: Vec<String>, records: Vec<VideoRecord>) -> Self {
        Self {
            extra_columns,
            records,
        }
    }

    /// Load the duration table and keep the qualifying rows.
    ///
    /// Rows are sorted by class (stable, so rows of one class keep their
    /// table order); `subset` is dropped and both ratios start unset. Rows
    /// with an empty duration never qualify.
    ///
    /// # Errors
    ///
    /// - [`AspectError::MissingColumn`] if a required column is absent.
    /// - [`AspectError::InvalidField`] for a non-numeric duration, or a
    ///   non-numeric label on a row that otherwise qualifies.
    pub fn load_qualified<P: AsRef<Path>>(
        path: P,
        criteria: &QualificationCriteria,
    ) -> Result<Self, AspectError> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        let columns = ColumnIndex::new(&headers, path);

        let video = columns.require(VIDEO)?;
        let class = columns.require(CLASS)?;
        let duration = columns.require(DURATION)?;
        let subset = columns.require(SUBSET)?;
        let label = columns.require(LABEL)?;

        let (extra_columns, extra) = extra_positions(
            &headers,
            &[VIDEO, CLASS, DURATION, SUBSET, LABEL, FRAME_RATIO, CROP_RATIO],
        );

        let mut records = Vec::new();
        let mut total_rows = 0;
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            let row_number = index + 1;
            total_rows += 1;

            if cell(&row, duration).is_empty() {
                continue;
            }
            let duration_seconds: f64 = parse_cell(&row, duration, row_number, DURATION)?;
            let subset_name = cell(&row, subset);
            // Labels are parsed only for rows that pass the other checks.
            if !criteria.matches_clip(duration_seconds, subset_name) {
                continue;
            }
            let label_value = parse_label(&row, label, row_number)?;
            if label_value != criteria.label {
                continue;
            }

            records.push(VideoRecord {
                video: cell(&row, video).to_string(),
                class: cell(&row, class).to_string(),
                duration: duration_seconds,
                label: label_value,
                ratios: RatioPair::UNSET,
                extra: extra.iter().map(|&p| cell(&row, p).to_string()).collect(),
            });
        }

        records.sort_by(|left, right| left.class.cmp(&right.class));

        log::info!(
            "Loaded {} qualifying videos out of {} rows from {}",
            records.len(),
            total_rows,
            path.display()
        );

        Ok(Self {
            extra_columns,
            records,
        })
    }

    /// Read a dataset table written by [`Dataset::write`].
    ///
    /// # Errors
    ///
    /// - [`AspectError::MissingColumn`] if a dataset column is absent.
    /// - [`AspectError::InvalidField`] if a number cannot be parsed.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, AspectError> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        let columns = ColumnIndex::new(&headers, path);

        let video = columns.require(VIDEO)?;
        let class = columns.require(CLASS)?;
        let duration = columns.require(DURATION)?;
        let label = columns.require(LABEL)?;
        let frame_ratio = columns.require(FRAME_RATIO)?;
        let crop_ratio = columns.require(CROP_RATIO)?;

        let (extra_columns, extra) = extra_positions(&headers, &DATASET_COLUMNS);

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            let row_number = index + 1;
            records.push(VideoRecord {
                video: cell(&row, video).to_string(),
                class: cell(&row, class).to_string(),
                duration: parse_cell(&row, duration, row_number, DURATION)?,
                label: parse_label(&row, label, row_number)?,
                ratios: RatioPair {
                    frame_ratio: parse_cell::<AspectRatio>(
                        &row,
                        frame_ratio,
                        row_number,
                        FRAME_RATIO,
                    )?,
                    crop_ratio: parse_cell::<AspectRatio>(
                        &row,
                        crop_ratio,
                        row_number,
                        CROP_RATIO,
                    )?,
                },
                extra: extra.iter().map(|&p| cell(&row, p).to_string()).collect(),
            });
        }

        log::debug!("Read {} records from {}", records.len(), path.display());

        Ok(Self {
            extra_columns,
            records,
        })
    }

    /// Write the table: the dataset columns, then the retained extra columns.
    /// Ratios are written with exactly two decimals.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), AspectError> {
        let path = path.as_ref();
        let mut writer = Writer::from_path(path)?;

        let header: Vec<&str> = DATASET_COLUMNS
            .iter()
            .copied()
            .chain(self.extra_columns.iter().map(String::as_str))
            .collect();
        writer.write_record(&header)?;

        for record in &self.records {
            let mut fields = vec![
                record.video.clone(),
                record.class.clone(),
                record.duration.to_string(),
                record.label.to_string(),
                record.ratios.frame_ratio.to_string(),
                record.ratios.crop_ratio.to_string(),
            ];
            fields.extend(record.extra.iter().cloned());
            writer.write_record(&fields)?;
        }
        writer.flush()?;

        log::debug!("Wrote {} records to {}", self.records.len(), path.display());
        Ok(())
    }

    /// Overwrite the ratios of every record named `video`. Returns how many
    /// records were updated.
    pub fn update_ratios(&mut self, video: &str, ratios: RatioPair) -> usize {
        let mut updated = 0;
        for record in self.records.iter_mut().filter(|r| r.video == video) {
            record.ratios = ratios;
            updated += 1;
        }
        updated
    }

    /// Keep only the records matching `predicate`, preserving order and
    /// extra columns.
    pub fn select<F>(&self, mut predicate: F) -> Dataset
    where
        F: FnMut(&VideoRecord) -> bool,
    {
        Dataset {
            extra_columns: self.extra_columns.clone(),
            records: self
                .records
                .iter()
                .filter(|record| predicate(record))
                .cloned()
                .collect(),
        }
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [VideoRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
