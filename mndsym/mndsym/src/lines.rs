//! Line table decoding.
//!
//! Line records come in runs: a set (with or without a path) followed by any
//! number of increments and sets, optionally closed by an end record. Each
//! set or increment maps the record's address to the current source line.

use mndsym_core::{InconsistencyError, Line};
use mndsym_tags::{Record, RecordBody};

use crate::resolver::Site;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum LineState {
    #[default]
    Idle,
    Active { path: String, line: u32 },
}

/// Running line state. Survives across runs until an end record.
#[derive(Debug, Clone, Default)]
pub(crate) struct LineDecoder {
    state: LineState,
}

impl LineDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Decode the run of line records starting at `records[start]`,
    /// appending one entry per set or increment. Returns how many records
    /// were consumed; the first non-line record is left in place.
    pub(crate) fn decode_run(
        &mut self,
        records: &[Record],
        start: usize,
        lines: &mut Vec<Line>,
    ) -> Result<usize, InconsistencyError> {
        let mut consumed = 0;
        for (index, record) in records.iter().enumerate().skip(start) {
            if !record.body.is_line() {
                break;
            }
            consumed += 1;
            let site = Site::of(record, index);
            if !self.step(record, site, lines)? {
                break;
            }
        }
        Ok(consumed)
    }

    /// Apply one line record. Returns `false` once the run has ended.
    fn step(
        &mut self,
        record: &Record,
        site: Site,
        lines: &mut Vec<Line>,
    ) -> Result<bool, InconsistencyError> {
        match &record.body {
            RecordBody::EndLine => {
                self.state = LineState::Idle;
                return Ok(false);
            }
            RecordBody::SetLineWithPath { line, path } => {
                self.state = LineState::Active {
                    path: path.clone(),
                    line: *line,
                };
            }
            body => {
                let LineState::Active { line, .. } = &mut self.state else {
                    return Err(site.error(
                        "",
                        "line number record without a preceding source path",
                    ));
                };
                *line = match body {
                    RecordBody::SetLine(set) => *set,
                    RecordBody::IncLine => line.wrapping_add(1),
                    RecordBody::IncLineByte(inc) => line.wrapping_add(u32::from(*inc)),
                    RecordBody::IncLineWord(inc) => line.wrapping_add(u32::from(*inc)),
                    _ => return Ok(false),
                };
            }
        }
        if let LineState::Active { path, line } = &self.state {
            lines.push(Line {
                addr: record.value,
                path: path.clone(),
                line: *line,
            });
        }
        Ok(true)
    }
}
