use log::{debug, info};
use sift_core::{Descriptor, Keypoint, KeypointSet, DESCRIPTOR_LEN};
use crate::error::{LoadError, LoadResult};

/// Field counts a descriptor chunk may carry
const CHUNK_WIDTHS: [usize; 2] = [20, 8];

/// Upper bound on storage reserved from the header count
const MAX_RESERVE: usize = 4096;

/// Rounding allowance for orientations printed with few decimals, e.g. `3.142`
const ORIENTATION_SLACK: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    ExpectHeader,
    ExpectKeypointOrChunk,
    Complete,
    /// Entered on the first malformed line; every later call fails
    Failed,
}

/// Line-driven parser for the keypoint dataset format.
///
/// Feed lines in order with [`KeyFileParser::feed_line`], then call
/// [`KeyFileParser::finish`] to validate the totals and obtain the set.
/// Orientations must lie in `[-π, π]`, give or take printing precision.
#[derive(Debug)]
pub struct KeyFileParser {
    image_id: String,
    state: ParseState,
    line: usize,
    declared: usize,
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
    pending: Vec<f32>,
}

impl KeyFileParser {
    pub fn new(image_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            state: ParseState::ExpectHeader,
            line: 0,
            declared: 0,
            keypoints: Vec::new(),
            descriptors: Vec::new(),
            pending: Vec::with_capacity(DESCRIPTOR_LEN),
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Number of lines consumed so far
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn feed_line(&mut self, text: &str) -> LoadResult<()> {
        self.line += 1;
        let result = self.step(text);
        if result.is_err() {
            self.state = ParseState::Failed;
        }
        result
    }

    fn step(&mut self, text: &str) -> LoadResult<()> {
        match self.state {
            ParseState::Complete => return Err(LoadError::format(self.line, "parser already finished")),
            ParseState::Failed => return Err(LoadError::format(self.line, "parser is in a failed state")),
            _ => {}
        }

        let fields = text.split_whitespace().collect::<Vec<_>>();
        if fields.is_empty() {
            return Ok(());
        }

        match (self.state, fields.len()) {
            (ParseState::ExpectHeader, 2) => self.header(&fields),
            (ParseState::ExpectHeader, n) => Err(LoadError::format(
                self.line,
                format!("expected a 2-field header, found {} fields", n),
            )),
            (_, 2) => Err(LoadError::format(self.line, "unexpected second header")),
            (_, 4) => self.keypoint(&fields),
            (_, n) if CHUNK_WIDTHS.contains(&n) => self.chunk(&fields),
            (_, n) => Err(LoadError::format(
                self.line,
                format!("unexpected record with {} fields", n),
            )),
        }
    }

    fn header(&mut self, fields: &[&str]) -> LoadResult<()> {
        let count = self.integer(fields[0])?;
        let length = self.integer(fields[1])?;
        if length != DESCRIPTOR_LEN {
            return Err(LoadError::format(
                self.line,
                format!("descriptor length {} in header (should be {})", length, DESCRIPTOR_LEN),
            ));
        }
        debug!("{}: header declares {} keypoints", self.image_id, count);
        self.declared = count;
        // The count is untrusted until `finish` compares it with the records
        self.keypoints.reserve(count.min(MAX_RESERVE));
        self.descriptors.reserve(count.min(MAX_RESERVE));
        self.state = ParseState::ExpectKeypointOrChunk;
        Ok(())
    }

    fn keypoint(&mut self, fields: &[&str]) -> LoadResult<()> {
        if !self.pending.is_empty() {
            return Err(LoadError::format(
                self.line,
                format!("keypoint record after {} of {} descriptor values", self.pending.len(), DESCRIPTOR_LEN),
            ));
        }
        if self.descriptors.len() < self.keypoints.len() {
            return Err(LoadError::format(
                self.line,
                format!("keypoint {} has no descriptor", self.keypoints.len() - 1),
            ));
        }
        let row = self.number(fields[0])?;
        let col = self.number(fields[1])?;
        let scale = self.number(fields[2])?;
        let orientation = self.number(fields[3])?;
        if orientation.abs() > std::f32::consts::PI + ORIENTATION_SLACK {
            return Err(LoadError::format(
                self.line,
                format!("orientation {} outside [-pi, pi]", orientation),
            ));
        }
        self.keypoints.push(Keypoint::new(row, col, scale, orientation));
        Ok(())
    }

    fn chunk(&mut self, fields: &[&str]) -> LoadResult<()> {
        if self.descriptors.len() == self.keypoints.len() {
            return Err(LoadError::format(self.line, "descriptor chunk without a keypoint record"));
        }
        for field in fields {
            let value = self.number(field)?;
            self.pending.push(value);
        }
        if self.pending.len() > DESCRIPTOR_LEN {
            return Err(LoadError::format(
                self.line,
                format!("descriptor overflows to {} values (should be {})", self.pending.len(), DESCRIPTOR_LEN),
            ));
        }
        if self.pending.len() == DESCRIPTOR_LEN {
            let descriptor = normalize(&self.pending)
                .ok_or_else(|| LoadError::format(self.line, "descriptor has zero norm"))?;
            self.descriptors.push(descriptor);
            self.pending.clear();
        }
        Ok(())
    }

    /// Validate the totals and hand over the parsed set
    pub fn finish(&mut self) -> LoadResult<KeypointSet> {
        let result = self.complete();
        self.state = if result.is_ok() { ParseState::Complete } else { ParseState::Failed };
        result
    }

    fn complete(&mut self) -> LoadResult<KeypointSet> {
        match self.state {
            ParseState::ExpectHeader => return Err(LoadError::format(self.line, "missing header")),
            ParseState::Complete => return Err(LoadError::format(self.line, "parser already finished")),
            ParseState::Failed => return Err(LoadError::format(self.line, "parser is in a failed state")),
            ParseState::ExpectKeypointOrChunk => {}
        }
        if !self.pending.is_empty() {
            return Err(LoadError::format(
                self.line,
                format!("truncated descriptor with {} of {} values", self.pending.len(), DESCRIPTOR_LEN),
            ));
        }
        if self.descriptors.len() < self.keypoints.len() {
            return Err(LoadError::format(
                self.line,
                format!("keypoint {} has no descriptor", self.keypoints.len() - 1),
            ));
        }
        if self.keypoints.len() != self.declared {
            return Err(LoadError::CountMismatch {
                declared: self.declared,
                actual: self.keypoints.len(),
            });
        }

        info!("{}: number of keypoints read: {}", self.image_id, self.keypoints.len());
        Ok(KeypointSet::new(
            std::mem::take(&mut self.image_id),
            std::mem::take(&mut self.keypoints),
            std::mem::take(&mut self.descriptors),
        ))
    }

    fn number(&self, field: &str) -> LoadResult<f32> {
        field
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| LoadError::format(self.line, format!("invalid number {:?}", field)))
    }

    /// Header integers may be written as `128` or `128.0`
    fn integer(&self, field: &str) -> LoadResult<usize> {
        if let Ok(v) = field.parse::<usize>() {
            return Ok(v);
        }
        match field.parse::<f64>() {
            Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(v as usize),
            _ => Err(LoadError::format(self.line, format!("invalid count {:?}", field))),
        }
    }
}

/// Scale `values` to unit Euclidean norm; `None` for a zero (or non-finite) norm
pub(crate) fn normalize(values: &[f32]) -> Option<Descriptor> {
    let norm = values.iter().map(|&v| (v as f64) * (v as f64)).sum::<f64>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    let mut d = [0.0f32; DESCRIPTOR_LEN];
    for (out, &v) in d.iter_mut().zip(values) {
        *out = (v as f64 / norm) as f32;
    }
    Some(d)
}
