//! Min/max downsampling.
//!
//! Each [`MinMaxLevel`] halves the resolution of the level below it and
//! keeps the minimum and maximum of every bucket, so a signal drawn from a
//! level still shows every peak of the raw data. Rendering picks the coarsest
//! level whose bucket width does not exceed one pixel column.

/// Largest bucket width built by [`MinMaxPyramid::build`].
pub const MAX_DOWNSAMPLING_FACTOR: usize = 1 << 16;

/// One level of the pyramid. Bucket `i` covers raw samples
/// `i * factor .. (i + 1) * factor`.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxLevel {
    pub factor: usize,
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl MinMaxLevel {
    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    fn halve(&self) -> MinMaxLevel {
        let len = self.len().div_ceil(2);
        let mut min = Vec::with_capacity(len);
        let mut max = Vec::with_capacity(len);
        for i in 0..len {
            let a = 2 * i;
            let b = (a + 1).min(self.len() - 1);
            min.push(self.min[a].min(self.min[b]));
            max.push(self.max[a].max(self.max[b]));
        }
        MinMaxLevel {
            factor: self.factor * 2,
            min,
            max,
        }
    }
}

/// Levels with factors 2, 4, 8, ... over one channel's samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinMaxPyramid {
    source_len: usize,
    levels: Vec<MinMaxLevel>,
}

impl MinMaxPyramid {
    /// Build levels until a level has a single bucket or `max_factor` is reached.
    pub fn build(samples: &[f32], max_factor: usize) -> Self {
        let mut builder = PyramidBuilder::new(max_factor);
        builder.push(samples);
        builder.finish()
    }

    /// Number of raw samples the pyramid was built from.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn levels(&self) -> &[MinMaxLevel] {
        &self.levels
    }

    /// Coarsest level whose factor is at most `samples_per_column`.
    pub fn level_for(&self, samples_per_column: f64) -> Option<&MinMaxLevel> {
        self.levels
            .iter()
            .take_while(|l| l.factor as f64 <= samples_per_column)
            .last()
    }

    /// Column reduction served from the best level. `None` when no level is
    /// coarse enough and raw samples are needed.
    pub fn columns(&self, start_sample: f64, samples_per_column: f64, columns: usize) -> Option<Vec<(f32, f32)>> {
        let level = self.level_for(samples_per_column)?;
        let f = level.factor as f64;
        Some(reduce_columns(
            level.len(),
            |i| (level.min[i], level.max[i]),
            start_sample / f,
            samples_per_column / f,
            columns,
        ))
    }

    /// Overall minimum and maximum, from the coarsest level.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let top = self.levels.last()?;
        let lo = top.min.iter().copied().fold(f32::INFINITY, f32::min);
        let hi = top.max.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Some((lo, hi))
    }
}

/// Builds a [`MinMaxPyramid`] from samples fed in chunks, so the raw data
/// never has to be held in one piece.
#[derive(Debug, Clone)]
pub struct PyramidBuilder {
    max_factor: usize,
    source_len: usize,
    first: MinMaxLevel,
    pending: Option<f32>,
}

impl PyramidBuilder {
    pub fn new(max_factor: usize) -> Self {
        Self {
            max_factor,
            source_len: 0,
            first: MinMaxLevel {
                factor: 2,
                min: Vec::new(),
                max: Vec::new(),
            },
            pending: None,
        }
    }

    pub fn push(&mut self, samples: &[f32]) {
        self.source_len += samples.len();
        for &v in samples {
            match self.pending.take() {
                Some(a) => self.push_pair(a, v),
                None => self.pending = Some(v),
            }
        }
    }

    fn push_pair(&mut self, a: f32, b: f32) {
        self.first.min.push(f32::INFINITY.min(a).min(b));
        self.first.max.push(f32::NEG_INFINITY.max(a).max(b));
    }

    pub fn finish(mut self) -> MinMaxPyramid {
        let mut levels: Vec<MinMaxLevel> = Vec::new();
        if self.source_len >= 2 && self.max_factor >= 2 {
            if let Some(a) = self.pending.take() {
                self.push_pair(a, a);
            }
            levels.push(self.first);
            while let Some(last) = levels.last() {
                if last.len() <= 1 || last.factor * 2 > self.max_factor {
                    break;
                }
                let next = last.halve();
                levels.push(next);
            }
        }
        MinMaxPyramid {
            source_len: self.source_len,
            levels,
        }
    }
}

/// Minimum and maximum of a slice, ignoring NaN.
pub fn min_max(samples: &[f32]) -> Option<(f32, f32)> {
    let (lo, hi) = samples
        .iter()
        .filter(|v| !v.is_nan())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    (lo <= hi).then_some((lo, hi))
}

/// Reduce raw samples to one (min, max) pair per pixel column.
pub fn raw_columns(samples: &[f32], start_sample: f64, samples_per_column: f64, columns: usize) -> Vec<(f32, f32)> {
    reduce_columns(samples.len(), |i| (samples[i], samples[i]), start_sample, samples_per_column, columns)
}

/// Shared column walk over `len` elements. Columns that end before element 0
/// are `(NaN, NaN)`; columns past the end are dropped, so the result may be
/// shorter than `columns`.
fn reduce_columns(
    len: usize,
    get: impl Fn(usize) -> (f32, f32),
    start: f64,
    per_column: f64,
    columns: usize,
) -> Vec<(f32, f32)> {
    let mut out = Vec::with_capacity(columns);
    if per_column <= 0.0 || !per_column.is_finite() || !start.is_finite() {
        return out;
    }
    for c in 0..columns {
        let col_start = start + c as f64 * per_column;
        let col_end = start + (c + 1) as f64 * per_column;
        if col_end <= 0.0 {
            out.push((f32::NAN, f32::NAN));
            continue;
        }
        let from = col_start.max(0.0).floor() as usize;
        if from >= len {
            break;
        }
        let to = (col_end.floor() as usize).clamp(from + 1, len);
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for i in from..to {
            let (a, b) = get(i);
            lo = lo.min(a);
            hi = hi.max(b);
        }
        out.push((lo, hi));
    }
    out
}
