// Scalar sample feed parsing and storage

use crate::geometry::Point3D;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: expected 4 numeric fields (x y z value), got {found}")]
    MalformedLine { line: usize, found: usize },

    #[error("line {line}: non-finite value in field {field}")]
    NonFinite { line: usize, field: usize },
}

/// A 3D point with an associated scalar property value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarSample {
    pub position: Point3D,
    pub value: f64,
}

/// Immutable collection of scalar samples for one loaded data set.
///
/// Replaced wholesale when a new file is loaded; never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    samples: Vec<ScalarSample>,
    min_value: f64,
    max_value: f64,
}

impl SampleStore {
    /// Parse a sample feed: one `x y z value` line per sample, fields
    /// whitespace-separated, `#`-prefixed and blank lines skipped.
    ///
    /// Any other line must yield exactly four finite doubles, otherwise the
    /// whole load is rejected so the caller can fall back to its previous
    /// data set. NaN and infinity are refused here; nothing downstream has
    /// to special-case them.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut samples = Vec::new();

        for (line_idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let line_no = line_idx + 1;
            let tokens: Vec<&str> = trimmed.split_whitespace().collect();
            if tokens.len() != 4 {
                return Err(ParseError::MalformedLine {
                    line: line_no,
                    found: tokens.len(),
                });
            }

            let mut fields = [0.0_f64; 4];
            for (i, token) in tokens.iter().enumerate() {
                fields[i] = token.parse::<f64>().map_err(|_| ParseError::MalformedLine {
                    line: line_no,
                    found: i,
                })?;
            }

            if let Some(bad) = fields.iter().position(|v| !v.is_finite()) {
                return Err(ParseError::NonFinite {
                    line: line_no,
                    field: bad + 1,
                });
            }

            samples.push(ScalarSample {
                position: Point3D::new(fields[0], fields[1], fields[2]),
                value: fields[3],
            });
        }

        let store = Self::from_samples(samples);
        log::info!(
            "Loaded {} scalar samples, value range {:?}",
            store.len(),
            store.value_range()
        );
        Ok(store)
    }

    /// Build a store from already-validated samples
    pub fn from_samples(samples: Vec<ScalarSample>) -> Self {
        let min_value = samples.iter().map(|s| s.value).fold(f64::INFINITY, f64::min);
        let max_value = samples
            .iter()
            .map(|s| s.value)
            .fold(f64::NEG_INFINITY, f64::max);

        Self {
            samples,
            min_value,
            max_value,
        }
    }

    pub fn samples(&self) -> &[ScalarSample] {
        &self.samples
    }

    pub fn get(&self, index: u32) -> &ScalarSample {
        &self.samples[index as usize]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Global (min, max) of the sample values, `None` for an empty store
    pub fn value_range(&self) -> Option<(f64, f64)> {
        if self.samples.is_empty() {
            None
        } else {
            Some((self.min_value, self.max_value))
        }
    }
}
