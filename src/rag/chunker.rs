use crate::core::config::validation::validate_chunking;
use crate::core::config::ConfigError;

/// Fixed-size sliding window over characters.
///
/// Consecutive chunks share exactly `overlap` characters. The walk stops once
/// a window reaches the end of the text, so text of length `L > overlap`
/// yields `ceil((L - overlap) / (size - overlap))` chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(size: usize, overlap: usize) -> Result<Self, ConfigError> {
        validate_chunking(size, overlap)?;
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let step = self.size - self.overlap;

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < total {
            let end = (start + self.size).min(total);
            chunks.push(chars[start..end].iter().collect());
            if end == total {
                break;
            }
            start += step;
        }
        chunks
    }
}
