//! Block partitioning of the state.

use crate::errors::{SeapopymError, SeapopymResult};
use crate::labels::Dim;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// Per-dimension block sizes.
///
/// Only `functional_group`, `Y` and `X` can be chunked. The recurrences run along `time` and the
/// ageing transfer runs along `cohort`, so both must stay whole inside a block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpec {
    sizes: BTreeMap<Dim, usize>,
}

impl ChunkSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_chunkable(dim: Dim) -> bool {
        matches!(dim, Dim::FunctionalGroup | Dim::Y | Dim::X)
    }

    /// Add a block size for `dim`.
    pub fn with(mut self, dim: Dim, size: usize) -> SeapopymResult<Self> {
        self.set(dim, size)?;
        Ok(self)
    }

    pub fn set(&mut self, dim: Dim, size: usize) -> SeapopymResult<()> {
        if !Self::is_chunkable(dim) {
            return Err(SeapopymError::InvalidChunk {
                dimension: dim,
                reason: "only functional_group, latitude and longitude can be chunked".to_string(),
            });
        }
        if size == 0 {
            return Err(SeapopymError::InvalidChunk {
                dimension: dim,
                reason: "chunk size must be strictly positive".to_string(),
            });
        }
        self.sizes.insert(dim, size);
        Ok(())
    }

    pub fn get(&self, dim: Dim) -> Option<usize> {
        self.sizes.get(&dim).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dim, usize)> + '_ {
        self.sizes.iter().map(|(dim, size)| (*dim, *size))
    }

    /// Split the dimensions of the given lengths into blocks.
    ///
    /// Dimensions without a chunk size, or absent from `lengths`, are not split.
    /// Blocks are returned in row-major order of their chunk indices.
    pub fn blocks(&self, lengths: &BTreeMap<Dim, usize>) -> Vec<Block> {
        let mut blocks = vec![Block::default()];
        for (dim, size) in self.iter() {
            let Some(&length) = lengths.get(&dim) else {
                continue;
            };
            let ranges: Vec<Range<usize>> = (0..length)
                .step_by(size)
                .map(|start| start..(start + size).min(length))
                .collect();
            blocks = blocks
                .into_iter()
                .flat_map(|block| {
                    ranges.iter().map(move |range| {
                        let mut block = block.clone();
                        block.ranges.push((dim, range.clone()));
                        block
                    })
                })
                .collect();
        }
        blocks
    }
}

/// A rectangular region of the state: one index range per chunked dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    ranges: Vec<(Dim, Range<usize>)>,
}

impl Block {
    pub fn ranges(&self) -> &[(Dim, Range<usize>)] {
        &self.ranges
    }

    pub fn range(&self, dim: Dim) -> Option<Range<usize>> {
        self.ranges
            .iter()
            .find(|(d, _)| *d == dim)
            .map(|(_, range)| range.clone())
    }
}
