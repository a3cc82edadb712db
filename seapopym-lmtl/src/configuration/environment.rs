use seapopym_core::chunk::ChunkSpec;
use seapopym_core::errors::SeapopymResult;
use seapopym_core::labels::Dim;
use serde::{Deserialize, Serialize};

/// Block sizes used when the state is partitioned.
///
/// Time and cohort are never chunked: the production and biomass recurrences run along time and
/// ageing runs along cohorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkParameter {
    pub functional_group: Option<usize>,
    pub latitude: Option<usize>,
    pub longitude: Option<usize>,
}

impl Default for ChunkParameter {
    fn default() -> Self {
        Self {
            functional_group: Some(1),
            latitude: None,
            longitude: None,
        }
    }
}

impl ChunkParameter {
    pub fn to_chunk_spec(&self) -> SeapopymResult<ChunkSpec> {
        let mut spec = ChunkSpec::new();
        for (dim, size) in [
            (Dim::FunctionalGroup, self.functional_group),
            (Dim::Y, self.latitude),
            (Dim::X, self.longitude),
        ] {
            if let Some(size) = size {
                spec.set(dim, size)?;
            }
        }
        Ok(spec)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentParameter {
    pub chunk: ChunkParameter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_one_group_per_block() {
        let spec = ChunkParameter::default().to_chunk_spec().unwrap();
        assert_eq!(spec.get(Dim::FunctionalGroup), Some(1));
        assert_eq!(spec.get(Dim::Y), None);
    }

    #[test]
    fn from_toml() {
        let environment: EnvironmentParameter =
            toml::from_str("[chunk]\nlatitude = 10\n").unwrap();
        assert_eq!(environment.chunk.latitude, Some(10));
        assert_eq!(environment.chunk.functional_group, Some(1));
    }

    #[test]
    fn zero_sized_blocks_are_rejected() {
        let chunk = ChunkParameter {
            functional_group: Some(0),
            ..ChunkParameter::default()
        };
        assert!(chunk.to_chunk_spec().is_err());
    }
}
