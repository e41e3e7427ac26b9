//! Exact (brute-force) vector index with a checksummed on-disk format.
//!
//! Vectors are kept in one contiguous row-major buffer; position `i` is the
//! catalog entry `i`. The persisted file carries the fingerprint of the
//! catalog it was built from so the two can never be paired wrongly.
//!
//! File layout (little-endian):
//!
//! ```text
//! magic "QAIX" | version u16 | metric u8 | reserved u8 | dimensions u32 | count u64
//! catalog fingerprint [u8; 32]
//! count * dimensions * f32
//! sha256 of everything above [u8; 32]
//! ```

use crate::vector_index::{Metric, Neighbor, VectorIndex};
use qamatch_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::Path;

const MAGIC: &[u8; 4] = b"QAIX";
const VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 1 + 1 + 4 + 8 + 32;
const DIGEST_LEN: usize = 32;

/// SHA-256 fingerprint of a catalog.
pub type Fingerprint = [u8; 32];

/// Flat index: every query is compared against every stored vector.
///
/// Exact results, no training step; suited to small curated catalogs.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    metric: Metric,
    dimensions: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Build an index from an ordered batch of vectors.
    ///
    /// # Errors
    /// * `EmptyCatalog` - no vectors
    /// * `DimensionMismatch` - a vector differs in length from the first one
    pub fn build(metric: Metric, vectors: &[Vec<f32>]) -> AppResult<Self> {
        let first = vectors.first().ok_or(AppError::EmptyCatalog)?;
        let dimensions = first.len();
        if dimensions == 0 {
            return Err(AppError::Knowledge(
                "Embedding vectors must have at least one dimension".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(vectors.len() * dimensions);
        for (position, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(AppError::DimensionMismatch {
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(AppError::Knowledge(format!(
                    "Embedding at position {} contains a non-finite component",
                    position
                )));
            }
            data.extend_from_slice(vector);
        }

        tracing::debug!(
            "Built flat index: {} vectors, {} dimensions, metric {}",
            vectors.len(),
            dimensions,
            metric
        );

        Ok(Self {
            metric,
            dimensions,
            data,
        })
    }

    /// Serialize the index, bound to `catalog`.
    pub fn to_bytes(&self, catalog: &Fingerprint) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.data.len() * 4 + DIGEST_LEN);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.push(self.metric.code());
        bytes.push(0);
        bytes.extend_from_slice(&(self.dimensions as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.size() as u64).to_le_bytes());
        bytes.extend_from_slice(catalog);
        for &value in &self.data {
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        let digest = Sha256::digest(&bytes);
        bytes.extend_from_slice(&digest);
        bytes
    }

    /// Decode an index and the catalog fingerprint it was saved with.
    ///
    /// Any structural problem is `CorruptIndex`; a damaged file never decodes
    /// to an empty index.
    pub fn from_bytes(bytes: &[u8]) -> AppResult<(Self, Fingerprint)> {
        if bytes.len() < HEADER_LEN + DIGEST_LEN {
            return Err(corrupt(format!(
                "file is {} bytes, shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN + DIGEST_LEN
            )));
        }

        if &bytes[0..4] != MAGIC {
            return Err(corrupt("bad magic number".to_string()));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(corrupt(format!("unsupported version {}", version)));
        }

        let metric = Metric::from_code(bytes[6])
            .ok_or_else(|| corrupt(format!("unknown metric code {}", bytes[6])))?;

        let dimensions = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&bytes[12..20]);
        let count = u64::from_le_bytes(count_bytes);

        let mut catalog = [0u8; 32];
        catalog.copy_from_slice(&bytes[20..HEADER_LEN]);

        if dimensions == 0 || count == 0 {
            return Err(corrupt(format!(
                "header declares {} vectors of {} dimensions",
                count, dimensions
            )));
        }

        let payload_len = usize::try_from(count)
            .ok()
            .and_then(|n| n.checked_mul(dimensions))
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| corrupt("declared size overflows".to_string()))?;

        let expected_len = HEADER_LEN + payload_len + DIGEST_LEN;
        if bytes.len() != expected_len {
            return Err(corrupt(format!(
                "expected {} bytes for {} vectors of {} dimensions, found {}",
                expected_len,
                count,
                dimensions,
                bytes.len()
            )));
        }

        let (body, stored_digest) = bytes.split_at(expected_len - DIGEST_LEN);
        if Sha256::digest(body).as_slice() != stored_digest {
            return Err(corrupt("checksum mismatch".to_string()));
        }

        let data: Vec<f32> = body[HEADER_LEN..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok((
            Self {
                metric,
                dimensions,
                data,
            },
            catalog,
        ))
    }

    /// Write the index to `path`, replacing any previous file atomically.
    pub fn save(&self, path: &Path, catalog: &Fingerprint) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create index directory: {}", e))
            })?;
        }

        let tmp = path.with_extension("bin.tmp");
        std::fs::write(&tmp, self.to_bytes(catalog))
            .map_err(|e| AppError::Knowledge(format!("Failed to write index {:?}: {}", tmp, e)))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| AppError::Knowledge(format!("Failed to replace index {:?}: {}", path, e)))?;

        tracing::debug!("Saved index with {} vectors to {:?}", self.size(), path);
        Ok(())
    }

    /// Read an index from `path`.
    pub fn load(path: &Path) -> AppResult<(Self, Fingerprint)> {
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::Knowledge(format!("Failed to read index {:?}: {}", path, e)))?;
        let loaded = Self::from_bytes(&bytes)?;

        tracing::debug!(
            "Loaded index from {:?}: {} vectors, {} dimensions",
            path,
            loaded.0.size(),
            loaded.0.dimensions
        );
        Ok(loaded)
    }
}

impl VectorIndex for FlatIndex {
    fn size(&self) -> usize {
        self.data.len() / self.dimensions
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn metric(&self) -> Metric {
        self.metric
    }

    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>> {
        if query.len() != self.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        if k == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(position, stored)| Neighbor {
                distance: self.metric.distance(query, stored),
                position,
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }
}

fn corrupt(reason: String) -> AppError {
    AppError::CorruptIndex(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> FlatIndex {
        FlatIndex::build(
            Metric::L2Squared,
            &[
                vec![0.0, 0.0, 0.0],
                vec![1.0, 0.0, 0.0],
                vec![0.0, 2.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_build_empty_is_rejected() {
        let result = FlatIndex::build(Metric::L2Squared, &[]);
        assert!(matches!(result, Err(AppError::EmptyCatalog)));
    }

    #[test]
    fn test_build_mixed_dimensions_is_rejected() {
        let result = FlatIndex::build(Metric::L2Squared, &[vec![1.0, 0.0], vec![1.0, 0.0, 0.0]]);
        assert!(matches!(
            result,
            Err(AppError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_build_rejects_nan() {
        let result = FlatIndex::build(Metric::L2Squared, &[vec![1.0, f32::NAN]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = sample();
        let hits = index.search(&[0.9, 0.0, 0.0], 3).unwrap();

        let positions: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![1, 0, 2]);
        assert!((hits[0].distance - 0.01).abs() < 1e-6);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_search_exact_match_is_zero() {
        let index = sample();
        let hit = index.nearest(&[0.0, 2.0, 0.0]).unwrap().unwrap();
        assert_eq!(hit.position, 2);
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn test_search_k_larger_than_size() {
        let index = sample();
        let hits = index.search(&[0.0, 0.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_search_k_zero() {
        let index = sample();
        assert!(index.search(&[0.0, 0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_ties_prefer_lower_position() {
        let index = FlatIndex::build(Metric::L2Squared, &[vec![1.0, 0.0], vec![1.0, 0.0]]).unwrap();
        let hit = index.nearest(&[1.0, 0.0]).unwrap().unwrap();
        assert_eq!(hit.position, 0);
    }

    #[test]
    fn test_search_wrong_query_dimension() {
        let index = sample();
        let result = index.search(&[1.0, 0.0], 1);
        assert!(matches!(
            result,
            Err(AppError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_cosine_metric_search() {
        let index =
            FlatIndex::build(Metric::Cosine, &[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let hit = index.nearest(&[0.0, 5.0]).unwrap().unwrap();
        assert_eq!(hit.position, 1);
        assert!(hit.distance.abs() < 1e-6);
    }

    #[test]
    fn test_size_and_dimensions() {
        let index = sample();
        assert_eq!(index.size(), 3);
        assert_eq!(index.dimensions(), 3);
    }

    #[test]
    fn test_save_and_load_preserves_search_results() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.bin");
        let fingerprint = [7u8; 32];

        let index = sample();
        index.save(&path, &fingerprint).unwrap();

        let (loaded, loaded_fingerprint) = FlatIndex::load(&path).unwrap();
        assert_eq!(loaded, index);
        assert_eq!(loaded_fingerprint, fingerprint);

        let query = [0.3, 1.1, -0.2];
        assert_eq!(
            loaded.search(&query, 3).unwrap(),
            index.search(&query, 3).unwrap()
        );
        assert!(!path.with_extension("bin.tmp").exists());
    }

    #[test]
    fn test_truncated_file_is_corrupt() {
        let bytes = sample().to_bytes(&[0u8; 32]);
        for cut in [0, 10, HEADER_LEN, bytes.len() - 1] {
            let result = FlatIndex::from_bytes(&bytes[..cut]);
            assert!(
                matches!(result, Err(AppError::CorruptIndex(_))),
                "cut at {} was not reported as corrupt",
                cut
            );
        }
    }

    #[test]
    fn test_trailing_bytes_are_corrupt() {
        let mut bytes = sample().to_bytes(&[0u8; 32]);
        bytes.push(0);
        assert!(matches!(
            FlatIndex::from_bytes(&bytes),
            Err(AppError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_flipped_payload_bit_is_corrupt() {
        let mut bytes = sample().to_bytes(&[0u8; 32]);
        bytes[HEADER_LEN + 5] ^= 0x01;
        let err = FlatIndex::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_bad_magic_is_corrupt() {
        let mut bytes = sample().to_bytes(&[0u8; 32]);
        bytes[0] = b'X';
        let err = FlatIndex::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_zero_count_header_is_corrupt() {
        let mut bytes = sample().to_bytes(&[0u8; 32]);
        bytes[12..20].copy_from_slice(&0u64.to_le_bytes());
        assert!(matches!(
            FlatIndex::from_bytes(&bytes),
            Err(AppError::CorruptIndex(_))
        ));
    }
}
