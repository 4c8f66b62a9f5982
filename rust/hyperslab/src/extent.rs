//! Dataspace extent: the rank and per-dimension sizes a selection is laid over.

use hyperslab_common::{Result, error::Error};

/// Upper bound on the rank of a dataspace.
pub const MAX_RANK: usize = 32;

/// Rank and current dimension sizes of an N-dimensional array.
///
/// The extent is an input to the selection engine; nothing here mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extent {
    dims: Vec<u64>,
}

impl Extent {
    pub fn new(dims: &[u64]) -> Result<Extent> {
        if dims.is_empty() || dims.len() > MAX_RANK {
            return Err(Error::invalid_arg(
                "dims",
                format!("rank must be in [1, {MAX_RANK}], got {}", dims.len()),
            ));
        }
        dims.iter().enumerate().try_fold(1u64, |total, (dim, &size)| {
            total.checked_mul(size).ok_or_else(|| {
                Error::invalid_dim_arg("dims", dim, "number of elements is not representable")
            })
        })?;
        Ok(Extent {
            dims: dims.to_vec(),
        })
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    #[inline]
    pub fn size(&self, dim: usize) -> u64 {
        self.dims[dim]
    }

    /// Total number of elements in the extent.
    pub fn npoints(&self) -> u64 {
        self.dims.iter().product()
    }

    /// Byte distance between consecutive indices of each dimension in a
    /// row-major layout of `elem_size`-byte elements.
    pub fn row_strides(&self, elem_size: u64) -> Vec<u64> {
        row_strides(&self.dims, elem_size)
    }
}

pub(crate) fn row_strides(dims: &[u64], elem_size: u64) -> Vec<u64> {
    let mut strides = vec![0u64; dims.len()];
    let mut acc = elem_size;
    for (stride, &size) in strides.iter_mut().zip(dims).rev() {
        *stride = acc;
        acc *= size;
    }
    strides
}

/// Checks that a per-dimension argument has exactly `rank` entries.
pub(crate) fn check_rank<T>(name: &str, values: &[T], rank: usize) -> Result<()> {
    if values.len() != rank {
        return Err(Error::rank_mismatch(name, rank, values.len()));
    }
    Ok(())
}
