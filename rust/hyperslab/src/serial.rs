//! Persistent encoding of hyperslab selections as a little-endian block list.
//!
//! Layout (all fields `u32`):
//!
//! ```text
//! type (2) | version (1) | reserved (0) | length | rank | block count
//! block count x (rank x start, rank x end)
//! ```
//!
//! `length` counts the bytes following the length field. Decoding replays the
//! blocks as hyperslab operations (SET for the first block, OR for the rest),
//! so the decoded selection describes the same point set but may be stored
//! differently than the encoded one.

use std::io::Write;

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use hyperslab_common::{Result, error::Error, try_or_ret_some_err, verify_data};
use log::debug;

use crate::{
    block::Block,
    selection::{Dataspace, HyperslabSelection, SelectOp},
};

/// Selection type tag of the block-list encoding.
pub const SELECTION_TYPE_HYPERSLABS: u32 = 2;

/// Current version of the block-list encoding.
pub const HYPERSLAB_VERSION: u32 = 1;

/// Type, version, reserved, length, rank and block count.
const HEADER_SIZE: u64 = 24;

impl HyperslabSelection {
    /// Exact number of bytes [`HyperslabSelection::serialize`] writes.
    pub fn serial_size(&self) -> u64 {
        HEADER_SIZE + 8 * self.rank() as u64 * self.nblocks()
    }

    /// Writes the block-list encoding to `writer`, returning the number of
    /// bytes written. Every coordinate must fit in 32 bits.
    pub fn serialize<W: Write>(&self, writer: &mut W) -> Result<u64> {
        let nblocks = self.nblocks();
        let body = 8 + 8 * self.rank() as u64 * nblocks;
        let nblocks = u32::try_from(nblocks)
            .map_err(|_| Error::invalid_arg("selection", "too many blocks to encode"))?;
        let body = u32::try_from(body)
            .map_err(|_| Error::invalid_arg("selection", "encoding exceeds 4 GiB"))?;
        if let Some(bounds) = self.bounds() {
            if let Some(dim) = bounds.end.iter().position(|&e| e > u32::MAX as u64) {
                return Err(Error::invalid_dim_arg(
                    "selection",
                    dim,
                    "coordinates do not fit the 32-bit encoding",
                ));
            }
        }

        let io = |e: std::io::Error| Error::io("selection block list", e);
        writer.write_u32::<LE>(SELECTION_TYPE_HYPERSLABS).map_err(io)?;
        writer.write_u32::<LE>(HYPERSLAB_VERSION).map_err(io)?;
        writer.write_u32::<LE>(0).map_err(io)?;
        writer.write_u32::<LE>(body).map_err(io)?;
        writer.write_u32::<LE>(self.rank() as u32).map_err(io)?;
        writer.write_u32::<LE>(nblocks).map_err(io)?;
        for block in self.blocks() {
            for &c in block.start.iter().chain(&block.end) {
                writer.write_u32::<LE>(c as u32).map_err(io)?;
            }
        }
        Ok(self.serial_size())
    }
}

impl Dataspace {
    /// Block-list encoding of a hyperslab selection.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let hyperslab = self.hyperslab()?;
        let size = usize::try_from(hyperslab.serial_size())
            .map_err(|_| Error::invalid_arg("selection", "encoding exceeds the address space"))?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(size)
            .map_err(|e| Error::allocation_failure("selection encoding", e))?;
        hyperslab.serialize(&mut buf)?;
        Ok(buf)
    }

    /// Replaces the selection with the one encoded in `bytes`, which must
    /// have been encoded for a dataspace of the same rank.
    ///
    /// The selection is left untouched when decoding fails.
    pub fn deserialize_selection(&mut self, bytes: &[u8]) -> Result<()> {
        let mut reader = bytes;
        let selection_type = read_field(&mut reader, "type")?;
        verify_data!(selection_type, selection_type == SELECTION_TYPE_HYPERSLABS);
        let version = read_field(&mut reader, "version")?;
        verify_data!(version, version == HYPERSLAB_VERSION);
        let _reserved = read_field(&mut reader, "reserved")?;
        let length = read_field(&mut reader, "length")? as u64;
        verify_data!(length, length <= reader.len() as u64);
        let rank = read_field(&mut reader, "rank")? as usize;
        if rank != self.rank() {
            return Err(Error::corrupt_encoding(
                "rank",
                format!("encoded for rank {rank}, dataspace has rank {}", self.rank()),
            ));
        }
        let nblocks = read_field(&mut reader, "block count")? as u64;
        verify_data!(length, length == 8 + 8 * rank as u64 * nblocks);

        let mut decoded = self.clone();
        decoded.select_none();
        let ones = vec![1u64; rank];
        let blocks = BlockReader {
            reader,
            rank,
            remaining: nblocks,
        };
        for (i, block) in blocks.enumerate() {
            let block = block?;
            let op = if i == 0 { SelectOp::Set } else { SelectOp::Or };
            decoded.select_hyperslab(op, &block.start, None, &ones, Some(block.shape().as_slice()))?;
        }
        debug!(
            "decoded {nblocks} blocks into a selection of {} elements",
            decoded.npoints()
        );
        self.install(decoded.into_selection());
        Ok(())
    }
}

fn read_field(reader: &mut &[u8], name: &str) -> Result<u32> {
    reader
        .read_u32::<LE>()
        .map_err(|e| Error::corrupt_encoding(name, format!("truncated header: {e}")))
}

/// Decodes the blocks following the header.
struct BlockReader<'a> {
    reader: &'a [u8],
    rank: usize,
    remaining: u64,
}

impl BlockReader<'_> {
    fn read_coords(&mut self, name: &str) -> Result<Vec<u64>> {
        (0..self.rank)
            .map(|_| {
                self.reader.read_u32::<LE>().map(u64::from).map_err(|e| {
                    Error::corrupt_encoding(name, format!("truncated block list: {e}"))
                })
            })
            .collect()
    }
}

impl Iterator for BlockReader<'_> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Result<Block>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let start = try_or_ret_some_err!(self.read_coords("block start"));
        let end = try_or_ret_some_err!(self.read_coords("block end"));
        if let Some(dim) = start.iter().zip(&end).position(|(s, e)| s > e) {
            return Some(Err(Error::corrupt_encoding(
                "block end",
                format!("end precedes start in dimension {dim}"),
            )));
        }
        Some(Ok(Block::new(start, end)))
    }
}
