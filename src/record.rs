// src/record.rs
//
// Application record layout: UTF-8 text in blocks 1 and 2 of sector 0,
// zero terminated unless it fills both blocks. Block 2 is only skipped when
// block 1 already holds the terminator.

use core::str::Utf8Error;

use crate::card_types::{Block, BLOCK_SIZE};

pub const RECORD_BLOCKS: [u8; 2] = [1, 2];

/// Sector 0 trailer, the block authenticated for record access.
pub const RECORD_AUTH_BLOCK: u8 = 3;

pub const RECORD_CAPACITY: usize = BLOCK_SIZE * RECORD_BLOCKS.len();

/// Splits `payload` into zero-padded blocks. Errs with the payload length
/// when it does not fit.
pub fn encode(payload: &[u8]) -> Result<[Block; 2], usize> {
    if payload.len() > RECORD_CAPACITY {
        return Err(payload.len());
    }
    let mut blocks = [[0u8; BLOCK_SIZE]; 2];
    for (block, chunk) in blocks.iter_mut().zip(payload.chunks(BLOCK_SIZE)) {
        block[..chunk.len()].copy_from_slice(chunk);
    }
    Ok(blocks)
}

/// Number of blocks that have to be written for `payload`. A payload of
/// exactly one block leaves no room for the terminator, so block 2 is
/// rewritten with zeros.
pub fn blocks_needed(payload: &[u8]) -> usize {
    if payload.len() >= BLOCK_SIZE {
        2
    } else {
        1
    }
}

/// Text up to the first zero byte.
pub fn decode(raw: &[u8]) -> Result<&str, Utf8Error> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    core::str::from_utf8(&raw[..end])
}
