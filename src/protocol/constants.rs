//! Wire format constants

/// Size of the big-endian length prefix in front of every frame
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Largest payload accepted by default (10 MiB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Initial capacity of a decoder's accumulation buffer
pub const DECODER_INITIAL_CAPACITY: usize = 64 * 1024;
