/// Raw window handed to a worker during compression (5 MiB).
pub const CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Max chunk size sanity bound (64 MiB).
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Bound of both the read-queue and the write-queue.
pub const QUEUE_LIMIT: usize = 5;

/// Bytes read at every frame boundary before the frame length is known.
pub const FRAME_HEADER_LEN: usize = 8;

/// Offset of the little-endian u32 total frame length inside a frame.
/// Lands on the gzip MTIME field, which decoders ignore.
pub const FRAME_LEN_OFFSET: usize = 4;

/// Largest frame the reader accepts before declaring the stream corrupt.
/// Deflate worst-case expansion on a `MAX_CHUNK_SIZE` window stays far below this.
pub const MAX_FRAME_LEN: usize = 2 * MAX_CHUNK_SIZE;

/// gzip member signature: ID1, ID2, CM = deflate.
pub const GZIP_MAGIC: [u8; 3] = [0x1F, 0x8B, 0x08];

/// Archive extension, without the dot.
pub const ARCHIVE_EXTENSION: &str = "gz";

/// Default deflate level (balanced).
pub const DEFAULT_LEVEL: u32 = 6;
pub const MAX_LEVEL: u32 = 9;

/// How long the CLI waits for another instance to release the lock.
pub const INSTANCE_LOCK_WAIT_MS: u64 = 3_000;
