/// Stable format IDs (u16) for the codec registry.
pub mod format_ids {
    pub const AUTO: u16 = 0x0000;
    pub const GZIP: u16 = 0x0001;
    pub const ZLIB: u16 = 0x0002;
}

/// Default deflate level (balanced).
pub const DEFAULT_LEVEL_DEFLATE: u32 = 6;
pub const MAX_LEVEL_DEFLATE: u32 = 9;

/// gzip member framing (RFC 1952).
pub mod gzip {
    pub const MAGIC: [u8; 2] = [0x1f, 0x8b];
    /// Compression method 8 = deflate, the only one defined.
    pub const CM_DEFLATE: u8 = 8;

    pub const FTEXT: u8 = 0x01;
    pub const FHCRC: u8 = 0x02;
    pub const FEXTRA: u8 = 0x04;
    pub const FNAME: u8 = 0x08;
    pub const FCOMMENT: u8 = 0x10;
    /// Bits 5..7 must be zero.
    pub const FRESERVED: u8 = 0xe0;

    /// XFL values written by the encoder.
    pub const XFL_MAX_COMPRESSION: u8 = 2;
    pub const XFL_FASTEST: u8 = 4;

    /// OS byte: Unix, as zlib writes on posix hosts.
    pub const OS_UNIX: u8 = 3;
    pub const OS_UNKNOWN: u8 = 255;

    /// ID1 ID2 CM FLG MTIME(4) XFL OS
    pub const FIXED_HEADER_LEN: usize = 10;
    /// CRC32 + ISIZE
    pub const TRAILER_LEN: usize = 8;
}

/// Spare capacity reserved before each raw deflate/inflate call.
pub const CODEC_OUTPUT_RESERVE: usize = 32 * 1024;
