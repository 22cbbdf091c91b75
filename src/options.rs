//! Decoder configuration.

/// Default struct nesting limit.
pub const DEFAULT_MAX_DEPTH:           usize = 32;
/// Initial inflate output size, as a multiple of the compressed size.
pub const DEFAULT_INFLATE_RATIO:       usize = 20;
/// How many times the inflate output buffer may double.
pub const DEFAULT_MAX_INFLATE_GROWTHS: usize = 8;

/// Configuration for [`MatReader`](crate::reader::MatReader).
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Maximum struct nesting depth.  Deeper input is reported as
    /// `DepthLimitExceeded` instead of exhausting the stack.
    pub max_depth:           usize,
    pub inflate_ratio:       usize,
    pub max_inflate_growths: usize,
    /// Require version 0x0100 and an `IM`/`MI` indicator in the header.
    pub strict_header:       bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth:           DEFAULT_MAX_DEPTH,
            inflate_ratio:       DEFAULT_INFLATE_RATIO,
            max_inflate_growths: DEFAULT_MAX_INFLATE_GROWTHS,
            strict_header:       true,
        }
    }
}
