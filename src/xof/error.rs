use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, XofError>;

/// Fatal errors produced while reading, decoding and assembling `.x` data.
///
/// Recoverable problems are never reported through this type; they are pushed
/// into [`crate::xof::Diagnostics`] instead.
#[derive(Debug, Error)]
pub enum XofError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// File is shorter than the fixed magic header or lacks the `xof ` tag.
	#[error("invalid header")]
	InvalidHeader,
	/// Header flavor or floating-point width is not recognized.
	#[error("unsupported format (flavor={flavor:?}, float_width={float_width:?})")]
	UnsupportedFormat {
		/// Header bytes 8..12.
		flavor: [u8; 4],
		/// Header bytes 12..16.
		float_width: [u8; 4],
	},
	/// Compressed payload could not be unwrapped.
	#[error("decompression failed: {0}")]
	Decompression(#[from] MsZipError),
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Malformed textual input.
	#[error("syntax error at character {at} in template {template:?}: {reason}")]
	Syntax {
		/// Character offset in the normalized content string.
		at: usize,
		/// Template being decoded.
		template: Box<str>,
		/// Short description of the violation.
		reason: &'static str,
	},
	/// Illegal binary token sequence.
	#[error("token error at offset 0x{at:x} in template {template:?}: {reason}")]
	Token {
		/// Byte offset in the binary payload.
		at: usize,
		/// Template being decoded.
		template: Box<str>,
		/// Short description of the violation.
		reason: &'static str,
	},
	/// Decoded tree does not have the shape a template requires.
	#[error("structure error: {reason}")]
	Structure {
		/// Description of the mismatch.
		reason: String,
	},
	/// Declared element count disagrees with supplied elements.
	#[error("{what}: declared {declared}, found {actual}")]
	CountMismatch {
		/// Counted quantity.
		what: &'static str,
		/// Count declared in the file.
		declared: i64,
		/// Number of elements present.
		actual: usize,
	},
	/// Reference points outside its owning array.
	#[error("{what} index {index} out of range (len={len})")]
	IndexOutOfRange {
		/// Referenced array.
		what: &'static str,
		/// Offending index.
		index: i64,
		/// Length of the referenced array.
		len: usize,
	},
	/// Record nesting exceeded the configured ceiling.
	#[error("record nesting exceeded (max={max_depth})")]
	DepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// Declared array length exceeded the configured ceiling.
	#[error("array too large: count={count}, max={max}")]
	ArrayTooLarge {
		/// Declared element count.
		count: usize,
		/// Maximum permitted element count.
		max: usize,
	},
	/// Host requested cancellation.
	#[error("decode cancelled")]
	Cancelled,
}

impl XofError {
	pub(crate) fn structure(reason: impl Into<String>) -> Self {
		Self::Structure { reason: reason.into() }
	}
}

/// Failures raised by the MSZIP decompressor.
#[derive(Debug, Error)]
pub enum MsZipError {
	/// Compressed stream is shorter than the header plus size field.
	#[error("compressed stream truncated before block table")]
	Truncated,
	/// A block header or block body ran past the end of the stream.
	#[error("block {block} truncated at offset {at}")]
	BlockTruncated {
		/// Zero-based block index.
		block: usize,
		/// Offset of the block header.
		at: usize,
	},
	/// Block body did not start with the `CK` signature.
	#[error("block {block} missing CK signature at offset {at}")]
	BadSignature {
		/// Zero-based block index.
		block: usize,
		/// Offset of the expected signature.
		at: usize,
	},
	/// Raw deflate stream was corrupt.
	#[error("block {block} inflate failed: {status}")]
	Inflate {
		/// Zero-based block index.
		block: usize,
		/// Status reported by the inflater.
		status: String,
	},
	/// Block inflated to a size other than the declared one.
	#[error("block {block} inflated to {actual} bytes, expected {expected}")]
	BlockSize {
		/// Zero-based block index.
		block: usize,
		/// Declared uncompressed size.
		expected: usize,
		/// Bytes produced.
		actual: usize,
	},
	/// Output would exceed the configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	TooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
}
