use crate::xof::{Result, XofError};

/// Physical encoding selected by header bytes 8..12.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
	/// `txt `: plain textual tokens.
	Text,
	/// `bin `: packed binary tokens.
	Binary,
	/// `tzip`: MSZIP-compressed textual tokens.
	CompressedText,
	/// `bzip`: MSZIP-compressed binary tokens.
	CompressedBinary,
}

impl Encoding {
	/// Whether the payload is wrapped by the MSZIP compressor.
	pub fn is_compressed(self) -> bool {
		matches!(self, Self::CompressedText | Self::CompressedBinary)
	}

	/// Whether the (decompressed) payload uses the textual grammar.
	pub fn is_textual(self) -> bool {
		matches!(self, Self::Text | Self::CompressedText)
	}

	/// Four-byte header tag for this encoding.
	pub fn tag(self) -> [u8; 4] {
		match self {
			Self::Text => *b"txt ",
			Self::Binary => *b"bin ",
			Self::CompressedText => *b"tzip",
			Self::CompressedBinary => *b"bzip",
		}
	}

	/// Encoding left after decompression.
	pub fn uncompressed(self) -> Self {
		match self {
			Self::CompressedText => Self::Text,
			Self::CompressedBinary => Self::Binary,
			other => other,
		}
	}

	/// Render encoding as a stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Text => "text",
			Self::Binary => "binary",
			Self::CompressedText => "compressed_text",
			Self::CompressedBinary => "compressed_binary",
		}
	}

	fn from_tag(tag: [u8; 4]) -> Option<Self> {
		match &tag {
			b"txt " => Some(Self::Text),
			b"bin " => Some(Self::Binary),
			b"tzip" => Some(Self::CompressedText),
			b"bzip" => Some(Self::CompressedBinary),
			_ => None,
		}
	}
}

/// Floating-point word width used by binary float lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
	/// `0032`: IEEE single precision.
	F32,
	/// `0064`: IEEE double precision.
	F64,
}

impl FloatWidth {
	/// Size of one float in bytes.
	pub fn bytes(self) -> usize {
		match self {
			Self::F32 => 4,
			Self::F64 => 8,
		}
	}

	/// Width in bits.
	pub fn bits(self) -> u32 {
		match self {
			Self::F32 => 32,
			Self::F64 => 64,
		}
	}

	fn from_tag(tag: [u8; 4]) -> Option<Self> {
		match &tag {
			b"0032" => Some(Self::F32),
			b"0064" => Some(Self::F64),
			_ => None,
		}
	}
}

/// Parsed fixed-size `.x` file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XofHeader {
	/// Format version digits from bytes 4..8 (for example `302`), when numeric.
	pub version: Option<u16>,
	/// Payload encoding.
	pub encoding: Encoding,
	/// Binary floating-point width.
	pub float_width: FloatWidth,
}

impl XofHeader {
	/// Header size in bytes.
	pub const SIZE: usize = 16;

	/// Classify the header at the beginning of `bytes`.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		let header = bytes.get(0..Self::SIZE).ok_or(XofError::InvalidHeader)?;
		let flavor = tag(&header[8..12]);
		let float_width = tag(&header[12..16]);

		let unsupported = XofError::UnsupportedFormat { flavor, float_width };
		let Some(float_width) = FloatWidth::from_tag(float_width) else {
			return Err(unsupported);
		};
		let Some(encoding) = Encoding::from_tag(flavor) else {
			return Err(unsupported);
		};

		Ok(Self {
			version: parse_digits(&header[4..8]),
			encoding,
			float_width,
		})
	}

	/// Render the header as its 16 on-disk bytes.
	pub fn to_bytes(self) -> [u8; Self::SIZE] {
		let mut out = [0_u8; Self::SIZE];
		out[0..4].copy_from_slice(b"xof ");
		let version = self.version.unwrap_or(302);
		out[4..8].copy_from_slice(format!("{:04}", version.min(9999)).as_bytes());
		out[8..12].copy_from_slice(&self.encoding.tag());
		out[12..16].copy_from_slice(match self.float_width {
			FloatWidth::F32 => b"0032",
			FloatWidth::F64 => b"0064",
		});
		out
	}
}

fn tag(bytes: &[u8]) -> [u8; 4] {
	let mut out = [0_u8; 4];
	out.copy_from_slice(&bytes[..4]);
	out
}

fn parse_digits(bytes: &[u8]) -> Option<u16> {
	if bytes.is_empty() {
		return None;
	}

	let mut value = 0_u16;
	for byte in bytes {
		if !byte.is_ascii_digit() {
			return None;
		}
		value = value * 10 + u16::from(*byte - b'0');
	}
	Some(value)
}
