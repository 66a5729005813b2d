use std::fs;
use std::path::{Path, PathBuf};

use crate::xof::compression::{MAX_DECOMPRESSED_BYTES, decompress};
use crate::xof::{DecodeContext, Encoding, Node, Result, XofHeader, decode_binary_tree, decode_text_tree};

/// A `.x` file held in memory with any MSZIP layer already removed.
pub struct XofFile {
	/// Location used for texture lookup and messages.
	pub path: PathBuf,
	/// Header as found on disk, before decompression.
	pub header: XofHeader,
	bytes: Vec<u8>,
}

impl XofFile {
	/// Read and unwrap the file at `path`.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let raw = fs::read(path)?;
		Self::from_bytes(path, raw, MAX_DECOMPRESSED_BYTES)
	}

	/// Unwrap an in-memory file. `limit` caps the decompressed payload size.
	pub fn from_bytes(path: impl Into<PathBuf>, raw: Vec<u8>, limit: usize) -> Result<Self> {
		let header = sniff(&raw)?;
		let bytes = match header.encoding {
			Encoding::CompressedText | Encoding::CompressedBinary => decompress(&raw, limit)?,
			Encoding::Text | Encoding::Binary => raw,
		};

		Ok(Self {
			path: path.into(),
			header,
			bytes,
		})
	}

	/// Whether the on-disk payload was MSZIP-compressed.
	pub fn is_compressed(&self) -> bool {
		self.header.encoding != self.header.encoding.uncompressed()
	}

	/// Uncompressed file bytes, header included.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Uncompressed payload after the header.
	pub fn payload(&self) -> &[u8] {
		self.bytes.get(XofHeader::SIZE..).unwrap_or_default()
	}

	/// Directory relative texture paths are resolved against.
	pub fn base_dir(&self) -> &Path {
		self.path.parent().unwrap_or_else(|| Path::new(""))
	}

	/// Decode the payload into its generic record tree.
	pub fn tree(&self, ctx: &mut DecodeContext<'_>) -> Result<Node> {
		if self.header.encoding.is_textual() {
			let text = ctx.options().encoding.decode(&self.bytes);
			decode_text_tree(&text, ctx)
		} else {
			decode_binary_tree(self.payload(), self.header.float_width, ctx)
		}
	}
}

/// Parse and validate the magic header at the start of `bytes`.
pub fn sniff(bytes: &[u8]) -> Result<XofHeader> {
	if bytes.get(0..4) != Some(b"xof ".as_slice()) {
		return Err(crate::xof::XofError::InvalidHeader);
	}
	XofHeader::parse(bytes)
}
