use miniz_oxide::inflate::TINFLStatus;
use miniz_oxide::inflate::core::inflate_flags::TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF;
use miniz_oxide::inflate::core::{DecompressorOxide, decompress as inflate};

use crate::xof::{MsZipError, XofHeader};

/// Default ceiling on decompressed output.
pub const MAX_DECOMPRESSED_BYTES: usize = 256 * 1024 * 1024;

const SIGNATURE: &[u8; 2] = b"CK";
const SIZE_FIELD: usize = 4;
const BLOCK_HEAD: usize = 4;

/// Unwrap an MSZIP-compressed `.x` file into the equivalent uncompressed file.
///
/// `raw` is the whole file including its 16-byte header. The result starts with
/// the same header rewritten to the matching uncompressed flavor, so it can be
/// dispatched exactly like a file that was never compressed.
///
/// Layout after the header: a `u32` total size, then blocks of
/// `u16 uncompressed, u16 compressed, "CK", raw deflate`. Blocks may refer back
/// into earlier blocks' output, so everything is inflated into one buffer.
pub fn decompress(raw: &[u8], limit: usize) -> Result<Vec<u8>, MsZipError> {
	let header = XofHeader::parse(raw).map_err(|_| MsZipError::Truncated)?;
	let size_field = raw.get(XofHeader::SIZE..XofHeader::SIZE + SIZE_FIELD).ok_or(MsZipError::Truncated)?;
	let declared = u32::from_le_bytes([size_field[0], size_field[1], size_field[2], size_field[3]]) as usize;

	let plain = XofHeader {
		encoding: header.encoding.uncompressed(),
		..header
	};
	let mut out = plain.to_bytes().to_vec();
	out.reserve(declared.min(limit));

	let mut pos = XofHeader::SIZE + SIZE_FIELD;
	let mut block = 0_usize;
	while pos < raw.len() {
		let head = raw.get(pos..pos + BLOCK_HEAD).ok_or(MsZipError::BlockTruncated { block, at: pos })?;
		let expected = usize::from(u16::from_le_bytes([head[0], head[1]]));
		let compressed = usize::from(u16::from_le_bytes([head[2], head[3]]));

		let body_at = pos + BLOCK_HEAD;
		let body = raw
			.get(body_at..body_at + compressed)
			.ok_or(MsZipError::BlockTruncated { block, at: pos })?;
		if body.len() < SIGNATURE.len() || &body[..SIGNATURE.len()] != SIGNATURE {
			return Err(MsZipError::BadSignature { block, at: body_at });
		}

		let start = out.len();
		if start - XofHeader::SIZE + expected > limit {
			return Err(MsZipError::TooLarge { limit });
		}
		out.resize(start + expected, 0);

		let mut inflater = Box::<DecompressorOxide>::default();
		let (status, _, written) = inflate(&mut inflater, &body[SIGNATURE.len()..], &mut out, start, TINFL_FLAG_USING_NON_WRAPPING_OUTPUT_BUF);
		if status != TINFLStatus::Done {
			return Err(MsZipError::Inflate {
				block,
				status: format!("{status:?}"),
			});
		}
		if written != expected {
			return Err(MsZipError::BlockSize {
				block,
				expected,
				actual: written,
			});
		}

		pos = body_at + compressed;
		block += 1;
	}

	let inflated = out.len() - XofHeader::SIZE;
	if declared != inflated && declared != out.len() {
		tracing::debug!(declared, inflated, "mszip size field disagrees with inflated length");
	}
	tracing::debug!(blocks = block, bytes = inflated, "mszip payload inflated");

	Ok(out)
}
