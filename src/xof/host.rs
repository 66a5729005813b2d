use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::Serialize;

use crate::xof::Severity;

/// Opaque handle returned by a host for a registered texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TextureHandle(pub u32);

/// Parameters passed along with a texture registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParameters {
	/// RGB color treated as transparent.
	pub transparent_color: [u8; 3],
}

impl Default for TextureParameters {
	fn default() -> Self {
		Self {
			transparent_color: [0, 0, 0],
		}
	}
}

/// Services the decoder consumes from its embedding loader.
///
/// Implementations must be callable from whichever thread runs the decode.
pub trait Host {
	/// Register a texture file, returning a handle when accepted.
	fn register_texture(&self, path: &Path, params: &TextureParameters) -> Option<TextureHandle>;

	/// Receive each diagnostic of a finished decode, in recording order.
	fn report(&self, _severity: Severity, _texture_related: bool, _text: &str) {}

	/// Polled between records; returning `true` aborts the decode.
	fn is_cancelled(&self) -> bool {
		false
	}
}

/// Default host: hands out sequential handles and logs reports.
#[derive(Debug, Default)]
pub struct LogHost {
	next: AtomicU32,
	cancelled: AtomicBool,
}

impl LogHost {
	/// Create a host with no registered textures.
	pub fn new() -> Self {
		Self::default()
	}

	/// Request cancellation of decodes using this host.
	pub fn cancel(&self) {
		self.cancelled.store(true, Ordering::Relaxed);
	}

	/// Number of textures registered so far.
	pub fn registered(&self) -> u32 {
		self.next.load(Ordering::Relaxed)
	}
}

impl Host for LogHost {
	fn register_texture(&self, path: &Path, params: &TextureParameters) -> Option<TextureHandle> {
		let handle = TextureHandle(self.next.fetch_add(1, Ordering::Relaxed));
		tracing::debug!(path = %path.display(), ?params, handle = handle.0, "texture registered");
		Some(handle)
	}

	fn report(&self, severity: Severity, texture_related: bool, text: &str) {
		tracing::trace!(severity = severity.as_str(), texture_related, "{text}");
	}

	fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::Relaxed)
	}
}
