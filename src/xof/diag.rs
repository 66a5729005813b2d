use std::path::Path;

use serde::Serialize;

/// Diagnostic severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
	/// Informational note.
	Information,
	/// Recoverable problem; a default was substituted.
	Warning,
	/// Problem that lost content or aborted the decode.
	Error,
}

impl Severity {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Information => "info",
			Self::Warning => "warning",
			Self::Error => "error",
		}
	}
}

/// Category of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
	/// Scalar text could not be parsed; a default was used.
	MalformedScalar,
	/// Color channel outside `[0, 1]` was clamped.
	OutOfRangeColorChannel,
	/// Record type is not understood and was skipped.
	UnsupportedTemplate,
	/// Referenced texture file does not exist.
	MissingTexture,
	/// Texture filename was empty.
	EmptyTexture,
	/// Texture filename contains characters that are not valid in a path.
	IllegalTexturePath,
	/// One vertex color entry was malformed and skipped.
	MalformedVertexColorEntry,
	/// The decode stopped on a fatal error.
	Fatal,
}

/// One recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
	/// Severity level.
	pub severity: Severity,
	/// Category.
	pub kind: DiagnosticKind,
	/// Whether the message concerns a texture reference.
	pub texture_related: bool,
	/// Human-readable message.
	pub message: String,
}

/// Ordered diagnostic sink shared by the decoders and the structure processor.
///
/// Every entry is mirrored to `tracing` at the matching level when pushed.
/// A sink created with [`Diagnostics::for_file`] prefixes each message with
/// the file it concerns.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
	items: Vec<Diagnostic>,
	file: Option<Box<str>>,
}

impl Diagnostics {
	/// Create an empty sink.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an empty sink whose messages name `path`.
	pub fn for_file(path: &Path) -> Self {
		Self {
			items: Vec::new(),
			file: Some(path.display().to_string().into_boxed_str()),
		}
	}

	/// File named in messages, if any.
	pub fn file(&self) -> Option<&str> {
		self.file.as_deref()
	}

	/// Record a diagnostic.
	pub fn push(&mut self, severity: Severity, kind: DiagnosticKind, message: impl Into<String>) {
		self.record(severity, kind, false, message.into());
	}

	/// Record a texture-related diagnostic.
	pub fn push_texture(&mut self, severity: Severity, kind: DiagnosticKind, message: impl Into<String>) {
		self.record(severity, kind, true, message.into());
	}

	fn record(&mut self, severity: Severity, kind: DiagnosticKind, texture_related: bool, message: String) {
		let message = match &self.file {
			Some(file) => format!("{file}: {message}"),
			None => message,
		};
		match severity {
			Severity::Information => tracing::info!(?kind, texture_related, "{message}"),
			Severity::Warning => tracing::warn!(?kind, texture_related, "{message}"),
			Severity::Error => tracing::error!(?kind, texture_related, "{message}"),
		}
		self.items.push(Diagnostic {
			severity,
			kind,
			texture_related,
			message,
		});
	}

	/// Recorded diagnostics in push order.
	pub fn items(&self) -> &[Diagnostic] {
		&self.items
	}

	/// Number of recorded diagnostics.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Whether nothing was recorded.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Number of entries at `severity`.
	pub fn count(&self, severity: Severity) -> usize {
		self.items.iter().filter(|item| item.severity == severity).count()
	}

	/// Number of entries of `kind`.
	pub fn count_kind(&self, kind: DiagnosticKind) -> usize {
		self.items.iter().filter(|item| item.kind == kind).count()
	}

	/// Consume the sink.
	pub fn into_vec(self) -> Vec<Diagnostic> {
		self.items
	}
}
