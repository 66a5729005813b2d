use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use crate::xof::compression::MAX_DECOMPRESSED_BYTES;
use crate::xof::process::{ProcessEnv, process_tree};
use crate::xof::{Diagnostic, DiagnosticKind, Diagnostics, Host, Mesh, Registry, Result, Severity, Template, XofError, XofFile};

/// Character set used to interpret textual payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
	/// UTF-8; invalid sequences become U+FFFD.
	#[default]
	Utf8,
	/// ISO-8859-1, one byte per character.
	Latin1,
}

impl TextEncoding {
	/// Decode `bytes` into text.
	pub fn decode(self, bytes: &[u8]) -> Cow<'_, str> {
		match self {
			Self::Utf8 => String::from_utf8_lossy(bytes),
			Self::Latin1 => Cow::Owned(bytes.iter().map(|byte| char::from(*byte)).collect()),
		}
	}
}

/// Runtime limits and behavior switches for decoding.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
	/// Text encoding hint for textual payloads.
	pub encoding: TextEncoding,
	/// Maximum record nesting depth.
	pub max_depth: u32,
	/// Maximum declared array element count.
	pub max_array_elems: usize,
	/// Maximum decompressed payload size.
	pub max_decompressed_bytes: usize,
	/// Keep only the file name of absolute texture paths and look for it next to the model.
	pub strip_absolute_texture_dirs: bool,
	/// Records decoded between cancellation checks.
	pub cancel_check_interval: u32,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self {
			encoding: TextEncoding::Utf8,
			max_depth: 64,
			max_array_elems: 1 << 24,
			max_decompressed_bytes: MAX_DECOMPRESSED_BYTES,
			strip_absolute_texture_dirs: false,
			cancel_check_interval: 64,
		}
	}
}

impl DecodeOptions {
	/// Preset for legacy content authored against absolute texture paths.
	pub fn lenient() -> Self {
		Self {
			strip_absolute_texture_dirs: true,
			..Self::default()
		}
	}
}

/// Per-decode state threaded through both decoders.
///
/// Holds the alternate-structure flag, nesting depth, the cancellation
/// counter and the diagnostic sink. Nothing here is shared between decodes.
pub struct DecodeContext<'a> {
	options: &'a DecodeOptions,
	host: &'a dyn Host,
	registry: &'static Registry,
	diagnostics: Diagnostics,
	alternate_structure: bool,
	depth: u32,
	records: u32,
}

impl<'a> DecodeContext<'a> {
	/// Fresh context for one file.
	pub fn new(options: &'a DecodeOptions, host: &'a dyn Host) -> Self {
		Self {
			options,
			host,
			registry: Registry::global(),
			diagnostics: Diagnostics::new(),
			alternate_structure: false,
			depth: 0,
			records: 0,
		}
	}

	/// Options in effect.
	pub fn options(&self) -> &'a DecodeOptions {
		self.options
	}

	/// Host collaborator.
	pub fn host(&self) -> &'a dyn Host {
		self.host
	}

	/// Diagnostics recorded so far.
	pub fn diagnostics(&self) -> &Diagnostics {
		&self.diagnostics
	}

	/// Mutable diagnostic sink.
	pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
		&mut self.diagnostics
	}

	/// Name `path` in every diagnostic recorded from here on.
	pub fn with_file(mut self, path: &Path) -> Self {
		self.diagnostics = Diagnostics::for_file(path);
		self
	}

	/// Consume the context, keeping its diagnostics.
	pub fn into_diagnostics(self) -> Diagnostics {
		self.diagnostics
	}

	/// Whether a named material declaration was seen.
	pub fn alternate_structure(&self) -> bool {
		self.alternate_structure
	}

	/// Resolve a record header through the registry.
	///
	/// A named material switches the decode to the alternate structure, after
	/// which material lists accept trailing material references.
	pub fn resolve(&mut self, name: &str) -> Template {
		let template = self.registry.lookup(name);
		if template.is_named_material() && !self.alternate_structure {
			tracing::debug!(name, "named material switches to alternate structure");
			self.alternate_structure = true;
		}
		if self.alternate_structure {
			template.with_material_references()
		} else {
			template
		}
	}

	pub(crate) fn enter(&mut self) -> Result<()> {
		if self.depth >= self.options.max_depth {
			return Err(XofError::DepthExceeded {
				max_depth: self.options.max_depth,
			});
		}
		self.depth += 1;
		Ok(())
	}

	pub(crate) fn leave(&mut self) {
		self.depth = self.depth.saturating_sub(1);
	}

	/// Count one decoded record, polling the host every `cancel_check_interval`.
	pub(crate) fn tick(&mut self) -> Result<()> {
		self.records = self.records.wrapping_add(1);
		let interval = self.options.cancel_check_interval.max(1);
		if self.records % interval == 0 && self.host.is_cancelled() {
			tracing::debug!(records = self.records, "decode cancelled by host");
			return Err(XofError::Cancelled);
		}
		Ok(())
	}

	pub(crate) fn check_array(&self, count: usize) -> Result<usize> {
		if count > self.options.max_array_elems {
			return Err(XofError::ArrayTooLarge {
				count,
				max: self.options.max_array_elems,
			});
		}
		Ok(count)
	}

	pub(crate) fn warn_scalar(&mut self, template: &str, at: usize, text: &str, kind: &str) {
		self.diagnostics.push(
			Severity::Warning,
			DiagnosticKind::MalformedScalar,
			format!("{kind} could not be parsed from {text:?} at {at} in template {template}"),
		);
	}
}

/// Input to [`decode`].
#[derive(Debug, Clone)]
pub enum Source {
	/// Read the file at this path.
	Path(PathBuf),
	/// Decode an in-memory buffer; `name` locates textures and labels messages.
	Bytes {
		/// Logical file path.
		name: PathBuf,
		/// Whole file contents.
		bytes: Vec<u8>,
	},
}

impl Source {
	/// Path the source is known by.
	pub fn name(&self) -> &Path {
		match self {
			Self::Path(path) => path,
			Self::Bytes { name, .. } => name,
		}
	}
}

/// Outcome of [`decode`].
#[derive(Debug)]
pub struct DecodeReport {
	/// Decoded mesh, or the fatal error that stopped the decode.
	pub mesh: Result<Mesh>,
	/// Every diagnostic in recording order, including the fatal one.
	pub diagnostics: Vec<Diagnostic>,
}

impl DecodeReport {
	/// Whether a mesh was produced.
	pub fn is_ok(&self) -> bool {
		self.mesh.is_ok()
	}
}

/// Decode a `.x` file into a mesh.
///
/// Never fails past its own boundary: a fatal error is returned inside the
/// report and also appended to its diagnostics. Every diagnostic message
/// starts with the source's file name. Cancellation yields
/// [`XofError::Cancelled`] without a diagnostic.
pub fn decode(source: Source, options: &DecodeOptions, host: &dyn Host) -> DecodeReport {
	let mut ctx = DecodeContext::new(options, host).with_file(source.name());
	let mesh = decode_source(source, &mut ctx);
	let mut diagnostics = ctx.into_diagnostics();

	if let Err(err) = &mesh
		&& !matches!(err, XofError::Cancelled)
	{
		diagnostics.push(Severity::Error, DiagnosticKind::Fatal, err.to_string());
	}
	for item in diagnostics.items() {
		host.report(item.severity, item.texture_related, &item.message);
	}

	DecodeReport {
		mesh,
		diagnostics: diagnostics.into_vec(),
	}
}

fn decode_source(source: Source, ctx: &mut DecodeContext<'_>) -> Result<Mesh> {
	let limit = ctx.options().max_decompressed_bytes;
	let file = match source {
		Source::Path(path) => {
			let bytes = fs::read(&path)?;
			XofFile::from_bytes(path, bytes, limit)?
		}
		Source::Bytes { name, bytes } => XofFile::from_bytes(name, bytes, limit)?,
	};

	let tree = file.tree(ctx)?;
	let env = ProcessEnv {
		base_dir: file.base_dir(),
		options: ctx.options(),
		host: ctx.host(),
		alternate_structure: ctx.alternate_structure(),
	};
	process_tree(&tree, &env, ctx.diagnostics_mut())
}
