mod binary;
mod bytes;
mod compression;
mod decode;
mod diag;
mod error;
mod file;
mod header;
mod host;
mod mesh;
mod path;
mod preprocess;
mod process;
mod template;
mod text;
mod value;

/// Binary token stream decoder.
pub use binary::decode_binary_tree;
/// MSZIP unwrapping of compressed flavors.
pub use compression::{MAX_DECOMPRESSED_BYTES, decompress};
/// Decode entry point, per-decode context and options.
pub use decode::{DecodeContext, DecodeOptions, DecodeReport, Source, TextEncoding, decode};
/// Recoverable diagnostics.
pub use diag::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
/// Error and result aliases.
pub use error::{MsZipError, Result, XofError};
/// File abstraction and header sniffing.
pub use file::{XofFile, sniff};
/// File header representation.
pub use header::{Encoding, FloatWidth, XofHeader};
/// Loader collaborator interface and the logging default.
pub use host::{Host, LogHost, TextureHandle, TextureParameters};
/// Output geometry types.
pub use mesh::{Face, FaceVertex, Material, Mesh, Vertex};
/// Structure processor.
pub use process::{ProcessEnv, process_tree};
/// Template schema catalog.
pub use template::{ArrayLen, Element, MemberSpec, Registry, ScalarKind, Template, is_folded};
/// Textual decoder.
pub use text::decode_text_tree;
/// Generic decoded record tree.
pub use value::{Node, Value};
