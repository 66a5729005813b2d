use std::borrow::Cow;

use ArrayLen::Member;
use Element::{Record, Scalar as ScalarOf};
use MemberSpec::{AnyChildren, Array, Nested, References, Scalar, Unknown};
use ScalarKind::{Dword, Float, String as Str};

/// Primitive scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
	/// 32-bit integer.
	Dword,
	/// Floating-point value (32 or 64 bit on disk, widened to `f64`).
	Float,
	/// Quoted string.
	String,
}

/// Element count source for an array member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayLen {
	/// Literal element count.
	Fixed(usize),
	/// Index of an earlier `Dword` member of the same record holding the count.
	Member(usize),
}

/// Element type of an array member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
	/// Array of primitive scalars.
	Scalar(ScalarKind),
	/// Array of inline records of the named template.
	Record(&'static str),
}

/// One member descriptor of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberSpec {
	/// Single primitive value.
	Scalar(ScalarKind),
	/// Array with a literal or back-referenced length.
	Array {
		/// Element type.
		element: Element,
		/// Element count source.
		len: ArrayLen,
	},
	/// Inline record of the named template, terminated by `;`.
	Nested(&'static str),
	/// Zero or more references to externally declared named records.
	References,
	/// Zero or more named child records until the closing brace.
	AnyChildren,
	/// Opaque content skipped until the closing brace.
	Unknown,
}

impl MemberSpec {
	/// Whether this member consumes the record's closing delimiter itself.
	pub fn is_open_ended(self) -> bool {
		matches!(self, Self::AnyChildren | Self::Unknown)
	}
}

/// Resolved schema for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
	/// Canonical name, or the raw name for unknown templates.
	pub name: Cow<'static, str>,
	/// Members in declaration order.
	pub members: &'static [MemberSpec],
	/// Label carried by named material declarations.
	pub key: Option<Box<str>>,
}

impl Template {
	/// Anonymous file-root template.
	pub fn root() -> Self {
		Self {
			name: Cow::Borrowed(""),
			members: ANY,
			key: None,
		}
	}

	/// Whether this is the anonymous file root.
	pub fn is_root(&self) -> bool {
		self.name.is_empty()
	}

	/// Whether this is a `Material <label>` declaration.
	pub fn is_named_material(&self) -> bool {
		self.key.is_some() && self.name == "Material"
	}

	/// Whether the final member already consumes the closing delimiter.
	pub fn ends_open(&self) -> bool {
		self.members.last().is_some_and(|member| member.is_open_ended())
	}

	/// `MeshMaterialList` variant that accepts trailing material references.
	pub fn with_material_references(self) -> Self {
		if self.name == "MeshMaterialList" {
			Self {
				members: MESH_MATERIAL_LIST_REFS,
				..self
			}
		} else {
			self
		}
	}

	fn unknown(name: &str) -> Self {
		Self {
			name: Cow::Owned(name.to_owned()),
			members: UNKNOWN,
			key: None,
		}
	}
}

const ANY: &[MemberSpec] = &[AnyChildren];
const UNKNOWN: &[MemberSpec] = &[Unknown];

const MESH: &[MemberSpec] = &[
	Scalar(Dword),
	Array {
		element: Record("Vector"),
		len: Member(0),
	},
	Scalar(Dword),
	Array {
		element: Record("MeshFace"),
		len: Member(2),
	},
	AnyChildren,
];
const VECTOR: &[MemberSpec] = &[Scalar(Float), Scalar(Float), Scalar(Float)];
const MESH_FACE: &[MemberSpec] = &[
	Scalar(Dword),
	Array {
		element: ScalarOf(Dword),
		len: Member(0),
	},
];
const MESH_MATERIAL_LIST: &[MemberSpec] = &[
	Scalar(Dword),
	Scalar(Dword),
	Array {
		element: ScalarOf(Dword),
		len: Member(1),
	},
	AnyChildren,
];
const MESH_MATERIAL_LIST_REFS: &[MemberSpec] = &[
	Scalar(Dword),
	Scalar(Dword),
	Array {
		element: ScalarOf(Dword),
		len: Member(1),
	},
	References,
	AnyChildren,
];
const MATERIAL: &[MemberSpec] = &[Nested("ColorRGBA"), Scalar(Float), Nested("ColorRGB"), Nested("ColorRGB"), AnyChildren];
const COLOR_RGBA: &[MemberSpec] = &[Scalar(Float), Scalar(Float), Scalar(Float), Scalar(Float)];
const COLOR_RGB: &[MemberSpec] = &[Scalar(Float), Scalar(Float), Scalar(Float)];
const TEXTURE_FILENAME: &[MemberSpec] = &[Scalar(Str)];
const MESH_TEXTURE_COORDS: &[MemberSpec] = &[
	Scalar(Dword),
	Array {
		element: Record("Coords2d"),
		len: Member(0),
	},
];
const COORDS_2D: &[MemberSpec] = &[Scalar(Float), Scalar(Float)];
const MESH_VERTEX_COLORS: &[MemberSpec] = &[
	Scalar(Dword),
	Array {
		element: Record("IndexedColor"),
		len: Member(0),
	},
];
const INDEXED_COLOR: &[MemberSpec] = &[Scalar(Dword), Nested("ColorRGBA")];
const MESH_NORMALS: &[MemberSpec] = &[
	Scalar(Dword),
	Array {
		element: Record("Vector"),
		len: Member(0),
	},
	Scalar(Dword),
	Array {
		element: Record("MeshFace"),
		len: Member(2),
	},
];

/// Names of frame wrappers that the structure processor descends into.
pub const FRAME_ROOT: &str = "Frame Root";
/// Plain frame wrapper name.
pub const FRAME: &str = "Frame";

static CATALOG: &[(&str, &[MemberSpec])] = &[
	("Mesh", MESH),
	("Vector", VECTOR),
	("MeshFace", MESH_FACE),
	("MeshMaterialList", MESH_MATERIAL_LIST),
	("Material", MATERIAL),
	("ColorRGBA", COLOR_RGBA),
	("ColorRGB", COLOR_RGB),
	("TextureFilename", TEXTURE_FILENAME),
	("MeshTextureCoords", MESH_TEXTURE_COORDS),
	("Coords2d", COORDS_2D),
	("MeshVertexColors", MESH_VERTEX_COLORS),
	("IndexedColor", INDEXED_COLOR),
	("MeshNormals", MESH_NORMALS),
	(FRAME_ROOT, ANY),
	(FRAME, ANY),
	("FrameTransformMatrix", UNKNOWN),
];

/// Template declarations and records that are folded into their parent
/// instead of being kept as content.
const FOLDED: &[&str] = &[
	"template meshface",
	"template vector",
	"template mesh",
	"template colorrgba",
	"template colorrgb",
	"template material",
	"template meshmateriallist",
	"template coords2d",
	"template meshtexturecoords",
	"template meshnormals",
	"template texturefilename",
	"template meshvertexcolors",
	"frametransformmatrix",
];

/// Read-only catalog of named record schemas.
#[derive(Debug)]
pub struct Registry {
	entries: &'static [(&'static str, &'static [MemberSpec])],
}

static GLOBAL: Registry = Registry { entries: CATALOG };

impl Registry {
	/// Process-wide registry holding the static catalog.
	pub fn global() -> &'static Self {
		&GLOBAL
	}

	/// Exact case-insensitive catalog match.
	pub fn get(&self, name: &str) -> Option<Template> {
		self.entries.iter().find(|(entry, _)| entry.eq_ignore_ascii_case(name)).map(|&(entry, members)| Template {
			name: Cow::Borrowed(entry),
			members,
			key: None,
		})
	}

	/// Resolve a record header to a template.
	///
	/// Falls back to the frame wrapper for `frame <label>`, the mesh schema for
	/// `mesh <label>`, a keyed material schema for `material <label>`, and an
	/// opaque schema for anything else.
	pub fn lookup(&self, name: &str) -> Template {
		let name = name.trim();
		if let Some(found) = self.get(name) {
			return found;
		}

		let lower = name.to_ascii_lowercase();
		if lower.starts_with("frame ") {
			return self.get(FRAME_ROOT).unwrap_or_else(|| Template::unknown(name));
		}
		if lower.starts_with("mesh ") {
			return self.get("Mesh").unwrap_or_else(|| Template::unknown(name));
		}

		let mut words = name.split_whitespace();
		if let (Some(first), Some(label)) = (words.next(), words.next()) {
			if first.eq_ignore_ascii_case("material") {
				return Template {
					name: Cow::Borrowed("Material"),
					members: MATERIAL,
					key: Some(label.into()),
				};
			}
		}

		Template::unknown(name)
	}

	/// Whether the first word of `text` names a catalog template.
	pub fn is_template_name(&self, text: &str) -> bool {
		text.split_whitespace().next().is_some_and(|word| self.get(word).is_some())
	}
}

/// Whether a child record named `name` is folded away instead of kept as content.
///
/// Covers re-declarations of the built-in templates, transform matrices and
/// empty-named data references.
pub fn is_folded(name: &str) -> bool {
	let name = name.trim();
	name.is_empty() || FOLDED.iter().any(|item| item.eq_ignore_ascii_case(name))
}
