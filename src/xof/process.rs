//! Turns a decoded record tree into a [`Mesh`].
//!
//! Every mesh found at file level (directly or inside frames) is validated and
//! appended to one output mesh with vertex and material offsets. Recoverable
//! problems become diagnostics; broken geometric relationships are fatal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::xof::mesh::normalize;
use crate::xof::path::{absolute, combine, contains_illegal_chars, file_name, is_absolute};
use crate::xof::template::{FRAME, FRAME_ROOT};
use crate::xof::{DecodeOptions, DiagnosticKind, Diagnostics, Face, FaceVertex, Host, Material, Mesh, Node, Result, Severity, TextureParameters, Value, Vertex, XofError};

/// Inputs the structure processor needs besides the tree itself.
pub struct ProcessEnv<'a> {
	/// Directory relative texture references are resolved against.
	pub base_dir: &'a Path,
	/// Options of the running decode.
	pub options: &'a DecodeOptions,
	/// Texture registration and cancellation.
	pub host: &'a dyn Host,
	/// Whether the file declared named materials.
	pub alternate_structure: bool,
}

/// Assemble the output mesh from a decoded root.
pub fn process_tree(root: &Node, env: &ProcessEnv<'_>, diagnostics: &mut Diagnostics) -> Result<Mesh> {
	let mut assembler = Assembler {
		env,
		diagnostics,
		named: HashMap::new(),
		out: Mesh::default(),
	};
	assembler.process_children(&root.children)?;

	let mut mesh = assembler.out;
	mesh.create_normals();
	tracing::debug!(
		vertices = mesh.vertices.len(),
		faces = mesh.faces.len(),
		materials = mesh.materials.len(),
		"mesh assembled"
	);
	Ok(mesh)
}

struct Assembler<'e, 'd> {
	env: &'e ProcessEnv<'e>,
	diagnostics: &'d mut Diagnostics,
	/// Named material declarations by key.
	named: HashMap<Box<str>, Material>,
	out: Mesh,
}

/// Per-mesh state before it is appended to the output.
struct MeshParts {
	vertices: Vec<Vertex>,
	faces: Vec<Face>,
	materials: Vec<Material>,
	face_materials: Vec<Option<u32>>,
}

impl Assembler<'_, '_> {
	fn process_children(&mut self, children: &[Value]) -> Result<()> {
		let mut adopted = vec![false; children.len()];
		for (idx, child) in children.iter().enumerate() {
			if adopted[idx] {
				continue;
			}
			if self.env.host.is_cancelled() {
				tracing::debug!("structure processing cancelled by host");
				return Err(XofError::Cancelled);
			}
			let Some(node) = child.as_node() else {
				self.unsupported(child.kind());
				continue;
			};

			match node.name.as_ref() {
				FRAME | FRAME_ROOT => self.process_children(&node.children)?,
				"Mesh" => {
					let orphans = if self.env.alternate_structure {
						adopt_orphans(children, idx, &mut adopted)
					} else {
						Vec::new()
					};
					self.process_mesh(node, &orphans)?;
				}
				"Header" => {}
				"Material" if node.key.is_some() => {
					let material = self.material(node)?;
					if let Some(key) = &node.key {
						self.named.insert(key.clone(), material);
					}
				}
				other => self.unsupported(other),
			}
		}
		Ok(())
	}

	fn process_mesh(&mut self, node: &Node, orphans: &[&Node]) -> Result<()> {
		if node.children.len() < 4 {
			return Err(XofError::structure(format!("Mesh has {} members, expected at least 4", node.children.len())));
		}
		let n_vertices = count_at(node, 0, "mesh vertices")?;
		let vectors = records_at(node, 1)?;
		let n_faces = count_at(node, 2, "mesh faces")?;
		let face_records = records_at(node, 3)?;
		expect_len(n_vertices, vectors.len(), "mesh vertices")?;
		expect_len(n_faces, face_records.len(), "mesh faces")?;

		let vertices = vectors.iter().map(|vector| vector3(vector, "vertex").map(Vertex::at)).collect::<Result<Vec<_>>>()?;
		let faces = face_records
			.iter()
			.map(|record| {
				let corners = face_indices(record, vertices.len(), "face vertex")?;
				Ok(Face {
					material: 0,
					vertices: corners.into_iter().map(|index| FaceVertex { index, normal: [0.0; 3] }).collect(),
				})
			})
			.collect::<Result<Vec<_>>>()?;

		let mut parts = MeshParts {
			face_materials: vec![None; faces.len()],
			vertices,
			faces,
			materials: Vec::new(),
		};

		let mut extras: Vec<&Node> = Vec::with_capacity(node.children.len() - 4 + orphans.len());
		for child in &node.children[4..] {
			match child.as_node() {
				Some(record) => extras.push(record),
				None => self.unsupported(child.kind()),
			}
		}
		extras.extend(orphans.iter().copied());
		for child in extras {
			match child.name.as_ref() {
				"MeshMaterialList" => self.material_list(child, &mut parts)?,
				"MeshTextureCoords" => texture_coords(child, &mut parts.vertices)?,
				"MeshVertexColors" => self.vertex_colors(child, &mut parts.vertices)?,
				"MeshNormals" => normals(child, &mut parts.faces)?,
				other => self.unsupported(other),
			}
		}

		self.append(parts);
		Ok(())
	}

	fn append(&mut self, mut parts: MeshParts) {
		if parts.materials.is_empty() {
			parts.materials.push(Material::default());
		}
		let vertex_offset = self.out.vertices.len() as u32;
		let material_offset = self.out.materials.len() as u32;

		for (face, material) in parts.faces.iter_mut().zip(&parts.face_materials) {
			face.material = material_offset + material.unwrap_or(0);
			for corner in &mut face.vertices {
				corner.index += vertex_offset;
			}
		}
		self.out.vertices.append(&mut parts.vertices);
		self.out.faces.append(&mut parts.faces);
		self.out.materials.append(&mut parts.materials);
	}

	fn material_list(&mut self, node: &Node, parts: &mut MeshParts) -> Result<()> {
		let n_materials = count_at(node, 0, "materials")?;
		let n_face_indexes = count_at(node, 1, "material face indexes")?;
		let Some(Value::IntArray(indexes)) = node.children.get(2) else {
			return Err(XofError::structure("MeshMaterialList face indexes are missing"));
		};
		expect_len(n_face_indexes, indexes.len(), "material face indexes")?;
		if n_face_indexes > parts.faces.len() {
			return Err(XofError::CountMismatch {
				what: "material face indexes exceed faces",
				declared: n_face_indexes as i64,
				actual: parts.faces.len(),
			});
		}

		let mut entries = Vec::new();
		for child in &node.children[3..] {
			match child {
				Value::String(reference) => {
					let material = self
						.named
						.get(&**reference)
						.cloned()
						.ok_or_else(|| XofError::structure(format!("material reference {reference:?} does not name a declared material")))?;
					entries.push(material);
				}
				Value::Node(record) if record.name.as_ref() == "Material" => entries.push(self.material(record)?),
				Value::Node(record) => self.unsupported(&record.name),
				other => return Err(XofError::structure(format!("unexpected {} in MeshMaterialList", other.kind()))),
			}
		}
		expect_len(n_materials, entries.len(), "materials")?;

		let first = parts.materials.len() as u32;
		for (face, index) in indexes.iter().enumerate() {
			if *index < 0 || *index as usize >= n_materials {
				return Err(XofError::IndexOutOfRange {
					what: "face material",
					index: i64::from(*index),
					len: n_materials,
				});
			}
			parts.face_materials[face] = Some(first + *index as u32);
		}
		if n_materials != 0 {
			for slot in parts.face_materials.iter_mut().skip(indexes.len()) {
				slot.get_or_insert(first);
			}
		}
		parts.materials.extend(entries);
		Ok(())
	}

	fn material(&mut self, node: &Node) -> Result<Material> {
		if node.children.len() < 4 {
			return Err(XofError::structure(format!("Material has {} members, expected at least 4", node.children.len())));
		}
		let base_color = self.color::<4>(&node.children[0], "ColorRGBA")?;
		let power = lenient_float(&node.children[1], "material power")? as f32;
		let specular_color = self.color::<3>(&node.children[2], "ColorRGB")?;
		let emissive_color = self.color::<3>(&node.children[3], "ColorRGB")?;

		let mut material = Material {
			base_color,
			specular_color,
			emissive_color,
			power,
			texture: None,
			texture_handle: None,
			transparent: false,
		};
		for child in &node.children[4..] {
			match child.as_node() {
				Some(record) if record.name.as_ref() == "TextureFilename" => self.texture(record, &mut material)?,
				Some(record) => self.unsupported(&record.name),
				None => self.unsupported(child.kind()),
			}
		}
		Ok(material)
	}

	fn color<const N: usize>(&mut self, value: &Value, template: &str) -> Result<[f32; N]> {
		let record = value
			.as_node()
			.filter(|record| record.children.len() == N)
			.ok_or_else(|| XofError::structure(format!("expected {template} with {N} channels")))?;
		let mut out = [0.0_f32; N];
		for (slot, channel) in out.iter_mut().zip(&record.children) {
			*slot = self.clamp_channel(lenient_float(channel, template)?, template);
		}
		Ok(out)
	}

	fn clamp_channel(&mut self, value: f64, template: &str) -> f32 {
		if (0.0..=1.0).contains(&value) {
			return value as f32;
		}
		let snapped = if value.is_nan() || value < 0.5 { 0.0 } else { 1.0 };
		self.diagnostics.push(
			Severity::Warning,
			DiagnosticKind::OutOfRangeColorChannel,
			format!("{template} channel {value} is outside [0, 1] and was set to {snapped}"),
		);
		snapped
	}

	fn texture(&mut self, node: &Node, material: &mut Material) -> Result<()> {
		let Some(Value::String(name)) = node.children.first() else {
			return Err(XofError::structure("TextureFilename does not hold a string"));
		};
		let name = name.trim();
		if name.is_empty() {
			self.diagnostics.push_texture(Severity::Information, DiagnosticKind::EmptyTexture, "material names an empty texture file");
			return Ok(());
		}
		if contains_illegal_chars(name) {
			self.diagnostics.push_texture(
				Severity::Error,
				DiagnosticKind::IllegalTexturePath,
				format!("texture file name {name:?} contains illegal characters"),
			);
			return Ok(());
		}

		let path = self.resolve_texture(name);
		if !path.exists() {
			self.diagnostics.push_texture(
				Severity::Warning,
				DiagnosticKind::MissingTexture,
				format!("texture file {} was not found", path.display()),
			);
			return Ok(());
		}
		material.texture_handle = self.env.host.register_texture(&path, &TextureParameters::default());
		material.transparent = material.texture_handle.is_some();
		material.texture = Some(path);
		Ok(())
	}

	fn resolve_texture(&self, name: &str) -> PathBuf {
		if !is_absolute(name) {
			return combine(self.env.base_dir, name);
		}
		if self.env.options.strip_absolute_texture_dirs {
			combine(self.env.base_dir, file_name(name))
		} else {
			absolute(name)
		}
	}

	fn vertex_colors(&mut self, node: &Node, vertices: &mut [Vertex]) -> Result<()> {
		let declared = count_at(node, 0, "vertex colors")?;
		let entries = records_at(node, 1)?;
		expect_len(declared, entries.len(), "vertex colors")?;

		for (position, entry) in entries.iter().enumerate() {
			let index = entry.children.first().and_then(Value::as_int);
			let color = entry.children.get(1).and_then(Value::as_node).and_then(|record| {
				let channels: Option<Vec<f32>> = record.children.iter().map(|channel| channel.as_float().map(|v| v as f32)).collect();
				channels.and_then(|channels| <[f32; 4]>::try_from(channels).ok())
			});
			let (Some(index), Some(color)) = (index, color) else {
				self.diagnostics.push(
					Severity::Warning,
					DiagnosticKind::MalformedVertexColorEntry,
					format!("vertex color entry {position} is malformed and was skipped"),
				);
				continue;
			};
			let len = vertices.len();
			let slot = usize::try_from(index)
				.ok()
				.and_then(|slot| vertices.get_mut(slot))
				.ok_or(XofError::IndexOutOfRange {
					what: "vertex color",
					index: i64::from(index),
					len,
				})?;
			slot.color = Some(color);
		}
		Ok(())
	}

	fn unsupported(&mut self, name: &str) {
		self.diagnostics.push(
			Severity::Warning,
			DiagnosticKind::UnsupportedTemplate,
			format!("template {name:?} is not supported here and was skipped"),
		);
	}
}

/// Mesh children written as siblings after the mesh, at most one of each kind,
/// up to the next mesh.
fn adopt_orphans<'n>(children: &'n [Value], mesh: usize, adopted: &mut [bool]) -> Vec<&'n Node> {
	let mut out: Vec<&Node> = Vec::new();
	for (idx, child) in children.iter().enumerate().skip(mesh + 1) {
		let Some(node) = child.as_node() else {
			continue;
		};
		match node.name.as_ref() {
			"Mesh" => break,
			name @ ("MeshTextureCoords" | "MeshNormals") if !adopted[idx] && !out.iter().any(|taken| taken.name.as_ref() == name) => {
				adopted[idx] = true;
				out.push(node);
			}
			_ => {}
		}
	}
	out
}

fn texture_coords(node: &Node, vertices: &mut [Vertex]) -> Result<()> {
	let declared = count_at(node, 0, "texture coordinates")?;
	let coords = records_at(node, 1)?;
	expect_len(declared, coords.len(), "texture coordinates")?;
	if declared > vertices.len() {
		return Err(XofError::IndexOutOfRange {
			what: "texture coordinate",
			index: declared as i64 - 1,
			len: vertices.len(),
		});
	}

	for (vertex, coord) in vertices.iter_mut().zip(coords) {
		let [u, v] = floats::<2>(coord, "texture coordinate")?;
		vertex.uv = Some([u, v]);
	}
	Ok(())
}

fn normals(node: &Node, faces: &mut [Face]) -> Result<()> {
	let n_normals = count_at(node, 0, "normals")?;
	let vectors = records_at(node, 1)?;
	expect_len(n_normals, vectors.len(), "normals")?;
	let n_face_normals = count_at(node, 2, "face normals")?;
	let face_records = records_at(node, 3)?;
	expect_len(n_face_normals, face_records.len(), "face normals")?;
	if n_face_normals > faces.len() {
		return Err(XofError::CountMismatch {
			what: "face normals exceed faces",
			declared: n_face_normals as i64,
			actual: faces.len(),
		});
	}

	let pool = vectors
		.iter()
		.map(|vector| vector3(vector, "normal").map(|n| normalize(n).unwrap_or([0.0; 3])))
		.collect::<Result<Vec<_>>>()?;

	for (face, record) in faces.iter_mut().zip(face_records) {
		let indices = face_indices(record, pool.len(), "normal")?;
		if indices.len() > face.vertices.len() {
			return Err(XofError::CountMismatch {
				what: "face normal indices exceed face vertices",
				declared: indices.len() as i64,
				actual: face.vertices.len(),
			});
		}
		for (corner, index) in face.vertices.iter_mut().zip(indices) {
			corner.normal = pool[index as usize];
		}
	}
	Ok(())
}

/// Vertex indices of a `MeshFace`, each checked against `len`.
fn face_indices(record: &Node, len: usize, what: &'static str) -> Result<Vec<u32>> {
	let declared = count_at(record, 0, "face indices")?;
	let Some(Value::IntArray(indices)) = record.children.get(1) else {
		return Err(XofError::structure("MeshFace indices are missing"));
	};
	expect_len(declared, indices.len(), "face indices")?;
	indices
		.iter()
		.map(|index| match u32::try_from(*index) {
			Ok(value) if (value as usize) < len => Ok(value),
			_ => Err(XofError::IndexOutOfRange {
				what,
				index: i64::from(*index),
				len,
			}),
		})
		.collect()
}

fn vector3(record: &Node, what: &str) -> Result<[f32; 3]> {
	floats::<3>(record, what)
}

/// Geometry components must be numbers; unparsable text here is fatal, not defaulted to `0.0`.
fn floats<const N: usize>(record: &Node, what: &str) -> Result<[f32; N]> {
	if record.children.len() != N {
		return Err(XofError::structure(format!("{what} has {} components, expected {N}", record.children.len())));
	}
	let mut out = [0.0_f32; N];
	for (slot, value) in out.iter_mut().zip(&record.children) {
		*slot = value
			.as_float()
			.ok_or_else(|| XofError::structure(format!("{what} component is a {}, expected a number", value.kind())))? as f32;
	}
	Ok(out)
}

/// Float member that tolerates unparsable text, which the decoder already reported.
fn lenient_float(value: &Value, what: &str) -> Result<f64> {
	match value {
		Value::Float(v) => Ok(*v),
		Value::String(_) => Ok(0.0),
		other => Err(XofError::structure(format!("{what} is a {}, expected a number", other.kind()))),
	}
}

fn count_at(node: &Node, idx: usize, what: &'static str) -> Result<usize> {
	let value = node.children.get(idx).and_then(Value::as_int).ok_or_else(|| XofError::structure(format!("{} count for {what} is missing", node.name)))?;
	usize::try_from(value).map_err(|_| XofError::structure(format!("negative count {value} for {what}")))
}

fn records_at(node: &Node, idx: usize) -> Result<&[Node]> {
	match node.children.get(idx) {
		Some(Value::NodeArray(items)) => Ok(items),
		_ => Err(XofError::structure(format!("{} member {idx} is not a record array", node.name))),
	}
}

fn expect_len(declared: usize, actual: usize, what: &'static str) -> Result<()> {
	if declared == actual {
		Ok(())
	} else {
		Err(XofError::CountMismatch {
			what,
			declared: declared as i64,
			actual,
		})
	}
}

#[cfg(test)]
mod tests;
