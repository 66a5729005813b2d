use std::path::PathBuf;

use serde::Serialize;

use crate::xof::TextureHandle;

/// One output vertex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vertex {
	/// Object-space position.
	pub position: [f32; 3],
	/// Texture coordinates, when supplied.
	pub uv: Option<[f32; 2]>,
	/// Per-vertex RGBA override, when supplied.
	pub color: Option<[f32; 4]>,
}

impl Vertex {
	/// Vertex at `position` with no attributes.
	pub fn at(position: [f32; 3]) -> Self {
		Self {
			position,
			uv: None,
			color: None,
		}
	}
}

/// Corner of a face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaceVertex {
	/// Index into [`Mesh::vertices`].
	pub index: u32,
	/// Corner normal; zero when none was supplied or derivable.
	pub normal: [f32; 3],
}

/// Polygon referencing the shared vertex list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Face {
	/// Index into [`Mesh::materials`].
	pub material: u32,
	/// Corners in winding order.
	pub vertices: Vec<FaceVertex>,
}

/// Surface description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
	/// Diffuse RGBA, each channel in `[0, 1]`.
	pub base_color: [f32; 4],
	/// Specular RGB, each channel in `[0, 1]`.
	pub specular_color: [f32; 3],
	/// Emissive RGB, each channel in `[0, 1]`.
	pub emissive_color: [f32; 3],
	/// Specular exponent.
	pub power: f32,
	/// Resolved texture file.
	pub texture: Option<PathBuf>,
	/// Handle returned by the host for [`Self::texture`].
	pub texture_handle: Option<TextureHandle>,
	/// Texels matching the registered color key (black) are transparent.
	pub transparent: bool,
}

impl Default for Material {
	fn default() -> Self {
		Self {
			base_color: [1.0; 4],
			specular_color: [0.0; 3],
			emissive_color: [0.0; 3],
			power: 0.0,
			texture: None,
			texture_handle: None,
			transparent: false,
		}
	}
}

impl Material {
	/// Whether any emissive channel is lit.
	pub fn is_emissive(&self) -> bool {
		self.emissive_color.iter().any(|channel| *channel != 0.0)
	}
}

/// Decoded static geometry of one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mesh {
	/// Shared vertex pool.
	pub vertices: Vec<Vertex>,
	/// Faces in file order.
	pub faces: Vec<Face>,
	/// Materials in file order.
	pub materials: Vec<Material>,
}

impl Mesh {
	/// Fill zero corner normals with the flat normal of their face.
	///
	/// Uses Newell's method so non-planar polygons get a stable average.
	/// Degenerate faces keep zero normals.
	pub fn create_normals(&mut self) {
		for face in &mut self.faces {
			if face.vertices.iter().all(|corner| !is_zero(corner.normal)) {
				continue;
			}
			let Some(normal) = face_normal(&self.vertices, face) else {
				continue;
			};
			for corner in &mut face.vertices {
				if is_zero(corner.normal) {
					corner.normal = normal;
				}
			}
		}
	}
}

fn is_zero(v: [f32; 3]) -> bool {
	v == [0.0; 3]
}

fn face_normal(vertices: &[Vertex], face: &Face) -> Option<[f32; 3]> {
	let corners = &face.vertices;
	if corners.len() < 3 {
		return None;
	}

	let mut n = [0.0_f32; 3];
	for (idx, corner) in corners.iter().enumerate() {
		let next = &corners[(idx + 1) % corners.len()];
		let a = vertices.get(corner.index as usize)?.position;
		let b = vertices.get(next.index as usize)?.position;
		n[0] += (a[1] - b[1]) * (a[2] + b[2]);
		n[1] += (a[2] - b[2]) * (a[0] + b[0]);
		n[2] += (a[0] - b[0]) * (a[1] + b[1]);
	}
	normalize(n)
}

/// Scale `v` to unit length; `None` for zero-length or non-finite input.
pub fn normalize(v: [f32; 3]) -> Option<[f32; 3]> {
	let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
	if !len.is_finite() || len <= f32::EPSILON {
		return None;
	}
	Some([v[0] / len, v[1] / len, v[2] / len])
}
