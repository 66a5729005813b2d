use std::path::PathBuf;

use serde::Serialize;
use xofdoc::xof::{DecodeOptions, Diagnostic, DiagnosticKind, LogHost, Material, Mesh, Result, Source, decode};

use crate::cmd::util::{emit_json, truncate};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
	/// Look up absolute texture paths next to the model instead.
	#[arg(long)]
	pub lenient: bool,
}

#[derive(Serialize)]
struct MeshJson<'a> {
	path: String,
	ok: bool,
	error: Option<String>,
	mesh: Option<&'a Mesh>,
	diagnostics: &'a [Diagnostic],
}

/// Decode the file to a mesh and print it.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json, lenient } = args;

	let options = if lenient { DecodeOptions::lenient() } else { DecodeOptions::default() };
	let host = LogHost::new();
	let report = decode(Source::Path(path.clone()), &options, &host);

	if json {
		emit_json(&MeshJson {
			path: path.display().to_string(),
			ok: report.is_ok(),
			error: report.mesh.as_ref().err().map(ToString::to_string),
			mesh: report.mesh.as_ref().ok(),
			diagnostics: &report.diagnostics,
		});
	} else {
		println!("path: {}", path.display());
		if let Ok(mesh) = &report.mesh {
			print_summary(mesh);
		}
		// The fatal error reaches stderr through main.
		let listed: Vec<&Diagnostic> = report.diagnostics.iter().filter(|item| item.kind != DiagnosticKind::Fatal).collect();
		if !listed.is_empty() {
			println!("diagnostics:");
			for item in listed {
				println!("  {}: {}", item.severity.as_str(), item.message);
			}
		}
	}

	report.mesh.map(|_| ())
}

fn print_summary(mesh: &Mesh) {
	let corners: usize = mesh.faces.iter().map(|face| face.vertices.len()).sum();
	println!("vertices: {}", mesh.vertices.len());
	println!("faces: {}", mesh.faces.len());
	println!("face_corners: {corners}");
	println!("textured_vertices: {}", mesh.vertices.iter().filter(|vertex| vertex.uv.is_some()).count());
	println!("colored_vertices: {}", mesh.vertices.iter().filter(|vertex| vertex.color.is_some()).count());
	println!("materials:");
	for (idx, material) in mesh.materials.iter().enumerate() {
		println!("  [{idx}] {}", material_label(material));
	}
}

fn material_label(material: &Material) -> String {
	let [r, g, b, a] = material.base_color;
	let mut out = format!("base=({r}, {g}, {b}, {a}) power={}", material.power);
	if material.is_emissive() {
		let [r, g, b] = material.emissive_color;
		out.push_str(&format!(" emissive=({r}, {g}, {b})"));
	}
	if let Some(texture) = &material.texture {
		out.push_str(&format!(" texture={}", truncate(&texture.display().to_string(), 80)));
	}
	out
}
