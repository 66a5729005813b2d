use std::fs;
use std::path::Path;

use crate::xof::{
	DecodeContext, DecodeOptions, DiagnosticKind, Diagnostics, LogHost, Mesh, ProcessEnv, Result, Severity, TextureHandle, Value, XofError,
	decode_text_tree, process_tree,
};

struct Run {
	mesh: Result<Mesh>,
	diagnostics: Diagnostics,
	textures: u32,
}

fn run_in(text: &str, base_dir: &Path, options: DecodeOptions) -> Run {
	let host = LogHost::new();
	let mut ctx = DecodeContext::new(&options, &host);
	let tree = decode_text_tree(text, &mut ctx).expect("decodes");
	let alternate_structure = ctx.alternate_structure();
	let mut diagnostics = ctx.into_diagnostics();

	let env = ProcessEnv {
		base_dir,
		options: &options,
		host: &host,
		alternate_structure,
	};
	let mesh = process_tree(&tree, &env, &mut diagnostics);
	Run {
		mesh,
		diagnostics,
		textures: host.registered(),
	}
}

fn run(text: &str) -> Run {
	run_in(text, Path::new("."), DecodeOptions::default())
}

fn triangle_with(extra: &str) -> String {
	format!("xof 0302txt 0032\nMesh {{\n 3;\n 0.0;0.0;0.0;,\n 1.0;0.0;0.0;,\n 0.0;1.0;0.0;;\n 1;\n 3;0,1,2;;\n{extra}\n}}\n")
}

fn material_list(color: &str, extra: &str) -> String {
	format!("MeshMaterialList {{\n 1;\n 1;\n 0;;\n Material {{\n  {color};;\n  0.0;\n  0.0;0.0;0.0;;\n  0.0;0.0;0.0;;\n{extra}\n }}\n}}")
}

fn texture(name: &str) -> String {
	material_list("1.0;1.0;1.0;1.0", &format!("  TextureFilename {{ \"{name}\"; }}"))
}

#[test]
fn triangle_gets_default_white_material() {
	let out = run(&triangle_with(""));
	let mesh = out.mesh.expect("mesh");
	assert_eq!(mesh.vertices.len(), 3);
	assert_eq!(mesh.faces.len(), 1);
	assert_eq!(mesh.materials.len(), 1);
	assert_eq!(mesh.materials[0].base_color, [1.0; 4]);
	assert_eq!(mesh.faces[0].material, 0);
	assert!(mesh.faces[0].vertices.iter().all(|corner| corner.normal == [0.0, 0.0, 1.0]));
	assert!(out.diagnostics.is_empty());
}

#[test]
fn material_list_sets_base_color() {
	let out = run(&triangle_with(&material_list("1.0;0.0;0.0;1.0", "")));
	let mesh = out.mesh.expect("mesh");
	assert_eq!(mesh.materials.len(), 1);
	assert_eq!(mesh.materials[0].base_color, [1.0, 0.0, 0.0, 1.0]);
	assert_eq!(mesh.materials[0].texture, None);
	assert_eq!(mesh.faces[0].material, 0);
}

#[test]
fn out_of_range_channels_snap_to_nearer_bound() {
	let out = run(&triangle_with(&material_list("1.5;-0.2;0.4;1.0", "")));
	let mesh = out.mesh.expect("mesh");
	assert_eq!(mesh.materials[0].base_color, [1.0, 0.0, 0.4, 1.0]);
	assert_eq!(out.diagnostics.count_kind(DiagnosticKind::OutOfRangeColorChannel), 2);
	assert_eq!(out.diagnostics.count(Severity::Warning), 2);
}

#[test]
fn texture_coords_beyond_vertices_are_fatal() {
	let coords = "MeshTextureCoords {\n 4;\n 0.0;0.0;,\n 1.0;0.0;,\n 0.0;1.0;,\n 1.0;1.0;;\n}";
	let out = run(&triangle_with(coords));
	let err = out.mesh.expect_err("range error");
	assert!(matches!(err, XofError::IndexOutOfRange { what: "texture coordinate", len: 3, .. }));
}

#[test]
fn texture_coords_are_assigned_by_vertex() {
	let coords = "MeshTextureCoords {\n 2;\n 0.25;0.5;,\n 1.0;0.0;;\n}";
	let mesh = run(&triangle_with(coords)).mesh.expect("mesh");
	assert_eq!(mesh.vertices[0].uv, Some([0.25, 0.5]));
	assert_eq!(mesh.vertices[1].uv, Some([1.0, 0.0]));
	assert_eq!(mesh.vertices[2].uv, None);
}

#[test]
fn malformed_vertex_color_entry_is_skipped() {
	let colors = "MeshVertexColors {\n 2;\n 0;abc;0.0;0.0;1.0;;,\n 1;0.0;1.0;0.0;1.0;;;\n}";
	let out = run(&triangle_with(colors));
	let mesh = out.mesh.expect("mesh");
	assert_eq!(mesh.vertices[0].color, None);
	assert_eq!(mesh.vertices[1].color, Some([0.0, 1.0, 0.0, 1.0]));
	assert_eq!(out.diagnostics.count_kind(DiagnosticKind::MalformedVertexColorEntry), 1);
	assert_eq!(out.diagnostics.count_kind(DiagnosticKind::MalformedScalar), 1);
}

#[test]
fn vertex_color_index_out_of_range_is_fatal() {
	let colors = "MeshVertexColors {\n 1;\n 7;0.0;1.0;0.0;1.0;;;\n}";
	let err = run(&triangle_with(colors)).mesh.expect_err("range error");
	assert!(matches!(err, XofError::IndexOutOfRange { what: "vertex color", index: 7, .. }));
}

#[test]
fn face_material_index_out_of_range_is_fatal() {
	let list = "MeshMaterialList {\n 1;\n 1;\n 1;;\n Material {\n  1.0;1.0;1.0;1.0;;\n  0.0;\n  0.0;0.0;0.0;;\n  0.0;0.0;0.0;;\n }\n}";
	let err = run(&triangle_with(list)).mesh.expect_err("range error");
	assert!(matches!(err, XofError::IndexOutOfRange { what: "face material", index: 1, len: 1 }));
}

#[test]
fn material_count_must_match_entries() {
	let list = "MeshMaterialList {\n 2;\n 1;\n 0;;\n Material {\n  1.0;1.0;1.0;1.0;;\n  0.0;\n  0.0;0.0;0.0;;\n  0.0;0.0;0.0;;\n }\n}";
	let err = run(&triangle_with(list)).mesh.expect_err("count mismatch");
	assert!(matches!(err, XofError::CountMismatch { what: "materials", declared: 2, actual: 1 }));
}

#[test]
fn explicit_normals_are_normalized() {
	let normals = "MeshNormals {\n 1;\n 0.0;0.0;-2.0;;\n 1;\n 3;0,0,0;;\n}";
	let mesh = run(&triangle_with(normals)).mesh.expect("mesh");
	assert!(mesh.faces[0].vertices.iter().all(|corner| corner.normal == [0.0, 0.0, -1.0]));
}

#[test]
fn meshes_accumulate_with_offsets() {
	let first = triangle_with("");
	let second = triangle_with(&material_list("1.0;0.0;0.0;1.0", ""));
	let text = format!("{first}{}", second.trim_start_matches("xof 0302txt 0032\n"));
	let mesh = run(&text).mesh.expect("mesh");
	assert_eq!(mesh.vertices.len(), 6);
	assert_eq!(mesh.materials.len(), 2);
	assert_eq!(mesh.faces[1].material, 1);
	let indices: Vec<u32> = mesh.faces[1].vertices.iter().map(|corner| corner.index).collect();
	assert_eq!(indices, [3, 4, 5]);
	assert_eq!(mesh.materials[1].base_color, [1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn named_materials_and_sibling_coords_are_linked() {
	let text = "xof 0302txt 0032
Material Red {
 1.0;0.0;0.0;1.0;;
 0.0;
 0.0;0.0;0.0;;
 0.0;0.0;0.0;;
}
Mesh {
 3;
 0.0;0.0;0.0;,
 1.0;0.0;0.0;,
 0.0;1.0;0.0;;
 1;
 3;0,1,2;;
 MeshMaterialList {
  1;
  1;
  0;;
  {Red}
 }
}
MeshTextureCoords {
 3;
 0.0;0.0;,
 1.0;0.0;,
 0.0;1.0;;
}
";
	let out = run(text);
	let mesh = out.mesh.expect("mesh");
	assert_eq!(mesh.materials.len(), 1);
	assert_eq!(mesh.materials[0].base_color, [1.0, 0.0, 0.0, 1.0]);
	assert_eq!(mesh.vertices[2].uv, Some([0.0, 1.0]));
	assert_eq!(out.diagnostics.count_kind(DiagnosticKind::UnsupportedTemplate), 0);
}

#[test]
fn unresolved_material_reference_is_fatal() {
	let text = "xof 0302txt 0032
Material Red { 1.0;0.0;0.0;1.0;; 0.0; 0.0;0.0;0.0;; 0.0;0.0;0.0;; }
Mesh {
 1;
 0.0;0.0;0.0;;
 0;;
 MeshMaterialList {
  1;
  0;;
  {Blue}
 }
}
";
	let err = run(text).mesh.expect_err("unresolved");
	assert!(matches!(err, XofError::Structure { ref reason } if reason.contains("Blue")));
}

#[test]
fn unsupported_records_are_warned_and_skipped() {
	let text = format!("{}AnimationSet Walk {{ Animation {{ }} }}\n", triangle_with(""));
	let out = run(&text);
	assert_eq!(out.mesh.expect("mesh").faces.len(), 1);
	assert_eq!(out.diagnostics.count_kind(DiagnosticKind::UnsupportedTemplate), 1);
}

#[test]
fn unparsable_vertex_component_is_fatal() {
	let text = "xof 0302txt 0032\nMesh {\n 3;\n 0.0;0.0;0.0;,\n 1.0;oops;0.0;,\n 0.0;1.0;0.0;;\n 1;\n 3;0,1,2;;\n}\n";
	let out = run(text);
	let err = out.mesh.expect_err("string in vertex");
	assert!(matches!(err, XofError::Structure { ref reason } if reason.contains("vertex component is a string")));
	assert_eq!(out.diagnostics.count_kind(DiagnosticKind::MalformedScalar), 1);
}

#[test]
fn stray_mesh_values_are_warned_and_skipped() {
	let options = DecodeOptions::default();
	let host = LogHost::new();
	let mut ctx = DecodeContext::new(&options, &host);
	let mut tree = decode_text_tree(&triangle_with(""), &mut ctx).expect("decodes");
	let Some(Value::Node(mesh)) = tree.children.first_mut() else {
		panic!("mesh record expected");
	};
	mesh.children.push(Value::String("stray".into()));
	let mut diagnostics = ctx.into_diagnostics();

	let env = ProcessEnv {
		base_dir: Path::new("."),
		options: &options,
		host: &host,
		alternate_structure: false,
	};
	let mesh = process_tree(&tree, &env, &mut diagnostics).expect("mesh");
	assert_eq!(mesh.faces.len(), 1);
	assert_eq!(diagnostics.count_kind(DiagnosticKind::UnsupportedTemplate), 1);
	assert!(diagnostics.items()[0].message.contains("string"));
}

#[test]
fn texture_resolves_case_insensitively() {
	let dir = tempfile::tempdir().expect("tempdir");
	fs::create_dir(dir.path().join("Textures")).expect("mkdir");
	fs::write(dir.path().join("Textures").join("Wood.bmp"), b"BM").expect("write texture");

	let out = run_in(&triangle_with(&texture("textures\\wood.bmp")), dir.path(), DecodeOptions::default());
	let mesh = out.mesh.expect("mesh");
	assert_eq!(mesh.materials[0].texture.as_deref(), Some(dir.path().join("Textures").join("Wood.bmp").as_path()));
	assert_eq!(mesh.materials[0].texture_handle, Some(TextureHandle(0)));
	assert!(mesh.materials[0].transparent);
	assert_eq!(out.textures, 1);
	assert!(out.diagnostics.is_empty());
}

#[test]
fn missing_texture_is_a_texture_warning() {
	let dir = tempfile::tempdir().expect("tempdir");
	let out = run_in(&triangle_with(&texture("gone.bmp")), dir.path(), DecodeOptions::default());
	let mesh = out.mesh.expect("mesh");
	assert_eq!(mesh.materials[0].texture, None);
	assert!(!mesh.materials[0].transparent);
	assert_eq!(out.textures, 0);
	let item = &out.diagnostics.items()[0];
	assert_eq!(item.kind, DiagnosticKind::MissingTexture);
	assert_eq!(item.severity, Severity::Warning);
	assert!(item.texture_related);
}

#[test]
fn illegal_and_empty_texture_names() {
	let illegal = run(&triangle_with(&texture("bad|name.bmp")));
	assert!(illegal.mesh.is_ok());
	assert_eq!(illegal.diagnostics.items()[0].kind, DiagnosticKind::IllegalTexturePath);
	assert_eq!(illegal.diagnostics.items()[0].severity, Severity::Error);

	let empty = run(&triangle_with(&texture("")));
	assert!(empty.mesh.is_ok());
	assert_eq!(empty.diagnostics.items()[0].kind, DiagnosticKind::EmptyTexture);
	assert_eq!(empty.diagnostics.items()[0].severity, Severity::Information);
}

#[test]
fn absolute_texture_dirs_can_be_stripped() {
	let dir = tempfile::tempdir().expect("tempdir");
	fs::write(dir.path().join("wood.bmp"), b"BM").expect("write texture");
	let text = triangle_with(&texture("C:\\art\\wood.bmp"));

	let strict = run_in(&text, dir.path(), DecodeOptions::default());
	assert_eq!(strict.diagnostics.count_kind(DiagnosticKind::MissingTexture), 1);

	let lenient = run_in(&text, dir.path(), DecodeOptions::lenient());
	let mesh = lenient.mesh.expect("mesh");
	assert_eq!(mesh.materials[0].texture.as_deref(), Some(dir.path().join("wood.bmp").as_path()));
}

#[test]
fn cancellation_stops_processing() {
	let options = DecodeOptions::default();
	let host = LogHost::new();
	let mut ctx = DecodeContext::new(&options, &host);
	let tree = decode_text_tree(&triangle_with(""), &mut ctx).expect("decodes");
	let mut diagnostics = ctx.into_diagnostics();

	host.cancel();
	let env = ProcessEnv {
		base_dir: Path::new("."),
		options: &options,
		host: &host,
		alternate_structure: false,
	};
	assert!(matches!(process_tree(&tree, &env, &mut diagnostics), Err(XofError::Cancelled)));
}
