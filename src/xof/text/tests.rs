use crate::xof::{DecodeContext, DecodeOptions, DiagnosticKind, LogHost, Node, Value, XofError, decode_text_tree};

const TRIANGLE: &str = "xof 0302txt 0032
Mesh {
 3;
 0.0;0.0;0.0;,
 1.0;0.0;0.0;,
 0.0;1.0;0.0;;
 1;
 3;0,1,2;;
}
";

fn run(text: &str) -> (crate::xof::Result<Node>, DecodeContext<'static>) {
	let options: &'static DecodeOptions = Box::leak(Box::new(DecodeOptions::default()));
	let host: &'static LogHost = Box::leak(Box::new(LogHost::new()));
	let mut ctx = DecodeContext::new(options, host);
	let tree = decode_text_tree(text, &mut ctx);
	(tree, ctx)
}

fn first_child(root: &Node) -> &Node {
	root.children[0].as_node().expect("record child")
}

#[test]
fn decodes_minimal_mesh() {
	let (tree, ctx) = run(TRIANGLE);
	let root = tree.expect("decodes");
	assert_eq!(root.children.len(), 1);

	let mesh = first_child(&root);
	assert_eq!(mesh.shape(), "Mesh(int,[Vector(float,float,float),Vector(float,float,float),Vector(float,float,float)],int,[MeshFace(int,int[3])])");
	assert_eq!(mesh.children[0], Value::Int(3));
	let Value::NodeArray(vertices) = &mesh.children[1] else {
		panic!("vertex array expected");
	};
	assert_eq!(vertices[1].children[0], Value::Float(1.0));
	let Value::NodeArray(faces) = &mesh.children[3] else {
		panic!("face array expected");
	};
	assert_eq!(faces[0].children[1], Value::IntArray(vec![0, 1, 2]));
	assert!(ctx.diagnostics().is_empty());
}

#[test]
fn template_declarations_are_folded() {
	let text = "xof 0302txt 0032
template Mesh {
 <3D82AB44-62DA-11cf-AB39-0020AF71E433>
 DWORD nVertices;
 array Vector vertices[nVertices];
 [...]
}
Header { 1; 0; 1; }
Mesh { 0;; 0;; }
";
	let (tree, _) = run(text);
	let root = tree.expect("decodes");
	let names: Vec<&str> = root.children.iter().filter_map(Value::as_node).map(|node| node.name.as_ref()).collect();
	assert_eq!(names, ["Header", "Mesh"]);
}

#[test]
fn frames_wrap_meshes_and_transforms_are_dropped() {
	let text = "xof 0302txt 0032
Frame Body {
 FrameTransformMatrix { 1.0,0.0,0.0,0.0,0.0,1.0,0.0,0.0,0.0,0.0,1.0,0.0,0.0,0.0,0.0,1.0;; }
 Mesh Cube { 0;; 0;; }
}
";
	let (tree, _) = run(text);
	let root = tree.expect("decodes");
	let frame = first_child(&root);
	assert_eq!(frame.shape(), "Frame Root(Mesh(int,[],int,[]))");
}

#[test]
fn material_children_and_texture() {
	let text = "xof 0302txt 0032
Mesh {
 1;
 0.0;0.0;0.0;;
 0;;
 MeshMaterialList {
  1;
  0;;
  Material {
   1.0;0.0;0.0;1.0;;
   5.0;
   0.0;0.0;0.0;;
   0.0;0.0;0.0;;
   TextureFilename { \"wood.bmp\"; }
  }
 }
}
";
	let (tree, _) = run(text);
	let root = tree.expect("decodes");
	let mesh = first_child(&root);
	let list = mesh.children[4].as_node().expect("material list");
	assert_eq!(list.shape(), "MeshMaterialList(int,int,int[0],Material(ColorRGBA(float,float,float,float),float,ColorRGB(float,float,float),ColorRGB(float,float,float),TextureFilename(string)))");
	let material = list.children[3].as_node().expect("material");
	let texture = material.children[4].as_node().expect("texture");
	assert_eq!(texture.children[0], Value::String("wood.bmp".into()));
}

#[test]
fn named_materials_enable_references() {
	let text = "xof 0302txt 0032
Material Red {
 1.0;0.0;0.0;1.0;;
 0.0;
 0.0;0.0;0.0;;
 0.0;0.0;0.0;;
}
Mesh {
 1;
 0.0;0.0;0.0;;
 0;;
 MeshMaterialList {
  1;
  0;;
  {Red}
 }
}
";
	let (tree, ctx) = run(text);
	let root = tree.expect("decodes");
	assert!(ctx.alternate_structure());

	let material = first_child(&root);
	assert_eq!(material.name.as_ref(), "Material");
	assert_eq!(material.key.as_deref(), Some("Red"));

	let mesh = root.children[1].as_node().expect("mesh");
	let list = mesh.children[4].as_node().expect("material list");
	assert_eq!(list.children[3], Value::String("Red".into()));
	assert_eq!(list.children.len(), 4);
}

#[test]
fn bare_references_are_accepted() {
	let text = "xof 0302txt 0032
Material Blue { 0.0;0.0;1.0;1.0;; 0.0; 0.0;0.0;0.0;; 0.0;0.0;0.0;; }
Mesh {
 1;
 0.0;0.0;0.0;;
 0;;
 MeshMaterialList {
  1;
  0;;
  Blue;
 }
}
";
	let (tree, _) = run(text);
	let root = tree.expect("decodes");
	let mesh = root.children[1].as_node().expect("mesh");
	let list = mesh.children[4].as_node().expect("material list");
	assert_eq!(list.children[3], Value::String("Blue".into()));
}

#[test]
fn empty_float_defaults_to_zero() {
	let text = "xof 0302txt 0032
Mesh {
 1;
 ;0.5;1.0;;
 0;;
}
";
	let (tree, ctx) = run(text);
	let root = tree.expect("decodes");
	let mesh = first_child(&root);
	let Value::NodeArray(vertices) = &mesh.children[1] else {
		panic!("vertex array expected");
	};
	assert_eq!(vertices[0].children, [Value::Float(0.0), Value::Float(0.5), Value::Float(1.0)]);
	assert!(ctx.diagnostics().is_empty());
}

#[test]
fn malformed_scalar_is_kept_as_text_with_warning() {
	let text = "xof 0302txt 0032
MeshVertexColors {
 1;
 0;abc;0.0;0.0;1.0;;;
}
";
	let (tree, ctx) = run(text);
	let root = tree.expect("decodes");
	let colors = first_child(&root);
	let Value::NodeArray(entries) = &colors.children[1] else {
		panic!("color array expected");
	};
	let rgba = entries[0].children[1].as_node().expect("color");
	assert_eq!(rgba.children[0], Value::String("abc".into()));
	assert_eq!(ctx.diagnostics().count_kind(DiagnosticKind::MalformedScalar), 1);
}

#[test]
fn coordinates_without_separating_comma() {
	let text = "xof 0302txt 0032
MeshTextureCoords {
 2;
 0.25;0.5;
 -1.0;0.75;;
}
";
	let (tree, _) = run(text);
	let root = tree.expect("decodes");
	let coords = first_child(&root);
	let Value::NodeArray(items) = &coords.children[1] else {
		panic!("coordinate array expected");
	};
	assert_eq!(items[1].children, [Value::Float(-1.0), Value::Float(0.75)]);
}

#[test]
fn short_vertex_list_is_count_mismatch() {
	let text = "xof 0302txt 0032
Mesh {
 3;
 0.0;0.0;0.0;,
 1.0;0.0;0.0;;
 1;
 3;0,1,2;;
}
";
	let (tree, _) = run(text);
	let err = tree.expect_err("count mismatch");
	assert!(matches!(err, XofError::CountMismatch { declared: 3, actual: 2, .. }));
}

#[test]
fn stray_comma_is_syntax_error() {
	let (tree, _) = run("xof 0302txt 0032\nFrame { 1, 2, }\n");
	let err = tree.expect_err("stray comma");
	assert!(matches!(err, XofError::Syntax { ref template, .. } if template.as_ref() == "Frame"));
}

#[test]
fn unclosed_record_is_syntax_error() {
	let (tree, _) = run("xof 0302txt 0032\nMesh {\n 1;\n");
	assert!(matches!(tree.expect_err("eof"), XofError::Syntax { .. }));
}

#[test]
fn unclosed_quote_is_reported() {
	let (tree, _) = run("xof 0302txt 0032\nAnimation { \"open }\n");
	let err = tree.expect_err("unclosed quote");
	assert!(matches!(err, XofError::Syntax { reason, .. } if reason.contains("quotation")));
}

#[test]
fn unknown_records_are_skipped_opaquely() {
	let text = "xof 0302txt 0032
AnimationSet Walk { Animation { {Cube} AnimationKey { 0; 1; 0;3;0.0,0.0,0.0;;; } } }
Mesh { 0;; 0;; }
";
	let (tree, _) = run(text);
	let root = tree.expect("decodes");
	assert_eq!(root.children.len(), 2);
	assert_eq!(first_child(&root).shape(), "AnimationSet Walk()");
}

#[test]
fn nesting_limit_is_enforced() {
	let options: &'static DecodeOptions = Box::leak(Box::new(DecodeOptions {
		max_depth: 3,
		..DecodeOptions::default()
	}));
	let host = LogHost::new();
	let mut ctx = DecodeContext::new(options, &host);
	let err = decode_text_tree("xof 0302txt 0032\nFrame { Frame { Frame { Mesh { 0;; 0;; } } } }\n", &mut ctx).expect_err("too deep");
	assert!(matches!(err, XofError::DepthExceeded { max_depth: 3 }));
}
