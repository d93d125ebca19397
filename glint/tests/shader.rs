mod common;

use glint::backend::headless::{DrawCall, Headless, HeadlessConfig, UniformData};
use glint::context::{Configuration, Context, Extension, Version};
use glint::mesh::{Mesh, MeshIndexType, MeshPrimitive, TransformFeedback};
use glint::object::GraphicsObject;
use glint::shader::program::{ProgramError, TransformFeedbackBufferMode};
use glint::shader::{Program, Shader, StageError, StageType};
use log::Level;

use common::{assert_no_driver_errors, calls, context, context_with, take_messages};

const VERTEX: &str = "\
in vec4 position;
uniform mat4 transformation;

void main() {
  gl_Position = transformation * position;
}
";

const FRAGMENT: &str = "\
uniform vec4 color;
out vec4 fragment_color;

void main() {
  fragment_color = color;
}
";

fn shader(ctx: &Context<Headless>, ty: StageType, source: &str) -> Shader<Headless> {
  let mut shader = Shader::new(ctx, Version::GL460, ty).unwrap();
  shader.add_source(source);
  shader
}

/// Compiled and linked vertex / fragment program.
fn program(ctx: &Context<Headless>) -> Program<Headless> {
  let mut vert = shader(ctx, StageType::VertexShader, VERTEX);
  let mut frag = shader(ctx, StageType::FragmentShader, FRAGMENT);
  Shader::compile_all(&mut [&mut vert, &mut frag]).unwrap();

  let mut program = Program::new(ctx).unwrap();
  program.attach_shaders(&[&vert, &frag]);
  program.link(&[&vert, &frag]).unwrap();
  program
}

#[test]
fn sources_are_numbered() {
  let ctx = context();
  let mut shader = Shader::new(&ctx, Version::GL460, StageType::VertexShader).unwrap();

  shader.add_source("first").add_source("").add_source("second");

  assert_eq!(
    shader.sources(),
    ["#version 460\n", "#line 1 1\n", "first", "#line 1 2\n", "second"]
  );
}

#[test]
fn synchronous_compilation() {
  let ctx = context();
  let mut shader = shader(&ctx, StageType::VertexShader, VERTEX);

  assert!(shader.compile().is_ok());
  assert!(shader.is_compile_finished());
  // the result is kept
  assert!(shader.check_compile().is_ok());
  assert_eq!(calls(&ctx, "compile_shader"), 1);
  assert!(take_messages(Level::Warn).is_empty());
  assert_no_driver_errors(&ctx);
}

#[test]
fn asynchronous_compilation() {
  let ctx = context();
  let mut shader = shader(&ctx, StageType::FragmentShader, FRAGMENT);

  assert!(!shader.is_compile_finished());
  shader.submit_compile();

  // the driver needs two polls to finish
  assert!(!shader.is_compile_finished());
  assert!(!shader.is_compile_finished());
  assert!(shader.is_compile_finished());
  assert!(shader.check_compile().is_ok());
  assert_no_driver_errors(&ctx);
}

#[test]
fn asynchronous_compilation_without_parallel_compile() {
  let ctx = context_with(
    HeadlessConfig::default(),
    Configuration::new().disable_extension(Extension::KhrParallelShaderCompile),
  );
  let mut shader = shader(&ctx, StageType::FragmentShader, FRAGMENT);

  shader.submit_compile();

  assert!(shader.is_compile_finished());
  assert_eq!(calls(&ctx, "get_shader_parameter"), 0);
  assert!(shader.check_compile().is_ok());
}

#[test]
fn compilation_failure() {
  let ctx = context();
  let mut shader = shader(&ctx, StageType::FragmentShader, "#error broken\n");

  match shader.compile() {
    Err(StageError::CompilationFailed(StageType::FragmentShader, log)) => {
      assert_eq!(log, "1:1: error: broken\n");
    }
    result => panic!("unexpected compilation result: {:?}", result),
  }

  let errors = take_messages(Level::Error);
  assert_eq!(errors.len(), 1);
  assert!(errors[0].starts_with("compilation of fragment shader failed"));
  // whatever followed the NUL terminator of the log is gone
  assert!(!errors[0].contains("garbage"));

  // checking again doesn’t log again
  assert!(shader.check_compile().is_err());
  assert!(take_messages(Level::Error).is_empty());
}

#[test]
fn asynchronous_compilation_failure_matches_synchronous() {
  let ctx = context();
  let source = "void main() {\n#error broken\n}\n";

  let mut sync = shader(&ctx, StageType::VertexShader, source);
  let expected = sync.compile();
  assert!(matches!(
    expected,
    Err(StageError::CompilationFailed(StageType::VertexShader, _))
  ));

  let mut async_shader = shader(&ctx, StageType::VertexShader, source);
  async_shader.submit_compile();
  while !async_shader.is_compile_finished() {}

  assert_eq!(async_shader.check_compile(), expected);
  assert_eq!(take_messages(Level::Error).len(), 2);
}

#[test]
fn compilation_warnings_are_logged() {
  let ctx = context();
  let mut shader = shader(
    &ctx,
    StageType::VertexShader,
    "#warning slow path\nvoid main() {}\n",
  );

  assert!(shader.compile().is_ok());

  let warnings = take_messages(Level::Warn);
  assert_eq!(warnings.len(), 1);
  assert!(warnings[0].contains("succeeded with the following message"));
  assert!(warnings[0].ends_with("1:1: warning: slow path\n"));
}

#[test]
fn compile_all_checks_every_shader() {
  let ctx = context();
  let mut first = shader(&ctx, StageType::VertexShader, "void main() {\n");
  let mut second = shader(&ctx, StageType::FragmentShader, "#error second\n");

  let result = Shader::compile_all(&mut [&mut first, &mut second]);

  assert!(matches!(
    result,
    Err(StageError::CompilationFailed(StageType::VertexShader, _))
  ));
  assert_eq!(take_messages(Level::Error).len(), 2);
}

#[test]
fn unsupported_stage() {
  let ctx = context_with(HeadlessConfig::gl33(), Configuration::new());

  assert!(Shader::is_type_supported(&ctx, StageType::GeometryShader));
  assert!(!Shader::is_type_supported(&ctx, StageType::TessellationControlShader));
  assert!(matches!(
    Shader::new(&ctx, Version::GL330, StageType::ComputeShader),
    Err(StageError::UnsupportedType(StageType::ComputeShader))
  ));
  assert_eq!(calls(&ctx, "create_shader"), 0);
}

#[test]
fn synchronous_link() {
  let ctx = context();
  let program = program(&ctx);

  assert!(program.is_linked());
  assert!(program.is_link_finished());
  assert_eq!(ctx.backend().attached_shaders(program.id()).len(), 2);
  assert!(take_messages(Level::Warn).is_empty());
  assert_no_driver_errors(&ctx);
}

#[test]
fn asynchronous_link() {
  let ctx = context();
  let mut vert = shader(&ctx, StageType::VertexShader, VERTEX);
  let mut frag = shader(&ctx, StageType::FragmentShader, FRAGMENT);
  let mut program = Program::new(&ctx).unwrap();

  vert.submit_compile();
  frag.submit_compile();
  program.attach_shaders(&[&vert, &frag]).submit_link();

  assert!(!program.is_link_finished());
  assert!(!program.is_link_finished());
  assert!(program.is_link_finished());
  assert!(!program.is_linked());

  assert!(program.check_link(&[&vert, &frag]).is_ok());
  assert!(program.is_linked());
  assert_no_driver_errors(&ctx);
}

#[test]
fn failed_stage_is_reported_instead_of_the_link() {
  let ctx = context();
  let mut vert = shader(&ctx, StageType::VertexShader, VERTEX);
  let mut frag = shader(&ctx, StageType::FragmentShader, "#error missing color\n");
  let mut program = Program::new(&ctx).unwrap();

  assert!(Shader::compile_all(&mut [&mut vert, &mut frag]).is_err());
  take_messages(Level::Error);

  program.attach_shaders(&[&vert, &frag]);
  let e = program.link(&[&vert, &frag]).unwrap_err();

  match e {
    ProgramError::StageError(StageError::CompilationFailed(StageType::FragmentShader, ref log)) => {
      assert_eq!(log, "1:1: error: missing color\n");
    }
    ref e => panic!("unexpected link error: {:?}", e),
  }

  let message = e.to_string();
  assert!(message.contains("error: missing color"));
  assert!(!message.contains("linking failed"));
  assert!(take_messages(Level::Error)
    .iter()
    .all(|message| !message.contains("linking failed")));
  assert!(!program.is_linked());
}

#[test]
fn link_failure() {
  let ctx = context();
  let mut vert = shader(&ctx, StageType::VertexShader, "in vec4 position;\n");
  let mut frag = shader(&ctx, StageType::FragmentShader, FRAGMENT);
  Shader::compile_all(&mut [&mut vert, &mut frag]).unwrap();

  let mut program = Program::new(&ctx).unwrap();
  program.attach_shaders(&[&vert, &frag]);

  assert_eq!(
    program.link(&[&vert, &frag]),
    Err(ProgramError::LinkFailed(
      "error: vertex shader has no main function\n".to_owned()
    ))
  );

  let errors = take_messages(Level::Error);
  assert_eq!(errors.len(), 1);
  assert!(errors[0].starts_with("linking failed with the following message:\n"));
}

#[test]
fn validation() {
  let ctx = context();
  let mut program = program(&ctx);

  assert_eq!(program.validate(), (true, String::new()));
}

#[test]
fn attribute_names_are_not_nul_terminated() {
  let ctx = context();
  let mut program = Program::new(&ctx).unwrap();
  let name = "position!";

  program
    .bind_attribute_location(3, &name[..8])
    .bind_fragment_data_location(1, "fragment_color");

  let backend = ctx.backend();
  assert_eq!(backend.attribute_location(program.id(), "position"), Some(3));
  assert_eq!(
    backend.fragment_data_location(program.id(), "fragment_color"),
    Some((1, 0))
  );
}

#[test]
fn uniforms() {
  let ctx = context();
  let mut program = program(&ctx);

  let color = program.uniform_location("color");
  let transformation = program.uniform_location("transformation");
  assert!(color >= 0);
  assert!(transformation >= 0);
  assert!(take_messages(Level::Warn).is_empty());

  let identity: [[f32; 4]; 4] = [
    [1., 0., 0., 0.],
    [0., 1., 0., 0.],
    [0., 0., 1., 0.],
    [0., 0., 0., 1.],
  ];
  program
    .set_uniform(color, &[1f32, 0.5, 0.25, 1.])
    .set_uniform(transformation, &identity);

  let backend = ctx.backend();
  assert_eq!(
    backend.uniform(program.id(), color),
    Some(&UniformData::Float {
      components: 4,
      values: vec![1., 0.5, 0.25, 1.]
    })
  );
  assert!(matches!(
    backend.uniform(program.id(), transformation),
    Some(UniformData::FloatMatrix {
      columns: 4,
      rows: 4,
      ..
    })
  ));
}

#[test]
fn missing_uniforms_are_reported() {
  let ctx = context();
  let mut program = program(&ctx);

  let location = program.uniform_location("nonexistent");
  assert_eq!(location, -1);

  let warnings = take_messages(Level::Warn);
  assert_eq!(warnings.len(), 1);
  assert!(warnings[0].contains("'nonexistent'"));

  // setting it is a driver-side no-op
  program.set_uniform(location, &1f32);
  assert_no_driver_errors(&ctx);

  assert_eq!(program.uniform_block_index("Lights"), None);
  assert!(take_messages(Level::Warn)[0].contains("'Lights'"));
}

#[test]
fn uniform_blocks() {
  let ctx = context();
  let mut vert = shader(
    &ctx,
    StageType::VertexShader,
    "uniform Camera { mat4 view; };\nvoid main() { gl_Position = view * vec4(1.); }\n",
  );
  vert.compile().unwrap();

  let mut program = Program::new(&ctx).unwrap();
  program.attach_shaders(&[&vert]);
  program.link(&[&vert]).unwrap();

  let block = program.uniform_block_index("Camera").unwrap();
  program.set_uniform_block_binding(block, 2);

  assert_eq!(ctx.backend().uniform_block_binding_of(program.id(), block), Some(2));
  assert_no_driver_errors(&ctx);
}

#[test]
fn draws() {
  let ctx = context();
  let program = program(&ctx);

  program.draw(&Mesh::new(7).set_count(3));
  program.draw(
    &Mesh::new(7)
      .set_primitive(MeshPrimitive::TriangleStrip)
      .set_count(6)
      .set_index(MeshIndexType::UnsignedShort, 12)
      .set_base_vertex(2)
      .set_instances(4),
  );

  assert_eq!(
    ctx.backend().draws(),
    [
      DrawCall::Arrays {
        program: program.id(),
        vertex_array: 7,
        primitive: MeshPrimitive::Triangles,
        first: 0,
        count: 3,
        instances: 1,
        base_instance: 0,
      },
      DrawCall::Elements {
        program: program.id(),
        vertex_array: 7,
        primitive: MeshPrimitive::TriangleStrip,
        count: 6,
        index_type: MeshIndexType::UnsignedShort,
        offset: 12,
        base_vertex: 2,
        instances: 4,
        base_instance: 0,
      },
    ]
  );

  // the program and the vertex array stay bound
  assert_eq!(calls(&ctx, "use_program"), 1);
  assert_eq!(calls(&ctx, "bind_vertex_array"), 1);
  assert_no_driver_errors(&ctx);
}

#[test]
fn empty_draws_do_nothing() {
  let ctx = context();
  let program = program(&ctx);

  program.draw(&Mesh::new(1).set_count(0));
  program.draw(&Mesh::new(1).set_count(3).set_instances(0));

  assert!(ctx.backend().draws().is_empty());
  assert_eq!(calls(&ctx, "use_program"), 0);
  assert_eq!(calls(&ctx, "bind_vertex_array"), 0);
}

#[test]
fn transform_feedback() {
  let ctx = context();
  let mut vert = shader(
    &ctx,
    StageType::VertexShader,
    "out vec4 captured;\nvoid main() { captured = vec4(1.); }\n",
  );
  vert.compile().unwrap();

  let mut program = Program::new(&ctx).unwrap();
  program
    .attach_shaders(&[&vert])
    .set_transform_feedback_outputs(&["captured"], TransformFeedbackBufferMode::Separate);
  program.link(&[&vert]).unwrap();

  let (varyings, mode) = ctx
    .backend()
    .transform_feedback_varyings(program.id())
    .map(|(varyings, mode)| (varyings.to_vec(), mode))
    .unwrap();
  assert_eq!(varyings, ["captured"]);
  assert_eq!(mode, TransformFeedbackBufferMode::Separate);

  let xfb = TransformFeedback::new(&ctx);
  program.draw_transform_feedback(&Mesh::new(2).set_primitive(MeshPrimitive::Points), &xfb, 0);

  assert_eq!(
    ctx.backend().draws(),
    [DrawCall::TransformFeedback {
      program: program.id(),
      vertex_array: 2,
      primitive: MeshPrimitive::Points,
      transform_feedback: xfb.id(),
      stream: 0,
      instances: 1,
    }]
  );
  assert_no_driver_errors(&ctx);
}

#[test]
fn compute_dispatch() {
  let ctx = context();
  let mut compute = shader(&ctx, StageType::ComputeShader, "void main() {}\n");
  compute.compile().unwrap();

  let mut program = Program::new(&ctx).unwrap();
  program.attach_shaders(&[&compute]);
  program.link(&[&compute]).unwrap();

  program.dispatch_compute([8, 4, 1]);

  assert_eq!(
    ctx.backend().draws(),
    [DrawCall::Compute {
      program: program.id(),
      groups: [8, 4, 1],
    }]
  );
  assert_no_driver_errors(&ctx);
}

#[test]
fn deleting_the_current_program() {
  let ctx = context();
  let program = program(&ctx);
  let id = program.id();

  program.draw(&Mesh::new(1).set_count(3));
  assert_eq!(ctx.state().current_program(), Some(id));

  drop(program);

  assert!(!ctx.backend().program_exists(id));
  assert_ne!(ctx.state().current_program(), Some(id));

  // a new program is made current again
  let program = self::program(&ctx);
  program.draw(&Mesh::new(1).set_count(3));
  assert_eq!(ctx.backend().current_program(), program.id());
  assert_no_driver_errors(&ctx);
}

#[test]
fn labels_are_empty_on_webgl() {
  let ctx = context_with(HeadlessConfig::webgl2(), Configuration::new());
  let mut shader = Shader::new(&ctx, Version::GLES300, StageType::VertexShader).unwrap();
  let mut program = Program::new(&ctx).unwrap();

  shader.set_label("vertex");
  program.set_label("program");

  assert_eq!(shader.label(), "");
  assert_eq!(program.label(), "");
  assert_eq!(calls(&ctx, "object_label"), 0);

  let ctx = context();
  let mut program = Program::new(&ctx).unwrap();
  program.set_label("program");
  assert_eq!(program.label(), "program");
}
