use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::error::ShaderError;
use crate::gl::{ProgramScope, ProgrammablePipeline};
use crate::source::ShaderSourceProvider;
use crate::surface::SharedSurface;
use crate::textures::{TextureBindings, SCENE_TEXTURE_UNIT};
use crate::types::{GlHandle, ShaderData, StageKind, UniformValue, MISSING_UNIFORM};
use crate::uniforms::UniformCache;

/// One linked vertex + fragment program, built from the sources a provider
/// returns for a shader id.
///
/// A program that fails at any step stays usable as a value: it reports
/// `is_valid() == false`, keeps the error, and the frame renderer draws the
/// scene unshaded. Driver objects are released on drop.
pub struct ShaderProgram {
    id: String,
    gl: Rc<dyn ProgrammablePipeline>,
    provider: Rc<dyn ShaderSourceProvider>,
    vertex_stage: GlHandle,
    fragment_stage: GlHandle,
    program: GlHandle,
    valid: bool,
    error: Option<ShaderError>,
    data: Option<ShaderData>,
    uniforms: UniformCache,
    textures: TextureBindings,
}

impl ShaderProgram {
    /// Fetches, compiles and links `id`, then pushes the constant uniforms.
    pub fn new(
        id: impl Into<String>,
        gl: Rc<dyn ProgrammablePipeline>,
        provider: Rc<dyn ShaderSourceProvider>,
    ) -> Self {
        let mut program = Self {
            id: id.into(),
            gl,
            provider,
            vertex_stage: 0,
            fragment_stage: 0,
            program: 0,
            valid: false,
            error: None,
            data: None,
            uniforms: UniformCache::default(),
            textures: TextureBindings::new(),
        };
        program.load();
        program
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Why the program is invalid, if it is.
    pub fn error(&self) -> Option<&ShaderError> {
        self.error.as_ref()
    }

    pub fn handle(&self) -> GlHandle {
        self.program
    }

    pub fn pipeline(&self) -> &Rc<dyn ProgrammablePipeline> {
        &self.gl
    }

    /// Sources and metadata from the last successful fetch.
    pub fn data(&self) -> Option<&ShaderData> {
        self.data.as_ref()
    }

    pub fn logical_scale(&self) -> f64 {
        self.data
            .as_ref()
            .map_or(1.0, |data| data.metadata.logical_scale)
    }

    pub fn uniforms(&self) -> &UniformCache {
        &self.uniforms
    }

    pub fn textures(&self) -> &TextureBindings {
        &self.textures
    }

    fn fail(&mut self, error: ShaderError) {
        warn!(shader = %self.id, error = %error, "shader disabled; scene will be drawn unshaded");
        self.valid = false;
        self.error = Some(error);
    }

    /// Releases any held objects, then fetches, compiles and links again.
    ///
    /// Stops at the first failing step; the vertex stage failing means the
    /// fragment stage is never compiled. A driver error raised while doing so
    /// invalidates the program even if every step reported success.
    pub fn load(&mut self) {
        self.gl.drain_errors();
        self.build();
        let code = self.gl.drain_errors();
        if code != 0 {
            let error = ShaderError::Driver {
                id: self.id.clone(),
                code,
            };
            if self.error.is_some() {
                debug!(shader = %self.id, code, "driver error after an earlier failure");
                self.valid = false;
            } else {
                self.fail(error);
            }
        }
    }

    fn build(&mut self) {
        self.release();
        self.error = None;
        self.valid = true;

        let data = match self.provider.fetch(&self.id) {
            Ok(data) => data,
            Err(err) => {
                self.fail(err.into());
                return;
            }
        };

        self.vertex_stage = self.compile_stage(StageKind::Vertex, data.source(StageKind::Vertex));
        if self.valid {
            self.fragment_stage =
                self.compile_stage(StageKind::Fragment, data.source(StageKind::Fragment));
        }
        self.data = Some(data);
        if self.valid {
            self.link();
        }
    }

    /// Creates a stage object and compiles `source` into it. The handle is
    /// returned even on failure so it can be released.
    pub fn compile_stage(&mut self, kind: StageKind, source: &str) -> GlHandle {
        let stage = self.gl.create_stage(kind);
        if let Err(log) = self.gl.compile_stage(stage, source) {
            self.fail(ShaderError::Compile {
                id: self.id.clone(),
                stage: kind,
                log,
            });
        }
        stage
    }

    /// Links the compiled stages into a new program object, replacing the
    /// one held so far, and pushes the constant uniforms into it.
    pub fn link(&mut self) {
        if self.program != 0 {
            self.gl.delete_program(self.program);
            self.program = 0;
        }
        let program = self.gl.create_program();
        self.program = program;
        self.gl.attach_stage(program, self.vertex_stage);
        self.gl.attach_stage(program, self.fragment_stage);
        match self.gl.link_program(program) {
            Ok(()) => {
                self.valid = true;
                self.uniforms.retarget(program);
                info!(shader = %self.id, backend = %self.gl.backend(), "shader linked");
                self.apply_constants();
            }
            Err(log) => self.fail(ShaderError::Link {
                id: self.id.clone(),
                log,
            }),
        }
    }

    /// Uniforms that never change between frames: the scene sampler, the
    /// metadata defaults and any sampler units assigned before a reload.
    fn apply_constants(&mut self) {
        let gl = &*self.gl;
        let _scope = ProgramScope::bind(gl, self.program);
        self.uniforms.set(
            gl,
            "sol_texture",
            UniformValue::Int(SCENE_TEXTURE_UNIT as i32),
        );
        if let Some(data) = &self.data {
            for (name, value) in &data.metadata.uniforms {
                if !self.uniforms.set(gl, name, *value) {
                    debug!(shader = %self.id, uniform = %name, "default uniform not declared");
                }
            }
        }
        for (name, unit) in self.textures.sampler_uniforms() {
            self.uniforms.set(gl, name, UniformValue::Int(unit as i32));
        }
    }

    /// Throws away the driver objects and builds them again from a fresh
    /// fetch. Texture units assigned so far are kept.
    pub fn reload(&mut self) {
        debug!(shader = %self.id, "reloading shader");
        self.load();
    }

    /// Deletes the stage and program objects and forgets cached locations.
    /// Sampler textures are kept for the next load.
    pub fn release(&mut self) {
        for stage in [&mut self.vertex_stage, &mut self.fragment_stage] {
            if *stage != 0 {
                self.gl.delete_stage(*stage);
                *stage = 0;
            }
        }
        if self.program != 0 {
            self.gl.delete_program(self.program);
            self.program = 0;
        }
        self.uniforms.retarget(0);
        self.valid = false;
    }

    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if self.valid {
            self.uniforms.set(&*self.gl, name, value);
        }
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    pub fn set_scalar(&mut self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    pub fn set_vector2(&mut self, name: &str, x: f32, y: f32) {
        self.set_uniform(name, UniformValue::Vec2([x, y]));
    }

    pub fn set_vector3(&mut self, name: &str, x: f32, y: f32, z: f32) {
        self.set_uniform(name, UniformValue::Vec3([x, y, z]));
    }

    pub fn set_vector4(&mut self, name: &str, x: f32, y: f32, z: f32, w: f32) {
        self.set_uniform(name, UniformValue::Vec4([x, y, z, w]));
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.set_uniform(name, UniformValue::Bool(value));
    }

    /// Binds `image` to the sampler uniform `name`.
    ///
    /// Returns false, without touching any texture, when the program is
    /// invalid or does not declare `name`.
    pub fn set_texture(&mut self, name: &str, image: &SharedSurface) -> bool {
        if !self.valid {
            return false;
        }
        let gl = &*self.gl;
        if self.uniforms.location_of(gl, name) == MISSING_UNIFORM {
            return false;
        }
        let unit = self.textures.bind(gl, name, image);
        self.uniforms.set(gl, name, UniformValue::Int(unit as i32))
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.release();
        self.textures.release(&*self.gl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ImageSurface;
    use crate::testing::{library, MockGl, SEPIA_FRAGMENT, VERTEX_SOURCE};
    use crate::types::{ShaderMetadata, Size};
    use crate::{SourceError, StaticSources};

    fn program(gl: &Rc<MockGl>, sources: Rc<StaticSources>, id: &str) -> ShaderProgram {
        ShaderProgram::new(id, gl.clone(), sources)
    }

    fn image(fill: u8) -> SharedSurface {
        ImageSurface::from_pixels(Size::new(2, 2), vec![fill; 16])
            .unwrap()
            .into_shared()
    }

    #[test]
    fn valid_sources_link_and_bind_scene_sampler() {
        let gl = Rc::new(MockGl::new());
        let sepia = program(&gl, library(), "sepia");

        assert!(sepia.is_valid());
        assert!(sepia.error().is_none());
        assert_ne!(sepia.handle(), 0);
        assert_eq!(
            gl.uniform_value(sepia.handle(), "sol_texture"),
            Some(UniformValue::Int(0))
        );
        assert_eq!(gl.current_program(), 0);
    }

    #[test]
    fn compile_failure_keeps_log_and_invalidates() {
        let gl = Rc::new(MockGl::new());
        let broken = program(&gl, library(), "broken");

        assert!(!broken.is_valid());
        match broken.error() {
            Some(ShaderError::Compile { id, stage, log }) => {
                assert_eq!(id, "broken");
                assert_eq!(*stage, StageKind::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(broken.handle(), 0);
    }

    #[test]
    fn vertex_failure_skips_fragment_stage() {
        let gl = Rc::new(MockGl::new());
        let sources = StaticSources::new();
        sources.insert("bad_vertex", ShaderData::new("void main() {", SEPIA_FRAGMENT));
        let bad = program(&gl, Rc::new(sources), "bad_vertex");

        assert!(matches!(
            bad.error(),
            Some(ShaderError::Compile { stage: StageKind::Vertex, .. })
        ));
        // Only the vertex stage object was created.
        assert_eq!(gl.live_objects(), 1);
    }

    #[test]
    fn link_failure_is_reported() {
        let gl = Rc::new(MockGl::new());
        let sources = StaticSources::new();
        let fragment = format!("#pragma mock_link_failure\n{SEPIA_FRAGMENT}");
        sources.insert("unlinked", ShaderData::new(VERTEX_SOURCE, fragment));
        let unlinked = program(&gl, Rc::new(sources), "unlinked");

        assert!(!unlinked.is_valid());
        let error = unlinked.error().unwrap();
        assert!(matches!(error, ShaderError::Link { .. }));
        assert!(error.driver_log().unwrap().contains("varying"));
    }

    #[test]
    fn unknown_shader_is_a_source_error() {
        let gl = Rc::new(MockGl::new());
        let missing = program(&gl, library(), "does_not_exist");

        assert_eq!(
            missing.error(),
            Some(&ShaderError::Source(SourceError::NotFound(
                "does_not_exist".to_string()
            )))
        );
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn metadata_defaults_are_pushed_after_link() {
        let gl = Rc::new(MockGl::new());
        let sources = StaticSources::new();
        let metadata = ShaderMetadata {
            uniforms: [
                ("strength".to_string(), UniformValue::Float(0.5)),
                ("unused".to_string(), UniformValue::Int(4)),
            ]
            .into(),
            ..ShaderMetadata::default()
        };
        sources.insert(
            "sepia",
            ShaderData::new(VERTEX_SOURCE, SEPIA_FRAGMENT).with_metadata(metadata),
        );

        let sepia = program(&gl, Rc::new(sources), "sepia");
        assert!(sepia.is_valid());
        assert_eq!(
            gl.uniform_value(sepia.handle(), "strength"),
            Some(UniformValue::Float(0.5))
        );
    }

    #[test]
    fn stale_driver_errors_are_not_blamed_on_setup() {
        let gl = Rc::new(MockGl::new());
        gl.push_error(0x0500);
        assert!(program(&gl, library(), "sepia").is_valid());
    }

    #[test]
    fn driver_error_during_setup_invalidates() {
        let gl = Rc::new(MockGl::new());
        gl.fail_uniform_updates(0x0501);
        let sepia = program(&gl, library(), "sepia");

        assert!(!sepia.is_valid());
        assert_eq!(
            sepia.error(),
            Some(&ShaderError::Driver {
                id: "sepia".to_string(),
                code: 0x0501
            })
        );
    }

    #[test]
    fn uniforms_on_invalid_program_are_ignored() {
        let gl = Rc::new(MockGl::new());
        let mut broken = program(&gl, library(), "broken");
        let queries = gl.location_queries();

        broken.set_scalar("strength", 1.0);
        broken.set_vector2("sol_output_size", 1.0, 1.0);
        assert!(!broken.set_texture("overlay", &image(1)));

        assert_eq!(gl.location_queries(), queries);
        assert_eq!(gl.take_error(), 0);
    }

    #[test]
    fn setters_reach_declared_uniforms() {
        let gl = Rc::new(MockGl::new());
        let mut sepia = program(&gl, library(), "sepia");

        sepia.set_scalar("strength", 0.25);
        sepia.set_int("sol_time", 1200);
        sepia.set_vector2("sol_output_size", 640.0, 480.0);
        sepia.set_bool("not_declared", true);

        let handle = sepia.handle();
        assert_eq!(gl.uniform_value(handle, "strength"), Some(UniformValue::Float(0.25)));
        assert_eq!(gl.uniform_value(handle, "sol_time"), Some(UniformValue::Int(1200)));
        assert_eq!(
            gl.uniform_value(handle, "sol_output_size"),
            Some(UniformValue::Vec2([640.0, 480.0]))
        );
        assert_eq!(gl.take_error(), 0);
    }

    #[test]
    fn texture_units_are_distinct_and_stable() {
        let gl = Rc::new(MockGl::new());
        let mut overlay = program(&gl, library(), "overlay");
        let images: Vec<SharedSurface> = (0..3).map(image).collect();

        for (name, image) in ["overlay", "mask", "noise"].into_iter().zip(&images) {
            assert!(overlay.set_texture(name, image));
        }
        let handle = overlay.handle();
        let units: Vec<_> = ["overlay", "mask", "noise"]
            .iter()
            .map(|name| gl.uniform_value(handle, name))
            .collect();
        assert_eq!(
            units,
            [
                Some(UniformValue::Int(1)),
                Some(UniformValue::Int(2)),
                Some(UniformValue::Int(3))
            ]
        );

        assert!(overlay.set_texture("mask", &images[1]));
        assert_eq!(overlay.textures().len(), 3);
        assert_eq!(overlay.textures().unit_of(&images[1]), Some(2));
    }

    #[test]
    fn undeclared_sampler_allocates_nothing() {
        let gl = Rc::new(MockGl::new());
        let mut sepia = program(&gl, library(), "sepia");
        let before = gl.live_objects();

        assert!(!sepia.set_texture("overlay", &image(3)));
        assert!(sepia.textures().is_empty());
        assert_eq!(gl.live_objects(), before);
    }

    #[test]
    fn reload_picks_up_edits_and_resets_locations() {
        let gl = Rc::new(MockGl::new());
        let sources = library();
        let mut sepia = program(&gl, sources.clone(), "sepia");
        let first = sepia.handle();
        sepia.set_scalar("strength", 1.0);
        assert!(!sepia.uniforms().is_empty());

        sources.insert("sepia", ShaderData::new(VERTEX_SOURCE, "void main() {"));
        sepia.reload();
        assert!(!sepia.is_valid());
        assert!(sepia.uniforms().is_empty());
        assert!(gl.is_deleted(first));

        sources.insert("sepia", ShaderData::new(VERTEX_SOURCE, SEPIA_FRAGMENT));
        sepia.reload();
        assert!(sepia.is_valid());
        assert!(sepia.error().is_none());
        assert_ne!(sepia.handle(), first);
        assert_eq!(sepia.uniforms().program(), sepia.handle());

        // Locations cached before the reload are looked up again, once.
        let queries = gl.location_queries();
        sepia.set_scalar("strength", 0.5);
        assert_eq!(gl.location_queries(), queries + 1);
        sepia.set_scalar("strength", 0.75);
        assert_eq!(gl.location_queries(), queries + 1);
        assert_eq!(
            gl.uniform_value(sepia.handle(), "strength"),
            Some(UniformValue::Float(0.75))
        );
    }

    #[test]
    fn reload_restores_sampler_units() {
        let gl = Rc::new(MockGl::new());
        let mut overlay = program(&gl, library(), "overlay");
        let noise = image(9);
        overlay.set_texture("noise", &noise);

        overlay.reload();

        assert_eq!(
            gl.uniform_value(overlay.handle(), "noise"),
            Some(UniformValue::Int(1))
        );
    }

    #[test]
    fn load_pushes_constants_into_the_new_program() {
        let gl = Rc::new(MockGl::new());
        let mut overlay = program(&gl, library(), "overlay");
        let noise = image(4);
        assert!(overlay.set_texture("noise", &noise));
        let first = overlay.handle();

        overlay.load();

        let handle = overlay.handle();
        assert_ne!(handle, first);
        assert_eq!(gl.uniform_value(handle, "sol_texture"), Some(UniformValue::Int(0)));
        assert_eq!(gl.uniform_value(handle, "noise"), Some(UniformValue::Int(1)));
    }

    #[test]
    fn relinking_replaces_the_program_object() {
        let gl = Rc::new(MockGl::new());
        {
            let mut sepia = program(&gl, library(), "sepia");
            let first = sepia.handle();

            sepia.link();

            assert!(sepia.is_valid());
            assert_ne!(sepia.handle(), first);
            assert!(gl.is_deleted(first));
            assert_eq!(
                gl.uniform_value(sepia.handle(), "sol_texture"),
                Some(UniformValue::Int(0))
            );
        }
        assert_eq!(gl.live_objects(), 0);
        assert_eq!(gl.invalid_deletes(), 0);
    }

    #[test]
    fn drop_releases_every_driver_object() {
        let gl = Rc::new(MockGl::new());
        {
            let mut overlay = program(&gl, library(), "overlay");
            overlay.set_texture("overlay", &image(1));
            let _broken = program(&gl, library(), "broken");
            assert!(gl.live_objects() > 0);
        }
        assert_eq!(gl.live_objects(), 0);
        assert_eq!(gl.invalid_deletes(), 0);
    }

    #[test]
    fn logical_scale_comes_from_metadata() {
        let gl = Rc::new(MockGl::new());
        let sources = StaticSources::new();
        let metadata = ShaderMetadata {
            logical_scale: 2.0,
            ..ShaderMetadata::default()
        };
        sources.insert(
            "scale2x",
            ShaderData::new(VERTEX_SOURCE, SEPIA_FRAGMENT).with_metadata(metadata),
        );

        assert_eq!(program(&gl, Rc::new(sources), "scale2x").logical_scale(), 2.0);
        assert_eq!(program(&gl, library(), "broken").logical_scale(), 1.0);
    }
}
