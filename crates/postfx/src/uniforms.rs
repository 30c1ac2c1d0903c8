use std::collections::HashMap;

use crate::gl::{ProgramScope, ProgrammablePipeline};
use crate::types::{GlHandle, UniformValue, MISSING_UNIFORM};

/// Uniform locations of one linked program, looked up once per name.
///
/// Absent uniforms are cached too, so a shader that ignores `sol_time` costs
/// one driver query rather than one per frame. The cache is tied to the
/// program handle it was filled for and empties whenever that changes.
#[derive(Debug, Default)]
pub struct UniformCache {
    program: GlHandle,
    locations: HashMap<String, i32>,
}

impl UniformCache {
    pub fn new(program: GlHandle) -> Self {
        Self {
            program,
            locations: HashMap::new(),
        }
    }

    pub fn program(&self) -> GlHandle {
        self.program
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Points the cache at a freshly linked (or released) program.
    pub fn retarget(&mut self, program: GlHandle) {
        self.program = program;
        self.locations.clear();
    }

    pub fn location_of(&mut self, gl: &dyn ProgrammablePipeline, name: &str) -> i32 {
        if self.program == 0 {
            return MISSING_UNIFORM;
        }
        if let Some(&location) = self.locations.get(name) {
            return location;
        }
        let location = gl.uniform_location(self.program, name);
        self.locations.insert(name.to_string(), location);
        location
    }

    /// Pushes `value` into `name`, binding the program only for the update.
    /// Returns false when the program does not declare the uniform.
    pub fn set(&mut self, gl: &dyn ProgrammablePipeline, name: &str, value: UniformValue) -> bool {
        let location = self.location_of(gl, name);
        if location == MISSING_UNIFORM {
            return false;
        }
        let _scope = ProgramScope::bind(gl, self.program);
        gl.set_uniform(location, value);
        true
    }
}
