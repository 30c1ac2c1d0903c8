//! Capability probing: decides which programmable pipeline the current
//! context offers and resolves its entry points.
//!
//! Types:
//! - [`GlContext`]: what the windowing layer must answer about its context.
//! - [`Capability`]: a resolved pipeline, the factory for programs.
//!
//! Functions:
//! - [`probe_and_resolve`]: probe once per context, right after creating it.

use std::fmt;
use std::os::raw::c_void;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::config::BackendPreference;
use crate::error::ShaderError;
use crate::gl::{
    ArbFunctions, ArbPipeline, CoreFunctions, CorePipeline, FixedFunctions, Lookup,
    ProgrammablePipeline, MINIMUM_VERSION, REQUIRED_EXTENSIONS,
};
use crate::program::ShaderProgram;
use crate::source::ShaderSourceProvider;
use crate::types::Backend;

/// The questions asked of a freshly created, current GL context.
pub trait GlContext {
    fn extension_supported(&self, name: &str) -> bool;
    /// `(major, minor)` of the context.
    fn version(&self) -> (u32, u32);
    /// Address of `symbol`, or null when the driver does not export it.
    fn proc_address(&self, symbol: &str) -> *const c_void;
}

/// A programmable pipeline whose every entry point resolved.
#[derive(Clone)]
pub struct Capability {
    pipeline: Rc<dyn ProgrammablePipeline>,
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("backend", &self.backend())
            .finish()
    }
}

impl Capability {
    /// Wraps an already constructed pipeline, e.g. one provided by an
    /// embedding that resolves symbols itself.
    pub fn from_pipeline(pipeline: Rc<dyn ProgrammablePipeline>) -> Self {
        Self { pipeline }
    }

    pub fn backend(&self) -> Backend {
        self.pipeline.backend()
    }

    pub fn pipeline(&self) -> &Rc<dyn ProgrammablePipeline> {
        &self.pipeline
    }

    /// Builds a program for `id` on this pipeline.
    pub fn create_program(
        &self,
        id: &str,
        provider: Rc<dyn ShaderSourceProvider>,
    ) -> ShaderProgram {
        ShaderProgram::new(id, Rc::clone(&self.pipeline), provider)
    }
}

fn candidates(preference: BackendPreference) -> &'static [Backend] {
    match preference {
        BackendPreference::Auto => &[Backend::Core, Backend::Arb],
        BackendPreference::Arb => &[Backend::Arb],
        BackendPreference::Core => &[Backend::Core],
    }
}

/// Probes `context` for a programmable pipeline and resolves its entry
/// points, trying backends in the order `preference` implies.
///
/// A backend whose extension or version check fails is skipped without any
/// symbol lookup. A backend with any unresolved symbol is unusable; all of
/// its missing names are reported.
pub fn probe_and_resolve(
    context: &dyn GlContext,
    preference: BackendPreference,
) -> Result<Capability, ShaderError> {
    let mut reasons = Vec::new();
    for &backend in candidates(preference) {
        match resolve(context, backend) {
            Ok(pipeline) => {
                info!(backend = %backend, "programmable pipeline available");
                return Ok(Capability { pipeline });
            }
            Err(reason) => {
                debug!(backend = %backend, reason = %reason, "backend rejected");
                reasons.push(format!("{backend}: {reason}"));
            }
        }
    }
    let reason = reasons.join("; ");
    warn!(reason = %reason, "no programmable pipeline; shaders disabled");
    Err(ShaderError::CapabilityUnavailable(reason))
}

fn resolve(context: &dyn GlContext, backend: Backend) -> Result<Rc<dyn ProgrammablePipeline>, String> {
    match backend {
        Backend::Arb => {
            let missing: Vec<&str> = REQUIRED_EXTENSIONS
                .iter()
                .copied()
                .filter(|name| !context.extension_supported(name))
                .collect();
            if !missing.is_empty() {
                return Err(format!("missing extensions {}", missing.join(", ")));
            }
        }
        Backend::Core => {
            let (major, minor) = context.version();
            if (major, minor) < MINIMUM_VERSION {
                return Err(format!(
                    "context version {major}.{minor} is older than {}.{}",
                    MINIMUM_VERSION.0, MINIMUM_VERSION.1
                ));
            }
        }
    }

    let lookup = |symbol: &str| context.proc_address(symbol);
    let lookup: Lookup<'_> = &lookup;
    let fixed = FixedFunctions::load(lookup);
    let pipeline: Rc<dyn ProgrammablePipeline> = match backend {
        Backend::Arb => match (ArbFunctions::load(lookup), fixed) {
            (Ok(arb), Ok(fixed)) => Rc::new(ArbPipeline::new(arb, fixed)),
            (arb, fixed) => return Err(unresolved(arb.err(), fixed.err())),
        },
        Backend::Core => match (CoreFunctions::load(lookup), fixed) {
            (Ok(core), Ok(fixed)) => Rc::new(CorePipeline::new(core, fixed)),
            (core, fixed) => return Err(unresolved(core.err(), fixed.err())),
        },
    };
    Ok(pipeline)
}

fn unresolved(first: Option<Vec<&'static str>>, second: Option<Vec<&'static str>>) -> String {
    let names: Vec<&str> = first.into_iter().chain(second).flatten().collect();
    for name in &names {
        warn!(symbol = %name, "unresolved GL entry point");
    }
    format!("unresolved symbols {}", names.join(", "))
}
