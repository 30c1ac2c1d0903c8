//! Schema of `shader.toml`, the manifest at the root of every shader pack.
//!
//! Types:
//!
//! - `ShaderPackManifest` names the two stage files, the logical scale the
//!   host should apply to its window, and default values for uniforms.
//!
//! Functions:
//!
//! - `ShaderPackManifest::validate` returns human-readable issues so loaders
//!   and `fxcheck` can report every problem at once instead of the first.
//! - `uniform_value` maps a TOML value onto the uniform type it initialises.
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use postfx::{ShaderMetadata, UniformValue, BUILTIN_UNIFORMS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ShaderPackManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_vertex")]
    pub vertex: PathBuf,
    #[serde(default = "default_fragment")]
    pub fragment: PathBuf,
    #[serde(default = "default_logical_scale")]
    pub logical_scale: f64,
    #[serde(default)]
    pub uniforms: BTreeMap<String, toml::Value>,
}

fn default_vertex() -> PathBuf {
    PathBuf::from("shader.vert")
}

fn default_fragment() -> PathBuf {
    PathBuf::from("shader.frag")
}

fn default_logical_scale() -> f64 {
    1.0
}

impl Default for ShaderPackManifest {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            vertex: default_vertex(),
            fragment: default_fragment(),
            logical_scale: default_logical_scale(),
            uniforms: BTreeMap::new(),
        }
    }
}

/// Converts a manifest default into a uniform value.
///
/// Integers become `int`, floats `float`, booleans `bool`, and arrays of two
/// to four numbers the matching `vec`.
pub fn uniform_value(value: &toml::Value) -> Result<UniformValue, String> {
    match value {
        toml::Value::Boolean(flag) => Ok(UniformValue::Bool(*flag)),
        toml::Value::Integer(int) => i32::try_from(*int)
            .map(UniformValue::Int)
            .map_err(|_| format!("integer {int} does not fit in a GLSL int")),
        toml::Value::Float(float) => Ok(UniformValue::Float(*float as f32)),
        toml::Value::Array(items) => {
            let numbers = items
                .iter()
                .map(|item| match item {
                    toml::Value::Integer(int) => Ok(*int as f32),
                    toml::Value::Float(float) => Ok(*float as f32),
                    other => Err(format!("vector component {other} is not a number")),
                })
                .collect::<Result<Vec<f32>, String>>()?;
            match numbers.as_slice() {
                [x, y] => Ok(UniformValue::Vec2([*x, *y])),
                [x, y, z] => Ok(UniformValue::Vec3([*x, *y, *z])),
                [x, y, z, w] => Ok(UniformValue::Vec4([*x, *y, *z, *w])),
                _ => Err(format!(
                    "vector defaults need 2 to 4 components, found {}",
                    numbers.len()
                )),
            }
        }
        other => Err(format!("unsupported uniform default of type {}", other.type_str())),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn stays_inside_pack(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

impl ShaderPackManifest {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.logical_scale.is_finite() || self.logical_scale <= 0.0 {
            issues.push(format!(
                "logical_scale must be a positive number, found {}",
                self.logical_scale
            ));
        }
        for (stage, path) in [("vertex", &self.vertex), ("fragment", &self.fragment)] {
            if !stays_inside_pack(path) {
                issues.push(format!(
                    "{stage} path '{}' must be a relative path inside the pack",
                    path.display()
                ));
            }
        }
        for (name, value) in &self.uniforms {
            if !is_identifier(name) {
                issues.push(format!("uniform '{name}' is not a valid GLSL identifier"));
            }
            if BUILTIN_UNIFORMS.iter().any(|builtin| *builtin == name.as_str()) {
                issues.push(format!("uniform '{name}' is set by the renderer and cannot have a default"));
            }
            if let Err(reason) = uniform_value(value) {
                issues.push(format!("uniform '{name}': {reason}"));
            }
        }
        issues
    }

    /// Metadata handed to programs. Defaults that fail conversion are left
    /// out; `validate` reports them.
    pub fn metadata(&self) -> ShaderMetadata {
        ShaderMetadata {
            logical_scale: self.logical_scale,
            uniforms: self
                .uniforms
                .iter()
                .filter_map(|(name, value)| {
                    uniform_value(value).ok().map(|value| (name.clone(), value))
                })
                .collect(),
        }
    }
}
