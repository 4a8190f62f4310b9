//! Export settings, job descriptors and the export entry points.
//!
//! Every export owns its stream and backing storage for the duration of the
//! call. Nothing here decides whether a failure aborts a batch; errors are
//! returned to the caller.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::Deserialize;

use super::anm::{AnmWriter, TrackNames};
use super::material::MaterialDesc;
use super::mdl::{BoneRemap, MdlWriter};
use crate::animation::{Animation, ExtraData, RetargetReport, TerminalSample, apply_bind_pose};
use crate::errors::Result;
use crate::io::{BinaryStream, Endianness, FileDevice, MemoryDevice, StreamDevice};
use crate::scene::{LoadOptions, Mesh, Skeleton};

/// Export-wide configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Byte order of every multi-byte scalar.
    pub byte_order: Endianness,
    /// Written in place of the root bone's name.
    pub root_token: String,
    /// Name of the implicit track appended to every animation.
    pub extra_track_name: String,
    /// Prepended to non-root bone names when loading.
    pub bone_prefix: Option<String>,
    pub fps: u32,
    pub mesh_name: String,
    pub material: MaterialDesc,
    pub terminal_sample: TerminalSample,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            byte_order: Endianness::Little,
            root_token: "Target_CTRL".to_string(),
            extra_track_name: "Bip01".to_string(),
            bone_prefix: None,
            fps: 30,
            mesh_name: "Mesh".to_string(),
            material: MaterialDesc::default(),
            terminal_sample: TerminalSample::ClampToLast,
        }
    }
}

impl ExportSettings {
    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            bone_prefix: self.bone_prefix.clone(),
            fps: self.fps,
        }
    }

    fn track_names(&self) -> TrackNames<'_> {
        TrackNames {
            root_token: &self.root_token,
            extra_track: &self.extra_track_name,
        }
    }
}

// ============================================================================
// Job descriptors
// ============================================================================

/// A bone appended to the bind pose before the model is encoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PseudoBone {
    pub name: String,
    pub parent: String,
    #[serde(default)]
    pub position: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelExport {
    /// Mesh document.
    pub mesh: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub pseudo_bones: Vec<PseudoBone>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnimationExport {
    pub name: String,
    /// Skeleton document carrying the animation and its authoring pose.
    pub source: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub events: ExtraData,
}

/// A batch of exports sharing one bind pose.
///
/// Relative paths are resolved against the manifest's directory by
/// [`ExportManifest::load`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportManifest {
    #[serde(default)]
    pub settings: ExportSettings,
    /// Skeleton document of the runtime bind pose.
    pub bind_pose: PathBuf,
    #[serde(default)]
    pub model: Option<ModelExport>,
    #[serde(default)]
    pub animations: Vec<AnimationExport>,
}

impl ExportManifest {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut manifest = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        if let Some(base) = path.parent() {
            manifest.resolve_paths(base);
        }
        Ok(manifest)
    }

    /// Joins every relative path onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.bind_pose);
        if let Some(model) = &mut self.model {
            resolve(&mut model.mesh);
            resolve(&mut model.output);
        }
        for job in &mut self.animations {
            resolve(&mut job.source);
            resolve(&mut job.output);
        }
    }
}

/// What [`run_manifest`] produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub models: usize,
    pub animations: usize,
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a static asset into `stream`.
pub fn encode_model<D: StreamDevice>(
    stream: &mut BinaryStream<D>,
    skeleton: &Skeleton,
    mesh: &Mesh,
    settings: &ExportSettings,
) -> Result<BoneRemap> {
    stream.set_endianness(settings.byte_order);
    MdlWriter::new(stream, &settings.root_token).write_model(skeleton, mesh, &settings.material, &settings.mesh_name)
}

/// Encodes an (already retargeted) animation into `stream`.
pub fn encode_animation<D: StreamDevice>(
    stream: &mut BinaryStream<D>,
    animation: &Animation,
    settings: &ExportSettings,
) -> Result<()> {
    stream.set_endianness(settings.byte_order);
    AnmWriter::new(stream, settings.track_names())
        .with_terminal_sample(settings.terminal_sample)
        .write_animation(animation)
}

pub fn encode_model_to_vec(skeleton: &Skeleton, mesh: &Mesh, settings: &ExportSettings) -> Result<Vec<u8>> {
    let mut stream = BinaryStream::new(MemoryDevice::new());
    encode_model(&mut stream, skeleton, mesh, settings)?;
    Ok(stream.finish()?.into_inner())
}

pub fn encode_animation_to_vec(animation: &Animation, settings: &ExportSettings) -> Result<Vec<u8>> {
    let mut stream = BinaryStream::new(MemoryDevice::new());
    encode_animation(&mut stream, animation, settings)?;
    Ok(stream.finish()?.into_inner())
}

// ============================================================================
// File exports
// ============================================================================

/// Called only with a fully encoded asset; failed exports leave no file.
fn write_asset(path: &Path, bytes: &[u8]) -> Result<u64> {
    let mut device = FileDevice::create(path)?;
    device.write(bytes)?;
    device.flush()?;
    Ok(device.size())
}

/// Writes a static asset to `path`.
pub fn export_model(
    skeleton: &Skeleton,
    mesh: &Mesh,
    settings: &ExportSettings,
    path: impl AsRef<Path>,
) -> Result<BoneRemap> {
    let path = path.as_ref();
    let mut stream = BinaryStream::new(MemoryDevice::new());
    let remap = encode_model(&mut stream, skeleton, mesh, settings)?;
    let size = write_asset(path, &stream.finish()?.into_inner())?;
    log::info!("Exported model {} ({} bones, {size} bytes)", path.display(), remap.len());
    Ok(remap)
}

/// Retargets `animation` onto `bind_pose`, attaches `events` and writes it to `path`.
///
/// An animation that was already retargeted is written as-is.
pub fn export_animation(
    animation: &mut Animation,
    bind_pose: &Skeleton,
    events: &ExtraData,
    settings: &ExportSettings,
    path: impl AsRef<Path>,
) -> Result<RetargetReport> {
    let path = path.as_ref();
    let report = if animation.is_retargeted() {
        RetargetReport::default()
    } else {
        apply_bind_pose(animation, bind_pose)?
    };
    animation.extra = events.clone();

    let bytes = encode_animation_to_vec(animation, settings)?;
    let size = write_asset(path, &bytes)?;
    log::info!(
        "Exported animation '{}' to {} ({} frames, {size} bytes)",
        animation.name,
        path.display(),
        animation.frame_count()
    );
    Ok(report)
}

/// Runs every job of `manifest`, stopping at the first failure.
pub fn run_manifest(manifest: &ExportManifest) -> Result<ExportSummary> {
    let settings = &manifest.settings;
    let options = settings.load_options();
    let bind_pose = Skeleton::load(&manifest.bind_pose, &options)?;
    let mut summary = ExportSummary::default();

    if let Some(job) = &manifest.model {
        let mesh = Mesh::load(&job.mesh)?;
        let mut skeleton = bind_pose.clone();
        for pseudo in &job.pseudo_bones {
            skeleton.add_pseudo_bone(&pseudo.name, &pseudo.parent, Vec3::from_array(pseudo.position))?;
        }
        export_model(&skeleton, &mesh, settings, &job.output)
            .inspect_err(|e| log::error!("Model export to {} failed: {e}", job.output.display()))?;
        summary.models += 1;
    }

    for job in &manifest.animations {
        let mut animation = Animation::load(job.name.clone(), &job.source, &options)?;
        export_animation(&mut animation, &bind_pose, &job.events, settings, &job.output)
            .inspect_err(|e| log::error!("Animation '{}' failed: {e}", job.name))?;
        summary.animations += 1;
    }

    Ok(summary)
}
