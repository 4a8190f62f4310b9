//! Assets Module
//!
//! Binary runtime asset encoders and the export entry points built on them.
//!
//! - [`MdlWriter`]: bone hierarchy, material and skinned mesh (`.mdl`)
//! - [`AnmWriter`]: per-frame resampled bone tracks and events (`.anm`)
//! - [`run_manifest`]: batch export described by an [`ExportManifest`]

pub mod anm;
pub mod export;
pub mod material;
pub mod mdl;

pub use anm::{ANM_MAGIC, AnmWriter, TrackNames};
pub use export::{
    AnimationExport, ExportManifest, ExportSettings, ExportSummary, ModelExport, PseudoBone, encode_animation,
    encode_animation_to_vec, encode_model, encode_model_to_vec, export_animation, export_model, run_manifest,
};
pub use material::{MaterialDesc, ParamValue, ShaderParam, TAG_FLOAT, TAG_FLOAT3, TAG_STRING};
pub use mdl::{BoneRemap, MDL_MAGIC, MdlWriter};
