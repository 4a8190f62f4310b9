#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Converts skeletal scene descriptions into compact runtime assets.
//!
//! A bind-pose skeleton and a skinned mesh become one `.mdl` static asset;
//! each keyframed animation is retargeted onto the bind pose, resampled at a
//! fixed frame rate and encoded as an `.anm` asset.
//!
//! ```rust,ignore
//! use rigport::{Animation, ExportSettings, Skeleton, apply_bind_pose, encode_animation_to_vec};
//!
//! let settings = ExportSettings::default();
//! let options = settings.load_options();
//! let bind_pose = Skeleton::load("skeleton.json", &options)?;
//! let mut walk = Animation::load("walk", "walk.json", &options)?;
//! apply_bind_pose(&mut walk, &bind_pose)?;
//! let bytes = encode_animation_to_vec(&walk, &settings)?;
//! ```

pub mod animation;
pub mod assets;
pub mod errors;
pub mod io;
pub mod scene;

pub use animation::{Animation, BoneTrack, ExtraData, Keyframe, TerminalSample, apply_bind_pose};
pub use assets::{
    AnmWriter, BoneRemap, ExportManifest, ExportSettings, MaterialDesc, MdlWriter, encode_animation_to_vec,
    encode_model_to_vec, export_animation, export_model, run_manifest,
};
pub use errors::{Result, RigError};
pub use io::{BinaryStream, Endianness, FileDevice, FixedBuffer, MemoryDevice, StreamDevice};
pub use scene::{Bone, BoneWeight, Geometry, LoadOptions, Mesh, SceneNode, Skeleton, Triangle};
