//! Animation Module
//!
//! Keyframed bone animation and the bind-pose retargeting pass.
//!
//! - [`BoneTrack`]: ascending keyframes of one bone, with a time-domain sampler
//! - [`Animation`]: tracks, frame rate, length, authoring pose and trailer events
//! - [`apply_bind_pose`]: rewrites an animation relative to another rest pose

pub mod clip;
pub mod events;
pub mod retarget;
pub mod tracks;

pub use clip::Animation;
pub use events::{CallbackPoint, CreateEntity, ExtraData};
pub use retarget::{BoneDelta, RetargetReport, apply_bind_pose};
pub use tracks::{BoneTrack, Keyframe, LocalTransform, TerminalSample};
