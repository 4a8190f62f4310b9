//! Bind-pose retargeting.
//!
//! An animation's tracks are authored against the rest pose carried inside
//! the [`Animation`]. The runtime plays them against a different bind pose,
//! so every track is rewritten to produce the same motion relative to it.
//!
//! For each bind-pose bone `B` and its authoring counterpart `A`:
//!
//! ```text
//! rotation_delta    = B.rotation⁻¹ * A.rotation
//! translation_delta = B.rotation⁻¹ * (A.position - B.position)
//!
//! translation' = A.rotation * (B.rotation⁻¹ * translation + translation_delta)
//! rotation'    = rotation_delta * rotation
//! ```
//!
//! Bones without a track get a synthesized two-keyframe track holding the
//! delta itself, at `0` and at the animation's length.

use glam::{Quat, Vec3};

use super::clip::Animation;
use super::tracks::{BoneTrack, Keyframe};
use crate::errors::{Result, RigError};
use crate::scene::{Bone, Skeleton};

/// Rest-pose difference between a bind bone and its authoring counterpart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneDelta {
    pub rotation: Quat,
    pub translation: Vec3,
}

impl BoneDelta {
    #[must_use]
    pub fn between(bind: &Bone, author: &Bone) -> Self {
        let bind_inv = bind.rotation.inverse();
        Self {
            rotation: bind_inv * author.rotation,
            translation: bind_inv * (author.position - bind.position),
        }
    }

    /// Rewrites one authored keyframe.
    #[must_use]
    pub fn apply(&self, bind: &Bone, author: &Bone, keyframe: &Keyframe) -> Keyframe {
        let bind_inv = bind.rotation.inverse();
        Keyframe {
            time: keyframe.time,
            translation: author.rotation * (bind_inv * keyframe.translation + self.translation),
            rotation: self.rotation * keyframe.rotation,
        }
    }

    /// The keyframe used for bones with no authored track.
    #[must_use]
    pub fn rest_keyframe(&self, time: f32) -> Keyframe {
        Keyframe::new(time, self.rotation * self.translation, self.rotation)
    }
}

/// Counts from one [`apply_bind_pose`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetargetReport {
    /// Authored tracks rewritten in place.
    pub rewritten: usize,
    /// Tracks synthesized for bones with no authored track.
    pub synthesized: usize,
    /// Authored tracks whose bone is absent from the bind pose, left as-is.
    pub untouched: usize,
}

/// Re-expresses `animation` against `bind_pose`, replacing its tracks.
///
/// Bind-pose bones are visited breadth-first. Every one of them must exist
/// in the authoring pose; a missing counterpart is a
/// [`RigError::MissingBone`] and leaves the animation unchanged. Applying
/// twice is rejected with [`RigError::AlreadyRetargeted`].
pub fn apply_bind_pose(animation: &mut Animation, bind_pose: &Skeleton) -> Result<RetargetReport> {
    if animation.is_retargeted() {
        return Err(RigError::AlreadyRetargeted(animation.name.clone()));
    }

    let order = bind_pose.breadth_first()?;
    let index = animation.track_index();
    let mut tracks = animation.tracks.clone();
    let mut report = RetargetReport::default();
    let mut claimed = vec![false; tracks.len()];

    for bind in order {
        let author = animation.skeleton.bone(&bind.name)?;
        let delta = BoneDelta::between(bind, author);

        match index.get(&bind.name) {
            Some(&i) => {
                for keyframe in &mut tracks[i].keyframes {
                    *keyframe = delta.apply(bind, author, keyframe);
                }
                claimed[i] = true;
                report.rewritten += 1;
            }
            None => {
                let keyframes = vec![delta.rest_keyframe(0.0), delta.rest_keyframe(animation.length)];
                tracks.push(BoneTrack::new(bind.name.clone(), keyframes));
                report.synthesized += 1;
            }
        }
    }

    for (track, _) in animation.tracks.iter().zip(&claimed).filter(|(_, c)| !**c) {
        log::debug!("Track '{}' has no bind-pose bone; left unchanged", track.bone);
        report.untouched += 1;
    }

    animation.tracks = tracks;
    animation.mark_retargeted();
    log::info!(
        "Retargeted '{}': {} tracks rewritten, {} synthesized",
        animation.name,
        report.rewritten,
        report.synthesized
    );
    Ok(report)
}
