use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::errors::{Result, RigError};

/// Relative tolerance for matching a query time against a keyframe time.
const TIME_EPSILON: f32 = 1e-5;

/// What sampling at or past the last keyframe does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalSample {
    /// Hold the last keyframe.
    #[default]
    ClampToLast,
    /// Return [`RigError::KeyframeOutOfRange`].
    Reject,
}

/// A bone's local transform at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    pub translation: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Seconds from the start of the animation.
    pub time: f32,
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Keyframe {
    #[must_use]
    pub const fn new(time: f32, translation: Vec3, rotation: Quat) -> Self {
        Self {
            time,
            translation,
            rotation,
        }
    }

    #[inline]
    #[must_use]
    pub const fn transform(&self) -> LocalTransform {
        LocalTransform {
            translation: self.translation,
            rotation: self.rotation,
        }
    }
}

#[inline]
fn same_time(a: f32, b: f32) -> bool {
    (a - b).abs() <= TIME_EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Keyframes of one bone, ascending by time.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneTrack {
    pub bone: String,
    pub keyframes: Vec<Keyframe>,
}

impl BoneTrack {
    pub fn new(bone: impl Into<String>, mut keyframes: Vec<Keyframe>) -> Self {
        let bone = bone.into();
        if !keyframes.is_sorted_by(|a, b| a.time <= b.time) {
            log::warn!("Track '{bone}' keyframes are out of order; sorting");
            keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
        Self { bone, keyframes }
    }

    /// Time of the last keyframe, 0 for an empty track.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    /// Samples with the default [`TerminalSample::ClampToLast`] policy.
    pub fn sample_at(&self, time: f32) -> Result<LocalTransform> {
        self.sample_with(time, TerminalSample::ClampToLast)
    }

    /// Samples the track at `time`.
    ///
    /// A keyframe whose time matches `time` is returned verbatim. Otherwise
    /// the bracketing pair `k1.time <= time < k2.time` is interpolated:
    /// translation linearly, rotation by shortest-arc slerp. Queries before
    /// the first keyframe return the first keyframe; queries past the last
    /// one follow `terminal`.
    pub fn sample_with(&self, time: f32, terminal: TerminalSample) -> Result<LocalTransform> {
        let (Some(first), Some(last)) = (self.keyframes.first(), self.keyframes.last()) else {
            return Err(RigError::EmptyTrack(self.bone.clone()));
        };

        if let Some(exact) = self.keyframes.iter().find(|k| same_time(k.time, time)) {
            return Ok(exact.transform());
        }

        // First keyframe strictly after `time`.
        let next = self.keyframes.partition_point(|k| k.time <= time);

        if next == 0 {
            log::trace!("Track '{}' sampled at {time}s before its first keyframe", self.bone);
            return Ok(first.transform());
        }

        if next == self.keyframes.len() {
            return match terminal {
                TerminalSample::ClampToLast => {
                    log::debug!(
                        "Track '{}' sampled at {time}s past {}s; holding last keyframe",
                        self.bone,
                        last.time
                    );
                    Ok(last.transform())
                }
                TerminalSample::Reject => Err(RigError::KeyframeOutOfRange {
                    bone: self.bone.clone(),
                    time,
                    last: last.time,
                }),
            };
        }

        let k1 = &self.keyframes[next - 1];
        let k2 = &self.keyframes[next];
        let t = ((time - k1.time) / (k2.time - k1.time)).clamp(0.0, 1.0);

        Ok(LocalTransform {
            translation: k1.translation.lerp(k2.translation, t),
            rotation: k1.rotation.slerp(k2.rotation, t),
        })
    }
}
