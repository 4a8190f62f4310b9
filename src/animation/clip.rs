use rustc_hash::FxHashMap;

use super::events::ExtraData;
use super::tracks::{BoneTrack, Keyframe};
use crate::errors::Result;
use crate::scene::{LoadOptions, SceneNode, Skeleton};

/// A keyframed animation authored against its own rest pose.
#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    /// Nominal sampling rate.
    pub fps: u32,
    /// Duration in seconds.
    pub length: f32,
    pub tracks: Vec<BoneTrack>,
    /// The rest pose the tracks are expressed against.
    pub skeleton: Skeleton,
    pub extra: ExtraData,
    retargeted: bool,
}

impl Animation {
    pub fn new(name: impl Into<String>, fps: u32, length: f32, skeleton: Skeleton) -> Self {
        Self {
            name: name.into(),
            fps,
            length,
            tracks: Vec::new(),
            skeleton,
            extra: ExtraData::default(),
            retargeted: false,
        }
    }

    #[must_use]
    pub fn with_track(mut self, track: BoneTrack) -> Self {
        self.tracks.push(track);
        self
    }

    /// Builds an animation from a skeleton document carrying `animations`.
    ///
    /// The document's bones are the authoring pose. The first
    /// `animations/animation` element supplies the length and the tracks;
    /// the frame rate comes from `options`.
    pub fn from_node(name: impl Into<String>, node: &SceneNode, options: &LoadOptions) -> Result<Self> {
        let skeleton = Skeleton::from_node(node, options)?;
        let mut animation = Self::new(name, options.fps, 0.0, skeleton);

        let Some(source) = node.children_of("animations").find(|n| n.name == "animation") else {
            log::warn!("Animation '{}' has no <animation> element", animation.name);
            return Ok(animation);
        };
        animation.length = source.attr_f32("length");

        for track in source.children_of("tracks") {
            let bone = options.bone_name(track.attr_str("bone"));
            let keyframes = track
                .children_of("keyframes")
                .map(|kf| {
                    Keyframe::new(
                        kf.attr_f32("time"),
                        kf.child("translate").map(SceneNode::vec3).unwrap_or_default(),
                        kf.child("rotate").map(SceneNode::axis_angle).unwrap_or_default(),
                    )
                })
                .collect();

            if !animation.skeleton.contains(&bone) {
                log::warn!("Track '{bone}' has no bone in the authoring pose");
            }
            animation.tracks.push(BoneTrack::new(bone, keyframes));
        }

        log::debug!(
            "Loaded animation '{}': {} tracks, {}s",
            animation.name,
            animation.tracks.len(),
            animation.length
        );
        Ok(animation)
    }

    pub fn load(name: impl Into<String>, path: impl AsRef<std::path::Path>, options: &LoadOptions) -> Result<Self> {
        Self::from_node(name, &SceneNode::load_json(path)?, options)
    }

    /// `fps * length`, truncated.
    #[must_use]
    pub fn frame_count(&self) -> u32 {
        (self.fps as f32 * self.length) as u32
    }

    #[must_use]
    pub fn track(&self, bone: &str) -> Option<&BoneTrack> {
        self.tracks.iter().find(|t| t.bone == bone)
    }

    /// Track index by bone name.
    pub(crate) fn track_index(&self) -> FxHashMap<String, usize> {
        self.tracks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.bone.clone(), i))
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn is_retargeted(&self) -> bool {
        self.retargeted
    }

    pub(crate) fn mark_retargeted(&mut self) {
        self.retargeted = true;
    }
}
