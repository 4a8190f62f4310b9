//! Animation asset (`.anm`) encoder.
//!
//! ```text
//! u32   magic (ANM_MAGIC)
//! i32   track count + 1, frame count, fps
//! per track (authored tracks, then the extra track):
//!   str   bone name (root renamed)
//!   per frame: f32×3 translation, f32×4 rotation (x, y, z, w),
//!              f32×3 scale, f32×4 auxiliary quaternion (0, 0, 0, 1)
//! str   event script
//! ```

use glam::Vec3;

use crate::animation::{Animation, TerminalSample};
use crate::errors::Result;
use crate::io::{BinaryStream, StreamDevice};

pub const ANM_MAGIC: u32 = 0x024D_4E41;

/// Auxiliary quaternion block present in every frame record.
const AUX_QUAT: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Names used in place of source names.
#[derive(Debug, Clone, Copy)]
pub struct TrackNames<'a> {
    /// Replaces the root bone's name.
    pub root_token: &'a str,
    /// Name of the implicit track appended after the authored ones.
    pub extra_track: &'a str,
}

/// Writes one `.anm` asset into a [`BinaryStream`].
pub struct AnmWriter<'s, D: StreamDevice> {
    stream: &'s mut BinaryStream<D>,
    names: TrackNames<'s>,
    terminal: TerminalSample,
}

impl<'s, D: StreamDevice> AnmWriter<'s, D> {
    pub fn new(stream: &'s mut BinaryStream<D>, names: TrackNames<'s>) -> Self {
        Self {
            stream,
            names,
            terminal: TerminalSample::default(),
        }
    }

    #[must_use]
    pub fn with_terminal_sample(mut self, terminal: TerminalSample) -> Self {
        self.terminal = terminal;
        self
    }

    /// Resamples every track at `i / fps` for each frame and writes the asset.
    pub fn write_animation(&mut self, animation: &Animation) -> Result<()> {
        if !animation.is_retargeted() {
            log::warn!("Writing animation '{}' without a bind pose applied", animation.name);
        }

        let frames = animation.frame_count();
        let fps = animation.fps.max(1) as f32;

        self.stream.write_u32(ANM_MAGIC)?;
        self.stream.write_i32(animation.tracks.len() as i32 + 1)?;
        self.stream.write_i32(frames as i32)?;
        self.stream.write_i32(animation.fps as i32)?;

        for track in &animation.tracks {
            let bone = animation.skeleton.bone(&track.bone)?;
            let to_local = bone.rotation.inverse();
            self.write_track_name(&track.bone, bone.is_root())?;

            for i in 0..frames {
                let sample = track.sample_with(i as f32 / fps, self.terminal)?;
                let rotation = sample.rotation.inverse();
                self.write_frame(to_local * sample.translation, rotation.to_array(), Vec3::ONE)?;
            }
        }

        self.stream.write_sized_string(self.names.extra_track)?;
        for _ in 0..frames {
            self.write_frame(Vec3::ZERO, [0.0; 4], Vec3::ZERO)?;
        }

        self.stream.write_sized_string(&animation.extra.to_script())?;
        log::debug!(
            "Wrote animation '{}': {} tracks x {frames} frames",
            animation.name,
            animation.tracks.len() + 1
        );
        Ok(())
    }

    fn write_track_name(&mut self, name: &str, is_root: bool) -> Result<()> {
        let name = if is_root { self.names.root_token } else { name };
        self.stream.write_sized_string(name)
    }

    fn write_frame(&mut self, translation: Vec3, rotation: [f32; 4], scale: Vec3) -> Result<()> {
        self.stream.write_f32x3(translation.to_array())?;
        for c in rotation {
            self.stream.write_f32(c)?;
        }
        self.stream.write_f32x3(scale.to_array())?;
        for c in AUX_QUAT {
            self.stream.write_f32(c)?;
        }
        Ok(())
    }
}
