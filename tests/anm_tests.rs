//! ANM Encoding Tests
//!
//! Tests for:
//! - Header (track count, frame count, fps)
//! - Per-frame resampling and the local-space translation
//! - Inverted rotation, fixed scale and auxiliary quaternion
//! - The implicit extra track and the event trailer

use glam::{Quat, Vec3};

use rigport::animation::{Animation, BoneTrack, Keyframe, TerminalSample, apply_bind_pose};
use rigport::assets::{ANM_MAGIC, ExportSettings, encode_animation_to_vec};
use rigport::errors::RigError;
use rigport::io::{BinaryStream, Endianness, MemoryDevice};
use rigport::scene::{Bone, Skeleton};

const EPSILON: f32 = 1e-5;

// ============================================================================
// Oracle decoder
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    translation: [f32; 3],
    rotation: [f32; 4],
    scale: [f32; 3],
    aux: [f32; 4],
}

#[derive(Debug)]
struct DecodedTrack {
    name: String,
    frames: Vec<Frame>,
}

#[derive(Debug)]
struct DecodedAnimation {
    track_count: i32,
    frame_count: i32,
    fps: i32,
    tracks: Vec<DecodedTrack>,
    script: String,
}

fn floats<const N: usize>(s: &mut BinaryStream<MemoryDevice>) -> [f32; N] {
    std::array::from_fn(|_| s.read_f32().unwrap())
}

fn decode(bytes: Vec<u8>) -> DecodedAnimation {
    let mut s = BinaryStream::new(MemoryDevice::from_bytes(bytes)).with_endianness(Endianness::Little);
    assert_eq!(s.read_u32().unwrap(), ANM_MAGIC);
    let track_count = s.read_i32().unwrap();
    let frame_count = s.read_i32().unwrap();
    let fps = s.read_i32().unwrap();

    let mut tracks = Vec::new();
    for _ in 0..track_count {
        let name = s.read_sized_string().unwrap();
        let frames = (0..frame_count)
            .map(|_| Frame {
                translation: floats(&mut s),
                rotation: floats(&mut s),
                scale: floats(&mut s),
                aux: floats(&mut s),
            })
            .collect();
        tracks.push(DecodedTrack { name, frames });
    }
    let script = s.read_sized_string().unwrap();
    assert!(s.at_end());

    DecodedAnimation {
        track_count,
        frame_count,
        fps,
        tracks,
        script,
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn pose(spine_rotation: Quat) -> Skeleton {
    let mut skeleton = Skeleton::new();
    skeleton.insert(Bone::new("root", 0, Vec3::ZERO, Quat::IDENTITY));
    skeleton.insert(Bone::new("spine", 1, Vec3::Y, spine_rotation));
    skeleton.link("spine", "root").unwrap();
    skeleton
}

/// 3 s at 30 fps, spine slides from 0 to (3,0,0).
fn slide() -> Animation {
    Animation::new("slide", 30, 3.0, pose(Quat::IDENTITY)).with_track(BoneTrack::new(
        "spine",
        vec![
            Keyframe::new(0.0, Vec3::ZERO, Quat::IDENTITY),
            Keyframe::new(3.0, Vec3::new(3.0, 0.0, 0.0), Quat::IDENTITY),
        ],
    ))
}

fn approx(a: &[f32], b: &[f32]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < EPSILON)
}

// ============================================================================
// Header
// ============================================================================

#[test]
fn header_counts_extra_track_and_frames() {
    let decoded = decode(encode_animation_to_vec(&slide(), &ExportSettings::default()).unwrap());

    assert_eq!(decoded.track_count, 2);
    assert_eq!(decoded.frame_count, 90);
    assert_eq!(decoded.fps, 30);
    assert_eq!(decoded.tracks.len(), 2);
    assert!(decoded.tracks.iter().all(|t| t.frames.len() == 90));
}

// ============================================================================
// Frames
// ============================================================================

#[test]
fn frames_are_sampled_at_frame_times() {
    let decoded = decode(encode_animation_to_vec(&slide(), &ExportSettings::default()).unwrap());
    let spine = &decoded.tracks[0];

    assert_eq!(spine.name, "spine");
    assert!(approx(&spine.frames[0].translation, &[0.0, 0.0, 0.0]));
    assert!(approx(&spine.frames[45].translation, &[1.5, 0.0, 0.0]));
    assert!(approx(&spine.frames[89].translation, &[89.0 / 30.0, 0.0, 0.0]));
}

#[test]
fn translation_is_expressed_in_bone_space() {
    let quarter = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    let animation = Animation::new("lean", 10, 1.0, pose(quarter))
        .with_track(BoneTrack::new("spine", vec![Keyframe::new(0.0, Vec3::X, Quat::IDENTITY)]));

    let decoded = decode(encode_animation_to_vec(&animation, &ExportSettings::default()).unwrap());
    for frame in &decoded.tracks[0].frames {
        assert!(approx(&frame.translation, &[0.0, -1.0, 0.0]), "{frame:?}");
    }
}

#[test]
fn rotation_is_inverted_and_fixed_blocks_are_constant() {
    let rotation = Quat::from_rotation_x(0.5);
    let animation = Animation::new("nod", 10, 0.5, pose(Quat::IDENTITY))
        .with_track(BoneTrack::new("spine", vec![Keyframe::new(0.0, Vec3::ZERO, rotation)]));

    let decoded = decode(encode_animation_to_vec(&animation, &ExportSettings::default()).unwrap());
    let expected = rotation.inverse().to_array();
    for frame in &decoded.tracks[0].frames {
        assert!(approx(&frame.rotation, &expected), "{frame:?}");
        assert_eq!(frame.scale, [1.0, 1.0, 1.0]);
        assert_eq!(frame.aux, [0.0, 0.0, 0.0, 1.0]);
    }
}

#[test]
fn root_track_uses_root_token() {
    let animation = slide().with_track(BoneTrack::new("root", vec![Keyframe::new(0.0, Vec3::ZERO, Quat::IDENTITY)]));
    let decoded = decode(encode_animation_to_vec(&animation, &ExportSettings::default()).unwrap());
    assert_eq!(decoded.tracks[1].name, "Target_CTRL");
}

#[test]
fn track_shorter_than_animation_follows_terminal_policy() {
    let animation = Animation::new("stop", 30, 2.0, pose(Quat::IDENTITY)).with_track(BoneTrack::new(
        "spine",
        vec![
            Keyframe::new(0.0, Vec3::ZERO, Quat::IDENTITY),
            Keyframe::new(1.0, Vec3::X, Quat::IDENTITY),
        ],
    ));

    let decoded = decode(encode_animation_to_vec(&animation, &ExportSettings::default()).unwrap());
    assert!(approx(&decoded.tracks[0].frames[59].translation, &[1.0, 0.0, 0.0]));

    let strict = ExportSettings {
        terminal_sample: TerminalSample::Reject,
        ..Default::default()
    };
    let err = encode_animation_to_vec(&animation, &strict).unwrap_err();
    assert!(matches!(err, RigError::KeyframeOutOfRange { .. }));
}

// ============================================================================
// Extra track & trailer
// ============================================================================

#[test]
fn extra_track_is_zeroed_except_aux() {
    let decoded = decode(encode_animation_to_vec(&slide(), &ExportSettings::default()).unwrap());
    let extra = decoded.tracks.last().unwrap();

    assert_eq!(extra.name, "Bip01");
    let zeroed = Frame {
        translation: [0.0; 3],
        rotation: [0.0; 4],
        scale: [0.0; 3],
        aux: [0.0, 0.0, 0.0, 1.0],
    };
    assert!(extra.frames.iter().all(|f| *f == zeroed));
}

#[test]
fn trailer_carries_event_script() {
    let mut animation = slide();
    animation.extra.callback("footstep", 15).entity(30, "fx/dust.ent", "foot_l");

    let decoded = decode(encode_animation_to_vec(&animation, &ExportSettings::default()).unwrap());
    assert_eq!(decoded.script, animation.extra.to_script());
    assert!(decoded.script.starts_with("CallbackPoint\n{\n\tname = \"footstep\"\n\tframe = 15\n}\n"));
}

#[test]
fn empty_trailer_is_a_zero_length_string() {
    let bytes = encode_animation_to_vec(&slide(), &ExportSettings::default()).unwrap();
    assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
}

#[test]
fn retargeted_animation_includes_synthesized_tracks() {
    let mut animation = slide();
    apply_bind_pose(&mut animation, &pose(Quat::IDENTITY)).unwrap();

    let decoded = decode(encode_animation_to_vec(&animation, &ExportSettings::default()).unwrap());
    let names: Vec<_> = decoded.tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["spine", "Target_CTRL", "Bip01"]);
    assert_eq!(decoded.track_count, 3);
}
