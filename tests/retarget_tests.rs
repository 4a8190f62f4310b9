//! Retargeting Tests
//!
//! Tests for:
//! - Identical poses leave every track unchanged
//! - Delta arithmetic for rotated and translated rest poses
//! - Synthesized tracks for bones without keyframes
//! - Contract failures (missing bones, repeated application)

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use rigport::animation::{Animation, BoneDelta, BoneTrack, Keyframe, apply_bind_pose};
use rigport::errors::RigError;
use rigport::scene::{Bone, Skeleton};

const EPSILON: f32 = 1e-5;

type BoneSpec<'a> = (&'a str, Option<&'a str>, Vec3, Quat);

fn skeleton(bones: &[BoneSpec<'_>]) -> Skeleton {
    let mut skeleton = Skeleton::new();
    for (i, (name, _, position, rotation)) in bones.iter().enumerate() {
        skeleton.insert(Bone::new(*name, i as i32, *position, *rotation));
    }
    for (name, parent, ..) in bones {
        if let Some(parent) = parent {
            skeleton.link(name, parent).unwrap();
        }
    }
    skeleton
}

fn rest_pose() -> Skeleton {
    skeleton(&[
        ("root", None, Vec3::ZERO, Quat::IDENTITY),
        ("spine", Some("root"), Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_x(0.4)),
        ("arm", Some("spine"), Vec3::new(0.3, 0.2, 0.0), Quat::from_rotation_y(-1.1)),
    ])
}

fn spine_track() -> BoneTrack {
    BoneTrack::new(
        "spine",
        vec![
            Keyframe::new(0.0, Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY),
            Keyframe::new(1.0, Vec3::new(0.5, 0.5, 0.0), Quat::from_rotation_z(0.7)),
        ],
    )
}

fn assert_keyframe(actual: &Keyframe, translation: Vec3, rotation: Quat) {
    assert!(
        actual.translation.abs_diff_eq(translation, EPSILON),
        "translation {} != {translation}",
        actual.translation
    );
    assert!(
        actual.rotation.abs_diff_eq(rotation, EPSILON) || actual.rotation.abs_diff_eq(-rotation, EPSILON),
        "rotation {} != {rotation}",
        actual.rotation
    );
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn identical_poses_are_a_no_op() {
    let original = spine_track();
    let mut animation = Animation::new("walk", 30, 1.0, rest_pose()).with_track(original.clone());

    let report = apply_bind_pose(&mut animation, &rest_pose()).unwrap();
    assert_eq!(report.rewritten, 1);
    assert_eq!(report.synthesized, 2);

    let spine = animation.track("spine").unwrap();
    for (after, before) in spine.keyframes.iter().zip(&original.keyframes) {
        assert_eq!(after.time, before.time);
        assert_keyframe(after, before.translation, before.rotation);
    }

    for bone in ["root", "arm"] {
        let track = animation.track(bone).unwrap();
        assert_eq!(track.keyframes.len(), 2);
        for keyframe in &track.keyframes {
            assert_keyframe(keyframe, Vec3::ZERO, Quat::IDENTITY);
        }
    }
}

#[test]
fn delta_between_identical_bones_is_identity() {
    let pose = rest_pose();
    let arm = pose.bone("arm").unwrap();
    let delta = BoneDelta::between(arm, arm);
    assert!(delta.rotation.abs_diff_eq(Quat::IDENTITY, EPSILON));
    assert!(delta.translation.abs_diff_eq(Vec3::ZERO, EPSILON));
}

// ============================================================================
// Delta arithmetic
// ============================================================================

#[test]
fn authoring_offset_and_rotation_are_folded_in() {
    let bind = skeleton(&[
        ("root", None, Vec3::ZERO, Quat::IDENTITY),
        ("spine", Some("root"), Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY),
    ]);
    let authoring = skeleton(&[
        ("root", None, Vec3::ZERO, Quat::IDENTITY),
        ("spine", Some("root"), Vec3::new(0.0, 2.0, 0.0), Quat::from_rotation_z(FRAC_PI_2)),
    ]);
    let track = BoneTrack::new("spine", vec![Keyframe::new(0.0, Vec3::X, Quat::IDENTITY)]);
    let mut animation = Animation::new("lean", 30, 1.0, authoring).with_track(track);

    apply_bind_pose(&mut animation, &bind).unwrap();

    // rz90 * ((1,0,0) + (0,1,0)) = (-1,1,0)
    let spine = animation.track("spine").unwrap();
    assert_keyframe(&spine.keyframes[0], Vec3::new(-1.0, 1.0, 0.0), Quat::from_rotation_z(FRAC_PI_2));
}

#[test]
fn bind_rotation_is_removed() {
    let bind = skeleton(&[
        ("root", None, Vec3::ZERO, Quat::IDENTITY),
        ("spine", Some("root"), Vec3::Y, Quat::from_rotation_z(FRAC_PI_2)),
    ]);
    let authoring = skeleton(&[
        ("root", None, Vec3::ZERO, Quat::IDENTITY),
        ("spine", Some("root"), Vec3::Y, Quat::IDENTITY),
    ]);
    let rotation = Quat::from_rotation_x(0.25);
    let track = BoneTrack::new("spine", vec![Keyframe::new(0.0, Vec3::X, rotation)]);
    let mut animation = Animation::new("turn", 30, 1.0, authoring).with_track(track);

    apply_bind_pose(&mut animation, &bind).unwrap();

    let spine = animation.track("spine").unwrap();
    let undo = Quat::from_rotation_z(-FRAC_PI_2);
    assert_keyframe(&spine.keyframes[0], Vec3::new(0.0, -1.0, 0.0), undo * rotation);
}

#[test]
fn synthesized_track_holds_rest_delta() {
    let bind = skeleton(&[
        ("root", None, Vec3::ZERO, Quat::IDENTITY),
        ("spine", Some("root"), Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY),
    ]);
    let authoring = skeleton(&[
        ("root", None, Vec3::ZERO, Quat::IDENTITY),
        ("spine", Some("root"), Vec3::new(0.0, 2.0, 0.0), Quat::from_rotation_z(FRAC_PI_2)),
    ]);
    let mut animation = Animation::new("idle", 30, 2.5, authoring);

    let report = apply_bind_pose(&mut animation, &bind).unwrap();
    assert_eq!(report.synthesized, 2);
    assert_eq!(
        animation.tracks.iter().map(|t| t.bone.as_str()).collect::<Vec<_>>(),
        vec!["root", "spine"]
    );

    // rotation = delta, translation = delta.rotation * delta.translation = rz90 * (0,1,0)
    let spine = animation.track("spine").unwrap();
    assert_eq!(spine.keyframes[0].time, 0.0);
    assert_eq!(spine.keyframes[1].time, 2.5);
    for keyframe in &spine.keyframes {
        assert_keyframe(keyframe, Vec3::new(-1.0, 0.0, 0.0), Quat::from_rotation_z(FRAC_PI_2));
    }
}

#[test]
fn tracks_outside_bind_pose_are_left_alone() {
    let authoring = skeleton(&[
        ("root", None, Vec3::ZERO, Quat::IDENTITY),
        ("cape", Some("root"), Vec3::new(0.0, 0.0, -1.0), Quat::from_rotation_y(0.2)),
    ]);
    let bind = skeleton(&[("root", None, Vec3::ZERO, Quat::IDENTITY)]);
    let cape = BoneTrack::new("cape", vec![Keyframe::new(0.0, Vec3::X, Quat::IDENTITY)]);
    let mut animation = Animation::new("wave", 30, 1.0, authoring).with_track(cape.clone());

    let report = apply_bind_pose(&mut animation, &bind).unwrap();
    assert_eq!(report.untouched, 1);
    assert_eq!(animation.track("cape"), Some(&cape));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn bind_bone_missing_from_authoring_pose_fails() {
    let mut bind = rest_pose();
    bind.add_pseudo_bone("weapon", "arm", Vec3::new(100.0, 0.0, 0.0)).unwrap();
    let mut animation = Animation::new("slash", 30, 1.0, rest_pose()).with_track(spine_track());

    let err = apply_bind_pose(&mut animation, &bind).unwrap_err();
    assert!(matches!(err, RigError::MissingBone(ref name) if name == "weapon"));
    assert!(!animation.is_retargeted());
    assert_eq!(animation.tracks, vec![spine_track()]);
}

#[test]
fn second_application_is_rejected() {
    let mut animation = Animation::new("walk", 30, 1.0, rest_pose()).with_track(spine_track());
    apply_bind_pose(&mut animation, &rest_pose()).unwrap();
    assert!(animation.is_retargeted());

    let err = apply_bind_pose(&mut animation, &rest_pose()).unwrap_err();
    assert!(matches!(err, RigError::AlreadyRetargeted(ref name) if name == "walk"));
}
