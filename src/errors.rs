//! Error Types
//!
//! This module defines the error types used throughout the exporter.
//!
//! # Overview
//!
//! The main error type [`RigError`] covers all failure modes including:
//! - Stream boundary violations (clipped writes, short reads)
//! - Scene document decoding errors
//! - Structural problems in the source hierarchy or tracks
//! - Contract violations that would produce a corrupt asset
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, RigError>`.
//!
//! ```rust,ignore
//! use rigport::errors::{RigError, Result};
//!
//! fn export() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```
//!
//! Lower layers never abort the process: they return an error and leave the
//! decision to the caller. A [`RigError::StreamOverflow`] still means the
//! stream was clipped, so callers must treat it as fatal for the asset.

use thiserror::Error;

/// The main error type for the exporter.
#[derive(Error, Debug)]
pub enum RigError {
    // ========================================================================
    // I/O Boundary Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A write or seek went past the end of a fixed-size buffer.
    ///
    /// The operation was clipped to the available range.
    #[error("{op} past end of fixed stream at position {position} ({requested} bytes requested, {available} available)")]
    StreamOverflow {
        /// The operation that was clipped ("write" or "seek")
        op: &'static str,
        /// Stream position when the operation started
        position: u64,
        /// Number of bytes (or target offset) requested
        requested: u64,
        /// Number of bytes (or extent) actually available
        available: u64,
    },

    /// A read went past the end of the stream; missing bytes were zero-filled.
    #[error("Read past end of stream at position {position} ({requested} bytes requested, {available} available)")]
    StreamUnderflow {
        /// Stream position when the read started
        position: u64,
        /// Number of bytes requested
        requested: u64,
        /// Number of bytes actually read
        available: u64,
    },

    /// A relative seek would move before the start of the stream.
    ///
    /// The position was clamped to 0.
    #[error("Seek before start of stream (offset {offset} from position {position})")]
    SeekBeforeStart {
        /// Stream position when the seek started
        position: u64,
        /// Relative offset requested
        offset: i64,
    },

    /// `pop` was called without a matching `push`.
    #[error("Position stack is empty")]
    EmptyPositionStack,

    /// A zero-terminated string ran into the end of the stream.
    #[error("Unterminated string at position {0}")]
    UnterminatedString(u64),

    // ========================================================================
    // Document Errors
    // ========================================================================
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The document root is not the element the loader expects.
    #[error("Expected <{expected}> element, found <{found}>")]
    UnexpectedElement {
        /// Element name the loader requires
        expected: &'static str,
        /// Element name that was supplied
        found: String,
    },

    // ========================================================================
    // Structural Errors
    // ========================================================================
    /// The skeleton has no bone named `root`.
    #[error("Skeleton has no root bone")]
    MissingRoot,

    /// A track has no keyframes to sample.
    #[error("Track '{0}' has no keyframes")]
    EmptyTrack(String),

    /// A track was sampled past its last keyframe under the rejecting policy.
    #[error("Track '{bone}' sampled at {time}s past its last keyframe at {last}s")]
    KeyframeOutOfRange {
        /// Bone the track animates
        bone: String,
        /// Requested sample time
        time: f32,
        /// Time of the last keyframe
        last: f32,
    },

    /// Bind pose was already applied to this animation.
    #[error("Animation '{0}' has already been retargeted")]
    AlreadyRetargeted(String),

    // ========================================================================
    // Contract Errors
    // ========================================================================
    /// A bone lookup by name failed.
    #[error("Bone not found: {0}")]
    MissingBone(String),

    /// A vertex weight references a bone id that was never assigned a new index.
    #[error("Vertex weight references unmapped bone id {0}")]
    UnmappedBoneId(i32),
}

impl RigError {
    /// Whether the error is one of the contract violations that must abort an export.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::MissingBone(_) | Self::UnmappedBoneId(_))
    }
}

/// Alias for `Result<T, RigError>`.
pub type Result<T> = std::result::Result<T, RigError>;
