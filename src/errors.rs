//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`ViewerError`] covers the failure modes that are
//! programming errors or bad external data:
//! - Model definitions rejected at the parse boundary
//! - Structural violations (hierarchy cycles, double-bucketing)
//! - Unknown formats, sequences, or stale handles
//!
//! Capacity exhaustion is not an error (a new bucket is allocated), and
//! not-ready states (a model still loading, an instance without a write
//! destination) are silently skipped by the frame pass.
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, ViewerError>`.

use thiserror::Error;

/// The main error type for the viewer core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    // ========================================================================
    // Model Definition Errors (parse boundary)
    // ========================================================================
    /// The definition has no nodes or no skinning bones.
    #[error("Empty model definition: {name}")]
    EmptyDefinition {
        /// Name of the offending definition
        name: String,
    },

    /// A node references a parent that is not constructed before it.
    #[error("Node {node} has parent {parent}, which is not constructed before it")]
    InvalidParent {
        /// The node's own index
        node: usize,
        /// The out-of-order parent index
        parent: usize,
    },

    /// A bone lookup entry points outside the node array.
    #[error("Bone lookup references node {bone}, but only {node_count} nodes exist")]
    BoneOutOfRange {
        /// The invalid node index
        bone: usize,
        /// Number of nodes in the definition
        node_count: usize,
    },

    /// A channel carries more per-sequence tracks than there are sequences.
    #[error("Node {node} has tracks for {track_count} sequences, but the model defines {sequence_count}")]
    TrackTableOverflow {
        /// The node whose channel overflows
        node: usize,
        /// Number of per-sequence track slots on the channel
        track_count: usize,
        /// Number of sequences in the definition
        sequence_count: usize,
    },

    /// A keyframe track is structurally invalid (empty, unsorted, mismatched lengths).
    #[error("Invalid keyframe track: {0}")]
    InvalidTrack(String),

    // ========================================================================
    // Hierarchy Errors
    // ========================================================================
    /// Re-parenting would create a cycle (the parent is the node itself or a descendant).
    #[error("Parenting node {node} under {parent} would create a cycle")]
    HierarchyCycle {
        /// The node being re-parented
        node: usize,
        /// The rejected parent
        parent: usize,
    },

    /// A node index is outside the skeleton's node array.
    #[error("Node index {node} out of range (skeleton has {node_count} nodes)")]
    NodeOutOfRange {
        /// The invalid index
        node: usize,
        /// Number of nodes in the skeleton
        node_count: usize,
    },

    // ========================================================================
    // Bucket & Visibility Errors
    // ========================================================================
    /// All slots of the bucket are occupied.
    #[error("Bucket is full")]
    BucketFull,

    /// The instance already holds a slot in this bucket.
    #[error("Instance already holds a slot in this bucket")]
    DuplicateSlot,

    /// The instance holds no slot in this bucket.
    #[error("Instance is not a member of this bucket")]
    NotInBucket,

    /// The instance is already visible (bucketed).
    #[error("Instance is already visible")]
    AlreadyVisible,

    /// The instance is not currently visible (not bucketed).
    #[error("Instance is not visible")]
    NotVisible,

    /// The instance has no render target assigned.
    #[error("Instance has no render target assigned")]
    NoRenderTarget,

    // ========================================================================
    // Sequence Errors
    // ========================================================================
    /// A sequence index outside the model's sequence list.
    #[error("Unknown sequence {index} (model defines {count})")]
    UnknownSequence {
        /// The requested sequence index
        index: usize,
        /// Number of sequences on the model
        count: usize,
    },

    // ========================================================================
    // Registry & Loading Errors
    // ========================================================================
    /// No parser is registered for the requested format tag.
    #[error("No handler registered for format: {0}")]
    UnknownFormat(String),

    /// A registered parser rejected its input.
    #[error("Model parse error: {0}")]
    ParseFailed(String),

    /// The model's asynchronous load resolved with a failure.
    #[error("Model \"{model}\" failed to load: {reason}")]
    ModelLoadFailed {
        /// Name of the model
        model: String,
        /// Failure reason reported by the loading layer
        reason: String,
    },

    /// The operation requires a fully loaded model.
    #[error("Model is not loaded")]
    ModelNotLoaded,

    // ========================================================================
    // Handle Errors
    // ========================================================================
    /// A key referenced an entity that no longer exists.
    #[error("Stale {0} handle")]
    StaleHandle(&'static str),
}

/// Alias for `Result<T, ViewerError>`.
pub type Result<T> = std::result::Result<T, ViewerError>;
