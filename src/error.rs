//! Error types for the `framedeck` crate.
//!
//! This module defines [`FramedeckError`], the unified error type returned by
//! every fallible operation, and [`ErrorKind`], the flat classification the
//! pipeline reports to callers. Errors carry the path or timestamp they
//! concern so a failed job can be diagnosed from the message alone.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
    time::Duration,
};

use image::ImageError;
use thiserror::Error;
use zip::result::ZipError;

use crate::document::OutputFormat;

/// The unified error type for all `framedeck` operations.
///
/// Use [`kind`](FramedeckError::kind) to branch on the failure class without
/// matching on every variant.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramedeckError {
    /// The video could not be opened: missing file, unknown container, or no
    /// decodable video stream.
    #[error("Failed to open video source at {path}: {reason}")]
    SourceUnreadable {
        /// Path that was passed to [`crate::VideoHandle::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The sampling interval was zero, negative, or not a finite number.
    #[error("Interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),

    /// A decode was requested past the end of the video.
    #[error("Timestamp {timestamp:?} is out of range (video lasts {duration:?})")]
    OutOfRange {
        /// The requested timestamp.
        timestamp: Duration,
        /// The duration of the video.
        duration: Duration,
    },

    /// A frame could not be decoded.
    #[error("Failed to decode frame at {timestamp:?}: {reason}")]
    Decode {
        /// The timestamp that was being decoded.
        timestamp: Duration,
        /// Upstream error message.
        reason: String,
    },

    /// The output document could not be created at the requested path.
    #[error("Cannot write output document at {path}: {reason}")]
    OutputPathInvalid {
        /// The requested output path.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// Another writer in this process currently owns the output path.
    #[error("Output path {0} is already being written by another job")]
    OutputPathInUse(PathBuf),

    /// Writing the document container failed.
    #[error("Failed to encode document: {0}")]
    Encode(String),

    /// The format cannot represent a document with no frames.
    #[error("{format} output requires at least one frame")]
    EmptyDocument {
        /// Format of the writer that was finalized empty.
        format: OutputFormat,
    },

    /// `add_frame` or `finalize` was called on a finalized writer.
    #[error("Writer has already been finalized")]
    WriterClosed,

    /// The job was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

/// Failure classification surfaced by the pipeline.
///
/// Several [`FramedeckError`] variants share a kind; both
/// [`FramedeckError::Decode`] and [`FramedeckError::OutOfRange`] are
/// [`ErrorKind::DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SourceUnreadable,
    InvalidInterval,
    DecodeError,
    OutputPathInvalid,
    EncodeError,
    EmptyDocument,
    OutputPathInUse,
    WriterClosed,
    Cancelled,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ErrorKind::SourceUnreadable => "SourceUnreadable",
            ErrorKind::InvalidInterval => "InvalidInterval",
            ErrorKind::DecodeError => "DecodeError",
            ErrorKind::OutputPathInvalid => "OutputPathInvalid",
            ErrorKind::EncodeError => "EncodeError",
            ErrorKind::EmptyDocument => "EmptyDocument",
            ErrorKind::OutputPathInUse => "OutputPathInUse",
            ErrorKind::WriterClosed => "WriterClosed",
            ErrorKind::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

impl FramedeckError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FramedeckError::SourceUnreadable { .. } => ErrorKind::SourceUnreadable,
            FramedeckError::InvalidInterval(_) => ErrorKind::InvalidInterval,
            FramedeckError::OutOfRange { .. } | FramedeckError::Decode { .. } => {
                ErrorKind::DecodeError
            }
            FramedeckError::OutputPathInvalid { .. } => ErrorKind::OutputPathInvalid,
            FramedeckError::OutputPathInUse(_) => ErrorKind::OutputPathInUse,
            FramedeckError::Encode(_) => ErrorKind::EncodeError,
            FramedeckError::EmptyDocument { .. } => ErrorKind::EmptyDocument,
            FramedeckError::WriterClosed => ErrorKind::WriterClosed,
            FramedeckError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn decode(timestamp: Duration, reason: impl Display) -> Self {
        FramedeckError::Decode {
            timestamp,
            reason: reason.to_string(),
        }
    }
}

impl From<ImageError> for FramedeckError {
    fn from(error: ImageError) -> Self {
        FramedeckError::Encode(format!("image encoding failed: {error}"))
    }
}

impl From<ZipError> for FramedeckError {
    fn from(error: ZipError) -> Self {
        FramedeckError::Encode(format!("zip container error: {error}"))
    }
}
