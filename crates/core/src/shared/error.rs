use std::path::PathBuf;

use thiserror::Error;

/// Failures scoped to a single pointer file.
///
/// None of these abort a batch; the orchestrator turns each into a failed
/// outcome for the file and moves on.
#[derive(Error, Debug)]
pub enum ArtworkError {
    #[error("failed to read pointer file {path}: {source}")]
    Resolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("pointer file {path} is empty")]
    EmptyPointer { path: PathBuf },
    #[error("cannot open video {location}: {reason}")]
    Open { location: String, reason: String },
    #[error("video {location} has no frames")]
    EmptyStream { location: String },
    #[error("cannot pick {count} distinct frames from a {total_frames}-frame video")]
    Sample { total_frames: usize, count: usize },
    #[error("cannot decode frame {index} of {location}: {reason}")]
    Decode {
        location: String,
        index: usize,
        reason: String,
    },
    #[error("failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

/// Failures that abort the whole batch.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("root directory not found: {0}")]
    RootNotFound(PathBuf),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("failed to walk {path}: {source}")]
    Traverse {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("neither fanart nor poster was requested")]
    NothingRequested,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = ArtworkError::Decode {
            location: "/media/a.mkv".into(),
            index: 42,
            reason: "end of stream".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot decode frame 42 of /media/a.mkv: end of stream"
        );

        let err = ArtworkError::Sample {
            total_frames: 1,
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "cannot pick 2 distinct frames from a 1-frame video"
        );
    }

    #[test]
    fn test_resolution_exposes_source() {
        use std::error::Error as _;
        let err = ArtworkError::Resolution {
            path: PathBuf::from("lib/a.strm"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("lib/a.strm"));
    }
}
