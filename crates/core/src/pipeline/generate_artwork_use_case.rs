use std::path::Path;
use std::sync::Arc;

use crate::artwork::artwork_store::ArtworkStore;
use crate::imaging::poster_crop::crop_to_poster;
use crate::pipeline::batch_report::FileOutcome;
use crate::pipeline::log_sink::{LogEvent, LogLevel, LogSink};
use crate::pointer::domain::pointer_resolver::PointerResolver;
use crate::sampling::frame_sampler::FrameSampler;
use crate::shared::artwork_kind::ArtworkKind;
use crate::shared::error::ArtworkError;
use crate::video::domain::video_decoder::VideoDecoder;

/// Progress of one pointer file through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStage {
    Discovered,
    Resolved,
    Sampled,
    Decoded,
    Written,
    Done,
}

impl std::fmt::Display for FileStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FileStage::Discovered => "discovered",
            FileStage::Resolved => "resolved",
            FileStage::Sampled => "sampled",
            FileStage::Decoded => "decoded",
            FileStage::Written => "written",
            FileStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Why a file failed: the error plus the last stage it completed.
#[derive(Debug)]
struct StageFailure {
    stage: FileStage,
    error: ArtworkError,
    generated: Vec<ArtworkKind>,
}

/// Per-file pipeline: existence check → resolve → open → sample → decode →
/// crop → write.
///
/// Artwork that already exists is never regenerated, and when every requested
/// kind exists the video is not opened at all. The video handle lives only
/// inside [`GenerateArtworkUseCase::generate`], so it is released on every
/// exit path.
pub struct GenerateArtworkUseCase {
    resolver: Arc<dyn PointerResolver>,
    decoder: Arc<dyn VideoDecoder>,
    store: ArtworkStore,
    sampler: FrameSampler,
}

impl GenerateArtworkUseCase {
    pub fn new(
        resolver: Arc<dyn PointerResolver>,
        decoder: Arc<dyn VideoDecoder>,
        store: ArtworkStore,
        sampler: FrameSampler,
    ) -> Self {
        Self {
            resolver,
            decoder,
            store,
            sampler,
        }
    }

    /// Processes one pointer file. Never panics on I/O or decode problems;
    /// they come back as a failed [`FileOutcome`].
    pub fn execute(
        &mut self,
        pointer_path: &Path,
        requested: &[ArtworkKind],
        sink: &dyn LogSink,
    ) -> FileOutcome {
        let pending = self.store.pending(pointer_path, requested);
        let skipped: Vec<ArtworkKind> = requested
            .iter()
            .copied()
            .filter(|kind| !pending.contains(kind))
            .collect();

        for kind in &skipped {
            sink.emit(&LogEvent::new(
                pointer_path,
                LogLevel::Debug,
                format!(
                    "{kind} already exists at {}",
                    self.store.path_for(pointer_path, *kind).display()
                ),
            ));
        }

        if pending.is_empty() {
            return FileOutcome {
                pointer_path: pointer_path.to_path_buf(),
                succeeded: true,
                message: "artwork already exists, skipped".to_string(),
                generated: Vec::new(),
                skipped,
            };
        }

        match self.generate(pointer_path, &pending, sink) {
            Ok(generated) => FileOutcome {
                pointer_path: pointer_path.to_path_buf(),
                succeeded: true,
                message: format!("generated {}", join_kinds(&generated)),
                generated,
                skipped,
            },
            Err(failure) => FileOutcome {
                pointer_path: pointer_path.to_path_buf(),
                succeeded: false,
                message: format!("{} (last stage: {})", failure.error, failure.stage),
                generated: failure.generated,
                skipped,
            },
        }
    }

    fn generate(
        &mut self,
        pointer_path: &Path,
        pending: &[ArtworkKind],
        sink: &dyn LogSink,
    ) -> Result<Vec<ArtworkKind>, StageFailure> {
        let mut stage = FileStage::Discovered;
        let mut generated = Vec::with_capacity(pending.len());
        let fail = |stage: FileStage, generated: &Vec<ArtworkKind>| {
            let generated = generated.clone();
            move |error: ArtworkError| StageFailure {
                stage,
                error,
                generated,
            }
        };

        let location = self
            .resolver
            .resolve(pointer_path)
            .map_err(fail(stage, &generated))?;
        stage = FileStage::Resolved;
        debug(sink, pointer_path, format!("video location: {location}"));

        let mut handle = self
            .decoder
            .open(&location)
            .map_err(fail(stage, &generated))?;
        let total_frames = handle.frame_count();
        if total_frames == 0 {
            return Err(fail(stage, &generated)(ArtworkError::EmptyStream {
                location: location.clone(),
            }));
        }

        let indices = self
            .sampler
            .sample(total_frames, pending.len())
            .map_err(fail(stage, &generated))?;
        stage = FileStage::Sampled;
        debug(
            sink,
            pointer_path,
            format!("sampled frames {indices:?} of {total_frames}"),
        );

        for (&kind, &index) in pending.iter().zip(&indices) {
            let frame = handle.decode(index).map_err(fail(stage, &generated))?;
            if frame.is_empty() {
                return Err(fail(stage, &generated)(ArtworkError::Decode {
                    location: location.clone(),
                    index,
                    reason: "decoded frame has zero size".to_string(),
                }));
            }
            stage = FileStage::Decoded;

            let image = match kind {
                ArtworkKind::Fanart => frame,
                ArtworkKind::Poster => crop_to_poster(&frame),
            };
            if image.is_empty() {
                return Err(fail(stage, &generated)(ArtworkError::Decode {
                    location: location.clone(),
                    index,
                    reason: "frame is too small for a 2:3 poster".to_string(),
                }));
            }

            let path = self.store.path_for(pointer_path, kind);
            self.store
                .write(&path, &image)
                .map_err(fail(stage, &generated))?;
            stage = FileStage::Written;
            generated.push(kind);
            debug(
                sink,
                pointer_path,
                format!(
                    "wrote {kind} from frame {index} ({}x{}) to {}",
                    image.width(),
                    image.height(),
                    path.display()
                ),
            );
        }

        debug(sink, pointer_path, format!("stage {}", FileStage::Done));
        Ok(generated)
    }
}

fn debug(sink: &dyn LogSink, pointer_path: &Path, message: String) {
    sink.emit(&LogEvent::new(pointer_path, LogLevel::Debug, message));
}

fn join_kinds(kinds: &[ArtworkKind]) -> String {
    kinds
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(", ")
}
