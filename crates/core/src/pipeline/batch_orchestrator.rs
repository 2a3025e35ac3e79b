use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::artwork::artwork_store::ArtworkStore;
use crate::pipeline::batch_report::{BatchReport, FileOutcome};
use crate::pipeline::generate_artwork_use_case::GenerateArtworkUseCase;
use crate::pipeline::log_sink::{LogCrateSink, LogEvent, LogLevel, LogSink};
use crate::pointer::domain::pointer_resolver::PointerResolver;
use crate::pointer::infrastructure::strm_file_resolver::StrmFileResolver;
use crate::sampling::frame_sampler::FrameSampler;
use crate::shared::artwork_kind::{ArtworkKind, ArtworkNaming};
use crate::shared::constants::POINTER_EXTENSION;
use crate::shared::error::BatchError;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_decoder::VideoDecoder;
use crate::video::infrastructure::ffmpeg_decoder::FfmpegDecoder;
use crate::video::infrastructure::image_file_writer::ImageFileWriter;

/// Pointer files queued per worker when running with several jobs.
const QUEUE_DEPTH_PER_WORKER: usize = 2;

/// Knobs for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub want_fanart: bool,
    pub want_poster: bool,
    pub naming: ArtworkNaming,
    /// Worker threads; 1 processes files sequentially on the caller's thread.
    pub jobs: usize,
    /// Pointer file suffix without the dot, matched case-insensitively.
    pub pointer_extension: String,
    /// Fixed seed for frame picks. `None` draws from OS entropy.
    pub sampler_seed: Option<u64>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            want_fanart: true,
            want_poster: true,
            naming: ArtworkNaming::default(),
            jobs: 1,
            pointer_extension: POINTER_EXTENSION.to_string(),
            sampler_seed: None,
        }
    }
}

impl BatchOptions {
    /// Requested kinds in generation order.
    pub fn requested_kinds(&self) -> Vec<ArtworkKind> {
        ArtworkKind::ALL
            .iter()
            .copied()
            .filter(|kind| match kind {
                ArtworkKind::Fanart => self.want_fanart,
                ArtworkKind::Poster => self.want_poster,
            })
            .collect()
    }
}

/// Walks a library tree and generates missing artwork for every pointer file.
///
/// A bad file never stops the batch: it becomes a failed entry in the
/// report. Only an unusable root aborts with [`BatchError`].
pub struct BatchOrchestrator {
    resolver: Arc<dyn PointerResolver>,
    decoder: Arc<dyn VideoDecoder>,
    writer: Arc<dyn ImageWriter>,
}

impl BatchOrchestrator {
    pub fn new(
        resolver: Arc<dyn PointerResolver>,
        decoder: Arc<dyn VideoDecoder>,
        writer: Arc<dyn ImageWriter>,
    ) -> Self {
        Self {
            resolver,
            decoder,
            writer,
        }
    }

    /// `.strm` resolver, ffmpeg decoder and JPEG writer at `jpeg_quality`.
    pub fn with_ffmpeg(jpeg_quality: u8) -> Self {
        Self::new(
            Arc::new(StrmFileResolver::new()),
            Arc::new(FfmpegDecoder::new()),
            Arc::new(ImageFileWriter::new().with_jpeg_quality(jpeg_quality)),
        )
    }

    /// Processes every pointer file under `root`.
    ///
    /// Events go to `sink`, or to the `log` facade when no sink is given.
    /// `cancelled` is polled before each file; once set, no new file starts
    /// and the report comes back marked cancelled.
    pub fn run_batch(
        &self,
        root: &Path,
        options: &BatchOptions,
        sink: Option<&dyn LogSink>,
        cancelled: &AtomicBool,
    ) -> Result<BatchReport, BatchError> {
        let sink = sink.unwrap_or(&LogCrateSink);
        let requested = options.requested_kinds();
        if requested.is_empty() {
            return Err(BatchError::NothingRequested);
        }

        let (pointers, mut outcomes) = discover_pointer_files(root, &options.pointer_extension)?;
        for outcome in &outcomes {
            report_outcome(sink, outcome);
        }
        sink.emit(&LogEvent::new(
            root,
            LogLevel::Info,
            format!("found {} pointer files", pointers.len()),
        ));

        let total = pointers.len();
        let finished = if options.jobs > 1 && total > 1 {
            self.run_threaded(pointers, &requested, options, sink, cancelled)
        } else {
            self.run_sequential(pointers, &requested, options, sink, cancelled)
        };
        let was_cancelled = finished.len() < total;
        outcomes.extend(finished);

        let report = BatchReport::new(outcomes, was_cancelled);
        let level = if was_cancelled {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        sink.emit(&LogEvent::new(root, level, report.summary()));
        Ok(report)
    }

    fn use_case(&self, options: &BatchOptions, worker: usize) -> GenerateArtworkUseCase {
        let sampler = match options.sampler_seed {
            Some(seed) => FrameSampler::seeded(seed.wrapping_add(worker as u64)),
            None => FrameSampler::new(),
        };
        GenerateArtworkUseCase::new(
            self.resolver.clone(),
            self.decoder.clone(),
            ArtworkStore::new(self.writer.clone(), options.naming),
            sampler,
        )
    }

    fn run_sequential(
        &self,
        pointers: Vec<PathBuf>,
        requested: &[ArtworkKind],
        options: &BatchOptions,
        sink: &dyn LogSink,
        cancelled: &AtomicBool,
    ) -> Vec<FileOutcome> {
        let mut use_case = self.use_case(options, 0);
        let mut outcomes = Vec::with_capacity(pointers.len());
        for pointer in pointers {
            if cancelled.load(Ordering::Relaxed) {
                log::info!("Cancellation requested, stopping before {}", pointer.display());
                break;
            }
            let outcome = use_case.execute(&pointer, requested, sink);
            report_outcome(sink, &outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Fixed pool of workers fed through a bounded queue. The queue carries
    /// [`work_units`]: every pointer file that shares an artwork path with
    /// another is handled by the same worker, one after the other, so each
    /// artwork path has a single owner.
    fn run_threaded(
        &self,
        pointers: Vec<PathBuf>,
        requested: &[ArtworkKind],
        options: &BatchOptions,
        sink: &dyn LogSink,
        cancelled: &AtomicBool,
    ) -> Vec<FileOutcome> {
        let store = ArtworkStore::new(self.writer.clone(), options.naming);
        let units = work_units(pointers, &store, requested);
        let jobs = options.jobs.min(units.len()).max(1);
        let (job_tx, job_rx) =
            crossbeam_channel::bounded::<Vec<PathBuf>>(jobs * QUEUE_DEPTH_PER_WORKER);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<FileOutcome>();

        std::thread::scope(|scope| {
            for worker in 0..jobs {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let mut use_case = self.use_case(options, worker);
                scope.spawn(move || {
                    for unit in job_rx.iter() {
                        for pointer in unit {
                            if cancelled.load(Ordering::Relaxed) {
                                break;
                            }
                            let outcome = use_case.execute(&pointer, requested, sink);
                            report_outcome(sink, &outcome);
                            if result_tx.send(outcome).is_err() {
                                return;
                            }
                        }
                    }
                });
            }
            drop(job_rx);
            drop(result_tx);

            for unit in units {
                if cancelled.load(Ordering::Relaxed) {
                    log::info!("Cancellation requested, no more files queued");
                    break;
                }
                if job_tx.send(unit).is_err() {
                    break;
                }
            }
            drop(job_tx);
        });

        result_rx.iter().collect()
    }
}

/// Groups pointer files that would write the same artwork path.
///
/// All artwork of a pointer file lives in its directory and is named from its
/// stem (suffixed naming) or not at all (fixed naming), so the path of the
/// first requested kind identifies every path the file can write. Groups keep
/// the input order, and so do the files inside each group.
pub fn work_units(
    pointers: Vec<PathBuf>,
    store: &ArtworkStore,
    requested: &[ArtworkKind],
) -> Vec<Vec<PathBuf>> {
    let Some(&key_kind) = requested.first() else {
        return pointers.into_iter().map(|p| vec![p]).collect();
    };

    let mut slots: HashMap<PathBuf, usize> = HashMap::new();
    let mut units: Vec<Vec<PathBuf>> = Vec::new();
    for pointer in pointers {
        let key = store.path_for(&pointer, key_kind);
        match slots.get(&key) {
            Some(&slot) => units[slot].push(pointer),
            None => {
                slots.insert(key, units.len());
                units.push(vec![pointer]);
            }
        }
    }
    units
}

/// Pointer files under `root`, sorted by path.
///
/// Entries that cannot be read inside the tree come back as failed outcomes
/// rather than aborting the walk.
pub fn discover_pointer_files(
    root: &Path,
    extension: &str,
) -> Result<(Vec<PathBuf>, Vec<FileOutcome>), BatchError> {
    if !root.exists() {
        return Err(BatchError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(BatchError::NotADirectory(root.to_path_buf()));
    }

    let mut pointers = Vec::new();
    let mut unreadable = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(BatchError::Traverse {
                    path: root.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                log::warn!("Skipping unreadable entry {}: {e}", path.display());
                unreadable.push(FileOutcome::failed(path, format!("cannot read entry: {e}")));
                continue;
            }
        };

        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if is_file && has_extension(entry.path(), extension) {
            pointers.push(entry.into_path());
        }
    }

    pointers.sort();
    log::debug!(
        "Discovered {} pointer files under {}",
        pointers.len(),
        root.display()
    );
    Ok((pointers, unreadable))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension.trim_start_matches('.')))
        .unwrap_or(false)
}

fn report_outcome(sink: &dyn LogSink, outcome: &FileOutcome) {
    let level = if outcome.succeeded {
        LogLevel::Info
    } else {
        LogLevel::Error
    };
    sink.emit(&LogEvent::new(
        outcome.pointer_path.clone(),
        level,
        outcome.message.clone(),
    ));
}
