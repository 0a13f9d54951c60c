// Parallel annotation: frames fan out to worker threads, outcomes fan back in.
//
// Each worker owns its detector. The summary is reduced on the calling
// thread, which is also where the frame hook runs.

use crate::error::{AnnotateError, AnnotateResult};
use crate::pipeline::annotator::{
    annotate_frame, finish_run, prepare_run, progress_bar, tally, AnnotateOptions, AnnotatedFrame,
    FrameSink,
};
use crate::pipeline::detection::DetectorFactory;
use crate::pipeline::render::LandmarkRenderer;
use crate::pipeline::types::{FrameEntry, RunSummary};
use crossbeam::channel;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

enum WorkerMessage {
    Frame {
        position: usize,
        result: AnnotateResult<AnnotatedFrame>,
    },
    Failed {
        worker_id: usize,
        reason: String,
    },
}

/// Same contract as `detect_sequence`, spread over `workers` threads.
///
/// The summary lists frames in file name order; the hook sees them in
/// completion order.
pub fn detect_sequence_parallel(
    options: &AnnotateOptions,
    workers: usize,
    factory: &DetectorFactory,
    renderer: &dyn LandmarkRenderer,
    mut on_frame: Option<&mut dyn FrameSink>,
) -> AnnotateResult<RunSummary> {
    let span = tracing::info_span!(
        "detect_sequence",
        input = %options.input_dir.display(),
        output = %options.output_dir.display(),
        workers
    );
    let _guard = span.enter();

    let entries = prepare_run(options)?;
    let workers = workers.clamp(1, entries.len());
    let pb = progress_bar(entries.len(), options.show_progress);
    let is_active = AtomicBool::new(true);

    let mut completed: Vec<(usize, AnnotatedFrame)> = Vec::with_capacity(entries.len());
    let mut first_error: Option<AnnotateError> = None;

    thread::scope(|scope| {
        // Tight bound so workers never run far ahead of the collector
        let (job_tx, job_rx) = channel::bounded::<(usize, &FrameEntry)>(workers * 2);
        let (result_tx, result_rx) = channel::unbounded::<WorkerMessage>();

        for worker_id in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let is_active = &is_active;
            let parent = &span;
            scope.spawn(move || {
                let _guard = parent.enter();
                tracing::debug!("Spawning annotation worker {}", worker_id);

                let mut detector = match factory() {
                    Ok(detector) => detector,
                    Err(e) => {
                        let _ = result_tx.send(WorkerMessage::Failed {
                            worker_id,
                            reason: format!("{:#}", e),
                        });
                        return;
                    }
                };
                let topology = detector.topology();

                for (position, entry) in job_rx {
                    if !is_active.load(Ordering::Relaxed) {
                        break;
                    }
                    let result =
                        annotate_frame(entry, options, detector.as_mut(), renderer, topology);
                    if result_tx.send(WorkerMessage::Frame { position, result }).is_err() {
                        break; // Collector gone
                    }
                }
                tracing::debug!("Annotation worker {} finished", worker_id);
            });
        }
        drop(job_rx);
        drop(result_tx);

        let entries = &entries;
        scope.spawn(move || {
            for job in entries.iter().enumerate() {
                if job_tx.send(job).is_err() {
                    break; // Every worker has stopped
                }
            }
        });

        for message in result_rx {
            if first_error.is_some() {
                continue; // Draining frames already in flight
            }
            let error = match message {
                WorkerMessage::Frame {
                    position,
                    result: Ok(annotated),
                } => {
                    let hooked = match (on_frame.as_mut(), annotated.frame.as_ref()) {
                        (Some(sink), Some(frame)) => sink
                            .on_frame(&entries[position].name, frame)
                            .map_err(AnnotateError::Hook),
                        _ => Ok(()),
                    };
                    pb.inc(1);
                    completed.push((position, annotated));
                    hooked.err()
                }
                WorkerMessage::Frame {
                    result: Err(e), ..
                } => Some(e),
                WorkerMessage::Failed { worker_id, reason } => {
                    Some(AnnotateError::Worker { worker_id, reason })
                }
            };

            if let Some(e) = error {
                tracing::error!("Stopping run: {}", e);
                is_active.store(false, Ordering::Relaxed);
                first_error.get_or_insert(e);
            }
        }
    });
    pb.finish_and_clear();

    if let Some(e) = first_error {
        return Err(e);
    }

    completed.sort_by_key(|(position, _)| *position);
    let mut summary = RunSummary::default();
    for (position, annotated) in completed {
        tally(&mut summary, &entries[position].name, annotated.outcome);
    }

    finish_run(options, summary)
}
