//! Manifest assembly: fan objects out to blocking workers, collect in order.
//!
//! Every input object ends up in exactly one of [`Manifest::entries`] or
//! [`Manifest::errors`]; both are sorted by object number before return, so
//! completion order never leaks into the output.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::{ObjectError, ObjectFailure};
use crate::types::{ImageObject, ManifestEntry};

use super::processor::ObjectProcessor;

/// Outcome of processing one object.
pub type ObjectOutcome = Result<ManifestEntry, ObjectFailure>;

/// Ordered results of a run.
#[derive(Debug, Default)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
    pub errors: Vec<ObjectFailure>,
}

impl Manifest {
    /// Number of objects this manifest accounts for.
    pub fn total(&self) -> usize {
        self.entries.len() + self.errors.len()
    }

    /// Error log lines, `obj<N>: <message>`.
    pub fn error_lines(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    fn push(&mut self, outcome: ObjectOutcome) {
        match outcome {
            Ok(entry) => self.entries.push(entry),
            Err(failure) => self.errors.push(failure),
        }
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(|e| e.object_number);
        self.errors.sort_by_key(|e| e.object_number);
    }
}

/// Runs [`ObjectProcessor`] over a batch with bounded concurrency.
pub struct ManifestAssembler {
    processor: Arc<ObjectProcessor>,
    parallel: usize,
}

impl ManifestAssembler {
    pub fn new(config: &Config) -> Self {
        Self {
            processor: Arc::new(ObjectProcessor::new(config)),
            parallel: config.processing.parallel_workers.max(1),
        }
    }

    /// Process all objects and return the ordered manifest.
    pub async fn assemble(&self, objects: Vec<ImageObject>) -> Manifest {
        self.assemble_with_progress(objects, |_| {}).await
    }

    /// Like [`assemble`](Self::assemble), calling `on_result` once per object
    /// as each one finishes.
    ///
    /// Each object runs on tokio's blocking pool; a semaphore caps how many
    /// run at once. Results are reported in completion order and sorted by
    /// object number only at the end.
    pub async fn assemble_with_progress<F>(
        &self,
        objects: Vec<ImageObject>,
        mut on_result: F,
    ) -> Manifest
    where
        F: FnMut(&ObjectOutcome),
    {
        let semaphore = Arc::new(Semaphore::new(self.parallel));
        let mut tasks = JoinSet::new();
        let mut pending: BTreeMap<u32, usize> = BTreeMap::new();

        for image in objects {
            *pending.entry(image.object_number).or_default() += 1;
            let semaphore = Arc::clone(&semaphore);
            let processor = Arc::clone(&self.processor);

            tasks.spawn(async move {
                // The semaphore is never closed, so this only fails if tokio
                // itself is shutting down; run unbounded rather than drop work.
                let permit = semaphore.acquire_owned().await.ok();
                let object_number = image.object_number;

                let handle = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    processor.process(&image).map_err(|error| ObjectFailure {
                        object_number: image.object_number,
                        error,
                    })
                });
                match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => Err(ObjectFailure {
                        object_number,
                        error: ObjectError::TaskFailed(e.to_string()),
                    }),
                }
            });
        }

        let mut manifest = Manifest::default();
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Object task failed: {e}");
                    continue;
                }
            };

            let object_number = match &outcome {
                Ok(entry) => entry.object_number,
                Err(failure) => failure.object_number,
            };
            if let Some(count) = pending.get_mut(&object_number) {
                *count -= 1;
                if *count == 0 {
                    pending.remove(&object_number);
                }
            }
            record(&mut manifest, outcome, &mut on_result);
        }

        // A task lost before reporting still owes its object an error line.
        for (object_number, count) in pending {
            for _ in 0..count {
                let failure = ObjectFailure {
                    object_number,
                    error: ObjectError::TaskFailed("task aborted".to_string()),
                };
                record(&mut manifest, Err(failure), &mut on_result);
            }
        }

        manifest.sort();
        manifest
    }
}

fn record<F>(manifest: &mut Manifest, outcome: ObjectOutcome, on_result: &mut F)
where
    F: FnMut(&ObjectOutcome),
{
    match &outcome {
        Ok(entry) => tracing::info!(
            "Captured {} ({}x{}, {})",
            entry.name,
            entry.width,
            entry.height,
            entry.mime
        ),
        Err(failure) => tracing::warn!(
            "Skipping obj{}: {}",
            failure.object_number,
            failure.error
        ),
    }
    on_result(&outcome);
    manifest.push(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::zlib;
    use crate::types::{ColorSpace, MimeType, StreamFilter};

    fn gray_flate(object_number: u32, width: u32, height: u32, pixels: &[u8]) -> ImageObject {
        ImageObject {
            object_number,
            width,
            height,
            color_space: ColorSpace::DeviceGray,
            bits_per_component: 8,
            filter: StreamFilter::Flate,
            raw_stream: zlib(pixels),
        }
    }

    fn dct(object_number: u32) -> ImageObject {
        ImageObject {
            object_number,
            width: 8,
            height: 8,
            color_space: ColorSpace::DeviceRgb,
            bits_per_component: 8,
            filter: StreamFilter::Dct,
            raw_stream: vec![0xFF, 0xD8, 0xFF, 0xD9],
        }
    }

    #[tokio::test]
    async fn test_every_object_accounted_for_once() {
        let objects = vec![
            gray_flate(30, 2, 2, &[0; 4]),
            dct(4),
            gray_flate(17, 10, 10, &[0; 50]),
            ImageObject {
                filter: StreamFilter::from_name("/JBIG2Decode"),
                ..dct(9)
            },
            gray_flate(1, 1, 1, &[255]),
        ];
        let total = objects.len();

        let assembler = ManifestAssembler::new(&Config::default());
        let mut seen = Vec::new();
        let manifest = assembler
            .assemble_with_progress(objects, |outcome| {
                seen.push(match outcome {
                    Ok(entry) => entry.object_number,
                    Err(failure) => failure.object_number,
                })
            })
            .await;

        assert_eq!(manifest.total(), total);
        assert_eq!(seen.len(), total);

        let entries: Vec<u32> = manifest.entries.iter().map(|e| e.object_number).collect();
        assert_eq!(entries, vec![1, 4, 30]);
        assert_eq!(
            manifest.error_lines(),
            vec![
                "obj9: Unsupported filter /JBIG2Decode".to_string(),
                "obj17: Unexpected data length: got 50, expected 100".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_order_independent_of_worker_count() {
        let objects: Vec<ImageObject> = (0..40u32)
            .rev()
            .map(|n| gray_flate(n, 16, 16, &vec![n as u8; 256]))
            .collect();

        let mut config = Config::default();
        config.processing.parallel_workers = 8;
        let manifest = ManifestAssembler::new(&config).assemble(objects).await;

        let numbers: Vec<u32> = manifest.entries.iter().map(|e| e.object_number).collect();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(numbers.len(), 40);
    }

    #[tokio::test]
    async fn test_pass_through_entry() {
        let manifest = ManifestAssembler::new(&Config::default())
            .assemble(vec![dct(6)])
            .await;
        let entry = &manifest.entries[0];
        assert_eq!(entry.mime, MimeType::Jpeg);
        assert!(entry.analysis.is_none());
        assert!(entry.name.starts_with("jpeg-like-"));
        assert!(manifest.errors.is_empty());
    }

    #[tokio::test]
    async fn test_results_reported_as_objects_finish() {
        let pixels: Vec<u8> = (0..2000u32 * 1000).map(|i| (i % 251) as u8).collect();
        let objects: Vec<ImageObject> = (1..=8)
            .map(|n| gray_flate(n, 2000, 1000, &pixels))
            .collect();

        let mut config = Config::default();
        config.processing.parallel_workers = 1;
        let assembler = ManifestAssembler::new(&config);

        let start = std::time::Instant::now();
        let mut reported = Vec::new();
        let manifest = assembler
            .assemble_with_progress(objects, |_| reported.push(start.elapsed()))
            .await;
        let total = start.elapsed();

        assert_eq!(manifest.entries.len(), 8);
        assert_eq!(reported.len(), 8);
        assert!(
            reported[0] < total / 2,
            "first result at {:?} of {:?}",
            reported[0],
            total
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let manifest = ManifestAssembler::new(&Config::default())
            .assemble(Vec::new())
            .await;
        assert_eq!(manifest.total(), 0);
        assert!(manifest.error_lines().is_empty());
    }
}
