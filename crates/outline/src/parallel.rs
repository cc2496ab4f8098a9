//! Row-band partitioning and the fork-join runner shared by the recolour and
//! extraction stages.
//!
//! Every call forks one scoped thread per non-empty band and joins all of them
//! before returning. A worker that panics, fails to spawn or reports an error
//! does not abort its siblings; failures are collected and surfaced as a single
//! [`OutlineError::WorkerFailure`] once every thread has been joined.

use std::any::Any;
use std::thread;

use tracing::debug;

use crate::error::{OutlineError, Result};

/// Contiguous row range `[start, end)` handled by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub index: usize,
    pub start: u32,
    pub end: u32,
}

impl Partition {
    pub fn rows(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Worker count used when the caller does not pin one
pub fn default_workers() -> usize {
    num_cpus::get().max(1)
}

/// Split `height` rows into `workers` contiguous bands.
///
/// Every band gets `height / workers` rows and the last band absorbs the
/// remainder, so for `height < workers` all rows land in the final band.
pub fn partition_rows(height: u32, workers: usize) -> Vec<Partition> {
    let workers = workers.max(1);
    let per_band = height / workers as u32;
    (0..workers)
        .map(|index| {
            let start = index as u32 * per_band;
            let end = if index == workers - 1 {
                height
            } else {
                start + per_band
            };
            Partition { index, start, end }
        })
        .collect()
}

/// Run `work` once per `(partition, payload)` job on its own scoped thread and
/// wait for all of them.
pub(crate) fn fork_join<P, F>(stage: &'static str, jobs: Vec<(Partition, P)>, work: F) -> Result<()>
where
    P: Send,
    F: Fn(Partition, P) -> Result<()> + Sync,
{
    let total = jobs.len();
    debug!(stage, workers = total, "forking band workers");

    let failures = thread::scope(|scope| {
        let work = &work;
        let mut failures = Vec::new();
        let mut handles = Vec::with_capacity(total);

        for (partition, payload) in jobs {
            let spawned = thread::Builder::new()
                .name(format!("{stage}-{}", partition.index))
                .spawn_scoped(scope, move || work(partition, payload));
            match spawned {
                Ok(handle) => handles.push((partition, handle)),
                Err(e) => failures.push(format!("band {} failed to spawn: {e}", partition.index)),
            }
        }

        for (partition, handle) in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push(format!("band {}: {e}", partition.index)),
                Err(panic) => failures.push(format!(
                    "band {} panicked: {}",
                    partition.index,
                    panic_message(panic.as_ref())
                )),
            }
        }
        failures
    });

    if failures.is_empty() {
        return Ok(());
    }
    Err(OutlineError::WorkerFailure {
        stage,
        failed: failures.len(),
        total,
        details: failures.join("; "),
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_partitions_cover_height() {
        let parts = partition_rows(10, 3);
        assert_eq!(parts.len(), 3);
        assert_eq!((parts[0].start, parts[0].end), (0, 3));
        assert_eq!((parts[1].start, parts[1].end), (3, 6));
        assert_eq!((parts[2].start, parts[2].end), (6, 10));
    }

    #[test]
    fn test_short_image_goes_to_last_band() {
        let parts = partition_rows(2, 4);
        assert!(parts[..3].iter().all(Partition::is_empty));
        assert_eq!((parts[3].start, parts[3].end), (0, 2));
        assert_eq!(parts.iter().map(Partition::rows).sum::<u32>(), 2);
    }

    #[test]
    fn test_zero_workers_means_one_band() {
        let parts = partition_rows(7, 0);
        assert_eq!(parts, vec![Partition { index: 0, start: 0, end: 7 }]);
    }

    #[test]
    fn test_fork_join_runs_every_job() {
        let seen = Mutex::new(Vec::new());
        let jobs = partition_rows(12, 4).into_iter().map(|p| (p, p.rows())).collect();
        fork_join("test", jobs, |partition, rows| {
            seen.lock().unwrap().push((partition.index, rows));
            Ok(())
        })
        .expect("all workers succeed");

        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, vec![(0, 3), (1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_fork_join_aggregates_panics() {
        let jobs = partition_rows(8, 4).into_iter().map(|p| (p, ())).collect();
        let err = fork_join("test", jobs, |partition, ()| {
            if partition.index % 2 == 1 {
                panic!("band exploded");
            }
            Ok(())
        })
        .unwrap_err();

        match err {
            OutlineError::WorkerFailure { stage, failed, total, details } => {
                assert_eq!(stage, "test");
                assert_eq!(failed, 2);
                assert_eq!(total, 4);
                assert!(details.contains("band exploded"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
