//! The worker dispatcher.  One render is one call: plan the rows, hand
//! each worker its own rows of the output buffer, run the workers, and
//! wait for all of them.  Threads are created fresh for every call; the
//! invoking thread does worker 0's share itself, so only
//! `num_threads - 1` threads are ever spawned.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crossbeam;
use num_cpus;

use kernel;
use planes::{ImageSpec, PlaneMapper, Viewport};
use planner::{Partition, WorkAssignment};
use report::{LogReporter, Phase, Reporter, Silent};

/// The most threads a single render may use.
pub const MAX_THREADS: usize = 32;

/// Everything that can stop a render.  All of these are detected before
/// any pixel is written, except `WorkerPanicked`.
#[derive(Debug, Fail, PartialEq, Eq)]
pub enum DispatchError {
    /// The thread count was zero or above `MAX_THREADS`.
    #[fail(
        display = "Max allowed threads is {}; cannot run with {}",
        max, requested
    )]
    InvalidThreadCount {
        /// The count that was asked for.
        requested: usize,
        /// `MAX_THREADS`.
        max: usize,
    },

    /// The output buffer is not exactly `width * height` pixels.
    #[fail(
        display = "Output buffer holds {} pixels but the image has {}",
        actual, expected
    )]
    BufferSize {
        /// `width * height`.
        expected: usize,
        /// The length of the buffer supplied.
        actual: usize,
    },

    /// Two assignments claimed the same row.
    #[fail(display = "Row {} was assigned to more than one thread", row)]
    OverlappingRows {
        /// The first row claimed twice.
        row: usize,
    },

    /// No assignment claimed a row.
    #[fail(display = "Row {} was not assigned to any thread", row)]
    UncoveredRow {
        /// The first unclaimed row.
        row: usize,
    },

    /// A worker panicked before finishing its rows.  Worker 0 runs on
    /// the invoking thread and is reported the same way.
    #[fail(display = "Worker thread {} panicked", thread_id)]
    WorkerPanicked {
        /// The id of the first worker found to have panicked.
        thread_id: usize,
    },
}

/// A thread count known to be within `1..=MAX_THREADS`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ThreadCount(usize);

impl ThreadCount {
    /// Validates a requested thread count.
    pub fn new(requested: usize) -> Result<ThreadCount, DispatchError> {
        if requested < 1 || requested > MAX_THREADS {
            return Err(DispatchError::InvalidThreadCount {
                requested,
                max: MAX_THREADS,
            });
        }
        Ok(ThreadCount(requested))
    }

    /// One thread per logical CPU, capped at `MAX_THREADS`.
    pub fn available() -> ThreadCount {
        ThreadCount(num_cpus::get().max(1).min(MAX_THREADS))
    }

    /// The count itself.
    pub fn get(self) -> usize {
        self.0
    }
}

/// The rows one worker writes, each paired with its index.
type Band<'a> = Vec<(usize, &'a mut [u32])>;

// What a single worker is handed.  Built during planning, consumed by
// exactly one worker.
struct WorkerArgs<'a> {
    thread_id: usize,
    num_threads: usize,
    assignment: WorkAssignment,
    rows: Band<'a>,
}

impl<'a> WorkerArgs<'a> {
    fn run(self, plane: &PlaneMapper, reporter: &dyn Reporter) {
        let start = Instant::now();
        reporter.worker_started(self.thread_id);
        trace!(
            "Thread {}/{} computing {} rows of {:?}",
            self.thread_id,
            self.num_threads,
            self.rows.len(),
            self.assignment
        );
        kernel::compute_rows(plane, self.rows);
        reporter.worker_finished(self.thread_id, start.elapsed());
    }
}

/// Splits `output` into one band per assignment.  Every row slice is
/// handed out at most once, and every row must be handed out.
fn split_rows<'a>(
    output: &'a mut [u32],
    image: &ImageSpec,
    assignments: &[WorkAssignment],
) -> Result<Vec<Band<'a>>, DispatchError> {
    let mut slots: Vec<Option<&'a mut [u32]>> = output.chunks_mut(image.width).map(Some).collect();
    let mut bands = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let mut band = Vec::with_capacity(assignment.row_count(image.height));
        for row in assignment.rows(image.height) {
            match slots[row].take() {
                Some(pixels) => band.push((row, pixels)),
                None => return Err(DispatchError::OverlappingRows { row }),
            }
        }
        bands.push(band);
    }

    match slots.iter().position(Option::is_some) {
        Some(row) => Err(DispatchError::UncoveredRow { row }),
        None => Ok(bands),
    }
}

/// Runs one render over a fixed number of threads.
pub struct Dispatcher<'r> {
    threads: ThreadCount,
    partition: Partition,
    reporter: &'r dyn Reporter,
}

impl Dispatcher<'static> {
    /// A silent, interleaved dispatcher.  Fails if `num_threads` is out
    /// of range.
    pub fn new(num_threads: usize) -> Result<Dispatcher<'static>, DispatchError> {
        Ok(Dispatcher::with_threads(ThreadCount::new(num_threads)?))
    }

    /// A silent, interleaved dispatcher over an already-validated count.
    pub fn with_threads(threads: ThreadCount) -> Dispatcher<'static> {
        Dispatcher {
            threads,
            partition: Partition::default(),
            reporter: &Silent,
        }
    }
}

impl<'r> Dispatcher<'r> {
    /// Selects the partitioning policy.
    pub fn partition(mut self, partition: Partition) -> Dispatcher<'r> {
        self.partition = partition;
        self
    }

    /// Sends diagnostics to `reporter` instead of discarding them.
    pub fn reporter<'s>(self, reporter: &'s dyn Reporter) -> Dispatcher<'s> {
        Dispatcher {
            threads: self.threads,
            partition: self.partition,
            reporter,
        }
    }

    /// The number of workers, including the invoking thread.
    pub fn threads(&self) -> ThreadCount {
        self.threads
    }

    /// Renders `viewport` into `output`, which must hold exactly
    /// `image.width * image.height` pixels in row-major order.  Each
    /// pixel receives the iteration at which its point escaped, or
    /// `image.max_iterations`.
    ///
    /// Returns once every worker has finished.  On error nothing has
    /// been written, unless a worker panicked partway through.  An image
    /// with no pixels returns straight after validation, without
    /// planning or starting any worker.
    pub fn run(
        &self,
        viewport: &Viewport,
        image: &ImageSpec,
        output: &mut [u32],
    ) -> Result<(), DispatchError> {
        if output.len() != image.len() {
            return Err(DispatchError::BufferSize {
                expected: image.len(),
                actual: output.len(),
            });
        }

        if image.is_empty() {
            return Ok(());
        }

        let num_threads = self.threads.get();
        self.reporter.phase(Phase::Planning);
        let plane = PlaneMapper::new(*viewport, *image);
        let assignments = self.partition.plan_all(image.height, num_threads);
        let bands = split_rows(output, image, &assignments)?;
        let mut workers: Vec<WorkerArgs> = assignments
            .into_iter()
            .zip(bands)
            .enumerate()
            .map(|(thread_id, (assignment, rows))| WorkerArgs {
                thread_id,
                num_threads,
                assignment,
                rows,
            })
            .collect();
        let spawned = workers.split_off(1);

        self.reporter.phase(Phase::Running);
        let plane = &plane;
        let reporter = self.reporter;
        let joined = crossbeam::scope(|scope| {
            let handles: Vec<_> = spawned
                .into_iter()
                .map(|args| {
                    let thread_id = args.thread_id;
                    (thread_id, scope.spawn(move |_| args.run(plane, reporter)))
                })
                .collect();

            let caller = panic::catch_unwind(AssertUnwindSafe(|| {
                for args in workers {
                    args.run(plane, reporter);
                }
            }));

            let mut panicked = if caller.is_err() { Some(0) } else { None };
            for (thread_id, handle) in handles {
                if handle.join().is_err() && panicked.is_none() {
                    panicked = Some(thread_id);
                }
            }
            panicked
        });

        // Every handle is joined inside the scope and worker 0's panic is
        // caught there, so the scope has nothing left to report.
        match joined.unwrap_or(None) {
            None => {
                self.reporter.phase(Phase::Joined);
                Ok(())
            }
            Some(thread_id) => Err(DispatchError::WorkerPanicked { thread_id }),
        }
    }
}

/// Renders the Mandelbrot set with `num_threads` workers using the
/// interleaved policy, logging per-thread timings.
pub fn run_mandelbrot(
    num_threads: usize,
    viewport: &Viewport,
    image: &ImageSpec,
    output: &mut [u32],
) -> Result<(), DispatchError> {
    Dispatcher::new(num_threads)?
        .reporter(&LogReporter)
        .run(viewport, image, output)
}
