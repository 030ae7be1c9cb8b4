//! Static partitioning of the image's rows among a fixed number of
//! threads.  Planning is pure arithmetic: given a thread's id, the
//! image height and the thread count, say which rows that thread owns.

use std::fmt;
use std::str::FromStr;

/// The two ways of dividing rows among threads.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Partition {
    /// One contiguous band of rows per thread.
    Block,
    /// Every `num_threads`th row, offset by the thread id.
    Interleaved,
}

impl Default for Partition {
    fn default() -> Partition {
        Partition::Interleaved
    }
}

impl Partition {
    /// Plans the rows for one thread under this policy.
    pub fn plan(self, thread_id: usize, height: usize, num_threads: usize) -> WorkAssignment {
        match self {
            Partition::Block => {
                let (start_row, num_rows) = plan_block(thread_id, height, num_threads);
                WorkAssignment::Block {
                    start_row,
                    num_rows,
                }
            }
            Partition::Interleaved => {
                let (start_row, stride) = plan_interleaved(thread_id, num_threads);
                WorkAssignment::Interleaved { start_row, stride }
            }
        }
    }

    /// Plans every thread, in thread id order.
    pub fn plan_all(self, height: usize, num_threads: usize) -> Vec<WorkAssignment> {
        (0..num_threads)
            .map(|thread_id| self.plan(thread_id, height, num_threads))
            .collect()
    }
}

impl FromStr for Partition {
    type Err = String;

    fn from_str(s: &str) -> Result<Partition, String> {
        match s {
            "block" => Ok(Partition::Block),
            "interleaved" => Ok(Partition::Interleaved),
            _ => Err(format!(
                "Unknown partition '{}'; expected 'block' or 'interleaved'",
                s
            )),
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Partition::Block => write!(f, "block"),
            Partition::Interleaved => write!(f, "interleaved"),
        }
    }
}

/// Returns `(start_row, num_rows)` for a contiguous band.  Every thread
/// gets `height / num_threads` rows and the last one also takes the
/// remainder.  When there are more threads than rows, every thread but
/// the last gets nothing and the last gets the whole image.
///
/// `num_threads` must be at least one.
pub fn plan_block(thread_id: usize, height: usize, num_threads: usize) -> (usize, usize) {
    let num_rows = height / num_threads;
    let start_row = thread_id * num_rows;
    if thread_id == num_threads - 1 {
        (start_row, height.saturating_sub(start_row))
    } else {
        (start_row, num_rows)
    }
}

/// Returns `(start_row, stride)`: thread `t` of `n` owns rows `t`,
/// `t + n`, `t + 2n`, ...
pub fn plan_interleaved(thread_id: usize, num_threads: usize) -> (usize, usize) {
    (thread_id, num_threads)
}

/// The rows a single worker is responsible for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkAssignment {
    /// Rows `[start_row, start_row + num_rows)`.
    Block {
        /// First row of the band.
        start_row: usize,
        /// Number of rows in the band; may be zero.
        num_rows: usize,
    },
    /// Rows `start_row`, `start_row + stride`, ... below `height`.
    Interleaved {
        /// First row; also the owning thread's id.
        start_row: usize,
        /// Distance between owned rows; also the thread count.
        stride: usize,
    },
}

impl WorkAssignment {
    /// Expands the assignment into row indices, clipped to `height`.
    pub fn rows(&self, height: usize) -> Box<dyn Iterator<Item = usize>> {
        match *self {
            WorkAssignment::Block {
                start_row,
                num_rows,
            } => {
                let (start, end) = clip(start_row, num_rows, height);
                Box::new(start..end)
            }
            WorkAssignment::Interleaved { start_row, stride } => {
                Box::new((start_row..height).step_by(stride.max(1)))
            }
        }
    }

    /// The number of rows the assignment covers within `height`.
    pub fn row_count(&self, height: usize) -> usize {
        match *self {
            WorkAssignment::Block {
                start_row,
                num_rows,
            } => {
                let (start, end) = clip(start_row, num_rows, height);
                end - start
            }
            WorkAssignment::Interleaved { start_row, stride } => {
                let stride = stride.max(1);
                if start_row >= height {
                    0
                } else {
                    (height - start_row + stride - 1) / stride
                }
            }
        }
    }
}

fn clip(start_row: usize, num_rows: usize, height: usize) -> (usize, usize) {
    let end = start_row.saturating_add(num_rows).min(height);
    (start_row.min(end), end)
}
