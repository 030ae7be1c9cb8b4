//! The escape-time kernel.  Nothing in here knows about threads; every
//! function fills whichever rows it is handed and returns.

use num::Complex;

use planes::PlaneMapper;

/// This is our classic iterator function.  It returns the number of
/// iterations it took `c` to leave the circle of radius 2, or
/// `max_iterations` if it never did.
#[inline]
pub fn escape_time(c: Complex<f64>, max_iterations: u32) -> u32 {
    let mut z = c;
    for i in 0..max_iterations {
        if z.norm_sqr() > 4.0 {
            return i;
        }
        z = z * z + c;
    }
    max_iterations
}

/// Fills an arbitrary collection of rows.  Each item pairs a row index
/// with the slice of the output buffer holding that row, so the caller
/// decides which rows are computed and the borrow checker makes sure
/// no two callers hold the same one.
pub fn compute_rows<'a, I>(plane: &PlaneMapper, rows: I)
where
    I: IntoIterator<Item = (usize, &'a mut [u32])>,
{
    let max_iterations = plane.image.max_iterations;
    for (row, pixels) in rows {
        for (column, pixel) in pixels.iter_mut().enumerate() {
            *pixel = escape_time(plane.pixel_to_point(column, row), max_iterations);
        }
    }
}

/// Fills rows `[start_row, start_row + num_rows)` of a full, row-major
/// output buffer.  The escape-time bound comes from `plane.image`.
///
/// This and `compute_interleaved` take the whole buffer, so they suit a
/// single owner of it: the serial reference and the benchmarks.  The
/// dispatcher has already split the buffer into row slices and hands
/// those to `compute_rows` instead.
pub fn compute_block(plane: &PlaneMapper, start_row: usize, num_rows: usize, output: &mut [u32]) {
    let width = plane.width();
    let max_iterations = plane.image.max_iterations;
    for (row, column) in iproduct!(start_row..start_row + num_rows, 0..width) {
        output[row * width + column] =
            escape_time(plane.pixel_to_point(column, row), max_iterations);
    }
}

/// Fills rows `start_row`, `start_row + stride`, `start_row + 2 * stride`
/// and so on of a full, row-major output buffer.  Calling it once for
/// every offset in `0..stride` renders the whole image one stripe at a
/// time, on a single thread.
///
/// # Panics
///
/// Panics if `stride` is zero.
pub fn compute_interleaved(plane: &PlaneMapper, start_row: usize, stride: usize, output: &mut [u32]) {
    let width = plane.width();
    if width == 0 {
        return;
    }
    let rows = output
        .chunks_mut(width)
        .take(plane.image.height)
        .enumerate()
        .skip(start_row)
        .step_by(stride);
    compute_rows(plane, rows);
}

/// The single-threaded reference: every row, in order.
pub fn compute_serial(plane: &PlaneMapper, output: &mut [u32]) {
    compute_block(plane, 0, plane.image.height, output);
}
