extern crate mandelthreads;
extern crate rand;

use mandelthreads::kernel::{compute_interleaved, compute_serial};
use mandelthreads::planner::{plan_block, plan_interleaved};
use mandelthreads::{
    run_mandelbrot, DispatchError, Dispatcher, ImageSpec, Partition, PlaneMapper, Viewport,
    MAX_THREADS,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn full_view() -> Viewport {
    Viewport::new(-2.0, -1.0, 1.0, 1.0)
}

fn reference(viewport: &Viewport, image: &ImageSpec) -> Vec<u32> {
    let mut output = vec![0 as u32; image.len()];
    compute_serial(&PlaneMapper::new(*viewport, *image), &mut output);
    output
}

fn render(threads: usize, partition: Partition, viewport: &Viewport, image: &ImageSpec) -> Vec<u32> {
    let mut output = vec![0 as u32; image.len()];
    Dispatcher::new(threads)
        .unwrap()
        .partition(partition)
        .run(viewport, image, &mut output)
        .unwrap();
    output
}

#[test]
fn interleaved_plans_partition_every_height() {
    let mut rng = StdRng::seed_from_u64(149);
    for _ in 0..500 {
        let threads = rng.gen_range(1, MAX_THREADS + 1);
        let height = rng.gen_range(threads, 2000);
        let mut rows: Vec<usize> = (0..threads)
            .flat_map(|t| {
                let (start, stride) = plan_interleaved(t, threads);
                (start..height).step_by(stride)
            })
            .collect();
        rows.sort();
        assert_eq!(rows, (0..height).collect::<Vec<_>>(), "{} rows, {} threads", height, threads);
    }
}

#[test]
fn block_plans_partition_every_height() {
    let mut rng = StdRng::seed_from_u64(150);
    for _ in 0..500 {
        let threads = rng.gen_range(1, MAX_THREADS + 1);
        let height = rng.gen_range(threads, 2000);
        let mut next = 0;
        for t in 0..threads {
            let (start, rows) = plan_block(t, height, threads);
            assert_eq!(start, next, "gap or overlap before thread {}", t);
            if t < threads - 1 {
                assert_eq!(rows, height / threads);
            } else {
                assert_eq!(rows, height / threads + height % threads);
            }
            next = start + rows;
        }
        assert_eq!(next, height);
    }
}

#[test]
fn repeated_renders_are_identical() {
    let image = ImageSpec::new(64, 48, 256);
    for &threads in &[1, 2, 4, 8] {
        let first = render(threads, Partition::Interleaved, &full_view(), &image);
        let second = render(threads, Partition::Interleaved, &full_view(), &image);
        assert_eq!(first, second, "{} threads", threads);
    }
}

#[test]
fn thread_count_does_not_change_the_image() {
    let image = ImageSpec::new(75, 61, 200);
    let expected = render(1, Partition::Interleaved, &full_view(), &image);
    for &threads in &[2, 5, 17] {
        for &partition in &[Partition::Block, Partition::Interleaved] {
            assert_eq!(
                render(threads, partition, &full_view(), &image),
                expected,
                "{} threads, {} partition",
                threads,
                partition
            );
        }
    }
}

#[test]
fn one_thread_matches_the_serial_reference() {
    let image = ImageSpec::new(50, 40, 128);
    assert_eq!(
        render(1, Partition::Block, &full_view(), &image),
        reference(&full_view(), &image)
    );
}

#[test]
fn thirty_two_threads_are_allowed_and_thirty_three_are_not() {
    let image = ImageSpec::new(40, 40, 64);
    let mut output = vec![0 as u32; image.len()];
    assert_eq!(run_mandelbrot(32, &full_view(), &image, &mut output), Ok(()));
    assert_eq!(output, reference(&full_view(), &image));

    let mut untouched = vec![u32::max_value(); image.len()];
    assert_eq!(
        run_mandelbrot(33, &full_view(), &image, &mut untouched),
        Err(DispatchError::InvalidThreadCount {
            requested: 33,
            max: 32
        })
    );
    assert!(untouched.iter().all(|&v| v == u32::max_value()));
}

#[test]
fn four_interleaved_threads_match_the_reference_pixel_by_pixel() {
    let viewport = Viewport::new(-2.0, -1.0, 1.0, 1.0);
    let image = ImageSpec::new(100, 100, 256);
    let expected = reference(&viewport, &image);

    let mut output = vec![0 as u32; image.len()];
    run_mandelbrot(4, &viewport, &image, &mut output).unwrap();
    for (i, (e, a)) in expected.iter().zip(&output).enumerate() {
        assert_eq!(e, a, "pixel ({}, {})", i % 100, i / 100);
    }
    // The set itself is in view, so some points never escape.
    assert!(output.iter().any(|&v| v == 256));
    assert!(output.iter().any(|&v| v < 256));
}

#[test]
fn zoomed_view_matches_the_reference() {
    let viewport = Viewport::preset(2).unwrap();
    let image = ImageSpec::new(64, 48, 512);
    assert_eq!(
        render(6, Partition::Block, &viewport, &image),
        reference(&viewport, &image)
    );
}

#[test]
fn striping_by_hand_matches_the_interleaved_dispatcher() {
    let viewport = full_view();
    let image = ImageSpec::new(57, 43, 200);
    let plane = PlaneMapper::new(viewport, image);
    let mut striped = vec![0 as u32; image.len()];
    for start in 0..6 {
        compute_interleaved(&plane, start, 6, &mut striped);
    }
    assert_eq!(striped, render(6, Partition::Interleaved, &viewport, &image));
}
