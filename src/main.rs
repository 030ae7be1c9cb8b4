// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Times the threaded Mandelbrot renderer against the serial one and
//! checks that both produce the same image.

extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate log;
extern crate mandelthreads;

use clap::{App, Arg, ArgMatches};
use mandelthreads::kernel::compute_serial;
use mandelthreads::report::millis;
use mandelthreads::{
    Dispatcher, ImageSpec, LogReporter, Partition, PlaneMapper, ThreadCount, Viewport,
    MAX_THREADS,
};
use std::str::FromStr;
use std::time::{Duration, Instant};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_number<T: FromStr>(s: &str, err: &str) -> Result<(), String> {
    match T::from_str(s) {
        Ok(_) => Ok(()),
        Err(_) => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const THREADS: &str = "threads";
const VIEW: &str = "view";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const ITERATIONS: &str = "iterations";
const PARTITION: &str = "partition";
const RUNS: &str = "runs";
const VERBOSE: &str = "verbose";

fn args<'a>(default_threads: &'a str) -> ArgMatches<'a> {
    App::new("mandelthreads")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Threaded Mandelbrot renderer")
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value(default_threads)
                .validator(|s| validate_number::<usize>(&s, "Could not parse thread count"))
                .help("Number of threads to use, including the main thread"),
        )
        .arg(
            Arg::with_name(VIEW)
                .long(VIEW)
                .short("v")
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        2,
                        "Could not parse view",
                        "View must be 1 or 2",
                    )
                })
                .help("Stock view: 1 is the whole set, 2 a zoomed-in detail"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1600x1200")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse image size"))
                .help("Size of the image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .requires(RIGHTUPPER)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the mandelbrot space; overrides the view"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .requires(LEFTLOWER)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the mandelbrot space; overrides the view"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("256")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        200_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 200000",
                    )
                })
                .help("Escape-time bound per pixel"),
        )
        .arg(
            Arg::with_name(PARTITION)
                .long(PARTITION)
                .short("p")
                .takes_value(true)
                .possible_values(&["block", "interleaved"])
                .default_value("interleaved")
                .help("How rows are divided among threads"),
        )
        .arg(
            Arg::with_name(RUNS)
                .long(RUNS)
                .short("n")
                .takes_value(true)
                .default_value("3")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        100,
                        "Could not parse run count",
                        "Run count must be between 1 and 100",
                    )
                })
                .help("Renders per mode; the fastest is reported"),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .long(VERBOSE)
                .help("Log per-thread timings"),
        )
        .get_matches()
}

struct Options {
    threads: usize,
    viewport: Viewport,
    image: ImageSpec,
    partition: Partition,
    runs: usize,
    verbose: bool,
}

impl Options {
    // The validators have already vetted every value, so these parses
    // can only fail on a missing default.
    fn from_matches(matches: &ArgMatches) -> Result<Options, String> {
        let value = |name: &str| {
            matches
                .value_of(name)
                .ok_or_else(|| format!("Missing value for --{}", name))
        };

        let threads = usize::from_str(value(THREADS)?).map_err(|e| e.to_string())?;
        let (width, height) =
            parse_pair::<usize>(value(SIZE)?, 'x').ok_or("Error parsing image dimensions")?;
        let max_iterations = u32::from_str(value(ITERATIONS)?).map_err(|e| e.to_string())?;
        let partition = Partition::from_str(value(PARTITION)?)?;
        let runs = usize::from_str(value(RUNS)?).map_err(|e| e.to_string())?;

        let viewport = match (matches.value_of(LEFTLOWER), matches.value_of(RIGHTUPPER)) {
            (Some(ll), Some(ru)) => {
                let (x0, y0) = parse_pair::<f64>(ll, ',').ok_or("Error parsing left lower point")?;
                let (x1, y1) =
                    parse_pair::<f64>(ru, ',').ok_or("Error parsing right upper point")?;
                Viewport::new(x0, y0, x1, y1)
            }
            _ => {
                let view = u32::from_str(value(VIEW)?).map_err(|e| e.to_string())?;
                Viewport::preset(view).ok_or_else(|| format!("No such view: {}", view))?
            }
        };

        Ok(Options {
            threads,
            viewport,
            image: ImageSpec::new(width, height, max_iterations),
            partition,
            runs,
            verbose: matches.is_present(VERBOSE),
        })
    }
}

// Runs `render` `runs` times, returning the fastest wall time.
fn fastest<F: FnMut()>(runs: usize, mut render: F) -> Duration {
    (0..runs)
        .map(|_| {
            let start = Instant::now();
            render();
            start.elapsed()
        })
        .min()
        .unwrap_or_default()
}

fn first_difference(expected: &[u32], actual: &[u32]) -> Option<usize> {
    expected.iter().zip(actual).position(|(e, a)| e != a)
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn main() {
    let default_threads = ThreadCount::available().get().to_string();
    let matches = args(&default_threads);
    let options = Options::from_matches(&matches).unwrap_or_else(|e| fail(&e));

    let level = if options.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // An out-of-range count stops everything before any rendering.
    let threads = ThreadCount::new(options.threads).unwrap_or_else(|e| fail(&e.to_string()));
    let image = options.image;
    let viewport = options.viewport;
    info!(
        "Rendering {}x{} with {} threads, {} partition, max {} iterations",
        image.width,
        image.height,
        threads.get(),
        options.partition,
        image.max_iterations
    );

    let plane = PlaneMapper::new(viewport, image);
    let mut serial = vec![0 as u32; image.len()];
    let serial_time = fastest(options.runs, || compute_serial(&plane, &mut serial));
    println!("[mandelbrot serial]:\t\t[{:.3}] ms", millis_f(serial_time));

    let dispatcher = Dispatcher::with_threads(threads)
        .partition(options.partition)
        .reporter(&LogReporter);
    let mut threaded = vec![0 as u32; image.len()];
    let mut failure = None;
    let thread_time = fastest(options.runs, || {
        if let Err(e) = dispatcher.run(&viewport, &image, &mut threaded) {
            failure = Some(e);
        }
    });
    if let Some(e) = failure {
        fail(&format!("Render failure: {}", e));
    }
    println!("[mandelbrot thread]:\t\t[{:.3}] ms", millis_f(thread_time));
    debug!(
        "serial {} ms, threaded {} ms",
        millis(serial_time),
        millis(thread_time)
    );

    if let Some(i) = first_difference(&serial, &threaded) {
        fail(&format!(
            "Mismatch at pixel ({}, {}): expected {}, got {}",
            i % image.width,
            i / image.width,
            serial[i],
            threaded[i]
        ));
    }

    let speedup = millis_f(serial_time) / millis_f(thread_time).max(1e-6);
    println!(
        "\t\t\t\t({:.2}x speedup from {} threads, max {})",
        speedup,
        threads.get(),
        MAX_THREADS
    );
}

fn millis_f(elapsed: Duration) -> f64 {
    elapsed.as_secs() as f64 * 1000.0 + f64::from(elapsed.subsec_nanos()) / 1_000_000.0
}
