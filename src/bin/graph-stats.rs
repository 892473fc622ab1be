use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use std::{env, process, thread};

use cdbg_base::{ConjugateGraph, ParallelIterationHelper};
use cdbg_base::{binary, utils};
use getopts::Options;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new();

    // Load the graph.
    let mut graph: ConjugateGraph = ConjugateGraph::new(config.k);
    binary::load_graph(&config.input, &mut graph, config.verbose)?;
    if config.check {
        graph.check_invariants();
        if config.verbose {
            eprintln!("The graph passed the consistency checks");
        }
    }

    // Basic statistics.
    println!(
        "The graph contains {} vertices and {} edges (k = {}, maximum identifier {})",
        graph.size(), graph.edge_count(), graph.k(), graph.max_id()
    );

    // Parallel statistics.
    // Observers are not thread-safe, so the workers only see the core.
    let core = graph.core();
    let helper = ParallelIterationHelper::new(core);
    let isolated = AtomicUsize::new(0);
    let tips = AtomicUsize::new(0);
    let vertices = helper.process_vertices(config.threads, |vertex| {
        if core.is_isolated(vertex) {
            isolated.fetch_add(1, Ordering::Relaxed);
        } else if core.in_degree(vertex) == 0 && core.out_degree(vertex) == 1 {
            tips.fetch_add(1, Ordering::Relaxed);
        }
    });
    let total_length = AtomicUsize::new(0);
    let longest = AtomicUsize::new(0);
    let edges = helper.process_edges(config.threads, config.canonical_only, |edge| {
        let length = core.length(edge);
        total_length.fetch_add(length, Ordering::Relaxed);
        longest.fetch_max(length, Ordering::Relaxed);
    });
    let what = if config.canonical_only { "canonical edges" } else { "edges" };
    println!(
        "Processed {} vertices ({} isolated, {} tips) and {} {} with {} threads",
        vertices, isolated.into_inner(), tips.into_inner(), edges, what, config.threads
    );
    println!(
        "Total length {} (k+1)-mers, longest edge {}",
        total_length.into_inner(), longest.into_inner()
    );

    // Write a copy.
    if let Some(output) = config.output.as_ref() {
        binary::save_graph(graph.core(), output, config.compress, config.verbose)?;
        if !config.verbose {
            if let Some(size) = utils::file_size(output) {
                eprintln!("Wrote {} ({})", output, size);
            }
        }
    }

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub input: String,
    pub output: Option<String>,
    pub k: usize,
    pub threads: usize,
    pub canonical_only: bool,
    pub compress: bool,
    pub check: bool,
    pub verbose: bool,
}

impl Config {
    const DEFAULT_K: usize = 55;

    pub fn new() -> Config {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();
        let default_threads = thread::available_parallelism().map(|x| x.get()).unwrap_or(1);

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        let k_desc = format!("graph order (default: {})", Self::DEFAULT_K);
        opts.optopt("k", "", &k_desc, "INT");
        let threads_desc = format!("number of threads (default: {})", default_threads);
        opts.optopt("t", "threads", &threads_desc, "INT");
        opts.optflag("", "canonical", "process only the canonical half of each edge pair");
        opts.optopt("o", "output", "write a copy of the graph to this file", "FILE");
        opts.optflag("z", "compress", "gzip-compress the copy");
        opts.optflag("c", "check", "check the consistency of the graph");
        opts.optflag("v", "verbose", "print progress information");
        let matches = match opts.parse(&args[1..]) {
            Ok(m) => m,
            Err(f) => {
                eprintln!("{}", f);
                process::exit(1);
            }
        };

        let header = format!("Usage: {} [options] graph.cdbg", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let k = Self::parse_number(&matches, "k", Self::DEFAULT_K);
        let threads = Self::parse_number(&matches, "t", default_threads);
        if threads == 0 {
            eprintln!("--threads: the number of threads must be positive");
            process::exit(1);
        }

        let input = if let Some(s) = matches.free.first() {
            s.clone()
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        Config {
            input,
            output: matches.opt_str("o"),
            k,
            threads,
            canonical_only: matches.opt_present("canonical"),
            compress: matches.opt_present("z"),
            check: matches.opt_present("c"),
            verbose: matches.opt_present("v"),
        }
    }

    fn parse_number(matches: &getopts::Matches, option: &str, default: usize) -> usize {
        match matches.opt_str(option) {
            Some(s) => match s.parse::<usize>() {
                Ok(value) => value,
                Err(f) => {
                    eprintln!("-{}: {}", option, f);
                    process::exit(1);
                }
            },
            None => default,
        }
    }
}

//-----------------------------------------------------------------------------
