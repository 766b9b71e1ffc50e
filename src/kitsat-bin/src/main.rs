/*****************************************************************************************[main.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

extern crate clap;
extern crate cpu_time;
extern crate env_logger;
extern crate flate2;
extern crate kitsat;
#[macro_use]
extern crate log;

use clap::{App, Arg, ArgMatches};
use flate2::bufread::GzDecoder;
use kitsat::{BasicSolver, BasicCallbacks, Print, SolverOpts, Status};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::mem;
use std::process::exit;
use std::str::FromStr;
use std::time::Instant;

mod system;

fn main() {
    env_logger::init();
    let exitcode = main2().unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(1)
    });
    exit(exitcode);
}

/// Value of option `name`, failing on anything that does not parse.
fn parse_opt<T: FromStr>(matches: &ArgMatches, name: &str) -> io::Result<Option<T>> {
    match matches.value_of(name) {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("ERROR! invalid value <{}> for option \"{}\".", s, name),
            )
        }),
    }
}

fn main2() -> io::Result<i32> {
    let resource = system::ResourceMeasure::new();

    let matches = App::new("kitsat")
        .version("0.1.0")
        .about("Small incremental CDCL solver with cores and prime implicants")
        .arg(Arg::with_name("input-file"))
        .arg(Arg::with_name("result-output-file"))
        .arg(
            Arg::with_name("verbosity")
                .long("verb")
                .default_value("1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("cpu-lim")
                .long("cpu-lim")
                .help("Stop after this many seconds of CPU time")
                .default_value("-1.0")
                .takes_value(true),
        )
        .arg(Arg::with_name("ticks").long("ticks")
             .help("Stop after this many ticks of propagation work")
             .takes_value(true))
        .arg(Arg::with_name("seed").long("seed")
             .help("Seed of the generator used for shuffling and random phases")
             .default_value("0")
             .takes_value(true))
        .arg(Arg::with_name("is-strict").long("strict")
             .help("Fail if the number of clauses does not match the header"))
        .arg(Arg::with_name("incremental").long("incremental")
             .help("Read iCNF, solving at every 'a' line"))
        .arg(Arg::with_name("core").long("core")
             .help("Print the original clauses of a clausal core when unsatisfiable"))
        .arg(Arg::with_name("prime").long("prime")
             .help("Print a prime implicant as blocking clause when satisfiable"))
        .arg(Arg::with_name("model").long("model")
             .help("Print the model when satisfiable"))
        .arg(Arg::with_name("shuffle").long("shuffle")
             .help("Shuffle the variable order and the watch lists before solving"))
        .arg(Arg::with_name("rnd-phases").long("rnd-phases")
             .help("Start from random phases"))
        .arg(Arg::with_name("flip-phases").long("flip-phases")
             .conflicts_with("rnd-phases")
             .help("Start from negative phases"))
        .get_matches();

    let verbosity = parse_opt::<i32>(&matches, "verbosity")?.unwrap_or(1);
    if verbosity < 0 || verbosity > 2 {
        eprintln!(
            "ERROR! value <{}> is out of range for option \"verb\".",
            verbosity
        );
        exit(1);
    }
    let mut solver_opts = SolverOpts::default();
    solver_opts.seed = parse_opt(&matches, "seed")?.unwrap_or(solver_opts.seed);
    solver_opts.ticks_limit = parse_opt(&matches, "ticks")?;
    let print_core = matches.is_present("core");
    solver_opts.track_antecedents = print_core;
    let cpu_lim = parse_opt::<f64>(&matches, "cpu-lim")?.filter(|x| *x > 0.);
    let is_strict = matches.is_present("is-strict");
    let incremental = matches.is_present("incremental");

    let mut solver = BasicSolver::new(solver_opts, BasicCallbacks::new());

    // setup timeout handler, if any
    if let Some(max_cpu) = cpu_lim {
        let r = system::ResourceMeasure::new();
        solver.set_terminator(move || r.exceeds(max_cpu));
    }

    let initial_time = Instant::now();

    let input_file = matches.value_of("input-file");
    if let Some(input_file) = input_file {
        debug!("solve file {}", input_file);
        let file = BufReader::new(File::open(input_file)?);
        read_input_autogz(file, &mut solver, verbosity, is_strict, incremental)?;
    } else {
        println!("c Reading from standard input... Use '--help' for help.");
        let stdin = io::stdin();
        read_input_autogz(stdin.lock(), &mut solver, verbosity, is_strict, incremental)?;
    }

    let mut resfile = if let Some(result_output_file) = matches.value_of("result-output-file") {
        Some(BufWriter::new(File::create(result_output_file)?))
    } else {
        None
    };

    if verbosity > 0 {
        println!(
            "c |  Number of variables:  {:12}                                         |",
            solver.num_vars()
        );
        println!(
            "c |  Number of clauses:    {:12}                                         |",
            solver.num_clauses()
        );
        let duration = Instant::now() - initial_time;
        println!(
            "c |  Parse time:           {:9}.{:02} s                                       |",
            duration.as_secs(),
            duration.subsec_nanos() / 10_000_000
        );
        println!("c |                                                                             |");
    }

    // in incremental mode the input already solved, possibly several times
    if matches.is_present("shuffle") && solver.status() == Status::Unknown {
        solver.shuffle_clauses();
    }
    if matches.is_present("rnd-phases") {
        solver.randomize_phases();
    } else if matches.is_present("flip-phases") {
        solver.flip_phases();
    }

    let ret = solver.solve();
    if verbosity > 0 {
        solver.print_stats();
        println!("c CPU time              : {:.3}s", resource.cpu_time());
    }
    match ret {
        Status::Sat => {
            println!("s SATISFIABLE");
            if let Some(resfile) = resfile.as_mut() {
                writeln!(resfile, "s SAT")?;
                write!(resfile, "{}", solver.dimacs_model())?;
            }
            if matches.is_present("model") {
                print!("{}", solver.dimacs_model());
            }
            if matches.is_present("prime") {
                print_prime_implicant(&mut solver);
            }
        }
        Status::Unsat => {
            println!("s UNSATISFIABLE");
            if let Some(resfile) = resfile.as_mut() {
                writeln!(resfile, "s UNSAT")?;
            }
            if print_core {
                print_clausal_core(&mut solver);
            }
        }
        _ => {
            println!("s UNKNOWN");
            if let Some(resfile) = resfile.as_mut() {
                writeln!(resfile, "s INDET")?;
            }
        }
    }
    if let Some(resfile) = resfile.as_mut() {
        resfile.flush()?;
    }
    mem::drop(resfile);

    let exitcode = ret.code();

    if !cfg!(debug_assertions) {
        // (faster than "return", which will invoke the destructor for 'Solver')
        exit(exitcode);
    }

    Ok(exitcode)
}

/// Print the implicant of the model satisfying every clause, negated.
fn print_prime_implicant(solver: &mut BasicSolver) {
    // with nothing ignored, side 1 has to satisfy every clause
    match solver.compute_prime_implicant(|_| false) {
        Some(_) => solver.add_prime_implicant(1, |_, lits| {
            println!("c prime implicant of {} literals, as blocking clause", lits.len());
            println!("{}", lits.pp_dimacs());
        }),
        None => println!("c prime implicant: ticks limit hit"),
    }
}

/// Print the original clauses of a clausal core, in DIMACS.
fn print_clausal_core(solver: &mut BasicSolver) {
    let (original, learned) = solver.compute_clausal_core();
    println!(
        "c clausal core of {} original clauses ({} learned clauses used)",
        original, learned
    );
    solver.traverse_core_clauses_with_id(|id, learned, lits| {
        if !learned {
            println!("c clause {}", id);
            println!("{}", lits.pp_dimacs());
        }
    });
}

fn read_input_autogz<R: BufRead>(
    mut input: R,
    solver: &mut BasicSolver,
    verbosity: i32,
    is_strict: bool,
    incremental: bool,
) -> io::Result<()> {
    let is_gz = input.fill_buf()?.starts_with(b"\x1F\x8B");
    if is_gz {
        read_input(
            BufReader::new(GzDecoder::new(input)),
            solver,
            verbosity,
            is_strict,
            incremental,
        )
    } else {
        read_input(input, solver, verbosity, is_strict, incremental)
    }
}

fn read_input<R: BufRead>(
    mut input: R,
    solver: &mut BasicSolver,
    verbosity: i32,
    is_strict: bool,
    incremental: bool,
) -> io::Result<()> {
    if verbosity > 0 {
        println!("c ============================[ Problem Statistics ]=============================");
        println!("c |                                                                             |");
    }
    kitsat::dimacs::parse(&mut input, solver, is_strict, incremental)?;
    Ok(())
}
