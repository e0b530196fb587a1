use clap::{crate_name, crate_version, Arg, ArgAction, Command};
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use topicdist::{io, Algorithm, Lecturers, PreferenceStore};

fn main() {
    let args = Command::new(crate_name!())
        .version(crate_version!())
        .about("Distribute students among the topics of multiple lecturers according to their preferences")
        .arg(
            Arg::new("PREFERENCE_CSV")
                .help("CSV file(s) with the students' topic preferences")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("student_json")
                .short('s')
                .long("student-json")
                .value_name("FILE")
                .help("JSON student roster. Students without survey answers are assigned, too.")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("lecturer_json")
                .short('l')
                .long("lecturer-json")
                .value_name("FILE")
                .help("JSON file with lecturer metadata (fixed capacities and excluded students) by topic"),
        )
        .arg(
            Arg::new("algorithm")
                .short('a')
                .long("algorithm")
                .value_parser(["greedy", "optimal"])
                .default_value("optimal")
                .help("Assignment algorithm to use"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the result as JSON to this file"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .value_parser(clap::value_parser!(u64))
                .help("Seed for the random number generator, to get reproducible results"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase verbosity of log output (may be given multiple times)"),
        )
        .get_matches();

    let log_level = match args.get_count("verbose") {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let store = match read_preferences(&args) {
        Ok(s) => s,
        Err((msg, code)) => {
            error!("{}", msg);
            std::process::exit(code);
        }
    };
    let lecturers = match args.get_one::<String>("lecturer_json") {
        Some(filename) => match read_file(filename, io::lecturers::read) {
            Ok(l) => l,
            Err((msg, code)) => {
                error!("Could not read lecturer metadata: {}", msg);
                std::process::exit(code);
            }
        },
        None => Lecturers::new(),
    };
    info!(
        "Read {} students, {} topics and metadata of {} lecturers",
        store.student_count(),
        store.topic_count(),
        lecturers.len()
    );

    let algorithm: Algorithm = match args.get_one::<String>("algorithm").map(|a| a.parse()) {
        Some(Ok(a)) => a,
        Some(Err(e)) => {
            error!("{}", e);
            std::process::exit(exitcode::USAGE);
        }
        None => Algorithm::Optimal,
    };
    let mut rng = match args.get_one::<u64>("seed") {
        Some(seed) => StdRng::seed_from_u64(*seed),
        None => StdRng::from_os_rng(),
    };

    let distribution = match topicdist::distribute(&store, &lecturers, algorithm, &mut rng) {
        Ok(d) => d,
        Err(e) => {
            error!("{}", e);
            std::process::exit(exitcode::DATAERR);
        }
    };

    println!("{}", io::report::format_distribution(&distribution));

    if let Some(filename) = args.get_one::<String>("output") {
        let result = std::fs::File::create(filename)
            .map_err(|e| e.to_string())
            .and_then(|file| {
                io::result::write(
                    std::io::BufWriter::new(file),
                    &distribution,
                    &lecturers,
                    algorithm,
                    chrono::Utc::now(),
                )
            });
        if let Err(e) = result {
            error!("Could not write result file {}: {}", filename, e);
            std::process::exit(exitcode::CANTCREAT);
        }
        info!("Result written to {}", filename);
    }

    if !distribution.unassigned().is_empty() {
        warn!(
            "{} students could not be assigned",
            distribution.unassigned().len()
        );
        std::process::exit(exitcode::SOFTWARE);
    }
}

/// Read and merge all student rosters and preference CSV files given on the command line. Rosters are read first,
/// such that students with survey answers replace their roster entries.
fn read_preferences(
    args: &clap::ArgMatches,
) -> Result<PreferenceStore, (String, exitcode::ExitCode)> {
    let mut store = PreferenceStore::new();
    for filename in args.get_many::<String>("student_json").into_iter().flatten() {
        store.merge(read_file(filename, io::preferences::read_student_json)?);
    }
    for filename in args.get_many::<String>("PREFERENCE_CSV").into_iter().flatten() {
        store.merge(read_file(filename, io::preferences::read_csv)?);
    }
    if store.student_count() == 0 {
        return Err(("No students given. Nothing to do.".to_owned(), exitcode::NOINPUT));
    }
    Ok(store)
}

/// Open the file and parse it with the given reader function, attaching the file name and a matching exit code to
/// any error.
fn read_file<T, F>(filename: &str, parse: F) -> Result<T, (String, exitcode::ExitCode)>
where
    F: FnOnce(std::fs::File) -> Result<T, String>,
{
    let file = std::fs::File::open(filename)
        .map_err(|e| (format!("Could not open {}: {}", filename, e), exitcode::NOINPUT))?;
    parse(file).map_err(|e| (format!("Could not parse {}: {}", filename, e), exitcode::DATAERR))
}
