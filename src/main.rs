use std::collections::HashSet;
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, ArgGroup, Parser};
use env_logger::Env;
use log::{LevelFilter, debug};

use unoccupied::http::{Client, HttpNameFinder};
use unoccupied::report::Report;
use unoccupied::{
    DEFAULT_LIMIT, Excluding, FileNameFinder, MAX_CONCURRENT_PROBES, NameFinder, NumberNameFinder,
    Numbering, UnoccupiedError, unoccupied, unoccupied_concurrent,
};

#[derive(Parser)]
#[command(
    name = "unoccupied",
    version,
    about = "Find the next unoccupied name by probing numbered candidates",
    after_help = "By default NAMES are file names probed in the current directory. \
                  Use --dir for another directory, --taken/--taken-from to probe an \
                  explicit list, or --url to probe an HTTP endpoint (404 means free).\n\n\
                  Names are resolved in order and never collide with each other. \
                  Without --create or --mkdir another process may still take a name \
                  before you use it."
)]
#[command(group(ArgGroup::new("taken_list").args(["taken", "taken_from"]).multiple(true)))]
struct Cli {
    /// Names to resolve (also reads from stdin)
    names: Vec<String>,

    /// Probe entries of DIR [default: current directory]
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Treat NAME as occupied instead of probing files (repeatable)
    #[arg(short, long = "taken", value_name = "NAME", conflicts_with = "dir")]
    taken: Vec<String>,

    /// Read occupied names from FILE, one per line
    #[arg(long, value_name = "FILE", conflicts_with = "dir")]
    taken_from: Option<PathBuf>,

    /// Probe a URL template containing `{name}`; a 404 answer means free
    #[arg(long, value_name = "TEMPLATE", conflicts_with_all = ["dir", "taken", "taken_from"])]
    url: Option<String>,

    /// Text between the name and an appended number
    #[arg(short, long, default_value = "_")]
    separator: String,

    /// First number appended
    #[arg(long, default_value_t = 1)]
    start: u64,

    /// Minimum digits of an appended number (zero padded)
    #[arg(short, long, default_value_t = 0)]
    width: usize,

    /// Maximum candidates probed per name
    #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT)]
    limit: u64,

    /// Always append a number instead of continuing a trailing one
    #[arg(long)]
    no_increment: bool,

    /// Compare taken names case-insensitively
    #[arg(short, long, requires = "taken_list")]
    ignore_case: bool,

    /// Allow Windows device names such as `con` or `nul.txt`
    #[arg(long, conflicts_with_all = ["taken", "taken_from", "url"])]
    allow_reserved: bool,

    /// Atomically create each file found
    #[arg(long, conflicts_with_all = ["taken", "taken_from", "url", "mkdir"])]
    create: bool,

    /// Atomically create each directory found
    #[arg(long, conflicts_with_all = ["taken", "taken_from", "url"])]
    mkdir: bool,

    /// Candidates probed in parallel, at most 20 [default: 1, or 20 with --url]
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Print one JSON object per name
    #[arg(long)]
    json: bool,

    /// Suppress output, exit code only
    #[arg(short, long)]
    quiet: bool,

    /// Log probes to stderr (-vv for more)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

enum Mode {
    Files(FileNameFinder),
    Taken(NumberNameFinder),
    Url(HttpNameFinder),
}

impl Mode {
    fn from_cli(cli: &Cli) -> Result<Self, String> {
        let numbering = Numbering::default()
            .with_separator(cli.separator.clone())
            .with_start(cli.start)
            .with_width(cli.width)
            .with_limit(cli.limit)
            .increment_trailing(!cli.no_increment);

        if let Some(template) = &cli.url {
            let finder = HttpNameFinder::new(Client::new(), template.clone())
                .map_err(|e| e.to_string())?;
            return Ok(Self::Url(finder.with_numbering(numbering)));
        }

        if !cli.taken.is_empty() || cli.taken_from.is_some() {
            let mut finder = NumberNameFinder::new(cli.taken.iter().cloned())
                .with_numbering(numbering)
                .ignore_case(cli.ignore_case);
            if let Some(path) = &cli.taken_from {
                let contents = std::fs::read_to_string(path)
                    .map_err(|e| format!("reading {}: {e}", path.display()))?;
                for line in contents.lines() {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        finder.insert(trimmed);
                    }
                }
            }
            debug!("{} names marked as taken", finder.len());
            return Ok(Self::Taken(finder));
        }

        let dir = cli.dir.clone().unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::Files(
            FileNameFinder::new(dir)
                .with_numbering(numbering)
                .portable(!cli.allow_reserved),
        ))
    }

    fn finder(&self) -> &(dyn NameFinder + Sync) {
        match self {
            Self::Files(f) => f,
            Self::Taken(f) => f,
            Self::Url(f) => f,
        }
    }

    fn default_jobs(&self) -> usize {
        match self {
            Self::Url(_) => MAX_CONCURRENT_PROBES,
            _ => 1,
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn resolve(
    cli: &Cli,
    mode: &Mode,
    requested: &str,
    claimed: &HashSet<String>,
    jobs: usize,
) -> Result<String, UnoccupiedError> {
    if let Mode::Files(finder) = mode {
        let created = if cli.create {
            Some(finder.create_file(requested)?.0)
        } else if cli.mkdir {
            Some(finder.create_dir(requested)?)
        } else {
            None
        };
        if let Some(path) = created {
            return Ok(path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default());
        }
    }

    let finder = Excluding::new(mode.finder(), claimed);
    if jobs > 1 {
        unoccupied_concurrent(requested, &finder, jobs)
    } else {
        unoccupied(requested, &finder)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut names: Vec<String> = cli.names.clone();

    // Read from stdin if not a terminal
    if !io::stdin().is_terminal() {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(l) => {
                    let trimmed = l.trim().to_string();
                    if !trimmed.is_empty() {
                        names.push(trimmed);
                    }
                }
                Err(e) => {
                    eprintln!("error: reading stdin: {e}");
                    return ExitCode::from(2);
                }
            }
        }
    }

    if names.is_empty() {
        eprintln!("error: no names provided");
        eprintln!("usage: unoccupied [OPTIONS] [NAMES...]");
        return ExitCode::from(2);
    }

    let mode = match Mode::from_cli(&cli) {
        Ok(mode) => mode,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(2);
        }
    };
    let jobs = cli.jobs.unwrap_or_else(|| mode.default_jobs());

    let mut claimed = HashSet::new();
    let mut all_found = true;

    for requested in &names {
        let result = resolve(&cli, &mode, requested, &claimed, jobs);
        if let Ok(name) = &result {
            claimed.insert(mode.finder().key(name).into_owned());
        }

        let report = Report::new(requested.as_str(), &result);
        if !report.is_found() {
            all_found = false;
        }

        if cli.quiet {
            continue;
        }

        if cli.json {
            match report.to_json() {
                Ok(line) => println!("{line}"),
                Err(e) => {
                    eprintln!("error: serializing report for {requested}: {e}");
                    all_found = false;
                }
            }
        } else {
            println!("{}", report.to_line());
        }
    }

    if all_found {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
