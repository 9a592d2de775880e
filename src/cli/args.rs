use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "upm",
    about = "Universal package manager front end",
    long_about = "One command set for the package managers of several languages: \
                  search, add, remove, lock, install, list and guess dependencies.",
    version,
    next_line_help = false,
    term_width = 80
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Parser, Debug)]
pub struct GlobalFlags {
    /// Backend to use (see `upm backends`); detected from the project if omitted
    #[arg(short = 'l', long = "lang", value_name = "BACKEND", global = true)]
    pub lang: Option<String>,

    /// Project directory holding the specfile and lockfile
    #[arg(long, value_name = "DIR", global = true)]
    pub project_dir: Option<PathBuf>,

    /// Settings file (defaults to the per-user settings.kdl)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Python 2 interpreter
    #[arg(long, value_name = "BIN", env = "UPM_PYTHON2", global = true)]
    pub python2: Option<String>,

    /// Python 3 interpreter
    #[arg(long, value_name = "BIN", env = "UPM_PYTHON3", global = true)]
    pub python3: Option<String>,

    /// Output format for query results
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Quiet mode
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Machine format name, or `None` for human-oriented tables
    pub fn machine(self) -> Option<&'static str> {
        match self {
            Self::Table => None,
            Self::Json => Some("json"),
            Self::Yaml => Some("yaml"),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List known backends
    Backends,

    /// Print the backend detected for the project
    WhichLanguage,

    /// Search the package index
    Search {
        /// Search terms, joined with spaces
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Show details of one package
    Info {
        name: String,
    },

    /// Add packages to the specfile
    Add {
        /// "NAME" or "NAME SPEC"
        #[arg(value_name = "PKG")]
        packages: Vec<String>,

        /// Also add dependencies guessed from the sources
        #[arg(short = 'g', long)]
        guess: bool,

        /// Do not lock or install afterwards
        #[arg(long)]
        no_install: bool,
    },

    /// Remove packages from the specfile
    Remove {
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,

        /// Do not lock or install afterwards
        #[arg(long)]
        no_install: bool,
    },

    /// Regenerate the lockfile from the specfile
    Lock,

    /// Install what the specfile and lockfile describe
    Install,

    /// List declared packages
    List {
        /// List pinned versions from the lockfile instead
        #[arg(long)]
        lockfile: bool,
    },

    /// Guess dependencies from the project's sources
    Guess {
        /// Include packages that are already declared
        #[arg(short = 'a', long)]
        all: bool,

        /// Print the matching import statements instead of package names
        #[arg(long)]
        statements: bool,
    },

    /// Generate shell completions
    #[command(hide = true)]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests;
