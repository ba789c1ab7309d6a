use clap::{Parser, Subcommand};
use std::path::PathBuf;
use structcast::cli::{self, CastRequest, ValidateRequest};

#[derive(Parser)]
#[command(name = "structcast")]
#[command(about = "Project C struct initializers onto trimmed view-struct layouts")]
#[command(long_about = "structcast - C struct initializer reshaping

Takes full-struct brace initializers from firmware/host sources and re-renders
them in the shape of a trimmed view struct, preserving every value verbatim.

COMMANDS:
  cast      - Project declarations and update the generated header
  validate  - Check declarations against the struct layout, no writes
  inspect   - Show parsed struct layouts and flattened field lists
  watch     - Re-run cast automatically when input files change

EXAMPLES:
  structcast cast units.c --header full.h --views views.h \\
      --struct unit --view unitView -o generated.h
  structcast cast units.c --header full.h --views views.h \\
      --struct unit --view unitView -o generated.h --postfix PROGMEM
  structcast inspect full.h --struct unit
  structcast validate units.c --header full.h --views views.h \\
      --struct unit --view unitView")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Project initializer declarations onto the view layout.

Every declaration of the target struct found in the init file is flattened,
bound to the struct's leaf fields, and re-rendered in the view struct's shape.
The output header is updated in place: an existing declaration of the same
variable is replaced, new variables are appended, and a .bak copy of the
previous file is kept.

MAPPING FILES:
  When the view renames fields, align the names with a YAML mapping file:

    totalmass: total
    mainFull.density: mainFull_rho

  Keys match the field's dot path (array indices stripped) or bare name.

Use --dry-run to print the generated declarations without writing.")]
    /// Project declarations and update the generated header
    Cast {
        /// Init file containing full-struct initializer declarations
        init_file: PathBuf,

        /// Header declaring the full structs
        #[arg(long)]
        header: PathBuf,

        /// Header declaring the view structs
        #[arg(long)]
        views: PathBuf,

        /// Name of the full struct to project
        #[arg(short = 's', long = "struct")]
        target_struct: String,

        /// Name of the view struct to project onto
        #[arg(long = "view")]
        target_view: String,

        /// YAML mapping file aligning full-struct field names with the view
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// Output header to create or update
        #[arg(short, long)]
        output: PathBuf,

        /// Postfix specifier for generated declarations (e.g. PROGMEM)
        #[arg(long)]
        postfix: Option<String>,

        /// Rename the generated variable (single declaration only)
        #[arg(long)]
        rename: Option<String>,

        /// Print generated declarations without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show verbose processing steps
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Validate declarations without writing anything.

Parses both headers and the init file, then checks that every declaration of
the target struct supplies at least as many values as the struct's flattened
field count. Exits non-zero when any declaration fails.")]
    /// Check declarations against the struct layout, no writes
    Validate {
        /// Init file containing full-struct initializer declarations
        init_file: PathBuf,

        /// Header declaring the full structs
        #[arg(long)]
        header: PathBuf,

        /// Header declaring the view structs
        #[arg(long)]
        views: PathBuf,

        /// Name of the full struct to check
        #[arg(short = 's', long = "struct")]
        target_struct: String,

        /// Name of the view struct to project onto
        #[arg(long = "view")]
        target_view: String,

        /// YAML mapping file aligning full-struct field names with the view
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// Show verbose processing steps
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Show parsed struct layouts.

Prints each struct's fields in declaration order plus the flattened leaf-field
names initializer values bind to. With --json the report is emitted as JSON
for tooling.")]
    /// Show parsed struct layouts and flattened field lists
    Inspect {
        /// Header to parse
        header: PathBuf,

        /// Only show this struct
        #[arg(short = 's', long = "struct")]
        target_struct: Option<String>,

        /// YAML mapping file applied to the flattened names
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    #[command(long_about = "Watch input files and re-cast on changes.

Monitors the init file, both headers, and the mapping file. When any of them
changes, the cast (or validation with --validate) runs again. Results land in
the output header exactly as with the cast command.

Press Ctrl+C to stop watching.")]
    /// Re-run cast automatically when input files change
    Watch {
        /// Init file containing full-struct initializer declarations
        init_file: PathBuf,

        /// Header declaring the full structs
        #[arg(long)]
        header: PathBuf,

        /// Header declaring the view structs
        #[arg(long)]
        views: PathBuf,

        /// Name of the full struct to project
        #[arg(short = 's', long = "struct")]
        target_struct: String,

        /// Name of the view struct to project onto
        #[arg(long = "view")]
        target_view: String,

        /// YAML mapping file aligning full-struct field names with the view
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// Output header to create or update
        #[arg(short, long)]
        output: PathBuf,

        /// Postfix specifier for generated declarations (e.g. PROGMEM)
        #[arg(long)]
        postfix: Option<String>,

        /// Only validate (don't cast)
        #[arg(long)]
        validate: bool,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "structcast=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cast {
            init_file,
            header,
            views,
            target_struct,
            target_view,
            mapping,
            output,
            postfix,
            rename,
            dry_run,
            verbose,
        } => cli::cast(&CastRequest {
            init_file,
            header,
            views,
            target_struct,
            target_view,
            mapping,
            output,
            postfix,
            rename,
            dry_run,
            verbose,
        })?,

        Commands::Validate {
            init_file,
            header,
            views,
            target_struct,
            target_view,
            mapping,
            verbose,
        } => cli::validate(&ValidateRequest {
            init_file,
            header,
            views,
            target_struct,
            target_view,
            mapping,
            verbose,
        })?,

        Commands::Inspect {
            header,
            target_struct,
            mapping,
            json,
        } => cli::inspect(header, target_struct, mapping, json)?,

        Commands::Watch {
            init_file,
            header,
            views,
            target_struct,
            target_view,
            mapping,
            output,
            postfix,
            validate,
            verbose,
        } => cli::watch(
            &CastRequest {
                init_file,
                header,
                views,
                target_struct,
                target_view,
                mapping,
                output,
                postfix,
                rename: None,
                dry_run: false,
                verbose,
            },
            validate,
        )?,
    }

    Ok(())
}
