//! factiva CLI - Factiva Analytics explain, time-series and extraction jobs.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

use display::Format;

#[derive(Parser)]
#[command(name = "factiva")]
#[command(about = "Factiva Analytics snapshot jobs from the command line", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (only errors are logged)
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Filters shared by every job-submitting command.
#[derive(clap::Args)]
struct QueryArgs {
    /// Query `where` clause. Defaults to FACTIVA_WHERE.
    #[arg(short = 'w', long = "where")]
    where_clause: Option<String>,

    /// Include filter as FIELD=VALUE[,VALUE...] (repeatable)
    #[arg(long, value_name = "FIELD=VALUES")]
    include: Vec<String>,

    /// Exclude filter as FIELD=VALUE[,VALUE...] (repeatable)
    #[arg(long, value_name = "FIELD=VALUES")]
    exclude: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the number of documents matching a query
    Explain {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Run a time-series aggregation
    TimeSeries {
        #[command(flatten)]
        query: QueryArgs,

        /// Bucket size (DAY, MONTH, YEAR)
        #[arg(long, default_value = "MONTH")]
        frequency: String,

        /// Date field to bucket on
        #[arg(long, default_value = "publication_datetime")]
        date_field: String,

        /// Dimension to group each bucket by
        #[arg(short, long)]
        group_dimension: Option<String>,

        /// Number of top values per group (-1 for all)
        #[arg(long, default_value = "10", allow_hyphen_values = true)]
        top: i64,

        /// Output file path. Prints to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,
    },

    /// Run a snapshot extraction and download its files
    Extract {
        #[command(flatten)]
        query: QueryArgs,

        /// Maximum number of documents
        #[arg(short, long)]
        limit: Option<i64>,

        /// Result file format (avro, json, csv)
        #[arg(long, default_value = "avro")]
        file_format: String,

        /// Directory the result files are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Check the status of an existing job
    Status {
        /// Endpoint the job was submitted to (explain, time-series, extraction)
        endpoint: String,

        /// Job ID
        job_id: String,

        /// Wait until the job reaches a terminal state
        #[arg(long)]
        wait: bool,
    },

    /// Read Avro snapshot files and export them as a table
    ReadAvro {
        /// Avro file or folder of Avro files
        path: PathBuf,

        /// Keep only the snapshot statistics fields
        #[arg(long)]
        stats_only: bool,

        /// Merge snippet into body
        #[arg(long)]
        merge_body: bool,

        /// Keep every field of the snapshot schema
        #[arg(long)]
        all_fields: bool,

        /// Apply no snapshot rules at all
        #[arg(long, conflicts_with_all = ["stats_only", "merge_body", "all_fields"])]
        raw: bool,

        /// Output file path. Prints to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Explain { query } => commands::explain::explain(&query.into()).await,
        Commands::TimeSeries {
            query,
            frequency,
            date_field,
            group_dimension,
            top,
            output,
            format,
        } => {
            let options = commands::time_series::TimeSeriesOptions {
                frequency,
                date_field,
                group_dimension,
                top,
            };
            commands::time_series::time_series(&query.into(), &options, output, format).await
        }
        Commands::Extract {
            query,
            limit,
            file_format,
            output_dir,
        } => commands::extract::extract(&query.into(), limit, &file_format, &output_dir).await,
        Commands::Status {
            endpoint,
            job_id,
            wait,
        } => commands::status::status(&endpoint, &job_id, wait).await,
        Commands::ReadAvro {
            path,
            stats_only,
            merge_body,
            all_fields,
            raw,
            output,
            format,
        } => {
            let options = commands::read_avro::ReadOptions {
                stats_only,
                merge_body,
                all_fields,
                raw,
            };
            commands::read_avro::read_avro(&path, &options, output, format)
        }
    }
}

impl From<QueryArgs> for commands::QueryOptions {
    fn from(args: QueryArgs) -> Self {
        Self {
            where_clause: args.where_clause,
            include: args.include,
            exclude: args.exclude,
        }
    }
}
