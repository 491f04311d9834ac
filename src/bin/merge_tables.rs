use clap::Parser;
use sfle::app::filters::merge_tables::{merge_tables, MergeOptions, SourceTable};
use sfle::config::cli::{exit_on_error, open_reader, OutputArgs};
use sfle::core::table::{read_rows_trimmed, write_rows};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "merge_tables")]
#[command(about = "Outer-joins tab-delimited tables on their row or column IDs")]
struct Args {
    /// Tables to merge
    #[arg(required = true, value_name = "table.pcl")]
    tables: Vec<PathBuf>,

    /// Join on column IDs instead of row IDs
    #[arg(short = 't', conflicts_with = "no_header")]
    transpose: bool,

    /// Prefix headers (or row IDs with -t) with each table's file name
    #[arg(short = 'l')]
    label: bool,

    /// Column holding the row ID (zero-indexed)
    #[arg(short = 'c', value_name = "col", default_value_t = 0)]
    column: usize,

    /// Tables have no header row
    #[arg(short = 'd')]
    no_header: bool,

    #[command(flatten)]
    out: OutputArgs,
}

fn main() {
    let args = Args::parse();
    args.out.init_logger();
    exit_on_error(run(&args));
}

fn run(args: &Args) -> sfle::Result<()> {
    let mut tables = Vec::with_capacity(args.tables.len());
    for path in &args.tables {
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let rows = read_rows_trimmed(open_reader(Some(path))?)?;
        tracing::debug!("merge_tables: {} rows from {}", rows.len(), path.display());
        tables.push(SourceTable::new(label, rows));
    }

    let options = MergeOptions {
        transpose: args.transpose,
        label: args.label,
        column: args.column,
        no_header: args.no_header,
    };
    write_rows(args.out.writer()?, &merge_tables(&tables, &options)?)
}
