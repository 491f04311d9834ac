use clap::Parser;
use sfle::app::filters::grep_rows::{grep_rows, id_set, GrepOptions};
use sfle::config::cli::{exit_on_error, open_reader, IoArgs};
use sfle::core::table::{read_rows, write_rows};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grep_rows")]
#[command(
    about = "Reads a list of row identifiers and outputs all input rows matching any of these IDs"
)]
struct Args {
    /// File from which row IDs to match are read (first column)
    #[arg(value_name = "rows.txt")]
    rows: PathBuf,

    /// Invert to print non-matching rows
    #[arg(short = 'f')]
    invert: bool,

    /// Data column in which IDs are matched (zero-indexed)
    #[arg(short = 'c', value_name = "col", default_value_t = 0)]
    column: usize,

    /// Match beginning rather than full ID
    #[arg(short = 'b')]
    beginning: bool,

    #[command(flatten)]
    io: IoArgs,
}

fn main() {
    let args = Args::parse();
    args.io.init_logger();
    exit_on_error(run(&args));
}

fn run(args: &Args) -> sfle::Result<()> {
    let ids = id_set(&read_rows(open_reader(Some(&args.rows))?)?);
    tracing::debug!("grep_rows: {} IDs from {}", ids.len(), args.rows.display());

    let data = read_rows(args.io.reader()?)?;
    let options = GrepOptions {
        invert: args.invert,
        column: args.column,
        prefix: args.beginning,
    };
    write_rows(args.io.writer()?, &grep_rows(&ids, data, options))
}
