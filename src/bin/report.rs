use clap::{Parser, ValueEnum};
use sfle::app::filters::report::{summarize, write_rst, write_tsv};
use sfle::config::cli::{exit_on_error, IoArgs};
use sfle::core::table::read_rows;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Tab-delimited summary table
    Tsv,
    /// reStructuredText page for Sphinx
    Rst,
}

#[derive(Parser)]
#[command(name = "report")]
#[command(about = "Reports simple statistics on each row of a tab-delimited text file")]
struct Args {
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Tsv)]
    format: Format,

    #[command(flatten)]
    io: IoArgs,
}

fn main() {
    let args = Args::parse();
    args.io.init_logger();
    exit_on_error(run(&args));
}

fn run(args: &Args) -> sfle::Result<()> {
    let rows = read_rows(args.io.reader()?)?;
    let report = summarize(&rows);
    match args.format {
        Format::Tsv => write_tsv(&report, args.io.writer()?),
        Format::Rst => write_rst(&report, args.io.writer()?),
    }
}
