use clap::Parser;
use sfle::app::filters::normalize::normalize;
use sfle::config::cli::{exit_on_error, IoArgs};
use sfle::core::table::{read_rows, write_rows};

#[derive(Parser)]
#[command(name = "normalize")]
#[command(about = "Normalizes the column sums of a tab-delimited numerical matrix to 1")]
#[command(
    long_about = "Normalizes the column sums of a tab-delimited numerical matrix to 1.\n\n\
                  The normalization is robust to missing elements, but not to non-numerical values."
)]
struct Args {
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
    let normalized = normalize(&rows)?;
    write_rows(args.io.writer()?, &normalized)
}
