use clap::Parser;
use sfle::app::filters::vitals::vitals;
use sfle::config::cli::{exit_on_error, IoArgs};
use sfle::core::table::{read_rows, write_rows};

#[derive(Parser)]
#[command(name = "vitals")]
#[command(about = "Reads a list of numbers and outputs their sum, mean, and standard deviation")]
#[command(
    long_about = "Reads a list of numbers and outputs their sum, mean, and standard deviation.\n\n\
                  The list may be the first column of a tab-delimited file and may contain blank \
                  lines or non-numerical values, which are ignored."
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
    let result = vitals(&rows);
    tracing::debug!("vitals over {} values", result.count);
    write_rows(args.io.writer()?, &[result.to_row()])
}
