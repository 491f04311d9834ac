use clap::Parser;
use sfle::app::filters::transpose::transpose;
use sfle::config::cli::{exit_on_error, IoArgs};
use sfle::core::table::{read_rows, write_rows};

#[derive(Parser)]
#[command(name = "transpose")]
#[command(about = "Transposes a tab-delimited text matrix")]
#[command(
    long_about = "Transposes a tab-delimited text matrix.\n\n\
                  Missing elements and rows of differing lengths are padded with empty cells."
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
    write_rows(args.io.writer()?, &transpose(&rows))
}
