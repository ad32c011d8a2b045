use clap::Parser;

use h2layout::cli::Cli;

fn main() {
    let args = Cli::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    if let Err(e) = h2layout::run(&args) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
