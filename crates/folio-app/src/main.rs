//! Headless export entry point.

use clap::Parser;
use folio_app::Args;

fn main() {
    env_logger::init();
    let args = Args::parse();

    match folio_app::run(&args) {
        Ok(written) => {
            for path in written {
                println!("{}", path.display());
            }
        }
        Err(e) => {
            log::error!("{e}");
            eprintln!("folio-export: {e}");
            std::process::exit(1);
        }
    }
}
