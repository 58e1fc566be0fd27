//! `cdoc` binary entrypoint.

fn main() {
    std::process::exit(cdoc_cli::run());
}
