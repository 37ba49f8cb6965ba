mod cli;
mod config;
mod model;
mod position;
mod session;
mod slate;
mod store;
mod trim;

use std::{fs, process};

use config::Config;

fn main() {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if let Err(e) = fs::create_dir_all(&config.state_dir) {
        eprintln!(
            "Failed to initialize {}: {e}",
            config.state_dir.display()
        );
        process::exit(1);
    }

    if let Err(e) = cli::run(&config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
