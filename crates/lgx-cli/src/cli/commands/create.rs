use std::path::Path;

use lgx_core::{path, Package};

use super::super::args::CreateArgs;
use crate::exit_codes::{EXIT_FAILURE, EXIT_SUCCESS};

pub fn run(args: CreateArgs) -> anyhow::Result<i32> {
    let name = path::to_lowercase(&args.name);
    let filename = format!("{name}.lgx");

    if Path::new(&filename).exists() {
        eprintln!("error: file already exists: {filename}");
        return Ok(EXIT_FAILURE);
    }

    match Package::create(Path::new(&filename), &name) {
        Ok(_) => {
            println!("Created package: {filename}");
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(EXIT_FAILURE)
        }
    }
}
