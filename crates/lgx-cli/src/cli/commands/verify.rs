use super::super::args::VerifyArgs;
use crate::exit_codes::{EXIT_FAILURE, EXIT_SUCCESS};

pub fn run(args: VerifyArgs) -> anyhow::Result<i32> {
    if !args.package.exists() {
        eprintln!("error: package not found: {}", args.package.display());
        return Ok(EXIT_FAILURE);
    }

    let report = lgx_core::verify(&args.package);

    // Warnings go to stdout, validation errors to stderr.
    for warning in &report.warnings {
        println!("warning: {warning}");
    }

    if !report.is_valid() {
        eprintln!("error: package validation failed:");
        for error in &report.errors {
            eprintln!("  - {error}");
        }
        return Ok(EXIT_FAILURE);
    }

    println!("Package is valid: {}", args.package.display());
    Ok(EXIT_SUCCESS)
}
