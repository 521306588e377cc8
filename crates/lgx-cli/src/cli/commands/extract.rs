use lgx_core::{path, Package};

use super::super::args::ExtractArgs;
use crate::exit_codes::{EXIT_FAILURE, EXIT_SUCCESS};

pub fn run(args: ExtractArgs) -> anyhow::Result<i32> {
    if !args.package.exists() {
        eprintln!("error: package not found: {}", args.package.display());
        return Ok(EXIT_FAILURE);
    }

    let pkg = match Package::load(&args.package) {
        Ok(pkg) => pkg,
        Err(e) => {
            eprintln!("error: failed to load package: {e}");
            return Ok(EXIT_FAILURE);
        }
    };

    match &args.variant {
        None => {
            if let Err(e) = pkg.extract_all(&args.output) {
                eprintln!("error: {e}");
                return Ok(EXIT_FAILURE);
            }
            let count = pkg.variants().len();
            if count == 0 {
                println!("No variants to extract");
            } else {
                println!(
                    "Extracted {count} variant(s) to {}",
                    args.output.display()
                );
            }
        }
        Some(variant) => {
            let variant_lc = path::to_lowercase(variant);
            if !pkg.has_variant(&variant_lc) {
                eprintln!("error: variant not found: {variant}");
                return Ok(EXIT_FAILURE);
            }
            if let Err(e) = pkg.extract_variant(&variant_lc, &args.output) {
                eprintln!("error: {e}");
                return Ok(EXIT_FAILURE);
            }
            println!(
                "Extracted variant '{variant_lc}' to {}",
                args.output.display()
            );
        }
    }

    Ok(EXIT_SUCCESS)
}
