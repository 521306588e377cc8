use lgx_core::{path, Package};

use super::super::args::RemoveArgs;
use super::confirm;
use crate::exit_codes::{EXIT_FAILURE, EXIT_SUCCESS};

pub fn run(args: RemoveArgs) -> anyhow::Result<i32> {
    if !args.package.exists() {
        eprintln!("error: package not found: {}", args.package.display());
        return Ok(EXIT_FAILURE);
    }

    let mut pkg = match Package::load(&args.package) {
        Ok(pkg) => pkg,
        Err(e) => {
            eprintln!("error: failed to load package: {e}");
            return Ok(EXIT_FAILURE);
        }
    };

    let variant_lc = path::to_lowercase(&args.variant);
    if !pkg.has_variant(&variant_lc) {
        eprintln!("error: variant not found: {variant_lc}");
        return Ok(EXIT_FAILURE);
    }

    if !args.yes && !confirm(&format!("Remove variant '{variant_lc}'?"), true) {
        println!("Aborted.");
        return Ok(EXIT_FAILURE);
    }

    if let Err(e) = pkg.remove_variant(&variant_lc) {
        eprintln!("error: {e}");
        return Ok(EXIT_FAILURE);
    }

    if let Err(e) = pkg.save(&args.package) {
        eprintln!("error: failed to save package: {e}");
        return Ok(EXIT_FAILURE);
    }

    println!(
        "Removed variant '{variant_lc}' from {}",
        args.package.display()
    );
    Ok(EXIT_SUCCESS)
}
