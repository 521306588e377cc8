use lgx_core::{path, Package};

use super::super::args::AddArgs;
use super::confirm;
use crate::exit_codes::{EXIT_FAILURE, EXIT_SUCCESS};

pub fn run(args: AddArgs) -> anyhow::Result<i32> {
    if !args.package.exists() {
        eprintln!("error: package not found: {}", args.package.display());
        return Ok(EXIT_FAILURE);
    }
    if !args.files.exists() {
        eprintln!("error: path not found: {}", args.files.display());
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
    let variant_exists = pkg.has_variant(&variant_lc);

    // Resolve the effective main up front so the prompts can describe what
    // will actually happen.
    let effective_main = if args.files.is_dir() {
        match &args.main {
            Some(main) => main.clone(),
            None => {
                eprintln!("error: --main is required when --files is a directory");
                return Ok(EXIT_FAILURE);
            }
        }
    } else {
        match &args.main {
            Some(main) => main.clone(),
            None => match args.files.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => {
                    eprintln!(
                        "error: file name is not valid UTF-8: {}",
                        args.files.display()
                    );
                    return Ok(EXIT_FAILURE);
                }
            },
        }
    };

    let main_would_change = pkg.would_main_change(&variant_lc, &effective_main);

    if !args.yes {
        let message = if variant_exists && main_would_change {
            Some(format!(
                "Variant '{variant_lc}' exists and main would change. Replace?"
            ))
        } else if variant_exists {
            Some(format!(
                "Variant '{variant_lc}' exists and will be replaced. Continue?"
            ))
        } else if main_would_change {
            Some(format!("main[{variant_lc}] would change. Continue?"))
        } else {
            None
        };

        if let Some(message) = message {
            if !confirm(&message, true) {
                println!("Aborted.");
                return Ok(EXIT_FAILURE);
            }
        }
    }

    if let Err(e) = pkg.add_variant(&variant_lc, &args.files, args.main.as_deref()) {
        eprintln!("error: {e}");
        return Ok(EXIT_FAILURE);
    }

    if let Err(e) = pkg.save(&args.package) {
        eprintln!("error: failed to save package: {e}");
        return Ok(EXIT_FAILURE);
    }

    if variant_exists {
        println!(
            "Replaced variant '{variant_lc}' in {}",
            args.package.display()
        );
    } else {
        println!("Added variant '{variant_lc}' to {}", args.package.display());
    }
    Ok(EXIT_SUCCESS)
}
