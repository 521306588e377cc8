use super::super::args::SignArgs;
use crate::exit_codes::EXIT_FAILURE;

pub fn run(_args: SignArgs) -> anyhow::Result<i32> {
    eprintln!("error: sign is not implemented in v0.1");
    Ok(EXIT_FAILURE)
}
