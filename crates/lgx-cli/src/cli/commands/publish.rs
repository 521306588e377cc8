use super::super::args::PublishArgs;
use crate::exit_codes::EXIT_SUCCESS;

pub fn run(_args: PublishArgs) -> anyhow::Result<i32> {
    println!("Publish: no-op in v0.1");
    Ok(EXIT_SUCCESS)
}
