use super::args::{Cli, Command};

pub mod add;
pub mod create;
pub mod extract;
pub mod publish;
pub mod remove;
pub mod sign;
pub mod verify;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Create(args) => create::run(args),
        Command::Add(args) => add::run(args),
        Command::Remove(args) => remove::run(args),
        Command::Extract(args) => extract::run(args),
        Command::Verify(args) => verify::run(args),
        Command::Sign(args) => sign::run(args),
        Command::Publish(args) => publish::run(args),
    }
}

/// Interactive yes/no prompt on stdout/stdin. Empty input picks the
/// default; anything but `y`/`yes` declines.
pub(crate) fn confirm(prompt: &str, default_yes: bool) -> bool {
    use std::io::Write;

    let suffix = if default_yes { "[Y/n]" } else { "[y/N]" };
    print!("{prompt} {suffix} ");
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    match line.trim().to_lowercase().as_str() {
        "" => default_yes,
        "y" | "yes" => true,
        _ => false,
    }
}
