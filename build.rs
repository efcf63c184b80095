use std::fs;
use std::io::Result;
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};
use clap_complete::shells::Shell;

/// Mirror of the runtime CLI surface, kept in sync with `src/cli.rs`.
fn cli() -> Command {
    Command::new("buildprep")
        .about("Fail-fast dependency bootstrap for build pipelines")
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log the commands that would run without executing them"),
        )
        .subcommand(Command::new("run").about("Run the full install sequence"))
        .subcommand(
            Command::new("validate")
                .about("Validate the dependency manifest without installing anything")
                .arg(
                    Arg::new("manifest")
                        .value_name("PATH")
                        .required(false)
                        .help("Path to the manifest (defaults to requirements.txt)"),
                ),
        )
}

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    let Some(out_dir) = std::env::var_os("OUT_DIR").map(PathBuf::from) else {
        return Ok(());
    };

    let cmd = cli();

    // Man page
    let man = clap_mangen::Man::new(cmd.clone());
    let mut buf: Vec<u8> = Vec::new();
    man.render(&mut buf)?;
    fs::write(out_dir.join("buildprep.1"), buf)?;

    // Shell completions
    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
        let mut cmd = cmd.clone();
        clap_complete::generate_to(shell, &mut cmd, "buildprep", &out_dir)?;
    }

    Ok(())
}
