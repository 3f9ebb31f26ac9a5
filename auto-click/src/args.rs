use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Args),
    Help,
    Version,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub config_path: Option<PathBuf>,
    /// Overrides `template_directory` from the config file
    pub template_dir: Option<PathBuf>,
    /// Stop after this many iterations; `None` runs until Ctrl-C
    pub iterations: Option<u64>,
    pub debug_mode: bool,
}

impl Args {
    pub fn parse() -> Result<Command, String> {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse flags, without the program name
    pub fn parse_from<I, S>(args: I) -> Result<Command, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Args::default();

        for arg in args {
            let arg = arg.as_ref();
            if arg == "--help" || arg == "-h" {
                return Ok(Command::Help);
            } else if arg == "--version" || arg == "-v" {
                return Ok(Command::Version);
            } else if arg == "--debug" {
                parsed.debug_mode = true;
            } else if let Some(path) = arg.strip_prefix("--config=") {
                parsed.config_path = Some(non_empty(path, "--config")?);
            } else if let Some(dir) = arg.strip_prefix("--templates=") {
                parsed.template_dir = Some(non_empty(dir, "--templates")?);
            } else if let Some(val) = arg.strip_prefix("--iterations=") {
                let count = val
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid iterations value: {val}"))?;
                parsed.iterations = (count > 0).then_some(count);
            } else {
                return Err(format!("Unknown argument: {arg}"));
            }
        }

        Ok(Command::Run(parsed))
    }
}

fn non_empty(value: &str, flag: &str) -> Result<PathBuf, String> {
    if value.is_empty() {
        Err(format!("{flag} needs a path"))
    } else {
        Ok(PathBuf::from(value))
    }
}

pub fn print_help() {
    println!("🖱️ Auto Click - find reference images on screen and click them");
    println!();
    println!("USAGE:");
    println!("    auto-click [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    --config=PATH       Read settings from PATH (default: ./auto-click.toml if present)");
    println!("    --templates=DIR     Directory of reference images (overrides the config file)");
    println!("    --iterations=N      Stop after N iterations (0 = run until Ctrl-C)");
    println!("    --debug             Enable debug logging (RUST_LOG still takes precedence)");
    println!("    --help, -h          Show this help message");
    println!("    --version, -v       Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    auto-click --templates=./buttons");
    println!("    auto-click --config=game.toml --debug");
    println!("    auto-click --iterations=10");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Args {
        match Args::parse_from(args) {
            Ok(Command::Run(args)) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_no_flags_runs_with_defaults() {
        assert_eq!(run(&[]), Args::default());
    }

    #[test]
    fn test_all_flags_are_parsed() {
        let args = run(&["--config=cfg/game.toml", "--templates=refs", "--iterations=25", "--debug"]);
        assert_eq!(args.config_path, Some(PathBuf::from("cfg/game.toml")));
        assert_eq!(args.template_dir, Some(PathBuf::from("refs")));
        assert_eq!(args.iterations, Some(25));
        assert!(args.debug_mode);
    }

    #[test]
    fn test_zero_iterations_means_unbounded() {
        assert_eq!(run(&["--iterations=0"]).iterations, None);
    }

    #[test]
    fn test_help_and_version_short_circuit() {
        assert_eq!(Args::parse_from(["--debug", "-h", "--bogus"]), Ok(Command::Help));
        assert_eq!(Args::parse_from(["--version"]), Ok(Command::Version));
    }

    #[test]
    fn test_bad_input_is_reported() {
        assert!(Args::parse_from(["--iterations=lots"]).is_err());
        assert!(Args::parse_from(["--iterations=-1"]).is_err());
        assert!(Args::parse_from(["--templates="]).is_err());
        assert_eq!(
            Args::parse_from(["--gui"]),
            Err("Unknown argument: --gui".to_string())
        );
    }
}
