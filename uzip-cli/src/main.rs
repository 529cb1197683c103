use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use uzip_core::prompt::ConsolePrompt;
use uzip_core::workflow::{self, CompressRequest, Config, RestoreRequest};

const AFTER_HELP: &str = "\
Commands also accept their legacy spellings: -compress / -c and -restore / -r.

Examples:
  uzip -c \"MyFolder\" backup 2g
  uzip -r backup";

#[derive(Parser)]
#[command(
    name = "uzip",
    version,
    about = "Split-compress a folder into numbered 7-Zip volumes and restore it later",
    after_help = AFTER_HELP,
    disable_help_subcommand = true
)]
struct Cli {
    /// 7-Zip executable (relative paths resolve against the working directory)
    #[arg(long, global = true, value_name = "PATH")]
    engine: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Compress <INPUT> into <OUTPUT>/<name>.7z.001, .002, ... and write index.json
    Compress {
        /// Folder to compress
        input: Option<String>,
        /// Output folder for the volumes
        output: Option<String>,
        /// Volume size, e.g. 500m, 2g, 100k
        split_size: Option<String>,
        #[arg(hide = true, num_args = 1.., trailing_var_arg = true)]
        _extra: Vec<String>,
    },
    /// Extract the archive recorded in <FOLDER>/index.json
    Restore {
        /// Folder holding index.json and the volumes
        folder: Option<String>,
        #[arg(hide = true, num_args = 1.., trailing_var_arg = true)]
        _extra: Vec<String>,
    },
}

enum Preflight {
    Help,
    Version,
    Run(Vec<OsString>),
}

/// Help and version win wherever they appear, before any command is looked at.
fn preflight(args: &[OsString]) -> Preflight {
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        return Preflight::Help;
    }
    if args.iter().any(|a| a == "--version" || a == "-v") {
        return Preflight::Version;
    }
    Preflight::Run(normalize_command(args))
}

/// Map the command token's legacy spellings onto clap subcommand names.
fn normalize_command(args: &[OsString]) -> Vec<OsString> {
    let mut out = args.to_vec();
    let mut i = 0;
    while i < out.len() {
        let tok = out[i].to_string_lossy().into_owned();
        if tok == "--engine" {
            i += 2;
            continue;
        }
        if tok.starts_with("--engine=") {
            i += 1;
            continue;
        }
        let name = match tok.as_str() {
            "-compress" | "--compress" | "-c" => Some("compress"),
            "-restore" | "--restore" | "-r" => Some("restore"),
            _ => None,
        };
        if let Some(name) = name {
            out[i] = OsString::from(name);
        }
        break;
    }
    out
}

/// One line for any parse failure clap reports.
fn parse_error_message(e: &clap::Error) -> String {
    match e.kind() {
        ErrorKind::InvalidSubcommand
        | ErrorKind::UnknownArgument
        | ErrorKind::MissingSubcommand
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => "Unknown command".to_string(),
        _ => {
            let text = e.to_string();
            let first = text.lines().next().unwrap_or_default();
            first.strip_prefix("error: ").unwrap_or(first).to_string()
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &[OsString]) -> Result<()> {
    let argv = match preflight(args) {
        Preflight::Help => {
            Cli::command().print_help()?;
            println!();
            return Ok(());
        }
        Preflight::Version => {
            println!("uzip v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Preflight::Run(argv) => argv,
    };
    let cli = match Cli::try_parse_from(std::iter::once(OsString::from("uzip")).chain(argv)) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(());
        }
        Err(e) => bail!("{}", parse_error_message(&e)),
    };

    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let mut cfg = Config::new(cwd);
    if let Some(engine) = &cli.engine {
        cfg = cfg.with_engine(engine);
    }
    log::debug!("engine: {}", cfg.engine.display());
    let engine = cfg.seven_zip();
    let mut stdout = io::stdout();

    match cli.cmd {
        Cmd::Compress { input, output, split_size, .. } => {
            let req = CompressRequest::parse(
                &cfg,
                input.as_deref(),
                output.as_deref(),
                split_size.as_deref(),
            )?;
            workflow::compress(&cfg, &engine, &req, &mut stdout)?;
        }
        Cmd::Restore { folder, .. } => {
            let req = RestoreRequest::parse(&cfg, folder.as_deref())?;
            let mut prompt = ConsolePrompt::stdio();
            workflow::restore(&cfg, &engine, &mut prompt, &req, &mut stdout)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(v: &[&str]) -> Vec<OsString> {
        v.iter().map(OsString::from).collect()
    }

    #[test]
    fn help_and_version_are_found_anywhere() {
        assert!(matches!(preflight(&[]), Preflight::Help));
        assert!(matches!(preflight(&os(&["-c", "a", "b", "-h"])), Preflight::Help));
        assert!(matches!(preflight(&os(&["-r", "x", "--version"])), Preflight::Version));
        // help beats version
        assert!(matches!(preflight(&os(&["-v", "--help"])), Preflight::Help));
    }

    #[test]
    fn legacy_command_spellings_map_to_subcommands() {
        let spellings = [
            ("-compress", "compress"),
            ("-c", "compress"),
            ("-restore", "restore"),
            ("-r", "restore"),
        ];
        for (raw, want) in spellings {
            let Preflight::Run(argv) = preflight(&os(&[raw, "x"])) else { panic!("{raw}") };
            assert_eq!(argv, os(&[want, "x"]));
        }
        let Preflight::Run(argv) = preflight(&os(&["--engine", "/bin/7z", "-r", "b"])) else {
            panic!()
        };
        assert_eq!(argv, os(&["--engine", "/bin/7z", "restore", "b"]));
        // only the command token is rewritten
        let Preflight::Run(argv) = preflight(&os(&["restore", "-c"])) else { panic!() };
        assert_eq!(argv, os(&["restore", "-c"]));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn positional_arguments_are_optional_for_clap() {
        let cli = Cli::try_parse_from(["uzip", "compress", "MyFolder"]).unwrap();
        match cli.cmd {
            Cmd::Compress { input, output, split_size, .. } => {
                assert_eq!(input.as_deref(), Some("MyFolder"));
                assert!(output.is_none() && split_size.is_none());
            }
            Cmd::Restore { .. } => panic!("wrong command"),
        }
        assert!(Cli::try_parse_from(["uzip", "explode"]).is_err());
    }

    #[test]
    fn trailing_arguments_are_ignored() {
        let cli = Cli::try_parse_from(["uzip", "restore", "backup", "extra", "more"]).unwrap();
        match cli.cmd {
            Cmd::Restore { folder, .. } => assert_eq!(folder.as_deref(), Some("backup")),
            Cmd::Compress { .. } => panic!("wrong command"),
        }
        let cli = Cli::try_parse_from(["uzip", "compress", "a", "b", "2g", "c"]).unwrap();
        assert!(matches!(cli.cmd, Cmd::Compress { split_size: Some(s), .. } if s == "2g"));
    }

    #[test]
    fn parse_failures_become_one_line() {
        for argv in [&["uzip", "-explode", "x"][..], &["uzip", "explode"], &["uzip"]] {
            let Err(e) = Cli::try_parse_from(argv) else { panic!("{argv:?} parsed") };
            assert_eq!(parse_error_message(&e), "Unknown command", "{argv:?}");
        }
        let Err(e) = Cli::try_parse_from(["uzip", "restore", "--engine"]) else { panic!() };
        let msg = parse_error_message(&e);
        assert!(!msg.contains('\n') && !msg.starts_with("error:"), "{msg}");
        assert!(msg.contains("--engine"), "{msg}");
    }
}
