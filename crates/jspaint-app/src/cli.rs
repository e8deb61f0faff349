use std::ffi::OsString;

use clap::{ArgAction, Parser};

/// JS Paint: the classic paint program, on the desktop.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "jspaint", version, about, disable_version_flag = true)]
pub struct Args {
    /// Image to open.
    pub file_path: Option<String>,

    /// Print version and exit.
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    /// Passed by the Windows installer on first run. Ignored.
    #[arg(short = 's', long = "squirrel-firstrun", hide = true)]
    pub squirrel_firstrun: bool,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}

/// Interpret the argument list a secondary launch forwarded.
///
/// `args` excludes the program name. Anything clap would reject (or a
/// `--help` that would normally print and exit) is treated as "no file":
/// a second launch only ever raises the window.
pub fn parse_forwarded(args: &[String]) -> Option<String> {
    let argv = std::iter::once(OsString::from("jspaint")).chain(args.iter().map(OsString::from));
    match Args::try_parse_from(argv) {
        Ok(parsed) => parsed.file_path.filter(|p| !p.is_empty()),
        Err(e) => {
            tracing::debug!("Ignoring unparseable forwarded arguments: {:?}", e.kind());
            None
        }
    }
}
