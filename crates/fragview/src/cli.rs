use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "fragview",
    author,
    version,
    about = "Live fragment-shader preview",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Fragment shader file to preview; edits are picked up while running.
    #[arg(value_name = "SHADER")]
    pub shader: PathBuf,

    /// Preview window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_dimensions, default_value = "800x600")]
    pub size: (u32, u32),

    /// Quiet period after the last edit before a recompile fires.
    #[arg(long, value_name = "MS", env = "FRAGVIEW_DEBOUNCE_MS", default_value_t = 500)]
    pub debounce_ms: u64,

    /// Coalescing window applied to filesystem change notifications.
    #[arg(long, value_name = "MS", default_value_t = 100)]
    pub watch_ms: u64,

    /// Open a second, smaller window previewing another shader file.
    #[arg(long, value_name = "FILE")]
    pub peep: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in `{value}`"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in `{value}`"))?;
    if width == 0 || height == 0 {
        return Err(format!("dimensions must be non-zero in `{value}`"));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dimensions() {
        assert_eq!(parse_dimensions("800x600"), Ok((800, 600)));
        assert_eq!(parse_dimensions("1920X1080"), Ok((1920, 1080)));
        assert_eq!(parse_dimensions(" 640 x 480 "), Ok((640, 480)));
    }

    #[test]
    fn rejects_malformed_dimensions() {
        assert!(parse_dimensions("800").is_err());
        assert!(parse_dimensions("0x600").is_err());
        assert!(parse_dimensions("800xtall").is_err());
    }

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["fragview", "demo.frag"]);
        assert_eq!(cli.shader, PathBuf::from("demo.frag"));
        assert_eq!(cli.size, (800, 600));
        assert_eq!(cli.debounce_ms, 500);
        assert_eq!(cli.watch_ms, 100);
        assert!(cli.peep.is_none());
    }

    #[test]
    fn cli_parses_peep_file() {
        let cli = Cli::parse_from(["fragview", "demo.frag", "--peep", "sub.frag"]);
        assert_eq!(cli.peep, Some(PathBuf::from("sub.frag")));
    }
}
