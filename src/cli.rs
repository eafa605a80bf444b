use clap::Parser;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "runtar")]
#[command(version)]
#[command(about = "A Rust untar utility with HTTP URL support", long_about = None)]
#[command(after_help = "Examples:\n  \
  runtar data1.tar -x joe        extract all files except joe from data1.tar\n  \
  runtar -p foo.tar | more       send contents of foo.tar via pipe into more\n  \
  runtar -t src foo.tar          check foo.tar against the files under src\n  \
  runtar -l https://example.com/archive.tar   list files from remote tar")]
pub struct Cli {
    /// Tar file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely with sizes and offsets
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Compare archived files with the files under DIR instead of extracting
    #[arg(short = 't', value_name = "DIR")]
    pub verify_dir: Option<String>,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Most detailed log level to emit
    pub fn log_level(&self) -> Level {
        if self.is_very_quiet() {
            Level::ERROR
        } else if self.is_quiet() {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from(["runtar", "-l", "foo.tar"]).unwrap();
        assert!(cli.list);
        assert_eq!(cli.file, "foo.tar");
        assert!(!cli.is_http_url());
        assert_eq!(cli.log_level(), Level::INFO);

        let cli = Cli::try_parse_from(["runtar", "-t", "src", "foo.tar", "a.txt"]).unwrap();
        assert_eq!(cli.verify_dir.as_deref(), Some("src"));
        assert_eq!(cli.files, ["a.txt"]);
    }

    #[test]
    fn test_quiet_levels() {
        let cli = Cli::try_parse_from(["runtar", "-p", "https://example.com/a.tar"]).unwrap();
        assert!(cli.is_http_url());
        assert_eq!(cli.log_level(), Level::WARN);

        let cli = Cli::try_parse_from(["runtar", "-qq", "a.tar"]).unwrap();
        assert!(cli.is_very_quiet());
        assert_eq!(cli.log_level(), Level::ERROR);
    }
}
