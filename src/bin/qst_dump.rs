use anyhow::{bail, format_err, Context, Result};
use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgMatches, Command};
use dialoguer::Confirm;
use encoding::all::encodings;
use encoding::types::Encoding;
use indoc::indoc;
use log::Level;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

use zqst::{ParserSettings, QstParser, QuestDocument, SectionEntry};

#[derive(Copy, Clone, PartialOrd, PartialEq, Eq, Debug)]
pub enum QstOutputFormat {
    Json,
    JsonLines,
    Summary,
}

struct QstDump {
    parser_settings: ParserSettings,
    input: PathBuf,
    output_format: QstOutputFormat,
    sections: Option<Vec<String>>,
    output: Box<dyn Write>,
    verbosity_level: Option<Level>,
}

/// Tries to write a line to a given target, aborts program if fails.
macro_rules! try_writeln {
    ($($arg:tt)*) => (
        match writeln!($($arg)*) {
            Ok(_) => {},
            Err(e) => {
                eprintln!("{}", &e);
                exit(1)
            }
        }
    );
}

impl QstDump {
    pub fn from_cli_matches(matches: &ArgMatches) -> Result<Self> {
        let input = matches
            .get_one::<PathBuf>("INPUT")
            .ok_or_else(|| format_err!("missing input"))?
            .clone();

        let output_format = if matches.get_flag("summary") {
            QstOutputFormat::Summary
        } else {
            match matches.get_one::<String>("output-format").map(String::as_str) {
                Some("jsonl") => QstOutputFormat::JsonLines,
                _ => QstOutputFormat::Json,
            }
        };

        let sections = matches
            .get_many::<String>("sections")
            .map(|values| values.map(|s| s.trim().to_string()).collect());

        let verbosity_level = match matches.get_count("verbose") {
            0 => None,
            1 => Some(Level::Info),
            2 => Some(Level::Debug),
            3 => Some(Level::Trace),
            _ => {
                eprintln!("using more than  -vvv does not affect verbosity level");
                Some(Level::Trace)
            }
        };

        let codec_name = matches
            .get_one::<String>("ansi-codec")
            .ok_or_else(|| format_err!("ansi codec has a default value"))?;
        let ansi_codec = *encodings()
            .iter()
            .find(|c| c.name() == codec_name)
            .ok_or_else(|| format_err!("unknown codec `{}`", codec_name))?;

        let output: Box<dyn Write> = match matches.get_one::<PathBuf>("output-target") {
            Some(path) => Box::new(
                Self::create_output_file(path, !matches.get_flag("no-confirm-overwrite"))
                    .with_context(|| format!("An error occurred while creating output file at `{}`", path.display()))?,
            ),
            None => Box::new(io::stdout()),
        };

        Ok(QstDump {
            parser_settings: ParserSettings::new()
                .ansi_codec(ansi_codec)
                .resync(!matches.get_flag("no-resync")),
            input,
            output_format,
            sections,
            output,
            verbosity_level,
        })
    }

    /// Main entry point for `QstDump`
    pub fn run(&mut self) -> Result<()> {
        self.try_to_initialize_logging();

        let parser = QstParser::from_path(&self.input)?.with_configuration(self.parser_settings.clone());
        let document = parser
            .parse()
            .with_context(|| format!("Failed to decode {}", self.input.display()))?;

        match self.output_format {
            QstOutputFormat::Json => self.dump_json(&document)?,
            QstOutputFormat::JsonLines => self.dump_json_lines(&document)?,
            QstOutputFormat::Summary => self.dump_summary(&document),
        }

        Ok(())
    }

    fn selected<'d>(&self, document: &'d QuestDocument) -> impl Iterator<Item = &'d SectionEntry> {
        let sections = self.sections.clone();
        document.entries().iter().filter(move |entry| match &sections {
            Some(wanted) => wanted.iter().any(|s| s.eq_ignore_ascii_case(&entry.key())),
            None => true,
        })
    }

    fn dump_json(&mut self, document: &QuestDocument) -> Result<()> {
        let mut map = serde_json::Map::new();
        for entry in self.selected(document) {
            map.insert(entry.key(), serde_json::to_value(entry)?);
        }
        let s = serde_json::to_string_pretty(&map)?;
        try_writeln!(self.output, "{}", s);
        Ok(())
    }

    fn dump_json_lines(&mut self, document: &QuestDocument) -> Result<()> {
        let mut lines = Vec::new();
        for entry in self.selected(document) {
            let mut line = serde_json::Map::new();
            line.insert(entry.key(), serde_json::to_value(entry)?);
            lines.push(serde_json::to_string(&line)?);
        }
        for line in lines {
            try_writeln!(self.output, "{}", line);
        }
        Ok(())
    }

    fn dump_summary(&mut self, document: &QuestDocument) {
        try_writeln!(self.output, "{}", document.preamble());
        let entries: Vec<&SectionEntry> = self.selected(document).collect();
        for entry in entries {
            let status = match (entry.data.is_some(), entry.errors.len()) {
                (true, 0) => "ok".to_string(),
                (true, n) => format!("ok, {} diagnostics", n),
                (false, n) => format!("failed, {} diagnostics", n),
            };
            try_writeln!(
                self.output,
                "{:<4} revision {:>3} {:>10} bytes  {}",
                entry.key(),
                entry.header.section_revision,
                entry.header.length,
                status
            );
            for diagnostic in &entry.errors {
                try_writeln!(self.output, "     - {}", diagnostic);
            }
        }
    }

    /// If `prompt` is passed, will display a confirmation prompt before overwriting files.
    fn create_output_file(path: impl AsRef<Path>, prompt: bool) -> Result<File> {
        let p = path.as_ref();

        if p.is_dir() {
            bail!("There is a directory at {}, refusing to overwrite", p.display());
        }

        if p.exists() {
            if prompt {
                match Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to override output file at {}",
                        p.display()
                    ))
                    .default(false)
                    .interact()
                {
                    Ok(true) => Ok(File::create(p)?),
                    Ok(false) => bail!("Cancelled"),
                    Err(e) => bail!("Failed to write confirmation prompt to term caused by\n{}", e),
                }
            } else {
                Ok(File::create(p)?)
            }
        } else {
            // Ok to assume p is not an existing directory
            match p.parent() {
                Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
                    fs::create_dir_all(parent)?;
                    Ok(File::create(p)?)
                }
                Some(_) => Ok(File::create(p)?),
                None => bail!("Output file cannot be root."),
            }
        }
    }

    fn try_to_initialize_logging(&self) {
        if let Some(level) = self.verbosity_level {
            match simplelog::TermLogger::init(
                level.to_level_filter(),
                simplelog::Config::default(),
                simplelog::TerminalMode::Stderr,
                simplelog::ColorChoice::Auto,
            ) {
                Ok(_) => {}
                Err(e) => eprintln!("Failed to initialize logging: {:?}", e),
            };
        }
    }
}

fn main() -> Result<()> {
    let ascii_compatible_codecs: Vec<&'static str> = encodings()
        .iter()
        .filter(|&e| e.raw_decoder().is_ascii_compatible())
        .map(|e| e.name())
        .collect();

    let matches = Command::new("QST Parser")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility to decode extracted ZC quest buffers")
        .arg(
            Arg::new("INPUT")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output-format")
                .short('o')
                .long("format")
                .value_parser(["json", "jsonl"])
                .default_value("json")
                .help("Sets the output format")
                .long_help(indoc!(
                    r#"Sets the output format:
                     "json"  - prints the whole document as one JSON object.
                     "jsonl" - prints one JSON object per section, one per line.
                    "#
                )),
        )
        .arg(
            Arg::new("sections")
                .long("sections")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .help("Only print the given sections, e.g. `--sections HDR,MAP`."),
        )
        .arg(
            Arg::new("summary")
                .long("summary")
                .action(ArgAction::SetTrue)
                .help("Print one line per section with its diagnostics instead of the data."),
        )
        .arg(
            Arg::new("output-target")
                .long("output")
                .short('f')
                .value_parser(clap::value_parser!(PathBuf))
                .help(indoc!(
                    "Writes output to the file specified instead of stdout, errors will still be printed to stderr.
                     Will ask for confirmation before overwriting files, to allow overwriting, pass `--no-confirm-overwrite`
                     Will create parent directories if needed."
                )),
        )
        .arg(
            Arg::new("no-confirm-overwrite")
                .long("no-confirm-overwrite")
                .action(ArgAction::SetTrue)
                .help("When set, will not ask for confirmation before overwriting files, useful for automation"),
        )
        .arg(
            Arg::new("no-resync")
                .long("no-resync")
                .action(ArgAction::SetTrue)
                .help("When set, a malformed section header aborts the decode instead of scanning for the next section."),
        )
        .arg(
            Arg::new("ansi-codec")
                .long("ansi-codec")
                .value_parser(PossibleValuesParser::new(ascii_compatible_codecs))
                .default_value(encoding::all::WINDOWS_1252.name())
                .help("When set, controls the codec of fixed width text fields."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help(indoc!(
                    "Sets debug prints level for the application:
                        -v   - info
                        -vv  - debug
                        -vvv - trace
                    NOTE: trace output is only available in debug builds, as it is extremely verbose."
                )),
        )
        .get_matches();

    let mut app = QstDump::from_cli_matches(&matches)?;
    app.run()
}
