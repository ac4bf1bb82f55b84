//! Shared support for the `wasm-binfmt` command line tool.

use anyhow::{anyhow, bail, Context, Result};
use binfmt::{Config, WasmFeatures, FEATURES};
use std::fs::File;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use termcolor::{ColorChoice, NoColor, StandardStream, WriteColor};

/// Options accepted by every subcommand.
#[derive(clap::Parser)]
pub struct GeneralOpts {
    /// Use verbose output (-v info, -vv debug, -vvv trace).
    #[clap(long = "verbose", short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration over whether terminal colors are used in output.
    ///
    /// Supports one of `auto|never|always|always-ansi`. The default is to
    /// detect what to do based on the terminal environment, for example by
    /// using `isatty`.
    #[clap(long = "color", default_value = "auto")]
    pub color: ColorChoice,
}

impl GeneralOpts {
    /// Initializes the logger based on the verbosity level.
    pub fn init_logger(&self) {
        let default = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
            .format_target(false)
            .init();
    }

    /// The color choice to use for a stream, turning `auto` into `never` when
    /// the stream is not a terminal.
    pub fn color_for(&self, is_terminal: bool) -> ColorChoice {
        match self.color {
            ColorChoice::Auto if !is_terminal => ColorChoice::Never,
            choice => choice,
        }
    }

    /// A colored handle to stderr, used for diagnostics.
    pub fn stderr(&self) -> StandardStream {
        StandardStream::stderr(self.color_for(std::io::stderr().is_terminal()))
    }
}

/// The module a subcommand reads.
#[derive(clap::Parser)]
pub struct InputArg {
    /// Input file to process.
    ///
    /// If not provided or if this is `-` then stdin is read entirely and
    /// processed. Note that for most subcommands this input can either be a
    /// binary `*.wasm` file or a textual format `*.wat` file.
    input: Option<PathBuf>,
}

impl InputArg {
    /// Reads the input and returns the binary module it contains.
    ///
    /// Text input is converted to the binary format first; binary input is
    /// passed through untouched, even when it is malformed.
    pub fn parse_wasm(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        match self.path() {
            Some(path) => {
                File::open(path)
                    .with_context(|| format!("failed to open `{}`", path.display()))?
                    .read_to_end(&mut bytes)
                    .with_context(|| format!("failed to read `{}`", path.display()))?;
            }
            None => {
                std::io::stdin()
                    .read_to_end(&mut bytes)
                    .context("failed to read <stdin>")?;
            }
        }
        let wasm = wat::parse_bytes(&bytes).map_err(|mut e| {
            if let Some(path) = self.path() {
                e.set_path(path);
            }
            anyhow!(e)
        })?;
        Ok(wasm.into_owned())
    }

    /// The input path, or `None` for stdin.
    pub fn path(&self) -> Option<&Path> {
        self.input.as_deref().filter(|p| *p != Path::new("-"))
    }

    /// The name the module is loaded under: the file stem of the input, or
    /// `<stdin>`.
    pub fn module_name(&self) -> String {
        self.path()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "<stdin>".to_string())
    }
}

/// Where a subcommand writes its report.
#[derive(clap::Parser)]
pub struct OutputArg {
    /// Where to place output.
    ///
    /// If not provided then stdout is used.
    #[clap(short, long)]
    output: Option<PathBuf>,
}

impl OutputArg {
    /// Opens the output, colored according to `general` when it is stdout.
    pub fn output_writer(&self, general: &GeneralOpts) -> Result<Box<dyn WriteColor>> {
        match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create `{}`", path.display()))?;
                Ok(Box::new(NoColor::new(file)))
            }
            None => Ok(Box::new(StandardStream::stdout(
                general.color_for(std::io::stdout().is_terminal()),
            ))),
        }
    }
}

/// Input, output and general options bundled together.
#[derive(clap::Parser)]
pub struct InputOutput {
    #[clap(flatten)]
    input: InputArg,

    #[clap(flatten)]
    output: OutputArg,

    #[clap(flatten)]
    general: GeneralOpts,
}

impl InputOutput {
    /// See [`InputArg::parse_wasm`].
    pub fn parse_input_wasm(&self) -> Result<Vec<u8>> {
        self.input.parse_wasm()
    }

    /// See [`OutputArg::output_writer`].
    pub fn output_writer(&self) -> Result<Box<dyn WriteColor>> {
        self.output.output_writer(&self.general)
    }

    /// The input option.
    pub fn input(&self) -> &InputArg {
        &self.input
    }

    /// Options shared by all subcommands.
    pub fn general_opts(&self) -> &GeneralOpts {
        &self.general
    }
}

/// Selects the features a module is parsed with.
#[derive(clap::Parser)]
pub struct FeaturesArg {
    /// Comma-separated list of features to enable.
    ///
    /// The placeholder "all" can be used to enable all features. If a "-"
    /// character is present in front of a feature it will disable that
    /// feature. For example "all,-exceptions" would enable everything but
    /// the tag section. Features are enabled by default.
    #[clap(long, short = 'f', value_parser = parse_features)]
    features: Option<WasmFeatures>,
}

impl FeaturesArg {
    /// The selected features.
    pub fn features(&self) -> WasmFeatures {
        self.features.unwrap_or_default()
    }

    /// Builds a parser configuration for the selected features.
    pub fn config(&self) -> Result<Config<'static>> {
        let features = self.features();
        Config::with_features(features).with_context(|| {
            let names = features
                .features()
                .iter()
                .map(|f| f.name)
                .collect::<Vec<_>>();
            format!(
                "the selected features ({}) do not form a section table",
                names.join(", ")
            )
        })
    }
}

/// Parses a `--features` argument such as `all,-exceptions`.
pub fn parse_features(arg: &str) -> Result<WasmFeatures> {
    let mut ret = WasmFeatures::default();
    for part in arg.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let (enable, part) = match part.strip_prefix('-') {
            Some(part) => (false, part),
            None => (true, part),
        };
        let flags = match part {
            "all" => WasmFeatures::all(),
            name => match WasmFeatures::from_feature_name(name) {
                Some(flags) => flags,
                None => bail!(
                    "unknown feature `{name}`\nValid features: {}",
                    FEATURES
                        .iter()
                        .map(|(_, feature)| feature.name)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            },
        };
        ret.set(flags, enable);
    }
    Ok(ret)
}

/// The version string printed by `--version`.
pub fn version() -> &'static str {
    option_env!("CARGO_VERSION_INFO").unwrap_or(env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features() {
        assert_eq!(parse_features("").unwrap(), WasmFeatures::all());
        assert_eq!(
            parse_features("-all,mvp").unwrap(),
            WasmFeatures::MVP
        );
        assert_eq!(
            parse_features("-exceptions").unwrap(),
            WasmFeatures::MVP | WasmFeatures::BULK_MEMORY
        );
        let err = parse_features("simd").unwrap_err().to_string();
        assert!(err.contains("unknown feature `simd`"), "{err}");
        assert!(err.contains("mvp, bulk-memory, exceptions"), "{err}");
    }

    #[test]
    fn gapped_features_are_rejected() {
        let arg = FeaturesArg {
            features: Some(parse_features("-bulk-memory").unwrap()),
        };
        assert!(arg.config().is_err());
        let arg = FeaturesArg { features: None };
        assert_eq!(arg.config().unwrap().table().len(), 13);
    }
}
