use anyhow::Result;
use std::io::Write;
use termcolor::{Color, ColorSpec, WriteColor};

/// List the section ids a set of features understands.
///
/// Prints the section table the parser would dispatch with, one id per line
/// along with the section name and the feature that registered it. Fails if
/// the selected features leave a gap in the ids.
#[derive(clap::Parser)]
pub struct Opts {
    #[clap(flatten)]
    features: wasm_binfmt::FeaturesArg,

    #[clap(flatten)]
    output: wasm_binfmt::OutputArg,

    #[clap(flatten)]
    general: wasm_binfmt::GeneralOpts,
}

impl Opts {
    pub fn general_opts(&self) -> &wasm_binfmt::GeneralOpts {
        &self.general
    }

    pub fn run(&self) -> Result<()> {
        let config = self.features.config()?;
        let features = config.features().features();
        let mut output = self.output.output_writer(&self.general)?;

        write!(output, "{:>2} ", binfmt::CUSTOM_SECTION_ID)?;
        output.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(output, "{:<10}", "custom")?;
        output.reset()?;
        writeln!(output, "(by name)")?;

        for ty in config.table().iter() {
            let feature = features
                .iter()
                .find(|f| f.sections.iter().any(|s| s.id == ty.id))
                .map_or("", |f| f.name);
            write!(output, "{:>2} ", ty.id)?;
            output.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(output, "{:<10}", ty.name)?;
            output.reset()?;
            writeln!(output, "{feature}")?;
        }
        Ok(())
    }
}
