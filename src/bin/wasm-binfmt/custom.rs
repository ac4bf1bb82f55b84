use anyhow::{bail, Context, Result};
use binfmt::{parse_module, CustomSection, Diagnostics, NameSection, Producers};
use termcolor::WriteColor;

/// Show the custom sections of a WebAssembly binary.
///
/// Each custom section is listed with the offset and size of its payload.
/// The contents of `name` and `producers` sections are decoded and printed
/// as well.
#[derive(clap::Parser)]
pub struct Opts {
    #[clap(flatten)]
    features: wasm_binfmt::FeaturesArg,

    #[clap(flatten)]
    io: wasm_binfmt::InputOutput,

    /// Only show custom sections with this name.
    #[clap(long)]
    name: Option<String>,
}

impl Opts {
    pub fn general_opts(&self) -> &wasm_binfmt::GeneralOpts {
        self.io.general_opts()
    }

    pub fn run(&self) -> Result<()> {
        let wasm = self.io.parse_input_wasm()?;
        let config = self
            .features
            .config()?
            .module_name(self.io.input().module_name());
        let mut stderr = self.general_opts().stderr();
        let module = match parse_module(&wasm, &config, &mut Diagnostics::new(&mut stderr)) {
            Ok(module) => module,
            Err(_) => bail!("failed to parse module `{}`", config.name()),
        };

        let mut output = self.io.output_writer()?;
        for section in module.custom_sections() {
            if let Some(name) = &self.name {
                if section.name_bytes() != name.as_bytes() {
                    continue;
                }
            }
            write_section(&mut output, section)?;
        }
        Ok(())
    }
}

fn write_section(output: &mut dyn WriteColor, section: &CustomSection<'_>) -> Result<()> {
    writeln!(
        output,
        "{:?} at 0x{:x}, {} bytes",
        String::from_utf8_lossy(section.name_bytes()),
        section.data_offset(),
        section.data().len()
    )?;
    match section.name() {
        Some("name") => {
            let names = NameSection::parse(section.data(), section.data_offset())
                .context("failed to decode name section")?;
            if let Some(name) = names.module_name() {
                writeln!(output, "  module name: {name}")?;
            }
            for naming in names.function_names() {
                writeln!(output, "  function {}: {}", naming.index, naming.name)?;
            }
            for id in names.skipped_subsections() {
                writeln!(output, "  skipped subsection {id}")?;
            }
        }
        Some("producers") => {
            let producers = Producers::parse(section.data(), section.data_offset())
                .context("failed to decode producers section")?;
            for (field, values) in producers.iter() {
                let values = values
                    .iter()
                    .map(|(name, version)| {
                        if version.is_empty() {
                            name.clone()
                        } else {
                            format!("{name} {version}")
                        }
                    })
                    .collect::<Vec<_>>();
                writeln!(output, "  {field}: {}", values.join(", "))?;
            }
        }
        _ => {}
    }
    Ok(())
}
