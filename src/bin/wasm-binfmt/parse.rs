use anyhow::{bail, Result};
use binfmt::{parse_module, Diagnostics, ModuleStorage, SectionContents};
use std::io::Write;
use termcolor::{Color, ColorSpec, WriteColor};

/// Parse a WebAssembly binary and list the sections it contains.
///
/// Every section is handed to the handler of the feature which registered
/// its id, and custom sections with a known name are checked by their
/// handler. The process exits with 0 and prints one line per section on
/// success, or prints a diagnostic on stderr and exits nonzero on failure.
///
/// Examples:
///
/// ```sh
/// # List the sections of `foo.wasm`.
/// $ wasm-binfmt parse foo.wasm
///
/// # Reject anything beyond the 1.0 binary format.
/// $ wasm-binfmt parse --features=-all,mvp foo.wasm
/// ```
#[derive(clap::Parser)]
pub struct Opts {
    #[clap(flatten)]
    features: wasm_binfmt::FeaturesArg,

    #[clap(flatten)]
    io: wasm_binfmt::InputOutput,
}

struct Line {
    start: usize,
    end: usize,
    id: u8,
    name: &'static str,
    detail: String,
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
        log::info!(
            "parsed {} sections and {} custom sections",
            module.sections().count(),
            module.custom_sections().len()
        );

        let mut output = self.io.output_writer()?;
        writeln!(
            output,
            "module `{}`: version {}, {} bytes",
            module.module_name(),
            module.version(),
            module.module_span().len()
        )?;
        for line in lines(&module) {
            write!(output, "{:>2} ", line.id)?;
            output.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(output, "{:<10}", line.name)?;
            output.reset()?;
            let range = format!("0x{:x}..0x{:x}", line.start, line.end);
            writeln!(output, "{range:<14}{}", line.detail)?;
        }
        Ok(())
    }
}

/// One line per section in the order they appeared in the module.
fn lines(module: &ModuleStorage<'_>) -> Vec<Line> {
    let mut lines = module
        .sections()
        .map(|section| Line {
            start: section.range.start,
            end: section.range.end,
            id: section.id,
            name: section.name,
            detail: match &section.contents {
                SectionContents::Items { count, .. } => format!("count {count}"),
                SectionContents::Start { func } => format!("func {func}"),
                SectionContents::DataCount { count } => format!("count {count}"),
                SectionContents::Code { bodies } => format!("bodies {}", bodies.len()),
            },
        })
        .collect::<Vec<_>>();
    lines.extend(module.custom_sections().iter().map(|custom| Line {
        start: custom.range().start,
        end: custom.range().end,
        id: binfmt::CUSTOM_SECTION_ID,
        name: "custom",
        detail: format!(
            "{:?} payload {}",
            String::from_utf8_lossy(custom.name_bytes()),
            custom.data().len()
        ),
    }));
    lines.sort_by_key(|line| line.start);
    lines
}
