use anyhow::Result;
use clap::Parser;
use std::io;
use std::process::ExitCode;

macro_rules! subcommands {
    ($(
        $(#[$attr:meta])*
        ($name:ident, $string:tt)
    )*) => {
        $(
            #[cfg(feature = $string)]
            mod $name;
        )*

        #[derive(Parser)]
        #[clap(version = wasm_binfmt::version())]
        #[allow(non_camel_case_types)]
        enum WasmBinfmt {
            $(
                #[cfg(feature = $string)]
                $(#[$attr])*
                $name($name::Opts),
            )*
        }

        impl WasmBinfmt {
            fn run(self) -> Result<()> {
                match self {
                    $(
                        #[cfg(feature = $string)]
                        Self::$name(opts) => opts.run(),
                    )*
                }
            }

            fn general_opts(&self) -> &wasm_binfmt::GeneralOpts {
                match *self {
                    $(
                        #[cfg(feature = $string)]
                        Self::$name(ref opts) => opts.general_opts(),
                    )*
                }
            }
        }
    }
}

subcommands! {
    (parse, "parse")
    (sections, "sections")
    (custom, "custom")
}

fn main() -> ExitCode {
    let args = <WasmBinfmt as Parser>::parse();
    args.general_opts().init_logger();
    let err = match args.run() {
        Ok(()) => return ExitCode::SUCCESS,
        Err(e) => e,
    };
    // If an error happened and it's connected to something like `EPIPE` then
    // don't print out an error and instead just silently exit with a failure.
    if let Some(io) = err.downcast_ref::<io::Error>() {
        if io.kind() == io::ErrorKind::BrokenPipe {
            return ExitCode::FAILURE;
        }
    }
    eprintln!("Error: {err:?}");
    ExitCode::FAILURE
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    WasmBinfmt::command().debug_assert()
}
