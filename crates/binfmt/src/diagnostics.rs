use crate::Error;
use std::io;
use termcolor::{Color, ColorSpec, WriteColor};

/// Where human-readable parse failures are written.
///
/// Diagnostics are advisory: the [`Error`] returned from a parse is the
/// authoritative signal, and a disabled sink changes nothing about it.
#[derive(Default)]
pub struct Diagnostics<'w> {
    sink: Option<&'w mut dyn WriteColor>,
}

impl<'w> Diagnostics<'w> {
    /// Reports into `sink`.
    pub fn new(sink: &'w mut dyn WriteColor) -> Diagnostics<'w> {
        Diagnostics { sink: Some(sink) }
    }

    /// Reports nothing.
    pub fn disabled() -> Diagnostics<'w> {
        Diagnostics { sink: None }
    }

    /// Whether reports are written anywhere.
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Writes a description of `err` to the sink.
    ///
    /// Failures to write are ignored.
    pub fn report(&mut self, err: &Error) {
        if let Some(sink) = self.sink.as_deref_mut() {
            if let Err(e) = write_report(sink, err) {
                log::debug!("failed to write diagnostic: {e}");
            }
        }
    }
}

fn write_report(sink: &mut dyn WriteColor, err: &Error) -> io::Result<()> {
    sink.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(sink, "error")?;
    sink.reset()?;
    writeln!(sink, ": {}", err.message())?;
    sink.set_color(ColorSpec::new().set_fg(Some(Color::Blue)))?;
    write!(sink, "  -->")?;
    sink.reset()?;
    writeln!(sink, " offset 0x{:x}", err.offset())?;
    if let Some(selector) = err.selector() {
        writeln!(sink, "  note: {selector}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorCode, Selector};
    use termcolor::NoColor;

    #[test]
    fn report() {
        let mut out = NoColor::new(Vec::new());
        let mut diagnostics = Diagnostics::new(&mut out);
        assert!(diagnostics.is_enabled());
        diagnostics.report(
            &Error::new(ErrorCode::IllegalSectionId, 0x12).with_selector(Selector::SectionId(0x2a)),
        );
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(
            text,
            "error: illegal section id\n  --> offset 0x12\n  note: section id 0x2a\n"
        );
    }

    #[test]
    fn disabled() {
        let mut diagnostics = Diagnostics::disabled();
        assert!(!diagnostics.is_enabled());
        diagnostics.report(&Error::new(ErrorCode::NoEnoughSpace, 0));
    }
}
