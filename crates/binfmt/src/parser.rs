use crate::{
    BinaryReader, Config, CustomSectionRegistry, Diagnostics, Error, ErrorCode, ModuleStorage,
    Result, SectionReader, SectionTable, Selector,
};

/// The size of the module header: magic number and version.
pub const HEADER_SIZE: usize = 8;

/// The fewest bytes a section header can occupy: one id byte and a
/// one-byte length.
const MIN_SECTION_HEADER_SIZE: usize = 2;

/// The only binary format version this crate parses.
pub const BINFMT_VERSION_1: u32 = 1;

/// Checks the magic number of `data` and returns the version declared in
/// the header.
///
/// The version itself is not checked; picking a parser for it is up to the
/// caller (see [`parse_module`]).
///
/// # Errors
///
/// Fails with [`ErrorCode::IllegalWasmFileFormat`] if `data` is shorter than
/// the header or does not start with `\0asm`.
pub fn validate_header(data: &[u8]) -> Result<u32> {
    if data.len() < HEADER_SIZE {
        return Err(Error::new(ErrorCode::IllegalWasmFileFormat, 0)
            .with_selector(Selector::Length(data.len() as u64))
            .with_message(format!(
                "module is {} bytes, shorter than the {HEADER_SIZE}-byte header",
                data.len()
            )));
    }
    BinaryReader::new(data, 0).read_header_version()
}

/// Parses version 1 modules with a fixed set of features.
///
/// A `Parser` only holds read-only configuration, so one parser can be used
/// from many threads at once; every parse gets its own [`ModuleStorage`].
#[derive(Debug, Clone, Copy)]
pub struct Parser<'c> {
    table: &'c SectionTable,
    custom: &'c CustomSectionRegistry,
}

impl<'c> Parser<'c> {
    /// Creates a parser dispatching sections through `table` and custom
    /// sections through `custom`.
    pub fn new(table: &'c SectionTable, custom: &'c CustomSectionRegistry) -> Parser<'c> {
        Parser { table, custom }
    }

    /// The section table this parser dispatches with.
    pub fn table(&self) -> &'c SectionTable {
        self.table
    }

    /// Parses the module in `data`.
    pub fn parse<'a>(&self, data: &'a [u8]) -> Result<ModuleStorage<'a>> {
        self.parse_with(data, &mut Diagnostics::disabled())
    }

    /// Parses the module in `data`, describing any failure to
    /// `diagnostics`.
    pub fn parse_with<'a>(
        &self,
        data: &'a [u8],
        diagnostics: &mut Diagnostics<'_>,
    ) -> Result<ModuleStorage<'a>> {
        let mut storage = ModuleStorage::new(self.table);
        self.parse_into(data, &mut storage, diagnostics)?;
        Ok(storage)
    }

    /// Parses the module in `data` into `storage`.
    ///
    /// On failure `storage` holds whatever was parsed before the failing
    /// section and must not be treated as a valid module.
    pub fn parse_into<'a>(
        &self,
        data: &'a [u8],
        storage: &mut ModuleStorage<'a>,
        diagnostics: &mut Diagnostics<'_>,
    ) -> Result<()> {
        let result = self.parse_sections(data, storage);
        if let Err(e) = &result {
            log::debug!("parse failed: {e}");
            diagnostics.report(e);
        }
        result
    }

    fn parse_sections<'a>(&self, data: &'a [u8], storage: &mut ModuleStorage<'a>) -> Result<()> {
        let version = validate_header(data)?;
        storage.set_module(data, version);

        let mut reader = BinaryReader::new(data, 0);
        reader.read_bytes(HEADER_SIZE)?;
        let mut sections = 0usize;
        loop {
            match reader.bytes_remaining() {
                0 if sections > 0 => {
                    log::debug!("parsed {sections} sections");
                    return Ok(());
                }
                remaining if remaining < MIN_SECTION_HEADER_SIZE => {
                    let code = if sections == 0 {
                        ErrorCode::NoWasmSectionFound
                    } else {
                        ErrorCode::NoEnoughSpace
                    };
                    return Err(Error::new(code, reader.original_position())
                        .with_selector(Selector::Length(remaining as u64))
                        .with_message(format!(
                            "{remaining} bytes remain but a section header needs at least {MIN_SECTION_HEADER_SIZE}"
                        )));
                }
                _ => {}
            }
            let section = read_section(&mut reader)?;
            self.table.dispatch(storage, self.custom, section)?;
            sections += 1;
        }
    }
}

/// Reads a section's id and length and splits its contents off `reader`.
fn read_section<'a>(reader: &mut BinaryReader<'a>) -> Result<SectionReader<'a>> {
    let id_offset = reader.original_position();
    let id = reader.read_u8()?;
    let len_offset = reader.original_position();
    let len = reader.read_var_u32().map_err(|e| {
        let err = Error::new(ErrorCode::InvalidSectionLength, len_offset);
        match e.selector() {
            Some(selector) => err.with_selector(selector.clone()),
            None => err,
        }
    })?;
    let remaining = reader.bytes_remaining();
    if len as usize > remaining {
        return Err(Error::new(ErrorCode::IllegalSectionLength, len_offset)
            .with_selector(Selector::Length(len.into()))
            .with_message(format!(
                "section 0x{id:02x} is {len} bytes but only {remaining} remain"
            )));
    }
    log::trace!("section 0x{id:02x} at 0x{id_offset:x}, {len} bytes");
    let contents = reader.split(len as usize)?;
    Ok(SectionReader::new(id, id_offset, contents))
}

/// Parses `data` with the parser for the version its header declares.
///
/// The module name from `config` is recorded in the returned storage.
///
/// # Errors
///
/// Besides the errors of [`Parser::parse`], fails with
/// [`ErrorCode::UnsupportedVersion`] when the header declares a version
/// other than [`BINFMT_VERSION_1`].
pub fn parse_module<'a>(
    data: &'a [u8],
    config: &Config<'_>,
    diagnostics: &mut Diagnostics<'_>,
) -> Result<ModuleStorage<'a>> {
    let version = validate_header(data).and_then(|version| match version {
        BINFMT_VERSION_1 => Ok(version),
        other => Err(Error::new(ErrorCode::UnsupportedVersion, 4)
            .with_selector(Selector::Version(other))
            .with_message(format!("no parser for binary format version {other}"))),
    });
    if let Err(e) = &version {
        diagnostics.report(e);
    }
    version?;

    let parser = Parser::new(config.table(), config.custom_sections());
    let mut storage = parser.parse_with(data, diagnostics)?;
    storage.set_module_name(config.name());
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SectionContents, DEFAULT_TABLE, MVP_TABLE};

    fn module(sections: &[u8]) -> Vec<u8> {
        let mut wasm = b"\0asm\x01\0\0\0".to_vec();
        wasm.extend_from_slice(sections);
        wasm
    }

    fn parse(data: &[u8]) -> Result<ModuleStorage<'_>> {
        Parser::new(&DEFAULT_TABLE, CustomSectionRegistry::builtin()).parse(data)
    }

    #[test]
    fn header_only() {
        let err = parse(&module(&[])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoWasmSectionFound);
        assert_eq!(err.offset(), 8);

        let err = parse(&module(&[0x01])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoWasmSectionFound);
    }

    #[test]
    fn short_or_bad_header() {
        for data in [&b""[..], b"\0asm", b"\0asm\x01\0\0"] {
            let err = parse(data).unwrap_err();
            assert_eq!(err.code(), ErrorCode::IllegalWasmFileFormat);
            assert_eq!(err.offset(), 0);
        }
        let err = parse(b"\0ASM\x01\0\0\0\0\0").unwrap_err();
        assert_eq!(err.code(), ErrorCode::IllegalWasmFileFormat);
    }

    #[test]
    fn sections() {
        let wasm = module(&[
            0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type
            0x00, 0x03, 0x02, b'h', b'i', // custom "hi"
            0x08, 0x01, 0x00, // start
        ]);
        let storage = parse(&wasm).unwrap();
        assert_eq!(storage.version(), 1);
        assert_eq!(storage.module_span().len(), wasm.len());
        assert_eq!(storage.section(1).unwrap().range, 10..14);
        assert_eq!(
            storage.section(8).unwrap().contents,
            SectionContents::Start { func: 0 }
        );
        assert_eq!(storage.custom_sections().len(), 1);
        assert_eq!(storage.custom_sections()[0].range(), 16..19);
        assert_eq!(storage.sections().count(), 2);
    }

    #[test]
    fn one_trailing_byte() {
        let err = parse(&module(&[0x00, 0x01, 0x00, 0x05])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoEnoughSpace);
        assert_eq!(err.offset(), 11);
    }

    #[test]
    fn section_lengths() {
        let err = parse(&module(&[0x01, 0x80])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSectionLength);
        assert_eq!(err.offset(), 9);
        assert_eq!(
            err.selector(),
            Some(&Selector::Leb(crate::LebError::UnexpectedEof))
        );

        let err = parse(&module(&[0x01, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSectionLength);
        assert_eq!(err.offset(), 9);
        assert_eq!(err.selector(), Some(&Selector::Leb(crate::LebError::TooLong)));

        let err = parse(&module(&[0x01, 0xff, 0xff, 0xff, 0xff, 0x1f])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSectionLength);
        assert_eq!(err.offset(), 9);
        assert_eq!(err.selector(), Some(&Selector::Leb(crate::LebError::TooLarge)));

        let err = parse(&module(&[0x01, 0x05, 0x00])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IllegalSectionLength);
        assert_eq!(err.offset(), 9);
        assert_eq!(err.selector(), Some(&Selector::Length(5)));
    }

    #[test]
    fn unknown_ids() {
        let err = parse(&module(&[0x00, 0x01, 0x00, 0x0e, 0x00])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IllegalSectionId);
        assert_eq!(err.offset(), 11);
        assert_eq!(err.selector(), Some(&Selector::SectionId(14)));

        // Ids of disabled features are unknown too.
        let wasm = module(&[0x0c, 0x01, 0x00]);
        assert!(parse(&wasm).is_ok());
        let err = Parser::new(&MVP_TABLE, CustomSectionRegistry::builtin())
            .parse(&wasm)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::IllegalSectionId);
        assert_eq!(err.offset(), 8);
    }

    #[test]
    fn versions() {
        let mut wasm = module(&[0x00, 0x01, 0x00]);
        let config = Config::default().module_name("demo");
        let storage = parse_module(&wasm, &config, &mut Diagnostics::disabled()).unwrap();
        assert_eq!(storage.module_name(), "demo");

        wasm[4] = 2;
        let err = parse_module(&wasm, &config, &mut Diagnostics::disabled()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedVersion);
        assert_eq!(err.selector(), Some(&Selector::Version(2)));
        // The core parser itself does not care about the version.
        assert_eq!(parse(&wasm).unwrap().version(), 2);
    }
}
