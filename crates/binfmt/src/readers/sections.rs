//! Handlers for the sections of the built-in features.
//!
//! These only check the outer shape of each section; the items themselves
//! are left for the validation layer.

use crate::error::bail;
use crate::{ModuleStorage, Result, Section, SectionContents, SectionReader};

fn insert<'a>(
    storage: &mut ModuleStorage<'a>,
    section: &SectionReader<'a>,
    contents: SectionContents<'a>,
) -> Result<()> {
    storage.insert_section(Section {
        id: section.id(),
        name: section.name(),
        id_offset: section.id_offset(),
        range: section.range(),
        contents,
    })
}

/// A vector section: a count followed by the items.
pub(crate) fn read_items<'a>(
    storage: &mut ModuleStorage<'a>,
    section: SectionReader<'a>,
) -> Result<()> {
    let mut reader = section.reader();
    let count = reader.read_var_u32()?;
    let items = reader.remaining_buffer();
    insert(storage, &section, SectionContents::Items { count, items })
}

pub(crate) fn read_start<'a>(
    storage: &mut ModuleStorage<'a>,
    section: SectionReader<'a>,
) -> Result<()> {
    let mut reader = section.reader();
    let func = reader.read_var_u32()?;
    reader.finish("start section")?;
    insert(storage, &section, SectionContents::Start { func })
}

pub(crate) fn read_data_count<'a>(
    storage: &mut ModuleStorage<'a>,
    section: SectionReader<'a>,
) -> Result<()> {
    let mut reader = section.reader();
    let count = reader.read_var_u32()?;
    reader.finish("data count section")?;
    insert(storage, &section, SectionContents::DataCount { count })
}

/// The code section: a count followed by that many size-prefixed function
/// bodies, and nothing else.
pub(crate) fn read_code<'a>(
    storage: &mut ModuleStorage<'a>,
    section: SectionReader<'a>,
) -> Result<()> {
    let mut reader = section.reader();
    let count = reader.read_var_u32()?;
    let mut bodies = Vec::new();
    for i in 0..count {
        if reader.eof() {
            bail!(
                MalformedSection,
                reader.original_position(),
                "code section declares {count} function bodies but only {i} are present"
            );
        }
        let body = reader.read_reader()?;
        bodies.push(body.range());
    }
    reader.finish("code section")?;
    insert(storage, &section, SectionContents::Code { bodies })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryReader, ErrorCode, DEFAULT_TABLE};

    fn run<'a>(
        handler: crate::SectionHandler,
        id: u8,
        data: &'a [u8],
    ) -> Result<ModuleStorage<'a>> {
        let mut storage = ModuleStorage::new(&DEFAULT_TABLE);
        let section = SectionReader::new(id, 0, BinaryReader::new(data, 2))
            .with_name(DEFAULT_TABLE.lookup(id).unwrap().name);
        handler(&mut storage, section)?;
        Ok(storage)
    }

    #[test]
    fn items() {
        let storage = run(read_items, 1, &[0x02, 0x60, 0x00, 0x00, 0x60, 0x00, 0x00]).unwrap();
        let section = storage.section(1).unwrap();
        assert_eq!(section.name, "type");
        assert_eq!(section.range, 2..9);
        match &section.contents {
            SectionContents::Items { count, items } => {
                assert_eq!(*count, 2);
                assert_eq!(items.len(), 6);
            }
            other => panic!("unexpected contents {other:?}"),
        }

        let err = run(read_items, 1, &[]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnexpectedEof);
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn start() {
        let storage = run(read_start, 8, &[0x03]).unwrap();
        assert_eq!(
            storage.section(8).unwrap().contents,
            SectionContents::Start { func: 3 }
        );

        let err = run(read_start, 8, &[0x03, 0x00]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TrailingData);
        assert_eq!(err.offset(), 3);
    }

    #[test]
    fn data_count() {
        let storage = run(read_data_count, 12, &[0x81, 0x01]).unwrap();
        assert_eq!(
            storage.section_by_name("datacount").unwrap().contents,
            SectionContents::DataCount { count: 129 }
        );
    }

    #[test]
    fn code() {
        let storage = run(read_code, 10, &[0x02, 0x02, 0x00, 0x0b, 0x01, 0x0b]).unwrap();
        assert_eq!(
            storage.section(10).unwrap().contents,
            SectionContents::Code {
                bodies: vec![4..6, 7..8]
            }
        );

        let err = run(read_code, 10, &[0x03, 0x02, 0x00, 0x0b]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedSection);
        assert_eq!(err.offset(), 6);

        let err = run(read_code, 10, &[0x01, 0x05, 0x00, 0x0b]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnexpectedEof);

        let err = run(read_code, 10, &[0x01, 0x01, 0x0b, 0x0b]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TrailingData);
    }
}
