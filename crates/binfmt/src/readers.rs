use crate::BinaryReader;
use std::ops::Range;

mod custom;
mod names;
mod producers;
pub(crate) mod sections;

pub use self::custom::*;
pub(crate) use self::custom::dispatch_custom;
pub use self::names::*;
pub use self::producers::*;

/// One section handed to a section handler.
///
/// The reader covers exactly the section's contents; the id byte and the
/// length have already been consumed by the section iterator.
#[derive(Clone, Debug)]
pub struct SectionReader<'a> {
    id: u8,
    id_offset: usize,
    name: &'static str,
    reader: BinaryReader<'a>,
}

impl<'a> SectionReader<'a> {
    /// Creates a reader for a section with `id` whose id byte is at
    /// `id_offset` and whose contents are covered by `reader`.
    pub fn new(id: u8, id_offset: usize, reader: BinaryReader<'a>) -> SectionReader<'a> {
        SectionReader {
            id,
            id_offset,
            name: "",
            reader,
        }
    }

    pub(crate) fn with_name(mut self, name: &'static str) -> SectionReader<'a> {
        self.name = name;
        self
    }

    /// The section id.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// The offset of the section's id byte relative to the start of the
    /// module.
    pub fn id_offset(&self) -> usize {
        self.id_offset
    }

    /// The name the feature registered for this section id. Empty for custom
    /// sections.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The range of the section's contents relative to the start of the
    /// module.
    pub fn range(&self) -> Range<usize> {
        self.reader.range()
    }

    /// The section's contents.
    pub fn data(&self) -> &'a [u8] {
        self.reader.remaining_buffer()
    }

    /// A reader positioned at the start of the section's contents.
    pub fn reader(&self) -> BinaryReader<'a> {
        self.reader.clone()
    }
}
