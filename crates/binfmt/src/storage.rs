use crate::{Error, ErrorCode, Result, SectionTable, Selector};
use std::fmt;
use std::ops::Range;
use std::str;

/// A custom section (id 0) as it appeared in the module.
///
/// Both the name and the payload are views into the module's bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct CustomSection<'a> {
    pub(crate) name: &'a [u8],
    pub(crate) data: &'a [u8],
    pub(crate) data_offset: usize,
    pub(crate) range: Range<usize>,
}

impl<'a> CustomSection<'a> {
    /// The raw bytes of the custom section's name.
    pub fn name_bytes(&self) -> &'a [u8] {
        self.name
    }

    /// The name of the custom section, if it is valid UTF-8.
    pub fn name(&self) -> Option<&'a str> {
        str::from_utf8(self.name).ok()
    }

    /// The payload following the name.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The offset, relative to the start of the module, that the payload
    /// starts at.
    pub fn data_offset(&self) -> usize {
        self.data_offset
    }

    /// The range of bytes of this whole custom section (name and payload)
    /// relative to the start of the module.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }
}

impl fmt::Debug for CustomSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSection")
            .field("name", &String::from_utf8_lossy(self.name))
            .field("data_offset", &self.data_offset)
            .field("data", &"...")
            .field("range", &self.range)
            .finish()
    }
}

/// A non-custom section decoded by the handler of its feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    /// The section id.
    pub id: u8,
    /// The name the feature registered for this id.
    pub name: &'static str,
    /// The offset of the section's id byte relative to the start of the
    /// module.
    pub id_offset: usize,
    /// The range of the section's contents relative to the start of the
    /// module.
    pub range: Range<usize>,
    /// The structural decode of the section's contents.
    pub contents: SectionContents<'a>,
}

/// The structural decode of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionContents<'a> {
    /// A vector section: a count followed by that many encoded items, left
    /// undecoded.
    Items {
        /// The declared number of items.
        count: u32,
        /// The bytes following the count.
        items: &'a [u8],
    },
    /// The start section.
    Start {
        /// Index of the start function.
        func: u32,
    },
    /// The data count section.
    DataCount {
        /// Declared number of data segments.
        count: u32,
    },
    /// The code section, split into function bodies.
    Code {
        /// The range of each function body relative to the start of the
        /// module, excluding its size prefix.
        bodies: Vec<Range<usize>>,
    },
}

/// Everything parsed out of one module.
///
/// There is one slot for every section id registered in the [`SectionTable`]
/// the storage was created for; slots of sections that never appear stay
/// empty. Custom sections are kept in the order they appeared in.
///
/// Once a parse fails the storage is only partially filled in and should be
/// used for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleStorage<'a> {
    module_span: &'a [u8],
    module_name: String,
    version: u32,
    custom_sections: Vec<CustomSection<'a>>,
    sections: Vec<Option<Section<'a>>>,
}

impl<'a> ModuleStorage<'a> {
    /// Creates empty storage with a slot per section of `table`.
    pub fn new(table: &SectionTable) -> ModuleStorage<'a> {
        ModuleStorage {
            sections: vec![None; table.len()],
            ..ModuleStorage::default()
        }
    }

    pub(crate) fn set_module(&mut self, module: &'a [u8], version: u32) {
        self.module_span = module;
        self.version = version;
    }

    /// The bytes of the whole module, magic number onwards.
    pub fn module_span(&self) -> &'a [u8] {
        self.module_span
    }

    /// The name the module was loaded under.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Sets the name the module was loaded under.
    pub fn set_module_name(&mut self, name: impl Into<String>) {
        self.module_name = name.into();
    }

    /// The binary format version declared in the header.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the section with `id`, if it appeared in the module.
    pub fn section(&self, id: u8) -> Option<&Section<'a>> {
        let slot = usize::from(id).checked_sub(1)?;
        self.sections.get(slot)?.as_ref()
    }

    /// Returns the section registered under `name`, if it appeared in the
    /// module.
    pub fn section_by_name(&self, name: &str) -> Option<&Section<'a>> {
        self.sections().find(|s| s.name == name)
    }

    /// Iterates over the sections which appeared, in id order.
    pub fn sections(&self) -> impl Iterator<Item = &Section<'a>> + '_ {
        self.sections.iter().flatten()
    }

    /// The number of section slots, which is the number of section ids
    /// registered by the enabled features.
    pub fn slot_count(&self) -> usize {
        self.sections.len()
    }

    /// Fills the slot for `section.id`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorCode::DuplicateSection`] if the slot is already
    /// filled, and [`ErrorCode::IllegalSectionId`] if no slot exists for the
    /// id. Either error points at the section's id byte.
    pub fn insert_section(&mut self, section: Section<'a>) -> Result<()> {
        let offset = section.id_offset;
        let id = section.id;
        let slot = usize::from(id)
            .checked_sub(1)
            .and_then(|slot| self.sections.get_mut(slot))
            .ok_or_else(|| {
                Error::new(ErrorCode::IllegalSectionId, offset).with_selector(Selector::SectionId(id))
            })?;
        if slot.is_some() {
            return Err(Error::new(ErrorCode::DuplicateSection, offset)
                .with_selector(Selector::SectionId(id))
                .with_message(format!("{} section appears more than once", section.name)));
        }
        *slot = Some(section);
        Ok(())
    }

    pub(crate) fn push_custom(&mut self, section: CustomSection<'a>) {
        self.custom_sections.push(section);
    }

    /// All custom sections, in the order they appeared.
    pub fn custom_sections(&self) -> &[CustomSection<'a>] {
        &self.custom_sections
    }

    /// The custom sections named `name`, in the order they appeared.
    pub fn custom_sections_named<'s>(
        &'s self,
        name: &'s str,
    ) -> impl Iterator<Item = &'s CustomSection<'a>> + 's {
        self.custom_sections
            .iter()
            .filter(move |c| c.name == name.as_bytes())
    }

    /// Returns the offset of `view` relative to the start of the module, or
    /// `None` if `view` does not lie within the module.
    pub fn offset_of(&self, view: &[u8]) -> Option<usize> {
        let base = self.module_span.as_ptr() as usize;
        let start = view.as_ptr() as usize;
        let offset = start.checked_sub(base)?;
        if offset + view.len() <= self.module_span.len() {
            Some(offset)
        } else {
            None
        }
    }
}
