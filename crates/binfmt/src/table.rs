//! The section dispatcher.
//!
//! Features contribute [`SectionType`]s, and a closed, ordered list of
//! features is folded into a [`SectionTable`] before any parsing happens. The
//! table is an array indexed by section id so dispatch is a single bounds
//! checked load followed by an indirect call.
//!
//! Ids handed out by the features of one table must be distinct and
//! contiguous starting at 1; id 0 belongs to custom sections. Tables built in
//! a `const` or `static` initializer check this while compiling:
//!
//! ```compile_fail
//! use binfmt::{Feature, ModuleStorage, Result, SectionReader, SectionTable, SectionType, MVP};
//!
//! fn skip<'a>(_: &mut ModuleStorage<'a>, _: SectionReader<'a>) -> Result<()> {
//!     Ok(())
//! }
//!
//! // Nothing registers ids 12 and 13.
//! const FAR: Feature = Feature {
//!     name: "far",
//!     sections: &[SectionType { id: 14, name: "far", handler: skip }],
//! };
//! static TABLE: SectionTable = SectionTable::new(&[&MVP, &FAR]);
//! ```

use crate::readers::{dispatch_custom, SectionReader};
use crate::{CustomSectionRegistry, Error, ErrorCode, Feature, ModuleStorage, Result, Selector};
use std::fmt;

/// The id reserved for custom sections.
pub const CUSTOM_SECTION_ID: u8 = 0;

/// The largest number of non-custom section ids a table can hold.
pub const MAX_SECTIONS: usize = 32;

/// The signature of a section handler.
///
/// A handler decodes the section it is given and records the result in its
/// slot of the [`ModuleStorage`].
pub type SectionHandler = for<'a> fn(&mut ModuleStorage<'a>, SectionReader<'a>) -> Result<()>;

/// A section a [`Feature`] knows how to parse.
#[derive(Clone, Copy)]
pub struct SectionType {
    /// The section id, unique among the features of a table.
    pub id: u8,
    /// A short human-readable name such as `"type"` or `"code"`.
    pub name: &'static str,
    /// Parses the section.
    pub handler: SectionHandler,
}

impl fmt::Debug for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionType")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Why a list of features can't form a [`SectionTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// A feature tried to register id 0.
    #[error("section `{name}` uses id 0, which is reserved for custom sections")]
    ReservedId {
        /// Name of the offending section.
        name: &'static str,
    },
    /// Two features registered the same id.
    #[error("section id {id} is registered more than once")]
    DuplicateId {
        /// The duplicated id.
        id: u8,
    },
    /// The id is larger than [`MAX_SECTIONS`].
    #[error("section id {id} is out of range")]
    OutOfRange {
        /// The offending id.
        id: u8,
    },
    /// Ids do not cover `1..=len` without gaps.
    #[error("section ids are not contiguous: id {missing} is missing")]
    NotContiguous {
        /// The first id with no section.
        missing: u8,
    },
}

/// Maps section ids to the handler of the feature which registered them.
#[derive(Clone, Copy)]
pub struct SectionTable {
    entries: [Option<SectionType>; MAX_SECTIONS],
    len: usize,
}

impl SectionTable {
    /// Builds a table from `features`, panicking if their ids are not
    /// distinct and contiguous from 1.
    ///
    /// Used in a `const` or `static` initializer the panic is a compile
    /// error.
    pub const fn new(features: &[&Feature]) -> SectionTable {
        match SectionTable::try_new(features) {
            Ok(table) => table,
            Err(TableError::ReservedId { .. }) => {
                panic!("section id 0 is reserved for custom sections")
            }
            Err(TableError::DuplicateId { .. }) => panic!("section ids must be distinct"),
            Err(TableError::OutOfRange { .. }) => panic!("section id is out of range"),
            Err(TableError::NotContiguous { .. }) => {
                panic!("section ids must be contiguous starting at 1")
            }
        }
    }

    /// Builds a table from `features`.
    pub const fn try_new(features: &[&Feature]) -> Result<SectionTable, TableError> {
        let mut entries: [Option<SectionType>; MAX_SECTIONS] = [None; MAX_SECTIONS];
        let mut len = 0;
        let mut i = 0;
        while i < features.len() {
            let sections = features[i].sections;
            let mut j = 0;
            while j < sections.len() {
                let section = sections[j];
                let id = section.id as usize;
                if id == 0 {
                    return Err(TableError::ReservedId { name: section.name });
                }
                if id > MAX_SECTIONS {
                    return Err(TableError::OutOfRange { id: section.id });
                }
                if entries[id - 1].is_some() {
                    return Err(TableError::DuplicateId { id: section.id });
                }
                entries[id - 1] = Some(section);
                if id > len {
                    len = id;
                }
                j += 1;
            }
            i += 1;
        }
        let mut slot = 0;
        while slot < len {
            if entries[slot].is_none() {
                return Err(TableError::NotContiguous {
                    missing: (slot + 1) as u8,
                });
            }
            slot += 1;
        }
        Ok(SectionTable { entries, len })
    }

    /// The number of registered section ids.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no section ids are registered.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the section type registered for `id`.
    #[inline]
    pub fn lookup(&self, id: u8) -> Option<&SectionType> {
        let slot = usize::from(id).checked_sub(1)?;
        self.entries.get(slot)?.as_ref()
    }

    /// Iterates over the registered section types in id order.
    pub fn iter(&self) -> impl Iterator<Item = &SectionType> + '_ {
        self.entries[..self.len].iter().flatten()
    }

    /// Hands `section` to the custom section sub-dispatcher or to the handler
    /// registered for its id.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorCode::IllegalSectionId`], pointing at the id byte,
    /// if no feature registered the id. Handler failures are returned
    /// unchanged.
    pub fn dispatch<'a>(
        &self,
        storage: &mut ModuleStorage<'a>,
        custom: &CustomSectionRegistry,
        section: SectionReader<'a>,
    ) -> Result<()> {
        let id = section.id();
        if id == CUSTOM_SECTION_ID {
            return dispatch_custom(storage, custom, section);
        }
        match self.lookup(id) {
            Some(ty) => {
                log::debug!(
                    "dispatching {} section ({} bytes at 0x{:x})",
                    ty.name,
                    section.range().len(),
                    section.range().start
                );
                (ty.handler)(storage, section.with_name(ty.name))
            }
            None => Err(Error::new(ErrorCode::IllegalSectionId, section.id_offset())
                .with_selector(Selector::SectionId(id))
                .with_message(format!(
                    "no enabled feature registers section id {id} (valid ids are 0..={})",
                    self.len
                ))),
        }
    }
}

impl fmt::Debug for SectionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BULK_MEMORY, EXCEPTIONS, MVP};

    fn ignore<'a>(_: &mut ModuleStorage<'a>, _: SectionReader<'a>) -> Result<()> {
        Ok(())
    }

    const fn feature(sections: &'static [SectionType]) -> Feature {
        Feature {
            name: "test",
            sections,
        }
    }

    #[test]
    fn builtin_tables() {
        let table = SectionTable::new(&[&MVP, &BULK_MEMORY, &EXCEPTIONS]);
        assert_eq!(table.len(), 13);
        let names = table.iter().map(|s| s.name).collect::<Vec<_>>();
        assert_eq!(names[0], "type");
        assert_eq!(names[9], "code");
        assert_eq!(names[11], "datacount");
        assert_eq!(names[12], "tag");
        assert!(table.lookup(0).is_none());
        assert!(table.lookup(14).is_none());
        assert_eq!(table.lookup(8).unwrap().name, "start");

        let empty = SectionTable::new(&[]);
        assert!(empty.is_empty());
        assert!(empty.lookup(1).is_none());
    }

    #[test]
    fn features_may_be_listed_in_any_order() {
        let table = SectionTable::try_new(&[&BULK_MEMORY, &MVP]).unwrap();
        assert_eq!(table.len(), 12);
    }

    #[test]
    fn invalid_tables() {
        static RESERVED: [SectionType; 1] = [SectionType {
            id: 0,
            name: "zero",
            handler: ignore,
        }];
        static FAR: [SectionType; 1] = [SectionType {
            id: 200,
            name: "far",
            handler: ignore,
        }];

        assert_eq!(
            SectionTable::try_new(&[&feature(&RESERVED)]).unwrap_err(),
            TableError::ReservedId { name: "zero" }
        );
        assert_eq!(
            SectionTable::try_new(&[&MVP, &MVP]).unwrap_err(),
            TableError::DuplicateId { id: 1 }
        );
        assert_eq!(
            SectionTable::try_new(&[&feature(&FAR)]).unwrap_err(),
            TableError::OutOfRange { id: 200 }
        );
        assert_eq!(
            SectionTable::try_new(&[&EXCEPTIONS]).unwrap_err(),
            TableError::NotContiguous { missing: 1 }
        );
        assert_eq!(
            SectionTable::try_new(&[&MVP, &EXCEPTIONS]).unwrap_err(),
            TableError::NotContiguous { missing: 12 }
        );
    }

    #[test]
    #[should_panic(expected = "contiguous")]
    fn new_panics_on_gaps() {
        SectionTable::new(&[&EXCEPTIONS]);
    }
}
