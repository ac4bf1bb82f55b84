//! A parser for the WebAssembly binary format.
//!
//! The parser checks the module header, walks the sequence of sections and
//! hands each one to a handler. Which section ids are understood is decided
//! by the [`Feature`]s a [`SectionTable`] is built from; custom sections are
//! handed to the [`CustomSectionRegistry`] instead. Everything a parse finds
//! ends up in a [`ModuleStorage`] borrowing from the input bytes.
//!
//! ```
//! use binfmt::{CustomSectionRegistry, Parser, DEFAULT_TABLE};
//!
//! let wasm = b"\0asm\x01\0\0\0\x08\x01\x00";
//! let parser = Parser::new(&DEFAULT_TABLE, CustomSectionRegistry::builtin());
//! let module = parser.parse(wasm)?;
//! assert_eq!(module.section_by_name("start").unwrap().range, 10..11);
//! # Ok::<(), binfmt::Error>(())
//! ```
//!
//! Failures are reported as an [`Error`] carrying an [`ErrorCode`], the
//! offset of the offending byte and, where there is one, the value that was
//! rejected.

#![deny(missing_docs)]

mod binary_reader;
mod config;
mod diagnostics;
mod error;
mod features;
pub mod leb128;
mod parser;
mod readers;
mod storage;
mod table;

pub use crate::binary_reader::{BinaryReader, WASM_MAGIC_NUMBER};
pub use crate::config::Config;
pub use crate::diagnostics::Diagnostics;
pub use crate::error::{Error, ErrorCode, Result, Selector};
pub use crate::features::*;
pub use crate::leb128::LebError;
pub use crate::parser::{parse_module, validate_header, Parser, BINFMT_VERSION_1, HEADER_SIZE};
pub use crate::readers::{
    CustomHandler, CustomSectionRegistry, NameSection, Naming, Producers, SectionReader,
};
pub use crate::storage::{CustomSection, ModuleStorage, Section, SectionContents};
pub use crate::table::{
    SectionHandler, SectionTable, SectionType, TableError, CUSTOM_SECTION_ID, MAX_SECTIONS,
};
