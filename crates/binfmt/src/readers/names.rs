/* Copyright 2018 Mozilla Foundation
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use crate::error::bail;
use crate::{BinaryReader, Result};
use std::ops::Range;

/// Represents a name for an index from the names section.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Naming<'a> {
    /// The index being named.
    pub index: u32,
    /// The name for the index.
    pub name: &'a str,
}

/// The decoded contents of a `name` custom section.
///
/// Only the module and function name subsections are decoded; any other
/// subsection is checked for a well-formed size and skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameSection<'a> {
    module_name: Option<(&'a str, Range<usize>)>,
    function_names: Vec<Naming<'a>>,
    skipped: Vec<u8>,
}

impl<'a> NameSection<'a> {
    /// Parses the payload of a `name` custom section located at `offset`.
    pub fn parse(data: &'a [u8], offset: usize) -> Result<NameSection<'a>> {
        let mut reader = BinaryReader::new(data, offset);
        let mut section = NameSection::default();
        while !reader.eof() {
            let subsection_offset = reader.original_position();
            let id = reader.read_u8()?;
            let mut subsection = reader.read_reader()?;
            match id {
                0 => {
                    if section.module_name.is_some() {
                        bail!(
                            MalformedSection,
                            subsection_offset,
                            "duplicate module name subsection"
                        );
                    }
                    let start = subsection.original_position();
                    let name = subsection.read_string()?;
                    subsection.finish("module name subsection")?;
                    section.module_name = Some((name, start..subsection.original_position()));
                }
                1 => {
                    let count = subsection.read_var_u32()?;
                    for _ in 0..count {
                        let index = subsection.read_var_u32()?;
                        let name = subsection.read_string()?;
                        section.function_names.push(Naming { index, name });
                    }
                    subsection.finish("function name subsection")?;
                }
                ty => section.skipped.push(ty),
            }
        }
        Ok(section)
    }

    /// The name of the module, if the section has one.
    pub fn module_name(&self) -> Option<&'a str> {
        self.module_name.as_ref().map(|(name, _)| *name)
    }

    /// The byte range the module name occupies in the original binary.
    pub fn module_name_range(&self) -> Option<Range<usize>> {
        self.module_name.as_ref().map(|(_, range)| range.clone())
    }

    /// The function names, in the order they were listed.
    pub fn function_names(&self) -> &[Naming<'a>] {
        &self.function_names
    }

    /// Ids of the subsections which were skipped without being decoded.
    pub fn skipped_subsections(&self) -> &[u8] {
        &self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    #[test]
    fn module_and_functions() {
        let data = b"\x00\x04\x03foo\x01\x07\x02\x00\x01a\x05\x01b\x02\x01\xff";
        let names = NameSection::parse(data, 100).unwrap();
        assert_eq!(names.module_name(), Some("foo"));
        assert_eq!(names.module_name_range(), Some(102..106));
        assert_eq!(
            names.function_names(),
            &[
                Naming { index: 0, name: "a" },
                Naming { index: 5, name: "b" },
            ]
        );
        assert_eq!(names.skipped_subsections(), &[2]);
    }

    #[test]
    fn malformed() {
        let err = NameSection::parse(b"\x00\x05\x03foox", 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TrailingData);

        let err = NameSection::parse(b"\x01\x09\x01", 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnexpectedEof);

        let err = NameSection::parse(b"\x00\x02\x01a\x00\x02\x01b", 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedSection);
        assert_eq!(err.offset(), 4);

        let err = NameSection::parse(b"\x00\x03\x02\xff\xfe", 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedUtf8);
    }
}
