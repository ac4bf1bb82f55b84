use crate::{BinaryReader, Result};
use indexmap::IndexMap;

/// The decoded contents of a `producers` custom section.
///
/// Maps each field (`language`, `processed-by`, `sdk`, ...) to its
/// `name -> version` pairs, preserving the order of the section.
///
/// Spec: <https://github.com/WebAssembly/tool-conventions/blob/main/ProducersSection.md>
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Producers(IndexMap<String, IndexMap<String, String>>);

impl Producers {
    /// Parses the payload of a `producers` custom section located at
    /// `offset`.
    pub fn parse(data: &[u8], offset: usize) -> Result<Producers> {
        let mut reader = BinaryReader::new(data, offset);
        let mut fields = IndexMap::new();
        let field_count = reader.read_var_u32()?;
        for _ in 0..field_count {
            let field = reader.read_string()?;
            let mut values = IndexMap::new();
            let value_count = reader.read_var_u32()?;
            for _ in 0..value_count {
                let name = reader.read_string()?;
                let version = reader.read_string()?;
                values.insert(name.to_owned(), version.to_owned());
            }
            fields.insert(field.to_owned(), values);
        }
        reader.finish("producers section")?;
        Ok(Producers(fields))
    }

    /// Indicates if the section lists no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `name -> version` pairs of `field`.
    pub fn get(&self, field: &str) -> Option<&IndexMap<String, String>> {
        self.0.get(field)
    }

    /// Iterates through all fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &IndexMap<String, String>)> + '_ {
        self.0.iter()
    }
}
