use crate::readers::sections::{read_code, read_data_count, read_items, read_start};
use crate::{SectionTable, SectionType, TableError};

/// A capability unit contributing section types to a [`SectionTable`].
#[derive(Debug, Clone, Copy)]
pub struct Feature {
    /// The feature's name as accepted on the command line.
    pub name: &'static str,
    /// The sections this feature knows how to parse.
    pub sections: &'static [SectionType],
}

/// The sections of the WebAssembly 1.0 binary format.
pub const MVP: Feature = Feature {
    name: "mvp",
    sections: &[
        SectionType { id: 1, name: "type", handler: read_items },
        SectionType { id: 2, name: "import", handler: read_items },
        SectionType { id: 3, name: "function", handler: read_items },
        SectionType { id: 4, name: "table", handler: read_items },
        SectionType { id: 5, name: "memory", handler: read_items },
        SectionType { id: 6, name: "global", handler: read_items },
        SectionType { id: 7, name: "export", handler: read_items },
        SectionType { id: 8, name: "start", handler: read_start },
        SectionType { id: 9, name: "element", handler: read_items },
        SectionType { id: 10, name: "code", handler: read_code },
        SectionType { id: 11, name: "data", handler: read_items },
    ],
};

/// The data count section of the bulk memory proposal.
pub const BULK_MEMORY: Feature = Feature {
    name: "bulk-memory",
    sections: &[SectionType {
        id: 12,
        name: "datacount",
        handler: read_data_count,
    }],
};

/// The tag section of the exception handling proposal.
pub const EXCEPTIONS: Feature = Feature {
    name: "exceptions",
    sections: &[SectionType {
        id: 13,
        name: "tag",
        handler: read_items,
    }],
};

/// A table with only [`MVP`] sections.
pub static MVP_TABLE: SectionTable = SectionTable::new(&[&MVP]);

/// A table with every built-in feature enabled.
pub static DEFAULT_TABLE: SectionTable = SectionTable::new(&[&MVP, &BULK_MEMORY, &EXCEPTIONS]);

bitflags::bitflags! {
    /// Selects which built-in features a parser is configured with.
    ///
    /// The [`Default`] implementation enables everything.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WasmFeatures: u32 {
        /// Sections of the WebAssembly 1.0 binary format.
        const MVP = 1 << 0;
        /// The data count section.
        const BULK_MEMORY = 1 << 1;
        /// The tag section.
        const EXCEPTIONS = 1 << 2;
    }
}

impl Default for WasmFeatures {
    fn default() -> Self {
        WasmFeatures::all()
    }
}

/// Every built-in feature, in the order they are folded into a table.
pub const FEATURES: &[(WasmFeatures, &Feature)] = &[
    (WasmFeatures::MVP, &MVP),
    (WasmFeatures::BULK_MEMORY, &BULK_MEMORY),
    (WasmFeatures::EXCEPTIONS, &EXCEPTIONS),
];

impl WasmFeatures {
    /// Looks up a feature flag by the name of its [`Feature`], such as
    /// `bulk-memory`.
    ///
    /// This differs from the `from_name` generated by `bitflags`, which
    /// matches constant names like `BULK_MEMORY`.
    pub fn from_feature_name(name: &str) -> Option<WasmFeatures> {
        FEATURES
            .iter()
            .find(|(_, feature)| feature.name == name)
            .map(|(flag, _)| *flag)
    }

    /// The enabled features, in table order.
    pub fn features(&self) -> Vec<&'static Feature> {
        FEATURES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, feature)| *feature)
            .collect()
    }

    /// Builds the section table for the enabled features.
    ///
    /// # Errors
    ///
    /// Fails if the enabled features leave a gap in the section ids, for
    /// example enabling exceptions without bulk memory.
    pub fn table(&self) -> Result<SectionTable, TableError> {
        SectionTable::try_new(&self.features())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_for_flags() {
        assert_eq!(WasmFeatures::default().table().unwrap().len(), DEFAULT_TABLE.len());
        assert_eq!(WasmFeatures::MVP.table().unwrap().len(), MVP_TABLE.len());
        assert_eq!(
            (WasmFeatures::MVP | WasmFeatures::BULK_MEMORY).table().unwrap().len(),
            12
        );
        assert!(WasmFeatures::empty().table().unwrap().is_empty());
        assert_eq!(
            (WasmFeatures::MVP | WasmFeatures::EXCEPTIONS).table().unwrap_err(),
            TableError::NotContiguous { missing: 12 }
        );
    }

    #[test]
    fn names() {
        assert_eq!(WasmFeatures::from_feature_name("mvp"), Some(WasmFeatures::MVP));
        assert_eq!(
            WasmFeatures::from_feature_name("bulk-memory"),
            Some(WasmFeatures::BULK_MEMORY)
        );
        assert_eq!(WasmFeatures::from_feature_name("simd"), None);
        assert_eq!(WasmFeatures::from_feature_name("BULK_MEMORY"), None);
        assert_eq!(
            WasmFeatures::from_name("BULK_MEMORY"),
            Some(WasmFeatures::BULK_MEMORY)
        );
        let names = WasmFeatures::all()
            .features()
            .iter()
            .map(|f| f.name)
            .collect::<Vec<_>>();
        assert_eq!(names, ["mvp", "bulk-memory", "exceptions"]);
    }
}
