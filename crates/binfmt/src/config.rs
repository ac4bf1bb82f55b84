use crate::{CustomSectionRegistry, SectionTable, TableError, WasmFeatures, DEFAULT_TABLE};

/// Everything needed to parse a module besides its bytes.
///
/// A configuration is fixed before parsing starts and is never mutated by a
/// parse, so it can be shared freely between threads. It borrows its custom
/// section handlers for `'c`.
#[derive(Debug, Clone)]
pub struct Config<'c> {
    table: SectionTable,
    features: WasmFeatures,
    module_name: String,
    custom: &'c CustomSectionRegistry,
}

impl Default for Config<'_> {
    fn default() -> Self {
        Config {
            table: DEFAULT_TABLE,
            features: WasmFeatures::default(),
            module_name: String::new(),
            custom: CustomSectionRegistry::builtin(),
        }
    }
}

impl<'c> Config<'c> {
    /// Creates a configuration with only `features` enabled.
    ///
    /// # Errors
    ///
    /// Fails if the section ids of the enabled features are not contiguous.
    pub fn with_features(features: WasmFeatures) -> Result<Config<'c>, TableError> {
        Ok(Config {
            table: features.table()?,
            features,
            ..Config::default()
        })
    }

    /// Sets the name the module is loaded under.
    pub fn module_name(mut self, name: impl Into<String>) -> Config<'c> {
        self.module_name = name.into();
        self
    }

    /// Replaces the custom section handlers.
    pub fn custom_sections_from(mut self, registry: &'c CustomSectionRegistry) -> Config<'c> {
        self.custom = registry;
        self
    }

    /// The section table built from the enabled features.
    pub fn table(&self) -> &SectionTable {
        &self.table
    }

    /// The enabled features.
    pub fn features(&self) -> WasmFeatures {
        self.features
    }

    /// The name modules are loaded under.
    pub fn name(&self) -> &str {
        &self.module_name
    }

    /// The custom section handlers.
    pub fn custom_sections(&self) -> &'c CustomSectionRegistry {
        self.custom
    }
}
