use crate::{
    CustomSection, Error, ErrorCode, ModuleStorage, NameSection, Producers, Result, SectionReader,
    Selector,
};
use hashbrown::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// A handler for a named custom section.
///
/// Receives the payload following the name. Returning `false` means the
/// section was recognized but is malformed.
pub type CustomHandler = fn(&[u8]) -> bool;

/// Maps custom section names to the handlers which interpret them.
///
/// The registry is read-only while parsing: build it completely before any
/// parse starts. Custom sections whose name has no handler are kept as opaque
/// data.
#[derive(Clone, Default)]
pub struct CustomSectionRegistry {
    handlers: HashMap<Box<[u8]>, CustomHandler>,
}

impl CustomSectionRegistry {
    /// Creates a registry with no handlers.
    pub fn empty() -> CustomSectionRegistry {
        CustomSectionRegistry::default()
    }

    /// Creates a registry with the built-in `name` and `producers` handlers.
    pub fn with_builtins() -> CustomSectionRegistry {
        let mut registry = CustomSectionRegistry::empty();
        registry.register("name", |data| NameSection::parse(data, 0).is_ok());
        registry.register("producers", |data| Producers::parse(data, 0).is_ok());
        registry
    }

    /// The process-wide registry holding the built-in handlers.
    pub fn builtin() -> &'static CustomSectionRegistry {
        static BUILTIN: OnceLock<CustomSectionRegistry> = OnceLock::new();
        BUILTIN.get_or_init(CustomSectionRegistry::with_builtins)
    }

    /// Registers `handler` for custom sections named exactly `name`,
    /// returning the handler it replaces.
    pub fn register(
        &mut self,
        name: impl AsRef<[u8]>,
        handler: CustomHandler,
    ) -> Option<CustomHandler> {
        self.handlers.insert(name.as_ref().into(), handler)
    }

    /// Returns the handler registered for `name`.
    pub fn get(&self, name: &[u8]) -> Option<CustomHandler> {
        self.handlers.get(name).copied()
    }

    /// The number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for CustomSectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.handlers.keys().map(|k| String::from_utf8_lossy(k)))
            .finish()
    }
}

/// Handles a section with id 0.
///
/// Records the section in `storage` and then, if `registry` knows its name,
/// lets the registered handler check the payload.
pub(crate) fn dispatch_custom<'a>(
    storage: &mut ModuleStorage<'a>,
    registry: &CustomSectionRegistry,
    section: SectionReader<'a>,
) -> Result<()> {
    let mut reader = section.reader();
    let start = reader.original_position();
    let invalid = || Error::new(ErrorCode::InvalidCustomSection, start);

    let name_len = reader.read_var_u32().map_err(|e| match e.selector() {
        Some(selector) => invalid()
            .with_selector(selector.clone())
            .with_message("malformed custom section name length"),
        None => invalid(),
    })?;
    if name_len as usize > reader.bytes_remaining() {
        return Err(invalid()
            .with_selector(Selector::Length(name_len.into()))
            .with_message(format!(
                "custom section name is {name_len} bytes but only {} remain",
                reader.bytes_remaining()
            )));
    }
    let name = reader.read_bytes(name_len as usize)?;
    let data_offset = reader.original_position();
    let data = reader.remaining_buffer();

    storage.push_custom(CustomSection {
        name,
        data,
        data_offset,
        range: section.range(),
    });

    let Some(handler) = registry.get(name) else {
        log::trace!(
            "custom section {:?} has no handler, keeping it opaque",
            String::from_utf8_lossy(name)
        );
        return Ok(());
    };
    log::trace!(
        "custom section {:?} ({} bytes)",
        String::from_utf8_lossy(name),
        data.len()
    );
    if !handler(data) {
        let name = String::from_utf8_lossy(name).into_owned();
        return Err(Error::new(ErrorCode::InvalidCustomSection, data_offset)
            .with_message(format!("the `{name}` handler rejected the payload"))
            .with_selector(Selector::Name(name)));
    }
    Ok(())
}
