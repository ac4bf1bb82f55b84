use binfmt::{CustomSectionRegistry, Parser, DEFAULT_TABLE};

// Arbitrary bytes never panic the parser, errors point inside the input and
// everything a successful parse records lies inside the module.
pub fn run(bytes: &[u8]) {
    crate::log_wasm(bytes);
    let parser = Parser::new(&DEFAULT_TABLE, CustomSectionRegistry::builtin());
    let module = match parser.parse(bytes) {
        Ok(module) => module,
        Err(e) => {
            log::debug!("parse failed: {e}");
            assert!(e.offset() <= bytes.len(), "{e} is out of bounds");
            return;
        }
    };
    for section in module.sections() {
        assert!(section.range.end <= bytes.len());
    }
    for custom in module.custom_sections() {
        assert!(custom.range().end <= bytes.len());
        assert_eq!(module.offset_of(custom.data()), Some(custom.data_offset()));
    }
}
