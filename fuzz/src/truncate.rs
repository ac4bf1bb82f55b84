use arbitrary::{Result, Unstructured};
use binfmt::{CustomSectionRegistry, Parser, DEFAULT_TABLE};
use wasm_encoder::{CustomSection, Module, RawSection};

// Builds a module out of arbitrary custom sections and sections holding a
// lone zero, then checks that no prefix of it parses unless the prefix ends
// exactly where a section ends.
pub fn run(u: &mut Unstructured<'_>) -> Result<()> {
    let mut module = Module::new();
    let mut seen = [false; 14];
    for _ in 0..u.int_in_range(1..=8u32)? {
        if u.arbitrary()? {
            let name: String = u.arbitrary()?;
            let data: Vec<u8> = u.arbitrary()?;
            module.section(&CustomSection {
                name: name.as_str().into(),
                data: data.as_slice().into(),
            });
        } else {
            let id = *u.choose(&[1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13])?;
            if seen[usize::from(id)] {
                continue;
            }
            seen[usize::from(id)] = true;
            module.section(&RawSection { id, data: &[0] });
        }
    }
    let wasm = module.finish();
    crate::log_wasm(&wasm);

    // Arbitrary payloads may well be named `name`, so custom sections stay
    // opaque here.
    let registry = CustomSectionRegistry::empty();
    let parser = Parser::new(&DEFAULT_TABLE, &registry);
    let full = match parser.parse(&wasm) {
        Ok(full) => full,
        Err(e) => panic!("generated module failed to parse: {e}"),
    };
    let ends = full
        .sections()
        .map(|s| s.range.end)
        .chain(full.custom_sections().iter().map(|c| c.range().end))
        .collect::<Vec<_>>();

    for len in 0..wasm.len() {
        match parser.parse(&wasm[..len]) {
            Ok(_) => assert!(ends.contains(&len), "{len}-byte prefix parsed"),
            Err(e) => assert!(e.offset() <= len),
        }
    }
    Ok(())
}
