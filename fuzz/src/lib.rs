pub mod parse;
pub mod truncate;

/// Writes the test case to `test.wasm` when debug logging is on.
pub fn log_wasm(wasm: &[u8]) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    match std::fs::write("test.wasm", wasm) {
        Ok(()) => log::debug!("writing test case to `test.wasm` ({} bytes)", wasm.len()),
        Err(e) => log::debug!("failed to write test.wasm: {e}"),
    }
}
