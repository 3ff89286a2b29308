//! `tracing` output for the browser: a `tracing-subscriber` fmt layer whose
//! writer hands each formatted line to the devtools console.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Receives one formatted event line.
pub type Sink = fn(Level, &str);

#[derive(Clone, Copy)]
pub struct ConsoleMakeWriter {
    sink: Sink,
}

impl ConsoleMakeWriter {
    pub fn new(sink: Sink) -> Self {
        Self { sink }
    }
}

/// Buffers one event and emits it on drop, when fmt is done writing.
pub struct ConsoleLine {
    level: Level,
    buf: Vec<u8>,
    sink: Sink,
}

impl io::Write for ConsoleLine {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleLine {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end();
        if !line.is_empty() {
            (self.sink)(self.level, line);
        }
    }
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleLine;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleLine {
            level: Level::INFO,
            buf: Vec::new(),
            sink: self.sink,
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleLine {
            level: *meta.level(),
            buf: Vec::new(),
            sink: self.sink,
        }
    }
}

/// "warn", "DEBUG", ... ; anything unknown means info.
pub fn parse_level(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}

#[cfg(target_arch = "wasm32")]
pub fn console_sink(level: Level, line: &str) {
    let msg = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::ERROR => web_sys::console::error_1(&msg),
        Level::WARN => web_sys::console::warn_1(&msg),
        Level::INFO => web_sys::console::info_1(&msg),
        _ => web_sys::console::debug_1(&msg),
    }
}

/// Install the console subscriber once; later calls return false.
#[cfg(target_arch = "wasm32")]
pub fn init(level: Level) -> bool {
    console_error_panic_hook::set_once();
    tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter::new(console_sink))
        .with_max_level(level)
        .with_ansi(false)
        .without_time()
        .try_init()
        .is_ok()
}
