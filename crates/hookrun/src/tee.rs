use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// Writes every buffer, in full and in order, to each of its sinks. A failing
/// sink does not stop the others; the first error is returned after all
/// sinks have been tried.
pub struct MultiWriter {
    sinks: Vec<Box<dyn Write + Send>>,
}

impl MultiWriter {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with(mut self, sink: impl Write + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl Default for MultiWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MultiWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(err) = sink.write_all(buf) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(buf.len()), Err)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(err) = sink.flush() {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Cloneable in-memory sink; all clones append to the same buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().clone()
    }

    pub fn bytes_written(&self) -> usize {
        self.0.lock().len()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
