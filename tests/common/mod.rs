#![allow(dead_code)]

use std::io;
use std::sync::Arc;

use brrtmux::router::{RadixStore, Store, StoreMatch};
use brrtmux::{handler, Chain, Context, Handler, Request, RouteError};
use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;

/// Shared text buffer handlers append to.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<String>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, text: &str) {
        self.0.lock().push_str(text);
    }

    /// Contents so far, clearing the buffer.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.0.lock())
    }

    pub fn contents(&self) -> String {
        self.0.lock().clone()
    }
}

/// Handler that records `tag` and stops.
pub fn tag_handler(tag: &'static str, recorder: &Recorder) -> Handler {
    let recorder = recorder.clone();
    handler(move |_ctx: &mut Context| {
        recorder.push(tag);
        Ok(())
    })
}

/// Handler that records `tag` and continues with the rest of the chain.
pub fn pass_handler(tag: &'static str, recorder: &Recorder) -> Handler {
    let recorder = recorder.clone();
    handler(move |ctx: &mut Context| {
        recorder.push(tag);
        ctx.next()
    })
}

pub fn request(method: &str, path: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(path)
        .body(Vec::new())
        .unwrap()
}

/// Store double that runs every handler of a chain as it is added,
/// delegating the matching itself to a [`RadixStore`].
pub struct RecordingStore {
    inner: RadixStore,
}

impl RecordingStore {
    pub fn boxed() -> Box<dyn Store> {
        Box::new(Self {
            inner: RadixStore::new(),
        })
    }
}

impl Store for RecordingStore {
    fn add(&mut self, pattern: &str, chain: Chain) -> Result<usize, RouteError> {
        let mut ctx = Context::new(request("GET", "/"), Vec::<Handler>::new());
        for h in chain.iter() {
            h(&mut ctx).map_err(|e| RouteError::UnsupportedMethod(e.to_string()))?;
        }
        self.inner.add(pattern, chain)
    }

    fn find(&self, path: &str) -> Option<StoreMatch> {
        self.inner.find(path)
    }

    fn count(&self) -> usize {
        self.inner.count()
    }
}

/// In-memory `tracing` output sink.
#[derive(Clone, Default)]
pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl CaptureWriter {
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a subscriber writing plain-text events into the returned capture.
pub fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let capture = CaptureWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, capture.output())
}
