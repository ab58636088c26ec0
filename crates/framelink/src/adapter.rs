use std::any::Any;
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;

use framelink_frame::{Frame, Parser, Serializer};
use framelink_registry::{Message, Registry};
use framelink_transport::Transport;
use tracing::{debug, error, trace};

use crate::error::{AdapterError, Result};
use crate::handler::{ErasedHandler, HandlerId, HandlerTable};

const STATE_UNBOUND: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// Typed publish/dispatch channel over one byte stream.
///
/// An adapter is created detached (`Unbound`), bound to a stream with
/// [`start`](Adapter::start) (`Running`), and runs until the inbound side
/// of the stream fails or ends (`Closed`), at which point the terminal
/// error is delivered exactly once through [`wait`](Adapter::wait).
///
/// [`send`](Adapter::send) may be called from any number of threads; whole
/// frames are written atomically. A failed send is reported to that caller
/// only and does not close the adapter; only inbound stream failure does.
/// Releasing the underlying stream is the caller's job: call
/// [`close`](Adapter::close), which wakes the dispatch loop's blocked read.
pub struct Adapter<T: Transport> {
    registry: Arc<Registry>,
    handlers: Arc<HandlerTable>,
    state: Arc<AtomicU8>,
    writer: Mutex<Option<Arc<Serializer<T>>>>,
    conn: Mutex<Option<T>>,
    errors: Mutex<Option<Receiver<AdapterError>>>,
}

impl<T: Transport> Adapter<T> {
    /// Create an adapter over a shared registry, detached from any stream.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            handlers: Arc::new(HandlerTable::default()),
            state: Arc::new(AtomicU8::new(STATE_UNBOUND)),
            writer: Mutex::new(None),
            conn: Mutex::new(None),
            errors: Mutex::new(None),
        }
    }

    /// Bind the adapter to a connected stream and start the dispatch loop.
    ///
    /// Splits the stream into a read half for the spawned dispatch thread,
    /// a write half for [`send`](Adapter::send), and a handle retained for
    /// [`close`](Adapter::close). Fails with `AlreadyStarted` on any second
    /// call, including after the adapter has closed.
    pub fn start(&self, conn: T) -> Result<()> {
        let reader = conn.try_clone()?;
        let writer = conn.try_clone()?;

        if self
            .state
            .compare_exchange(
                STATE_UNBOUND,
                STATE_RUNNING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(AdapterError::AlreadyStarted);
        }

        let (error_tx, error_rx) = mpsc::sync_channel(1);
        *lock(&self.writer) = Some(Arc::new(Serializer::new(writer)));
        *lock(&self.conn) = Some(conn);
        *lock(&self.errors) = Some(error_rx);

        let parser = Parser::new(reader);
        let registry = Arc::clone(&self.registry);
        let handlers = Arc::clone(&self.handlers);
        let state = Arc::clone(&self.state);

        thread::Builder::new()
            .name("framelink-dispatch".to_string())
            .spawn(move || dispatch_loop(parser, &registry, &handlers, &state, &error_tx))?;

        Ok(())
    }

    /// Encode a value and write it to the stream as one frame.
    ///
    /// Fails with `NotRegistered` before touching the stream if the type
    /// has no wire name, with `NotStarted`/`Closed` outside the `Running`
    /// state, and otherwise returns the serializer's error unchanged. A
    /// send failure does not close the adapter; if the stream is truly
    /// dead the dispatch loop will observe that on its own and deliver
    /// the terminal error.
    pub fn send<M: Message>(&self, value: &M) -> Result<()> {
        if self.state.load(Ordering::Acquire) == STATE_CLOSED {
            return Err(AdapterError::Closed);
        }

        let entry = self
            .registry
            .entry_of::<M>()
            .ok_or(AdapterError::NotRegistered(std::any::type_name::<M>()))?;

        let writer = lock(&self.writer)
            .as_ref()
            .map(Arc::clone)
            .ok_or(AdapterError::NotStarted)?;

        let payload = value.encode_payload()?;
        let frame = Frame::new(entry.name(), M::encoding(), payload);
        writer.write_frame(&frame)?;
        Ok(())
    }

    /// Register a callback for inbound messages of type `M`.
    ///
    /// The handler's shape is enforced by the type system; the only runtime
    /// failure is an unregistered message type. Handlers for one name fire
    /// in registration order, on the dispatch thread.
    pub fn on<M, F>(&self, handler: F) -> Result<HandlerId>
    where
        M: Message,
        F: Fn(&M) + Send + Sync + 'static,
    {
        let entry = self
            .registry
            .entry_of::<M>()
            .ok_or(AdapterError::NotRegistered(std::any::type_name::<M>()))?;

        let erased: ErasedHandler = Arc::new(move |value: &(dyn Any + Send + Sync)| {
            if let Some(typed) = value.downcast_ref::<M>() {
                handler(typed);
            }
        });

        Ok(self.handlers.add(entry.name(), erased))
    }

    /// Remove one handler registration from a name's list.
    ///
    /// Other handlers for the same name keep firing.
    pub fn off(&self, name: &str, id: HandlerId) {
        self.handlers.remove(name, id);
    }

    /// Remove every handler registered for a name.
    pub fn off_all(&self, name: &str) {
        self.handlers.remove_all(name);
    }

    /// Shut down the underlying stream.
    ///
    /// Safe in every state: a no-op before `start`, idempotent after. The
    /// blocked read fails, which the dispatch loop reports as the terminal
    /// error, completing the transition to `Closed`.
    pub fn close(&self) -> Result<()> {
        match lock(&self.conn).as_ref() {
            Some(conn) => Ok(conn.shutdown()?),
            None => Ok(()),
        }
    }

    /// Block until the dispatch loop delivers its terminal error.
    ///
    /// The error is delivered exactly once; a second call, or a call on an
    /// adapter that was never started, returns `None` immediately.
    pub fn wait(&self) -> Option<AdapterError> {
        let receiver = lock(&self.errors).take()?;
        receiver.recv().ok()
    }

    /// True once the dispatch loop has terminated.
    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_CLOSED
    }

    /// True while the dispatch loop is bound and reading.
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING
    }

    /// The registry this adapter resolves types and names through.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One iteration per inbound frame until the parser reports its terminal
/// error; that error is forwarded once and the loop exits.
fn dispatch_loop<R: Read>(
    mut parser: Parser<R>,
    registry: &Registry,
    handlers: &HandlerTable,
    state: &AtomicU8,
    errors: &SyncSender<AdapterError>,
) {
    loop {
        let frame = match parser.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                debug!(error = %err, "dispatch loop terminating");
                state.store(STATE_CLOSED, Ordering::Release);
                // Single-slot channel; the receiver may already be gone.
                let _ = errors.send(err.into());
                return;
            }
        };

        let Some(entry) = registry.entry_named(&frame.name) else {
            trace!(name = %frame.name, "dropping frame with unregistered name");
            continue;
        };

        if frame.encoding != entry.encoding() {
            debug!(
                name = %frame.name,
                "dropping frame whose encoding does not match the registered type"
            );
            continue;
        }

        let value = match entry.decode(&frame.payload) {
            Ok(value) => value,
            Err(err) => {
                debug!(name = %frame.name, error = %err, "dropping undecodable frame");
                continue;
            }
        };

        for handler in handlers.snapshot(&frame.name) {
            let call = panic::catch_unwind(AssertUnwindSafe(|| (handler.func)(value.as_ref())));
            if let Err(payload) = call {
                error!(
                    name = %frame.name,
                    panic = panic_message(payload.as_ref()),
                    "handler panicked"
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
