//! Resource sources and request routing.

pub(crate) mod actor;
pub mod archive;
pub mod http;

use std::sync::Arc;

use parking_lot::Mutex;

pub use archive::ArchiveSource;
pub use http::HttpSource;

use crate::resource::Resource;
use crate::response::{ErrorKind, Response};

/// Callback invoked with the result of a resource request.
///
/// Invoked exactly once per request, on an execution context chosen by the runtime (not
/// necessarily the caller's), unless the request is cancelled first.
pub type ResponseCallback = Box<dyn FnOnce(Response) + Send + 'static>;

/// Contract implemented by every concrete resource source.
pub trait ResourceSource: Send + Sync {
    /// Whether this source can answer the given resource request.
    ///
    /// Used for static routing: must be pure, fast and free of side effects.
    fn can_request(&self, resource: &Resource) -> bool;

    /// Processes the request asynchronously, delivering the result through the callback.
    ///
    /// Submitting a request never blocks the caller. Dropping the returned handle before
    /// completion guarantees the callback is not invoked; the in-flight work may still run to
    /// completion internally, but its result is discarded.
    fn request(&self, resource: Resource, callback: ResponseCallback) -> RequestHandle;
}

/// Handle of an in-flight resource request.
///
/// Dropping the handle cancels the request: the callback is guaranteed not to fire afterwards.
/// Cancellation is advisory for the producing side, which may finish its work and find the
/// delivery slot already empty.
pub struct RequestHandle {
    slot: Arc<Mutex<Option<ResponseCallback>>>,
}

impl RequestHandle {
    /// Creates a connected handle/delivery pair around the callback.
    ///
    /// Source implementations hand the [`ResponseSlot`] to whatever context produces the
    /// response and return the handle to the caller.
    pub fn new(callback: ResponseCallback) -> (Self, ResponseSlot) {
        let slot = Arc::new(Mutex::new(Some(callback)));
        (
            Self { slot: slot.clone() },
            ResponseSlot { slot },
        )
    }
}

impl Drop for RequestHandle {
    fn drop(&mut self) {
        self.slot.lock().take();
    }
}

/// Delivery end of a request: the producing side of a [`RequestHandle`] pair.
#[derive(Clone)]
pub struct ResponseSlot {
    slot: Arc<Mutex<Option<ResponseCallback>>>,
}

impl ResponseSlot {
    /// Delivers the response through the callback.
    ///
    /// A no-op when the request was cancelled or a response was already delivered; the callback
    /// can never fire twice.
    pub fn deliver(&self, response: Response) {
        if let Some(callback) = self.slot.lock().take() {
            callback(response);
        }
    }

    /// Whether the receiving side has given up on this request.
    ///
    /// Workers check this before starting expensive work for requests cancelled while queued.
    pub fn is_cancelled(&self) -> bool {
        self.slot.lock().is_none()
    }
}

/// Routes each request to the first registered source that accepts it.
///
/// Sources are consulted in registration order with their [`ResourceSource::can_request`]
/// predicate. A request no source accepts is answered immediately with an
/// [`ErrorKind::Other`] response.
#[derive(Default)]
pub struct ResourceResolver {
    sources: Vec<Box<dyn ResourceSource>>,
}

impl ResourceResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source. Sources are consulted in registration order.
    pub fn add_source(&mut self, source: impl ResourceSource + 'static) {
        self.sources.push(Box::new(source));
    }

    /// Dispatches the request to the first source whose predicate matches.
    pub fn request(&self, resource: Resource, callback: ResponseCallback) -> RequestHandle {
        for source in &self.sources {
            if source.can_request(&resource) {
                log::trace!("Dispatching request for {}", resource.url);
                return source.request(resource, callback);
            }
        }

        log::debug!("No source accepts url {}", resource.url);
        let (handle, slot) = RequestHandle::new(callback);
        slot.deliver(Response::from_error(
            ErrorKind::Other,
            format!("no source accepts url {}", resource.url),
        ));
        handle
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::Arc;

    use super::actor::SourceWorker;
    use super::*;

    struct WorkerSource {
        worker: SourceWorker<()>,
    }

    impl WorkerSource {
        fn new() -> Self {
            Self {
                worker: SourceWorker::spawn("test-worker", || ()),
            }
        }
    }

    impl ResourceSource for WorkerSource {
        fn can_request(&self, _resource: &Resource) -> bool {
            true
        }

        fn request(&self, _resource: Resource, callback: ResponseCallback) -> RequestHandle {
            let (handle, slot) = RequestHandle::new(callback);
            let worker_slot = slot.clone();
            if self
                .worker
                .submit(move |_| worker_slot.deliver(Response::from_data(vec![1u8])))
                .is_err()
            {
                slot.deliver(Response::from_error(ErrorKind::Other, "worker terminated"));
            }
            handle
        }
    }

    fn drain(worker: &SourceWorker<()>) {
        let (sender, receiver) = mpsc::channel();
        worker
            .submit(move |_| {
                sender.send(()).ok();
            })
            .expect("worker is running");
        receiver.recv().expect("worker delivers the marker");
    }

    #[test]
    fn response_is_delivered_through_callback() {
        let source = WorkerSource::new();
        let (sender, receiver) = mpsc::channel();
        let handle = source.request(
            Resource::source("test://resource"),
            Box::new(move |response| {
                sender.send(response).ok();
            }),
        );

        let response = receiver.recv().expect("response is delivered");
        assert_eq!(response.data.as_deref(), Some(&[1u8][..]));
        drop(handle);
    }

    #[test]
    fn dropping_handle_cancels_delivery() {
        let source = WorkerSource::new();

        // Keep the worker busy so the request stays queued while we cancel it.
        let (gate_sender, gate_receiver) = mpsc::channel::<()>();
        source
            .worker
            .submit(move |_| {
                gate_receiver.recv().ok();
            })
            .expect("worker is running");

        let fired = Arc::new(AtomicBool::new(false));
        let fired_flag = fired.clone();
        let handle = source.request(
            Resource::source("test://resource"),
            Box::new(move |_| fired_flag.store(true, Ordering::SeqCst)),
        );
        drop(handle);

        gate_sender.send(()).expect("worker is waiting on the gate");
        drain(&source.worker);

        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn callback_fires_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let (handle, slot) = RequestHandle::new(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        slot.deliver(Response::from_data(vec![1u8]));
        slot.deliver(Response::from_data(vec![2u8]));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        drop(handle);
    }

    #[test]
    fn cancelled_slot_reports_cancellation() {
        let (handle, slot) = RequestHandle::new(Box::new(|_| {}));
        assert!(!slot.is_cancelled());
        drop(handle);
        assert!(slot.is_cancelled());
    }

    #[test]
    fn resolver_routes_to_first_matching_source() {
        struct RefusingSource;
        impl ResourceSource for RefusingSource {
            fn can_request(&self, _resource: &Resource) -> bool {
                false
            }
            fn request(&self, _resource: Resource, callback: ResponseCallback) -> RequestHandle {
                let (handle, slot) = RequestHandle::new(callback);
                slot.deliver(Response::from_error(ErrorKind::Other, "should not be asked"));
                handle
            }
        }

        let mut resolver = ResourceResolver::new();
        resolver.add_source(RefusingSource);
        resolver.add_source(WorkerSource::new());

        let (sender, receiver) = mpsc::channel();
        let handle = resolver.request(
            Resource::source("test://resource"),
            Box::new(move |response| {
                sender.send(response).ok();
            }),
        );

        let response = receiver.recv().expect("response is delivered");
        assert!(!response.is_error());
        drop(handle);
    }

    #[test]
    fn unroutable_request_fails_immediately() {
        let resolver = ResourceResolver::new();
        let (sender, receiver) = mpsc::channel();
        let _handle = resolver.request(
            Resource::source("test://resource"),
            Box::new(move |response| {
                sender.send(response).ok();
            }),
        );

        let response = receiver.recv().expect("response is delivered");
        assert_eq!(
            response.error.map(|error| error.kind),
            Some(ErrorKind::Other)
        );
    }
}
