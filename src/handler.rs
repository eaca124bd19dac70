//! Handler trait, type erasure, and state injection.
//!
//! # How async handlers are stored
//!
//! The router holds handlers of *different* types in a single
//! `HashMap<Method, Tree>`, so each one is hidden behind a trait object
//! (`dyn ErasedHandler`):
//!
//! ```text
//! async fn list_books(req: Request) -> Response { … }   ← handler
//!        ↓ router.on(Method::Get, "/books", list_books)
//! list_books.into_boxed_handler()                      ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(list_books))                      ← stored as BoxedHandler
//!        ↓
//! handler.call(req)  at request time                   ← one vtable dispatch
//! ```
//!
//! # State
//!
//! There is no global state. Handlers that need the store or the services
//! take an `Arc<S>` as their first argument and are registered through
//! [`with_state`], which captures the `Arc` in a closure.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// Automatically satisfied for any `async fn` or closure with the signature:
///
/// ```text
/// Fn(Request) -> impl Future<Output = impl IntoResponse>
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype bridging a concrete handler `F` to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── State injection ───────────────────────────────────────────────────────────

/// Adapts `async fn(Arc<S>, Request)` into a [`Handler`] by capturing `state`.
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use bookshop::{handler::with_state, Method, Request, Response, Router};
/// struct Shop { name: String }
///
/// async fn hello(shop: Arc<Shop>, _req: Request) -> Response {
///     Response::text(shop.name.clone())
/// }
///
/// let shop = Arc::new(Shop { name: "books".into() });
/// let app = Router::new().on(Method::Get, "/", with_state(&shop, hello));
/// ```
pub fn with_state<S, F, Fut, R>(state: &Arc<S>, handler: F) -> impl Handler + use<S, F, Fut, R>
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    let state = Arc::clone(state);
    move |req: Request| handler(Arc::clone(&state), req)
}
