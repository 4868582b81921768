//! Memoization Module
//!
//! Caches the result of a call under a key derived from the callable's
//! identity and its arguments.
//!
//! Memoization is at-least-once: two threads missing on the same key at the
//! same time both run the wrapped call, and the later `set` wins.

use std::any::{type_name, Any, TypeId};
use std::mem::size_of;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::hasher::derive_call_key;
use crate::cache::{Cache, Expiration};
use crate::error::MemoizeError;

impl Cache {
    // == Memoize Call ==
    /// Returns the cached result of `f(args)`, computing and caching it on a miss.
    ///
    /// The cache key combines the type of `f` with `args` rendered as text, so
    /// pass multiple arguments as a tuple. Function items and closures each
    /// have a type of their own, so two different ones never share results
    /// even when given the same args.
    ///
    /// Function pointers and `dyn Fn` trait objects erase which function they
    /// hold; they are rejected here and must go through
    /// [`Cache::memoize_named`].
    ///
    /// # Errors
    /// - `InvalidArgument` if `f` is a function pointer or trait object, or
    ///   `args` cannot be serialized
    /// - `Upstream` with the call's own error; nothing is cached
    /// - `Adaptation` if the cached value is not a `T`
    /// - `Panicked` if `f` panicked
    pub fn memoize_call<F, A, T, E>(
        &self,
        expiration: Expiration,
        f: F,
        args: A,
    ) -> Result<T, MemoizeError<E>>
    where
        F: FnOnce(A) -> Result<T, E> + 'static,
        A: Serialize,
        T: Any + Clone + Send + Sync,
    {
        let identity = callable_identity::<F>().ok_or_else(|| {
            MemoizeError::InvalidArgument(format!(
                "callable type `{}` does not identify a single function; use memoize_named",
                type_name::<F>()
            ))
        })?;
        self.memoize_named(&identity, expiration, f, args)
    }

    /// Same as [`Cache::memoize_call`] with a caller-chosen identity.
    ///
    /// Use this for callables that borrow from their environment and so have
    /// no `'static` type to identify them by. Calls sharing an identity share
    /// results.
    pub fn memoize_named<F, A, T, E>(
        &self,
        identity: &str,
        expiration: Expiration,
        f: F,
        args: A,
    ) -> Result<T, MemoizeError<E>>
    where
        F: FnOnce(A) -> Result<T, E>,
        A: Serialize,
        T: Any + Clone + Send + Sync,
    {
        let key = derive_call_key(identity, &args)
            .map_err(|err| MemoizeError::InvalidArgument(err.to_string()))?;

        if let Some(cached) = self.get_any(&key) {
            debug!(identity, "memoize hit");
            return cached
                .downcast_ref::<T>()
                .cloned()
                .ok_or_else(|| MemoizeError::Adaptation {
                    key,
                    expected: type_name::<T>(),
                });
        }

        debug!(identity, "memoize miss");
        let value = match panic::catch_unwind(AssertUnwindSafe(|| f(args))) {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => return Err(MemoizeError::Upstream(err)),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(identity, %message, "memoized call panicked");
                return Err(MemoizeError::Panicked(message));
            }
        };

        self.set(expiration, &key, value.clone());
        Ok(value)
    }

    /// Writes the memoized result of `f(args)` into `out`.
    ///
    /// `out` is left untouched when an error is returned.
    pub fn memoize_into<F, A, T, E>(
        &self,
        expiration: Expiration,
        out: &mut T,
        f: F,
        args: A,
    ) -> Result<(), MemoizeError<E>>
    where
        F: FnOnce(A) -> Result<T, E> + 'static,
        A: Serialize,
        T: Any + Clone + Send + Sync,
    {
        *out = self.memoize_call(expiration, f, args)?;
        Ok(())
    }
}

/// Identity of a callable type, stable for the life of the process.
///
/// Returns `None` when values of `F` may be different functions: function
/// pointers and `dyn Fn` objects, possibly behind `&`, `Box`, `Rc` or `Arc`.
/// A zero-sized callable type (function item, capture-free closure) has a
/// single value, so its type always identifies it.
fn callable_identity<F: 'static>() -> Option<String> {
    let name = type_name::<F>();
    if size_of::<F>() != 0 && is_erased_callable(name) {
        return None;
    }
    Some(format!("{}#{:?}", name, TypeId::of::<F>()))
}

fn is_erased_callable(name: &str) -> bool {
    const WRAPPERS: [&str; 5] = [
        "&mut ",
        "&",
        "alloc::boxed::Box<",
        "alloc::rc::Rc<",
        "alloc::sync::Arc<",
    ];
    const ERASED: [&str; 5] = ["fn(", "unsafe fn(", "extern ", "unsafe extern ", "dyn "];

    let mut inner = name;
    while let Some(rest) = WRAPPERS.iter().find_map(|w| inner.strip_prefix(*w)) {
        inner = rest;
    }
    ERASED.iter().any(|prefix| inner.starts_with(prefix))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
