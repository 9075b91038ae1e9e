//! # Output Slots
//!
//! Each output owns a `tokio::sync::watch` channel holding `None` until it
//! resolves. Resolution is a conditional in-place update that only succeeds on
//! an empty slot, which gives resolve-once semantics without a separate lock.
//! Waiters subscribe and wait for the slot to be filled, so a waiter that
//! arrives after resolution returns immediately.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use propval::PropertyValue;
use propval::Urn;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::Error;
use crate::error::Result;
use crate::value::OutputValue;

/// The untyped outcome stored in a resolved slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Settled {
    /// `Computed` when the value is not known.
    pub value: PropertyValue,
    pub known: bool,
    pub secret: bool,
    /// Creation-time dependencies followed by those added at resolution.
    pub deps: Vec<Urn>,
}

/// A typed view of a settled output.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    /// `None` when the value is not known.
    pub value: Option<T>,
    pub known: bool,
    pub secret: bool,
    pub deps: Vec<Urn>,
}

type Slot = Option<Result<Settled>>;

struct Shared {
    deps: Vec<Urn>,
    tx: watch::Sender<Slot>,
}

/// A single-assignment future of a property value.
pub struct Output<T> {
    shared: Arc<Shared>,
    _ty: PhantomData<fn() -> T>,
}

/// An output viewed as a raw `PropertyValue`.
pub type AnyOutput = Output<PropertyValue>;

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self { shared: self.shared.clone(), _ty: PhantomData }
    }
}

impl<T> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("deps", &self.shared.deps)
            .field("slot", &*self.shared.tx.borrow())
            .finish()
    }
}

impl<T> Output<T> {
    /// A pending output that depends on `deps`.
    pub fn new(deps: Vec<Urn>) -> Self {
        let (tx, _) = watch::channel(None);
        Self { shared: Arc::new(Shared { deps, tx }), _ty: PhantomData }
    }

    /// Dependencies declared when the output was created.
    pub fn deps(&self) -> &[Urn] {
        &self.shared.deps
    }

    pub fn is_resolved(&self) -> bool {
        self.shared.tx.borrow().is_some()
    }

    /// Fills the slot. Returns `false` if it was already filled.
    ///
    /// An unknown output always stores `Computed`, whatever `value` was.
    pub fn resolve(&self, value: PropertyValue, known: bool, secret: bool, deps: Vec<Urn>) -> bool {
        let mut all = self.shared.deps.clone();
        all.extend(deps);
        let settled = Settled {
            value: if known { value } else { PropertyValue::Computed },
            known,
            secret,
            deps: all,
        };
        let filled = self.fill(Ok(settled));
        trace!(filled, known, secret, "resolve output");
        filled
    }

    /// Fails the slot. Returns `false` if it was already filled.
    pub fn reject(&self, err: Error) -> bool {
        self.fill(Err(err))
    }

    fn fill(&self, outcome: Result<Settled>) -> bool {
        self.shared.tx.send_if_modified(move |slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
            true
        })
    }

    /// Waits for the untyped outcome.
    pub async fn settled(&self) -> Result<Settled> {
        let mut rx = self.shared.tx.subscribe();
        let slot = rx.wait_for(Option::is_some).await.map_err(|_| Error::Unresolved)?;
        (*slot).clone().unwrap_or(Err(Error::Unresolved))
    }

    /// Waits for the untyped outcome, giving up when `token` is cancelled.
    pub async fn settled_or_cancel(&self, token: &CancellationToken) -> Result<Settled> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(Error::Cancelled),
            settled = self.settled() => settled,
        }
    }

    /// The same slot viewed as a raw `PropertyValue`.
    pub fn untyped(&self) -> AnyOutput {
        Output { shared: self.shared.clone(), _ty: PhantomData }
    }

    /// The same slot viewed as `U`. Shape mismatches surface when awaited.
    pub fn typed<U: OutputValue>(&self) -> Output<U> {
        Output { shared: self.shared.clone(), _ty: PhantomData }
    }
}

impl<T: OutputValue> Output<T> {
    /// An output that is already resolved to a known, non-secret value.
    pub fn resolved(value: T, deps: Vec<Urn>) -> Self {
        let out = Self::new(deps);
        out.resolve(value.into_property(), true, false, Vec::new());
        out
    }

    /// An output that is already resolved to a known secret value.
    pub fn secret(value: T, deps: Vec<Urn>) -> Self {
        let out = Self::new(deps);
        out.resolve(value.into_property(), true, true, Vec::new());
        out
    }

    /// An output that is already resolved as unknown.
    pub fn unknown(deps: Vec<Urn>) -> Self {
        let out = Self::new(deps);
        out.resolve(PropertyValue::Computed, false, false, Vec::new());
        out
    }

    pub async fn resolution(&self) -> Result<Resolved<T>> {
        Resolved::from_settled(self.settled().await?)
    }

    pub async fn resolution_or_cancel(&self, token: &CancellationToken) -> Result<Resolved<T>> {
        Resolved::from_settled(self.settled_or_cancel(token).await?)
    }

    /// The value alone; `None` when unknown.
    pub async fn value(&self) -> Result<Option<T>> {
        Ok(self.resolution().await?.value)
    }

    /// Derives a new output by running `f` on this one's value.
    ///
    /// The result inherits known-ness, secret-ness and dependencies. `f` is
    /// skipped when the value is unknown. Must be called inside a Tokio runtime.
    pub fn apply<U, F>(&self, f: F) -> Output<U>
    where
        U: OutputValue,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let out = Output::<U>::new(self.deps().to_vec());
        let src = self.clone();
        let dst = out.clone();
        tokio::spawn(async move {
            // The derived output already carries the creation-time deps.
            let inherited = src.deps().len();
            match src.resolution().await {
                Ok(Resolved { value: Some(v), secret, mut deps, .. }) => {
                    let extra = deps.split_off(inherited.min(deps.len()));
                    dst.resolve(f(v).into_property(), true, secret, extra);
                }
                Ok(Resolved { value: None, secret, mut deps, .. }) => {
                    let extra = deps.split_off(inherited.min(deps.len()));
                    dst.resolve(PropertyValue::Computed, false, secret, extra);
                }
                Err(err) => {
                    dst.reject(err);
                }
            }
        });
        out
    }
}

impl<T: OutputValue> Resolved<T> {
    fn from_settled(settled: Settled) -> Result<Self> {
        let Settled { value, known, secret, deps } = settled;
        let (value, wrapped) = value.unwrap_secret();
        let value = if known {
            let found = value.type_name();
            Some(T::from_property(value).ok_or(Error::TypeMismatch { expected: T::TYPE_NAME, found })?)
        } else {
            None
        };
        Ok(Self { value, known, secret: secret || wrapped, deps })
    }
}
