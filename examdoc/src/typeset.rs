//! Scheduling of passes against an external, asynchronous math
//! typesetting engine.
//!
//! The engine is an injected [`TypesetProvider`]. Passes on one output
//! target are debounced and serialized: while a pass is in flight, further
//! requests collapse into a single catch-up pass. A [`CancelToken`] marks
//! the target as discarded; no completion path touches a cancelled target.

use crate::options::TypesetConfig;
use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesetError {
    #[error("typesetting engine not ready after {attempts} polls")]
    NotReady { attempts: u32 },
    #[error("typesetting engine failed: {0}")]
    Engine(String),
}

/// Bounded readiness polling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub attempts: u32,
    pub interval_ms: u32,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self { attempts: 50, interval_ms: 100 }
    }
}

impl From<&TypesetConfig> for ReadinessPolicy {
    fn from(c: &TypesetConfig) -> Self {
        Self { attempts: c.ready_attempts, interval_ms: c.ready_interval_ms }
    }
}

/// The external engine. Single-threaded; futures need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait TypesetProvider {
    type Target: ?Sized;

    fn is_ready(&self) -> bool;
    async fn sleep(&self, ms: u32);
    async fn typeset(&self, target: &Self::Target) -> Result<(), TypesetError>;

    /// Polls `is_ready` up to `policy.attempts` more times, sleeping
    /// `policy.interval_ms` between polls.
    async fn ensure_ready(&self, policy: ReadinessPolicy) -> Result<(), TypesetError> {
        if self.is_ready() {
            return Ok(());
        }
        for _ in 0..policy.attempts {
            self.sleep(policy.interval_ms).await;
            if self.is_ready() {
                return Ok(());
            }
        }
        Err(TypesetError::NotReady { attempts: policy.attempts })
    }
}

/// Liveness of one output target. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// In-flight flag plus one "run again" flag. Never a backlog.
#[derive(Debug, Default)]
pub struct TypesetQueue {
    in_flight: Cell<bool>,
    queued: Cell<bool>,
}

impl TypesetQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when the caller owns a new pass; otherwise a catch-up pass is
    /// marked for the current owner.
    pub fn try_begin(&self) -> bool {
        if self.in_flight.get() {
            self.queued.set(true);
            false
        } else {
            self.in_flight.set(true);
            true
        }
    }

    /// End of a pass. `true` when a catch-up pass must run; the caller keeps
    /// ownership in that case.
    pub fn finish(&self) -> bool {
        if self.queued.replace(false) {
            true
        } else {
            self.in_flight.set(false);
            false
        }
    }

    /// Drop ownership and any pending catch-up pass.
    pub fn release(&self) {
        self.in_flight.set(false);
        self.queued.set(false);
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.get()
    }

    pub fn is_queued(&self) -> bool {
        self.queued.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceTicket(u64);

/// Latest-wins generation counter.
#[derive(Debug, Default)]
pub struct Debouncer {
    generation: Cell<u64>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&self) -> DebounceTicket {
        let next = self.generation.get().wrapping_add(1);
        self.generation.set(next);
        DebounceTicket(next)
    }

    pub fn is_current(&self, ticket: DebounceTicket) -> bool {
        self.generation.get() == ticket.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypesetOutcome {
    /// Every requested pass ran.
    Done,
    /// Folded into the in-flight pass's catch-up run.
    Queued,
    /// A newer request arrived during the idle delay.
    Superseded,
    /// The target was discarded.
    Cancelled,
    /// Engine never became ready; the LaTeX source stays visible.
    Unavailable,
    Failed(TypesetError),
}

async fn pass<P: TypesetProvider>(
    provider: &P,
    target: &P::Target,
    token: &CancelToken,
    policy: ReadinessPolicy,
) -> TypesetOutcome {
    if token.is_cancelled() {
        return TypesetOutcome::Cancelled;
    }
    if let Err(err) = provider.ensure_ready(policy).await {
        tracing::warn!(error = %err, "typesetting engine unavailable, showing source");
        return TypesetOutcome::Unavailable;
    }
    if token.is_cancelled() {
        return TypesetOutcome::Cancelled;
    }
    let result = provider.typeset(target).await;
    if token.is_cancelled() {
        return TypesetOutcome::Cancelled;
    }
    match result {
        Ok(()) => TypesetOutcome::Done,
        Err(err) => {
            tracing::warn!(error = %err, "typeset pass failed");
            TypesetOutcome::Failed(err)
        }
    }
}

/// Run a pass on `target` unless one is in flight, then at most one
/// catch-up pass for requests that arrived meanwhile.
pub async fn typeset_serialized<P: TypesetProvider>(
    provider: &P,
    queue: &TypesetQueue,
    target: &P::Target,
    token: &CancelToken,
    policy: ReadinessPolicy,
) -> TypesetOutcome {
    if token.is_cancelled() {
        return TypesetOutcome::Cancelled;
    }
    if !queue.try_begin() {
        tracing::debug!("typeset pass in flight, catch-up queued");
        return TypesetOutcome::Queued;
    }
    loop {
        let outcome = pass(provider, target, token, policy).await;
        if !matches!(outcome, TypesetOutcome::Done | TypesetOutcome::Failed(_)) {
            queue.release();
            return outcome;
        }
        if !queue.finish() {
            return outcome;
        }
        tracing::debug!("running catch-up typeset pass");
    }
}

/// Per-target typesetting state: debouncer, queue and liveness together.
/// Clones share state.
#[derive(Clone, Debug, Default)]
pub struct TypesetDriver {
    queue: Rc<TypesetQueue>,
    debouncer: Rc<Debouncer>,
    token: CancelToken,
    config: TypesetConfig,
}

impl TypesetDriver {
    pub fn new(config: TypesetConfig) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn queue(&self) -> &TypesetQueue {
        &self.queue
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Debounced, serialized typeset request: waits out the idle delay, gives
    /// way to any newer request, then runs through the queue.
    pub async fn request<P: TypesetProvider>(&self, provider: &P, target: &P::Target) -> TypesetOutcome {
        let ticket = self.debouncer.touch();
        if self.config.debounce_ms > 0 {
            provider.sleep(self.config.debounce_ms).await;
        }
        if self.token.is_cancelled() {
            return TypesetOutcome::Cancelled;
        }
        if !self.debouncer.is_current(ticket) {
            return TypesetOutcome::Superseded;
        }
        typeset_serialized(provider, &self.queue, target, &self.token, (&self.config).into()).await
    }
}
