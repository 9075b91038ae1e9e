//! # Task Group
//!
//! The per-call join point for resource registrations. Every registration a
//! construct routine issues is spawned here, and the adapter joins the group
//! before it reads any result.
//!
//! ## Invariants
//! - A group belongs to exactly one call. It never sees another call's tasks.
//! - `join` also waits for tasks spawned while it is joining.
//! - Once `join` returns, the group is closed and `spawn` fails.
//! - Cancelling the group's token ends every task, joined or not. A task that
//!   is still running when the token fires is dropped in place.

use std::future::Future;
use std::sync::Mutex;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Error;
use crate::error::Result;

#[derive(Default)]
struct GroupState {
    tasks: JoinSet<Result<()>>,
    closed: bool,
}

pub struct TaskGroup {
    state: Mutex<GroupState>,
    cancel: CancellationToken,
}

impl TaskGroup {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { state: Mutex::new(GroupState::default()), cancel }
    }

    /// Spawns `task` onto the group. Fails once the group has been joined.
    pub fn spawn<F>(&self, task: F) -> Result<()>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let mut state = self.state.lock().map_err(|_| Error::GroupClosed)?;
        if state.closed {
            return Err(Error::GroupClosed);
        }
        let cancel = self.cancel.clone();
        state.tasks.spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::Cancelled),
                result = task => result,
            }
        });
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|s| s.closed).unwrap_or(true)
    }

    /// Waits for every task, then closes the group.
    ///
    /// Returns the first task error. On cancellation the remaining tasks are
    /// aborted and `Error::Cancelled` is returned.
    pub async fn join(&self) -> Result<()> {
        let mut first: Option<Error> = None;
        let mut joined = 0usize;

        loop {
            let mut batch = {
                let mut state = self.state.lock().map_err(|_| Error::GroupClosed)?;
                if state.tasks.is_empty() {
                    state.closed = true;
                    break;
                }
                std::mem::take(&mut state.tasks)
            };

            loop {
                let next = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        batch.abort_all();
                        self.close();
                        return Err(Error::Cancelled);
                    }
                    next = batch.join_next() => next,
                };
                let Some(outcome) = next else { break };
                joined += 1;
                let err = match outcome {
                    Ok(Ok(())) => continue,
                    Ok(Err(err)) => err,
                    Err(join_err) => Error::TaskFailed(join_err.to_string()),
                };
                if first.is_none() {
                    first = Some(err);
                }
            }
        }

        debug!(joined, failed = first.is_some(), "task group joined");
        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
            state.tasks.abort_all();
        }
    }
}
