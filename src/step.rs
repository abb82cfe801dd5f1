//! Step controller: runs one step function invocation end to end.
//!
//! ```text
//! Received ──▶ Processing ──▶ Completed   (functions.completeSuccess)
//!                       └───▶ Failed      (functions.completeError)
//! ```
//!
//! Whatever happens inside the step, [`run_step`] reports exactly one
//! terminal state to the platform and fires the [`Ack`] exactly once, as its
//! last action. Error detail goes to the log; the user only ever sees the
//! step's fixed failure message.

use futures::FutureExt;
use serde::Deserialize;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use tokio::sync::oneshot;

use crate::error::StepError;
use crate::platform::{complete_error, complete_success};
use crate::traits::{StepContext, StepFunction};

/// Lifecycle of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Received,
    Processing,
    Completed,
    Failed,
}

/// Payload of a `function_executed` event.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionInvocation {
    pub function_execution_id: String,
    pub function: FunctionRef,
    #[serde(default)]
    pub inputs: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionRef {
    pub callback_id: String,
}

/// Acknowledgement owed to the platform for one event.
///
/// Fires at most once because [`Ack::ack`] consumes it, and at least once
/// because dropping an unfired `Ack` fires it.
#[derive(Debug)]
pub struct Ack {
    tx: Option<oneshot::Sender<()>>,
}

impl Ack {
    /// Create an ack and the receiver the event receiver waits on.
    pub fn channel() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn ack(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(tx) = self.tx.take() {
            // The receiver may already have given up waiting.
            let _ = tx.send(());
        }
    }
}

impl Drop for Ack {
    fn drop(&mut self) {
        self.fire();
    }
}

/// Run `function` for `invocation` and report the outcome to the platform.
///
/// Returns the terminal state (`Completed` or `Failed`).
pub async fn run_step(
    function: &dyn StepFunction,
    invocation: FunctionInvocation,
    ctx: &StepContext,
    ack: Ack,
) -> StepState {
    let execution_id = invocation.function_execution_id;
    let callback_id = function.callback_id().to_string();
    let mut state = StepState::Received;
    tracing::debug!(
        callback_id = %callback_id,
        execution_id = %execution_id,
        ?state,
        "step received"
    );

    state = StepState::Processing;
    tracing::debug!(callback_id = %callback_id, ?state, "step processing");

    let outcome = AssertUnwindSafe(function.execute(invocation.inputs, ctx))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(StepError::Internal(panic_message(panic.as_ref()))));

    state = match outcome {
        Ok(outputs) => match complete_success(ctx.platform.as_ref(), &execution_id, outputs).await {
            Ok(()) => StepState::Completed,
            Err(e) => {
                tracing::error!(
                    callback_id = %callback_id,
                    error = %e,
                    "failed to report step completion"
                );
                report_failure(function, &execution_id, ctx).await;
                StepState::Failed
            }
        },
        Err(e) => {
            tracing::error!(
                callback_id = %callback_id,
                kind = e.kind(),
                error = %e,
                "step failed"
            );
            report_failure(function, &execution_id, ctx).await;
            StepState::Failed
        }
    };

    tracing::info!(callback_id = %callback_id, ?state, "step finished");
    ack.ack();
    state
}

async fn report_failure(function: &dyn StepFunction, execution_id: &str, ctx: &StepContext) {
    let message = function.failure_message();
    if let Err(e) = complete_error(ctx.platform.as_ref(), execution_id, message).await {
        tracing::error!(
            callback_id = function.callback_id(),
            error = %e,
            "failed to report step failure"
        );
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic with non-string payload".to_string()
    }
}
