//! Blue/green promotion.
//!
//! ```text
//! BlueActive → GreenScalingUp → GreenReady → PreviewOnGreen
//!   → [AwaitingConfirmation] → ActiveOnGreen → BlueScalingDown → Done
//! ```
//!
//! Transitions only move forward. Entering a stage performs its action; the
//! first failing action stops the promotion with no rollback. Blue is scaled
//! down only after the active service selects green and the settle delay has
//! elapsed.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::time::Duration;

use serde_json::{json, Value};

use rollout_core::AppName;

use crate::error::SyncError;
use crate::kubectl::Kubectl;
use crate::poll::Sleeper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionStage {
    BlueActive,
    GreenScalingUp,
    GreenReady,
    PreviewOnGreen,
    AwaitingConfirmation,
    ActiveOnGreen,
    BlueScalingDown,
    Done,
}

impl PromotionStage {
    /// Successor stage; `None` once `Done`.
    pub fn next(self, skip_confirmation: bool) -> Option<PromotionStage> {
        use PromotionStage::*;
        match self {
            BlueActive => Some(GreenScalingUp),
            GreenScalingUp => Some(GreenReady),
            GreenReady => Some(PreviewOnGreen),
            PreviewOnGreen if skip_confirmation => Some(ActiveOnGreen),
            PreviewOnGreen => Some(AwaitingConfirmation),
            AwaitingConfirmation => Some(ActiveOnGreen),
            ActiveOnGreen => Some(BlueScalingDown),
            BlueScalingDown => Some(Done),
            Done => None,
        }
    }
}

impl fmt::Display for PromotionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PromotionStage::BlueActive => "blue active",
            PromotionStage::GreenScalingUp => "green scaling up",
            PromotionStage::GreenReady => "green ready",
            PromotionStage::PreviewOnGreen => "preview on green",
            PromotionStage::AwaitingConfirmation => "awaiting confirmation",
            PromotionStage::ActiveOnGreen => "active on green",
            PromotionStage::BlueScalingDown => "blue scaling down",
            PromotionStage::Done => "done",
        };
        f.write_str(label)
    }
}

/// Inputs of one promotion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionPlan {
    pub app: AppName,
    pub namespace: String,
    pub replicas: u32,
    pub skip_confirmation: bool,
    pub settle_delay: Duration,
}

impl PromotionPlan {
    pub fn green_deployment(&self) -> String {
        format!("{}-green", self.app)
    }

    pub fn blue_deployment(&self) -> String {
        format!("{}-blue", self.app)
    }

    pub fn preview_service(&self) -> String {
        format!("{}-bg-preview", self.app)
    }

    pub fn active_service(&self) -> String {
        format!("{}-bg-active", self.app)
    }
}

/// Strategic merge patch pointing a service at the green pods.
pub fn green_selector_patch() -> Value {
    json!({ "spec": { "selector": { "version": "green" } } })
}

/// Operator gate between preview and active cutover.
pub trait Confirm {
    /// `Ok(true)` to proceed, `Ok(false)` to abort.
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;
}

/// Waits for Enter on stdin. End of input aborts.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        Ok(read > 0)
    }
}

/// Progress notifications for the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionEvent {
    Entering(PromotionStage),
    Settling(Duration),
}

pub const CONFIRM_PROMPT: &str = "Press Enter to continue with the promotion or Ctrl+C to abort...";

/// Drive the promotion from `BlueActive` to `Done`.
pub fn promote(
    plan: &PromotionPlan,
    kubectl: &Kubectl<'_>,
    sleeper: &dyn Sleeper,
    confirm: &mut dyn Confirm,
    mut on_event: impl FnMut(PromotionEvent),
) -> Result<(), SyncError> {
    let mut stage = PromotionStage::BlueActive;
    while let Some(next) = stage.next(plan.skip_confirmation) {
        on_event(PromotionEvent::Entering(next));
        tracing::debug!("promotion of {}: {stage} -> {next}", plan.app);
        enter(next, plan, kubectl, sleeper, confirm, &mut on_event)?;
        stage = next;
    }
    tracing::info!("promotion of {} in {} complete", plan.app, plan.namespace);
    Ok(())
}

fn enter(
    stage: PromotionStage,
    plan: &PromotionPlan,
    kubectl: &Kubectl<'_>,
    sleeper: &dyn Sleeper,
    confirm: &mut dyn Confirm,
    on_event: &mut impl FnMut(PromotionEvent),
) -> Result<(), SyncError> {
    match stage {
        PromotionStage::BlueActive | PromotionStage::Done => {}
        PromotionStage::GreenScalingUp => {
            kubectl.scale_deployment(&plan.green_deployment(), &plan.namespace, plan.replicas)?;
        }
        PromotionStage::GreenReady => {
            kubectl.rollout_status(&plan.green_deployment(), &plan.namespace)?;
        }
        PromotionStage::PreviewOnGreen => {
            kubectl.patch_streamed(
                "service",
                &plan.preview_service(),
                &plan.namespace,
                &green_selector_patch(),
            )?;
        }
        PromotionStage::AwaitingConfirmation => {
            if !confirm.confirm(CONFIRM_PROMPT).map_err(SyncError::Confirm)? {
                return Err(SyncError::PromotionAborted);
            }
        }
        PromotionStage::ActiveOnGreen => {
            kubectl.patch_streamed(
                "service",
                &plan.active_service(),
                &plan.namespace,
                &green_selector_patch(),
            )?;
            on_event(PromotionEvent::Settling(plan.settle_delay));
            sleeper.sleep(plan.settle_delay);
        }
        PromotionStage::BlueScalingDown => {
            kubectl.scale_deployment(&plan.blue_deployment(), &plan.namespace, 0)?;
        }
    }
    Ok(())
}
