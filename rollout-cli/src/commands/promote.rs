//! `rollout promote <app> <namespace>`: blue/green cutover.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use rollout_core::{AppName, RolloutConfig};
use rollout_sync::{
    promote::{self, PromotionEvent, PromotionPlan, PromotionStage, StdinConfirm},
    Kubectl, SyncError, SystemRunner, ThreadSleeper,
};

use crate::console::{failure, header, progress, success};

/// Arguments for `rollout promote`.
#[derive(Args, Debug)]
pub struct PromoteArgs {
    /// Application name; deployments are `<app>-blue` and `<app>-green`.
    pub app_name: String,

    /// Namespace holding the deployments and services.
    pub namespace: String,

    /// Replica count for the green deployment.
    #[arg(long, default_value_t = 3)]
    pub replicas: u32,

    /// Cut over without waiting for the operator to confirm the preview.
    #[arg(long)]
    pub skip_confirmation: bool,
}

impl PromoteArgs {
    pub fn run(self, config: &RolloutConfig) -> Result<ExitCode> {
        let plan = PromotionPlan {
            app: AppName::from(self.app_name),
            namespace: self.namespace,
            replicas: self.replicas,
            skip_confirmation: self.skip_confirmation,
            settle_delay: config.settle_delay(),
        };

        header(format!(
            "===== Promoting Green Deployment for {} in {} =====",
            plan.app, plan.namespace
        ));

        let runner = SystemRunner;
        let kubectl = Kubectl::new(&runner);
        let mut confirm = StdinConfirm;

        let result = promote::promote(&plan, &kubectl, &ThreadSleeper, &mut confirm, |event| {
            announce(&plan, event)
        });

        match result {
            Ok(()) => {
                success("✅ Green deployment promoted successfully!");
                Ok(ExitCode::SUCCESS)
            }
            Err(SyncError::PromotionAborted) => {
                failure("Promotion aborted.");
                Ok(ExitCode::FAILURE)
            }
            Err(err) => {
                Err(err).with_context(|| format!("promotion of '{}' failed", plan.app))
            }
        }
    }
}

fn announce(plan: &PromotionPlan, event: PromotionEvent) {
    match event {
        PromotionEvent::Entering(stage) => match stage {
            PromotionStage::GreenScalingUp => progress(format!(
                ">> Scaling up {} to {} replicas...",
                plan.green_deployment(),
                plan.replicas
            )),
            PromotionStage::GreenReady => progress(format!(
                ">> Waiting for {} to be ready...",
                plan.green_deployment()
            )),
            PromotionStage::PreviewOnGreen => progress(format!(
                ">> Switching preview service {} to green...",
                plan.preview_service()
            )),
            PromotionStage::AwaitingConfirmation => success(format!(
                ">> Green deployment is now available for preview at {} service. \
                 Verify it before continuing.",
                plan.preview_service()
            )),
            PromotionStage::ActiveOnGreen => progress(format!(
                ">> Switching active service {} to green...",
                plan.active_service()
            )),
            PromotionStage::BlueScalingDown => progress(format!(
                ">> Scaling down {}...",
                plan.blue_deployment()
            )),
            PromotionStage::BlueActive | PromotionStage::Done => {}
        },
        PromotionEvent::Settling(delay) => progress(format!(
            ">> Waiting {}s for traffic to settle...",
            delay.as_secs()
        )),
    }
}
