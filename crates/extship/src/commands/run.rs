//! Run command

use anyhow::{Context, Result};
use extship_cms::CmsClient;
use extship_core::{CmsCredentials, DeploymentConfig};
use extship_deploy::{Pipeline, PipelineReport, PipelineStage, PurgeOutcome, RegistrationOutcome};

use crate::cli::RunArgs;
use crate::output;

pub async fn run(args: RunArgs, verbose: u8) -> Result<()> {
    let config = DeploymentConfig::load(&args.input)
        .with_context(|| format!("Failed to load deployment descriptor {}", args.input))?
        .with_verbose(verbose > 0);

    crate::init_tracing(log_level(verbose, config.verbose()));

    let credentials =
        CmsCredentials::from_parts(args.api_base_url, args.api_key, args.management_token)?;
    let client = CmsClient::new(&credentials, config.runtime())?;

    if config.verbose() {
        output::header(&format!(
            "Deploying {} extension {} to {}",
            config.kind(),
            config.name(),
            client.base_url()
        ));
    }

    let mut pipeline = Pipeline::new(&client, &config);
    let result = pipeline.run().await;
    match result {
        Ok(report) => {
            if config.verbose() {
                print_summary(&report);
            }
            print_completion(config.name(), report.problems());
            Ok(())
        }
        Err(err) => {
            output::error(&format!(
                "Deployment of {} failed while {}",
                config.name(),
                failed_stage(pipeline.stages())
            ));
            Err(err.into())
        }
    }
}

/// Effective tracing verbosity; the descriptor's `verbose` counts as `-v`
fn log_level(cli_verbose: u8, descriptor_verbose: bool) -> u8 {
    cli_verbose.max(u8::from(descriptor_verbose))
}

/// The stage that was running when the pipeline failed
fn failed_stage(stages: &[PipelineStage]) -> PipelineStage {
    stages
        .iter()
        .rev()
        .find(|s| **s != PipelineStage::Failed)
        .copied()
        .unwrap_or(PipelineStage::Idle)
}

fn print_summary(report: &PipelineReport) {
    output::header("Deployment summary");
    output::kv(
        "Folder",
        &format!("{} ({})", report.folder.name, report.folder.uid),
    );
    for reference in &report.assets {
        output::kv(
            &reference.asset.title,
            &format!("{} {}", reference.asset.action, reference.asset.url),
        );
    }
    output::kv("Entry point", report.entry_point_url());

    let registration = match &report.registration {
        RegistrationOutcome::Created { notice, .. } => format!("created ({})", notice),
        RegistrationOutcome::Updated { uid, notice } => format!("updated {} ({})", uid, notice),
        RegistrationOutcome::Failed(failure) => format!("failed: {}", failure),
    };
    output::kv("Extension", &registration);

    let purge = match &report.purge {
        PurgeOutcome::Skipped => "skipped".to_string(),
        PurgeOutcome::Completed { deleted, failed } => {
            format!("{} deleted, {} failed", deleted.len(), failed.len())
        }
        PurgeOutcome::ListingFailed { message } => format!("not run: {}", message),
    };
    output::kv("Purge", &purge);
}

fn print_completion(name: &str, problems: usize) {
    if problems == 0 {
        output::success(&format!("Deployment of {} completed", name));
    } else {
        output::partial_success(&format!(
            "Deployment of {} completed with {} problem(s); rerun with -v for details",
            name, problems
        ));
    }
}
