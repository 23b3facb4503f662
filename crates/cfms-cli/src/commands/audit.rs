use cfms_core::audit::{AuditReport, AuditSummary};
use cfms_core::entities::{AuditAssignment, CourseFolder};
use cfms_core::enums::Verdict;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuditCommands;
use crate::commands::shared::actor::require_actor;
use crate::commands::shared::parse::{parse_enum, parse_ratings};
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct QueueEntry {
    folder: CourseFolder,
    assignment: AuditAssignment,
}

#[derive(Debug, Serialize)]
struct QueueResponse {
    queue: Vec<QueueEntry>,
}

#[derive(Debug, Serialize)]
struct AssignmentsResponse {
    assignments: Vec<AuditAssignment>,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    folder_id: String,
    #[serde(flatten)]
    summary: AuditSummary,
}

/// Handle `cfms audit`.
pub async fn handle(action: &AuditCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let actor = require_actor(flags)?;
    match action {
        AuditCommands::Assign {
            id,
            auditors,
            expected_version,
        } => output(
            &ctx.service
                .assign_audit(id, actor, auditors, *expected_version)
                .await?,
            flags.format,
        ),
        AuditCommands::Unassign { id, expected_version } => output(
            &ctx.service.unassign_audit(id, actor, *expected_version).await?,
            flags.format,
        ),
        AuditCommands::Report {
            id,
            decision,
            feedback,
            ratings,
            expected_version,
        } => {
            let report = AuditReport {
                decision: decision
                    .as_deref()
                    .map(|d| parse_enum::<Verdict>(d, "decision"))
                    .transpose()?,
                overall_feedback: feedback.clone(),
                ratings: parse_ratings(ratings)?,
            };
            let response = ctx
                .service
                .submit_audit_report(id, actor, &report, *expected_version)
                .await?;
            output(&response, flags.format)
        }
        AuditCommands::Summary { id } => {
            let summary = ctx.service.audit_summary(id, actor).await?;
            output(
                &SummaryResponse {
                    folder_id: id.clone(),
                    summary,
                },
                flags.format,
            )
        }
        AuditCommands::Assignments { id } => {
            // Same visibility as the summary.
            ctx.service.audit_summary(id, actor).await?;
            let assignments = ctx.service.list_assignments(id).await?;
            output(&AssignmentsResponse { assignments }, flags.format)
        }
        AuditCommands::Queue => {
            let queue = ctx
                .service
                .audit_queue(actor)
                .await?
                .into_iter()
                .map(|(folder, assignment)| QueueEntry { folder, assignment })
                .collect();
            output(&QueueResponse { queue }, flags.format)
        }
    }
}
