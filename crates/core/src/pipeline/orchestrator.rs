//! # Conversation Orchestrator
//!
//! Runs one question through plan, research, assemble, critique, and
//! finalize, handing each stage's artifact to the next.
//!
//! Structured stages never fail on bad output: an unparseable plan falls
//! back to an excerpt or the question, research to a minimal record, and
//! the critic to a REVISE verdict. Agent failures and cancellation end the
//! turn.

use super::events::{PipelineEvent, PipelineEventKind};
use super::invoker::RoleInvoker;
use super::options::ConversationOptions;
use super::result::ConversationResult;
use super::stage::PipelineStage;
use crate::agent::Agent;
use crate::error::{PipelineError, Result};
use crate::roles::assembler::{assemble_payload, final_payload};
use crate::roles::critic::critic_payload;
use crate::roles::planner::planner_payload;
use crate::roles::research::research_instruction;
use crate::roles::{CriticVerdict, PlanArtifact, RoleRegistry, ResearchRecord};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Drives conversation turns on a shared agent.
///
/// `run_conversation` takes `&self`; turns may overlap.
pub struct Orchestrator {
    invoker: RoleInvoker,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl Orchestrator {
    pub fn new(agent: Arc<dyn Agent>, registry: Arc<RoleRegistry>) -> Self {
        Self {
            invoker: RoleInvoker::new(agent, registry),
            event_tx: None,
        }
    }

    /// Set event channel for lifecycle updates
    pub fn with_event_channel(mut self, tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Emit an event
    async fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }

    /// Answer `question`, streaming each stage as it runs
    #[tracing::instrument(skip(self, options), fields(question_preview = %question.chars().take(50).collect::<String>()))]
    pub async fn run_conversation(
        &self,
        question: &str,
        options: &ConversationOptions,
    ) -> Result<ConversationResult> {
        self.emit(
            PipelineEvent::new(PipelineEventKind::ConversationStarted)
                .with_data(json!({ "question": question })),
        )
        .await;

        match self.run_stages(question, options).await {
            Ok(result) => {
                self.emit(
                    PipelineEvent::new(PipelineEventKind::ConversationCompleted).with_data(json!({
                        "warnings": result.warnings.len(),
                        "degraded": result.degraded(),
                    })),
                )
                .await;
                Ok(result)
            }
            Err(PipelineError::Cancelled) => {
                tracing::info!("Conversation stopped by user");
                self.emit(PipelineEvent::new(PipelineEventKind::ConversationStopped))
                    .await;
                Err(PipelineError::Cancelled)
            }
            Err(e) => {
                tracing::error!(error = %e, "Conversation failed");
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        question: &str,
        options: &ConversationOptions,
    ) -> Result<ConversationResult> {
        if options.console() {
            println!("\n===== NEW CONVERSATION =====\n[User] {}\n", question);
        }

        // Stage 1: Plan
        let mut stage = PipelineStage::Plan;
        let planner = self.run_stage(stage, &planner_payload(question)?, options).await?;
        let plan = PlanArtifact::from_output(&planner);
        let research_focus = plan.research_focus(&planner, question);
        self.stage_completed(stage, &planner, plan.is_parsed()).await;
        tracing::debug!(focus = %research_focus, "Research focus selected");

        // Stage 2: Research
        stage = stage.advance();
        let preference = options.research_preference;
        let research_task = research_instruction(&research_focus, preference);
        let research_raw = self.run_stage(stage, &research_task, options).await?;
        let research = ResearchRecord::from_output(&research_raw);
        self.stage_completed(stage, &research_raw, !research.is_fallback())
            .await;

        let warnings = research.value.warnings(preference);
        for warning in &warnings {
            tracing::warn!(preference = %preference, "{}", warning);
            self.emit(
                PipelineEvent::new(PipelineEventKind::Warning)
                    .with_stage(stage)
                    .with_data(json!({ "message": warning })),
            )
            .await;
        }

        // Stage 3: Assemble candidate
        stage = stage.advance();
        let candidate = self
            .run_stage(stage, &assemble_payload(&research.value)?, options)
            .await?;
        self.stage_completed(stage, &candidate, true).await;

        // Stage 4: Critique
        stage = stage.advance();
        let critic_task = critic_payload(&candidate, &research.value)?;
        let critic_raw = self.run_stage(stage, &critic_task, options).await?;
        let critic = CriticVerdict::from_output(&critic_raw);
        self.stage_completed(stage, &critic_raw, !critic.is_fallback())
            .await;

        // Stage 5: Finalize
        stage = stage.advance();
        let final_task = final_payload(&candidate, &critic.value, &research.value)?;
        let final_answer = self.run_stage(stage, &final_task, options).await?;
        self.stage_completed(stage, &final_answer, true).await;

        if options.console() {
            println!("\n===== FINAL ANSWER =====\n");
            println!("{}", final_answer);
            println!("\n===== END CONVERSATION =====\n");
        }

        tracing::info!(
            verdict = ?critic.value.verdict,
            warnings = warnings.len(),
            "Conversation complete"
        );

        Ok(ConversationResult {
            user_question: question.to_string(),
            planner,
            plan,
            research_focus,
            research_raw,
            research,
            candidate,
            critic_raw,
            critic,
            final_answer,
            warnings,
        })
    }

    /// Invoke the role for `stage` and return its collected text
    async fn run_stage(
        &self,
        stage: PipelineStage,
        task: &str,
        options: &ConversationOptions,
    ) -> Result<String> {
        let Some(role) = stage.role() else {
            return Ok(String::new());
        };

        tracing::info!(stage = ?stage, role = %role, "Stage started");
        self.emit(
            PipelineEvent::new(PipelineEventKind::StageStarted)
                .with_stage(stage)
                .with_data(json!({ "role": role.name() })),
        )
        .await;

        let output = self.invoker.invoke(role, task, stage.tag(), options).await?;
        Ok(output.raw_text)
    }

    async fn stage_completed(&self, stage: PipelineStage, raw: &str, parsed: bool) {
        if !parsed {
            tracing::warn!(stage = ?stage, "Stage output unparsable, using fallback");
        }
        self.emit(
            PipelineEvent::new(PipelineEventKind::StageCompleted)
                .with_stage(stage)
                .with_data(json!({ "chars": raw.chars().count(), "parsed": parsed })),
        )
        .await;
    }
}
