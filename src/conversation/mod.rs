//! Guided annotation conversation
//!
//! A fixed three-step flow elicits the user-supplied semantics for one
//! ingested file:
//!
//! 1. **Confirmation** — the user confirms the extracted fields and record
//!    count (affirmative-token check; a miss is retryable and mutates
//!    nothing).
//! 2. **Description** — free text describing what the file represents.
//! 3. **Finalization** — names the process and marks the record complete.
//!
//! The engine is externally driven: each call carries the record identifier,
//! the caller's step index, and the reply, and the position is re-derived
//! from the step index rather than held in memory. Callers may be served by
//! different workers between steps; the persisted record is the only state.
//! Validation and the record write complete before the next prompt is
//! returned, so the call is the unit of atomicity from the caller's view.

use chrono::Utc;
use tracing::info;

use crate::models::{AnnotationRecord, HistoryEntry};
use crate::store::RecordStore;
use crate::types::{AppError, AppResult, ConversationStatus};

/// Number of annotation steps. Step indices above this are replays of a
/// finished conversation.
pub const STEP_COUNT: usize = 3;

const STEP_CONFIRM: usize = 1;
const STEP_DESCRIBE: usize = 2;
const STEP_FINALIZE: usize = 3;

const COMPLETION_MESSAGE: &str =
    "All annotation steps are complete for this file. It is ready for reporting.";

/// What a single advance call produced.
#[derive(Debug, Clone)]
pub struct Transition {
    pub status: ConversationStatus,
    pub prompt: String,
    pub record: AnnotationRecord,
}

pub struct ConversationEngine {
    affirmative_tokens: Vec<String>,
}

impl ConversationEngine {
    pub fn new(affirmative_tokens: Vec<String>) -> Self {
        Self { affirmative_tokens }
    }

    /// Advance the conversation for one record by one step.
    ///
    /// Step 0 starts a session: it returns the first prompt without touching
    /// the record. Steps 1..=STEP_COUNT validate the reply, write the target
    /// field, append a history entry and persist before returning the next
    /// prompt. Anything past STEP_COUNT is an idempotent replay of the
    /// completion message.
    pub async fn advance(
        &self,
        store: &RecordStore,
        id: &str,
        step: usize,
        reply: &str,
    ) -> AppResult<Transition> {
        if step == 0 {
            let record = store.read(id).await?;
            let prompt = step_prompt(STEP_CONFIRM, &record);
            info!(record_id = %id, "Conversation started");
            return Ok(Transition {
                status: ConversationStatus::Started,
                prompt,
                record,
            });
        }

        if step > STEP_COUNT {
            let record = store.read(id).await?;
            info!(record_id = %id, step, "Replay of a completed conversation");
            return Ok(Transition {
                status: ConversationStatus::Completed,
                prompt: COMPLETION_MESSAGE.to_string(),
                record,
            });
        }

        let affirmatives = &self.affirmative_tokens;
        let record = store
            .update(id, |record| apply_step(record, step, reply, affirmatives))
            .await?;

        let status = if step < STEP_COUNT {
            ConversationStatus::InProgress
        } else {
            ConversationStatus::Completed
        };
        let prompt = if step < STEP_COUNT {
            step_prompt(step + 1, &record)
        } else {
            COMPLETION_MESSAGE.to_string()
        };

        info!(record_id = %id, step, status = %status, "Conversation advanced");
        Ok(Transition {
            status,
            prompt,
            record,
        })
    }
}

/// Validate the reply for `step` and fold it into the record. Returning an
/// error here means nothing is persisted (see `RecordStore::update`).
fn apply_step(
    record: &mut AnnotationRecord,
    step: usize,
    reply: &str,
    affirmatives: &[String],
) -> AppResult<()> {
    let trimmed = reply.trim();
    let prompt = step_prompt(step, record);

    match step {
        STEP_CONFIRM => {
            if !is_affirmative(trimmed, affirmatives) {
                return Err(AppError::ConfirmationRejected(
                    "The reply did not confirm the extracted fields; please answer the \
                     confirmation step again"
                        .to_string(),
                ));
            }
            record.confirmed = true;
        }
        STEP_DESCRIBE => {
            if trimmed.is_empty() {
                return Err(AppError::InvalidRequest(
                    "The description must not be empty".to_string(),
                ));
            }
            record.description = trimmed.to_string();
        }
        STEP_FINALIZE => {
            record.process_name = trimmed.to_string();
            record.completed = true;
        }
        _ => {
            return Err(AppError::InvalidRequest(format!(
                "Unknown conversation step {step}"
            )));
        }
    }

    record.history.push(HistoryEntry {
        step,
        prompt,
        reply: reply.to_string(),
        timestamp: Utc::now(),
    });
    Ok(())
}

/// The prompt presented for a given step, interpolating the record's
/// derived metadata where the flow calls for it.
fn step_prompt(step: usize, record: &AnnotationRecord) -> String {
    match step {
        STEP_CONFIRM => format!(
            "I found {} records in \"{}\" with the fields: {}. Does this look right?",
            record.record_count,
            record.original_filename,
            record.fields.join(", "),
        ),
        STEP_DESCRIBE => {
            "Great. In a sentence or two, what does this file represent?".to_string()
        }
        STEP_FINALIZE => {
            "Finally, what should this process be called in reports?".to_string()
        }
        _ => COMPLETION_MESSAGE.to_string(),
    }
}

fn is_affirmative(reply: &str, affirmatives: &[String]) -> bool {
    let lowered = reply.to_lowercase();
    affirmatives
        .iter()
        .any(|token| lowered.contains(token.as_str()))
}
