//! Bulk answer evaluation.
//!
//! Evaluates every slot of an answer sheet concurrently and writes each
//! result back to its question's position, so completion order never
//! affects result order.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::error::EvaluationError;
use crate::judge::EquivalenceJudge;
use crate::model::{AnswerRecord, EvaluationResult, Question};
use crate::options::{display_answer, display_correct_answer};
use crate::quiz::{Advance, EvaluationOutcome, EvaluationTicket, QuizSession};

/// Configuration for bulk evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    /// Maximum concurrent equivalence checks.
    pub parallelism: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

/// Evaluates answer sheets with an [`EquivalenceJudge`].
#[derive(Clone)]
pub struct EvaluationEngine {
    judge: EquivalenceJudge,
    config: EvaluationConfig,
}

impl EvaluationEngine {
    pub fn new(judge: EquivalenceJudge, config: EvaluationConfig) -> Self {
        Self { judge, config }
    }

    pub fn judge(&self) -> &EquivalenceJudge {
        &self.judge
    }

    /// Evaluate all answers against their questions.
    ///
    /// Either every question gets a result, in question order, or the whole
    /// batch fails.
    pub async fn evaluate_batch(
        &self,
        questions: &[Question],
        answers: &[AnswerRecord],
    ) -> Result<Vec<EvaluationResult>, EvaluationError> {
        if questions.len() != answers.len() {
            return Err(EvaluationError::CountMismatch {
                questions: questions.len(),
                answers: answers.len(),
            });
        }

        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut futures = FuturesUnordered::new();

        for (index, question) in questions.iter().enumerate() {
            let raw_answer = answers
                .iter()
                .find(|a| a.question_index == index)
                .map(|a| a.raw_answer.as_str())
                .unwrap_or_default();
            let semaphore = Arc::clone(&semaphore);
            let judge = &self.judge;

            futures.push(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| EvaluationError::PoolClosed)?;
                let is_correct = judge.is_equivalent(question, raw_answer).await;
                Ok::<_, EvaluationError>((
                    index,
                    EvaluationResult {
                        question: question.clone(),
                        displayed_answer: display_answer(question, raw_answer),
                        displayed_correct_answer: display_correct_answer(question),
                        is_correct,
                    },
                ))
            });
        }

        let mut slots: Vec<Option<EvaluationResult>> = vec![None; questions.len()];
        while let Some(settled) = futures.next().await {
            let (index, result) = settled?;
            slots[index] = Some(result);
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.ok_or(EvaluationError::MissingResult(i)))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            count = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "answer sheet evaluated"
        );
        Ok(results)
    }

    /// Evaluate a submitted ticket, keeping its generation tag.
    pub async fn evaluate_ticket(
        &self,
        ticket: &EvaluationTicket,
    ) -> Result<EvaluationOutcome, EvaluationError> {
        let results = self
            .evaluate_batch(&ticket.questions, &ticket.answers)
            .await?;
        Ok(EvaluationOutcome {
            generation: ticket.generation,
            results,
        })
    }

    /// Advance the quiz and, if that submitted it, evaluate and apply the
    /// outcome.
    ///
    /// A failed batch puts the quiz back on its last question and is
    /// returned as the error.
    pub async fn advance(&self, session: &mut QuizSession) -> anyhow::Result<Advance> {
        let advance = session.next()?;
        if let Advance::Submitted(ticket) = &advance {
            match self.evaluate_ticket(ticket).await {
                Ok(outcome) => {
                    session.complete_evaluation(outcome);
                }
                Err(e) => {
                    session.fail_evaluation(ticket.generation, &e.to_string());
                    return Err(e.into());
                }
            }
        }
        Ok(advance)
    }
}
