//! Paid prompt enhancement.
//!
//! The pipeline is fixed: price the model, check the caller's balance, call
//! exactly one provider, and debit only after the provider answered. Nothing
//! here touches the entry; persisting the result is the handler's job.
//!
//! Check and debit are separate ledger calls, so two concurrent enhancements
//! by the same user can both pass the check and drive the balance negative.

use std::sync::Arc;

use database::PromptHistoryEntry;
use enhance_core::{CompletionProvider, CreditLedger, Credits, LedgerError, ProviderError};
use tracing::{debug, info, warn};

use crate::policy::Actor;
use crate::pricing::{self, ProviderFamily};
use crate::style::{build_instruction, Style};

/// A completed, paid enhancement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancementResult {
    pub optimized_prompt: String,
    /// The model name as requested.
    pub model: String,
    pub tokens_used: u32,
    pub credits_spent: Credits,
    /// Ledger transaction for the debit.
    pub transaction_id: String,
}

/// Every way an enhancement attempt can end.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhancementOutcome {
    Success(EnhancementResult),
    /// Balance below the model price. No provider call was made.
    InsufficientCredits { required: Credits, current: Credits },
    /// The model belongs to no known provider family.
    UnsupportedModel(String),
    /// The provider failed. Nothing was debited.
    ProviderError(ProviderError),
    /// The ledger failed during the balance check or the debit.
    LedgerError(LedgerError),
}

/// Prices, dispatches and bills enhancements.
pub struct EnhancementService {
    gpt: Arc<dyn CompletionProvider>,
    claude: Arc<dyn CompletionProvider>,
    ledger: Arc<dyn CreditLedger>,
}

impl EnhancementService {
    /// Create a service from the GPT-family provider, the Claude-family
    /// provider and the credit ledger.
    pub fn new(
        gpt: Arc<dyn CompletionProvider>,
        claude: Arc<dyn CompletionProvider>,
        ledger: Arc<dyn CreditLedger>,
    ) -> Self {
        Self { gpt, claude, ledger }
    }

    /// The ledger used for billing.
    pub fn ledger(&self) -> &Arc<dyn CreditLedger> {
        &self.ledger
    }

    /// Enhance `entry`'s original prompt on behalf of `actor`.
    pub async fn enhance(
        &self,
        actor: &Actor,
        entry: &PromptHistoryEntry,
        model: &str,
        style: Style,
    ) -> EnhancementOutcome {
        let required = pricing::price_for(model);

        let current = match self.ledger.balance(&actor.user_id).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(user = %actor.user_id, error = %e, "Credit balance lookup failed");
                return EnhancementOutcome::LedgerError(e);
            }
        };

        if current < required {
            info!(
                user = %actor.user_id,
                entry_id = %entry.id,
                required = %required,
                current = %current,
                "Insufficient credits for enhancement"
            );
            return EnhancementOutcome::InsufficientCredits { required, current };
        }

        let instruction = build_instruction(style, &entry.original_prompt);

        let provider = match ProviderFamily::for_model(model) {
            Some(ProviderFamily::Gpt) => &self.gpt,
            Some(ProviderFamily::Claude) => &self.claude,
            None => return EnhancementOutcome::UnsupportedModel(model.to_string()),
        };

        info!(
            entry_id = %entry.id,
            model = %model,
            style = %style,
            provider = provider.name(),
            "Starting enhancement"
        );

        let completion = match provider
            .complete(&instruction, pricing::provider_model_id(model))
            .await
        {
            Ok(completion) => completion,
            Err(e) => {
                warn!(entry_id = %entry.id, model = %model, error = %e, "Provider call failed");
                return EnhancementOutcome::ProviderError(e);
            }
        };

        let reason = format!("prompt enhancement {} ({})", entry.id, model);
        let receipt = match self.ledger.debit(&actor.user_id, required, &reason).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(
                    entry_id = %entry.id,
                    user = %actor.user_id,
                    error = %e,
                    "Debit failed after provider call"
                );
                return EnhancementOutcome::LedgerError(e);
            }
        };

        debug!(
            entry_id = %entry.id,
            transaction_id = %receipt.transaction_id,
            amount = %required,
            tokens = completion.tokens_consumed,
            "Debited credits for enhancement"
        );

        EnhancementOutcome::Success(EnhancementResult {
            optimized_prompt: completion.text.trim().to_string(),
            model: model.to_string(),
            tokens_used: completion.tokens_consumed,
            credits_spent: required,
            transaction_id: receipt.transaction_id,
        })
    }
}
