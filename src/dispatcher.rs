use std::sync::Mutex;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error, info, warn};

use crate::cooldown::ChannelCooldowns;
use crate::generator::{ReplyGenerator, TANGLED_FALLBACK};
use crate::platform::{ChatSink, IncomingMessage};
use crate::policy::ReplyPolicy;

/// What happened to one incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Bot-authored or blank
    Ignored,
    /// Cooldown or dice said no
    Declined,
    Replied,
    /// The reply could not be sent but the fallback line was
    FellBack,
    /// Neither the reply nor the fallback could be sent
    Failed,
}

/// Per-message handler: owns the cooldown table and the reply dice.
pub struct Dispatcher {
    policy: ReplyPolicy,
    generator: ReplyGenerator,
    cooldowns: ChannelCooldowns,
    rng: Mutex<StdRng>,
}

impl Dispatcher {
    pub fn new(policy: ReplyPolicy, generator: ReplyGenerator) -> Self {
        Self::with_rng(policy, generator, StdRng::from_entropy())
    }

    pub fn with_rng(policy: ReplyPolicy, generator: ReplyGenerator, rng: StdRng) -> Self {
        Self {
            policy,
            generator,
            cooldowns: ChannelCooldowns::new(),
            rng: Mutex::new(rng),
        }
    }

    #[cfg(test)]
    pub fn cooldowns(&self) -> &ChannelCooldowns {
        &self.cooldowns
    }

    /// Handle one message. Never returns an error: failures are logged and
    /// answered with a single best-effort fallback.
    pub async fn handle<S: ChatSink + ?Sized>(
        &self,
        sink: &S,
        message: &IncomingMessage,
    ) -> DispatchOutcome {
        if message.author_is_bot || message.text.trim().is_empty() {
            return DispatchOutcome::Ignored;
        }

        let received_at = Instant::now();
        let decision = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            self.policy
                .decide(message, received_at, &self.cooldowns, &mut *rng)
        };

        debug!(
            "Reply decision for {} ({}) in {}:{}: {:?}",
            message.user_name, message.user_id, message.platform, message.chat_id, decision
        );

        if !decision.should_reply {
            return DispatchOutcome::Declined;
        }

        let reply = {
            let _typing = sink.start_typing(&message.chat_id);
            self.generator.generate(&message.text).await
        };

        match sink.send(&message.chat_id, &reply).await {
            Ok(()) => {
                self.cooldowns.record(&message.chat_id, received_at);
                info!(
                    "Replied in {} (referenced: {}, {} chars, {} channels on cooldown)",
                    message.chat_id,
                    decision.referenced,
                    reply.chars().count(),
                    self.cooldowns.len()
                );
                DispatchOutcome::Replied
            }
            Err(e) => {
                error!("Error while sending reply: {:#}", e);
                match sink.send(&message.chat_id, TANGLED_FALLBACK).await {
                    Ok(()) => {
                        warn!("Sent fallback reply in {}", message.chat_id);
                        DispatchOutcome::FellBack
                    }
                    Err(e) => {
                        error!("Error sending fallback message: {:#}", e);
                        DispatchOutcome::Failed
                    }
                }
            }
        }
    }
}
