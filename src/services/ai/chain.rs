//! Ordered provider fallback.
//!
//! Every model call in the crate goes through [`ProviderChain::call`]. Providers are
//! tried one after another in configured order; the first usable reply wins and the
//! rest are never contacted. When every provider fails the caller gets
//! [`ProviderCallResult::Exhausted`] instead of an error.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::{json_payload, LlmProvider, Message};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReply {
    pub content: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCallResult {
    Reply(ProviderReply),
    Exhausted,
}

impl ProviderCallResult {
    pub fn into_reply(self) -> Option<ProviderReply> {
        match self {
            ProviderCallResult::Reply(reply) => Some(reply),
            ProviderCallResult::Exhausted => None,
        }
    }
}

#[derive(Debug, Default)]
struct ChainCounters {
    calls: AtomicU64,
    attempts: AtomicU64,
    fallbacks: AtomicU64,
    exhausted: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ChainStats {
    pub calls: u64,
    pub attempts: u64,
    pub fallbacks: u64,
    pub exhausted: u64,
}

pub struct ProviderChain {
    providers: Vec<Box<dyn LlmProvider>>,
    counters: ChainCounters,
}

impl ProviderChain {
    /// `providers[0]` is the primary, the rest are fallbacks in order.
    pub fn new(providers: Vec<Box<dyn LlmProvider>>) -> Self {
        Self {
            providers,
            counters: ChainCounters::default(),
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.label()).collect()
    }

    pub async fn call(&self, messages: &[Message], json_mode: bool) -> ProviderCallResult {
        self.counters.calls.fetch_add(1, Ordering::Relaxed);

        let mut previous: Option<&str> = None;
        for (attempt, provider) in self.providers.iter().enumerate() {
            let label = provider.label();

            if let Some(failed) = previous {
                self.counters.fallbacks.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(from = failed, to = label, "falling back to next provider");
            }

            self.counters.attempts.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(provider = label, attempt = attempt + 1, json_mode, "calling provider");

            match provider.chat(messages, json_mode).await {
                Ok(content) if json_mode && json_payload(&content).is_none() => {
                    tracing::warn!(provider = label, "provider returned malformed JSON");
                    previous = Some(label);
                }
                Ok(content) => {
                    tracing::info!(provider = label, attempt = attempt + 1, "provider replied");
                    return ProviderCallResult::Reply(ProviderReply {
                        content,
                        provider: label.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(provider = label, error = %e, "provider failed");
                    previous = Some(label);
                }
            }
        }

        self.counters.exhausted.fetch_add(1, Ordering::Relaxed);
        tracing::error!(providers = self.providers.len(), "all providers failed");
        ProviderCallResult::Exhausted
    }

    pub fn stats(&self) -> ChainStats {
        ChainStats {
            calls: self.counters.calls.load(Ordering::Relaxed),
            attempts: self.counters.attempts.load(Ordering::Relaxed),
            fallbacks: self.counters.fallbacks.load(Ordering::Relaxed),
            exhausted: self.counters.exhausted.load(Ordering::Relaxed),
        }
    }
}
