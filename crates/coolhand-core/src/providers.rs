//! Known LLM provider API hosts.
//!
//! The list is closed: a destination is only captured when its host is one of
//! these entries or a subdomain of one. Matching is on dot boundaries, so a
//! host that merely contains a provider name (`anagramica.com`,
//! `api.openai.com.example.net`) never matches.

use serde::Serialize;

/// A provider API host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderEntry {
    /// API hostname (lowercase, no port).
    pub host: &'static str,
    /// Human-friendly provider name.
    pub name: &'static str,
}

impl ProviderEntry {
    const fn new(host: &'static str, name: &'static str) -> Self {
        Self { host, name }
    }

    /// Checks if a host is this entry or one of its subdomains.
    ///
    /// The host must already be lowercase and stripped of its port.
    pub fn matches(&self, host: &str) -> bool {
        if host == self.host {
            return true;
        }
        match host.strip_suffix(self.host) {
            Some(prefix) => prefix.len() > 1 && prefix.ends_with('.'),
            None => false,
        }
    }
}

/// LLM provider API hosts whose traffic is captured.
pub const PROVIDERS: &[ProviderEntry] = &[
    // OpenAI
    ProviderEntry::new("api.openai.com", "OpenAI"),
    // Azure OpenAI (per-resource subdomains)
    ProviderEntry::new("openai.azure.com", "Azure OpenAI"),
    // Anthropic
    ProviderEntry::new("api.anthropic.com", "Anthropic"),
    // Google
    ProviderEntry::new("generativelanguage.googleapis.com", "Google AI"),
    // Cohere
    ProviderEntry::new("api.cohere.ai", "Cohere"),
    ProviderEntry::new("api.cohere.com", "Cohere"),
    // Mistral
    ProviderEntry::new("api.mistral.ai", "Mistral"),
    // Groq
    ProviderEntry::new("api.groq.com", "Groq"),
    // Together AI
    ProviderEntry::new("api.together.xyz", "Together AI"),
    // Perplexity
    ProviderEntry::new("api.perplexity.ai", "Perplexity"),
    // DeepSeek
    ProviderEntry::new("api.deepseek.com", "DeepSeek"),
    // xAI
    ProviderEntry::new("api.x.ai", "xAI"),
    // Fireworks
    ProviderEntry::new("api.fireworks.ai", "Fireworks"),
    // OpenRouter
    ProviderEntry::new("openrouter.ai", "OpenRouter"),
    // Replicate
    ProviderEntry::new("api.replicate.com", "Replicate"),
    // Hugging Face inference
    ProviderEntry::new("api-inference.huggingface.co", "Hugging Face"),
];

/// Returns the provider entry for a bare host, if any.
///
/// Accepts hosts with a trailing port or mixed case.
pub fn provider_for_host(host: &str) -> Option<&'static ProviderEntry> {
    let host = host.split(':').next().unwrap_or(host);
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    PROVIDERS.iter().find(|entry| entry.matches(&host))
}

/// Returns the provider name for a URL, if it points at a known provider.
pub fn provider_name(url: &str) -> Option<&'static str> {
    let host = crate::classifier::host_of(url)?;
    provider_for_host(&host).map(|entry| entry.name)
}
