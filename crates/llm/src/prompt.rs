//! Prompt building for the model conversation path
//!
//! The system prompt restates the deterministic rules declaratively so the model
//! behaves consistently when it handles open-ended turns. A language override is
//! always appended last and wins over any language instruction above it.

use utility_agent_config::AgentConfig;
use utility_agent_core::{GenerateRequest, Language, Message, Turn, TurnRole};

/// Base system prompt
pub fn system_prompt(agent: &AgentConfig) -> String {
    format!(
        "You are the customer service assistant of {company}, the water and electricity utility. \
You help customers understand why their water or electricity service is interrupted.

Rules:
1. Work out whether the problem concerns water, electricity or both from the customer's words.
2. Water contract numbers start with 3701 and electricity contract numbers start with 4801, in the form \"3701455886 / 1014871\". \
If the customer has not given the contract number for the service in question, ask for it and offer to read it from a photo of the bill.
3. If the contract number belongs to the other service, say so and ask for the right one.
4. Only state account or zone facts returned by the tools. Check maintenance for the customer's zone first, then payment status. Never invent balances, dates or outage reasons.
5. If payment is late, give the amount due, the payment channels ({company} mobile app, payment agencies such as Wafacash or Cash Plus, or the bank) and say that reconnection is not instantaneous after payment.
6. If payments are up to date and there is no maintenance, say it is most likely a local technical issue and give the support number {phone}.
7. When both services are in question, handle water first and electricity after.
8. Only mention the other service if the customer asked about it and it is also disrupted.

Format: one short continuous paragraph of plain text. No lists, no headings, no markdown, no emojis. The reply may be read aloud.",
        company = agent.company_name,
        phone = agent.support_phone,
    )
}

/// Instruction pinning the reply language
pub fn language_override(language: Language) -> String {
    let instruction = match language {
        Language::Arabic => "Reply only in Modern Standard Arabic, even if the customer writes in Darija or in Latin letters.",
        Language::French => "Reply only in French.",
        Language::English => "Reply only in English.",
    };
    format!(
        "LANGUAGE OVERRIDE: {} This overrides every other language instruction in this prompt.",
        instruction
    )
}

/// Opening line for a new conversation
pub fn greeting(company: &str, language: Language) -> String {
    match language {
        Language::Arabic => format!("مرحباً بك في خدمة عملاء {}. كيف يمكنني مساعدتك اليوم؟", company),
        Language::French => format!(
            "Bienvenue au service client {}. Comment puis-je vous aider aujourd'hui ?",
            company
        ),
        Language::English => format!(
            "Welcome to {} customer service. How can I help you today?",
            company
        ),
    }
}

/// Assembles the request for one model turn
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    messages: Vec<Message>,
}

impl PromptBuilder {
    /// Start from the system prompt with the language override layered on
    pub fn new(agent: &AgentConfig, language: Language) -> Self {
        let system = format!("{}\n\n{}", system_prompt(agent), language_override(language));
        Self {
            messages: vec![Message::system(system)],
        }
    }

    /// Add prior turns, oldest first
    pub fn with_history(mut self, history: &[Turn]) -> Self {
        self.messages.extend(history.iter().map(|turn| match turn.role {
            TurnRole::User => Message::user(turn.content.clone()),
            TurnRole::Assistant => Message::assistant(turn.content.clone()),
        }));
        self
    }

    pub fn user_message(mut self, message: &str) -> Self {
        self.messages.push(Message::user(message));
        self
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn build(self) -> GenerateRequest {
        GenerateRequest {
            messages: self.messages,
            ..Default::default()
        }
    }
}
