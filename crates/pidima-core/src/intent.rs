//! Intent Classifier - maps user text to a canned reply.
//!
//! Rules are an ordered table of (intent, pattern, reply). The first rule
//! whose pattern matches the trimmed, lowercased text wins; when none match,
//! the reply echoes the user's original text.

use regex::Regex;

use crate::ChatError;

/// Classified category of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Greeting,
    Thanks,
    Farewell,
    Identity,
    Theme,
    Troubleshooting,
    Authentication,
    Api,
    Search,
    Help,
    /// No rule matched.
    Fallback,
}

/// One entry in the rule table.
#[derive(Debug, Clone)]
pub struct IntentRule {
    pub intent: Intent,
    pub pattern: Regex,
    pub reply: String,
}

impl IntentRule {
    /// Compile a rule.
    pub fn new(intent: Intent, pattern: &str, reply: impl Into<String>) -> Result<Self, ChatError> {
        Ok(Self {
            intent,
            pattern: Regex::new(pattern)?,
            reply: reply.into(),
        })
    }
}

const GREETING_REPLY: &str = "Hello! How can I help with your documentation today? You can ask me to summarize pages, explain APIs, or point you to relevant sections.";

const THANKS_REPLY: &str = "You're welcome! If you need anything else, just ask.";

const FAREWELL_REPLY: &str = "Goodbye! I'm here whenever you need help with the docs.";

const IDENTITY_REPLY: &str = "I'm the Pidima Assistant. I help you explore, summarize, and answer questions about your project documentation and APIs.";

const THEME_REPLY: &str = "Use the moon/sun button in the header to toggle between dark and light themes. Your choice is saved for next time.";

const TROUBLESHOOTING_REPLY: &str = "Let's debug this together. Please share the exact error message and context (endpoint or page). Common steps: \n- Confirm request method and URL\n- Check authentication/permissions\n- Validate required fields\n- Inspect server logs if available";

const AUTHENTICATION_REPLY: &str = "Authentication tips:\n- Use a short-lived access token and refresh it securely\n- Send the token in the Authorization header (e.g., Bearer <token>)\n- For API keys, restrict by origin/IP when possible\n- Never commit secrets to source control";

const API_REPLY: &str = "For APIs, I can help by outlining request/response shapes, example cURL/JS fetch calls, and common status codes. Tell me the endpoint or describe what you want to achieve.";

const SEARCH_REPLY: &str = "Tell me a concept and I'll point you to relevant docs sections. For example: \"deployment steps\", \"webhook retries\", or \"rate limits\".";

const HELP_REPLY: &str = "Here's what I can do:\n- Answer questions about your docs and APIs\n- Summarize long pages into bullet points\n- Provide code snippets (cURL/JS)\n- Link you to relevant sections\n\nAsk something specific like: \n\"How do I authenticate requests?\" or \"Summarize the onboarding guide.\"";

const FALLBACK_GUIDANCE: &str = "I can help summarize documentation, answer questions, and link you to relevant sections. Try asking something like:\n- \"What does the onboarding API return?\"\n- \"Generate a summary of the deployment steps.\"";

/// Built-in rules in priority order.
const BUILTIN_RULES: &[(Intent, &str, &str)] = &[
    (
        Intent::Greeting,
        r"^(hi|hey|hello|yo|good (morning|afternoon|evening))\b",
        GREETING_REPLY,
    ),
    (Intent::Thanks, r"(thanks|thank you|thx|appreciate it)", THANKS_REPLY),
    (Intent::Farewell, r"(bye|goodbye|see ya|see you)", FAREWELL_REPLY),
    (
        Intent::Identity,
        r"(who are you|what are you|pidima assistant)",
        IDENTITY_REPLY,
    ),
    (Intent::Theme, r"(dark|light).*theme|toggle theme", THEME_REPLY),
    (
        Intent::Troubleshooting,
        r"(error|fail(ed|ure)|exception|bug|issue|not working)",
        TROUBLESHOOTING_REPLY,
    ),
    (
        Intent::Authentication,
        r"(auth|authentication|token|apikey|api key|oauth|login)",
        AUTHENTICATION_REPLY,
    ),
    (
        Intent::Api,
        r"(api|endpoint|rest|graphql|request|response)",
        API_REPLY,
    ),
    (
        Intent::Search,
        r"(search|find|where is|docs?|documentation)",
        SEARCH_REPLY,
    ),
    (
        Intent::Help,
        r"(help|how to|examples?|sample|what can you do)|\?$",
        HELP_REPLY,
    ),
];

/// Ordered, first-match-wins reply selector.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(intent, pattern, reply)| {
                IntentRule::new(*intent, pattern, *reply)
                    .expect("built-in intent patterns are valid regexes")
            })
            .collect();
        Self { rules }
    }
}

impl IntentClassifier {
    /// Classifier with the built-in rule table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifier with no rules; everything falls back to the echo reply.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Builder method to append a rule after the existing ones.
    ///
    /// `pattern` is matched against trimmed, lowercased input.
    pub fn with_rule(
        mut self,
        intent: Intent,
        pattern: &str,
        reply: impl Into<String>,
    ) -> Result<Self, ChatError> {
        self.rules.push(IntentRule::new(intent, pattern, reply)?);
        Ok(self)
    }

    /// First rule matching `text`, if any.
    fn matching_rule(&self, text: &str) -> Option<&IntentRule> {
        let normalized = text.trim().to_lowercase();
        self.rules.iter().find(|r| r.pattern.is_match(&normalized))
    }

    /// Intent of `text`.
    pub fn detect(&self, text: &str) -> Intent {
        self.matching_rule(text)
            .map(|r| r.intent)
            .unwrap_or(Intent::Fallback)
    }

    /// Reply for `text`. Never empty.
    pub fn classify(&self, text: &str) -> String {
        self.classify_with_intent(text).1
    }

    /// Intent and reply for `text`.
    pub fn classify_with_intent(&self, text: &str) -> (Intent, String) {
        match self.matching_rule(text) {
            Some(rule) if !rule.reply.is_empty() => (rule.intent, rule.reply.clone()),
            _ => (Intent::Fallback, fallback_reply(text.trim())),
        }
    }
}

/// Echo the user's text back with generic guidance.
fn fallback_reply(original: &str) -> String {
    format!("You said: \"{}\"\n\n{}", original, FALLBACK_GUIDANCE)
}
