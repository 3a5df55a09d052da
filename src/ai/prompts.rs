//! System prompts and user-message lead-ins for the scratchpad actions

/// System prompt for summarization
pub const SUMMARY_SYSTEM: &str = "You are a helpful assistant that creates concise summaries. Provide a clear, well-structured summary of the given text.";

/// System prompt for bullet-point conversion
pub const BULLETS_SYSTEM: &str = "You are a helpful assistant that converts text into well-organized bullet points. Create clear, concise bullet points that capture the key information from the given text. Format your response as an HTML unordered list using <ul> and <li> tags without any additional text or explanations.";

/// System prompt for fixing formatting, spelling and grammar
pub const TIDY_SYSTEM: &str = "You are a helpful assistant that improves text by fixing formatting, spelling, grammar, and readability. Fix any errors while preserving the original meaning and tone. Return only the corrected text without any explanatory notes or surrounding text.";

pub const SUMMARY_USER: &str = "Please summarize the following text:";

pub const BULLETS_USER: &str = "Please convert the following text into bullet points:";

pub const TIDY_USER: &str =
    "Please fix the formatting, spelling, grammar, and readability of the following text:";

/// Build the user message: lead-in, blank line, then the text verbatim.
pub fn user_message(lead_in: &str, text: &str) -> String {
    format!("{}\n\n{}", lead_in, text)
}
