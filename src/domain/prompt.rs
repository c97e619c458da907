//! Prompt composition for the generation step
//!
//! Pure text assembly: no I/O, no state. These functions sit in the hot
//! path of every step, so determinism here is a tested contract.

use crate::domain::action::ActionKind;

/// Builds the capability-specific generation prompt from the subject
/// prompt and the fetched payload.
pub fn compose(subject_prompt: &str, payload: &str, action: ActionKind) -> String {
    match action {
        ActionKind::News => format!(
            "User asked: \"{subject_prompt}\". Based on this news data: \"{payload}\", \
             create a relevant social media post or informative response that directly \
             addresses what the user requested. Be engaging and informative."
        ),
        ActionKind::Weather => format!(
            "User asked: \"{subject_prompt}\". Based on this weather data: \"{payload}\", \
             create a helpful response that directly addresses the user's request. \
             Include practical advice or relevant commentary."
        ),
        ActionKind::Github => format!(
            "User asked: \"{subject_prompt}\". Based on this GitHub data: \"{payload}\", \
             create an informative response that directly addresses what the user \
             requested about repositories or development topics."
        ),
    }
}

/// Combines the generated text and the fetched payload into the final
/// step string: `<ai> <api> #<action>`. The order and format are a stable
/// contract consumed by the presentation layer.
pub fn combine_responses(ai_response: &str, api_response: &str, action: ActionKind) -> String {
    format!("{} {} {}", ai_response, api_response, action.hashtag())
}
