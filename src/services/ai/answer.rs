use crate::models::ChatMessage;
use crate::services::ai::{LlmProvider, Message};

const SYSTEM_PROMPT: &str = r#"You are an AI Booking Assistant, a friendly and professional virtual assistant that helps users with bookings and answers their questions.

- Answer questions about services and policies using the knowledge base excerpts below when they are relevant.
- If the excerpts do not contain the answer, say so briefly instead of guessing.
- If the user wants to make a booking, tell them you can take their booking and ask for their full name.
- Keep responses concise but helpful.
"#;

/// Answers a free-form question, grounding the reply in retrieved context
/// when there is any.
pub async fn answer_question(
    llm: &dyn LlmProvider,
    history: &[ChatMessage],
    question: &str,
    context: Option<&str>,
) -> anyhow::Result<String> {
    let mut messages: Vec<Message> = history
        .iter()
        .map(|m| Message {
            role: m.role.clone(),
            content: m.content.clone(),
        })
        .collect();

    messages.push(Message {
        role: "user".to_string(),
        content: question.to_string(),
    });

    let system = match context {
        Some(ctx) if !ctx.trim().is_empty() => {
            format!("{SYSTEM_PROMPT}\nKnowledge base excerpts:\n{ctx}")
        }
        _ => format!("{SYSTEM_PROMPT}\nNo knowledge base excerpts are available."),
    };

    let reply = llm.chat(&system, &messages).await?;
    Ok(reply.trim().to_string())
}
