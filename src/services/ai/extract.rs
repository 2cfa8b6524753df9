use crate::models::{BookingField, ChatMessage, ExtractedFields};
use crate::services::ai::{LlmProvider, Message};

const SYSTEM_PROMPT: &str = r#"You extract booking details for a booking assistant. Read the customer's latest message in the context of the conversation.

Return ONLY valid JSON (no markdown, no explanation) with this exact structure:
{
  "customer_name": "full name or null",
  "date": "date as YYYY-MM-DD or null",
  "time": "time as HH:MM in 24-hour format or null",
  "party_size": 4,
  "email": "email address or null"
}

Rules:
- Only fill a value the customer actually stated. Use null for anything else.
- Resolve relative dates ("tomorrow", "next Friday") against today's date given below.
- party_size is an integer number of people, or null.
"#;

pub async fn extract_fields(
    llm: &dyn LlmProvider,
    history: &[ChatMessage],
    latest_message: &str,
    awaiting: Option<BookingField>,
) -> anyhow::Result<ExtractedFields> {
    let mut messages: Vec<Message> = history
        .iter()
        .map(|m| Message {
            role: m.role.clone(),
            content: m.content.clone(),
        })
        .collect();

    messages.push(Message {
        role: "user".to_string(),
        content: latest_message.to_string(),
    });

    let today = chrono::Local::now().date_naive().format("%Y-%m-%d");
    let asking = awaiting
        .map(|f| format!("\nThe assistant just asked for the customer's {}.", f.label()))
        .unwrap_or_default();
    let system = format!("{SYSTEM_PROMPT}\nToday's date: {today}.{asking}");

    let response = llm.chat(&system, &messages).await?;

    Ok(parse_extraction_response(&response))
}

fn parse_extraction_response(response: &str) -> ExtractedFields {
    if let Ok(fields) = serde_json::from_str::<ExtractedFields>(response) {
        return fields;
    }

    // Strip markdown code fences
    let cleaned = response
        .trim()
        .strip_prefix("```json")
        .or_else(|| response.trim().strip_prefix("```"))
        .unwrap_or(response.trim());
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(fields) = serde_json::from_str::<ExtractedFields>(cleaned) {
        return fields;
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            if let Ok(fields) = serde_json::from_str::<ExtractedFields>(&cleaned[start..=end]) {
                return fields;
            }
        }
    }

    tracing::warn!("failed to parse LLM extraction as JSON, treating as empty");
    ExtractedFields::default()
}
