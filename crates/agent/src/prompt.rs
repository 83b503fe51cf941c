//! Prompt assembly for the reason/act loop.
//!
//! Each step's prompt layers, in order: system instructions (persona,
//! action grammar, tool specs), retrieved knowledge, long-term memory
//! hits, the plan hint, the short-term conversation window, the current
//! query, and the scratchpad so far.

use verdant_core::knowledge::KnowledgeSnippet;
use verdant_core::memory::MemoryRecord;
use verdant_core::message::{Role, Turn};
use verdant_core::plan::Plan;
use verdant_core::provider::ChatMessage;
use verdant_core::tool::ToolSpec;

use crate::scratchpad::Scratchpad;

/// The system prompt: persona, action grammar, and the tool catalogue.
pub fn system_prompt(tools: &[ToolSpec]) -> String {
    let mut out = String::from(
        "You are Verdant, a friendly garden advisor helping users care for \
         their plants.\n\n\
         You reason step by step. At every step respond with exactly ONE \
         JSON object and nothing else:\n\
         - To use a tool: {\"action\": \"tool\", \"tool\": \"<name>\", \
         \"parameters\": { ... }}\n\
         - To give your final answer: {\"action\": \"finish\", \
         \"answer\": \"<message for the user>\"}\n\n\
         Use tools when you need specific information (weather, \
         calculations, reminders, web search). Answer directly when you \
         already know enough. Be warm and practical.\n\n\
         Available tools:\n",
    );

    for tool in tools {
        out.push_str(&format!(
            "- {}: {}\n  Parameters schema: {}\n",
            tool.name, tool.description, tool.parameters
        ));
    }

    out
}

/// The corrective instruction appended after a malformed action.
pub fn corrective_instruction() -> &'static str {
    "Your last response was not a valid action. Respond with exactly one \
     JSON object: {\"action\": \"tool\", \"tool\": \"<name>\", \
     \"parameters\": {...}} or {\"action\": \"finish\", \"answer\": \"...\"}."
}

/// Assemble the full message list for one loop step.
pub fn build_messages(
    query: &str,
    plan: &Plan,
    tools: &[ToolSpec],
    recent: &[Turn],
    memories: &[MemoryRecord],
    snippets: &[KnowledgeSnippet],
    scratchpad: &Scratchpad,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(system_prompt(tools))];

    if let Some(context) = context_block(plan, memories, snippets) {
        messages.push(ChatMessage::system(context));
    }

    for turn in recent {
        messages.push(match turn.role {
            Role::User => ChatMessage::user(&turn.text),
            Role::Agent => ChatMessage::assistant(&turn.text),
        });
    }

    messages.push(ChatMessage::user(query));

    if !scratchpad.is_empty() {
        messages.push(ChatMessage::user(format!(
            "Progress so far:\n\n{}Decide your next action.",
            scratchpad.render()
        )));
    }

    messages
}

/// Knowledge, memory, and plan context as one system message. Returns
/// `None` when there is nothing to add.
fn context_block(
    plan: &Plan,
    memories: &[MemoryRecord],
    snippets: &[KnowledgeSnippet],
) -> Option<String> {
    let mut sections = Vec::new();

    if !snippets.is_empty() {
        let mut block = String::from("Relevant plant knowledge:\n");
        for snippet in snippets {
            block.push_str(&format!("- {}\n", snippet.text));
        }
        sections.push(block);
    }

    if !memories.is_empty() {
        let mut block = String::from("Relevant context from this user's past conversations:\n");
        for record in memories {
            block.push_str(&format!("- {}\n", record.text.replace('\n', " / ")));
        }
        sections.push(block);
    }

    if !plan.tool_hints.is_empty() {
        sections.push(format!(
            "Planned approach: this looks like a {} question; the {} tool(s) \
             will likely help.\n",
            plan.intent,
            plan.tool_hints.join(", ")
        ));
    }

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n"))
    }
}
