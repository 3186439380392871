//! Personas, instruction templates, and fixed reply strings.

use crate::base::types::{ConversationId, SenderId};

/// Persona for standard-tier callers.
pub const STANDARD_PERSONA: &str = r#####"
# Prime Directive

You are Keng, a friendly assistant lurking in a Vietnamese Telegram group chat.  People summon you with a keyword or a slash command, so every message you receive is addressed to you and deserves an answer.  Keep answers short and direct.  Answer in the language the question was asked in, and default to Vietnamese when unsure.

Telegram renders only lightweight markup, so prefer plain text with occasional bold or italics.  Never use math formatting or large code blocks unless the user asked for code.
"#####;

/// Persona for elevated-tier callers.
pub const ELEVATED_PERSONA: &str = r#####"
# Prime Directive

You are Keng, a capable assistant lurking in a Vietnamese Telegram group chat, and you are currently talking to one of the operators of this bot.  Be thorough: operators ask harder questions and expect complete answers, including reasoning and caveats where they matter.  Answer in the language the question was asked in, and default to Vietnamese when unsure.

Telegram renders only lightweight markup, so prefer plain text with occasional bold or italics.
"#####;

/// English name of the Vietnamese target language, for the translation template.
pub const VIETNAMESE: &str = "Vietnamese";

/// English name of the English target language, for the translation template.
pub const ENGLISH: &str = "English";

/// Instruction template wrapping a translation source text.
pub fn translation_prompt(language: &str, source: &str) -> String {
    format!("Translate the following to {language}:\n\n{source}")
}

// Fixed user-facing reply strings. The bot's audience is Vietnamese, so these
// are not localized further.

pub const PERMISSION_DENIED: &str = "🚫 Bạn không có quyền sử dụng lệnh này.";

pub const COMPLETION_FAILURE: &str = "❌ Đã xảy ra lỗi khi gọi OpenAI. Vui lòng thử lại sau.";

pub const INVALID_ELEVATION_TARGET: &str = "❗ Vui lòng cung cấp ID người dùng hợp lệ (số).";

pub const BOT_ELEVATION_TARGET: &str = "❌ Không thể thêm bot làm admin.";

/// Usage notice for an empty prompt after the command marker or wake keyword.
pub fn empty_prompt_usage(command_marker: &str) -> String {
    format!("Vui lòng nhập câu hỏi sau lệnh {command_marker}.")
}

/// Usage notice for an elevation request without a resolvable target.
pub fn elevation_usage(elevate_command: &str) -> String {
    format!("Cách dùng: {elevate_command} <ID người dùng>\n(Bạn cũng có thể reply tin nhắn của người cần thêm quyền admin.)")
}

pub fn already_elevated(target: SenderId) -> String {
    format!("ℹ️ Người dùng {target} đã có quyền admin.")
}

pub fn elevated(target: SenderId) -> String {
    format!("✅ Đã thêm người dùng {target} làm admin.")
}

/// Reply for the id-discovery command, used to configure the restricted chat
/// and the initial admin set.
pub fn whoami(sender: SenderId, conversation: ConversationId) -> String {
    format!("User ID của bạn: {sender}\nChat ID: {conversation}")
}

/// Welcome and usage instructions for the start command.
pub fn welcome(command_marker: &str, wake_keyword: &str, elevate_command: &str) -> String {
    format!(
        "Xin chào! Tôi là Keng, chatbot sử dụng OpenAI API.\n\
         Các cách sử dụng:\n\
         • {command_marker} <câu hỏi> – Đặt câu hỏi cho tôi.\n\
         • Gõ \"{wake_keyword} <câu hỏi>\", hoặc reply một tin nhắn kèm \"{wake_keyword}\" để hỏi về tin nhắn đó.\n\
         • Reply tin nhắn của tôi để hỏi tiếp.\n\
         • /getid – Lấy ID Telegram của bạn và của nhóm hiện tại.\n\
         • {elevate_command} <user_id> – (Chỉ admin) Thêm một admin mới bằng ID."
    )
}
