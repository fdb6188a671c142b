//! Chat text-command parsing.
//!
//! Users trigger the workflow by messaging the bot (directly or with an
//! @-mention). Anything that is not a recognized command is silently
//! ignored — group chats are full of unrelated text.

/// A recognized chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start (or restart) the content-creation workflow.
    StartWriting,
    /// Show the help menu.
    Help,
}

/// Help menu text.
pub const HELP_TEXT: &str = "📖 内容创作机器人\n\n发以下消息触发：\n• 写文章 / 开始创作 → 开始创作流程\n• 帮助 → 显示此菜单";

/// Parse a chat message into a command, stripping @-mention tokens first.
#[must_use]
pub fn parse(text: &str) -> Option<Command> {
    let cleaned = text
        .split_whitespace()
        .filter(|token| !token.starts_with('@'))
        .collect::<Vec<_>>()
        .join(" ");
    let cleaned = cleaned.trim();

    if cleaned == "帮助" || cleaned.eq_ignore_ascii_case("help") {
        return Some(Command::Help);
    }
    if ["写文章", "开始创作", "创作"]
        .iter()
        .any(|prefix| cleaned.starts_with(prefix))
    {
        return Some(Command::StartWriting);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_start_commands() {
        assert_eq!(parse("写文章"), Some(Command::StartWriting));
        assert_eq!(parse("开始创作"), Some(Command::StartWriting));
        assert_eq!(parse("创作一篇"), Some(Command::StartWriting));
    }

    #[test]
    fn recognizes_help_in_both_languages() {
        assert_eq!(parse("帮助"), Some(Command::Help));
        assert_eq!(parse("HELP"), Some(Command::Help));
    }

    #[test]
    fn strips_mention_tokens() {
        assert_eq!(parse("@小助手 写文章"), Some(Command::StartWriting));
        assert_eq!(parse("@bot 帮助"), Some(Command::Help));
    }

    #[test]
    fn ignores_unrelated_text() {
        assert_eq!(parse("今天天气不错"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("@bot"), None);
    }
}
