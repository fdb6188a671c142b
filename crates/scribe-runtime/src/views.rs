//! View builders — pure functions of session state.
//!
//! One builder per workflow step, mirroring the interactive cards of the
//! original bot: direction picker, topic choice, outline confirmation, done,
//! plus the loading/ignored/error placeholders.

use scribe_core::action::Action;
use scribe_core::errors::WorkflowError;
use scribe_core::views::{Accent, Button, ButtonKind, View};

/// The fixed set of content directions offered on the first card.
pub const DIRECTIONS: [&str; 4] = ["职场成长", "求职面试", "行业洞察", "个人品牌"];

/// Step 1: pick a direction.
#[must_use]
pub fn direction_view() -> View {
    View::titled("✍️ 开始创作——选一个方向", Accent::Blue).with_buttons(
        DIRECTIONS
            .iter()
            .map(|d| {
                Button::act(
                    *d,
                    ButtonKind::Primary,
                    Action::SelectDirection {
                        direction: (*d).to_string(),
                    },
                )
            })
            .collect(),
    )
}

/// Step 2: pick one of the generated topic candidates, or regenerate.
#[must_use]
pub fn topic_choice_view(direction: &str, topics: &[String]) -> View {
    let mut view = View::titled(format!("📝 选题 · {direction}"), Accent::Green)
        .with_text("选一个选题继续，或换一批：");
    for (i, topic) in topics.iter().enumerate() {
        view = view.with_buttons(vec![Button::act(
            format!("{}. {topic}", i + 1),
            ButtonKind::Default,
            Action::SelectTopic {
                topic: topic.clone(),
            },
        )]);
    }
    view.with_buttons(vec![Button::act(
        "🔄 换一批",
        ButtonKind::Danger,
        Action::RegenerateTopics {
            direction: direction.to_string(),
        },
    )])
}

/// Step 3: confirm, regenerate, or back out of the outline.
#[must_use]
pub fn outline_view(topic: &str, outline: &str) -> View {
    View::titled("📋 确认大纲", Accent::Yellow)
        .with_text(format!("**选题：**{topic}\n\n{outline}"))
        .with_buttons(vec![
            Button::act(
                "✅ 确认，开始写作",
                ButtonKind::Primary,
                Action::ConfirmOutline {
                    topic: topic.to_string(),
                    outline: outline.to_string(),
                },
            ),
            Button::act(
                "🔄 重新生成大纲",
                ButtonKind::Default,
                Action::RegenerateOutline {
                    topic: topic.to_string(),
                },
            ),
            Button::act("← 重新选题", ButtonKind::Danger, Action::BackToDirection),
        ])
}

/// Step 4: done, with the durable document link and a short preview.
#[must_use]
pub fn done_view(topic: &str, doc_url: &str, preview: &str) -> View {
    View::titled("✅ 文章已生成", Accent::Green)
        .with_text(format!("**{topic}**\n\n{preview}"))
        .with_buttons(vec![Button::open("📄 查看完整文章", doc_url)])
}

/// "Processing" placeholder, sent while a transition runs.
#[must_use]
pub fn loading_view(message: &str) -> View {
    View::text_only(format!("⏳ {message}"))
}

/// "Nothing to do" placeholder for dropped or illegal actions.
#[must_use]
pub fn ignored_view(message: &str) -> View {
    View::text_only(format!("ℹ️ {message}"))
}

/// Failure view; the workflow stays resumable from the last committed state.
#[must_use]
pub fn error_view(error: &WorkflowError) -> View {
    let hint = match error {
        WorkflowError::GenerationService(_) | WorkflowError::GenerationParse(_) => {
            "生成失败，点击原按钮可重试"
        }
        WorkflowError::Persistence(_) => "保存文档失败，点击原按钮可重试",
        WorkflowError::Timeout(_) => "处理超时，请重试",
        _ => "请重试",
    };
    View::text_only(format!("❌ 出错了：{error}\n{hint}"))
}

/// First two paragraphs of the article, truncated to `max_chars` characters,
/// with a trailing ellipsis.
#[must_use]
pub fn preview_of(article: &str, max_chars: usize) -> String {
    let head = article
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .take(2)
        .collect::<Vec<_>>()
        .join("\n");
    let truncated: String = head.chars().take(max_chars).collect();
    format!("{truncated}...")
}
