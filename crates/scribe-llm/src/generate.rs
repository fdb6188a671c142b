//! Generation adapter: per-step prompt construction and response parsing.
//!
//! Each workflow transition that generates content goes through one method
//! here. Parsing is deliberately narrow and fails loudly — a malformed
//! completion becomes [`WorkflowError::GenerationParse`] instead of a
//! best-effort default, so partial results never reach a committed session.

use std::sync::Arc;

use tracing::{debug, instrument};

use scribe_core::errors::WorkflowError;
use scribe_core::session::TOPIC_CANDIDATE_COUNT;

use crate::provider::{CompletionService, ProviderError};

/// Token budget for the topic-candidate step.
const TOPICS_MAX_TOKENS: u32 = 300;
/// Token budget for the outline step.
const OUTLINE_MAX_TOKENS: u32 = 400;
/// Token budget for the article step.
const ARTICLE_MAX_TOKENS: u32 = 2000;

/// Stateless wrapper over the completion service, one method per
/// generation step.
pub struct Generator {
    completion: Arc<dyn CompletionService>,
}

impl Generator {
    /// Wrap a completion service.
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    /// Generate up to three topic candidates for a direction.
    ///
    /// The prompt asks for exactly three numbered lines; the parser strips
    /// the numbering. Fewer usable lines than requested are passed through
    /// as-is — no padding, no fabrication. Zero usable lines is a parse
    /// failure.
    #[instrument(skip(self))]
    pub async fn generate_topics(&self, direction: &str) -> Result<Vec<String>, WorkflowError> {
        let prompt = format!(
            "你是一个内容策划专家。针对「{direction}」方向，生成 {TOPIC_CANDIDATE_COUNT} 个适合在职场社交媒体发布的选题标题。\n\
             要求：\n\
             - 每个标题独占一行，前面加序号\"1. 2. 3.\"\n\
             - 标题要有吸引力，能引发职场人共鸣\n\
             - 不超过 25 字\n\
             - 只输出 {TOPIC_CANDIDATE_COUNT} 个标题，不要其他内容"
        );
        let text = self.complete(&prompt, TOPICS_MAX_TOKENS).await?;
        let topics = parse_numbered_lines(&text);
        if topics.is_empty() {
            return Err(WorkflowError::GenerationParse(format!(
                "no topic lines in completion: {:?}",
                text.chars().take(80).collect::<String>()
            )));
        }
        debug!(count = topics.len(), "parsed topic candidates");
        Ok(topics)
    }

    /// Generate an outline for a topic. Free text, trimmed only.
    #[instrument(skip(self))]
    pub async fn generate_outline(&self, topic: &str) -> Result<String, WorkflowError> {
        let prompt = format!(
            "你是一个内容策划专家。为以下选题生成一个文章大纲：\n\
             选题：{topic}\n\n\
             要求：\n\
             - 3-5 个章节\n\
             - 每个章节一行，用\"## \"开头\n\
             - 每章节后面加 1 句简短说明（括号内）\n\
             - 只输出大纲，不要其他内容"
        );
        self.complete(&prompt, OUTLINE_MAX_TOKENS).await
    }

    /// Generate the full article from a topic and its confirmed outline.
    /// Free text, trimmed only.
    #[instrument(skip_all)]
    pub async fn generate_article(
        &self,
        topic: &str,
        outline: &str,
    ) -> Result<String, WorkflowError> {
        let prompt = format!(
            "你是一个专业的职场内容作者。根据以下选题和大纲，写一篇完整的文章。\n\n\
             选题：{topic}\n\n\
             大纲：\n{outline}\n\n\
             要求：\n\
             - 总字数 800-1200 字\n\
             - 语言亲切自然，有洞察力，避免空话套话\n\
             - 每个章节充实展开，有具体例子或数据支撑\n\
             - 结尾有明确的行动建议或总结\n\
             - 直接输出文章正文，不要重复标题"
        );
        self.complete(&prompt, ARTICLE_MAX_TOKENS).await
    }

    /// Run one completion and map provider failures into the workflow
    /// taxonomy. Blank output counts as a service failure, not a parse one.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, WorkflowError> {
        let text = self
            .completion
            .complete(prompt, max_tokens)
            .await
            .map_err(|e: ProviderError| WorkflowError::GenerationService(e.to_string()))?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(WorkflowError::GenerationService(
                "completion returned no usable text".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }
}

/// Strip `"N. "`-style numbering from each line, keep non-empty lines,
/// take at most [`TOPIC_CANDIDATE_COUNT`].
fn parse_numbered_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_numbering)
        .filter(|l| !l.is_empty())
        .take(TOPIC_CANDIDATE_COUNT)
        .map(str::to_string)
        .collect()
}

/// Remove a leading `"12."` (plus surrounding whitespace) if present.
fn strip_numbering(line: &str) -> &str {
    let trimmed = line.trim();
    let rest = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() < trimmed.len() {
        if let Some(after_dot) = rest.strip_prefix('.') {
            return after_dot.trim_start();
        }
    }
    trimmed
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockCompletionService;
    use assert_matches::assert_matches;

    fn generator_returning(text: &str) -> Generator {
        let mut mock = MockCompletionService::new();
        let owned = text.to_string();
        let _ = mock
            .expect_complete()
            .returning(move |_, _| Ok(owned.clone()));
        Generator::new(Arc::new(mock))
    }

    fn failing_generator(message: &str) -> Generator {
        let mut mock = MockCompletionService::new();
        let owned = message.to_string();
        let _ = mock.expect_complete().returning(move |_, _| {
            Err(ProviderError::Api {
                status: 500,
                message: owned.clone(),
            })
        });
        Generator::new(Arc::new(mock))
    }

    // ── Numbered-line parsing ───────────────────────────────────────────

    #[test]
    fn parse_strips_numbering() {
        let parsed = parse_numbered_lines("1. 第一个\n2. 第二个\n3. 第三个");
        assert_eq!(parsed, vec!["第一个", "第二个", "第三个"]);
    }

    #[test]
    fn parse_keeps_unnumbered_lines() {
        let parsed = parse_numbered_lines("第一个\n2. 第二个");
        assert_eq!(parsed, vec!["第一个", "第二个"]);
    }

    #[test]
    fn parse_caps_at_three() {
        let parsed = parse_numbered_lines("1. a\n2. b\n3. c\n4. d");
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn parse_drops_blank_lines() {
        let parsed = parse_numbered_lines("1. a\n\n  \n2. b");
        assert_eq!(parsed, vec!["a", "b"]);
    }

    #[test]
    fn strip_numbering_requires_dot_after_digits() {
        // "2023年" starts with digits but is not a list marker.
        assert_eq!(strip_numbering("2023年的求职市场"), "2023年的求职市场");
        assert_eq!(strip_numbering("12. 有点长的标题"), "有点长的标题");
    }

    // ── Topic generation ────────────────────────────────────────────────

    #[tokio::test]
    async fn topics_happy_path() {
        let generator = generator_returning("1. 面试潜规则\n2. 简历避坑\n3. 谈薪技巧");
        let topics = generator.generate_topics("求职面试").await.unwrap();
        assert_eq!(topics, vec!["面试潜规则", "简历避坑", "谈薪技巧"]);
    }

    #[tokio::test]
    async fn topics_pass_through_short_sets() {
        let generator = generator_returning("1. 只有一个");
        let topics = generator.generate_topics("求职面试").await.unwrap();
        assert_eq!(topics, vec!["只有一个"]);
    }

    #[tokio::test]
    async fn topics_prompt_mentions_direction() {
        let mut mock = MockCompletionService::new();
        let _ = mock
            .expect_complete()
            .withf(|prompt, max_tokens| prompt.contains("求职面试") && *max_tokens == 300)
            .returning(|_, _| Ok("1. a".to_string()));
        let generator = Generator::new(Arc::new(mock));
        let _ = generator.generate_topics("求职面试").await.unwrap();
    }

    #[tokio::test]
    async fn topics_all_blank_is_parse_error() {
        let generator = generator_returning("1.\n2.\n3.");
        let err = generator.generate_topics("求职面试").await.unwrap_err();
        assert_matches!(err, WorkflowError::GenerationParse(_));
    }

    #[tokio::test]
    async fn topics_service_error_is_generation_service() {
        let generator = failing_generator("upstream down");
        let err = generator.generate_topics("求职面试").await.unwrap_err();
        assert_matches!(err, WorkflowError::GenerationService(m) if m.contains("upstream down"));
    }

    // ── Outline & article ───────────────────────────────────────────────

    #[tokio::test]
    async fn outline_is_trimmed_pass_through() {
        let generator = generator_returning("\n## 第一章（引入）\n## 第二章（展开）\n");
        let outline = generator.generate_outline("面试潜规则").await.unwrap();
        assert_eq!(outline, "## 第一章（引入）\n## 第二章（展开）");
    }

    #[tokio::test]
    async fn article_prompt_includes_topic_and_outline() {
        let mut mock = MockCompletionService::new();
        let _ = mock
            .expect_complete()
            .withf(|prompt, max_tokens| {
                prompt.contains("面试潜规则") && prompt.contains("## 第一章") && *max_tokens == 2000
            })
            .returning(|_, _| Ok("正文".to_string()));
        let generator = Generator::new(Arc::new(mock));
        let article = generator
            .generate_article("面试潜规则", "## 第一章")
            .await
            .unwrap();
        assert_eq!(article, "正文");
    }

    #[tokio::test]
    async fn blank_completion_is_service_error() {
        let generator = generator_returning("   \n  ");
        let err = generator.generate_outline("t").await.unwrap_err();
        assert_matches!(err, WorkflowError::GenerationService(_));
    }
}
