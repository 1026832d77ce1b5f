//! Response adapter: folds decoded events into caller-facing output shapes.

use crate::stream::StreamEvent;
use futures::{pin_mut, Stream, StreamExt};
use grokrelay_types::InvocationError;

/// Result shape of one completed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationResult {
    Text(String),
    ImageMarkdown(String),
    VideoTag(String),
}

/// Outcome of folding a text-mode event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFold {
    pub text: String,
    /// Whether the explicit terminator was observed. A fold without it is a
    /// partial result and reported as a neutral token outcome.
    pub terminated: bool,
}

/// Concatenate content deltas in arrival order.
///
/// Media references and malformed markers are ignored; zero deltas is a
/// valid empty result, not an error.
pub async fn fold_text<S>(events: S) -> TextFold
where
    S: Stream<Item = StreamEvent>,
{
    pin_mut!(events);

    let mut text = String::new();
    let mut terminated = false;

    while let Some(event) = events.next().await {
        match event {
            StreamEvent::ContentDelta { text: delta } => text.push_str(&delta),
            StreamEvent::Terminator => {
                terminated = true;
                break;
            },
            StreamEvent::MediaReference { .. } | StreamEvent::Malformed => {},
        }
    }

    TextFold { text, terminated }
}

/// Render media locators as a Markdown image block.
///
/// One image reference per locator, alt text 1-indexed, newline-joined.
/// An empty locator list is a generation failure.
pub fn render_image_markdown(
    urls: &[String],
    asset_host: &str,
) -> Result<InvocationResult, InvocationError> {
    if urls.is_empty() {
        return Err(InvocationError::generation(
            "image generation failed: upstream returned no media",
        ));
    }

    let lines: Vec<String> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            format!("![Generated Image {}]({})", i + 1, absolutize(url, asset_host))
        })
        .collect();

    Ok(InvocationResult::ImageMarkdown(lines.join("\n")))
}

/// Render the single expected media locator as an embeddable video tag.
pub fn render_video_tag(
    urls: &[String],
    asset_host: &str,
) -> Result<InvocationResult, InvocationError> {
    let Some(url) = urls.first() else {
        return Err(InvocationError::generation(
            "video generation failed: upstream returned no media",
        ));
    };

    Ok(InvocationResult::VideoTag(format!(
        r#"<video src="{}" controls="controls" width="500" height="300"></video>"#,
        absolutize(url, asset_host)
    )))
}

/// Prefix the asset host onto locators that are not already absolute.
fn absolutize(url: &str, asset_host: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        let relative = url.trim_start_matches('/');
        if asset_host.ends_with('/') {
            format!("{}{}", asset_host, relative)
        } else {
            format!("{}/{}", asset_host, relative)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use grokrelay_types::InvocationStage;

    const HOST: &str = "https://assets.grok.com/";

    #[tokio::test]
    async fn test_text_fold_concatenates_in_order() {
        let events = stream::iter(vec![
            StreamEvent::ContentDelta { text: "a".to_string() },
            StreamEvent::ContentDelta { text: "b".to_string() },
            StreamEvent::Terminator,
        ]);
        let fold = fold_text(events).await;
        assert_eq!(fold.text, "ab");
        assert!(fold.terminated);
    }

    #[tokio::test]
    async fn test_text_fold_ignores_media_and_malformed() {
        let events = stream::iter(vec![
            StreamEvent::Malformed,
            StreamEvent::ContentDelta { text: "only".to_string() },
            StreamEvent::MediaReference { urls: vec!["x.png".to_string()] },
            StreamEvent::Terminator,
        ]);
        let fold = fold_text(events).await;
        assert_eq!(fold.text, "only");
    }

    #[tokio::test]
    async fn test_text_fold_zero_deltas_is_empty_not_error() {
        let events = stream::iter(vec![StreamEvent::Terminator]);
        let fold = fold_text(events).await;
        assert_eq!(fold.text, "");
        assert!(fold.terminated);
    }

    #[tokio::test]
    async fn test_text_fold_without_terminator_is_partial() {
        let events = stream::iter(vec![StreamEvent::ContentDelta { text: "cut".to_string() }]);
        let fold = fold_text(events).await;
        assert_eq!(fold.text, "cut");
        assert!(!fold.terminated);
    }

    #[test]
    fn test_image_markdown_single_relative_locator() {
        let result =
            render_image_markdown(&["img1.png".to_string()], HOST).expect("render");
        assert_eq!(
            result,
            InvocationResult::ImageMarkdown(
                "![Generated Image 1](https://assets.grok.com/img1.png)".to_string()
            )
        );
    }

    #[test]
    fn test_image_markdown_mixed_locators_newline_joined() {
        let urls =
            vec!["users/a.png".to_string(), "https://cdn.example.com/b.png".to_string()];
        let InvocationResult::ImageMarkdown(block) =
            render_image_markdown(&urls, HOST).expect("render")
        else {
            panic!("wrong shape");
        };

        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "![Generated Image 1](https://assets.grok.com/users/a.png)");
        assert_eq!(lines[1], "![Generated Image 2](https://cdn.example.com/b.png)");
    }

    #[test]
    fn test_image_markdown_empty_list_fails_generation() {
        let err = render_image_markdown(&[], HOST).expect_err("must fail");
        assert_eq!(err.stage, InvocationStage::Generation);
    }

    #[test]
    fn test_video_tag_normalizes_and_keeps_controls() {
        let InvocationResult::VideoTag(tag) =
            render_video_tag(&["videos/out.mp4".to_string()], HOST).expect("render")
        else {
            panic!("wrong shape");
        };
        assert!(tag.contains(r#"src="https://assets.grok.com/videos/out.mp4""#));
        assert!(tag.contains(r#"controls="controls""#));
        assert!(tag.contains(r#"width="500""#));
        assert!(tag.contains(r#"height="300""#));
    }

    #[test]
    fn test_video_tag_requires_a_locator() {
        let err = render_video_tag(&[], HOST).expect_err("must fail");
        assert_eq!(err.stage, InvocationStage::Generation);
    }

    #[test]
    fn test_absolutize_handles_host_without_slash() {
        assert_eq!(
            absolutize("a.png", "https://assets.grok.com"),
            "https://assets.grok.com/a.png"
        );
        assert_eq!(
            absolutize("/a.png", "https://assets.grok.com/"),
            "https://assets.grok.com/a.png"
        );
    }
}
