//! Article share links.
//!
//! Every share action first fires an eligibility report for the article.
//! The report is best-effort: it runs in the background and its failure is
//! only logged.

use std::str::FromStr;
use std::sync::Arc;

use url::Url;

use crate::api::EligibilityReporter;
use crate::constants::{routes, SHARE_TEXT_MAX_CHARS, TWITTER_VIA};

const TWITTER_INTENT_URL: &str = "https://twitter.com/intent/tweet";
const TELEGRAM_SHARE_URL: &str = "https://t.me/share/url";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareTarget {
    Twitter,
    Telegram,
    /// Copy the permalink to the clipboard
    Copy,
}

impl ShareTarget {
    pub const ALL: [ShareTarget; 3] = [ShareTarget::Twitter, ShareTarget::Telegram, ShareTarget::Copy];

    pub fn label(&self) -> &'static str {
        match self {
            ShareTarget::Twitter => "twitter",
            ShareTarget::Telegram => "telegram",
            ShareTarget::Copy => "copy",
        }
    }
}

impl FromStr for ShareTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShareTarget::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown share target '{}' (expected twitter, telegram or copy)", s))
    }
}

/// Public permalink of an article.
pub fn article_url(app_url: &str, article_id: &str) -> String {
    format!(
        "{}{}/{}",
        app_url.trim_end_matches('/'),
        routes::ARTICLE_PERMALINK,
        article_id
    )
}

/// First 100 characters of the article text.
pub fn share_text(text: &str) -> String {
    text.chars().take(SHARE_TEXT_MAX_CHARS).collect()
}

/// What a share button opens (or copies) for an article.
pub fn share_link(target: ShareTarget, share_url: &str, text: &str) -> String {
    let text = share_text(text);
    match target {
        ShareTarget::Twitter => with_query(
            TWITTER_INTENT_URL,
            &[("text", text.as_str()), ("via", TWITTER_VIA), ("url", share_url)],
        ),
        ShareTarget::Telegram => {
            with_query(TELEGRAM_SHARE_URL, &[("url", share_url), ("text", text.as_str())])
        }
        ShareTarget::Copy => share_url.to_string(),
    }
}

fn with_query(base: &str, params: &[(&str, &str)]) -> String {
    match Url::parse_with_params(base, params) {
        Ok(url) => url.into(),
        // Bases are constants; fall back to the bare base rather than panic.
        Err(_) => base.to_string(),
    }
}

/// Share buttons for one article.
pub struct ArticleShare {
    reporter: Arc<dyn EligibilityReporter>,
    article_id: String,
    share_url: String,
    text: String,
}

impl ArticleShare {
    pub fn new(
        reporter: Arc<dyn EligibilityReporter>,
        app_url: &str,
        article_id: &str,
        text: &str,
    ) -> Self {
        Self {
            reporter,
            article_id: article_id.to_string(),
            share_url: article_url(app_url, article_id),
            text: text.to_string(),
        }
    }

    pub fn share_url(&self) -> &str {
        &self.share_url
    }

    /// Report eligibility in the background and return the link for `target`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn share(&self, target: ShareTarget) -> String {
        self.report_eligibility();
        share_link(target, &self.share_url, &self.text)
    }

    /// Like [`share`](Self::share) but waits for the eligibility report.
    /// Report failures are still only logged.
    pub async fn share_reported(&self, target: ShareTarget) -> String {
        if let Err(e) = self.reporter.report_eligibility(&self.article_id).await {
            tracing::debug!(article_id = %self.article_id, error = %e, "share: eligibility report failed");
        }
        share_link(target, &self.share_url, &self.text)
    }

    fn report_eligibility(&self) {
        let reporter = self.reporter.clone();
        let article_id = self.article_id.clone();
        tokio::spawn(async move {
            if let Err(e) = reporter.report_eligibility(&article_id).await {
                tracing::debug!(article_id = %article_id, error = %e, "share: eligibility report failed");
            }
        });
    }
}
