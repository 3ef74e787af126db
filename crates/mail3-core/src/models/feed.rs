use serde::{Deserialize, Deserializer, Serialize};

use super::time_format::format_feed_time;
use crate::address::truncate_address;

/// One subscription message in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    #[serde(rename = "uuid")]
    pub id: String,
    /// Server-reported read state
    #[serde(default)]
    pub seen: bool,
    /// Opened by the user in this session. Never sent by the server.
    #[serde(skip)]
    pub clicked_locally: bool,
    #[serde(default)]
    pub subject: String,
    /// Author address
    #[serde(default)]
    pub writer: String,
    /// Unix seconds
    #[serde(default, deserialize_with = "de_timestamp")]
    pub created_at: i64,
}

impl FeedItem {
    pub fn new(id: impl Into<String>, seen: bool) -> Self {
        Self {
            id: id.into(),
            seen,
            clicked_locally: false,
            subject: String::new(),
            writer: String::new(),
            created_at: 0,
        }
    }

    pub fn is_unread(&self) -> bool {
        !self.seen && !self.clicked_locally
    }

    pub fn writer_label(&self) -> String {
        truncate_address(&self.writer)
    }

    pub fn display_time(&self) -> String {
        format_feed_time(self.created_at)
    }
}

/// One page of the feed as returned by `GET /subscription/messages`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    #[serde(rename = "messages", default, deserialize_with = "de_null_as_empty")]
    pub items: Vec<FeedItem>,
    /// Absent (or empty) when there are no more pages
    #[serde(default, deserialize_with = "de_cursor")]
    pub next_cursor: Option<String>,
}

impl FeedPage {
    pub fn new(items: Vec<FeedItem>, next_cursor: Option<&str>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.map(str::to_string),
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

fn de_null_as_empty<'de, D>(deserializer: D) -> Result<Vec<FeedItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<FeedItem>>::deserialize(deserializer)?.unwrap_or_default())
}

fn de_cursor<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|c| !c.is_empty()))
}

/// Accepts `1690000000` as well as `"1690000000"`.
fn de_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Str(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Raw::Int(v)) => Ok(v),
        Some(Raw::Float(v)) => Ok(v as i64),
        Some(Raw::Str(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
