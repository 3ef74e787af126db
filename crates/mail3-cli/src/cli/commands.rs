use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::{json, Value};

use mail3_core::address::{display_name, truncate_address};
use mail3_core::models::{AvatarResult, FeedItem, LoginInfo, NotificationPayload};
use mail3_core::session::{gate, login_cookie, logout_cookie, route_redirect, GateDecision};
use mail3_core::store::FeedStatus;
use mail3_core::{notification_open_url, LoadOutcome, Mail3Runtime, ShareTarget};

/// CLI command parsed from arguments
#[derive(Debug, Clone)]
pub enum CliCommand {
    /// Resolve avatars for one or more addresses
    Avatar {
        addresses: Vec<String>,
        src: Option<String>,
    },
    /// Load up to `pages` pages of the subscription feed
    Feed { pages: usize, unread: Option<u32> },
    /// Where a clicked push notification leads
    Open {
        notification_type: String,
        message_id: String,
    },
    Share {
        article_id: String,
        target: ShareTarget,
        text: String,
    },
    /// Run the session gate against a `Cookie` header
    SessionGate { cookie: Option<String> },
    /// Build the `Set-Cookie` value for a login
    SessionCookie {
        address: String,
        jwt: String,
        uuid: String,
    },
    SessionLogout,
    /// Client-side route guard
    SessionRoute { path: String, authenticated: bool },
}

pub async fn execute(runtime: &Mail3Runtime, command: CliCommand) -> Result<Value> {
    match command {
        CliCommand::Avatar { addresses, src } => avatars(runtime, addresses, src).await,
        CliCommand::Feed { pages, unread } => feed(runtime, pages, unread).await,
        CliCommand::Open {
            notification_type,
            message_id,
        } => {
            let payload = NotificationPayload {
                message_id,
                notification_type,
            };
            Ok(json!({ "url": notification_open_url(runtime.config().app_base(), &payload) }))
        }
        CliCommand::Share {
            article_id,
            target,
            text,
        } => {
            let share = runtime.article_share(&article_id, &text);
            let link = share.share_reported(target).await;
            Ok(json!({
                "article_id": article_id,
                "target": target.label(),
                "share_url": share.share_url(),
                "link": link,
            }))
        }
        CliCommand::SessionGate { cookie } => Ok(match gate(cookie.as_deref()) {
            GateDecision::Allow(login) => json!({
                "allowed": true,
                "address": login.address,
                "display": display_name(&login.address, None),
            }),
            GateDecision::Redirect(redirect) => json!({
                "allowed": false,
                "status": redirect.status().as_u16(),
                "location": redirect.location,
            }),
        }),
        CliCommand::SessionCookie { address, jwt, uuid } => {
            let info = LoginInfo { address, jwt, uuid };
            let cookie = login_cookie(&info, Utc::now()).context("Failed to encode login cookie")?;
            Ok(json!({ "set_cookie": cookie }))
        }
        CliCommand::SessionLogout => Ok(json!({ "set_cookie": logout_cookie() })),
        CliCommand::SessionRoute {
            path,
            authenticated,
        } => Ok(json!({
            "path": path,
            "redirect": route_redirect(authenticated, &path),
        })),
    }
}

async fn avatars(runtime: &Mail3Runtime, addresses: Vec<String>, src: Option<String>) -> Result<Value> {
    let default_image = runtime.config().default_avatar_url.clone();

    let results = match (src, addresses.as_slice()) {
        (Some(src), [address]) => {
            let result = runtime.resolver().resolve_with(address, Some(src.as_str())).await;
            vec![(address.clone(), result)]
        }
        (Some(_), _) => anyhow::bail!("--src takes exactly one address"),
        (None, _) => runtime.resolve_avatars(&addresses).await,
    };

    let entries: Vec<Value> = results
        .iter()
        .map(|(address, result)| avatar_json(address, result, &default_image))
        .collect();
    Ok(Value::Array(entries))
}

fn avatar_json(address: &str, result: &AvatarResult, default_image: &str) -> Value {
    json!({
        "address": address,
        "display": truncate_address(address),
        "result": result,
        "src": result.image_src(default_image),
    })
}

async fn feed(runtime: &Mail3Runtime, pages: usize, unread: Option<u32>) -> Result<Value> {
    let feed = runtime.feed();
    if let Some(count) = unread {
        feed.set_unread_count(count);
    }

    for _ in 0..pages {
        match feed.load_next().await.context("Failed to load feed")? {
            LoadOutcome::Loaded(page) => {
                tracing::debug!(items = page.items.len(), has_more = page.has_more(), "feed page loaded");
            }
            LoadOutcome::Exhausted | LoadOutcome::InFlight => break,
        }
    }

    let status = match feed.status() {
        FeedStatus::Loading => "loading",
        FeedStatus::Empty => "empty",
        FeedStatus::Ready { .. } => "ready",
    };
    let items: Vec<Value> = feed.items().iter().map(feed_item_json).collect();

    Ok(json!({
        "status": status,
        "unread_count": feed.unread_count(),
        "next_cursor": feed.next_cursor(),
        "items": items,
    }))
}

fn feed_item_json(item: &FeedItem) -> Value {
    json!({
        "id": item.id,
        "subject": item.subject,
        "writer": item.writer_label(),
        "time": item.display_time(),
        "unread": item.is_unread(),
    })
}
