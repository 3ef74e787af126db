use serde::{Deserialize, Serialize};

/// Why no remote avatar is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderKind {
    /// Supported address with no custom avatar (or the lookup failed):
    /// render the generic default image.
    Default,
    /// Address kind the avatar service cannot resolve: render a bare glyph,
    /// no network image.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvatarResult {
    Loading,
    Resolved(String),
    UsePlaceholder(PlaceholderKind),
    /// Caller-supplied URL, no remote lookup involved
    UseProvidedOverride(String),
}

impl AvatarResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AvatarResult::Loading)
    }

    /// Image to render. `None` means a raw glyph (or a skeleton while loading).
    pub fn image_src<'a>(&'a self, default_image: &'a str) -> Option<&'a str> {
        match self {
            AvatarResult::Loading => None,
            AvatarResult::Resolved(url) | AvatarResult::UseProvidedOverride(url) => Some(url),
            AvatarResult::UsePlaceholder(PlaceholderKind::Default) => Some(default_image),
            AvatarResult::UsePlaceholder(PlaceholderKind::Unsupported) => None,
        }
    }
}

/// `GET /avatar/primitive/{address}`
#[derive(Debug, Clone, Deserialize)]
pub struct PrimitiveAddressResponse {
    pub eth_address: String,
}

/// `GET /avatar/{address}`
#[derive(Debug, Clone, Deserialize)]
pub struct AvatarResponse {
    #[serde(default)]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_src_policy() {
        let default = "default.png";
        assert_eq!(AvatarResult::Loading.image_src(default), None);
        assert_eq!(
            AvatarResult::Resolved("a.png".into()).image_src(default),
            Some("a.png")
        );
        assert_eq!(
            AvatarResult::UsePlaceholder(PlaceholderKind::Default).image_src(default),
            Some(default)
        );
        assert_eq!(
            AvatarResult::UsePlaceholder(PlaceholderKind::Unsupported).image_src(default),
            None
        );
    }

    #[test]
    fn test_avatar_response_null() {
        let resp: AvatarResponse = serde_json::from_str(r#"{"avatar": null}"#).unwrap();
        assert!(resp.avatar.is_none());
    }
}
