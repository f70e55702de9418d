//! Config schema types (content table, resolver triggers, LINE channel).
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub content: ContentConfig,
    pub resolver: ResolverConfig,
    pub line: LineConfig,
}

/// When the content table is re-read from disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
    /// Parse the table again for every lookup.
    Always,
    /// Keep the parsed table until the file's modification time or size
    /// changes.
    #[default]
    OnChange,
}

/// Backing reply table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Spreadsheet (`.xlsx`, `.xls`, `.ods`, ...) or `.csv` file.
    pub path: PathBuf,
    pub reload: ReloadPolicy,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("reply_messages.xlsx"),
            reload: ReloadPolicy::OnChange,
        }
    }
}

/// Trigger words and action tags used to classify free text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Draw a random character.
    pub draw_character: String,
    /// Draw a random wallpaper.
    pub draw_wallpaper: String,
    /// List every character name.
    pub list_characters: String,
    /// Action tag of character introduction rows.
    pub intro_action: String,
    /// Action tag of wallpaper rows.
    pub wallpaper_action: String,
    /// Wallpaper rows are named `<prefix><n>`, `n` starting at 1.
    pub wallpaper_prefix: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            draw_character: "抽角色".into(),
            draw_wallpaper: "抽桌布".into(),
            list_characters: "角色列表".into(),
            intro_action: "intro".into(),
            wallpaper_action: "img".into(),
            wallpaper_prefix: "wallpaper".into(),
        }
    }
}

/// LINE Messaging API channel.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Long-lived channel access token.
    pub channel_access_token: Secret<String>,
    /// API origin, overridable for tests and proxies.
    pub api_base: String,
}

impl LineConfig {
    pub fn has_token(&self) -> bool {
        !self.channel_access_token.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for LineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineConfig")
            .field("channel_access_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_access_token: Secret::new(String::new()),
            api_base: "https://api.line.me".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: RosterConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.content.path, PathBuf::from("reply_messages.xlsx"));
        assert_eq!(cfg.content.reload, ReloadPolicy::OnChange);
        assert_eq!(cfg.resolver, ResolverConfig::default());
        assert!(!cfg.line.has_token());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: RosterConfig = toml::from_str(
            r#"
            [content]
            reload = "always"

            [resolver]
            draw_character = "draw"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.content.reload, ReloadPolicy::Always);
        assert_eq!(cfg.resolver.draw_character, "draw");
        assert_eq!(cfg.resolver.draw_wallpaper, "抽桌布");
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = LineConfig {
            channel_access_token: Secret::new("super-secret".into()),
            ..LineConfig::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
