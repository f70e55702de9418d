//! Map free text or a postback to a table entry.
//!
//! Free text is classified in priority order: the three trigger words,
//! an exact character name, then the first character whose name contains
//! the text. Postbacks name their entry directly.

use std::fmt;

use {
    rand::Rng,
    roster_common::{InboundEvent, MessagePayload},
    roster_config::ResolverConfig,
    roster_content::{ContentTable, ReplyEntry, assemble},
    tracing::{debug, warn},
};

/// Why an event resolved to nothing. Misses are silent, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// A draw or listing found no rows with `action`.
    EmptyPool { action: String },
    /// The resolved key has no row.
    NoEntry { name: String, action: String },
    /// Free text matched no character name.
    NoMatch,
    /// Postback data lacked `name` or `action`.
    InvalidPostback { data: String },
}

impl MissReason {
    /// Stable snake_case name, for log fields and metric labels.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EmptyPool { .. } => "empty_pool",
            Self::NoEntry { .. } => "no_entry",
            Self::NoMatch => "no_match",
            Self::InvalidPostback { .. } => "invalid_postback",
        }
    }
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPool { action } => write!(f, "no rows with action \"{action}\""),
            Self::NoEntry { name, action } => write!(f, "no row for ({name}, {action})"),
            Self::NoMatch => write!(f, "text matched no character"),
            Self::InvalidPostback { data } => write!(f, "postback missing name or action: {data}"),
        }
    }
}

/// Outcome of resolving one event against a table snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'t> {
    Entry(&'t ReplyEntry),
    /// Newline-joined character names.
    Roster(String),
    Miss(MissReason),
}

impl Resolution<'_> {
    /// Outbound messages for this resolution, in send order.
    pub fn into_messages(self) -> Vec<MessagePayload> {
        match self {
            Self::Entry(entry) => assemble(entry),
            Self::Roster(body) => vec![MessagePayload::text(body)],
            Self::Miss(_) => Vec::new(),
        }
    }
}

/// `name` and `action` carried by a postback's query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostbackQuery {
    pub name: String,
    pub action: String,
}

impl PostbackQuery {
    /// Parse URL-encoded postback data. Later duplicates override earlier
    /// ones and blank values are ignored.
    pub fn parse(data: &str) -> Option<Self> {
        let mut name = None;
        let mut action = None;
        for (key, value) in url::form_urlencoded::parse(data.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "name" => name = Some(value.into_owned()),
                "action" => action = Some(value.into_owned()),
                _ => {},
            }
        }
        Some(Self {
            name: name?,
            action: action?,
        })
    }
}

/// Stateless classifier; every call works on the snapshot it is given.
#[derive(Debug, Clone, Default)]
pub struct IntentResolver {
    config: ResolverConfig,
}

impl IntentResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolve<'t, R: Rng + ?Sized>(
        &self,
        event: &InboundEvent,
        table: &'t ContentTable,
        rng: &mut R,
    ) -> Resolution<'t> {
        match event {
            InboundEvent::Text { text, .. } => self.resolve_text(text, table, rng),
            InboundEvent::Postback { data, .. } => self.resolve_postback(data, table),
        }
    }

    pub fn resolve_text<'t, R: Rng + ?Sized>(
        &self,
        text: &str,
        table: &'t ContentTable,
        rng: &mut R,
    ) -> Resolution<'t> {
        let cfg = &self.config;
        if text == cfg.draw_character {
            return self.draw_character(table, rng);
        }
        if text == cfg.draw_wallpaper {
            return self.draw_wallpaper(table, rng);
        }
        if text == cfg.list_characters {
            return self.list_characters(table);
        }
        if let Some(entry) = table.find_one(text, &cfg.intro_action) {
            debug!(name = %entry.name, "exact name match");
            return Resolution::Entry(entry);
        }
        self.keyword_match(text, table)
    }

    /// Postbacks bypass text classification entirely.
    pub fn resolve_postback<'t>(&self, data: &str, table: &'t ContentTable) -> Resolution<'t> {
        let Some(query) = PostbackQuery::parse(data) else {
            warn!(data, "postback without name or action");
            return Resolution::Miss(MissReason::InvalidPostback {
                data: data.to_string(),
            });
        };
        lookup(table, &query.name, &query.action)
    }

    /// Uniform pick over intro rows, index in `[0, n - 1]`.
    fn draw_character<'t, R: Rng + ?Sized>(
        &self,
        table: &'t ContentTable,
        rng: &mut R,
    ) -> Resolution<'t> {
        let action = &self.config.intro_action;
        let pool = table.find_by_action(action);
        if pool.is_empty() {
            return Resolution::Miss(MissReason::EmptyPool {
                action: action.clone(),
            });
        }
        let index = rng.random_range(0..pool.len());
        debug!(index, pool = pool.len(), "drew character");
        lookup(table, &pool[index].name, action)
    }

    /// Uniform pick of `<prefix><r>` with `r` in `[1, len(W)]` inclusive.
    fn draw_wallpaper<'t, R: Rng + ?Sized>(
        &self,
        table: &'t ContentTable,
        rng: &mut R,
    ) -> Resolution<'t> {
        let action = &self.config.wallpaper_action;
        let count = table.find_by_action(action).len();
        if count == 0 {
            return Resolution::Miss(MissReason::EmptyPool {
                action: action.clone(),
            });
        }
        let index = rng.random_range(1..=count);
        debug!(index, pool = count, "drew wallpaper");
        lookup(
            table,
            &format!("{}{index}", self.config.wallpaper_prefix),
            action,
        )
    }

    fn list_characters<'t>(&self, table: &'t ContentTable) -> Resolution<'t> {
        let names = table.names(&self.config.intro_action);
        if names.is_empty() {
            return Resolution::Miss(MissReason::EmptyPool {
                action: self.config.intro_action.clone(),
            });
        }
        Resolution::Roster(names.join("\n"))
    }

    /// First intro row, in table order, whose name contains `text`.
    fn keyword_match<'t>(&self, text: &str, table: &'t ContentTable) -> Resolution<'t> {
        match table
            .find_by_action(&self.config.intro_action)
            .into_iter()
            .find(|entry| entry.name.contains(text))
        {
            Some(entry) => {
                debug!(name = %entry.name, keyword = text, "keyword match");
                Resolution::Entry(entry)
            },
            None => Resolution::Miss(MissReason::NoMatch),
        }
    }
}

fn lookup<'t>(table: &'t ContentTable, name: &str, action: &str) -> Resolution<'t> {
    match table.find_one(name, action) {
        Some(entry) => Resolution::Entry(entry),
        None => Resolution::Miss(MissReason::NoEntry {
            name: name.to_string(),
            action: action.to_string(),
        }),
    }
}
