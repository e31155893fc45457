//! Per-level flavor text
//!
//! Lore is advisory: it never feeds back into the simulation. A source may be a
//! remote text generator; whatever it returns, failures collapse into a
//! deterministic fallback keyed only on whether the level is a boss level.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::BOSS_LEVEL_INTERVAL;

/// Title card for a level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lore {
    pub title: String,
    pub description: String,
    pub is_boss_level: bool,
}

/// Whether `level` summons a boss
pub fn is_boss_level(level: u32) -> bool {
    level % BOSS_LEVEL_INTERVAL == 0
}

impl Lore {
    /// Shown on the menu before the first session
    pub fn intro() -> Self {
        Self {
            title: "Nebula Strike".to_string(),
            description: "Prepare for deployment.".to_string(),
            is_boss_level: false,
        }
    }

    /// Used whenever the source fails
    pub fn fallback(level: u32) -> Self {
        if is_boss_level(level) {
            Self {
                title: "BOSS DETECTED".to_string(),
                description: "Tactical scan failed. Anomaly imminent.".to_string(),
                is_boss_level: true,
            }
        } else {
            Self {
                title: sector_name(level),
                description: "Communications intercepted. Hostiles inbound.".to_string(),
                is_boss_level: false,
            }
        }
    }

    /// Request text for a generator
    pub fn prompt(level: u32) -> String {
        if is_boss_level(level) {
            format!(
                "Generate a terrifying name for a massive alien boss and a one-sentence tactical \
                 warning for Level {level}. The boss is a \"Nexus Commander\"."
            )
        } else {
            format!(
                "Generate a short science fiction sector name and a one-sentence lore \
                 description for a space battle at Level {level}. Keep it epic and high-tech."
            )
        }
    }

    /// Build lore from a generator's JSON reply.
    ///
    /// Missing or empty fields are filled in; unparseable text is an error.
    pub fn from_response(level: u32, text: &str) -> Result<Self, LoreError> {
        let text = if text.trim().is_empty() { "{}" } else { text };
        let reply: LoreReply =
            serde_json::from_str(text).map_err(|e| LoreError::Malformed(e.to_string()))?;
        let boss = is_boss_level(level);

        let title = reply
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| {
                if boss {
                    "ELITE NEXUS".to_string()
                } else {
                    sector_name(level)
                }
            });
        let description = reply
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| {
                if boss {
                    "Critical threat detected. Engage with extreme caution.".to_string()
                } else {
                    "Entering unknown hostile territory.".to_string()
                }
            });

        Ok(Self {
            title,
            description,
            is_boss_level: boss,
        })
    }
}

fn sector_name(level: u32) -> String {
    format!("Sector {}", level * 7)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoreReply {
    title: Option<String>,
    description: Option<String>,
}

/// Why a lore fetch did not produce text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoreError {
    Unavailable(String),
    Malformed(String),
}

impl fmt::Display for LoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(e) => write!(f, "lore service unavailable: {e}"),
            Self::Malformed(e) => write!(f, "malformed lore reply: {e}"),
        }
    }
}

impl std::error::Error for LoreError {}

/// Produces lore for a level
pub trait LoreSource {
    fn fetch(&self, level: u32) -> Result<Lore, LoreError>;
}

/// Fetch lore, substituting the fallback on failure
pub fn lore_or_fallback(source: &dyn LoreSource, level: u32) -> Lore {
    source.fetch(level).unwrap_or_else(|e| {
        log::warn!("Lore for level {level}: {e}");
        Lore::fallback(level)
    })
}

/// Raw text generator behind [`PromptedLore`]
pub trait LoreTransport {
    fn complete(&self, prompt: &str) -> Result<String, LoreError>;
}

/// Lore from a prompt-driven text generator
pub struct PromptedLore<T> {
    transport: T,
}

impl<T: LoreTransport> PromptedLore<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: LoreTransport> LoreSource for PromptedLore<T> {
    fn fetch(&self, level: u32) -> Result<Lore, LoreError> {
        let reply = self.transport.complete(&Lore::prompt(level))?;
        Lore::from_response(level, &reply)
    }
}

/// No generator configured; always falls back
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineLore;

impl LoreSource for OfflineLore {
    fn fetch(&self, _level: u32) -> Result<Lore, LoreError> {
        Err(LoreError::Unavailable("offline".to_string()))
    }
}

/// Handle for one outstanding lore request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoreTicket {
    pub id: u64,
    pub level: u32,
}

/// The lore currently on screen.
///
/// Requests run detached; only the newest request's result is applied, so a
/// slow reply for an old level can never overwrite a newer one.
#[derive(Debug, Clone)]
pub struct LoreBoard {
    current: Lore,
    latest: u64,
    loading: bool,
}

impl Default for LoreBoard {
    fn default() -> Self {
        Self {
            current: Lore::intro(),
            latest: 0,
            loading: false,
        }
    }
}

impl LoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Lore {
        &self.current
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start a request for `level`, superseding any in flight
    pub fn request(&mut self, level: u32) -> LoreTicket {
        self.latest += 1;
        self.loading = true;
        LoreTicket {
            id: self.latest,
            level,
        }
    }

    /// Apply a finished request. Returns false for superseded tickets.
    pub fn resolve(&mut self, ticket: LoreTicket, result: Result<Lore, LoreError>) -> bool {
        if ticket.id != self.latest {
            log::debug!("Dropping stale lore for level {}", ticket.level);
            return false;
        }
        self.current = result.unwrap_or_else(|e| {
            log::warn!("Lore for level {}: {}", ticket.level, e);
            Lore::fallback(ticket.level)
        });
        self.loading = false;
        true
    }
}
