//! Wedding configuration document.
//!
//! The document is stored as versioned JSON. Records written before gift
//! accounts became a list carry no `schemaVersion` and a single flat bank
//! account; [`WeddingConfig::from_stored`] upgrades them.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Current schema version of the stored document.
pub const CONFIG_SCHEMA_VERSION: i32 = 2;

/// Optional media shown between invitation sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoUrls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video3: Option<String>,
}

/// Bank account shown in the wedding gift section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
}

/// Singleton document holding every piece of wedding display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeddingConfig {
    #[serde(default = "current_schema_version")]
    pub schema_version: i32,
    pub groom_name: String,
    pub bride_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groom_full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bride_full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groom_parents: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bride_parents: Option<String>,
    /// Local date and time of the ceremony, `YYYY-MM-DDTHH:MM[:SS]`.
    pub wedding_date: String,
    /// Offset of the venue's local time from UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    pub display_date: String,
    pub akad_time: String,
    pub reception_time: String,
    pub city: String,
    pub venue_name: String,
    pub venue_address: String,
    pub maps_url: String,
    pub maps_embed_url: String,
    pub story_text: String,
    pub hero_image_url: String,
    #[serde(default)]
    pub videos: VideoUrls,
    pub music_url: String,
    #[serde(default)]
    pub gift_accounts: Vec<BankAccount>,
}

fn current_schema_version() -> i32 {
    CONFIG_SCHEMA_VERSION
}

impl Default for WeddingConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            groom_name: "Groom".to_string(),
            bride_name: "Bride".to_string(),
            groom_full_name: None,
            bride_full_name: None,
            groom_parents: None,
            bride_parents: None,
            wedding_date: "2025-12-31T10:00:00".to_string(),
            utc_offset_minutes: 0,
            display_date: "31 December 2025".to_string(),
            akad_time: "10.00 – 11.00".to_string(),
            reception_time: "11.00 – 14.00".to_string(),
            city: "City".to_string(),
            venue_name: "Venue Name".to_string(),
            venue_address: "Venue Address".to_string(),
            maps_url: "https://maps.google.com".to_string(),
            maps_embed_url: "https://www.google.com/maps/embed".to_string(),
            story_text: "Our love story...".to_string(),
            hero_image_url: "/hero.jpg".to_string(),
            videos: VideoUrls::default(),
            music_url: "/music.mp3".to_string(),
            gift_accounts: vec![BankAccount {
                bank_name: "Bank".to_string(),
                account_number: "1234567890".to_string(),
                account_name: "Account Name".to_string(),
            }],
        }
    }
}

/// Shape of records saved before gift accounts became a list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyWeddingConfig {
    groom_name: String,
    bride_name: String,
    #[serde(default)]
    groom_full_name: Option<String>,
    #[serde(default)]
    bride_full_name: Option<String>,
    #[serde(default)]
    groom_parents: Option<String>,
    #[serde(default)]
    bride_parents: Option<String>,
    wedding_date: String,
    display_date: String,
    akad_time: String,
    reception_time: String,
    city: String,
    venue_name: String,
    venue_address: String,
    maps_url: String,
    maps_embed_url: String,
    story_text: String,
    hero_image_url: String,
    #[serde(default)]
    videos: VideoUrls,
    music_url: String,
    #[serde(default)]
    bank_name: String,
    #[serde(default)]
    account_number: String,
    #[serde(default)]
    account_name: String,
}

impl From<LegacyWeddingConfig> for WeddingConfig {
    fn from(legacy: LegacyWeddingConfig) -> Self {
        let account = BankAccount {
            bank_name: legacy.bank_name,
            account_number: legacy.account_number,
            account_name: legacy.account_name,
        };
        let has_account = !(account.bank_name.is_empty()
            && account.account_number.is_empty()
            && account.account_name.is_empty());

        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            groom_name: legacy.groom_name,
            bride_name: legacy.bride_name,
            groom_full_name: empty_to_none(legacy.groom_full_name),
            bride_full_name: empty_to_none(legacy.bride_full_name),
            groom_parents: empty_to_none(legacy.groom_parents),
            bride_parents: empty_to_none(legacy.bride_parents),
            wedding_date: legacy.wedding_date,
            utc_offset_minutes: 0,
            display_date: legacy.display_date,
            akad_time: legacy.akad_time,
            reception_time: legacy.reception_time,
            city: legacy.city,
            venue_name: legacy.venue_name,
            venue_address: legacy.venue_address,
            maps_url: legacy.maps_url,
            maps_embed_url: legacy.maps_embed_url,
            story_text: legacy.story_text,
            hero_image_url: legacy.hero_image_url,
            videos: legacy.videos,
            music_url: legacy.music_url,
            gift_accounts: if has_account { vec![account] } else { Vec::new() },
        }
    }
}

fn empty_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl WeddingConfig {
    /// Decode a stored document, upgrading legacy records.
    ///
    /// Returns the config and whether a migration happened, so the caller
    /// can write the upgraded record back once.
    pub fn from_stored(raw: &str) -> Result<(Self, bool), AppError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let version = value
            .get("schemaVersion")
            .and_then(|v| v.as_i64())
            .unwrap_or(1);

        if version >= i64::from(CONFIG_SCHEMA_VERSION) {
            let config: WeddingConfig = serde_json::from_value(value)?;
            Ok((config, false))
        } else {
            let legacy: LegacyWeddingConfig = serde_json::from_value(value)?;
            Ok((legacy.into(), true))
        }
    }

    /// Check the fields every invitation section needs to render.
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("groomName", &self.groom_name),
            ("brideName", &self.bride_name),
            ("weddingDate", &self.wedding_date),
            ("displayDate", &self.display_date),
            ("akadTime", &self.akad_time),
            ("receptionTime", &self.reception_time),
            ("city", &self.city),
            ("venueName", &self.venue_name),
            ("venueAddress", &self.venue_address),
            ("mapsUrl", &self.maps_url),
            ("mapsEmbedUrl", &self.maps_embed_url),
            ("storyText", &self.story_text),
            ("heroImageUrl", &self.hero_image_url),
            ("musicUrl", &self.music_url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{} is required", field)));
            }
        }

        for (i, account) in self.gift_accounts.iter().enumerate() {
            if account.bank_name.trim().is_empty()
                || account.account_number.trim().is_empty()
                || account.account_name.trim().is_empty()
            {
                return Err(AppError::Validation(format!(
                    "giftAccounts[{}] needs bankName, accountNumber and accountName",
                    i
                )));
            }
        }

        self.wedding_instant()?;
        Ok(())
    }

    /// The ceremony start as an absolute instant.
    pub fn wedding_instant(&self) -> Result<DateTime<Utc>, AppError> {
        let local = NaiveDateTime::parse_from_str(&self.wedding_date, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(&self.wedding_date, "%Y-%m-%dT%H:%M"))
            .map_err(|_| {
                AppError::Validation(format!(
                    "weddingDate must look like YYYY-MM-DDTHH:MM:SS, got {:?}",
                    self.wedding_date
                ))
            })?;
        let utc = local - Duration::minutes(i64::from(self.utc_offset_minutes));
        Ok(utc.and_utc())
    }

    /// Bride's name as used in formal text.
    pub fn bride_formal_name(&self) -> &str {
        self.bride_full_name.as_deref().unwrap_or(&self.bride_name)
    }

    /// Groom's name as used in formal text.
    pub fn groom_formal_name(&self) -> &str {
        self.groom_full_name.as_deref().unwrap_or(&self.groom_name)
    }
}
