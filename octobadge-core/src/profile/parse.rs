//! Cache artifact parsing
//!
//! Turns the downloaded files into model values. JSON documents are parsed
//! with `serde_json`; unknown keys are ignored and missing keys fall back to
//! zero. The avatar is only checked for being a complete PNG, decoding is
//! left to the display side.

use alloc::string::String as AllocString;
use alloc::vec::Vec;

use heapless::String;
use log::debug;
use octobadge_hal::{FileStorage, StorageError, StorageKey};
use serde::Deserialize;

use super::model::{
    AvatarHandle, Contributions, FieldValue, ProfileField, UserStats, DAYS, MAX_LEVEL, WEEKS,
};
use crate::storage::read_all;

/// Largest JSON artifact read into memory
pub const MAX_JSON_SIZE: usize = 64 * 1024;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Zero-length IEND chunk: length, type, CRC
const PNG_TRAILER: [u8; 12] = [
    0x00, 0x00, 0x00, 0x00, b'I', b'E', b'N', b'D', 0xae, 0x42, 0x60, 0x82,
];

/// Artifact parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Artifact could not be read
    Storage(StorageError),
    /// Artifact exceeds the parse buffer
    TooLarge,
    /// Not valid JSON, or a value has the wrong type
    Json,
    /// Not a complete PNG image
    Image,
}

impl From<StorageError> for ParseError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::BufferTooSmall => ParseError::TooLarge,
            e => ParseError::Storage(e),
        }
    }
}

#[derive(Deserialize)]
struct UserDocument {
    #[serde(default)]
    name: Option<AllocString>,
    #[serde(default)]
    followers: Option<u32>,
    #[serde(default)]
    public_repos: Option<u32>,
}

#[derive(Deserialize)]
struct ContributionDocument {
    #[serde(default)]
    total: Option<u32>,
    #[serde(default)]
    weeks: Vec<Week>,
}

#[derive(Deserialize)]
struct Week {
    #[serde(default)]
    days: Vec<Day>,
}

#[derive(Deserialize)]
struct Day {
    #[serde(default)]
    level: Option<u32>,
}

/// Parse a user document
///
/// An empty or missing `name` falls back to `handle`; names longer than
/// the display buffer are cut at a character boundary.
pub fn parse_user(bytes: &[u8], handle: &str) -> Result<UserStats, ParseError> {
    let doc: UserDocument = serde_json::from_slice(bytes).map_err(|_| ParseError::Json)?;

    let name = doc
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(handle);

    Ok(UserStats {
        name: truncated(name),
        followers: doc.followers.unwrap_or(0),
        repos: doc.public_repos.unwrap_or(0),
    })
}

/// Parse a contribution calendar document
///
/// Only the first 53 weeks and 7 days per week are kept; levels are capped
/// at [`MAX_LEVEL`].
pub fn parse_contributions(bytes: &[u8]) -> Result<Contributions, ParseError> {
    let doc: ContributionDocument =
        serde_json::from_slice(bytes).map_err(|_| ParseError::Json)?;

    let mut contributions = Contributions {
        total: doc.total.unwrap_or(0),
        levels: [[0; WEEKS]; DAYS],
    };

    for (week_idx, week) in doc.weeks.iter().take(WEEKS).enumerate() {
        for (day_idx, day) in week.days.iter().take(DAYS).enumerate() {
            let level = day.level.unwrap_or(0).min(u32::from(MAX_LEVEL));
            contributions.levels[day_idx][week_idx] = level as u8;
        }
    }

    Ok(contributions)
}

/// Check that an avatar file is a complete PNG
///
/// Reads only the signature and the trailing IEND chunk.
pub fn validate_avatar<S: FileStorage>(
    storage: &mut S,
    key: StorageKey,
) -> Result<AvatarHandle, ParseError> {
    let size = storage.size(key)?;
    if size < PNG_SIGNATURE.len() + PNG_TRAILER.len() {
        return Err(ParseError::Image);
    }

    let mut head = [0u8; 8];
    let mut tail = [0u8; 12];
    if storage.read(key, 0, &mut head)? != head.len()
        || storage.read(key, size - tail.len(), &mut tail)? != tail.len()
    {
        return Err(ParseError::Image);
    }

    if head != PNG_SIGNATURE || tail != PNG_TRAILER {
        return Err(ParseError::Image);
    }

    Ok(AvatarHandle { key, size })
}

/// Load and parse the cache artifact for `field`
pub fn load_field<S: FileStorage>(
    field: ProfileField,
    storage: &mut S,
    handle: &str,
) -> Result<FieldValue, ParseError> {
    let key = field.artifact();
    let value = match field {
        ProfileField::Stats => {
            let bytes = read_all(storage, key, MAX_JSON_SIZE)?;
            FieldValue::Stats(parse_user(&bytes, handle)?)
        }
        ProfileField::Contributions => {
            let bytes = read_all(storage, key, MAX_JSON_SIZE)?;
            FieldValue::Contributions(parse_contributions(&bytes)?)
        }
        ProfileField::Avatar => FieldValue::Avatar(validate_avatar(storage, key)?),
    };

    debug!("Parsed {} from {}", field.label(), key.path());
    Ok(value)
}

fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
