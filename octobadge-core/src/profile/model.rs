//! Profile data model
//!
//! Holds what the badge shows about one GitHub user. Each field is filled
//! independently by the refresh orchestrator and can end up degraded, in
//! which case accessors return placeholders instead of failing.

use heapless::String;
use octobadge_hal::StorageKey;

use crate::config::MAX_HANDLE_LEN;
use crate::fetch::FetchTask;

/// Maximum stored display name length
pub const MAX_NAME_LEN: usize = 64;

/// Columns in the contribution calendar
pub const WEEKS: usize = 53;

/// Rows in the contribution calendar
pub const DAYS: usize = 7;

/// Highest contribution level
pub const MAX_LEVEL: u8 = 4;

/// Contribution levels indexed `[day][week]`
pub type LevelMatrix = [[u8; WEEKS]; DAYS];

const EMPTY_LEVELS: LevelMatrix = [[0; WEEKS]; DAYS];

/// Remotely sourced fields, in refresh priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfileField {
    Stats,
    Contributions,
    Avatar,
}

impl ProfileField {
    /// Refresh priority order
    pub const ORDER: [ProfileField; 3] = [
        ProfileField::Stats,
        ProfileField::Contributions,
        ProfileField::Avatar,
    ];

    /// Position in [`ProfileField::ORDER`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Cache artifact this field is parsed from
    pub fn artifact(self) -> StorageKey {
        match self {
            ProfileField::Stats => StorageKey::UserData,
            ProfileField::Contributions => StorageKey::ContribData,
            ProfileField::Avatar => StorageKey::Avatar,
        }
    }

    /// Short name for logs and the loading screen
    pub fn label(self) -> &'static str {
        match self {
            ProfileField::Stats => "user data",
            ProfileField::Contributions => "contributions",
            ProfileField::Avatar => "avatar",
        }
    }
}

/// Lifecycle of a single model field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldState<T> {
    /// Not loaded yet; the orchestrator will try to fill it
    #[default]
    Unset,
    /// Loaded and parsed
    Ready(T),
    /// Fetch or parse failed; not retried this session
    Degraded,
}

impl<T> FieldState<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, FieldState::Unset)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, FieldState::Degraded)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            FieldState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Data-free view of the state
    pub fn status(&self) -> FieldStatus {
        match self {
            FieldState::Unset => FieldStatus::Unset,
            FieldState::Ready(_) => FieldStatus::Ready,
            FieldState::Degraded => FieldStatus::Degraded,
        }
    }
}

/// [`FieldState`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldStatus {
    Unset,
    Ready,
    Degraded,
}

/// User document summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub name: String<MAX_NAME_LEN>,
    pub followers: u32,
    pub repos: u32,
}

/// Contribution calendar summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributions {
    pub total: u32,
    pub levels: LevelMatrix,
}

/// A validated avatar image on storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarHandle {
    pub key: StorageKey,
    pub size: usize,
}

/// Parsed value for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Stats(UserStats),
    Contributions(Contributions),
    Avatar(AvatarHandle),
}

impl FieldValue {
    pub fn field(&self) -> ProfileField {
        match self {
            FieldValue::Stats(_) => ProfileField::Stats,
            FieldValue::Contributions(_) => ProfileField::Contributions,
            FieldValue::Avatar(_) => ProfileField::Avatar,
        }
    }
}

/// The fetch task currently filling a field
#[derive(Debug)]
pub struct InFlight<St> {
    pub field: ProfileField,
    pub task: FetchTask<St>,
}

/// Returned by [`ProfileModel::attach`] when a task is already in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskAlreadyAttached;

/// GitHub profile shown by the badge
///
/// Holds at most one in-flight fetch task.
#[derive(Debug)]
pub struct ProfileModel<St> {
    handle: Option<String<MAX_HANDLE_LEN>>,
    stats: FieldState<UserStats>,
    contributions: FieldState<Contributions>,
    avatar: FieldState<AvatarHandle>,
    in_flight: Option<InFlight<St>>,
}

impl<St> ProfileModel<St> {
    /// Model for a handle, with every field unset
    ///
    /// A handle longer than a GitHub login is rejected and leaves the
    /// model without one.
    pub fn new(handle: Option<&str>) -> Self {
        let handle = handle.and_then(|h| {
            let mut stored = String::new();
            stored.push_str(h).ok().map(|_| stored)
        });

        Self {
            handle,
            stats: FieldState::Unset,
            contributions: FieldState::Unset,
            avatar: FieldState::Unset,
            in_flight: None,
        }
    }

    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    pub fn stats(&self) -> &FieldState<UserStats> {
        &self.stats
    }

    pub fn contributions(&self) -> &FieldState<Contributions> {
        &self.contributions
    }

    pub fn avatar(&self) -> &FieldState<AvatarHandle> {
        &self.avatar
    }

    pub fn status(&self, field: ProfileField) -> FieldStatus {
        match field {
            ProfileField::Stats => self.stats.status(),
            ProfileField::Contributions => self.contributions.status(),
            ProfileField::Avatar => self.avatar.status(),
        }
    }

    pub fn is_unset(&self, field: ProfileField) -> bool {
        self.status(field) == FieldStatus::Unset
    }

    /// First unset field in priority order
    pub fn next_unset(&self) -> Option<ProfileField> {
        ProfileField::ORDER.into_iter().find(|f| self.is_unset(*f))
    }

    /// Returns true when no field is left to load
    pub fn is_settled(&self) -> bool {
        self.next_unset().is_none() && self.in_flight.is_none()
    }

    /// Store a parsed value in its field
    pub fn set(&mut self, value: FieldValue) {
        match value {
            FieldValue::Stats(v) => self.stats = FieldState::Ready(v),
            FieldValue::Contributions(v) => self.contributions = FieldState::Ready(v),
            FieldValue::Avatar(v) => self.avatar = FieldState::Ready(v),
        }
    }

    /// Mark a field as failed for this session
    pub fn degrade(&mut self, field: ProfileField) {
        match field {
            ProfileField::Stats => self.stats = FieldState::Degraded,
            ProfileField::Contributions => self.contributions = FieldState::Degraded,
            ProfileField::Avatar => self.avatar = FieldState::Degraded,
        }
    }

    /// Return every field to unset; the in-flight task is left alone
    pub fn reset_fields(&mut self) {
        self.stats = FieldState::Unset;
        self.contributions = FieldState::Unset;
        self.avatar = FieldState::Unset;
    }

    pub fn in_flight(&self) -> Option<&InFlight<St>> {
        self.in_flight.as_ref()
    }

    pub fn in_flight_mut(&mut self) -> Option<&mut InFlight<St>> {
        self.in_flight.as_mut()
    }

    /// Attach the task filling `field`
    ///
    /// Fails without replacing anything if a task is already attached.
    pub fn attach(
        &mut self,
        field: ProfileField,
        task: FetchTask<St>,
    ) -> Result<(), TaskAlreadyAttached> {
        if self.in_flight.is_some() {
            return Err(TaskAlreadyAttached);
        }
        self.in_flight = Some(InFlight { field, task });
        Ok(())
    }

    /// Detach and return the in-flight task
    pub fn take_in_flight(&mut self) -> Option<InFlight<St>> {
        self.in_flight.take()
    }

    /// Name to display: the user's name, or the handle as a placeholder
    pub fn display_name(&self) -> &str {
        match self.stats.ready() {
            Some(stats) => stats.name.as_str(),
            None => self.handle().unwrap_or(""),
        }
    }

    /// Follower count, 0 when unavailable
    pub fn followers(&self) -> u32 {
        self.stats.ready().map_or(0, |s| s.followers)
    }

    /// Public repository count, 0 when unavailable
    pub fn repos(&self) -> u32 {
        self.stats.ready().map_or(0, |s| s.repos)
    }

    /// Contributions in the last year, 0 when unavailable
    pub fn total_contributions(&self) -> u32 {
        self.contributions.ready().map_or(0, |c| c.total)
    }

    /// Contribution calendar, all zeros when unavailable
    pub fn levels(&self) -> &LevelMatrix {
        self.contributions.ready().map_or(&EMPTY_LEVELS, |c| &c.levels)
    }

    /// Storage key of a validated avatar, if any
    pub fn avatar_key(&self) -> Option<StorageKey> {
        self.avatar.ready().map(|a| a.key)
    }
}
