//! Data refresh orchestrator
//!
//! Fills a [`ProfileModel`] one field at a time, driving at most one fetch
//! task per tick. Called from an app's `update`, so every call is bounded
//! to a single chunk of I/O.

use heapless::String;
use log::{debug, info, warn};
use octobadge_hal::{ByteStream, Clock, FileStorage, Transport};

use super::endpoints::request_for;
use super::model::{ProfileField, ProfileModel};
use super::parse::load_field;
use crate::config::MAX_TOKEN_LEN;
use crate::fetch::{FetchOptions, FetchPoll, FetchTask, Prepared};
use crate::storage::remove_if_present;

/// Where a populated field came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
    Cache,
    Network,
}

/// What one orchestrator tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshStep {
    /// Every field is ready or degraded
    Idle,
    /// A fetch for this field is in flight
    Pending(ProfileField),
    /// Field parsed and stored
    Populated(ProfileField, Source),
    /// Field marked degraded for this session
    Degraded(ProfileField),
    /// Cached artifact was corrupt and has been removed; refetched next tick
    Invalidated(ProfileField),
}

/// Sequences the fetches that fill a profile model
#[derive(Debug, Clone)]
pub struct RefreshOrchestrator {
    options: FetchOptions,
    token: Option<String<MAX_TOKEN_LEN>>,
    bypass_cache: [bool; 3],
    tasks_created: u32,
    resumes: u32,
}

impl RefreshOrchestrator {
    pub fn new(options: FetchOptions) -> Self {
        Self {
            options,
            token: None,
            bypass_cache: [false; 3],
            tasks_created: 0,
            resumes: 0,
        }
    }

    /// Run one refresh step
    ///
    /// Resumes the in-flight task if there is one. Otherwise prepares the
    /// first unset field in priority order: a cached artifact is parsed
    /// directly, a new task is attached and resumed once.
    pub fn tick<T, S, C>(
        &mut self,
        model: &mut ProfileModel<T::Stream>,
        storage: &mut S,
        transport: &mut T,
        clock: &C,
    ) -> RefreshStep
    where
        T: Transport,
        S: FileStorage,
        C: Clock,
    {
        if model.in_flight().is_some() {
            return self.resume_in_flight(model, storage, transport, clock);
        }

        let Some(field) = model.next_unset() else {
            return RefreshStep::Idle;
        };

        let Some(handle) = model.handle() else {
            warn!("No GitHub handle, cannot fetch {}", field.label());
            model.degrade(field);
            return RefreshStep::Degraded(field);
        };

        let request = match request_for(field, handle, self.token.as_deref()) {
            Ok(request) => request,
            Err(e) => {
                warn!("Cannot build request for {}: {:?}", field.label(), e);
                model.degrade(field);
                return RefreshStep::Degraded(field);
            }
        };

        let options = self.options.forced(self.bypass_cache[field.index()]);
        let prepared = FetchTask::prepare(
            request,
            field.artifact(),
            storage,
            clock.now_ms(),
            options,
        );

        match prepared {
            Prepared::CacheHit => self.populate_from_cache(model, storage, field),
            Prepared::Task(task) => {
                self.bypass_cache[field.index()] = false;
                self.tasks_created += 1;
                if model.attach(field, task).is_err() {
                    return RefreshStep::Pending(field);
                }
                self.resume_in_flight(model, storage, transport, clock)
            }
        }
    }

    fn resume_in_flight<T, S, C>(
        &mut self,
        model: &mut ProfileModel<T::Stream>,
        storage: &mut S,
        transport: &mut T,
        clock: &C,
    ) -> RefreshStep
    where
        T: Transport,
        S: FileStorage,
        C: Clock,
    {
        let Some(in_flight) = model.in_flight_mut() else {
            return RefreshStep::Idle;
        };
        let field = in_flight.field;

        self.resumes += 1;
        let poll = in_flight.task.resume(transport, storage, clock);

        match poll {
            FetchPoll::Pending => RefreshStep::Pending(field),
            FetchPoll::Completed => {
                model.take_in_flight();
                self.populate_from_download(model, storage, field)
            }
            FetchPoll::Failed(_) | FetchPoll::TimedOut => {
                model.take_in_flight();
                model.degrade(field);
                RefreshStep::Degraded(field)
            }
        }
    }

    fn populate_from_download<St, S: FileStorage>(
        &mut self,
        model: &mut ProfileModel<St>,
        storage: &mut S,
        field: ProfileField,
    ) -> RefreshStep {
        let handle = model.handle().unwrap_or_default();
        match load_field(field, storage, handle) {
            Ok(value) => {
                info!("Loaded {} from network", field.label());
                model.set(value);
                RefreshStep::Populated(field, Source::Network)
            }
            Err(e) => {
                warn!("Downloaded {} is unusable: {:?}", field.label(), e);
                if let Err(e) = remove_if_present(storage, field.artifact()) {
                    warn!("Could not remove {}: {:?}", field.artifact().path(), e);
                }
                model.degrade(field);
                RefreshStep::Degraded(field)
            }
        }
    }

    fn populate_from_cache<St, S: FileStorage>(
        &mut self,
        model: &mut ProfileModel<St>,
        storage: &mut S,
        field: ProfileField,
    ) -> RefreshStep {
        let handle = model.handle().unwrap_or_default();
        match load_field(field, storage, handle) {
            Ok(value) => {
                debug!("Loaded {} from cache", field.label());
                model.set(value);
                RefreshStep::Populated(field, Source::Cache)
            }
            Err(e) => {
                warn!("Cached {} is corrupt: {:?}, refetching", field.label(), e);
                match remove_if_present(storage, field.artifact()) {
                    Ok(()) => RefreshStep::Invalidated(field),
                    Err(e) => {
                        warn!("Could not remove {}: {:?}", field.artifact().path(), e);
                        model.degrade(field);
                        RefreshStep::Degraded(field)
                    }
                }
            }
        }
    }

    /// Invalidate everything and refetch from the network
    ///
    /// Every field goes back to unset, the in-flight task is dropped along
    /// with its partial file, and each field skips the cache once.
    pub fn force_refresh<St, S: FileStorage>(
        &mut self,
        model: &mut ProfileModel<St>,
        storage: &mut S,
    ) where
        St: ByteStream,
    {
        info!("Forced refresh");
        if let Some(in_flight) = model.take_in_flight() {
            in_flight.task.cancel(storage);
        }
        model.reset_fields();
        self.bypass_cache = [true; 3];
    }

    /// Attach `token` to API requests
    ///
    /// A token that does not fit is dropped with a warning; requests then
    /// go out anonymously.
    pub fn with_token(mut self, token: Option<&str>) -> Self {
        self.token = token.and_then(|t| {
            let mut stored = String::new();
            if stored.push_str(t).is_ok() {
                Some(stored)
            } else {
                warn!("GitHub token too long, ignoring it");
                None
            }
        });
        self
    }

    /// Returns true if the next task for `field` will skip the cache
    pub fn bypasses_cache(&self, field: ProfileField) -> bool {
        self.bypass_cache[field.index()]
    }

    /// Fetch tasks created since construction
    pub fn tasks_created(&self) -> u32 {
        self.tasks_created
    }

    /// Task resumes since construction
    pub fn resumes(&self) -> u32 {
        self.resumes
    }
}
