//! GitHub profile badge
//!
//! Joins Wi-Fi, then lets the refresh orchestrator fill the profile model
//! one chunk per frame. If every cache artifact is already on storage the
//! badge starts offline and never joins. Holding A + C forces a refresh
//! from the network.

use log::{info, warn};
use octobadge_hal::{Button, ButtonSet, Clock, FileStorage, NetworkLink, StorageKey, Transport};

use super::{App, AppError, Signal};
use crate::config::Secrets;
use crate::fetch::{FetchOptions, FetchState};
use crate::profile::{ProfileField, ProfileModel, RefreshOrchestrator, RefreshStep};
use crate::runtime::{Context, Platform};

/// Chord that forces a refresh
pub const REFRESH_CHORD: ButtonSet = ButtonSet::of(&[Button::A, Button::C]);

/// What the display should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BadgeStatus {
    /// No usable `/secrets.toml`
    SetupRequired,
    /// Wi-Fi did not come up in time
    ConnectionError,
    /// Waiting for Wi-Fi
    Connecting,
    /// Fetching or parsing this field
    Loading(ProfileField),
    /// Every field is ready or degraded
    Ready,
}

/// Wi-Fi link progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Idle,
    Joining { started_at_ms: u64 },
    Up,
    Failed,
}

pub struct BadgeApp<P: Platform> {
    secrets: Option<Secrets>,
    model: ProfileModel<<P::Transport as Transport>::Stream>,
    orchestrator: RefreshOrchestrator,
    link: LinkState,
    offline: bool,
    status: BadgeStatus,
}

impl<P: Platform> Default for BadgeApp<P> {
    fn default() -> Self {
        Self {
            secrets: None,
            model: ProfileModel::new(None),
            orchestrator: RefreshOrchestrator::new(FetchOptions::default()),
            link: LinkState::Idle,
            offline: false,
            status: BadgeStatus::SetupRequired,
        }
    }
}

impl<P: Platform> BadgeApp<P> {
    pub fn status(&self) -> BadgeStatus {
        self.status
    }

    pub fn model(&self) -> &ProfileModel<<P::Transport as Transport>::Stream> {
        &self.model
    }

    /// Running from cache without Wi-Fi
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    fn has_credentials(&self) -> bool {
        self.secrets.as_ref().is_some_and(Secrets::is_complete)
    }

    fn force_refresh(&mut self, ctx: &mut Context<P>) {
        self.orchestrator
            .force_refresh(&mut self.model, &mut ctx.board.storage);
        self.offline = false;
        if self.link == LinkState::Failed {
            self.link = LinkState::Idle;
        }
    }

    /// Advance the Wi-Fi join
    ///
    /// # Returns
    /// `true` while the link is up.
    fn poll_link(&mut self, ctx: &mut Context<P>) -> bool {
        let now = ctx.board.clock.now_ms();
        match self.link {
            LinkState::Idle => {
                let Some(secrets) = self.secrets.as_ref() else {
                    return false;
                };
                let ssid = secrets.ssid().unwrap_or_default();
                info!("Joining {}", ssid);
                self.link = match ctx.board.link.begin_connect(ssid, secrets.password()) {
                    Ok(()) => LinkState::Joining { started_at_ms: now },
                    Err(e) => {
                        warn!("Wi-Fi join failed: {:?}", e);
                        LinkState::Failed
                    }
                };
                // Some links come up synchronously
                if let LinkState::Joining { .. } = self.link {
                    if ctx.board.link.is_connected() {
                        self.link = LinkState::Up;
                    }
                }
            }
            LinkState::Joining { started_at_ms } => {
                if ctx.board.link.is_connected() {
                    info!("Wi-Fi up after {}ms", now.saturating_sub(started_at_ms));
                    self.link = LinkState::Up;
                } else if now.saturating_sub(started_at_ms) >= ctx.config.network.connect_timeout_ms {
                    warn!(
                        "Wi-Fi did not come up within {}ms",
                        ctx.config.network.connect_timeout_ms
                    );
                    self.link = LinkState::Failed;
                }
            }
            LinkState::Up => {
                if !ctx.board.link.is_connected() {
                    warn!("Wi-Fi lost, rejoining");
                    self.link = LinkState::Idle;
                }
            }
            LinkState::Failed => {}
        }
        self.link == LinkState::Up
    }

    fn loading_status(&self) -> BadgeStatus {
        match self.model.in_flight() {
            Some(in_flight) => BadgeStatus::Loading(in_flight.field),
            None => match self.model.next_unset() {
                Some(field) => BadgeStatus::Loading(field),
                None => BadgeStatus::Ready,
            },
        }
    }
}

fn all_artifacts_cached<S: FileStorage>(storage: &mut S) -> bool {
    StorageKey::ALL
        .into_iter()
        .filter(|key| key.is_cache_artifact())
        .all(|key| storage.exists(key))
}

impl<P: Platform> App<P> for BadgeApp<P> {
    fn init(&mut self, ctx: &mut Context<P>) -> Result<(), AppError> {
        self.secrets = None;
        self.status = BadgeStatus::SetupRequired;

        let secrets = Secrets::load(&mut ctx.board.storage)?;
        let Some(secrets) = secrets.filter(Secrets::is_complete) else {
            info!("No Wi-Fi or GitHub credentials configured");
            return Ok(());
        };

        self.model = ProfileModel::new(secrets.handle());
        self.orchestrator = RefreshOrchestrator::new(FetchOptions::from_config(&ctx.config.fetch))
            .with_token(secrets.token());
        self.offline = all_artifacts_cached(&mut ctx.board.storage);
        self.link = LinkState::Idle;
        self.status = if self.offline {
            BadgeStatus::Loading(ProfileField::Stats)
        } else {
            BadgeStatus::Connecting
        };
        info!(
            "Badge for {}{}",
            secrets.handle().unwrap_or_default(),
            if self.offline { " (offline)" } else { "" }
        );
        self.secrets = Some(secrets);
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<P>) -> Signal {
        if !self.has_credentials() {
            self.status = BadgeStatus::SetupRequired;
            return Signal::Continue;
        }

        let input = ctx.input();
        let chord_edge = input.was_pressed(Button::A) || input.was_pressed(Button::C);
        if chord_edge && input.chord_held(REFRESH_CHORD) {
            self.force_refresh(ctx);
        }

        if !self.offline && !self.poll_link(ctx) {
            self.status = if self.link == LinkState::Failed {
                BadgeStatus::ConnectionError
            } else {
                BadgeStatus::Connecting
            };
            return Signal::Continue;
        }

        let board = &mut ctx.board;
        let step = self.orchestrator.tick(
            &mut self.model,
            &mut board.storage,
            &mut board.transport,
            &board.clock,
        );
        if let RefreshStep::Degraded(field) = step {
            warn!("Showing placeholder for {}", field.label());
        }

        self.status = self.loading_status();
        Signal::Continue
    }

    fn on_exit(&mut self, ctx: &mut Context<P>) -> Result<(), AppError> {
        if let Some(in_flight) = self.model.take_in_flight() {
            info!("Dropping unfinished {} fetch", in_flight.field.label());
            in_flight.task.cancel(&mut ctx.board.storage);
        }
        Ok(())
    }

    fn pending_artifact(&self) -> Option<StorageKey> {
        self.model
            .in_flight()
            .filter(|in_flight| in_flight.task.state() == FetchState::InProgress)
            .map(|in_flight| in_flight.task.destination())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::mock::{mock_context, MockHandles, MockPlatform};
    use crate::profile::parse::tests::tiny_png;

    const SECRETS: &[u8] = b"wifi_ssid = \"Universe\"\nwifi_password = \"octocat\"\ngithub_username = \"mona\"\n";
    const USER_URL: &str = "https://api.github.com/users/mona";
    const CONTRIB_URL: &str = "https://github.com/mona.contribs";
    const AVATAR_URL: &str = "https://wsrv.nl/?url=https://github.com/mona.png&w=75&output=png";

    type Badge = BadgeApp<MockPlatform>;

    fn tick(app: &mut Badge, ctx: &mut Context<MockPlatform>) -> BadgeStatus {
        ctx.poll_input();
        assert_eq!(app.update(ctx), Signal::Continue);
        app.status()
    }

    fn cache_all(handles: &MockHandles) {
        handles.storage.put(StorageKey::UserData, br#"{"name":"Mona"}"#);
        handles.storage.put(StorageKey::ContribData, br#"{"total":5}"#);
        handles.storage.put(StorageKey::Avatar, &tiny_png());
    }

    fn serve_all(handles: &MockHandles) {
        handles.transport.respond(USER_URL, br#"{"name":"Mona Lisa","followers":1}"#);
        handles.transport.respond(CONTRIB_URL, br#"{"total":7}"#);
        handles.transport.respond(AVATAR_URL, &tiny_png());
    }

    fn run_until_ready(app: &mut Badge, ctx: &mut Context<MockPlatform>) {
        for _ in 0..200 {
            if tick(app, ctx) == BadgeStatus::Ready {
                return;
            }
        }
        panic!("badge never became ready: {:?}", app.status());
    }

    #[test]
    fn test_setup_required_without_secrets() {
        let (mut ctx, handles) = mock_context();
        let mut app = Badge::default();

        app.init(&mut ctx).unwrap();
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::SetupRequired);
        assert_eq!(handles.link.joins(), 0);
    }

    #[test]
    fn test_incomplete_secrets() {
        let (mut ctx, handles) = mock_context();
        handles.storage.put(StorageKey::Secrets, b"wifi_ssid = \"Universe\"\n");
        let mut app = Badge::default();

        app.init(&mut ctx).unwrap();
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::SetupRequired);
    }

    #[test]
    fn test_invalid_secrets_fail_init() {
        let (mut ctx, handles) = mock_context();
        handles.storage.put(StorageKey::Secrets, b"wifi_ssid = ");
        let mut app = Badge::default();

        assert_eq!(
            app.init(&mut ctx),
            Err(AppError::Config(ConfigError::TomlParse))
        );
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::SetupRequired);
    }

    #[test]
    fn test_offline_when_all_cached() {
        let (mut ctx, handles) = mock_context();
        handles.storage.put(StorageKey::Secrets, SECRETS);
        cache_all(&handles);
        let mut app = Badge::default();

        app.init(&mut ctx).unwrap();
        assert!(app.is_offline());
        run_until_ready(&mut app, &mut ctx);

        assert_eq!(handles.link.joins(), 0);
        assert_eq!(handles.transport.open_count(), 0);
        assert_eq!(app.model().display_name(), "Mona");
    }

    #[test]
    fn test_connect_then_load() {
        let (mut ctx, handles) = mock_context();
        handles.storage.put(StorageKey::Secrets, SECRETS);
        handles.link.connect_after(2);
        serve_all(&handles);
        let mut app = Badge::default();

        app.init(&mut ctx).unwrap();
        assert!(!app.is_offline());
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::Connecting);
        assert_eq!(handles.link.joins(), 1);
        assert_eq!(handles.link.last_ssid().as_deref(), Some("Universe"));

        run_until_ready(&mut app, &mut ctx);
        assert_eq!(handles.link.joins(), 1);
        assert_eq!(handles.transport.open_count(), 3);
        assert_eq!(app.model().display_name(), "Mona Lisa");
        assert_eq!(app.model().total_contributions(), 7);
    }

    #[test]
    fn test_loading_status_follows_field() {
        let (mut ctx, handles) = mock_context();
        handles.storage.put(StorageKey::Secrets, SECRETS);
        handles.link.connect_after(0);
        handles
            .transport
            .respond(USER_URL, &[b' '; crate::fetch::MAX_CHUNK_SIZE * 3]);
        let mut app = Badge::default();

        app.init(&mut ctx).unwrap();
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::Loading(ProfileField::Stats));
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::Loading(ProfileField::Stats));
        assert!(app.model().is_unset(ProfileField::Stats));
    }

    #[test]
    fn test_connection_timeout() {
        let (mut ctx, handles) = mock_context();
        handles.storage.put(StorageKey::Secrets, SECRETS);
        let mut app = Badge::default();

        app.init(&mut ctx).unwrap();
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::Connecting);
        handles.clock.advance(59_999);
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::Connecting);
        handles.clock.advance(1);
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::ConnectionError);
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::ConnectionError);
    }

    #[test]
    fn test_refresh_chord_refetches() {
        let (mut ctx, handles) = mock_context();
        handles.storage.put(StorageKey::Secrets, SECRETS);
        cache_all(&handles);
        serve_all(&handles);
        handles.link.connect_after(0);
        let mut app = Badge::default();

        app.init(&mut ctx).unwrap();
        run_until_ready(&mut app, &mut ctx);
        assert_eq!(handles.transport.open_count(), 0);

        handles.buttons.push(ButtonSet::of(&[Button::A]));
        handles.buttons.push(REFRESH_CHORD);
        tick(&mut app, &mut ctx);
        tick(&mut app, &mut ctx);
        assert!(!app.is_offline());

        run_until_ready(&mut app, &mut ctx);
        assert_eq!(handles.link.joins(), 1);
        assert_eq!(handles.transport.open_count(), 3);
        assert_eq!(app.model().display_name(), "Mona Lisa");
    }

    #[test]
    fn test_exit_drops_partial_download() {
        let (mut ctx, handles) = mock_context();
        handles.storage.put(StorageKey::Secrets, SECRETS);
        handles.link.connect_after(0);
        handles
            .transport
            .respond(USER_URL, &[b' '; crate::fetch::MAX_CHUNK_SIZE * 3]);
        let mut app = Badge::default();

        app.init(&mut ctx).unwrap();
        tick(&mut app, &mut ctx);
        tick(&mut app, &mut ctx);
        assert!(handles.storage.contains(StorageKey::UserData));

        assert_eq!(app.pending_artifact(), Some(StorageKey::UserData));

        app.on_exit(&mut ctx).unwrap();
        assert!(!handles.storage.contains(StorageKey::UserData));
        assert!(app.model().in_flight().is_none());
        assert_eq!(app.pending_artifact(), None);
    }

    #[test]
    fn test_no_pending_artifact_when_cached() {
        let (mut ctx, handles) = mock_context();
        handles.storage.put(StorageKey::Secrets, SECRETS);
        cache_all(&handles);
        let mut app = Badge::default();

        app.init(&mut ctx).unwrap();
        run_until_ready(&mut app, &mut ctx);
        assert_eq!(app.pending_artifact(), None);
    }

    #[test]
    fn test_link_loss_rejoins() {
        let (mut ctx, handles) = mock_context();
        handles.storage.put(StorageKey::Secrets, SECRETS);
        handles.link.connect_after(0);
        handles
            .transport
            .respond(USER_URL, &[b' '; crate::fetch::MAX_CHUNK_SIZE * 4]);
        let mut app = Badge::default();

        app.init(&mut ctx).unwrap();
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::Loading(ProfileField::Stats));
        assert_eq!(handles.link.joins(), 1);

        handles.link.disconnect();
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::Connecting);
        assert_eq!(handles.link.joins(), 1);

        // A fresh join brings the link back and loading carries on
        assert_eq!(tick(&mut app, &mut ctx), BadgeStatus::Loading(ProfileField::Stats));
        assert_eq!(handles.link.joins(), 2);
    }
}
