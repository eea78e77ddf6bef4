//! Static app registry
//!
//! Apps are compiled in and looked up by path. Each entry carries a factory
//! that builds a fresh app instance per launch, so nothing survives between
//! two runs of the same app.

use alloc::boxed::Box;

use heapless::Vec;
use log::{debug, warn};

use super::{App, AppError, BadgeApp, MenuApp, PowerOffApp};
use crate::config::{CHOOSER_APP, DEFAULT_APP};
use crate::runtime::Platform;

/// Maximum registered apps
pub const MAX_APPS: usize = 8;

/// Path of the power-off app
pub const POWEROFF_APP: &str = "/system/apps/poweroff";

/// Builds a fresh app instance
pub type AppFactory<P> = fn() -> Result<Box<dyn App<P>>, AppError>;

/// One registered app
pub struct AppEntry<P: Platform> {
    pub path: &'static str,
    /// Name shown in the menu
    pub label: &'static str,
    pub factory: AppFactory<P>,
    /// Shown in the menu
    pub listed: bool,
}

impl<P: Platform> Clone for AppEntry<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: Platform> Copy for AppEntry<P> {}

impl<P: Platform> core::fmt::Debug for AppEntry<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppEntry")
            .field("path", &self.path)
            .field("label", &self.label)
            .field("listed", &self.listed)
            .finish()
    }
}

/// Registration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// No room for another entry
    Full,
    /// Path already registered
    Duplicate,
}

/// Compiled-in apps, addressed by path
pub struct AppRegistry<P: Platform> {
    entries: Vec<AppEntry<P>, MAX_APPS>,
}

impl<P: Platform> Default for AppRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> AppRegistry<P> {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry with the badge, menu and power-off apps
    pub fn with_builtin_apps() -> Self {
        let mut registry = Self::new();
        let builtin = [
            AppEntry {
                path: DEFAULT_APP,
                label: "badge",
                factory: build::<P, BadgeApp<P>>,
                listed: true,
            },
            AppEntry {
                path: CHOOSER_APP,
                label: "menu",
                factory: build::<P, MenuApp>,
                listed: false,
            },
            AppEntry {
                path: POWEROFF_APP,
                label: "poweroff",
                factory: build::<P, PowerOffApp>,
                listed: true,
            },
        ];
        for entry in builtin {
            let path = entry.path;
            if let Err(e) = registry.register(entry) {
                warn!("Could not register {}: {:?}", path, e);
            }
        }
        registry
    }

    /// Add an entry
    pub fn register(&mut self, entry: AppEntry<P>) -> Result<(), RegistryError> {
        if self.resolve(entry.path).is_some() {
            return Err(RegistryError::Duplicate);
        }
        debug!("Registered app {}", entry.path);
        self.entries.push(entry).map_err(|_| RegistryError::Full)
    }

    /// Find the entry for a path
    pub fn resolve(&self, path: &str) -> Option<&AppEntry<P>> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Entries shown in the menu, in registration order
    pub fn listed(&self) -> impl Iterator<Item = &AppEntry<P>> {
        self.entries.iter().filter(|e| e.listed)
    }

    pub fn entries(&self) -> &[AppEntry<P>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn build<P: Platform, A: App<P> + Default + 'static>() -> Result<Box<dyn App<P>>, AppError> {
    Ok(Box::new(A::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPlatform;

    type Registry = AppRegistry<MockPlatform>;

    fn failing() -> Result<Box<dyn App<MockPlatform>>, AppError> {
        Err(AppError::Failed("boom"))
    }

    fn entry(path: &'static str) -> AppEntry<MockPlatform> {
        AppEntry {
            path,
            label: path,
            factory: failing,
            listed: true,
        }
    }

    #[test]
    fn test_builtin_apps() {
        let registry = Registry::with_builtin_apps();
        assert_eq!(registry.len(), 3);
        assert!(registry.resolve("/system/apps/badge").is_some());
        assert!(registry.resolve("/system/apps/menu").is_some());
        assert!(registry.resolve("/system/apps/poweroff").is_some());
        assert!(registry.resolve("/system/apps/nope").is_none());

        let listed: alloc::vec::Vec<_> = registry.listed().map(|e| e.label).collect();
        assert_eq!(listed, ["badge", "poweroff"]);

        for entry in registry.entries() {
            assert!((entry.factory)().is_ok());
        }
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.register(entry("/a")), Ok(()));
        assert_eq!(registry.register(entry("/a")), Err(RegistryError::Duplicate));
    }

    #[test]
    fn test_register_full() {
        const PATHS: [&str; MAX_APPS + 1] = ["/0", "/1", "/2", "/3", "/4", "/5", "/6", "/7", "/8"];
        let mut registry = Registry::new();
        for path in PATHS[..MAX_APPS].iter().copied() {
            registry.register(entry(path)).unwrap();
        }
        assert_eq!(
            registry.register(entry(PATHS[MAX_APPS])),
            Err(RegistryError::Full)
        );
    }

    #[test]
    fn test_failing_factory() {
        let mut registry = Registry::new();
        registry.register(entry("/a")).unwrap();
        let entry = registry.resolve("/a").unwrap();
        assert!(matches!((entry.factory)(), Err(AppError::Failed("boom"))));
    }
}
