use super::{Color, ColorScheme, Settings};

/// Token returned by [`SettingsStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Settings)>;

/// Observable holder of the current [`Settings`] snapshot.
///
/// Every setter produces a new snapshot and notifies all subscribers
/// synchronously, in subscription order, even when the written value equals
/// the old one. Listeners are not `Send`.
pub struct SettingsStore {
    current: Settings,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SettingsStore {
    /// Store seeded with an initial snapshot.
    #[must_use]
    pub fn new(initial: Settings) -> Self {
        Self {
            current: initial,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn get(&self) -> Settings {
        self.current
    }

    /// Register a listener called with every new snapshot.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&Settings) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Replace the whole snapshot.
    pub fn replace(&mut self, settings: Settings) {
        self.current = settings;
        self.notify();
    }

    /// Set the number of cubes.
    pub fn set_cube_count(&mut self, count: u32) {
        self.update(|s| s.cube_count = count);
    }

    /// Set the coloring mode.
    pub fn set_color_scheme(&mut self, scheme: ColorScheme) {
        self.update(|s| s.color_scheme = scheme);
    }

    /// Set the color used by [`ColorScheme::Single`].
    pub fn set_single_color(&mut self, color: Color) {
        self.update(|s| s.single_color = color);
    }

    /// Set the rotation multiplier.
    pub fn set_rotation_speed(&mut self, speed: f32) {
        self.update(|s| s.rotation_speed = speed);
    }

    /// Apply an in-place edit to a copy of the snapshot, then publish it.
    pub fn update(&mut self, edit: impl FnOnce(&mut Settings)) {
        let mut next = self.current;
        edit(&mut next);
        self.replace(next);
    }

    fn notify(&mut self) {
        let snapshot = self.current;
        for (_, listener) in &mut self.listeners {
            listener(&snapshot);
        }
    }
}
