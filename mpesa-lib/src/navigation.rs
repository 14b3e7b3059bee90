//! Storefront navigation guard.
//!
//! The shop area is only reachable with a session. The guard reads the auth
//! provider's state and decides what the shop layout shows:
//!
//! - still determining the session: a loading indicator, no navigation
//! - no session: a redirect to [`AUTH_ROUTE`]
//! - otherwise: the two-tab layout (Shop, Orders)
//!
//! The auth provider itself lives outside this crate; it is consumed through
//! the [`AuthState`] trait.

use serde::Serialize;

/// Route unauthenticated users are sent to.
pub const AUTH_ROUTE: &str = "/auth";

/// Read-only view of the external auth provider.
pub trait AuthState {
    /// Session type handed out by the provider.
    type Session;

    /// The current session, if any.
    fn session(&self) -> Option<&Self::Session>;

    /// Whether the provider is still determining the session.
    fn is_mounting(&self) -> bool;
}

/// Plain auth state, for hosts that already hold the values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthSnapshot<S> {
    /// The current session, if any.
    pub session: Option<S>,
    /// Whether the provider is still determining the session.
    pub mounting: bool,
}

impl<S> AuthSnapshot<S> {
    /// Provider still loading.
    pub fn mounting() -> Self {
        Self {
            session: None,
            mounting: true,
        }
    }

    /// Provider resolved with `session`.
    pub fn resolved(session: Option<S>) -> Self {
        Self {
            session,
            mounting: false,
        }
    }
}

impl<S> AuthState for AuthSnapshot<S> {
    type Session = S;

    fn session(&self) -> Option<&S> {
        self.session.as_ref()
    }

    fn is_mounting(&self) -> bool {
        self.mounting
    }
}

/// Icon shown in the tab bar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TabIcon {
    /// FontAwesome glyph name.
    pub name: &'static str,
    /// Glyph size in points.
    pub size: u8,
    /// Background behind the glyph.
    pub background_color: &'static str,
}

impl TabIcon {
    const fn font_awesome(name: &'static str) -> Self {
        Self {
            name,
            size: 24,
            background_color: "white",
        }
    }
}

/// One tab screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TabScreen {
    /// Route name within the shop group.
    pub name: &'static str,
    /// Label shown under the icon.
    pub title: &'static str,
    /// Icon shown in the tab bar.
    pub icon: TabIcon,
}

/// Static tab bar styling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TabBarStyle {
    /// Tint of the selected tab.
    pub active_tint_color: &'static str,
    /// Tint of unselected tabs.
    pub inactive_tint_color: &'static str,
    /// Tab label font size.
    pub label_font_size: u8,
    /// Top-left corner radius of the bar.
    pub border_top_left_radius: u8,
    /// Top-right corner radius of the bar.
    pub border_top_right_radius: u8,
    /// Bar background color.
    pub background_color: &'static str,
    /// Padding above the icons.
    pub padding_top: u8,
    /// Padding below the labels.
    pub padding_bottom: u8,
    /// Total bar height.
    pub height: u16,
    /// Whether screens show a header.
    pub header_shown: bool,
}

impl Default for TabBarStyle {
    fn default() -> Self {
        Self {
            active_tint_color: "#1BC464",
            inactive_tint_color: "gray",
            label_font_size: 15,
            border_top_left_radius: 20,
            border_top_right_radius: 20,
            background_color: "white",
            padding_top: 16,
            padding_bottom: 10,
            height: 80,
            header_shown: false,
        }
    }
}

/// The authenticated shop layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TabsLayout {
    /// Tabs in display order.
    pub screens: Vec<TabScreen>,
    /// Tab bar styling.
    pub style: TabBarStyle,
}

impl TabsLayout {
    /// Shop and Orders.
    pub fn storefront() -> Self {
        Self {
            screens: vec![
                TabScreen {
                    name: "index",
                    title: "Shop",
                    icon: TabIcon::font_awesome("shopping-cart"),
                },
                TabScreen {
                    name: "orders",
                    title: "Orders",
                    icon: TabIcon::font_awesome("book"),
                },
            ],
            style: TabBarStyle::default(),
        }
    }

    /// Tab titles in display order.
    pub fn titles(&self) -> Vec<&'static str> {
        self.screens.iter().map(|s| s.title).collect()
    }
}

/// What the shop layout renders for a given auth state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuardOutcome {
    /// Session still being determined.
    Loading,
    /// No session; navigate to `href`.
    Redirect { href: &'static str },
    /// Session present; show the tabs.
    Tabs(TabsLayout),
}

/// Decide the outcome for a single render.
pub fn evaluate<A: AuthState>(auth: &A) -> GuardOutcome {
    if auth.is_mounting() {
        return GuardOutcome::Loading;
    }
    resolved_outcome(auth)
}

fn resolved_outcome<A: AuthState>(auth: &A) -> GuardOutcome {
    match auth.session() {
        None => GuardOutcome::Redirect { href: AUTH_ROUTE },
        Some(_) => GuardOutcome::Tabs(TabsLayout::storefront()),
    }
}

/// Lifecycle of one mounted guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardPhase {
    /// The auth provider has not resolved yet.
    Mounting,
    /// Resolved with a session.
    Authenticated,
    /// Resolved without a session.
    Unauthenticated,
}

/// Guard that remembers its phase across renders of one mount.
///
/// Starts in [`GuardPhase::Mounting`]. Once the provider has resolved, the
/// guard never returns to `Mounting`, even if the provider reports loading
/// again; later renders only move between `Authenticated` and
/// `Unauthenticated` as the session comes and goes.
#[derive(Debug)]
pub struct NavigationGuard {
    phase: GuardPhase,
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationGuard {
    /// A freshly mounted guard.
    pub fn new() -> Self {
        Self {
            phase: GuardPhase::Mounting,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> GuardPhase {
        self.phase
    }

    /// Render against the current auth state, advancing the phase.
    pub fn render<A: AuthState>(&mut self, auth: &A) -> GuardOutcome {
        if self.phase == GuardPhase::Mounting && auth.is_mounting() {
            return GuardOutcome::Loading;
        }

        let outcome = resolved_outcome(auth);
        let next = match outcome {
            GuardOutcome::Tabs(_) => GuardPhase::Authenticated,
            _ => GuardPhase::Unauthenticated,
        };

        #[cfg(feature = "tracing")]
        {
            if next != self.phase {
                tracing::debug!(from = ?self.phase, to = ?next, "Navigation guard transition");
            }
        }
        self.phase = next;
        outcome
    }
}
