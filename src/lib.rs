//! Accessible hover and focus tooltips for Bevy UI.
//!
//! Add [`TooltipPlugin`], then spawn a UI node with a [`Tooltip`] component that has
//! exactly one descendant marked [`TooltipTrigger`] and one marked [`TooltipPanel`].
//! The panel is revealed while the widget is hovered or contains the [`InputFocus`],
//! placed on the first side that keeps it inside the window, and every change is
//! announced through a shared live region.
//!
//! [`InputFocus`]: bevy_input_focus::InputFocus

extern crate alloc;

mod announce;
mod context;
mod placement;
mod registry;
mod setup;
mod style;

/// Re-exports of the types most applications need.
pub mod prelude {
    pub use super::{
        Tooltip, TooltipPanel, TooltipPlacement, TooltipPlugin, TooltipShown, TooltipStyle,
        TooltipTransition, TooltipTrigger, TransitionKind,
    };
}

pub use announce::{ANNOUNCEMENT_LIFETIME, Announcement, TooltipLiveRegion};
pub use context::{
    InteractionState, PendingTimer, TimerKind, TooltipContext, TooltipShown, TooltipTransition,
    TransitionKind,
};
pub use placement::{
    ActivePlacement, PlacementOutcome, TooltipPlacement, UnknownPlacement, fits_viewport,
    resolve_placement,
};
pub use registry::{TooltipId, TooltipRegistry};
pub use setup::{ConfigurationError, TooltipBinding, TooltipInert, TooltipPanel, TooltipTrigger};
pub use style::TooltipStyle;

use bevy_app::{Plugin, PreUpdate};
#[cfg(feature = "bevy_reflect")]
use bevy_ecs::reflect::ReflectComponent;
use bevy_ecs::{
    component::Component,
    schedule::{IntoScheduleConfigs as _, SystemSet},
};
use bevy_input::InputSystems;
use bevy_input_focus::InputFocus;
use bevy_ui::UiSystems;

/// A plugin that binds, schedules, places and announces [`Tooltip`] widgets.
#[derive(Default)]
pub struct TooltipPlugin {
    /// The colors applied to every tooltip widget.
    pub style: TooltipStyle,
}

impl Plugin for TooltipPlugin {
    fn build(&self, app: &mut bevy_app::App) {
        #[cfg(feature = "bevy_reflect")]
        app.register_type::<Tooltip>()
            .register_type::<TooltipPlacement>()
            .register_type::<TooltipContext>();

        app.insert_resource(self.style.clone());
        app.init_resource::<InputFocus>();
        app.configure_sets(
            PreUpdate,
            (
                TooltipSystems::Setup,
                TooltipSystems::Interaction,
                TooltipSystems::Display,
                TooltipSystems::Announce,
                TooltipSystems::Detect,
            )
                .chain()
                .after(InputSystems)
                .after(UiSystems::Focus),
        );

        // Shared resources exist before any widget is bound.
        app.add_plugins((
            registry::plugin,
            announce::plugin,
            setup::plugin,
            context::plugin,
            placement::plugin,
            style::plugin,
        ));
    }
}

/// The system sets the tooltip plugin runs in during [`PreUpdate`], in order.
#[derive(SystemSet, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TooltipSystems {
    /// Bind newly spawned [`Tooltip`] widgets to their trigger and panel.
    Setup,
    /// Dismiss tooltips and advance each widget's debounce timers.
    Interaction,
    /// Show, hide and place tooltip panels.
    Display,
    /// Write and expire live region announcements.
    Announce,
    /// Detect focus and hover changes, to be read on the next frame.
    Detect,
}

/// The configuration of a tooltip widget, read once when the widget is bound.
///
/// The entity with this component is the root of the widget. It must have exactly one
/// descendant with [`TooltipTrigger`] and one with [`TooltipPanel`].
#[derive(Component, Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct Tooltip {
    /// The side of the widget to try first when placing the panel.
    pub placement: TooltipPlacement,
    /// The duration the widget must stay hovered or focused before the panel appears (in milliseconds).
    pub show_delay: u32,
    /// The duration the widget must stay idle before the panel disappears (in milliseconds).
    pub hide_delay: u32,
}

impl Tooltip {
    /// The default `Tooltip`.
    pub const DEFAULT: Self = Self {
        placement: TooltipPlacement::Bottom,
        show_delay: 0,
        hide_delay: 500,
    };

    /// Build a `Tooltip` from loosely typed attribute values.
    ///
    /// The placement is matched case-insensitively and falls back to
    /// [`TooltipPlacement::Bottom`]. A delay that is missing or not a non-negative
    /// integer falls back to its default.
    pub fn from_attributes(
        placement: Option<&str>,
        show_delay: Option<&str>,
        hide_delay: Option<&str>,
    ) -> Self {
        Self {
            placement: placement.map(TooltipPlacement::normalize).unwrap_or_default(),
            show_delay: parse_delay(show_delay, Self::DEFAULT.show_delay),
            hide_delay: parse_delay(hide_delay, Self::DEFAULT.hide_delay),
        }
    }

    /// Set a custom preferred [`TooltipPlacement`].
    pub const fn with_placement(mut self, placement: TooltipPlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Set a custom show delay (in milliseconds).
    pub const fn with_show_delay(mut self, show_delay: u32) -> Self {
        self.show_delay = show_delay;
        self
    }

    /// Set a custom hide delay (in milliseconds).
    pub const fn with_hide_delay(mut self, hide_delay: u32) -> Self {
        self.hide_delay = hide_delay;
        self
    }
}

impl Default for Tooltip {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn parse_delay(value: Option<&str>, default: u32) -> u32 {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_default_when_missing() {
        assert_eq!(Tooltip::from_attributes(None, None, None), Tooltip::DEFAULT);
    }

    #[test]
    fn attributes_are_normalized() {
        let tooltip = Tooltip::from_attributes(Some(" RIGHT "), Some("250"), Some("0"));
        assert_eq!(tooltip.placement, TooltipPlacement::Right);
        assert_eq!(tooltip.show_delay, 250);
        assert_eq!(tooltip.hide_delay, 0);
    }

    #[test]
    fn invalid_attributes_fall_back_to_defaults() {
        let tooltip = Tooltip::from_attributes(Some("diagonal"), Some("-20"), Some("soon"));
        assert_eq!(tooltip, Tooltip::DEFAULT);
    }

    #[test]
    fn builders_override_defaults() {
        let tooltip = Tooltip::DEFAULT
            .with_placement(TooltipPlacement::Top)
            .with_show_delay(100)
            .with_hide_delay(0);
        assert_eq!(tooltip.placement, TooltipPlacement::Top);
        assert_eq!(tooltip.show_delay, 100);
        assert_eq!(tooltip.hide_delay, 0);
    }
}
