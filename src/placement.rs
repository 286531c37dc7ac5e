use core::{fmt, str::FromStr};

use bevy_app::{App, PreUpdate};
#[cfg(feature = "bevy_reflect")]
use bevy_ecs::reflect::ReflectComponent;
use bevy_ecs::{
    component::Component,
    message::MessageReader,
    query::With,
    schedule::IntoScheduleConfigs as _,
    system::Query,
};
use bevy_math::{Rect, Vec2};
use bevy_ui::{ComputedNode, Node, PositionType, UiGlobalTransform, Val};
use bevy_window::{PrimaryWindow, Window};
use log::debug;
use thiserror::Error;
use tiny_bail::prelude::*;

use crate::{
    TooltipSystems,
    context::{TooltipTransition, TransitionKind},
    setup::TooltipBinding,
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(
        PreUpdate,
        place_tooltip.in_set(TooltipSystems::Display),
    );
}

/// The side of a tooltip widget that its panel is placed on.
///
/// Defaults to [`Self::Bottom`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub enum TooltipPlacement {
    /// Above the widget, aligned to its left edge.
    Top,
    /// Below the widget, aligned to its left edge.
    #[default]
    Bottom,
    /// To the left of the widget, raised by half its height.
    Left,
    /// To the right of the widget, raised by half its height.
    Right,
}

impl TooltipPlacement {
    /// The order in which the remaining sides are tried after the preferred one.
    pub const FALLBACK_ORDER: [Self; 4] = [Self::Bottom, Self::Right, Self::Left, Self::Top];

    /// Parse a placement case-insensitively, falling back to the default.
    pub fn normalize(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    /// The sides to try in order: `self` first, then the rest of [`Self::FALLBACK_ORDER`].
    pub fn candidates(self) -> [Self; 4] {
        let mut candidates = [self; 4];
        let rest = Self::FALLBACK_ORDER.into_iter().filter(|&side| side != self);
        for (slot, side) in candidates[1..].iter_mut().zip(rest) {
            *slot = side;
        }
        candidates
    }

    /// The rect a panel of `panel_size` would occupy next to `anchor` on this side.
    ///
    /// Mirrors the offsets applied to the panel's [`Node`] by this placement.
    pub fn panel_rect(self, anchor: Rect, panel_size: Vec2) -> Rect {
        let raised = anchor.min.y - anchor.height() / 2.0;
        let min = match self {
            Self::Top => Vec2::new(anchor.min.x, anchor.min.y - panel_size.y),
            Self::Bottom => Vec2::new(anchor.min.x, anchor.max.y),
            Self::Left => Vec2::new(anchor.min.x - panel_size.x, raised),
            Self::Right => Vec2::new(anchor.max.x, raised),
        };
        Rect::from_corners(min, min + panel_size)
    }

    /// Position an absolutely positioned panel [`Node`] on this side of its parent.
    pub fn apply(self, node: &mut Node) {
        node.position_type = PositionType::Absolute;
        (node.top, node.right, node.bottom, node.left) = match self {
            Self::Top => (Val::Auto, Val::Auto, Val::Percent(100.0), Val::ZERO),
            Self::Bottom => (Val::Percent(100.0), Val::Auto, Val::Auto, Val::ZERO),
            Self::Left => (Val::Percent(-50.0), Val::Percent(100.0), Val::Auto, Val::Auto),
            Self::Right => (Val::Percent(-50.0), Val::Auto, Val::Auto, Val::Percent(100.0)),
        };
    }

    /// The lowercase name of this placement.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for TooltipPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TooltipPlacement {
    type Err = UnknownPlacement;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(UnknownPlacement(s.to_owned())),
        }
    }
}

/// The error returned when parsing a [`TooltipPlacement`] from an unknown name.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("unknown tooltip placement {0:?}, expected one of top, bottom, left or right")]
pub struct UnknownPlacement(pub String);

/// The placement most recently committed for a tooltip widget's panel.
#[derive(Component, Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct ActivePlacement(pub TooltipPlacement);

/// The result of [`resolve_placement`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlacementOutcome {
    /// The committed placement.
    pub placement: TooltipPlacement,
    /// The number of candidates that were measured.
    pub attempts: usize,
    /// Whether the committed placement fits inside the viewport.
    pub fits: bool,
}

/// Whether `rect` lies entirely within a viewport of the given size.
pub fn fits_viewport(rect: Rect, viewport: Vec2) -> bool {
    rect.min.x >= 0.0 && rect.min.y >= 0.0 && rect.max.x <= viewport.x && rect.max.y <= viewport.y
}

/// Find the first candidate of `preferred` whose measured rect fits the viewport.
///
/// If no candidate fits, the last candidate is committed.
pub fn resolve_placement(
    preferred: TooltipPlacement,
    viewport: Vec2,
    mut measure: impl FnMut(TooltipPlacement) -> Rect,
) -> PlacementOutcome {
    let candidates = preferred.candidates();
    for (i, &placement) in candidates.iter().enumerate() {
        if fits_viewport(measure(placement), viewport) {
            return PlacementOutcome {
                placement,
                attempts: i + 1,
                fits: true,
            };
        }
    }

    PlacementOutcome {
        placement: candidates[candidates.len() - 1],
        attempts: candidates.len(),
        fits: false,
    }
}

fn place_tooltip(
    mut transitions: MessageReader<TooltipTransition>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut widget_query: Query<(
        &TooltipBinding,
        &mut ActivePlacement,
        &ComputedNode,
        &UiGlobalTransform,
    )>,
    mut panel_query: Query<(&mut Node, &ComputedNode)>,
) {
    let viewport = window_query
        .single()
        .ok()
        .map(|window| window.physical_size().as_vec2());

    for transition in transitions.read() {
        cq!(transition.kind == TransitionKind::Shown);
        let (binding, mut active, computed, gt) = c!(widget_query.get_mut(transition.widget));
        let (mut node, panel_computed) = c!(panel_query.get_mut(binding.panel));

        // Measure against the most recent layout of the widget and its panel.
        let anchor = Rect::from_center_size(gt.translation, computed.size());
        let panel_size = panel_computed.size();
        let placement = match viewport {
            Some(viewport) => {
                let outcome = resolve_placement(binding.placement, viewport, |placement| {
                    placement.panel_rect(anchor, panel_size)
                });
                debug!(
                    "Placed {} on {} after {} attempt(s) (fits: {})",
                    binding.id, outcome.placement, outcome.attempts, outcome.fits,
                );
                outcome.placement
            }
            None => binding.placement,
        };

        placement.apply(&mut node);
        active.0 = placement;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    fn anchor(x: f32, y: f32) -> Rect {
        Rect::from_corners(Vec2::new(x, y), Vec2::new(x + 100.0, y + 40.0))
    }

    #[test]
    fn candidates_start_with_the_preferred_side() {
        use TooltipPlacement::*;
        assert_eq!(Bottom.candidates(), [Bottom, Right, Left, Top]);
        assert_eq!(Right.candidates(), [Right, Bottom, Left, Top]);
        assert_eq!(Left.candidates(), [Left, Bottom, Right, Top]);
        assert_eq!(Top.candidates(), [Top, Bottom, Right, Left]);
    }

    #[test]
    fn parse_is_case_insensitive_and_normalizes() {
        assert_eq!("Left".parse::<TooltipPlacement>(), Ok(TooltipPlacement::Left));
        assert_eq!(TooltipPlacement::normalize(" TOP"), TooltipPlacement::Top);
        assert_eq!(TooltipPlacement::normalize("center"), TooltipPlacement::Bottom);
        assert_eq!(
            "center".parse::<TooltipPlacement>(),
            Err(UnknownPlacement("center".to_owned())),
        );
    }

    #[test]
    fn panel_rects_sit_beside_the_anchor() {
        let anchor = anchor(200.0, 200.0);
        let size = Vec2::new(50.0, 30.0);
        assert_eq!(
            TooltipPlacement::Bottom.panel_rect(anchor, size),
            Rect::new(200.0, 240.0, 250.0, 270.0),
        );
        assert_eq!(
            TooltipPlacement::Top.panel_rect(anchor, size),
            Rect::new(200.0, 170.0, 250.0, 200.0),
        );
        assert_eq!(
            TooltipPlacement::Right.panel_rect(anchor, size),
            Rect::new(300.0, 180.0, 350.0, 210.0),
        );
        assert_eq!(
            TooltipPlacement::Left.panel_rect(anchor, size),
            Rect::new(150.0, 180.0, 200.0, 210.0),
        );
    }

    #[test]
    fn preferred_side_is_accepted_without_other_attempts() {
        let mut tried = Vec::new();
        let outcome = resolve_placement(TooltipPlacement::Top, VIEWPORT, |placement| {
            tried.push(placement);
            placement.panel_rect(anchor(300.0, 300.0), Vec2::new(80.0, 40.0))
        });
        assert_eq!(tried, [TooltipPlacement::Top]);
        assert_eq!(
            outcome,
            PlacementOutcome {
                placement: TooltipPlacement::Top,
                attempts: 1,
                fits: true,
            },
        );
    }

    #[test]
    fn overflowing_right_falls_back_to_bottom() {
        // The anchor hugs the right edge, so only vertical placements fit.
        let anchor = anchor(680.0, 100.0);
        let outcome = resolve_placement(TooltipPlacement::Right, VIEWPORT, |placement| {
            placement.panel_rect(anchor, Vec2::new(110.0, 40.0))
        });
        assert_eq!(outcome.placement, TooltipPlacement::Bottom);
        assert_eq!(outcome.attempts, 2);
        assert!(outcome.fits);
    }

    #[test]
    fn nothing_fits_commits_the_last_candidate() {
        let oversized = Vec2::new(2000.0, 2000.0);
        let resolve = || {
            let mut attempts = 0;
            let outcome = resolve_placement(TooltipPlacement::Left, VIEWPORT, |placement| {
                attempts += 1;
                placement.panel_rect(anchor(300.0, 300.0), oversized)
            });
            (outcome, attempts)
        };

        let (first, attempts) = resolve();
        assert_eq!(attempts, 4);
        assert_eq!(first.attempts, 4);
        assert_eq!(first.placement, TooltipPlacement::Top);
        assert!(!first.fits);
        assert_eq!(resolve().0, first);
    }

    #[test]
    fn viewport_edges_are_inclusive() {
        assert!(fits_viewport(Rect::new(0.0, 0.0, 800.0, 600.0), VIEWPORT));
        assert!(!fits_viewport(Rect::new(-0.5, 0.0, 10.0, 10.0), VIEWPORT));
        assert!(!fits_viewport(Rect::new(0.0, 0.0, 10.0, 600.5), VIEWPORT));
    }

    #[test]
    fn apply_sets_absolute_offsets() {
        let mut node = Node::default();
        TooltipPlacement::Left.apply(&mut node);
        assert_eq!(node.position_type, PositionType::Absolute);
        assert_eq!(node.right, Val::Percent(100.0));
        assert_eq!(node.top, Val::Percent(-50.0));
        assert_eq!(node.left, Val::Auto);

        TooltipPlacement::Bottom.apply(&mut node);
        assert_eq!(node.top, Val::Percent(100.0));
        assert_eq!(node.right, Val::Auto);
        assert_eq!(node.left, Val::ZERO);
    }
}
