use accesskit::{Node as AccessKitNode, NodeId, Role};
use bevy_a11y::AccessibilityNode;
use bevy_app::{App, PreUpdate};
use bevy_camera::visibility::Visibility;
#[cfg(feature = "bevy_reflect")]
use bevy_ecs::reflect::ReflectComponent;
use bevy_ecs::{
    component::Component,
    entity::Entity,
    hierarchy::Children,
    name::Name,
    query::{With, Without},
    schedule::IntoScheduleConfigs as _,
    system::{Commands, Query, Res, ResMut},
};
use bevy_input_focus::tab_navigation::TabIndex;
use bevy_text::TextColor;
use bevy_ui::{BackgroundColor, BorderColor, Interaction, Node, Outline, UiRect, Val};
use log::{debug, error, warn};
use thiserror::Error;

use crate::{
    Tooltip, TooltipSystems,
    context::TooltipContext,
    placement::{ActivePlacement, TooltipPlacement},
    registry::{TooltipId, TooltipRegistry},
    style::{TooltipStyle, TriggerHighlight},
};

/// The accessible label of every tooltip widget root.
const GROUP_LABEL: &str = "Has tooltip on hover or focus";
/// The accessible label of every tooltip panel.
const REGION_LABEL: &str = "Tooltip";

pub(super) fn plugin(app: &mut App) {
    #[cfg(feature = "bevy_reflect")]
    app.register_type::<TooltipTrigger>()
        .register_type::<TooltipPanel>();
    app.add_systems(PreUpdate, setup_tooltips.in_set(TooltipSystems::Setup));
}

/// A marker component for the descendant of a [`Tooltip`] that reveals the panel.
#[derive(Component, Copy, Clone, Debug, Default)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct TooltipTrigger;

/// A marker component for the descendant of a [`Tooltip`] that is revealed.
#[derive(Component, Copy, Clone, Debug, Default)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct TooltipPanel;

/// The parts of a tooltip widget, inserted on its root once the widget is bound.
#[derive(Component, Copy, Clone, Debug)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct TooltipBinding {
    /// The identity of the widget.
    pub id: TooltipId,
    /// The entity marked with [`TooltipTrigger`].
    pub trigger: Entity,
    /// The entity marked with [`TooltipPanel`].
    pub panel: Entity,
    /// The preferred placement, read from the widget's [`Tooltip`].
    pub placement: TooltipPlacement,
}

/// A marker component for a tooltip widget that failed to bind and will stay inert.
#[derive(Component, Copy, Clone, Debug, Default)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct TooltipInert;

/// An error in the structure of a tooltip widget.
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The widget has no descendant marked with [`TooltipTrigger`].
    #[error("{widget} has no descendant marked with `TooltipTrigger`")]
    MissingTrigger {
        /// The identity assigned to the widget.
        widget: TooltipId,
    },
    /// The widget has no descendant marked with [`TooltipPanel`].
    #[error("{widget} has no descendant marked with `TooltipPanel`")]
    MissingPanel {
        /// The identity assigned to the widget.
        widget: TooltipId,
    },
}

fn setup_tooltips(
    mut commands: Commands,
    mut registry: ResMut<TooltipRegistry>,
    style: Res<TooltipStyle>,
    widget_query: Query<(Entity, &Tooltip), (Without<TooltipBinding>, Without<TooltipInert>)>,
    children_query: Query<&Children>,
    trigger_query: Query<(), With<TooltipTrigger>>,
    panel_query: Query<(), With<TooltipPanel>>,
    background_query: Query<&BackgroundColor>,
    mut a11y_query: Query<&mut AccessibilityNode>,
    mut node_query: Query<&mut Node>,
    mut text_color_query: Query<&mut TextColor>,
) {
    for (entity, tooltip) in &widget_query {
        let id = registry.register(entity);
        let subtree = descendants(entity, &children_query);
        let (trigger, panel) = match find_parts(
            id,
            &subtree,
            |e| trigger_query.contains(e),
            |e| panel_query.contains(e),
        ) {
            Ok(parts) => parts,
            Err(e) => {
                error!("Tooltip setup halted: {e}");
                commands.entity(entity).insert(TooltipInert);
                continue;
            }
        };

        commands
            .entity(entity)
            .insert((
                TooltipBinding {
                    id,
                    trigger,
                    panel,
                    placement: tooltip.placement,
                },
                TooltipContext::new(tooltip),
                ActivePlacement(tooltip.placement),
                labelled(Role::Group, GROUP_LABEL),
            ))
            .insert_if_new(Interaction::None);

        // Trigger.
        let details = vec![NodeId(panel.to_bits())];
        if let Ok(mut node) = a11y_query.get_mut(trigger) {
            node.0.set_details(details);
        } else {
            let mut node = AccessKitNode::new(Role::GenericContainer);
            node.set_details(details);
            commands.entity(trigger).insert(AccessibilityNode(node));
        }
        let rest = background_query
            .get(trigger)
            .map_or(BackgroundColor::DEFAULT.0, |background| background.0);
        commands
            .entity(trigger)
            .insert(TriggerHighlight { rest })
            .insert_if_new((
                Name::new(id.trigger_name()),
                TabIndex(0),
                Interaction::None,
                BackgroundColor(rest),
                Outline::new(Val::Px(1.0), Val::Px(1.0), style.border_color),
            ));

        // Panel.
        if let Ok(mut node) = node_query.get_mut(panel) {
            tooltip.placement.apply(&mut node);
            node.border = UiRect::all(Val::Px(2.0));
            node.padding = UiRect::all(Val::Px(5.0));
        }
        for text in core::iter::once(panel).chain(descendants(panel, &children_query)) {
            if let Ok(mut color) = text_color_query.get_mut(text) {
                color.0 = style.text_color;
            }
        }
        commands
            .entity(panel)
            .insert((
                labelled(Role::Region, REGION_LABEL),
                Visibility::Hidden,
                BackgroundColor(style.background_color),
                BorderColor::all(style.border_color),
            ))
            .insert_if_new((Name::new(id.panel_name()), Interaction::None));

        debug!("Bound {id} (trigger: {trigger}, panel: {panel})");
    }
}

/// Find the first trigger and the first panel among `descendants`.
fn find_parts(
    widget: TooltipId,
    descendants: &[Entity],
    is_trigger: impl Fn(Entity) -> bool,
    is_panel: impl Fn(Entity) -> bool,
) -> Result<(Entity, Entity), ConfigurationError> {
    let mut triggers = descendants.iter().copied().filter(|&e| is_trigger(e));
    let mut panels = descendants.iter().copied().filter(|&e| is_panel(e));

    let trigger = triggers
        .next()
        .ok_or(ConfigurationError::MissingTrigger { widget })?;
    let panel = panels
        .next()
        .ok_or(ConfigurationError::MissingPanel { widget })?;

    if triggers.next().is_some() {
        warn!("{widget} has more than one `TooltipTrigger`, using the first");
    }
    if panels.next().is_some() {
        warn!("{widget} has more than one `TooltipPanel`, using the first");
    }

    Ok((trigger, panel))
}

/// The descendants of `root` in depth-first order, excluding `root` itself.
fn descendants(root: Entity, children_query: &Query<&Children>) -> Vec<Entity> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(entity) = stack.pop() {
        if entity != root {
            out.push(entity);
        }
        if let Ok(children) = children_query.get(entity) {
            let children: &[Entity] = children;
            stack.extend(children.iter().rev());
        }
    }
    out
}

fn labelled(role: Role, label: &str) -> AccessibilityNode {
    let mut node = AccessKitNode::new(role);
    node.set_label(label);
    AccessibilityNode(node)
}
