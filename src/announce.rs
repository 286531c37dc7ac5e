use core::time::Duration;

use accesskit::{Live, Node as AccessKitNode, Role};
use bevy_a11y::AccessibilityNode;
use bevy_app::{App, PreUpdate};
#[cfg(feature = "bevy_reflect")]
use bevy_ecs::reflect::{ReflectComponent, ReflectResource};
use bevy_ecs::{
    component::Component,
    entity::Entity,
    hierarchy::ChildOf,
    message::MessageReader,
    name::Name,
    resource::Resource,
    schedule::IntoScheduleConfigs as _,
    system::{Commands, Query, Res},
    world::World,
};
use bevy_time::Time;
use bevy_ui::{Node, PositionType, Val, widget::Text};
use log::trace;
use tiny_bail::prelude::*;

use crate::{
    TooltipSystems,
    context::{TooltipContext, TooltipTransition, TransitionKind},
    setup::TooltipBinding,
};

/// How long an announcement stays in the live region.
pub const ANNOUNCEMENT_LIFETIME: Duration = Duration::from_millis(1000);

pub(super) fn plugin(app: &mut App) {
    #[cfg(feature = "bevy_reflect")]
    app.register_type::<TooltipLiveRegion>()
        .register_type::<Announcement>();
    let live_region = TooltipLiveRegion::new(app.world_mut());
    app.insert_resource(live_region);
    app.add_systems(
        PreUpdate,
        (announce_transitions, expire_announcements)
            .chain()
            .in_set(TooltipSystems::Announce),
    );
}

/// A [`Resource`] that holds the off-screen live region shared by all tooltip widgets.
#[derive(Resource, Copy, Clone, Debug)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Resource)
)]
pub struct TooltipLiveRegion {
    /// The [`Entity`] ID of the live region. Announcements are spawned as its children.
    pub entity: Entity,
}

impl TooltipLiveRegion {
    fn new(world: &mut World) -> Self {
        let mut region = AccessKitNode::new(Role::Complementary);
        region.set_live(Live::Polite);

        let entity = world
            .spawn((
                Name::new("TooltipLiveRegion"),
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(-99_999_999.0),
                    top: Val::ZERO,
                    ..Default::default()
                },
                AccessibilityNode(region),
            ))
            .id();

        Self { entity }
    }
}

/// A transient text entity in the [`TooltipLiveRegion`].
#[derive(Component, Copy, Clone, Debug)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct Announcement {
    /// The elapsed time at which the announcement is despawned.
    pub expires_at: Duration,
}

impl Announcement {
    /// An announcement made at `now`.
    pub fn new(now: Duration) -> Self {
        Self {
            expires_at: now + ANNOUNCEMENT_LIFETIME,
        }
    }

    /// Whether the announcement should be removed at `now`.
    pub fn is_expired(&self, now: Duration) -> bool {
        now >= self.expires_at
    }
}

impl TransitionKind {
    /// The text announced for this transition.
    pub const fn announcement(self) -> &'static str {
        match self {
            Self::Shown => "Tooltip shown",
            Self::Hidden => "Tooltip hidden",
        }
    }
}

fn announce_transitions(
    mut commands: Commands,
    time: Res<Time>,
    live_region: Res<TooltipLiveRegion>,
    mut transitions: MessageReader<TooltipTransition>,
    mut widget_query: Query<(&TooltipBinding, &mut TooltipContext)>,
) {
    let now = time.elapsed();
    for transition in transitions.read() {
        let (binding, mut ctx) = c!(widget_query.get_mut(transition.widget));
        let name = binding.id.announcement_name(ctx.next_announcement());
        let text = transition.kind.announcement();
        trace!("Announcing {text:?} as {name}");

        let mut label = AccessKitNode::new(Role::Label);
        label.set_label(text);
        commands.spawn((
            Name::new(name),
            Text::new(text),
            AccessibilityNode(label),
            Announcement::new(now),
            ChildOf(live_region.entity),
        ));
    }
}

fn expire_announcements(
    mut commands: Commands,
    time: Res<Time>,
    announcement_query: Query<(Entity, &Announcement)>,
) {
    let now = time.elapsed();
    for (entity, announcement) in &announcement_query {
        cq!(announcement.is_expired(now));
        commands.entity(entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announcements_expire_after_their_lifetime() {
        let announcement = Announcement::new(Duration::from_millis(250));
        assert!(!announcement.is_expired(Duration::from_millis(1249)));
        assert!(announcement.is_expired(Duration::from_millis(1250)));
    }

    #[test]
    fn transitions_have_short_announcements() {
        assert_eq!(TransitionKind::Shown.announcement(), "Tooltip shown");
        assert_eq!(TransitionKind::Hidden.announcement(), "Tooltip hidden");
    }
}
