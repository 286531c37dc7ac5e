use alloc::collections::BTreeMap;
use core::fmt;

use bevy_app::{App, PreUpdate};
use bevy_ecs::{
    entity::Entity,
    prelude::RemovedComponents,
    resource::Resource,
    schedule::IntoScheduleConfigs as _,
    system::ResMut,
};

use crate::{Tooltip, TooltipSystems};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<TooltipRegistry>();
    app.add_systems(PreUpdate, forget_despawned.in_set(TooltipSystems::Setup));
}

/// The stable identity of a bound tooltip widget.
///
/// Identities are handed out by [`TooltipRegistry::register`] in increasing order and
/// are used to namespace the names of the widget's generated entities.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct TooltipId(u32);

impl TooltipId {
    /// The raw index of this identity.
    pub const fn index(self) -> u32 {
        self.0
    }

    /// The generated name for the widget's trigger.
    pub fn trigger_name(self) -> String {
        format!("{self}-trigger")
    }

    /// The generated name for the widget's panel.
    pub fn panel_name(self) -> String {
        format!("{self}-panel")
    }

    /// The generated name for the widget's `sequence`th announcement.
    pub fn announcement_name(self, sequence: u32) -> String {
        format!("{self}-announce-{sequence}")
    }
}

impl fmt::Display for TooltipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tooltip-{}", self.0)
    }
}

/// A [`Resource`] that tracks every tooltip widget that has been assigned an identity.
#[derive(Resource, Default, Debug)]
pub struct TooltipRegistry {
    next: u32,
    widgets: BTreeMap<TooltipId, Entity>,
    ids: BTreeMap<Entity, TooltipId>,
}

impl TooltipRegistry {
    /// Assign the next identity to a widget entity.
    pub fn register(&mut self, entity: Entity) -> TooltipId {
        let id = TooltipId(self.next);
        self.next += 1;
        self.widgets.insert(id, entity);
        if let Some(stale) = self.ids.insert(entity, id) {
            self.widgets.remove(&stale);
        }
        id
    }

    /// The widget entity with the given identity, if it is still alive.
    pub fn get(&self, id: TooltipId) -> Option<Entity> {
        self.widgets.get(&id).copied()
    }

    /// The identity assigned to a widget entity, if any.
    pub fn id_of(&self, entity: Entity) -> Option<TooltipId> {
        self.ids.get(&entity).copied()
    }

    /// Drop a widget entity from the registry. Its identity is never reused.
    pub fn forget(&mut self, entity: Entity) -> Option<TooltipId> {
        let id = self.ids.remove(&entity)?;
        self.widgets.remove(&id);
        Some(id)
    }
}

fn forget_despawned(
    mut registry: ResMut<TooltipRegistry>,
    mut removed: RemovedComponents<Tooltip>,
) {
    for entity in removed.read() {
        registry.forget(entity);
    }
}
