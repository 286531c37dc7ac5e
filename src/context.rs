use core::time::Duration;

use bevy_app::{App, PreUpdate};
use bevy_camera::visibility::Visibility;
#[cfg(feature = "bevy_reflect")]
use bevy_ecs::reflect::ReflectComponent;
use bevy_ecs::{
    component::Component,
    entity::Entity,
    hierarchy::ChildOf,
    message::{Message, MessageReader, MessageWriter},
    schedule::IntoScheduleConfigs as _,
    system::{Commands, Query, Res, ResMut},
};
use bevy_input::{ButtonInput, keyboard::KeyCode};
use bevy_input_focus::InputFocus;
use bevy_time::Time;
use bevy_ui::Interaction;
use log::{debug, trace};
use tiny_bail::prelude::*;

use crate::{Tooltip, TooltipSystems, setup::TooltipBinding};

pub(super) fn plugin(app: &mut App) {
    app.add_message::<TooltipTransition>();
    app.add_systems(
        PreUpdate,
        (
            (dismiss_tooltips, tick_tooltips)
                .chain()
                .in_set(TooltipSystems::Interaction),
            (hide_tooltip, show_tooltip)
                .chain()
                .in_set(TooltipSystems::Display),
            detect_interactions.in_set(TooltipSystems::Detect),
        ),
    );
}

/// The debounce state machine of a single tooltip widget.
///
/// The machine only changes [`visible`](Self::is_visible) when a timer fires and the
/// widget's current [`InteractionState`] still agrees with the change. Interaction
/// changes are not read immediately: [`notify_interaction`](Self::notify_interaction)
/// schedules a deferred read that is consumed by the next [`advance`](Self::advance).
#[derive(Component, Clone, Debug)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct TooltipContext {
    show_delay: Duration,
    hide_delay: Duration,
    /// Whether the panel is currently shown.
    visible: bool,
    /// The single outstanding show or hide timer.
    timer: Option<PendingTimer>,
    /// The single outstanding re-evaluation of the interaction state.
    deferred_read: Option<DeferredRead>,
    /// Set by an explicit dismissal until the widget is fully left.
    suppressed: bool,
    /// The interaction state observed on the previous frame.
    last_reading: InteractionState,
    /// The number of announcements made so far.
    announcements: u32,
}

impl TooltipContext {
    /// Create a hidden context with the delays of the given [`Tooltip`].
    pub fn new(tooltip: &Tooltip) -> Self {
        Self {
            show_delay: Duration::from_millis(tooltip.show_delay.into()),
            hide_delay: Duration::from_millis(tooltip.hide_delay.into()),
            visible: false,
            timer: None,
            deferred_read: None,
            suppressed: false,
            last_reading: InteractionState::IDLE,
            announcements: 0,
        }
    }

    /// Whether the panel is currently shown.
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// The outstanding show or hide timer, if any.
    pub const fn timer(&self) -> Option<PendingTimer> {
        self.timer
    }

    /// Whether the widget was dismissed and has not been fully left since.
    pub const fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Whether an interaction change is waiting to be read.
    pub const fn has_deferred_read(&self) -> bool {
        self.deferred_read.is_some()
    }

    /// The interaction state observed most recently by [`observe`](Self::observe).
    pub const fn last_reading(&self) -> InteractionState {
        self.last_reading
    }

    /// Whether the panel should be shown for the given interaction state.
    pub const fn desired(&self, reading: InteractionState) -> bool {
        reading.engaged() && !self.suppressed
    }

    /// Whether an explicit dismissal would have any effect.
    pub fn is_dismissable(&self) -> bool {
        self.visible || matches!(self.timer, Some(timer) if timer.kind == TimerKind::Show)
    }

    /// Record the interaction state of this frame, scheduling a deferred read if it changed.
    ///
    /// Returns whether a read was scheduled.
    pub fn observe(&mut self, now: Duration, reading: InteractionState) -> bool {
        if self.last_reading == reading {
            return false;
        }
        self.last_reading = reading;
        self.notify_interaction(now);
        true
    }

    /// Schedule a read of the interaction state on the next [`advance`](Self::advance),
    /// replacing any read that is already scheduled.
    pub fn notify_interaction(&mut self, now: Duration) {
        self.deferred_read = Some(DeferredRead { requested_at: now });
    }

    /// Advance the machine to `now`, given the current interaction state.
    ///
    /// Consumes the deferred read (if any), then fires the pending timer if it is due.
    /// Returns the transition that was committed, if any.
    pub fn advance(&mut self, now: Duration, reading: InteractionState) -> Option<TransitionKind> {
        if let Some(read) = self.deferred_read.take() {
            trace!(
                "Reading deferred interaction from {:?} at {now:?}: {reading:?}",
                read.requested_at,
            );
            if !reading.engaged() {
                self.suppressed = false;
            }
            self.signal(now, self.desired(reading));
        }

        let timer = self.timer?;
        if timer.deadline > now {
            return None;
        }
        self.timer = None;

        // Re-validate against the latest input, not the input that armed the timer.
        let desired = self.desired(reading);
        match timer.kind {
            TimerKind::Show if desired && !self.visible => {
                self.visible = true;
                Some(TransitionKind::Shown)
            }
            TimerKind::Hide if !desired && self.visible => {
                self.visible = false;
                Some(TransitionKind::Hidden)
            }
            _ => None,
        }
    }

    /// Hide the panel immediately and suppress it until the widget is fully left.
    ///
    /// Any pending timer is cancelled. A widget whose panel is not shown is not suppressed.
    /// Returns the transition that was committed, if any.
    pub fn dismiss(&mut self) -> Option<TransitionKind> {
        self.timer = None;
        if !self.visible {
            return None;
        }
        self.visible = false;
        self.suppressed = true;
        Some(TransitionKind::Hidden)
    }

    /// Take the next announcement sequence number, starting at 1.
    pub fn next_announcement(&mut self) -> u32 {
        self.announcements += 1;
        self.announcements
    }

    fn signal(&mut self, now: Duration, desired: bool) {
        if desired == self.visible {
            // Nothing to do, and any pending timer would be discarded when it fires.
            self.timer = None;
            return;
        }

        self.timer = Some(if desired {
            PendingTimer {
                kind: TimerKind::Show,
                deadline: now + self.show_delay,
            }
        } else {
            PendingTimer {
                kind: TimerKind::Hide,
                deadline: now + self.hide_delay,
            }
        });
    }
}

/// An outstanding show or hide timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct PendingTimer {
    /// Whether the timer will show or hide the panel.
    pub kind: TimerKind,
    /// The elapsed time at which the timer fires.
    pub deadline: Duration,
}

/// The kind of a [`PendingTimer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub enum TimerKind {
    /// Show the panel if the widget is still hovered or focused.
    Show,
    /// Hide the panel if the widget is still idle.
    Hide,
}

#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
struct DeferredRead {
    requested_at: Duration,
}

/// Whether a tooltip widget currently contains the input focus or the pointer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct InteractionState {
    /// The [`InputFocus`] is the widget root or one of its descendants.
    pub focused: bool,
    /// The widget root, trigger or panel is hovered or pressed.
    pub hovered: bool,
}

impl InteractionState {
    /// Neither focused nor hovered.
    pub const IDLE: Self = Self {
        focused: false,
        hovered: false,
    };

    /// Focused but not hovered.
    pub const FOCUSED: Self = Self {
        focused: true,
        hovered: false,
    };

    /// Hovered but not focused.
    pub const HOVERED: Self = Self {
        focused: false,
        hovered: true,
    };

    /// Whether the widget is focused or hovered.
    pub const fn engaged(self) -> bool {
        self.focused || self.hovered
    }
}

fn read_interaction(
    widget: Entity,
    binding: &TooltipBinding,
    focus: &InputFocus,
    parent_query: &Query<&ChildOf>,
    interaction_query: &Query<&Interaction>,
) -> InteractionState {
    let focused = focus
        .get()
        .is_some_and(|focused| is_within(focused, widget, parent_query));
    let hovered = [widget, binding.trigger, binding.panel]
        .into_iter()
        .filter_map(|entity| interaction_query.get(entity).ok())
        .any(|interaction| !matches!(interaction, Interaction::None));

    InteractionState { focused, hovered }
}

fn is_within(mut entity: Entity, root: Entity, parent_query: &Query<&ChildOf>) -> bool {
    loop {
        if entity == root {
            return true;
        }
        let Ok(child_of) = parent_query.get(entity) else {
            return false;
        };
        entity = child_of.parent();
    }
}

/// A message written whenever a tooltip panel is shown or hidden.
#[derive(Message, Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub struct TooltipTransition {
    /// The root entity of the tooltip widget.
    pub widget: Entity,
    /// Whether the panel was shown or hidden.
    pub kind: TransitionKind,
}

/// The direction of a [`TooltipTransition`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "bevy_reflect", derive(bevy_reflect::Reflect))]
pub enum TransitionKind {
    /// The panel became visible.
    Shown,
    /// The panel became hidden.
    Hidden,
}

/// A marker component present on a tooltip widget root while its panel is shown.
#[derive(Component, Copy, Clone, Debug, Default)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Component)
)]
pub struct TooltipShown;

fn dismiss_tooltips(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mut focus: ResMut<InputFocus>,
    mut transitions: MessageWriter<TooltipTransition>,
    mut widget_query: Query<(Entity, &TooltipBinding, &mut TooltipContext)>,
) {
    let keyboard = rq!(keyboard);
    rq!(keyboard.just_pressed(KeyCode::Escape));

    for (entity, binding, mut ctx) in &mut widget_query {
        cq!(ctx.is_dismissable());
        // Only a shown panel takes the focus back to its trigger.
        let kind = cq!(ctx.dismiss());
        debug!("Dismissed {}", binding.id);
        transitions.write(TooltipTransition {
            widget: entity,
            kind,
        });
        focus.set(binding.trigger);
    }
}

fn tick_tooltips(
    time: Res<Time>,
    focus: Res<InputFocus>,
    parent_query: Query<&ChildOf>,
    interaction_query: Query<&Interaction>,
    mut transitions: MessageWriter<TooltipTransition>,
    mut widget_query: Query<(Entity, &TooltipBinding, &mut TooltipContext)>,
) {
    let now = time.elapsed();
    for (entity, binding, mut ctx) in &mut widget_query {
        let reading =
            read_interaction(entity, binding, &focus, &parent_query, &interaction_query);
        let kind = cq!(ctx.advance(now, reading));
        debug!("Committed {kind:?} for {} at {now:?}", binding.id);
        transitions.write(TooltipTransition {
            widget: entity,
            kind,
        });
    }
}

fn detect_interactions(
    time: Res<Time>,
    focus: Res<InputFocus>,
    parent_query: Query<&ChildOf>,
    interaction_query: Query<&Interaction>,
    mut widget_query: Query<(Entity, &TooltipBinding, &mut TooltipContext)>,
) {
    let now = time.elapsed();
    for (entity, binding, mut ctx) in &mut widget_query {
        let reading =
            read_interaction(entity, binding, &focus, &parent_query, &interaction_query);
        cq!(ctx.last_reading() != reading);
        ctx.observe(now, reading);
    }
}

fn hide_tooltip(
    mut commands: Commands,
    mut transitions: MessageReader<TooltipTransition>,
    binding_query: Query<&TooltipBinding>,
    mut visibility_query: Query<&mut Visibility>,
) {
    for transition in transitions.read() {
        cq!(transition.kind == TransitionKind::Hidden);
        let binding = c!(binding_query.get(transition.widget));
        *c!(visibility_query.get_mut(binding.panel)) = Visibility::Hidden;
        commands.entity(transition.widget).remove::<TooltipShown>();
    }
}

fn show_tooltip(
    mut commands: Commands,
    mut transitions: MessageReader<TooltipTransition>,
    binding_query: Query<&TooltipBinding>,
    mut visibility_query: Query<&mut Visibility>,
) {
    for transition in transitions.read() {
        cq!(transition.kind == TransitionKind::Shown);
        let binding = c!(binding_query.get(transition.widget));
        *c!(visibility_query.get_mut(binding.panel)) = Visibility::Visible;
        commands.entity(transition.widget).insert(TooltipShown);
    }
}
