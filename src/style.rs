use bevy_app::{App, PostUpdate};
use bevy_color::Color;
#[cfg(feature = "bevy_reflect")]
use bevy_ecs::reflect::ReflectResource;
use bevy_ecs::{
    change_detection::DetectChangesMut as _,
    component::Component,
    query::Has,
    resource::Resource,
    system::{Query, Res},
};
use bevy_input_focus::InputFocus;
use bevy_ui::{BackgroundColor, Outline, Val};
use tiny_bail::prelude::*;

use crate::{context::TooltipShown, setup::TooltipBinding};

pub(super) fn plugin(app: &mut App) {
    #[cfg(feature = "bevy_reflect")]
    app.register_type::<TooltipStyle>();
    app.add_systems(PostUpdate, style_triggers);
}

/// A [`Resource`] with the colors used to draw tooltip widgets.
#[derive(Resource, Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "bevy_reflect",
    derive(bevy_reflect::Reflect),
    reflect(Resource)
)]
pub struct TooltipStyle {
    /// The outline of triggers and the border of panels.
    pub border_color: Color,
    /// The outline of a trigger that has the input focus.
    pub focus_color: Color,
    /// The background of panels.
    pub background_color: Color,
    /// The text inside panels.
    pub text_color: Color,
    /// The background of a trigger while its panel is shown.
    pub selected_color: Color,
}

impl TooltipStyle {
    /// The default `TooltipStyle`.
    pub const DEFAULT: Self = Self {
        border_color: Color::BLACK,
        focus_color: Color::srgb(1.0, 0.0, 0.0),
        background_color: Color::WHITE,
        text_color: Color::BLACK,
        selected_color: Color::srgb_u8(0x90, 0xcb, 0xdb),
    };
}

impl Default for TooltipStyle {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The background a trigger had before it was bound.
#[derive(Component, Copy, Clone, Debug)]
pub(crate) struct TriggerHighlight {
    pub(crate) rest: Color,
}

fn style_triggers(
    style: Res<TooltipStyle>,
    focus: Res<InputFocus>,
    widget_query: Query<(&TooltipBinding, Has<TooltipShown>)>,
    mut trigger_query: Query<(&TriggerHighlight, &mut BackgroundColor, &mut Outline)>,
) {
    for (binding, shown) in &widget_query {
        let (highlight, mut background, mut outline) = c!(trigger_query.get_mut(binding.trigger));

        background.set_if_neq(BackgroundColor(if shown {
            style.selected_color
        } else {
            highlight.rest
        }));

        outline.set_if_neq(if focus.get() == Some(binding.trigger) {
            Outline::new(Val::Px(4.0), Val::Px(1.0), style.focus_color)
        } else {
            Outline::new(Val::Px(1.0), Val::Px(1.0), style.border_color)
        });
    }
}
