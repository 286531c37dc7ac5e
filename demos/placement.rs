//! A demonstration of tooltip placement falling back when a side does not fit.

use bevy::input_focus::tab_navigation::{TabGroup, TabNavigationPlugin};
use bevy::prelude::*;
use bevy::ui::Val::*;
use pyri_live_tooltip::prelude::*;

fn main() -> AppExit {
    App::new()
        .add_plugins((DefaultPlugins, TabNavigationPlugin, TooltipPlugin::default()))
        .add_systems(Startup, spawn_scene)
        .run()
}

fn spawn_scene(mut commands: Commands) {
    commands.spawn(Camera2d);
    commands.spawn((
        Node {
            width: Percent(100.0),
            height: Percent(100.0),
            justify_content: JustifyContent::SpaceBetween,
            align_items: AlignItems::Center,
            padding: UiRect::all(Px(8.0)),
            ..default()
        },
        TabGroup::new(0),
        children![
            // Too close to the left edge, so this falls back to the bottom.
            widget("Left edge", TooltipPlacement::Left),
            widget("Center", TooltipPlacement::Top),
            // Too close to the right edge, so this falls back to the bottom.
            widget("Right edge", TooltipPlacement::Right),
        ],
    ));
}

fn widget(label: &str, placement: TooltipPlacement) -> impl Bundle {
    (
        Node::default(),
        Tooltip::DEFAULT.with_placement(placement),
        children![
            (
                Node {
                    padding: UiRect::all(Px(8.0)),
                    ..default()
                },
                Text::new(label),
                TooltipTrigger,
            ),
            (
                Node {
                    width: Px(240.0),
                    ..default()
                },
                TooltipPanel,
                children![Text::new(format!("Preferred placement: {placement}"))],
            ),
        ],
    )
}
