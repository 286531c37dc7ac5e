//! A demonstration of show and hide delays, configured from string attributes.

use bevy::input_focus::tab_navigation::{TabGroup, TabNavigationPlugin};
use bevy::prelude::*;
use bevy::ui::Val::*;
use pyri_live_tooltip::{TooltipRegistry, prelude::*};

fn main() -> AppExit {
    App::new()
        .add_plugins((DefaultPlugins, TabNavigationPlugin, TooltipPlugin::default()))
        .add_systems(Startup, spawn_scene)
        .add_systems(Update, log_transitions)
        .run()
}

fn spawn_scene(mut commands: Commands) {
    commands.spawn(Camera2d);
    commands.spawn((
        Node {
            display: Display::Grid,
            align_self: AlignSelf::Center,
            justify_self: JustifySelf::Center,
            row_gap: Px(48.0),
            ..default()
        },
        TabGroup::new(0),
        children![
            widget("Immediate", Tooltip::from_attributes(None, Some("0"), Some("0"))),
            widget("Default delays", Tooltip::default()),
            widget(
                "Slow to show",
                Tooltip::from_attributes(Some("RIGHT"), Some("750"), Some("1500")),
            ),
        ],
    ));
}

fn widget(label: &str, tooltip: Tooltip) -> impl Bundle {
    let description = format!(
        "Shows after {}ms, hides after {}ms",
        tooltip.show_delay, tooltip.hide_delay,
    );
    (
        Node::default(),
        tooltip,
        children![
            (
                Node {
                    padding: UiRect::all(Px(8.0)),
                    ..default()
                },
                Text::new(label),
                TooltipTrigger,
            ),
            (Node::default(), TooltipPanel, children![Text::new(description)]),
        ],
    )
}

fn log_transitions(
    registry: Res<TooltipRegistry>,
    mut transitions: MessageReader<TooltipTransition>,
) {
    for transition in transitions.read() {
        let Some(id) = registry.id_of(transition.widget) else {
            continue;
        };
        info!("{id}: {}", transition.kind.announcement());
    }
}
