use super::SceneManager;
use crate::settings::{ColorScheme, Settings};
use crate::surface::DrawingSurface;

/// What [`SceneManager::apply_settings`] did to the cube set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// The cube set was torn down and rebuilt.
    Rebuild,
    /// Existing cubes were recolored in place.
    Recolor,
    /// Nothing structural changed.
    None,
}

/// Decide how to move from the applied settings `current` to `next`.
///
/// A count or scheme change rebuilds. Otherwise cubes are recolored when the
/// single color changed under the `single` scheme, or whenever the scheme is
/// `random`, so any update under `random` re-rolls every color.
#[must_use]
pub fn reconcile(current: &Settings, next: &Settings) -> ReconcileAction {
    if current.cube_count != next.cube_count
        || current.color_scheme != next.color_scheme
    {
        return ReconcileAction::Rebuild;
    }
    match next.color_scheme {
        ColorScheme::Single if current.single_color != next.single_color => {
            ReconcileAction::Recolor
        }
        ColorScheme::Random => ReconcileAction::Recolor,
        _ => ReconcileAction::None,
    }
}

impl<S: DrawingSurface> SceneManager<S> {
    /// Reconcile the scene with a new settings snapshot.
    ///
    /// The snapshot is sanitized and stored first, so a rotation speed
    /// change is picked up by the next frame regardless of the returned
    /// action. Ignored once disposed.
    pub fn apply_settings(&mut self, settings: Settings) -> ReconcileAction {
        if self.disposed {
            return ReconcileAction::None;
        }
        let next = settings.sanitized();
        let action = reconcile(&self.settings, &next);
        self.settings = next;

        match action {
            ReconcileAction::Rebuild => self.rebuild(),
            ReconcileAction::Recolor => self.recolor(),
            ReconcileAction::None => {}
        }
        log::debug!("applied settings {next:?}: {action:?}");
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Color;
    use crate::test_support::{build, TestHost};

    fn with(
        cube_count: u32,
        color_scheme: ColorScheme,
        single_color: Color,
    ) -> Settings {
        Settings {
            cube_count,
            color_scheme,
            single_color,
            ..Settings::default()
        }
    }

    #[test]
    fn reconcile_decisions() {
        let red = Color::from_hex(0xff0000);
        let blue = Color::from_hex(0x0000ff);
        let base = with(8, ColorScheme::Single, red);

        assert_eq!(
            reconcile(&base, &with(9, ColorScheme::Single, red)),
            ReconcileAction::Rebuild
        );
        assert_eq!(
            reconcile(&base, &with(8, ColorScheme::Rainbow, red)),
            ReconcileAction::Rebuild
        );
        assert_eq!(
            reconcile(&base, &with(8, ColorScheme::Single, blue)),
            ReconcileAction::Recolor
        );
        assert_eq!(reconcile(&base, &base), ReconcileAction::None);

        let rainbow = with(8, ColorScheme::Rainbow, red);
        assert_eq!(
            reconcile(&rainbow, &with(8, ColorScheme::Rainbow, blue)),
            ReconcileAction::None
        );

        let random = with(8, ColorScheme::Random, red);
        assert_eq!(reconcile(&random, &random), ReconcileAction::Recolor);
    }

    #[test]
    fn count_matches_settings_across_range() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        for count in 1..=200 {
            let _ = manager.apply_settings(Settings {
                cube_count: count,
                ..Settings::default()
            });
            assert_eq!(manager.cube_count(), count as usize);
            assert_eq!(host.log().live_materials.len(), count as usize);
        }
        assert_eq!(host.log().geometries_created, 1);
    }

    #[test]
    fn thirty_cubes_wrap_into_two_rows() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        let action = manager.apply_settings(Settings {
            cube_count: 30,
            ..Settings::default()
        });
        assert_eq!(action, ReconcileAction::Rebuild);

        let cubes = manager.scene().cubes();
        assert_eq!(cubes.len(), 30);
        assert_eq!(cubes[0].position.y, 1.25);
        assert_eq!(cubes[0].position.x, -24.0);
        assert_eq!(cubes[24].position.x, 24.0);
        assert_eq!(cubes[25].position.y, -1.25);
        assert_eq!(cubes[25].position.x, -4.0);
        assert_eq!(cubes[29].position.x, 4.0);
    }

    #[test]
    fn single_color_change_recolors_in_place() {
        let host = TestHost::new();
        let mut manager = build(
            &host,
            with(10, ColorScheme::Single, Color::from_hex(0xff6b6b)),
        );
        let positions: Vec<_> =
            manager.scene().cubes().iter().map(|n| n.position).collect();
        let handles: Vec<_> = manager
            .scene()
            .cubes()
            .iter()
            .map(|n| n.material.handle)
            .collect();
        let created = host.log().materials_created;

        let action = manager
            .apply_settings(with(10, ColorScheme::Single, "#00ff00".parse().unwrap()));

        assert_eq!(action, ReconcileAction::Recolor);
        assert_eq!(host.log().materials_created, created);
        assert_eq!(host.log().materials_disposed, 0);
        let cubes = manager.scene().cubes();
        assert!(cubes.iter().all(|n| n.material.color.hex() == 0x00ff00));
        assert_eq!(
            cubes.iter().map(|n| n.position).collect::<Vec<_>>(),
            positions
        );
        assert_eq!(
            cubes.iter().map(|n| n.material.handle).collect::<Vec<_>>(),
            handles
        );
        let log = host.log();
        assert!(handles
            .iter()
            .all(|h| log.live_materials.get(h) == Some(&Color::from_hex(0x00ff00))));
    }

    #[test]
    fn scheme_change_rebuilds_without_leaking() {
        let host = TestHost::new();
        let mut manager =
            build(&host, with(8, ColorScheme::Single, Color::WHITE));
        let old: Vec<_> = manager
            .scene()
            .cubes()
            .iter()
            .map(|n| n.material.handle)
            .collect();

        let action =
            manager.apply_settings(with(8, ColorScheme::Rainbow, Color::WHITE));
        assert_eq!(action, ReconcileAction::Rebuild);
        let log = host.log();
        assert!(old.iter().all(|h| !log.live_materials.contains_key(h)));
        assert_eq!(log.live_materials.len(), 8);
        drop(log);

        for i in 0..8 {
            assert_eq!(
                manager.scene().cubes()[i].material.color,
                crate::scene::palette::rainbow(i)
            );
        }
    }

    #[test]
    fn repeated_rebuilds_keep_materials_bounded() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        for round in 0..50 {
            let scheme = if round % 2 == 0 {
                ColorScheme::Rainbow
            } else {
                ColorScheme::Single
            };
            let _ = manager.apply_settings(with(17, scheme, Color::WHITE));
        }
        let log = host.log();
        assert_eq!(log.live_materials.len(), 17);
        assert_eq!(
            log.materials_created - log.materials_disposed,
            17
        );
    }

    #[test]
    fn rainbow_cycles_palette() {
        let host = TestHost::new();
        let manager = build(&host, with(15, ColorScheme::Rainbow, Color::WHITE));
        let colors = manager.cube_colors();
        for (i, color) in colors.iter().enumerate() {
            assert_eq!(*color, colors[i % 7]);
        }
        assert_eq!(colors[0].hex(), 0xff0000);
    }

    #[test]
    fn speed_only_update_rerolls_random_colors() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        let before = manager.cube_colors();

        let action = manager.apply_settings(Settings {
            rotation_speed: 2.0,
            ..Settings::default()
        });

        assert_eq!(action, ReconcileAction::Recolor);
        assert_eq!(manager.settings().rotation_speed, 2.0);
        assert_ne!(manager.cube_colors(), before);
        assert_eq!(host.log().materials_disposed, 0);
    }

    #[test]
    fn speed_only_update_keeps_rainbow_colors() {
        let host = TestHost::new();
        let mut manager =
            build(&host, with(8, ColorScheme::Rainbow, Color::WHITE));
        let before = manager.cube_colors();
        let action = manager.apply_settings(Settings {
            color_scheme: ColorScheme::Rainbow,
            rotation_speed: 3.0,
            ..Settings::default()
        });
        assert_eq!(action, ReconcileAction::None);
        assert_eq!(manager.cube_colors(), before);
        assert_eq!(host.log().material_updates, 0);
    }

    #[test]
    fn negative_speed_is_sanitized() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        let _ = manager.apply_settings(Settings {
            rotation_speed: -4.0,
            ..Settings::default()
        });
        assert_eq!(manager.settings().rotation_speed, 0.0);
    }

    #[test]
    fn rebuild_reframes_camera() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        let near = manager.camera().eye.length();
        let _ = manager.apply_settings(Settings {
            cube_count: 60,
            ..Settings::default()
        });
        assert!(manager.camera().eye.length() > near);
        assert_eq!(manager.camera().target, glam::Vec3::ZERO);
    }
}
