//! Route table for front ends
//!
//! Paths mirror the screens of the game. Theme names in custom-game paths
//! are percent-encoded, and decoded before they are used as a storage key.

use std::fmt;

use crate::settings::SettingsStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    LiteracyTest,
    DifficultySettings,
    /// Requires a completed pretest
    MainMenu,
    /// Main theme picker
    MainGame,
    Game { theme: String },
    /// Custom theme authoring
    AddScenario,
    /// Custom theme listing
    SecretMissions,
    CustomGame { theme_name: String },
    WrongAnswers,
    NotFound(String),
}

impl Route {
    /// Match a path; anything unknown or undecodable is `NotFound`
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').skip(1).collect();

        match segments.as_slice() {
            [] | [""] => Route::Home,
            ["literacy-test"] => Route::LiteracyTest,
            ["difficulty-settings"] => Route::DifficultySettings,
            ["main-menu"] => Route::MainMenu,
            ["main-game"] => Route::MainGame,
            ["add-scenario"] => Route::AddScenario,
            ["secret-mission"] => Route::SecretMissions,
            ["wrong-answers"] => Route::WrongAnswers,
            ["game", theme] if !theme.is_empty() => match urlencoding::decode(theme) {
                Ok(theme) => Route::Game { theme: theme.into_owned() },
                Err(_) => Route::NotFound(path.to_string()),
            },
            ["custom-game", name] if !name.is_empty() => match urlencoding::decode(name) {
                Ok(name) => Route::CustomGame { theme_name: name.into_owned() },
                Err(_) => Route::NotFound(path.to_string()),
            },
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".into(),
            Route::LiteracyTest => "/literacy-test".into(),
            Route::DifficultySettings => "/difficulty-settings".into(),
            Route::MainMenu => "/main-menu".into(),
            Route::MainGame => "/main-game".into(),
            Route::Game { theme } => format!("/game/{}", urlencoding::encode(theme)),
            Route::AddScenario => "/add-scenario".into(),
            Route::SecretMissions => "/secret-mission".into(),
            Route::CustomGame { theme_name } => {
                format!("/custom-game/{}", urlencoding::encode(theme_name))
            }
            Route::WrongAnswers => "/wrong-answers".into(),
            Route::NotFound(path) => path.clone(),
        }
    }

    /// Apply gating: the main menu sends players without a pretest to it
    pub fn resolve(self, settings: &SettingsStore) -> Self {
        match self {
            Route::MainMenu if !settings.test_completed() => Route::LiteracyTest,
            other => other,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Level;

    #[test]
    fn test_parse_named_routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/wrong-answers/"), Route::WrongAnswers);
        assert_eq!(Route::parse("/main-menu?from=test"), Route::MainMenu);
        assert_eq!(
            Route::parse("/game/school"),
            Route::Game { theme: "school".into() }
        );
        assert_eq!(
            Route::parse("/nowhere"),
            Route::NotFound("/nowhere".into())
        );
        assert!(matches!(Route::parse("/game/"), Route::NotFound(_)));
    }

    #[test]
    fn test_custom_theme_names_are_decoded() {
        let route = Route::CustomGame { theme_name: "숙제 미션".into() };
        let path = route.path();
        assert!(!path.contains(' '));
        assert_eq!(Route::parse(&path), route);
    }

    #[test]
    fn test_main_menu_gated_on_pretest() {
        let mut settings = SettingsStore::in_memory();
        assert_eq!(Route::MainMenu.resolve(&settings), Route::LiteracyTest);

        settings.record_level(Level::Beginner).unwrap();
        assert_eq!(Route::MainMenu.resolve(&settings), Route::MainMenu);
        assert_eq!(Route::WrongAnswers.resolve(&settings), Route::WrongAnswers);
    }
}
