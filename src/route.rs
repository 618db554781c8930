//! Route classification for the navigation guard.
//!
//! Paths are matched literally, with or without one trailing slash. Anything
//! that is not one of the special pages is `Route::Other`.

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const MAINTENANCE: &str = "/maintaince";
pub const LEADERBOARD: &str = "/leaderboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Maintenance,
    /// Public ranking page.
    Leaderboard,
    Other,
}

impl Route {
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let path = path.strip_suffix('/').filter(|p| !p.is_empty()).unwrap_or(path);
        match path {
            LOGIN => Self::Login,
            MAINTENANCE => Self::Maintenance,
            LEADERBOARD => Self::Leaderboard,
            _ => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_paths_with_and_without_slash() {
        assert_eq!(Route::from_path("/login"), Route::Login);
        assert_eq!(Route::from_path("/login/"), Route::Login);
        assert_eq!(Route::from_path("/maintaince"), Route::Maintenance);
        assert_eq!(Route::from_path("/maintaince/"), Route::Maintenance);
        assert_eq!(Route::from_path("/leaderboard"), Route::Leaderboard);
        assert_eq!(Route::from_path("/leaderboard/"), Route::Leaderboard);
    }

    #[test]
    fn matching_is_literal() {
        for path in ["/", "", "/login//", "/Login", "/login/callback", "/maintenance", "/leaderboard?x=1"] {
            assert_eq!(Route::from_path(path), Route::Other, "{path}");
        }
    }
}
