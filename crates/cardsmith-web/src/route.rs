//! Page routes: `/` lists canvases, `/canvas/<id>` opens one.

const CANVAS_PREFIX: &str = "/canvas/";

/// A page of the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Canvas(String),
}

impl Route {
    /// Parse a location pathname. Unknown paths go home.
    pub fn from_path(path: &str) -> Self {
        let Some(rest) = path.strip_prefix(CANVAS_PREFIX) else {
            return Route::Home;
        };

        // The id is the last segment, ignoring a trailing slash
        match rest.trim_end_matches('/').rsplit('/').next() {
            Some(id) if !id.is_empty() => Route::Canvas(id.to_string()),
            _ => Route::Home,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Canvas(id) => canvas_path(id),
        }
    }

    pub fn canvas_id(&self) -> Option<&str> {
        match self {
            Route::Home => None,
            Route::Canvas(id) => Some(id),
        }
    }
}

/// Path of the editor page for a canvas.
pub fn canvas_path(canvas_id: &str) -> String {
    format!("{CANVAS_PREFIX}{canvas_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home() {
        assert_eq!(Route::from_path("/"), Route::Home);
        assert_eq!(Route::from_path(""), Route::Home);
        assert_eq!(Route::from_path("/about"), Route::Home);
    }

    #[test]
    fn test_canvas() {
        let route = Route::from_path("/canvas/0b6f4c1e");
        assert_eq!(route, Route::Canvas("0b6f4c1e".to_string()));
        assert_eq!(route.canvas_id(), Some("0b6f4c1e"));
    }

    #[test]
    fn test_trailing_slash() {
        assert_eq!(Route::from_path("/canvas/abc/"), Route::Canvas("abc".to_string()));
    }

    #[test]
    fn test_missing_id() {
        assert_eq!(Route::from_path("/canvas/"), Route::Home);
    }

    #[test]
    fn test_path_round_trip() {
        let route = Route::Canvas("abc".to_string());
        assert_eq!(route.path(), "/canvas/abc");
        assert_eq!(Route::from_path(&route.path()), route);
        assert_eq!(Route::Home.path(), "/");
    }
}
