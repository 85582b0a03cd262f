//! Design-document query paths.
//!
//! Queries are addressed by slash-delimited paths: `ddoc/view` for views and
//! `ddoc/list/view` for list transforms.

use crate::error::{ProtocolError, ProtocolResult};

/// Builds the list-transform path for a view path by inserting `list_name`
/// as the second segment.
///
/// `list_path("app/sites", "bySite")` is `"app/bySite/sites"`.
pub fn list_path(query_path: &str, list_name: &str) -> String {
    let mut segments: Vec<&str> = query_path.split('/').collect();
    let at = segments.len().min(1);
    segments.insert(at, list_name);
    segments.join("/")
}

/// A parsed design-document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignPath {
    /// Design document name (without the `_design/` prefix).
    pub design: String,
    /// List function name, for list paths.
    pub list: Option<String>,
    /// View name.
    pub view: String,
}

impl DesignPath {
    /// Parses a `ddoc/view` path.
    pub fn parse_view(path: &str) -> ProtocolResult<Self> {
        match split_exact(path, 2) {
            Some(segments) => Ok(Self {
                design: segments[0].to_string(),
                list: None,
                view: segments[1].to_string(),
            }),
            None => Err(ProtocolError::InvalidPath {
                path: path.to_string(),
                expected: 2,
            }),
        }
    }

    /// Parses a `ddoc/list/view` path.
    pub fn parse_list(path: &str) -> ProtocolResult<Self> {
        match split_exact(path, 3) {
            Some(segments) => Ok(Self {
                design: segments[0].to_string(),
                list: Some(segments[1].to_string()),
                view: segments[2].to_string(),
            }),
            None => Err(ProtocolError::InvalidPath {
                path: path.to_string(),
                expected: 3,
            }),
        }
    }

    /// Returns the path segments below the database, unencoded.
    pub fn segments(&self) -> Vec<&str> {
        match &self.list {
            Some(list) => vec![
                "_design",
                self.design.as_str(),
                "_list",
                list.as_str(),
                self.view.as_str(),
            ],
            None => vec!["_design", self.design.as_str(), "_view", self.view.as_str()],
        }
    }
}

fn split_exact(path: &str, count: usize) -> Option<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() == count && segments.iter().all(|s| !s.is_empty()) {
        Some(segments)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn list_path_inserts_second_segment() {
        assert_eq!(list_path("app/sites", "bySite"), "app/bySite/sites");
    }

    #[test]
    fn list_path_single_segment() {
        assert_eq!(list_path("app", "bySite"), "app/bySite");
    }

    #[test]
    fn parse_view_path() {
        let path = DesignPath::parse_view("app/sites").unwrap();
        assert_eq!(path.design, "app");
        assert_eq!(path.view, "sites");
        assert_eq!(path.segments(), vec!["_design", "app", "_view", "sites"]);
    }

    #[test]
    fn parse_list_path() {
        let path = DesignPath::parse_list("app/bySite/sites").unwrap();
        assert_eq!(path.list.as_deref(), Some("bySite"));
        assert_eq!(
            path.segments(),
            vec!["_design", "app", "_list", "bySite", "sites"]
        );
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(DesignPath::parse_view("app").is_err());
        assert!(DesignPath::parse_view("app/").is_err());
        assert!(DesignPath::parse_view("a/b/c").is_err());
        assert!(DesignPath::parse_list("app/sites").is_err());
    }

    proptest! {
        #[test]
        fn list_path_round_trips_through_parse(
            design in "[a-z]{1,10}",
            view in "[a-z]{1,10}",
            list in "[a-zA-Z]{1,10}",
        ) {
            let query_path = format!("{design}/{view}");
            let path = DesignPath::parse_list(&list_path(&query_path, &list)).unwrap();
            prop_assert_eq!(path.design, design);
            prop_assert_eq!(path.list, Some(list));
            prop_assert_eq!(path.view, view);
        }
    }
}
