//! Path templates, HTTP methods, and the normalisation rules `App` relies on.
//!

/// The seven HTTP verbs the router distinguishes, plus the synthetic `Any`
/// used by `App::any()` to register all six canonical methods at once.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    /// Expands to `[Get, Post, Put, Delete, Patch, Head]` when registered;
    /// never appears as the method of a stored route.
    Any,
}

impl Method {
    /// The six canonical methods `Any` expands to when registering a route.
    ///
    pub const CANONICAL: [Method; 6] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
        Method::Head,
    ];

    /// `"GET"`, `"POST"`, etc. `Any` renders as `"ANY"` and is never valid on
    /// a stored route.
    ///
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Any => "ANY",
        }
    }
}

impl Default for Method {
    fn default() -> Self {
        Method::Get
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "PATCH" => Method::Patch,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            other => {
                return Err(crate::Error::parameter_invalid(format!(
                    "unknown http method: {other}"
                )))
            }
        })
    }
}

/// A `(url-template, method)` pair identifying one route.
///
/// URL templates use `:name` to mark a positional parameter; any `:...`
/// segment is matched by the trie as a single-segment wildcard.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Path {
    pub pattern: String,
    pub method: Method,
}

impl Path {
    pub fn new(pattern: impl Into<String>, method: Method) -> Self {
        Self { pattern: pattern.into(), method }
    }
}

/// `""` or `"/"` maps to `"/"`; otherwise strip a trailing `/` and ensure a
/// single leading `/`.
///
/// `slash(x) == slash(slash(x))` for every `x`.
///
pub fn slash(s: &str) -> String {
    if s.is_empty() || s == "/" {
        return "/".to_string();
    }
    let mut result = if s.starts_with('/') {
        s.to_string()
    } else {
        format!("/{s}")
    };
    if result.len() > 1 && result.ends_with('/') {
        result.pop();
    }
    result
}

/// Join a prefix and a suffix such that `join("/api", "/users") ==
/// "/api/users"` and `join("/", "/users") == "/users"`.
///
/// If either side is `"/"`, the other side is returned unchanged. Otherwise
/// the two strings are concatenated. `join(slash(p), slash(q))` never
/// contains `"//"` because both sides are already slash-normalised by the
/// callers in this crate (`App`/`RouterGroup`).
///
pub fn join(prefix: &str, suffix: &str) -> String {
    if prefix == "/" {
        return suffix.to_string();
    }
    if suffix == "/" {
        return prefix.to_string();
    }
    format!("{prefix}{suffix}")
}

/// Split a path on `/`, skipping an initial empty segment produced by a
/// leading slash. Any segment containing `:` becomes the literal wildcard
/// `"*"`; no other transformation is applied.
///
pub fn string_to_arr(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|seg| if seg.contains(':') { "*".to_string() } else { seg.to_string() })
        .collect()
}

/// The `:name` segments of `pattern`, in left-to-right order, with the
/// leading `:` stripped -- the names [`Trie::find_path()`
/// ](../trie/struct.Trie.html#method.find_path)'s captured values line up
/// with.
///
pub fn param_names(pattern: &str) -> Vec<String> {
    pattern
        .split('/')
        .filter(|s| s.starts_with(':'))
        .map(|s| s[1..].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_is_idempotent() {
        for s in ["", "/", "foo", "/foo", "/foo/", "foo/bar", "/foo/bar/"] {
            assert_eq!(slash(s), slash(&slash(s)), "input {s:?}");
        }
    }

    #[test]
    fn slash_normalises() {
        assert_eq!(slash(""), "/");
        assert_eq!(slash("/"), "/");
        assert_eq!(slash("foo"), "/foo");
        assert_eq!(slash("/foo/"), "/foo");
        assert_eq!(slash("/foo"), "/foo");
    }

    #[test]
    fn join_handles_root() {
        assert_eq!(join("/api", "/users"), "/api/users");
        assert_eq!(join("/", "/users"), "/users");
        assert_eq!(join("/api", "/"), "/api");
        assert_eq!(join("/", "/"), "/");
    }

    #[test]
    fn join_of_normalised_never_double_slashes() {
        for p in ["", "/", "/api", "api/"] {
            for q in ["", "/", "/users", "users/"] {
                let joined = join(&slash(p), &slash(q));
                assert!(!joined.contains("//"), "{p:?} + {q:?} -> {joined:?}");
            }
        }
    }

    #[test]
    fn string_to_arr_marks_wildcards() {
        assert_eq!(
            string_to_arr("/admin/info/:prefix/detail"),
            vec!["admin", "info", "*", "detail"],
        );
        assert_eq!(string_to_arr("/"), Vec::<String>::new());
    }

    #[test]
    fn param_names_strips_colons_in_order() {
        assert_eq!(
            param_names("/field/:table/:field/choose"),
            vec!["table".to_string(), "field".to_string()],
        );
        assert_eq!(param_names("/admin/dashboard"), Vec::<String>::new());
    }
}
