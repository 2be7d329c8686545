//! The routing trie: one node per path segment, with a single wildcard child
//! absorbing any segment a literal child does not claim.
//!
use crate::path::{string_to_arr, Method};

const WILDCARD: &str = "*";

/// A match returned by [`Trie::find_path()`](struct.Trie.html#method.find_path):
/// the route's registered id together with the wildcard segments captured
/// along the way, in left-to-right order.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Matched<'t> {
    pub id: &'t str,
    pub params: Vec<String>,
}

#[derive(Default)]
struct Node {
    // children in registration order -- a plain Vec, not a map, since the
    // conflict rule below depends on "which child was created first".
    children: Vec<(String, Node)>,
    // one entry per (method, route) registered at this node, in
    // registration order; duplicates for the same method are kept rather
    // than overwritten (see add_path's doc comment).
    routes: Vec<(Method, String)>,
}

/// A trie mapping `(method, path)` to a route id, with `:name` segments of
/// the original templates matched by a single wildcard slot.
///
/// Conflict rule: inserting a segment at a position that already has a
/// wildcard child there reuses that wildcard child instead of creating a
/// sibling, regardless of whether the new segment is itself a literal or
/// another wildcard -- the wildcard node created first absorbs every later
/// registration at that position. A literal child created before any
/// wildcard exists at that position stays distinct (siblings, not aliased).
/// Because [`add_path()`](#method.add_path) never overwrites an existing
/// `(method, route)` pair -- it appends -- two registrations that alias into
/// the same node both leave their route id at that node, and
/// [`find_path()`](#method.find_path) returns the *first* one registered for
/// a given method (a linear scan that stops at the first match). This
/// matches the documented (if perhaps unintended) behaviour: inserting
/// `/u/:id` then `/u/me` makes both resolve to the `/u/:id` handler.
/// [`try_add_path()`](#method.try_add_path) instead refuses such a conflict
/// outright rather than silently aliasing.
///
#[derive(Default)]
pub struct Trie {
    root: Node,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` at `pattern` for `method`. `Method::Any` expands to all
    /// [`Method::CANONICAL`](enum.Method.html#associatedconstant.CANONICAL)
    /// methods. See the conflict rule on [`Trie`](struct.Trie.html) for what
    /// happens when a registration lands on a node/method that already has
    /// one.
    ///
    pub fn add_path(&mut self, pattern: &str, method: Method, id: impl Into<String>) {
        let id = id.into();
        for m in Self::methods(method) {
            let node = Self::descend(&mut self.root, pattern);
            node.routes.push((m, id.clone()));
        }
    }

    /// Like [`add_path()`](#method.add_path), but returns an error instead of
    /// letting a new registration alias into an existing node for the same
    /// method.
    ///
    pub fn try_add_path(
        &mut self,
        pattern: &str,
        method: Method,
        id: impl Into<String>,
    ) -> Result<(), crate::Error> {
        let id = id.into();
        for m in Self::methods(method) {
            let node = Self::descend(&mut self.root, pattern);
            if node.routes.iter().any(|(existing, _)| *existing == m) {
                return Err(crate::Error::parameter_invalid(format!(
                    "path conflict: {} {} is already registered",
                    m, pattern,
                )));
            }
        }
        for m in Self::methods(method) {
            let node = Self::descend(&mut self.root, pattern);
            node.routes.push((m, id.clone()));
        }
        Ok(())
    }

    /// Find the route id registered for `method` at `path`, capturing the
    /// segments absorbed by wildcard slots along the way. A literal child is
    /// preferred over a wildcard sibling at every node; among several routes
    /// registered for the same method at the node the path resolves to, the
    /// first one registered wins.
    ///
    pub fn find_path(&self, path: &str, method: Method) -> Option<Matched<'_>> {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        let mut params = Vec::new();
        let node = Self::find_node(&self.root, &segments, &mut params)?;
        node.routes
            .iter()
            .find(|(m, _)| *m == method)
            .map(|(_, id)| Matched { id, params: params.clone() })
    }

    fn find_node<'n>(
        node: &'n Node,
        segments: &[&str],
        params: &mut Vec<String>,
    ) -> Option<&'n Node> {
        match segments.split_first() {
            None => Some(node),
            Some((head, tail)) => {
                if let Some((_, child)) = node.children.iter().find(|(key, _)| key == head) {
                    if let Some(found) = Self::find_node(child, tail, params) {
                        return Some(found);
                    }
                }
                if let Some((_, child)) =
                    node.children.iter().find(|(key, _)| key == WILDCARD)
                {
                    params.push(head.to_string());
                    if let Some(found) = Self::find_node(child, tail, params) {
                        return Some(found);
                    }
                    params.pop();
                }
                None
            }
        }
    }

    /// Descend from `root` along `pattern`'s segments, creating nodes as
    /// needed. A segment matches an existing child if the child's value
    /// equals the segment literally, OR if the child's value is already the
    /// wildcard `"*"` -- so a wildcard child, once created, absorbs every
    /// later segment at that position instead of a new sibling being
    /// created for it.
    ///
    fn descend<'t>(root: &'t mut Node, pattern: &str) -> &'t mut Node {
        let mut node = root;
        for segment in string_to_arr(pattern) {
            let idx = node
                .children
                .iter()
                .position(|(key, _)| *key == segment || key == WILDCARD);
            node = match idx {
                Some(i) => &mut node.children[i].1,
                None => {
                    node.children.push((segment, Node::default()));
                    let last = node.children.len() - 1;
                    &mut node.children[last].1
                }
            };
        }
        node
    }

    fn methods(method: Method) -> Vec<Method> {
        if matches!(method, Method::Any) {
            Method::CANONICAL.to_vec()
        } else {
            vec![method]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_registered_before_wildcard_stays_distinct() {
        let mut trie = Trie::new();
        trie.add_path("/admin/info/users", Method::Get, "specific");
        trie.add_path("/admin/info/:table", Method::Get, "generic");

        let m = trie.find_path("/admin/info/users", Method::Get).unwrap();
        assert_eq!(m.id, "specific");
        assert!(m.params.is_empty());

        let m = trie.find_path("/admin/info/orders", Method::Get).unwrap();
        assert_eq!(m.id, "generic");
        assert_eq!(m.params, vec!["orders".to_string()]);
    }

    #[test]
    fn wildcard_absorbs_later_literal_at_same_position() {
        let mut trie = Trie::new();
        trie.add_path("/u/:id", Method::Get, "first");
        trie.add_path("/u/me", Method::Get, "second");

        let m = trie.find_path("/u/anything", Method::Get).unwrap();
        assert_eq!(m.id, "first");
        assert_eq!(m.params, vec!["anything".to_string()]);

        // "me" aliased into the wildcard node created for ":id"; the first
        // registration at that node wins, not the later literal.
        let m = trie.find_path("/u/me", Method::Get).unwrap();
        assert_eq!(m.id, "first");
        assert_eq!(m.params, vec!["me".to_string()]);

        assert!(trie.find_path("/u", Method::Get).is_none());
    }

    #[test]
    fn captures_multiple_wildcards_in_order() {
        let mut trie = Trie::new();
        trie.add_path("/field/:table/:field/choose", Method::Get, "choose");
        let m = trie.find_path("/field/users/role/choose", Method::Get).unwrap();
        assert_eq!(m.id, "choose");
        assert_eq!(m.params, vec!["users".to_string(), "role".to_string()]);
    }

    #[test]
    fn any_expands_to_canonical_methods() {
        let mut trie = Trie::new();
        trie.add_path("/ping", Method::Any, "ping");
        for m in Method::CANONICAL {
            assert!(trie.find_path("/ping", m).is_some());
        }
        assert!(trie.find_path("/ping", Method::Options).is_none());
    }

    #[test]
    fn try_add_path_rejects_same_slot_conflict() {
        let mut trie = Trie::new();
        trie.try_add_path("/admin/info/:table", Method::Get, "a").unwrap();
        let err = trie.try_add_path("/admin/info/:other", Method::Get, "b");
        assert!(err.is_err());
    }

    #[test]
    fn add_path_lets_first_registration_win_on_wildcard_conflict() {
        let mut trie = Trie::new();
        trie.add_path("/admin/info/:table", Method::Get, "a");
        trie.add_path("/admin/info/:other", Method::Get, "b");
        let m = trie.find_path("/admin/info/anything", Method::Get).unwrap();
        assert_eq!(m.id, "a");
    }

    #[test]
    fn no_match_returns_none() {
        let trie = Trie::new();
        assert!(trie.find_path("/nope", Method::Get).is_none());
    }
}
