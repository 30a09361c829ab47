// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{Composite, Node, ValType};
use crate::path::PropPath;
use crate::value::Value;

use indexmap::IndexMap;
use std::rc::Rc;

type Visitor<'a> = dyn FnMut(&Node, &str, &Composite, usize, &PropPath) + 'a;

/// Visits every declaration below `attrs`, depth first, each node before
/// its children.
///
/// `visit` receives the node, its key, the composite that declares it and
/// the depth (0 for direct children of `attrs`). Reserved markers are not
/// visited. An array-linked container is visited once together with its
/// item template, regardless of how many items any data holds.
pub fn crawl<F>(attrs: &Composite, mut visit: F)
where
    F: FnMut(&Node, &str, &Composite, usize),
{
    walk(attrs, 0, &PropPath::default(), &mut |node, key, parent, level, _| {
        visit(node, key, parent, level)
    });
}

/// Same as [`crawl`], additionally passing the attribute path of each node
/// (`marker.line.width`; array-linked containers contribute no index).
pub fn crawl_with_path<F>(attrs: &Composite, mut visit: F)
where
    F: FnMut(&Node, &str, &Composite, usize, &PropPath),
{
    walk(attrs, 0, &PropPath::default(), &mut visit);
}

fn walk(attrs: &Composite, level: usize, prefix: &PropPath, visit: &mut Visitor<'_>) {
    for (key, node) in &attrs.children {
        let path = prefix.child(&**key);
        visit(node, key, attrs, level, &path);
        if let Node::Composite(c) = node {
            walk(c, level + 1, &path, visit);
        }
    }
}

/// Attribute strings of every `data_array` (or `arrayOk`) attribute that
/// holds an array in `container`, expanding array-linked containers per item
/// (`transforms[1].value`).
pub fn find_array_attributes(container: &Value, attrs: &Composite) -> Vec<String> {
    let mut found = vec![];
    let mut stack: Vec<(Rc<str>, bool)> = vec![];

    crawl(attrs, |node, key, _, level| {
        stack.truncate(level);
        let linked = node
            .as_composite()
            .is_some_and(|c| c.is_linked_to_array());
        stack.push((key.into(), linked));

        let Node::Attribute(attr) = node else {
            return;
        };
        if attr.array_ok || matches!(attr.val_type, ValType::DataArray) {
            expand(container, &stack, PropPath::default(), &mut found);
        }
    });

    found
}

fn expand(container: &Value, stack: &[(Rc<str>, bool)], prefix: PropPath, found: &mut Vec<String>) {
    let Some(((key, linked), rest)) = stack.split_first() else {
        return;
    };
    let item = &container[&**key];
    let path = prefix.child(&**key);

    if rest.is_empty() {
        if item.is_array() {
            found.push(path.to_string());
        }
    } else if *linked {
        if let Value::Array(elems) = item {
            for (j, elem) in elems.iter().enumerate() {
                if elem.is_object() {
                    expand(elem, rest, path.child(j), found);
                }
            }
        }
    } else if item.is_object() {
        expand(item, rest, path, found);
    }
}

/// Edit type of every leaf attribute keyed by attribute string. A leaf
/// without its own `editType` takes the one of its closest container.
pub fn edit_types(attrs: &Composite) -> IndexMap<String, Rc<str>> {
    let mut out = IndexMap::new();
    let mut inherited: Vec<Option<Rc<str>>> = vec![attrs.edit_type.clone()];

    crawl_with_path(attrs, |node, _, _, level, path| {
        inherited.truncate(level + 1);
        let effective = node
            .edit_type()
            .cloned()
            .or_else(|| inherited.last().cloned().flatten());
        match node {
            Node::Composite(_) => inherited.push(effective),
            Node::Attribute(_) => {
                if let Some(edit_type) = effective {
                    out.insert(path.to_string(), edit_type);
                }
            }
        }
    });

    out
}
