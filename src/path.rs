// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Nested property access over [`Value`] trees.
//!
//! A property string such as `xaxis.range[0]` or `steps[3].label` is parsed
//! once into a [`PropPath`] (an ordered list of key and index segments) and
//! can then be used to read or write any tree without knowing its shape.

use crate::value::{Map, Value};

use core::fmt;
use std::rc::Rc;


/// Errors raised while parsing a property string or writing through it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("invalid property string `{path}`: {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("cannot set `{path}`: `{at}` is not an object or array")]
    NotAContainer { path: String, at: String },
    #[error("cannot set `{path}`: array index used but `{at}` is not an array")]
    NotAnArray { path: String, at: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(untagged)]
pub enum Segment {
    Key(Rc<str>),
    Index(usize),
}

impl Segment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => Some(*i),
            Segment::Key(_) => None,
        }
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Segment::Key(s.into())
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment::Index(i)
    }
}

/// A parsed property string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PropPath {
    segments: Vec<Segment>,
}

impl PropPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let invalid = |reason| PathError::InvalidPath {
            path: path.to_string(),
            reason,
        };

        if path.is_empty() {
            return Err(invalid("empty path"));
        }

        let mut segments = vec![];
        for (part_idx, part) in path.split('.').enumerate() {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };

            if key.contains(']') {
                return Err(invalid("unbalanced bracket"));
            }
            if key.starts_with("__") {
                return Err(invalid("keys may not start with `__`"));
            }
            if key.is_empty() {
                // Only the very first segment may start with an index.
                if rest.is_empty() || part_idx != 0 {
                    return Err(invalid("empty key"));
                }
            } else {
                segments.push(Segment::Key(key.into()));
            }

            while !rest.is_empty() {
                let Some(inner) = rest.strip_prefix('[') else {
                    return Err(invalid("unexpected characters after index"));
                };
                let Some(close) = inner.find(']') else {
                    return Err(invalid("unbalanced bracket"));
                };
                let digits = &inner[..close];
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid("array index must be a non-negative integer"));
                }
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| invalid("array index out of range"))?;
                segments.push(Segment::Index(index));
                rest = &inner[close + 1..];
            }
        }

        Ok(Self { segments })
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Path of the container holding the final segment.
    pub fn parent(&self) -> PropPath {
        let n = self.segments.len().saturating_sub(1);
        Self {
            segments: self.segments[..n].to_vec(),
        }
    }

    pub fn child(&self, segment: impl Into<Segment>) -> PropPath {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn join(&self, other: &PropPath) -> PropPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Reads the value at this path. Any missing intermediate, or a `null`
    /// at the final segment, reads as [`Value::Undefined`].
    pub fn get<'a>(&self, root: &'a Value) -> &'a Value {
        let mut cur = root;
        for segment in &self.segments {
            cur = match (cur, segment) {
                (Value::Object(map), Segment::Key(k)) => match map.get(k) {
                    Some(v) => v,
                    None => return &Value::Undefined,
                },
                (Value::Array(arr), Segment::Index(i)) => match arr.get(*i) {
                    Some(v) => v,
                    None => return &Value::Undefined,
                },
                _ => return &Value::Undefined,
            };
        }
        match cur {
            Value::Null => &Value::Undefined,
            v => v,
        }
    }

    /// Writes `value` at this path, creating intermediate objects and
    /// arrays as needed. Writing `Undefined` or `Null` deletes the final
    /// segment; intermediate containers are never pruned.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<(), PathError> {
        let delete = value.is_nullish();
        let Some((last, init)) = self.segments.split_last() else {
            *root = value;
            return Ok(());
        };

        let mut cur = root;
        for (idx, segment) in init.iter().enumerate() {
            let next_is_index = matches!(self.segments[idx + 1], Segment::Index(_));
            if cur.is_undefined() || cur.is_null() {
                if delete {
                    return Ok(());
                }
                *cur = new_container(matches!(segment, Segment::Index(_)));
            }
            cur = match (cur, segment) {
                (Value::Object(map), Segment::Key(k)) => {
                    let map = Rc::make_mut(map);
                    if !map.contains_key(k) || map.get(k).is_some_and(Value::is_nullish) {
                        if delete {
                            return Ok(());
                        }
                        map.insert(k.clone(), new_container(next_is_index));
                    }
                    match map.get_mut(k) {
                        Some(v) => v,
                        None => return Ok(()),
                    }
                }
                (Value::Array(arr), Segment::Index(i)) => {
                    let arr = Rc::make_mut(arr);
                    if arr.get(*i).is_none_or(Value::is_nullish) {
                        if delete {
                            return Ok(());
                        }
                        if arr.len() <= *i {
                            arr.resize(*i + 1, Value::Undefined);
                        }
                        arr[*i] = new_container(next_is_index);
                    }
                    &mut arr[*i]
                }
                (_, Segment::Index(_)) => return Err(self.not_an_array(idx)),
                (_, Segment::Key(_)) => return Err(self.not_a_container(idx)),
            };
        }

        if cur.is_undefined() || cur.is_null() {
            if delete {
                return Ok(());
            }
            *cur = new_container(matches!(last, Segment::Index(_)));
        }

        match (cur, last) {
            (Value::Object(map), Segment::Key(k)) => {
                let map = Rc::make_mut(map);
                if delete {
                    map.shift_remove(k);
                } else {
                    map.insert(k.clone(), value);
                }
            }
            (Value::Array(arr), Segment::Index(i)) => {
                let arr = Rc::make_mut(arr);
                if delete {
                    if *i < arr.len() {
                        arr[*i] = Value::Undefined;
                    }
                    while arr.last().is_some_and(Value::is_undefined) {
                        arr.pop();
                    }
                } else {
                    if arr.len() <= *i {
                        arr.resize(*i + 1, Value::Undefined);
                    }
                    arr[*i] = value;
                }
            }
            (_, Segment::Index(_)) => return Err(self.not_an_array(init.len())),
            (_, Segment::Key(_)) => return Err(self.not_a_container(init.len())),
        }

        Ok(())
    }

    fn prefix_string(&self, n: usize) -> String {
        PropPath::from_segments(self.segments[..n].to_vec()).to_string()
    }

    fn not_an_array(&self, n: usize) -> PathError {
        PathError::NotAnArray {
            path: self.to_string(),
            at: self.prefix_string(n),
        }
    }

    fn not_a_container(&self, n: usize) -> PathError {
        PathError::NotAContainer {
            path: self.to_string(),
            at: self.prefix_string(n),
        }
    }
}

fn new_container(is_array: bool) -> Value {
    if is_array {
        Value::new_array()
    } else {
        Value::from(Map::new())
    }
}

impl fmt::Display for PropPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(k) if idx == 0 => write!(f, "{k}")?,
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

impl core::str::FromStr for PropPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropPath::parse(s)
    }
}

/// A property string bound to the tree it reads and writes.
pub struct NestedProperty<'a> {
    root: &'a mut Value,
    path: PropPath,
}

impl<'a> NestedProperty<'a> {
    pub fn new(root: &'a mut Value, path: &str) -> Result<Self, PathError> {
        Ok(Self {
            root,
            path: PropPath::parse(path)?,
        })
    }

    pub fn get(&self) -> &Value {
        self.path.get(&*self.root)
    }

    pub fn set(&mut self, value: Value) -> Result<(), PathError> {
        self.path.set(&mut *self.root, value)
    }

    pub fn astr(&self) -> String {
        self.path.to_string()
    }

    pub fn parts(&self) -> &[Segment] {
        self.path.segments()
    }
}

/// Shorthand for [`NestedProperty::new`].
pub fn nested_property<'a>(root: &'a mut Value, path: &str) -> Result<NestedProperty<'a>, PathError> {
    NestedProperty::new(root, path)
}
