use std::fmt;

use crate::value::Value;

/// One step of a path from the document root: an array index or a map key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{}", i),
            PathSegment::Key(key) => write!(f, "{}", key),
        }
    }
}

/// One visit of a node: pre-order entry (`first`) or post-order exit
#[derive(Debug, Clone, PartialEq)]
pub struct WalkItem {
    pub path: Vec<PathSegment>,
    pub first: bool,
}

enum Event<'a> {
    Enter {
        value: &'a Value,
        path: Vec<PathSegment>,
    },
    Exit {
        path: Vec<PathSegment>,
    },
}

/// Depth-first walk over a document, yielding every node twice: once on
/// entry and once on exit (leaves emit the pair back to back). Array
/// children are visited in index order; map children in the map's
/// unspecified iteration order.
pub struct TreeWalker<'a> {
    pending: Vec<Event<'a>>,
}

impl<'a> TreeWalker<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            pending: vec![Event::Enter {
                value: root,
                path: Vec::new(),
            }],
        }
    }
}

impl<'a> Iterator for TreeWalker<'a> {
    type Item = WalkItem;

    fn next(&mut self) -> Option<WalkItem> {
        match self.pending.pop()? {
            Event::Enter { value, path } => {
                // The exit event goes under the children so it surfaces
                // after the whole subtree has been walked.
                self.pending.push(Event::Exit { path: path.clone() });
                match value {
                    Value::Array(els) => {
                        for (i, el) in els.iter().enumerate().rev() {
                            let mut child = path.clone();
                            child.push(PathSegment::Index(i));
                            self.pending.push(Event::Enter {
                                value: el,
                                path: child,
                            });
                        }
                    }
                    Value::Map(entries) => {
                        for (key, el) in entries.iter() {
                            let mut child = path.clone();
                            child.push(PathSegment::Key(key.clone()));
                            self.pending.push(Event::Enter {
                                value: el,
                                path: child,
                            });
                        }
                    }
                    _ => {}
                }
                Some(WalkItem { path, first: true })
            }
            Event::Exit { path } => Some(WalkItem { path, first: false }),
        }
    }
}

/// The `path` variable a visit exposes: keys as strings, indices as numbers
pub fn path_to_value(path: &[PathSegment]) -> Value {
    Value::Array(
        path.iter()
            .map(|segment| match segment {
                PathSegment::Index(i) => Value::Number(*i as f64),
                PathSegment::Key(key) => Value::String(key.clone()),
            })
            .collect(),
    )
}
