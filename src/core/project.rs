//! Initializer projection
//!
//! Takes a full-struct brace initializer, binds its scalar values to the
//! flattened field names of the full struct, and re-renders the values in the
//! shape of the target view struct. Scalar lexemes pass through verbatim.

use crate::core::flatten::{build_view_tree, check_embedding_cycles, Flattener};
use crate::core::tokenizer::{tokenize, Token};
use crate::error::{CastError, CastResult};
use crate::mapping::Mapping;
use crate::types::{ArraySize, Declaration, StructRegistry, ViewTree};
use std::collections::HashMap;
use tracing::warn;

/// A parsed initializer: nested blocks of raw scalar lexemes
#[derive(Debug, Clone, PartialEq)]
pub enum InitValue {
    Scalar(String),
    Block(Vec<InitValue>),
}

impl InitValue {
    /// Depth-first scalar sequence, the order initializer values bind in C
    pub fn flatten(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut Vec<String>) {
        match self {
            InitValue::Scalar(v) => out.push(v.clone()),
            InitValue::Block(items) => {
                for item in items {
                    item.collect(out);
                }
            }
        }
    }
}

/// Parse a brace initializer block into an [`InitValue`] tree.
pub fn parse_initializer(text: &str) -> CastResult<InitValue> {
    let tokens = tokenize(text).map_err(|e| CastError::Parse(e.to_string()))?;
    let mut pos = 0;

    if tokens.first() != Some(&Token::OpenBrace) {
        return Err(CastError::Parse(
            "Initializer must start with '{'".to_string(),
        ));
    }

    let value = parse_block(&tokens, &mut pos)?;
    Ok(value)
}

fn parse_block(tokens: &[Token], pos: &mut usize) -> CastResult<InitValue> {
    debug_assert_eq!(tokens.get(*pos), Some(&Token::OpenBrace));
    *pos += 1;

    let mut items = Vec::new();
    loop {
        match tokens.get(*pos) {
            None => {
                return Err(CastError::Parse(
                    "Unterminated initializer block".to_string(),
                ));
            }
            Some(Token::CloseBrace) => {
                *pos += 1;
                return Ok(InitValue::Block(items));
            }
            Some(Token::OpenBrace) => {
                items.push(parse_block(tokens, pos)?);
            }
            Some(Token::Number(v)) | Some(Token::Identifier(v)) => {
                items.push(InitValue::Scalar(v.clone()));
                *pos += 1;
            }
            Some(Token::Text(v)) => {
                // Re-quote so the value survives into the generated header
                items.push(InitValue::Scalar(format!("\"{v}\"")));
                *pos += 1;
            }
            // Commas and anything else carry no value
            Some(_) => {
                *pos += 1;
            }
        }
    }
}

/// Value bound to a flattened field name
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(String),
    /// Collected elements of a leaf array, in index order
    Array(Vec<String>),
}

pub type FieldMap = HashMap<String, FieldValue>;

/// Bind flattened values to flattened names positionally. Names ending in
/// `_<index>` are collected into an array under their base name.
pub fn build_field_map(names: &[String], values: &[String]) -> FieldMap {
    let mut map = FieldMap::new();
    let mut arrays: Vec<(String, Vec<String>)> = Vec::new();

    for (name, value) in names.iter().zip(values.iter()) {
        match split_array_element(name) {
            Some((base, _)) => match arrays.iter_mut().find(|(b, _)| b == base) {
                Some((_, items)) => items.push(value.clone()),
                None => arrays.push((base.to_string(), vec![value.clone()])),
            },
            None => {
                map.insert(name.clone(), FieldValue::Scalar(value.clone()));
            }
        }
    }

    for (base, items) in arrays {
        map.insert(base, FieldValue::Array(items));
    }

    map
}

/// Split `capacity_1` into `("capacity", 1)`; None when the name has no
/// trailing `_<digits>` element index.
fn split_array_element(name: &str) -> Option<(&str, usize)> {
    let underscore = name.rfind('_')?;
    let (base, suffix) = (&name[..underscore], &name[underscore + 1..]);
    if base.is_empty() || suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((base, suffix.parse().ok()?))
}

/// Render a field map in the shape of a view tree.
pub fn render(tree: &ViewTree, map: &FieldMap) -> String {
    render_at(tree, map, "")
}

fn render_at(tree: &ViewTree, map: &FieldMap, prefix: &str) -> String {
    match tree {
        ViewTree::Leaf(_) => match map.get(prefix) {
            Some(FieldValue::Scalar(v)) => v.clone(),
            Some(FieldValue::Array(items)) => format!("{{{}}}", items.join(", ")),
            None => "0".to_string(),
        },
        ViewTree::Array { len, elem } => {
            // Leaf arrays were collected under the base name; otherwise the
            // elements are structs and each projects independently
            let elems: Vec<String> = if let Some(FieldValue::Array(items)) = map.get(prefix) {
                (0..*len)
                    .map(|i| items.get(i).cloned().unwrap_or_else(|| "0".to_string()))
                    .collect()
            } else {
                (0..*len)
                    .map(|i| render_at(elem, map, &format!("{prefix}_{i}")))
                    .collect()
            };
            format!("{{{}}}", elems.join(", "))
        }
        ViewTree::Node(fields) => {
            let parts: Vec<String> = fields
                .iter()
                .map(|(name, sub)| {
                    let key = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}_{name}")
                    };
                    // A direct scalar hit wins even where the view expects a
                    // composite; the map's keys are authoritative
                    if let (false, Some(FieldValue::Scalar(v))) =
                        (matches!(sub, ViewTree::Leaf(_)), map.get(&key))
                    {
                        v.clone()
                    } else {
                        render_at(sub, map, &key)
                    }
                })
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

/// Projects full-struct initializers onto a view layout.
pub struct Projector {
    target_struct: String,
    flat_fields: Vec<String>,
    view_tree: ViewTree,
}

impl Projector {
    /// Build a projector for one (full struct, view struct) pair. Rejects
    /// cyclic struct embeddings and unknown target names up front.
    pub fn new(
        full: &StructRegistry,
        views: &StructRegistry,
        target_struct: &str,
        target_view: &str,
        mapping: &Mapping,
    ) -> CastResult<Self> {
        check_embedding_cycles(full)?;
        check_embedding_cycles(views)?;

        if !views.contains(target_view) {
            return Err(CastError::Validation(format!(
                "View struct '{target_view}' not found in view header"
            )));
        }

        let flat_fields = Flattener::new(full, mapping).flatten(target_struct)?;
        let view_tree = build_view_tree(views, target_view);

        Ok(Self {
            target_struct: target_struct.to_string(),
            flat_fields,
            view_tree,
        })
    }

    /// Flattened field names of the full struct, in binding order
    pub fn flat_fields(&self) -> &[String] {
        &self.flat_fields
    }

    /// Project one struct-value initializer onto the view layout.
    pub fn project_value(&self, init: &InitValue) -> CastResult<String> {
        let values = init.flatten();
        let expected = self.flat_fields.len();

        if values.len() < expected {
            return Err(CastError::Project(format!(
                "Initializer supplies {} values but struct '{}' flattens to {} fields",
                values.len(),
                self.target_struct,
                expected
            )));
        }
        if values.len() > expected {
            warn!(
                supplied = values.len(),
                expected,
                "initializer supplies more values than the struct has fields; extras ignored"
            );
        }

        let map = build_field_map(&self.flat_fields, &values);
        Ok(render(&self.view_tree, &map))
    }

    /// Project a whole declaration; array declarations project per element.
    pub fn project_declaration(&self, decl: &Declaration) -> CastResult<String> {
        let parsed = parse_initializer(&decl.init)?;

        if decl.size == ArraySize::Single {
            return self.project_value(&parsed);
        }

        let InitValue::Block(elements) = &parsed else {
            return Err(CastError::Parse(
                "Array initializer must be a brace block".to_string(),
            ));
        };

        let mut items = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            match element {
                InitValue::Block(_) => items.push(self.project_value(element)?),
                InitValue::Scalar(_) => {
                    return Err(CastError::Project(format!(
                        "Element {index} of array '{}' is not a brace block",
                        decl.var
                    )));
                }
            }
        }

        Ok(format!("{{\n{}\n}}", items.join(",\n")))
    }
}
