//! Struct flattening and view shapes
//!
//! A full struct is flattened into the ordered list of leaf-field names its
//! initializer values bind to: nested structs join with `_`, array elements
//! expand per index (`capacity` -> `capacity_0`, `capacity_1`). The view
//! header is turned into a [`ViewTree`] describing the target layout.

use crate::error::{CastError, CastResult};
use crate::mapping::Mapping;
use crate::types::{StructRegistry, ViewTree};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::HashMap;

/// Reject struct definitions that embed themselves, directly or transitively.
/// Flattening such a registry would never terminate.
pub fn check_embedding_cycles(registry: &StructRegistry) -> CastResult<()> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for name in registry.names() {
        let idx = graph.add_node(name.to_string());
        nodes.insert(name.to_string(), idx);
    }

    for def in &registry.structs {
        for field in &def.fields {
            if let (Some(&from), Some(&to)) = (nodes.get(&field.ty), nodes.get(&def.name)) {
                graph.add_edge(from, to, ());
            }
        }
    }

    toposort(&graph, None).map_err(|cycle| {
        let name = graph
            .node_weight(cycle.node_id())
            .cloned()
            .unwrap_or_default();
        CastError::CircularStruct(name)
    })?;

    Ok(())
}

/// Flattens a full struct into ordered leaf-field names, applying an explicit
/// mapping where one is given.
pub struct Flattener<'a> {
    registry: &'a StructRegistry,
    mapping: &'a Mapping,
}

impl<'a> Flattener<'a> {
    #[must_use]
    pub fn new(registry: &'a StructRegistry, mapping: &'a Mapping) -> Self {
        Self { registry, mapping }
    }

    /// Flatten `struct_name` into its leaf-field names, in binding order.
    pub fn flatten(&self, struct_name: &str) -> CastResult<Vec<String>> {
        if !self.registry.contains(struct_name) {
            return Err(CastError::Validation(format!(
                "Struct '{struct_name}' not found in header"
            )));
        }
        let mut out = Vec::new();
        self.walk(struct_name, "", "", &mut out);
        Ok(out)
    }

    fn walk(&self, struct_name: &str, source_prefix: &str, output_prefix: &str, out: &mut Vec<String>) {
        let Some(def) = self.registry.get(struct_name) else {
            return;
        };

        for field in &def.fields {
            let full_source = if source_prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{source_prefix}.{}", field.name)
            };

            // Mapping keys match the index-free dot path or the bare name;
            // a hit replaces the accumulated output prefix outright
            let norm = normalize_path(&full_source);
            let mapped = self
                .mapping
                .get(&norm)
                .or_else(|| self.mapping.get(&field.name));
            let out_prefix = match mapped {
                Some(m) => m.to_string(),
                None => {
                    if output_prefix.is_empty() {
                        field.name.clone()
                    } else {
                        format!("{output_prefix}_{}", field.name)
                    }
                }
            };

            let embedded = self.registry.contains(&field.ty);
            match (embedded, field.is_array()) {
                (true, false) => {
                    self.walk(&field.ty, &full_source, &out_prefix, out);
                }
                (true, true) => {
                    for idx in index_tuples(&field.dims) {
                        let src = format!("{full_source}{}", bracket_suffix(&idx));
                        let op = format!("{out_prefix}_{}", underscore_suffix(&idx));
                        self.walk(&field.ty, &src, &op, out);
                    }
                }
                (false, false) => {
                    out.push(out_prefix);
                }
                (false, true) => {
                    for idx in index_tuples(&field.dims) {
                        out.push(format!("{out_prefix}_{}", underscore_suffix(&idx)));
                    }
                }
            }
        }
    }
}

/// Strip array indices from a source path: `otherFull[1].mass` -> `otherFull.mass`
fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '[' {
            for d in chars.by_ref() {
                if d == ']' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Cartesian index tuples for the given dimensions, row-major
fn index_tuples(dims: &[usize]) -> Vec<Vec<usize>> {
    let mut tuples = vec![Vec::new()];
    for &dim in dims {
        let mut next = Vec::with_capacity(tuples.len() * dim);
        for tuple in &tuples {
            for i in 0..dim {
                let mut extended = tuple.clone();
                extended.push(i);
                next.push(extended);
            }
        }
        tuples = next;
    }
    tuples
}

fn bracket_suffix(idx: &[usize]) -> String {
    idx.iter().map(|i| format!("[{i}]")).collect()
}

fn underscore_suffix(idx: &[usize]) -> String {
    idx.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("_")
}

/// Build the [`ViewTree`] for the target view struct. Types not defined in the
/// view registry are scalar leaves.
pub fn build_view_tree(views: &StructRegistry, name: &str) -> ViewTree {
    let Some(def) = views.get(name) else {
        return ViewTree::Leaf(name.to_string());
    };

    let mut fields = Vec::new();
    for field in &def.fields {
        let mut shape = build_view_tree(views, &field.ty);
        for &len in field.dims.iter().rev() {
            shape = ViewTree::Array {
                len,
                elem: Box::new(shape),
            };
        }
        fields.push((field.name.clone(), shape));
    }
    ViewTree::Node(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_structs;
    use pretty_assertions::assert_eq;

    const FULL_HEADER: &str = r#"
typedef struct {
    int mass;
    int volume;
    float density;
    float capacity[2];
} paramFull;

typedef struct {
    int id;
    float totalmass;
    paramFull mainFull;
    paramFull subFull;
    paramFull otherFull[2];
} unit;
"#;

    fn registry() -> StructRegistry {
        parse_structs(FULL_HEADER).unwrap()
    }

    #[test]
    fn test_flatten_param_full() {
        let reg = registry();
        let mapping = Mapping::new();
        let flat = Flattener::new(&reg, &mapping).flatten("paramFull").unwrap();
        assert_eq!(
            flat,
            vec!["mass", "volume", "density", "capacity_0", "capacity_1"]
        );
    }

    #[test]
    fn test_flatten_unit_expands_nested_and_arrays() {
        let reg = registry();
        let mapping = Mapping::new();
        let flat = Flattener::new(&reg, &mapping).flatten("unit").unwrap();
        assert_eq!(flat.len(), 22);
        assert_eq!(flat[0], "id");
        assert_eq!(flat[1], "totalmass");
        assert_eq!(flat[2], "mainFull_mass");
        assert_eq!(flat[6], "mainFull_capacity_1");
        assert_eq!(flat[12], "otherFull_0_mass");
        assert_eq!(flat[21], "otherFull_1_capacity_1");
    }

    #[test]
    fn test_flatten_applies_mapping() {
        let reg = registry();
        let mut mapping = Mapping::new();
        mapping.insert("totalmass", "total");
        mapping.insert("mainFull.density", "mainFull_rho");

        let flat = Flattener::new(&reg, &mapping).flatten("unit").unwrap();
        assert_eq!(flat[1], "total");
        assert_eq!(flat[4], "mainFull_rho");
        // Unmapped fields keep their derived names
        assert_eq!(flat[2], "mainFull_mass");
    }

    #[test]
    fn test_flatten_mapping_ignores_array_indices() {
        let reg = parse_structs(
            "typedef struct { int raw; } cell;\ntypedef struct { cell grid[2]; } board;",
        )
        .unwrap();
        let mut mapping = Mapping::new();
        mapping.insert("grid.raw", "cells");

        let flat = Flattener::new(&reg, &mapping).flatten("board").unwrap();
        // Both elements match the normalized path
        assert_eq!(flat, vec!["cells", "cells"]);
    }

    #[test]
    fn test_flatten_unknown_struct_is_error() {
        let reg = registry();
        let mapping = Mapping::new();
        let result = Flattener::new(&reg, &mapping).flatten("ghost");
        assert!(result.is_err());
    }

    #[test]
    fn test_flatten_multidim_leaf_array() {
        let reg = parse_structs("typedef struct { float grid[2][2]; } mesh;").unwrap();
        let mapping = Mapping::new();
        let flat = Flattener::new(&reg, &mapping).flatten("mesh").unwrap();
        assert_eq!(flat, vec!["grid_0_0", "grid_0_1", "grid_1_0", "grid_1_1"]);
    }

    #[test]
    fn test_cycle_detection() {
        let reg = parse_structs(
            "typedef struct { int x; } a;\ntypedef struct { a left; } b;",
        )
        .unwrap();
        assert!(check_embedding_cycles(&reg).is_ok());

        let cyclic =
            parse_structs("typedef struct { ouroboros tail; int x; } ouroboros;").unwrap();
        let result = check_embedding_cycles(&cyclic);
        assert!(matches!(result, Err(CastError::CircularStruct(_))));
    }

    #[test]
    fn test_build_view_tree_shapes() {
        let views = parse_structs(
            r#"
typedef struct {
    int mass;
    float capacity[2];
} paramView;

typedef struct {
    int id;
    paramView mainFull;
    paramView otherFull[2];
} unitView;
"#,
        )
        .unwrap();

        let tree = build_view_tree(&views, "unitView");
        let ViewTree::Node(fields) = &tree else {
            panic!("expected node");
        };
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].0, "id");
        assert!(matches!(fields[0].1, ViewTree::Leaf(_)));
        assert!(matches!(fields[1].1, ViewTree::Node(_)));
        let ViewTree::Array { len, elem } = &fields[2].1 else {
            panic!("expected array");
        };
        assert_eq!(*len, 2);
        assert!(matches!(**elem, ViewTree::Node(_)));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("otherFull[1].mass"), "otherFull.mass");
        assert_eq!(normalize_path("grid[0][1]"), "grid");
        assert_eq!(normalize_path("plain.path"), "plain.path");
    }
}
