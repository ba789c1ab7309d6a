//! Header and init-file parsing
//!
//! Two entry points:
//! - [`parse_header`] / [`parse_structs`]: recursive-descent parse of
//!   `typedef struct { ... } name;` definitions into a [`StructRegistry`].
//!   Anything that is not a typedef struct (preprocessor lines, prototypes)
//!   is skipped token-wise.
//! - [`extract_declarations`]: regex extraction of full-struct initializer
//!   declarations (`static unit u[2] = {...};`) from an init file.

use crate::core::tokenizer::{tokenize, Token};
use crate::error::{CastError, CastResult};
use crate::types::{ArraySize, Declaration, Field, StructDef, StructRegistry};
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Parse all typedef struct definitions from a header file.
pub fn parse_header(path: &Path) -> CastResult<StructRegistry> {
    let content = std::fs::read_to_string(path)?;
    let registry = parse_structs(&content)?;
    debug!(
        header = %path.display(),
        structs = registry.len(),
        "parsed header"
    );
    Ok(registry)
}

/// Parse all typedef struct definitions from header text.
pub fn parse_structs(text: &str) -> CastResult<StructRegistry> {
    let tokens = tokenize(text).map_err(|e| CastError::Parse(e.to_string()))?;
    let mut registry = StructRegistry::new();
    let mut pos = 0;

    while pos < tokens.len() {
        if !matches!(&tokens[pos], Token::Identifier(w) if w == "typedef") {
            pos += 1;
            continue;
        }
        pos += 1;

        if !matches!(&tokens[pos..], [Token::Identifier(w), Token::OpenBrace, ..] if w == "struct")
        {
            continue;
        }
        pos += 2;

        let mut def = StructDef::new(String::new());
        while pos < tokens.len() && tokens[pos] != Token::CloseBrace {
            let field_start = pos;
            while pos < tokens.len()
                && tokens[pos] != Token::Semicolon
                && tokens[pos] != Token::CloseBrace
            {
                pos += 1;
            }
            let field_tokens = &tokens[field_start..pos];
            if pos < tokens.len() && tokens[pos] == Token::Semicolon {
                pos += 1;
            }
            if let Some(field) = parse_field(field_tokens)? {
                def.add_field(field);
            }
        }

        if pos < tokens.len() && tokens[pos] == Token::CloseBrace {
            pos += 1;
        }

        match tokens.get(pos) {
            Some(Token::Identifier(name)) => {
                def.name = name.clone();
                pos += 1;
                if tokens.get(pos) == Some(&Token::Semicolon) {
                    pos += 1;
                }
                registry.add(def);
            }
            _ => {
                return Err(CastError::Parse(
                    "Expected struct name after '}' in typedef".to_string(),
                ));
            }
        }
    }

    Ok(registry)
}

/// Parse one field declaration from its token run: `type-words name[dims...]`.
/// Returns None for an empty run.
fn parse_field(tokens: &[Token]) -> CastResult<Option<Field>> {
    if tokens.is_empty() {
        return Ok(None);
    }

    // Peel trailing [N] groups off the end, innermost-last
    let mut end = tokens.len();
    let mut dims = Vec::new();
    while end >= 3 {
        let (open, num, close) = (&tokens[end - 3], &tokens[end - 2], &tokens[end - 1]);
        if *open != Token::OpenBracket || *close != Token::CloseBracket {
            break;
        }
        let Token::Number(lexeme) = num else {
            break;
        };
        let dim: usize = lexeme
            .parse()
            .map_err(|_| CastError::Parse(format!("Invalid array dimension: {lexeme}")))?;
        dims.insert(0, dim);
        end -= 3;
    }

    let words: Vec<&str> = tokens[..end]
        .iter()
        .filter_map(|t| match t {
            Token::Identifier(w) => Some(w.as_str()),
            _ => None,
        })
        .collect();

    let Some((&name, ty_words)) = words.split_last() else {
        return Ok(None);
    };
    if ty_words.is_empty() {
        return Err(CastError::Parse(format!(
            "Field '{name}' is missing a type"
        )));
    }

    Ok(Some(Field::array(name, ty_words.join(" "), dims)))
}

/// Extract all initializer declarations of `target_struct` from init-file text.
///
/// Matches `[specifiers] <struct> <var>[size]? = { ... };` across lines; the
/// initializer body runs to the first `};`.
pub fn extract_declarations(
    init_text: &str,
    target_struct: &str,
) -> CastResult<Vec<Declaration>> {
    let pattern = format!(
        r"(?ms)^(?P<spec>(?:\w+\s+)*){}\s+(?P<var>\w+)\s*(?P<arr>\[\s*(?P<size>\d*)\s*\])?\s*=\s*(?P<init>\{{.*?\}})\s*;",
        regex::escape(target_struct)
    );
    let re = Regex::new(&pattern).map_err(|e| CastError::Parse(e.to_string()))?;

    let mut declarations = Vec::new();
    for caps in re.captures_iter(init_text) {
        let size = match caps.name("arr") {
            None => ArraySize::Single,
            Some(_) => {
                let digits = caps.name("size").map_or("", |m| m.as_str());
                if digits.is_empty() {
                    ArraySize::Unsized
                } else {
                    ArraySize::Fixed(digits.parse().map_err(|_| {
                        CastError::Parse(format!("Invalid array size: {digits}"))
                    })?)
                }
            }
        };

        declarations.push(Declaration {
            specifiers: caps
                .name("spec")
                .map_or("", |m| m.as_str())
                .trim()
                .to_string(),
            var: caps["var"].to_string(),
            size,
            init: caps["init"].to_string(),
        });
    }

    debug!(
        target = target_struct,
        count = declarations.len(),
        "extracted declarations"
    );
    Ok(declarations)
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn test_parse_structs_field_order_and_count() {
        let reg = parse_structs(FULL_HEADER).unwrap();
        assert_eq!(reg.len(), 2);

        let param = reg.get("paramFull").unwrap();
        let names: Vec<&str> = param.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["mass", "volume", "density", "capacity"]);
        assert_eq!(param.fields[3].dims, vec![2]);

        let unit = reg.get("unit").unwrap();
        let names: Vec<&str> = unit.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "totalmass", "mainFull", "subFull", "otherFull"]
        );
        assert_eq!(unit.fields[2].ty, "paramFull");
        assert_eq!(unit.fields[4].dims, vec![2]);
    }

    #[test]
    fn test_parse_structs_multiword_type() {
        let reg = parse_structs("typedef struct { unsigned int flags; } hdr;").unwrap();
        assert_eq!(reg.get("hdr").unwrap().fields[0].ty, "unsigned int");
    }

    #[test]
    fn test_parse_structs_multidim_array() {
        let reg = parse_structs("typedef struct { float grid[2][3]; } mesh;").unwrap();
        assert_eq!(reg.get("mesh").unwrap().fields[0].dims, vec![2, 3]);
    }

    #[test]
    fn test_parse_structs_skips_non_typedef_content() {
        let text = "#include <stdint.h>\nvoid frob(int x);\ntypedef struct { int a; } only;";
        let reg = parse_structs(text).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(reg.contains("only"));
    }

    #[test]
    fn test_parse_structs_skips_comments() {
        let text = "typedef struct {\n  int a; // grams\n  /* legacy */ int b;\n} c;";
        let reg = parse_structs(text).unwrap();
        assert_eq!(reg.get("c").unwrap().fields.len(), 2);
    }

    #[test]
    fn test_parse_structs_missing_name_is_error() {
        let result = parse_structs("typedef struct { int a; }");
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_single_declaration() {
        let text = "unit u = {1, 10.5, {2, 3, 1.1, {0.5, 0.6}}, {0}, {{0}, {0}}};";
        let decls = extract_declarations(text, "unit").unwrap();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].var, "u");
        assert_eq!(decls[0].size, ArraySize::Single);
        assert!(decls[0].specifiers.is_empty());
        assert!(decls[0].init.starts_with('{'));
    }

    #[test]
    fn test_extract_array_declaration_with_specifiers() {
        let text = "static unit units[2] = {\n  {1, 1.0},\n  {2, 2.0}\n};\n";
        let decls = extract_declarations(text, "unit").unwrap();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].specifiers, "static");
        assert_eq!(decls[0].size, ArraySize::Fixed(2));
    }

    #[test]
    fn test_extract_unsized_array() {
        let text = "unit units[] = {{1}};";
        let decls = extract_declarations(text, "unit").unwrap();
        assert_eq!(decls[0].size, ArraySize::Unsized);
    }

    #[test]
    fn test_extract_ignores_other_structs() {
        let text = "paramFull p = {1, 2, 3.0, {0.1, 0.2}};\nunit u = {1, 2.0};";
        let decls = extract_declarations(text, "unit").unwrap();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].var, "u");
    }

    #[test]
    fn test_extract_multiple_declarations() {
        let text = "unit a = {1};\nunit b = {2};\n";
        let decls = extract_declarations(text, "unit").unwrap();
        let vars: Vec<&str> = decls.iter().map(|d| d.var.as_str()).collect();
        assert_eq!(vars, vec!["a", "b"]);
    }
}
