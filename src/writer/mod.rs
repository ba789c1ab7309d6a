use crate::error::{CastError, CastResult};
use regex::{NoExpand, Regex};
use std::fs;
use std::path::Path;

/// Update the generated header with new declarations.
///
/// An existing declaration of the same variable is replaced in place; new
/// variables are appended. When the file already exists a `.bak` copy is
/// written before the rewrite.
pub fn update_header_file(path: &Path, decls: &[(String, String)]) -> CastResult<()> {
    let mut content = if path.exists() {
        let backup_path = backup_path(path);
        fs::copy(path, &backup_path)?;
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    for (var, decl) in decls {
        content = replace_or_append(&content, var, decl)?;
    }

    fs::write(path, content)?;
    Ok(())
}

fn backup_path(path: &Path) -> std::path::PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{ext}.bak")),
        None => path.with_extension("bak"),
    }
}

/// Replace an existing declaration of `var`, or append the new one.
fn replace_or_append(content: &str, var: &str, decl: &str) -> CastResult<String> {
    // Matches the whole previous declaration including leading specifiers
    let pattern = format!(
        r"(?ms)^[^\S\n]*(?:\w+[^\S\n]+)*const\s+\S+\s+{}\s*(?:\[[^\]]*\])?[^\S\n]*(?:\w+[^\S\n]+)*=\s*\{{.*?\}}\s*;",
        regex::escape(var)
    );
    let re = Regex::new(&pattern).map_err(|e| CastError::Parse(e.to_string()))?;

    if re.is_match(content) {
        return Ok(re.replace(content, NoExpand(decl)).into_owned());
    }

    let mut out = content.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(decl);
    out.push('\n');
    Ok(out)
}
