use serde::Serialize;

//==============================================================================
// Struct layout model
//==============================================================================

/// A single field in a parsed struct definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    /// Scalar or struct type, possibly multi-word ("unsigned int")
    pub ty: String,
    /// Array dimensions in declaration order; empty for scalars
    pub dims: Vec<usize>,
}

impl Field {
    pub fn scalar(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            dims: Vec::new(),
        }
    }

    pub fn array(name: impl Into<String>, ty: impl Into<String>, dims: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            dims,
        }
    }

    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }
}

/// A parsed `typedef struct { ... } name;` definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<Field>,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }
}

/// All struct definitions found in one header, in declaration order
#[derive(Debug, Clone, Default, Serialize)]
pub struct StructRegistry {
    pub structs: Vec<StructDef>,
}

impl StructRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            structs: Vec::new(),
        }
    }

    pub fn add(&mut self, def: StructDef) {
        self.structs.push(def);
    }

    pub fn get(&self, name: &str) -> Option<&StructDef> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.structs.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }
}

//==============================================================================
// View shape
//==============================================================================

/// Shape of the target view struct, with field order preserved
#[derive(Debug, Clone, PartialEq)]
pub enum ViewTree {
    /// A scalar leaf carrying its type name
    Leaf(String),
    /// A struct node with ordered named fields
    Node(Vec<(String, ViewTree)>),
    /// A fixed-size array of an element shape
    Array { len: usize, elem: Box<ViewTree> },
}

//==============================================================================
// Source declarations
//==============================================================================

/// Array suffix on a source declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySize {
    /// No brackets: a single struct value
    Single,
    /// Empty brackets: `name[]`
    Unsized,
    /// Explicit element count: `name[2]`
    Fixed(usize),
}

impl ArraySize {
    pub fn is_array(&self) -> bool {
        !matches!(self, ArraySize::Single)
    }

    /// Render the suffix as it appears in a declaration
    pub fn suffix(&self) -> String {
        match self {
            ArraySize::Single => String::new(),
            ArraySize::Unsized => "[]".to_string(),
            ArraySize::Fixed(n) => format!("[{n}]"),
        }
    }
}

/// One initializer declaration extracted from an init file
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Leading specifiers as written in the source ("static", ...), may be empty
    pub specifiers: String,
    pub var: String,
    pub size: ArraySize,
    /// Raw initializer block text, braces included
    pub init: String,
}

impl Declaration {
    /// Assemble the generated declaration around a projected initializer body.
    ///
    /// Source specifiers are preserved, `const` is inserted unless already
    /// present, and an optional postfix specifier (e.g. `PROGMEM`) lands
    /// between the array suffix and the `=`.
    pub fn render(&self, type_name: &str, var_name: &str, body: &str, postfix: &str) -> String {
        let mut decl = String::new();

        if !self.specifiers.is_empty() {
            decl.push_str(&self.specifiers);
            decl.push(' ');
        }
        if !self.specifiers.split_whitespace().any(|w| w == "const") {
            decl.push_str("const ");
        }
        decl.push_str(type_name);
        decl.push(' ');
        decl.push_str(var_name);
        decl.push_str(&self.size.suffix());
        if !postfix.is_empty() {
            decl.push(' ');
            decl.push_str(postfix);
        }
        decl.push_str(" = ");
        decl.push_str(body);
        decl.push(';');

        decl
    }
}
