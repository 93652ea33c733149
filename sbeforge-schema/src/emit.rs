//! Emission boundary helpers.
//!
//! Everything an emitter consumes beyond the read-only model queries lives
//! here: the reserved-identifier rename table and the composition of scoped
//! property-definition names. The structural model never depends on these
//! spellings; it only routes `reference_name()` through [`rename_keyword`].

/// Reserved identifiers of the generated library's target language, plus
/// names the generated code claims for itself (`comms`, `length`). Sorted,
/// for binary search.
static KEYWORDS: &[&str] = &[
    "alignas",
    "alignof",
    "and",
    "and_eq",
    "asm",
    "atomic_cancel",
    "atomic_commit",
    "atomic_noexcept",
    "auto",
    "bitand",
    "bitor",
    "bool",
    "break",
    "case",
    "catch",
    "char",
    "char16_t",
    "char32_t",
    "class",
    "co_await",
    "co_return",
    "co_yield",
    "comms",
    "compl",
    "concept",
    "const",
    "const_cast",
    "constexpr",
    "continue",
    "decltype",
    "default",
    "delete",
    "do",
    "double",
    "dynamic_cast",
    "else",
    "enum",
    "explicit",
    "export",
    "extern",
    "false",
    "float",
    "for",
    "friend",
    "goto",
    "if",
    "import",
    "inline",
    "int",
    "length",
    "long",
    "module",
    "mutable",
    "namespace",
    "new",
    "noexcept",
    "not",
    "not_eq",
    "nullptr",
    "operator",
    "or",
    "or_eq",
    "private",
    "protected",
    "public",
    "register",
    "reinterpret_cast",
    "requires",
    "return",
    "short",
    "signed",
    "sizeof",
    "static",
    "static_assert",
    "static_cast",
    "struct",
    "switch",
    "synchronized",
    "template",
    "this",
    "thread_local",
    "throw",
    "true",
    "try",
    "typedef",
    "typeid",
    "typename",
    "union",
    "unsigned",
    "using",
    "virtual",
    "void",
    "volatile",
    "wchar_t",
    "while",
    "xor",
    "xor_eq",
];

/// Applies the reserved-word rename rule: a reserved identifier gains a
/// trailing underscore, anything else passes through unchanged.
#[must_use]
pub fn rename_keyword(name: &str) -> String {
    if KEYWORDS.binary_search(&name).is_ok() {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Identifier pair used by property-definition emitters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDefNames {
    /// Name of the local field type alias.
    pub field_type: String,
    /// Name of the local properties variable.
    pub props: String,
}

/// Composes the property-definition identifiers for a field in the given
/// scope. Scope separators collapse into underscores; a comms-optional
/// wrapped field gets the inner-field suffix appended.
#[must_use]
pub fn scoped_property_names(scope: &str, name: &str, wrapped: bool) -> PropertyDefNames {
    let mut flat = scope.replace("::", "_").replace("<>", "");
    flat.push_str(name);
    if wrapped {
        flat.push_str(crate::common::OPT_FIELD_SUFFIX);
    }

    PropertyDefNames {
        field_type: format!("Field_{flat}"),
        props: format!("props_{flat}"),
    }
}
