//! Accessor and type name derivation
//!
//! Schema names are SCREAMING_SNAKE_CASE. Accessor names are lowerCamelCase,
//! type and constant names are UpperCamelCase. A leading underscore denotes
//! an "internal" key and is stripped before case conversion. A reserved-word
//! escape table is applied last.

/// Convert a schema name to a lowerCamelCase accessor name.
///
/// `"AST_NODE"` becomes `"astNode"`, `"_KEY"` becomes `"key"`.
pub fn camel_case(s: &str) -> String {
    case_words(s, false)
}

/// Convert a schema name to an UpperCamelCase type or constant name.
///
/// `"AST_NODE"` becomes `"AstNode"`.
pub fn upper_camel_case(s: &str) -> String {
    case_words(s, true)
}

fn case_words(s: &str, capitalize_first: bool) -> String {
    let stripped = s.trim_start_matches('_');
    let mut result = String::with_capacity(stripped.len());
    let mut capitalize_next = capitalize_first;

    for c in stripped.chars() {
        if c == '_' || c == '-' || c == ' ' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c.to_ascii_lowercase());
        }
    }

    escape_reserved(result)
}

/// Append a trailing underscore when a derived name would collide with a
/// target-language keyword. Applied after case conversion.
fn escape_reserved(name: String) -> String {
    if is_reserved_word(&name) {
        let mut escaped = name;
        escaped.push('_');
        escaped
    } else {
        name
    }
}

/// Keywords of the plausible target languages for generated bindings
/// (Java, Scala, Kotlin, Rust), lowercased
fn is_reserved_word(s: &str) -> bool {
    matches!(
        s,
        "abstract" | "as" | "assert" | "boolean" | "break" | "byte" | "case" | "catch" |
        "char" | "class" | "const" | "continue" | "def" | "default" | "do" | "double" |
        "dyn" | "else" | "enum" | "extends" | "final" | "finally" | "float" | "fn" |
        "for" | "goto" | "if" | "impl" | "implements" | "implicit" | "import" | "in" |
        "instanceof" | "int" | "interface" | "lazy" | "let" | "long" | "loop" | "match" |
        "mod" | "native" | "new" | "null" | "object" | "override" | "package" | "private" |
        "protected" | "pub" | "public" | "return" | "sealed" | "short" | "static" |
        "struct" | "super" | "switch" | "synchronized" | "this" | "throw" | "throws" |
        "trait" | "transient" | "try" | "type" | "use" | "val" | "var" | "void" |
        "volatile" | "when" | "where" | "while" | "with" | "yield"
    )
}
