//! JVM type descriptor helpers.
//!
//! Descriptors are treated as plain strings; only the reference-type class
//! names buried inside them matter to symbol resolution. Primitive and array
//! dimensions are recognized but never treated as class references.

/// Class name referenced by a field-style type descriptor.
///
/// Array dimensions are stripped down to the element type. Returns `None`
/// for primitives and primitive arrays.
pub fn element_class(descriptor: &str) -> Option<&str> {
    descriptor
        .trim_start_matches('[')
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
}

/// Class name referenced by a constant pool `Class` entry.
///
/// Such entries hold a bare binary name, except for array types where they
/// hold a descriptor instead.
pub fn class_entry_reference(raw: &str) -> Option<&str> {
    if raw.starts_with('[') {
        element_class(raw)
    } else {
        Some(raw)
    }
}

/// All reference-type class names mentioned by a method descriptor,
/// parameters and return type alike.
pub fn method_descriptor_classes(descriptor: &str) -> Vec<String> {
    let mut classes = Vec::new();
    let bytes = descriptor.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'L' => {
                let Some(end) = descriptor[index..].find(';') else {
                    break;
                };
                let class = &descriptor[index + 1..index + end];
                if !classes.iter().any(|seen| seen == class) {
                    classes.push(class.to_string());
                }
                index += end + 1;
            }
            _ => index += 1,
        }
    }
    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_class_strips_array_dimensions() {
        assert_eq!(element_class("Lcom/example/Api;"), Some("com/example/Api"));
        assert_eq!(element_class("[[Lcom/example/Api;"), Some("com/example/Api"));
        assert_eq!(element_class("I"), None);
        assert_eq!(element_class("[[I"), None);
    }

    #[test]
    fn class_entry_reference_handles_bare_names_and_arrays() {
        assert_eq!(class_entry_reference("com/example/Api"), Some("com/example/Api"));
        assert_eq!(class_entry_reference("[Lcom/example/Api;"), Some("com/example/Api"));
        assert_eq!(class_entry_reference("[I"), None);
    }

    #[test]
    fn method_descriptor_classes_cover_parameters_and_return() {
        let classes =
            method_descriptor_classes("(ILjava/lang/String;[Lcom/example/Api;)Ljava/util/List;");

        assert_eq!(
            classes,
            vec!["java/lang/String", "com/example/Api", "java/util/List"]
        );
    }

    #[test]
    fn method_descriptor_classes_deduplicates() {
        let classes = method_descriptor_classes("(Ljava/lang/String;)Ljava/lang/String;");

        assert_eq!(classes, vec!["java/lang/String"]);
    }
}
