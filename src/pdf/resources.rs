use lopdf::{Dictionary, Object};

/// Build a page's resources dictionary from the XObjects its content draws.
///
/// Label pages carry no text, so only the image procedure set is declared.
pub fn page_resources(xobject_dict: &Dictionary) -> Dictionary {
    let mut resources = Dictionary::new();
    resources.set(
        "ProcSet",
        vec![Object::Name(b"PDF".to_vec()), Object::Name(b"ImageC".to_vec())],
    );
    if !xobject_dict.is_empty() {
        resources.set("XObject", Object::Dictionary(xobject_dict.clone()));
    }
    resources
}
