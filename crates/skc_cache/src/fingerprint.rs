//! Input and output fingerprints.

use skc_common::{ContentHash, HashBuilder};

/// Hash of everything that shapes an artifact's prompt.
///
/// Components, in order: the canonical IR JSON, each relevant instruction
/// section as name then body, and the prompt template. Components are
/// delimited, so text shifting between two sections changes the digest.
pub fn input_fingerprint(ir_json: &str, sections: &[(&str, &str)], template: &str) -> ContentHash {
    let mut builder = HashBuilder::new().component(ir_json);
    for (name, body) in sections {
        builder = builder.component(name).component(body);
    }
    builder.component(template).finish()
}

/// Hash of generated content.
pub fn output_fingerprint(content: &str) -> ContentHash {
    ContentHash::from_str_content(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = input_fingerprint("{}", &[("Product", "A tool")], "template");
        let b = input_fingerprint("{}", &[("Product", "A tool")], "template");
        assert_eq!(a, b);
    }

    #[test]
    fn every_component_matters() {
        let base = input_fingerprint("{}", &[("Product", "A tool")], "t");
        assert_ne!(base, input_fingerprint("{\"a\":1}", &[("Product", "A tool")], "t"));
        assert_ne!(base, input_fingerprint("{}", &[("Product", "A tool!")], "t"));
        assert_ne!(base, input_fingerprint("{}", &[("Product", "A tool")], "t2"));
        assert_ne!(base, input_fingerprint("{}", &[], "t"));
    }

    #[test]
    fn shifting_bytes_between_sections_changes_hash() {
        let a = input_fingerprint("{}", &[("A", "xy"), ("B", "z")], "t");
        let b = input_fingerprint("{}", &[("A", "x"), ("B", "yz")], "t");
        assert_ne!(a, b);
    }
}
