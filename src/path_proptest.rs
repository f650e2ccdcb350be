//! Property-based tests for canonical path normalization.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::normalize;
    use proptest::prelude::*;

    proptest! {
        /// Property: every successful normalization starts with exactly one slash
        #[test]
        fn normalize_starts_with_single_slash(input in ".*") {
            if let Ok(path) = normalize(&input) {
                prop_assert!(path.as_str().starts_with('/'));
                prop_assert!(!path.as_str().starts_with("//"));
            }
        }

        /// Property: normalize(normalize(p)) == normalize(p)
        #[test]
        fn normalize_is_idempotent(input in ".*") {
            if let Ok(once) = normalize(&input) {
                let twice = normalize(once.as_str());
                prop_assert_eq!(twice.ok(), Some(once));
            }
        }

        /// Property: idempotence holds for path-like inputs with extensions and URLs
        #[test]
        fn normalize_is_idempotent_for_doc_paths(
            scheme in prop::sample::select(vec!["", "https://docs.example.com", "http://host"]),
            segments in prop::collection::vec("[a-zA-Z0-9 _.-]{0,12}", 0..5),
            ext in prop::sample::select(vec!["", ".md", ".mdx", ".MD", ".md.mdx"]),
        ) {
            let input = format!("{}/{}{}", scheme, segments.join("/"), ext);
            if let Ok(once) = normalize(&input) {
                prop_assert_eq!(normalize(once.as_str()).ok(), Some(once));
            }
        }

        /// Property: the result never contains empty segments or doubled whitespace
        #[test]
        fn normalize_has_no_empty_segments(input in "[a-z /\t.]{0,40}") {
            if let Ok(path) = normalize(&input) {
                prop_assert!(!path.as_str().contains("//"));
                prop_assert!(!path.as_str().contains("  "));
                prop_assert!(!path.as_str().ends_with('/'));
            }
        }

        /// Property: normalization never yields a markdown extension on the last segment
        #[test]
        fn normalize_is_extensionless(name in "[a-z]{1,8}", ext in "(\\.md|\\.mdx){1,3}") {
            let path = normalize(&format!("/guides/{}{}", name, ext)).unwrap();
            prop_assert_eq!(path.as_str(), format!("/guides/{}", name));
        }
    }
}
