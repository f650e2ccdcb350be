//! End-to-end tests for the `fixdoc locate` command.

#[allow(dead_code)]
mod common;
use common::prelude::*;

fn button_fixture(config: &str) -> TestFixture {
    TestFixture::new()
        .with_docs_repo(&[
            ("docs/widgets/button.md", docs::BUTTON),
            ("docs/guides/Install.mdx", docs::INSTALL),
            ("docs/drafts/buttons.md", "# Draft\n"),
        ])
        .with_config(config)
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_locate_prints_outline() {
    let fixture = button_fixture(configs::MINIMAL);

    fixture
        .command()
        .args(["locate", "https://docs.example.com/widgets/button/"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "/widgets/button -> docs/widgets/button.md",
        ))
        .stdout(predicate::str::contains("### Sizing"))
        .stdout(predicate::str::contains("### Colors"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_locate_probes_capitalized_mdx() {
    let fixture = button_fixture(configs::MINIMAL);

    fixture
        .command()
        .args(["locate", "/guides/install"])
        .assert()
        .success()
        .stdout(predicate::str::contains("docs/guides/Install.mdx"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_locate_section_text() {
    let fixture = button_fixture(configs::MINIMAL);

    fixture
        .command()
        .args(["locate", "/widgets/button", "--section", "`Sizing`"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Section \"Sizing\" (lines 5-7)"))
        .stdout(predicate::str::contains("pixel value"))
        .stdout(predicate::str::contains("theme tokens").not());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_locate_section_with_depth_prefix() {
    let fixture = button_fixture(configs::MINIMAL);

    fixture
        .command()
        .args(["locate", "/guides/install", "--section", "## Steps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Run the installer."))
        .stdout(predicate::str::contains("Node 16").not());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_locate_missing_section() {
    let fixture = button_fixture(configs::MINIMAL);

    fixture
        .command()
        .args(["locate", "/widgets/button", "--section", "Borders"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Section not found"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_locate_missing_document_lists_candidates() {
    let fixture = button_fixture(configs::MINIMAL);

    fixture
        .command()
        .args(["locate", "/widgets/slider"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document not found"))
        .stderr(predicate::str::contains("docs/widgets/slider.md"))
        .stderr(predicate::str::contains("docs/widgets/Slider.mdx"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_locate_fuzzy_match_skips_excluded() {
    let fixture = button_fixture(configs::FUZZY);

    fixture
        .command()
        .args(["locate", "/widget/buttons"])
        .assert()
        .success()
        .stdout(predicate::str::contains("docs/widgets/button.md"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_locate_missing_repository() {
    let fixture = TestFixture::new().with_config(configs::MINIMAL);

    fixture
        .command()
        .args(["locate", "/widgets/button"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document repository not found"));
}
