use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SpreadError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(SpreadError::data("x").to_string().contains("data error:"));
    assert!(SpreadError::fetch("x").to_string().contains("fetch error:"));
    assert!(
        SpreadError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(SpreadError::io("x").to_string().contains("io error:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SpreadError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
