use super::*;

#[test]
fn test_pkg_info_null_fields_decode_as_empty() {
    let json = r#"{
        "name": "magit",
        "description": "A Git porcelain inside Emacs.",
        "version": "20240101.1200",
        "homepageURL": null,
        "author": null,
        "dependencies": null
    }"#;

    let info: PkgInfo = serde_json::from_str(json).unwrap();
    assert_eq!(info.name, "magit");
    assert_eq!(info.homepage_url, "");
    assert_eq!(info.author, "");
    assert!(info.dependencies.is_empty());
    assert!(!info.is_empty());
}

#[test]
fn test_pkg_info_null_document_is_unknown_package() {
    let info: Option<PkgInfo> = serde_json::from_str("null").unwrap();
    assert!(info.unwrap_or_default().is_empty());
}

#[test]
fn test_pkg_info_serializes_with_url_field_names() {
    let info = PkgInfo {
        name: "flask".to_string(),
        homepage_url: "https://palletsprojects.com/p/flask".to_string(),
        ..Default::default()
    };

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["homepageURL"], "https://palletsprojects.com/p/flask");
    assert_eq!(json["bugTrackerURL"], "");
}

#[test]
fn test_author_info_display_omits_empty_parts() {
    let full = AuthorInfo {
        name: "Armin Ronacher".to_string(),
        email: "armin@example.com".to_string(),
        url: "https://example.com".to_string(),
    };
    assert_eq!(
        full.to_string(),
        "Armin Ronacher <armin@example.com> (https://example.com)"
    );

    let email_only = AuthorInfo {
        email: "dev@example.com".to_string(),
        ..Default::default()
    };
    assert_eq!(email_only.to_string(), "<dev@example.com>");

    assert_eq!(AuthorInfo::default().to_string(), "");
}

#[test]
fn test_quirks_union_and_contains() {
    let quirks = Quirks::NOT_REPRODUCIBLE | Quirks::ADD_REMOVE_ALSO_INSTALLS;
    assert!(quirks.contains(Quirks::NOT_REPRODUCIBLE));
    assert!(quirks.contains(Quirks::ADD_REMOVE_ALSO_INSTALLS));
    assert!(!Quirks::NOT_REPRODUCIBLE.contains(Quirks::ADD_REMOVE_ALSO_INSTALLS));
    assert_eq!(Quirks::NONE.to_string(), "none");
    assert_eq!(
        quirks.to_string(),
        "not-reproducible, add-remove-also-installs"
    );
}

#[test]
fn test_pkg_name_ordering_is_exact_string() {
    assert_ne!(PkgName::from("Flask"), PkgName::from("flask"));
    assert!(PkgName::from("a") < PkgName::from("b"));
}
