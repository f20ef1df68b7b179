mod support;

use icona::application::repos::OptionStore;
use icona::application::uploads::UploadSettingsError;
use icona::domain::favicon::FAVICON_IMAGE_OPTION;
use icona::domain::types::SourceKind;

use support::{DEFAULT_ASSET, Fixture};

#[tokio::test]
async fn cached_path_is_shared_through_the_option_file() {
    let fixture = Fixture::builder().build();
    fixture.write_root_file("favicon.png");

    let first = fixture.favicon.lookup().await;
    assert_eq!(first.path, "https://example.com/favicon.png");
    assert_eq!(first.source, Some(SourceKind::RootFile));

    let stored = fixture
        .options
        .get_option("themeists_favicon_path")
        .await
        .expect("option read");
    assert_eq!(stored.as_deref(), Some("https://example.com/favicon.png"));

    // A second process over the same files sees the cached value.
    let (other, _) = Fixture::builder().attach(&fixture);
    let seen = other.lookup().await;
    assert!(seen.cached);
    assert_eq!(seen.path, "https://example.com/favicon.png");
}

#[tokio::test]
async fn upload_is_served_at_its_derived_size() {
    let fixture = Fixture::builder().build();
    fixture.write_root_file("favicon.ico");
    fixture.write_upload("2025/10/logo.png", 256, 256);

    fixture
        .uploads
        .set_upload("2025/10/logo.png")
        .await
        .expect("set upload");
    assert_eq!(
        fixture.uploads.current().await.expect("current").as_deref(),
        Some("2025/10/logo.png")
    );

    let lookup = fixture.favicon.lookup().await;
    assert_eq!(lookup.source, Some(SourceKind::PanelUpload));
    assert_eq!(
        lookup.path,
        "https://example.com/uploads/2025/10/logo-16x16.png"
    );
    assert!(
        fixture
            .dir
            .path()
            .join("uploads/2025/10/logo-16x16.png")
            .is_file()
    );
}

#[tokio::test]
async fn legacy_policy_keeps_the_stale_path_until_cleared() {
    let fixture = Fixture::builder()
        .invalidate_on_upload_change(false)
        .build();
    fixture.write_upload("logo.png", 16, 16);

    assert_eq!(fixture.favicon.current_path().await, DEFAULT_ASSET);

    fixture.uploads.set_upload("logo.png").await.expect("set upload");
    assert_eq!(fixture.favicon.current_path().await, DEFAULT_ASSET);

    fixture.favicon.clear_cache().await.expect("clear cache");
    assert_eq!(
        fixture.favicon.current_path().await,
        "https://example.com/uploads/logo-16x16.png"
    );
}

#[tokio::test]
async fn option_written_elsewhere_is_picked_up_after_invalidation() {
    let fixture = Fixture::builder().build();
    fixture.write_upload("brand/icon.png", 48, 48);

    assert_eq!(fixture.favicon.current_path().await, DEFAULT_ASSET);

    // Another writer sets the option without going through the upload service,
    // so no derived size exists and the original is served.
    fixture
        .options
        .update_option(FAVICON_IMAGE_OPTION, "brand/icon.png")
        .await
        .expect("option write");
    assert_eq!(fixture.favicon.current_path().await, DEFAULT_ASSET);

    fixture.favicon.clear_cache().await.expect("clear cache");
    assert_eq!(
        fixture.favicon.current_path().await,
        "https://example.com/uploads/brand/icon.png"
    );
}

#[tokio::test]
async fn disabled_panel_refuses_changes_and_ignores_the_option() {
    let fixture = Fixture::builder().upload_panel(false).build();
    fixture.write_upload("logo.png", 16, 16);
    fixture
        .options
        .update_option(FAVICON_IMAGE_OPTION, "logo.png")
        .await
        .expect("option write");

    assert!(matches!(
        fixture.uploads.set_upload("logo.png").await,
        Err(UploadSettingsError::PanelDisabled)
    ));
    assert_eq!(fixture.favicon.current_path().await, DEFAULT_ASSET);
}

#[tokio::test]
async fn unreadable_option_file_still_resolves() {
    let fixture = Fixture::builder().build();
    fixture.write_root_file("favicon.png");
    std::fs::write(fixture.dir.path().join("options.toml"), "not = = toml").expect("corrupt");

    // Option and cache reads fail; the root file still resolves and nothing panics.
    let lookup = fixture.favicon.lookup().await;
    assert_eq!(lookup.path, "https://example.com/favicon.png");
    assert!(!lookup.cached);
}
