//! Subject and template facades: code/channel validation and list coherency.

#[path = "testutils/mod.rs"]
mod testutils;

use classhub::{AuditFilter, OperationStatus};
use testutils::fixture::AdminFixture;

#[tokio::test]
async fn subject_codes_are_unique_per_department() {
    let fixture = AdminFixture::new();
    let science = fixture.seed_department("Science");
    let languages = fixture.seed_department("Languages");

    let first = fixture
        .subjects
        .create("BIO", "Biology", science.id)
        .await
        .unwrap();
    assert!(first.is_some());

    // Same code in the same department is refused, case-insensitively.
    let clash = fixture
        .subjects
        .create("bio", "Biochemistry", science.id)
        .await
        .unwrap();
    assert!(clash.is_none());

    // The same code under another department is fine.
    let elsewhere = fixture
        .subjects
        .create("BIO", "Biographies", languages.id)
        .await
        .unwrap();
    assert!(elsewhere.is_some());
}

#[tokio::test]
async fn subject_requires_an_active_department() {
    let fixture = AdminFixture::new();
    let dept = fixture.seed_department("Crafts");
    let mut inactive = dept.clone();
    inactive.is_active = false;
    fixture.departments_repo.seed(inactive);

    let created = fixture
        .subjects
        .create("WOOD", "Woodworking", dept.id)
        .await
        .unwrap();
    assert!(created.is_none());

    let failed = fixture
        .audit
        .search(&AuditFilter::new().status(OperationStatus::Failed))
        .await
        .unwrap();
    assert!(failed[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("does not exist or is inactive"));
}

#[tokio::test]
async fn retired_subject_leaves_the_department_listing() {
    let fixture = AdminFixture::new();
    let dept = fixture.seed_department("Science");
    let subject = fixture
        .subjects
        .create("CHEM", "Chemistry", dept.id)
        .await
        .unwrap()
        .unwrap();

    let listed = fixture.subjects.subjects_of_department(dept.id).await.unwrap();
    assert_eq!(listed.len(), 1);

    assert!(fixture.subjects.retire(subject.id).await.unwrap());
    assert!(!fixture.subjects.retire(subject.id).await.unwrap());

    let listed = fixture.subjects.subjects_of_department(dept.id).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn template_rejects_empty_and_duplicate_channels() {
    let fixture = AdminFixture::new();

    let no_channels = fixture
        .templates
        .create("Empty", None, vec![])
        .await
        .unwrap();
    assert!(no_channels.is_none());

    let duplicate = fixture
        .templates
        .create(
            "Class team",
            None,
            vec!["General".to_string(), "general".to_string()],
        )
        .await
        .unwrap();
    assert!(duplicate.is_none());

    let valid = fixture
        .templates
        .create(
            "Class team",
            Some("Default class setup"),
            vec!["General".to_string(), "Homework".to_string()],
        )
        .await
        .unwrap();
    assert!(valid.is_some());
}

#[tokio::test]
async fn update_channels_refreshes_the_cached_template() {
    let fixture = AdminFixture::new();
    let template = fixture.seed_template("Course", &["General"]);

    let read = fixture.templates.template(template.id).await.unwrap().unwrap();
    assert_eq!(read.channel_names.len(), 1);

    let updated = fixture
        .templates
        .update_channels(
            template.id,
            vec!["General".to_string(), "Exams".to_string()],
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.channel_names.len(), 2);

    let fresh = fixture.templates.template(template.id).await.unwrap().unwrap();
    assert_eq!(fresh.channel_names, vec!["General", "Exams"]);

    let listed = fixture.templates.active_templates().await.unwrap();
    assert_eq!(listed.len(), 1);
}
