//! End-to-end library workflows through the Store

use std::fs;

use litman_core::{
    Config, Criteria, DetailFields, Error, MarkFlags, ReferenceEdit, ReferenceFields,
    ReferenceKind, Store,
};
use tempfile::TempDir;

fn article(title: &str, journal: &str, issue: u32, year: i32) -> ReferenceFields {
    ReferenceFields {
        title: Some(title.to_string()),
        authors: vec!["Jane Doe".to_string(), "John Smith".to_string()],
        year: Some(year),
        category: Some("Neutrino".to_string()),
        tags: vec!["reactor".to_string()],
        details: DetailFields {
            journal: Some(journal.to_string()),
            issue: Some(issue),
            number: Some("012345".to_string()),
            ..Default::default()
        },
    }
}

fn thesis() -> ReferenceFields {
    ReferenceFields {
        title: Some("Measuring theta13".to_string()),
        authors: vec!["Alice Doe".to_string()],
        year: Some(2019),
        category: Some("Neutrino".to_string()),
        tags: vec![],
        details: DetailFields {
            university: Some("Univ. of Oxford".to_string()),
            department: Some("Physics".to_string()),
            ..Default::default()
        },
    }
}

#[test]
fn test_build_query_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::with_data_dir(temp_dir.path());
    let pdf = temp_dir.path().join("thesis.pdf");
    fs::write(&pdf, b"%PDF").unwrap();

    {
        let mut store = Store::open_with_config(config.clone()).unwrap();
        store
            .add(
                ReferenceKind::Article,
                article("Reactor results", "Physical Review D", 5, 2020),
                None,
                false,
            )
            .unwrap();
        store
            .add(
                ReferenceKind::Article,
                article("Beam results", "Phys. Rev. Lett.", 7, 2023),
                None,
                false,
            )
            .unwrap();
        let thesis = store
            .add(ReferenceKind::Thesis, thesis(), Some(&pdf), false)
            .unwrap();
        assert_eq!(thesis.label(), "Doe_UnivofOxford_2019");

        store
            .link("PhysRevLett_7_012345_2023", "PhysicalReviewD_5_012345_2020")
            .unwrap();
        store
            .link("Doe_UnivofOxford_2019", "PhysicalReviewD_5_012345_2020")
            .unwrap();
        store
            .mark(
                "PhysicalReviewD_5_012345_2020",
                MarkFlags {
                    read: true,
                    important: true,
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .add_notes(
                "Doe_UnivofOxford_2019",
                vec!["chapter 3 has the fit".to_string()],
            )
            .unwrap();
    }

    let store = Store::open_with_config(config.clone()).unwrap();
    assert_eq!(store.library().len(), 3);
    assert!(store.check_integrity().is_empty());

    let cited = store.get("PhysicalReviewD_5_012345_2020").unwrap();
    assert_eq!(
        cited.citations(),
        ["PhysRevLett_7_012345_2023", "Doe_UnivofOxford_2019"]
    );

    let unread = store
        .query(&Criteria {
            to_read: true,
            ..Default::default()
        })
        .unwrap();
    let labels: Vec<_> = unread.iter().map(|r| r.label()).collect();
    assert_eq!(labels, vec!["Doe_UnivofOxford_2019", "PhysRevLett_7_012345_2023"]);

    let summary = store.summary();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.links, 2);
    assert_eq!(summary.important, 1);
}

#[test]
fn test_remove_cleans_graph_and_documents() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::with_data_dir(temp_dir.path());
    let pdf = temp_dir.path().join("thesis.pdf");
    fs::write(&pdf, b"%PDF").unwrap();

    let mut store = Store::open_with_config(config.clone()).unwrap();
    store
        .add(
            ReferenceKind::Article,
            article("Reactor results", "PRD", 5, 2020),
            None,
            false,
        )
        .unwrap();
    store
        .add(ReferenceKind::Thesis, thesis(), Some(&pdf), false)
        .unwrap();
    store.link("Doe_UnivofOxford_2019", "PRD_5_012345_2020").unwrap();
    store.link("PRD_5_012345_2020", "Doe_UnivofOxford_2019").unwrap();

    store.remove("Doe_UnivofOxford_2019").unwrap();
    drop(store);

    let store = Store::open_with_config(config.clone()).unwrap();
    let remaining = store.get("PRD_5_012345_2020").unwrap();
    assert!(remaining.references().is_empty());
    assert!(remaining.citations().is_empty());
    assert!(config
        .files_dir()
        .join("archive")
        .join("Doe_UnivofOxford_2019.pdf")
        .exists());
}

#[test]
fn test_errors_leave_library_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::with_data_dir(temp_dir.path());

    let mut store = Store::open_with_config(config.clone()).unwrap();
    store
        .add(
            ReferenceKind::Article,
            article("Reactor results", "PRD", 5, 2020),
            None,
            false,
        )
        .unwrap();
    let before = store.library().clone();

    let err = store.link("PRD_5_012345_2020", "Missing_2020").unwrap_err();
    assert_eq!(
        err.downcast_ref::<Error>(),
        Some(&Error::ReferenceNotFound("Missing_2020".to_string()))
    );

    let err = store
        .edit(
            "PRD_5_012345_2020",
            &ReferenceEdit {
                details: DetailFields {
                    publisher: Some("Press".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::Validation { .. })
    ));

    assert!(store.remove_tag("PRD_5_012345_2020", "neutrino").is_err());
    assert!(store.unlink_reference("PRD_5_012345_2020", 0).is_err());
    assert_eq!(store.library(), &before);

    let reopened = Store::open_with_config(config).unwrap();
    assert_eq!(reopened.library(), &before);
}

#[test]
fn test_edit_keeps_label() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = Store::open_with_config(Config::with_data_dir(temp_dir.path())).unwrap();
    store
        .add(
            ReferenceKind::Article,
            article("Reactor results", "PRD", 5, 2020),
            None,
            false,
        )
        .unwrap();

    store
        .edit(
            "PRD_5_012345_2020",
            &ReferenceEdit {
                year: Some(2021),
                category: Some("Accelerator".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    let edited = store.get("PRD_5_012345_2020").unwrap();
    assert_eq!(edited.year, 2021);
    assert_eq!(edited.tags(), ["accelerator", "reactor"]);
}
