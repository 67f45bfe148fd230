//! Project persistence and editing tests.
//!
//! These tests save projects to real files, load them back and check that
//! the result is stable and that unknown plugins are reported.

use chrono::{TimeZone, Utc};
use delivery_docs::model::{
    Commit, Component, Delivery, DeliveryInformation, InformationKind, StrategyAssignment,
};
use delivery_docs::{DeliveryError, PluginRegistry, Project};

// ============================================================================
// Fixtures
// ============================================================================

fn sample_project(registry: &PluginRegistry) -> Project {
    let mut project = Project::new("product");
    for (id, day) in [("1.0", 1), ("1.1", 10), ("2.0", 20)] {
        let date = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
        project
            .add_delivery(Delivery::with_details(id, "integrator", date))
            .unwrap();
    }
    project.add_component("product", Component::new("core")).unwrap();
    project
        .add_component("product", Component::new("tools").with_customer_relevant(false))
        .unwrap();
    project.add_component("product.core", Component::new("parser")).unwrap();

    project
        .assign(registry, "product.core", "version", StrategyAssignment::new("text", ["2.0.1"]))
        .unwrap();
    project
        .assign(registry, "product.core", "commits", StrategyAssignment::new("vcs-commits", ["."]))
        .unwrap();
    project
        .assign(registry, "product", "notes", StrategyAssignment::new("subtree", Vec::<String>::new()))
        .unwrap();

    // Inserted out of delivery order on purpose
    for id in ["2.0", "1.0", "1.1"] {
        project
            .set_information(
                registry,
                "product.core",
                id,
                DeliveryInformation::from_text("version", InformationKind::Version, id),
            )
            .unwrap();
    }
    let commits = [
        Commit::new("a1b2c3d4e5", "Fix parser crash").with_time(1_710_000_000).with_alm_id("BUG-7"),
        Commit::new("f6e5d4c3b2", "Speed up <lexer> & tokenizer").with_time(1_710_100_000),
    ];
    project
        .set_information(
            registry,
            "product.core",
            "2.0",
            DeliveryInformation::from_commits("commits", &commits),
        )
        .unwrap();
    project
        .set_information(
            registry,
            "product.tools",
            "1.1",
            DeliveryInformation::from_text("notes", InformationKind::Text, "  internal only  "),
        )
        .unwrap();
    project
}

// ============================================================================
// Persistence
// ============================================================================

mod persistence {
    use super::*;

    #[test]
    fn save_load_save_is_byte_identical() {
        let registry = PluginRegistry::with_builtins();
        let project = sample_project(&registry);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.xml");

        project.save(&path).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        let loaded = Project::load(&path, &registry).unwrap();
        loaded.save(&path).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn empty_text_values_survive_a_reload_unchanged() {
        let registry = PluginRegistry::with_builtins();
        let mut project = Project::new("product");
        project.add_delivery(Delivery::new("1.0")).unwrap();
        project
            .assign(&registry, "product", "notes", StrategyAssignment::new("text", [""]))
            .unwrap();
        project
            .set_information(
                &registry,
                "product",
                "1.0",
                DeliveryInformation::from_text("notes", InformationKind::Text, ""),
            )
            .unwrap();

        let fresh = project.to_xml_string().unwrap();
        let loaded = Project::from_xml_str(&fresh, &registry).unwrap();
        assert_eq!(loaded.to_xml_string().unwrap(), fresh);
        assert_eq!(loaded.root().assignment("notes").unwrap().parameters, vec![""]);
    }

    #[test]
    fn loaded_project_keeps_structure_and_information() {
        let registry = PluginRegistry::with_builtins();
        let project = sample_project(&registry);
        let xml = project.to_xml_string().unwrap();
        let loaded = Project::from_xml_str(&xml, &registry).unwrap();

        let ids: Vec<_> = loaded.deliveries().iter().map(|d| d.id().to_string()).collect();
        assert_eq!(ids, vec!["1.0", "1.1", "2.0"]);
        assert_eq!(loaded.deliveries().get("1.1").unwrap().integrator, "integrator");

        let core = loaded.component("product.core").unwrap();
        assert_eq!(core.assignment("version").unwrap().parameters, vec!["2.0.1"]);
        assert_eq!(core.information("1.1", "version").text(), "1.1");
        let commits = core.information("2.0", "commits").commits();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[1].synopsis, "Speed up <lexer> & tokenizer");
        assert_eq!(commits[0].alm_id.as_deref(), Some("BUG-7"));

        let tools = loaded.component("product.tools").unwrap();
        assert!(!tools.customer_relevant);
        assert_eq!(tools.information("1.1", "notes").text(), "  internal only  ");

        assert!(loaded.component("product.core.parser").is_ok());
        assert!(loaded.component("product").unwrap().assignment("notes").is_some());
    }

    #[test]
    fn information_is_written_in_delivery_order() {
        let registry = PluginRegistry::with_builtins();
        let xml = sample_project(&registry).to_xml_string().unwrap();
        let first = xml.find(r#"deliveryInformation name="1.0""#).unwrap();
        let second = xml.find(r#"deliveryInformation name="1.1""#).unwrap();
        let third = xml.find(r#"deliveryInformation name="2.0""#).unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn unknown_strategy_is_reported_by_name() {
        let registry = PluginRegistry::with_builtins();
        let xml = sample_project(&registry)
            .to_xml_string()
            .unwrap()
            .replace(r#"strategy="vcs-commits""#, r#"strategy="svn-log""#);

        match Project::from_xml_str(&xml, &registry) {
            Err(DeliveryError::UnknownStrategy { name, .. }) => assert_eq!(name, "svn-log"),
            other => panic!("expected UnknownStrategy, got {other:?}"),
        }
    }

    #[test]
    fn unknown_data_source_is_reported_by_name() {
        let registry = PluginRegistry::with_builtins();
        let xml = sample_project(&registry)
            .to_xml_string()
            .unwrap()
            .replace(r#"importer name="notes""#, r#"importer name="tickets""#);

        match Project::from_xml_str(&xml, &registry) {
            Err(DeliveryError::UnknownStrategy { name, .. }) => assert_eq!(name, "tickets"),
            other => panic!("expected UnknownStrategy, got {other:?}"),
        }
    }

    #[test]
    fn malformed_documents_are_rejected() {
        let registry = PluginRegistry::with_builtins();
        assert!(Project::from_xml_str("<project><components>", &registry).is_err());
        assert!(Project::from_xml_str("<article/>", &registry).is_err());
        assert!(Project::from_xml_str(
            r#"<project><components><component customerRelevant="true"/></components></project>"#,
            &registry
        )
        .is_err());
    }

    #[test]
    fn missing_project_file_reports_path() {
        let registry = PluginRegistry::with_builtins();
        let dir = tempfile::tempdir().unwrap();
        let err = Project::load(&dir.path().join("absent.xml"), &registry).unwrap_err();
        assert!(err.to_string().contains("absent.xml"));
    }
}

// ============================================================================
// Editing
// ============================================================================

mod editing {
    use super::*;

    #[test]
    fn removing_a_delivery_prunes_the_whole_tree() {
        let registry = PluginRegistry::with_builtins();
        let mut project = sample_project(&registry);

        let (_, pruned) = project.remove_delivery("2.0").unwrap();
        assert_eq!(pruned, 2);
        let core = project.component("product.core").unwrap();
        assert!(core.find_information("2.0", "version").is_none());
        assert!(core.find_information("2.0", "commits").is_none());
        assert!(!project.deliveries().contains("2.0"));
    }

    #[test]
    fn former_delivery_follows_version_order() {
        let registry = PluginRegistry::with_builtins();
        let mut project = sample_project(&registry);
        project.add_delivery(Delivery::new("1.10")).unwrap();
        project.add_delivery(Delivery::new("1.2")).unwrap();

        assert_eq!(project.former_of("1.10").map(Delivery::id), Some("1.2"));
        assert_eq!(project.former_of("1.2").map(Delivery::id), Some("1.1"));
        assert_eq!(project.former_of("1.0"), None);
    }

    #[test]
    fn accumulated_information_merges_commits_without_duplicates() {
        let mut component = Component::new("core");
        let fix = Commit::new("aaa", "fix").with_time(1);
        let feature = Commit::new("bbb", "feature").with_time(2);
        component.add_information("1.0", DeliveryInformation::from_commits("commits", [&fix]));
        component.add_information(
            "1.0",
            DeliveryInformation::from_commits("commits", [&fix, &feature]),
        );

        let hashes: Vec<_> = component
            .information("1.0", "commits")
            .commits()
            .into_iter()
            .map(|c| c.hash)
            .collect();
        assert_eq!(hashes, vec!["aaa", "bbb"]);
    }

    #[test]
    fn assignment_rejected_by_data_source() {
        let registry = PluginRegistry::with_builtins();
        let mut project = sample_project(&registry);
        let err = project
            .assign(
                &registry,
                "product.core",
                "commits",
                StrategyAssignment::new("random", Vec::<String>::new()),
            )
            .unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidParameters { .. }));
        assert_eq!(
            project.component("product.core").unwrap().assignment("commits").unwrap().strategy,
            "vcs-commits"
        );
    }
}
