//! Mapping between a [`Project`] and its XML document.
//!
//! Strategies and data sources are stored by name and resolved against the
//! registry when loading. Output is deterministic: deliveries in delivery
//! order, importers sorted by name, information in delivery order.

use super::Project;
use crate::error::{DeliveryError, PersistenceErrorKind, Result};
use crate::model::{
    compare_ids, Component, Delivery, DeliveryInformation, Element, StrategyAssignment, CONTENT_TAG,
};
use crate::plugins::PluginRegistry;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeSet;

const PROJECT: &str = "project";
const DELIVERIES: &str = "deliveries";
const DELIVERY: &str = "delivery";
const COMPONENTS: &str = "components";
const COMPONENT: &str = "component";
const IMPORTER: &str = "importer";
const PARAMETER: &str = "parameter";
const DELIVERY_INFORMATION: &str = "deliveryInformation";

// ============================================================================
// Writing
// ============================================================================

pub(super) fn project_to_element(project: &Project) -> Element {
    let deliveries = project
        .deliveries()
        .iter()
        .fold(Element::new(DELIVERIES), |list, d| {
            list.with_child(
                Element::new(DELIVERY)
                    .with_attr("name", d.id())
                    .with_attr("integrator", &d.integrator)
                    .with_attr("date", d.created.to_rfc3339_opts(SecondsFormat::Secs, true)),
            )
        });
    Element::new(PROJECT)
        .with_child(deliveries)
        .with_child(Element::new(COMPONENTS).with_child(component_to_element(project.root())))
}

fn component_to_element(component: &Component) -> Element {
    let mut element = Element::new(COMPONENT)
        .with_attr("name", component.name())
        .with_attr("customerRelevant", component.customer_relevant.to_string());

    let sources: BTreeSet<&str> = component
        .assignments()
        .map(|(source, _)| source.as_str())
        .chain(component.information_entries().map(|(key, _)| key.source.as_str()))
        .collect();

    for source in sources {
        let mut importer = Element::new(IMPORTER).with_attr("name", source);
        if let Some(assignment) = component.assignment(source) {
            importer.set_attr("strategy", &assignment.strategy);
            for parameter in &assignment.parameters {
                importer.push(Element::new(PARAMETER).with_text(parameter));
            }
        }

        let mut entries: Vec<_> = component
            .information_entries()
            .filter(|(key, _)| key.source == source)
            .collect();
        entries.sort_by(|(a, _), (b, _)| compare_ids(&a.delivery, &b.delivery));
        for (key, info) in entries {
            importer.push(
                Element::new(DELIVERY_INFORMATION)
                    .with_attr("name", &key.delivery)
                    .with_attr("isNew", info.is_new.to_string())
                    .with_child(info.content().clone()),
            );
        }
        element.push(importer);
    }

    for child in component.children() {
        element.push(component_to_element(child));
    }
    element
}

// ============================================================================
// Reading
// ============================================================================

pub(super) fn project_from_element(root: &Element, registry: &PluginRegistry) -> Result<Project> {
    expect_name(root, PROJECT)?;

    let mut deliveries = Vec::new();
    if let Some(list) = root.child(DELIVERIES) {
        for element in list.children_named(DELIVERY) {
            deliveries.push(delivery_from_element(element)?);
        }
    }

    let components = root.child(COMPONENTS).ok_or_else(|| unexpected(COMPONENTS, "<none>"))?;
    let mut tops = components.children_named(COMPONENT);
    let top = tops.next().ok_or_else(|| unexpected(COMPONENT, "<none>"))?;
    if let Some(extra) = tops.next() {
        return Err(DeliveryError::persistence(
            "reading components",
            PersistenceErrorKind::InvalidValue {
                field: "components".to_string(),
                value: format!("second root component '{}'", extra.attr("name").unwrap_or_default()),
            },
        ));
    }

    let mut project = Project::with_root(component_from_element(top, registry)?);
    for delivery in deliveries {
        let id = delivery.id().to_string();
        if !project.deliveries_mut().add(delivery) {
            return Err(invalid_value("delivery", &id));
        }
    }
    Ok(project)
}

fn delivery_from_element(element: &Element) -> Result<Delivery> {
    let name = required(element, "name")?;
    let integrator = element.attr("integrator").unwrap_or_default();
    let created = match element.attr("date") {
        Some(date) => DateTime::parse_from_rfc3339(date)
            .map_err(|_| invalid_value("date", date))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    Ok(Delivery::with_details(name, integrator, created))
}

fn component_from_element(element: &Element, registry: &PluginRegistry) -> Result<Component> {
    expect_name(element, COMPONENT)?;
    let name = required(element, "name")?;
    let customer_relevant = match element.attr("customerRelevant") {
        Some(flag) => parse_bool("customerRelevant", flag)?,
        None => true,
    };
    let mut component = Component::new(name).with_customer_relevant(customer_relevant);

    for importer in element.children_named(IMPORTER) {
        let source = required(importer, "name")?;
        let import = registry
            .find_import(source)
            .ok_or_else(|| DeliveryError::unknown_strategy("import strategy", source))?;

        if let Some(strategy) = importer.attr("strategy") {
            if registry.find_strategy(strategy).is_none() {
                return Err(DeliveryError::unknown_strategy("assignment strategy", strategy));
            }
            let parameters = importer.children_named(PARAMETER).map(Element::text);
            component.assign(source, StrategyAssignment::new(strategy, parameters));
        }

        for entry in importer.children_named(DELIVERY_INFORMATION) {
            let delivery = required(entry, "name")?;
            let content = entry
                .child(CONTENT_TAG)
                .cloned()
                .unwrap_or_else(|| Element::new(CONTENT_TAG));
            let mut info = DeliveryInformation::with_content(source, import.kind, content);
            info.is_new = match entry.attr("isNew") {
                Some(flag) => parse_bool("isNew", flag)?,
                None => false,
            };
            component.set_information(delivery, info);
        }
    }

    for child in element.children_named(COMPONENT) {
        component.push_child(component_from_element(child, registry)?);
    }
    Ok(component)
}

fn expect_name(element: &Element, expected: &str) -> Result<()> {
    if element.name == expected {
        Ok(())
    } else {
        Err(unexpected(expected, &element.name))
    }
}

fn required<'e>(element: &'e Element, attribute: &str) -> Result<&'e str> {
    element
        .attr(attribute)
        .ok_or_else(|| DeliveryError::missing_attribute(&element.name, attribute))
}

fn parse_bool(field: &str, value: &str) -> Result<bool> {
    value.parse().map_err(|_| invalid_value(field, value))
}

fn unexpected(expected: &str, found: &str) -> DeliveryError {
    DeliveryError::persistence(
        "reading project",
        PersistenceErrorKind::UnexpectedElement {
            expected: expected.to_string(),
            found: found.to_string(),
        },
    )
}

fn invalid_value(field: &str, value: &str) -> DeliveryError {
    DeliveryError::persistence(
        "reading project",
        PersistenceErrorKind::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        },
    )
}
