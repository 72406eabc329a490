//! Resource group data model
//!
//! Field names follow the ARM JSON representation so the same types are used
//! for request descriptors, responses and list pages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tag mapping attached to a resource group
pub type Tags = HashMap<String, String>;

/// Tags applied when the caller does not supply any
pub const DEFAULT_TAGS: &[(&str, &str)] = &[
    ("Environment", "Development"),
    ("ManagedBy", "AzureResourceService"),
];

/// Build the default tag mapping
pub fn default_tags() -> Tags {
    DEFAULT_TAGS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A named logical grouping of cloud resources
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    /// Fully qualified ARM id, populated by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub location: String,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ResourceGroupProperties>,
}

impl ResourceGroup {
    /// Descriptor sent on create-or-update
    pub fn descriptor(location: &str, tags: Tags) -> Self {
        Self {
            location: location.to_string(),
            tags,
            ..Default::default()
        }
    }

    /// Provisioning state reported by the service, or "-"
    pub fn provisioning_state(&self) -> &str {
        self.properties
            .as_ref()
            .and_then(|p| p.provisioning_state.as_deref())
            .unwrap_or("-")
    }

    /// Name, or "-" when the service did not echo one
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("-")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

/// One page of a resource group listing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceGroupPage {
    #[serde(default, rename = "value")]
    pub items: Vec<ResourceGroup>,
    #[serde(default, rename = "nextLink", skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

impl ResourceGroupPage {
    pub fn new(items: Vec<ResourceGroup>, next_link: Option<String>) -> Self {
        Self { items, next_link }
    }

    /// Continuation cursor; an empty link counts as the final page
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_link.as_deref().filter(|link| !link.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_tags() {
        let tags = default_tags();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["Environment"], "Development");
        assert_eq!(tags["ManagedBy"], "AzureResourceService");
    }

    #[test]
    fn test_descriptor_serializes_location_and_tags_only() {
        let descriptor = ResourceGroup::descriptor("eastus", Tags::new());
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value, json!({"location": "eastus", "tags": {}}));
    }

    #[test]
    fn test_parse_arm_page() {
        let page: ResourceGroupPage = serde_json::from_value(json!({
            "value": [{
                "id": "/subscriptions/sub/resourceGroups/rg1",
                "name": "rg1",
                "type": "Microsoft.Resources/resourceGroups",
                "location": "westeurope",
                "properties": {"provisioningState": "Succeeded"}
            }],
            "nextLink": "https://management.azure.com/next"
        }))
        .unwrap();

        assert_eq!(page.items.len(), 1);
        let group = &page.items[0];
        assert_eq!(group.display_name(), "rg1");
        assert_eq!(group.provisioning_state(), "Succeeded");
        assert!(group.tags.is_empty());
        assert_eq!(page.next_cursor(), Some("https://management.azure.com/next"));
    }

    #[test]
    fn test_empty_next_link_is_final_page() {
        let page = ResourceGroupPage::new(vec![], Some(String::new()));
        assert_eq!(page.next_cursor(), None);
        assert_eq!(ResourceGroupPage::default().next_cursor(), None);
    }
}
