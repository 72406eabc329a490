//! Resource Group Service
//!
//! Thin facade over a [`ResourceManagementClient`]: flattens pagination,
//! applies the default tag policy and makes delete idempotent.

use super::client::ResourceManagementClient;
use super::model::{default_tags, ResourceGroup, Tags};
use crate::error::{ResourceError, Result};
use crate::notification::{Notice, NoticeSink, TracingNoticeSink};
use std::sync::Arc;

/// Resource group operations backed by an injected client
#[derive(Clone)]
pub struct ResourceGroupService {
    client: Arc<dyn ResourceManagementClient>,
    notices: Arc<dyn NoticeSink>,
}

/// Builder for [`ResourceGroupService`]
#[derive(Default)]
pub struct ResourceGroupServiceBuilder {
    client: Option<Arc<dyn ResourceManagementClient>>,
    notices: Option<Arc<dyn NoticeSink>>,
}

impl ResourceGroupServiceBuilder {
    pub fn client(mut self, client: Arc<dyn ResourceManagementClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Where recovered conditions are reported (defaults to `tracing`)
    pub fn notice_sink(mut self, notices: Arc<dyn NoticeSink>) -> Self {
        self.notices = Some(notices);
        self
    }

    /// Fails with `InvalidArgument` when no client was supplied
    pub fn build(self) -> Result<ResourceGroupService> {
        let client = self
            .client
            .ok_or_else(|| ResourceError::InvalidArgument("resource client is required".into()))?;

        Ok(ResourceGroupService {
            client,
            notices: self.notices.unwrap_or_else(|| Arc::new(TracingNoticeSink)),
        })
    }
}

impl ResourceGroupService {
    /// Create a service reporting notices through `tracing`
    pub fn new(client: Arc<dyn ResourceManagementClient>) -> Self {
        Self {
            client,
            notices: Arc::new(TracingNoticeSink),
        }
    }

    pub fn builder() -> ResourceGroupServiceBuilder {
        ResourceGroupServiceBuilder::default()
    }

    /// List every resource group, following continuation cursors until the
    /// last page. Pages are fetched one after another.
    pub async fn list_resource_groups(&self) -> Result<Vec<ResourceGroup>> {
        let mut page = self.client.list_first_page().await?;
        let mut groups = Vec::new();
        let mut pages = 1usize;

        loop {
            let next = page.next_cursor().map(str::to_string);
            groups.append(&mut page.items);

            let Some(cursor) = next else {
                break;
            };
            page = self.client.list_next_page(&cursor).await?;
            pages += 1;
        }

        tracing::info!("Listed {} resource groups across {} pages", groups.len(), pages);
        Ok(groups)
    }

    /// Create or update a resource group.
    ///
    /// `None` tags means the default mapping; `Some` (even empty) is sent as is.
    pub async fn create_resource_group(
        &self,
        name: &str,
        location: &str,
        tags: Option<Tags>,
    ) -> Result<ResourceGroup> {
        let parameters = ResourceGroup::descriptor(location, tags.unwrap_or_else(default_tags));

        tracing::info!("Creating resource group {} in {}", name, location);
        self.client.create_or_update(name, &parameters).await
    }

    /// Delete a resource group. Deleting a group that does not exist succeeds
    /// and emits a notice instead of an error.
    pub async fn delete_resource_group(&self, name: &str) -> Result<()> {
        tracing::info!("Deleting resource group {}", name);

        match self.client.delete(name).await {
            Ok(()) => Ok(()),
            Err(ResourceError::NotFound(_)) => {
                self.notices.notice(Notice::not_found_on_delete(name));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteFailure;
    use crate::notification::{NoticeKind, NoticeLog};
    use crate::resource_group::model::ResourceGroupPage;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted client that records every call
    #[derive(Default)]
    struct FakeClient {
        pages: Vec<ResourceGroupPage>,
        list_error: Option<(usize, ResourceError)>,
        create_error: Option<ResourceError>,
        delete_error: Option<ResourceError>,
        calls: Mutex<Vec<String>>,
        created: Mutex<Vec<(String, ResourceGroup)>>,
    }

    impl FakeClient {
        fn with_pages(pages: Vec<ResourceGroupPage>) -> Self {
            Self {
                pages,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn page(&self, index: usize) -> Result<ResourceGroupPage> {
            if let Some((at, err)) = &self.list_error {
                if *at == index {
                    return Err(err.clone());
                }
            }
            Ok(self.pages[index].clone())
        }
    }

    #[async_trait]
    impl ResourceManagementClient for FakeClient {
        async fn list_first_page(&self) -> Result<ResourceGroupPage> {
            self.calls.lock().unwrap().push("list_first_page".into());
            self.page(0)
        }

        async fn list_next_page(&self, cursor: &str) -> Result<ResourceGroupPage> {
            self.calls.lock().unwrap().push(format!("list_next_page:{}", cursor));
            let index: usize = cursor.trim_start_matches("page-").parse().unwrap();
            self.page(index)
        }

        async fn create_or_update(&self, name: &str, parameters: &ResourceGroup) -> Result<ResourceGroup> {
            self.calls.lock().unwrap().push(format!("create_or_update:{}", name));
            if let Some(err) = &self.create_error {
                return Err(err.clone());
            }
            self.created
                .lock()
                .unwrap()
                .push((name.to_string(), parameters.clone()));

            let mut created = parameters.clone();
            created.name = Some(name.to_string());
            created.id = Some(format!("/subscriptions/sub/resourceGroups/{}", name));
            Ok(created)
        }

        async fn delete(&self, name: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("delete:{}", name));
            match &self.delete_error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    fn group(name: &str) -> ResourceGroup {
        ResourceGroup {
            name: Some(name.to_string()),
            location: "eastus".to_string(),
            ..Default::default()
        }
    }

    fn page(names: &[&str], next: Option<&str>) -> ResourceGroupPage {
        ResourceGroupPage::new(names.iter().map(|n| group(n)).collect(), next.map(String::from))
    }

    fn names(groups: &[ResourceGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.display_name()).collect()
    }

    fn service_with_log(client: Arc<FakeClient>) -> (ResourceGroupService, Arc<NoticeLog>) {
        let log = Arc::new(NoticeLog::new());
        let service = ResourceGroupService::builder()
            .client(client)
            .notice_sink(log.clone())
            .build()
            .unwrap();
        (service, log)
    }

    #[test]
    fn test_build_without_client_fails() {
        let result = ResourceGroupService::builder()
            .notice_sink(Arc::new(NoticeLog::new()))
            .build();
        assert!(matches!(result, Err(ResourceError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_list_single_page() {
        let client = Arc::new(FakeClient::with_pages(vec![page(&["a", "b"], None)]));
        let service = ResourceGroupService::new(client.clone());

        let groups = service.list_resource_groups().await.unwrap();

        assert_eq!(names(&groups), vec!["a", "b"]);
        assert_eq!(client.calls(), vec!["list_first_page"]);
    }

    #[tokio::test]
    async fn test_list_follows_cursors_in_order() {
        let client = Arc::new(FakeClient::with_pages(vec![
            page(&["a", "b"], Some("page-1")),
            page(&["c"], Some("page-2")),
            page(&["d", "e"], Some("")),
        ]));
        let service = ResourceGroupService::new(client.clone());

        let groups = service.list_resource_groups().await.unwrap();

        assert_eq!(names(&groups), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(
            client.calls(),
            vec!["list_first_page", "list_next_page:page-1", "list_next_page:page-2"]
        );
    }

    #[tokio::test]
    async fn test_list_empty_subscription() {
        let client = Arc::new(FakeClient::with_pages(vec![page(&[], None)]));
        let service = ResourceGroupService::new(client);

        assert!(service.list_resource_groups().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_error_on_later_page_propagates() {
        let failure = ResourceError::Remote(RemoteFailure::new(
            Some(503),
            Some("ServiceUnavailable".into()),
            "try later",
        ));
        let client = Arc::new(FakeClient {
            pages: vec![page(&["a"], Some("page-1")), page(&["b"], None)],
            list_error: Some((1, failure.clone())),
            ..Default::default()
        });
        let service = ResourceGroupService::new(client.clone());

        let err = service.list_resource_groups().await.unwrap_err();

        assert_eq!(err, failure);
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_list_not_found_is_not_swallowed() {
        let client = Arc::new(FakeClient {
            pages: vec![page(&[], None)],
            list_error: Some((0, ResourceError::NotFound("subscription".into()))),
            ..Default::default()
        });
        let (service, log) = service_with_log(client);

        let err = service.list_resource_groups().await.unwrap_err();

        assert_eq!(err, ResourceError::NotFound("subscription".into()));
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_create_applies_default_tags() {
        let client = Arc::new(FakeClient::default());
        let service = ResourceGroupService::new(client.clone());

        let created = service.create_resource_group("rg1", "eastus", None).await.unwrap();

        let sent = client.created.lock().unwrap()[0].clone();
        assert_eq!(sent.0, "rg1");
        assert_eq!(sent.1.location, "eastus");
        assert_eq!(sent.1.tags, default_tags());
        assert_eq!(created.name.as_deref(), Some("rg1"));
        assert_eq!(created.id.as_deref(), Some("/subscriptions/sub/resourceGroups/rg1"));
    }

    #[tokio::test]
    async fn test_create_explicit_empty_tags_are_kept() {
        let client = Arc::new(FakeClient::default());
        let service = ResourceGroupService::new(client.clone());

        service
            .create_resource_group("rg1", "eastus", Some(HashMap::new()))
            .await
            .unwrap();

        let sent = client.created.lock().unwrap()[0].1.clone();
        assert!(sent.tags.is_empty());
    }

    #[tokio::test]
    async fn test_create_partial_tags_not_merged() {
        let client = Arc::new(FakeClient::default());
        let service = ResourceGroupService::new(client.clone());
        let tags = HashMap::from([("Owner".to_string(), "platform".to_string())]);

        service
            .create_resource_group("rg1", "westus2", Some(tags.clone()))
            .await
            .unwrap();

        assert_eq!(client.created.lock().unwrap()[0].1.tags, tags);
    }

    #[tokio::test]
    async fn test_create_error_propagates() {
        let failure = ResourceError::Remote(RemoteFailure::new(
            Some(400),
            Some("LocationNotAvailableForResourceGroup".into()),
            "bad location",
        ));
        let client = Arc::new(FakeClient {
            create_error: Some(failure.clone()),
            ..Default::default()
        });
        let service = ResourceGroupService::new(client);

        let err = service.create_resource_group("rg1", "mars", None).await.unwrap_err();
        assert_eq!(err, failure);
    }

    #[tokio::test]
    async fn test_delete_success_emits_no_notice() {
        let client = Arc::new(FakeClient::default());
        let (service, log) = service_with_log(client.clone());

        service.delete_resource_group("rg1").await.unwrap();

        assert_eq!(client.calls(), vec!["delete:rg1"]);
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_delete_not_found_is_swallowed_with_one_notice() {
        let client = Arc::new(FakeClient {
            delete_error: Some(ResourceError::NotFound("rg-gone".into())),
            ..Default::default()
        });
        let (service, log) = service_with_log(client);

        service.delete_resource_group("rg-gone").await.unwrap();

        let notices = log.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::NotFoundOnDelete);
        assert_eq!(notices[0].message, "Resource group rg-gone not found.");
    }

    #[tokio::test]
    async fn test_delete_other_errors_propagate() {
        let failure = ResourceError::Remote(RemoteFailure::new(
            Some(409),
            Some("ScopeLocked".into()),
            "locked",
        ));
        let client = Arc::new(FakeClient {
            delete_error: Some(failure.clone()),
            ..Default::default()
        });
        let (service, log) = service_with_log(client);

        let err = service.delete_resource_group("rg1").await.unwrap_err();

        assert_eq!(err, failure);
        assert!(log.is_empty());
    }
}
