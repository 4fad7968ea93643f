use tracing::info;

use crate::bail;
use crate::concurrency::poller::PollTarget;
use crate::context::ReconcileContext;
use crate::error::{ErrorKind, ReconcileResult};
use crate::reconcile_error;
use crate::store::TableStore;
use crate::types::{Region, TagPage, Tags};

/// Lists the tags of a resource, waiting until it shows up in tag listings.
///
/// Tag listings are served separately from table descriptions and can miss a table for a
/// while after it was created. Tag sets that do not fit in a single listing page are not
/// supported and fail with [`ErrorKind::UnsupportedConfiguration`].
pub async fn list_tags_when_visible<S>(
    ctx: &ReconcileContext<S>,
    region: &Region,
    resource_arn: &str,
) -> ReconcileResult<Tags>
where
    S: TableStore,
{
    let target = PollTarget::new(resource_arn, region.clone(), "visible to tag listings");
    let page = ctx
        .tags_poller()
        .poll(
            &target,
            || ctx.store().list_tags(region, resource_arn),
            Option::<TagPage>::is_some,
        )
        .await?;

    let Some(page) = page else {
        return Err(reconcile_error!(
            ErrorKind::InvalidState,
            "Tag listing accepted without a page",
            resource_arn
        ));
    };

    if page.is_truncated() {
        bail!(
            ErrorKind::UnsupportedConfiguration,
            "Too many tags on table for tag replication",
            format!("{resource_arn} in {region} has more than one page of tags")
        );
    }

    Ok(page.tags)
}

/// Makes the tags of `resource_arn` equal to `master_tags`.
///
/// Tags are replaced as a whole: keys the master does not carry are dropped from the replica.
/// Returns `true` if the tags had to be replaced.
pub async fn sync_tags<S>(
    ctx: &ReconcileContext<S>,
    region: &Region,
    resource_arn: &str,
    master_tags: &Tags,
) -> ReconcileResult<bool>
where
    S: TableStore,
{
    let current = list_tags_when_visible(ctx, region, resource_arn).await?;
    if current == *master_tags {
        info!(resource_arn, %region, "no change needed for tags");
        return Ok(false);
    }

    info!(
        resource_arn,
        %region,
        tag_count = master_tags.len(),
        "replacing tags with master tags"
    );
    ctx.store()
        .tag_resource(region, resource_arn, master_tags.clone())
        .await?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryTableStore;
    use crate::test_utils::table::{table_with_indexes, test_reconciler_config};

    fn region() -> Region {
        Region::from("eu-west-1")
    }

    async fn context_with_table(
        store: MemoryTableStore,
        tags: Tags,
    ) -> (ReconcileContext<MemoryTableStore>, String) {
        let table = table_with_indexes(&region(), "orders", &[]);
        store.insert_table(&region(), table.clone()).await;
        store.set_tags(&region(), &table.table_arn, tags).await;

        let ctx = ReconcileContext::new(store, &test_reconciler_config("us-east-1")).unwrap();
        (ctx, table.table_arn)
    }

    #[tokio::test]
    async fn tags_are_replaced_not_merged() {
        let (ctx, arn) = context_with_table(
            MemoryTableStore::new(),
            Tags::from_iter([("env", "stage"), ("owner", "x")]),
        )
        .await;
        let master_tags = Tags::from_iter([("env", "prod")]);

        let replaced = sync_tags(&ctx, &region(), &arn, &master_tags).await.unwrap();

        assert!(replaced);
        assert_eq!(ctx.store().tags(&region(), &arn).await, Some(master_tags));
    }

    #[tokio::test]
    async fn equal_tags_are_left_alone() {
        let tags = Tags::from_iter([("env", "prod")]);
        let (ctx, arn) = context_with_table(MemoryTableStore::new(), tags.clone()).await;

        let replaced = sync_tags(&ctx, &region(), &arn, &tags).await.unwrap();

        assert!(!replaced);
    }

    #[tokio::test]
    async fn paginated_tags_are_unsupported() {
        let (ctx, arn) = context_with_table(
            MemoryTableStore::new().with_tag_page_size(1),
            Tags::from_iter([("env", "prod"), ("team", "core")]),
        )
        .await;

        let err = list_tags_when_visible(&ctx, &region(), &arn)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnsupportedConfiguration);
    }

    #[tokio::test]
    async fn missing_resource_times_out() {
        let ctx = ReconcileContext::new(
            MemoryTableStore::new(),
            &test_reconciler_config("us-east-1"),
        )
        .unwrap();

        let err = list_tags_when_visible(&ctx, &region(), "arn:missing")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PollTimeout);
    }
}
