use futures::{stream, StreamExt};
use std::collections::VecDeque;

use super::{attributes, RemoteFilesystemAdapter, LIST_PAGE_LIMIT};
use crate::{
    attributes::StorageAttributes,
    client::{error::Error as ClientError, ClientResult, RemoteClient, ResourceInfo},
    error::{Error, MetadataKind, Result},
    filesystem::ListContents,
    path,
};

/// What a listing does when the remote fails part way through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingPolicy {
    /// End the sequence quietly, keeping what was already yielded
    #[default]
    BestEffort,
    /// Yield the error as the last item
    Strict,
}

/// Depth-first walk over directory pages. Parents are yielded before their
/// children, siblings in the order the remote returns them.
struct Walk<'a, C> {
    adapter: &'a RemoteFilesystemAdapter<C>,
    root: Option<String>,
    deep: bool,
    policy: ListingPolicy,
    stack: Vec<(String, VecDeque<ResourceInfo>)>,
    pending: Option<Error>,
    done: bool,
}

impl<'a, C> Walk<'a, C>
where
    C: RemoteClient,
{
    /// Children of a directory, `None` when the path is absent or not a directory
    async fn children(&self, path: &str) -> ClientResult<Option<VecDeque<ResourceInfo>>> {
        let resource = self
            .adapter
            .client()
            .resource(self.adapter.prefixer().prefix_path(path))
            .with_limit(LIST_PAGE_LIMIT);

        match resource.into_info().await? {
            Some(info) if info.is_dir() => Ok(Some(info.into_items().into())),
            _ => Ok(None),
        }
    }

    fn error(&self, path: &str, error: ClientError) -> Error {
        let error = Error::metadata(path, MetadataKind::Metadata, error);
        if self.policy == ListingPolicy::BestEffort {
            warn!("listing stopped: {}", error);
        }
        error
    }

    fn fail(&mut self, path: &str, error: ClientError) -> Option<Result<StorageAttributes>> {
        let error = self.error(path, error);
        self.done = true;

        match self.policy {
            ListingPolicy::BestEffort => None,
            ListingPolicy::Strict => Some(Err(error)),
        }
    }

    async fn next(&mut self) -> Option<Result<StorageAttributes>> {
        if self.done {
            return None;
        }

        if let Some(error) = self.pending.take() {
            self.done = true;
            return Some(Err(error));
        }

        if let Some(root) = self.root.take() {
            match self.children(&root).await {
                Ok(Some(items)) => self.stack.push((root, items)),
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(error) => return self.fail(&root, error),
            }
        }

        loop {
            let (dir, items) = self.stack.last_mut()?;
            let Some(item) = items.pop_front() else {
                let _ = self.stack.pop();
                continue;
            };
            // A nameless entry would resolve back to its parent
            if item.name.is_empty() {
                warn!("skipping nameless entry under {:?}", dir);
                continue;
            }

            let path = path::join(dir, &item.name);
            let is_dir = item.is_dir();

            let attributes = match attributes(path.clone(), item) {
                Ok(attributes) => attributes,
                Err(error) => return self.fail(&path, error),
            };

            if self.deep && is_dir {
                match self.children(&path).await {
                    Ok(Some(children)) => self.stack.push((path, children)),
                    Ok(None) => (),
                    // The directory itself is still yielded, the walk ends after it.
                    Err(error) => {
                        let error = self.error(&path, error);
                        match self.policy {
                            ListingPolicy::BestEffort => self.done = true,
                            ListingPolicy::Strict => self.pending = Some(error),
                        }
                    }
                }
            }

            return Some(Ok(attributes));
        }
    }
}

pub(super) fn walk<'a, C>(
    adapter: &'a RemoteFilesystemAdapter<C>,
    path: &str,
    deep: bool,
    policy: ListingPolicy,
) -> ListContents<'a>
where
    C: RemoteClient,
{
    let walk = Walk {
        adapter,
        root: Some(path::normalize(path)),
        deep,
        policy,
        stack: Vec::new(),
        pending: None,
        done: false,
    };

    stream::unfold(walk, |mut walk| async move {
        let item = walk.next().await?;
        Some((item, walk))
    })
    .boxed()
}
