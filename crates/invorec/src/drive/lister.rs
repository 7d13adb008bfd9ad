use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::drive::{DriveClient, FileFilter, RemoteFile};
use crate::error::DriveError;

/// Enumerates invoice-candidate files under a root folder. Stateless
/// between calls; every invocation re-queries the store.
#[derive(Clone)]
pub struct FileLister {
    client: Arc<dyn DriveClient>,
    max_depth: usize,
    max_files: usize,
}

impl FileLister {
    pub fn new(client: Arc<dyn DriveClient>, max_depth: usize, max_files: usize) -> Self {
        Self {
            client,
            max_depth,
            max_files,
        }
    }

    /// Lists candidate files across the folder tree, most recently
    /// modified first.
    ///
    /// Folder expansion is level-by-level with a hard depth bound, so a
    /// cyclic or pathological folder graph cannot run away. A failure
    /// while expanding folders or fetching a later page degrades to the
    /// files collected so far; only a failure of the very first file
    /// query is an error, since that means the store is unreachable.
    pub async fn list_candidate_files(
        &self,
        root_folder_id: &str,
        filter: &FileFilter,
    ) -> Result<Vec<RemoteFile>, DriveError> {
        let folder_ids = self.collect_folder_ids(root_folder_id).await;

        let mut files: Vec<RemoteFile> = Vec::new();
        let mut page_token: Option<String> = None;
        let mut first_page = true;

        loop {
            let page = match self
                .client
                .list_files(&folder_ids, filter, page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) if first_page => return Err(e),
                Err(e) => {
                    warn!("File listing page failed, keeping partial results: {}", e);
                    break;
                }
            };
            first_page = false;

            files.extend(page.files);

            if files.len() >= self.max_files {
                debug!(
                    "File listing reached the safety cap of {} files",
                    self.max_files
                );
                files.truncate(self.max_files);
                break;
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        // Most recently changed documents first: downstream consumers
        // poll for freshly uploaded files.
        files.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));
        Ok(files)
    }

    /// Expands subfolders level by level, carrying an explicit depth so
    /// the bound is enforced independently of call-stack behavior. Each
    /// level issues exactly one subfolder query.
    async fn collect_folder_ids(&self, root_folder_id: &str) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(root_folder_id.to_string());

        let mut all = vec![root_folder_id.to_string()];
        let mut frontier = vec![root_folder_id.to_string()];

        for depth in 0..self.max_depth {
            if frontier.is_empty() {
                break;
            }

            let subfolders = match self.client.list_folders(&frontier).await {
                Ok(subs) => subs,
                Err(e) => {
                    warn!(
                        "Subfolder listing failed at depth {}, continuing with {} folders: {}",
                        depth,
                        all.len(),
                        e
                    );
                    break;
                }
            };

            frontier = subfolders
                .into_iter()
                .filter(|f| seen.insert(f.id.clone()))
                .map(|f| f.id)
                .collect();
            all.extend(frontier.iter().cloned());
        }

        all
    }
}
