//! Mapping topics to post files and writing them.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

pub const DEFAULT_POSTS_DIR: &str = "_posts";

const POST_EXTENSION: &str = "md";

/// Longest file name, in bytes, common filesystems accept.
const MAX_FILENAME_BYTES: usize = 255;

/// File name for a topic: every space becomes an underscore, `.md` is
/// appended, and nothing else is changed. Topics that would escape the posts
/// directory are rejected.
pub fn post_filename(topic: &str) -> Result<String> {
    let invalid = |reason| Err(Error::InvalidTopic(topic.to_string(), reason));

    if topic.is_empty() {
        return invalid("topic is empty");
    }
    if topic.contains(['/', '\\']) {
        return invalid("contains a path separator");
    }
    if topic.contains('\0') {
        return invalid("contains a NUL byte");
    }
    if topic == "." || topic == ".." {
        return invalid("is a relative path component");
    }

    let filename = format!("{}.{}", topic.replace(' ', "_"), POST_EXTENSION);
    if filename.len() > MAX_FILENAME_BYTES {
        return invalid("file name is too long");
    }

    Ok(filename)
}

pub fn post_path(dir: &Path, topic: &str) -> Result<PathBuf> {
    Ok(dir.join(post_filename(topic)?))
}

/// Fails unless `dir` exists and is a directory.
pub fn check_posts_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(Error::PostsDirError(dir.to_path_buf()))
    }
}

/// Writes `content` verbatim to the post file for `topic`, replacing any
/// previous version. The directory must already exist.
pub fn write_post(dir: &Path, topic: &str, content: &str) -> Result<PathBuf> {
    let path = post_path(dir, topic)?;
    std::fs::write(&path, content)?;
    info!(path = %path.display(), bytes = content.len(), "wrote post");
    Ok(path)
}

/// The `count` most recently modified posts in `dir`, newest first.
pub fn list_posts(dir: &Path, count: usize) -> Result<Vec<PathBuf>> {
    check_posts_dir(dir)?;

    let mut posts = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;
        if !metadata.is_file() || path.extension().is_none_or(|ext| ext != POST_EXTENSION) {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        posts.push((modified, path));
    }

    posts.sort_by(|(a_time, a_path), (b_time, b_path)| {
        b_time.cmp(a_time).then_with(|| a_path.cmp(b_path))
    });
    debug!(found = posts.len(), count, "listing posts");

    Ok(posts
        .into_iter()
        .take(count)
        .map(|(_, path)| path)
        .collect())
}
