//! Locate a file in S3 by prefix and download it locally.
//!
//! The first object returned by the listing endpoint wins; S3 happens to
//! list keys in lexical order, but nothing here relies on that.
use clap::ArgMatches;
use rusoto_s3::*;
use tempfile::NamedTempFile;
use tokio::fs::{self, File};
use tokio::io::{self, AsyncWriteExt};

use std::path::{Component, Path, PathBuf};

use crate::cli;
use crate::types::UtilResult;

/// Bucket/prefix pair describing what to fetch.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchRequest {
    pub bucket: String,
    pub prefix: String,
}

impl FetchRequest {
    /// Constructs a new `FetchRequest`, stripping any `s3://` scheme.
    pub fn new(bucket: &str, prefix: &str) -> Self {
        Self {
            bucket: bucket.trim_start_matches("s3://").to_string(),
            prefix: prefix.to_string(),
        }
    }
}

/// Outcome of a fetch.
#[derive(Debug, PartialEq)]
pub enum Fetched {
    /// The first match was saved to the contained path.
    Found(PathBuf),
    /// Nothing in the bucket matched the prefix.
    NotFound,
}

/// Executes the fetcher and returns a `UtilResult` to indicate success.
pub async fn exec(s3: S3Client, args: &ArgMatches<'_>) -> UtilResult<()> {
    let request = cli::get_fetch_request(args);

    // the local path is the prefix itself, relative to the working dir
    let fetched = fetch(&s3, &request, Path::new(".")).await?;

    info!("{}", describe(&request, &fetched));

    Ok(())
}

/// Formats the line reported to the user for a fetch outcome.
pub fn describe(request: &FetchRequest, fetched: &Fetched) -> String {
    match fetched {
        Fetched::Found(_) => format!(
            "File {} was found, saving to the local directory.",
            request.prefix
        ),
        Fetched::NotFound => format!(
            "File {} was not found in the {} bucket.",
            request.prefix, request.bucket
        ),
    }
}

/// Fetches the first object matching the request prefix into `root`.
///
/// The object is written to `root` joined with the prefix, creating any
/// parent directories along the way. No file is written if nothing in
/// the bucket matches, and a failed download leaves any existing file
/// at that path untouched.
pub async fn fetch(s3: &S3Client, request: &FetchRequest, root: &Path) -> UtilResult<Fetched> {
    // the prefix doubles as a file name beneath root, so it must be one
    if !is_local_name(&request.prefix) {
        return Err(format!("Unable to save {:?} as a local file", request.prefix).into());
    }

    // create a request to list the first matching object
    let listing = ListObjectsV2Request {
        bucket: request.bucket.clone(),
        prefix: Some(request.prefix.clone()),
        max_keys: Some(1),
        ..ListObjectsV2Request::default()
    };

    // execute the request and await the response
    let response = s3.list_objects_v2(listing).await?;

    // pull back the first key, if there is one
    let key = match response
        .contents
        .and_then(|contents| contents.into_iter().next())
        .and_then(|object| object.key)
    {
        Some(key) => key,
        None => return Ok(Fetched::NotFound),
    };

    debug!("Downloading s3://{}/{}", request.bucket, key);

    // create the request to retrieve the object
    let download = GetObjectRequest {
        bucket: request.bucket.clone(),
        key,
        ..GetObjectRequest::default()
    };

    // carry out the request and grab the body stream
    let body = s3
        .get_object(download)
        .await?
        .body
        .ok_or("Object body was missing from response")?;

    // make sure nested prefixes have somewhere to land
    let path = root.join(&request.prefix);
    let parent = path.parent().unwrap_or(root);
    fs::create_dir_all(parent).await?;

    // stream into a sibling temporary file, removed again on drop
    let (temp, temp_path) = NamedTempFile::new_in(parent)?.into_parts();
    let mut file = File::from_std(temp);

    io::copy(&mut body.into_async_read(), &mut file).await?;
    file.flush().await?;

    // only a complete download replaces the target
    temp_path.persist(&path).map_err(|err| err.error)?;

    Ok(Fetched::Found(path))
}

/// Determines whether a prefix names a file nested beneath the root.
fn is_local_name(prefix: &str) -> bool {
    let path = Path::new(prefix);

    !prefix.ends_with('/')
        && path.file_name().is_some()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}
