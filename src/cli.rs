//! CLI bindings for the fetch utility.
//!
//! This module focuses on the CLI bindings required to provide easy APIs
//! and consistency for the fetcher. This is where the parent CLI can be
//! found, as well as utilities for fetching common switches and values.
use clap::{App, AppSettings, Arg, ArgMatches};
use rusoto_s3::*;

use crate::fetch::FetchRequest;
use crate::types::UtilResult;

/// Constructs a new CLI application using Clap.
///
/// All metadata is fetched dynamically from Cargo and shouldn't require
/// to be updated (ever).
pub fn build<'a, 'b>() -> App<'a, 'b> {
    App::new("")
        .name("s3-fetch")
        .about("Locate a file in an Amazon S3 bucket by prefix and download it")
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .args(&[
            Arg::with_name("bucket")
                .help("An S3 bucket to search within")
                .short("b")
                .long("bucket")
                .takes_value(true)
                .required(true),
            Arg::with_name("file")
                .help("A file name prefix to search for and save as")
                .short("f")
                .long("file")
                .takes_value(true)
                .required(true),
            Arg::with_name("quiet")
                .help("Only prints errors during execution")
                .short("q")
                .long("quiet"),
        ])
        .settings(&[AppSettings::ArgRequiredElseHelp])
}

/// Executes the fetcher based on the parsed arguments from the CLI.
pub async fn exec(s3: S3Client, args: &ArgMatches<'_>) -> UtilResult<()> {
    crate::fetch::exec(s3, args).await
}

/// Fetches a bucket/prefix pair from the argument set.
pub fn get_fetch_request(args: &ArgMatches<'_>) -> FetchRequest {
    // both are required, so these should be safe
    let bucket = args.value_of("bucket").unwrap_or_default();
    let prefix = args.value_of("file").unwrap_or_default();

    FetchRequest::new(bucket, prefix)
}

/// Determines if the quiet switch was provided in this execution.
pub fn is_quiet(args: &ArgMatches<'_>) -> bool {
    args.is_present("quiet")
}
