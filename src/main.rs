//! Locate a file in an Amazon S3 bucket by prefix and download it.
//!
//! This tool should be used from a command line; the first object found
//! under the prefix is saved into the working directory, named after the
//! prefix itself.
use rusoto_core::region::Region;
use s3_ops::{cli, client, types};

#[tokio::main]
async fn main() -> types::UtilResult<()> {
    // build the CLI and grab all arguments
    let args = cli::build().get_matches();

    // initialize logging
    s3_ops::log::init(cli::is_quiet(&args))?;

    // create the new S3 client
    let s3 = client::s3(Region::default())?;

    // delegate to the cli mod
    cli::exec(s3, &args).await
}
