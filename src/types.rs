//! Types module for the main runtime, exposing error and result types.
//!
//! Most code in this module is based around coercion of error types into
//! a common error type, to be used as the general "Error" of this crate.
//! It also houses the XML decoding used to pull the `Code` and `Message`
//! out of raw S3 error bodies, as Rusoto doesn't model most of them.
use logger::SetLoggerError;
use quick_xml::events::Event;
use quick_xml::Reader;
use rusoto_core::{region, request, RusotoError};

use std::error::Error;
use std::fmt::{self, Debug, Display, Formatter};
use std::io;

/// Public type alias for a result with a `UtilError` error type.
pub type UtilResult<T> = Result<T, UtilError>;

/// Delegating error wrapper for errors raised by the main archive.
///
/// The internal `String` representation enables cheap coercion from
/// other error types by binding their error messages through. This
/// is somewhat similar to the `failure` crate, but minimal.
pub struct UtilError(String);

/// Debug implementation for `UtilError`.
impl Debug for UtilError {
    /// Formats an `UtilError` by delegating to `Display`.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// Display implementation for `UtilError`.
impl Display for UtilError {
    /// Formats an `UtilError` by writing out the inner representation.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Allows passing through to the Lambda runtime error type.
impl Error for UtilError {}

/// Macro to implement `From` for provided types.
macro_rules! derive_from {
    ($type:ty) => {
        impl<'a> From<$type> for UtilError {
            fn from(t: $type) -> UtilError {
                UtilError(t.to_string())
            }
        }
    };
}

// Easy derivations of derive_from.
derive_from!(&'a str);
derive_from!(io::Error);
derive_from!(clap::Error);
derive_from!(SetLoggerError);
derive_from!(request::TlsError);
derive_from!(region::ParseRegionError);
derive_from!(humantime::TimestampError);
derive_from!(String);

/// Macro to implement `From` for Rusoto types.
macro_rules! derive_from_rusoto {
    ($type:ty) => {
        impl From<RusotoError<$type>> for UtilError {
            /// Converts a Rusoto error to a `UtilError`.
            fn from(err: RusotoError<$type>) -> UtilError {
                // grab the raw conversion
                let msg = err.to_string();

                // XML somewhere in there, look for a message!
                let message = msg
                    .find('<')
                    .and_then(|idx| xml_text(&msg[idx..], b"Message"));

                // if we found a message, we'll use that as the error
                if let Some(message) = message {
                    return UtilError(message);
                }

                // default msg
                UtilError(msg)
            }
        }
    };
}

// derive error display for all used rusoto types
derive_from_rusoto!(rusoto_s3::GetObjectError);
derive_from_rusoto!(rusoto_s3::GetObjectAclError);
derive_from_rusoto!(rusoto_s3::ListBucketsError);
derive_from_rusoto!(rusoto_s3::ListObjectsV2Error);
derive_from_rusoto!(rusoto_s3::PutObjectAclError);
derive_from_rusoto!(rusoto_ssm::GetParameterError);
derive_from_rusoto!(rusoto_sts::AssumeRoleError);

/// Retrieves the S3 error `Code` from a raw (unmodelled) Rusoto error.
///
/// Only `RusotoError::Unknown` carries the raw response body; modelled
/// service errors have already been matched by Rusoto and return `None`.
pub fn error_code<E>(err: &RusotoError<E>) -> Option<String> {
    match err {
        RusotoError::Unknown(response) => xml_text(&response.body_as_str(), b"Code"),
        _ => None,
    }
}

/// Retrieves the HTTP status of a raw (unmodelled) Rusoto error.
pub fn error_status<E>(err: &RusotoError<E>) -> Option<u16> {
    match err {
        RusotoError::Unknown(response) => Some(response.status.as_u16()),
        _ => None,
    }
}

/// Reads the text of the first `tag` element found in an XML document.
fn xml_text(xml: &str, tag: &[u8]) -> Option<String> {
    // create an XML reader and buffer
    let mut reader = Reader::from_str(xml);
    let mut buffer = Vec::new();

    loop {
        // parse through each XML node event
        match reader.read_event(&mut buffer) {
            // end, or error, just give up
            Ok(Event::Eof) | Err(_) => return None,

            // if we find a matching tag, we'll use that text
            Ok(Event::Start(ref e)) if e.name() == tag => {
                return reader.read_text(tag, &mut Vec::new()).ok();
            }

            // skip
            _ => (),
        }
        // empty buffers
        buffer.clear();
    }
}
