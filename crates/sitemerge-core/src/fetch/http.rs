//! Single HTTP GET via the curl crate (libcurl).

use std::time::Duration;

use crate::retry::FetchError;

/// Performs one GET and returns the body as UTF-8 text.
///
/// Follows redirects. Anything but a final HTTP 200 is an error. Runs in the
/// current thread.
pub fn get_once(url: &str, timeout: Duration) -> Result<String, FetchError> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(timeout)?;
    easy.timeout(timeout)?;
    easy.useragent(concat!("sitemerge/", env!("CARGO_PKG_VERSION")))?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if code != 200 {
        return Err(FetchError::Http(code));
    }

    Ok(String::from_utf8(body)?)
}
