// ── URI derivation & activation ──
//
// Non-resource nodes derive their URI by appending the descriptor's
// segment to their container's URI. Resources have no URI of their own
// until a create/load succeeds; the device's selfLink is then rewritten
// onto the real target host and fixed for the instance's lifetime.

use url::Url;

use crate::error::Error;

/// A selfLink after activation: the working URI with query arguments
/// and fragment split off and stored separately.
#[derive(Debug, Clone)]
pub struct ActivatedUri {
    pub uri: Url,
    pub query: Vec<(String, String)>,
    pub fragment: Option<String>,
}

/// Derive a child URI: container URI + segment + `/`.
///
/// Container URIs always end with a slash, so a relative join suffices.
pub fn join_segment(container: &Url, segment: &str) -> Result<Url, Error> {
    container
        .join(&format!("{segment}/"))
        .map_err(icontrol_api::Error::from)
        .map_err(Error::from)
}

/// The path element addressing a named instance under its collection.
///
/// `name="web", partition="Common"` becomes `~Common~web`; a full path
/// name like `/Common/web` is folded the same way; a bare name stays
/// as-is (device-wide objects without a partition).
pub fn element_path(name: &str, partition: Option<&str>) -> String {
    if name.contains('/') {
        name.replace('/', "~")
    } else if let Some(partition) = partition {
        format!("~{partition}~{name}")
    } else {
        name.to_owned()
    }
}

/// Rewrite a device selfLink into the instance's working URI.
///
/// The device always reports `https://localhost/...`; the placeholder
/// host is replaced with the session's real target, the path gains a
/// trailing slash, and query arguments and the fragment are split off
/// for separate storage.
pub fn activate_self_link(self_link: &str, base: &Url) -> Result<ActivatedUri, Error> {
    let parsed = Url::parse(self_link)
        .map_err(icontrol_api::Error::from)
        .map_err(Error::from)?;

    let query: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let fragment = parsed.fragment().map(str::to_owned);

    let mut uri = parsed;
    uri.set_query(None);
    uri.set_fragment(None);

    uri.set_scheme(base.scheme())
        .map_err(|()| Error::MalformedResponse {
            message: format!("selfLink scheme cannot be rewritten: {self_link}"),
        })?;
    uri.set_host(base.host_str())
        .map_err(icontrol_api::Error::from)
        .map_err(Error::from)?;
    uri.set_port(base.port())
        .map_err(|()| Error::MalformedResponse {
            message: format!("selfLink host cannot carry a port: {self_link}"),
        })?;

    if !uri.path().ends_with('/') {
        let path = format!("{}/", uri.path());
        uri.set_path(&path);
    }

    Ok(ActivatedUri {
        uri,
        query,
        fragment,
    })
}
